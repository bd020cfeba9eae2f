#![warn(missing_docs)]

//! Intermediate representation emitted by the spoilboard generator.
//!
//! The IR is a DAG of CSG operations: leaf primitives (boxes, cylinders,
//! cones) combined with booleans and rigid transforms. It carries no mesh
//! data. Tessellation and export are left to whatever consumes the document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod compact;

pub use compact::{from_compact, to_compact, CompactParseError};

/// Unique identifier for a node in the IR graph.
pub type NodeId = u64;

/// 3D vector with f64 components (millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// CSG operation, the building block of the IR DAG.
///
/// Each variant is either a leaf primitive or a combining/transform operation
/// that references child nodes by [`NodeId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CsgOp {
    /// Axis-aligned box with one corner at the origin.
    Cube {
        /// Size along each axis.
        size: Vec3,
    },
    /// Cylinder along +Z with its base circle centered at the origin.
    Cylinder {
        /// Radius of the cylinder.
        radius: f64,
        /// Height of the cylinder.
        height: f64,
        /// Number of circular segments.
        segments: u32,
    },
    /// Cone or frustum along +Z with its base circle centered at the origin.
    Cone {
        /// Bottom radius.
        radius_bottom: f64,
        /// Top radius (0 for a point).
        radius_top: f64,
        /// Height of the cone.
        height: f64,
        /// Number of circular segments.
        segments: u32,
    },
    /// Empty geometry (identity for union).
    Empty,
    /// Boolean union of two geometries.
    Union {
        /// Left operand.
        left: NodeId,
        /// Right operand.
        right: NodeId,
    },
    /// Boolean difference (left minus right).
    Difference {
        /// Left operand (base).
        left: NodeId,
        /// Right operand (subtracted).
        right: NodeId,
    },
    /// Translation by an offset vector.
    Translate {
        /// Child node to translate.
        child: NodeId,
        /// Translation offset.
        offset: Vec3,
    },
    /// Rotation by Euler angles in degrees (applied as X, then Y, then Z).
    Rotate {
        /// Child node to rotate.
        child: NodeId,
        /// Rotation angles in degrees.
        angles: Vec3,
    },
}

impl CsgOp {
    /// Child node ids referenced by this operation, left first.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            CsgOp::Union { left, right } | CsgOp::Difference { left, right } => {
                vec![*left, *right]
            }
            CsgOp::Translate { child, .. } | CsgOp::Rotate { child, .. } => vec![*child],
            CsgOp::Cube { .. } | CsgOp::Cylinder { .. } | CsgOp::Cone { .. } | CsgOp::Empty => {
                Vec::new()
            }
        }
    }

    /// Whether this operation is a leaf primitive with volume.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            CsgOp::Cube { .. } | CsgOp::Cylinder { .. } | CsgOp::Cone { .. }
        )
    }
}

/// A node in the IR graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,
    /// Optional human-readable name.
    pub name: Option<String>,
    /// The operation this node represents.
    pub op: CsgOp,
}

/// Display material for a scene entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    /// Material name (e.g. "mdf", "aluminum").
    pub name: String,
    /// Base color as `[r, g, b]` in 0.0..1.0.
    pub color: [f64; 3],
    /// Metallic factor (0.0 = dielectric, 1.0 = metal).
    pub metallic: f64,
    /// Roughness factor (0.0 = mirror, 1.0 = diffuse).
    pub roughness: f64,
}

/// An entry in the scene: a root node with an assigned material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Root node of this scene part.
    pub root: NodeId,
    /// Material key referencing a [`MaterialDef::name`].
    pub material: String,
}

/// A spoilboard document: the full IR DAG plus its scene roots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Format version string.
    pub version: String,
    /// All nodes in the graph, keyed by [`NodeId`].
    ///
    /// Ordered by id so that serialized output is stable.
    pub nodes: BTreeMap<NodeId, Node>,
    /// Material definitions, keyed by name.
    pub materials: BTreeMap<String, MaterialDef>,
    /// Scene entries (assembled parts with materials).
    pub roots: Vec<SceneEntry>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            nodes: BTreeMap::new(),
            materials: BTreeMap::new(),
            roots: Vec::new(),
        }
    }
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Node references that point at ids missing from [`Document::nodes`].
    ///
    /// Scene roots are checked as well as operation children. An empty
    /// result means the graph is closed.
    pub fn dangling_refs(&self) -> Vec<NodeId> {
        let mut missing: Vec<NodeId> = self
            .nodes
            .values()
            .flat_map(|n| n.op.children())
            .chain(self.roots.iter().map(|r| r.root))
            .filter(|id| !self.nodes.contains_key(id))
            .collect();
        missing.sort_unstable();
        missing.dedup();
        missing
    }

    /// Number of leaf primitives in the document.
    pub fn primitive_count(&self) -> usize {
        self.nodes.values().filter(|n| n.op.is_primitive()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plate_with_hole() -> Document {
        let mut doc = Document::new();
        doc.nodes.insert(
            1,
            Node {
                id: 1,
                name: Some("stock".to_string()),
                op: CsgOp::Cube {
                    size: Vec3::new(100.0, 50.0, 6.0),
                },
            },
        );
        doc.nodes.insert(
            2,
            Node {
                id: 2,
                name: Some("bore".to_string()),
                op: CsgOp::Cylinder {
                    radius: 3.5,
                    height: 7.0,
                    segments: 36,
                },
            },
        );
        doc.nodes.insert(
            3,
            Node {
                id: 3,
                name: None,
                op: CsgOp::Translate {
                    child: 2,
                    offset: Vec3::new(20.0, 20.0, -0.5),
                },
            },
        );
        doc.nodes.insert(
            4,
            Node {
                id: 4,
                name: Some("plate".to_string()),
                op: CsgOp::Difference { left: 1, right: 3 },
            },
        );
        doc.roots.push(SceneEntry {
            root: 4,
            material: "mdf".to_string(),
        });
        doc
    }

    #[test]
    fn roundtrip_document() {
        let mut doc = plate_with_hole();
        doc.materials.insert(
            "mdf".to_string(),
            MaterialDef {
                name: "mdf".to_string(),
                color: [0.76, 0.6, 0.42],
                metallic: 0.0,
                roughness: 0.9,
            },
        );

        let json = doc.to_json().expect("serialize");
        let restored = Document::from_json(&json).expect("deserialize");

        assert_eq!(doc, restored);
        assert_eq!(restored.nodes.len(), 4);
        assert_eq!(restored.materials.len(), 1);
    }

    #[test]
    fn materials_serialize_in_name_order() {
        let material = |name: &str| MaterialDef {
            name: name.to_string(),
            color: [0.5, 0.5, 0.5],
            metallic: 0.0,
            roughness: 0.5,
        };
        let mut a = Document::new();
        a.materials.insert("mdf".to_string(), material("mdf"));
        a.materials.insert("aluminum".to_string(), material("aluminum"));
        let mut b = Document::new();
        b.materials.insert("aluminum".to_string(), material("aluminum"));
        b.materials.insert("mdf".to_string(), material("mdf"));

        let json = a.to_json().unwrap();
        assert_eq!(json, b.to_json().unwrap());
        let aluminum = json.find("\"aluminum\"").unwrap();
        let mdf = json.find("\"mdf\"").unwrap();
        assert!(aluminum < mdf);
    }

    #[test]
    fn empty_document() {
        let doc = Document::new();
        assert_eq!(doc.version, "0.1");
        assert!(doc.nodes.is_empty());
        assert!(doc.roots.is_empty());
        assert!(doc.dangling_refs().is_empty());
    }

    #[test]
    fn serde_tagged_enum() {
        let op = CsgOp::Cone {
            radius_bottom: 3.5,
            radius_top: 6.0,
            height: 2.5,
            segments: 36,
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""type":"Cone""#));

        let restored: CsgOp = serde_json::from_str(&json).unwrap();
        assert_eq!(op, restored);
    }

    #[test]
    fn closed_graph_has_no_dangling_refs() {
        let doc = plate_with_hole();
        assert!(doc.dangling_refs().is_empty());
        assert_eq!(doc.primitive_count(), 2);
    }

    #[test]
    fn missing_child_is_reported() {
        let mut doc = plate_with_hole();
        doc.nodes.remove(&3);
        doc.roots.push(SceneEntry {
            root: 42,
            material: "mdf".to_string(),
        });
        assert_eq!(doc.dangling_refs(), vec![3, 42]);
    }

    #[test]
    fn children_order() {
        assert_eq!(CsgOp::Difference { left: 7, right: 2 }.children(), vec![7, 2]);
        assert!(CsgOp::Empty.children().is_empty());
    }
}
