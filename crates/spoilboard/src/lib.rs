#![warn(missing_docs)]

//! spoilboard: parametric CNC spoilboard generator
//!
//! Expands a one-quadrant hole pattern across the machine bed, keeps the
//! holes that fit on the sheet, builds a machining profile for each one and
//! subtracts it from the sheet stock. The result is a CSG document in the
//! `spoilboard-ir` format.
//!
//! # Example
//!
//! ```rust,no_run
//! use spoilboard::{generate, SpoilboardConfig};
//!
//! let cfg = SpoilboardConfig::load("presets/genmitsu-3030-pro.toml").unwrap();
//! let out = generate(&cfg).unwrap();
//! println!("{}", out.report);
//! std::fs::write("spoilboard.json", out.document.to_json().unwrap()).unwrap();
//! ```

use spoilboard_ir::{CsgOp, Document, MaterialDef, Node, NodeId, SceneEntry, Vec3 as IrVec3};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

pub mod assemble;
pub mod config;
pub mod error;
pub mod geometry;
pub mod keepout;
pub mod pattern;
pub mod profile;
pub mod validate;

pub use assemble::{bed_holes, generate, hole_part, sheet_holes, AlignmentReport, Generated};
pub use config::SpoilboardConfig;
pub use error::{Axis, ConfigError, Result, SpoilboardError};
pub use keepout::{KeepOut, SheetHoleSet};
pub use pattern::{expand, BedHoleSet, HoleSpec};
pub use profile::{synthesize, MachiningStack, Segment, SegmentKind, ToolMode, ToolProfile};

/// Global atomic counter for unique IR node IDs.
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a globally unique [`NodeId`].
fn alloc_node_id() -> NodeId {
    NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed)
}

/// A named solid, recorded as a CSG construction DAG.
///
/// Create primitives with [`Part::cube`], [`Part::cylinder`] and
/// [`Part::cone`], then combine them with [`Part::union`] and
/// [`Part::difference`] or the operator shorthands (`+`, `-`).
/// Extract the DAG with [`Part::to_document`].
#[derive(Debug, Clone)]
pub struct Part {
    /// Human-readable name, used for IR node names.
    pub name: String,
    ir_node_id: NodeId,
    ir_nodes: HashMap<NodeId, Node>,
}

impl Part {
    // =========================================================================
    // Internal constructors
    // =========================================================================

    fn with_ir(name: String, ir_node_id: NodeId, ir_nodes: HashMap<NodeId, Node>) -> Self {
        Self {
            name,
            ir_node_id,
            ir_nodes,
        }
    }

    /// Create a leaf IR node (primitive or empty) and return `(id, nodes)`.
    fn make_leaf(name: &str, op: CsgOp) -> (NodeId, HashMap<NodeId, Node>) {
        let id = alloc_node_id();
        let mut nodes = HashMap::new();
        nodes.insert(
            id,
            Node {
                id,
                name: Some(name.to_string()),
                op,
            },
        );
        (id, nodes)
    }

    /// Build a binary CSG node, merging both children's IR maps.
    fn make_binary(
        name: &str,
        left: &Part,
        right: &Part,
        op_fn: impl FnOnce(NodeId, NodeId) -> CsgOp,
    ) -> (NodeId, HashMap<NodeId, Node>) {
        let id = alloc_node_id();
        let mut nodes = left.ir_nodes.clone();
        nodes.extend(right.ir_nodes.iter().map(|(&k, v)| (k, v.clone())));
        nodes.insert(
            id,
            Node {
                id,
                name: Some(name.to_string()),
                op: op_fn(left.ir_node_id, right.ir_node_id),
            },
        );
        (id, nodes)
    }

    /// Build a unary transform node, cloning the child's IR map.
    fn make_unary(
        name: &str,
        child: &Part,
        op_fn: impl FnOnce(NodeId) -> CsgOp,
    ) -> (NodeId, HashMap<NodeId, Node>) {
        let id = alloc_node_id();
        let mut nodes = child.ir_nodes.clone();
        nodes.insert(
            id,
            Node {
                id,
                name: Some(name.to_string()),
                op: op_fn(child.ir_node_id),
            },
        );
        (id, nodes)
    }

    // =========================================================================
    // Public constructors
    // =========================================================================

    /// Create a box with one corner at the origin.
    pub fn cube(name: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        let name = name.into();
        let (id, nodes) = Self::make_leaf(
            &name,
            CsgOp::Cube {
                size: IrVec3::new(x, y, z),
            },
        );
        Self::with_ir(name, id, nodes)
    }

    /// Create a cylinder along +Z, base centered at the origin.
    pub fn cylinder(name: impl Into<String>, radius: f64, height: f64, segments: u32) -> Self {
        let name = name.into();
        let (id, nodes) = Self::make_leaf(
            &name,
            CsgOp::Cylinder {
                radius,
                height,
                segments,
            },
        );
        Self::with_ir(name, id, nodes)
    }

    /// Create a cone or frustum along +Z, base centered at the origin.
    pub fn cone(
        name: impl Into<String>,
        radius_bottom: f64,
        radius_top: f64,
        height: f64,
        segments: u32,
    ) -> Self {
        let name = name.into();
        let (id, nodes) = Self::make_leaf(
            &name,
            CsgOp::Cone {
                radius_bottom,
                radius_top,
                height,
                segments,
            },
        );
        Self::with_ir(name, id, nodes)
    }

    // =========================================================================
    // CSG operations
    // =========================================================================

    /// Boolean difference (self - other).
    pub fn difference(&self, other: &Part) -> Self {
        let result_name = format!("{}-diff", self.name);
        let (id, nodes) = Self::make_binary(&result_name, self, other, |l, r| CsgOp::Difference {
            left: l,
            right: r,
        });
        Self::with_ir(result_name, id, nodes)
    }

    /// Boolean union (self + other).
    pub fn union(&self, other: &Part) -> Self {
        let result_name = format!("{}-union", self.name);
        let (id, nodes) = Self::make_binary(&result_name, self, other, |l, r| CsgOp::Union {
            left: l,
            right: r,
        });
        Self::with_ir(result_name, id, nodes)
    }

    /// Rename the part without touching its geometry.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if let Some(node) = self.ir_nodes.get_mut(&self.ir_node_id) {
            node.name = Some(name.clone());
        }
        self.name = name;
        self
    }

    // =========================================================================
    // Transforms
    // =========================================================================

    /// Translate the part.
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Self {
        let (id, nodes) = Self::make_unary(&self.name, self, |child| CsgOp::Translate {
            child,
            offset: IrVec3::new(x, y, z),
        });
        Self::with_ir(self.name.clone(), id, nodes)
    }

    /// Rotate the part (angles in degrees).
    pub fn rotate(&self, x_deg: f64, y_deg: f64, z_deg: f64) -> Self {
        let (id, nodes) = Self::make_unary(&self.name, self, |child| CsgOp::Rotate {
            child,
            angles: IrVec3::new(x_deg, y_deg, z_deg),
        });
        Self::with_ir(self.name.clone(), id, nodes)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of IR nodes in this part's DAG.
    pub fn node_count(&self) -> usize {
        self.ir_nodes.len()
    }

    /// Extract the IR document for this part.
    ///
    /// Node ids are renumbered in post-order starting at 1, so the same
    /// construction always yields the same document.
    pub fn to_document(&self) -> Document {
        let mut renumber = Renumber::new(&self.ir_nodes);
        let root = renumber.visit(self.ir_node_id);
        let mut doc = Document::new();
        doc.nodes = renumber.finish();
        doc.roots.push(SceneEntry {
            root,
            material: "default".to_string(),
        });
        doc
    }
}

/// Post-order renumbering of a node map.
///
/// Shared subtrees are visited once. References to ids outside the map are
/// left unchanged.
struct Renumber<'a> {
    src: &'a HashMap<NodeId, Node>,
    ids: HashMap<NodeId, NodeId>,
    out: BTreeMap<NodeId, Node>,
}

impl<'a> Renumber<'a> {
    fn new(src: &'a HashMap<NodeId, Node>) -> Self {
        Self {
            src,
            ids: HashMap::new(),
            out: BTreeMap::new(),
        }
    }

    fn visit(&mut self, id: NodeId) -> NodeId {
        if let Some(&new) = self.ids.get(&id) {
            return new;
        }
        let src = self.src;
        let Some(node) = src.get(&id) else {
            return id;
        };
        let op = match &node.op {
            CsgOp::Union { left, right } => {
                let left = self.visit(*left);
                let right = self.visit(*right);
                CsgOp::Union { left, right }
            }
            CsgOp::Difference { left, right } => {
                let left = self.visit(*left);
                let right = self.visit(*right);
                CsgOp::Difference { left, right }
            }
            CsgOp::Translate { child, offset } => CsgOp::Translate {
                child: self.visit(*child),
                offset: *offset,
            },
            CsgOp::Rotate { child, angles } => CsgOp::Rotate {
                child: self.visit(*child),
                angles: *angles,
            },
            leaf => leaf.clone(),
        };
        let new = self.out.len() as NodeId + 1;
        self.ids.insert(id, new);
        self.out.insert(
            new,
            Node {
                id: new,
                name: node.name.clone(),
                op,
            },
        );
        new
    }

    fn finish(self) -> BTreeMap<NodeId, Node> {
        self.out
    }
}

// =============================================================================
// Operator overloads for ergonomic CSG
// =============================================================================

/// Union: `&a + &b`
impl std::ops::Add for &Part {
    type Output = Part;
    fn add(self, rhs: &Part) -> Part {
        self.union(rhs)
    }
}

/// Union: `a + b`
impl std::ops::Add for Part {
    type Output = Part;
    fn add(self, rhs: Part) -> Part {
        self.union(&rhs)
    }
}

/// Difference: `&a - &b`
impl std::ops::Sub for &Part {
    type Output = Part;
    fn sub(self, rhs: &Part) -> Part {
        self.difference(rhs)
    }
}

/// Difference: `a - b`
impl std::ops::Sub for Part {
    type Output = Part;
    fn sub(self, rhs: Part) -> Part {
        self.difference(&rhs)
    }
}

// =============================================================================
// Scene (multi-part assembly with materials)
// =============================================================================

/// A scene node containing a part with its material assignment.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// The geometry for this node.
    pub part: Part,
    /// Key into the scene's material table.
    pub material_key: String,
}

impl SceneNode {
    /// Create a new scene node with a part and material key.
    pub fn new(part: Part, material_key: impl Into<String>) -> Self {
        Self {
            part,
            material_key: material_key.into(),
        }
    }
}

/// Several parts kept apart for display, each with its own material.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Name of the scene.
    pub name: String,
    /// Ordered list of parts with their material assignments.
    pub nodes: Vec<SceneNode>,
    /// Material definitions referenced by the nodes.
    pub materials: Vec<MaterialDef>,
}

impl Scene {
    /// Create a new empty scene.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            materials: Vec::new(),
        }
    }

    /// Add a part with its material key
    pub fn add(&mut self, part: Part, material_key: impl Into<String>) {
        self.nodes.push(SceneNode::new(part, material_key));
    }

    /// Register a material definition.
    pub fn define_material(&mut self, material: MaterialDef) {
        self.materials.push(material);
    }

    /// Get total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if scene is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Extract the IR document for the full scene (multi-root).
    ///
    /// Each scene node becomes a root entry with its material key. Nodes are
    /// renumbered in post-order across the roots, in scene order.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        let mut out = BTreeMap::new();
        for scene_node in &self.nodes {
            let part = &scene_node.part;
            let mut renumber = Renumber::new(&part.ir_nodes);
            renumber.out = std::mem::take(&mut out);
            let root = renumber.visit(part.ir_node_id);
            out = renumber.finish();
            doc.roots.push(SceneEntry {
                root,
                material: scene_node.material_key.clone(),
            });
        }
        doc.nodes = out;
        for material in &self.materials {
            doc.materials.insert(material.name.clone(), material.clone());
        }
        doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ir_primitive() {
        let cube = Part::cube("box", 10.0, 20.0, 30.0);
        let doc = cube.to_document();
        assert_eq!(doc.nodes.len(), 1);
        assert_eq!(doc.roots.len(), 1);
        let root = &doc.nodes[&doc.roots[0].root];
        assert_eq!(root.name, Some("box".to_string()));
        match &root.op {
            CsgOp::Cube { size } => {
                assert_eq!(size.x, 10.0);
                assert_eq!(size.y, 20.0);
                assert_eq!(size.z, 30.0);
            }
            other => panic!("expected Cube, got {other:?}"),
        }
    }

    #[test]
    fn test_ir_csg_dag() {
        let cube = Part::cube("box", 10.0, 10.0, 10.0);
        let cyl = Part::cylinder("hole", 3.0, 15.0, 32);
        let result = cube.difference(&cyl);
        let doc = result.to_document();
        assert_eq!(doc.nodes.len(), 3);
        let root = &doc.nodes[&doc.roots[0].root];
        match &root.op {
            CsgOp::Difference { left, right } => {
                assert!(matches!(doc.nodes[left].op, CsgOp::Cube { .. }));
                assert!(matches!(doc.nodes[right].op, CsgOp::Cylinder { .. }));
            }
            other => panic!("expected Difference, got {other:?}"),
        }
    }

    #[test]
    fn test_ir_transform_chain() {
        let moved = Part::cube("box", 5.0, 5.0, 5.0).translate(1.0, 2.0, 3.0);
        let rotated = moved.rotate(0.0, 0.0, 90.0);
        let doc = rotated.to_document();
        assert_eq!(doc.nodes.len(), 3);
        let root = &doc.nodes[&doc.roots[0].root];
        match &root.op {
            CsgOp::Rotate { child, angles } => {
                assert_eq!(angles.z, 90.0);
                match &doc.nodes[child].op {
                    CsgOp::Translate {
                        child: inner,
                        offset,
                    } => {
                        assert_eq!(offset.x, 1.0);
                        assert_eq!(offset.y, 2.0);
                        assert_eq!(offset.z, 3.0);
                        assert!(matches!(doc.nodes[inner].op, CsgOp::Cube { .. }));
                    }
                    other => panic!("expected Translate, got {other:?}"),
                }
            }
            other => panic!("expected Rotate, got {other:?}"),
        }
    }

    #[test]
    fn test_operator_overloads() {
        let a = Part::cube("a", 10.0, 10.0, 10.0);
        let b = Part::cylinder("b", 2.0, 10.0, 16);
        let diff = &a - &b;
        let union = &a + &b;
        assert!(matches!(
            diff.to_document().nodes.values().last().map(|n| &n.op),
            Some(CsgOp::Difference { .. })
        ));
        assert!(matches!(
            union.to_document().nodes.values().last().map(|n| &n.op),
            Some(CsgOp::Union { .. })
        ));
        let owned = Part::cube("c", 1.0, 1.0, 1.0) - Part::cube("d", 1.0, 1.0, 1.0);
        assert_eq!(owned.node_count(), 3);
    }

    #[test]
    fn renumbering_is_post_order_from_one() {
        let a = Part::cube("a", 1.0, 1.0, 1.0);
        let b = Part::cone("b", 1.0, 0.5, 1.0, 12);
        let doc = a.union(&b).translate(1.0, 0.0, 0.0).to_document();
        let ids: Vec<_> = doc.nodes.keys().copied().collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert!(matches!(doc.nodes[&1].op, CsgOp::Cube { .. }));
        assert!(matches!(doc.nodes[&2].op, CsgOp::Cone { .. }));
        assert!(matches!(
            doc.nodes[&3].op,
            CsgOp::Union { left: 1, right: 2 }
        ));
        assert_eq!(doc.roots[0].root, 4);
        assert!(doc.dangling_refs().is_empty());
    }

    #[test]
    fn same_construction_same_document() {
        let build = || {
            Part::cube("stock", 10.0, 10.0, 2.0)
                .difference(&Part::cylinder("hole", 1.0, 3.0, 8).translate(5.0, 5.0, -0.5))
                .to_document()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn shared_subtree_is_emitted_once() {
        let hole = Part::cylinder("hole", 1.0, 1.0, 8);
        let doc = hole.union(&hole).to_document();
        assert_eq!(doc.nodes.len(), 2);
        assert!(matches!(
            doc.nodes[&2].op,
            CsgOp::Union { left: 1, right: 1 }
        ));
    }

    #[test]
    fn named_renames_root_node() {
        let doc = Part::cube("a", 1.0, 1.0, 1.0)
            .translate(1.0, 0.0, 0.0)
            .named("moved")
            .to_document();
        assert_eq!(doc.nodes[&doc.roots[0].root].name.as_deref(), Some("moved"));
        assert_eq!(doc.nodes[&1].name.as_deref(), Some("a"));
    }

    #[test]
    fn test_ir_scene() {
        let board = Part::cube("board", 20.0, 10.0, 5.0);
        let bed = Part::cube("bed", 30.0, 20.0, 5.0).translate(0.0, 0.0, -10.0);

        let mut scene = Scene::new("machine");
        scene.add(board, "mdf");
        scene.add(bed, "aluminum");
        scene.define_material(MaterialDef {
            name: "mdf".to_string(),
            color: [0.7, 0.55, 0.4],
            metallic: 0.0,
            roughness: 0.9,
        });

        let doc = scene.to_document();
        assert_eq!(scene.len(), 2);
        assert_eq!(doc.roots.len(), 2);
        assert_eq!(doc.roots[0].material, "mdf");
        assert_eq!(doc.roots[1].material, "aluminum");
        assert_eq!(doc.roots[0].root, 1);
        assert_eq!(doc.roots[1].root, 3);
        assert_eq!(doc.nodes.len(), 3);
        assert!(doc.materials.contains_key("mdf"));
        assert!(doc.dangling_refs().is_empty());
    }
}
