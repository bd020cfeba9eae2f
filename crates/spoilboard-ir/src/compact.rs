//! Compact line-based text form of a [`Document`].
//!
//! One geometry node per line; a node's id in the text is its zero-based
//! position among geometry lines. Nodes are written dependencies first.
//!
//! ```text
//! # spoilboard-ir 0.1
//! M name r g b metallic roughness    # Material
//! C sx sy sz ["name"]                # Cube (corner at origin)
//! Y r h segments ["name"]            # Cylinder
//! K rb rt h segments ["name"]        # Cone / frustum
//! E ["name"]                         # Empty
//! U a b ["name"]                     # Union
//! D a b ["name"]                     # Difference
//! T n dx dy dz ["name"]              # Translate
//! R n rx ry rz ["name"]              # Rotate (degrees)
//! ROOT n material                    # Scene root
//! ```
//!
//! [`from_compact`] assigns node ids `line + 1`, so a document whose ids are
//! already numbered from 1 in dependency order survives a round trip
//! unchanged.

use crate::{CsgOp, Document, MaterialDef, Node, NodeId, SceneEntry, Vec3};
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write as FmtWrite};

/// Current compact format version.
pub const COMPACT_VERSION: &str = "0.1";

/// Error type for compact IR parsing and formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactParseError {
    /// Line number where the error occurred (0-indexed, 0 when formatting).
    pub line: usize,
    /// Description of the error.
    pub message: String,
}

impl fmt::Display for CompactParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for CompactParseError {}

fn err(line: usize, message: impl Into<String>) -> CompactParseError {
    CompactParseError {
        line,
        message: message.into(),
    }
}

/// Convert a Document to compact text.
///
/// Fails on dangling references or cycles.
pub fn to_compact(doc: &Document) -> Result<String, CompactParseError> {
    let mut output = String::new();

    // Writing into a String cannot fail; results of write! are ignored below.
    let _ = writeln!(output, "# spoilboard-ir {}", COMPACT_VERSION);

    if !doc.materials.is_empty() {
        let _ = writeln!(output, "\n# Materials");
        for mat in doc.materials.values() {
            let _ = writeln!(
                output,
                "M {} {} {} {} {} {}",
                escape_id(&mat.name),
                mat.color[0],
                mat.color[1],
                mat.color[2],
                mat.metallic,
                mat.roughness
            );
        }
    }

    let sorted = topological_sort(doc)?;
    let id_map: HashMap<NodeId, usize> =
        sorted.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    if !sorted.is_empty() {
        let _ = writeln!(output, "\n# Geometry");
        for id in &sorted {
            let node = &doc.nodes[id];
            let line = format_op(&node.op, &id_map, node.name.as_deref())?;
            let _ = writeln!(output, "{}", line);
        }
    }

    if !doc.roots.is_empty() {
        let _ = writeln!(output, "\n# Scene");
        for entry in &doc.roots {
            let mapped = id_map
                .get(&entry.root)
                .ok_or_else(|| err(0, format!("unknown root node {}", entry.root)))?;
            let _ = writeln!(output, "ROOT {} {}", mapped, escape_id(&entry.material));
        }
    }

    while output.ends_with('\n') {
        output.pop();
    }
    Ok(output)
}

/// Parse compact text into a Document.
pub fn from_compact(s: &str) -> Result<Document, CompactParseError> {
    let mut doc = Document::new();
    let mut geometry_count: u64 = 0;

    for (line_num, line) in s.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let parts = split_line_respecting_quotes(trimmed);
        match parts[0] {
            "M" => parse_material(&mut doc, &parts, line_num)?,
            "ROOT" => {
                if parts.len() != 3 {
                    return Err(err(
                        line_num,
                        format!("ROOT requires 2 args, got {}", parts.len() - 1),
                    ));
                }
                doc.roots.push(SceneEntry {
                    root: parse_ref(parts[1], geometry_count, line_num)?,
                    material: parse_string_arg(parts[2]),
                });
            }
            _ => {
                let (args, name) = extract_trailing_name(&parts);
                let op = parse_geometry(&args, geometry_count, line_num)?;
                let id = geometry_count + 1;
                doc.nodes.insert(id, Node { id, name, op });
                geometry_count += 1;
            }
        }
    }

    Ok(doc)
}

/// Dependencies-first ordering. Nodes are visited in ascending id order so
/// documents that are already numbered bottom-up keep their order.
fn topological_sort(doc: &Document) -> Result<Vec<NodeId>, CompactParseError> {
    fn visit(
        id: NodeId,
        doc: &Document,
        visited: &mut HashSet<NodeId>,
        in_progress: &mut HashSet<NodeId>,
        result: &mut Vec<NodeId>,
    ) -> Result<(), CompactParseError> {
        if visited.contains(&id) {
            return Ok(());
        }
        if !in_progress.insert(id) {
            return Err(err(0, format!("cycle detected at node {}", id)));
        }
        let node = doc
            .nodes
            .get(&id)
            .ok_or_else(|| err(0, format!("unknown node {}", id)))?;
        for child in node.op.children() {
            visit(child, doc, visited, in_progress, result)?;
        }
        in_progress.remove(&id);
        visited.insert(id);
        result.push(id);
        Ok(())
    }

    let mut result = Vec::with_capacity(doc.nodes.len());
    let mut visited = HashSet::new();
    let mut in_progress = HashSet::new();
    for &id in doc.nodes.keys() {
        visit(id, doc, &mut visited, &mut in_progress, &mut result)?;
    }
    Ok(result)
}

fn format_op(
    op: &CsgOp,
    id_map: &HashMap<NodeId, usize>,
    name: Option<&str>,
) -> Result<String, CompactParseError> {
    let suffix = name
        .map(|n| format!(" {}", format_quoted_string(n)))
        .unwrap_or_default();
    let lookup = |id: &NodeId| {
        id_map
            .get(id)
            .copied()
            .ok_or_else(|| err(0, format!("unknown node {}", id)))
    };

    let body = match op {
        CsgOp::Cube { size } => format!("C {} {} {}", size.x, size.y, size.z),
        CsgOp::Cylinder {
            radius,
            height,
            segments,
        } => format!("Y {} {} {}", radius, height, segments),
        CsgOp::Cone {
            radius_bottom,
            radius_top,
            height,
            segments,
        } => format!(
            "K {} {} {} {}",
            radius_bottom, radius_top, height, segments
        ),
        CsgOp::Empty => "E".to_string(),
        CsgOp::Union { left, right } => format!("U {} {}", lookup(left)?, lookup(right)?),
        CsgOp::Difference { left, right } => {
            format!("D {} {}", lookup(left)?, lookup(right)?)
        }
        CsgOp::Translate { child, offset } => format!(
            "T {} {} {} {}",
            lookup(child)?,
            offset.x,
            offset.y,
            offset.z
        ),
        CsgOp::Rotate { child, angles } => format!(
            "R {} {} {} {}",
            lookup(child)?,
            angles.x,
            angles.y,
            angles.z
        ),
    };
    Ok(format!("{}{}", body, suffix))
}

fn parse_geometry(
    parts: &[&str],
    defined: u64,
    line: usize,
) -> Result<CsgOp, CompactParseError> {
    let opcode = parts[0];
    let expect = |n: usize| {
        if parts.len() == n + 1 {
            Ok(())
        } else {
            Err(err(
                line,
                format!("{} requires {} args, got {}", opcode, n, parts.len() - 1),
            ))
        }
    };
    let vec3 = |at: usize| -> Result<Vec3, CompactParseError> {
        Ok(Vec3::new(
            parse_f64(parts[at], line)?,
            parse_f64(parts[at + 1], line)?,
            parse_f64(parts[at + 2], line)?,
        ))
    };

    match opcode {
        "C" => {
            expect(3)?;
            Ok(CsgOp::Cube { size: vec3(1)? })
        }
        "Y" => {
            expect(3)?;
            Ok(CsgOp::Cylinder {
                radius: parse_f64(parts[1], line)?,
                height: parse_f64(parts[2], line)?,
                segments: parse_u32(parts[3], line)?,
            })
        }
        "K" => {
            expect(4)?;
            Ok(CsgOp::Cone {
                radius_bottom: parse_f64(parts[1], line)?,
                radius_top: parse_f64(parts[2], line)?,
                height: parse_f64(parts[3], line)?,
                segments: parse_u32(parts[4], line)?,
            })
        }
        "E" => {
            expect(0)?;
            Ok(CsgOp::Empty)
        }
        "U" | "D" => {
            expect(2)?;
            let left = parse_ref(parts[1], defined, line)?;
            let right = parse_ref(parts[2], defined, line)?;
            Ok(if opcode == "U" {
                CsgOp::Union { left, right }
            } else {
                CsgOp::Difference { left, right }
            })
        }
        "T" => {
            expect(4)?;
            Ok(CsgOp::Translate {
                child: parse_ref(parts[1], defined, line)?,
                offset: vec3(2)?,
            })
        }
        "R" => {
            expect(4)?;
            Ok(CsgOp::Rotate {
                child: parse_ref(parts[1], defined, line)?,
                angles: vec3(2)?,
            })
        }
        other => Err(err(line, format!("unknown opcode: {}", other))),
    }
}

fn parse_material(
    doc: &mut Document,
    parts: &[&str],
    line: usize,
) -> Result<(), CompactParseError> {
    if parts.len() != 7 {
        return Err(err(
            line,
            format!("M requires 6 args, got {}", parts.len() - 1),
        ));
    }
    let name = parse_string_arg(parts[1]);
    doc.materials.insert(
        name.clone(),
        MaterialDef {
            name,
            color: [
                parse_f64(parts[2], line)?,
                parse_f64(parts[3], line)?,
                parse_f64(parts[4], line)?,
            ],
            metallic: parse_f64(parts[5], line)?,
            roughness: parse_f64(parts[6], line)?,
        },
    );
    Ok(())
}

/// Resolve a line reference; only earlier geometry lines may be referenced.
fn parse_ref(s: &str, defined: u64, line: usize) -> Result<NodeId, CompactParseError> {
    let index: u64 = s
        .parse()
        .map_err(|_| err(line, format!("invalid node reference: {}", s)))?;
    if index >= defined {
        return Err(err(line, format!("forward reference to node {}", index)));
    }
    Ok(index + 1)
}

fn escape_id(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) || s.contains('"') {
        format_quoted_string(s)
    } else {
        s.to_string()
    }
}

fn format_quoted_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn parse_string_arg(s: &str) -> String {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\\\"", "\"").replace("\\\\", "\\")
    } else {
        s.to_string()
    }
}

fn extract_trailing_name<'a>(parts: &[&'a str]) -> (Vec<&'a str>, Option<String>) {
    match parts.last() {
        Some(last) if parts.len() > 1 && last.starts_with('"') && last.ends_with('"') => {
            (parts[..parts.len() - 1].to_vec(), Some(parse_string_arg(last)))
        }
        _ => (parts.to_vec(), None),
    }
}

/// Split on whitespace, keeping quoted strings (with escapes) together.
fn split_line_respecting_quotes(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let start = i;
        if bytes[i] == b'"' {
            i += 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i = (i + 1).min(bytes.len());
        } else {
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
        }
        parts.push(&line[start..i]);
    }
    parts
}

fn parse_f64(s: &str, line: usize) -> Result<f64, CompactParseError> {
    s.parse()
        .map_err(|_| err(line, format!("invalid number: {}", s)))
}

fn parse_u32(s: &str, line: usize) -> Result<u32, CompactParseError> {
    s.parse()
        .map_err(|_| err(line, format!("invalid integer: {}", s)))
}
