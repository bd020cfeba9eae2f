//! Per-hole machining profiles.
//!
//! Every hole is cut as a stack of axisymmetric solids: a bore or a drill
//! mark at the core, and a chamfer or countersink at the surface. The stack
//! depends only on the [`ToolProfile`] and whether the hole is a mounting
//! hole, so it is computed in hole-local coordinates (axis at the origin,
//! sheet surface at `z = 0`, material below).

use crate::config::SpoilboardConfig;
use crate::geometry::{compensation_factor, cone_depth, cone_run, is_flat};
use crate::pattern::HoleSpec;

/// How the body of a hole is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Cut the full hole diameter.
    Mill,
    /// Only mark the center with the tool point, for drilling by hand.
    DrillMark,
}

/// Tool geometry and manufacturing mode, derived from a validated config.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolProfile {
    /// Body mode.
    pub mode: ToolMode,
    /// Through-hole diameter (mm).
    pub through_diameter: f64,
    /// Tool included point angle (deg).
    pub tool_angle: f64,
    /// Tool cutting diameter (mm).
    pub drill_bit_diameter: f64,
    /// Countersink depth (mm), 0 for none.
    pub countersink_depth: f64,
    /// Countersink included angle (deg).
    pub countersink_angle: f64,
    /// Screw head diameter (mm).
    pub countersink_head_diameter: f64,
    /// Chamfer depth on non-mounting holes (mm), 0 for none.
    pub chamfer_depth: f64,
    /// Chamfer included angle (deg).
    pub chamfer_angle: f64,
    /// Split countersinks for single V-bit cutting.
    pub mill_optimized: bool,
    /// Stock is thickened so holes fully penetrate.
    pub through_hole_guaranteed: bool,
    /// Deepest cut below the surface (mm).
    pub hole_depth: f64,
    /// Total stock thickness (mm).
    pub stock_thickness: f64,
    /// Facets per circle.
    pub facets: u32,
    /// Scale radii so faceted circles are not undersized.
    pub precision_compensation: bool,
    /// Overlap between neighbouring segments (mm).
    pub epsilon: f64,
}

impl ToolProfile {
    /// Derive the profile from a configuration.
    pub fn from_config(cfg: &SpoilboardConfig) -> Self {
        Self {
            mode: cfg.tool_mode(),
            through_diameter: cfg.machining.hole_diameter,
            tool_angle: cfg.tool.point_angle,
            drill_bit_diameter: cfg.tool.width,
            countersink_depth: cfg.countersink.depth,
            countersink_angle: cfg.countersink.angle,
            countersink_head_diameter: cfg.countersink.head_diameter,
            chamfer_depth: cfg.machining.chamfer_depth,
            chamfer_angle: cfg.chamfer_angle(),
            mill_optimized: cfg.machining.mill_optimized,
            through_hole_guaranteed: cfg.machining.ensure_through_holes,
            hole_depth: cfg.hole_depth(),
            stock_thickness: cfg.stock_thickness(),
            facets: cfg.render.facets,
            precision_compensation: cfg.render.precision_compensation,
            epsilon: cfg.render.epsilon,
        }
    }

    /// Depth of the tool's conical tip; 0 for flat tools.
    pub fn tool_tip_depth(&self) -> f64 {
        cone_depth(self.drill_bit_diameter / 2.0, self.tool_angle)
    }

    /// Radius scale applied to every faceted circle.
    pub fn radius_scale(&self) -> f64 {
        if self.precision_compensation {
            compensation_factor(self.facets)
        } else {
            1.0
        }
    }

    fn hole_radius(&self) -> f64 {
        self.through_diameter / 2.0
    }
}

/// What a segment of the stack cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Full-diameter bore.
    Bore,
    /// Cylindrical part of a drill mark, at tool width.
    MarkBody,
    /// Conical point of a drill mark.
    MarkTip,
    /// Bevel on a non-mounting hole.
    Chamfer,
    /// Countersink cone (or its inner part when split).
    Countersink,
    /// Outer band of a split countersink, one tool width wide.
    CountersinkOuter,
    /// Straight pocket above the countersink cone.
    Counterbore,
}

impl SegmentKind {
    /// Short name used for IR nodes.
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Bore => "bore",
            SegmentKind::MarkBody => "mark-body",
            SegmentKind::MarkTip => "mark-tip",
            SegmentKind::Chamfer => "chamfer",
            SegmentKind::Countersink => "countersink",
            SegmentKind::CountersinkOuter => "countersink-outer",
            SegmentKind::Counterbore => "counterbore",
        }
    }
}

/// One axisymmetric solid: a cylinder, cone or frustum along +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// What this segment cuts.
    pub kind: SegmentKind,
    /// Z of the bottom face.
    pub z_start: f64,
    /// Extent along +Z.
    pub height: f64,
    /// Radius at `z_start`.
    pub radius_bottom: f64,
    /// Radius at `z_start + height`.
    pub radius_top: f64,
    /// Facets used to approximate the circle.
    pub angular_resolution: u32,
}

impl Segment {
    /// Z of the top face.
    pub fn z_end(&self) -> f64 {
        self.z_start + self.height
    }

    /// Whether both radii are equal.
    pub fn is_cylinder(&self) -> bool {
        (self.radius_top - self.radius_bottom).abs() < 1e-12
    }
}

/// Segments of one hole, deepest first.
///
/// Neighbouring segments overlap by the profile's epsilon so the union is a
/// single solid, and the shallowest segment pokes the same epsilon above the
/// surface so the subtraction leaves no skin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachiningStack {
    segments: Vec<Segment>,
}

impl MachiningStack {
    /// Segments ordered from deepest to shallowest.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the hole cuts nothing.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lowest Z reached by the cut.
    pub fn bottom(&self) -> f64 {
        self.segments.first().map_or(0.0, |s| s.z_start)
    }

    /// Highest Z of the cut (just above the surface).
    pub fn top(&self) -> f64 {
        self.segments.last().map_or(0.0, |s| s.z_end())
    }

    /// Widest radius of any segment.
    pub fn max_radius(&self) -> f64 {
        self.segments
            .iter()
            .map(|s| s.radius_bottom.max(s.radius_top))
            .fold(0.0, f64::max)
    }

    /// Whether any segment is of the given kind.
    pub fn contains(&self, kind: SegmentKind) -> bool {
        self.segments.iter().any(|s| s.kind == kind)
    }
}

/// A piece of the profile in depth coordinates (positive down from the
/// surface), before compensation and overlap.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layer {
    kind: SegmentKind,
    top: f64,
    bottom: f64,
    r_top: f64,
    r_bottom: f64,
}

impl Layer {
    fn cylinder(kind: SegmentKind, top: f64, bottom: f64, radius: f64) -> Self {
        Self {
            kind,
            top,
            bottom,
            r_top: radius,
            r_bottom: radius,
        }
    }

    fn radius_at(&self, depth: f64) -> f64 {
        let t = (depth - self.top) / (self.bottom - self.top);
        self.r_top + (self.r_bottom - self.r_top) * t
    }

    /// The part of this layer deeper than `depth`, if any.
    fn below(self, depth: f64) -> Option<Self> {
        if self.bottom <= depth {
            None
        } else if self.top >= depth {
            Some(self)
        } else {
            Some(Self {
                top: depth,
                r_top: self.radius_at(depth),
                ..self
            })
        }
    }
}

/// Below this a layer is considered empty.
const MIN_LAYER: f64 = 1e-9;

/// Build the machining stack for one hole.
///
/// Assumes the profile passed validation.
pub fn synthesize(profile: &ToolProfile, hole: &HoleSpec) -> MachiningStack {
    let surface = if hole.is_mount && profile.countersink_depth > 0.0 {
        countersink_layers(profile)
    } else {
        chamfer_layers(profile)
    };
    let core = match profile.mode {
        ToolMode::Mill => mill_layers(profile),
        ToolMode::DrillMark => mark_layers(profile),
    };

    let surface_depth = surface.iter().map(|l| l.bottom).fold(0.0, f64::max);
    let mut layers = surface;
    layers.extend(core.into_iter().filter_map(|l| l.below(surface_depth)));
    layers.retain(|l| l.bottom - l.top > MIN_LAYER);
    layers.sort_by(|a, b| a.top.total_cmp(&b.top));

    to_stack(profile, &layers)
}

fn mill_layers(p: &ToolProfile) -> Vec<Layer> {
    let depth = p.hole_depth.min(p.stock_thickness + p.epsilon);
    vec![Layer::cylinder(SegmentKind::Bore, 0.0, depth, p.hole_radius())]
}

/// Point first: the tip keeps the tool angle and is only as wide as the
/// depth allows; a body at full tool width fills any remaining depth.
fn mark_layers(p: &ToolProfile) -> Vec<Layer> {
    let depth = p.hole_depth;
    let tool_radius = p.drill_bit_diameter / 2.0;
    let tip = p.tool_tip_depth().min(depth);

    let mut layers = Vec::with_capacity(2);
    if depth > tip {
        layers.push(Layer::cylinder(
            SegmentKind::MarkBody,
            0.0,
            depth - tip,
            tool_radius,
        ));
    }
    if tip > 0.0 {
        layers.push(Layer {
            kind: SegmentKind::MarkTip,
            top: depth - tip,
            bottom: depth,
            r_top: cone_run(tip, p.tool_angle),
            r_bottom: 0.0,
        });
    }
    layers
}

fn chamfer_layers(p: &ToolProfile) -> Vec<Layer> {
    if p.chamfer_depth <= 0.0 || is_flat(p.chamfer_angle) {
        return Vec::new();
    }
    let r = p.hole_radius();
    vec![Layer {
        kind: SegmentKind::Chamfer,
        top: 0.0,
        bottom: p.chamfer_depth,
        r_top: r + cone_run(p.chamfer_depth, p.chamfer_angle),
        r_bottom: r,
    }]
}

/// Counterbore on top of the cone. The cone always keeps the countersink
/// angle; when it is deeper than the countersink depth (validation off) the
/// countersink grows to fit it.
///
/// With `mill_optimized` the outer band is the single V-bit pass, one tool
/// tip deep. Both frusta share one slope since the tool angle must equal the
/// countersink angle.
fn countersink_layers(p: &ToolProfile) -> Vec<Layer> {
    let r_in = p.hole_radius();
    let r_out = p.countersink_head_diameter / 2.0;
    let cone = cone_depth(r_out - r_in, p.countersink_angle);
    let pocket = (p.countersink_depth - cone).max(0.0);

    let mut layers = vec![Layer::cylinder(SegmentKind::Counterbore, 0.0, pocket, r_out)];

    let tool_tip = p.tool_tip_depth();
    if p.mill_optimized && tool_tip > 0.0 && tool_tip < cone {
        let r_split = r_out - cone_run(tool_tip, p.countersink_angle);
        layers.push(Layer {
            kind: SegmentKind::CountersinkOuter,
            top: pocket,
            bottom: pocket + tool_tip,
            r_top: r_out,
            r_bottom: r_split,
        });
        layers.push(Layer {
            kind: SegmentKind::Countersink,
            top: pocket + tool_tip,
            bottom: pocket + cone,
            r_top: r_split,
            r_bottom: r_in,
        });
    } else {
        layers.push(Layer {
            kind: SegmentKind::Countersink,
            top: pocket,
            bottom: pocket + cone,
            r_top: r_out,
            r_bottom: r_in,
        });
    }
    layers
}

/// Convert surface-down layers into Z segments, deepest first, applying
/// radius compensation and the epsilon overlap.
fn to_stack(p: &ToolProfile, layers: &[Layer]) -> MachiningStack {
    let scale = p.radius_scale();
    let eps = p.epsilon;
    let last = layers.len().saturating_sub(1);

    let segments = layers
        .iter()
        .rev()
        .enumerate()
        .map(|(i, layer)| {
            let mut z_start = -layer.bottom;
            let mut z_end = -layer.top;
            let mut r_bottom = layer.r_bottom * scale;
            let mut r_top = layer.r_top * scale;
            let slope = (r_top - r_bottom) / (z_end - z_start);

            if i > 0 {
                z_start -= eps;
                r_bottom = (r_bottom - slope * eps).max(0.0);
            }
            if i == last {
                z_end += eps;
                r_top += slope * eps;
            }

            Segment {
                kind: layer.kind,
                z_start,
                height: z_end - z_start,
                radius_bottom: r_bottom,
                radius_top: r_top,
                angular_resolution: p.facets,
            }
        })
        .collect();

    MachiningStack { segments }
}
