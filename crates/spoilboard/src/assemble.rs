//! Sheet and bed assembly.
//!
//! Ties the pipeline together: validate, expand the pattern, filter it to
//! the sheet, cut a machining stack at every retained hole and place the
//! result so the first retained hole is the origin.

use nalgebra::{Point2, Vector2};
use spoilboard_ir::{Document, MaterialDef};
use std::fmt;
use tracing::{debug, info};

use crate::config::SpoilboardConfig;
use crate::error::{ConfigError, Result};
use crate::keepout::{KeepOut, SheetHoleSet};
use crate::pattern::{expand, BedHoleSet, HoleSpec};
use crate::profile::{synthesize, MachiningStack, ToolProfile};
use crate::{Part, Scene};

/// Material key of the spoilboard.
pub const SHEET_MATERIAL: &str = "mdf";
/// Material key of the machine bed.
pub const BED_MATERIAL: &str = "aluminum";

/// Where the sheet sits and how to find the model origin on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentReport {
    /// Bed coordinates of the sheet's reference corner.
    pub sheet_offset: Vector2<f64>,
    /// First retained hole, in sheet coordinates.
    pub reference_sheet: Point2<f64>,
    /// First retained hole, in bed coordinates.
    pub reference_bed: Point2<f64>,
    /// Holes after expansion.
    pub bed_hole_count: usize,
    /// Holes that survived the keep-out filter.
    pub sheet_hole_count: usize,
    /// Mounting holes among the survivors.
    pub mount_count: usize,
    /// Modelled stock thickness (mm).
    pub stock_thickness: f64,
    /// Stock added for the through-hole guarantee (mm).
    pub extra_stock: f64,
}

impl fmt::Display for AlignmentReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "sheet corner on bed:  ({:.2}, {:.2}) mm",
            self.sheet_offset.x, self.sheet_offset.y
        )?;
        writeln!(
            f,
            "reference hole:       ({:.2}, {:.2}) mm on the sheet, ({:.2}, {:.2}) mm on the bed",
            self.reference_sheet.x,
            self.reference_sheet.y,
            self.reference_bed.x,
            self.reference_bed.y
        )?;
        writeln!(
            f,
            "holes:                {} on the bed, {} on the sheet ({} mounting)",
            self.bed_hole_count, self.sheet_hole_count, self.mount_count
        )?;
        write!(
            f,
            "stock thickness:      {:.2} mm ({:.2} mm extra)",
            self.stock_thickness, self.extra_stock
        )
    }
}

/// Output of [`generate`].
#[derive(Debug, Clone)]
pub struct Generated {
    /// The CSG document.
    pub document: Document,
    /// Placement summary for the operator.
    pub report: AlignmentReport,
}

/// Expand the configured quadrant into every bed hole.
pub fn bed_holes(cfg: &SpoilboardConfig) -> BedHoleSet {
    let bed = expand(
        &cfg.pattern.holes,
        cfg.bed.width,
        cfg.bed.height,
        cfg.pattern.symmetric_x,
        cfg.pattern.symmetric_y,
    );
    if cfg.pattern.merge_coincident {
        bed.merge_coincident()
    } else {
        bed
    }
}

/// Keep the bed holes that fit on the sheet, in sheet coordinates.
///
/// Fails when nothing survives, since the model has no reference hole.
pub fn sheet_holes(
    cfg: &SpoilboardConfig,
    bed: &BedHoleSet,
) -> std::result::Result<SheetHoleSet, ConfigError> {
    let filter = KeepOut {
        sheet_offset: cfg.sheet_offset(),
        sheet_width: cfg.sheet.width,
        sheet_height: cfg.sheet.height,
        edge_margin: cfg.machining.edge_keepout,
        hole_radius: cfg.machining.hole_diameter / 2.0,
    };
    let holes = filter.apply(bed);
    if holes.is_empty() {
        return Err(ConfigError::NoHolesOnSheet {
            keepout: filter.distance(),
        });
    }
    Ok(holes)
}

/// The cutter solid for one hole, positioned at the hole center.
///
/// Returns `None` for an empty stack.
pub fn hole_part(name: &str, stack: &MachiningStack, hole: &HoleSpec) -> Option<Part> {
    stack
        .segments()
        .iter()
        .map(|seg| {
            let seg_name = format!("{name}-{}", seg.kind.as_str());
            let solid = if seg.is_cylinder() {
                Part::cylinder(seg_name, seg.radius_bottom, seg.height, seg.angular_resolution)
            } else {
                Part::cone(
                    seg_name,
                    seg.radius_bottom,
                    seg.radius_top,
                    seg.height,
                    seg.angular_resolution,
                )
            };
            solid.translate(0.0, 0.0, seg.z_start)
        })
        .reduce(|acc, part| acc + part)
        .map(|cutter| cutter.translate(hole.x, hole.y, 0.0).named(name))
}

fn sheet_part(cfg: &SpoilboardConfig, profile: &ToolProfile, holes: &SheetHoleSet) -> Part {
    let stock = cfg.stock_thickness();
    let width = if cfg.placement.two_pass {
        cfg.sheet.width / 2.0
    } else {
        cfg.sheet.width
    };

    let mut cutters: Option<Part> = None;
    for (i, hole) in holes.iter().enumerate() {
        let stack = synthesize(profile, hole);
        if cfg.placement.two_pass && hole.x - stack.max_radius() >= width {
            debug!(x = hole.x, y = hole.y, "hole outside the first pass");
            continue;
        }
        let name = if hole.is_mount {
            format!("mount-{i}")
        } else {
            format!("hole-{i}")
        };
        let Some(cutter) = hole_part(&name, &stack, hole) else {
            continue;
        };
        cutters = Some(match cutters {
            Some(acc) => acc + cutter,
            None => cutter,
        });
    }

    let board = Part::cube("stock", width, cfg.sheet.height, stock).translate(0.0, 0.0, -stock);
    match cutters {
        Some(cutters) => (board - cutters.named("holes")).named("spoilboard"),
        None => board.named("spoilboard"),
    }
}

/// Bed plate directly under the sheet, in sheet coordinates.
fn bed_part(cfg: &SpoilboardConfig, bed: &BedHoleSet) -> Part {
    let t = cfg.stock_thickness();
    let eps = cfg.render.epsilon;
    let radius = cfg.bed.thread_diameter / 2.0;
    let offset = cfg.sheet_offset();

    let plate = Part::cube("bed-plate", cfg.bed.width, cfg.bed.height, t);
    let threads = bed
        .iter()
        .enumerate()
        .map(|(i, h)| {
            Part::cylinder(format!("thread-{i}"), radius, t + 2.0 * eps, cfg.render.facets)
                .translate(h.x, h.y, -eps)
        })
        .reduce(|acc, part| acc + part);

    let plate = match threads {
        Some(threads) => plate - threads.named("threads"),
        None => plate,
    };
    plate
        .translate(-offset.x, -offset.y, -2.0 * t)
        .named("bed")
}

fn place(cfg: &SpoilboardConfig, mut part: Part, reference: &HoleSpec) -> Part {
    if cfg.placement.center_on_first_hole {
        part = part.translate(-reference.x, -reference.y, 0.0);
    }
    if cfg.placement.turn_model {
        part = part.rotate(0.0, 0.0, 90.0);
    }
    part
}

fn materials() -> [MaterialDef; 2] {
    [
        MaterialDef {
            name: SHEET_MATERIAL.to_string(),
            color: [0.76, 0.6, 0.42],
            metallic: 0.0,
            roughness: 0.85,
        },
        MaterialDef {
            name: BED_MATERIAL.to_string(),
            color: [0.8, 0.8, 0.82],
            metallic: 1.0,
            roughness: 0.35,
        },
    ]
}

/// Build the spoilboard document for a configuration.
pub fn generate(cfg: &SpoilboardConfig) -> Result<Generated> {
    cfg.validate()?;

    let bed = bed_holes(cfg);
    // sheet_holes rejects an empty sheet, so the reference always exists
    let holes = sheet_holes(cfg, &bed)?;
    let reference = *holes.reference().ok_or(ConfigError::NoHolesOnSheet {
        keepout: cfg.keepout(),
    })?;
    let profile = ToolProfile::from_config(cfg);
    debug!(?profile, "tool profile");

    let mut scene = Scene::new("spoilboard");
    if cfg.render.render_sheet {
        let sheet = sheet_part(cfg, &profile, &holes);
        scene.add(place(cfg, sheet, &reference), SHEET_MATERIAL);
    }
    if cfg.render.render_bed {
        let plate = bed_part(cfg, &bed);
        scene.add(place(cfg, plate, &reference), BED_MATERIAL);
    }
    for material in materials() {
        scene.define_material(material);
    }

    let offset = cfg.sheet_offset();
    let report = AlignmentReport {
        sheet_offset: offset,
        reference_sheet: reference.position(),
        reference_bed: reference.position() + offset,
        bed_hole_count: bed.len(),
        sheet_hole_count: holes.len(),
        mount_count: holes.mount_count(),
        stock_thickness: cfg.stock_thickness(),
        extra_stock: cfg.extra_stock(),
    };
    info!(
        x = report.reference_sheet.x,
        y = report.reference_sheet.y,
        "mark the zero on the spoilboard at ({:.2}, {:.2}) mm from its corner",
        report.reference_sheet.x,
        report.reference_sheet.y
    );
    info!(
        bed = report.bed_hole_count,
        sheet = report.sheet_hole_count,
        mounts = report.mount_count,
        "holes retained"
    );

    Ok(Generated {
        document: scene.to_document(),
        report,
    })
}
