//! Generator configuration.
//!
//! A configuration is a plain data record, normally loaded from a TOML
//! preset. Every section has `#[serde(default)]`, so a preset only needs to
//! list what differs from the reference machine (a Genmitsu 3030-Pro bed
//! with a 355 x 280 mm sheet of 5.9 mm MDF).

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::geometry::cone_depth;
use crate::pattern::HoleSpec;
use crate::profile::ToolMode;

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpoilboardConfig {
    /// Machine bed.
    pub bed: BedConfig,
    /// Spoilboard sheet stock.
    pub sheet: SheetConfig,
    /// Where the sheet sits on the bed and how the model is oriented.
    pub placement: PlacementConfig,
    /// Authored quadrant of the hole pattern.
    pub pattern: PatternConfig,
    /// Countersink for the mounting screws.
    pub countersink: CountersinkConfig,
    /// Cutting tool.
    pub tool: ToolConfig,
    /// Hole machining parameters and mode flags.
    pub machining: MachiningConfig,
    /// Output resolution and which solids to emit.
    pub render: RenderConfig,
}

/// Machine bed dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BedConfig {
    /// Bed size along X (mm).
    pub width: f64,
    /// Bed size along Y (mm).
    pub height: f64,
    /// Nominal diameter of the bed's threaded holes (mm).
    pub thread_diameter: f64,
}

impl Default for BedConfig {
    fn default() -> Self {
        Self {
            width: 360.0,
            height: 300.0,
            thread_diameter: 6.0,
        }
    }
}

/// Spoilboard sheet stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetConfig {
    /// Sheet size along X (mm).
    pub width: f64,
    /// Sheet size along Y (mm).
    pub height: f64,
    /// Nominal material thickness (mm).
    pub thickness: f64,
    /// Accept a sheet larger than the bed.
    pub allow_oversize: bool,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            width: 355.0,
            height: 280.0,
            thickness: 5.9,
            allow_oversize: false,
        }
    }
}

/// Sheet placement and final model orientation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Center the sheet on the bed. When false, `corner_x`/`corner_y` apply.
    pub center_sheet: bool,
    /// Bed X coordinate of the sheet's reference corner (mm).
    pub corner_x: f64,
    /// Bed Y coordinate of the sheet's reference corner (mm).
    pub corner_y: f64,
    /// Move the model so the first retained hole sits at the origin.
    pub center_on_first_hole: bool,
    /// Rotate the finished model 90 degrees about Z.
    pub turn_model: bool,
    /// Emit only half of the sheet (split along X) for two-pass milling.
    pub two_pass: bool,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            center_sheet: true,
            corner_x: 2.5,
            corner_y: 10.0,
            center_on_first_hole: true,
            turn_model: false,
            two_pass: false,
        }
    }
}

/// One quadrant of the bed's hole pattern plus its symmetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Mirror the authored holes across the bed's vertical center line.
    pub symmetric_x: bool,
    /// Mirror across the horizontal center line.
    pub symmetric_y: bool,
    /// Drop exact duplicates produced by holes lying on a symmetry line.
    pub merge_coincident: bool,
    /// Authored holes as `[x, y, mount]`, measured from the bed corner.
    pub holes: Vec<HoleSpec>,
}

impl Default for PatternConfig {
    fn default() -> Self {
        let h = HoleSpec::new;
        Self {
            symmetric_x: true,
            symmetric_y: true,
            merge_coincident: false,
            holes: vec![
                h(20.0, 20.0, true),
                h(80.0, 20.0, false),
                h(140.0, 20.0, false),
                h(50.0, 45.0, false),
                h(110.0, 45.0, false),
                h(20.0, 70.0, false),
                h(80.0, 70.0, false),
                h(140.0, 70.0, false),
                h(110.0, 97.5, false),
                h(70.0, 108.0, false),
                h(20.0, 125.0, false),
                h(140.0, 125.0, false),
                h(70.0, 150.0, false),
                h(110.0, 150.0, false),
            ],
        }
    }
}

/// Countersink for the screws that hold the sheet down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountersinkConfig {
    /// Total countersink depth (mm). 0 disables countersinks.
    pub depth: f64,
    /// Screw head diameter, including any tolerance (mm).
    pub head_diameter: f64,
    /// Included angle (deg). 0 gives a straight counterbore pocket.
    pub angle: f64,
    /// Check that the countersink fits the material and its own cone.
    pub validate_depth: bool,
}

impl Default for CountersinkConfig {
    fn default() -> Self {
        Self {
            depth: 3.5,
            head_diameter: 12.0,
            angle: 90.0,
            validate_depth: true,
        }
    }
}

/// The cutting tool used for marks, bores and countersinks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Included point angle (deg). 0 or 180 means a flat end mill.
    pub point_angle: f64,
    /// Cutting diameter (mm).
    pub width: f64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            point_angle: 90.0,
            width: 6.35,
        }
    }
}

/// Hole dimensions, depths, clearances and manufacturing mode flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachiningConfig {
    /// Through-hole diameter (mm).
    pub hole_diameter: f64,
    /// Maximum hole depth; ignored when through holes are guaranteed (mm).
    pub depth_limit: f64,
    /// Depth of the chamfer on non-mounting holes (mm). 0 disables it.
    pub chamfer_depth: f64,
    /// Chamfer included angle (deg). Defaults to the tool point angle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chamfer_angle: Option<f64>,
    /// Minimum distance from a hole's edge to the sheet edge (mm).
    pub edge_keepout: f64,
    /// How far the tool tip goes below the nominal stock (mm).
    pub through_hole_tool_clearance: f64,
    /// Material left between the deepest cut and the machine bed (mm).
    pub bed_clearance: f64,
    /// Thicken the stock so every hole fully penetrates the sheet.
    pub ensure_through_holes: bool,
    /// Only mark hole centers for manual drilling.
    pub mark_only: bool,
    /// Shape countersinks so a single V-bit can cut them.
    pub mill_optimized: bool,
}

impl Default for MachiningConfig {
    fn default() -> Self {
        Self {
            hole_diameter: 7.0,
            depth_limit: 5.0,
            chamfer_depth: 0.5,
            chamfer_angle: None,
            edge_keepout: 6.0,
            through_hole_tool_clearance: 0.5,
            bed_clearance: 1.0,
            ensure_through_holes: false,
            mark_only: false,
            mill_optimized: false,
        }
    }
}

/// Output resolution and solid selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Facets used for every circular segment.
    pub facets: u32,
    /// Enlarge faceted radii so polygons are never undersized.
    pub precision_compensation: bool,
    /// Overlap between stacked segments and above the surface (mm).
    pub epsilon: f64,
    /// Emit the spoilboard.
    pub render_sheet: bool,
    /// Emit the machine bed reference model.
    pub render_bed: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            facets: 36,
            precision_compensation: true,
            epsilon: 0.01,
            render_sheet: true,
            render_bed: false,
        }
    }
}

impl SpoilboardConfig {
    /// Parse a TOML preset.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load a TOML preset from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Serialize as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Chamfer included angle, falling back to the tool point angle.
    pub fn chamfer_angle(&self) -> f64 {
        self.machining.chamfer_angle.unwrap_or(self.tool.point_angle)
    }

    /// How the hole bodies are cut.
    pub fn tool_mode(&self) -> ToolMode {
        if self.machining.mark_only {
            ToolMode::DrillMark
        } else {
            ToolMode::Mill
        }
    }

    /// Depth of the tool's conical tip (0 for flat tools).
    pub fn tool_tip_depth(&self) -> f64 {
        cone_depth(self.tool.width / 2.0, self.tool.point_angle)
    }

    /// Stock added under the nominal sheet for the through-hole guarantee.
    pub fn extra_stock(&self) -> f64 {
        if self.machining.ensure_through_holes {
            self.machining.through_hole_tool_clearance
                + self.tool_tip_depth()
                + self.machining.bed_clearance
        } else {
            0.0
        }
    }

    /// Total modelled stock thickness.
    pub fn stock_thickness(&self) -> f64 {
        self.sheet.thickness + self.extra_stock()
    }

    /// Deepest a hole may be cut, measured from the sheet surface.
    pub fn hole_depth(&self) -> f64 {
        if self.machining.ensure_through_holes {
            self.stock_thickness() - self.machining.bed_clearance
        } else {
            self.machining
                .depth_limit
                .min(self.sheet.thickness - self.machining.bed_clearance)
        }
    }

    /// Bed coordinates of the sheet's reference corner.
    pub fn sheet_offset(&self) -> Vector2<f64> {
        if self.placement.center_sheet {
            Vector2::new(
                (self.bed.width - self.sheet.width) / 2.0,
                (self.bed.height - self.sheet.height) / 2.0,
            )
        } else {
            Vector2::new(self.placement.corner_x, self.placement.corner_y)
        }
    }

    /// Minimum distance from a hole center to the sheet edge.
    pub fn keepout(&self) -> f64 {
        self.machining.edge_keepout + self.machining.hole_diameter / 2.0
    }
}
