//! Error types for spoilboard generation.

use thiserror::Error;

/// Horizontal axis of the machine bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Bed X axis (width).
    X,
    /// Bed Y axis (height).
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("X"),
            Axis::Y => f.write_str("Y"),
        }
    }
}

/// A configuration that cannot be manufactured.
///
/// Every variant names the offending parameter and the limit it violated.
/// Generation stops at the first one; no geometry is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Mark-only and mill-optimized modes were both requested.
    #[error("machining.mark_only and machining.mill_optimized are mutually exclusive")]
    ConflictingModes,

    /// An included tool angle is outside `[0, 180]` degrees.
    #[error("{parameter} = {value} deg is out of range, expected 0..=180")]
    AngleOutOfRange {
        /// Parameter path, e.g. `tool.point_angle`.
        parameter: &'static str,
        /// Supplied angle in degrees.
        value: f64,
    },

    /// Mill-optimized mode needs a tool whose tip matches the countersink.
    #[error(
        "mill-optimized mode requires tool.point_angle ({tool_angle} deg) to equal \
         countersink.angle ({countersink_angle} deg)"
    )]
    ToolAngleMismatch {
        /// Tool included angle in degrees.
        tool_angle: f64,
        /// Countersink included angle in degrees.
        countersink_angle: f64,
    },

    /// The sheet does not fit on the bed.
    #[error(
        "sheet is larger than the bed along {axis}: {sheet} mm > {bed} mm \
         (set sheet.allow_oversize to override)"
    )]
    SheetExceedsBed {
        /// Axis that overflows.
        axis: Axis,
        /// Sheet size along the axis.
        sheet: f64,
        /// Bed size along the axis.
        bed: f64,
    },

    /// The countersink is deeper than the material that may be cut.
    #[error(
        "max hole depth is not deep enough for the countersink: countersink.depth = {depth} mm, \
         usable depth is {max_depth} mm (reduce the countersink or enable \
         machining.ensure_through_holes)"
    )]
    CountersinkTooDeep {
        /// Requested countersink depth.
        depth: f64,
        /// Usable material depth.
        max_depth: f64,
    },

    /// The countersink cone does not fit within the countersink depth.
    #[error(
        "countersink is too shallow for this angle: countersink.depth = {depth} mm, \
         min countersink.depth: {required} mm"
    )]
    CountersinkTooShallow {
        /// Configured countersink depth.
        depth: f64,
        /// Depth of the cone implied by head width, hole diameter and angle.
        required: f64,
    },

    /// The screw head is narrower than the hole it sits in.
    #[error(
        "countersink.head_diameter = {head} mm is smaller than \
         machining.hole_diameter = {hole} mm"
    )]
    HeadNarrowerThanHole {
        /// Screw head diameter.
        head: f64,
        /// Through-hole diameter.
        hole: f64,
    },

    /// A dimension that must be strictly positive is not.
    #[error("{parameter} must be greater than 0, got {value}")]
    NotPositive {
        /// Parameter path.
        parameter: &'static str,
        /// Supplied value.
        value: f64,
    },

    /// A margin or clearance that must not be negative is.
    #[error("{parameter} must not be negative, got {value}")]
    Negative {
        /// Parameter path.
        parameter: &'static str,
        /// Supplied value.
        value: f64,
    },

    /// Too few facets to approximate a circle.
    #[error("render.facets must be at least 3, got {0}")]
    TooFewFacets(u32),

    /// Neither the sheet nor the bed would be rendered.
    #[error("nothing to render: enable render.render_sheet or render.render_bed")]
    NothingToRender,

    /// Every hole was dropped by the edge keep-out filter.
    #[error(
        "no hole of the pattern lies on the sheet with a {keepout} mm keep-out; \
         an alignment reference hole is required"
    )]
    NoHolesOnSheet {
        /// Effective keep-out distance (margin plus hole radius).
        keepout: f64,
    },
}

/// Errors returned by configuration loading and generation.
#[derive(Error, Debug)]
pub enum SpoilboardError {
    /// The configuration is not manufacturable.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be written as TOML.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Result type for spoilboard operations.
pub type Result<T> = std::result::Result<T, SpoilboardError>;
