//! Configuration feasibility checks.
//!
//! Runs before any geometry is built and stops at the first problem.

use crate::config::SpoilboardConfig;
use crate::error::{Axis, ConfigError};
use crate::geometry::cone_depth;

type Check = Result<(), ConfigError>;

fn positive(parameter: &'static str, value: f64) -> Check {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { parameter, value })
    }
}

fn non_negative(parameter: &'static str, value: f64) -> Check {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { parameter, value })
    }
}

fn angle(parameter: &'static str, value: f64) -> Check {
    if (0.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::AngleOutOfRange { parameter, value })
    }
}

impl SpoilboardConfig {
    /// Check that the configuration can be manufactured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_dimensions()?;
        self.validate_modes()?;
        self.validate_angles()?;
        self.validate_footprint()?;
        self.validate_countersink()
    }

    fn validate_dimensions(&self) -> Check {
        positive("bed.width", self.bed.width)?;
        positive("bed.height", self.bed.height)?;
        positive("bed.thread_diameter", self.bed.thread_diameter)?;
        positive("sheet.width", self.sheet.width)?;
        positive("sheet.height", self.sheet.height)?;
        positive("sheet.thickness", self.sheet.thickness)?;
        positive("machining.hole_diameter", self.machining.hole_diameter)?;
        positive("machining.depth_limit", self.machining.depth_limit)?;
        positive("tool.width", self.tool.width)?;
        non_negative("machining.chamfer_depth", self.machining.chamfer_depth)?;
        non_negative("machining.edge_keepout", self.machining.edge_keepout)?;
        non_negative(
            "machining.through_hole_tool_clearance",
            self.machining.through_hole_tool_clearance,
        )?;
        non_negative("machining.bed_clearance", self.machining.bed_clearance)?;
        non_negative("countersink.depth", self.countersink.depth)?;
        non_negative("render.epsilon", self.render.epsilon)?;
        positive(
            "hole depth (sheet.thickness - machining.bed_clearance)",
            self.hole_depth(),
        )?;
        if self.render.facets < 3 {
            return Err(ConfigError::TooFewFacets(self.render.facets));
        }
        if !self.render.render_sheet && !self.render.render_bed {
            return Err(ConfigError::NothingToRender);
        }
        Ok(())
    }

    fn validate_modes(&self) -> Check {
        if self.machining.mark_only && self.machining.mill_optimized {
            return Err(ConfigError::ConflictingModes);
        }
        Ok(())
    }

    fn validate_angles(&self) -> Check {
        angle("tool.point_angle", self.tool.point_angle)?;
        angle("countersink.angle", self.countersink.angle)?;
        angle("machining.chamfer_angle", self.chamfer_angle())?;
        if self.machining.mill_optimized && self.tool.point_angle != self.countersink.angle {
            return Err(ConfigError::ToolAngleMismatch {
                tool_angle: self.tool.point_angle,
                countersink_angle: self.countersink.angle,
            });
        }
        Ok(())
    }

    fn validate_footprint(&self) -> Check {
        if self.sheet.allow_oversize {
            return Ok(());
        }
        if self.sheet.width > self.bed.width {
            return Err(ConfigError::SheetExceedsBed {
                axis: Axis::X,
                sheet: self.sheet.width,
                bed: self.bed.width,
            });
        }
        if self.sheet.height > self.bed.height {
            return Err(ConfigError::SheetExceedsBed {
                axis: Axis::Y,
                sheet: self.sheet.height,
                bed: self.bed.height,
            });
        }
        Ok(())
    }

    fn validate_countersink(&self) -> Check {
        let cs = &self.countersink;
        if !cs.validate_depth || cs.depth <= 0.0 {
            return Ok(());
        }
        if cs.head_diameter < self.machining.hole_diameter {
            return Err(ConfigError::HeadNarrowerThanHole {
                head: cs.head_diameter,
                hole: self.machining.hole_diameter,
            });
        }
        if !self.machining.ensure_through_holes && cs.depth > self.hole_depth() {
            return Err(ConfigError::CountersinkTooDeep {
                depth: cs.depth,
                max_depth: self.hole_depth(),
            });
        }
        let required = cone_depth(
            (cs.head_diameter - self.machining.hole_diameter) / 2.0,
            cs.angle,
        );
        if required > cs.depth {
            return Err(ConfigError::CountersinkTooShallow {
                depth: cs.depth,
                required,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SpoilboardConfig {
        SpoilboardConfig::default()
    }

    #[test]
    fn reference_preset_is_valid() {
        assert_eq!(cfg().validate(), Ok(()));
    }

    #[test]
    fn mark_only_and_mill_optimized_conflict() {
        let mut c = cfg();
        c.machining.mark_only = true;
        c.machining.mill_optimized = true;
        assert_eq!(c.validate(), Err(ConfigError::ConflictingModes));
    }

    #[test]
    fn angles_must_be_in_range() {
        let mut c = cfg();
        c.tool.point_angle = 190.0;
        c.machining.chamfer_angle = Some(90.0);
        assert_eq!(
            c.validate(),
            Err(ConfigError::AngleOutOfRange {
                parameter: "tool.point_angle",
                value: 190.0
            })
        );

        let mut c = cfg();
        c.countersink.angle = -10.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::AngleOutOfRange {
                parameter: "countersink.angle",
                ..
            })
        ));

        let mut c = cfg();
        c.machining.chamfer_angle = Some(181.0);
        assert!(matches!(
            c.validate(),
            Err(ConfigError::AngleOutOfRange {
                parameter: "machining.chamfer_angle",
                ..
            })
        ));
    }

    #[test]
    fn boundary_angles_are_accepted() {
        let mut c = cfg();
        c.tool.point_angle = 180.0;
        c.machining.chamfer_angle = Some(0.0);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn mill_optimized_needs_matching_angles() {
        let mut c = cfg();
        c.machining.mill_optimized = true;
        assert_eq!(c.validate(), Ok(()));

        c.tool.point_angle = 60.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::ToolAngleMismatch {
                tool_angle: 60.0,
                countersink_angle: 90.0
            })
        );
    }

    #[test]
    fn oversize_sheet_needs_override() {
        let mut c = cfg();
        c.sheet.height = 310.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::SheetExceedsBed {
                axis: Axis::Y,
                sheet: 310.0,
                bed: 300.0
            })
        );
        c.sheet.allow_oversize = true;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn countersink_deeper_than_material() {
        let mut c = cfg();
        c.countersink.depth = 5.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::CountersinkTooDeep {
                depth: 5.0,
                max_depth: c.hole_depth()
            })
        );
    }

    #[test]
    fn through_holes_lift_the_depth_limit() {
        let mut c = cfg();
        c.countersink.depth = 5.5;
        c.machining.ensure_through_holes = true;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn countersink_feasibility_boundary() {
        // (12 - 7) / 2 / tan(45 deg) = 2.5 mm
        let required = cone_depth(2.5, 90.0);

        let mut accept = cfg();
        accept.countersink.depth = required + 1e-6;
        assert_eq!(accept.validate(), Ok(()));

        let mut exact = cfg();
        exact.countersink.depth = required;
        assert_eq!(exact.validate(), Ok(()));

        let mut reject = cfg();
        reject.countersink.depth = required - 1e-6;
        match reject.validate() {
            Err(ConfigError::CountersinkTooShallow { depth, required: r }) => {
                assert_eq!(depth, required - 1e-6);
                assert_eq!(r, required);
            }
            other => panic!("expected CountersinkTooShallow, got {other:?}"),
        }
    }

    #[test]
    fn steeper_countersink_needs_more_depth() {
        let mut c = cfg();
        c.countersink.angle = 60.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::CountersinkTooShallow { .. })
        ));
    }

    #[test]
    fn countersink_checks_can_be_disabled() {
        let mut c = cfg();
        c.countersink.depth = 1.0;
        c.countersink.validate_depth = false;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn straight_pocket_skips_cone_check() {
        let mut c = cfg();
        c.countersink.angle = 0.0;
        c.countersink.depth = 1.0;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn head_must_cover_hole() {
        let mut c = cfg();
        c.countersink.head_diameter = 6.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::HeadNarrowerThanHole {
                head: 6.0,
                hole: 7.0
            })
        );
    }

    #[test]
    fn dimensions_must_be_positive() {
        let mut c = cfg();
        c.sheet.thickness = 0.0;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::NotPositive {
                parameter: "sheet.thickness",
                ..
            })
        ));

        let mut c = cfg();
        c.machining.edge_keepout = -1.0;
        assert_eq!(
            c.validate(),
            Err(ConfigError::Negative {
                parameter: "machining.edge_keepout",
                value: -1.0
            })
        );
    }

    #[test]
    fn facets_and_outputs() {
        let mut c = cfg();
        c.render.facets = 2;
        assert_eq!(c.validate(), Err(ConfigError::TooFewFacets(2)));

        let mut c = cfg();
        c.render.render_sheet = false;
        assert_eq!(c.validate(), Err(ConfigError::NothingToRender));
        c.render.render_bed = true;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn error_message_names_parameter_and_minimum() {
        let mut c = cfg();
        c.countersink.depth = 2.0;
        let message = c.validate().unwrap_err().to_string();
        assert!(message.contains("countersink.depth"));
        assert!(message.contains("min countersink.depth: 2.5"));
    }
}
