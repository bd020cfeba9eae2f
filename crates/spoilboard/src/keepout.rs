//! Edge keep-out filtering.
//!
//! A sheet smaller than the bed cannot carry every bed hole: holes that
//! would cut too close to (or past) the sheet edge are dropped.

use nalgebra::Vector2;
use tracing::debug;

use crate::pattern::{BedHoleSet, HoleSpec};

/// Holes that survive on the sheet, in sheet-local coordinates.
///
/// Order follows the bed expansion order. The first hole is the alignment
/// reference for the whole model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetHoleSet {
    holes: Vec<HoleSpec>,
}

impl SheetHoleSet {
    /// Holes in bed expansion order.
    pub fn holes(&self) -> &[HoleSpec] {
        &self.holes
    }

    /// Iterate in order.
    pub fn iter(&self) -> std::slice::Iter<'_, HoleSpec> {
        self.holes.iter()
    }

    /// Number of retained holes.
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// Whether every hole was dropped.
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// The alignment reference hole.
    pub fn reference(&self) -> Option<&HoleSpec> {
        self.holes.first()
    }

    /// Number of mounting holes.
    pub fn mount_count(&self) -> usize {
        self.holes.iter().filter(|h| h.is_mount).count()
    }
}

impl<'a> IntoIterator for &'a SheetHoleSet {
    type Item = &'a HoleSpec;
    type IntoIter = std::slice::Iter<'a, HoleSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.holes.iter()
    }
}

/// Sheet outline and the clearance every hole must keep from its edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeepOut {
    /// Bed coordinates of the sheet's reference corner.
    pub sheet_offset: Vector2<f64>,
    /// Sheet width (mm).
    pub sheet_width: f64,
    /// Sheet height (mm).
    pub sheet_height: f64,
    /// Required material between a hole's edge and the sheet edge (mm).
    pub edge_margin: f64,
    /// Hole radius (mm).
    pub hole_radius: f64,
}

impl KeepOut {
    /// Minimum distance from a hole center to any sheet edge.
    pub fn distance(&self) -> f64 {
        self.edge_margin + self.hole_radius
    }

    /// Whether a sheet-local hole center clears every edge (bounds inclusive).
    pub fn admits(&self, hole: &HoleSpec) -> bool {
        let k = self.distance();
        hole.x >= k
            && hole.y >= k
            && hole.x <= self.sheet_width - k
            && hole.y <= self.sheet_height - k
    }

    /// Re-base bed holes onto the sheet and drop those inside the margin.
    pub fn apply(&self, bed: &BedHoleSet) -> SheetHoleSet {
        let holes = bed
            .iter()
            .map(|h| h.rebased(self.sheet_offset))
            .filter(|h| {
                let keep = self.admits(h);
                if !keep {
                    debug!(x = h.x, y = h.y, mount = h.is_mount, "hole dropped by edge keep-out");
                }
                keep
            })
            .collect();
        SheetHoleSet { holes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::expand;
    use crate::SpoilboardConfig;

    fn keepout(margin: f64) -> KeepOut {
        KeepOut {
            sheet_offset: Vector2::new(2.5, 10.0),
            sheet_width: 355.0,
            sheet_height: 280.0,
            edge_margin: margin,
            hole_radius: 3.5,
        }
    }

    fn reference_bed() -> BedHoleSet {
        let cfg = SpoilboardConfig::default();
        expand(&cfg.pattern.holes, 360.0, 300.0, true, true)
    }

    #[test]
    fn holes_are_rebased_onto_the_sheet() {
        let bed = BedHoleSet::new(vec![HoleSpec::new(20.0, 20.0, true)]);
        let sheet = keepout(6.0).apply(&bed);
        assert_eq!(sheet.holes(), &[HoleSpec::new(17.5, 10.0, true)]);
    }

    #[test]
    fn boundary_is_inclusive() {
        let k = keepout(6.0);
        assert!(k.admits(&HoleSpec::new(9.5, 9.5, false)));
        assert!(!k.admits(&HoleSpec::new(9.49, 9.5, false)));
        assert!(k.admits(&HoleSpec::new(345.5, 270.5, false)));
        assert!(!k.admits(&HoleSpec::new(345.5, 270.51, false)));
    }

    #[test]
    fn larger_margin_never_keeps_more_holes() {
        let bed = reference_bed();
        let mut previous = usize::MAX;
        for step in 0..40 {
            let count = keepout(step as f64 * 0.5).apply(&bed).len();
            assert!(count <= previous, "margin {} kept {}", step as f64 * 0.5, count);
            previous = count;
        }
    }

    #[test]
    fn order_follows_expansion() {
        // a small sheet drops some holes, and the reference pattern has
        // centerline holes that appear twice after mirroring
        let bed = reference_bed();
        let k = KeepOut {
            sheet_width: 200.0,
            sheet_height: 150.0,
            ..keepout(6.0)
        };
        let sheet = k.apply(&bed);
        let expected: Vec<_> = bed
            .iter()
            .map(|h| h.rebased(k.sheet_offset))
            .filter(|h| k.admits(h))
            .collect();
        assert!(!sheet.is_empty());
        assert!(sheet.len() < bed.len());
        assert_eq!(sheet.holes(), expected.as_slice());
    }

    #[test]
    fn reference_hole_is_first_authored_survivor() {
        let sheet = keepout(6.0).apply(&reference_bed());
        assert_eq!(sheet.reference(), Some(&HoleSpec::new(17.5, 10.0, true)));
        assert_eq!(sheet.mount_count(), 4);
    }

    #[test]
    fn huge_margin_drops_everything() {
        let sheet = keepout(500.0).apply(&reference_bed());
        assert!(sheet.is_empty());
        assert!(sheet.reference().is_none());
    }
}
