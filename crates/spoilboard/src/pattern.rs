//! Hole pattern expansion.
//!
//! CNC beds carry irregular but mostly symmetric hole grids, so only one
//! quadrant is authored. [`expand`] mirrors that quadrant across the bed's
//! center lines to recover every physical hole.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// A hole center measured from the bed's reference corner.
///
/// Serialized as a `[x, y, mount]` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64, bool)", into = "(f64, f64, bool)")]
pub struct HoleSpec {
    /// X offset (mm).
    pub x: f64,
    /// Y offset (mm).
    pub y: f64,
    /// The hole fastens the spoilboard and gets a countersink.
    pub is_mount: bool,
}

impl HoleSpec {
    /// Create a hole.
    pub const fn new(x: f64, y: f64, is_mount: bool) -> Self {
        Self { x, y, is_mount }
    }

    /// Center as a point.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }

    /// Reflection across the vertical line `x = width / 2`.
    pub fn mirrored_x(&self, width: f64) -> Self {
        Self::new(width - self.x, self.y, self.is_mount)
    }

    /// Reflection across the horizontal line `y = height / 2`.
    pub fn mirrored_y(&self, height: f64) -> Self {
        Self::new(self.x, height - self.y, self.is_mount)
    }

    /// Same hole expressed relative to a new origin.
    pub fn rebased(&self, origin: Vector2<f64>) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y, self.is_mount)
    }
}

impl From<(f64, f64, bool)> for HoleSpec {
    fn from((x, y, is_mount): (f64, f64, bool)) -> Self {
        Self::new(x, y, is_mount)
    }
}

impl From<HoleSpec> for (f64, f64, bool) {
    fn from(h: HoleSpec) -> Self {
        (h.x, h.y, h.is_mount)
    }
}

/// Every hole of the bed, in bed coordinates and expansion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BedHoleSet {
    holes: Vec<HoleSpec>,
}

impl BedHoleSet {
    /// Wrap an already expanded list.
    pub fn new(holes: Vec<HoleSpec>) -> Self {
        Self { holes }
    }

    /// Holes in expansion order.
    pub fn holes(&self) -> &[HoleSpec] {
        &self.holes
    }

    /// Iterate in expansion order.
    pub fn iter(&self) -> std::slice::Iter<'_, HoleSpec> {
        self.holes.iter()
    }

    /// Number of holes.
    pub fn len(&self) -> usize {
        self.holes.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.holes.is_empty()
    }

    /// Drop exact duplicates, keeping the first occurrence of each.
    ///
    /// Holes authored on a symmetry line mirror onto themselves; this folds
    /// those copies back together without disturbing order.
    pub fn merge_coincident(self) -> Self {
        let mut kept: Vec<HoleSpec> = Vec::with_capacity(self.holes.len());
        for hole in self.holes {
            if !kept.contains(&hole) {
                kept.push(hole);
            }
        }
        Self { holes: kept }
    }
}

impl<'a> IntoIterator for &'a BedHoleSet {
    type Item = &'a HoleSpec;
    type IntoIter = std::slice::Iter<'a, HoleSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.holes.iter()
    }
}

/// Mirror one quadrant of holes across the bed.
///
/// X mirroring runs first and appends a reflected copy of every hole; Y
/// mirroring then appends a reflected copy of that whole list. With both
/// flags each authored hole appears once per quadrant. Holes are never
/// reordered or deduplicated, so the authored holes stay at the front.
pub fn expand(
    quadrant: &[HoleSpec],
    bed_width: f64,
    bed_height: f64,
    symmetric_x: bool,
    symmetric_y: bool,
) -> BedHoleSet {
    let mut holes = quadrant.to_vec();
    if symmetric_x {
        let mirrored: Vec<_> = holes.iter().map(|h| h.mirrored_x(bed_width)).collect();
        holes.extend(mirrored);
    }
    if symmetric_y {
        let mirrored: Vec<_> = holes.iter().map(|h| h.mirrored_y(bed_height)).collect();
        holes.extend(mirrored);
    }
    BedHoleSet::new(holes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_symmetry_mirrors_across_bed_width() {
        let set = expand(&[HoleSpec::new(20.0, 20.0, true)], 360.0, 300.0, true, false);
        assert_eq!(
            set.holes(),
            &[
                HoleSpec::new(20.0, 20.0, true),
                HoleSpec::new(340.0, 20.0, true)
            ]
        );
    }

    #[test]
    fn both_symmetries_cover_four_quadrants_in_order() {
        let set = expand(&[HoleSpec::new(20.0, 30.0, false)], 360.0, 300.0, true, true);
        let expected = [
            HoleSpec::new(20.0, 30.0, false),
            HoleSpec::new(340.0, 30.0, false),
            HoleSpec::new(20.0, 270.0, false),
            HoleSpec::new(340.0, 270.0, false),
        ];
        assert_eq!(set.holes(), &expected);
    }

    #[test]
    fn closure_under_mirroring() {
        let quadrant = [
            HoleSpec::new(20.0, 20.0, true),
            HoleSpec::new(80.0, 70.0, false),
            HoleSpec::new(110.0, 97.5, false),
        ];
        let set = expand(&quadrant, 360.0, 300.0, true, true);
        assert_eq!(set.len(), 12);
        for h in &set {
            assert!(set.holes().contains(&h.mirrored_x(360.0)));
            assert!(set.holes().contains(&h.mirrored_y(300.0)));
        }
    }

    #[test]
    fn no_symmetry_is_identity() {
        let quadrant = [HoleSpec::new(1.0, 2.0, false), HoleSpec::new(3.0, 4.0, true)];
        let set = expand(&quadrant, 100.0, 100.0, false, false);
        assert_eq!(set.holes(), &quadrant);
    }

    #[test]
    fn centerline_holes_are_kept_twice_until_merged() {
        let set = expand(&[HoleSpec::new(70.0, 150.0, false)], 360.0, 300.0, false, true);
        assert_eq!(set.len(), 2);
        assert_eq!(set.holes()[0], set.holes()[1]);

        let merged = set.merge_coincident();
        assert_eq!(merged.holes(), &[HoleSpec::new(70.0, 150.0, false)]);
    }

    #[test]
    fn merge_keeps_first_occurrence_order() {
        let set = BedHoleSet::new(vec![
            HoleSpec::new(5.0, 5.0, false),
            HoleSpec::new(1.0, 1.0, true),
            HoleSpec::new(5.0, 5.0, false),
            HoleSpec::new(2.0, 2.0, false),
        ]);
        let merged = set.merge_coincident();
        assert_eq!(
            merged.holes(),
            &[
                HoleSpec::new(5.0, 5.0, false),
                HoleSpec::new(1.0, 1.0, true),
                HoleSpec::new(2.0, 2.0, false),
            ]
        );
    }

    #[test]
    fn mount_flag_is_not_a_duplicate() {
        let set = BedHoleSet::new(vec![
            HoleSpec::new(5.0, 5.0, false),
            HoleSpec::new(5.0, 5.0, true),
        ]);
        assert_eq!(set.merge_coincident().len(), 2);
    }
}
