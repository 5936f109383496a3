//! Greedy stacking of possibly-overlapping intervals into display rows.
//!
//! Intervals are placed in arrival order at the lowest row where they fit and are never
//! moved afterwards. Occupancy is indexed per row as an [`IntSpan`], so a collision test is
//! one set intersection per row the rectangle covers.

use indexmap::IndexMap;
use intspan::IntSpan;

/// Lowest x an interval may start at. `IntSpan` reserves the ends of the `i32` range.
pub const MIN_X: i32 = i32::MIN + 8;
/// Highest (exclusive) x an interval may end at.
pub const MAX_X: i32 = i32::MAX - 8;
/// Tallest rectangle the packer accepts, in rows.
pub const MAX_RECT_HEIGHT: usize = 1 << 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackerConfig {
    /// Highest row an interval may start on
    pub max_height: usize,
}

impl Default for PackerConfig {
    fn default() -> Self {
        Self { max_height: 10_000 }
    }
}

/// A placed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle<T> {
    pub id: String,
    pub min_x: i32,
    /// Exclusive
    pub max_x: i32,
    pub min_y: usize,
    pub height: usize,
    pub data: T,
}

impl<T> Rectangle<T> {
    /// Exclusive
    pub fn max_y(&self) -> usize {
        self.min_y + self.height
    }

    pub fn record(&self) -> PackedRecord<'_> {
        PackedRecord {
            id: &self.id,
            min_x: self.min_x,
            max_x: self.max_x,
            min_y: self.min_y,
            max_y: self.max_y(),
        }
    }
}

/// The bounds of a placed interval, as handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRecord<'a> {
    pub id: &'a str,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: usize,
    pub max_y: usize,
}

//----------------------------
// RowIndex
//----------------------------
/// Occupied x ranges, bucketed by row.
#[derive(Default)]
struct RowIndex {
    rows: Vec<IntSpan>,
}

impl std::fmt::Debug for RowIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowIndex")
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl RowIndex {
    // closed integer form of a half-open interval
    fn span(left: i32, right: i32) -> IntSpan {
        IntSpan::from_pair(left, right - 1)
    }

    // rows past the end of the index are empty
    fn collides(&self, left: i32, right: i32, top: usize, bottom: usize) -> bool {
        let span = Self::span(left, right);
        let bottom = bottom.min(self.rows.len());
        (top..bottom).any(|row| !self.rows[row].intersect(&span).is_empty())
    }

    fn insert(&mut self, left: i32, right: i32, top: usize, bottom: usize) {
        if self.rows.len() < bottom {
            self.rows.resize_with(bottom, IntSpan::new);
        }
        for row in top..bottom {
            self.rows[row].add_pair(left, right - 1);
        }
    }
}

//----------------------------
// IntervalPacker
//----------------------------
#[derive(Debug)]
pub struct IntervalPacker<T> {
    config: PackerConfig,
    index: RowIndex,
    rectangles: IndexMap<String, Rectangle<T>>,
    total_height: usize,
    max_height_reached: bool,
}

impl<T> Default for IntervalPacker<T> {
    fn default() -> Self {
        Self::new(PackerConfig::default())
    }
}

impl<T> IntervalPacker<T> {
    pub fn new(config: PackerConfig) -> Self {
        Self {
            config,
            index: RowIndex::default(),
            rectangles: IndexMap::new(),
            total_height: 0,
            max_height_reached: false,
        }
    }

    pub fn config(&self) -> &PackerConfig {
        &self.config
    }

    /// Place `[left, right)` with the given row `height` and return its row, or `None`
    /// when no row up to `max_height` is free.
    ///
    /// A known `id` returns the row it already has; `data` is dropped in that case.
    /// Empty intervals take one unit, and `height` 0 is treated as 1.
    ///
    /// Intervals outside `[MIN_X, MAX_X)` are never placed. Neither is a rectangle taller
    /// than `max_height + 1` rows or [`MAX_RECT_HEIGHT`]; that also sets
    /// [`max_height_reached`](Self::max_height_reached).
    ///
    /// ```
    /// use msav::libs::pack::{IntervalPacker, PackerConfig};
    ///
    /// let mut packer = IntervalPacker::new(PackerConfig { max_height: 10 });
    /// assert_eq!(packer.add("a", 0, 10, 1, ()), Some(0));
    /// assert_eq!(packer.add("b", 5, 15, 1, ()), Some(1));
    /// assert_eq!(packer.add("c", 10, 20, 1, ()), Some(0));
    /// assert_eq!(packer.add("a", 100, 200, 1, ()), Some(0));
    /// ```
    pub fn add(
        &mut self,
        id: &str,
        left: i32,
        right: i32,
        height: usize,
        data: T,
    ) -> Option<usize> {
        if let Some(rect) = self.rectangles.get(id) {
            return Some(rect.min_y);
        }

        if left < MIN_X || left >= MAX_X {
            tracing::debug!(id, left, "interval start out of range");
            return None;
        }
        let right = right.max(left + 1);
        if right > MAX_X {
            tracing::debug!(id, right, "interval end out of range");
            return None;
        }

        let height = height.max(1);
        let tallest = self
            .config
            .max_height
            .saturating_add(1)
            .min(MAX_RECT_HEIGHT);

        let mut slot = None;
        if height <= tallest {
            for row in 0..=self.config.max_height {
                // every later row overflows as well
                let Some(bottom) = row.checked_add(height) else {
                    break;
                };
                if !self.index.collides(left, right, row, bottom) {
                    slot = Some((row, bottom));
                    break;
                }
            }
        }

        let Some((row, bottom)) = slot else {
            tracing::debug!(
                id,
                left,
                right,
                height,
                max_height = self.config.max_height,
                "no free row for interval"
            );
            self.max_height_reached = true;
            return None;
        };

        self.index.insert(left, right, row, bottom);
        self.rectangles.insert(
            id.to_string(),
            Rectangle {
                id: id.to_string(),
                min_x: left,
                max_x: right,
                min_y: row,
                height,
                data,
            },
        );
        self.total_height = self.total_height.max(row);

        Some(row)
    }

    pub fn get(&self, id: &str) -> Option<&Rectangle<T>> {
        self.rectangles.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rectangles.contains_key(id)
    }

    /// Placed rectangles in insertion order.
    pub fn rectangles(&self) -> impl Iterator<Item = &Rectangle<T>> {
        self.rectangles.values()
    }

    pub fn records(&self) -> impl Iterator<Item = PackedRecord<'_>> {
        self.rectangles.values().map(|r| r.record())
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    /// Highest starting row handed out so far.
    pub fn total_height(&self) -> usize {
        self.total_height
    }

    /// Rows spanned by all placed rectangles, i.e. the largest `max_y`.
    pub fn rows_used(&self) -> usize {
        self.rectangles.values().map(|r| r.max_y()).max().unwrap_or(0)
    }

    pub fn max_height_reached(&self) -> bool {
        self.max_height_reached
    }

    /// Forget every placement.
    pub fn reset(&mut self) {
        self.index = RowIndex::default();
        self.rectangles.clear();
        self.total_height = 0;
        self.max_height_reached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn overlaps<T>(a: &Rectangle<T>, b: &Rectangle<T>) -> bool {
        a.min_x < b.max_x && b.min_x < a.max_x && a.min_y < b.max_y() && b.min_y < a.max_y()
    }

    #[test]
    fn test_touching_intervals_share_a_row() {
        let mut packer = IntervalPacker::default();
        assert_eq!(packer.add("a", 0, 10, 1, 'a'), Some(0));
        assert_eq!(packer.add("b", 10, 20, 1, 'b'), Some(0));
        assert_eq!(packer.add("c", 9, 11, 1, 'c'), Some(1));
        assert_eq!(packer.total_height(), 1);
        assert_eq!(packer.rows_used(), 2);
    }

    #[test]
    fn test_tall_rectangles() {
        let mut packer = IntervalPacker::default();
        assert_eq!(packer.add("a", 0, 10, 3, ()), Some(0));
        // rows 0..3 are blocked for x in [0, 10)
        assert_eq!(packer.add("b", 5, 6, 1, ()), Some(3));
        assert_eq!(packer.add("c", 20, 30, 2, ()), Some(0));
        assert_eq!(packer.get("b").unwrap().max_y(), 4);
        assert_eq!(packer.total_height(), 3);
    }

    #[test]
    fn test_gap_below_is_reused() {
        let mut packer = IntervalPacker::default();
        packer.add("a", 0, 10, 1, ());
        packer.add("b", 0, 10, 1, ());
        packer.add("c", 0, 10, 1, ());
        assert_eq!(packer.add("d", 10, 20, 2, ()), Some(0));
        assert_eq!(packer.add("e", 5, 15, 1, ()), Some(3));
        // row 2 is free right of "c"
        assert_eq!(packer.add("f", 15, 25, 1, ()), Some(2));
    }

    #[test]
    fn test_max_height() {
        let mut packer = IntervalPacker::new(PackerConfig { max_height: 1 });
        assert_eq!(packer.add("a", 0, 10, 1, ()), Some(0));
        assert_eq!(packer.add("b", 0, 10, 1, ()), Some(1));
        assert!(!packer.max_height_reached());

        assert_eq!(packer.add("c", 0, 10, 1, ()), None);
        assert!(packer.max_height_reached());
        assert!(!packer.contains("c"));
        assert_eq!(packer.len(), 2);

        // elsewhere there is still room
        assert_eq!(packer.add("d", 50, 60, 1, ()), Some(0));
    }

    #[test]
    fn test_degenerate_input() {
        let mut packer = IntervalPacker::default();
        assert_eq!(packer.add("a", 5, 5, 0, ()), Some(0));
        let a = packer.get("a").unwrap();
        assert_eq!((a.min_x, a.max_x, a.height), (5, 6, 1));
        assert_eq!(packer.add("b", 5, 3, 1, ()), Some(1));
    }

    #[test]
    fn test_coordinate_extremes() {
        let mut packer = IntervalPacker::default();

        assert_eq!(packer.add("hi", i32::MAX - 10, i32::MAX, 1, ()), None);
        assert_eq!(packer.add("max", i32::MAX, i32::MAX, 1, ()), None);
        assert_eq!(packer.add("lo", i32::MIN, i32::MIN + 10, 1, ()), None);
        assert!(packer.is_empty());
        // out-of-range coordinates are not a height problem
        assert!(!packer.max_height_reached());

        assert_eq!(packer.add("first", MIN_X, MIN_X + 10, 1, ()), Some(0));
        assert_eq!(packer.add("last", MAX_X - 10, MAX_X, 1, ()), Some(0));
        assert_eq!(packer.add("all", MIN_X, MAX_X, 1, ()), Some(1));
        assert_eq!(packer.add("end", MAX_X - 1, MAX_X - 1, 1, ()), Some(2));
        assert_eq!(packer.get("end").unwrap().max_x, MAX_X);
    }

    #[test]
    fn test_huge_height() {
        let mut packer = IntervalPacker::default();
        assert_eq!(packer.add("a", 0, 10, 1, ()), Some(0));

        assert_eq!(packer.add("tall", 0, 10, usize::MAX, ()), None);
        assert!(packer.max_height_reached());
        assert!(!packer.contains("tall"));

        let mut packer = IntervalPacker::new(PackerConfig {
            max_height: usize::MAX,
        });
        assert_eq!(packer.add("a", 0, 10, 1, ()), Some(0));
        assert_eq!(packer.add("tall", 0, 10, usize::MAX, ()), None);
        assert_eq!(packer.add("b", 0, 10, MAX_RECT_HEIGHT, ()), Some(1));
        assert_eq!(packer.get("b").unwrap().max_y(), MAX_RECT_HEIGHT + 1);

        // a rectangle may fill the whole packing area, but no more
        let mut packer = IntervalPacker::new(PackerConfig { max_height: 3 });
        assert_eq!(packer.add("x", 0, 10, 5, ()), None);
        assert_eq!(packer.add("y", 0, 10, 4, ()), Some(0));
        assert_eq!(packer.add("z", 0, 10, 1, ()), None);
    }

    #[test]
    fn test_records_and_reset() {
        let mut packer = IntervalPacker::default();
        packer.add("x", 3, 8, 2, 1u8);
        packer.add("y", 4, 9, 1, 2u8);

        let records: Vec<_> = packer.records().collect();
        assert_eq!(
            records,
            vec![
                PackedRecord { id: "x", min_x: 3, max_x: 8, min_y: 0, max_y: 2 },
                PackedRecord { id: "y", min_x: 4, max_x: 9, min_y: 2, max_y: 3 },
            ]
        );
        assert_eq!(packer.rectangles().map(|r| r.data).sum::<u8>(), 3);

        packer.reset();
        assert!(packer.is_empty());
        assert_eq!(packer.total_height(), 0);
        assert_eq!(packer.add("y", 4, 9, 1, 2u8), Some(0));
    }

    proptest! {
        #[test]
        fn packing_invariants(
            items in proptest::collection::vec((0i32..500, 1i32..80, 1usize..4, 0usize..60), 1..120)
        ) {
            let mut packer = IntervalPacker::new(PackerConfig { max_height: 40 });
            let mut last_total = 0;
            let mut first_row = std::collections::HashMap::new();

            for (left, width, height, key) in items {
                let id = format!("f{}", key);
                let row = packer.add(&id, left, left + width, height, ());

                prop_assert!(packer.total_height() >= last_total);
                last_total = packer.total_height();

                match first_row.get(&id) {
                    Some(&prev) => prop_assert_eq!(row, Some(prev)),
                    None => {
                        if let Some(r) = row {
                            first_row.insert(id.clone(), r);
                        }
                    }
                }
            }

            let rects: Vec<_> = packer.rectangles().collect();
            for (i, a) in rects.iter().enumerate() {
                for b in &rects[i + 1..] {
                    prop_assert!(!overlaps(a, b), "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }
}
