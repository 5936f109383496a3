//! Conversions between the three column spaces of an alignment.
//!
//! * **visible** - the on-screen column, with globally blank columns hidden
//! * **global** - the alignment column
//! * **seq** - the 0-based position in one row's ungapped sequence
//!
//! `blanks` is always the strictly increasing list produced by
//! [`Alignment::blank_columns`](crate::libs::alignment::Alignment::blank_columns).
//! None of the conversions panic; positions beyond the data saturate.

use crate::libs::alignment::is_gap;

/// Visible column -> global column.
///
/// ```
/// # use msav::libs::coord::mouse_over_coord_to_global_coord;
/// let blanks = [2, 5, 8];
/// let global: Vec<_> = (0..8)
///     .map(|v| mouse_over_coord_to_global_coord(&blanks, v))
///     .collect();
/// assert_eq!(global, vec![0, 1, 3, 4, 6, 7, 9, 10]);
///
/// assert_eq!(mouse_over_coord_to_global_coord(&[], 42), 42);
/// ```
pub fn mouse_over_coord_to_global_coord(blanks: &[usize], visible: usize) -> usize {
    let mut global = 0;
    let mut consumed = 0;
    let mut next_blank = 0;

    loop {
        while next_blank < blanks.len() && blanks[next_blank] <= global {
            if blanks[next_blank] == global {
                global += 1;
            }
            next_blank += 1;
        }
        if consumed == visible {
            return global;
        }
        consumed += 1;
        global += 1;
    }
}

/// Global column -> visible column. `None` when the column itself is blank.
///
/// ```
/// # use msav::libs::coord::global_coord_to_mouse_over_coord;
/// let blanks = [2, 5, 8];
/// assert_eq!(global_coord_to_mouse_over_coord(&blanks, 4), Some(3));
/// assert_eq!(global_coord_to_mouse_over_coord(&blanks, 5), None);
/// ```
pub fn global_coord_to_mouse_over_coord(blanks: &[usize], global: usize) -> Option<usize> {
    match blanks.binary_search(&global) {
        Ok(_) => None,
        Err(hidden) => Some(global - hidden),
    }
}

/// Global column -> number of residues of `seq` left of that column.
///
/// ```
/// # use msav::libs::coord::global_coord_to_row_specific_coord;
/// assert_eq!(global_coord_to_row_specific_coord(b"A-TG-CA-TGC", 4), 3);
/// assert_eq!(global_coord_to_row_specific_coord(b"A-TG-CA-TGC", 100), 8);
/// ```
pub fn global_coord_to_row_specific_coord(seq: &[u8], global: usize) -> usize {
    let end = global.min(seq.len());
    seq[..end].iter().filter(|&&b| !is_gap(b)).count()
}

/// Ungapped position -> global column, the inverse of
/// [`global_coord_to_row_specific_coord`].
///
/// ```
/// # use msav::libs::coord::seq_coord_to_row_specific_global_coord;
/// let seq = b"A-TG-CA-TGC";
/// let global: Vec<_> = [0, 1, 3, 5, 8]
///     .iter()
///     .map(|&p| seq_coord_to_row_specific_global_coord(seq, p))
///     .collect();
/// assert_eq!(global, vec![0, 1, 4, 7, 11]);
///
/// assert_eq!(seq_coord_to_row_specific_global_coord(b"----", 3), 0);
/// ```
pub fn seq_coord_to_row_specific_global_coord(seq: &[u8], pos: usize) -> usize {
    let target = pos.min(crate::libs::alignment::count_residues(seq));

    let mut residues = 0;
    let mut i = 0;
    while i < seq.len() && residues < target {
        if !is_gap(seq[i]) {
            residues += 1;
        }
        i += 1;
    }
    i
}

/// Visible column -> ungapped position in `seq`. `None` when the column is a gap in
/// this row, or lies past its end.
///
/// ```
/// # use msav::libs::coord::mouse_over_coord_to_gap_removed_coord;
/// // column 1 is blank everywhere, column 3 only in this row
/// let seq = b"A-T-G";
/// assert_eq!(mouse_over_coord_to_gap_removed_coord(seq, &[1], 1), Some(1));
/// assert_eq!(mouse_over_coord_to_gap_removed_coord(seq, &[1], 2), None);
/// assert_eq!(mouse_over_coord_to_gap_removed_coord(seq, &[1], 3), Some(2));
/// ```
pub fn mouse_over_coord_to_gap_removed_coord(
    seq: &[u8],
    blanks: &[usize],
    visible: usize,
) -> Option<usize> {
    let global = mouse_over_coord_to_global_coord(blanks, visible);
    match seq.get(global) {
        Some(&b) if !is_gap(b) => Some(global_coord_to_row_specific_coord(seq, global)),
        _ => None,
    }
}

//----------------------------
// RowMapper
//----------------------------
/// The conversions above, bound to one row and one blank-column set.
///
/// Residue counts are precomputed, so every lookup into `seq` space is O(1) or
/// O(log n) instead of a scan.
#[derive(Debug, Clone)]
pub struct RowMapper<'a> {
    seq: &'a [u8],
    blanks: &'a [usize],
    // prefix[i] = residues in seq[..i]
    prefix: Vec<usize>,
}

impl<'a> RowMapper<'a> {
    pub fn new(seq: &'a [u8], blanks: &'a [usize]) -> Self {
        let mut prefix = Vec::with_capacity(seq.len() + 1);
        let mut residues = 0;
        prefix.push(0);
        for &b in seq {
            if !is_gap(b) {
                residues += 1;
            }
            prefix.push(residues);
        }

        Self {
            seq,
            blanks,
            prefix,
        }
    }

    pub fn seq(&self) -> &[u8] {
        self.seq
    }

    pub fn blanks(&self) -> &[usize] {
        self.blanks
    }

    /// Residues in the row.
    pub fn residues(&self) -> usize {
        *self.prefix.last().unwrap_or(&0)
    }

    pub fn visible_to_global(&self, visible: usize) -> usize {
        mouse_over_coord_to_global_coord(self.blanks, visible)
    }

    pub fn global_to_visible(&self, global: usize) -> Option<usize> {
        global_coord_to_mouse_over_coord(self.blanks, global)
    }

    pub fn global_to_seq(&self, global: usize) -> usize {
        self.prefix[global.min(self.seq.len())]
    }

    /// The smallest column whose prefix holds `pos` residues.
    pub fn seq_to_global(&self, pos: usize) -> usize {
        let target = pos.min(self.residues());
        self.prefix.partition_point(|&r| r < target)
    }

    pub fn visible_to_seq(&self, visible: usize) -> Option<usize> {
        let global = self.visible_to_global(visible);
        match self.seq.get(global) {
            Some(&b) if !is_gap(b) => Some(self.global_to_seq(global)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_visible_to_global_leading_blanks() {
        // visible 0 is the first shown column
        assert_eq!(mouse_over_coord_to_global_coord(&[0, 1], 0), 2);
        assert_eq!(mouse_over_coord_to_global_coord(&[0, 1], 1), 3);
        assert_eq!(mouse_over_coord_to_global_coord(&[0, 1, 3], 1), 4);
    }

    #[test]
    fn test_visible_to_global_adjacent_blanks() {
        let blanks = [1, 2, 3];
        assert_eq!(mouse_over_coord_to_global_coord(&blanks, 0), 0);
        assert_eq!(mouse_over_coord_to_global_coord(&blanks, 1), 4);
        assert_eq!(mouse_over_coord_to_global_coord(&blanks, 2), 5);
    }

    #[test]
    fn test_global_to_row_specific() {
        let seq = b"A-TG-CA-TGC";
        assert_eq!(global_coord_to_row_specific_coord(seq, 0), 0);
        assert_eq!(global_coord_to_row_specific_coord(seq, 1), 1);
        assert_eq!(global_coord_to_row_specific_coord(seq, 2), 1);
        assert_eq!(global_coord_to_row_specific_coord(seq, 11), 8);
        assert_eq!(global_coord_to_row_specific_coord(b"", 3), 0);
    }

    #[test]
    fn test_seq_to_global_saturates() {
        let seq = b"A-TG-CA-TGC";
        assert_eq!(seq_coord_to_row_specific_global_coord(seq, 8), 11);
        assert_eq!(seq_coord_to_row_specific_global_coord(seq, 99), 11);
        // trailing gaps are not walked past
        assert_eq!(seq_coord_to_row_specific_global_coord(b"AC--", 9), 2);
        assert_eq!(seq_coord_to_row_specific_global_coord(b"", 0), 0);
    }

    #[test]
    fn test_gap_removed_beyond_row() {
        assert_eq!(mouse_over_coord_to_gap_removed_coord(b"AC", &[], 5), None);
        assert_eq!(mouse_over_coord_to_gap_removed_coord(b"AC", &[], 1), Some(1));
    }

    #[test]
    fn test_row_mapper_matches_free_functions() {
        let seq = b".A-TG-CA-TGC--";
        let blanks = [0, 5, 12];
        let mapper = RowMapper::new(seq, &blanks);

        assert_eq!(mapper.residues(), 8);
        for g in 0..20 {
            assert_eq!(
                mapper.global_to_seq(g),
                global_coord_to_row_specific_coord(seq, g),
                "global {}",
                g
            );
            assert_eq!(
                mapper.global_to_visible(g),
                global_coord_to_mouse_over_coord(&blanks, g)
            );
        }
        for p in 0..12 {
            assert_eq!(
                mapper.seq_to_global(p),
                seq_coord_to_row_specific_global_coord(seq, p),
                "seq {}",
                p
            );
        }
        for v in 0..15 {
            assert_eq!(
                mapper.visible_to_seq(v),
                mouse_over_coord_to_gap_removed_coord(seq, &blanks, v),
                "visible {}",
                v
            );
        }
    }

    fn blanks_strategy() -> impl Strategy<Value = Vec<usize>> {
        proptest::collection::btree_set(0usize..200, 0..40)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
    }

    fn row_strategy() -> impl Strategy<Value = Vec<u8>> {
        proptest::collection::vec(
            prop_oneof![Just(b'-'), Just(b'.'), Just(b'A'), Just(b'C'), Just(b'G')],
            0..120,
        )
    }

    proptest! {
        #[test]
        fn visible_to_global_is_monotonic(blanks in blanks_strategy(), v in 0usize..300) {
            let a = mouse_over_coord_to_global_coord(&blanks, v);
            let b = mouse_over_coord_to_global_coord(&blanks, v + 1);
            prop_assert!(a < b);
            prop_assert!(blanks.binary_search(&a).is_err());
        }

        #[test]
        fn visible_global_round_trip(blanks in blanks_strategy(), v in 0usize..300) {
            let g = mouse_over_coord_to_global_coord(&blanks, v);
            prop_assert_eq!(global_coord_to_mouse_over_coord(&blanks, g), Some(v));
        }

        #[test]
        fn seq_global_round_trip(seq in row_strategy(), p in 0usize..150) {
            let residues = crate::libs::alignment::count_residues(&seq);
            let p = p.min(residues);
            let g = seq_coord_to_row_specific_global_coord(&seq, p);
            prop_assert_eq!(global_coord_to_row_specific_coord(&seq, g), p);

            let mapper = RowMapper::new(&seq, &[]);
            prop_assert_eq!(mapper.seq_to_global(p), g);
        }
    }
}
