//! Sequence features of one alignment row, stacked into display tracks.

use crate::libs::coord::RowMapper;
use crate::libs::pack::IntervalPacker;
use anyhow::{anyhow, Context};
use std::io::BufRead;

/// A feature on the ungapped sequence of one row, `[start, end)`, 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub id: String,
    pub start: usize,
    pub end: usize,
    pub label: String,
}

impl Feature {
    pub fn new(id: &str, start: usize, end: usize) -> Self {
        Self {
            id: id.to_string(),
            start,
            end,
            label: String::new(),
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// `id<TAB>start<TAB>end[<TAB>label]`
    ///
    /// ```
    /// # use msav::libs::annotation::Feature;
    /// let f = Feature::parse_line("kinase\t10\t42\tPF00069").unwrap();
    /// assert_eq!((f.start, f.end, f.label.as_str()), (10, 42, "PF00069"));
    /// assert!(Feature::parse_line("kinase\tten\t42").is_err());
    /// ```
    pub fn parse_line(line: &str) -> anyhow::Result<Self> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(anyhow!("expected at least 3 fields, got {}", fields.len()));
        }
        let start = fields[1]
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid start: {}", fields[1]))?;
        let end = fields[2]
            .trim()
            .parse::<usize>()
            .with_context(|| format!("invalid end: {}", fields[2]))?;

        Ok(Self {
            id: fields[0].to_string(),
            start,
            end,
            label: fields.get(3).map(|s| s.to_string()).unwrap_or_default(),
        })
    }
}

/// Read features from a TSV file. Blank lines and lines starting with `#` are skipped.
pub fn read_features(infile: &str) -> anyhow::Result<Vec<Feature>> {
    let reader = crate::reader(infile)?;
    let mut features = vec![];

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let feature =
            Feature::parse_line(&line).with_context(|| format!("{}:{}", infile, i + 1))?;
        features.push(feature);
    }

    Ok(features)
}

/// A feature after placement, in visible columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedFeature {
    pub id: String,
    pub label: String,
    pub min_x: i32,
    /// Exclusive
    pub max_x: i32,
    pub row: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureLayout {
    pub placed: Vec<PlacedFeature>,
    pub unplaced: Vec<String>,
}

// Non-blank columns left of `global`. For a blank column this is the next visible one.
fn visible_at_or_after(blanks: &[usize], global: usize) -> usize {
    global - blanks.partition_point(|&b| b < global)
}

/// The visible `[start, end)` covered by `feature` in this row.
///
/// ```
/// use msav::libs::annotation::{visible_span, Feature};
/// use msav::libs::coord::RowMapper;
///
/// // columns 2, 3 and 6 are blank
/// let mapper = RowMapper::new(b"AC--GT-A", &[2, 3, 6]);
/// assert_eq!(visible_span(&mapper, &Feature::new("f", 1, 3)), (1, 3));
/// assert_eq!(visible_span(&mapper, &Feature::new("g", 2, 4)), (2, 4));
/// ```
pub fn visible_span(mapper: &RowMapper, feature: &Feature) -> (usize, usize) {
    let seq = mapper.seq();

    // the first residue sits at or right of the boundary column
    let mut start = mapper.seq_to_global(feature.start);
    while start < seq.len() && crate::libs::alignment::is_gap(seq[start]) {
        start += 1;
    }
    let end = mapper.seq_to_global(feature.end.max(feature.start));

    let blanks = mapper.blanks();
    let v_start = visible_at_or_after(blanks, start);
    let v_end = visible_at_or_after(blanks, end.max(start));

    (v_start, v_end.max(v_start))
}

/// Map every feature into visible space and stack them with `packer`.
///
/// Features are offered in input order. The packer keeps earlier placements, so calling this
/// again with more features only adds rows below existing ones where needed.
pub fn layout_features(
    mapper: &RowMapper,
    features: &[Feature],
    packer: &mut IntervalPacker<Feature>,
) -> FeatureLayout {
    let mut layout = FeatureLayout::default();

    for feature in features {
        let (start, end) = visible_span(mapper, feature);
        let left = i32::try_from(start).unwrap_or(i32::MAX);
        let right = i32::try_from(end).unwrap_or(i32::MAX);

        match packer.add(&feature.id, left, right, 1, feature.clone()) {
            Some(_) => {
                if let Some(rect) = packer.get(&feature.id) {
                    layout.placed.push(PlacedFeature {
                        id: rect.id.clone(),
                        label: rect.data.label.clone(),
                        min_x: rect.min_x,
                        max_x: rect.max_x,
                        row: rect.min_y,
                    });
                }
            }
            None => layout.unplaced.push(feature.id.clone()),
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::alignment::{Alignment, AlignmentRow};
    use crate::libs::pack::PackerConfig;

    fn aln() -> Alignment {
        Alignment::new(vec![
            AlignmentRow::new("seq1", b"AC--GT-A-".to_vec()),
            AlignmentRow::new("seq2", b"-C--GTTAC".to_vec()),
        ])
        .unwrap()
    }

    #[test]
    fn test_visible_span_skips_blank_columns() {
        let aln = aln();
        let blanks = aln.blank_columns();
        assert_eq!(blanks, vec![2, 3]);

        let row = aln.get_row("seq1").unwrap();
        let mapper = RowMapper::new(row.seq(), &blanks);

        // C G
        assert_eq!(visible_span(&mapper, &Feature::new("a", 1, 3)), (1, 3));
        // T, then a gap of this row that is not blank
        assert_eq!(visible_span(&mapper, &Feature::new("b", 3, 4)), (3, 4));
        // A at global 7
        assert_eq!(visible_span(&mapper, &Feature::new("c", 4, 5)), (5, 6));
    }

    #[test]
    fn test_visible_span_degenerate() {
        let blanks = vec![];
        let mapper = RowMapper::new(b"ACGT", &blanks);
        assert_eq!(visible_span(&mapper, &Feature::new("e", 2, 2)), (2, 2));
        assert_eq!(visible_span(&mapper, &Feature::new("r", 3, 1)), (3, 3));
        // saturates at the row end
        assert_eq!(visible_span(&mapper, &Feature::new("o", 2, 99)), (2, 4));
        assert_eq!(visible_span(&mapper, &Feature::new("p", 50, 99)), (4, 4));
    }

    #[test]
    fn test_layout_features_stacks_overlaps() {
        let aln = aln();
        let blanks = aln.blank_columns();
        let row = aln.get_row("seq2").unwrap();
        let mapper = RowMapper::new(row.seq(), &blanks);

        let features = vec![
            Feature::new("dom1", 0, 3).with_label("first"),
            Feature::new("dom2", 2, 5),
            Feature::new("dom3", 4, 5),
            Feature::new("dom1", 4, 5),
        ];
        let mut packer = IntervalPacker::default();
        let layout = layout_features(&mapper, &features, &mut packer);

        let rows: Vec<_> = layout
            .placed
            .iter()
            .map(|p| (p.id.as_str(), p.min_x, p.max_x, p.row))
            .collect();
        // seq2 residues C G T T A C sit at visible 1..7
        assert_eq!(
            rows,
            vec![
                ("dom1", 1, 4, 0),
                ("dom2", 3, 6, 1),
                ("dom3", 5, 6, 0),
                ("dom1", 1, 4, 0),
            ]
        );
        assert_eq!(layout.placed[0].label, "first");
        assert!(layout.unplaced.is_empty());
    }

    #[test]
    fn test_layout_features_reports_unplaced() {
        let blanks = vec![];
        let mapper = RowMapper::new(b"ACGTACGT", &blanks);
        let features = vec![
            Feature::new("a", 0, 8),
            Feature::new("b", 0, 8),
            Feature::new("c", 0, 8),
        ];
        let mut packer = IntervalPacker::new(PackerConfig { max_height: 1 });
        let layout = layout_features(&mapper, &features, &mut packer);

        assert_eq!(layout.placed.len(), 2);
        assert_eq!(layout.unplaced, vec!["c".to_string()]);
        assert!(packer.max_height_reached());
    }

    #[test]
    fn test_parse_line() {
        let f = Feature::parse_line("x\t1\t2").unwrap();
        assert_eq!(f, Feature::new("x", 1, 2));
        assert!(Feature::parse_line("x\t1").is_err());
    }
}
