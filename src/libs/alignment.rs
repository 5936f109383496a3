use indexmap::IndexSet;

/// Gap characters of an alignment row. Everything else is a residue.
///
/// ```
/// use msav::libs::alignment::is_gap;
/// assert!(is_gap(b'-'));
/// assert!(is_gap(b'.'));
/// assert!(!is_gap(b'N'));
/// assert!(!is_gap(b'*'));
/// ```
#[inline]
pub fn is_gap(b: u8) -> bool {
    b == b'-' || b == b'.'
}

/// Number of residues (non-gap bytes) in `seq`.
pub fn count_residues(seq: &[u8]) -> usize {
    seq.iter().filter(|&&b| !is_gap(b)).count()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AlignmentError {
    #[error("row {name} has length {len}, expected {expected}")]
    RaggedRow {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("row #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("duplicate row name: {0}")]
    DuplicateName(String),
}

/// One named, gapped row of an alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRow {
    name: String,
    seq: Vec<u8>,
}

impl AlignmentRow {
    pub fn new(name: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            seq: seq.into(),
        }
    }

    // Immutable accessors
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn seq(&self) -> &[u8] {
        &self.seq
    }

    pub fn len(&self) -> usize {
        self.seq.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    /// The row with gaps stripped, i.e. the biological sequence.
    ///
    /// ```
    /// # use msav::libs::alignment::AlignmentRow;
    /// let row = AlignmentRow::new("r1", "A-TG.C");
    /// assert_eq!(row.ungapped(), b"ATGC".to_vec());
    /// ```
    pub fn ungapped(&self) -> Vec<u8> {
        self.seq.iter().copied().filter(|&b| !is_gap(b)).collect()
    }
}

/// Rows of equal length, immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    rows: Vec<AlignmentRow>,
    width: usize,
}

impl Alignment {
    /// Build an alignment, checking that every row is named, unique and of the same length.
    ///
    /// ```
    /// # use msav::libs::alignment::{Alignment, AlignmentRow, AlignmentError};
    /// let aln = Alignment::new(vec![
    ///     AlignmentRow::new("a", "AC-T"),
    ///     AlignmentRow::new("b", "A--T"),
    /// ]).unwrap();
    /// assert_eq!(aln.width(), 4);
    ///
    /// let err = Alignment::new(vec![
    ///     AlignmentRow::new("a", "AC-T"),
    ///     AlignmentRow::new("b", "A-T"),
    /// ]).unwrap_err();
    /// assert!(matches!(err, AlignmentError::RaggedRow { .. }));
    /// ```
    pub fn new(rows: Vec<AlignmentRow>) -> Result<Self, AlignmentError> {
        let width = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut seen = IndexSet::new();

        for (index, row) in rows.iter().enumerate() {
            if row.name.is_empty() {
                return Err(AlignmentError::EmptyName { index });
            }
            if !seen.insert(row.name.as_str()) {
                return Err(AlignmentError::DuplicateName(row.name.clone()));
            }
            if row.len() != width {
                return Err(AlignmentError::RaggedRow {
                    name: row.name.clone(),
                    len: row.len(),
                    expected: width,
                });
            }
        }

        Ok(Self { rows, width })
    }

    pub fn rows(&self) -> &[AlignmentRow] {
        &self.rows
    }

    /// Number of alignment columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.name()).collect()
    }

    pub fn get_row(&self, name: &str) -> Option<&AlignmentRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Columns that are a gap in every row, in increasing order.
    ///
    /// ```
    /// # use msav::libs::alignment::{Alignment, AlignmentRow};
    /// let aln = Alignment::new(vec![
    ///     AlignmentRow::new("a", "A--T.G"),
    ///     AlignmentRow::new("b", "A-CT-G"),
    /// ]).unwrap();
    /// assert_eq!(aln.blank_columns(), vec![1, 4]);
    /// ```
    pub fn blank_columns(&self) -> Vec<usize> {
        if self.rows.is_empty() {
            return vec![];
        }

        (0..self.width)
            .filter(|&col| self.rows.iter().all(|r| is_gap(r.seq[col])))
            .collect()
    }

    /// Width of the alignment once blank columns are hidden.
    pub fn visible_width(&self) -> usize {
        self.width - self.blank_columns().len()
    }

    /// Reorder rows so they follow `names`, e.g. the leaf order of a tree layout.
    /// Rows not listed keep their relative order after the listed ones.
    ///
    /// ```
    /// # use msav::libs::alignment::{Alignment, AlignmentRow};
    /// let aln = Alignment::new(vec![
    ///     AlignmentRow::new("a", "AC"),
    ///     AlignmentRow::new("b", "AG"),
    ///     AlignmentRow::new("c", "AT"),
    /// ]).unwrap();
    /// let sorted = aln.reorder_by(&["c", "a"]);
    /// assert_eq!(sorted.names(), vec!["c", "a", "b"]);
    /// ```
    pub fn reorder_by<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut rows: Vec<AlignmentRow> = Vec::with_capacity(self.rows.len());
        let mut taken = vec![false; self.rows.len()];

        for name in names {
            if let Some(idx) = self.rows.iter().position(|r| r.name == name.as_ref()) {
                if !taken[idx] {
                    taken[idx] = true;
                    rows.push(self.rows[idx].clone());
                }
            }
        }
        for (idx, row) in self.rows.iter().enumerate() {
            if !taken[idx] {
                rows.push(row.clone());
            }
        }

        Self {
            rows,
            width: self.width,
        }
    }

    /// Read an aligned FASTA file. `stdin` reads standard input.
    pub fn from_file(infile: &str) -> anyhow::Result<Self> {
        let reader = crate::reader(infile)?;
        let mut fa_in = noodles_fasta::io::Reader::new(reader);

        let mut rows = vec![];
        for result in fa_in.records() {
            let record = result?;
            let name = String::from_utf8(record.name().into())?;
            let seq = record.sequence().get(..).unwrap_or_default();
            rows.push(AlignmentRow::new(name, seq.to_vec()));
        }

        Ok(Self::new(rows)?)
    }
}
