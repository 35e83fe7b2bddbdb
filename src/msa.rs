//! [`MsaBuilder`]: reconstruct aligned rows from saved [`SequenceView`]s
//! against the shared [`SuperSequence`] spine (spec.md S4.6, C10).
//!
//! Grounded on `original_source/indelsim/classes/msa.py` (`Msa.compute_msa`,
//! `generate_msa_string_without_subs`). The reference represents each row as
//! a list of signed run lengths (positive for a residue run, negative for a
//! gap run); this keeps that representation internally since it is a
//! natural fit for streaming a row to disk without materializing every gap
//! character, and exposes a plain `String` via [`AlignmentRow::to_gap_string`]
//! / [`AlignmentRow::render`] for callers that want the ungapped view.

use std::io::{self, Write};

use crate::sequence_view::SequenceView;
use crate::super_sequence::SuperSequence;

/// One row's alignment, in run-length form: positive entries are residue
/// runs, negative entries are gap runs of that many columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRow {
    pub node_id: u64,
    pub runs: Vec<i64>,
}

impl AlignmentRow {
    /// Expand this row into a gap-template string (`-` for gap, `X` for a
    /// present residue), as used by indel-only output (spec.md S6).
    pub fn render_template(&self) -> String {
        let mut s = String::new();
        for &run in &self.runs {
            if run >= 0 {
                s.extend(std::iter::repeat('X').take(run as usize));
            } else {
                s.extend(std::iter::repeat('-').take((-run) as usize));
            }
        }
        s
    }

    /// Overlay residue characters onto this row's gap template: `residues`
    /// must have exactly as many entries as this row has non-gap columns
    /// (spec.md S4.8: "combine gap template... with residues... by
    /// overwriting residue positions wherever the template has a gap" --
    /// i.e. the template supplies gap positions, the residues fill the
    /// rest).
    pub fn render_with_residues(&self, residues: &[char]) -> String {
        let mut s = String::with_capacity(self.width() as usize);
        let mut cursor = 0usize;
        for &run in &self.runs {
            if run >= 0 {
                let run = run as usize;
                s.extend(&residues[cursor..cursor + run]);
                cursor += run;
            } else {
                s.extend(std::iter::repeat('-').take((-run) as usize));
            }
        }
        s
    }

    pub fn width(&self) -> i64 {
        self.runs.iter().map(|r| r.abs()).sum()
    }

    pub fn non_gap_count(&self) -> i64 {
        self.runs.iter().filter(|&&r| r >= 0).sum()
    }
}

/// A flattened, serializable summary of one finished alignment: width plus
/// one `(node_id, rendered row)` pair per saved view. Separate from
/// [`AlignmentRow`]'s run-length form, which is an internal streaming detail
/// not meant to be a stable on-disk shape.
///
/// Gated behind the `serde` feature, in the same spirit as the teacher's own
/// optional metadata serialization (`tskit`'s `serde`-gated schema types):
/// downstream tooling (benchmark harnesses, plotting scripts) can consume a
/// run's alignment as JSON without linking against this crate's internal
/// row representation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsaSummary {
    pub width: u64,
    pub rows: Vec<(u64, String)>,
}

impl MsaSummary {
    /// Build a summary from every row in `rows`, rendering each with
    /// [`AlignmentRow::render_template`] (the gap-only view; callers with
    /// residue data should render their own strings and use
    /// [`MsaSummary`]'s fields directly instead).
    pub fn from_rows(width: u64, rows: &[AlignmentRow]) -> Self {
        Self {
            width,
            rows: rows.iter().map(|r| (r.node_id, r.render_template())).collect(),
        }
    }
}

/// Reconstructs aligned rows from the set of saved views over one
/// [`SuperSequence`] (spec.md C10). Must run after
/// [`SuperSequence::assign_absolute_positions`].
pub struct MsaBuilder<'a> {
    super_sequence: &'a SuperSequence,
    width: u64,
}

impl<'a> MsaBuilder<'a> {
    pub fn new(super_sequence: &'a SuperSequence) -> Self {
        Self {
            super_sequence,
            width: super_sequence.num_columns(),
        }
    }

    pub fn width(&self) -> u64 {
        self.width
    }

    /// Build one view's aligned row by walking its handles and comparing
    /// each one's absolute position to where the previous handle left off.
    ///
    /// Every handle of a saved view is guaranteed to be a column (it was
    /// referenced, or born as one, when the view was generated -- spec.md
    /// S4.5), so `absolute_position` never fails here.
    pub fn build_row(&self, view: &SequenceView) -> AlignmentRow {
        let mut runs = Vec::new();
        let mut previous_absolute: i64 = -1; // spec.md S4.6
        let mut residue_run = 0i64;

        for &site in view.handles() {
            let position = self.super_sequence.absolute_position(site) as i64;
            let gap = position - previous_absolute - 1;
            if gap > 0 {
                if residue_run > 0 {
                    runs.push(residue_run);
                    residue_run = 0;
                }
                runs.push(-gap);
            }
            residue_run += 1;
            previous_absolute = position;
        }
        if residue_run > 0 {
            runs.push(residue_run);
        }
        let trailing_gap = self.width as i64 - previous_absolute - 1;
        if trailing_gap > 0 {
            runs.push(-trailing_gap);
        }
        AlignmentRow {
            node_id: view.node_id(),
            runs,
        }
    }

    /// Build every saved view's row, keeping all of them resident
    /// (spec.md S5: default, used when `keep_in_memory` is set).
    pub fn build_all(&self, views: &[SequenceView]) -> Vec<AlignmentRow> {
        views.iter().filter(|v| v.is_saved()).map(|v| self.build_row(v)).collect()
    }

    /// Build and write each saved view's row as soon as it's computed,
    /// never retaining more than one in memory at a time (spec.md S5:
    /// `keep_in_memory = false`, "each leaf's finished alignment row is
    /// appended to a temporary file and its view is released
    /// immediately").
    pub fn stream_rows<W: Write>(
        &self,
        views: impl IntoIterator<Item = SequenceView>,
        mut sink: W,
    ) -> io::Result<()> {
        for view in views.into_iter().filter(|v| v.is_saved()) {
            let row = self.build_row(&view);
            writeln!(sink, "{}\t{}", row.node_id, row.render_template())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_leading_and_trailing_gap() {
        let mut ss = SuperSequence::new(3);
        let root = SequenceView::root(&mut ss, 0, true);
        // child inserts 2 at the front, drops the last root site.
        let blocks = vec![
            crate::block::Block::new(-1, 0, 2),
            crate::block::Block::new(0, 2, 0),
        ];
        let child = SequenceView::generate(&mut ss, &root, &blocks, 1, true);
        ss.assign_absolute_positions();
        let builder = MsaBuilder::new(&ss);
        let row = builder.build_row(&child);
        assert_eq!(row.width(), builder.width());
        assert_eq!(row.non_gap_count(), child.len() as i64);
        assert_eq!(row.render_template(), "XXXX-");
    }

    #[test]
    fn test_root_row_has_no_gaps() {
        let mut ss = SuperSequence::new(4);
        let root = SequenceView::root(&mut ss, 0, true);
        ss.assign_absolute_positions();
        let builder = MsaBuilder::new(&ss);
        let row = builder.build_row(&root);
        assert_eq!(row.render_template(), "XXXX");
    }

    #[test]
    fn test_render_with_residues_overlays_non_gap_positions() {
        let mut ss = SuperSequence::new(2);
        let root = SequenceView::root(&mut ss, 0, true);
        ss.assign_absolute_positions();
        let builder = MsaBuilder::new(&ss);
        let row = builder.build_row(&root);
        assert_eq!(row.render_with_residues(&['A', 'C']), "AC");
    }

    #[test]
    fn test_msa_summary_collects_one_row_per_view() {
        let mut ss = SuperSequence::new(4);
        let root = SequenceView::root(&mut ss, 0, true);
        ss.assign_absolute_positions();
        let builder = MsaBuilder::new(&ss);
        let row = builder.build_row(&root);
        let summary = MsaSummary::from_rows(builder.width(), &[row]);
        assert_eq!(summary.width, 4);
        assert_eq!(summary.rows, vec![(0, "XXXX".to_owned())]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_msa_summary_round_trips_through_json() {
        let summary = MsaSummary {
            width: 5,
            rows: vec![(0, "XX-XX".to_owned()), (1, "-XXXX".to_owned())],
        };
        let json = serde_json::to_string(&summary).unwrap();
        let back: MsaSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(summary, back);
    }
}
