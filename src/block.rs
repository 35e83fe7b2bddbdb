//! [`Block`] and [`IndelEvent`]: the atomic units the indel engine operates
//! on, plus classification of an event into one of the fourteen rewrite
//! cases from spec.md S4.1.
//!
//! Grounded on `original_source/classes/block.py` and
//! `original_source/indelsim/classes/indel_event.py`, and the case analysis
//! in `original_source/indelsim/classes/seq_node_as_tree.py`
//! (`find_event_sub_type`).

/// Sentinel `ancestor_index` marking a block with no parent ancestry (a
/// "pure insertion" block). Sorts strictly before every real column index.
pub const PURE_INSERTION: i64 = -1;

/// One contiguous segment of a sequence relative to its parent.
///
/// A block is *redundant* (must be deleted by its owner) iff both counts
/// are zero and it is not the unique root sentinel -- callers are
/// responsible for checking [`Block::is_redundant`] after shrinking a block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Block {
    pub ancestor_index: i64,
    pub copied_count: u64,
    pub inserted_count: u64,
}

impl Block {
    pub fn new(ancestor_index: i64, copied_count: u64, inserted_count: u64) -> Self {
        Self {
            ancestor_index,
            copied_count,
            inserted_count,
        }
    }

    /// This block's own contribution to sequence length.
    pub fn len(&self) -> u64 {
        self.copied_count + self.inserted_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_redundant(&self) -> bool {
        self.copied_count == 0 && self.inserted_count == 0
    }

    /// Re-key this block to a pure-insertion block, dropping its ancestry.
    /// Used by `DELETION_ALL_COPIED_UNCONTAINED_AT_START` (spec.md S4.1).
    pub(crate) fn update_key_to_insert_only(&mut self) {
        self.ancestor_index = PURE_INSERTION;
    }
}

/// An insertion or deletion at a given position, with a strictly positive
/// length after clipping.
///
/// `place` may be negative for deletions that begin before the sequence
/// start; construction clips such events to `[0, place + length)`, matching
/// `original_source/indelsim/classes/indel_event.py`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IndelEvent {
    pub is_insertion: bool,
    pub place: i64,
    pub length: i64,
}

impl IndelEvent {
    pub fn new(is_insertion: bool, place: i64, length: i64) -> Self {
        if place < 0 {
            Self {
                is_insertion,
                place: 0,
                length: length - place.unsigned_abs() as i64,
            }
        } else {
            Self {
                is_insertion,
                place,
                length,
            }
        }
    }

    /// `true` once clipping has made this event a no-op (spec.md S3:
    /// "Deletions whose effective span becomes empty after clipping are
    /// no-ops").
    pub fn is_empty_after_clipping(&self) -> bool {
        self.length <= 0
    }
}

/// One of the fourteen cases enumerated in spec.md S4.1, plus the
/// "ignore this event" outcome that spec.md S7 calls `OutOfSequence`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventSubtype {
    InsertionAtStart,
    InsertionAtStartAddition,
    InsertionInsideCopied,
    InsertionInsideInserted,
    InsertionAtEnd,
    DeletionInsideCopiedContainedAtMid,
    DeletionInsideCopiedContainedAtStart,
    DeletionInsideCopiedUncontained,
    DeletionOfCopied,
    DeletionAllCopiedUncontained,
    DeletionAllCopiedUncontainedAtStart,
    DeletionInsideInsertedContained,
    DeletionInsideInsertedUncontained,
    DeletionOfInserted,
    OutOfSequence,
}
