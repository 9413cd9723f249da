//! Accumulation of matching records without a comparison sort.
//!
//! Ordering keys (rating, popularity) are small bounded integers, so matches
//! are dropped into one bucket per key value and the buckets are concatenated
//! in key order at the end. Records sharing a key keep their encounter order,
//! which makes the result identical to a stable sort by that key.
//!
//! # Key Domain
//!
//! Buckets live in a dense vector indexed by `key - base`, grown on demand in
//! either direction. The span between the smallest and largest key seen must
//! stay within [`MAX_BUCKET_KEY_SPAN`]; wider input fails with
//! `PuzzleError::Overflow` instead of allocating without bound.

use crate::constants::MAX_BUCKET_KEY_SPAN;
use crate::error::{PuzzleError, Result};
use crate::types::{OrderBy, PuzzleRecord};

/// Matching records collected during one pipeline run.
#[derive(Debug)]
pub enum RecordBucket {
    /// Encounter order, no ordering requested.
    Flat(Vec<PuzzleRecord>),
    Keyed(KeyedBuckets),
}

impl RecordBucket {
    pub fn new(order: OrderBy) -> Self {
        match order {
            OrderBy::None => RecordBucket::Flat(Vec::new()),
            OrderBy::ByRating => RecordBucket::Keyed(KeyedBuckets::new(order, false)),
            OrderBy::ByPopularity => RecordBucket::Keyed(KeyedBuckets::new(order, true)),
        }
    }

    pub fn push(&mut self, record: PuzzleRecord) -> Result<()> {
        match self {
            RecordBucket::Flat(records) => {
                records.push(record);
                Ok(())
            }
            RecordBucket::Keyed(buckets) => buckets.push(record),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBucket::Flat(records) => records.len(),
            RecordBucket::Keyed(buckets) => buckets.len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten in order, keeping only the first `limit` records.
    pub fn into_ordered(self, limit: Option<usize>) -> Vec<PuzzleRecord> {
        let limit = limit.unwrap_or(usize::MAX);
        match self {
            RecordBucket::Flat(mut records) => {
                records.truncate(limit);
                records
            }
            RecordBucket::Keyed(buckets) => buckets.into_ordered(limit),
        }
    }
}

/// One bucket per key value between the smallest and largest key seen.
#[derive(Debug)]
pub struct KeyedBuckets {
    order: OrderBy,
    descending: bool,
    /// Key of `slots[0]`.
    base: i64,
    slots: Vec<Vec<PuzzleRecord>>,
    len: usize,
}

impl KeyedBuckets {
    fn new(order: OrderBy, descending: bool) -> Self {
        Self {
            order,
            descending,
            base: 0,
            slots: Vec::new(),
            len: 0,
        }
    }

    fn key_of(&self, record: &PuzzleRecord) -> i64 {
        match self.order {
            OrderBy::ByPopularity => record.popularity,
            _ => record.rating,
        }
    }

    fn push(&mut self, record: PuzzleRecord) -> Result<()> {
        let key = self.key_of(&record);

        if self.slots.is_empty() {
            self.base = key;
            self.slots.push(Vec::new());
        }

        if key < self.base {
            let grow = self.base.abs_diff(key);
            self.check_span(grow)?;
            // Prepend empty buckets so `key` becomes the new base.
            let mut slots = Vec::with_capacity(self.slots.len() + grow as usize);
            slots.resize_with(grow as usize, Vec::new);
            slots.append(&mut self.slots);
            self.slots = slots;
            self.base = key;
        } else {
            let offset = key.abs_diff(self.base);
            if offset >= self.slots.len() as u64 {
                self.check_span(offset + 1 - self.slots.len() as u64)?;
                self.slots.resize_with(offset as usize + 1, Vec::new);
            }
        }

        let idx = key.abs_diff(self.base) as usize;
        self.slots[idx].push(record);
        self.len += 1;
        Ok(())
    }

    fn check_span(&self, grow: u64) -> Result<()> {
        let span = (self.slots.len() as u64).saturating_add(grow);
        if span > MAX_BUCKET_KEY_SPAN as u64 {
            return Err(PuzzleError::overflow(
                format!("{:?} bucket key span", self.order),
                MAX_BUCKET_KEY_SPAN,
                usize::try_from(span).unwrap_or(usize::MAX),
            ));
        }
        Ok(())
    }

    fn into_ordered(self, limit: usize) -> Vec<PuzzleRecord> {
        let mut out = Vec::with_capacity(self.len.min(limit));
        let slots: Box<dyn Iterator<Item = Vec<PuzzleRecord>>> = if self.descending {
            Box::new(self.slots.into_iter().rev())
        } else {
            Box::new(self.slots.into_iter())
        };
        for slot in slots {
            let room = limit - out.len();
            if room == 0 {
                break;
            }
            out.extend(slot.into_iter().take(room));
        }
        out
    }
}
