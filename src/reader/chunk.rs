//! Columnar chunk containers.

use std::collections::HashMap;

use super::{CellIter, ColumnShape, ColumnSpec, ReaderError};

/// Variable-length per-event values stored as offsets into one flat buffer.
///
/// Event `i` owns `values[offsets[i]..offsets[i + 1]]`; `offsets` always has
/// one more entry than there are events and starts at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Jagged {
    offsets: Vec<usize>,
    values: Vec<f64>,
}

impl Default for Jagged {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
        }
    }
}

impl Jagged {
    /// Build from raw offsets and values, validating the layout.
    pub fn new(offsets: Vec<usize>, values: Vec<f64>) -> Result<Self, ReaderError> {
        match offsets.first() {
            Some(0) => {}
            Some(first) => {
                return Err(ReaderError::InvalidLayout(format!(
                    "offsets start at {first}, expected 0"
                )))
            }
            None => return Err(ReaderError::InvalidLayout("empty offsets".to_string())),
        }
        if offsets.windows(2).any(|w| w[1] < w[0]) {
            return Err(ReaderError::InvalidLayout(
                "offsets are not monotonic".to_string(),
            ));
        }
        let last = offsets.last().copied().unwrap_or(0);
        if last != values.len() {
            return Err(ReaderError::InvalidLayout(format!(
                "last offset {last} does not match {} values",
                values.len()
            )));
        }
        Ok(Self { offsets, values })
    }

    /// Empty container with room for `events` events.
    pub fn with_capacity(events: usize, values: usize) -> Self {
        let mut offsets = Vec::with_capacity(events + 1);
        offsets.push(0);
        Self {
            offsets,
            values: Vec::with_capacity(values),
        }
    }

    /// Build from one list per event.
    pub fn from_lists<I, L>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<[f64]>,
    {
        let mut jagged = Self::default();
        for list in lists {
            jagged.push(list.as_ref());
        }
        jagged
    }

    /// Append one event.
    pub fn push(&mut self, values: &[f64]) {
        self.values.extend_from_slice(values);
        self.offsets.push(self.values.len());
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// True when there are no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of values across all events.
    pub fn total(&self) -> usize {
        self.values.len()
    }

    /// Event boundaries.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Flat value buffer.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Values of one event.
    pub fn event(&self, index: usize) -> Option<&[f64]> {
        let start = *self.offsets.get(index)?;
        let end = *self.offsets.get(index + 1)?;
        Some(&self.values[start..end])
    }

    /// Iterate events in order.
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.offsets
            .windows(2)
            .map(move |w| &self.values[w[0]..w[1]])
    }

    /// Number of values per event.
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Per-event sum; empty events sum to 0.
    pub fn sum_per_event(&self) -> Vec<f64> {
        // `Iterator::sum` starts from -0.0
        self.iter()
            .map(|event| event.iter().fold(0.0_f64, |acc, v| acc + v))
            .collect()
    }

    /// Per-event maximum; empty events yield 0.
    pub fn max_per_event(&self) -> Vec<f64> {
        self.iter()
            .map(|event| event.iter().copied().fold(0.0_f64, f64::max))
            .collect()
    }

    /// Per-event count of values strictly above `threshold`.
    pub fn count_above(&self, threshold: f64) -> Vec<u32> {
        self.iter()
            .map(|event| event.iter().filter(|v| **v > threshold).count() as u32)
            .collect()
    }

    /// Multiply every value in place.
    pub fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }
}

/// One entry of a branch as delivered by a decoder.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// A single number
    Value(f64),
    /// A variable-length list
    List(Vec<f64>),
}

/// One column of a chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// One number per event
    PerEvent(Vec<f64>),
    /// A list per event
    PerParticle(Jagged),
}

impl Column {
    /// Number of events in the column.
    pub fn len(&self) -> usize {
        match self {
            Column::PerEvent(values) => values.len(),
            Column::PerParticle(jagged) => jagged.len(),
        }
    }

    /// True when the column holds no events.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Multiply every value in place.
    pub fn scale(&mut self, factor: f64) {
        match self {
            Column::PerEvent(values) => values.iter_mut().for_each(|v| *v *= factor),
            Column::PerParticle(jagged) => jagged.scale(factor),
        }
    }

    /// Pull `len` cells into a column of the requested shape.
    ///
    /// A list delivered for a per-event column contributes its first element
    /// (0 when empty); a number delivered for a per-particle column becomes a
    /// one-element list. Returns the number of cells actually delivered when
    /// the source runs dry.
    pub(crate) fn collect<I>(shape: ColumnShape, cells: I, len: usize) -> Result<Self, usize>
    where
        I: Iterator<Item = Cell>,
    {
        let mut delivered = 0usize;
        let column = match shape {
            ColumnShape::PerEvent => {
                let mut values = Vec::with_capacity(len);
                for cell in cells.take(len) {
                    values.push(match cell {
                        Cell::Value(v) => v,
                        Cell::List(list) => list.first().copied().unwrap_or(0.0),
                    });
                    delivered += 1;
                }
                Column::PerEvent(values)
            }
            ColumnShape::PerParticle => {
                let mut jagged = Jagged::with_capacity(len, len * 4);
                for cell in cells.take(len) {
                    match cell {
                        Cell::Value(v) => jagged.push(&[v]),
                        Cell::List(list) => jagged.push(&list),
                    }
                    delivered += 1;
                }
                Column::PerParticle(jagged)
            }
        };
        if delivered < len {
            Err(delivered)
        } else {
            Ok(column)
        }
    }
}

/// A batch of consecutive events, one column per requested branch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawChunk {
    /// File-wide index of the first event in this chunk
    pub start: u64,
    /// Number of events
    pub len: usize,
    columns: HashMap<String, Column>,
}

impl RawChunk {
    /// Empty chunk covering `len` events from `start`.
    pub fn new(start: u64, len: usize) -> Self {
        Self {
            start,
            len,
            columns: HashMap::new(),
        }
    }

    /// Builder-style column insertion.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Self {
        self.insert(name, column);
        self
    }

    /// Insert or replace a column.
    pub fn insert(&mut self, name: impl Into<String>, column: Column) {
        self.columns.insert(name.into(), column);
    }

    /// Column by raw branch name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Mutable column by raw branch name.
    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// Per-event values, if the column exists with that shape.
    pub fn per_event(&self, name: &str) -> Option<&[f64]> {
        match self.columns.get(name)? {
            Column::PerEvent(values) => Some(values),
            Column::PerParticle(_) => None,
        }
    }

    /// Per-particle values, if the column exists with that shape.
    pub fn per_particle(&self, name: &str) -> Option<&Jagged> {
        match self.columns.get(name)? {
            Column::PerParticle(jagged) => Some(jagged),
            Column::PerEvent(_) => None,
        }
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Consecutive fixed-size chunks pulled lazily from per-branch cell streams.
///
/// Only one chunk is materialised at a time.
pub struct ChunkStream<'a> {
    sources: Vec<(ColumnSpec, CellIter<'a>)>,
    chunk_size: usize,
    next_entry: u64,
    total: u64,
}

impl<'a> ChunkStream<'a> {
    /// Stream `total` entries in chunks of at most `chunk_size`.
    pub fn new(sources: Vec<(ColumnSpec, CellIter<'a>)>, total: u64, chunk_size: usize) -> Self {
        Self {
            sources,
            chunk_size: chunk_size.max(1),
            next_entry: 0,
            total,
        }
    }

    /// Entries the stream will cover.
    pub fn total_entries(&self) -> u64 {
        self.total
    }

    /// Entries already handed out.
    pub fn consumed(&self) -> u64 {
        self.next_entry
    }
}

impl Iterator for ChunkStream<'_> {
    type Item = Result<RawChunk, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_entry >= self.total {
            return None;
        }
        let start = self.next_entry;
        let len = (self.total - start).min(self.chunk_size as u64) as usize;
        self.next_entry += len as u64;

        let mut chunk = RawChunk::new(start, len);
        for (spec, cells) in self.sources.iter_mut() {
            match Column::collect(spec.shape, cells.by_ref(), len) {
                Ok(column) => chunk.insert(spec.name.clone(), column),
                Err(got) => {
                    self.next_entry = self.total;
                    return Some(Err(ReaderError::TruncatedBranch {
                        branch: spec.name.clone(),
                        expected: self.total,
                        got: start + got as u64,
                    }));
                }
            }
        }
        Some(Ok(chunk))
    }
}

impl std::fmt::Debug for ChunkStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("columns", &self.sources.iter().map(|(s, _)| &s.name).collect::<Vec<_>>())
            .field("chunk_size", &self.chunk_size)
            .field("next_entry", &self.next_entry)
            .field("total", &self.total)
            .finish()
    }
}
