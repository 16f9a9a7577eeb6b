//! # Ranking
//!
//! Events are ranked by HT, descending. The sort is stable so equal HT keeps
//! file order, and NaN ranks last.
//!
//! [`EventAccumulator`] collects passing events chunk by chunk and bounds
//! memory in one of two ways:
//!
//! - [`ScanMode::Bounded`] stops the scan once twice the cap has been
//!   collected. Fast, but not an exact top-K when file order correlates
//!   with HT.
//! - [`ScanMode::Exact`] reads everything and compacts the buffer to the
//!   current top `max_events` whenever it grows beyond twice the cap, which
//!   gives the same result as ranking every passing event at once.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::event::EventRecord;

/// How far a file is scanned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Stop once twice the cap has been collected (default)
    #[default]
    Bounded,
    /// Read to completion; exact top-K
    Exact,
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Bounded => write!(f, "bounded"),
            ScanMode::Exact => write!(f, "exact"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bounded" | "fast" => Ok(ScanMode::Bounded),
            "exact" | "full" => Ok(ScanMode::Exact),
            _ => Err(format!(
                "Unknown scan mode '{}'. Valid options: bounded, exact",
                s
            )),
        }
    }
}

/// Descending HT order, NaN last.
pub fn ht_order(a: &EventRecord, b: &EventRecord) -> Ordering {
    match (a.ht.is_nan(), b.ht.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.ht.partial_cmp(&a.ht).unwrap_or(Ordering::Equal),
    }
}

/// Stable in-place sort by descending HT.
pub fn sort_by_ht(events: &mut [EventRecord]) {
    events.sort_by(ht_order);
}

/// Sort and keep the top `max_events`.
pub fn rank(mut events: Vec<EventRecord>, max_events: usize) -> Vec<EventRecord> {
    sort_by_ht(&mut events);
    events.truncate(max_events);
    events
}

/// Chunk-by-chunk collector of passing events.
#[derive(Debug, Clone)]
pub struct EventAccumulator {
    events: Vec<EventRecord>,
    max_events: usize,
    mode: ScanMode,
    collected: u64,
}

impl EventAccumulator {
    /// Create an accumulator for a cap and scan mode.
    pub fn new(max_events: usize, mode: ScanMode) -> Self {
        Self {
            events: Vec::new(),
            max_events,
            mode,
            collected: 0,
        }
    }

    fn limit(&self) -> usize {
        self.max_events.saturating_mul(2)
    }

    /// Add the passing events of one chunk, in file order.
    pub fn extend(&mut self, events: Vec<EventRecord>) {
        self.collected += events.len() as u64;
        self.events.extend(events);
        if self.mode == ScanMode::Exact && self.events.len() > self.limit() {
            sort_by_ht(&mut self.events);
            self.events.truncate(self.max_events);
        }
    }

    /// Bounded mode has collected enough; the caller should stop reading.
    pub fn is_saturated(&self) -> bool {
        self.mode == ScanMode::Bounded && self.events.len() >= self.limit()
    }

    /// Events currently buffered.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total passing events seen, including those compacted away.
    pub fn collected(&self) -> u64 {
        self.collected
    }

    /// Final ranking.
    pub fn finish(self) -> Vec<EventRecord> {
        rank(self.events, self.max_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MetVector;
    use crate::schema::Experiment;

    fn event(index: u64, ht: f64) -> EventRecord {
        EventRecord {
            index,
            experiment: Experiment::Cms,
            ht,
            met: 0.0,
            n_bjets: None,
            leading_lepton_pt: 0.0,
            particles: Vec::new(),
            met_vector: MetVector::default(),
            triggers: None,
        }
    }

    fn indices(events: &[EventRecord]) -> Vec<u64> {
        events.iter().map(|e| e.index).collect()
    }

    #[test]
    fn test_rank_descending_and_capped() {
        let events = vec![event(0, 10.0), event(1, 50.0), event(2, 30.0), event(3, 40.0)];
        let ranked = rank(events, 3);
        assert_eq!(indices(&ranked), vec![1, 3, 2]);
    }

    #[test]
    fn test_ties_keep_file_order() {
        let events = vec![event(0, 5.0), event(1, 9.0), event(2, 5.0), event(3, 5.0)];
        assert_eq!(indices(&rank(events, 10)), vec![1, 0, 2, 3]);
    }

    #[test]
    fn test_nan_ranks_last() {
        let events = vec![event(0, f64::NAN), event(1, 1.0), event(2, 2.0)];
        assert_eq!(indices(&rank(events, 10)), vec![2, 1, 0]);
    }

    #[test]
    fn test_bounded_saturates() {
        let mut acc = EventAccumulator::new(2, ScanMode::Bounded);
        acc.extend(vec![event(0, 1.0), event(1, 2.0), event(2, 3.0)]);
        assert!(!acc.is_saturated());
        acc.extend(vec![event(3, 4.0)]);
        assert!(acc.is_saturated());
        assert_eq!(indices(&acc.finish()), vec![3, 2]);
    }

    #[test]
    fn test_exact_compacts_and_never_saturates() {
        let mut acc = EventAccumulator::new(2, ScanMode::Exact);
        for chunk in 0..5u64 {
            acc.extend((0..3).map(|i| event(chunk * 3 + i, (chunk * 3 + i) as f64)).collect());
            assert!(!acc.is_saturated());
            assert!(acc.len() <= 4 + 3);
        }
        assert_eq!(acc.collected(), 15);
        assert_eq!(indices(&acc.finish()), vec![14, 13]);
    }

    #[test]
    fn test_scan_mode_parse() {
        assert_eq!("exact".parse::<ScanMode>().unwrap(), ScanMode::Exact);
        assert_eq!("Bounded".parse::<ScanMode>().unwrap(), ScanMode::Bounded);
        assert!("sometimes".parse::<ScanMode>().is_err());
        assert_eq!(ScanMode::default().to_string(), "bounded");
    }
}
