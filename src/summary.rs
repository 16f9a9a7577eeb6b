//! Processing summaries: provenance, counts, timing and distributions.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::event::{round2, round_to, EventRecord};
use crate::ranking::ScanMode;
use crate::schema::ParticleKind;

/// Number of equal-width bins in the HT and MET distributions.
pub const HISTOGRAM_BINS: usize = 20;

/// Name and version recorded in every summary.
pub const PROCESSOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Equal-width histogram over the finite values.
///
/// Always returns `bins` counts (all zero for no data). A degenerate range
/// is widened to `[v - 0.5, v + 0.5]`; the maximum lands in the last bin.
pub fn histogram(values: &[f64], bins: usize) -> Vec<u64> {
    let mut counts = vec![0u64; bins];
    if bins == 0 {
        return counts;
    }
    let finite = || values.iter().copied().filter(|v| v.is_finite());
    let Some(min) = finite().reduce(f64::min) else {
        return counts;
    };
    let max = finite().fold(min, f64::max);
    let (lo, hi) = if max > min {
        (min, max)
    } else {
        (min - 0.5, min + 0.5)
    };
    let width = (hi - lo) / bins as f64;
    for v in finite() {
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
}

/// Per-file or merged processing metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingSummary {
    /// Input file, or folder for merged documents
    pub source_file: String,
    /// Tree that was read
    pub tree_name: String,
    /// Experiment tag
    pub experiment: String,
    /// How the experiment was chosen
    pub detection: String,
    /// Producer name and version
    pub processor: String,
    /// Events read from the tree
    pub total_scanned: u64,
    /// Events in the output
    pub filtered_events: usize,
    /// Wall time
    #[serde(serialize_with = "round2")]
    pub processing_time_sec: f64,
    /// Scan throughput
    pub events_per_sec: u64,
    /// Local ISO-8601 timestamp
    pub processed_at: String,
    /// Bounded or exact scan
    pub scan_mode: ScanMode,
    /// Whether a bounded scan stopped before the end of the tree
    pub early_terminated: bool,
    /// Particle kinds present in the output, sorted
    pub particle_types: Vec<String>,
    /// HT distribution over the output events
    pub ht_distribution: Vec<u64>,
    /// MET distribution over the output events
    pub met_distribution: Vec<u64>,
    /// Mean particle count per output event
    #[serde(serialize_with = "round2")]
    pub avg_particles_per_event: f64,
    /// Non-fatal conditions worth reporting
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Merged inputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_files: Option<Vec<String>>,
    /// Per-file failures of a merge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl ProcessingSummary {
    /// Empty summary for a source, stamped with the current local time.
    pub fn new(source_file: impl Into<String>, tree_name: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            tree_name: tree_name.into(),
            experiment: String::new(),
            detection: String::new(),
            processor: PROCESSOR.to_string(),
            total_scanned: 0,
            filtered_events: 0,
            processing_time_sec: 0.0,
            events_per_sec: 0,
            processed_at: chrono::Local::now()
                .format("%Y-%m-%dT%H:%M:%S")
                .to_string(),
            scan_mode: ScanMode::default(),
            early_terminated: false,
            particle_types: Vec::new(),
            ht_distribution: vec![0; HISTOGRAM_BINS],
            met_distribution: vec![0; HISTOGRAM_BINS],
            avg_particles_per_event: 0.0,
            warnings: Vec::new(),
            source_files: None,
            errors: None,
        }
    }

    /// Record the particle kinds a file provides, whether or not any event
    /// passes. Kinds already listed are kept.
    pub fn with_particle_types(mut self, kinds: impl IntoIterator<Item = ParticleKind>) -> Self {
        let merged: BTreeSet<String> = self
            .particle_types
            .drain(..)
            .chain(kinds.into_iter().map(|k| k.as_str().to_string()))
            .collect();
        self.particle_types = merged.into_iter().collect();
        self
    }

    /// Recompute every output-dependent field from the final events.
    ///
    /// Kinds emitted by the events (such as flavours split out of a unified
    /// lepton collection) are added to [`ProcessingSummary::particle_types`].
    pub fn with_events(mut self, events: &[EventRecord]) -> Self {
        let ht: Vec<f64> = events.iter().map(|e| e.ht).collect();
        let met: Vec<f64> = events.iter().map(|e| e.met).collect();
        let total_particles: usize = events.iter().map(EventRecord::num_particles).sum();
        let emitted: Vec<ParticleKind> = events
            .iter()
            .flat_map(|e| e.particles.iter().map(|p| p.kind))
            .collect();

        self = self.with_particle_types(emitted);
        self.filtered_events = events.len();
        self.ht_distribution = histogram(&ht, HISTOGRAM_BINS);
        self.met_distribution = histogram(&met, HISTOGRAM_BINS);
        self.avg_particles_per_event = if events.is_empty() {
            0.0
        } else {
            total_particles as f64 / events.len() as f64
        };
        self
    }

    /// Record scan size and wall time.
    pub fn with_timing(mut self, total_scanned: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        self.total_scanned = total_scanned;
        self.processing_time_sec = secs;
        self.events_per_sec = (total_scanned as f64 / secs.max(0.001)).round() as u64;
        self
    }
}

impl fmt::Display for ProcessingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: kept {} of {} scanned events ({}, tree '{}') in {:.2}s, {} events/sec",
            self.source_file,
            self.filtered_events,
            self.total_scanned,
            self.experiment,
            self.tree_name,
            round_to(self.processing_time_sec, 2),
            self.events_per_sec
        )
    }
}
