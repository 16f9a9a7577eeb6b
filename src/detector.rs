//! # Experiment Detection
//!
//! Picks the experiment profile that matches a file's layout.
//!
//! Profiles are tried in priority order (CMS, ATLAS, ALICE). A profile is
//! confirmed when one of its candidate trees exists and carries at least one
//! of its detection branches. Otherwise every tree is scanned for
//! characteristic branch prefixes, and as a last resort the file is treated
//! as CMS with [`Confidence::Fallback`], which callers should surface.

use std::fmt;

use log::{debug, info, warn};

use crate::reader::{DataFile, EventTree, ReaderError};
use crate::schema::{Experiment, ExperimentSelector, GENERIC_TREE_NAMES};

/// Errors raised while locating the tree to process
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The file holds no trees at all
    #[error("No TTree found in file")]
    NoTree,

    /// Error from the underlying reader
    #[error("Reader error: {0}")]
    Reader(#[from] ReaderError),
}

/// How a detection verdict was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confidence {
    /// The caller chose the experiment
    Forced,
    /// A profile tree carried `matched` of the profile's `expected` detection branches
    Confirmed {
        /// Detection branches found
        matched: usize,
        /// Detection branches in the profile
        expected: usize,
    },
    /// A branch name prefix pointed at the experiment
    Heuristic {
        /// The branch that matched
        branch: String,
    },
    /// Nothing matched; CMS was assumed
    Fallback,
}

impl Confidence {
    /// Short label for summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Confidence::Forced => "forced",
            Confidence::Confirmed { .. } => "confirmed",
            Confidence::Heuristic { .. } => "heuristic",
            Confidence::Fallback => "fallback",
        }
    }
}

/// Detection verdict: experiment, tree and confidence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Selected experiment
    pub experiment: Experiment,
    /// Tree to process
    pub tree_name: String,
    /// How the verdict was reached
    pub confidence: Confidence,
}

impl Detection {
    /// True when the verdict is a guess the caller should report.
    pub fn is_low_confidence(&self) -> bool {
        matches!(self.confidence, Confidence::Fallback)
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (tree '{}', ", self.experiment, self.tree_name)?;
        match &self.confidence {
            Confidence::Forced => write!(f, "forced)"),
            Confidence::Confirmed { matched, expected } => {
                write!(f, "confirmed by {matched}/{expected} branches)")
            }
            Confidence::Heuristic { branch } => write!(f, "guessed from '{branch}')"),
            Confidence::Fallback => write!(f, "fallback)"),
        }
    }
}

/// Apply a selector: detect for `Auto`, locate the tree for a forced experiment.
pub fn select<F: DataFile>(
    file: &mut F,
    selector: ExperimentSelector,
) -> Result<Detection, DetectError> {
    match selector {
        ExperimentSelector::Auto => detect(file),
        ExperimentSelector::Forced(experiment) => {
            let tree_name = locate_tree(file, experiment).ok_or(DetectError::NoTree)?;
            Ok(Detection {
                experiment,
                tree_name,
                confidence: Confidence::Forced,
            })
        }
    }
}

/// Inspect tree and branch names and pick the best-matching profile.
pub fn detect<F: DataFile>(file: &mut F) -> Result<Detection, DetectError> {
    let trees = file.tree_names();
    let first_tree = trees.first().cloned().ok_or(DetectError::NoTree)?;

    for experiment in Experiment::ALL {
        let profile = experiment.profile();
        let Some(tree_name) = profile
            .tree_names
            .iter()
            .find(|name| trees.iter().any(|t| t == *name))
        else {
            continue;
        };
        let branches = file.open_tree(tree_name)?.branch_names();
        let matched = profile
            .detection_branches
            .iter()
            .filter(|b| branches.iter().any(|name| name == *b))
            .count();
        debug!(
            "{}: tree '{}' has {}/{} detection branches",
            experiment,
            tree_name,
            matched,
            profile.detection_branches.len()
        );
        if matched > 0 {
            let detection = Detection {
                experiment,
                tree_name: tree_name.to_string(),
                confidence: Confidence::Confirmed {
                    matched,
                    expected: profile.detection_branches.len(),
                },
            };
            info!("Detected {}", detection);
            return Ok(detection);
        }
    }

    for tree_name in &trees {
        let tree = file.open_tree(tree_name)?;
        for branch in tree.branch_names() {
            if let Some(experiment) = experiment_from_prefix(&branch) {
                let detection = Detection {
                    experiment,
                    tree_name: tree.name().to_string(),
                    confidence: Confidence::Heuristic { branch },
                };
                info!("Detected {}", detection);
                return Ok(detection);
            }
        }
    }

    let tree_name = locate_tree(file, Experiment::Cms).unwrap_or(first_tree);
    let detection = Detection {
        experiment: Experiment::Cms,
        tree_name,
        confidence: Confidence::Fallback,
    };
    warn!("Could not identify experiment, assuming {}", detection);
    Ok(detection)
}

/// Characteristic branch prefixes.
fn experiment_from_prefix(branch: &str) -> Option<Experiment> {
    if branch.starts_with("Muon_") || branch.starts_with("Electron_") {
        Some(Experiment::Cms)
    } else if branch.starts_with("lep_") {
        Some(Experiment::Atlas)
    } else if branch.contains("Ali") || branch.contains("ESD") {
        Some(Experiment::Alice)
    } else {
        None
    }
}

/// Tree to use for an experiment: a profile candidate, then a generic name,
/// then the first tree in the file.
pub fn locate_tree<F: DataFile>(file: &F, experiment: Experiment) -> Option<String> {
    let trees = file.tree_names();
    experiment
        .profile()
        .tree_names
        .iter()
        .chain(GENERIC_TREE_NAMES)
        .find(|name| trees.iter().any(|t| t == *name))
        .map(|name| name.to_string())
        .or_else(|| trees.first().cloned())
}
