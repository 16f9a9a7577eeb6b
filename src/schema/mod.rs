//! # Schema Registry
//!
//! Static per-experiment profiles describing where each physical quantity
//! lives in a ROOT TTree, and the per-file [`ResolvedSchema`] computed from
//! them once a file's branch list is known.
//!
//! ## Profiles
//!
//! | Experiment | Trees | Kinematics | Units | Selection (lepton / MET / jet) |
//! |------------|-------|------------|-------|--------------------------------|
//! | CMS (NanoAOD) | `Events`, `events` | pt/eta/phi/mass | GeV | 20 / 20 / 30 |
//! | ATLAS (open-data ntuples) | `mini`, `truth`, `nominal`, `CollectionTree` | pt/eta/phi/E | MeV | 25 / 25 / 25 |
//! | ALICE (ESD/VSD) | `TE`, `VSD`, `ESDTree`, `esdTree`, `aodTree` | pt/eta/phi/mass | GeV | none |
//!
//! Profiles are `'static` and never mutated; lookups by kind walk a fixed,
//! ordered table so the result never depends on hash order.

use std::fmt;
use std::str::FromStr;

mod profiles;
mod resolve;

pub use resolve::{resolve, ResolvedParticle, ResolvedSchema};

/// Supported experiments, in detection priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Experiment {
    /// CMS NanoAOD (`Muon_pt`, `Jet_pt`, `MET_pt`, ...)
    Cms,
    /// ATLAS flat open-data ntuples (`lep_pt`, `jet_pt`, `met_et`, ...)
    Atlas,
    /// ALICE ESD/VSD trees
    Alice,
}

impl Experiment {
    /// All experiments in detection priority order.
    pub const ALL: [Experiment; 3] = [Experiment::Cms, Experiment::Atlas, Experiment::Alice];

    /// The static profile describing this experiment's data layout.
    pub fn profile(&self) -> &'static ExperimentProfile {
        match self {
            Experiment::Cms => &profiles::CMS,
            Experiment::Atlas => &profiles::ATLAS,
            Experiment::Alice => &profiles::ALICE,
        }
    }

    /// Upper-case tag used in output documents.
    pub fn tag(&self) -> &'static str {
        match self {
            Experiment::Cms => "CMS",
            Experiment::Atlas => "ATLAS",
            Experiment::Alice => "ALICE",
        }
    }

    /// Returns all accepted selector names.
    pub fn variants() -> &'static [&'static str] {
        &["auto", "cms", "atlas", "alice"]
    }
}

impl serde::Serialize for Experiment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned when an experiment selector string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown experiment '{0}'. Valid options: auto, cms, atlas, alice")]
pub struct UnknownExperiment(pub String);

impl FromStr for Experiment {
    type Err = UnknownExperiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cms" => Ok(Experiment::Cms),
            "atlas" => Ok(Experiment::Atlas),
            "alice" => Ok(Experiment::Alice),
            _ => Err(UnknownExperiment(s.to_string())),
        }
    }
}

/// Caller choice between auto-detection and a forced experiment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExperimentSelector {
    /// Inspect the file and pick the best-matching profile
    #[default]
    Auto,
    /// Bypass detection and use this profile
    Forced(Experiment),
}

impl FromStr for ExperimentSelector {
    type Err = UnknownExperiment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ExperimentSelector::Auto);
        }
        Experiment::from_str(s).map(ExperimentSelector::Forced)
    }
}

impl fmt::Display for ExperimentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentSelector::Auto => f.write_str("auto"),
            ExperimentSelector::Forced(exp) => write!(f, "{}", exp.tag().to_lowercase()),
        }
    }
}

/// Kind of reconstructed object stored per event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleKind {
    /// Muon
    Muon,
    /// Electron
    Electron,
    /// Small-radius jet
    Jet,
    /// Hadronic tau
    Tau,
    /// Photon
    Photon,
    /// Unified lepton collection (ATLAS), flavour resolved per particle when possible
    Lepton,
    /// Charged track (ALICE)
    Track,
    /// Large-radius jet (ATLAS)
    LargeRJet,
}

impl ParticleKind {
    /// Name used in output documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticleKind::Muon => "muon",
            ParticleKind::Electron => "electron",
            ParticleKind::Jet => "jet",
            ParticleKind::Tau => "tau",
            ParticleKind::Photon => "photon",
            ParticleKind::Lepton => "lepton",
            ParticleKind::Track => "track",
            ParticleKind::LargeRJet => "largeRjet",
        }
    }

    /// Display color for the browser event display.
    pub fn color(&self) -> &'static str {
        match self {
            ParticleKind::Muon => "#ff6b6b",
            ParticleKind::Electron => "#7fbbb3",
            ParticleKind::Jet => "#dbbc7f",
            ParticleKind::Tau => "#d699b6",
            ParticleKind::Photon => "#a7c080",
            ParticleKind::Lepton => "#ff6b6b",
            ParticleKind::Track => "#7fbbb3",
            ParticleKind::LargeRJet => "#e5c07b",
        }
    }

    /// Nominal rest mass in GeV, used when no mass column exists.
    pub fn default_mass(&self) -> f64 {
        match self {
            ParticleKind::Muon => 0.1057,
            ParticleKind::Electron => 0.000511,
            ParticleKind::Tau => 1.777,
            ParticleKind::Track => 0.13957,
            ParticleKind::Jet
            | ParticleKind::Photon
            | ParticleKind::Lepton
            | ParticleKind::LargeRJet => 0.0,
        }
    }

    /// Specific lepton flavour for a PDG id, as stored in ATLAS `lep_type`.
    pub fn from_pdg_id(pdg_id: f64) -> Option<ParticleKind> {
        match pdg_id.abs().round() as i64 {
            11 => Some(ParticleKind::Electron),
            13 => Some(ParticleKind::Muon),
            _ => None,
        }
    }
}

impl serde::Serialize for ParticleKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for ParticleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic per-particle field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Transverse momentum
    Pt,
    /// Pseudorapidity
    Eta,
    /// Azimuthal angle
    Phi,
    /// Rest mass
    Mass,
    /// Energy
    Energy,
    /// Electric charge
    Charge,
    /// b-tagging discriminant
    Btag,
    /// Relative isolation
    Iso,
    /// Tight identification flag
    TightId,
    /// Jet identification bitmask
    JetId,
    /// PDG id of the particle (ATLAS `lep_type`)
    Flavour,
}

impl Field {
    /// Short alias used in logs and schema listings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Pt => "pt",
            Field::Eta => "eta",
            Field::Phi => "phi",
            Field::Mass => "mass",
            Field::Energy => "energy",
            Field::Charge => "charge",
            Field::Btag => "btag",
            Field::Iso => "iso",
            Field::TightId => "tightId",
            Field::JetId => "jetId",
            Field::Flavour => "type",
        }
    }

    /// Whether the field carries a momentum-like quantity that the profile's
    /// unit scale applies to.
    pub fn is_momentum_like(&self) -> bool {
        matches!(self, Field::Pt | Field::Mass | Field::Energy)
    }
}

/// Semantic per-event scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarAlias {
    /// Missing transverse energy magnitude
    MetPt,
    /// Missing transverse energy azimuth
    MetPhi,
    /// Missing transverse energy significance
    MetSignificance,
    /// Trigger decision, with its output name
    Trigger(&'static str),
}

impl ScalarAlias {
    /// Alias name (`met_pt`, `met_phi`, `met_sig`, `trig_*`).
    pub fn name(&self) -> String {
        match self {
            ScalarAlias::MetPt => "met_pt".to_string(),
            ScalarAlias::MetPhi => "met_phi".to_string(),
            ScalarAlias::MetSignificance => "met_sig".to_string(),
            ScalarAlias::Trigger(name) => format!("trig_{name}"),
        }
    }

    /// Whether the unit scale applies to this scalar.
    pub fn is_momentum_like(&self) -> bool {
        matches!(self, ScalarAlias::MetPt)
    }
}

/// How the Cartesian four-vector is derived for an experiment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KinematicMode {
    /// pt/eta/phi/mass given, energy derived
    MassBased,
    /// pt/eta/phi/energy given, mass derived (clamped at zero)
    EnergyBased,
}

/// Minimum values an event must exceed to be kept. Zero disables a cut.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Leading lepton transverse momentum floor (GeV)
    pub lepton_pt: f64,
    /// Missing transverse energy floor (GeV)
    pub met: f64,
    /// Leading jet transverse momentum floor (GeV)
    pub jet_pt: f64,
}

/// Where one particle kind lives in an experiment's tree.
#[derive(Debug)]
pub struct ParticleSpec {
    /// Particle kind
    pub kind: ParticleKind,
    /// Semantic field to candidate raw branch names (first present wins)
    pub fields: &'static [(Field, &'static [&'static str])],
}

impl ParticleSpec {
    /// Candidate raw names for a field, empty if the profile does not map it.
    pub fn candidates(&self, field: Field) -> &'static [&'static str] {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, names)| *names)
            .unwrap_or(&[])
    }
}

/// A raw per-event branch and its semantic alias.
#[derive(Debug)]
pub struct ScalarSpec {
    /// Raw branch name
    pub branch: &'static str,
    /// Semantic alias
    pub alias: ScalarAlias,
}

/// Immutable description of one experiment's data model.
#[derive(Debug)]
pub struct ExperimentProfile {
    /// Experiment this profile describes
    pub experiment: Experiment,
    /// Candidate tree names, first match wins
    pub tree_names: &'static [&'static str],
    /// Branch names that confirm the experiment during detection
    pub detection_branches: &'static [&'static str],
    /// Particle kinds in emission order
    pub particles: &'static [ParticleSpec],
    /// Per-event scalar branches
    pub scalars: &'static [ScalarSpec],
    /// Kinds whose leading pt feeds the leading-lepton quantity
    pub lepton_kinds: &'static [ParticleKind],
    /// Kind whose pt feeds HT and the jet criterion
    pub jet_kind: Option<ParticleKind>,
    /// Whether b-tagged jets are counted per event
    pub counts_bjets: bool,
    /// Four-vector derivation mode
    pub kinematics: KinematicMode,
    /// Multiplier converting stored momenta to GeV
    pub momentum_scale: f64,
    /// Event selection floors
    pub thresholds: Thresholds,
}

impl ExperimentProfile {
    /// Look up the spec for a particle kind.
    pub fn particle(&self, kind: ParticleKind) -> Option<&'static ParticleSpec> {
        self.particles.iter().find(|p| p.kind == kind)
    }

    /// Whether `name` is one of this profile's candidate tree names.
    pub fn has_tree_name(&self, name: &str) -> bool {
        self.tree_names.contains(&name)
    }
}

/// b-tag discriminant above which a jet counts as a b-jet.
pub const BTAG_THRESHOLD: f64 = 0.5;

/// Generic tree names tried after the profile's own candidates.
pub const GENERIC_TREE_NAMES: &[&str] = &["tree", "Tree", "ntuple"];
