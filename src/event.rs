//! Event and particle records emitted by the processor.
//!
//! Values are kept at full precision; rounding is applied only when
//! serializing (2 decimals for event-level momenta, 3 for angles, momenta
//! and energies, 4 for masses).

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::physics::Kinematics;
use crate::schema::{Experiment, ParticleKind};

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub(crate) fn round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 2))
}

pub(crate) fn round3<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 3))
}

pub(crate) fn round4<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round_to(*value, 4))
}

/// One reconstructed object with its four-vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Particle {
    /// Kind tag
    #[serde(rename = "type")]
    pub kind: ParticleKind,
    /// Display color
    pub color: &'static str,
    /// Transverse momentum (GeV)
    #[serde(serialize_with = "round3")]
    pub pt: f64,
    /// Pseudorapidity
    #[serde(serialize_with = "round3")]
    pub eta: f64,
    /// Azimuth
    #[serde(serialize_with = "round3")]
    pub phi: f64,
    /// Rest mass (GeV)
    #[serde(serialize_with = "round4")]
    pub mass: f64,
    /// x momentum
    #[serde(serialize_with = "round3")]
    pub px: f64,
    /// y momentum
    #[serde(serialize_with = "round3")]
    pub py: f64,
    /// z momentum
    #[serde(serialize_with = "round3")]
    pub pz: f64,
    /// Energy
    #[serde(serialize_with = "round3")]
    pub energy: f64,
    /// Electric charge, when the tree records it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charge: Option<i32>,
}

impl Particle {
    /// Build from derived kinematics.
    pub fn new(kind: ParticleKind, kinematics: &Kinematics, charge: Option<f64>) -> Self {
        Self {
            kind,
            color: kind.color(),
            pt: kinematics.pt,
            eta: kinematics.eta,
            phi: kinematics.phi,
            mass: kinematics.mass,
            px: kinematics.p4.px,
            py: kinematics.p4.py,
            pz: kinematics.p4.pz,
            energy: kinematics.p4.energy,
            charge: charge.map(|q| q.round() as i32),
        }
    }
}

/// Missing transverse energy as a 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetVector {
    /// Magnitude (GeV)
    #[serde(serialize_with = "round2")]
    pub pt: f64,
    /// Azimuth
    #[serde(serialize_with = "round3")]
    pub phi: f64,
}

/// One selected collision event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    /// Zero-based position in the source tree
    pub index: u64,
    /// Experiment tag
    pub experiment: Experiment,
    /// Scalar sum of jet pt
    #[serde(serialize_with = "round2")]
    pub ht: f64,
    /// Missing transverse energy magnitude
    #[serde(serialize_with = "round2")]
    pub met: f64,
    /// Jets with b-tag above threshold, for profiles that count them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_bjets: Option<u32>,
    /// Highest lepton pt across lepton kinds, 0 without leptons
    #[serde(serialize_with = "round2")]
    pub leading_lepton_pt: f64,
    /// Particles grouped by kind in profile order
    pub particles: Vec<Particle>,
    /// Missing transverse energy vector
    pub met_vector: MetVector,
    /// Trigger decisions by name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<BTreeMap<String, bool>>,
}

impl EventRecord {
    /// Number of particles in the event.
    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }
}
