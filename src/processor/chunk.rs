//! Per-chunk derivation, selection and record building.

use std::collections::BTreeMap;

use log::debug;

use crate::event::{EventRecord, MetVector, Particle};
use crate::physics::{self, ParticleArrays};
use crate::reader::{Column, Jagged, RawChunk};
use crate::schema::{
    ExperimentProfile, Field, ParticleKind, ResolvedParticle, ResolvedSchema, ScalarAlias,
    BTAG_THRESHOLD,
};

use super::selection::{selection_mask, Criterion};

/// Event-level quantities for every event of a chunk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DerivedColumns {
    /// Scalar sum of jet pt (0 without jets)
    pub ht: Vec<f64>,
    /// Highest pt across lepton kinds (0 without leptons)
    pub leading_lepton_pt: Vec<f64>,
    /// Highest jet pt, `None` when no jet kind resolved
    pub max_jet_pt: Option<Vec<f64>>,
    /// Whether any lepton kind resolved
    pub has_leptons: bool,
    /// Missing energy magnitude, `None` when absent
    pub met: Option<Vec<f64>>,
    /// Missing energy azimuth (0 when absent)
    pub met_phi: Vec<f64>,
    /// b-jet counts for profiles that count them
    pub n_bjets: Option<Vec<u32>>,
}

/// Turns raw chunks into event records for one resolved schema.
#[derive(Debug, Clone, Copy)]
pub struct ChunkProcessor<'s> {
    schema: &'s ResolvedSchema,
    profile: &'static ExperimentProfile,
}

impl<'s> ChunkProcessor<'s> {
    /// Create a processor bound to a schema.
    pub fn new(schema: &'s ResolvedSchema) -> Self {
        Self {
            schema,
            profile: schema.profile(),
        }
    }

    /// Convert stored units to GeV in place.
    pub fn prepare(&self, chunk: &mut RawChunk) {
        let scale = self.profile.momentum_scale;
        if scale == 1.0 {
            return;
        }
        for particle in &self.schema.particles {
            for (field, branch) in &particle.columns {
                if field.is_momentum_like() {
                    if let Some(column) = chunk.column_mut(branch) {
                        column.scale(scale);
                    }
                }
            }
        }
        for (alias, branch) in &self.schema.scalars {
            if alias.is_momentum_like() {
                if let Some(column) = chunk.column_mut(branch) {
                    column.scale(scale);
                }
            }
        }
    }

    fn pt_column<'c>(&self, chunk: &'c RawChunk, kind: ParticleKind) -> Option<&'c Jagged> {
        let branch = self.schema.particle(kind)?.column(Field::Pt)?;
        chunk.per_particle(branch)
    }

    fn scalar_column<'c>(&self, chunk: &'c RawChunk, alias: ScalarAlias) -> Option<&'c [f64]> {
        chunk.per_event(self.schema.scalar(alias)?)
    }

    /// Vectorized event-level quantities.
    pub fn derive(&self, chunk: &RawChunk) -> DerivedColumns {
        let len = chunk.len;
        let jets = self
            .profile
            .jet_kind
            .and_then(|kind| self.pt_column(chunk, kind));

        let ht = jets.map_or_else(|| vec![0.0_f64; len], Jagged::sum_per_event);
        let max_jet_pt = jets.map(Jagged::max_per_event);

        let mut leading_lepton_pt = vec![0.0_f64; len];
        let mut has_leptons = false;
        for kind in self.profile.lepton_kinds {
            if let Some(pt) = self.pt_column(chunk, *kind) {
                has_leptons = true;
                for (lead, max) in leading_lepton_pt.iter_mut().zip(pt.max_per_event()) {
                    *lead = lead.max(max);
                }
            }
        }

        let met = self
            .scalar_column(chunk, ScalarAlias::MetPt)
            .map(<[f64]>::to_vec);
        let met_phi = self
            .scalar_column(chunk, ScalarAlias::MetPhi)
            .map_or_else(|| vec![0.0; len], <[f64]>::to_vec);

        let n_bjets = self.profile.counts_bjets.then(|| {
            self.profile
                .jet_kind
                .and_then(|kind| self.schema.particle(kind))
                .and_then(|jet| jet.column(Field::Btag))
                .and_then(|branch| chunk.per_particle(branch))
                .map_or_else(|| vec![0; len], |btag| btag.count_above(BTAG_THRESHOLD))
        });

        DerivedColumns {
            ht,
            leading_lepton_pt,
            max_jet_pt,
            has_leptons,
            met,
            met_phi,
            n_bjets,
        }
    }

    /// Which events pass the profile's floors.
    pub fn selection_mask(&self, derived: &DerivedColumns, len: usize) -> Vec<bool> {
        let thresholds = self.profile.thresholds;
        let criteria = [
            Criterion::new(
                thresholds.lepton_pt,
                derived
                    .has_leptons
                    .then(|| derived.leading_lepton_pt.clone()),
            ),
            Criterion::new(thresholds.met, derived.met.clone()),
            Criterion::new(thresholds.jet_pt, derived.max_jet_pt.clone()),
        ];
        selection_mask(len, &criteria)
    }

    /// Build records for the passing events of a chunk whose first event sits
    /// at `offset` in the file.
    pub fn process(&self, chunk: &RawChunk, offset: u64) -> Vec<EventRecord> {
        let derived = self.derive(chunk);
        let mask = self.selection_mask(&derived, chunk.len);
        let triggers = self.trigger_columns(chunk);

        mask.iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| {
                let index = offset + i as u64;
                let met = derived.met.as_ref().map_or(0.0, |m| m[i]);
                EventRecord {
                    index,
                    experiment: self.profile.experiment,
                    ht: derived.ht[i],
                    met,
                    n_bjets: derived.n_bjets.as_ref().map(|n| n[i]),
                    leading_lepton_pt: derived.leading_lepton_pt[i],
                    particles: self.particles(chunk, i, index),
                    met_vector: MetVector {
                        pt: met,
                        phi: derived.met_phi[i],
                    },
                    triggers: (!triggers.is_empty()).then(|| {
                        triggers
                            .iter()
                            .map(|(name, values)| (name.clone(), values[i] != 0.0))
                            .collect::<BTreeMap<_, _>>()
                    }),
                }
            })
            .collect()
    }

    fn trigger_columns<'c>(&self, chunk: &'c RawChunk) -> Vec<(String, &'c [f64])> {
        self.schema
            .scalars
            .iter()
            .filter_map(|(alias, branch)| match alias {
                ScalarAlias::Trigger(name) => chunk
                    .per_event(branch)
                    .map(|values| ((*name).to_string(), values)),
                _ => None,
            })
            .collect()
    }

    fn particles(&self, chunk: &RawChunk, event: usize, index: u64) -> Vec<Particle> {
        let mut out = Vec::new();
        for resolved in &self.schema.particles {
            match self.particles_of_kind(chunk, resolved, event) {
                Ok(particles) => out.extend(particles),
                Err(reason) => {
                    debug!("Skipping {} in event {}: {}", resolved.kind, index, reason);
                }
            }
        }
        out
    }

    fn particles_of_kind(
        &self,
        chunk: &RawChunk,
        resolved: &ResolvedParticle,
        event: usize,
    ) -> Result<Vec<Particle>, String> {
        let values = |field: Field| event_values(chunk, resolved, field, event);

        let pt = values(Field::Pt)?.unwrap_or(&[]);
        let arrays = ParticleArrays {
            pt,
            eta: values(Field::Eta)?,
            phi: values(Field::Phi)?,
            mass: values(Field::Mass)?,
            energy: values(Field::Energy)?,
        };
        let kinematics = physics::derive(&arrays, self.profile.kinematics, resolved.kind.default_mass())
            .map_err(|err| err.to_string())?;

        let charge = values(Field::Charge).ok().flatten();
        let flavour = values(Field::Flavour).ok().flatten();

        Ok(kinematics
            .iter()
            .enumerate()
            .map(|(j, kin)| {
                let kind = flavour
                    .and_then(|f| f.get(j))
                    .and_then(|pdg| ParticleKind::from_pdg_id(*pdg))
                    .unwrap_or(resolved.kind);
                Particle::new(kind, kin, charge.and_then(|c| c.get(j)).copied())
            })
            .collect())
    }
}

fn event_values<'c>(
    chunk: &'c RawChunk,
    resolved: &ResolvedParticle,
    field: Field,
    event: usize,
) -> Result<Option<&'c [f64]>, String> {
    let Some(branch) = resolved.column(field) else {
        return Ok(None);
    };
    match chunk.column(branch) {
        Some(Column::PerParticle(jagged)) => jagged
            .event(event)
            .map(Some)
            .ok_or_else(|| format!("'{branch}' has no event {event}")),
        Some(Column::PerEvent(_)) => Err(format!("'{branch}' is not per-particle")),
        None => Err(format!("'{branch}' was not read")),
    }
}
