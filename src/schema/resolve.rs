use std::collections::{BTreeMap, HashSet};

use crate::reader::{ColumnShape, ColumnSpec, EventTree};

use super::{Experiment, ExperimentProfile, Field, ParticleKind, ScalarAlias};

/// One particle kind whose minimum set of columns exists in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParticle {
    /// Particle kind
    pub kind: ParticleKind,
    /// Semantic field to the raw branch that provides it
    pub columns: BTreeMap<Field, String>,
}

impl ResolvedParticle {
    /// Raw branch for a field, if present.
    pub fn column(&self, field: Field) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Whether a field resolved.
    pub fn has(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    /// Without a direction (eta) or energy the kind is kinematically useless.
    fn is_usable(&self) -> bool {
        self.has(Field::Pt) && (self.has(Field::Eta) || self.has(Field::Energy))
    }
}

/// Per-file presence map: which profile columns actually exist.
///
/// Built once after detection and reused for every chunk of the file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    /// Experiment whose profile was resolved
    pub experiment: Experiment,
    /// Tree the columns were resolved against
    pub tree_name: String,
    /// Usable particle kinds, in profile order
    pub particles: Vec<ResolvedParticle>,
    /// Present scalars with their raw branch names, in profile order
    pub scalars: Vec<(ScalarAlias, String)>,
}

impl ResolvedSchema {
    /// Resolve the profile against an open tree's branch list.
    pub fn for_tree<T: EventTree>(profile: &'static ExperimentProfile, tree: &T) -> Self {
        resolve(profile, tree.name(), &tree.branch_names())
    }

    /// Profile this schema was resolved from.
    pub fn profile(&self) -> &'static ExperimentProfile {
        self.experiment.profile()
    }

    /// No particle kind and no scalar resolved.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty() && self.scalars.is_empty()
    }

    /// Resolved entry for a kind.
    pub fn particle(&self, kind: ParticleKind) -> Option<&ResolvedParticle> {
        self.particles.iter().find(|p| p.kind == kind)
    }

    /// Raw branch for a scalar alias.
    pub fn scalar(&self, alias: ScalarAlias) -> Option<&str> {
        self.scalars
            .iter()
            .find(|(a, _)| *a == alias)
            .map(|(_, branch)| branch.as_str())
    }

    /// Resolved particle kinds in profile order.
    pub fn kinds(&self) -> Vec<ParticleKind> {
        self.particles.iter().map(|p| p.kind).collect()
    }

    /// Every column to read, each raw branch once, particles before scalars.
    pub fn columns(&self) -> Vec<ColumnSpec> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for particle in &self.particles {
            for branch in particle.columns.values() {
                if seen.insert(branch.as_str()) {
                    out.push(ColumnSpec::new(branch.clone(), ColumnShape::PerParticle));
                }
            }
        }
        for (_, branch) in &self.scalars {
            if seen.insert(branch.as_str()) {
                out.push(ColumnSpec::new(branch.clone(), ColumnShape::PerEvent));
            }
        }
        out
    }

    /// Forget a raw branch that turned out to be unreadable.
    ///
    /// Particle kinds that drop below the minimum field set go with it.
    pub fn drop_branch(&mut self, branch: &str) {
        for particle in &mut self.particles {
            particle.columns.retain(|_, b| b != branch);
        }
        self.particles.retain(ResolvedParticle::is_usable);
        self.scalars.retain(|(_, b)| b != branch);
    }
}

/// Intersect a profile with the branch names of a tree.
///
/// Total and deterministic: an empty result is valid and simply yields no
/// events downstream.
pub fn resolve<S: AsRef<str>>(
    profile: &'static ExperimentProfile,
    tree_name: &str,
    branch_names: &[S],
) -> ResolvedSchema {
    let present: HashSet<&str> = branch_names.iter().map(AsRef::as_ref).collect();

    let particles = profile
        .particles
        .iter()
        .filter_map(|spec| {
            let columns: BTreeMap<Field, String> = spec
                .fields
                .iter()
                .filter_map(|(field, candidates)| {
                    candidates
                        .iter()
                        .find(|name| present.contains(**name))
                        .map(|name| (*field, (*name).to_string()))
                })
                .collect();
            let resolved = ResolvedParticle {
                kind: spec.kind,
                columns,
            };
            resolved.is_usable().then_some(resolved)
        })
        .collect();

    let scalars = profile
        .scalars
        .iter()
        .filter(|spec| present.contains(spec.branch))
        .map(|spec| (spec.alias, spec.branch.to_string()))
        .collect();

    ResolvedSchema {
        experiment: profile.experiment,
        tree_name: tree_name.to_string(),
        particles,
        scalars,
    }
}
