//! # Kinematics
//!
//! Lorentz four-vectors from collider coordinates.
//!
//! Given transverse momentum `pt`, pseudorapidity `eta` and azimuth `phi`:
//!
//! ```text
//! px = pt cos(phi)    py = pt sin(phi)    pz = pt sinh(eta)    |p| = pt cosh(eta)
//! ```
//!
//! The energy is either derived from a known mass (`E = sqrt(|p|² + m²)`) or
//! taken as measured, in which case the mass is derived as
//! `sqrt(max(E² - |p|², 0))` so detector resolution never yields a negative
//! mass. No rounding happens here.

use std::ops::Add;

use crate::schema::KinematicMode;

/// Errors from vectorized derivations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// A per-particle array disagrees with the pt array in length
    #[error("Ragged mismatch: '{field}' has {got} values, expected {expected}")]
    RaggedMismatch {
        /// Field whose length differs
        field: &'static str,
        /// Length of the pt array
        expected: usize,
        /// Length found
        got: usize,
    },
}

/// Cartesian momentum and energy.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FourVector {
    /// x momentum
    pub px: f64,
    /// y momentum
    pub py: f64,
    /// z momentum
    pub pz: f64,
    /// Energy
    pub energy: f64,
}

impl FourVector {
    /// From pt/eta/phi and a rest mass.
    pub fn from_pt_eta_phi_mass(pt: f64, eta: f64, phi: f64, mass: f64) -> Self {
        let (px, py, pz) = momentum(pt, eta, phi);
        let p2 = px * px + py * py + pz * pz;
        Self {
            px,
            py,
            pz,
            energy: (p2 + mass * mass).sqrt(),
        }
    }

    /// From pt/eta/phi and a measured energy.
    pub fn from_pt_eta_phi_energy(pt: f64, eta: f64, phi: f64, energy: f64) -> Self {
        let (px, py, pz) = momentum(pt, eta, phi);
        Self { px, py, pz, energy }
    }

    /// Momentum magnitude.
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Transverse momentum.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Invariant mass squared; may be slightly negative for measured energies.
    pub fn mass_squared(&self) -> f64 {
        self.energy * self.energy - (self.px * self.px + self.py * self.py + self.pz * self.pz)
    }

    /// Invariant mass, clamped at zero.
    pub fn mass(&self) -> f64 {
        self.mass_squared().max(0.0).sqrt()
    }
}

impl Add for FourVector {
    type Output = FourVector;

    fn add(self, rhs: FourVector) -> FourVector {
        FourVector {
            px: self.px + rhs.px,
            py: self.py + rhs.py,
            pz: self.pz + rhs.pz,
            energy: self.energy + rhs.energy,
        }
    }
}

fn momentum(pt: f64, eta: f64, phi: f64) -> (f64, f64, f64) {
    (pt * phi.cos(), pt * phi.sin(), pt * eta.sinh())
}

/// Full kinematic description of one particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// Transverse momentum
    pub pt: f64,
    /// Pseudorapidity
    pub eta: f64,
    /// Azimuth
    pub phi: f64,
    /// Rest mass, never negative
    pub mass: f64,
    /// Cartesian four-momentum
    pub p4: FourVector,
}

/// The per-particle arrays of one particle kind within one event.
///
/// Absent arrays fall back to 0 for angles, the kind's default mass, or the
/// massless energy `pt cosh(eta)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleArrays<'a> {
    /// Transverse momenta; fixes the particle count
    pub pt: &'a [f64],
    /// Pseudorapidities
    pub eta: Option<&'a [f64]>,
    /// Azimuths
    pub phi: Option<&'a [f64]>,
    /// Masses
    pub mass: Option<&'a [f64]>,
    /// Energies
    pub energy: Option<&'a [f64]>,
}

impl ParticleArrays<'_> {
    fn check(&self) -> Result<(), PhysicsError> {
        let expected = self.pt.len();
        for (field, values) in [
            ("eta", self.eta),
            ("phi", self.phi),
            ("mass", self.mass),
            ("energy", self.energy),
        ] {
            if let Some(values) = values {
                if values.len() != expected {
                    return Err(PhysicsError::RaggedMismatch {
                        field,
                        expected,
                        got: values.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Derive every particle of one kind in one event.
pub fn derive(
    arrays: &ParticleArrays<'_>,
    mode: KinematicMode,
    default_mass: f64,
) -> Result<Vec<Kinematics>, PhysicsError> {
    arrays.check()?;
    let at = |values: Option<&[f64]>, i: usize, fallback: f64| {
        values.map_or(fallback, |v| v[i])
    };

    Ok(arrays
        .pt
        .iter()
        .enumerate()
        .map(|(i, &pt)| {
            let eta = at(arrays.eta, i, 0.0);
            let phi = at(arrays.phi, i, 0.0);
            match mode {
                KinematicMode::MassBased => {
                    let mass = at(arrays.mass, i, default_mass).max(0.0);
                    Kinematics {
                        pt,
                        eta,
                        phi,
                        mass,
                        p4: FourVector::from_pt_eta_phi_mass(pt, eta, phi, mass),
                    }
                }
                KinematicMode::EnergyBased => {
                    let energy = at(arrays.energy, i, pt * eta.cosh());
                    let p4 = FourVector::from_pt_eta_phi_energy(pt, eta, phi, energy);
                    Kinematics {
                        pt,
                        eta,
                        phi,
                        mass: p4.mass(),
                        p4,
                    }
                }
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_mass_based_roundtrip() {
        let p4 = FourVector::from_pt_eta_phi_mass(45.0, 1.2, -2.1, 0.1057);
        assert!((p4.mass() - 0.1057).abs() < 1e-6);
        assert!((p4.pt() - 45.0).abs() < EPS);
        assert!((p4.p() - 45.0 * 1.2_f64.cosh()).abs() < 1e-9);
    }

    #[test]
    fn test_energy_based_clamps_mass() {
        // energy below |p|: mass would be imaginary
        let p4 = FourVector::from_pt_eta_phi_energy(50.0, 0.0, 0.0, 49.0);
        assert!(p4.mass_squared() < 0.0);
        assert_eq!(p4.mass(), 0.0);
        assert_eq!(p4.energy, 49.0);
    }

    #[test]
    fn test_zero_angles() {
        let p4 = FourVector::from_pt_eta_phi_mass(10.0, 0.0, 0.0, 0.0);
        assert!((p4.px - 10.0).abs() < EPS);
        assert!(p4.py.abs() < EPS);
        assert!(p4.pz.abs() < EPS);
        assert!((p4.energy - 10.0).abs() < EPS);
    }

    #[test]
    fn test_sum_of_back_to_back() {
        let a = FourVector::from_pt_eta_phi_mass(40.0, 0.0, 0.0, 0.0);
        let b = FourVector::from_pt_eta_phi_mass(40.0, 0.0, std::f64::consts::PI, 0.0);
        let z = a + b;
        assert!((z.mass() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_defaults() {
        let pt = [30.0, 20.0];
        let eta = [0.5, -0.5];
        let arrays = ParticleArrays {
            pt: &pt,
            eta: Some(&eta),
            ..Default::default()
        };
        let muons = derive(&arrays, KinematicMode::MassBased, 0.1057).unwrap();
        assert_eq!(muons.len(), 2);
        assert_eq!(muons[0].mass, 0.1057);
        assert_eq!(muons[1].phi, 0.0);

        let leptons = derive(&arrays, KinematicMode::EnergyBased, 0.0).unwrap();
        assert!((leptons[0].p4.energy - 30.0 * 0.5_f64.cosh()).abs() < EPS);
        assert!(leptons[0].mass < 1e-6);
    }

    #[test]
    fn test_derive_ragged_mismatch() {
        let pt = [30.0, 20.0];
        let phi = [0.1];
        let arrays = ParticleArrays {
            pt: &pt,
            phi: Some(&phi),
            ..Default::default()
        };
        let err = derive(&arrays, KinematicMode::MassBased, 0.0).unwrap_err();
        assert_eq!(
            err,
            PhysicsError::RaggedMismatch {
                field: "phi",
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn test_derive_empty_event() {
        let arrays = ParticleArrays::default();
        assert!(derive(&arrays, KinematicMode::EnergyBased, 0.0)
            .unwrap()
            .is_empty());
    }
}
