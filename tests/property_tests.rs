//! Property-based tests for ranking, four-vectors and chunk invariance

use proptest::prelude::*;
use rootsift::event::{EventRecord, MetVector};
use rootsift::physics::FourVector;
use rootsift::processor::{EventProcessor, ProcessorConfig};
use rootsift::ranking::{rank, EventAccumulator, ScanMode};
use rootsift::reader::{MemoryFile, MemoryTree};
use rootsift::schema::Experiment;

fn event(index: u64, ht: f64) -> EventRecord {
    EventRecord {
        index,
        experiment: Experiment::Cms,
        ht,
        met: 0.0,
        n_bjets: None,
        leading_lepton_pt: 0.0,
        particles: Vec::new(),
        met_vector: MetVector { pt: 0.0, phi: 0.0 },
        triggers: None,
    }
}

fn events(hts: &[f64]) -> Vec<EventRecord> {
    hts.iter()
        .enumerate()
        .map(|(i, ht)| event(i as u64, *ht))
        .collect()
}

/// CMS tree where every event has one muon, enough MET and jets whose pT
/// comes from `jets`.
fn cms_file(jets: &[f64]) -> MemoryFile {
    let n = jets.len();
    MemoryFile::new().with_tree(
        MemoryTree::new("Events")
            .with_lists("Muon_pt", vec![vec![30.0]; n])
            .with_lists("Muon_eta", vec![vec![0.2]; n])
            .with_lists("Muon_phi", vec![vec![0.4]; n])
            .with_lists("Jet_pt", jets.iter().map(|pt| vec![*pt]).collect())
            .with_lists("Jet_eta", vec![vec![1.0]; n])
            .with_lists("Jet_phi", vec![vec![-0.4]; n])
            .with_scalar("MET_pt", vec![40.0; n]),
    )
}

proptest! {
    /// Ranked output is sorted by HT and never longer than the cap
    #[test]
    fn test_rank_sorted_and_capped(
        hts in prop::collection::vec(0.0f64..5000.0, 0..200),
        cap in 1usize..50,
    ) {
        let ranked = rank(events(&hts), cap);

        prop_assert_eq!(ranked.len(), hts.len().min(cap));
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].ht >= pair[1].ht);
        }
    }

    /// Nothing dropped by the cap outranks anything kept
    #[test]
    fn test_rank_is_top_k(
        hts in prop::collection::vec(0.0f64..5000.0, 1..200),
        cap in 1usize..50,
    ) {
        let ranked = rank(events(&hts), cap);
        let kept: Vec<u64> = ranked.iter().map(|e| e.index).collect();
        let lowest_kept = ranked.iter().map(|e| e.ht).fold(f64::INFINITY, f64::min);

        for (i, ht) in hts.iter().enumerate() {
            if !kept.contains(&(i as u64)) {
                prop_assert!(*ht <= lowest_kept);
            }
        }
    }

    /// Exact accumulation over any chunking equals ranking everything at once
    #[test]
    fn test_exact_accumulator_matches_global_rank(
        hts in prop::collection::vec(0.0f64..5000.0, 0..300),
        cap in 1usize..40,
        chunk in 1usize..64,
    ) {
        let all = events(&hts);
        let mut accumulator = EventAccumulator::new(cap, ScanMode::Exact);
        for part in all.chunks(chunk) {
            accumulator.extend(part.to_vec());
        }

        let expected: Vec<u64> = rank(all, cap).iter().map(|e| e.index).collect();
        let actual: Vec<u64> = accumulator.finish().iter().map(|e| e.index).collect();
        prop_assert_eq!(actual, expected);
    }

    /// A mass-built four-vector gives back its mass and transverse momentum
    #[test]
    fn test_four_vector_mass_round_trip(
        pt in 0.1f64..500.0,
        eta in -3.0f64..3.0,
        phi in -std::f64::consts::PI..std::f64::consts::PI,
        mass in 0.0f64..100.0,
    ) {
        let vector = FourVector::from_pt_eta_phi_mass(pt, eta, phi, mass);
        let tolerance = 1e-6 * (1.0 + vector.energy);

        prop_assert!((vector.mass() - mass).abs() < tolerance);
        prop_assert!((vector.pt() - pt).abs() < 1e-9 * (1.0 + pt));
        prop_assert!(vector.energy >= vector.p());
    }

    /// Measured energies below the momentum never produce a negative or NaN mass
    #[test]
    fn test_energy_based_mass_non_negative(
        pt in 0.0f64..500.0,
        eta in -3.0f64..3.0,
        phi in -std::f64::consts::PI..std::f64::consts::PI,
        energy in 0.0f64..5000.0,
    ) {
        let vector = FourVector::from_pt_eta_phi_energy(pt, eta, phi, energy);
        let mass = vector.mass();
        prop_assert!(mass >= 0.0);
        prop_assert!(!mass.is_nan());
    }

    /// In exact mode the chunk size never changes which events come out
    #[test]
    fn test_chunk_size_invariance(
        jets in prop::collection::vec(0.0f64..200.0, 1..120),
        chunk_size in 1usize..50,
        max_events in 1usize..20,
    ) {
        let reference = EventProcessor::with_config(
            ProcessorConfig::exact().with_max_events(max_events),
        )
        .process_source(&mut cms_file(&jets), "reference")
        .unwrap();

        let chunked = EventProcessor::with_config(
            ProcessorConfig::exact()
                .with_max_events(max_events)
                .with_chunk_size(chunk_size),
        )
        .process_source(&mut cms_file(&jets), "chunked")
        .unwrap();

        let expected: Vec<u64> = reference.events.iter().map(|e| e.index).collect();
        let actual: Vec<u64> = chunked.events.iter().map(|e| e.index).collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(chunked.summary.total_scanned, jets.len() as u64);
    }
}
