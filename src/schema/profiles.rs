//! Branch maps for the supported experiments.

use super::{
    Experiment, ExperimentProfile, Field, KinematicMode, ParticleKind, ParticleSpec, ScalarAlias,
    ScalarSpec, Thresholds,
};

pub(super) static CMS: ExperimentProfile = ExperimentProfile {
    experiment: Experiment::Cms,
    tree_names: &["Events", "events"],
    detection_branches: &["Muon_pt", "Jet_pt", "MET_pt", "Electron_pt"],
    particles: &[
        ParticleSpec {
            kind: ParticleKind::Muon,
            fields: &[
                (Field::Pt, &["Muon_pt"]),
                (Field::Eta, &["Muon_eta"]),
                (Field::Phi, &["Muon_phi"]),
                (Field::Mass, &["Muon_mass"]),
                (Field::Charge, &["Muon_charge"]),
                (Field::Iso, &["Muon_pfRelIso03_all"]),
                (Field::TightId, &["Muon_tightId"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Electron,
            fields: &[
                (Field::Pt, &["Electron_pt"]),
                (Field::Eta, &["Electron_eta"]),
                (Field::Phi, &["Electron_phi"]),
                (Field::Mass, &["Electron_mass"]),
                (Field::Charge, &["Electron_charge"]),
                (Field::Iso, &["Electron_pfRelIso03_all"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Jet,
            fields: &[
                (Field::Pt, &["Jet_pt"]),
                (Field::Eta, &["Jet_eta"]),
                (Field::Phi, &["Jet_phi"]),
                (Field::Mass, &["Jet_mass"]),
                (Field::Btag, &["Jet_btag", "Jet_btagDeepB"]),
                (Field::JetId, &["Jet_jetId"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Tau,
            fields: &[
                (Field::Pt, &["Tau_pt"]),
                (Field::Eta, &["Tau_eta"]),
                (Field::Phi, &["Tau_phi"]),
                (Field::Mass, &["Tau_mass"]),
                (Field::Charge, &["Tau_charge"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Photon,
            fields: &[
                (Field::Pt, &["Photon_pt"]),
                (Field::Eta, &["Photon_eta"]),
                (Field::Phi, &["Photon_phi"]),
                (Field::Mass, &["Photon_mass"]),
            ],
        },
    ],
    scalars: &[
        ScalarSpec { branch: "MET_pt", alias: ScalarAlias::MetPt },
        ScalarSpec { branch: "MET_phi", alias: ScalarAlias::MetPhi },
        ScalarSpec { branch: "MET_significance", alias: ScalarAlias::MetSignificance },
        ScalarSpec { branch: "HLT_IsoMu24", alias: ScalarAlias::Trigger("IsoMu24") },
        ScalarSpec { branch: "HLT_Ele27_WPTight_Gsf", alias: ScalarAlias::Trigger("Ele27") },
    ],
    lepton_kinds: &[ParticleKind::Muon, ParticleKind::Electron],
    jet_kind: Some(ParticleKind::Jet),
    counts_bjets: true,
    kinematics: KinematicMode::MassBased,
    momentum_scale: 1.0,
    thresholds: Thresholds { lepton_pt: 20.0, met: 20.0, jet_pt: 30.0 },
};

// Open-data ntuples store momenta and energies in MeV.
pub(super) static ATLAS: ExperimentProfile = ExperimentProfile {
    experiment: Experiment::Atlas,
    tree_names: &["mini", "truth", "nominal", "CollectionTree"],
    detection_branches: &["lep_pt", "lep_eta", "jet_pt", "met_et"],
    particles: &[
        ParticleSpec {
            kind: ParticleKind::Lepton,
            fields: &[
                (Field::Pt, &["lep_pt"]),
                (Field::Eta, &["lep_eta"]),
                (Field::Phi, &["lep_phi"]),
                (Field::Energy, &["lep_E", "lep_e"]),
                (Field::Charge, &["lep_charge"]),
                (Field::Flavour, &["lep_type"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Jet,
            fields: &[
                (Field::Pt, &["jet_pt"]),
                (Field::Eta, &["jet_eta"]),
                (Field::Phi, &["jet_phi"]),
                (Field::Energy, &["jet_E", "jet_e"]),
                (Field::Btag, &["jet_MV2c10"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Photon,
            fields: &[
                (Field::Pt, &["photon_pt"]),
                (Field::Eta, &["photon_eta"]),
                (Field::Phi, &["photon_phi"]),
                (Field::Energy, &["photon_E", "photon_e"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::Tau,
            fields: &[
                (Field::Pt, &["tau_pt"]),
                (Field::Eta, &["tau_eta"]),
                (Field::Phi, &["tau_phi"]),
                (Field::Energy, &["tau_E", "tau_e"]),
                (Field::Charge, &["tau_charge"]),
            ],
        },
        ParticleSpec {
            kind: ParticleKind::LargeRJet,
            fields: &[
                (Field::Pt, &["largeRjet_pt"]),
                (Field::Eta, &["largeRjet_eta"]),
                (Field::Phi, &["largeRjet_phi"]),
                (Field::Energy, &["largeRjet_E", "largeRjet_e"]),
            ],
        },
    ],
    scalars: &[
        ScalarSpec { branch: "met_et", alias: ScalarAlias::MetPt },
        ScalarSpec { branch: "met_phi", alias: ScalarAlias::MetPhi },
        ScalarSpec { branch: "trigE", alias: ScalarAlias::Trigger("E") },
        ScalarSpec { branch: "trigM", alias: ScalarAlias::Trigger("M") },
    ],
    lepton_kinds: &[ParticleKind::Lepton],
    jet_kind: Some(ParticleKind::Jet),
    counts_bjets: false,
    kinematics: KinematicMode::EnergyBased,
    momentum_scale: 0.001,
    thresholds: Thresholds { lepton_pt: 25.0, met: 25.0, jet_pt: 25.0 },
};

// No physics cuts: every event in the tree is kept.
pub(super) static ALICE: ExperimentProfile = ExperimentProfile {
    experiment: Experiment::Alice,
    tree_names: &["TE", "VSD", "ESDTree", "esdTree", "aodTree"],
    detection_branches: &["AliESDRun.", "AliESDHeader.", "Tracks.", "track_pt"],
    particles: &[ParticleSpec {
        kind: ParticleKind::Track,
        fields: &[
            (Field::Pt, &["track_pt", "Track_pt"]),
            (Field::Eta, &["track_eta", "Track_eta"]),
            (Field::Phi, &["track_phi", "Track_phi"]),
            (Field::Charge, &["track_charge", "Track_charge"]),
        ],
    }],
    scalars: &[],
    lepton_kinds: &[],
    jet_kind: None,
    counts_bjets: false,
    kinematics: KinematicMode::MassBased,
    momentum_scale: 1.0,
    thresholds: Thresholds { lepton_pt: 0.0, met: 0.0, jet_pt: 0.0 },
};
