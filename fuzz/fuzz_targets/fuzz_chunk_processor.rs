#![no_main]

use libfuzzer_sys::fuzz_target;
use rootsift::processor::{EventProcessor, ProcessorConfig};
use rootsift::reader::{MemoryFile, MemoryTree};

const BRANCHES: [&str; 6] = ["Muon_pt", "Muon_eta", "Muon_phi", "Jet_pt", "Jet_eta", "Jet_phi"];

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let chunk_size = usize::from(data[0] % 16) + 1;
    let events = usize::from(data[1] % 64);
    let mut bytes = data[2..].iter().copied().cycle();

    // Every branch gets its own ragged layout, so lengths and event counts
    // disagree in arbitrary ways.
    let mut tree = MemoryTree::new("Events");
    for name in BRANCHES {
        let lists: Vec<Vec<f64>> = (0..events)
            .map(|_| {
                let len = usize::from(bytes.next().unwrap_or(0) % 4);
                (0..len)
                    .map(|_| f64::from(bytes.next().unwrap_or(0)) - 64.0)
                    .collect()
            })
            .collect();
        tree = tree.with_lists(name, lists);
    }
    let met: Vec<f64> = (0..events)
        .map(|_| f64::from(bytes.next().unwrap_or(0)))
        .collect();
    tree = tree.with_scalar("MET_pt", met);

    let config = ProcessorConfig::exact()
        .with_chunk_size(chunk_size)
        .with_max_events(8);
    // Errors are fine; panics and broken invariants are not.
    if let Ok(processed) = EventProcessor::with_config(config)
        .process_source(&mut MemoryFile::new().with_tree(tree), "fuzz")
    {
        assert!(processed.events.len() <= 8);
        for pair in processed.events.windows(2) {
            assert!(!(pair[0].ht < pair[1].ht));
        }
    }
});
