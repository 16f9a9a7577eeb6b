use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rootsift::processor::{ChunkProcessor, EventProcessor, ProcessorConfig};
use rootsift::reader::{EventTree, MemoryFile, MemoryTree, RawChunk};
use rootsift::schema::{Experiment, ResolvedSchema};

/// NanoAOD-like tree with a few muons and jets per event
fn create_cms_tree(num_events: usize) -> MemoryTree {
    let lists = |per_event: usize, base: f64| -> Vec<Vec<f64>> {
        (0..num_events)
            .map(|i| {
                (0..per_event)
                    .map(|j| base + ((i * 7 + j * 13) % 97) as f64)
                    .collect()
            })
            .collect()
    };
    let angles = |per_event: usize| -> Vec<Vec<f64>> {
        (0..num_events)
            .map(|i| (0..per_event).map(|j| ((i + j) % 50) as f64 * 0.05 - 1.2).collect())
            .collect()
    };

    MemoryTree::new("Events")
        .with_lists("Muon_pt", lists(2, 5.0))
        .with_lists("Muon_eta", angles(2))
        .with_lists("Muon_phi", angles(2))
        .with_lists("Muon_mass", vec![vec![0.10566; 2]; num_events])
        .with_lists("Muon_charge", vec![vec![1.0, -1.0]; num_events])
        .with_lists("Jet_pt", lists(5, 15.0))
        .with_lists("Jet_eta", angles(5))
        .with_lists("Jet_phi", angles(5))
        .with_lists("Jet_mass", lists(5, 2.0))
        .with_lists("Jet_btagDeepB", angles(5))
        .with_scalar(
            "MET_pt",
            (0..num_events).map(|i| (i % 60) as f64).collect(),
        )
        .with_scalar("MET_phi", vec![0.3; num_events])
}

fn first_chunk(tree: &MemoryTree, schema: &ResolvedSchema) -> RawChunk {
    tree.chunks(&schema.columns(), tree.num_entries() as usize)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
}

/// Benchmark derive, select and record building on one in-memory chunk
fn bench_chunk_processor(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunk_processor");

    for num_events in [1_000, 10_000, 50_000] {
        group.throughput(Throughput::Elements(num_events as u64));

        let tree = create_cms_tree(num_events);
        let schema = ResolvedSchema::for_tree(Experiment::Cms.profile(), &tree);
        let chunk = first_chunk(&tree, &schema);
        let processor = ChunkProcessor::new(&schema);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}events", num_events)),
            &chunk,
            |b, chunk| {
                b.iter(|| {
                    let events = processor.process(black_box(chunk), 0);
                    black_box(events);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the full single-file pipeline per scan mode
fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let num_events = 20_000;
    group.throughput(Throughput::Elements(num_events as u64));

    let file = MemoryFile::new().with_tree(create_cms_tree(num_events));
    let modes = [
        ("bounded", ProcessorConfig::default()),
        ("exact", ProcessorConfig::exact()),
    ];

    for (name, config) in modes {
        let processor = EventProcessor::with_config(config.with_chunk_size(5_000).with_max_events(500));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut source = file.clone();
                let processed = processor.process_source(&mut source, "bench").unwrap();
                black_box(processed);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_processor, bench_pipeline);
criterion_main!(benches);
