use super::*;

fn sample_tree() -> MemoryTree {
    MemoryTree::new("Events")
        .with_lists(
            "Jet_pt",
            vec![vec![50.0, 40.0], vec![], vec![35.0], vec![70.0, 20.0, 10.0], vec![]],
        )
        .with_scalar("MET_pt", vec![10.0, 20.0, 30.0, 40.0, 50.0])
}

#[test]
fn test_jagged_layout() {
    let jagged = Jagged::from_lists(vec![vec![1.0, 2.0], vec![], vec![3.0]]);
    assert_eq!(jagged.len(), 3);
    assert_eq!(jagged.total(), 3);
    assert_eq!(jagged.offsets(), &[0, 2, 2, 3]);
    assert_eq!(jagged.event(1), Some(&[][..]));
    assert_eq!(jagged.event(2), Some(&[3.0][..]));
    assert_eq!(jagged.event(3), None);
    assert_eq!(jagged.counts(), vec![2, 0, 1]);
}

#[test]
fn test_jagged_reductions() {
    let jagged = Jagged::from_lists(vec![vec![30.0, 10.0], vec![], vec![0.7, 0.2, 0.9]]);
    let sums = jagged.sum_per_event();
    assert_eq!(sums.len(), 3);
    assert!((sums[0] - 40.0).abs() < 1e-12);
    assert_eq!(sums[1], 0.0);
    assert!(sums[1].is_sign_positive());
    assert!((sums[2] - 1.8).abs() < 1e-12);
    assert_eq!(jagged.max_per_event(), vec![30.0, 0.0, 0.9]);
    assert_eq!(jagged.count_above(0.5), vec![2, 0, 2]);
}

#[test]
fn test_jagged_rejects_bad_offsets() {
    assert!(Jagged::new(vec![], vec![]).is_err());
    assert!(Jagged::new(vec![1, 2], vec![1.0, 2.0]).is_err());
    assert!(Jagged::new(vec![0, 2, 1], vec![1.0, 2.0]).is_err());
    assert!(Jagged::new(vec![0, 1], vec![1.0, 2.0]).is_err());
    assert!(Jagged::new(vec![0, 1, 2], vec![1.0, 2.0]).is_ok());
}

#[test]
fn test_jagged_scale() {
    let mut jagged = Jagged::from_lists(vec![vec![1000.0], vec![2500.0, 500.0]]);
    jagged.scale(0.001);
    assert_eq!(jagged.values(), &[1.0, 2.5, 0.5]);
}

#[test]
fn test_memory_file_lists_trees() -> Result<(), ReaderError> {
    let mut file = MemoryFile::new()
        .with_tree(MemoryTree::new("meta"))
        .with_tree(sample_tree());
    assert_eq!(file.tree_names(), vec!["meta", "Events"]);
    assert!(file.has_tree("Events"));
    assert!(!file.has_tree("mini"));

    let tree = file.open_tree("Events")?;
    assert_eq!(tree.num_entries(), 5);
    assert_eq!(tree.branch_names(), vec!["Jet_pt", "MET_pt"]);

    assert!(matches!(
        file.open_tree("missing"),
        Err(ReaderError::TreeNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_chunks_cover_every_entry() -> Result<(), ReaderError> {
    let tree = sample_tree();
    let columns = [
        ColumnSpec::new("Jet_pt", ColumnShape::PerParticle),
        ColumnSpec::new("MET_pt", ColumnShape::PerEvent),
    ];
    let chunks = tree
        .chunks(&columns, 2)?
        .collect::<Result<Vec<_>, _>>()?;

    assert_eq!(chunks.len(), 3);
    assert_eq!(
        chunks.iter().map(|c| (c.start, c.len)).collect::<Vec<_>>(),
        vec![(0, 2), (2, 2), (4, 1)]
    );
    let second = &chunks[1];
    assert_eq!(second.per_event("MET_pt"), Some(&[30.0, 40.0][..]));
    let jets = second.per_particle("Jet_pt").ok_or(ReaderError::BranchNotFound("Jet_pt".into()))?;
    assert_eq!(jets.event(1), Some(&[70.0, 20.0, 10.0][..]));
    Ok(())
}

#[test]
fn test_chunk_shape_coercion() -> Result<(), ReaderError> {
    let tree = MemoryTree::new("t")
        .with_scalar("scalar", vec![1.0, 2.0])
        .with_lists("lists", vec![vec![5.0, 6.0], vec![]]);
    let columns = [
        ColumnSpec::new("scalar", ColumnShape::PerParticle),
        ColumnSpec::new("lists", ColumnShape::PerEvent),
    ];
    let chunk = tree
        .chunks(&columns, 10)?
        .next()
        .ok_or(ReaderError::TreeNotFound("t".into()))??;

    let scalar = chunk.per_particle("scalar").ok_or(ReaderError::BranchNotFound("scalar".into()))?;
    assert_eq!(scalar.counts(), vec![1, 1]);
    assert_eq!(chunk.per_event("lists"), Some(&[5.0, 0.0][..]));
    Ok(())
}

#[test]
fn test_short_branch_is_reported() -> Result<(), ReaderError> {
    let tree = MemoryTree::new("t")
        .with_scalar("full", vec![1.0, 2.0, 3.0])
        .with_scalar("short", vec![1.0]);
    let columns = [
        ColumnSpec::new("full", ColumnShape::PerEvent),
        ColumnSpec::new("short", ColumnShape::PerEvent),
    ];
    let results: Vec<_> = tree.chunks(&columns, 2)?.collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0],
        Err(ReaderError::TruncatedBranch { got: 1, expected: 3, .. })
    ));
    Ok(())
}

#[test]
fn test_unknown_branch() {
    let tree = sample_tree();
    let columns = [ColumnSpec::new("Muon_pt", ColumnShape::PerParticle)];
    assert!(matches!(
        tree.chunks(&columns, 10),
        Err(ReaderError::BranchNotFound(_))
    ));
}

#[test]
fn test_empty_tree_yields_no_chunks() -> Result<(), ReaderError> {
    let tree = MemoryTree::new("empty");
    assert_eq!(tree.chunks(&[], 100)?.count(), 0);
    Ok(())
}

#[test]
fn test_root_open_rejects_non_root_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("not_root.root");
    std::fs::write(&path, b"definitely not a ROOT file")?;
    assert!(matches!(RootFile::open(&path), Err(ReaderError::Open(_))));
    Ok(())
}
