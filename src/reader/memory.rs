//! In-memory trees.

use super::{Cell, CellIter, DataFile, EventTree, ReaderError};

/// Data of one in-memory branch.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryBranch {
    /// One value per event
    Scalar(Vec<f64>),
    /// One list per event
    Lists(Vec<Vec<f64>>),
}

impl MemoryBranch {
    fn len(&self) -> usize {
        match self {
            MemoryBranch::Scalar(values) => values.len(),
            MemoryBranch::Lists(lists) => lists.len(),
        }
    }
}

/// A tree held entirely in memory.
///
/// The entry count is the length of the longest branch unless set
/// explicitly; shorter branches surface as truncated while streaming.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryTree {
    name: String,
    entries: u64,
    branches: Vec<(String, MemoryBranch)>,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: 0,
            branches: Vec::new(),
        }
    }

    /// Add a per-event branch.
    pub fn with_scalar(mut self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.push_branch(name.into(), MemoryBranch::Scalar(values));
        self
    }

    /// Add a per-particle branch.
    pub fn with_lists(mut self, name: impl Into<String>, lists: Vec<Vec<f64>>) -> Self {
        self.push_branch(name.into(), MemoryBranch::Lists(lists));
        self
    }

    /// Override the entry count.
    pub fn with_entries(mut self, entries: u64) -> Self {
        self.entries = entries;
        self
    }

    /// Branch data by name.
    pub fn branch(&self, name: &str) -> Option<&MemoryBranch> {
        self.branches
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, branch)| branch)
    }

    fn push_branch(&mut self, name: String, branch: MemoryBranch) {
        self.entries = self.entries.max(branch.len() as u64);
        match self.branches.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = branch,
            None => self.branches.push((name, branch)),
        }
    }
}

impl EventTree for MemoryTree {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_entries(&self) -> u64 {
        self.entries
    }

    fn branch_names(&self) -> Vec<String> {
        self.branches.iter().map(|(name, _)| name.clone()).collect()
    }

    fn cells(&self, branch: &str) -> Result<CellIter<'_>, ReaderError> {
        match self.branch(branch) {
            Some(MemoryBranch::Scalar(values)) => {
                Ok(Box::new(values.iter().map(|v| Cell::Value(*v))))
            }
            Some(MemoryBranch::Lists(lists)) => {
                Ok(Box::new(lists.iter().map(|list| Cell::List(list.clone()))))
            }
            None => Err(ReaderError::BranchNotFound(branch.to_string())),
        }
    }
}

/// A container of in-memory trees.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryFile {
    trees: Vec<MemoryTree>,
}

impl MemoryFile {
    /// Create an empty file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tree.
    pub fn with_tree(mut self, tree: MemoryTree) -> Self {
        self.trees.push(tree);
        self
    }
}

impl DataFile for MemoryFile {
    type Tree = MemoryTree;

    fn tree_names(&self) -> Vec<String> {
        self.trees.iter().map(|t| t.name.clone()).collect()
    }

    fn open_tree(&mut self, name: &str) -> Result<MemoryTree, ReaderError> {
        self.trees
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| ReaderError::TreeNotFound(name.to_string()))
    }
}
