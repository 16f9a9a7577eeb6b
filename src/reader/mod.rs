//! # Event Tree Readers
//!
//! Access to columnar event data, independent of where it comes from.
//!
//! - [`DataFile`] lists the top-level trees of a container and opens them.
//! - [`EventTree`] exposes a tree's entry count, branch names and a lazy
//!   per-branch [`Cell`] stream; [`EventTree::chunks`] turns the requested
//!   branches into a [`ChunkStream`] of bounded [`RawChunk`]s.
//!
//! Two implementations ship with the crate: [`RootFile`] over `oxyroot`, and
//! the in-memory [`MemoryFile`] used by tests, benches and embedders that
//! already hold their data in RAM.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rootsift::reader::{ColumnShape, ColumnSpec, DataFile, EventTree, RootFile};
//!
//! let mut file = RootFile::open("nanoaod.root")?;
//! let tree = file.open_tree("Events")?;
//! let columns = [ColumnSpec::new("Muon_pt", ColumnShape::PerParticle)];
//! for chunk in tree.chunks(&columns, 50_000)? {
//!     let chunk = chunk?;
//!     println!("{} events from {}", chunk.len, chunk.start);
//! }
//! # Ok::<(), rootsift::reader::ReaderError>(())
//! ```

mod chunk;
mod error;
mod memory;
mod root;

#[cfg(test)]
mod tests;

pub use chunk::{Cell, ChunkStream, Column, Jagged, RawChunk};
pub use error::ReaderError;
pub use memory::{MemoryBranch, MemoryFile, MemoryTree};
pub use root::{RootFile, RootTree};

/// Lazily decoded entries of one branch.
pub type CellIter<'a> = Box<dyn Iterator<Item = Cell> + 'a>;

/// Whether a column holds one number or a list per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnShape {
    /// One value per event (MET, trigger flags)
    PerEvent,
    /// One list per event (particle collections)
    PerParticle,
}

/// A branch to read and the shape to read it as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    /// Raw branch name
    pub name: String,
    /// Requested shape
    pub shape: ColumnShape,
}

impl ColumnSpec {
    /// Create a column request.
    pub fn new(name: impl Into<String>, shape: ColumnShape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }
}

/// A container of named event trees.
pub trait DataFile {
    /// Tree type produced by [`DataFile::open_tree`]
    type Tree: EventTree;

    /// Names of the top-level trees, in storage order.
    fn tree_names(&self) -> Vec<String>;

    /// Open a tree by name.
    fn open_tree(&mut self, name: &str) -> Result<Self::Tree, ReaderError>;

    /// Whether a top-level tree with this name exists.
    fn has_tree(&self, name: &str) -> bool {
        self.tree_names().iter().any(|t| t == name)
    }
}

/// A columnar table of events.
pub trait EventTree {
    /// Tree name.
    fn name(&self) -> &str;

    /// Number of events.
    fn num_entries(&self) -> u64;

    /// Names of every branch, in storage order.
    fn branch_names(&self) -> Vec<String>;

    /// Decode one branch lazily, entry by entry.
    fn cells(&self, branch: &str) -> Result<CellIter<'_>, ReaderError>;

    /// Stream the requested columns in chunks of at most `chunk_size` events.
    fn chunks(&self, columns: &[ColumnSpec], chunk_size: usize) -> Result<ChunkStream<'_>, ReaderError> {
        let sources = columns
            .iter()
            .map(|spec| Ok((spec.clone(), self.cells(&spec.name)?)))
            .collect::<Result<Vec<_>, ReaderError>>()?;
        Ok(ChunkStream::new(sources, self.num_entries(), chunk_size))
    }
}
