/// Errors that can occur while reading event trees
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file could not be opened as a ROOT file
    #[error("Cannot open ROOT file: {0}")]
    Open(String),

    /// No tree with this name in the file
    #[error("Tree not found: {0}")]
    TreeNotFound(String),

    /// No branch with this name in the tree
    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    /// The branch item type has no decoder
    #[error("Branch '{branch}' has unsupported type '{type_name}'")]
    UnsupportedType {
        /// Branch name
        branch: String,
        /// ROOT item type name
        type_name: String,
    },

    /// A branch yielded fewer entries than the tree declares
    #[error("Branch '{branch}' ended after {got} of {expected} entries")]
    TruncatedBranch {
        /// Branch name
        branch: String,
        /// Entries expected
        expected: u64,
        /// Entries delivered
        got: u64,
    },

    /// Offsets do not describe the value buffer
    #[error("Invalid ragged layout: {0}")]
    InvalidLayout(String),
}
