use attachkeep_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AttachmentError {
    /// The new file could not be written. The save must be aborted.
    #[error("failed to store {key}: {source}")]
    StorageWrite { key: String, source: StoreError },

    /// The record's file field holds a value the hook cannot accept.
    #[error("invalid attachment state: {0}")]
    InvalidState(String),

    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
