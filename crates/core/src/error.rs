//! Error types for profile generation.

use thiserror::Error;

/// Errors that can occur while loading inputs or writing outputs.
///
/// The instruction-recording path is total and never produces an error;
/// only the loaders, the checkpoint file format, and the report writer
/// can fail.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// I/O failure while reading an input or writing the report
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed disassembly listing
    #[error("disassembly line {line}: {msg}")]
    Disasm { line: usize, msg: String },

    /// Malformed event trace
    #[error("trace line {line}: {msg}")]
    Trace { line: usize, msg: String },

    /// Corrupt or incompatible checkpoint file
    #[error("checkpoint: {0}")]
    Checkpoint(String),
}

/// Result type for profile generation.
pub type Result<T> = std::result::Result<T, ProfileError>;
