//! Error types for tabkit

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tabkit operations
pub type Result<T> = std::result::Result<T, TabkitError>;

/// Error types that can occur in tabkit
///
/// Format errors (`BadMagic`, `MissingBsize`, `Truncated`, `Format`) are
/// always fatal for the operation in progress: the source is assumed corrupt,
/// not transient, and is never retried. An unknown reference name is *not* an
/// error — queries against it return an empty result.
#[derive(Debug, Error)]
pub enum TabkitError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic bytes did not match the expected format signature
    #[error("invalid {format} magic at offset {offset}: got {found:?}")]
    BadMagic {
        /// Name of the format whose signature was expected
        format: &'static str,
        /// Absolute file offset of the failed check
        offset: u64,
        /// Bytes actually read
        found: Vec<u8>,
    },

    /// BGZF block lacks a usable BC extra subfield
    #[error("BGZF block at offset {offset} has no BSIZE (missing or empty BC subfield)")]
    MissingBsize {
        /// Absolute file offset of the block
        offset: u64,
    },

    /// Input ended inside a structure that should have been complete
    #[error("truncated {what} at offset {offset}")]
    Truncated {
        /// What was being read when the input ran out
        what: &'static str,
        /// Absolute file offset of the structure
        offset: u64,
    },

    /// Structurally invalid index or block contents
    #[error("format error: {msg}")]
    Format {
        /// Description of the violation
        msg: String,
    },

    /// No CSI index accompanies the target file
    #[error("no index found for {path:?} (expected companion .csi file)")]
    MissingIndex {
        /// The data file that was being opened
        path: PathBuf,
    },

    /// Invalid query range
    #[error("invalid range: {0}")]
    InvalidRange(String),
}
