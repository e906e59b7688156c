//! tabkit: indexed random-access queries over block-compressed genomic text
//!
//! # Overview
//!
//! tabkit implements the storage core of a tab-delimited genomics toolkit:
//! given a BGZF-compressed, coordinate-sorted file (BED, VCF, GFF3, or any
//! generic tab-delimited layout) and its companion CSI index, it answers
//! region queries by reading only the compressed byte ranges that can hold
//! overlapping records.
//!
//! Three pieces cooperate:
//!
//! - **BGZF block codec** ([`io::bgzf`]): decodes individual ≤64 KiB gzip
//!   members at arbitrary file offsets.
//! - **CSI index** ([`formats::index`]): a hierarchical binning index
//!   mapping genomic intervals to chunk byte ranges, addressed by virtual
//!   offsets (compressed block offset + intra-block offset).
//! - **Query engine** ([`query`]): fetches and reassembles chunk text
//!   across block boundaries, then filters lines against the exact query
//!   interval using the index's tabix column configuration.
//!
//! # Quick start
//!
//! ```no_run
//! use tabkit::IndexedReader;
//!
//! # fn main() -> tabkit::Result<()> {
//! let mut reader = IndexedReader::from_path("variants.bed.gz")?;
//!
//! // 0-based half-open interval
//! for line in reader.query("chr1", 100, 200)? {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Concurrency
//!
//! Everything is single-threaded, synchronous, blocking I/O. A file handle
//! is not safe for concurrent queries; open one [`IndexedReader`] per
//! thread. The parsed [`CsiIndex`] is immutable after construction and may
//! be shared read-only.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod formats;
pub mod io;
pub mod query;

// Re-export commonly used types
pub use error::{Result, TabkitError};
pub use formats::index::{Chunk, CsiIndex, TabixConfig, VirtualOffset};
pub use io::bgzf::{is_bgzf, BgzfBlockReader};
pub use query::{IndexedReader, QueryHits};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
