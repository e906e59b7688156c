//! I/O module: block-compressed byte sources
//!
//! - [`bgzf`]: random-access decoding of BGZF members from seekable sources

pub mod bgzf;

pub use bgzf::{is_bgzf, BgzfBlock, BgzfBlockReader};
