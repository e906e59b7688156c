//! Index formats for genomic data files
//!
//! This module implements the CSI (Coordinate-Sorted Index) binning index
//! and the primitives it is built from:
//!
//! - [`virtual_offset`]: 64-bit BGZF virtual offsets and chunk ranges
//! - [`binning`]: the hierarchical interval binning scheme
//! - [`csi`]: the CSI on-disk format and chunk lookup
//!
//! CSI indexes enable region queries on sorted, tab-delimited,
//! BGZF-compressed genomic files (BED, VCF, GFF3, generic) without scanning
//! the whole file: the index maps genomic intervals to the compressed byte
//! ranges that may hold overlapping records.

pub mod binning;
pub mod csi;
pub mod virtual_offset;

pub use binning::{bin_for_interval, bins_overlapping};
pub use csi::{Bin, CsiIndex, Reference, TabixConfig};
pub use virtual_offset::{Chunk, VirtualOffset};
