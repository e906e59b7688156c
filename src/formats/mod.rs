//! Binary genomic format parsers
//!
//! Currently this covers the index side of the house:
//!
//! - [`index`]: CSI binning indexes, virtual offsets, and interval binning

pub mod index;

pub use index::CsiIndex;
