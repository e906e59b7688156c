//! BGZF virtual file offsets and chunk ranges
//!
//! A virtual offset addresses an arbitrary logical position in a BGZF stream
//! as a 64-bit composite:
//!
//! - High 48 bits: compressed file offset of a block start
//! - Low 16 bits: byte offset within that block's decompressed output
//!
//! The intra-block offset must be a valid byte position inside the block
//! starting at the compressed offset (BGZF blocks decompress to at most
//! 64 KiB, so 16 bits always suffice).

/// A 64-bit BGZF virtual file offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VirtualOffset(u64);

impl VirtualOffset {
    /// Pack a (compressed offset, intra-block offset) pair
    ///
    /// `compressed` must fit in 48 bits.
    pub fn new(compressed: u64, uncompressed: u16) -> Self {
        debug_assert!(compressed < (1 << 48), "compressed offset exceeds 48 bits");
        VirtualOffset((compressed << 16) | u64::from(uncompressed))
    }

    /// Wrap a raw 64-bit virtual offset as stored on disk
    pub fn from_raw(raw: u64) -> Self {
        VirtualOffset(raw)
    }

    /// Get the raw 64-bit representation
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Compressed file offset of the containing block
    pub fn compressed(&self) -> u64 {
        self.0 >> 16
    }

    /// Byte offset within the block's decompressed output
    pub fn uncompressed(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl std::fmt::Display for VirtualOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.compressed(), self.uncompressed())
    }
}

/// A half-open byte range in the decompressed logical stream, delimited by
/// virtual offsets
///
/// Chunks are registered under bins in the CSI index; each chunk is owned by
/// exactly one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First byte of the range
    pub start: VirtualOffset,
    /// One past the last byte of the range
    pub end: VirtualOffset,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(start: VirtualOffset, end: VirtualOffset) -> Self {
        Chunk { start, end }
    }
}
