//! CSI (Coordinate-Sorted Index) format support
//!
//! CSI is the successor to the fixed-parameter TBI/BAI indexes: a binary,
//! hierarchical binning index mapping genomic intervals to BGZF chunk
//! ranges, with configurable `min_shift`/`depth` so chromosomes longer than
//! 512 Mbp can be indexed.
//!
//! # On-disk layout (little-endian; whole file gzip-compressed, not BGZF)
//!
//! ## Header
//! - Magic: "CSI\1" (4 bytes)
//! - min_shift: Bits for the minimal (leaf) interval (int32)
//! - depth: Number of binning levels (int32)
//! - l_aux: Length of the auxiliary block (int32)
//! - aux: Tabix sub-header when the index covers a tab-delimited file:
//!   format flags (int32), col_seq/col_beg/col_end (int32, 1-based), meta
//!   comment character (int32), skip line count (int32), l_nm (int32),
//!   NUL-delimited reference names
//!
//! ## Index data
//! - n_ref (int32), then per reference: n_bin (int32), per bin
//!   {bin (uint32), loffset (uint64 virtual offset), n_chunk (int32),
//!   per chunk {begin, end} (uint64 virtual offsets)}
//! - n_no_coor (uint64): records without coordinates; informational only
//!   and absent in output from some producers
//!
//! Unlike TBI, CSI has no per-reference linear index; `loffset` on each bin
//! carries the equivalent hint.

use crate::error::{Result, TabkitError};
use crate::formats::index::binning::bins_overlapping;
use crate::formats::index::virtual_offset::{Chunk, VirtualOffset};
use flate2::read::GzDecoder;
use log::warn;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Mutex;

/// CSI file format magic string
const CSI_MAGIC: &[u8; 4] = b"CSI\x01";

/// Format flag bit: coordinates in the indexed file are already 0-based
const FLAG_ZERO_BASED: i32 = 0x10000;

/// Size of the fixed tabix sub-header inside the aux block (7 × int32)
const TABIX_AUX_HEADER_SIZE: usize = 28;

/// Tabix column configuration for interpreting lines of the indexed file
///
/// Column numbers are 1-based, as stored in the index. `col_end == col_beg`
/// means records carry a single point coordinate rather than a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabixConfig {
    /// Raw format flags (low bits: preset; bit 0x10000: 0-based coordinates)
    pub format: i32,
    /// Column holding the sequence name
    pub col_seq: i32,
    /// Column holding the begin coordinate
    pub col_beg: i32,
    /// Column holding the end coordinate (equal to `col_beg` if absent)
    pub col_end: i32,
    /// Comment character introducing meta/header lines
    pub meta_char: char,
    /// Number of leading lines to skip in the indexed file
    pub skip_lines: i32,
}

impl TabixConfig {
    /// Whether stored coordinates are already 0-based (BED convention)
    ///
    /// When unset, stored begin values are 1-based and are shifted down by
    /// one before any overlap test.
    pub fn is_zero_based(&self) -> bool {
        self.format & FLAG_ZERO_BASED != 0
    }
}

/// A bin in the hierarchical binning index
///
/// Sparse: only bins holding at least one record appear in the index.
#[derive(Debug, Clone)]
pub struct Bin {
    /// Bin number, encoding level and position per the binning scheme
    pub bin_id: u32,
    /// Virtual offset of the leftmost record in this bin (seek hint)
    pub loffset: VirtualOffset,
    /// Chunks of data registered under this bin
    pub chunks: Vec<Chunk>,
}

/// Index data for one reference sequence
///
/// The position of a reference in [`CsiIndex::references`] matches the order
/// of the sequence-name table in the aux header.
#[derive(Debug, Clone)]
pub struct Reference {
    /// Sequence name, when the aux block carries a name table
    pub name: Option<String>,
    /// Bins for this reference
    pub bins: Vec<Bin>,
}

/// A parsed CSI index
///
/// Parsed eagerly and fully in one pass at open time; immutable afterwards
/// and safe to share read-only across readers.
#[derive(Debug)]
pub struct CsiIndex {
    min_shift: i32,
    depth: i32,
    config: Option<TabixConfig>,
    names: Vec<String>,
    references: Vec<Reference>,
    n_no_coor: u64,
    /// Reference names already warned about, owned by this instance so
    /// parallel indexes do not share or race on warning state
    warned_refs: Mutex<HashSet<String>>,
}

impl CsiIndex {
    /// Load a CSI index from a file
    ///
    /// The file is normally gzip-compressed; raw index bytes are accepted
    /// too, detected by sniffing the gzip magic.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 2];
        let gzipped = match reader.read_exact(&mut magic) {
            Ok(()) => magic == [0x1f, 0x8b],
            Err(_) => false,
        };

        // Reopen from the start; the sniff consumed bytes
        let file = File::open(path.as_ref())?;
        if gzipped {
            let mut reader = BufReader::new(GzDecoder::new(file));
            Self::parse(&mut reader)
        } else {
            let mut reader = BufReader::new(file);
            Self::parse(&mut reader)
        }
    }

    /// Parse a CSI index from a reader of the *decompressed* index bytes
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != CSI_MAGIC {
            return Err(TabkitError::BadMagic {
                format: "CSI",
                offset: 0,
                found: magic.to_vec(),
            });
        }

        let min_shift = read_i32(reader)?;
        let depth = read_i32(reader)?;
        // The binning scheme shifts coordinates by min_shift + 3*depth, so
        // any header where that exceeds the i64 width cannot index anything
        if min_shift <= 0
            || depth < 0
            || i64::from(min_shift) + 3 * i64::from(depth) >= 64
        {
            return Err(TabkitError::Format {
                msg: format!(
                    "CSI header has implausible min_shift={} depth={}",
                    min_shift, depth
                ),
            });
        }

        let l_aux = read_i32(reader)?;
        if l_aux < 0 {
            return Err(TabkitError::Format {
                msg: format!("CSI header has negative aux length {}", l_aux),
            });
        }
        let mut aux = vec![0u8; l_aux as usize];
        reader.read_exact(&mut aux)?;

        let (config, names) = if aux.len() >= TABIX_AUX_HEADER_SIZE {
            parse_tabix_aux(&aux)?
        } else {
            // BAM-style CSI: no column configuration, no name table
            (None, Vec::new())
        };

        let n_ref = read_i32(reader)?;
        if n_ref < 0 {
            return Err(TabkitError::Format {
                msg: format!("CSI header has negative reference count {}", n_ref),
            });
        }
        if !names.is_empty() && names.len() != n_ref as usize {
            return Err(TabkitError::Format {
                msg: format!(
                    "CSI header claims {} references but aux block names {}",
                    n_ref,
                    names.len()
                ),
            });
        }

        let mut references = Vec::with_capacity(n_ref as usize);
        for idx in 0..n_ref as usize {
            let n_bin = read_i32(reader)?;
            let mut bins = Vec::with_capacity(n_bin.max(0) as usize);
            for _ in 0..n_bin {
                let bin_id = read_u32(reader)?;
                let loffset = VirtualOffset::from_raw(read_u64(reader)?);
                let n_chunk = read_i32(reader)?;
                let mut chunks = Vec::with_capacity(n_chunk.max(0) as usize);
                for _ in 0..n_chunk {
                    let begin = VirtualOffset::from_raw(read_u64(reader)?);
                    let end = VirtualOffset::from_raw(read_u64(reader)?);
                    chunks.push(Chunk::new(begin, end));
                }
                bins.push(Bin {
                    bin_id,
                    loffset,
                    chunks,
                });
            }
            references.push(Reference {
                name: names.get(idx).cloned(),
                bins,
            });
        }

        // Some producers omit the trailer entirely
        let n_no_coor = read_u64(reader).unwrap_or(0);

        Ok(CsiIndex {
            min_shift,
            depth,
            config,
            names,
            references,
            n_no_coor,
            warned_refs: Mutex::new(HashSet::new()),
        })
    }

    /// Bits for the minimal (leaf) interval
    pub fn min_shift(&self) -> i32 {
        self.min_shift
    }

    /// Number of binning levels
    pub fn depth(&self) -> i32 {
        self.depth
    }

    /// Tabix column configuration, when the aux block carried one
    pub fn config(&self) -> Option<&TabixConfig> {
        self.config.as_ref()
    }

    /// Reference names in index order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// All references in index order
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Count of indexed records without coordinates (informational)
    pub fn n_no_coor(&self) -> u64 {
        self.n_no_coor
    }

    /// Chunks that may contain records overlapping `[start, end)` on the
    /// named reference (0-based half-open)
    ///
    /// An unknown reference name is not an error: it logs one warning per
    /// distinct missing name over this index's lifetime and returns an
    /// empty list. Chunks are returned in bin order without deduplication,
    /// even if two bins' byte ranges overlap — indices from the reference
    /// tools register each chunk under exactly one bin, and the quirk is
    /// preserved rather than silently merged away.
    pub fn find_chunks(&self, ref_name: &str, start: i64, end: i64) -> Vec<Chunk> {
        let Some(ref_idx) = self.names.iter().position(|n| n == ref_name) else {
            self.warn_unknown_reference(ref_name);
            return Vec::new();
        };

        let candidates: HashSet<i64> =
            bins_overlapping(start, end, self.min_shift, self.depth)
                .into_iter()
                .collect();

        let mut chunks = Vec::new();
        for bin in &self.references[ref_idx].bins {
            if candidates.contains(&i64::from(bin.bin_id)) {
                chunks.extend_from_slice(&bin.chunks);
            }
        }
        chunks
    }

    fn warn_unknown_reference(&self, ref_name: &str) {
        if let Ok(mut warned) = self.warned_refs.lock() {
            if warned.insert(ref_name.to_string()) {
                warn!(
                    "reference {:?} not found in index; treating as empty",
                    ref_name
                );
            }
        }
    }
}

/// Parse the tabix sub-header and NUL-delimited name table from aux bytes
fn parse_tabix_aux(aux: &[u8]) -> Result<(Option<TabixConfig>, Vec<String>)> {
    let format = i32_at(aux, 0);
    let col_seq = i32_at(aux, 4);
    let col_beg = i32_at(aux, 8);
    let col_end = i32_at(aux, 12);
    let meta = i32_at(aux, 16);
    let skip_lines = i32_at(aux, 20);
    let l_nm = i32_at(aux, 24);

    if l_nm < 0 || TABIX_AUX_HEADER_SIZE + l_nm as usize > aux.len() {
        return Err(TabkitError::Format {
            msg: format!(
                "CSI aux block claims {} name bytes but holds {}",
                l_nm,
                aux.len() - TABIX_AUX_HEADER_SIZE
            ),
        });
    }
    let names = parse_sequence_names(
        &aux[TABIX_AUX_HEADER_SIZE..TABIX_AUX_HEADER_SIZE + l_nm as usize],
    )?;

    let meta_char = u8::try_from(meta)
        .map_err(|_| TabkitError::Format {
            msg: format!("CSI aux block has out-of-range meta character {}", meta),
        })?
        as char;

    let config = TabixConfig {
        format,
        col_seq,
        col_beg,
        col_end,
        meta_char,
        skip_lines,
    };
    Ok((Some(config), names))
}

/// Parse NUL-delimited sequence names from a buffer
fn parse_sequence_names(buf: &[u8]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut start = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if byte == 0 {
            if i > start {
                let name = std::str::from_utf8(&buf[start..i])
                    .map_err(|e| TabkitError::Format {
                        msg: format!("invalid UTF-8 in sequence name: {}", e),
                    })?
                    .to_string();
                names.push(name);
            }
            start = i + 1;
        }
    }

    Ok(names)
}

// Helper functions for reading binary data (little-endian)

fn i32_at(buf: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

fn read_i32<R: Read>(reader: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}
