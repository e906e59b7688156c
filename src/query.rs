//! Indexed region queries over BGZF-compressed tab-delimited files
//!
//! [`IndexedReader`] ties together the CSI index and the BGZF block reader:
//! a query resolves the candidate bins for an interval, fetches the byte
//! ranges (chunks) registered under them, reassembles the decompressed text
//! across block boundaries, and filters the resulting lines against the
//! exact query interval using the tabix column configuration.
//!
//! The bin lookup is deliberately coarse; the per-line coordinate filter at
//! the end is what makes results exact. All candidate lines inside fetched
//! chunks are scanned linearly — there is no second index probe.
//!
//! # Example
//!
//! ```no_run
//! use tabkit::IndexedReader;
//!
//! # fn main() -> tabkit::Result<()> {
//! // Opens variants.bed.gz and its companion variants.bed.gz.csi
//! let mut reader = IndexedReader::from_path("variants.bed.gz")?;
//!
//! for line in reader.query("chr1", 1_000_000, 2_000_000)? {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TabkitError};
use crate::formats::index::{Chunk, CsiIndex, TabixConfig};
use crate::io::bgzf::{is_bgzf, BgzfBlockReader};
use log::debug;
use std::collections::VecDeque;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Random-access reader over a BGZF-compressed, coordinate-sorted,
/// tab-delimited file with a companion `.csi` index
///
/// The underlying file handle is owned by the reader and closed on drop.
/// `query` takes `&mut self` because block reads move the handle's seek
/// position; for concurrent queries, open one `IndexedReader` per thread
/// (the parsed [`CsiIndex`] itself is immutable and shareable).
#[derive(Debug)]
pub struct IndexedReader {
    reader: BgzfBlockReader<File>,
    index: CsiIndex,
    config: TabixConfig,
}

impl IndexedReader {
    /// Open a data file together with its `<path>.csi` companion index
    ///
    /// Fails with [`TabkitError::MissingIndex`] when no companion index
    /// exists — the caller is expected to fall back to a linear scan or
    /// fail outright. The data file must be BGZF and the index must carry a
    /// tabix column configuration (an alignment-style CSI without one
    /// cannot drive line filtering).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let index_path = csi_companion(path);
        if !index_path.exists() {
            return Err(TabkitError::MissingIndex {
                path: path.to_path_buf(),
            });
        }

        let index = CsiIndex::from_path(&index_path)?;
        let Some(config) = index.config().copied() else {
            return Err(TabkitError::Format {
                msg: format!(
                    "index {:?} has no tabix column configuration",
                    index_path
                ),
            });
        };

        let mut file = File::open(path)?;
        if !is_bgzf(&mut file)? {
            return Err(TabkitError::Format {
                msg: format!("{:?} is not a BGZF file", path),
            });
        }

        Ok(IndexedReader {
            reader: BgzfBlockReader::new(file),
            index,
            config,
        })
    }

    /// The parsed companion index
    pub fn index(&self) -> &CsiIndex {
        &self.index
    }

    /// Whether stored coordinates are already 0-based
    pub fn is_zero_based(&self) -> bool {
        self.config.is_zero_based()
    }

    /// 1-based column number of the sequence name
    pub fn col_seq(&self) -> i32 {
        self.config.col_seq
    }

    /// 1-based column number of the begin coordinate
    pub fn col_beg(&self) -> i32 {
        self.config.col_beg
    }

    /// 1-based column number of the end coordinate
    pub fn col_end(&self) -> i32 {
        self.config.col_end
    }

    /// Comment character introducing meta lines
    pub fn meta_char(&self) -> char {
        self.config.meta_char
    }

    /// Number of leading lines to skip in the indexed file
    pub fn skip_lines(&self) -> i32 {
        self.config.skip_lines
    }

    /// Lines overlapping `[start, end)` on the named reference
    /// (0-based half-open)
    ///
    /// Returns a lazy iterator: chunks are decoded one at a time as the
    /// caller consumes lines. Lines appear in chunk-list order; chunks are
    /// not globally sorted before decoding, so callers must not assume any
    /// ordering beyond "lines grouped per chunk". An unknown reference name
    /// yields an empty iterator, not an error.
    pub fn query(&mut self, ref_name: &str, start: i64, end: i64) -> Result<QueryHits<'_>> {
        if start < 0 || start >= end {
            return Err(TabkitError::InvalidRange(format!(
                "{}:{}-{}",
                ref_name, start, end
            )));
        }

        let chunks = self.index.find_chunks(ref_name, start, end);
        Ok(QueryHits {
            reader: &mut self.reader,
            config: self.config,
            start,
            end,
            chunks: chunks.into_iter(),
            state: HitState::Scanning {
                pending: VecDeque::new(),
            },
        })
    }
}

/// Streaming results of one region query
///
/// Yields `Ok(line)` for every record overlapping the query interval. A
/// decode failure yields `Err` once, after which the iterator is finished —
/// partial results before a failure must not be considered valid.
#[derive(Debug)]
pub struct QueryHits<'a> {
    reader: &'a mut BgzfBlockReader<File>,
    config: TabixConfig,
    start: i64,
    end: i64,
    chunks: std::vec::IntoIter<Chunk>,
    state: HitState,
}

/// Scan state of a [`QueryHits`] iterator
#[derive(Debug)]
enum HitState {
    /// Draining matched lines, refilling from the next chunk when empty
    Scanning { pending: VecDeque<String> },
    /// All chunks consumed, or a fatal error was already reported
    Finished,
}

impl Iterator for QueryHits<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                HitState::Finished => return None,
                HitState::Scanning { pending } => {
                    if let Some(line) = pending.pop_front() {
                        return Some(Ok(line));
                    }
                }
            }

            // Pending buffer drained; decode the next chunk or finish
            let Some(chunk) = self.chunks.next() else {
                self.state = HitState::Finished;
                return None;
            };

            let text = match read_chunk(self.reader, chunk) {
                Ok(text) => text,
                Err(e) => {
                    self.state = HitState::Finished;
                    return Some(Err(e));
                }
            };

            let matched = filter_lines(&text, &self.config, self.start, self.end);
            if let HitState::Scanning { pending } = &mut self.state {
                pending.extend(matched);
            }
        }
    }
}

/// Materialize the decompressed bytes of one chunk
///
/// Decodes successive blocks from the chunk's begin compressed offset until
/// past its end compressed offset, dropping the first block's prefix and
/// truncating the final block per the chunk's intra-block offsets. When the
/// chunk begins and ends in the same block, truncation is applied before
/// the prefix drop so both offsets address the block's own coordinates.
fn read_chunk(reader: &mut BgzfBlockReader<File>, chunk: Chunk) -> Result<Vec<u8>> {
    if chunk.start.as_raw() >= chunk.end.as_raw() {
        return Ok(Vec::new());
    }

    let end_compressed = chunk.end.compressed();
    let end_within = chunk.end.uncompressed() as usize;
    let mut offset = chunk.start.compressed();
    let mut first = true;
    let mut text = Vec::new();

    while offset < end_compressed || (offset == end_compressed && end_within > 0) {
        let block = reader.read_block_at(offset)?;
        let next = block.next_offset();
        let mut data = block.into_data();

        if offset == end_compressed {
            data.truncate(end_within);
        }
        if first {
            let skip = (chunk.start.uncompressed() as usize).min(data.len());
            data.drain(..skip);
            first = false;
        }

        text.extend_from_slice(&data);
        offset = next;
    }

    Ok(text)
}

/// Filter decoded chunk text down to lines overlapping `[start, end)`
///
/// Meta lines and lines whose coordinate columns fail to parse are skipped.
/// When `col_beg == col_end` the record carries a single point coordinate
/// and matches iff that point lies inside the query interval.
fn filter_lines(text: &[u8], config: &TabixConfig, start: i64, end: i64) -> Vec<String> {
    let text = String::from_utf8_lossy(text);
    let mut matched = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with(config.meta_char) {
            continue;
        }

        let Some((rec_start, rec_end)) = line_interval(line, config) else {
            continue;
        };

        let overlaps = if config.col_beg == config.col_end {
            rec_start >= start && rec_start < end
        } else {
            rec_start < end && rec_end > start
        };
        if overlaps {
            matched.push(line.to_string());
        }
    }

    matched
}

/// Extract the 0-based half-open interval of one record line
///
/// Applies the 1-based-to-0-based begin adjustment when the format flag
/// says the source coordinates are 1-based. A 1-based inclusive end equals
/// the 0-based exclusive end numerically, so end values pass through.
fn line_interval(line: &str, config: &TabixConfig) -> Option<(i64, i64)> {
    let fields: Vec<&str> = line.split('\t').collect();

    let beg_field = fields.get(usize::try_from(config.col_beg - 1).ok()?)?;
    let Ok(raw_beg) = beg_field.parse::<i64>() else {
        debug!("skipping line with unparsable begin column: {:?}", line);
        return None;
    };
    let rec_start = if config.is_zero_based() {
        raw_beg
    } else {
        raw_beg - 1
    };

    if config.col_beg == config.col_end {
        return Some((rec_start, rec_start + 1));
    }

    let end_field = fields.get(usize::try_from(config.col_end - 1).ok()?)?;
    let Ok(rec_end) = end_field.parse::<i64>() else {
        debug!("skipping line with unparsable end column: {:?}", line);
        return None;
    };
    Some((rec_start, rec_end))
}

/// Companion index path: the data path with `.csi` appended
fn csi_companion(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".csi");
    PathBuf::from(os)
}
