//! Shared fixture builders for integration tests
//!
//! Fixtures are hand-assembled bytes: BGZF members built the same way the
//! reference tools lay them out (deflate payload, CRC32 + ISIZE trailer,
//! BC extra subfield), and CSI index bytes built field by field so tests
//! control exactly what the parser sees.

#![allow(dead_code)]

use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use std::io::Write;

/// The fixed 28-byte empty-payload block terminating a valid BGZF stream
pub const BGZF_EOF: [u8; 28] = [
    31, 139, 8, 4, 0, 0, 0, 0, 0, 255, // header
    6, 0, 66, 67, 2, 0, 27, 0, // extra field with BSIZE=27
    3, 0, // empty deflate block
    0, 0, 0, 0, // CRC32
    0, 0, 0, 0, // ISIZE=0
];

/// Build one complete BGZF member holding `data`
pub fn bgzf_block(data: &[u8]) -> Vec<u8> {
    let mut deflate = DeflateEncoder::new(Vec::new(), Compression::default());
    deflate.write_all(data).expect("deflate write");
    let deflated = deflate.finish().expect("deflate finish");

    let mut block = Vec::new();
    block.push(31); // ID1
    block.push(139); // ID2
    block.push(8); // CM (deflate)
    block.push(4); // FLG (FEXTRA)
    block.extend_from_slice(&[0, 0, 0, 0]); // MTIME
    block.push(0); // XFL
    block.push(255); // OS (unknown)
    block.extend_from_slice(&6u16.to_le_bytes()); // XLEN
    block.push(b'B');
    block.push(b'C');
    block.extend_from_slice(&2u16.to_le_bytes()); // SLEN
    let bsize_pos = block.len();
    block.extend_from_slice(&0u16.to_le_bytes()); // BSIZE placeholder
    block.extend_from_slice(&deflated);
    block.extend_from_slice(&crc32fast::hash(data).to_le_bytes());
    block.extend_from_slice(&(data.len() as u32).to_le_bytes());

    let bsize = (block.len() - 1) as u16;
    block[bsize_pos..bsize_pos + 2].copy_from_slice(&bsize.to_le_bytes());
    block
}

/// Gzip-compress a byte buffer (ordinary gzip, as CSI files are stored)
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("gzip write");
    encoder.finish().expect("gzip finish")
}

/// One bin of a CSI fixture: (bin id, loffset, chunk virtual-offset pairs)
pub type FixtureBin = (u32, u64, Vec<(u64, u64)>);

/// Hand-assembled CSI index contents
pub struct CsiFixture {
    pub min_shift: i32,
    pub depth: i32,
    pub format: i32,
    pub col_seq: i32,
    pub col_beg: i32,
    pub col_end: i32,
    pub meta: u8,
    pub skip: i32,
    pub names: Vec<&'static str>,
    /// Bins per reference, parallel to `names`
    pub bins: Vec<Vec<FixtureBin>>,
    pub n_no_coor: u64,
}

impl CsiFixture {
    /// A BED-style fixture skeleton (0-based coordinates, columns 1/2/3)
    pub fn bed(names: Vec<&'static str>, bins: Vec<Vec<FixtureBin>>) -> Self {
        CsiFixture {
            min_shift: 14,
            depth: 5,
            format: 0x10000,
            col_seq: 1,
            col_beg: 2,
            col_end: 3,
            meta: b'#',
            skip: 0,
            names,
            bins,
            n_no_coor: 0,
        }
    }

    /// Raw (decompressed) index bytes
    pub fn raw_bytes(&self) -> Vec<u8> {
        let mut names_blob = Vec::new();
        for name in &self.names {
            names_blob.extend_from_slice(name.as_bytes());
            names_blob.push(0);
        }

        let mut aux = Vec::new();
        aux.extend_from_slice(&self.format.to_le_bytes());
        aux.extend_from_slice(&self.col_seq.to_le_bytes());
        aux.extend_from_slice(&self.col_beg.to_le_bytes());
        aux.extend_from_slice(&self.col_end.to_le_bytes());
        aux.extend_from_slice(&(self.meta as i32).to_le_bytes());
        aux.extend_from_slice(&self.skip.to_le_bytes());
        aux.extend_from_slice(&(names_blob.len() as i32).to_le_bytes());
        aux.extend_from_slice(&names_blob);

        let mut data = Vec::new();
        data.extend_from_slice(b"CSI\x01");
        data.extend_from_slice(&self.min_shift.to_le_bytes());
        data.extend_from_slice(&self.depth.to_le_bytes());
        data.extend_from_slice(&(aux.len() as i32).to_le_bytes());
        data.extend_from_slice(&aux);

        data.extend_from_slice(&(self.bins.len() as i32).to_le_bytes());
        for reference in &self.bins {
            data.extend_from_slice(&(reference.len() as i32).to_le_bytes());
            for (bin_id, loffset, chunks) in reference {
                data.extend_from_slice(&bin_id.to_le_bytes());
                data.extend_from_slice(&loffset.to_le_bytes());
                data.extend_from_slice(&(chunks.len() as i32).to_le_bytes());
                for (begin, end) in chunks {
                    data.extend_from_slice(&begin.to_le_bytes());
                    data.extend_from_slice(&end.to_le_bytes());
                }
            }
        }
        data.extend_from_slice(&self.n_no_coor.to_le_bytes());
        data
    }

    /// Index bytes as stored on disk (gzip-compressed)
    pub fn gzipped(&self) -> Vec<u8> {
        gzip(&self.raw_bytes())
    }
}
