//! BGZF block codec tests against synthetic members
//!
//! All fixtures are built in memory; the codec only needs Read + Seek, so a
//! Cursor stands in for the file handle.

mod common;

use common::{bgzf_block, gzip, BGZF_EOF};
use std::io::Cursor;
use tabkit::io::bgzf::{is_bgzf, BgzfBlockReader};
use tabkit::TabkitError;

#[test]
fn test_single_block_round_trip() {
    let plaintext = b"chr1\t100\t200\tfeature-A\n";
    let mut stream = bgzf_block(plaintext);
    let block_len = stream.len() as u64;
    stream.extend_from_slice(&BGZF_EOF);

    let mut reader = BgzfBlockReader::new(Cursor::new(stream));
    let block = reader.read_block_at(0).expect("failed to read block");

    assert_eq!(block.data, plaintext);
    assert_eq!(block.decompressed_size() as usize, plaintext.len());
    assert_eq!(block.offset(), 0);
    assert_eq!(block.compressed_size(), block_len);
    assert_eq!(block.next_offset(), block_len);
    assert!(!block.is_eof());
}

#[test]
fn test_block_iteration_reaches_eof_marker() {
    let mut stream = Vec::new();
    stream.extend_from_slice(&bgzf_block(b"first block\n"));
    stream.extend_from_slice(&bgzf_block(b"second block\n"));
    stream.extend_from_slice(&BGZF_EOF);

    let mut reader = BgzfBlockReader::new(Cursor::new(stream));
    let mut offset = 0;
    let mut collected = Vec::new();

    loop {
        let block = reader.read_block_at(offset).expect("failed to read block");
        if block.is_eof() {
            break;
        }
        offset = block.next_offset();
        collected.extend_from_slice(&block.into_data());
    }

    assert_eq!(collected, b"first block\nsecond block\n");
}

#[test]
fn test_read_block_at_nonzero_offset() {
    let first = bgzf_block(b"first\n");
    let second_offset = first.len() as u64;
    let mut stream = first;
    stream.extend_from_slice(&bgzf_block(b"second\n"));
    stream.extend_from_slice(&BGZF_EOF);

    let mut reader = BgzfBlockReader::new(Cursor::new(stream));
    let block = reader
        .read_block_at(second_offset)
        .expect("failed to read second block");
    assert_eq!(block.data, b"second\n");
    assert_eq!(block.offset(), second_offset);
}

#[test]
fn test_is_bgzf_accepts_bc_subfield() {
    let mut stream = bgzf_block(b"some data\n");
    stream.extend_from_slice(&BGZF_EOF);

    let mut cursor = Cursor::new(stream);
    assert!(is_bgzf(&mut cursor).expect("detection failed"));
    // Position restored
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_is_bgzf_rejects_plain_gzip() {
    let stream = gzip(b"plain gzip, no BC subfield\n");
    let mut cursor = Cursor::new(stream);
    assert!(!is_bgzf(&mut cursor).expect("detection failed"));
}

#[test]
fn test_is_bgzf_rejects_uncompressed_text() {
    let mut cursor = Cursor::new(b"chr1\t100\t200\n".to_vec());
    assert!(!is_bgzf(&mut cursor).expect("detection failed"));
}

#[test]
fn test_corrupt_magic_is_bad_magic() {
    let mut stream = bgzf_block(b"payload\n");
    stream[0] = 0x00;
    stream[1] = 0x00;

    let mut reader = BgzfBlockReader::new(Cursor::new(stream));
    let err = reader.read_block_at(0).unwrap_err();
    match err {
        TabkitError::BadMagic { format, offset, found } => {
            assert_eq!(format, "BGZF");
            assert_eq!(offset, 0);
            assert_eq!(found, vec![0x00, 0x00]);
        }
        other => panic!("expected BadMagic, got {:?}", other),
    }
}

#[test]
fn test_bsize_zero_is_missing_bsize() {
    // Valid header shape, but the BC subfield declares BSIZE=0
    let mut block = bgzf_block(b"payload\n");
    // BSIZE lives at bytes 16..18 (after the 12-byte header and BC/SLEN)
    block[16] = 0;
    block[17] = 0;

    let mut reader = BgzfBlockReader::new(Cursor::new(block));
    let err = reader.read_block_at(0).unwrap_err();
    assert!(matches!(err, TabkitError::MissingBsize { offset: 0 }));
}

#[test]
fn test_missing_bc_subfield_is_missing_bsize() {
    // FEXTRA set but the extra field holds an unrelated subfield
    let mut block = Vec::new();
    block.extend_from_slice(&[31, 139, 8, 4, 0, 0, 0, 0, 0, 255]);
    block.extend_from_slice(&6u16.to_le_bytes()); // XLEN
    block.extend_from_slice(&[b'X', b'X', 2, 0, 1, 2]); // not BC

    let mut reader = BgzfBlockReader::new(Cursor::new(block));
    let err = reader.read_block_at(0).unwrap_err();
    assert!(matches!(err, TabkitError::MissingBsize { offset: 0 }));
}

#[test]
fn test_truncated_block_is_fatal() {
    let block = bgzf_block(b"a block that will be cut short\n");
    let truncated = block[..block.len() / 2].to_vec();

    let mut reader = BgzfBlockReader::new(Cursor::new(truncated));
    let err = reader.read_block_at(0).unwrap_err();
    assert!(
        matches!(err, TabkitError::Truncated { .. }),
        "expected Truncated, got {:?}",
        err
    );
}

#[test]
fn test_blocks_up_to_max_size() {
    // A 64 KiB payload exercises the ISIZE bound exactly
    let plaintext = vec![b'A'; 65536];
    let mut stream = bgzf_block(&plaintext);
    stream.extend_from_slice(&BGZF_EOF);

    let mut reader = BgzfBlockReader::new(Cursor::new(stream));
    let block = reader.read_block_at(0).expect("failed to read max-size block");
    assert_eq!(block.data.len(), 65536);
    assert_eq!(block.data, plaintext);
}
