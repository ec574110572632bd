//! Sparse copy behaviour on real files

use holewalk::fs::{create_file_with_hole, sparse_copy, HoleSpec, SparseCopier};
use proptest::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BLOCK: usize = 4096;

fn copy_chain(dir: &Path, data: &[u8], copier: &SparseCopier) -> Vec<u8> {
    let a = dir.join("a");
    let b = dir.join("b");
    let c = dir.join("c");
    fs::write(&a, data).unwrap();

    copier.copy(&a, &b).unwrap();
    copier.copy(&b, &c).unwrap();

    assert_eq!(fs::metadata(&c).unwrap().len(), data.len() as u64);
    fs::read(&c).unwrap()
}

#[test]
fn sparse_source_round_trip() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("file.hole");
    let dst = dir.path().join("file.copy");
    create_file_with_hole(&src, &HoleSpec::default()).unwrap();

    let result = sparse_copy(&src, &dst).unwrap();

    assert_eq!(result.logical_size, 16394);
    assert_eq!(fs::metadata(&dst).unwrap().len(), 16394);
    assert_eq!(fs::read(&dst).unwrap(), fs::read(&src).unwrap());

    let data = fs::read(&dst).unwrap();
    assert_eq!(&data[..10], b"abcdefghij");
    assert!(data[10..16384].iter().all(|&b| b == 0));
    assert_eq!(&data[16384..], b"ABCDEFGHIJ");
}

#[test]
fn sparse_source_skips_interior_blocks() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("file.hole");
    let dst = dir.path().join("file.copy");
    create_file_with_hole(&src, &HoleSpec::default()).unwrap();

    let copier = SparseCopier::with_block_size(BLOCK).unwrap();
    let result = copier.copy(&src, &dst).unwrap();

    // Blocks 1..=3 are all zero; block 0 has the head, block 4 the tail
    assert_eq!(result.holes_skipped, 3);
    assert_eq!(result.bytes_written, (BLOCK + 10) as u64);
    assert_eq!(result.space_saved(), 3 * BLOCK as u64);
}

#[test]
fn single_zero_block_keeps_block_size() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("zero");
    let dst = dir.path().join("copy");
    let copier = SparseCopier::new();

    // An empty copy reveals the block size the destination filesystem uses
    fs::write(&src, b"").unwrap();
    let block = copier.copy(&src, &dst).unwrap().block_size;

    fs::write(&src, vec![0u8; block]).unwrap();
    let result = copier.copy(&src, &dst).unwrap();

    assert_eq!(result.holes_skipped, 1);
    assert_eq!(result.bytes_written, 0);
    assert_eq!(fs::metadata(&dst).unwrap().len(), block as u64);
    assert!(fs::read(&dst).unwrap().iter().all(|&b| b == 0));
}

#[cfg(unix)]
#[test]
fn large_zero_run_is_not_allocated() {
    use holewalk::fs::allocated_bytes;

    let dir = TempDir::new().unwrap();
    let src = dir.path().join("big");
    let dst = dir.path().join("copy");
    let mut data = vec![0u8; 4 * 1024 * 1024];
    data[0] = 1;
    fs::write(&src, &data).unwrap();

    sparse_copy(&src, &dst).unwrap();

    assert_eq!(fs::read(&dst).unwrap(), data);
    // Filesystems without hole support still allocate everything; only
    // check the direction, never more than the source.
    assert!(allocated_bytes(&dst).unwrap() <= allocated_bytes(&src).unwrap());
}

#[test]
fn chain_copy_edge_cases() {
    let dir = TempDir::new().unwrap();
    let copier = SparseCopier::with_block_size(BLOCK).unwrap();

    let mut mixed = vec![0u8; BLOCK];
    mixed.extend(vec![5u8; BLOCK]);
    mixed.extend(vec![0u8; BLOCK]);

    let mut unaligned = vec![3u8; BLOCK + 100];
    unaligned.extend(vec![0u8; 17]);

    let cases: Vec<Vec<u8>> = vec![
        Vec::new(),
        b"tiny".to_vec(),
        vec![0u8; 3 * BLOCK],
        mixed,
        unaligned,
    ];

    for data in cases {
        assert_eq!(copy_chain(dir.path(), &data, &copier), data);
    }
}

/// Data built from runs of zero and non-zero bytes, so whole zero blocks
/// actually show up
fn runs() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec((any::<bool>(), 1usize..300), 0..24).prop_map(|runs| {
        let mut data = Vec::new();
        for (zero, len) in runs {
            let byte = if zero { 0 } else { 0xA5 };
            data.extend(std::iter::repeat(byte).take(len));
        }
        data
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn copy_twice_preserves_content(data in runs(), block in prop::sample::select(vec![16usize, 64, 512])) {
        let dir = TempDir::new().unwrap();
        let copier = SparseCopier::with_block_size(block).unwrap();
        prop_assert_eq!(copy_chain(dir.path(), &data, &copier), data);
    }
}
