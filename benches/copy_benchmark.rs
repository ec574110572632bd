//! Performance benchmarks for holewalk
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use holewalk::fs::{count_tree, SparseCopier, WalkConfig};
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Create a test file of the specified size, with every `hole_every`-th
/// MiB left as a hole (0 = fully written)
fn create_test_file(dir: &Path, name: &str, size: usize, hole_every: usize) -> PathBuf {
    let path = dir.join(name);
    let mut file = File::create(&path).unwrap();

    let chunk_size = 1024 * 1024;
    let chunk: Vec<u8> = (0..chunk_size).map(|i| (i % 251) as u8 | 1).collect();
    let mut offset = 0;

    while offset < size {
        let to_write = (size - offset).min(chunk_size);
        let index = offset / chunk_size;
        if hole_every > 0 && index % hole_every == 0 {
            file.seek(SeekFrom::Current(to_write as i64)).unwrap();
        } else {
            file.write_all(&chunk[..to_write]).unwrap();
        }
        offset += to_write;
    }
    file.set_len(size as u64).unwrap();

    path
}

fn bench_sparse_copy(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparse_copy");
    let size = 32 * 1024 * 1024;

    for (label, hole_every) in [("dense", 0), ("half_holes", 2), ("all_holes", 1)] {
        let src_dir = TempDir::new().unwrap();
        let dst_dir = TempDir::new().unwrap();
        let src_file = create_test_file(src_dir.path(), "image.bin", size, hole_every);
        let dst_file = dst_dir.path().join("image.bin");

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("layout", label), &size, |b, _| {
            let copier = SparseCopier::new();
            b.iter(|| black_box(copier.copy(&src_file, &dst_file).unwrap()));
        });
    }

    group.finish();
}

fn bench_block_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_size");
    let size = 16 * 1024 * 1024;
    let src_dir = TempDir::new().unwrap();
    let dst_dir = TempDir::new().unwrap();
    let src_file = create_test_file(src_dir.path(), "image.bin", size, 2);
    let dst_file = dst_dir.path().join("image.bin");

    group.throughput(Throughput::Bytes(size as u64));
    for block in [512usize, 4096, 65536] {
        group.bench_with_input(
            BenchmarkId::new("block", humansize::format_size(block as u64, humansize::BINARY)),
            &block,
            |b, &block| {
                let copier = SparseCopier::with_block_size(block).unwrap();
                b.iter(|| black_box(copier.copy(&src_file, &dst_file).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_walk(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();

    // Create test structure
    for i in 0..10 {
        let subdir = dir.path().join(format!("subdir_{}", i));
        std::fs::create_dir_all(subdir.join("nested")).unwrap();

        for j in 0..100 {
            File::create(subdir.join(format!("file_{}.txt", j))).unwrap();
        }
    }

    c.bench_function("walk_1000_files", |b| {
        b.iter(|| black_box(count_tree(dir.path(), WalkConfig::default())));
    });
}

criterion_group!(benches, bench_sparse_copy, bench_block_sizes, bench_walk);

criterion_main!(benches);
