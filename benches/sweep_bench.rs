use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use dsweep::{BufferPool, DirHandle, Mode, NameIndex, RunConfig, SortOrder, scan_directory};
use rand::Rng;
use std::hint::black_box;
use std::path::PathBuf;

const FILE_COUNT: usize = 10_000;

fn bench_config() -> RunConfig {
    RunConfig {
        mode: Mode::Print,
        progress_enabled: false,
        progress_minor: 1000,
        progress_major: 50,
        stat_fallback: true,
    }
}

/// Builds a scratch directory stuffed with FILE_COUNT randomly named files,
/// roughly the hash-order arrival pattern a real filesystem produces.
fn populate_scratch() -> PathBuf {
    let dir = std::env::temp_dir().join("dsweep_bench_scratch");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("scratch dir");
    let mut rng = rand::rng();
    for n in 0..FILE_COUNT {
        let name = format!("f{:08x}-{n:05}", rng.random_range(0..u32::MAX));
        std::fs::write(dir.join(name), "x").expect("scratch file");
    }
    dir
}

fn bench_scan(c: &mut Criterion) {
    let dir_path = populate_scratch();
    let config = bench_config();

    let mut group = c.benchmark_group("scan");
    group.throughput(Throughput::Elements(FILE_COUNT as u64));
    group.sample_size(20);

    // the fd's read position is consumed by a scan, so each iteration opens fresh
    group.bench_function("getdents_into_sorted_index", |b| {
        b.iter(|| {
            let dir = DirHandle::open(dir_path.as_os_str()).expect("open scratch");
            let mut pool = BufferPool::new();
            let mut index = NameIndex::new(SortOrder::Ascending);
            let total = scan_directory(&dir, &mut pool, &mut index, &config).expect("scan");
            black_box((total, index.len(), pool.len()))
        })
    });
    group.finish();

    let _ = std::fs::remove_dir_all(&dir_path);
}

fn bench_traversal(c: &mut Criterion) {
    let dir_path = populate_scratch();
    let config = bench_config();

    let dir = DirHandle::open(dir_path.as_os_str()).expect("open scratch");
    let mut pool = BufferPool::new();
    let mut index = NameIndex::new(SortOrder::Ascending);
    scan_directory(&dir, &mut pool, &mut index, &config).expect("scan");

    let mut group = c.benchmark_group("traverse");
    group.throughput(Throughput::Elements(FILE_COUNT as u64));

    group.bench_function("in_order_visit", |b| {
        b.iter(|| {
            let mut bytes = 0usize;
            index
                .traverse(|id| {
                    bytes += black_box(pool.name(id)).len();
                    Ok(())
                })
                .expect("traverse");
            black_box(bytes)
        })
    });
    group.finish();

    let _ = std::fs::remove_dir_all(&dir_path);
}

criterion_group!(benches, bench_scan, bench_traversal);
criterion_main!(benches);
