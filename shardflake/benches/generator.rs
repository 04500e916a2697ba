use criterion::{criterion_group, criterion_main, Criterion};
use shardflake::{Generator, IdGenerator};

fn bench_memory(c: &mut Criterion) {
    let generator = Generator::memory(1);
    c.bench_function("next_id memory", |b| {
        b.iter(|| {
            // a full second rejects until the clock moves on
            let _ = generator.next_id(1);
        })
    });
}

#[cfg(all(unix, feature = "persist"))]
fn bench_file(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("create bench dir");
    let generator =
        Generator::durable(1, dir.path().join("cursor")).expect("open cursor file");
    c.bench_function("next_id file", |b| {
        b.iter(|| {
            let _ = generator.next_id(1);
        })
    });
}

#[cfg(not(all(unix, feature = "persist")))]
fn bench_file(_: &mut Criterion) {}

criterion_group!(benches, bench_memory, bench_file);
criterion_main!(benches);
