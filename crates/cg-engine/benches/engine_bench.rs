//! Block-processing throughput for each generator.
//!
//! Run with: cargo bench -p cg-engine --bench engine_bench

use cg_engine::{create_generator, BlockBuffer, Controls, Generator, DEFAULT_BLOCK_CAPACITY, GENERATORS};
use cg_ir::{TimedEvent, DRUM_CHANNEL};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// A busy block: note-on/note-off pairs every 8 frames.
fn busy_block() -> Vec<TimedEvent> {
    (0..32u32)
        .flat_map(|i| {
            let pitch = 36 + (i % 24) as u8;
            [
                TimedEvent::note_on(i * 8, DRUM_CHANNEL, pitch, 100),
                TimedEvent::note_off(i * 8 + 4, DRUM_CHANNEL, pitch),
            ]
        })
        .collect()
}

fn bench_generators(c: &mut Criterion) {
    let mut group = c.benchmark_group("generators");
    let events = busy_block();
    let controls = Controls::new();

    for info in GENERATORS {
        let mut generator: Box<dyn Generator> = match create_generator(info.uri, Some(1)) {
            Some(g) => g,
            None => continue,
        };
        let mut out = BlockBuffer::<DEFAULT_BLOCK_CAPACITY>::new();
        group.bench_function(info.short_name, |b| {
            b.iter(|| {
                out.clear();
                generator.run(black_box(&events), &controls, &mut out);
                black_box(out.len())
            })
        });
    }
    group.finish();
}

fn bench_mutate(c: &mut Criterion) {
    let mut chaos = cg_engine::Chaos::new();
    c.bench_function("mutate_base_pattern", |b| {
        b.iter(|| cg_engine::mutate(black_box(&cg_engine::BASE_PATTERN), &mut chaos, 3.9, 0.5))
    });
}

criterion_group!(benches, bench_generators, bench_mutate);
criterion_main!(benches);
