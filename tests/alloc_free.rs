//! Allocation-free run path tests.
//!
//! These tests verify that `Generator::run()` and `Rack::process_block()`
//! do not allocate. They drive every generator with long, busy input so
//! retriggers, key-shift redraws, learning and pattern regeneration all
//! happen inside the checked region.
//!
//! Just run `cargo test`; no feature flags needed.

use assert_no_alloc::{assert_no_alloc, AllocDisabler};

#[cfg(debug_assertions)]
#[global_allocator]
static A: AllocDisabler = AllocDisabler;

use cg_engine::{create_generator, BlockBuffer, Controls, DEFAULT_BLOCK_CAPACITY, GENERATORS};
use cg_ir::{TimedEvent, DRUM_CHANNEL};
use cg_master::{GeneratorConfig, Rack, RackConfig};

/// Install a debug-level subscriber so any logging on the run path would
/// format, and allocate, inside the checked region.
fn verbose_logging() {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").with_test_writer().try_init();
}

/// One block of alternating note-ons and note-offs over a few pitches.
fn busy_block(seed: u32) -> Vec<TimedEvent> {
    (0..48u32)
        .map(|i| {
            let pitch = 36 + ((i * 7 + seed) % 24) as u8;
            if i % 3 == 2 {
                TimedEvent::note_off(i * 4, 0, pitch)
            } else {
                TimedEvent::note_on(i * 4, DRUM_CHANNEL, pitch, 100)
            }
        })
        .collect()
}

/// Controls that switch on every optional behaviour.
fn lively_controls(short_name: &str) -> Controls {
    let mut controls = Controls::new();
    let info = cg_engine::find_info(short_name).unwrap();
    for param in info.params {
        // full sparsity would silence the bass
        let value = if param.symbol == "sparsity" { param.min } else { param.max };
        controls.set(param.id, value);
    }
    controls
}

#[test]
fn every_generator_runs_alloc_free() {
    let blocks: Vec<Vec<TimedEvent>> = (0..64).map(busy_block).collect();
    for info in GENERATORS {
        let mut generator = create_generator(info.uri, Some(3)).unwrap();
        let controls = lively_controls(info.short_name);
        let mut out = BlockBuffer::<DEFAULT_BLOCK_CAPACITY>::new();

        assert_no_alloc(|| {
            for block in &blocks {
                out.clear();
                generator.run(block, &controls, &mut out);
            }
            out.clear();
            generator.all_notes_off(0, &mut out);
        });
        assert_eq!(generator.sounding_count(), 0);
    }
}

#[test]
fn drum_learning_is_alloc_free() {
    let mut generator = create_generator("drum", None).unwrap();
    let learn = Controls::new().with(0, 1.0);
    let replay = Controls::new().with(1, 3.9).with(2, 1.0);
    let block = busy_block(5);
    let mut out = BlockBuffer::<DEFAULT_BLOCK_CAPACITY>::new();

    assert_no_alloc(|| {
        for controls in [&learn, &learn, &replay, &replay, &replay, &replay] {
            out.clear();
            generator.run(&block, controls, &mut out);
        }
    });
}

#[test]
fn rack_block_is_alloc_free() {
    let config = RackConfig {
        generators: vec![
            GeneratorConfig::new("bass").with_control("reggae", 1.0),
            GeneratorConfig::new("chord").with_control("strange_key_shift", 1.0),
            GeneratorConfig::new("drum").with_control("intensity", 0.9),
        ],
        ..RackConfig::default()
    };
    let mut rack = Rack::from_config(&config).unwrap();
    let blocks: Vec<Vec<TimedEvent>> = (0..32).map(busy_block).collect();
    let mut emitted = 0usize;

    assert_no_alloc(|| {
        for block in &blocks {
            rack.process_block(block, &mut |_| emitted += 1);
        }
        rack.flush(0, &mut |_| emitted += 1);
    });
    assert!(emitted > 0);
    assert_eq!(rack.sounding_count(), 0);
}

#[test]
fn run_is_alloc_free_with_debug_logging() {
    verbose_logging();
    let mut chords = create_generator("chord", None).unwrap();
    let mut drums = create_generator("drum", Some(1)).unwrap();
    let chord_controls = Controls::new().with(3, 1.0);
    let drum_controls = Controls::new().with(1, 3.8).with(2, 0.3);
    let clock: Vec<TimedEvent> = (0..16).map(|i| TimedEvent::note_on(i, 0, 60, 100)).collect();
    // too small for a whole chord, so tones are dropped as well
    let mut out = BlockBuffer::<2>::new();

    assert_no_alloc(|| {
        for _ in 0..64 {
            out.clear();
            chords.run(&clock, &chord_controls, &mut out);
            out.clear();
            drums.run(&clock, &drum_controls, &mut out);
        }
    });

    let chord_report = chords.take_report();
    assert!(chord_report.key_shifts > 0);
    assert!(chord_report.dropped > 0);
    assert!(drums.take_report().regenerations > 0);
}

#[test]
fn default_rack_is_alloc_free_with_debug_logging() {
    verbose_logging();
    let config = RackConfig {
        generators: vec![
            GeneratorConfig::new("bass"),
            GeneratorConfig::new("chord").with_control("strange_key_shift", 1.0),
            GeneratorConfig::new("drum").with_seed(1),
        ],
        ..RackConfig::default()
    };
    let mut rack = Rack::from_config(&config).unwrap();
    let clock: Vec<TimedEvent> = (0..16).map(|i| TimedEvent::note_on(i * 8, 0, 60, 100)).collect();
    let mut total = cg_engine::RunReport::default();

    for _ in 0..64 {
        assert_no_alloc(|| rack.process_block(&clock, &mut |_| {}));
        total.absorb(rack.log_reports());
    }
    assert!(total.key_shifts > 0);
    assert!(total.regenerations > 0);
}
