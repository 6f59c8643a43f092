//! Benchmarks for the per-frame and per-render hot paths.
//!
//! Run with: cargo bench
//!
//! Budget reference: the visualization loop targets a 12 ms frame, so one
//! waveform tick must stay far below that; synthesis and analysis run off
//! the frame path but should stay interactive (well under a second for a
//! one-second buffer).

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use shmlab::analysis::{AnalysisOptions, SpectralAnalyzer};
use shmlab::scene::Scene;
use shmlab::synth::{Partial, SynthConfig, Synthesizer};
use shmlab::viz::{WaveformConfig, WaveformEngine};
use shmlab::DEFAULT_SAMPLE_RATE;

fn bench_waveform_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("viz/waveform");

    for &grid_len in &[300usize, 600, 1000] {
        let mut engine = WaveformEngine::new(
            WaveformConfig {
                grid_len,
                beat_envelope: true,
                ..Default::default()
            },
            2,
        );
        let mut scene = Scene::default();
        scene.oscillators[1].omega = 1.3;

        let mut t = 0.0f64;
        group.bench_with_input(BenchmarkId::new("tick", grid_len), &grid_len, |b, _| {
            b.iter(|| {
                t += 0.012;
                engine.mark_dirty();
                black_box(engine.tick(black_box(&scene), t));
            })
        });
    }
    group.finish();
}

fn bench_synthesize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/render");
    let synth = Synthesizer::new();
    let config = SynthConfig::default();

    for &count in &[1usize, 3, 8] {
        let partials: Vec<Partial> = (1..=count)
            .map(|n| Partial::new(110.0 * n as f32, 1.0 / n as f32, 0.0))
            .collect();
        group.bench_with_input(BenchmarkId::new("one_second", count), &count, |b, _| {
            b.iter(|| {
                black_box(
                    synth
                        .synthesize(black_box(&partials), 1.0, &config)
                        .unwrap(),
                );
            })
        });
    }

    let pair = [Partial::new(440.0, 0.5, 0.0), Partial::new(444.0, 0.5, 0.0)];
    let reverb = SynthConfig {
        reverb_enabled: true,
        ..Default::default()
    };
    group.bench_function("one_second_with_reverb", |b| {
        b.iter(|| {
            black_box(synth.synthesize(black_box(&pair), 1.0, &reverb).unwrap());
        })
    });
    group.finish();
}

fn bench_decompose(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis/decompose");
    group.sample_size(20);

    let synth = Synthesizer::new();
    let config = SynthConfig {
        envelope_enabled: false,
        ..Default::default()
    };
    let pure = synth
        .synthesize(&[Partial::new(440.0, 0.8, 0.0)], 1.0, &config)
        .unwrap();
    let beat = synth
        .synthesize(
            &[Partial::new(440.0, 0.5, 0.0), Partial::new(447.0, 0.5, 0.0)],
            1.0,
            &config,
        )
        .unwrap();

    let mut analyzer = SpectralAnalyzer::new();
    let options = AnalysisOptions::default();

    group.bench_function("pure_tone", |b| {
        b.iter(|| {
            black_box(
                analyzer
                    .decompose(black_box(&pure), DEFAULT_SAMPLE_RATE, &options)
                    .unwrap(),
            );
        })
    });
    // The beat pair triggers the second, high-resolution pass.
    group.bench_function("beat_pair", |b| {
        b.iter(|| {
            black_box(
                analyzer
                    .decompose(black_box(&beat), DEFAULT_SAMPLE_RATE, &options)
                    .unwrap(),
            );
        })
    });
    group.finish();
}

criterion_group!(benches, bench_waveform_tick, bench_synthesize, bench_decompose);
criterion_main!(benches);
