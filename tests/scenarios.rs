//! End-to-end scenarios across the store, visualization, synthesis and
//! analysis pipelines.

use std::f64::consts::{PI, TAU};
use std::time::{Duration, Instant};

use shmlab::analysis::{AnalysisOptions, SpectralAnalyzer};
use shmlab::scene::{
    reduced_ratio, FreqLock, ParamKey, ParameterStore, RatioMode, RatioPreset, Scene,
};
use shmlab::synth::{additive_sum, Partial, SynthConfig, Synthesizer};
use shmlab::viz::{AnimationClock, LissajousEngine, WaveformConfig, WaveformEngine};
use shmlab::DEFAULT_SAMPLE_RATE;

/// An odd grid length puts a sample exactly on the window midpoint.
fn engine_with_exact_midpoint() -> WaveformEngine {
    WaveformEngine::new(
        WaveformConfig {
            grid_len: 601,
            ..Default::default()
        },
        2,
    )
}

fn scene_with(a1: f64, w1: f64, p1: f64, a2: f64, w2: f64, p2: f64) -> Scene {
    let mut scene = Scene::default();
    scene.oscillators[0].amplitude = a1;
    scene.oscillators[0].omega = w1;
    scene.oscillators[0].phase = p1;
    scene.oscillators[1].amplitude = a2;
    scene.oscillators[1].omega = w2;
    scene.oscillators[1].phase = p2;
    scene
}

#[test]
fn one_to_two_figure_closes_and_starts_at_the_origin() {
    let scene = scene_with(1.0, 1.0, 0.0, 1.0, 2.0, 0.0);

    let mut lissajous = LissajousEngine::default();
    let trajectory = lissajous.trajectory(&scene);

    assert_eq!(trajectory.ratio, (1, 2));
    assert!((trajectory.period - TAU).abs() < 1e-12);

    // The sampled curve closes: first and last points coincide.
    let first = (trajectory.xs[0], trajectory.ys[0]);
    let last = (
        *trajectory.xs.last().unwrap(),
        *trajectory.ys.last().unwrap(),
    );
    assert!((first.0 - last.0).abs() < 1e-9);
    assert!((first.1 - last.1).abs() < 1e-9);

    // At t = 0 the cursor read from the waveform frame sits at the origin.
    let mut waveform = engine_with_exact_midpoint();
    let frame = waveform.tick(&scene, 0.0);
    let (x, y) = LissajousEngine::cursor(frame);
    assert!(x.abs() < 1e-9, "x = {x}");
    assert!(y.abs() < 1e-9, "y = {y}");
}

#[test]
fn anti_phase_pair_cancels_through_the_store() {
    let mut store = ParameterStore::default();
    store.set_freq_lock(FreqLock::Equal);
    store.set_many(&[
        (ParamKey::Amplitude(0), 0.8),
        (ParamKey::Amplitude(1), 0.8),
        (ParamKey::Phase(0), 0.0),
        (ParamKey::Phase(1), PI),
    ]);

    let derived = store.derived();
    assert!(derived.composite_amplitude < 1e-9);

    let mut waveform = WaveformEngine::new(WaveformConfig::default(), 2);
    let frame = waveform.tick(&store.scene(), 1.7);
    for &sample in frame.composite() {
        assert!(sample.abs() < 1e-9, "got {sample}");
    }
}

#[test]
fn near_unison_pair_produces_the_expected_beat() {
    let mut store = ParameterStore::default();
    store.set_many(&[
        (ParamKey::Amplitude(0), 0.5),
        (ParamKey::Amplitude(1), 0.5),
        (ParamKey::Omega(0), 1.0),
        (ParamKey::Omega(1), 1.3),
    ]);

    let derived = store.derived();
    assert!((derived.beat_frequency - 0.3 / TAU).abs() < 1e-9);
    assert!((derived.carrier_frequency - 1.15 / TAU).abs() < 1e-9);

    let mut waveform = WaveformEngine::new(
        WaveformConfig {
            beat_envelope: true,
            ..Default::default()
        },
        2,
    );
    let frame = waveform.tick(&store.scene(), 0.0);
    let (upper, _) = frame.beat_envelope().expect("beat envelope requested");

    // The window spans more than half a beat cycle, so the envelope reaches
    // both its full constructive peak and its cancellation trough.
    let peak = upper.iter().fold(0.0f64, |m, &s| m.max(s));
    let trough = upper.iter().fold(f64::INFINITY, |m, &s| m.min(s));
    assert!((peak - 1.0).abs() < 1e-2, "peak {peak}");
    assert!(trough < 2e-2, "trough {trough}");
}

#[test]
fn synthesized_tones_survive_the_analysis_round_trip() {
    let synth = Synthesizer::new();
    let config = SynthConfig {
        envelope_enabled: false,
        ..Default::default()
    };
    let mut analyzer = SpectralAnalyzer::new();

    for (freq, amp) in [(440.0f32, 0.8f32), (262.0, 0.5), (1000.0, 0.3)] {
        let buffer = synth
            .synthesize(&[Partial::new(freq, amp, 0.0)], 1.0, &config)
            .unwrap();
        let outcome = analyzer
            .decompose(&buffer, DEFAULT_SAMPLE_RATE, &AnalysisOptions::default())
            .unwrap();

        let lead = outcome.partials[0];
        assert!(
            (lead.frequency - freq).abs() < 1.0,
            "{freq} Hz came back as {}",
            lead.frequency
        );
        assert!(
            (lead.amplitude - amp).abs() < 0.04,
            "{freq} Hz amplitude {amp} came back as {}",
            lead.amplitude
        );
    }
}

#[test]
fn triad_decomposition_recovers_every_component() {
    let third = 1.0f32 / 3.0;
    let truth = [261.63, 329.63, 392.0];
    let partials: Vec<Partial> = truth.iter().map(|&f| Partial::new(f, third, 0.0)).collect();

    let synth = Synthesizer::new();
    let config = SynthConfig {
        envelope_enabled: false,
        ..Default::default()
    };
    let buffer = synth.synthesize(&partials, 1.0, &config).unwrap();

    let mut options = AnalysisOptions::default();
    options.peaks.max_peaks = 5;
    let outcome = SpectralAnalyzer::new()
        .decompose(&buffer, DEFAULT_SAMPLE_RATE, &options)
        .unwrap();

    for freq in truth {
        assert!(
            outcome
                .partials
                .iter()
                .any(|p| (p.frequency - freq).abs() < 5.0),
            "missing {freq} Hz in {:?}",
            outcome.partials
        );
    }
}

#[test]
fn ratio_preset_under_lock_second_moves_only_the_first_frequency() {
    let mut store = ParameterStore::default();
    store.set_ratio_mode(RatioMode::LockSecond);
    store.set_ratio_preset(RatioPreset::Locked { p: 3, q: 5 });

    let scene = store.scene();
    assert!((scene.oscillators[0].omega - 0.6).abs() < 1e-12);
    assert_eq!(scene.oscillators[1].omega, 1.0);
    assert_eq!(scene.ratio_preset, RatioPreset::Locked { p: 3, q: 5 });
    assert_eq!(reduced_ratio(0.6, 1.0), (3, 5));
}

#[test]
fn equal_lock_holds_under_an_arbitrary_write_sequence() {
    let mut store = ParameterStore::default();
    store.set_freq_lock(FreqLock::Equal);

    let writes = [
        (ParamKey::Omega(0), 2.7),
        (ParamKey::Amplitude(1), 0.4),
        (ParamKey::Omega(1), 0.2),
        (ParamKey::Phase(0), 9.0),
        (ParamKey::Omega(0), 11.0), // clamps to the range maximum
        (ParamKey::Speed, 1.5),
    ];
    for (key, value) in writes {
        store.set(key, value);
        let scene = store.scene();
        assert_eq!(
            scene.oscillators[0].omega, scene.oscillators[1].omega,
            "diverged after {key:?}"
        );
    }
}

#[test]
fn cursor_stays_on_the_drawn_curve_while_animating() {
    let scene = scene_with(0.9, 1.0, 0.3, 0.7, 2.0, 0.0);
    let mut waveform = engine_with_exact_midpoint();
    let mut lissajous = LissajousEngine::new(50);

    let mut clock = AnimationClock::default();
    clock.play();

    let t0 = Instant::now();
    for i in 0..200u32 {
        let vt = clock.tick(t0 + Duration::from_millis(12) * i).unwrap();
        waveform.mark_dirty();
        let frame = waveform.tick(&scene, vt);
        let (x, y) = LissajousEngine::cursor(frame);

        // The cursor is the midpoint sample of the emitted buffers by
        // construction; verify it also satisfies the analytic curve.
        let mid = frame.wave(0).len() / 2;
        assert_eq!(x, frame.wave(0)[mid]);
        assert_eq!(y, frame.wave(1)[mid]);

        lissajous.push_trail((x, y));
    }
    assert_eq!(lissajous.trail_len(), 50);
}

#[test]
fn pause_freezes_virtual_time_and_reset_rewinds_it() {
    let mut clock = AnimationClock::default();
    let t0 = Instant::now();

    clock.play();
    clock.tick(t0);
    clock.tick(t0 + Duration::from_millis(24));
    let before_pause = clock.virtual_time();
    assert!(before_pause > 0.0);

    clock.pause();
    assert_eq!(clock.tick(t0 + Duration::from_secs(5)), None);
    assert_eq!(clock.virtual_time(), before_pause);

    // Resuming after a long pause does not jump: the first tick only stamps.
    clock.play();
    clock.tick(t0 + Duration::from_secs(10));
    assert_eq!(clock.virtual_time(), before_pause);

    clock.reset();
    assert_eq!(clock.virtual_time(), 0.0);
    assert!(clock.is_running());
}

#[test]
fn reconstruction_of_an_analyzed_chord_is_audibly_equivalent() {
    let truth = [(220.0, 0.4, 0.0), (330.0, 0.4, 0.0)];
    let original = additive_sum(&truth, 1.0, DEFAULT_SAMPLE_RATE);

    let outcome = SpectralAnalyzer::new()
        .decompose(&original, DEFAULT_SAMPLE_RATE, &AnalysisOptions::default())
        .unwrap();
    let rebuilt = shmlab::analysis::reconstruct(&outcome.partials, 1.0, DEFAULT_SAMPLE_RATE);

    // Same dominant spectrum, within analysis tolerances.
    let again = SpectralAnalyzer::new()
        .decompose(&rebuilt, DEFAULT_SAMPLE_RATE, &AnalysisOptions::default())
        .unwrap();
    for (freq, amp, _) in truth {
        let matched = again
            .partials
            .iter()
            .find(|p| (p.frequency - freq).abs() < 1.0)
            .unwrap_or_else(|| panic!("missing {freq} Hz"));
        assert!((matched.amplitude - amp).abs() < 0.08);
    }
}
