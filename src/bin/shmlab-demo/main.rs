//! shmlab-demo - render a factory preset, decompose it, print the report.
//!
//! Run with: cargo run --bin shmlab-demo [preset-name] [out.wav] [--play]

use color_eyre::eyre::{eyre, Result};
use tracing::info;

use shmlab::analysis::{spawn_decompose, AnalysisOptions};
use shmlab::audio::{save_wav, AudioBuffer, PlaybackController, PlaybackState};
use shmlab::synth::{builtin_presets, Synthesizer};
use shmlab::DEFAULT_SAMPLE_RATE;

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let play = args.iter().any(|a| a == "--play");
    let mut positional = args.iter().filter(|a| !a.starts_with("--"));
    let wanted = positional.next().map(String::as_str).unwrap_or("Beat pair");
    let out_path = positional.next();

    let presets = builtin_presets();
    let (name, preset) = presets
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            let names: Vec<&str> = presets.iter().map(|(n, _)| *n).collect();
            eyre!("unknown preset '{wanted}'; available: {}", names.join(", "))
        })?;

    println!("=== shmlab ===");
    println!("Preset: {name}");
    println!("Components: {}", preset.components.len());
    println!("Duration: {:.2} s", preset.duration);
    println!();

    let synth = Synthesizer::new();
    let (partials, duration, config) = preset.render_plan(DEFAULT_SAMPLE_RATE);
    let buffer = synth.synthesize(&partials, duration, &config)?;
    info!(samples = buffer.len(), "rendered");

    let mut job = spawn_decompose(buffer.clone(), DEFAULT_SAMPLE_RATE, AnalysisOptions::default());
    loop {
        let progress = job.progress();
        if progress == 100 || job.is_finished() {
            break;
        }
        print!("\ranalyzing... {progress:>3}%");
        use std::io::Write as _;
        std::io::stdout().flush()?;
        std::thread::sleep(std::time::Duration::from_millis(10));
    }
    let outcome = job.wait()?;
    println!("\ranalyzing... done");
    println!();

    println!("Recovered partials (strongest first):");
    for partial in &outcome.partials {
        println!(
            "  {:>8.2} Hz  amplitude {:.3}  phase {:+.3} rad",
            partial.frequency, partial.amplitude, partial.phase
        );
    }
    if let Some(beat) = outcome.probable_beat_hz {
        println!("Probable beat: {beat:.2} Hz");
    }

    if let Some(path) = out_path {
        save_wav(path, &AudioBuffer::new(buffer.clone(), DEFAULT_SAMPLE_RATE))?;
        println!("Wrote {path}");
    }

    if play {
        println!("Playing...");
        let mut controller = PlaybackController::new();
        controller.load(AudioBuffer::new(buffer, DEFAULT_SAMPLE_RATE));
        controller.play(0.0)?;
        while controller.state() != PlaybackState::Idle {
            controller.poll();
            std::thread::sleep(std::time::Duration::from_millis(25));
        }
    }

    Ok(())
}
