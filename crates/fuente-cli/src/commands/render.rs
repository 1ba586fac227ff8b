//! Render a note list through the engine into a WAV file.

use super::common::{SourceArgs, load_config};
use anyhow::{Context, bail};
use clap::Args;
use fuente_io::{WavSpec, write_wav_stereo};
use fuente_synth::{Engine, Note};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

/// Frames rendered per engine call.
const BLOCK_SIZE: usize = 256;

#[derive(Args)]
pub struct RenderArgs {
    /// Notes to play one after another, as key:velocity:seconds
    /// (e.g. "60:100:0.5,64:100:0.5")
    #[arg(long)]
    notes: String,

    #[command(flatten)]
    source: SourceArgs,

    /// Engine configuration file (defaults to the user config, then built-in defaults)
    #[arg(long, value_name = "FILE.toml")]
    config: Option<PathBuf>,

    /// Seconds of tail rendered after the last note-off
    #[arg(long, default_value = "1.0")]
    tail: f32,

    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,
}

/// One note of the sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpec {
    pub key: u8,
    pub velocity: u8,
    pub seconds: f32,
}

/// Parse `key:velocity:seconds` items separated by commas.
pub fn parse_notes(list: &str) -> anyhow::Result<Vec<NoteSpec>> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let parts: Vec<&str> = item.split(':').collect();
            let [key, velocity, seconds] = parts[..] else {
                bail!("note '{item}' is not key:velocity:seconds");
            };
            let key: u8 = key.parse().with_context(|| format!("bad key in '{item}'"))?;
            let velocity: u8 = velocity
                .parse()
                .with_context(|| format!("bad velocity in '{item}'"))?;
            let seconds: f32 = seconds
                .parse()
                .with_context(|| format!("bad duration in '{item}'"))?;
            if key > 127 || velocity > 127 {
                bail!("note '{item}' is outside the MIDI range");
            }
            if !(seconds.is_finite() && seconds >= 0.0) {
                bail!("note '{item}' has a negative duration");
            }
            Ok(NoteSpec {
                key,
                velocity,
                seconds,
            })
        })
        .collect()
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let notes = parse_notes(&args.notes)?;
    if notes.is_empty() {
        bail!("no notes given");
    }
    let config = load_config(args.config.as_ref())?;
    let data = args.source.build_font()?;
    let sample_rate = config.sample_rate;

    let (mut engine, handle) = Engine::new(config);
    let summary = handle.load(&data)?;
    handle.select_preset(0, 0)?;
    info!(presets = summary.presets, samples = summary.samples, "font ready");

    let frames_for = |seconds: f32| (seconds.max(0.0) * sample_rate as f32).round() as usize;
    let total: usize = notes.iter().map(|n| frames_for(n.seconds)).sum::<usize>() + frames_for(args.tail);

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut left = vec![0.0f32; total];
    let mut right = vec![0.0f32; total];
    let mut cursor = 0;

    for note in &notes {
        println!("  {} vel {} for {:.2}s", Note(note.key), note.velocity, note.seconds);
        handle.note_on(note.key, note.velocity)?;
        let end = cursor + frames_for(note.seconds);
        render_span(&mut engine, &mut left[cursor..end], &mut right[cursor..end], &progress);
        handle.note_off(note.key)?;
        cursor = end;
    }
    render_span(&mut engine, &mut left[cursor..], &mut right[cursor..], &progress);
    progress.finish_and_clear();

    let peak = left
        .iter()
        .chain(&right)
        .fold(0.0f32, |peak, s| peak.max(s.abs()));
    let spec = WavSpec {
        sample_rate,
        ..WavSpec::default()
    };
    write_wav_stereo(&args.output, &left, &right, spec)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!(
        "Wrote {} frames ({:.2}s, peak {:.1} dBFS) to {}",
        total,
        total as f32 / sample_rate as f32,
        20.0 * peak.max(1e-10).log10(),
        args.output.display()
    );
    Ok(())
}

fn render_span(engine: &mut Engine, left: &mut [f32], right: &mut [f32], progress: &ProgressBar) {
    for (l, r) in left.chunks_mut(BLOCK_SIZE).zip(right.chunks_mut(BLOCK_SIZE)) {
        engine.render(l, r);
        progress.inc(l.len() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notes() {
        let notes = parse_notes("60:100:0.5, 64:90:1").unwrap();
        assert_eq!(
            notes,
            vec![
                NoteSpec {
                    key: 60,
                    velocity: 100,
                    seconds: 0.5
                },
                NoteSpec {
                    key: 64,
                    velocity: 90,
                    seconds: 1.0
                },
            ]
        );
    }

    #[test]
    fn test_parse_notes_rejects_bad_items() {
        assert!(parse_notes("60:100").is_err());
        assert!(parse_notes("200:100:1").is_err());
        assert!(parse_notes("60:100:-1").is_err());
        assert!(parse_notes("c:100:1").is_err());
        assert!(parse_notes("").unwrap().is_empty());
    }
}
