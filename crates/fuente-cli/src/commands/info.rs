//! Display the structure of the font built from a sample.

use super::common::SourceArgs;
use clap::Args;
use fuente_synth::{SoundFontGraph, Zone, ZoneRange};

/// Show presets, zones and generators.
#[derive(Args)]
pub struct InfoArgs {
    #[command(flatten)]
    source: SourceArgs,
}

/// Run the info command.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let data = args.source.build_font()?;
    let graph = SoundFontGraph::build(&data)?;

    println!("Presets: {}", graph.presets().len());
    for preset in graph.presets() {
        println!(
            "  {:03}:{:03} {} ({} zones)",
            preset.bank(),
            preset.program(),
            preset.name(),
            preset.zones().len()
        );
        for zone in preset.zones() {
            print_zone(zone, "    ");
        }
    }

    println!("Instruments: {}", graph.instruments().len());
    for instrument in graph.instruments() {
        println!("  {} ({} zones)", instrument.name(), instrument.zones().len());
        for zone in instrument.zones() {
            print_zone(zone, "    ");
        }
    }

    println!("Samples: {}", graph.samples().len());
    for sample in graph.samples() {
        let seconds = sample.len() as f64 / f64::from(sample.sample_rate());
        println!(
            "  {}: {} frames at {} Hz ({:.3}s), root key {}, correction {} cents, loop {}..{}",
            sample.name(),
            sample.len(),
            sample.sample_rate(),
            seconds,
            sample.original_key(),
            sample.correction(),
            sample.loop_start(),
            sample.loop_end()
        );
    }
    Ok(())
}

fn print_zone(zone: &Zone, indent: &str) {
    println!(
        "{indent}{:?} keys {} velocities {}",
        zone.kind(),
        range(zone.key_range()),
        range(zone.velocity_range())
    );
    for (index, amount) in zone.generators() {
        println!("{indent}  {:<24} {}", index.name(), amount.signed());
    }
    if !zone.modulators().is_empty() {
        println!("{indent}  {} modulators", zone.modulators().len());
    }
}

fn range(range: ZoneRange) -> String {
    format!("{}-{}", range.low, range.high)
}
