//! Print note labels.

use clap::Args;
use fuente_synth::Note;

#[derive(Args)]
pub struct NoteArgs {
    /// MIDI note number (0-127)
    #[arg(value_parser = clap::value_parser!(u8).range(0..=127))]
    key: u8,
}

pub fn run(args: NoteArgs) -> anyhow::Result<()> {
    let note = Note(args.key);
    println!("{} {} {:.3} Hz", note.0, note, note.frequency());
    Ok(())
}
