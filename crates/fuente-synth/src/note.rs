//! MIDI note numbers and their labels.

use core::fmt;

const NAMES: [&str; 12] = ["C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B"];

/// A MIDI note number, 0..=127.
///
/// ```rust
/// use fuente_synth::Note;
///
/// assert_eq!(Note(60).label(), "C4");
/// assert_eq!(Note(61).label(), "C4♯");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Note(pub u8);

impl Note {
    /// Middle C.
    pub const MIDDLE_C: Note = Note(60);

    /// Note name with octave, middle C being `C4`. Sharps follow the octave (`C4♯`).
    pub fn label(self) -> String {
        let name = NAMES[usize::from(self.0 % 12)];
        let octave = i32::from(self.0 / 12) - 1;
        match name.strip_suffix('♯') {
            Some(letter) => format!("{letter}{octave}♯"),
            None => format!("{name}{octave}"),
        }
    }

    /// Frequency in Hz in equal temperament with A4 = 440 Hz.
    pub fn frequency(self) -> f64 {
        fuente_core::cents_to_hz(f64::from(self.0) * 100.0)
    }
}

impl From<u8> for Note {
    fn from(value: u8) -> Self {
        Note(value.min(127))
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
