//! WAV file I/O for fuente.
//!
//! - [`read_wav_mono`] loads a WAV file as 16-bit mono PCM, the sample format
//!   SoundFont 2 sample data uses
//! - [`write_wav_stereo`] saves rendered left/right buffers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fuente_io::{read_wav_mono, write_wav_stereo, WavSpec};
//!
//! let (pcm, spec) = read_wav_mono("piano_c4.wav")?;
//! // ... build a font from `pcm` and render into `left` / `right` ...
//! write_wav_stereo("out.wav", &left, &right, WavSpec { sample_rate: spec.sample_rate, ..Default::default() })?;
//! ```

mod wav;

pub use wav::{WavSpec, read_wav_mono, write_wav_stereo};

/// Error types for WAV I/O.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The file's sample format cannot be converted.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for WAV I/O.
pub type Result<T> = std::result::Result<T, Error>;
