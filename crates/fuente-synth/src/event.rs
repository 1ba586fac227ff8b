//! Events accepted by the engine.

/// A channel message or engine command.
///
/// Channels are 0-based (0..=15). Values outside their MIDI range are clamped
/// when applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    /// Start a note. Velocity 0 is a note-off.
    NoteOn {
        /// MIDI channel.
        channel: u8,
        /// Key, 0..=127.
        key: u8,
        /// Velocity, 1..=127.
        velocity: u8,
    },
    /// Release a note.
    NoteOff {
        /// MIDI channel.
        channel: u8,
        /// Key, 0..=127.
        key: u8,
    },
    /// Controller change.
    ControlChange {
        /// MIDI channel.
        channel: u8,
        /// Controller number, 0..=127.
        controller: u8,
        /// Value, 0..=127.
        value: u8,
    },
    /// Pitch wheel, 0..=16383 with 8192 centered.
    PitchBend {
        /// MIDI channel.
        channel: u8,
        /// 14-bit wheel position.
        value: u16,
    },
    /// Channel (aftertouch) pressure.
    ChannelPressure {
        /// MIDI channel.
        channel: u8,
        /// Pressure, 0..=127.
        value: u8,
    },
    /// Polyphonic key pressure.
    PolyPressure {
        /// MIDI channel.
        channel: u8,
        /// Key, 0..=127.
        key: u8,
        /// Pressure, 0..=127.
        value: u8,
    },
    /// Program change; the bank comes from CC0.
    ProgramChange {
        /// MIDI channel.
        channel: u8,
        /// Program, 0..=127.
        program: u8,
    },
    /// Select the preset with this bank and program.
    SelectPreset {
        /// Bank number.
        bank: u16,
        /// Program number.
        program: u16,
    },
    /// Select a preset by its position in the sorted preset list.
    SelectPresetIndex(usize),
    /// Finish every voice and clear the active keys.
    Reset,
}

impl MidiEvent {
    /// Decode a MIDI 1.0 channel voice message.
    ///
    /// Returns `None` for system messages, running status, and truncated input.
    ///
    /// ```rust
    /// use fuente_synth::MidiEvent;
    ///
    /// assert_eq!(
    ///     MidiEvent::from_bytes(&[0x91, 60, 100]),
    ///     Some(MidiEvent::NoteOn { channel: 1, key: 60, velocity: 100 })
    /// );
    /// assert_eq!(
    ///     MidiEvent::from_bytes(&[0x90, 60, 0]),
    ///     Some(MidiEvent::NoteOff { channel: 0, key: 60 })
    /// );
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        if !(0x80..0xf0).contains(&status) {
            return None;
        }
        let channel = status & 0x0f;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7f);

        let event = match status & 0xf0 {
            0x80 => MidiEvent::NoteOff {
                channel,
                key: data(1)?,
            },
            0x90 => {
                let key = data(1)?;
                match data(2)? {
                    0 => MidiEvent::NoteOff { channel, key },
                    velocity => MidiEvent::NoteOn {
                        channel,
                        key,
                        velocity,
                    },
                }
            }
            0xa0 => MidiEvent::PolyPressure {
                channel,
                key: data(1)?,
                value: data(2)?,
            },
            0xb0 => MidiEvent::ControlChange {
                channel,
                controller: data(1)?,
                value: data(2)?,
            },
            0xc0 => MidiEvent::ProgramChange {
                channel,
                program: data(1)?,
            },
            0xd0 => MidiEvent::ChannelPressure {
                channel,
                value: data(1)?,
            },
            0xe0 => MidiEvent::PitchBend {
                channel,
                value: u16::from(data(1)?) | (u16::from(data(2)?) << 7),
            },
            _ => return None,
        };
        Some(event)
    }

    /// MIDI channel of a channel message; `None` for engine commands.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ChannelPressure { channel, .. }
            | MidiEvent::PolyPressure { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => Some(channel),
            MidiEvent::SelectPreset { .. } | MidiEvent::SelectPresetIndex(_) | MidiEvent::Reset => None,
        }
    }
}

/// An event scheduled at a frame offset within a render block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    /// Frame offset from the start of the block.
    pub frame: usize,
    /// The event.
    pub event: MidiEvent,
}

impl TimedEvent {
    /// Schedule `event` at `frame`.
    pub fn new(frame: usize, event: MidiEvent) -> Self {
        Self { frame, event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_channel_messages() {
        assert_eq!(
            MidiEvent::from_bytes(&[0x80, 60, 64]),
            Some(MidiEvent::NoteOff { channel: 0, key: 60 })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xb3, 7, 100]),
            Some(MidiEvent::ControlChange {
                channel: 3,
                controller: 7,
                value: 100
            })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xc0, 5]),
            Some(MidiEvent::ProgramChange { channel: 0, program: 5 })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xd2, 90]),
            Some(MidiEvent::ChannelPressure { channel: 2, value: 90 })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xa0, 60, 30]),
            Some(MidiEvent::PolyPressure {
                channel: 0,
                key: 60,
                value: 30
            })
        );
    }

    #[test]
    fn test_decode_pitch_bend() {
        assert_eq!(
            MidiEvent::from_bytes(&[0xe0, 0x00, 0x40]),
            Some(MidiEvent::PitchBend { channel: 0, value: 8192 })
        );
        assert_eq!(
            MidiEvent::from_bytes(&[0xe0, 0x7f, 0x7f]),
            Some(MidiEvent::PitchBend { channel: 0, value: 16383 })
        );
    }

    #[test]
    fn test_rejects_non_channel_and_short_messages() {
        assert_eq!(MidiEvent::from_bytes(&[]), None);
        assert_eq!(MidiEvent::from_bytes(&[60, 100]), None);
        assert_eq!(MidiEvent::from_bytes(&[0xf8]), None);
        assert_eq!(MidiEvent::from_bytes(&[0x90, 60]), None);
    }

    #[test]
    fn test_channel() {
        assert_eq!(MidiEvent::NoteOff { channel: 9, key: 1 }.channel(), Some(9));
        assert_eq!(MidiEvent::Reset.channel(), None);
    }
}
