//! SoundFont generator definitions.
//!
//! A generator is one voice parameter (an envelope time, a pitch offset, the
//! sample to play). Zones carry `(index, amount)` pairs; a voice holds one
//! value per index. Every index has a fixed default, a value kind that says
//! how its 16-bit amount is read, and a flag saying whether preset zones may
//! refine it.

use core::fmt;

/// How the 16-bit amount of a generator is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Sample offset in samples.
    Offset,
    /// Sample offset in units of 32768 samples.
    CoarseOffset,
    /// Signed pitch cents.
    SignedCents,
    /// Signed centibels.
    SignedCentsBel,
    /// Plain signed value.
    SignedShort,
    /// Plain unsigned value.
    UnsignedShort,
    /// Unsigned tenths of a percent.
    UnsignedPercent,
    /// Signed tenths of a percent.
    SignedPercent,
    /// Absolute frequency in cents.
    SignedFrequencyCents,
    /// Time in timecents.
    SignedTimeCents,
    /// Signed semitones.
    SignedSemitones,
    /// `(low, high)` byte pair.
    Range,
}

impl ValueKind {
    /// True when the amount is read as an unsigned 16-bit value.
    pub fn is_unsigned(self) -> bool {
        matches!(self, ValueKind::UnsignedShort | ValueKind::UnsignedPercent)
    }
}

/// The 16-bit generator amount union.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GeneratorAmount(u16);

impl GeneratorAmount {
    /// Wrap a raw 16-bit amount.
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Build from a signed amount.
    pub const fn from_signed(value: i16) -> Self {
        Self(value as u16)
    }

    /// Build a `(low, high)` range amount.
    pub const fn from_range(low: u8, high: u8) -> Self {
        Self(low as u16 | ((high as u16) << 8))
    }

    /// Raw bits.
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Amount as a signed integer.
    pub const fn signed(self) -> i16 {
        self.0 as i16
    }

    /// Amount as an unsigned integer.
    pub const fn unsigned(self) -> u16 {
        self.0
    }

    /// Amount as a `(low, high)` pair; the low byte comes first.
    pub const fn range(self) -> (u8, u8) {
        ((self.0 & 0xff) as u8, (self.0 >> 8) as u8)
    }
}

/// Canonical SoundFont generator indices.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum GeneratorIndex {
    StartAddrsOffset = 0,
    EndAddrsOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeynumToModEnvHold = 31,
    KeynumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeynumToVolEnvHold = 39,
    KeynumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    Keynum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    EndOper = 60,
}

struct Definition {
    name: &'static str,
    kind: ValueKind,
    preset: bool,
    default: i32,
}

const fn def(name: &'static str, kind: ValueKind, preset: bool, default: i32) -> Definition {
    Definition {
        name,
        kind,
        preset,
        default,
    }
}

/// Default of every delay/attack/hold/decay/release time, in timecents.
const DEFAULT_TIME: i32 = -12000;

use ValueKind as K;

const DEFINITIONS: [Definition; GeneratorIndex::COUNT] = [
    def("startAddrsOffset", K::Offset, false, 0),
    def("endAddrsOffset", K::Offset, false, 0),
    def("startloopAddrsOffset", K::Offset, false, 0),
    def("endloopAddrsOffset", K::Offset, false, 0),
    def("startAddrsCoarseOffset", K::CoarseOffset, false, 0),
    def("modLfoToPitch", K::SignedCents, true, 0),
    def("vibLfoToPitch", K::SignedCents, true, 0),
    def("modEnvToPitch", K::SignedCents, true, 0),
    def("initialFilterFc", K::SignedFrequencyCents, true, 13500),
    def("initialFilterQ", K::SignedCentsBel, true, 0),
    def("modLfoToFilterFc", K::SignedShort, true, 0),
    def("modEnvToFilterFc", K::SignedShort, true, 0),
    def("endAddrsCoarseOffset", K::CoarseOffset, false, 0),
    def("modLfoToVolume", K::SignedCentsBel, true, 0),
    def("unused1", K::SignedShort, false, 0),
    def("chorusEffectsSend", K::UnsignedPercent, true, 0),
    def("reverbEffectsSend", K::UnsignedPercent, true, 0),
    def("pan", K::SignedPercent, true, 0),
    def("unused2", K::UnsignedShort, false, 0),
    def("unused3", K::UnsignedShort, false, 0),
    def("unused4", K::UnsignedShort, false, 0),
    def("delayModLFO", K::SignedTimeCents, true, DEFAULT_TIME),
    def("freqModLFO", K::SignedFrequencyCents, true, 0),
    def("delayVibLFO", K::SignedTimeCents, true, DEFAULT_TIME),
    def("freqVibLFO", K::SignedFrequencyCents, true, 0),
    def("delayModEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("attackModEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("holdModEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("decayModEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("sustainModEnv", K::UnsignedPercent, true, 0),
    def("releaseModEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("keynumToModEnvHold", K::SignedShort, true, 0),
    def("keynumToModEnvDecay", K::SignedShort, true, 0),
    def("delayVolEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("attackVolEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("holdVolEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("decayVolEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("sustainVolEnv", K::SignedCentsBel, true, 0),
    def("releaseVolEnv", K::SignedTimeCents, true, DEFAULT_TIME),
    def("keynumToVolEnvHold", K::SignedShort, true, 0),
    def("keynumToVolEnvDecay", K::SignedShort, true, 0),
    def("instrument", K::UnsignedShort, true, 0),
    def("reserved1", K::SignedShort, false, 0),
    def("keyRange", K::Range, true, 0),
    def("velRange", K::Range, true, 0),
    def("startloopAddrsCoarseOffset", K::CoarseOffset, false, 0),
    def("keynum", K::SignedShort, false, -1),
    def("velocity", K::SignedShort, false, -1),
    def("initialAttenuation", K::SignedCentsBel, true, 0),
    def("reserved2", K::UnsignedShort, false, 0),
    def("endloopAddrsCoarseOffset", K::CoarseOffset, false, 0),
    def("coarseTune", K::SignedSemitones, true, 0),
    def("fineTune", K::SignedCents, true, 0),
    def("sampleID", K::UnsignedShort, false, 0),
    def("sampleModes", K::UnsignedShort, false, 0),
    def("reserved3", K::SignedShort, false, 0),
    def("scaleTuning", K::UnsignedShort, true, 100),
    def("exclusiveClass", K::UnsignedShort, false, 0),
    def("overridingRootKey", K::SignedShort, false, -1),
    def("unused5", K::SignedShort, false, 0),
    def("endOper", K::SignedShort, false, 0),
];

impl GeneratorIndex {
    /// Number of canonical indices (0..=60).
    pub const COUNT: usize = 61;

    /// Look up a raw index. Unknown indices yield `None` and are ignored by zones.
    pub fn from_raw(raw: u16) -> Option<Self> {
        use GeneratorIndex as G;
        const ALL: [GeneratorIndex; GeneratorIndex::COUNT] = [
            G::StartAddrsOffset,
            G::EndAddrsOffset,
            G::StartloopAddrsOffset,
            G::EndloopAddrsOffset,
            G::StartAddrsCoarseOffset,
            G::ModLfoToPitch,
            G::VibLfoToPitch,
            G::ModEnvToPitch,
            G::InitialFilterFc,
            G::InitialFilterQ,
            G::ModLfoToFilterFc,
            G::ModEnvToFilterFc,
            G::EndAddrsCoarseOffset,
            G::ModLfoToVolume,
            G::Unused1,
            G::ChorusEffectsSend,
            G::ReverbEffectsSend,
            G::Pan,
            G::Unused2,
            G::Unused3,
            G::Unused4,
            G::DelayModLfo,
            G::FreqModLfo,
            G::DelayVibLfo,
            G::FreqVibLfo,
            G::DelayModEnv,
            G::AttackModEnv,
            G::HoldModEnv,
            G::DecayModEnv,
            G::SustainModEnv,
            G::ReleaseModEnv,
            G::KeynumToModEnvHold,
            G::KeynumToModEnvDecay,
            G::DelayVolEnv,
            G::AttackVolEnv,
            G::HoldVolEnv,
            G::DecayVolEnv,
            G::SustainVolEnv,
            G::ReleaseVolEnv,
            G::KeynumToVolEnvHold,
            G::KeynumToVolEnvDecay,
            G::Instrument,
            G::Reserved1,
            G::KeyRange,
            G::VelRange,
            G::StartloopAddrsCoarseOffset,
            G::Keynum,
            G::Velocity,
            G::InitialAttenuation,
            G::Reserved2,
            G::EndloopAddrsCoarseOffset,
            G::CoarseTune,
            G::FineTune,
            G::SampleId,
            G::SampleModes,
            G::Reserved3,
            G::ScaleTuning,
            G::ExclusiveClass,
            G::OverridingRootKey,
            G::Unused5,
            G::EndOper,
        ];
        ALL.get(usize::from(raw)).copied()
    }

    /// Raw index value.
    #[inline]
    pub const fn raw(self) -> u16 {
        self as u16
    }

    /// Slot position in a voice's generator vector.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    fn definition(self) -> &'static Definition {
        &DEFINITIONS[self.index()]
    }

    /// SoundFont name of the generator.
    pub fn name(self) -> &'static str {
        self.definition().name
    }

    /// How the amount is interpreted.
    pub fn kind(self) -> ValueKind {
        self.definition().kind
    }

    /// Whether preset zones may carry this generator.
    pub fn is_available_in_preset(self) -> bool {
        self.definition().preset
    }

    /// Whether a preset zone's amount is added to the voice value.
    ///
    /// Ranges and the instrument link only select zones; they are not voice parameters.
    pub fn is_refinable(self) -> bool {
        self.is_available_in_preset()
            && self.kind() != ValueKind::Range
            && self != GeneratorIndex::Instrument
    }

    /// SoundFont default value.
    pub fn default_value(self) -> i32 {
        self.definition().default
    }

    /// Read `amount` according to this generator's value kind.
    pub fn convert(self, amount: GeneratorAmount) -> i32 {
        if self.kind().is_unsigned() {
            i32::from(amount.unsigned())
        } else {
            i32::from(amount.signed())
        }
    }
}

impl fmt::Display for GeneratorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
