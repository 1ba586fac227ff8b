//! Power-of-two circular delay buffer.
//!
//! The capacity is always a power of two so wrapping is a bit mask instead
//! of a modulo, and no read can land outside the buffer.
//!
//! # Reads
//!
//! [`DelayBuffer::read`] takes a fractional delay and blends the two stored
//! samples around it linearly:
//!
//! ```text
//! y1 = buffer[(write_pos - floor(delay)) & mask]
//! y2 = buffer[(write_pos - floor(delay) - 1) & mask]
//! out = y1 * (1 - frac) + y2 * frac
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Circular buffer with fractional, linearly interpolated reads.
///
/// The buffer is allocated once at construction and never reallocates.
///
/// # Example
///
/// ```rust
/// use fuente_core::DelayBuffer;
///
/// let mut delay = DelayBuffer::new(100.0);
/// assert_eq!(delay.size(), 128);
///
/// delay.write(1.0);
/// delay.write(0.0);
/// // halfway between the newest sample (0.0) and the one before it (1.0)
/// assert_eq!(delay.read(1.5), 0.5);
/// ```
#[derive(Debug, Clone)]
pub struct DelayBuffer {
    buffer: Vec<f32>,
    write_pos: usize,
    mask: usize,
}

impl DelayBuffer {
    /// Create a zero-filled buffer holding at least `size_in_samples` samples.
    ///
    /// The capacity is rounded up to the next power of two ≥ max(size, 1).
    pub fn new(size_in_samples: f32) -> Self {
        let wanted = if size_in_samples.is_finite() && size_in_samples > 1.0 {
            libm::ceilf(size_in_samples) as usize
        } else {
            1
        };
        let capacity = wanted.next_power_of_two();
        Self {
            buffer: vec![0.0; capacity],
            write_pos: 0,
            mask: capacity - 1,
        }
    }

    /// Capacity in samples (always a power of two).
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Store `value` at the write position and advance it.
    #[inline]
    pub fn write(&mut self, value: f32) {
        self.buffer[self.write_pos] = value;
        self.write_pos = (self.write_pos + 1) & self.mask;
    }

    /// Read `delay` samples back from the write position with linear interpolation.
    ///
    /// `delay` is clamped to [0, size - 1].
    #[inline]
    pub fn read(&self, delay: f32) -> f32 {
        let delay = delay.clamp(0.0, self.mask as f32);
        let whole = delay as usize;
        let frac = delay - whole as f32;
        let y1 = self.at(whole);
        let y2 = self.at(whole + 1);
        y1 * (1.0 - frac) + y2 * frac
    }

    /// Zero the buffer and rewind the write position.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    #[inline]
    fn at(&self, offset: usize) -> f32 {
        self.buffer[self.write_pos.wrapping_sub(offset) & self.mask]
    }
}
