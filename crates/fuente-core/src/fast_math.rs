//! Fast mathematical approximations for control-rate signals.
//!
//! Each function documents its maximum error and valid input range.
//!
//! | Function | Replaces | Use case | Max error |
//! |----------|----------|----------|-----------|
//! | [`parabolic_sine`] | `libm::sinf` | LFO shapes | < 0.0011 |

use core::f32::consts::PI;

const B: f32 = 4.0 / PI;
const C: f32 = -4.0 / (PI * PI);
const P: f32 = 0.225;

/// Sine approximation built from two parabolas.
///
/// A first parabola `y = B·θ + C·θ·|θ|` matches sine at 0, ±π/2 and ±π;
/// a second pass `P·y·(|y| - 1) + y` pulls the curve towards the true sine.
///
/// # Accuracy
///
/// Maximum absolute error ≈ 0.0011 over θ ∈ \[-π, π\]. Outside that range
/// the result is meaningless; wrap the angle first.
///
/// # Examples
///
/// ```
/// use fuente_core::fast_math::parabolic_sine;
///
/// assert!(parabolic_sine(0.0).abs() < 1e-6);
/// assert!((parabolic_sine(core::f32::consts::FRAC_PI_2) - 1.0).abs() < 0.002);
/// ```
#[inline]
pub fn parabolic_sine(theta: f32) -> f32 {
    let y = B * theta + C * theta * theta.abs();
    P * y * (y.abs() - 1.0) + y
}
