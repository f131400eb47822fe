//! Fixed-point math utilities for deterministic targeting.
//!
//! Target priority is compared across ships on every volley. Using
//! fixed-point keeps that ordering identical on every platform, so a
//! seeded battle replays the same way everywhere.

use fixed::types::I32F32;

/// Fixed-point number type for all combat math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Faces on a combat die.
pub const DIE_FACES: i32 = 6;

/// Probability that a single die hits an unshielded target.
///
/// A 6 always hits and a 1 always misses, so the chance is clamped to
/// `[1/6, 5/6]` whatever the computer bonus.
#[must_use]
pub fn hit_chance(computer: u32) -> Fixed {
    let faces = Fixed::from_num(DIE_FACES);
    let hitting = Fixed::from_num(computer.min(DIE_FACES as u32) + 1);
    let chance = hitting / faces;
    chance.clamp(Fixed::ONE / faces, Fixed::from_num(DIE_FACES - 1) / faces)
}
