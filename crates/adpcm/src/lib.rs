//! YM2610 ADPCM codec library
//!
//! Both encoders take signed 16-bit PCM samples and output one unsigned
//! nibble (0-15) per input sample.  Nibble packing and block alignment
//! are the caller's responsibility.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

mod adpcm_a;
mod adpcm_b;

pub use adpcm_a::{decode_adpcm_a, encode_adpcm_a};
pub use adpcm_b::{decode_adpcm_b, encode_adpcm_b};

/// The YM2610 addresses ADPCM sample regions in 256-byte units.
pub const BLOCK_SIZE: usize = 256;

const NIBBLE_SIGN_BIT: u8 = 0x08;
const NIBBLE_MAGNITUDE_MASK: u8 = 0x07;

/// Quantize one delta against the current step size.
///
/// Returns a sign+magnitude nibble: bit 3 is the sign, bits 0-2 are
/// `min(7, |delta| * 4 / step)`.
fn quantize_delta(delta: i32, step: i32) -> u8 {
    debug_assert!(step > 0);

    let mut nibble = ((delta.abs() << 2) / step).min(7) as u8;
    if delta < 0 {
        nibble |= NIBBLE_SIGN_BIT;
    }
    nibble
}

/// Reconstruct the quantized delta from a nibble (both chips use the
/// same `(2n + 1) * step / 8` reconstruction).
fn dequantize(nibble: u8, step: i32) -> i32 {
    let magnitude = i32::from(nibble & NIBBLE_MAGNITUDE_MASK);
    let delta = ((2 * magnitude + 1) * step) >> 3;

    if nibble & NIBBLE_SIGN_BIT != 0 {
        -delta
    } else {
        delta
    }
}
