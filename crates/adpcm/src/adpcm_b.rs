//! YM2610 ADPCM-B encoder/decoder
//!
//! ADPCM-B (the "delta-T" channel) works on full 16-bit samples and
//! rescales its step size multiplicatively after every nibble.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::{dequantize, quantize_delta, NIBBLE_MAGNITUDE_MASK};

/// Per-magnitude step scale, in 1/64 units.
const STEP_SCALE: [i32; 8] = [57, 57, 57, 57, 77, 102, 128, 153];

const STEP_MIN: i32 = 127;
const STEP_MAX: i32 = 24576;

struct AdpcmBState {
    predictor: i32,
    step: i32,
}

impl Default for AdpcmBState {
    fn default() -> Self {
        Self {
            predictor: 0,
            step: STEP_MIN,
        }
    }
}

impl AdpcmBState {
    fn advance(&mut self, nibble: u8) {
        self.predictor += dequantize(nibble, self.step);
        self.predictor = self
            .predictor
            .clamp(i32::from(i16::MIN), i32::from(i16::MAX));

        self.step = self.step * STEP_SCALE[usize::from(nibble & NIBBLE_MAGNITUDE_MASK)] / 64;
        self.step = self.step.clamp(STEP_MIN, STEP_MAX);
    }

    fn encode_sample(&mut self, sample: i16) -> u8 {
        let nibble = quantize_delta(i32::from(sample) - self.predictor, self.step);
        self.advance(nibble);
        nibble
    }

    fn decode_nibble(&mut self, nibble: u8) -> i16 {
        self.advance(nibble);
        self.predictor as i16
    }
}

/// Encode signed 16-bit PCM samples, one ADPCM-B nibble per sample.
pub fn encode_adpcm_b(samples: &[i16]) -> Vec<u8> {
    let mut state = AdpcmBState::default();

    samples.iter().map(|&s| state.encode_sample(s)).collect()
}

/// Decode ADPCM-B nibbles back into 16-bit PCM.
pub fn decode_adpcm_b(nibbles: &[u8]) -> Vec<i16> {
    let mut state = AdpcmBState::default();

    nibbles.iter().map(|&n| state.decode_nibble(n)).collect()
}
