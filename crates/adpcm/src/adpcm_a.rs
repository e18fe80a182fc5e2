//! YM2610 ADPCM-A encoder/decoder
//!
//! ADPCM-A is a 49-step adaptive codec working in a 12-bit sample
//! domain.  16-bit PCM input is truncated to 12 bits before encoding.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::{dequantize, quantize_delta, NIBBLE_MAGNITUDE_MASK};

const STEP_SIZES: [i32; 49] = [
    16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66, 73, 80, 88, 97, 107, 118, 130,
    143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408, 449, 494, 544, 598, 658, 724, 796,
    876, 963, 1060, 1166, 1282, 1411, 1552,
];

const STEP_ADJUSTMENT: [i32; 8] = [-1, -1, -1, -1, 2, 5, 7, 9];

const PREDICTOR_MIN: i32 = -2048;
const PREDICTOR_MAX: i32 = 2047;

#[derive(Default)]
struct AdpcmAState {
    predictor: i32,
    step_index: i32,
}

impl AdpcmAState {
    fn step_size(&self) -> i32 {
        STEP_SIZES[self.step_index as usize]
    }

    /// Advance the predictor and step index exactly like the chip's
    /// playback circuit, so encoder and decoder never drift apart.
    fn advance(&mut self, nibble: u8) {
        let step = self.step_size();

        self.predictor += dequantize(nibble, step);
        self.predictor = self.predictor.clamp(PREDICTOR_MIN, PREDICTOR_MAX);

        self.step_index += STEP_ADJUSTMENT[usize::from(nibble & NIBBLE_MAGNITUDE_MASK)];
        self.step_index = self.step_index.clamp(0, STEP_SIZES.len() as i32 - 1);
    }

    fn encode_sample(&mut self, sample: i16) -> u8 {
        // 16-bit PCM to the chip's 12-bit domain
        let target = i32::from(sample) >> 4;

        let nibble = quantize_delta(target - self.predictor, self.step_size());
        self.advance(nibble);
        nibble
    }

    fn decode_nibble(&mut self, nibble: u8) -> i16 {
        self.advance(nibble);

        // back to the 16-bit domain
        (self.predictor << 4) as i16
    }
}

/// Encode signed 16-bit PCM samples, one ADPCM-A nibble per sample.
pub fn encode_adpcm_a(samples: &[i16]) -> Vec<u8> {
    let mut state = AdpcmAState::default();

    samples.iter().map(|&s| state.encode_sample(s)).collect()
}

/// Decode ADPCM-A nibbles back into 16-bit PCM.
pub fn decode_adpcm_a(nibbles: &[u8]) -> Vec<i16> {
    let mut state = AdpcmAState::default();

    nibbles.iter().map(|&n| state.decode_nibble(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_nibble_per_sample() {
        let samples = [0i16; 37];
        assert_eq!(encode_adpcm_a(&samples).len(), samples.len());
    }

    #[test]
    fn nibbles_are_four_bit() {
        let samples: Vec<i16> = (0..2000).map(|i| ((i * 977) % 65536 - 32768) as i16).collect();

        for n in encode_adpcm_a(&samples) {
            assert!(n <= 0x0f);
        }
    }

    #[test]
    fn silence_encodes_to_silence() {
        let encoded = encode_adpcm_a(&[0i16; 64]);
        let decoded = decode_adpcm_a(&encoded);

        for s in decoded {
            // predictor jitter stays within the smallest step
            assert!(s.abs() <= 64, "sample {} is not near-silent", s);
        }
    }

    #[test]
    fn slow_ramp_round_trips_closely() {
        let samples: Vec<i16> = (0..512).map(|i| (i * 16) as i16).collect();

        let decoded = decode_adpcm_a(&encode_adpcm_a(&samples));

        // Skip the attack portion where the step size is still adapting.
        for (s, d) in samples.iter().zip(&decoded).skip(16) {
            let error = (i32::from(*s) - i32::from(*d)).abs();
            assert!(error < 1024, "sample {} decoded as {}", s, d);
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let samples: Vec<i16> = (0..300).map(|i| ((i * 31) % 4096) as i16).collect();

        assert_eq!(encode_adpcm_a(&samples), encode_adpcm_a(&samples));
    }
}
