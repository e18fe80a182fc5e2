//! Sample block decoder and PCM to ADPCM conversion

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::byte_stream::ByteStream;
use crate::errors::{ExtractError, SampleError};
use crate::names::asm_identifier;
use crate::Diagnostics;

use adpcm::{encode_adpcm_a, encode_adpcm_b, BLOCK_SIZE};

const SAMPLE_BLOCK_TAG: &[u8; 4] = b"SMP2";

const STYPE_ADPCM_A: u8 = 5;
const STYPE_ADPCM_B: u8 = 6;
const STYPE_PCM16: u8 = 16;

/// Storage encoding of a sample payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleCodec {
    AdpcmA,
    AdpcmB,
    Pcm16,
}

pub struct Sample {
    /// Assembly-safe identifier derived from the sample name.
    pub name: String,
    pub data: Vec<u8>,
    pub codec: SampleCodec,
    pub looping: bool,
}

/// Zero bytes needed to grow `data_bytes` to the next 256-byte boundary.
///
/// The YM2610 addresses sample start/stop in 256-byte units, so ADPCM
/// payloads must be block aligned.
fn block_padding(data_bytes: usize) -> usize {
    if data_bytes % BLOCK_SIZE == 0 {
        0
    } else {
        (data_bytes / BLOCK_SIZE + 1) * BLOCK_SIZE - data_bytes
    }
}

pub fn read_sample(bs: &mut ByteStream, diag: &mut Diagnostics) -> Result<Sample, SampleError> {
    let pos = bs.pos();
    if bs.read(4)? != SAMPLE_BLOCK_TAG {
        return Err(SampleError::NotASampleBlock(pos));
    }
    bs.read_u32()?; // declared block size, trusted

    let name = asm_identifier(&bs.read_string()?);

    // Number of compressed units for ADPCM, number of samples for PCM.
    let length = bs.read_u32()?;

    bs.read_u32()?; // legacy compatibility frequency
    bs.read_u32()?; // native rate, not validated

    let stype = bs.read_u8()?;
    let (codec, data_bytes, padding) = match stype {
        STYPE_ADPCM_A | STYPE_ADPCM_B => {
            if length % 2 != 0 {
                return Err(SampleError::OddAdpcmSampleCount { name, length });
            }
            let data_bytes = length as usize / 2;
            let padding = block_padding(data_bytes);
            if padding != 0 {
                diag.note(format!(
                    "length of sample '{}' ({} bytes) is not a multiple of {} bytes, padding added",
                    name, data_bytes, BLOCK_SIZE
                ));
            }

            let codec = match stype {
                STYPE_ADPCM_A => SampleCodec::AdpcmA,
                _ => SampleCodec::AdpcmB,
            };
            (codec, data_bytes, padding)
        }
        STYPE_PCM16 => {
            // padding is added when the sample is converted to ADPCM
            (SampleCodec::Pcm16, length as usize * 2, 0)
        }
        _ => return Err(SampleError::UnsupportedSampleType { name, stype }),
    };

    bs.read_u8()?; // loop direction
    bs.read_u16()?; // flags
    let loop_start = bs.read_i32()?;
    let loop_end = bs.read_i32()?;
    bs.skip(16)?; // ROM allocation

    let mut data = bs.read(data_bytes)?.to_vec();
    data.resize(data_bytes + padding, 0);

    Ok(Sample {
        name,
        data,
        codec,
        looping: loop_start != -1 && loop_end != -1,
    })
}

pub fn read_samples(
    pointers: &[u32],
    bs: &mut ByteStream,
    diag: &mut Diagnostics,
) -> Result<Vec<Sample>, ExtractError> {
    pointers
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            bs.seek(p as usize);
            read_sample(bs, diag).map_err(|e| ExtractError::Sample(i, e))
        })
        .collect()
}

/// Convert a PCM sample to the given ADPCM encoding.
///
/// Produces a new `Sample`; the caller replaces the original entry so
/// every instrument referencing the sample index sees the conversion.
pub fn convert_sample(sample: &Sample, target: SampleCodec) -> Sample {
    debug_assert!(sample.codec == SampleCodec::Pcm16);

    let pcm: Vec<i16> = sample
        .data
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();

    let nibbles = match target {
        SampleCodec::AdpcmA => encode_adpcm_a(&pcm),
        SampleCodec::AdpcmB => encode_adpcm_b(&pcm),
        SampleCodec::Pcm16 => panic!("cannot convert PCM to PCM"),
    };

    // first nibble goes in the high four bits
    let mut data: Vec<u8> = nibbles
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair.get(1).copied().unwrap_or(0))
        .collect();
    data.resize(data.len() + block_padding(data.len()), 0);

    Sample {
        name: sample.name.clone(),
        data,
        codec: target,
        looping: sample.looping,
    }
}

/// A module may carry PCM samples no instrument references.  Convert
/// them to ADPCM-A so the sample map never contains raw PCM.
pub fn convert_unused_samples(samples: &mut [Sample], diag: &mut Diagnostics) {
    for s in samples.iter_mut() {
        if s.codec == SampleCodec::Pcm16 {
            diag.note(format!(
                "sample '{}' is not referenced by any instrument, converting to ADPCM-A",
                s.name
            ));
            *s = convert_sample(s, SampleCodec::AdpcmA);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block(name: &str, length: u32, stype: u8, loop_markers: (i32, i32)) -> Vec<u8> {
        let mut bs = ByteStream::default();

        bs.write_bytes(SAMPLE_BLOCK_TAG);
        bs.write_u32(0); // block size
        bs.write_bytes(name.as_bytes());
        bs.write_u8(0);
        bs.write_u32(length);
        bs.write_u32(8000); // compatibility frequency
        bs.write_u32(18500); // native rate
        bs.write_u8(stype);
        bs.write_u8(0); // loop direction
        bs.write_u16(0); // flags
        bs.write_i32(loop_markers.0);
        bs.write_i32(loop_markers.1);
        bs.write_bytes(&[0; 16]);

        let data_bytes = match stype {
            STYPE_PCM16 => length as usize * 2,
            _ => length as usize / 2,
        };
        bs.write_bytes(&vec![0xab; data_bytes]);

        bs.into_bytes()
    }

    fn read(data: Vec<u8>) -> Result<Sample, SampleError> {
        read_sample(&mut ByteStream::new(data), &mut Diagnostics::default())
    }

    #[test]
    fn adpcm_a_padding() {
        // payload byte counts 255, 256 and 257 pad by 1, 0 and 255
        for (length, padding) in [(510, 1), (512, 0), (514, 255)] {
            let s = read(sample_block("kick", length, STYPE_ADPCM_A, (-1, -1))).unwrap();

            assert_eq!(s.codec, SampleCodec::AdpcmA);
            assert_eq!(s.data.len(), length as usize / 2 + padding);
            assert_eq!(s.data.len() % BLOCK_SIZE, 0);

            // padding is zero filled
            if padding > 0 {
                assert!(s.data[length as usize / 2..].iter().all(|&b| b == 0));
            }
        }
    }

    #[test]
    fn pcm_sample_is_not_padded() {
        let s = read(sample_block("voice", 100, STYPE_PCM16, (-1, -1))).unwrap();

        assert_eq!(s.codec, SampleCodec::Pcm16);
        assert_eq!(s.data.len(), 200);
        assert!(!s.looping);
    }

    #[test]
    fn loop_flag_requires_both_markers() {
        let looped = read(sample_block("a", 512, STYPE_ADPCM_B, (0, 400))).unwrap();
        assert!(looped.looping);

        let half = read(sample_block("b", 512, STYPE_ADPCM_B, (0, -1))).unwrap();
        assert!(!half.looping);
    }

    #[test]
    fn unknown_sample_type_is_fatal() {
        let r = read(sample_block("weird", 16, 9, (-1, -1)));

        assert!(matches!(
            r,
            Err(SampleError::UnsupportedSampleType { stype: 9, .. })
        ));
    }

    #[test]
    fn odd_adpcm_length_is_fatal() {
        let r = read(sample_block("odd", 511, STYPE_ADPCM_A, (-1, -1)));

        assert!(matches!(r, Err(SampleError::OddAdpcmSampleCount { .. })));
    }

    #[test]
    fn sample_names_are_sanitized() {
        let s = read(sample_block("Kick Drum #1", 512, STYPE_ADPCM_A, (-1, -1))).unwrap();

        assert_eq!(s.name, "kick_drum__1");
    }

    #[test]
    fn convert_pcm_packs_nibbles_and_pads() {
        let pcm: Vec<u8> = (0..32u16).flat_map(|i| (i as i16 * 256).to_le_bytes()).collect();
        let sample = Sample {
            name: "tom".to_owned(),
            data: pcm,
            codec: SampleCodec::Pcm16,
            looping: true,
        };

        let converted = convert_sample(&sample, SampleCodec::AdpcmA);

        assert_eq!(converted.name, "tom");
        assert_eq!(converted.codec, SampleCodec::AdpcmA);
        assert!(converted.looping);

        // 32 samples -> 32 nibbles -> 16 bytes, padded to one block
        assert_eq!(converted.data.len(), BLOCK_SIZE);
        assert!(converted.data[16..].iter().all(|&b| b == 0));
    }

    #[test]
    fn convert_unused_samples_removes_pcm() {
        let mut samples = vec![Sample {
            name: "stray".to_owned(),
            data: vec![0; 64],
            codec: SampleCodec::Pcm16,
            looping: false,
        }];

        let mut diag = Diagnostics::default();
        convert_unused_samples(&mut samples, &mut diag);

        assert_eq!(samples[0].codec, SampleCodec::AdpcmA);
        assert_eq!(diag.messages().len(), 1);
    }
}
