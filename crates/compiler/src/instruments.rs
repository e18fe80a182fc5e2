//! Instrument block decoder
//!
//! Furnace stores each instrument as a tagged list of feature blocks.
//! Only the features the YM2610 driver consumes are decoded, the rest
//! are skipped with a warning.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::byte_stream::{bit_field, ByteStream};
use crate::errors::{ExtractError, InstrumentError};
use crate::names::asm_identifier;
use crate::samples::{convert_sample, Sample, SampleCodec};
use crate::ssg_macro::{read_ssg_macro, SsgMacro};
use crate::Diagnostics;

const INSTRUMENT_BLOCK_TAG: &[u8; 4] = b"INS2";
const MIN_FORMAT_VERSION: u16 = 127;

const KIND_FM: u16 = 1;
const KIND_SSG: u16 = 6;
const KIND_ADPCM_A: u16 = 37;
const KIND_ADPCM_B: u16 = 38;

/// All four operators carry data.
const FM_ALL_OPERATORS: u8 = 0xf4;

pub struct FmOperator {
    pub detune: u8,
    pub multiply: u8,
    pub total_level: u8,
    pub key_scale: u8,
    pub attack_rate: u8,
    pub am_on: u8,
    pub decay_rate: u8,
    pub kvs: u8,
    pub sustain_rate: u8,
    pub sustain_level: u8,
    pub release_rate: u8,
    pub ssg_eg: u8,
}

pub struct FmInstrument {
    pub name: String,
    pub algorithm: u8,
    pub feedback: u8,
    pub am_sense: u8,
    pub fm_sense: u8,

    /// Operators in the stream order, which is the chip's physical
    /// channel output order 1-3-2-4.
    pub ops: [FmOperator; 4],
}

pub struct AdpcmAInstrument {
    pub name: String,
    pub sample_index: usize,
}

pub struct AdpcmBInstrument {
    pub name: String,
    pub sample_index: usize,
    pub looping: bool,
}

pub enum Instrument {
    Fm(FmInstrument),
    Macro(SsgMacro),
    AdpcmA(AdpcmAInstrument),
    AdpcmB(AdpcmBInstrument),
}

impl Instrument {
    pub fn name(&self) -> &str {
        match self {
            Self::Fm(i) => &i.name,
            Self::Macro(m) => &m.name,
            Self::AdpcmA(i) => &i.name,
            Self::AdpcmB(i) => &i.name,
        }
    }
}

/// Furnace encodes detune as an unsigned 3-bit value biased by +3.
/// The YM2610 wants magnitude plus a direction bit (value 4).
fn convert_detune(raw: u8) -> u8 {
    let detune = i32::from(raw) - 3;

    if detune >= 1 {
        (detune as u8 - 1) | 0b100
    } else {
        detune.unsigned_abs() as u8
    }
}

fn read_fm_operator(bs: &mut ByteStream) -> Result<FmOperator, InstrumentError> {
    let b = bs.read_u8()?;
    let detune = convert_detune(bit_field(b, 6, 4));
    let multiply = bit_field(b, 3, 0);

    let total_level = bit_field(bs.read_u8()?, 6, 0);

    let b = bs.read_u8()?;
    let key_scale = bit_field(b, 7, 6);
    let attack_rate = bit_field(b, 4, 0);

    let b = bs.read_u8()?;
    let am_on = bit_field(b, 7, 7);
    let decay_rate = bit_field(b, 4, 0);

    let b = bs.read_u8()?;
    let kvs = bit_field(b, 6, 5);
    let sustain_rate = bit_field(b, 4, 0);

    let b = bs.read_u8()?;
    let sustain_level = bit_field(b, 7, 4);
    let release_rate = bit_field(b, 3, 0);

    let ssg_eg = bit_field(bs.read_u8()?, 3, 0);
    bs.read_u8()?; // unused

    Ok(FmOperator {
        detune,
        multiply,
        total_level,
        key_scale,
        attack_rate,
        am_on,
        decay_rate,
        kvs,
        sustain_rate,
        sustain_level,
        release_rate,
        ssg_eg,
    })
}

fn read_fm_voice(bs: &mut ByteStream) -> Result<FmInstrument, InstrumentError> {
    let marker = bs.read_u8()?;
    if marker != FM_ALL_OPERATORS {
        return Err(InstrumentError::MissingOperatorData(marker));
    }

    let b = bs.read_u8()?;
    let algorithm = bit_field(b, 6, 4);
    let feedback = bit_field(b, 2, 0);

    let b = bs.read_u8()?;
    let am_sense = bit_field(b, 4, 3);
    let fm_sense = bit_field(b, 2, 0);

    bs.read_u8()?; // unused

    let ops = [
        read_fm_operator(bs)?,
        read_fm_operator(bs)?,
        read_fm_operator(bs)?,
        read_fm_operator(bs)?,
    ];

    Ok(FmInstrument {
        name: String::new(),
        algorithm,
        feedback,
        am_sense,
        fm_sense,
        ops,
    })
}

pub fn read_instrument(
    nth: usize,
    bs: &mut ByteStream,
    samples: &mut [Sample],
    diag: &mut Diagnostics,
) -> Result<Instrument, InstrumentError> {
    let pos = bs.pos();
    if bs.read(4)? != INSTRUMENT_BLOCK_TAG {
        return Err(InstrumentError::NotAnInstrumentBlock(pos));
    }

    let length_pos = bs.pos();
    let end = length_pos + bs.read_u32()? as usize;

    let version = bs.read_u16()?;
    if version < MIN_FORMAT_VERSION {
        return Err(InstrumentError::UnsupportedFormatVersion(version));
    }

    let kind = bs.read_u16()?;
    if ![KIND_FM, KIND_SSG, KIND_ADPCM_A, KIND_ADPCM_B].contains(&kind) {
        return Err(InstrumentError::UnsupportedInstrumentKind(kind));
    }

    let mut name = String::new();
    let mut fm = None;
    let mut mac = None;
    // instruments without an SM feature use sample 0
    let mut sample_index: u16 = 0;

    while bs.pos() < end {
        let feature = [bs.read_u8()?, bs.read_u8()?];
        let length = bs.read_u16()?;

        match &feature {
            b"NA" => name = bs.read_string()?,
            b"FM" => fm = Some(read_fm_voice(bs)?),
            b"LD" => bs.skip(length.into())?, // unused OPL drum data
            b"SM" => {
                sample_index = bs.read_u16()?;
                bs.read_u16()?; // flags and waveform
            }
            b"MA" if kind == KIND_SSG => {
                mac = Some(read_ssg_macro(length.into(), bs, diag)?);
            }
            b"NE" => {
                // Present when the instrument triggers a raw PCM sample
                // instead of ADPCM playback.
                if bs.read_u8()? != 0 {
                    return Err(InstrumentError::PcmSampleMapUnsupported);
                }
            }
            _ => {
                diag.warn(format!(
                    "unexpected feature in instrument {:02x}{}: {}",
                    nth,
                    if name.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", name)
                    },
                    String::from_utf8_lossy(&feature)
                ));
                bs.skip(length.into())?;
            }
        }
    }

    match kind {
        KIND_FM => {
            let mut fm = fm.ok_or(InstrumentError::MissingVoiceParameters)?;
            fm.name = asm_identifier(&format!("instr_{:02x}_{}", nth, name));
            Ok(Instrument::Fm(fm))
        }
        KIND_SSG => {
            let mut mac = mac.ok_or(InstrumentError::MissingMacroData)?;
            mac.name = asm_identifier(&format!("macro_{:02x}_{}", nth, name));
            mac.load_name = asm_identifier(&format!("macro_{:02x}_load_func", nth));
            Ok(Instrument::Macro(mac))
        }
        _ => {
            let index = usize::from(sample_index);
            if index >= samples.len() {
                return Err(InstrumentError::SampleIndexOutOfRange(sample_index));
            }

            let target = match kind {
                KIND_ADPCM_A => SampleCodec::AdpcmA,
                _ => SampleCodec::AdpcmB,
            };

            if samples[index].codec == SampleCodec::Pcm16 {
                // lossy, implicit conversion
                diag.warn(format!(
                    "sample '{}' is encoded in PCM, converting to ADPCM-{}",
                    samples[index].name,
                    if kind == KIND_ADPCM_A { "A" } else { "B" }
                ));
                samples[index] = convert_sample(&samples[index], target);
            }

            let name = asm_identifier(&format!("instr_{:02x}_{}", nth, name));
            match kind {
                KIND_ADPCM_A => Ok(Instrument::AdpcmA(AdpcmAInstrument {
                    name,
                    sample_index: index,
                })),
                _ => Ok(Instrument::AdpcmB(AdpcmBInstrument {
                    name,
                    sample_index: index,
                    looping: samples[index].looping,
                })),
            }
        }
    }
}

pub fn read_instruments(
    pointers: &[u32],
    bs: &mut ByteStream,
    samples: &mut [Sample],
    diag: &mut Diagnostics,
) -> Result<Vec<Instrument>, ExtractError> {
    pointers
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            bs.seek(p as usize);
            read_instrument(i, bs, samples, diag).map_err(|e| ExtractError::Instrument(i, e))
        })
        .collect()
}
