//! SSG macro compiler
//!
//! Furnace stores SSG envelopes as per-tick value tables, one table per
//! chip property.  The sound driver instead consumes a compact bytecode
//! program: `(offset, value)` pairs that a fixed register-walk routine
//! replays, one group per tick, each group terminated by `0xff`.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::byte_stream::{bit_field, ByteStream};
use crate::errors::MacroError;
use crate::Diagnostics;

use std::collections::{BTreeMap, VecDeque};

/// End of a tick group, and of the whole program.
pub const MACRO_TERMINATOR: u8 = 0xff;

/// "Do not update the envelope shape register" (bit 7 set).
const ENV_SHAPE_UNCHANGED: u8 = 0x80;

// Data lanes, ordered by the register-walk order of the target driver.
pub const LANE_ENV_SHAPE: u8 = 0;
pub const LANE_ENV_NUMERATOR: u8 = 1;
pub const LANE_ENV_DENOMINATOR: u8 = 2;
pub const LANE_VOLUME: u8 = 3;
pub const LANE_WAVEFORM: u8 = 4;

/// Furnace macro register codes and their target data lanes.
fn lane_for_code(code: u8) -> Option<u8> {
    match code {
        0 => Some(LANE_VOLUME),      // volume
        3 => Some(LANE_WAVEFORM),    // noise/tone enable
        6 => Some(LANE_ENV_SHAPE),   // envelope shape
        7 => Some(LANE_ENV_NUMERATOR),
        8 => Some(LANE_ENV_DENOMINATOR),
        _ => None,
    }
}

/// A compiled macro program.
pub struct SsgMacro {
    pub name: String,
    pub load_name: String,

    /// One-time register initialization followed by the per-tick
    /// bytecode, terminated by `MACRO_TERMINATOR`.
    pub program: Vec<u8>,

    /// Per-tick lanes, in register-walk order.
    pub keys: Vec<u8>,
    /// Walk distance per key (first entry is the raw delta from the
    /// walk base, subsequent entries are gap minus one).
    pub offsets: Vec<u8>,

    /// Auto-envelope ratio, stored as data so the driver never has to
    /// divide at run time.
    pub auto_env: Option<(u8, u8)>,
}

pub fn read_ssg_macro(
    length: usize,
    bs: &mut ByteStream,
    diag: &mut Diagnostics,
) -> Result<SsgMacro, MacroError> {
    let start = bs.pos();
    let end = start + length;

    let header_len = bs.read_u16()?;

    let mut blocks: BTreeMap<u8, VecDeque<u8>> = BTreeMap::new();

    // pass: read all macro blocks
    while bs.pos() < end {
        let header_start = bs.pos();

        let code = bs.read_u8()?;
        if code == MACRO_TERMINATOR {
            break;
        }
        let lane = lane_for_code(code).ok_or(MacroError::UnknownRegisterCode(code))?;

        let data_len = bs.read_u8()?;
        let loop_pos = bs.read_u8()?;
        let release_pos = bs.read_u8()?;
        bs.read_u8()?; // mode

        let value_format = bs.read_u8()?;
        let size = bit_field(value_format, 7, 6);
        let kind = bit_field(value_format, 2, 1);
        if size != 0 || kind != 0 {
            return Err(MacroError::MacroValueNotU8 { size, kind });
        }

        let delay = bs.read_u8()?;
        let speed = bs.read_u8()?;

        // Advanced macro features are recognized but not supported by
        // the driver.  Flag them instead of silently dropping them.
        if loop_pos != 0xff {
            diag.warn(format!("macro code {}: loop point ignored", code));
        }
        if release_pos != 0xff {
            diag.warn(format!("macro code {}: release point ignored", code));
        }
        if delay != 0 {
            diag.warn(format!("macro code {}: delay ignored", code));
        }
        if speed > 1 {
            diag.warn(format!("macro code {}: tick speed ignored", code));
        }

        let header_actual = bs.pos() - header_start;
        if header_actual != usize::from(header_len) {
            return Err(MacroError::UnexpectedHeaderSize {
                expected: header_len,
                actual: header_actual,
            });
        }

        let data = bs.read(usize::from(data_len))?;
        blocks.insert(lane, data.iter().copied().collect());
    }

    if bs.pos() != end {
        return Err(MacroError::BlockLengthMismatch {
            expected: length,
            actual: bs.pos() - start,
        });
    }

    // pass: synthesize an "unchanged" envelope shape if none was set,
    // so the driver knows not to touch the envelope register
    blocks
        .entry(LANE_ENV_SHAPE)
        .or_insert_with(|| VecDeque::from([ENV_SHAPE_UNCHANGED]));

    // pass: rewrite the waveform lane for the noise/tone register.
    // Only the first element is used, sequences on this register are
    // not supported.
    if let Some(wav) = blocks.get(&LANE_WAVEFORM).and_then(|b| b.front().copied()) {
        let env = bit_field(wav, 2, 2);
        let noise = bit_field(wav, 1, 1);
        let tone = bit_field(wav, 0, 0);

        // the envelope-enable bit lives in the volume register's high
        // nibble on the chip, fold it into every volume element
        if let Some(vols) = blocks.get_mut(&LANE_VOLUME) {
            for v in vols.iter_mut() {
                *v |= env << 4;
            }
        }

        let mixer = (noise << 3 | tone) ^ 0xff;
        blocks.insert(LANE_WAVEFORM, VecDeque::from([mixer]));
    }

    // pass: capture the auto-envelope ratio as data.  Only single
    // elements are read, macros on these lanes are not supported.
    let mut auto_env = None;
    if blocks.contains_key(&LANE_ENV_NUMERATOR) || blocks.contains_key(&LANE_ENV_DENOMINATOR) {
        let first = |lane: &u8, blocks: &BTreeMap<u8, VecDeque<u8>>| {
            blocks.get(lane).and_then(|b| b.front().copied()).unwrap_or(1)
        };
        auto_env = Some((
            first(&LANE_ENV_NUMERATOR, &blocks),
            first(&LANE_ENV_DENOMINATOR, &blocks),
        ));
        blocks.remove(&LANE_ENV_NUMERATOR);
        blocks.remove(&LANE_ENV_DENOMINATOR);
    }

    // pass: build the macro program.  The first part initializes the
    // registers that are not updated every tick, the second part runs
    // at every tick (currently only volume).
    let one_time: Vec<u8> = blocks
        .keys()
        .copied()
        .filter(|k| [LANE_ENV_SHAPE, LANE_WAVEFORM].contains(k))
        .collect();
    let per_tick: Vec<u8> = blocks
        .keys()
        .copied()
        .filter(|k| ![LANE_ENV_SHAPE, LANE_WAVEFORM].contains(k))
        .collect();

    let mut program = Vec::new();
    let (seq, _) = compile_macro_sequence(&one_time, &mut blocks);
    program.extend(seq);
    let (seq, offsets) = compile_macro_sequence(&per_tick, &mut blocks);
    program.extend(seq);
    program.push(MACRO_TERMINATOR);

    Ok(SsgMacro {
        name: String::new(),
        load_name: String::new(),
        program,
        keys: per_tick,
        offsets,
        auto_env,
    })
}

/// Round-based merge over the given lanes: pop one value from every
/// lane that still has data, emit `(offset, value)` pairs and terminate
/// the round.  The first pair of a round carries the true lane key, the
/// following pairs carry the precomputed walk distance.
fn compile_macro_sequence(
    keys: &[u8],
    blocks: &mut BTreeMap<u8, VecDeque<u8>>,
) -> (Vec<u8>, Vec<u8>) {
    let offsets: Vec<u8> = keys
        .iter()
        .enumerate()
        .map(|(i, &k)| if i == 0 { k } else { k - keys[i - 1] - 1 })
        .collect();

    let mut seq = Vec::new();
    loop {
        let mut round = Vec::new();

        for (&k, &o) in keys.iter().zip(&offsets) {
            let Some(value) = blocks.get_mut(&k).and_then(VecDeque::pop_front) else {
                continue;
            };
            let first = round.is_empty();
            round.push(if first { k } else { o });
            round.push(value);
        }

        if round.is_empty() {
            break;
        }
        seq.extend(round);
        seq.push(MACRO_TERMINATOR);
    }

    (seq, offsets)
}
