//! Assembly and sample-map generation
//!
//! Instruments become `.db`/`.dw` tables for the z80 sound driver,
//! samples become a YAML map of base64 data URIs for the ROM builder.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::byte_stream::shift_into;
use crate::errors::ExportError;
use crate::instruments::{AdpcmBInstrument, FmInstrument, Instrument};
use crate::module::Module;
use crate::samples::{Sample, SampleCodec};
use crate::ssg_macro::{SsgMacro, MACRO_TERMINATOR};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use std::fmt::Write;

// YM2610 SSG registers, whole-chip
const REG_SSG_ENV_FINE_TUNE: u8 = 0x0b;
const REG_SSG_ENV_COARSE_TUNE: u8 = 0x0c;
const REG_SSG_ENV_SHAPE: u8 = 0x0d;

// per-channel, rebased by the driver at run time
const REG_SSG_A_VOLUME: u8 = 0x08;

pub fn generate_instruments(
    module: &Module,
    sample_map_name: &str,
    table_name: &str,
    instruments: &[Instrument],
    samples: &[Sample],
) -> Result<String, ExportError> {
    let mut out = String::new();

    writeln!(out, ";;; NSS instruments and macros")?;
    writeln!(out, ";;; generated by fur2asm")?;
    writeln!(out, ";;; ---")?;
    writeln!(out, ";;; Song title: {}", module.name)?;
    writeln!(out, ";;; Song author: {}", module.author)?;
    writeln!(out, ";;;")?;
    writeln!(out)?;
    writeln!(out, "        .area   CODE")?;
    writeln!(out)?;
    writeln!(out, "        ;; offset of ADPCM samples in ROMs")?;
    writeln!(out, "        .include \"{}\"", sample_map_name)?;
    writeln!(out)?;

    if instruments.is_empty() {
        writeln!(out, ";; no instruments defined in this song")?;
    } else {
        writeln!(out, "{}::", table_name)?;
        for i in instruments {
            writeln!(out, "        .dw     {}", i.name())?;
        }
    }
    writeln!(out)?;

    for i in instruments {
        match i {
            Instrument::Fm(fm) => asm_fm_instrument(fm, &mut out)?,
            Instrument::Macro(mac) => asm_ssg_macro(mac, &mut out)?,
            Instrument::AdpcmA(a) => {
                asm_adpcm_instrument(&a.name, &samples[a.sample_index], None, &mut out)?;
            }
            Instrument::AdpcmB(b) => {
                asm_adpcm_instrument(&b.name, &samples[b.sample_index], Some(b), &mut out)?;
            }
        }
    }

    Ok(out)
}

fn asm_fm_instrument(ins: &FmInstrument, out: &mut String) -> Result<(), ExportError> {
    let per_op = |f: &dyn Fn(usize) -> u8| {
        let b: Vec<String> = (0..4).map(|i| format!("0x{:02x}", f(i))).collect();
        b.join(", ")
    };

    let ops = &ins.ops;
    let dtmul = per_op(&|i| shift_into(ops[i].detune, 4) | ops[i].multiply);
    let tl = per_op(&|i| ops[i].total_level);
    let ksar = per_op(&|i| shift_into(ops[i].key_scale, 6) | ops[i].attack_rate);
    let amdr = per_op(&|i| shift_into(ops[i].am_on, 7) | ops[i].decay_rate);
    let sr = per_op(&|i| shift_into(ops[i].kvs, 5) | ops[i].sustain_rate);
    let slrr = per_op(&|i| shift_into(ops[i].sustain_level, 4) | ops[i].release_rate);
    let ssgeg = per_op(&|i| ops[i].ssg_eg);
    let fbalgo = shift_into(ins.feedback, 3) | ins.algorithm;
    let amsfms = shift_into(0b11, 6) | shift_into(ins.am_sense, 4) | ins.fm_sense;

    writeln!(out, "{}:", ins.name)?;
    writeln!(out, "        ;;       OP1 - OP3 - OP2 - OP4")?;
    writeln!(out, "        .db     {}   ; DT | MUL", dtmul)?;
    writeln!(out, "        .db     0xff, 0xff, 0xff, 0xff   ; empty")?;
    writeln!(out, "        .db     {}   ; KS | AR", ksar)?;
    writeln!(out, "        .db     {}   ; AM | DR", amdr)?;
    writeln!(out, "        .db     {}   ; SR", sr)?;
    writeln!(out, "        .db     {}   ; SL | RR", slrr)?;
    writeln!(out, "        .db     {}   ; SSG", ssgeg)?;
    writeln!(out, "        .db     0x{:02x}                     ; FB | ALGO", fbalgo)?;
    writeln!(out, "        .db     0x{:02x}                     ; LR | AMS | FMS", amsfms)?;
    writeln!(out, "        .db     {}   ; TL", tl)?;
    writeln!(out)?;

    Ok(())
}

fn asm_ssg_macro(mac: &SsgMacro, out: &mut String) -> Result<(), ExportError> {
    // one line per tick group, keeping each group's terminator
    let mut lines: Vec<String> = Vec::new();
    let mut prev = 0;
    while let Some(i) = mac.program[prev..]
        .iter()
        .position(|&b| b == MACRO_TERMINATOR)
    {
        let cur = prev + i;
        if cur == prev {
            break;
        }
        let bytes: Vec<String> = mac.program[prev..=cur]
            .iter()
            .map(|b| format!("0x{:02x}", b))
            .collect();
        lines.push(bytes.join(", "));
        prev = cur + 1;
    }

    let longest = lines.iter().map(String::len).max().unwrap_or(4);

    writeln!(out, "{}:", mac.name)?;
    writeln!(out, "        ;; macro load function")?;
    writeln!(out, "        .dw     {}", mac.load_name)?;
    writeln!(out, "        ;; macro actions")?;
    for (tick, line) in lines.iter().enumerate() {
        writeln!(out, "        .db     {:<w$}   ; tick {}", line, tick, w = longest)?;
    }
    writeln!(out, "        .db     {:<w$}   ; end", "0xff", w = longest)?;
    writeln!(out)?;

    asm_ssg_load_func(mac, out)
}

/// Generates the z80 routine that replays one tick group: `hl` points
/// at the group's values, each offset advances it to the next register
/// in the walk.
fn asm_ssg_load_func(mac: &SsgMacro, out: &mut String) -> Result<(), ExportError> {
    writeln!(out, "{}:", mac.load_name)?;

    for (i, (&offset, &key)) in mac.offsets.iter().zip(&mac.keys).enumerate() {
        // past the first value, skip the value byte itself
        let offset = if i != 0 { offset + 1 } else { offset };

        if offset == 1 {
            writeln!(out, "        inc     hl")?;
        } else {
            writeln!(out, "        ld      bc, #{}", offset)?;
            writeln!(out, "        add     hl, bc")?;
        }

        match key {
            crate::ssg_macro::LANE_ENV_SHAPE => asm_ssg_write(REG_SSG_ENV_SHAPE, out)?,
            crate::ssg_macro::LANE_ENV_NUMERATOR => asm_ssg_write(REG_SSG_ENV_FINE_TUNE, out)?,
            crate::ssg_macro::LANE_ENV_DENOMINATOR => asm_ssg_write(REG_SSG_ENV_COARSE_TUNE, out)?,
            crate::ssg_macro::LANE_VOLUME => asm_channel_write(REG_SSG_A_VOLUME, out)?,
            k => return Err(ExportError::NoRegisterWrite(k)),
        }
    }

    writeln!(out, "        ret")?;
    writeln!(out)?;

    Ok(())
}

fn asm_ssg_write(reg: u8, out: &mut String) -> Result<(), ExportError> {
    writeln!(out, "        ld      b, #0x{:02x}", reg)?;
    writeln!(out, "        ld      c, (hl)")?;
    writeln!(out, "        call    ym2610_write_port_a")?;
    Ok(())
}

fn asm_channel_write(_reg: u8, out: &mut String) -> Result<(), ExportError> {
    writeln!(out, "        ld      a, (state_ssg_channel)")?;
    writeln!(out, "        ld      b, a")?;
    writeln!(out, "        ld      c, (hl)")?;
    writeln!(out, "        call    ssg_mix_volume")?;
    Ok(())
}

fn asm_adpcm_instrument(
    name: &str,
    sample: &Sample,
    adpcm_b: Option<&AdpcmBInstrument>,
    out: &mut String,
) -> Result<(), ExportError> {
    let sym = sample.name.to_uppercase();

    writeln!(out, "{}:", name)?;
    writeln!(out, "        .db     {}_START_LSB, {}_START_MSB  ; start >> 8", sym, sym)?;
    writeln!(out, "        .db     {}_STOP_LSB,  {}_STOP_MSB   ; stop  >> 8", sym, sym)?;
    if let Some(b) = adpcm_b {
        writeln!(out, "        .db     0x{:02x}  ; loop", u8::from(b.looping))?;
    }
    writeln!(out)?;

    Ok(())
}

pub fn generate_sample_map(module: &Module, samples: &[Sample]) -> Result<String, ExportError> {
    let mut out = String::new();

    writeln!(out, "# ADPCM sample map - generated by fur2asm")?;
    writeln!(out, "# ---")?;
    writeln!(out, "# Song title: {}", module.name)?;
    writeln!(out, "# Song author: {}", module.author)?;
    writeln!(out, "#")?;

    for s in samples {
        let stype = match s.codec {
            SampleCodec::AdpcmA => "adpcm_a",
            SampleCodec::AdpcmB => "adpcm_b",
            SampleCodec::Pcm16 => {
                return Err(ExportError::UnconvertedPcmSample(s.name.clone()));
            }
        };
        writeln!(out, "- {}:", stype)?;
        writeln!(out, "    name: {}", s.name)?;
        writeln!(out, "    # length: {}", s.data.len())?;
        writeln!(out, "    uri: data:;base64,{}", BASE64.encode(&s.data))?;
    }

    Ok(out)
}
