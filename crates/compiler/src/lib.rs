//! Furnace module to YM2610 data compiler
//!
//! Reads an uncompressed Furnace module, extracts the instruments,
//! macros and samples a Neo Geo sound driver needs, and renders them
//! as z80 assembly tables and an ADPCM sample map.

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

pub mod byte_stream;
pub mod errors;
pub mod export;
pub mod instruments;
pub mod module;
pub mod names;
pub mod samples;
pub mod ssg_macro;

use byte_stream::ByteStream;
use errors::ExtractError;
use instruments::{read_instruments, Instrument};
use module::{read_module, Module};
use samples::{convert_unused_samples, read_samples, Sample};

/// Notes and warnings collected while decoding a module.
///
/// Decoding never prints.  The caller decides what to do with the
/// messages (the CLI prints them in verbose mode).
#[derive(Default)]
pub struct Diagnostics {
    messages: Vec<String>,
}

impl Diagnostics {
    pub fn note(&mut self, message: String) {
        self.messages.push(message);
    }

    pub fn warn(&mut self, message: String) {
        self.messages.push(format!("warning: {}", message));
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Everything extracted from one module.
///
/// Instruments reference samples by index, the sample list is the
/// single owner of sample data.
pub struct Extraction {
    pub module: Module,
    pub samples: Vec<Sample>,
    pub instruments: Vec<Instrument>,
}

/// Decodes an uncompressed Furnace module.
///
/// After this returns, every sample is ADPCM encoded.  Samples used by
/// an instrument follow that instrument's chip, unused PCM samples are
/// converted to ADPCM-A.
pub fn extract(data: Vec<u8>, diag: &mut Diagnostics) -> Result<Extraction, ExtractError> {
    let mut bs = ByteStream::new(data);

    let module = read_module(&mut bs)?;
    let mut samples = read_samples(&module.samples, &mut bs, diag)?;
    let instruments = read_instruments(&module.instruments, &mut bs, &mut samples, diag)?;
    convert_unused_samples(&mut samples, diag);

    Ok(Extraction {
        module,
        samples,
        instruments,
    })
}
