//! A single location for all of the errors in the extractor

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Read past the end of the buffer (position of the failed read)
    UnexpectedEof(usize),
    /// A NUL terminated string was not valid UTF-8 (position of the string)
    InvalidUtf8(usize),
}

#[derive(Debug)]
pub enum ModuleError {
    Stream(StreamError),

    NotAFurnaceModule,
    MissingInfoBlock(usize),

    NoSoundChips,
    UnsupportedChip(u8),
    MoreThanOneChip(u8),
}

#[derive(Debug)]
pub enum SampleError {
    Stream(StreamError),

    NotASampleBlock(usize),
    UnsupportedSampleType { name: String, stype: u8 },
    OddAdpcmSampleCount { name: String, length: u32 },
}

#[derive(Debug)]
pub enum MacroError {
    Stream(StreamError),

    UnknownRegisterCode(u8),
    UnexpectedHeaderSize { expected: u16, actual: usize },
    MacroValueNotU8 { size: u8, kind: u8 },
    BlockLengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug)]
pub enum InstrumentError {
    Stream(StreamError),

    NotAnInstrumentBlock(usize),
    UnsupportedFormatVersion(u16),
    UnsupportedInstrumentKind(u16),

    MissingOperatorData(u8),

    SampleIndexOutOfRange(u16),
    PcmSampleMapUnsupported,

    MissingVoiceParameters,
    MissingMacroData,

    Macro(MacroError),
}

#[derive(Debug)]
pub enum ExportError {
    Fmt(std::fmt::Error),

    /// A compiled macro walks a register the generator has no write
    /// sequence for.
    NoRegisterWrite(u8),

    /// A PCM sample survived to map generation without being converted.
    UnconvertedPcmSample(String),
}

/// Top level error for the whole extraction pipeline.
#[derive(Debug)]
pub enum ExtractError {
    Module(ModuleError),
    Sample(usize, SampleError),
    Instrument(usize, InstrumentError),
    Export(ExportError),
}

// From Traits
// ===========

impl From<StreamError> for ModuleError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<StreamError> for SampleError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<StreamError> for MacroError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<StreamError> for InstrumentError {
    fn from(e: StreamError) -> Self {
        Self::Stream(e)
    }
}

impl From<MacroError> for InstrumentError {
    fn from(e: MacroError) -> Self {
        Self::Macro(e)
    }
}

impl From<std::fmt::Error> for ExportError {
    fn from(e: std::fmt::Error) -> Self {
        Self::Fmt(e)
    }
}

impl From<ModuleError> for ExtractError {
    fn from(e: ModuleError) -> Self {
        Self::Module(e)
    }
}

impl From<ExportError> for ExtractError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// Display
// =======

impl Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedEof(pos) => {
                write!(f, "unexpected end of data (position {})", pos)
            }
            Self::InvalidUtf8(pos) => write!(f, "string is not UTF-8 (position {})", pos),
        }
    }
}

impl Display for ModuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => e.fmt(f),
            Self::NotAFurnaceModule => write!(f, "not a Furnace module"),
            Self::MissingInfoBlock(pos) => {
                write!(f, "no INFO block at position {}", pos)
            }
            Self::NoSoundChips => write!(f, "module uses no sound chips"),
            Self::UnsupportedChip(id) => {
                write!(f, "unsupported sound chip {:#04x} (expected YM2610)", id)
            }
            Self::MoreThanOneChip(id) => write!(
                f,
                "module uses more than one sound chip (extra chip {:#04x})",
                id
            ),
        }
    }
}

impl Display for SampleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => e.fmt(f),
            Self::NotASampleBlock(pos) => {
                write!(f, "no SMP2 block at position {}", pos)
            }
            Self::UnsupportedSampleType { name, stype } => {
                write!(f, "sample '{}' is of unsupported type: {}", name, stype)
            }
            Self::OddAdpcmSampleCount { name, length } => write!(
                f,
                "ADPCM sample '{}' has an odd number of samples ({})",
                name, length
            ),
        }
    }
}

impl Display for MacroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => e.fmt(f),
            Self::UnknownRegisterCode(code) => {
                write!(f, "unknown macro register code {}", code)
            }
            Self::UnexpectedHeaderSize { expected, actual } => write!(
                f,
                "macro block header is {} bytes (declared {})",
                actual, expected
            ),
            Self::MacroValueNotU8 { size, kind } => write!(
                f,
                "macro values must be an 8-bit unsigned sequence (size {}, kind {})",
                size, kind
            ),
            Self::BlockLengthMismatch { expected, actual } => write!(
                f,
                "macro block is {} bytes long (declared {})",
                actual, expected
            ),
        }
    }
}

impl Display for InstrumentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stream(e) => e.fmt(f),
            Self::NotAnInstrumentBlock(pos) => {
                write!(f, "no INS2 block at position {}", pos)
            }
            Self::UnsupportedFormatVersion(v) => {
                write!(f, "instrument format version {} is too old", v)
            }
            Self::UnsupportedInstrumentKind(k) => {
                write!(f, "unsupported instrument kind {}", k)
            }
            Self::MissingOperatorData(marker) => write!(
                f,
                "FM voice does not carry data for all four operators (marker {:#04x})",
                marker
            ),
            Self::SampleIndexOutOfRange(i) => {
                write!(f, "sample index {} is out of range", i)
            }
            Self::PcmSampleMapUnsupported => {
                write!(f, "PCM sample maps are unsupported")
            }
            Self::MissingVoiceParameters => {
                write!(f, "FM instrument has no voice parameter block")
            }
            Self::MissingMacroData => write!(f, "SSG instrument has no macro block"),
            Self::Macro(e) => e.fmt(f),
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fmt(e) => e.fmt(f),
            Self::NoRegisterWrite(key) => {
                write!(f, "no register write sequence for SSG property {}", key)
            }
            Self::UnconvertedPcmSample(name) => {
                write!(f, "sample '{}' is still encoded in PCM", name)
            }
        }
    }
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module(e) => e.fmt(f),
            Self::Sample(i, e) => write!(f, "sample {:#04x}: {}", i, e),
            Self::Instrument(i, e) => write!(f, "instrument {:#04x}: {}", i, e),
            Self::Export(e) => e.fmt(f),
        }
    }
}
