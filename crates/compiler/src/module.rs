//! Furnace module header decoder

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::byte_stream::ByteStream;
use crate::errors::ModuleError;

pub const FURNACE_MAGIC: &[u8; 16] = b"-Furnace module-";
const INFO_BLOCK_TAG: &[u8; 4] = b"INFO";

/// The only supported chip configuration: a single YM2610.
pub const YM2610_CHIP_ID: u8 = 0xa5;

/// YM2610 track count: 4 FM, 3 SSG, 6 ADPCM-A, 1 ADPCM-B.
pub const TRACKS: usize = 14;

/// Decoded module container.
///
/// Pattern data is never interpreted, only its pointer table is read so
/// the cursor advances past it correctly.
pub struct Module {
    pub name: String,
    pub author: String,

    pub speed: u8,
    pub arpeggio: u8,
    pub frequency: f32,
    pub pattern_len: u16,

    pub instruments: Vec<u32>,
    pub samples: Vec<u32>,
    pub patterns: Vec<u32>,

    /// `orders[order][track]`
    pub orders: Vec<[u8; TRACKS]>,
    pub fx_columns: [u8; TRACKS],
}

pub fn read_module(bs: &mut ByteStream) -> Result<Module, ModuleError> {
    if bs.read(16)? != FURNACE_MAGIC {
        return Err(ModuleError::NotAFurnaceModule);
    }
    bs.read_u16()?; // version
    bs.read_u16()?;

    let info_pos = bs.read_u32()? as usize;
    bs.seek(info_pos);
    if bs.read(4)? != INFO_BLOCK_TAG {
        return Err(ModuleError::MissingInfoBlock(info_pos));
    }
    bs.skip(4)?; // declared block size, trusted

    bs.read_u8()?; // timebase
    let speed = bs.read_u8()?;
    bs.read_u8()?; // speed2
    let arpeggio = bs.read_u8()?;
    let frequency = bs.read_f32()?;

    let pattern_len = bs.read_u16()?;
    let nb_orders = bs.read_u16()?;
    bs.skip(2)?; // highlights

    let nb_instruments = bs.read_u16()?;
    let nb_wavetables = bs.read_u16()?;
    let nb_samples = bs.read_u16()?;
    let nb_patterns = bs.read_u32()?;

    check_chips(bs.read(32)?)?;
    bs.skip(32 + 32 + 128)?; // per-chip volume, panning, flags

    let name = bs.read_string()?;
    let author = bs.read_string()?;

    bs.read_f32()?; // tuning
    bs.skip(20)?; // Furnace configuration flags

    let read_pointers = |bs: &mut ByteStream, n: u16| -> Result<Vec<u32>, ModuleError> {
        (0..n).map(|_| Ok(bs.read_u32()?)).collect()
    };

    let instruments = read_pointers(bs, nb_instruments)?;
    let _wavetables = read_pointers(bs, nb_wavetables)?;
    let samples = read_pointers(bs, nb_samples)?;

    let patterns = (0..nb_patterns)
        .map(|_| Ok(bs.read_u32()?))
        .collect::<Result<Vec<u32>, ModuleError>>()?;

    // The order table is stored track-major.
    let mut orders = vec![[0; TRACKS]; nb_orders.into()];
    for track in 0..TRACKS {
        for row in orders.iter_mut() {
            row[track] = bs.read_u8()?;
        }
    }

    let mut fx_columns = [0; TRACKS];
    for c in fx_columns.iter_mut() {
        *c = bs.read_u8()?;
    }

    Ok(Module {
        name,
        author,
        speed,
        arpeggio,
        frequency,
        pattern_len,
        instruments,
        samples,
        patterns,
        orders,
        fx_columns,
    })
}

/// The chip list must contain a single YM2610 and nothing else.
fn check_chips(chips: &[u8]) -> Result<(), ModuleError> {
    let mut enabled = chips.iter().take_while(|&&id| id != 0);

    match enabled.next() {
        Some(&YM2610_CHIP_ID) => {}
        Some(&id) => return Err(ModuleError::UnsupportedChip(id)),
        None => return Err(ModuleError::NoSoundChips),
    }

    if let Some(&id) = enabled.next() {
        return Err(ModuleError::MoreThanOneChip(id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestModule {
        chips: [u8; 32],
        nb_instruments: u16,
        nb_samples: u16,
        nb_patterns: u32,
        nb_orders: u16,
    }

    impl Default for TestModule {
        fn default() -> Self {
            let mut chips = [0; 32];
            chips[0] = YM2610_CHIP_ID;

            Self {
                chips,
                nb_instruments: 0,
                nb_samples: 0,
                nb_patterns: 0,
                nb_orders: 1,
            }
        }
    }

    impl TestModule {
        fn build(&self) -> Vec<u8> {
            let mut bs = ByteStream::default();

            bs.write_bytes(FURNACE_MAGIC);
            bs.write_u16(143); // version
            bs.write_u16(0);
            bs.write_u32(24); // INFO block follows immediately

            bs.write_bytes(INFO_BLOCK_TAG);
            bs.write_u32(0); // size (unchecked)
            bs.write_u8(1); // timebase
            bs.write_u8(6); // speed
            bs.write_u8(6); // speed2
            bs.write_u8(1); // arpeggio
            bs.write_f32(60.0);
            bs.write_u16(64); // pattern length
            bs.write_u16(self.nb_orders);
            bs.write_bytes(&[4, 16]); // highlights
            bs.write_u16(self.nb_instruments);
            bs.write_u16(0); // wavetables
            bs.write_u16(self.nb_samples);
            bs.write_u32(self.nb_patterns);
            bs.write_bytes(&self.chips);
            bs.write_bytes(&[0; 32 + 32 + 128]);
            bs.write_bytes(b"title\0author\0");
            bs.write_f32(440.0);
            bs.write_bytes(&[0; 20]);

            for i in 0..self.nb_instruments {
                bs.write_u32(0x1000 + u32::from(i));
            }
            for i in 0..self.nb_samples {
                bs.write_u32(0x2000 + u32::from(i));
            }
            for i in 0..self.nb_patterns {
                bs.write_u32(0x3000 + i);
            }

            for _ in 0..TRACKS {
                for o in 0..self.nb_orders {
                    bs.write_u8(o as u8);
                }
            }
            for _ in 0..TRACKS {
                bs.write_u8(1);
            }

            bs.into_bytes()
        }
    }

    #[test]
    fn decodes_counts_and_pointers() {
        let data = TestModule {
            nb_instruments: 3,
            nb_samples: 2,
            nb_patterns: 5,
            nb_orders: 4,
            ..TestModule::default()
        }
        .build();

        let mut bs = ByteStream::new(data);
        let module = read_module(&mut bs).unwrap();

        assert_eq!(module.name, "title");
        assert_eq!(module.author, "author");
        assert_eq!(module.speed, 6);
        assert_eq!(module.arpeggio, 1);
        assert_eq!(module.frequency, 60.0);
        assert_eq!(module.pattern_len, 64);

        // counts read from the header match the pointer table lengths
        assert_eq!(module.instruments.len(), 3);
        assert_eq!(module.samples.len(), 2);
        assert_eq!(module.patterns.len(), 5);
        assert_eq!(module.orders.len(), 4);

        assert_eq!(module.instruments, vec![0x1000, 0x1001, 0x1002]);
        assert_eq!(module.samples, vec![0x2000, 0x2001]);

        // the order table and fx columns are the last fields in the block
        assert!(bs.eof());
    }

    #[test]
    fn bad_magic_is_fatal() {
        let mut data = TestModule::default().build();
        data[0] = b'+';

        let r = read_module(&mut ByteStream::new(data));
        assert!(matches!(r, Err(ModuleError::NotAFurnaceModule)));
    }

    #[test]
    fn wrong_chip_is_fatal() {
        let mut chips = [0; 32];
        chips[0] = 0x02; // Genesis

        let data = TestModule {
            chips,
            ..TestModule::default()
        }
        .build();

        let r = read_module(&mut ByteStream::new(data));
        assert!(matches!(r, Err(ModuleError::UnsupportedChip(0x02))));
    }

    #[test]
    fn second_chip_is_fatal() {
        let mut chips = [0; 32];
        chips[0] = YM2610_CHIP_ID;
        chips[1] = 0x02;

        let data = TestModule {
            chips,
            ..TestModule::default()
        }
        .build();

        let r = read_module(&mut ByteStream::new(data));
        assert!(matches!(r, Err(ModuleError::MoreThanOneChip(0x02))));
    }

    #[test]
    fn no_chips_is_fatal() {
        let data = TestModule {
            chips: [0; 32],
            ..TestModule::default()
        }
        .build();

        let r = read_module(&mut ByteStream::new(data));
        assert!(matches!(r, Err(ModuleError::NoSoundChips)));
    }
}
