//! Position-tracked little-endian byte cursor

// SPDX-FileCopyrightText: © 2024 Marcus Rowe <undisbeliever@gmail.com>
//
// SPDX-License-Identifier: MIT

use crate::errors::StreamError;

/// Forward-only reader/writer over a byte buffer.
///
/// All multi-byte reads are little-endian.  Reading past the end of the
/// buffer is a `StreamError::UnexpectedEof`, never a panic.
pub struct ByteStream {
    data: Vec<u8>,
    pos: usize,
}

impl ByteStream {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn eof(&self) -> bool {
        self.pos == self.data.len()
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn read(&mut self, n: usize) -> Result<&[u8], StreamError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(StreamError::UnexpectedEof(self.pos))?;

        if end > self.data.len() {
            return Err(StreamError::UnexpectedEof(self.pos));
        }

        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), StreamError> {
        self.read(n)?;
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], StreamError> {
        // slice is N bytes long, try_into cannot fail
        Ok(self.read(N)?.try_into().unwrap())
    }

    pub fn read_u8(&mut self) -> Result<u8, StreamError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, StreamError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, StreamError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, StreamError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, StreamError> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a NUL terminated UTF-8 string (the terminator is consumed
    /// but not included).
    pub fn read_string(&mut self) -> Result<String, StreamError> {
        let start = self.pos;

        let mut bytes = Vec::new();
        loop {
            match self.read_u8()? {
                0 => break,
                b => bytes.push(b),
            }
        }

        String::from_utf8(bytes).map_err(|_| StreamError::InvalidUtf8(start))
    }

    // Writer half, used to build test fixtures and by the fuzzer corpus
    // generator.

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
        self.pos = self.data.len();
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bytes(&[value]);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_i32(&mut self, value: i32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn write_f32(&mut self, value: f32) {
        self.write_bytes(&value.to_le_bytes());
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl Default for ByteStream {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Extract the unsigned bit-field `[msb:lsb]` (inclusive) from `value`.
pub fn bit_field(value: u8, msb: u8, lsb: u8) -> u8 {
    debug_assert!(msb >= lsb && msb < 8);

    let mask = (1u16 << (msb - lsb + 1)) - 1;
    value >> lsb & mask as u8
}

/// Shift `value` into the field position starting at `lsb`.
///
/// The value is not masked, callers must ensure it fits the field.
pub fn shift_into(value: u8, lsb: u8) -> u8 {
    value << lsb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_reads() {
        let mut bs = ByteStream::new(vec![0x01, 0x02, 0x03, 0x04, 0xff, 0xff, 0xff, 0xff]);

        assert_eq!(bs.read_u16().unwrap(), 0x0201);
        assert_eq!(bs.read_u16().unwrap(), 0x0403);
        assert_eq!(bs.read_i32().unwrap(), -1);
        assert!(bs.eof());
    }

    #[test]
    fn read_f32() {
        let mut bs = ByteStream::default();
        bs.write_f32(62.5);

        let mut bs = ByteStream::new(bs.into_bytes());
        assert_eq!(bs.read_f32().unwrap(), 62.5);
    }

    #[test]
    fn read_past_end_is_an_error() {
        let mut bs = ByteStream::new(vec![1, 2, 3]);

        assert!(bs.read(2).is_ok());
        assert!(matches!(bs.read_u16(), Err(StreamError::UnexpectedEof(2))));

        // position is unchanged after a failed read
        assert_eq!(bs.read_u8().unwrap(), 3);
    }

    #[test]
    fn read_string_stops_at_nul() {
        let mut bs = ByteStream::new(b"duck\0pond\0".to_vec());

        assert_eq!(bs.read_string().unwrap(), "duck");
        assert_eq!(bs.read_string().unwrap(), "pond");
        assert!(bs.eof());
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let mut bs = ByteStream::new(b"duck".to_vec());

        assert!(matches!(
            bs.read_string(),
            Err(StreamError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn invalid_utf8_string_is_an_error() {
        let mut bs = ByteStream::new(vec![0xc0, 0x20, 0x00]);

        assert!(matches!(bs.read_string(), Err(StreamError::InvalidUtf8(0))));
    }

    #[test]
    fn seek_and_pos() {
        let mut bs = ByteStream::new(vec![10, 20, 30, 40]);

        bs.seek(2);
        assert_eq!(bs.pos(), 2);
        assert_eq!(bs.read_u8().unwrap(), 30);
    }

    #[test]
    fn bit_field_extraction() {
        assert_eq!(bit_field(0b0110_1001, 7, 0), 0b0110_1001);
        assert_eq!(bit_field(0b0110_1001, 6, 4), 0b110);
        assert_eq!(bit_field(0b0110_1001, 3, 0), 0b1001);
        assert_eq!(bit_field(0b1000_0000, 7, 7), 1);
        assert_eq!(bit_field(0xff, 0, 0), 1);
    }

    #[test]
    fn shift_into_does_not_mask() {
        assert_eq!(shift_into(0b101, 4), 0b0101_0000);
        assert_eq!(shift_into(1, 0), 1);
    }
}
