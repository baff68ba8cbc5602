//! Little-endian byte cursor and writer

use crate::error::{BaevError, Result};

/// Round `value` up to the next multiple of `align` (power of two or not)
pub fn align_up(value: usize, align: usize) -> usize {
    if align <= 1 {
        return value;
    }
    value.div_ceil(align) * align
}

/// Read cursor over a byte slice. All reads are little-endian.
///
/// Seeking past the end is allowed; only the next read fails. Empty arrays in
/// the format are commonly pointed at offset 0 or at the end of the file.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current byte position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total length of underlying data.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether we've reached the end.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Remaining bytes from current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Seek to an absolute position.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Read a slice of `n` bytes without copying.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read a 4-byte magic/tag.
    pub fn read_magic(&mut self) -> Result<[u8; 4]> {
        self.read_array::<4>()
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array()?))
    }

    /// Read a u64 absolute offset and convert it to a buffer position.
    ///
    /// Offsets that cannot be represented as `usize` are clamped so the next
    /// read reports truncation instead of wrapping.
    pub fn read_offset(&mut self) -> Result<usize> {
        let raw = self.read_u64()?;
        Ok(usize::try_from(raw).unwrap_or(usize::MAX))
    }

    /// Read a null-terminated UTF-8 string, consuming the terminator.
    pub fn read_cstring(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = self.data.get(start..).unwrap_or_default();
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(BaevError::UnterminatedString { offset: start })?;
        let text = std::str::from_utf8(&rest[..len])
            .map_err(|source| BaevError::Encoding {
                offset: start,
                source,
            })?
            .to_string();
        self.pos = start + len + 1;
        Ok(text)
    }

    /// Read a null-padded string stored in a fixed `len`-byte field.
    ///
    /// The text ends at the first null byte; whatever follows it is padding.
    /// A field with no null byte is text for its full length.
    pub fn read_fixed_string(&mut self, len: usize) -> Result<String> {
        let start = self.pos;
        let bytes = self.read_bytes(len)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end])
            .map(str::to_string)
            .map_err(|source| BaevError::Encoding {
                offset: start,
                source,
            })
    }

    fn ensure(&self, n: usize) -> Result<()> {
        let fits = self
            .pos
            .checked_add(n)
            .is_some_and(|end| end <= self.data.len());
        if !fits {
            return Err(BaevError::TruncatedInput {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

/// Seekable writer that builds a byte buffer. All writes are little-endian.
///
/// Writing past the current end grows the buffer, zero-filling any gap.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
    pos: usize,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer over `len` zero bytes.
    pub fn with_len(len: usize) -> Self {
        Self {
            buf: vec![0; len],
            pos: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.pos + bytes.len();
        if end > self.buf.len() {
            self.buf.resize(end, 0);
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
    }

    pub fn write_magic(&mut self, magic: &[u8; 4]) {
        self.write_bytes(magic);
    }

    pub fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub fn write_f32(&mut self, v: f32) {
        self.write_bytes(&v.to_le_bytes());
    }

    /// Write `s` null-padded into a fixed `len`-byte field.
    ///
    /// Text may fill the whole field, in which case no terminator is written.
    pub fn write_fixed_string(&mut self, field: &'static str, s: &str, len: usize) -> Result<()> {
        if s.len() > len {
            return Err(BaevError::FieldTooLong {
                field,
                len: s.len(),
                max: len,
            });
        }
        if s.as_bytes().contains(&0) {
            return Err(BaevError::InteriorNul { field });
        }
        let mut padded = vec![0u8; len];
        padded[..s.len()].copy_from_slice(s.as_bytes());
        self.write_bytes(&padded);
        Ok(())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_integers_little_endian() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x00, 0x00, 0x60, 0x40];
        let mut cursor = Cursor::new(&data);

        assert_eq!(cursor.read_u16().unwrap(), 0x0201);
        assert_eq!(cursor.read_u8().unwrap(), 0x03);
        assert_eq!(cursor.read_u8().unwrap(), 0x04);
        assert_eq!(cursor.read_u32().unwrap(), 0x0807_0605);
        assert_eq!(cursor.read_f32().unwrap(), 3.5);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_truncated_read_reports_offset() {
        let data = [0u8; 6];
        let mut cursor = Cursor::new(&data);
        cursor.read_u32().unwrap();

        let err = cursor.read_u32().unwrap_err();
        assert!(matches!(
            err,
            BaevError::TruncatedInput {
                offset: 4,
                need: 4,
                have: 2
            }
        ));
        // Failed read does not advance
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn test_seek_past_end_defers_error() {
        let data = [0u8; 4];
        let mut cursor = Cursor::new(&data);
        cursor.seek(100);
        assert_eq!(cursor.remaining(), 0);
        assert!(matches!(
            cursor.read_u8(),
            Err(BaevError::TruncatedInput { offset: 100, .. })
        ));
    }

    #[test]
    fn test_read_cstring() {
        let data = b"Attack\0Idle\0";
        let mut cursor = Cursor::new(data);
        assert_eq!(cursor.read_cstring().unwrap(), "Attack");
        assert_eq!(cursor.position(), 7);
        assert_eq!(cursor.read_cstring().unwrap(), "Idle");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_read_cstring_unterminated() {
        let mut cursor = Cursor::new(b"Attack");
        assert!(matches!(
            cursor.read_cstring(),
            Err(BaevError::UnterminatedString { offset: 0 })
        ));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_read_cstring_invalid_utf8() {
        let mut cursor = Cursor::new(&[0x41, 0xFF, 0x00]);
        assert!(matches!(
            cursor.read_cstring(),
            Err(BaevError::Encoding { offset: 0, .. })
        ));
    }

    #[test]
    fn test_read_fixed_string() {
        let mut data = b"Default".to_vec();
        data.resize(16, 0);
        data.push(0xAA);
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_fixed_string(16).unwrap(), "Default");
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_read_fixed_string_stops_at_first_null() {
        let mut data = b"Default\0junk".to_vec();
        data.resize(16, 0);
        let mut cursor = Cursor::new(&data);
        assert_eq!(cursor.read_fixed_string(16).unwrap(), "Default");
    }

    #[test]
    fn test_read_fixed_string_full_field() {
        let mut cursor = Cursor::new(b"SixteenCharsLong");
        assert_eq!(cursor.read_fixed_string(16).unwrap(), "SixteenCharsLong");
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_writer_seek_and_grow() {
        let mut writer = Writer::with_len(4);
        writer.seek(2);
        writer.write_u32(0xAABBCCDD);
        assert_eq!(writer.len(), 6);

        writer.seek(8);
        writer.write_u8(1);
        assert_eq!(
            writer.into_bytes(),
            vec![0, 0, 0xDD, 0xCC, 0xBB, 0xAA, 0, 0, 1]
        );
    }

    #[test]
    fn test_writer_fixed_string() {
        let mut writer = Writer::new();
        writer.write_fixed_string("name", "Default", 16).unwrap();
        assert_eq!(writer.len(), 16);

        let bytes = writer.into_bytes();
        assert_eq!(Cursor::new(&bytes).read_fixed_string(16).unwrap(), "Default");

        // Exactly full: no terminator
        let mut writer = Writer::new();
        writer
            .write_fixed_string("name", "SixteenCharsLong", 16)
            .unwrap();
        assert_eq!(writer.into_bytes(), b"SixteenCharsLong");

        let mut writer = Writer::new();
        assert!(matches!(
            writer.write_fixed_string("name", "SeventeenCharLong", 16),
            Err(BaevError::FieldTooLong {
                len: 17,
                max: 16,
                ..
            })
        ));
    }

    #[test]
    fn test_align() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(13, 1), 13);
    }
}
