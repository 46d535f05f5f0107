//! Bounds-checked little-endian reader over `&[u8]`.

use crate::error::MatError;

pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn set_position(&mut self, pos: usize) -> Result<(), MatError> {
        if pos > self.data.len() {
            return Err(MatError::UnexpectedEof);
        }
        self.pos = pos;
        Ok(())
    }

    pub(crate) fn skip(&mut self, n: usize) -> Result<(), MatError> {
        let new_pos = self.pos.checked_add(n).ok_or(MatError::UnexpectedEof)?;
        self.set_position(new_pos)
    }

    pub(crate) fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], MatError> {
        let end = self.pos.checked_add(n).ok_or(MatError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(MatError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn peek_bytes(&self, n: usize) -> Option<&'a [u8]> {
        self.data.get(self.pos..self.pos.checked_add(n)?)
    }

    pub(crate) fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], MatError> {
        let mut buf = [0u8; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, MatError> {
        Ok(self.read_fixed::<1>()?[0])
    }

    pub(crate) fn read_u16_le(&mut self) -> Result<u16, MatError> {
        Ok(u16::from_le_bytes(self.read_fixed()?))
    }

    pub(crate) fn read_u32_le(&mut self) -> Result<u32, MatError> {
        Ok(u32::from_le_bytes(self.read_fixed()?))
    }

    pub(crate) fn read_i32_le(&mut self) -> Result<i32, MatError> {
        Ok(i32::from_le_bytes(self.read_fixed()?))
    }

    /// Read up to (not including) the next `\n`, consuming the newline.
    pub(crate) fn read_line(&mut self) -> Result<&'a [u8], MatError> {
        let rest = &self.data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(MatError::UnexpectedEof)?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }
}
