//! Forward-only reader over the fuzz input.
//!
//! Short reads never fail. When fewer bytes remain than a primitive needs,
//! the read yields zero and the cursor stays where it is, so the interpreter
//! is total over truncated inputs.

/// Read-only cursor over an input buffer.
///
/// `position() + remaining()` always equals the length of the buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Takes exactly `N` bytes, or returns `[0; N]` without advancing.
    pub fn take_fixed<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        if self.remaining() >= N {
            out.copy_from_slice(&self.data[self.pos..self.pos + N]);
            self.pos += N;
        }
        out
    }

    /// Takes up to `len` bytes; the returned slice is shorter at end of input.
    pub fn take_slice(&mut self, len: usize) -> &'a [u8] {
        let len = len.min(self.remaining());
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    #[inline]
    pub fn take_u8(&mut self) -> u8 {
        self.take_fixed::<1>()[0]
    }

    #[inline]
    pub fn take_u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take_fixed())
    }

    #[inline]
    pub fn take_i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take_fixed())
    }

    #[inline]
    pub fn take_u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take_fixed())
    }

    /// Eight bytes reinterpreted as an IEEE-754 binary64.
    #[inline]
    pub fn take_f64(&mut self) -> f64 {
        f64::from_le_bytes(self.take_fixed())
    }

    /// Next opcode byte, or `None` once the input is exhausted.
    pub fn take_opcode(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }
}
