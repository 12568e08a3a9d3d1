//! Byte source abstraction for the [ByteParser](crate::parser::ByteParser).

// =#========================================================================#=
// BYTE SOURCE (Trait)
// =#========================================================================#=
/// Interface of the bytes a [ByteParser](crate::parser::ByteParser) reads from.
pub trait ByteSource {
    /// Returns the current byte without consuming it, `None` at EOF.
    fn peek(&self) -> Option<u8>;

    /// Returns the current byte and advances past it, `None` at EOF.
    fn next_byte(&mut self) -> Option<u8>;

    /// Returns up to `k` bytes from the current position for error context.
    fn get_context(&self, k: usize) -> Vec<u8>;

    /// Returns the current byte offset.
    fn position(&self) -> usize;

    /// Returns `true` at or beyond the end of data.
    fn is_eof(&self) -> bool;
}

// =#========================================================================#=
// IN MEMORY BYTE SOURCE
// =#========================================================================#=
/// Byte source owning all of its data.
pub struct InMemoryByteSource {
    input: Vec<u8>,
    pos: usize,
}

impl InMemoryByteSource {
    /// Creates a source reading `bytes` from the start.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self { input: bytes, pos: 0 }
    }
}

impl ByteSource for InMemoryByteSource {
    #[inline(always)]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline(always)]
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Some(byte)
    }

    fn get_context(&self, k: usize) -> Vec<u8> {
        let start = self.pos.min(self.input.len());
        let end = (self.pos + k).min(self.input.len());
        self.input[start..end].to_vec()
    }

    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
