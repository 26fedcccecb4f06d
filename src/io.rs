//! Small I/O helpers used while walking a GIF byte buffer.

use std::io::{Cursor, Read};

/// Wraps a [`Cursor`] and exposes the current read position as a plain byte offset, so that
/// section codecs can report exactly where a [`crate::GifError`] occurred.
pub struct OffsetReader<'a> {
	cursor: Cursor<&'a [u8]>,
}

impl<'a> OffsetReader<'a> {
	pub fn new(data: &'a [u8]) -> Self {
		OffsetReader { cursor: Cursor::new(data) }
	}

	#[inline]
	pub fn position(&self) -> u64 {
		self.cursor.position()
	}

	pub fn remaining(&self) -> &[u8] {
		let pos = self.cursor.position() as usize;
		let data = self.cursor.get_ref();
		&data[pos.min(data.len())..]
	}
}

impl<'a> Read for OffsetReader<'a> {
	fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
		self.cursor.read(buf)
	}
}
