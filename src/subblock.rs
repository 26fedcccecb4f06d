//! Sub-block framing for the GIF image-data section.
//!
//! The packed LZW byte stream produced by [`crate::lzw::encode`] is never written to disk
//! directly: it is sliced into a sequence of length-prefixed sub-blocks of at most 255 payload
//! bytes, terminated by a zero-length block. [`deframe`] performs the inverse, concatenating
//! sub-blocks back into one contiguous buffer as it reads them off an [`OffsetReader`].

use std::io::Read;

use crate::error::GifError;
use crate::io::OffsetReader;

/// Splits `data` into sub-blocks of at most `max_len` bytes each (`max_len` itself capped at
/// 255, the one-byte length prefix's limit) and appends the framed bytes, including the
/// terminating zero-length block, to `out`.
pub fn frame(data: &[u8], max_len: u8, out: &mut Vec<u8>) {
	let max_len = max_len.max(1) as usize;
	for chunk in data.chunks(max_len) {
		out.push(chunk.len() as u8);
		out.extend_from_slice(chunk);
	}
	out.push(0);
}

/// Reads a sequence of length-prefixed sub-blocks from `reader`, starting at its current
/// position, concatenating their payloads until the terminating zero-length block is consumed.
pub fn deframe(reader: &mut OffsetReader) -> Result<Vec<u8>, GifError> {
	let mut data = Vec::new();
	loop {
		let offset = reader.position();
		let len = read_u8(reader, "sub-block length", offset)?;
		if len == 0 {
			return Ok(data);
		}
		let mut block = vec![0u8; len as usize];
		let offset = reader.position();
		reader.read_exact(&mut block).map_err(|_| GifError::Truncated { section: "image-data sub-block", offset })?;
		data.extend_from_slice(&block);
	}
}

fn read_u8(reader: &mut OffsetReader, section: &'static str, offset: u64) -> Result<u8, GifError> {
	let mut buf = [0u8; 1];
	reader.read_exact(&mut buf).map_err(|_| GifError::Truncated { section, offset })?;
	Ok(buf[0])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn frames_empty_data_as_single_terminator() {
		let mut out = Vec::new();
		frame(&[], 254, &mut out);
		assert_eq!(out, vec![0]);
	}

	#[test]
	fn frames_data_smaller_than_max_len_as_one_block() {
		let mut out = Vec::new();
		frame(&[1, 2, 3], 254, &mut out);
		assert_eq!(out, vec![3, 1, 2, 3, 0]);
	}

	#[test]
	fn splits_data_longer_than_max_len_across_blocks() {
		let data = vec![7u8; 300];
		let mut out = Vec::new();
		frame(&data, 254, &mut out);

		assert_eq!(out[0], 254);
		assert_eq!(&out[1..255], &data[..254]);
		assert_eq!(out[255], 300 - 254);
		assert_eq!(&out[256..256 + 46], &data[254..]);
		assert_eq!(out[256 + 46], 0);
	}

	#[test]
	fn round_trips_through_deframe() {
		let data: Vec<u8> = (0..=255u16).map(|v| (v % 256) as u8).collect();
		let mut framed = Vec::new();
		frame(&data, 100, &mut framed);
		framed.push(0xAA); // trailing bytes after the terminator should be ignored

		let mut reader = OffsetReader::new(&framed);
		let result = deframe(&mut reader).unwrap();
		assert_eq!(result, data);
	}

	#[test]
	fn every_sub_block_length_is_within_bounds() {
		let data = vec![1u8; 1000];
		let mut out = Vec::new();
		frame(&data, 254, &mut out);

		let mut reader = OffsetReader::new(&out);
		loop {
			let offset = reader.position();
			let len = read_u8(&mut reader, "length", offset).unwrap();
			if len == 0 {
				break;
			}
			assert!(len >= 1 && len <= 255);
			let mut block = vec![0u8; len as usize];
			reader.read_exact(&mut block).unwrap();
		}
	}

	#[test]
	fn deframe_errors_on_truncated_block() {
		let framed = vec![5u8, 1, 2]; // claims 5 bytes, only 2 present
		let mut reader = OffsetReader::new(&framed);
		assert!(matches!(deframe(&mut reader), Err(GifError::Truncated { .. })));
	}
}
