//! GIF-variant LZW (Lempel-Ziv-Welch) compression and decompression.
//!
//! This is the dictionary coder at the center of the GIF image-data section. Two reserved
//! codes bracket the palette's own codes: `CLEAR = 1 << min_code_size` resets the dictionary
//! and code width, `EOI = CLEAR + 1` ends the stream. Code width starts at
//! `min_code_size + 1` and grows by one bit each time the dictionary gains a code that no
//! longer fits, capping at 12 bits.
//!
//! The output of [`encode`] and the input to [`decode`] are the *unframed* LZW code stream;
//! splitting it into GIF sub-blocks is handled by [`crate::subblock`].

use std::collections::HashMap;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::GifError;

const MAX_BITS: u8 = 12;
const MAX_CODE_VALUE: u16 = (1u16 << MAX_BITS) - 1; // 4095

/// Default ceiling on the number of codes the dictionary may hold before a CLEAR is forced;
/// the widely interoperable choice, and the default named by [`crate::EncodeOptions`].
pub const DEFAULT_MAX_DICT_LEN: u16 = 4096;

/// Validates a caller-supplied `min_code_size` for [`encode`]: out of range here is a contract
/// violation by the caller, per spec.md §7's `InvalidArgument` taxonomy.
fn validate_min_code_size_for_encode(min_code_size: u8) -> Result<(), GifError> {
	if !(2..=8).contains(&min_code_size) {
		return Err(GifError::InvalidArgument(format!(
			"min_code_size must be in 2..=8, got {min_code_size}"
		)));
	}
	Ok(())
}

/// Validates a `min_code_size` byte read back out of an untrusted stream for [`decode`]: out of
/// range here is a stream-integrity problem, not a caller argument, per spec.md §7's
/// `MalformedStream` taxonomy. `offset` is the byte position of the min-code-size byte itself.
fn validate_min_code_size_for_decode(min_code_size: u8, offset: u64) -> Result<(), GifError> {
	if !(2..=8).contains(&min_code_size) {
		return Err(GifError::MalformedStream {
			reason: format!("min_code_size must be in 2..=8, got {min_code_size}"),
			offset,
		});
	}
	Ok(())
}

fn initial_table(min_code_size: u8) -> HashMap<Vec<u8>, u16> {
	let initial_table_size = 1usize << min_code_size;
	let mut table = HashMap::with_capacity(initial_table_size + 2);
	for i in 0..initial_table_size {
		table.insert(vec![i as u8], i as u16);
	}
	table
}

/// Encodes a sequence of palette indices (each expected to be `< 1 << min_code_size`) into a
/// packed LZW code stream. `max_dict_len` bounds the dictionary size before a CLEAR is
/// emitted and the dictionary rebuilt; the GIF-conventional value is
/// [`DEFAULT_MAX_DICT_LEN`].
pub fn encode(indices: &[u8], min_code_size: u8, max_dict_len: u16) -> Result<Vec<u8>, GifError> {
	validate_min_code_size_for_encode(min_code_size)?;
	if !(3..=DEFAULT_MAX_DICT_LEN).contains(&max_dict_len) {
		return Err(GifError::InvalidArgument(format!(
			"max_dict_len must be in 3..={DEFAULT_MAX_DICT_LEN}, got {max_dict_len}"
		)));
	}

	let clear_code = 1u16 << min_code_size;
	let end_of_info_code = clear_code + 1;

	let mut writer = BitWriter::new();
	let mut code_size = min_code_size + 1;
	writer.push(clear_code, code_size);

	if indices.is_empty() {
		writer.push(end_of_info_code, code_size);
		writer.flush();
		return Ok(writer.into_bytes());
	}

	for (i, &index) in indices.iter().enumerate() {
		if index as u16 >= clear_code {
			return Err(GifError::InvalidArgument(format!(
				"palette index {index} at position {i} is not < {clear_code} (1 << min_code_size)"
			)));
		}
	}

	let mut table = initial_table(min_code_size);
	let mut next_code = end_of_info_code + 1;

	let mut buffer = vec![indices[0]];

	for &byte in &indices[1..] {
		let mut candidate = buffer.clone();
		candidate.push(byte);

		if table.contains_key(&candidate) {
			buffer = candidate;
			continue;
		}

		let code = *table.get(&buffer).expect("buffer is always a known dictionary entry");
		writer.push(code, code_size);

		if next_code == max_dict_len {
			writer.push(clear_code, code_size);
			table = initial_table(min_code_size);
			next_code = end_of_info_code + 1;
			code_size = min_code_size + 1;
		} else {
			if next_code > MAX_CODE_VALUE {
				return Err(GifError::DictionaryOverflow);
			}
			table.insert(candidate, next_code);
			next_code += 1;
			if next_code >= (1u16 << code_size) && code_size < MAX_BITS {
				code_size += 1;
			}
		}

		buffer = vec![byte];
	}

	let code = *table.get(&buffer).expect("final buffer is always a known dictionary entry");
	writer.push(code, code_size);
	writer.push(end_of_info_code, code_size);
	writer.flush();

	Ok(writer.into_bytes())
}

/// Decodes a packed LZW code stream (as produced by [`encode`], prior to sub-block framing)
/// back into the original sequence of palette indices. `min_code_size_offset` is the byte
/// position of the min-code-size byte in the overall file, used only to stamp a
/// [`GifError::MalformedStream`] if `min_code_size` itself turns out to be out of range.
pub fn decode(data: &[u8], min_code_size: u8, min_code_size_offset: u64) -> Result<Vec<u8>, GifError> {
	validate_min_code_size_for_decode(min_code_size, min_code_size_offset)?;

	let clear_code = 1u16 << min_code_size;
	let end_of_info_code = clear_code + 1;
	let initial_table_size = clear_code as usize;

	let mut reader = BitReader::new(data);
	let mut code_size = min_code_size + 1;
	let mut out = Vec::new();

	let offset = reader.byte_offset();
	let first = read_code(&mut reader, code_size, offset)?;
	if first != clear_code {
		return Err(GifError::MalformedStream {
			reason: "first code in image-data stream was not CLEAR".to_string(),
			offset,
		});
	}

	'outer: loop {
		let mut table: Vec<Vec<u8>> = Vec::with_capacity(DEFAULT_MAX_DICT_LEN as usize);
		for i in 0..initial_table_size {
			table.push(vec![i as u8]);
		}
		table.push(Vec::new()); // clear_code placeholder, never indexed
		table.push(Vec::new()); // end_of_info_code placeholder, never indexed
		let mut next_code = table.len() as u16;

		let offset = reader.byte_offset();
		let code = read_code(&mut reader, code_size, offset)?;
		if code == end_of_info_code {
			return Ok(out);
		}
		if code as usize >= table.len() {
			return Err(GifError::MalformedStream {
				reason: format!("code {code} referenced before it was ever assigned"),
				offset,
			});
		}
		out.extend_from_slice(&table[code as usize]);
		let mut prev_code = code;

		loop {
			let offset = reader.byte_offset();
			let code = read_code(&mut reader, code_size, offset)?;

			if code == end_of_info_code {
				break 'outer;
			}
			if code == clear_code {
				code_size = min_code_size + 1;
				continue 'outer;
			}

			let prev_entry = table[prev_code as usize].clone();

			let entry = if (code as usize) < table.len() {
				table[code as usize].clone()
			} else if code as usize == table.len() {
				let k = prev_entry[0];
				let mut entry = prev_entry.clone();
				entry.push(k);
				entry
			} else {
				return Err(GifError::MalformedStream {
					reason: format!("code {code} is larger than the next code to be assigned"),
					offset,
				});
			};

			out.extend_from_slice(&entry);

			let k = entry[0];
			let mut new_entry = prev_entry;
			new_entry.push(k);
			table.push(new_entry);
			next_code += 1;

			if next_code as u16 >= (1u16 << code_size) && code_size < MAX_BITS {
				code_size += 1;
			}

			prev_code = code;
		}
	}

	Ok(out)
}

fn read_code(reader: &mut BitReader, code_size: u8, offset: u64) -> Result<u16, GifError> {
	reader.read(code_size).map(|v| v as u16).ok_or(GifError::MalformedStream {
		reason: "code stream ended before EOI was read".to_string(),
		offset,
	})
}

#[cfg(test)]
mod tests {
	use claim::assert_matches;

	use super::*;

	struct LzwTestData<'a> {
		min_code_size: u8,
		packed: &'a [u8],
		unpacked: &'a [u8],
	}

	// Same reference fixtures the GIF-variant LZW implementation in this codebase's teacher
	// crate has long been validated against.
	static LZW_TEST_DATA: &[LzwTestData] = &[
		LzwTestData {
			min_code_size: 2,
			packed: &[
				0x8c, 0x2d, 0x99, 0x87, 0x2a, 0x1c, 0xdc, 0x33, 0xa0, 0x02, 0x75, 0xec, 0x95, 0xfa, 0xa8, 0xde, 0x60,
				0x8c, 0x04, 0x91, 0x4c, 0x01,
			],
			unpacked: &[
				1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 0,
				0, 0, 0, 2, 2, 2, 1, 1, 1, 0, 0, 0, 0, 2, 2, 2, 2, 2, 2, 0, 0, 0, 0, 1, 1, 1, 2, 2, 2, 0, 0, 0, 0, 1,
				1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 1, 1, 1, 1, 1,
			],
		},
		LzwTestData {
			min_code_size: 4,
			packed: &[
				0x70, 0x49, 0x79, 0x6a, 0x9d, 0xcb, 0x39, 0x7b, 0xa6, 0xd6, 0x96, 0xa4, 0x3d, 0x0f, 0xd8, 0x8d, 0x64,
				0xb9, 0x1d, 0x28, 0xa9, 0x2d, 0x15, 0xfa, 0xc2, 0xf1, 0x37, 0x71, 0x33, 0xc5, 0x61, 0x4b, 0x04,
			],
			unpacked: &[
				11, 11, 11, 11, 11, 7, 7, 7, 7, 7, 11, 11, 11, 11, 14, 14, 7, 7, 7, 7, 11, 11, 11, 14, 14, 14, 14, 7,
				7, 7, 11, 11, 14, 14, 15, 15, 14, 14, 7, 7, 11, 14, 14, 15, 15, 15, 15, 14, 14, 7, 7, 14, 14, 15, 15,
				15, 15, 14, 14, 11, 7, 7, 14, 14, 15, 15, 14, 14, 11, 11, 7, 7, 7, 14, 14, 14, 14, 11, 11, 11, 7, 7,
				7, 7, 14, 14, 11, 11, 11, 11, 7, 7, 7, 7, 7, 11, 11, 11, 11, 11,
			],
		},
		LzwTestData {
			min_code_size: 8,
			packed: &[0x00, 0x51, 0xfc, 0x1b, 0x28, 0x70, 0xa0, 0xc1, 0x83, 0x01, 0x01],
			unpacked: &[0x28, 0xff, 0xff, 0xff, 0x28, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
		},
	];

	#[test]
	fn compresses_known_sequences() {
		for data in LZW_TEST_DATA {
			let encoded = encode(data.unpacked, data.min_code_size, DEFAULT_MAX_DICT_LEN).unwrap();
			assert_eq!(encoded, data.packed, "min_code_size {}", data.min_code_size);
		}
	}

	#[test]
	fn decompresses_known_sequences() {
		for data in LZW_TEST_DATA {
			let decoded = decode(data.packed, data.min_code_size, 0).unwrap();
			assert_eq!(decoded, data.unpacked, "min_code_size {}", data.min_code_size);
		}
	}

	#[test]
	fn round_trips_empty_input() {
		let encoded = encode(&[], 2, DEFAULT_MAX_DICT_LEN).unwrap();
		let decoded = decode(&encoded, 2, 0).unwrap();
		assert!(decoded.is_empty());
	}

	#[test]
	fn round_trips_single_pixel() {
		let encoded = encode(&[0], 2, DEFAULT_MAX_DICT_LEN).unwrap();
		let decoded = decode(&encoded, 2, 0).unwrap();
		assert_eq!(decoded, vec![0]);
	}

	#[test]
	fn round_trips_highly_compressible_run() {
		let indices = vec![7u8; 16];
		let encoded = encode(&indices, 4, DEFAULT_MAX_DICT_LEN).unwrap();
		let decoded = decode(&encoded, 4, 0).unwrap();
		assert_eq!(decoded, indices);
	}

	#[test]
	fn round_trips_across_a_dictionary_reset() {
		// enough varied data over an 8-bit palette to force at least one CLEAR mid-stream
		let mut indices = Vec::new();
		for i in 0..10_000u32 {
			indices.push(((i * 37 + i / 13) % 256) as u8);
		}
		let encoded = encode(&indices, 8, DEFAULT_MAX_DICT_LEN).unwrap();
		let decoded = decode(&encoded, 8, 0).unwrap();
		assert_eq!(decoded, indices);
	}

	#[test]
	fn rejects_stream_not_starting_with_clear() {
		let mut writer = BitWriter::new();
		writer.push(0, 3); // anything other than the clear code (4) at width 3
		writer.flush();
		let bytes = writer.into_bytes();

		let result = decode(&bytes, 2, 0);
		assert_matches!(result, Err(GifError::MalformedStream { .. }));
	}

	#[test]
	fn reports_the_real_offset_of_a_malformed_code() {
		// min_code_size=3: CLEAR=8, width 4. CLEAR and one valid data code (0) consume exactly
		// one whole byte (8 bits), so the undefined code 11 that follows (table.len() is only
		// 10 at that point) is detected with the reader's cursor at byte offset 1, not 0.
		let mut writer = BitWriter::new();
		writer.push(8, 4);
		writer.push(0, 4);
		writer.push(11, 4);
		writer.flush();
		let bytes = writer.into_bytes();

		let result = decode(&bytes, 3, 0);
		assert_matches!(result, Err(GifError::MalformedStream { offset: 1, .. }));
	}

	#[test]
	fn rejects_out_of_range_palette_index() {
		let result = encode(&[4], 2, DEFAULT_MAX_DICT_LEN);
		assert_matches!(result, Err(GifError::InvalidArgument(_)));
	}

	#[test]
	fn rejects_min_code_size_out_of_range() {
		assert_matches!(encode(&[0], 1, DEFAULT_MAX_DICT_LEN), Err(GifError::InvalidArgument(_)));
		assert_matches!(encode(&[0], 9, DEFAULT_MAX_DICT_LEN), Err(GifError::InvalidArgument(_)));
		assert_matches!(decode(&[0], 1, 17), Err(GifError::MalformedStream { offset: 17, .. }));
	}
}
