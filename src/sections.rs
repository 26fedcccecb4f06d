//! Byte layout for everything around the LZW-compressed image data: header, logical screen
//! descriptor, global color table, graphic control extension, image descriptor and trailer.
//! Each section is a fixed little-endian layout; none of it is algorithmically interesting, it
//! just has to agree byte-for-byte with what real GIF readers expect.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::GifError;
use crate::image::{GifVersion, GraphicControl};
use crate::io::OffsetReader;

pub const EXTENSION_INTRODUCER: u8 = 0x21;
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xf9;
pub const IMAGE_DESCRIPTOR_SEPARATOR: u8 = 0x2c;
pub const TRAILER: u8 = 0x3b;

pub fn write_header<W: Write>(writer: &mut W, version: GifVersion) -> Result<(), GifError> {
	writer.write_all(version.signature())?;
	Ok(())
}

pub fn read_header(reader: &mut OffsetReader) -> Result<GifVersion, GifError> {
	let offset = reader.position();
	let mut signature = [0u8; 6];
	reader.read_exact(&mut signature).map_err(|_| GifError::Truncated { section: "header", offset })?;
	match &signature {
		b"GIF87a" => Ok(GifVersion::Gif87a),
		b"GIF89a" => Ok(GifVersion::Gif89a),
		_ => Err(GifError::UnsupportedVersion { offset }),
	}
}

/// The logical screen descriptor's packed byte: global color table flag, color resolution,
/// sort flag and global color table size, as laid out in §4.5.
pub struct LogicalScreenDescriptor {
	pub width: u16,
	pub height: u16,
	pub has_global_color_table: bool,
	pub color_resolution: u8,
	pub sort_flag: bool,
	pub gct_size_n: u8,
	pub background_color_index: u8,
	pub pixel_aspect_ratio: u8,
}

impl LogicalScreenDescriptor {
	fn packed(&self) -> u8 {
		((self.has_global_color_table as u8) << 7)
			| ((self.color_resolution & 0b111) << 4)
			| ((self.sort_flag as u8) << 3)
			| (self.gct_size_n & 0b111)
	}

	fn from_packed(packed: u8) -> (bool, u8, bool, u8) {
		let has_global_color_table = packed & 0b1000_0000 != 0;
		let color_resolution = (packed >> 4) & 0b111;
		let sort_flag = packed & 0b0000_1000 != 0;
		let gct_size_n = packed & 0b111;
		(has_global_color_table, color_resolution, sort_flag, gct_size_n)
	}

	pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), GifError> {
		writer.write_u16::<LittleEndian>(self.width)?;
		writer.write_u16::<LittleEndian>(self.height)?;
		writer.write_u8(self.packed())?;
		writer.write_u8(self.background_color_index)?;
		writer.write_u8(self.pixel_aspect_ratio)?;
		Ok(())
	}

	pub fn read(reader: &mut OffsetReader) -> Result<Self, GifError> {
		let offset = reader.position();
		let read = || -> std::io::Result<Self> {
			let width = reader_u16(reader)?;
			let height = reader_u16(reader)?;
			let packed = reader_u8(reader)?;
			let background_color_index = reader_u8(reader)?;
			let pixel_aspect_ratio = reader_u8(reader)?;
			let (has_global_color_table, color_resolution, sort_flag, gct_size_n) = Self::from_packed(packed);
			Ok(LogicalScreenDescriptor {
				width,
				height,
				has_global_color_table,
				color_resolution,
				sort_flag,
				gct_size_n,
				background_color_index,
				pixel_aspect_ratio,
			})
		}();
		read.map_err(|_| GifError::Truncated { section: "logical screen descriptor", offset })
	}
}

fn reader_u16(reader: &mut OffsetReader) -> std::io::Result<u16> {
	reader.read_u16::<LittleEndian>()
}

fn reader_u8(reader: &mut OffsetReader) -> std::io::Result<u8> {
	reader.read_u8()
}

pub fn write_color_table<W: Write>(writer: &mut W, palette: &[(u8, u8, u8)]) -> Result<(), GifError> {
	for &(r, g, b) in palette {
		writer.write_all(&[r, g, b])?;
	}
	Ok(())
}

pub fn read_color_table(reader: &mut OffsetReader, num_colors: usize) -> Result<Vec<(u8, u8, u8)>, GifError> {
	let offset = reader.position();
	let mut bytes = vec![0u8; num_colors * 3];
	reader.read_exact(&mut bytes).map_err(|_| GifError::Truncated { section: "color table", offset })?;
	Ok(bytes.chunks_exact(3).map(|c| (c[0], c[1], c[2])).collect())
}

pub fn write_graphic_control<W: Write>(writer: &mut W, gce: &GraphicControl) -> Result<(), GifError> {
	writer.write_u8(EXTENSION_INTRODUCER)?;
	writer.write_u8(GRAPHIC_CONTROL_LABEL)?;
	writer.write_u8(4)?; // block size
	writer.write_u8(gce.packed())?;
	writer.write_u16::<LittleEndian>(gce.delay_time)?;
	writer.write_u8(gce.transparent_color_index)?;
	writer.write_u8(0)?; // block terminator
	Ok(())
}

/// Reads a graphic control extension's body; the caller has already consumed the
/// [`EXTENSION_INTRODUCER`] and [`GRAPHIC_CONTROL_LABEL`] bytes that identify it.
pub fn read_graphic_control(reader: &mut OffsetReader) -> Result<GraphicControl, GifError> {
	let offset = reader.position();
	let read = || -> std::io::Result<GraphicControl> {
		let _block_size = reader_u8(reader)?;
		let packed = reader_u8(reader)?;
		let delay_time = reader_u16(reader)?;
		let transparent_color_index = reader_u8(reader)?;
		let _terminator = reader_u8(reader)?;
		Ok(GraphicControl::from_packed(packed, delay_time, transparent_color_index))
	}();
	read.map_err(|_| GifError::Truncated { section: "graphic control extension", offset })
}

pub struct ImageDescriptor {
	pub left: u16,
	pub top: u16,
	pub width: u16,
	pub height: u16,
	pub local_color_table_packed: u8,
}

impl ImageDescriptor {
	pub fn write<W: Write>(&self, writer: &mut W) -> Result<(), GifError> {
		writer.write_u8(IMAGE_DESCRIPTOR_SEPARATOR)?;
		writer.write_u16::<LittleEndian>(self.left)?;
		writer.write_u16::<LittleEndian>(self.top)?;
		writer.write_u16::<LittleEndian>(self.width)?;
		writer.write_u16::<LittleEndian>(self.height)?;
		writer.write_u8(self.local_color_table_packed)?;
		Ok(())
	}

	/// Reads the body of an image descriptor; the caller has already consumed the
	/// [`IMAGE_DESCRIPTOR_SEPARATOR`] byte that identifies it.
	pub fn read(reader: &mut OffsetReader) -> Result<Self, GifError> {
		let offset = reader.position();
		let read = || -> std::io::Result<Self> {
			let left = reader_u16(reader)?;
			let top = reader_u16(reader)?;
			let width = reader_u16(reader)?;
			let height = reader_u16(reader)?;
			let local_color_table_packed = reader_u8(reader)?;
			Ok(ImageDescriptor { left, top, width, height, local_color_table_packed })
		}();
		read.map_err(|_| GifError::Truncated { section: "image descriptor", offset })
	}
}

pub fn write_trailer<W: Write>(writer: &mut W) -> Result<(), GifError> {
	writer.write_u8(TRAILER)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn header_round_trips_both_versions() {
		for version in [GifVersion::Gif87a, GifVersion::Gif89a] {
			let mut bytes = Vec::new();
			write_header(&mut bytes, version).unwrap();
			let mut reader = OffsetReader::new(&bytes);
			assert_eq!(read_header(&mut reader).unwrap(), version);
		}
	}

	#[test]
	fn rejects_unsupported_header() {
		let mut reader = OffsetReader::new(b"GIF86a");
		assert!(matches!(read_header(&mut reader), Err(GifError::UnsupportedVersion { offset: 0 })));
	}

	#[test]
	fn logical_screen_descriptor_round_trips_packed_fields() {
		let lsd = LogicalScreenDescriptor {
			width: 320,
			height: 200,
			has_global_color_table: true,
			color_resolution: 7,
			sort_flag: true,
			gct_size_n: 7,
			background_color_index: 3,
			pixel_aspect_ratio: 0,
		};
		let mut bytes = Vec::new();
		lsd.write(&mut bytes).unwrap();
		assert_eq!(bytes.len(), 7);

		let mut reader = OffsetReader::new(&bytes);
		let read_back = LogicalScreenDescriptor::read(&mut reader).unwrap();
		assert_eq!(read_back.width, 320);
		assert_eq!(read_back.height, 200);
		assert!(read_back.has_global_color_table);
		assert_eq!(read_back.color_resolution, 7);
		assert!(read_back.sort_flag);
		assert_eq!(read_back.gct_size_n, 7);
		assert_eq!(read_back.background_color_index, 3);
	}

	#[test]
	fn graphic_control_uses_authoritative_bit_layout() {
		let gce = GraphicControl {
			disposal_method: 3,
			user_input_flag: false,
			transparent_color_flag: true,
			delay_time: 50,
			transparent_color_index: 9,
		};
		let mut bytes = Vec::new();
		write_graphic_control(&mut bytes, &gce).unwrap();
		assert_eq!(bytes.len(), 8);
		assert_eq!(bytes[0], EXTENSION_INTRODUCER);
		assert_eq!(bytes[1], GRAPHIC_CONTROL_LABEL);
		assert_eq!(bytes[2], 4);
		assert_eq!(bytes[3], 0b0000_1101); // disposal 3 in bits 4..2, transparent bit set
		assert_eq!(bytes[7], 0);

		let mut reader = OffsetReader::new(&bytes[2..]);
		let read_back = read_graphic_control(&mut reader).unwrap();
		assert_eq!(read_back, gce);
	}

	#[test]
	fn image_descriptor_round_trips() {
		let descriptor = ImageDescriptor { left: 1, top: 2, width: 3, height: 4, local_color_table_packed: 0 };
		let mut bytes = Vec::new();
		descriptor.write(&mut bytes).unwrap();
		assert_eq!(bytes[0], IMAGE_DESCRIPTOR_SEPARATOR);

		let mut reader = OffsetReader::new(&bytes[1..]);
		let read_back = ImageDescriptor::read(&mut reader).unwrap();
		assert_eq!(read_back.left, 1);
		assert_eq!(read_back.top, 2);
		assert_eq!(read_back.width, 3);
		assert_eq!(read_back.height, 4);
	}
}
