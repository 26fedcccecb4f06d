//! Encodes and decodes a single still image in the GIF87a/GIF89a graphics interchange format.
//!
//! The crate accepts or produces an indexed bitmap — a palette plus a per-pixel palette index —
//! together with the header metadata (logical screen descriptor, optional graphic control
//! extension, image descriptor) needed to round-trip a GIF file exactly. The hard part is the
//! variable-bit-width LZW codec in [`lzw`]; everything else is straight-line byte layout, laid
//! out module-by-module below.
//!
//! ```
//! use gifcore::{encode, decode, EncodeOptions, GifImage, GifVersion};
//!
//! let image = GifImage {
//!     version: GifVersion::Gif89a,
//!     width: 2,
//!     height: 1,
//!     left: 0,
//!     top: 0,
//!     has_global_color_table: true,
//!     color_resolution: 0,
//!     sort_flag: false,
//!     gct_size_n: 0,
//!     background_color_index: 0,
//!     pixel_aspect_ratio: 0,
//!     local_color_table_packed: 0,
//!     min_code_size: 2,
//!     has_graphic_control: false,
//!     graphic_control: None,
//!     palette: vec![(0, 0, 0), (255, 255, 255)],
//!     indices: vec![0, 1],
//! };
//!
//! let bytes = encode(&image, &EncodeOptions::default()).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded.indices, image.indices);
//! ```

mod bitstream;
mod error;
mod image;
mod io;
mod lzw;
mod sections;
mod subblock;

pub use error::GifError;
pub use image::{GifImage, GifVersion, GraphicControl};
pub use lzw::DEFAULT_MAX_DICT_LEN;

use std::io::Write as _;

use byteorder::{ReadBytesExt, WriteBytesExt};

use io::OffsetReader;
use sections::{
	read_color_table, read_graphic_control, read_header, write_color_table, write_graphic_control, write_header,
	write_trailer, ImageDescriptor, LogicalScreenDescriptor, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL,
	IMAGE_DESCRIPTOR_SEPARATOR, TRAILER,
};

/// The default sub-block length this library emits; any value in `1..=255` is a conformant
/// choice, 254 merely matches what widely-deployed encoders settle on.
pub const DEFAULT_SUB_BLOCK_MAX_LEN: u8 = 254;

/// Tunables for [`encode`] that do not affect decodability, only how the output is shaped.
#[derive(Debug, Copy, Clone)]
pub struct EncodeOptions {
	/// Ceiling on the LZW dictionary before a CLEAR is forced and the dictionary rebuilt.
	pub max_dict_len: u16,
	/// Maximum payload length of an emitted sub-block, `1..=255`.
	pub sub_block_max_len: u8,
}

impl Default for EncodeOptions {
	fn default() -> Self {
		EncodeOptions { max_dict_len: DEFAULT_MAX_DICT_LEN, sub_block_max_len: DEFAULT_SUB_BLOCK_MAX_LEN }
	}
}

/// Encodes `image` as a complete GIF file: header, logical screen descriptor, global color
/// table, optional graphic control extension, image descriptor, LZW image data and trailer —
/// in that order, per §4.5/§4.6.
pub fn encode(image: &GifImage, options: &EncodeOptions) -> Result<Vec<u8>, GifError> {
	image.validate()?;

	let mut out = Vec::new();

	write_header(&mut out, image.version)?;

	let lsd = LogicalScreenDescriptor {
		width: image.width,
		height: image.height,
		has_global_color_table: image.has_global_color_table,
		color_resolution: image.color_resolution,
		sort_flag: image.sort_flag,
		gct_size_n: image.gct_size_n,
		background_color_index: image.background_color_index,
		pixel_aspect_ratio: image.pixel_aspect_ratio,
	};
	lsd.write(&mut out)?;

	if image.has_global_color_table {
		write_color_table(&mut out, &image.palette)?;
	}

	if image.has_graphic_control {
		let gce = image
			.graphic_control
			.as_ref()
			.ok_or_else(|| GifError::InvalidArgument("has_graphic_control is set but graphic_control is None".into()))?;
		write_graphic_control(&mut out, gce)?;
	}

	let descriptor = ImageDescriptor {
		left: image.left,
		top: image.top,
		width: image.width,
		height: image.height,
		local_color_table_packed: image.local_color_table_packed,
	};
	descriptor.write(&mut out)?;

	out.write_u8(image.min_code_size)?;
	let lzw_bytes = lzw::encode(&image.indices, image.min_code_size, options.max_dict_len)?;
	subblock::frame(&lzw_bytes, options.sub_block_max_len, &mut out);

	write_trailer(&mut out)?;

	Ok(out)
}

/// Decodes a complete GIF file back into a [`GifImage`]. Only a single image (the first one
/// found) is returned; multi-frame animation is out of scope (see the crate's Non-goals).
///
/// A missing trailer byte is tolerated (the GIF is still returned); every other structural
/// problem aborts with a typed [`GifError`] naming the failing byte offset where that is
/// meaningful.
pub fn decode(bytes: &[u8]) -> Result<GifImage, GifError> {
	let mut reader = OffsetReader::new(bytes);

	let version = read_header(&mut reader)?;
	let lsd = LogicalScreenDescriptor::read(&mut reader)?;

	let palette = if lsd.has_global_color_table {
		let num_colors = 1usize << (lsd.gct_size_n as u32 + 1);
		read_color_table(&mut reader, num_colors)?
	} else {
		Vec::new()
	};

	let mut has_graphic_control = false;
	let mut graphic_control = None;

	loop {
		let offset = reader.position();
		let current_byte = match reader.read_u8() {
			Ok(b) => b,
			Err(_) => return Err(GifError::Truncated { section: "image descriptor or trailer", offset }),
		};

		match current_byte {
			TRAILER => {
				return Err(GifError::Truncated { section: "image descriptor", offset });
			}
			EXTENSION_INTRODUCER => {
				let label_offset = reader.position();
				let label = reader
					.read_u8()
					.map_err(|_| GifError::Truncated { section: "extension label", offset: label_offset })?;
				if label != GRAPHIC_CONTROL_LABEL {
					return Err(GifError::MalformedStream {
						reason: format!("unsupported extension label 0x{label:02x} (only graphic control is supported)"),
						offset: label_offset,
					});
				}
				has_graphic_control = true;
				graphic_control = Some(read_graphic_control(&mut reader)?);
			}
			IMAGE_DESCRIPTOR_SEPARATOR => break,
			other => {
				return Err(GifError::MalformedStream {
					reason: format!(
						"unexpected byte 0x{other:02x}: not an extension introducer, image descriptor separator, or trailer"
					),
					offset,
				});
			}
		}
	}

	let descriptor = ImageDescriptor::read(&mut reader)?;

	if descriptor.local_color_table_packed & 0b1000_0000 != 0 {
		let n = descriptor.local_color_table_packed & 0b111;
		let num_colors = 1usize << (n as u32 + 1);
		let _ = read_color_table(&mut reader, num_colors)?; // local color tables are out of scope
	}

	let min_code_size_offset = reader.position();
	let min_code_size =
		reader.read_u8().map_err(|_| GifError::Truncated { section: "min code size", offset: min_code_size_offset })?;

	let lzw_bytes = subblock::deframe(&mut reader)?;
	let indices = lzw::decode(&lzw_bytes, min_code_size, min_code_size_offset)?;

	let expected_len = descriptor.width as usize * descriptor.height as usize;
	if indices.len() != expected_len {
		return Err(GifError::MalformedStream {
			reason: format!(
				"decoded {} pixels, but the image descriptor declares {}x{} = {}",
				indices.len(),
				descriptor.width,
				descriptor.height,
				expected_len
			),
			offset: min_code_size_offset,
		});
	}

	// a missing or absent trailer byte is tolerated, not an error
	let _ = reader.read_u8();

	Ok(GifImage {
		version,
		width: descriptor.width,
		height: descriptor.height,
		left: descriptor.left,
		top: descriptor.top,
		has_global_color_table: lsd.has_global_color_table,
		color_resolution: lsd.color_resolution,
		sort_flag: lsd.sort_flag,
		gct_size_n: lsd.gct_size_n,
		background_color_index: lsd.background_color_index,
		pixel_aspect_ratio: lsd.pixel_aspect_ratio,
		local_color_table_packed: descriptor.local_color_table_packed,
		min_code_size,
		has_graphic_control,
		graphic_control,
		palette,
		indices,
	})
}

/// Encodes `image` and writes it to a file at `path`, overwriting any existing file. A trivial
/// adapter over [`encode`] — spec.md §1 treats file I/O as an external collaborator, not part of
/// the core.
pub fn encode_to_file(path: &std::path::Path, image: &GifImage, options: &EncodeOptions) -> Result<(), GifError> {
	let bytes = encode(image, options)?;
	let file = std::fs::File::create(path)?;
	let mut writer = std::io::BufWriter::new(file);
	writer.write_all(&bytes)?;
	Ok(())
}

/// Reads the file at `path` into memory and decodes it. A trivial adapter over [`decode`].
pub fn decode_from_file(path: &std::path::Path) -> Result<GifImage, GifError> {
	let bytes = std::fs::read(path)?;
	decode(&bytes)
}
