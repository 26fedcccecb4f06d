//! The in-memory representation exchanged with callers of [`crate::encode`] and
//! [`crate::decode`]: an indexed bitmap (palette plus per-pixel palette index) together with
//! the header metadata needed to round-trip a GIF file exactly.

use crate::error::GifError;

/// Which of the two GIF format revisions a file declares in its 6-byte header.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GifVersion {
	Gif87a,
	Gif89a,
}

impl GifVersion {
	pub(crate) fn signature(self) -> &'static [u8; 6] {
		match self {
			GifVersion::Gif87a => b"GIF87a",
			GifVersion::Gif89a => b"GIF89a",
		}
	}
}

/// The graphic control extension: disposal, timing and transparency metadata for the image.
///
/// The packed byte on disk follows the GIF89a-authoritative layout (`disposal_method` in bits
/// 4..2, `user_input_flag` in bit 1, `transparent_color_flag` in bit 0), not the non-conformant
/// layout some encoders in the wild still emit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct GraphicControl {
	/// How the image is disposed of before the next frame is rendered; `0..=7` (only `0..=3`
	/// are defined by the format, the rest are reserved).
	pub disposal_method: u8,
	pub user_input_flag: bool,
	pub transparent_color_flag: bool,
	/// Hundredths of a second to wait before moving on; `0` means "no delay specified".
	pub delay_time: u16,
	pub transparent_color_index: u8,
}

impl GraphicControl {
	pub(crate) fn packed(&self) -> u8 {
		((self.disposal_method & 0b111) << 2)
			| ((self.user_input_flag as u8) << 1)
			| (self.transparent_color_flag as u8)
	}

	pub(crate) fn from_packed(packed: u8, delay_time: u16, transparent_color_index: u8) -> Self {
		GraphicControl {
			disposal_method: (packed >> 2) & 0b111,
			user_input_flag: packed & 0b10 != 0,
			transparent_color_flag: packed & 0b1 != 0,
			delay_time,
			transparent_color_index,
		}
	}
}

/// A single still GIF image: header metadata, an optional global color table, optional
/// graphic-control metadata, and the indexed pixel data.
///
/// See the crate-level invariants enforced by [`GifImage::validate`]; [`crate::encode`] calls
/// it before doing any work.
#[derive(Debug, Clone, PartialEq)]
pub struct GifImage {
	pub version: GifVersion,
	pub width: u16,
	pub height: u16,
	pub left: u16,
	pub top: u16,
	pub has_global_color_table: bool,
	/// Original source color bits per channel minus one; informational only, `0..=7`.
	pub color_resolution: u8,
	pub sort_flag: bool,
	/// The global color table holds `2^(gct_size_n + 1)` entries; `0..=7`.
	pub gct_size_n: u8,
	pub background_color_index: u8,
	/// `0` means "no pixel aspect ratio information".
	pub pixel_aspect_ratio: u8,
	/// The image descriptor's local-color-table packed byte, preserved verbatim; this library
	/// never produces a local color table of its own.
	pub local_color_table_packed: u8,
	/// The LZW initial code size, `2..=8`.
	pub min_code_size: u8,
	pub has_graphic_control: bool,
	pub graphic_control: Option<GraphicControl>,
	/// RGB triplets; length is `2^(gct_size_n + 1)` when `has_global_color_table` is set.
	pub palette: Vec<(u8, u8, u8)>,
	/// Row-major palette indices, `width * height` of them.
	pub indices: Vec<u8>,
}

impl GifImage {
	/// Checks the §3 invariants that [`crate::encode`] relies on: pixels within palette range,
	/// a power-of-two palette between 2 and 256 entries, a `min_code_size` that can represent
	/// every palette index and leaves room for the CLEAR/EOI reserved codes, and an index
	/// count matching the declared dimensions exactly.
	pub fn validate(&self) -> Result<(), GifError> {
		if !(2..=8).contains(&self.min_code_size) {
			return Err(GifError::InvalidArgument(format!(
				"min_code_size must be in 2..=8, got {}",
				self.min_code_size
			)));
		}

		if self.palette.len() < 2 || self.palette.len() > 256 || !self.palette.len().is_power_of_two() {
			return Err(GifError::InvalidArgument(format!(
				"palette length must be a power of two in 2..=256, got {}",
				self.palette.len()
			)));
		}

		if self.indices.len() != self.width as usize * self.height as usize {
			return Err(GifError::InvalidArgument(format!(
				"indices length {} does not match width*height {}",
				self.indices.len(),
				self.width as usize * self.height as usize
			)));
		}

		let clear_code = 1u16 << self.min_code_size;
		for (i, &index) in self.indices.iter().enumerate() {
			if index as usize >= self.palette.len() {
				return Err(GifError::InvalidArgument(format!(
					"pixel {i} has palette index {index}, but the palette only has {} entries",
					self.palette.len()
				)));
			}
			if index as u16 >= clear_code {
				return Err(GifError::InvalidArgument(format!(
					"pixel {i} has palette index {index}, which collides with the CLEAR/EOI codes reserved above {clear_code}"
				)));
			}
		}

		Ok(())
	}
}
