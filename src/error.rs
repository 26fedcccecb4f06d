use thiserror::Error;

/// Errors produced while encoding to or decoding from the GIF file format.
///
/// Decode errors carry the byte offset (relative to the start of the input buffer) at which
/// the problem was detected, where that is meaningful. Encode errors name the offending
/// argument.
#[derive(Error, Debug)]
pub enum GifError {
	#[error("unsupported GIF version header at offset {offset}: expected \"GIF87a\" or \"GIF89a\"")]
	UnsupportedVersion { offset: u64 },

	#[error("input truncated while reading {section} at offset {offset}")]
	Truncated { section: &'static str, offset: u64 },

	#[error("malformed LZW stream at offset {offset}: {reason}")]
	MalformedStream { reason: String, offset: u64 },

	#[error("LZW encoder attempted to assign a code beyond the maximum without emitting CLEAR first")]
	DictionaryOverflow,

	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error("I/O error")]
	Io(#[from] std::io::Error),
}
