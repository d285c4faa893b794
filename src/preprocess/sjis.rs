//! # Shift-JIS Decoding
//!
//! Script source files are historically authored and saved as Shift-JIS.
//! Decoding happens once, at the very start of preprocessing, so every
//! later phase (lexer, parser) works purely in UTF-8 and counts columns in
//! Unicode code points.
//!
//! A malformed byte sequence fails the decode outright rather than being
//! replaced with U+FFFD: a silently-substituted character would desync
//! every line/column reported from that point on, which is worse than
//! refusing the file and naming the bad byte.

use encoding_rs::SHIFT_JIS;

/// The decoded text stopped at the first malformed byte sequence.
/// `byte_offset` is the offset into the original `bytes` slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub byte_offset: usize,
}

/// Decode `bytes` as Shift-JIS, failing at the first invalid sequence.
pub fn decode(bytes: &[u8]) -> Result<String, DecodeError> {
    let mut decoder = SHIFT_JIS.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(bytes.len());
    let mut consumed = 0usize;

    loop {
        let (result, read, _written) =
            decoder.decode_to_string_without_replacement(&bytes[consumed..], &mut out, true);
        consumed += read;
        match result {
            encoding_rs::DecoderResult::InputEmpty => return Ok(out),
            encoding_rs::DecoderResult::OutputFull => continue,
            encoding_rs::DecoderResult::Malformed(_, _) => {
                return Err(DecodeError {
                    byte_offset: consumed,
                });
            }
        }
    }
}
