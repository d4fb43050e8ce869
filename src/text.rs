//! Base45 text layer (RFC 9285).

use crate::error::DecodeError;

pub const ALPHABET: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

/// Decodes Base45 `text` into the bytes it encodes.
///
/// Every failure is classified before the `base45` crate runs, so that
/// callers can tell a stray character from a bad length or group value.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    if let Some((position, character)) = text
        .chars()
        .enumerate()
        .find(|&(_, c)| !c.is_ascii() || !ALPHABET.contains(&(c as u8)))
    {
        return Err(DecodeError::InvalidCharacter {
            character,
            position,
        });
    }

    let invalid_length = DecodeError::InvalidLength { length: text.len() };
    if text.len() % 3 == 1 {
        return Err(invalid_length);
    }

    // A group must fit the bytes it stands for: 3 characters to 2 bytes,
    // a trailing pair to 1 byte.
    for group in text.as_bytes().chunks(3) {
        let value = group.iter().rev().fold(0u32, |acc, &c| acc * 45 + digit(c));
        let max = if group.len() == 3 { 0xFFFF } else { 0xFF };
        if value > max {
            return Err(invalid_length);
        }
    }

    let bytes = base45::decode(text).map_err(|_| invalid_length)?;
    tracing::trace!(chars = text.len(), bytes = bytes.len(), "base45 decoded");
    Ok(bytes)
}

// Callers only pass characters already checked against ALPHABET.
fn digit(c: u8) -> u32 {
    ALPHABET.iter().position(|&a| a == c).unwrap_or(0) as u32
}
