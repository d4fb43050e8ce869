//! zlib layer.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::DecodeError;

const CHUNK: usize = 4096;

/// Inflates a zlib (RFC 1950) stream.
///
/// The stream must reach its end marker and pass the Adler-32 check; a
/// stream that runs out of input first is reported as truncated.
/// Anything after the end marker is ignored.
pub fn inflate(compressed: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut stream = Decompress::new(true);
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(2).max(CHUNK));

    loop {
        if out.len() == out.capacity() {
            out.reserve(CHUNK);
        }
        let consumed = stream.total_in() as usize;
        let produced = stream.total_out();
        let status = stream
            .decompress_vec(&compressed[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| DecodeError::Inflate(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                if stream.total_in() as usize == consumed && stream.total_out() == produced {
                    return Err(DecodeError::Inflate(format!(
                        "truncated stream after {} bytes",
                        consumed
                    )));
                }
            }
        }
    }

    tracing::debug!(compressed = compressed.len(), inflated = out.len(), "inflated token");
    Ok(out)
}
