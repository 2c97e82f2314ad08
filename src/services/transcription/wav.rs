//! RIFF/WAV container decoding for engine-extracted segments.
//!
//! The engine always produces 16-bit little-endian mono PCM, so the only
//! real work is locating the `data` chunk. The chunk walk tolerates extra
//! chunks (`LIST`, `fact`, …); when the walk fails the classic 44-byte
//! header offset is assumed.

use crate::error::CutterError;
use crate::Result;

/// Offset of PCM data in a canonical 44-byte-header WAV file.
const CANONICAL_DATA_OFFSET: usize = 44;

/// Locate the payload of the `data` chunk via RIFF chunk walk.
fn find_data_chunk(bytes: &[u8]) -> Option<&[u8]> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return None;
    }
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let id = &bytes[pos..pos + 4];
        let size = u32::from_le_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]) as usize;
        let body_start = pos + 8;
        if id == b"data" {
            let body_end = (body_start + size).min(bytes.len());
            return Some(&bytes[body_start..body_end]);
        }
        // Chunk bodies are word-aligned.
        pos = body_start + size + (size & 1);
    }
    None
}

/// Decode a WAV file into normalised float samples in [−1.0, 1.0].
///
/// Signed 16-bit little-endian PCM is assumed; the `data` chunk is found
/// by chunk walk with a fallback to byte offset 44.
pub fn decode_wav_samples(bytes: &[u8]) -> Result<Vec<f32>> {
    let data = match find_data_chunk(bytes) {
        Some(data) => data,
        None if bytes.len() > CANONICAL_DATA_OFFSET => &bytes[CANONICAL_DATA_OFFSET..],
        None => {
            return Err(CutterError::TranscriptionFailed(format!(
                "WAV container too short ({} bytes)",
                bytes.len()
            )));
        }
    };

    let samples = data
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(samples: &[i16]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_decode_round_values() {
        let bytes = wav_bytes(&[0, 16384, -16384, 32767, -32768]);
        let samples = decode_wav_samples(&bytes).unwrap();
        assert_eq!(samples.len(), 5);
        assert!((samples[0] - 0.0).abs() < 1e-6);
        assert!((samples[1] - 0.5).abs() < 1e-6);
        assert!((samples[2] + 0.5).abs() < 1e-6);
        assert!(samples[3] <= 1.0 && samples[3] > 0.999);
        assert!((samples[4] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_decode_with_extra_chunk_before_data() {
        // RIFF + fmt + a LIST chunk the walk must skip.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&0u32.to_le_bytes()); // size patched below
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(b"LIST");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(b"INFO");
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&16384i16.to_le_bytes());
        bytes.extend_from_slice(&(-16384i16).to_le_bytes());
        let riff_size = (bytes.len() - 8) as u32;
        bytes[4..8].copy_from_slice(&riff_size.to_le_bytes());

        let samples = decode_wav_samples(&bytes).unwrap();
        assert_eq!(samples.len(), 2);
        assert!((samples[0] - 0.5).abs() < 1e-6);
        assert!((samples[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_fallback_to_canonical_offset() {
        // Not a RIFF container, but longer than 44 bytes: assume a
        // canonical header and read from offset 44.
        let mut bytes = vec![0u8; 44];
        bytes[0..4].copy_from_slice(b"XXXX");
        bytes.extend_from_slice(&16384i16.to_le_bytes());
        let samples = decode_wav_samples(&bytes).unwrap();
        assert_eq!(samples.len(), 1);
        assert!((samples[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_too_short_fails() {
        let err = decode_wav_samples(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CutterError::TranscriptionFailed(_)));
    }

    #[test]
    fn test_truncated_data_chunk_is_clamped() {
        let mut bytes = wav_bytes(&[100, 200, 300]);
        bytes.truncate(bytes.len() - 2);
        let samples = decode_wav_samples(&bytes).unwrap();
        assert_eq!(samples.len(), 2);
    }
}
