//! Captured utterance handling.
//!
//! The browser uploads one WAV file per utterance. It is written to a single
//! reusable path (each capture overwrites the last) and decoded to mono f32
//! samples for the recognizer.

use std::io::Cursor;
use std::path::Path;

use crate::error::SpeechError;

/// Decoded mono PCM audio.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Recording {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Decode an in-memory WAV file, mixing multi-channel audio to mono.
    pub fn from_wav_bytes(bytes: &[u8]) -> Result<Self, SpeechError> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                let max = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max))
                    .collect::<Result<_, _>>()?
            }
            hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        };

        // Mix to mono if stereo.
        let samples = if spec.channels > 1 {
            let ch = spec.channels as usize;
            samples
                .chunks(ch)
                .map(|frame| frame.iter().sum::<f32>() / ch as f32)
                .collect()
        } else {
            samples
        };

        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
        })
    }

    /// Overwrite `path` with the raw upload, then decode it.
    pub fn store_and_decode(path: &Path, bytes: &[u8]) -> Result<Self, SpeechError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes)?;
        let recording = Self::from_wav_bytes(bytes)?;
        tracing::debug!(
            path = %path.display(),
            samples = recording.samples.len(),
            sample_rate = recording.sample_rate,
            "Voice capture stored"
        );
        Ok(recording)
    }

    /// Little-endian 16-bit PCM, as sent to the recognizer.
    pub fn to_linear16(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for &s in &self.samples {
            let v = (s * 32767.0).clamp(-32768.0, 32767.0) as i16;
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }
}

// =============================================================================
// Tests
// =============================================================================
