//! WAV output for synthesized speech
//!
//! Provides:
//! - 16-bit PCM WAV saving
//! - Chunk concatenation along the time axis
//! - Artifact naming `<engine>_<mode>[_<language>]_<millis>.wav`

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::error::{AudioOperation, Result, TtsError};

/// Last stamp handed out by [`unique_millis`]
static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Audio output handler for saving synthesized waveforms
pub struct AudioOutput;

impl AudioOutput {
    /// Save audio samples to a WAV file (16-bit PCM, mono)
    ///
    /// # Arguments
    /// * `samples` - Audio samples (f32, normalized to [-1, 1])
    /// * `sample_rate` - Sample rate in Hz
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(samples: &[f32], sample_rate: u32, path: P) -> Result<()> {
        let path = path.as_ref();
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = hound::WavWriter::create(path, spec).map_err(|e| TtsError::Audio {
            message: format!("Failed to create WAV file {:?}: {}", path, e),
            operation: AudioOperation::Saving,
        })?;

        for &sample in samples {
            let scaled = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            writer.write_sample(scaled)?;
        }

        writer.finalize()?;
        Ok(())
    }
}

/// Concatenate chunk buffers into one waveform
pub fn concat_chunks(chunks: Vec<Vec<f32>>) -> Result<Vec<f32>> {
    if chunks.is_empty() {
        return Err(TtsError::Audio {
            message: "no chunks to concatenate".to_string(),
            operation: AudioOperation::Concatenation,
        });
    }
    let total = chunks.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(total);
    for chunk in chunks {
        out.extend(chunk);
    }
    Ok(out)
}

/// Millisecond wall-clock stamp, strictly increasing within the process
pub fn unique_millis() -> u64 {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut prev = LAST_STAMP.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST_STAMP.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Build an artifact file name for one synthesis call
pub fn output_file_name(engine: &str, mode: &str, language: Option<&str>) -> String {
    let stamp = unique_millis();
    match language {
        Some(lang) => format!("{}_{}_{}_{}.wav", engine, mode, lang, stamp),
        None => format!("{}_{}_{}.wav", engine, mode, stamp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_pcm16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.wav");
        AudioOutput::save(&[0.0, 0.5, -1.0, 2.0], 22050, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 16383, -32767, 32767]);
    }

    #[test]
    fn test_concat_preserves_order() {
        let joined = concat_chunks(vec![vec![0.1, 0.2], vec![], vec![0.3]]).unwrap();
        assert_eq!(joined, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_concat_rejects_empty() {
        assert!(concat_chunks(Vec::new()).is_err());
    }

    #[test]
    fn test_unique_millis_strictly_increasing() {
        let a = unique_millis();
        let b = unique_millis();
        let c = unique_millis();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_output_file_name_shapes() {
        let plain = output_file_name("cached_identity", "zero_shot", None);
        assert!(plain.starts_with("cached_identity_zero_shot_"));
        assert!(plain.ends_with(".wav"));

        let tagged = output_file_name("cached_identity", "cross_lingual", Some("fr"));
        assert!(tagged.starts_with("cached_identity_cross_lingual_fr_"));
    }
}
