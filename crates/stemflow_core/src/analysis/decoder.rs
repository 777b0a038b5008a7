//! FFmpeg audio decoding.
//!
//! Decodes any container ffmpeg understands, downmixes to mono,
//! resamples to the analysis rate and pipes raw f32 samples back.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::analysis::types::{AnalysisError, AnalysisResult, AudioBuffer};

/// Sample rate used for all analysis.
pub const ANALYSIS_SAMPLE_RATE: u32 = 44_100;

/// Decode `input_path` to mono f32 at `sample_rate`.
pub fn decode_audio(ffmpeg: &str, input_path: &Path, sample_rate: u32) -> AnalysisResult<AudioBuffer> {
    if !input_path.is_file() {
        return Err(AnalysisError::SourceNotFound(input_path.to_path_buf()));
    }

    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-nostdin")
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(input_path)
        .arg("-vn")
        .arg("-ac")
        .arg("1")
        .arg("-ar")
        .arg(sample_rate.to_string())
        .arg("-f")
        .arg("f32le")
        .arg("-acodec")
        .arg("pcm_f32le")
        .arg("pipe:1");

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    tracing::debug!("Running FFmpeg decode: {:?}", cmd);

    let mut child = cmd
        .spawn()
        .map_err(|e| AnalysisError::Decode(format!("failed to start {}: {}", ffmpeg, e)))?;

    // Drain stderr separately so a chatty decoder cannot block on a full pipe.
    let stderr_thread = child.stderr.take().map(|mut stderr| {
        thread::spawn(move || {
            let mut text = String::new();
            let _ = stderr.read_to_string(&mut text);
            text
        })
    });

    let mut buffer = Vec::new();
    let read_result = match child.stdout.take() {
        Some(mut stdout) => stdout.read_to_end(&mut buffer).map(|_| ()),
        None => Ok(()),
    };

    let status = child
        .wait()
        .map_err(|e| AnalysisError::Decode(format!("{} process error: {}", ffmpeg, e)))?;
    let stderr_text = stderr_thread
        .and_then(|h| h.join().ok())
        .unwrap_or_default();

    read_result.map_err(|e| AnalysisError::Decode(format!("failed to read decoder output: {}", e)))?;

    if !status.success() {
        let detail = stderr_text
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("no diagnostic output");
        return Err(AnalysisError::Decode(format!(
            "{} exited with code {:?}: {}",
            ffmpeg,
            status.code(),
            detail.trim()
        )));
    }

    let samples = bytes_to_f32_samples(&buffer);
    if samples.is_empty() {
        return Err(AnalysisError::Decode(format!(
            "no audio samples in {}",
            input_path.display()
        )));
    }

    tracing::debug!(
        "Decoded {} samples ({:.2}s) from {}",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        input_path.display()
    );

    Ok(AudioBuffer::new(samples, sample_rate))
}

/// Convert little-endian f32 bytes to samples. A trailing partial sample is dropped.
pub fn bytes_to_f32_samples(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_le_bytes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-1.0f32).to_le_bytes());
        bytes.push(0xff);

        assert_eq!(bytes_to_f32_samples(&bytes), vec![0.5, -1.0]);
    }

    #[test]
    fn missing_input_is_source_not_found() {
        let err = decode_audio("ffmpeg", Path::new("/nonexistent/track.mp3"), ANALYSIS_SAMPLE_RATE)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::SourceNotFound(_)));
    }

    #[test]
    fn missing_decoder_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("track.mp3");
        std::fs::write(&file, b"not audio").unwrap();

        let err = decode_audio("definitely-not-ffmpeg-7f3a", &file, ANALYSIS_SAMPLE_RATE).unwrap_err();
        assert!(matches!(err, AnalysisError::Decode(_)));
    }
}
