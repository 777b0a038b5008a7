//! Short-time magnitude spectra.

use std::f32::consts::PI;

use rustfft::{num_complex::Complex, FftPlanner};

/// Hann window of `size` points.
pub fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}

/// Number of full frames of `n_fft` samples at `hop` spacing.
pub fn frame_count(len: usize, n_fft: usize, hop: usize) -> usize {
    if len < n_fft || hop == 0 {
        0
    } else {
        (len - n_fft) / hop + 1
    }
}

/// Run a Hann-windowed STFT over `samples`, calling `on_frame` with the
/// magnitude of the `n_fft / 2 + 1` non-negative frequency bins of each frame.
///
/// Frames are produced one at a time, so memory stays at one frame
/// regardless of track length.
pub fn for_each_magnitude_frame<F>(samples: &[f32], n_fft: usize, hop: usize, mut on_frame: F)
where
    F: FnMut(usize, &[f32]),
{
    let frames = frame_count(samples.len(), n_fft, hop);
    if frames == 0 {
        return;
    }

    let window = hann_window(n_fft);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);
    let num_bins = n_fft / 2 + 1;

    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];
    let mut scratch = vec![Complex::new(0.0f32, 0.0); fft.get_inplace_scratch_len()];
    let mut magnitudes = vec![0.0f32; num_bins];

    for frame in 0..frames {
        let start = frame * hop;
        for ((slot, &s), &w) in buffer
            .iter_mut()
            .zip(&samples[start..start + n_fft])
            .zip(&window)
        {
            *slot = Complex::new(s * w, 0.0);
        }

        fft.process_with_scratch(&mut buffer, &mut scratch);

        for (mag, bin) in magnitudes.iter_mut().zip(&buffer[..num_bins]) {
            *mag = bin.norm();
        }
        on_frame(frame, &magnitudes);
    }
}
