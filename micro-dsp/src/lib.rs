#![no_std]

use microdsp::common::{apply_window_function, WindowFunctionType::Hann};
use microfft::real::{rfft_1024, rfft_128, rfft_256, rfft_32, rfft_512, rfft_64};
use microfft::Complex32;
#[allow(unused_imports)]
use micromath::F32Ext;
use thiserror::Error;

mod source;

pub use source::{SampleSource, SamplingStats, SineSource};

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DspError {
    #[error(
        "unsupported FFT size {0}, expected a power of two in {min}..={max}",
        min = MIN_FFT_SIZE,
        max = MAX_FFT_SIZE
    )]
    UnsupportedSize(usize),
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// Turns one frame of samples into a magnitude spectrum of half its length.
pub trait Transform {
    /// `samples` is used as scratch space and is overwritten.
    fn magnitudes(&mut self, samples: &mut [f32], magnitudes: &mut [f32]) -> Result<(), DspError>;
}

/// Hann window, real FFT, magnitude per bin.
#[derive(Debug, Default, Clone, Copy)]
pub struct HannFft;

impl Transform for HannFft {
    fn magnitudes(&mut self, samples: &mut [f32], magnitudes: &mut [f32]) -> Result<(), DspError> {
        check_fft_size(samples.len())?;
        let bins = samples.len() / 2;
        if magnitudes.len() != bins {
            return Err(DspError::LengthMismatch {
                expected: bins,
                got: magnitudes.len(),
            });
        }

        apply_hann_window(samples);
        let spectrum = compute_fft(samples)?;
        compute_magnitude(spectrum, magnitudes)
    }
}

/// Normalize a single sample from i16 to f32.
pub fn normalize_sample(sample: i16) -> f32 {
    sample as f32 / i16::MAX as f32
}

/// Normalize a slice of i16 samples into a slice of f32 samples of the same length.
pub fn normalize_samples(samples: &[i16], normalized_samples: &mut [f32]) -> Result<(), DspError> {
    if samples.len() != normalized_samples.len() {
        return Err(DspError::LengthMismatch {
            expected: samples.len(),
            got: normalized_samples.len(),
        });
    }
    for (out, &sample) in normalized_samples.iter_mut().zip(samples) {
        *out = normalize_sample(sample);
    }
    Ok(())
}

/// Apply a Hann window to a slice of f32 samples.
pub fn apply_hann_window(samples: &mut [f32]) {
    apply_window_function(Hann, samples);
}

pub fn check_fft_size(size: usize) -> Result<(), DspError> {
    if size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(DspError::UnsupportedSize(size))
    }
}

/// Compute the real FFT of `samples` in place.
pub fn compute_fft(samples: &mut [f32]) -> Result<&mut [Complex32], DspError> {
    let unsupported = DspError::UnsupportedSize(samples.len());
    let spectrum: &mut [Complex32] = match samples.len() {
        32 => rfft_32(samples.try_into().map_err(|_| unsupported)?),
        64 => rfft_64(samples.try_into().map_err(|_| unsupported)?),
        128 => rfft_128(samples.try_into().map_err(|_| unsupported)?),
        256 => rfft_256(samples.try_into().map_err(|_| unsupported)?),
        512 => rfft_512(samples.try_into().map_err(|_| unsupported)?),
        1024 => rfft_1024(samples.try_into().map_err(|_| unsupported)?),
        _ => return Err(unsupported),
    };
    Ok(spectrum)
}

/// Compute the magnitude of a real FFT output.
///
/// The real FFT packs the Nyquist term into the imaginary part of bin 0, so
/// bin 0 only reports the DC level.
pub fn compute_magnitude(fft_output: &[Complex32], magnitude: &mut [f32]) -> Result<(), DspError> {
    if fft_output.len() != magnitude.len() {
        return Err(DspError::LengthMismatch {
            expected: fft_output.len(),
            got: magnitude.len(),
        });
    }
    for (out, component) in magnitude.iter_mut().zip(fft_output) {
        *out = (component.re * component.re + component.im * component.im).sqrt();
    }
    if let (Some(dc), Some(component)) = (magnitude.first_mut(), fft_output.first()) {
        *dc = component.re.abs();
    }
    Ok(())
}

/// Centre frequency of `bin` in Hz.
pub fn bin_frequency(bin: usize, sample_rate: f32, fft_size: usize) -> f32 {
    bin as f32 * sample_rate / fft_size as f32
}

/// Process a frame of i16 samples into the magnitude spectrum.
///
/// `scratch` must be as long as `samples`, `magnitudes` half as long.
pub fn process_frame(
    samples: &[i16],
    scratch: &mut [f32],
    magnitudes: &mut [f32],
) -> Result<(), DspError> {
    // Step 1: Normalize samples
    normalize_samples(samples, scratch)?;

    // Step 2: Window, FFT, magnitudes
    HannFft.magnitudes(scratch, magnitudes)
}
