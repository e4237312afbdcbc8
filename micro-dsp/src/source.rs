use core::convert::Infallible;
use core::f32::consts::TAU;

#[allow(unused_imports)]
use micromath::F32Ext;

/// Fills frames with samples, one frame per call.
pub trait SampleSource {
    type Error;

    fn read_frame(&mut self, frame: &mut [f32]) -> Result<(), Self::Error>;
}

impl<S: SampleSource + ?Sized> SampleSource for &mut S {
    type Error = S::Error;

    fn read_frame(&mut self, frame: &mut [f32]) -> Result<(), Self::Error> {
        (**self).read_frame(frame)
    }
}

/// Synthetic tone, used on the bench in place of the ADC.
///
/// The phase carries over between frames, so consecutive frames join up
/// without a discontinuity.
#[derive(Debug, Clone, Copy)]
pub struct SineSource {
    frequency: f32,
    sample_rate: f32,
    amplitude: f32,
    offset: f32,
    phase: f32,
}

impl SineSource {
    pub fn new(frequency: f32, sample_rate: f32, amplitude: f32) -> Self {
        Self {
            frequency,
            sample_rate,
            amplitude,
            offset: 0.0,
            phase: 0.0,
        }
    }

    /// DC offset added to every sample, like a biased ADC input.
    pub fn with_offset(mut self, offset: f32) -> Self {
        self.offset = offset;
        self
    }

    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

impl SampleSource for SineSource {
    type Error = Infallible;

    fn read_frame(&mut self, frame: &mut [f32]) -> Result<(), Self::Error> {
        let step = TAU * self.frequency / self.sample_rate;
        for sample in frame.iter_mut() {
            *sample = self.offset + self.amplitude * self.phase.sin();
            self.phase = (self.phase + step) % TAU;
        }
        Ok(())
    }
}

/// Timing and level summary of one captured frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingStats {
    pub samples: usize,
    pub max_value: f32,
    pub elapsed_us: u32,
}

impl SamplingStats {
    pub fn from_frame(frame: &[f32], elapsed_us: u32) -> Self {
        let max_value = frame.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        Self {
            samples: frame.len(),
            max_value: if frame.is_empty() { 0.0 } else { max_value },
            elapsed_us,
        }
    }

    pub fn time_per_sample_us(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        self.elapsed_us as f32 / self.samples as f32
    }

    pub fn sampling_frequency_hz(&self) -> f32 {
        if self.elapsed_us == 0 {
            return 0.0;
        }
        self.samples as f32 * 1_000_000.0 / self.elapsed_us as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_quarter_rate_sine() {
        let mut source = SineSource::new(2_000.0, 8_000.0, 100.0);
        let mut frame = [0.0f32; 8];
        source.read_frame(&mut frame).unwrap();

        let expected = [0.0, 100.0, 0.0, -100.0, 0.0, 100.0, 0.0, -100.0];
        for (got, want) in frame.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1.0);
        }
    }

    #[test]
    fn test_phase_continues_across_frames() {
        let mut split = SineSource::new(440.0, 8_000.0, 1.0);
        let mut whole = split;

        let mut first = [0.0f32; 5];
        let mut second = [0.0f32; 5];
        split.read_frame(&mut first).unwrap();
        split.read_frame(&mut second).unwrap();

        let mut joined = [0.0f32; 10];
        whole.read_frame(&mut joined).unwrap();

        assert_eq!(&joined[..5], &first);
        assert_eq!(&joined[5..], &second);
    }

    #[test]
    fn test_offset_and_frequency_change() {
        let mut source = SineSource::new(1_000.0, 8_000.0, 10.0).with_offset(2048.0);
        let mut frame = [0.0f32; 16];
        (&mut source).read_frame(&mut frame).unwrap();
        assert!(frame.iter().all(|&s| (2037.0..=2059.0).contains(&s)));

        source.set_frequency(500.0);
        assert_eq!(source.frequency(), 500.0);
        assert_eq!(source.sample_rate(), 8_000.0);
    }

    #[test]
    fn test_sampling_stats() {
        let frame = [0.5f32, -1.0, 3.0, 2.0];
        let stats = SamplingStats::from_frame(&frame, 800);
        assert_eq!(stats.samples, 4);
        assert_eq!(stats.max_value, 3.0);
        assert_eq!(stats.time_per_sample_us(), 200.0);
        assert_abs_diff_eq!(stats.sampling_frequency_hz(), 5_000.0, epsilon = 1e-2);
    }

    #[test]
    fn test_sampling_stats_empty() {
        let stats = SamplingStats::from_frame(&[], 0);
        assert_eq!(stats.max_value, 0.0);
        assert_eq!(stats.time_per_sample_us(), 0.0);
        assert_eq!(stats.sampling_frequency_hz(), 0.0);
    }
}
