//! Sweeps a synthetic tone from the bottom to the top of the spectrum and
//! prints every frame as ASCII art.
//!
//! cargo run -p micro-bars --example sine_sweep --features std

use std::thread;
use std::time::{Duration, Instant};

use micro_bars::diagnostics::StdoutSink;
use micro_bars::{FrameCompositor, GraphConfig};
use micro_dsp::{bin_frequency, HannFft, SampleSource, SamplingStats, SineSource, Transform};

const SAMPLE_RATE: f32 = 8_000.0;
const SAMPLES: usize = 128;
const FRAMES_PER_BIN: usize = 2;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = GraphConfig::default();
    let mut compositor = FrameCompositor::with_sink(&config, StdoutSink::new())?;

    let mut source = SineSource::new(0.0, SAMPLE_RATE, 512.0);
    let mut frame = [0.0f32; SAMPLES];
    let mut magnitudes = [0.0f32; SAMPLES / 2];

    for bin in config.band_skip..config.num_bands {
        let frequency = bin_frequency(bin, SAMPLE_RATE, SAMPLES);
        source.set_frequency(frequency);

        for _ in 0..FRAMES_PER_BIN {
            let started = Instant::now();
            match source.read_frame(&mut frame) {
                Ok(()) => {}
                Err(never) => match never {},
            }
            let stats = SamplingStats::from_frame(&frame, started.elapsed().as_micros() as u32);

            HannFft.magnitudes(&mut frame, &mut magnitudes)?;
            compositor.compose(&magnitudes);

            println!(
                "Bin {} ({:.0} Hz), {} samples, max {:.1}, {:.2} us per sample",
                bin,
                frequency,
                stats.samples,
                stats.max_value,
                stats.time_per_sample_us()
            );
            thread::sleep(Duration::from_millis(40));
        }
    }
    Ok(())
}
