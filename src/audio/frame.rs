use dasp_sample::Sample;
use serde::{Deserialize, Serialize};

/// Geometry of one stream boundary: samples per channel and channel count.
///
/// Ingest and emit calls declare their geometry with this; the frame buffer
/// checks it against the geometry fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    num_frames: usize,
    num_channels: usize,
}

impl StreamConfig {
    pub fn new(num_frames: usize, num_channels: usize) -> Self {
        assert!(num_frames > 0);
        assert!(num_channels > 0);
        Self {
            num_frames,
            num_channels,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }
}

/// Interleaved fixed-point frame, as exchanged with producers and consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    samples_per_channel: usize,
    num_channels: usize,
    data: Vec<i16>,
}

impl AudioFrame {
    pub fn new(samples_per_channel: usize, num_channels: usize) -> Self {
        assert!(samples_per_channel > 0);
        assert!(num_channels > 0);
        Self {
            samples_per_channel,
            num_channels,
            data: vec![0; samples_per_channel * num_channels],
        }
    }

    /// Builds a frame from normalized float samples, one slice per channel.
    pub fn from_float_planar(channels: &[&[f32]]) -> Self {
        assert!(!channels.is_empty());
        let samples_per_channel = channels[0].len();
        let mut frame = Self::new(samples_per_channel, channels.len());
        for (ch, samples) in channels.iter().enumerate() {
            assert_eq!(samples.len(), samples_per_channel);
            for (i, &s) in samples.iter().enumerate() {
                frame.data[i * channels.len() + ch] = s.to_sample::<i16>();
            }
        }
        frame
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples_per_channel
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn data(&self) -> &[i16] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [i16] {
        &mut self.data
    }
}
