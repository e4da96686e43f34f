use crate::audio::{AudioFrame, ChannelBuffer, DualChannelBuffer, StreamConfig};
use crate::bands::{num_bands_from_frames, SplittingFilter};
use crate::resampler::PushResampler;
use crate::utils::sample_ops::{
    deinterleave, downmix_interleaved_to_mono, downmix_to_mono, float_s16_to_float,
    float_s16_to_s16, float_to_float_s16, interleave, upmix_mono_to_interleaved,
};

/// Staging buffer between an input producer, a set of in-place processing
/// stages at a fixed internal geometry, and an output consumer.
///
/// Holds one frame at the process geometry in dual integer/float form,
/// converts producer formats on ingest (downmix, resample, deinterleave,
/// scale) and consumer formats on emit (scale, resample, upmix, interleave),
/// and coordinates the frequency-band split used by per-band stages. All
/// containers and resampler state are allocated at construction, except the
/// input-domain scratch container which is created on the first frame that
/// needs it and reused afterwards; the steady state is allocation-free.
///
/// Views returned by the accessors are only valid for the current frame; the
/// next ingest call overwrites them. Geometry mismatches at any entry point
/// are caller bugs and panic.
pub struct FrameBuffer {
    input_num_frames: usize,
    num_input_channels: usize,
    proc_num_frames: usize,
    num_proc_channels: usize,
    output_num_frames: usize,
    /// Active channel count, `<= num_proc_channels`, reset on every ingest.
    num_channels: usize,
    num_bands: usize,
    num_split_frames: usize,
    data: DualChannelBuffer,
    output_buffer: DualChannelBuffer,
    process_buffer: Option<ChannelBuffer<f32>>,
    input_resamplers: Vec<PushResampler>,
    output_resamplers: Vec<PushResampler>,
    input_buffer: Option<DualChannelBuffer>,
    split_data: Option<DualChannelBuffer>,
    splitting_filter: Option<SplittingFilter>,
}

impl FrameBuffer {
    pub fn new(
        input_num_frames: usize,
        num_input_channels: usize,
        proc_num_frames: usize,
        num_proc_channels: usize,
        output_num_frames: usize,
    ) -> Self {
        assert!(input_num_frames > 0);
        assert!(proc_num_frames > 0);
        assert!(output_num_frames > 0);
        assert!(num_input_channels > 0);
        assert!(num_proc_channels > 0);
        assert!(num_proc_channels <= num_input_channels);

        let num_bands = num_bands_from_frames(proc_num_frames);
        let num_split_frames = proc_num_frames / num_bands;

        let process_buffer =
            if input_num_frames != proc_num_frames || output_num_frames != proc_num_frames {
                // Intermediate buffer so resampling never writes the process
                // container half-converted.
                Some(ChannelBuffer::new(proc_num_frames, num_proc_channels))
            } else {
                None
            };

        let input_resamplers = if input_num_frames != proc_num_frames {
            (0..num_proc_channels)
                .map(|_| PushResampler::new(input_num_frames, proc_num_frames))
                .collect()
        } else {
            Vec::new()
        };

        let output_resamplers = if output_num_frames != proc_num_frames {
            (0..num_proc_channels)
                .map(|_| PushResampler::new(proc_num_frames, output_num_frames))
                .collect()
        } else {
            Vec::new()
        };

        let (split_data, splitting_filter) = if num_bands > 1 {
            (
                Some(DualChannelBuffer::with_bands(
                    proc_num_frames,
                    num_proc_channels,
                    num_bands,
                )),
                Some(SplittingFilter::new(
                    num_proc_channels,
                    num_bands,
                    proc_num_frames,
                )),
            )
        } else {
            (None, None)
        };

        Self {
            input_num_frames,
            num_input_channels,
            proc_num_frames,
            num_proc_channels,
            output_num_frames,
            num_channels: num_proc_channels,
            num_bands,
            num_split_frames,
            data: DualChannelBuffer::new(proc_num_frames, num_proc_channels),
            output_buffer: DualChannelBuffer::new(output_num_frames, num_proc_channels),
            process_buffer,
            input_resamplers,
            output_resamplers,
            input_buffer: None,
            split_data,
            splitting_filter,
        }
    }

    fn init_for_new_data(&mut self) {
        self.num_channels = self.num_proc_channels;
        self.data.set_num_channels(self.num_proc_channels);
        if let Some(split_data) = &mut self.split_data {
            split_data.set_num_channels(self.num_proc_channels);
        }
    }

    /// Ingests one planar frame of normalized float samples.
    pub fn copy_from(&mut self, data: &[&[f32]], stream_config: &StreamConfig) {
        assert_eq!(stream_config.num_frames(), self.input_num_frames);
        assert_eq!(stream_config.num_channels(), self.num_input_channels);
        assert_eq!(data.len(), self.num_input_channels);
        self.init_for_new_data();

        // Created lazily because `deinterleave_from` needs it under a
        // different condition.
        let need_to_downmix = self.num_input_channels > 1 && self.num_proc_channels == 1;
        if need_to_downmix && self.input_buffer.is_none() {
            self.input_buffer = Some(DualChannelBuffer::new(
                self.input_num_frames,
                self.num_proc_channels,
            ));
        }

        if need_to_downmix {
            let input_buffer = self.input_buffer.as_mut().unwrap();
            downmix_to_mono(data, input_buffer.float_view_mut().channel_mut(0));
        }

        if self.input_num_frames != self.proc_num_frames {
            let process_buffer = self.process_buffer.as_mut().unwrap();
            if need_to_downmix {
                let input_buffer = self.input_buffer.as_mut().unwrap();
                let src = input_buffer.float_view();
                for (i, resampler) in self.input_resamplers.iter_mut().enumerate() {
                    resampler.resample(src.channel(i), process_buffer.channel_mut(i));
                }
            } else {
                for (i, resampler) in self.input_resamplers.iter_mut().enumerate() {
                    resampler.resample(data[i], process_buffer.channel_mut(i));
                }
            }
        }

        // Convert to the S16-scaled float range.
        if self.input_num_frames != self.proc_num_frames {
            let src = self.process_buffer.as_ref().unwrap();
            let dst = self.data.float_view_mut();
            for i in 0..self.num_proc_channels {
                float_to_float_s16(src.channel(i), dst.channel_mut(i));
            }
        } else if need_to_downmix {
            let input_buffer = self.input_buffer.as_mut().unwrap();
            let src = input_buffer.float_view();
            let dst = self.data.float_view_mut();
            float_to_float_s16(src.channel(0), dst.channel_mut(0));
        } else {
            let dst = self.data.float_view_mut();
            for i in 0..self.num_proc_channels {
                float_to_float_s16(data[i], dst.channel_mut(i));
            }
        }
    }

    /// Emits one planar frame of normalized float samples.
    pub fn copy_to(&mut self, stream_config: &StreamConfig, data: &mut [&mut [f32]]) {
        assert_eq!(stream_config.num_frames(), self.output_num_frames);
        assert!(stream_config.num_channels() == self.num_channels || self.num_channels == 1);
        assert!(data.len() >= stream_config.num_channels());

        if self.output_num_frames != self.proc_num_frames {
            // Convert into the intermediate buffer, then resample.
            let src = self.data.float_view();
            let process_buffer = self.process_buffer.as_mut().unwrap();
            for i in 0..self.num_channels {
                float_s16_to_float(src.channel(i), process_buffer.channel_mut(i));
            }
            for (i, resampler) in self
                .output_resamplers
                .iter_mut()
                .enumerate()
                .take(self.num_channels)
            {
                resampler.resample(process_buffer.channel(i), &mut data[i]);
            }
        } else {
            let src = self.data.float_view();
            for i in 0..self.num_channels {
                float_s16_to_float(src.channel(i), &mut data[i]);
            }
        }

        // Upmix by replicating channel 0; only reachable with one active
        // channel.
        if stream_config.num_channels() > self.num_channels {
            let (src, rest) = data.split_at_mut(self.num_channels);
            for dst in &mut rest[..stream_config.num_channels() - self.num_channels] {
                dst.copy_from_slice(&src[0]);
            }
        }
    }

    /// Ingests one interleaved fixed-point frame. This is the path that
    /// supports a second fixed downsampling ratio, e.g. 48 kHz input straight
    /// down to a 16 kHz process rate.
    pub fn deinterleave_from(&mut self, frame: &AudioFrame) {
        assert_eq!(frame.num_channels(), self.num_input_channels);
        assert_eq!(frame.samples_per_channel(), self.input_num_frames);
        self.init_for_new_data();

        // Created lazily because `copy_from` needs it under a different
        // condition.
        if self.input_num_frames != self.proc_num_frames && self.input_buffer.is_none() {
            self.input_buffer = Some(DualChannelBuffer::new(
                self.input_num_frames,
                self.num_proc_channels,
            ));
        }

        {
            let deinterleaved = if self.input_num_frames == self.proc_num_frames {
                self.data.int_view_mut()
            } else {
                self.input_buffer.as_mut().unwrap().int_view_mut()
            };
            if self.num_proc_channels == 1 {
                // Downmix and deinterleave simultaneously.
                downmix_interleaved_to_mono(
                    frame.data(),
                    self.num_input_channels,
                    deinterleaved.channel_mut(0),
                );
            } else {
                assert_eq!(self.num_proc_channels, self.num_input_channels);
                deinterleave(
                    frame.data(),
                    self.num_proc_channels,
                    deinterleaved.channels_mut(),
                );
            }
        }

        if self.input_num_frames != self.proc_num_frames {
            let input_buffer = self.input_buffer.as_mut().unwrap();
            let src = input_buffer.float_view();
            let dst = self.data.float_view_mut();
            for (i, resampler) in self.input_resamplers.iter_mut().enumerate() {
                resampler.resample(src.channel(i), dst.channel_mut(i));
            }
        }
    }

    /// Emits one interleaved fixed-point frame.
    pub fn interleave_to(&mut self, frame: &mut AudioFrame) {
        assert!(frame.num_channels() == self.num_channels || self.num_channels == 1);
        assert_eq!(frame.samples_per_channel(), self.output_num_frames);

        if self.proc_num_frames != self.output_num_frames {
            {
                let src = self.data.float_view();
                let dst = self.output_buffer.float_view_mut();
                for (i, resampler) in self
                    .output_resamplers
                    .iter_mut()
                    .enumerate()
                    .take(self.num_channels)
                {
                    resampler.resample(src.channel(i), dst.channel_mut(i));
                }
            }
            let src = self.output_buffer.int_view();
            if frame.num_channels() == self.num_channels {
                interleave(
                    src.channels().take(self.num_channels),
                    frame.num_channels(),
                    frame.data_mut(),
                );
            } else {
                upmix_mono_to_interleaved(src.channel(0), frame.num_channels(), frame.data_mut());
            }
        } else {
            let src = self.data.int_view();
            if frame.num_channels() == self.num_channels {
                interleave(
                    src.channels().take(self.num_channels),
                    frame.num_channels(),
                    frame.data_mut(),
                );
            } else {
                upmix_mono_to_interleaved(src.channel(0), frame.num_channels(), frame.data_mut());
            }
        }
    }

    /// Runs the analysis transform, fullband container into the subband
    /// container. Must not be called on a single-band buffer.
    pub fn split_into_frequency_bands(&mut self) {
        let filter = self
            .splitting_filter
            .as_mut()
            .expect("single-band buffer has no frequency bands to split");
        filter.analysis(&mut self.data, self.split_data.as_mut().unwrap());
    }

    /// Runs the synthesis transform, subband container back into the fullband
    /// container.
    pub fn merge_frequency_bands(&mut self) {
        let filter = self
            .splitting_filter
            .as_mut()
            .expect("single-band buffer has no frequency bands to merge");
        filter.synthesis(self.split_data.as_mut().unwrap(), &mut self.data);
    }

    /// Full-frame float view of one process-domain channel.
    pub fn channel_f(&mut self, channel: usize) -> &[f32] {
        self.data.float_view().channel(channel)
    }

    pub fn channel_f_mut(&mut self, channel: usize) -> &mut [f32] {
        self.data.float_view_mut().channel_mut(channel)
    }

    /// Full-frame integer view of one process-domain channel.
    pub fn channel_i(&mut self, channel: usize) -> &[i16] {
        self.data.int_view().channel(channel)
    }

    pub fn channel_i_mut(&mut self, channel: usize) -> &mut [i16] {
        self.data.int_view_mut().channel_mut(channel)
    }

    /// One band of one channel. For a single-band buffer, band 0 is the
    /// fullband signal and any other index holds no data.
    pub fn split_channel_f(&mut self, channel: usize, band: usize) -> Option<&[f32]> {
        match &mut self.split_data {
            Some(split) => Some(split.float_view().band(channel, band)),
            None if band == 0 => Some(self.data.float_view().channel(channel)),
            None => None,
        }
    }

    pub fn split_channel_f_mut(&mut self, channel: usize, band: usize) -> Option<&mut [f32]> {
        match &mut self.split_data {
            Some(split) => Some(split.float_view_mut().band_mut(channel, band)),
            None if band == 0 => Some(self.data.float_view_mut().channel_mut(channel)),
            None => None,
        }
    }

    /// All bands of one channel, band 0 first. Falls back to the fullband
    /// container (a single full-width band) when the buffer is single-band.
    pub fn split_bands_f(&mut self, channel: usize) -> impl Iterator<Item = &[f32]> {
        let buf = match &mut self.split_data {
            Some(split) => split.float_view(),
            None => self.data.float_view(),
        };
        buf.bands(channel)
    }

    /// Copies one channel's per-band samples out as quantized i16 data.
    pub fn copy_split_channel_data_to(&mut self, channel: usize, split_band_data: &mut [&mut [i16]]) {
        assert_eq!(split_band_data.len(), self.num_bands);
        let src = match &mut self.split_data {
            Some(split) => split.float_view(),
            None => self.data.float_view(),
        };
        for (dst, band) in split_band_data.iter_mut().zip(src.bands(channel)) {
            assert_eq!(dst.len(), band.len());
            for (d, &s) in dst.iter_mut().zip(band.iter()) {
                *d = float_s16_to_s16(s);
            }
        }
    }

    /// Copies caller-supplied per-band i16 data into one channel's bands.
    pub fn copy_split_channel_data_from(&mut self, channel: usize, split_band_data: &[&[i16]]) {
        assert_eq!(split_band_data.len(), self.num_bands);
        let dst = match &mut self.split_data {
            Some(split) => split.float_view_mut(),
            None => self.data.float_view_mut(),
        };
        for (src, band) in split_band_data.iter().zip(dst.bands_mut(channel)) {
            assert_eq!(src.len(), band.len());
            for (d, &s) in band.iter_mut().zip(src.iter()) {
                *d = f32::from(s);
            }
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Lowers (or restores) the channel count reported by the process-domain
    /// and subband containers, without touching storage. Reset to the process
    /// channel count by the next ingest call.
    pub fn set_num_channels(&mut self, num_channels: usize) {
        assert!(num_channels <= self.num_proc_channels);
        self.num_channels = num_channels;
        self.data.set_num_channels(num_channels);
        if let Some(split_data) = &mut self.split_data {
            split_data.set_num_channels(num_channels);
        }
    }

    pub fn num_frames(&self) -> usize {
        self.proc_num_frames
    }

    pub fn num_frames_per_band(&self) -> usize {
        self.num_split_frames
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rustfft::{num_complex::Complex, FftPlanner};
    use std::f32::consts::PI;

    fn planar<'a>(channels: &'a [Vec<f32>]) -> Vec<&'a [f32]> {
        channels.iter().map(|c| c.as_slice()).collect()
    }

    #[test]
    fn test_zero_in_zero_out_across_geometries() {
        for (input, in_ch, proc, proc_ch, output) in [
            (160usize, 1usize, 160usize, 1usize, 160usize),
            (480, 2, 320, 2, 160),
            (480, 2, 160, 1, 480),
            (320, 2, 320, 1, 320),
        ] {
            let mut buffer = FrameBuffer::new(input, in_ch, proc, proc_ch, output);
            let zeros = vec![vec![0.0f32; input]; in_ch];
            buffer.copy_from(&planar(&zeros), &StreamConfig::new(input, in_ch));

            let mut out = vec![vec![1.0f32; output]; in_ch];
            let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
            buffer.copy_to(&StreamConfig::new(output, in_ch), &mut out_refs);
            for channel in &out {
                assert!(channel.iter().all(|&v| v == 0.0));
            }
        }
    }

    #[test]
    fn test_float_round_trip_at_equal_geometry_is_exact() {
        let mut rng = StdRng::seed_from_u64(77);
        let mut buffer = FrameBuffer::new(160, 2, 160, 2, 160);
        let input: Vec<Vec<f32>> = (0..2)
            .map(|_| (0..160).map(|_| rng.random_range(-1.0f32..1.0)).collect())
            .collect();
        buffer.copy_from(&planar(&input), &StreamConfig::new(160, 2));

        let mut out = vec![vec![0.0f32; 160]; 2];
        let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
        buffer.copy_to(&StreamConfig::new(160, 2), &mut out_refs);

        // Scaling to the S16 float range and back is a power of two, so the
        // only tolerance needed is for float rounding.
        for (a, b) in input.iter().zip(&out) {
            for (&x, &y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() <= 1.0 / 32768.0);
            }
        }
    }

    #[test]
    fn test_int_round_trip_at_equal_geometry_is_bit_exact() {
        let mut rng = StdRng::seed_from_u64(78);
        let mut frame = AudioFrame::new(160, 2);
        for v in frame.data_mut() {
            *v = rng.random();
        }
        let mut buffer = FrameBuffer::new(160, 2, 160, 2, 160);
        buffer.deinterleave_from(&frame);

        let mut out = AudioFrame::new(160, 2);
        buffer.interleave_to(&mut out);
        assert_eq!(frame.data(), out.data());
    }

    #[test]
    fn test_downmix_of_identical_channels_is_identity() {
        let channel: Vec<f32> = (0..160).map(|i| (i as f32 / 160.0) - 0.5).collect();
        let input = vec![channel.clone(), channel.clone(), channel.clone()];
        let mut buffer = FrameBuffer::new(160, 3, 160, 1, 160);
        buffer.copy_from(&planar(&input), &StreamConfig::new(160, 3));

        let mut out = vec![vec![0.0f32; 160]];
        let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
        buffer.copy_to(&StreamConfig::new(160, 1), &mut out_refs);
        for (&x, &y) in channel.iter().zip(out[0].iter()) {
            assert!((x - y).abs() <= 1.0 / 32768.0);
        }
    }

    #[test]
    fn test_interleaved_downmix_of_identical_channels_is_identity() {
        let mut frame = AudioFrame::new(160, 2);
        for (i, v) in frame.data_mut().iter_mut().enumerate() {
            *v = ((i / 2) as i16).wrapping_mul(101);
        }
        let mut buffer = FrameBuffer::new(160, 2, 160, 1, 160);
        buffer.deinterleave_from(&frame);

        let mut out = AudioFrame::new(160, 1);
        buffer.interleave_to(&mut out);
        for (i, &v) in out.data().iter().enumerate() {
            assert_eq!(v, frame.data()[2 * i]);
        }
    }

    #[test]
    fn test_upmix_replicates_channel_zero() {
        let channel: Vec<f32> = (0..160).map(|i| ((i * 7) % 101) as f32 / 101.0 - 0.5).collect();
        let mut buffer = FrameBuffer::new(160, 2, 160, 1, 160);
        buffer.copy_from(
            &planar(&[channel.clone(), channel.clone()]),
            &StreamConfig::new(160, 2),
        );

        let mut out = vec![vec![0.0f32; 160]; 3];
        let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
        buffer.copy_to(&StreamConfig::new(160, 3), &mut out_refs);
        assert_eq!(out[1], out[0]);
        assert_eq!(out[2], out[0]);
    }

    #[test]
    fn test_upmix_interleaved_replicates_channel_zero() {
        let mut frame = AudioFrame::new(160, 2);
        for (i, v) in frame.data_mut().iter_mut().enumerate() {
            *v = (i % 97) as i16 * 31;
        }
        let mut buffer = FrameBuffer::new(160, 2, 160, 1, 160);
        buffer.deinterleave_from(&frame);

        let mut out = AudioFrame::new(160, 2);
        buffer.interleave_to(&mut out);
        for pair in out.data().chunks_exact(2) {
            assert_eq!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_active_channel_count_propagates_and_resets() {
        let mut buffer = FrameBuffer::new(320, 2, 320, 2, 320);
        assert_eq!(buffer.num_channels(), 2);
        buffer.set_num_channels(1);
        assert_eq!(buffer.num_channels(), 1);
        assert_eq!(buffer.data.num_channels(), 1);
        assert_eq!(buffer.split_data.as_ref().unwrap().num_channels(), 1);

        let zeros = vec![vec![0.0f32; 320]; 2];
        buffer.copy_from(&planar(&zeros), &StreamConfig::new(320, 2));
        assert_eq!(buffer.num_channels(), 2);
        assert_eq!(buffer.data.num_channels(), 2);
        assert_eq!(buffer.split_data.as_ref().unwrap().num_channels(), 2);
    }

    #[test]
    fn test_input_buffer_is_created_lazily_and_once() {
        let mut buffer = FrameBuffer::new(160, 2, 160, 1, 160);
        assert!(buffer.input_buffer.is_none());

        let zeros = vec![vec![0.0f32; 160]; 2];
        buffer.copy_from(&planar(&zeros), &StreamConfig::new(160, 2));
        assert!(buffer.input_buffer.is_some());
        let first = buffer.input_buffer.as_ref().unwrap() as *const DualChannelBuffer;
        buffer.copy_from(&planar(&zeros), &StreamConfig::new(160, 2));
        assert_eq!(first, buffer.input_buffer.as_ref().unwrap() as *const _);
    }

    #[test]
    fn test_single_band_accessor_fallback() {
        let mut buffer = FrameBuffer::new(160, 1, 160, 1, 160);
        assert_eq!(buffer.num_bands(), 1);
        assert_eq!(buffer.num_frames_per_band(), 160);
        buffer.channel_f_mut(0)[3] = 123.0;
        assert_eq!(buffer.split_channel_f(0, 0).unwrap()[3], 123.0);
        assert!(buffer.split_channel_f(0, 1).is_none());
        assert_eq!(buffer.split_bands_f(0).count(), 1);
    }

    #[test]
    fn test_split_merge_round_trip_two_bands() {
        let mut buffer = FrameBuffer::new(320, 1, 320, 1, 320);
        assert_eq!(buffer.num_bands(), 2);
        assert_eq!(buffer.num_frames_per_band(), 160);

        for _ in 0..3 {
            for v in buffer.channel_f_mut(0).iter_mut() {
                *v = 1000.0;
            }
            buffer.split_into_frequency_bands();
            buffer.merge_frequency_bands();
        }
        for &v in buffer.channel_f(0) {
            assert!((v - 1000.0).abs() < 1.0, "got {v}");
        }
    }

    #[test]
    fn test_split_merge_round_trip_three_bands() {
        let mut buffer = FrameBuffer::new(480, 1, 480, 1, 480);
        assert_eq!(buffer.num_bands(), 3);
        assert_eq!(buffer.num_frames_per_band(), 160);

        for _ in 0..3 {
            for v in buffer.channel_f_mut(0).iter_mut() {
                *v = 1000.0;
            }
            buffer.split_into_frequency_bands();
            buffer.merge_frequency_bands();
        }
        for &v in buffer.channel_f(0) {
            assert!((v - 1000.0).abs() < 50.0, "got {v}");
        }
    }

    #[test]
    fn test_copy_split_channel_data_round_trip() {
        let mut buffer = FrameBuffer::new(320, 1, 320, 1, 320);
        for v in buffer.channel_f_mut(0).iter_mut() {
            *v = 250.0;
        }
        buffer.split_into_frequency_bands();

        let mut low = vec![0i16; 160];
        let mut high = vec![0i16; 160];
        buffer.copy_split_channel_data_to(0, &mut [&mut low[..], &mut high[..]]);
        buffer.copy_split_channel_data_from(0, &[&low[..], &high[..]]);

        buffer.merge_frequency_bands();
        // Quantization moves each band sample by at most half a unit.
        let mid = buffer.channel_f(0)[160];
        assert!((mid - 250.0).abs() < 5.0);
    }

    #[test]
    #[should_panic]
    fn test_copy_from_with_wrong_frame_count_panics() {
        let mut buffer = FrameBuffer::new(480, 2, 320, 2, 160);
        let wrong = vec![vec![0.0f32; 320]; 2];
        buffer.copy_from(&planar(&wrong), &StreamConfig::new(320, 2));
    }

    #[test]
    #[should_panic]
    fn test_copy_to_with_wrong_channel_count_panics() {
        let mut buffer = FrameBuffer::new(160, 2, 160, 2, 160);
        let zeros = vec![vec![0.0f32; 160]; 2];
        buffer.copy_from(&planar(&zeros), &StreamConfig::new(160, 2));
        let mut out = vec![vec![0.0f32; 160]; 3];
        let mut out_refs: Vec<&mut [f32]> = out.iter_mut().map(|c| c.as_mut_slice()).collect();
        // Active count is 2, so asking for 3 channels is a contract violation.
        buffer.copy_to(&StreamConfig::new(160, 3), &mut out_refs);
    }

    #[test]
    #[should_panic]
    fn test_deinterleave_from_with_wrong_geometry_panics() {
        let mut buffer = FrameBuffer::new(480, 2, 160, 2, 160);
        let frame = AudioFrame::new(480, 1);
        buffer.deinterleave_from(&frame);
    }

    #[test]
    #[should_panic]
    fn test_invalid_construction_channel_counts_panic() {
        FrameBuffer::new(160, 1, 160, 2, 160);
    }

    #[test]
    fn test_interleaved_48k_to_16k_ingest() {
        // 48 kHz interleaved input down to a 16 kHz process rate, stereo.
        let mut buffer = FrameBuffer::new(480, 2, 160, 2, 160);
        let mut n = 0u32;
        let mut out = AudioFrame::new(160, 2);
        for _ in 0..10 {
            let mut frame = AudioFrame::new(480, 2);
            for pair in frame.data_mut().chunks_exact_mut(2) {
                let v = (8000.0 * (2.0 * PI * 440.0 * n as f32 / 48000.0).sin()) as i16;
                pair[0] = v;
                pair[1] = v;
                n += 1;
            }
            buffer.deinterleave_from(&frame);
            buffer.interleave_to(&mut out);
        }
        let rms = (out
            .data()
            .iter()
            .map(|&v| f64::from(v) * f64::from(v))
            .sum::<f64>()
            / out.data().len() as f64)
            .sqrt();
        let expected = 8000.0 / 2.0f64.sqrt();
        assert!((rms - expected).abs() < 0.15 * expected, "rms {rms}");
    }

    #[test]
    fn test_sine_scenario_480_320_160() {
        // input=(480,2), process=(320,2), output=(160,1): ingest a 1 kHz sine
        // at 48 kHz on both channels, emit 16 kHz mono, and verify the energy
        // concentrates in the 1 kHz bin.
        let mut buffer = FrameBuffer::new(480, 2, 320, 2, 160);
        assert_eq!(buffer.num_bands(), 2);

        let mut emitted: Vec<f32> = Vec::new();
        let mut n = 0u32;
        for _ in 0..16 {
            let channel: Vec<f32> = (0..480)
                .map(|_| {
                    let v = 0.5 * (2.0 * PI * 1000.0 * n as f32 / 48000.0).sin();
                    n += 1;
                    v
                })
                .collect();
            buffer.copy_from(
                &planar(&[channel.clone(), channel.clone()]),
                &StreamConfig::new(480, 2),
            );
            // The process-domain frame is 320 samples of 2 channels.
            assert_eq!(buffer.channel_f(0).len(), 320);
            assert_eq!(buffer.num_channels(), 2);

            buffer.set_num_channels(1);
            let mut out = vec![vec![0.0f32; 160]];
            let mut out_refs: Vec<&mut [f32]> =
                out.iter_mut().map(|c| c.as_mut_slice()).collect();
            buffer.copy_to(&StreamConfig::new(160, 1), &mut out_refs);
            emitted.extend_from_slice(&out[0]);
        }

        // Skip the resampler warm-up, then look at 640 samples: 1 kHz at a
        // 16 kHz rate lands exactly in bin 40.
        let tail = &emitted[emitted.len() - 640..];
        let mut spectrum: Vec<Complex<f32>> =
            tail.iter().map(|&v| Complex::new(v, 0.0)).collect();
        FftPlanner::new().plan_fft_forward(640).process(&mut spectrum);

        let energy: Vec<f32> = spectrum[..320].iter().map(|c| c.norm_sqr()).collect();
        let total: f32 = energy[1..].iter().sum();
        assert!(energy[40] > 0.8 * total, "bin 40 holds {} of {}", energy[40], total);

        // Amplitude survives the downmix of two identical channels.
        let rms = (tail.iter().map(|&v| v * v).sum::<f32>() / tail.len() as f32).sqrt();
        let expected = 0.5 / 2.0f32.sqrt();
        assert!((rms - expected).abs() < 0.15 * expected, "rms {rms}");
    }
}
