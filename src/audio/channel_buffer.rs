use crate::utils::sample_ops::float_s16_to_s16;

/// Planar multi-channel storage for one frame of samples.
///
/// Each channel's samples are contiguous. When constructed with more than one
/// band, every channel's range is partitioned into equal-sized band slices,
/// band 0 first. The allocated channel count is fixed for the lifetime of the
/// buffer; `set_num_channels` only lowers the count reported to readers.
#[derive(Clone)]
pub struct ChannelBuffer<T> {
    data: Vec<T>,
    num_frames: usize,
    num_frames_per_band: usize,
    num_allocated_channels: usize,
    num_channels: usize,
    num_bands: usize,
}

impl<T: Copy + Default> ChannelBuffer<T> {
    pub fn new(num_frames: usize, num_channels: usize) -> Self {
        Self::with_bands(num_frames, num_channels, 1)
    }

    pub fn with_bands(num_frames: usize, num_channels: usize, num_bands: usize) -> Self {
        assert!(num_frames > 0);
        assert!(num_channels > 0);
        assert!(num_bands > 0);
        assert_eq!(
            num_frames % num_bands,
            0,
            "frame count {} is not divisible into {} bands",
            num_frames,
            num_bands
        );
        Self {
            data: vec![T::default(); num_frames * num_channels],
            num_frames,
            num_frames_per_band: num_frames / num_bands,
            num_allocated_channels: num_channels,
            num_channels,
            num_bands,
        }
    }

    /// Full-frame slice for one channel.
    pub fn channel(&self, channel: usize) -> &[T] {
        assert!(channel < self.num_channels);
        let start = channel * self.num_frames;
        &self.data[start..start + self.num_frames]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [T] {
        assert!(channel < self.num_channels);
        let start = channel * self.num_frames;
        &mut self.data[start..start + self.num_frames]
    }

    /// Iterates over the active channels' full-frame slices.
    pub fn channels(&self) -> impl Iterator<Item = &[T]> {
        self.data
            .chunks_exact(self.num_frames)
            .take(self.num_channels)
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [T]> {
        self.data
            .chunks_exact_mut(self.num_frames)
            .take(self.num_channels)
    }

    /// One band of one channel.
    pub fn band(&self, channel: usize, band: usize) -> &[T] {
        assert!(channel < self.num_channels);
        assert!(band < self.num_bands);
        let start = channel * self.num_frames + band * self.num_frames_per_band;
        &self.data[start..start + self.num_frames_per_band]
    }

    pub fn band_mut(&mut self, channel: usize, band: usize) -> &mut [T] {
        assert!(channel < self.num_channels);
        assert!(band < self.num_bands);
        let start = channel * self.num_frames + band * self.num_frames_per_band;
        &mut self.data[start..start + self.num_frames_per_band]
    }

    /// Iterates over all bands of one channel, band 0 first.
    pub fn bands(&self, channel: usize) -> impl Iterator<Item = &[T]> {
        self.channel(channel).chunks_exact(self.num_frames_per_band)
    }

    pub fn bands_mut(&mut self, channel: usize) -> impl Iterator<Item = &mut [T]> {
        let num_frames_per_band = self.num_frames_per_band;
        self.channel_mut(channel).chunks_exact_mut(num_frames_per_band)
    }

    /// Raw storage covering all allocated channels.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn num_frames_per_band(&self) -> usize {
        self.num_frames_per_band
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn set_num_channels(&mut self, num_channels: usize) {
        assert!(num_channels <= self.num_allocated_channels);
        self.num_channels = num_channels;
    }
}

/// Dual integer/float storage for one frame.
///
/// Keeps an i16 buffer and an S16-scaled f32 buffer describing the same
/// logical samples, refreshed lazily: reading a view converts it from the
/// other one if stale, taking a mutable view additionally marks the other
/// stale. Conversion from float clamps to the i16 range and rounds half away
/// from zero.
pub struct DualChannelBuffer {
    ibuf: ChannelBuffer<i16>,
    fbuf: ChannelBuffer<f32>,
    ivalid: bool,
    fvalid: bool,
}

impl DualChannelBuffer {
    pub fn new(num_frames: usize, num_channels: usize) -> Self {
        Self::with_bands(num_frames, num_channels, 1)
    }

    pub fn with_bands(num_frames: usize, num_channels: usize, num_bands: usize) -> Self {
        Self {
            ibuf: ChannelBuffer::with_bands(num_frames, num_channels, num_bands),
            fbuf: ChannelBuffer::with_bands(num_frames, num_channels, num_bands),
            ivalid: true,
            fvalid: true,
        }
    }

    pub fn float_view(&mut self) -> &ChannelBuffer<f32> {
        self.refresh_f();
        &self.fbuf
    }

    pub fn float_view_mut(&mut self) -> &mut ChannelBuffer<f32> {
        self.refresh_f();
        self.ivalid = false;
        &mut self.fbuf
    }

    pub fn int_view(&mut self) -> &ChannelBuffer<i16> {
        self.refresh_i();
        &self.ibuf
    }

    pub fn int_view_mut(&mut self) -> &mut ChannelBuffer<i16> {
        self.refresh_i();
        self.fvalid = false;
        &mut self.ibuf
    }

    fn refresh_f(&mut self) {
        if !self.fvalid {
            for (dst, &src) in self
                .fbuf
                .as_mut_slice()
                .iter_mut()
                .zip(self.ibuf.as_slice())
            {
                *dst = f32::from(src);
            }
            self.fvalid = true;
        }
    }

    fn refresh_i(&mut self) {
        if !self.ivalid {
            for (dst, &src) in self
                .ibuf
                .as_mut_slice()
                .iter_mut()
                .zip(self.fbuf.as_slice())
            {
                *dst = float_s16_to_s16(src);
            }
            self.ivalid = true;
        }
    }

    pub fn num_frames(&self) -> usize {
        self.fbuf.num_frames()
    }

    pub fn num_frames_per_band(&self) -> usize {
        self.fbuf.num_frames_per_band()
    }

    pub fn num_bands(&self) -> usize {
        self.fbuf.num_bands()
    }

    pub fn num_channels(&self) -> usize {
        self.fbuf.num_channels()
    }

    pub fn set_num_channels(&mut self, num_channels: usize) {
        self.ibuf.set_num_channels(num_channels);
        self.fbuf.set_num_channels(num_channels);
    }
}
