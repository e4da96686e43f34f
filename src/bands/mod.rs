pub mod modulated;
pub mod qmf;

pub use modulated::ModulatedFilterBank;
pub use qmf::TwoBandQmf;

use crate::audio::DualChannelBuffer;

/// Samples per channel in a 10 ms slice at 16 kHz; the unit the band count is
/// derived from.
pub const SAMPLES_PER_16KHZ_CHANNEL: usize = 160;
pub const SAMPLES_PER_32KHZ_CHANNEL: usize = 320;
pub const SAMPLES_PER_48KHZ_CHANNEL: usize = 480;

/// Number of frequency bands for a process frame size. Frames at or below the
/// 16 kHz slice size stay fullband; larger frames must divide into 16 kHz
/// slices exactly.
pub fn num_bands_from_frames(num_frames: usize) -> usize {
    if num_frames <= SAMPLES_PER_16KHZ_CHANNEL {
        1
    } else {
        assert_eq!(
            num_frames % SAMPLES_PER_16KHZ_CHANNEL,
            0,
            "frame count {} is not a multiple of the 16 kHz slice size",
            num_frames
        );
        num_frames / SAMPLES_PER_16KHZ_CHANNEL
    }
}

enum FilterKind {
    TwoBands(Vec<TwoBandQmf>),
    ManyBands(ModulatedFilterBank),
}

/// Stateful analysis/synthesis transform between a fullband container and a
/// subband container, shared across channels. Supports two bands (all-pass
/// QMF) and three bands (cosine-modulated bank).
pub struct SplittingFilter {
    num_bands: usize,
    kind: FilterKind,
}

impl SplittingFilter {
    pub fn new(num_channels: usize, num_bands: usize, num_frames: usize) -> Self {
        assert!(num_channels > 0);
        assert!(
            num_bands == 2 || num_bands == 3,
            "unsupported band count {}",
            num_bands
        );
        let kind = match num_bands {
            2 => FilterKind::TwoBands((0..num_channels).map(|_| TwoBandQmf::new(num_frames)).collect()),
            _ => FilterKind::ManyBands(ModulatedFilterBank::new(num_channels, num_bands, num_frames)),
        };
        Self { num_bands, kind }
    }

    /// Fullband → bands, for every active channel of `data`.
    pub fn analysis(&mut self, data: &mut DualChannelBuffer, bands: &mut DualChannelBuffer) {
        assert_eq!(bands.num_bands(), self.num_bands);
        assert_eq!(data.num_frames(), bands.num_frames());
        let num_channels = data.num_channels();
        assert_eq!(bands.num_channels(), num_channels);

        let src = data.float_view();
        let dst = bands.float_view_mut();
        let per_band = dst.num_frames_per_band();
        match &mut self.kind {
            FilterKind::TwoBands(states) => {
                assert!(num_channels <= states.len());
                for (ch, state) in states.iter_mut().enumerate().take(num_channels) {
                    let (low, high) = dst.channel_mut(ch).split_at_mut(per_band);
                    state.analysis(src.channel(ch), low, high);
                }
            }
            FilterKind::ManyBands(bank) => {
                for ch in 0..num_channels {
                    bank.analysis(ch, src.channel(ch), dst.channel_mut(ch));
                }
            }
        }
    }

    /// Bands → fullband, the inverse transform.
    pub fn synthesis(&mut self, bands: &mut DualChannelBuffer, data: &mut DualChannelBuffer) {
        assert_eq!(bands.num_bands(), self.num_bands);
        assert_eq!(data.num_frames(), bands.num_frames());
        let num_channels = bands.num_channels();
        assert_eq!(data.num_channels(), num_channels);

        let src = bands.float_view();
        let dst = data.float_view_mut();
        let per_band = src.num_frames_per_band();
        match &mut self.kind {
            FilterKind::TwoBands(states) => {
                assert!(num_channels <= states.len());
                for (ch, state) in states.iter_mut().enumerate().take(num_channels) {
                    let (low, high) = src.channel(ch).split_at(per_band);
                    state.synthesis(low, high, dst.channel_mut(ch));
                }
            }
            FilterKind::ManyBands(bank) => {
                for ch in 0..num_channels {
                    bank.synthesis(ch, src.channel(ch), dst.channel_mut(ch));
                }
            }
        }
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }
}
