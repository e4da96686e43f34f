#![feature(portable_simd)]

pub mod audio;
pub mod bands;
pub mod frame_buffer;
pub mod resampler;
pub mod utils;

pub use audio::{AudioFrame, ChannelBuffer, DualChannelBuffer, StreamConfig};
pub use bands::SplittingFilter;
pub use frame_buffer::FrameBuffer;
pub use resampler::PushResampler;
pub use utils::*;
