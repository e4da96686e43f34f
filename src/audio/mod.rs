pub mod channel_buffer;
pub mod frame;

pub use channel_buffer::{ChannelBuffer, DualChannelBuffer};
pub use frame::{AudioFrame, StreamConfig};
