pub mod sample_ops;

pub use sample_ops::*;
