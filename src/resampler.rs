use rubato::{FftFixedInOut, Resampler};

/// Streaming single-channel resampler with fixed frame sizes.
///
/// Consumes exactly `src_frames` samples and produces exactly `dst_frames`
/// samples per call, carrying the converter's overlap state across calls so a
/// continuous stream stays continuous at the frame seams. One instance per
/// channel; instances must only ever be driven with the sizes they were
/// constructed for.
pub struct PushResampler {
    resampler: FftFixedInOut<f32>,
    src_frames: usize,
    dst_frames: usize,
}

impl PushResampler {
    pub fn new(src_frames: usize, dst_frames: usize) -> Self {
        assert!(src_frames > 0);
        assert!(dst_frames > 0);
        // Frame sizes are 10 ms slices, so the equivalent sample rates are the
        // sizes times 100.
        let resampler = FftFixedInOut::<f32>::new(src_frames * 100, dst_frames * 100, src_frames, 1)
            .unwrap_or_else(|e| panic!("unsupported resampling ratio {src_frames}->{dst_frames}: {e}"));
        assert_eq!(resampler.input_frames_next(), src_frames);
        assert_eq!(resampler.output_frames_next(), dst_frames);
        Self {
            resampler,
            src_frames,
            dst_frames,
        }
    }

    /// Converts one frame. `src` must hold `src_frames` samples and `dst`
    /// `dst_frames` samples.
    pub fn resample(&mut self, src: &[f32], dst: &mut [f32]) {
        assert_eq!(src.len(), self.src_frames);
        assert_eq!(dst.len(), self.dst_frames);
        self.resampler
            .process_into_buffer(&[src], &mut [dst], None)
            .expect("resampler rejected fixed-size frame");
    }

    pub fn src_frames(&self) -> usize {
        self.src_frames
    }

    pub fn dst_frames(&self) -> usize {
        self.dst_frames
    }
}
