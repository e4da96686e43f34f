// Cosine-modulated filter bank for three or more equal-width bands.
//
// A windowed-sinc lowpass prototype is designed at construction and modulated
// once per band for analysis and synthesis. Analysis filters each band and
// decimates by the band count against a per-channel input history; synthesis
// expands, filters and sums with a per-channel overlap tail. The synthesis
// polyphase components are normalized at construction so that a steady signal
// reconstructs with unit gain.

use std::f64::consts::PI;

/// Worst-case relative reconstruction error for a steady-state signal after
/// one frame of warm-up.
pub const RECONSTRUCTION_ERROR_BOUND: f32 = 0.05;

const TAPS_PER_BAND: usize = 24;

fn blackman(k: usize, len: usize) -> f64 {
    let x = k as f64 / (len - 1) as f64;
    0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}

pub struct ModulatedFilterBank {
    num_bands: usize,
    full_frames: usize,
    filter_len: usize,
    analysis_filters: Vec<Vec<f32>>,
    synthesis_filters: Vec<Vec<f32>>,
    analysis_history: Vec<Vec<f32>>,
    synthesis_overlap: Vec<Vec<f32>>,
    analysis_scratch: Vec<f32>,
    synthesis_scratch: Vec<f32>,
}

impl ModulatedFilterBank {
    pub fn new(num_channels: usize, num_bands: usize, full_frames: usize) -> Self {
        assert!(num_channels > 0);
        assert!(num_bands >= 2);
        assert!(full_frames > 0);
        assert_eq!(full_frames % num_bands, 0);

        let filter_len = TAPS_PER_BAND * num_bands;
        let center = (filter_len - 1) as f64 / 2.0;
        let cutoff = 1.0 / (4.0 * num_bands as f64);

        let prototype: Vec<f64> = (0..filter_len)
            .map(|k| 2.0 * cutoff * sinc(2.0 * cutoff * (k as f64 - center)) * blackman(k, filter_len))
            .collect();

        let mut analysis = vec![vec![0.0f64; filter_len]; num_bands];
        let mut synthesis = vec![vec![0.0f64; filter_len]; num_bands];
        for b in 0..num_bands {
            let phase = if b % 2 == 0 { PI / 4.0 } else { -PI / 4.0 };
            for k in 0..filter_len {
                let arg = PI / num_bands as f64 * (b as f64 + 0.5) * (k as f64 - center);
                analysis[b][k] = 2.0 * prototype[k] * (arg + phase).cos();
                synthesis[b][k] = 2.0 * prototype[k] * (arg - phase).cos();
            }
        }

        // Flatten the DC response exactly: for a constant input the output at
        // time index n only depends on n mod num_bands, through the synthesis
        // polyphase sums. Scale each polyphase component so every residue
        // reconstructs to unit gain.
        let analysis_dc: Vec<f64> = analysis.iter().map(|f| f.iter().sum()).collect();
        let mut residue_gain = vec![0.0f64; num_bands];
        for b in 0..num_bands {
            for k in 0..filter_len {
                residue_gain[k % num_bands] += analysis_dc[b] * synthesis[b][k];
            }
        }
        let mean_gain = residue_gain.iter().sum::<f64>() / num_bands as f64;
        for &g in &residue_gain {
            assert!(g > 0.2 * mean_gain, "degenerate filter bank design");
        }
        for filter in synthesis.iter_mut() {
            for (k, v) in filter.iter_mut().enumerate() {
                *v /= residue_gain[k % num_bands];
            }
        }

        Self {
            num_bands,
            full_frames,
            filter_len,
            analysis_filters: analysis
                .iter()
                .map(|f| f.iter().map(|&v| v as f32).collect())
                .collect(),
            synthesis_filters: synthesis
                .iter()
                .map(|f| f.iter().map(|&v| v as f32).collect())
                .collect(),
            analysis_history: vec![vec![0.0; filter_len - 1]; num_channels],
            synthesis_overlap: vec![vec![0.0; filter_len - 1]; num_channels],
            analysis_scratch: vec![0.0; filter_len - 1 + full_frames],
            synthesis_scratch: vec![0.0; full_frames + filter_len - 1],
        }
    }

    /// Splits one channel's fullband frame into `num_bands` decimated bands,
    /// written contiguously into `bands` (band 0 first).
    pub fn analysis(&mut self, channel: usize, input: &[f32], bands: &mut [f32]) {
        assert_eq!(input.len(), self.full_frames);
        assert_eq!(bands.len(), self.full_frames);

        let history_len = self.filter_len - 1;
        let sub_frames = self.full_frames / self.num_bands;
        let history = &mut self.analysis_history[channel];
        self.analysis_scratch[..history_len].copy_from_slice(history);
        self.analysis_scratch[history_len..].copy_from_slice(input);

        for m in 0..sub_frames {
            // Index of the last input sample covered by this band sample.
            let idx = history_len + m * self.num_bands + (self.num_bands - 1);
            for (b, filter) in self.analysis_filters.iter().enumerate() {
                let mut acc = 0.0f32;
                for (k, &coeff) in filter.iter().enumerate() {
                    acc += coeff * self.analysis_scratch[idx - k];
                }
                bands[b * sub_frames + m] = acc;
            }
        }
        history.copy_from_slice(&self.analysis_scratch[self.full_frames..]);
    }

    /// Merges one channel's bands back into a fullband frame.
    pub fn synthesis(&mut self, channel: usize, bands: &[f32], output: &mut [f32]) {
        assert_eq!(bands.len(), self.full_frames);
        assert_eq!(output.len(), self.full_frames);

        let history_len = self.filter_len - 1;
        let sub_frames = self.full_frames / self.num_bands;
        self.synthesis_scratch.fill(0.0);

        for (b, filter) in self.synthesis_filters.iter().enumerate() {
            for m in 0..sub_frames {
                let v = bands[b * sub_frames + m];
                let base = m * self.num_bands;
                for (k, &coeff) in filter.iter().enumerate() {
                    self.synthesis_scratch[base + k] += coeff * v;
                }
            }
        }

        let overlap = &mut self.synthesis_overlap[channel];
        for (dst, &src) in self.synthesis_scratch.iter_mut().zip(overlap.iter()) {
            *dst += src;
        }
        output.copy_from_slice(&self.synthesis_scratch[..self.full_frames]);
        overlap.copy_from_slice(&self.synthesis_scratch[self.full_frames..]);
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }
}
