// Two-band polyphase all-pass quadrature mirror filter. Splits a fullband
// signal into equal low/high halves of the spectrum and merges them back.
// The two branches run the same pair of three-stage all-pass chains in
// swapped order, so analysis followed by synthesis is a pure all-pass with a
// one-sample delay per branch: unity gain at every frequency, exact at DC.

const ALL_PASS_FILTER_1: [f32; 3] = [0.097_930_91, 0.564_300_54, 0.873_733_5];
const ALL_PASS_FILTER_2: [f32; 3] = [0.325_515_75, 0.748_626_7, 0.961_456_3];

fn all_pass_chain(samples: &mut [f32], coefficients: &[f32; 3], state: &mut [f32; 6]) {
    for (stage, &c) in coefficients.iter().enumerate() {
        let mut x1 = state[2 * stage];
        let mut y1 = state[2 * stage + 1];
        for v in samples.iter_mut() {
            let x = *v;
            let y = x1 + c * (x - y1);
            x1 = x;
            y1 = y;
            *v = y;
        }
        state[2 * stage] = x1;
        state[2 * stage + 1] = y1;
    }
}

/// Streaming two-band split/merge state for one channel.
pub struct TwoBandQmf {
    analysis_state1: [f32; 6],
    analysis_state2: [f32; 6],
    synthesis_state1: [f32; 6],
    synthesis_state2: [f32; 6],
    scratch1: Vec<f32>,
    scratch2: Vec<f32>,
}

impl TwoBandQmf {
    pub fn new(num_frames: usize) -> Self {
        assert!(num_frames > 0);
        assert_eq!(num_frames % 2, 0);
        let half = num_frames / 2;
        Self {
            analysis_state1: [0.0; 6],
            analysis_state2: [0.0; 6],
            synthesis_state1: [0.0; 6],
            synthesis_state2: [0.0; 6],
            scratch1: vec![0.0; half],
            scratch2: vec![0.0; half],
        }
    }

    pub fn analysis(&mut self, input: &[f32], low: &mut [f32], high: &mut [f32]) {
        let half = self.scratch1.len();
        assert_eq!(input.len(), 2 * half);
        assert_eq!(low.len(), half);
        assert_eq!(high.len(), half);

        // Even samples feed the second chain, odd samples the first.
        for i in 0..half {
            self.scratch2[i] = input[2 * i];
            self.scratch1[i] = input[2 * i + 1];
        }
        all_pass_chain(&mut self.scratch1, &ALL_PASS_FILTER_1, &mut self.analysis_state1);
        all_pass_chain(&mut self.scratch2, &ALL_PASS_FILTER_2, &mut self.analysis_state2);
        for i in 0..half {
            low[i] = 0.5 * (self.scratch1[i] + self.scratch2[i]);
            high[i] = 0.5 * (self.scratch1[i] - self.scratch2[i]);
        }
    }

    pub fn synthesis(&mut self, low: &[f32], high: &[f32], output: &mut [f32]) {
        let half = self.scratch1.len();
        assert_eq!(low.len(), half);
        assert_eq!(high.len(), half);
        assert_eq!(output.len(), 2 * half);

        for i in 0..half {
            self.scratch1[i] = low[i] + high[i];
            self.scratch2[i] = low[i] - high[i];
        }
        // The chains swap coefficient sets relative to analysis.
        all_pass_chain(&mut self.scratch1, &ALL_PASS_FILTER_2, &mut self.synthesis_state1);
        all_pass_chain(&mut self.scratch2, &ALL_PASS_FILTER_1, &mut self.synthesis_state2);
        for i in 0..half {
            output[2 * i] = self.scratch2[i];
            output[2 * i + 1] = self.scratch1[i];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_dc_reconstruction_is_exact() {
        let mut qmf = TwoBandQmf::new(320);
        let input = vec![1000.0f32; 320];
        let mut low = vec![0.0f32; 160];
        let mut high = vec![0.0f32; 160];
        let mut output = vec![0.0f32; 320];
        for _ in 0..3 {
            qmf.analysis(&input, &mut low, &mut high);
            qmf.synthesis(&low, &high, &mut output);
        }
        for &v in &output {
            assert!((v - 1000.0).abs() < 1.0, "got {v}");
        }
        // All of the DC energy sits in the low band.
        assert!(high.iter().all(|&v| v.abs() < 1.0));
    }

    #[test]
    fn test_low_sine_lands_in_low_band() {
        let mut qmf = TwoBandQmf::new(320);
        let mut low = vec![0.0f32; 160];
        let mut high = vec![0.0f32; 160];
        let mut n = 0u32;
        for _ in 0..4 {
            let input: Vec<f32> = (0..320)
                .map(|_| {
                    let v = (2.0 * PI * 400.0 * n as f32 / 32000.0).sin();
                    n += 1;
                    v
                })
                .collect();
            qmf.analysis(&input, &mut low, &mut high);
        }
        let low_energy: f32 = low.iter().map(|&v| v * v).sum();
        let high_energy: f32 = high.iter().map(|&v| v * v).sum();
        assert!(low_energy > 100.0 * high_energy);
    }

    #[test]
    fn test_sine_round_trip_preserves_rms() {
        let mut qmf = TwoBandQmf::new(320);
        let mut low = vec![0.0f32; 160];
        let mut high = vec![0.0f32; 160];
        let mut output = vec![0.0f32; 320];
        let mut n = 0u32;
        let mut rms = 0.0;
        for _ in 0..6 {
            let input: Vec<f32> = (0..320)
                .map(|_| {
                    let v = (2.0 * PI * 3000.0 * n as f32 / 32000.0).sin();
                    n += 1;
                    v
                })
                .collect();
            qmf.analysis(&input, &mut low, &mut high);
            qmf.synthesis(&low, &high, &mut output);
            rms = (output.iter().map(|&v| v * v).sum::<f32>() / output.len() as f32).sqrt();
        }
        let expected = 1.0 / 2.0f32.sqrt();
        assert!((rms - expected).abs() < 0.05 * expected, "rms {rms}");
    }
}
