use std::simd::{f32x4, Simd};

const S16_SCALE: f32 = 32768.0;

/// Scales normalized float samples ([-1, 1]) into the S16-scaled float range.
pub fn float_to_float_s16(input: &[f32], output: &mut [f32]) {
    assert_eq!(input.len(), output.len());

    let scale = f32x4::splat(S16_SCALE);
    let chunks = output.len() / 4;

    // Process 4 elements at a time using SIMD
    for i in 0..chunks {
        let offset = i * 4;
        let v: f32x4 = Simd::from_slice(&input[offset..offset + 4]);
        (v * scale).copy_to_slice(&mut output[offset..offset + 4]);
    }

    // Handle remaining elements
    for i in chunks * 4..output.len() {
        output[i] = input[i] * S16_SCALE;
    }
}

/// Scales S16-scaled float samples back to the normalized float range.
pub fn float_s16_to_float(input: &[f32], output: &mut [f32]) {
    assert_eq!(input.len(), output.len());

    let scale = f32x4::splat(1.0 / S16_SCALE);
    let chunks = output.len() / 4;

    for i in 0..chunks {
        let offset = i * 4;
        let v: f32x4 = Simd::from_slice(&input[offset..offset + 4]);
        (v * scale).copy_to_slice(&mut output[offset..offset + 4]);
    }

    for i in chunks * 4..output.len() {
        output[i] = input[i] * (1.0 / S16_SCALE);
    }
}

/// Quantizes one S16-scaled float sample: clamp to the i16 range, round half
/// away from zero.
#[inline]
pub fn float_s16_to_s16(value: f32) -> i16 {
    let clamped = value.clamp(-32768.0, 32767.0);
    let rounded = if clamped >= 0.0 {
        clamped + 0.5
    } else {
        clamped - 0.5
    };
    rounded as i16
}

/// Unweighted average of planar channels into a mono output.
pub fn downmix_to_mono(input: &[&[f32]], output: &mut [f32]) {
    assert!(!input.is_empty());
    output.copy_from_slice(input[0]);
    for channel in &input[1..] {
        assert_eq!(channel.len(), output.len());
        for (acc, &s) in output.iter_mut().zip(channel.iter()) {
            *acc += s;
        }
    }
    let scale = 1.0 / input.len() as f32;
    for v in output.iter_mut() {
        *v *= scale;
    }
}

/// Unweighted average across an interleaved frame's channels, one mono sample
/// per time step. Accumulates in i32 before the integer divide.
pub fn downmix_interleaved_to_mono(interleaved: &[i16], num_channels: usize, output: &mut [i16]) {
    assert!(num_channels > 0);
    assert_eq!(interleaved.len(), output.len() * num_channels);
    for (out, frame) in output
        .iter_mut()
        .zip(interleaved.chunks_exact(num_channels))
    {
        let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
        *out = (sum / num_channels as i32) as i16;
    }
}

/// Splits an interleaved frame into planar channel slices.
pub fn deinterleave<'a, I>(interleaved: &[i16], num_channels: usize, channels: I)
where
    I: Iterator<Item = &'a mut [i16]>,
{
    let mut seen = 0;
    for (ch, dst) in channels.enumerate() {
        assert_eq!(dst.len() * num_channels, interleaved.len());
        for (i, s) in dst.iter_mut().enumerate() {
            *s = interleaved[i * num_channels + ch];
        }
        seen += 1;
    }
    assert_eq!(seen, num_channels);
}

/// Packs planar channel slices into an interleaved frame.
pub fn interleave<'a, I>(channels: I, num_channels: usize, interleaved: &mut [i16])
where
    I: Iterator<Item = &'a [i16]>,
{
    let mut seen = 0;
    for (ch, src) in channels.enumerate() {
        assert_eq!(src.len() * num_channels, interleaved.len());
        for (i, &s) in src.iter().enumerate() {
            interleaved[i * num_channels + ch] = s;
        }
        seen += 1;
    }
    assert_eq!(seen, num_channels);
}

/// Replicates a mono channel into every slot of an interleaved frame.
pub fn upmix_mono_to_interleaved(mono: &[i16], num_channels: usize, interleaved: &mut [i16]) {
    assert_eq!(mono.len() * num_channels, interleaved.len());
    for (frame, &s) in interleaved.chunks_exact_mut(num_channels).zip(mono.iter()) {
        frame.fill(s);
    }
}
