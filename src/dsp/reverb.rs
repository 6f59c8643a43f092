//! Multi-tap reverb.
//!
//! A fixed five-tap decaying impulse response stands in for a full room
//! model: each tap is a scaled copy of the dry signal at a short delay. The
//! tap layout approximates early reflections; the teaching apps only need a
//! sense of space, not a Schroeder network.
//!
//! ```text
//! y[n] = x[n] + amount * sum_k gain_k * x[n - delay_k]
//! ```

/// Tap offsets in milliseconds.
pub const TAP_DELAYS_MS: [f32; 5] = [30.0, 50.0, 70.0, 100.0, 150.0];
/// Tap gains before scaling by the reverb amount.
pub const TAP_GAINS: [f32; 5] = [0.7, 0.5, 0.3, 0.2, 0.1];

/// Convolves `input` with the tap IR. The output keeps the input length; the
/// reverb tail past the buffer end is dropped, matching the fixed-duration
/// note model.
pub fn apply_reverb(input: &[f32], sample_rate: u32, amount: f32) -> Vec<f32> {
    let amount = amount.clamp(0.0, 1.0);
    let mut output = input.to_vec();
    if amount == 0.0 {
        return output;
    }

    for (delay_ms, gain) in TAP_DELAYS_MS.iter().zip(TAP_GAINS.iter()) {
        let delay = (delay_ms * sample_rate as f32 / 1000.0) as usize;
        if delay >= input.len() {
            continue;
        }
        let tap_gain = gain * amount;
        for n in delay..input.len() {
            output[n] += tap_gain * input[n - delay];
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22_050;

    #[test]
    fn zero_amount_is_identity() {
        let input: Vec<f32> = (0..2048).map(|i| (i as f32 * 0.01).sin()).collect();
        assert_eq!(apply_reverb(&input, SR, 0.0), input);
    }

    #[test]
    fn impulse_response_has_five_taps() {
        let mut input = vec![0.0f32; SR as usize / 2];
        input[0] = 1.0;

        let wet = apply_reverb(&input, SR, 1.0);
        for (delay_ms, gain) in TAP_DELAYS_MS.iter().zip(TAP_GAINS.iter()) {
            let delay = (delay_ms * SR as f32 / 1000.0) as usize;
            assert!(
                (wet[delay] - gain).abs() < 1e-6,
                "tap at {delay_ms} ms expected {gain}, got {}",
                wet[delay]
            );
        }
        // Dry sample passes through untouched.
        assert_eq!(wet[0], 1.0);
    }

    #[test]
    fn amount_scales_the_wet_taps() {
        let mut input = vec![0.0f32; SR as usize / 2];
        input[0] = 1.0;

        let wet = apply_reverb(&input, SR, 0.5);
        let first_tap = (TAP_DELAYS_MS[0] * SR as f32 / 1000.0) as usize;
        assert!((wet[first_tap] - TAP_GAINS[0] * 0.5).abs() < 1e-6);
    }

    #[test]
    fn short_buffer_skips_unreachable_taps() {
        let input = vec![1.0f32; 16];
        let wet = apply_reverb(&input, SR, 1.0);
        assert_eq!(wet.len(), 16);
        assert!(wet.iter().all(|s| s.is_finite()));
    }
}
