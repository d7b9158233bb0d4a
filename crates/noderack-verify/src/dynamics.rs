//! Level measurements over rendered signals.
//!
//! Both measurements accumulate in `f64`: renders run to hundreds of
//! thousands of samples and an `f32` running sum drifts by more than the
//! tolerances the cases check against.

/// Compute peak level (maximum absolute value)
pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0_f32, |max, &x| max.max(x.abs()))
}

/// Compute RMS (Root Mean Square) level of a signal
///
/// Returns RMS value in linear scale (not dB)
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = signal.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    (sum_sq / signal.len() as f64).sqrt() as f32
}

/// Compute crest factor (peak-to-RMS ratio)
///
/// A sine is ~1.414. Silence returns 0.
pub fn crest_factor(signal: &[f32]) -> f32 {
    let rms_val = rms(signal);
    if rms_val > 1e-10 {
        peak(signal) / rms_val
    } else {
        0.0
    }
}
