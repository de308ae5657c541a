pub mod logging;

/// Clamp into `[lo, hi]`, mapping NaN to `lo`.
pub fn clamp_finite(value: f64, lo: f64, hi: f64) -> f64 {
    if value.is_nan() {
        return lo;
    }
    value.clamp(lo, hi)
}
