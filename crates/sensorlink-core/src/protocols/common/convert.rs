/// Whether bit `bit` (0 = least significant) is set in `flags`.
pub(crate) fn flag_set(flags: u8, bit: u8) -> bool {
    flags & (1 << bit) != 0
}

/// Divide a fixed-point integer by `10^decimals`, rounding half-to-even at
/// that precision.
pub(crate) fn scale_fixed_point(raw: i64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    round_half_even(raw as f64 / factor, decimals)
}

pub(crate) fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
