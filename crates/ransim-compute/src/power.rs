//! dBm / watt conversions.

/// Floor applied before taking a logarithm so zero gain maps to a finite dBm.
pub const MIN_POWER_W: f64 = 1e-30;

pub fn dbm_to_watt(dbm: f64) -> f64 {
    1e-3 * 10f64.powf(dbm / 10.0)
}

pub fn watt_to_dbm(watt: f64) -> f64 {
    10.0 * watt.max(MIN_POWER_W).log10() + 30.0
}
