//! API schema types for request/response definitions.
//!
//! Wire names follow the cell table (`fc_hz`, `tilt_deg`, `bs_rows`, ...).
//! Request types own numeric payload validation: [`FieldChecks`] collects
//! every bad field so one 422 response lists them all, before anything
//! reaches the topology.

pub mod cells;
pub mod runs;
pub mod simulation;
pub mod sites;

use crate::error::{ApiError, FieldError};

/// Accumulates field errors for one request.
#[derive(Debug, Default)]
pub struct FieldChecks {
    errors: Vec<FieldError>,
}

impl FieldChecks {
    pub fn new() -> Self {
        FieldChecks::default()
    }

    pub fn fail(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn finite(&mut self, field: &str, value: Option<f64>) {
        if matches!(value, Some(v) if !v.is_finite()) {
            self.fail(field, "must be a finite number");
        }
    }

    pub fn positive(&mut self, field: &str, value: Option<f64>) {
        if matches!(value, Some(v) if !(v.is_finite() && v > 0.0)) {
            self.fail(field, "must be a positive number");
        }
    }

    pub fn within(&mut self, field: &str, value: Option<f64>, lo: f64, hi: f64) {
        if matches!(value, Some(v) if !(v.is_finite() && v >= lo && v <= hi)) {
            self.fail(field, &format!("must be within [{}, {}]", lo, hi));
        }
    }

    pub fn at_least_one(&mut self, field: &str, value: Option<u32>) {
        if value == Some(0) {
            self.fail(field, "must be at least 1");
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationFailed(self.errors))
        }
    }
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_failure() {
        let mut checks = FieldChecks::new();
        checks.positive("fc_hz", Some(-1.0));
        checks.within("tilt_deg", Some(95.0), -90.0, 90.0);
        checks.at_least_one("bs_rows", Some(0));
        checks.finite("x", Some(1.0));
        checks.positive("height_m", None);
        match checks.finish() {
            Err(ApiError::ValidationFailed(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["fc_hz", "tilt_deg", "bs_rows"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}
