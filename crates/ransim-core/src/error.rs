//! Core error types for ransim-core.
//!
//! Every variant is a validation or not-found failure raised before any
//! state change, so callers can surface them without worrying about partial
//! mutation.

use thiserror::Error;

/// Errors produced by topology, naming, and UE drop operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A site with this name already exists.
    #[error("duplicate site name: '{name}'")]
    DuplicateSiteName { name: String },

    /// A site with this uid already exists.
    #[error("duplicate site uid: '{uid}'")]
    DuplicateSiteUid { uid: String },

    /// An integer site reference past the end of the site list.
    #[error("site index {index} out of range (have {count} sites)")]
    SiteIndexOutOfRange { index: usize, count: usize },

    /// No site matched the given uid or name.
    #[error("site not found: '{key}'")]
    SiteNotFound { key: String },

    /// An integer cell reference past the end of the cell list.
    #[error("cell index {index} out of range (have {count} cells)")]
    CellIndexOutOfRange { index: usize, count: usize },

    /// No cell has the given name.
    #[error("cell not found: '{key}'")]
    CellNotFound { key: String },

    /// A derived or explicit cell name collides with another cell.
    #[error("duplicate cell name: '{name}'")]
    DuplicateCellName { name: String },

    /// Sector ids are limited to 0, 1 and 2.
    #[error("invalid sector id {value}: must be 0, 1 or 2")]
    InvalidSector { value: i64 },

    /// A required field was absent or empty.
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    /// A field was present but its value is unusable.
    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// The naming pattern could not be parsed.
    #[error("invalid naming pattern '{pattern}': {reason}")]
    InvalidNamingPattern { pattern: String, reason: String },

    /// A partial update carried no fields.
    #[error("no fields to update")]
    EmptyUpdate,
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidField`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The request field this error points at, when there is one.
    pub fn field(&self) -> Option<&str> {
        match self {
            CoreError::DuplicateSiteName { .. } => Some("name"),
            CoreError::DuplicateSiteUid { .. } => Some("uid"),
            CoreError::SiteIndexOutOfRange { .. } | CoreError::SiteNotFound { .. } => {
                Some("site")
            }
            CoreError::CellIndexOutOfRange { .. } | CoreError::CellNotFound { .. } => {
                Some("cell")
            }
            CoreError::DuplicateCellName { .. } => Some("name"),
            CoreError::InvalidSector { .. } => Some("sector_id"),
            CoreError::MissingField { field } => Some(*field),
            CoreError::InvalidField { field, .. } => Some(field.as_str()),
            CoreError::InvalidNamingPattern { .. } => Some("pattern"),
            CoreError::EmptyUpdate => None,
        }
    }
}

/// Rejects NaN and infinities for a named numeric field.
pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<f64, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::invalid(field, "must be a finite number"))
    }
}
