//! Index newtypes and references for topology entities.
//!
//! Sites and cells are addressed by their position in the topology's lists.
//! Both lists are append-only, so an index stays valid for the lifetime of
//! the topology. [`SiteRef`] and [`CellRef`] are the caller-facing forms that
//! also accept a uid or name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Number of sector slots on every site.
pub const SECTORS_PER_SITE: usize = 3;

/// Position of a site in the topology's site list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteIdx(pub usize);

/// Position of a cell in the topology's cell list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellIdx(pub usize);

/// A sector slot on a site. Always 0, 1 or 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SectorId(u8);

impl SectorId {
    /// All three sector slots in order.
    pub const ALL: [SectorId; SECTORS_PER_SITE] = [SectorId(0), SectorId(1), SectorId(2)];

    /// Validates a raw sector number.
    pub fn new(value: i64) -> Result<Self, CoreError> {
        if (0..SECTORS_PER_SITE as i64).contains(&value) {
            Ok(SectorId(value as u8))
        } else {
            Err(CoreError::InvalidSector { value })
        }
    }

    /// Slot index into a site's azimuth array.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<i64> for SectorId {
    type Error = CoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SectorId::new(value)
    }
}

impl From<SectorId> for u8 {
    fn from(id: SectorId) -> Self {
        id.0
    }
}

/// Caller-facing site reference: an index, or a uid/name string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteRef {
    Index(usize),
    Key(String),
}

impl SiteRef {
    /// Parses a path segment. All-digit segments are indices.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) => SiteRef::Index(index),
            Err(_) => SiteRef::Key(raw.to_string()),
        }
    }
}

impl From<SiteIdx> for SiteRef {
    fn from(idx: SiteIdx) -> Self {
        SiteRef::Index(idx.0)
    }
}

impl From<&str> for SiteRef {
    fn from(key: &str) -> Self {
        SiteRef::Key(key.to_string())
    }
}

/// Caller-facing cell reference: an index or a cell name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellRef {
    Index(usize),
    Name(String),
}

impl CellRef {
    /// Parses a path segment. All-digit segments are indices.
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<usize>() {
            Ok(index) => CellRef::Index(index),
            Err(_) => CellRef::Name(raw.to_string()),
        }
    }
}

impl From<CellIdx> for CellRef {
    fn from(idx: CellIdx) -> Self {
        CellRef::Index(idx.0)
    }
}

impl From<&str> for CellRef {
    fn from(name: &str) -> Self {
        CellRef::Name(name.to_string())
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for SiteIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CellIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SiteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteRef::Index(i) => write!(f, "{}", i),
            SiteRef::Key(k) => write!(f, "{}", k),
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellRef::Index(i) => write!(f, "{}", i),
            CellRef::Name(n) => write!(f, "{}", n),
        }
    }
}
