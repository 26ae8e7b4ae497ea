//! Pattern-based cell naming.
//!
//! A [`NamingConfig`] holds a template such as `{band}{site}{sector}` plus two
//! switches: which site field fills `{site}` and how `{sector}` is rendered.
//! The template is parsed once when the configuration is built, so rendering
//! a name is infallible and pure.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::SectorId;
use crate::site::Site;

pub const DEFAULT_PATTERN: &str = "{band}{site}{sector}";

/// Which site field fills the `{site}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteKey {
    #[default]
    Uid,
    Name,
}

/// How the `{sector}` placeholder is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SectorLabel {
    /// `1`, `2`, `3`
    #[default]
    #[serde(rename = "1based")]
    OneBased,
    /// `A`, `B`, `C`
    #[serde(rename = "ABC")]
    Letters,
}

impl SectorLabel {
    pub fn render(self, sector: SectorId) -> String {
        match self {
            SectorLabel::OneBased => (sector.index() + 1).to_string(),
            SectorLabel::Letters => char::from(b'A' + sector.index() as u8).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Band,
    Site,
    Sector,
    SectorId,
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, CoreError> {
    let fail = |reason: &str| CoreError::InvalidNamingPattern {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(fail("unbalanced '{'")),
                        Some(other) => key.push(other),
                    }
                }
                let segment = match key.as_str() {
                    "band" => Segment::Band,
                    "site" => Segment::Site,
                    "sector" => Segment::Sector,
                    "sector_id" => Segment::SectorId,
                    _ => return Err(fail(&format!("unknown placeholder '{{{}}}'", key))),
                };
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment);
            }
            '}' => return Err(fail("unbalanced '}'")),
            other => literal.push(other),
        }
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    if segments.is_empty() {
        return Err(fail("pattern is empty"));
    }
    Ok(segments)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawNamingConfig {
    #[serde(default)]
    use_site: SiteKey,
    #[serde(default)]
    sector_mode: SectorLabel,
    #[serde(default = "default_pattern")]
    pattern: String,
}

fn default_pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

/// Cell naming configuration with a pre-parsed template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNamingConfig", into = "RawNamingConfig")]
pub struct NamingConfig {
    site_key: SiteKey,
    sector_label: SectorLabel,
    pattern: String,
    segments: Vec<Segment>,
}

impl NamingConfig {
    pub fn new(
        site_key: SiteKey,
        sector_label: SectorLabel,
        pattern: &str,
    ) -> Result<Self, CoreError> {
        let segments = parse_pattern(pattern)?;
        Ok(NamingConfig {
            site_key,
            sector_label,
            pattern: pattern.to_string(),
            segments,
        })
    }

    pub fn site_key(&self) -> SiteKey {
        self.site_key
    }

    pub fn sector_label(&self) -> SectorLabel {
        self.sector_label
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Renders the display name of a cell on `site`/`sector` with `band`.
    pub fn cell_name(&self, site: &Site, sector: SectorId, band: &str) -> String {
        let site_key = match self.site_key {
            SiteKey::Uid => site.uid.as_str(),
            SiteKey::Name => site.name.as_str(),
        };
        let mut name = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Band => name.push_str(band),
                Segment::Site => name.push_str(site_key),
                Segment::Sector => name.push_str(&self.sector_label.render(sector)),
                Segment::SectorId => name.push_str(&sector.index().to_string()),
            }
        }
        name
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        NamingConfig {
            site_key: SiteKey::Uid,
            sector_label: SectorLabel::OneBased,
            pattern: DEFAULT_PATTERN.to_string(),
            segments: vec![Segment::Band, Segment::Site, Segment::Sector],
        }
    }
}

impl TryFrom<RawNamingConfig> for NamingConfig {
    type Error = CoreError;

    fn try_from(raw: RawNamingConfig) -> Result<Self, Self::Error> {
        NamingConfig::new(raw.use_site, raw.sector_mode, &raw.pattern)
    }
}

impl From<NamingConfig> for RawNamingConfig {
    fn from(config: NamingConfig) -> Self {
        RawNamingConfig {
            use_site: config.site_key,
            sector_mode: config.sector_label,
            pattern: config.pattern,
        }
    }
}
