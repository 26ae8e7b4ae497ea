//! The topology store: sites, implicit sectors, and cells.
//!
//! [`Topology`] owns both entity lists and enforces every naming and
//! uniqueness rule. Each mutating method validates fully before touching
//! state, so a returned error always means "nothing changed". Sites and cells
//! are append-only; there is no delete.
//!
//! Sectors are not entities. Each site carries a fixed 3-slot azimuth array,
//! and a sector is *active* when at least one cell references it (see
//! [`active_sectors`]).

use serde::{Deserialize, Serialize};

use crate::antenna::AntennaArray;
use crate::cell::{Cell, CellSpec, CellUpdate};
use crate::error::{ensure_finite, CoreError};
use crate::id::{CellIdx, CellRef, SectorId, SiteIdx, SiteRef, SECTORS_PER_SITE};
use crate::naming::NamingConfig;
use crate::site::{normalize_azimuth, trisector_azimuths, validate_height, Site, SiteSpec};

/// Which sector slots of `site` are referenced by at least one cell.
pub fn active_sectors(cells: &[Cell], site: SiteIdx) -> [bool; SECTORS_PER_SITE] {
    let mut active = [false; SECTORS_PER_SITE];
    for cell in cells.iter().filter(|c| c.site == site) {
        active[cell.sector.index()] = true;
    }
    active
}

/// Result of a successful add-cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddedCell {
    pub index: CellIdx,
    pub name: String,
    /// Whether a requested sector azimuth override was applied. Overrides are
    /// ignored once the sector already has cells.
    pub azimuth_applied: bool,
}

/// Result of a successful update-cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatedCell {
    pub index: CellIdx,
    pub original_name: String,
    pub name: String,
    /// Site, sector or band changed.
    pub moved: bool,
    pub updated_fields: Vec<&'static str>,
}

/// Sites, cells, naming configuration, and default antenna array.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Topology {
    sites: Vec<Site>,
    cells: Vec<Cell>,
    naming: NamingConfig,
    array_defaults: AntennaArray,
}

impl Topology {
    pub fn new() -> Self {
        Topology::default()
    }

    pub fn with_naming(naming: NamingConfig) -> Self {
        Topology {
            naming,
            ..Topology::default()
        }
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn site(&self, idx: SiteIdx) -> Option<&Site> {
        self.sites.get(idx.0)
    }

    pub fn cell(&self, idx: CellIdx) -> Option<&Cell> {
        self.cells.get(idx.0)
    }

    pub fn naming(&self) -> &NamingConfig {
        &self.naming
    }

    pub fn array_defaults(&self) -> &AntennaArray {
        &self.array_defaults
    }

    /// Replaces the naming configuration. Existing cells keep their names.
    pub fn set_naming(&mut self, naming: NamingConfig) {
        self.naming = naming;
    }

    pub fn set_array_defaults(&mut self, array: AntennaArray) -> Result<(), CoreError> {
        array.validate()?;
        self.array_defaults = array;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Sites
    // -------------------------------------------------------------------

    /// Adds a tri-sector site.
    ///
    /// With neither name nor uid given, both become an auto-generated
    /// `site_<n>` label; with only one given, the other mirrors it.
    pub fn add_site(&mut self, spec: SiteSpec) -> Result<SiteIdx, CoreError> {
        spec.validate()?;
        let (name, uid) = match (spec.name, spec.uid) {
            (None, None) => {
                let label = self.next_site_label();
                (label.clone(), label)
            }
            (Some(name), None) => (name.clone(), name),
            (None, Some(uid)) => (uid.clone(), uid),
            (Some(name), Some(uid)) => (name, uid),
        };
        self.check_site_identity(None, &name, &uid)?;

        let idx = SiteIdx(self.sites.len());
        self.sites.push(Site {
            uid,
            name,
            x: spec.x,
            y: spec.y,
            height_m: spec.height_m,
            sector_azimuths: trisector_azimuths(spec.azimuth_deg),
        });
        Ok(idx)
    }

    /// Resolves an index, uid, or name to a site index. Uids win over names.
    pub fn resolve_site(&self, site: &SiteRef) -> Result<SiteIdx, CoreError> {
        match site {
            SiteRef::Index(index) if *index < self.sites.len() => Ok(SiteIdx(*index)),
            SiteRef::Index(index) => Err(CoreError::SiteIndexOutOfRange {
                index: *index,
                count: self.sites.len(),
            }),
            SiteRef::Key(key) => self
                .sites
                .iter()
                .position(|s| s.uid == *key)
                .or_else(|| self.sites.iter().position(|s| s.name == *key))
                .map(SiteIdx)
                .ok_or_else(|| CoreError::SiteNotFound { key: key.clone() }),
        }
    }

    /// Changes a site's name and/or uid. Cell names are not re-derived.
    pub fn rename_site(
        &mut self,
        site: &SiteRef,
        name: Option<String>,
        uid: Option<String>,
    ) -> Result<SiteIdx, CoreError> {
        let idx = self.resolve_site(site)?;
        if name.is_none() && uid.is_none() {
            return Err(CoreError::EmptyUpdate);
        }
        for (field, value) in [("name", &name), ("uid", &uid)] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(CoreError::invalid(field, "must not be empty"));
            }
        }
        let current = &self.sites[idx.0];
        let name = name.unwrap_or_else(|| current.name.clone());
        let uid = uid.unwrap_or_else(|| current.uid.clone());
        self.check_site_identity(Some(idx), &name, &uid)?;

        let site = &mut self.sites[idx.0];
        site.name = name;
        site.uid = uid;
        Ok(idx)
    }

    pub fn set_sector_azimuth(
        &mut self,
        site: &SiteRef,
        sector: SectorId,
        azimuth_deg: f64,
    ) -> Result<f64, CoreError> {
        let idx = self.resolve_site(site)?;
        let azimuth = normalize_azimuth(ensure_finite("azimuth_deg", azimuth_deg)?);
        self.sites[idx.0].sector_azimuths[sector.index()] = azimuth;
        Ok(azimuth)
    }

    pub fn set_site_height(&mut self, site: &SiteRef, height_m: f64) -> Result<(), CoreError> {
        let idx = self.resolve_site(site)?;
        self.sites[idx.0].height_m = validate_height(height_m)?;
        Ok(())
    }

    fn next_site_label(&self) -> String {
        let mut n = self.sites.len();
        loop {
            let label = format!("site_{}", n);
            if !self.sites.iter().any(|s| s.name == label || s.uid == label) {
                return label;
            }
            n += 1;
        }
    }

    fn check_site_identity(
        &self,
        skip: Option<SiteIdx>,
        name: &str,
        uid: &str,
    ) -> Result<(), CoreError> {
        for (i, other) in self.sites.iter().enumerate() {
            if skip == Some(SiteIdx(i)) {
                continue;
            }
            if other.name == name {
                return Err(CoreError::DuplicateSiteName {
                    name: name.to_string(),
                });
            }
            if other.uid == uid {
                return Err(CoreError::DuplicateSiteUid {
                    uid: uid.to_string(),
                });
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------

    pub fn resolve_cell(&self, cell: &CellRef) -> Result<CellIdx, CoreError> {
        match cell {
            CellRef::Index(index) if *index < self.cells.len() => Ok(CellIdx(*index)),
            CellRef::Index(index) => Err(CoreError::CellIndexOutOfRange {
                index: *index,
                count: self.cells.len(),
            }),
            CellRef::Name(name) => self
                .cells
                .iter()
                .position(|c| c.name == *name)
                .map(CellIdx)
                .ok_or_else(|| CoreError::CellNotFound { key: name.clone() }),
        }
    }

    /// Adds a cell. The name is derived from the naming pattern unless
    /// `spec.name` is set; either way it must be unique.
    pub fn add_cell(&mut self, spec: CellSpec) -> Result<AddedCell, CoreError> {
        let site_idx = self.resolve_site(&spec.site)?;
        let mut cell = spec.build(site_idx, &self.array_defaults)?;
        cell.name = match &spec.name {
            Some(name) if name.trim().is_empty() => {
                return Err(CoreError::invalid("name", "must not be empty"))
            }
            Some(name) => name.clone(),
            None => self
                .naming
                .cell_name(&self.sites[site_idx.0], cell.sector, &cell.band),
        };
        if self.cells.iter().any(|c| c.name == cell.name) {
            return Err(CoreError::DuplicateCellName { name: cell.name });
        }
        let azimuth = spec
            .sector_azimuth_deg
            .map(|deg| ensure_finite("sector_azimuth", deg).map(normalize_azimuth))
            .transpose()?;

        let mut azimuth_applied = false;
        if let Some(azimuth) = azimuth {
            if !active_sectors(&self.cells, site_idx)[cell.sector.index()] {
                self.sites[site_idx.0].sector_azimuths[cell.sector.index()] = azimuth;
                azimuth_applied = true;
            }
        }

        let index = CellIdx(self.cells.len());
        let name = cell.name.clone();
        self.cells.push(cell);
        Ok(AddedCell {
            index,
            name,
            azimuth_applied,
        })
    }

    /// Applies a partial update to one cell.
    ///
    /// The updated record is built off to the side and committed only when
    /// every field validates. When site, sector or band change and `rename`
    /// is set, the name is re-derived and must not collide with a different
    /// cell.
    pub fn update_cell(
        &mut self,
        cell: &CellRef,
        update: &CellUpdate,
        rename: bool,
    ) -> Result<UpdatedCell, CoreError> {
        update.validate()?;
        let idx = self.resolve_cell(cell)?;
        let current = &self.cells[idx.0];

        let mut next = current.clone();
        if let Some(site) = &update.site {
            next.site = self.resolve_site(site)?;
        }
        if let Some(sector) = update.sector {
            next.sector = sector;
        }
        if let Some(band) = &update.band {
            next.band = band.clone();
        }
        update.apply_rf(&mut next)?;

        let moved = next.site != current.site
            || next.sector != current.sector
            || next.band != current.band;
        if moved && rename {
            let name = self
                .naming
                .cell_name(&self.sites[next.site.0], next.sector, &next.band);
            let collides = self
                .cells
                .iter()
                .enumerate()
                .any(|(i, other)| i != idx.0 && other.name == name);
            if collides {
                return Err(CoreError::DuplicateCellName { name });
            }
            next.name = name;
        }

        let original_name = current.name.clone();
        let name = next.name.clone();
        self.cells[idx.0] = next;
        Ok(UpdatedCell {
            index: idx,
            original_name,
            name,
            moved,
            updated_fields: update.field_names(),
        })
    }

    /// Distinct band tags in first-seen cell order.
    pub fn bands(&self) -> Vec<String> {
        let mut bands: Vec<String> = Vec::new();
        for cell in &self.cells {
            if !bands.contains(&cell.band) {
                bands.push(cell.band.clone());
            }
        }
        bands
    }
}
