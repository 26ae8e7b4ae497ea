//! The simulation context and the operations behind the endpoints.
//!
//! [`Simulation`] owns the topology, the current UE drop, chunk settings and
//! the last compute result. Its methods are synchronous and run under the
//! configuration lock of the [`ConcurrencyGuard`](crate::concurrency::ConcurrencyGuard)
//! that wraps it. [`run_measurements`] drives one compute end to end:
//! snapshot, evaluate on the worker, compress, persist.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use ransim_compute::{ChunkSettings, ChunkedComputeEngine, ComputeResult, ReportCompressor};
use ransim_core::query::{CellQuery, QueryPage};
use ransim_core::table::{self, CellRow, SiteRow};
use ransim_core::{
    active_sectors, build_scenario, drop_ues, CellIdx, CellRef, CellUpdate,
    ScenarioConfig, SectorId, SiteRef, Topology, UeDrop,
};
use ransim_storage::{topology_fingerprint, NewRun};

use crate::error::{ApiError, FieldError};
use crate::schema::cells::{
    batch_status, AddCellRequest, AddCellResponse, ArrayFields, BulkUpdateRequest,
    BulkUpdateResponse, CellUpdateRequest, CellsResponse, ItemError, QueryUpdateRequest,
    QueryUpdateResponse, UpdatedCellView,
};
use crate::schema::runs::{MeasurementRequest, MeasurementResponse, RunAccess, RunMetadata};
use crate::schema::simulation::{
    DropUesRequest, DropUesResponse, InitializeResponse, NamingRequest, NamingResponse,
    ResultInfo, StatusResponse, UeInfoResponse,
};
use crate::schema::sites::{
    AddSiteRequest, AddSiteResponse, AddedCellView, RenameSiteRequest, SectorsResponse,
    SitesResponse,
};
use crate::state::AppState;

/// Default run id format, e.g. `2026-03-01_12-30-00`.
pub const RUN_ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

struct LastResult {
    run_id: String,
    result: ComputeResult,
}

/// Everything a compute reads, copied out from under the lock.
pub struct ComputeSnapshot {
    pub topology: Topology,
    pub ues: Option<UeDrop>,
    pub chunks: ChunkSettings,
    pub init_config: Option<ScenarioConfig>,
    pub timestep: u64,
}

pub struct Simulation {
    topology: Topology,
    ues: Option<UeDrop>,
    chunks: ChunkSettings,
    init_config: Option<ScenarioConfig>,
    timestep: u64,
    last_result: Option<LastResult>,
}

/// Parses the number out of a generated `SITE####A` label. Numbers past 9999
/// widen the field.
fn site_number(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("SITE")?.strip_suffix('A')?;
    if digits.len() >= 4 && digits.bytes().all(|b| b.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}

fn site_label(n: u32) -> String {
    format!("SITE{:04}A", n)
}

impl Simulation {
    /// An empty simulation: no sites, no cells, no UEs.
    pub fn new(chunks: ChunkSettings) -> Self {
        Simulation {
            topology: Topology::new(),
            ues: None,
            chunks,
            init_config: None,
            timestep: 0,
            last_result: None,
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn ues(&self) -> Option<&UeDrop> {
        self.ues.as_ref()
    }

    // -------------------------------------------------------------------
    // Scenario and status
    // -------------------------------------------------------------------

    /// Replaces the whole simulation with a generated scenario.
    pub fn initialize(&mut self, config: ScenarioConfig) -> Result<InitializeResponse, ApiError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ApiError::ValidationFailed(
                errors
                    .iter()
                    .map(|e| FieldError::new(e.field().unwrap_or("config"), e.to_string()))
                    .collect(),
            ));
        }
        let (topology, ues) = build_scenario(&config)?;
        if !self.topology.sites().is_empty() {
            warn!("replacing existing simulation");
        }

        self.topology = topology;
        self.ues = Some(ues);
        self.chunks = ChunkSettings::new(config.cells_chunk, config.ue_chunk);
        self.init_config = Some(config.clone());
        self.timestep = 0;
        self.last_result = None;
        info!(
            sites = self.topology.sites().len(),
            cells = self.topology.cells().len(),
            ues = config.num_ue,
            "simulation initialized"
        );

        Ok(InitializeResponse {
            num_sites: self.topology.sites().len(),
            num_cells: self.topology.cells().len(),
            num_ues: self.ues.as_ref().map_or(0, UeDrop::len),
            bands: self.topology.bands(),
            config,
        })
    }

    pub fn status(&self, compute_in_progress: bool) -> StatusResponse {
        let bands = self.topology.bands();
        StatusResponse {
            num_sites: self.topology.sites().len(),
            num_cells: self.topology.cells().len(),
            num_ues: self.ues.as_ref().map_or(0, UeDrop::len),
            num_bands: bands.len(),
            bands,
            chunks: self.chunks,
            timestep: self.timestep,
            compute_in_progress,
            has_results: self.last_result.is_some(),
            init_config: self.init_config.clone(),
        }
    }

    pub fn naming(&self) -> NamingResponse {
        NamingResponse {
            naming: self.topology.naming().clone(),
            array_defaults: self.topology.array_defaults().clone(),
        }
    }

    /// Applies to cells added from now on; existing names are kept.
    pub fn set_naming(&mut self, req: &NamingRequest) -> Result<NamingResponse, ApiError> {
        let naming = req.merge(self.topology.naming())?;
        info!(pattern = naming.pattern(), "naming updated");
        self.topology.set_naming(naming);
        Ok(self.naming())
    }

    /// Merges `fields` into the array defaults used by cells added later.
    pub fn set_array_defaults(&mut self, fields: &ArrayFields) -> Result<NamingResponse, ApiError> {
        let array = fields
            .to_overrides()?
            .apply(self.topology.array_defaults())?;
        self.topology.set_array_defaults(array)?;
        info!("array defaults updated");
        Ok(self.naming())
    }

    // -------------------------------------------------------------------
    // Sites
    // -------------------------------------------------------------------

    pub fn sites(&self) -> SitesResponse {
        let sites = table::site_rows(&self.topology);
        SitesResponse {
            num_sites: sites.len(),
            sites,
        }
    }

    pub fn site(&self, site: &SiteRef) -> Result<SiteRow, ApiError> {
        let idx = self.topology.resolve_site(site)?;
        table::site_rows(&self.topology)
            .into_iter()
            .nth(idx.0)
            .ok_or_else(|| ApiError::NotFound(format!("site {}", idx)))
    }

    pub fn sectors(&self) -> SectorsResponse {
        SectorsResponse {
            sectors: table::sector_summaries(&self.topology),
        }
    }

    /// One past the highest generated number among names and uids, stepped
    /// until the label is free as both.
    fn next_site_number(&self) -> u32 {
        let sites = self.topology.sites();
        let mut n = sites
            .iter()
            .flat_map(|s| [site_number(&s.name), site_number(&s.uid)])
            .flatten()
            .max()
            .unwrap_or(0)
            + 1;
        while sites.iter().any(|s| {
            let label = site_label(n);
            s.name == label || s.uid == label
        }) {
            n += 1;
        }
        n
    }

    /// Adds a site and its cells as one change: if any cell fails, nothing
    /// is added.
    pub fn add_site(&mut self, req: AddSiteRequest) -> Result<AddSiteResponse, ApiError> {
        req.check()?;
        let (name, uid, site_number) = match (&req.name, &req.uid) {
            (None, None) => {
                let n = self.next_site_number();
                let label = site_label(n);
                (Some(label.clone()), Some(label), Some(n))
            }
            _ => (req.name.clone(), req.uid.clone(), None),
        };

        let mut staged = self.topology.clone();
        let idx = staged.add_site(req.spec(name, uid))?;
        let mut cells_added = Vec::with_capacity(req.cells.len());
        for cell in req.cells {
            let spec = cell.at(SiteRef::Index(idx.0)).into_spec()?;
            let sector = spec.sector;
            let band = spec.band.clone();
            let added = staged.add_cell(spec)?;
            cells_added.push(AddedCellView {
                cell_idx: added.index.0,
                cell_name: added.name,
                band,
                sector_id: sector.into(),
            });
        }
        self.topology = staged;

        let site = &self.topology.sites()[idx.0];
        info!(site = %site.name, cells = cells_added.len(), "site added");
        Ok(AddSiteResponse {
            site_idx: idx.0,
            site_name: site.name.clone(),
            site_uid: site.uid.clone(),
            site_number,
            sector_azimuths: site.sector_azimuths,
            num_cells_added: cells_added.len(),
            cells_added,
        })
    }

    pub fn rename_site(
        &mut self,
        site: &SiteRef,
        req: RenameSiteRequest,
    ) -> Result<SiteRow, ApiError> {
        let idx = self.topology.rename_site(site, req.name, req.uid)?;
        info!(site = %self.topology.sites()[idx.0].name, "site renamed");
        self.site(&SiteRef::Index(idx.0))
    }

    pub fn set_sector_azimuth(
        &mut self,
        site: &SiteRef,
        sector: i64,
        azimuth_deg: f64,
    ) -> Result<SiteRow, ApiError> {
        let sector = SectorId::new(sector)?;
        let applied = self.topology.set_sector_azimuth(site, sector, azimuth_deg)?;
        info!(sector = sector.index(), azimuth = applied, "sector azimuth set");
        self.site(site)
    }

    pub fn set_site_height(&mut self, site: &SiteRef, height_m: f64) -> Result<SiteRow, ApiError> {
        self.topology.set_site_height(site, height_m)?;
        info!(height_m, "site height set");
        self.site(site)
    }

    // -------------------------------------------------------------------
    // Cells
    // -------------------------------------------------------------------

    pub fn cells(&self) -> CellsResponse {
        let cells = table::cell_rows(&self.topology);
        CellsResponse {
            num_cells: cells.len(),
            cells,
        }
    }

    pub fn cell(&self, cell: &CellRef) -> Result<CellRow, ApiError> {
        let idx = self.topology.resolve_cell(cell)?;
        self.row(idx)
    }

    fn row(&self, idx: CellIdx) -> Result<CellRow, ApiError> {
        table::cell_row(&self.topology, idx)
            .ok_or_else(|| ApiError::InternalError(format!("cell {} has no table row", idx)))
    }

    pub fn query(&self, query: &CellQuery) -> QueryPage {
        query.run(&self.topology)
    }

    pub fn add_cell(&mut self, req: AddCellRequest) -> Result<AddCellResponse, ApiError> {
        let spec = req.into_spec()?;
        let site_idx = self.topology.resolve_site(&spec.site)?;
        let sector = spec.sector;
        let first_on_sector = !active_sectors(self.topology.cells(), site_idx)[sector.index()];

        let added = self.topology.add_cell(spec)?;
        let cell = &self.topology.cells()[added.index.0];
        let site = &self.topology.sites()[site_idx.0];
        let bands_on_sector = self
            .topology
            .cells()
            .iter()
            .filter(|c| c.site == site_idx && c.sector == sector)
            .map(|c| c.band.clone())
            .collect();
        info!(cell = %added.name, site = %site.name, "cell added");

        Ok(AddCellResponse {
            cell_idx: added.index.0,
            cell_name: added.name.clone(),
            site_name: site.name.clone(),
            sector_id: sector,
            band: cell.band.clone(),
            sector_azimuth_deg: site.azimuth(sector),
            azimuth_applied: added.azimuth_applied,
            is_first_cell_on_sector: first_on_sector,
            bands_on_sector,
            cell: self.row(added.index)?,
        })
    }

    fn apply_update(
        &mut self,
        cell: &CellRef,
        update: &CellUpdate,
        rename: bool,
    ) -> Result<UpdatedCellView, ApiError> {
        let updated = self.topology.update_cell(cell, update, rename)?;
        info!(
            cell = %updated.name,
            fields = ?updated.updated_fields,
            "cell updated"
        );
        Ok(UpdatedCellView {
            cell_idx: updated.index.0,
            original_name: updated.original_name,
            cell_name: updated.name,
            moved: updated.moved,
            updated_fields: updated.updated_fields,
            cell: self.row(updated.index)?,
        })
    }

    pub fn update_cell(&mut self, req: &CellUpdateRequest) -> Result<UpdatedCellView, ApiError> {
        let cell = req.cell_ref()?;
        let update = req.fields.to_update()?;
        self.apply_update(&cell, &update, req.rename)
    }

    /// Applies each update independently. Earlier successes stay applied when
    /// a later item fails.
    pub fn bulk_update(&mut self, req: &BulkUpdateRequest) -> Result<BulkUpdateResponse, ApiError> {
        if req.updates.is_empty() {
            return Err(ApiError::BadRequest("no updates provided".to_string()));
        }
        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut stopped_early = false;

        for (i, item) in req.updates.iter().enumerate() {
            match self.update_cell(item) {
                Ok(view) => results.push(view),
                Err(err) => {
                    warn!(item = i, error = %err, "bulk update item failed");
                    errors.push(ItemError {
                        index: i,
                        identifier: item.identifier(),
                        error: err.to_string(),
                    });
                    if req.stop_on_error {
                        stopped_early = i + 1 < req.updates.len();
                        break;
                    }
                }
            }
        }

        Ok(BulkUpdateResponse {
            num_requested: req.updates.len(),
            num_successful: results.len(),
            num_failed: errors.len(),
            stopped_early,
            status: batch_status(results.len(), errors.len()),
            results,
            errors,
        })
    }

    /// Applies one update to every cell the query matches.
    pub fn update_by_query(
        &mut self,
        req: &QueryUpdateRequest,
    ) -> Result<QueryUpdateResponse, ApiError> {
        if !req.query.has_filters() {
            return Err(ApiError::BadRequest(
                "query-based update needs at least one filter".to_string(),
            ));
        }
        let update = req.update.to_update()?;

        let targets: Vec<(CellIdx, String)> = req
            .query
            .run(&self.topology)
            .cells
            .into_iter()
            .map(|row| (row.cell_idx, row.cell_name))
            .collect();

        let mut results = Vec::new();
        let mut errors = Vec::new();
        let mut stopped_early = false;
        for (i, (idx, name)) in targets.iter().enumerate() {
            match self.apply_update(&CellRef::Index(idx.0), &update, req.rename) {
                Ok(view) => results.push(view),
                Err(err) => {
                    errors.push(ItemError {
                        index: i,
                        identifier: name.clone(),
                        error: err.to_string(),
                    });
                    if req.stop_on_error {
                        stopped_early = i + 1 < targets.len();
                        break;
                    }
                }
            }
        }

        Ok(QueryUpdateResponse {
            query_matched: targets.len(),
            num_updated: results.len(),
            num_failed: errors.len(),
            stopped_early,
            status: batch_status(results.len(), errors.len()),
            results,
            errors,
        })
    }

    // -------------------------------------------------------------------
    // UEs
    // -------------------------------------------------------------------

    /// Replaces every UE. The last compute result no longer applies and is
    /// discarded.
    pub fn drop_ues(&mut self, req: DropUesRequest) -> Result<DropUesResponse, ApiError> {
        let request = req.into_request()?;
        let ues = drop_ues(&request, self.topology.sites())?;
        let results_cleared = self.last_result.take().is_some();
        info!(ues = ues.len(), layout = ?request.layout, "UEs dropped");

        let response = DropUesResponse {
            num_ues: ues.len(),
            drop_params: ues.params.clone(),
            results_cleared,
        };
        self.ues = Some(ues);
        Ok(response)
    }

    pub fn ue_info(&self) -> UeInfoResponse {
        let results = self.last_result.as_ref().map(|last| {
            let best = last.result.best_columns();
            let mut counts: HashMap<usize, usize> = HashMap::new();
            for column in best.iter().flatten() {
                *counts.entry(*column).or_default() += 1;
            }
            let mut serving_cells: Vec<(String, usize)> = counts
                .into_iter()
                .map(|(column, n)| (last.result.columns[column].name.clone(), n))
                .collect();
            serving_cells.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            ResultInfo {
                run_id: last.run_id.clone(),
                rsrp_shape: [last.result.matrix.num_ues(), last.result.matrix.num_cells()],
                served_ues: best.iter().filter(|b| b.is_some()).count(),
                serving_cells,
            }
        });
        UeInfoResponse {
            num_ues: self.ues.as_ref().map_or(0, UeDrop::len),
            layout: self.ues.as_ref().map(|u| u.params.layout),
            drop_params: self.ues.as_ref().map(|u| u.params.clone()),
            has_results: results.is_some(),
            results,
        }
    }

    // -------------------------------------------------------------------
    // Compute bookkeeping
    // -------------------------------------------------------------------

    pub fn snapshot(&self) -> ComputeSnapshot {
        ComputeSnapshot {
            topology: self.topology.clone(),
            ues: self.ues.clone(),
            chunks: self.chunks,
            init_config: self.init_config.clone(),
            timestep: self.timestep,
        }
    }

    pub fn record_result(&mut self, run_id: String, result: ComputeResult) {
        self.timestep += 1;
        self.last_result = Some(LastResult { run_id, result });
    }
}

/// Computes, compresses and stores one measurement run.
///
/// Mutations are rejected from the moment the compute ticket is taken until
/// the run is stored. Reads keep working throughout.
pub async fn run_measurements(
    state: &AppState,
    req: MeasurementRequest,
) -> Result<MeasurementResponse, ApiError> {
    req.check()?;
    let _ticket = state.guard.begin_compute().await;

    let started = Utc::now();
    let run_id = req
        .run_id
        .clone()
        .unwrap_or_else(|| started.format(RUN_ID_FORMAT).to_string());
    let snapshot = state.guard.lock().await.snapshot();
    let chunks = snapshot.chunks;
    let topology = Arc::new(snapshot.topology);
    let ues = Arc::new(snapshot.ues);
    info!(run_id = %run_id, threshold_dbm = req.threshold_dbm, "running compute");

    let factory = Arc::clone(&state.evaluators);
    let compressor = ReportCompressor::new(req.threshold_dbm, req.label_mode);
    let job_topology = Arc::clone(&topology);
    let job_ues = Arc::clone(&ues);
    let outcome = state
        .worker
        .submit(move || {
            let ues = (*job_ues).as_ref();
            let engine = ChunkedComputeEngine::new(factory.as_ref(), chunks);
            let result = engine.compute(&job_topology, ues)?;
            let xy = ues.map(UeDrop::xy);
            let reports = compressor.compress(&result, xy.as_deref());
            Ok::<_, ransim_compute::ComputeError>((result, reports))
        })
        .await?;
    let (result, reports) = match outcome {
        Ok(done) => done,
        Err(err) => {
            if err.is_precondition() {
                warn!(run_id = %run_id, error = %err, "compute refused");
            } else {
                error!(run_id = %run_id, error = %err, "compute failed");
            }
            return Err(err.into());
        }
    };
    info!(
        run_id = %run_id,
        ues = result.matrix.num_ues(),
        cells = result.matrix.num_cells(),
        reports = reports.len(),
        "compute done"
    );

    let bands = topology.bands();
    let metadata = RunMetadata {
        name: req.name.clone(),
        timestamp: started.to_rfc3339(),
        unix_timestamp: started.timestamp(),
        timestep: snapshot.timestep + 1,
        num_users: result.matrix.num_ues(),
        num_sites: topology.sites().len(),
        num_cells: topology.cells().len(),
        num_bands: bands.len(),
        bands,
        chunks,
        topology_fingerprint: topology_fingerprint(&topology)?,
        init_config: snapshot.init_config,
        cell_states_at_run: table::cell_rows(&topology),
    };
    let run = NewRun {
        run_id: run_id.clone(),
        created_at: started,
        threshold_dbm: req.threshold_dbm,
        label_mode: req.label_mode,
        metadata: serde_json::to_value(&metadata)
            .map_err(|e| ApiError::InternalError(format!("run metadata: {}", e)))?,
        reports,
    };
    state.runs.lock().await.put_run(&run).map_err(|e| {
        error!(run_id = %run_id, error = %e, "failed to persist run");
        ApiError::from(e)
    })?;
    state.guard.lock().await.record_result(run_id.clone(), result);

    Ok(MeasurementResponse {
        access: RunAccess {
            metadata: format!("/runs/{}", run_id),
            reports: format!("/runs/{}/reports?limit=1000", run_id),
        },
        run_id,
        status: "stored",
        num_reports: run.reports.len(),
        threshold_dbm: req.threshold_dbm,
        label_mode: req.label_mode,
        metadata,
        measurement_reports: req.return_payload.then_some(run.reports),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::cells::CellFields;
    use serde_json::json;

    fn small_config() -> ScenarioConfig {
        ScenarioConfig {
            n_sites: 2,
            num_ue: 20,
            ..ScenarioConfig::default()
        }
    }

    fn initialized() -> Simulation {
        let mut sim = Simulation::new(ChunkSettings::default());
        sim.initialize(small_config()).unwrap();
        sim
    }

    fn tilt_update(cell: &str, tilt: f64) -> CellUpdateRequest {
        serde_json::from_value(json!({ "cell_name": cell, "tilt_deg": tilt })).unwrap()
    }

    #[test]
    fn site_numbers_parse_only_generated_names() {
        assert_eq!(site_number("SITE0012A"), Some(12));
        assert_eq!(site_number("SITE12A"), None);
        assert_eq!(site_number("SITE10000A"), Some(10000));
        assert_eq!(site_number("tower"), None);
    }

    #[test]
    fn initialize_builds_scenario_and_chunks() {
        let sim = initialized();
        let status = sim.status(false);
        assert_eq!(status.num_sites, 2);
        assert_eq!(status.num_cells, 12);
        assert_eq!(status.num_ues, 20);
        assert_eq!(status.bands, vec!["H", "L"]);
        assert_eq!(status.chunks, ChunkSettings::new(Some(48), Some(500)));
    }

    #[test]
    fn initialize_reports_every_bad_field() {
        let mut sim = Simulation::new(ChunkSettings::default());
        let config = ScenarioConfig {
            spacing: -1.0,
            num_ue: 0,
            ..ScenarioConfig::default()
        };
        match sim.initialize(config) {
            Err(ApiError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected {:?}", other.map(|r| r.num_sites)),
        }
        assert!(sim.topology().sites().is_empty());
    }

    #[test]
    fn generated_site_names_continue_numbering() {
        let mut sim = initialized();
        let req: AddSiteRequest = serde_json::from_value(json!({ "x": 900.0, "y": 0.0 })).unwrap();
        let added = sim.add_site(req).unwrap();
        assert_eq!(added.site_name, "SITE0003A");
        assert_eq!(added.site_number, Some(3));
    }

    #[test]
    fn generated_site_label_skips_taken_uids() {
        let mut sim = initialized();
        let tower: AddSiteRequest = serde_json::from_value(json!({
            "x": 900.0, "y": 0.0, "name": "tower", "uid": "SITE0003A"
        }))
        .unwrap();
        sim.add_site(tower).unwrap();

        let req: AddSiteRequest = serde_json::from_value(json!({ "x": 0.0, "y": 900.0 })).unwrap();
        let added = sim.add_site(req).unwrap();
        assert_eq!(added.site_name, "SITE0004A");
        assert_eq!(added.site_uid, "SITE0004A");
    }

    #[test]
    fn generated_site_labels_widen_past_9999() {
        let mut sim = initialized();
        let last: AddSiteRequest =
            serde_json::from_value(json!({ "x": 900.0, "y": 0.0, "name": "SITE9999A" })).unwrap();
        sim.add_site(last).unwrap();

        let mut names = Vec::new();
        for y in [900.0, 1800.0] {
            let req: AddSiteRequest = serde_json::from_value(json!({ "x": 0.0, "y": y })).unwrap();
            names.push(sim.add_site(req).unwrap().site_name);
        }
        assert_eq!(names, vec!["SITE10000A", "SITE10001A"]);
        assert_eq!(sim.topology().sites().len(), 5);
    }

    #[test]
    fn add_site_with_bad_cell_changes_nothing() {
        let mut sim = initialized();
        let req: AddSiteRequest = serde_json::from_value(json!({
            "x": 900.0, "y": 0.0,
            "cells": [
                { "sector_id": 0, "band": "H", "fc_hz": 2.5e9 },
                { "sector_id": 0, "band": "H", "fc_hz": 2.6e9 }
            ]
        }))
        .unwrap();
        assert!(sim.add_site(req).is_err());
        assert_eq!(sim.topology().sites().len(), 2);
        assert_eq!(sim.topology().cells().len(), 12);
    }

    #[test]
    fn bulk_update_continues_past_failures() {
        let mut sim = initialized();
        let req = BulkUpdateRequest {
            updates: vec![
                tilt_update("HSITE0001A1", 4.0),
                tilt_update("NOPE", 4.0),
                tilt_update("LSITE0001A1", 5.0),
            ],
            stop_on_error: false,
        };
        let res = sim.bulk_update(&req).unwrap();
        assert_eq!(res.num_successful, 2);
        assert_eq!(res.num_failed, 1);
        assert_eq!(res.errors[0].index, 1);
        assert_eq!(res.status, "partial");
        assert!(!res.stopped_early);
    }

    #[test]
    fn bulk_update_stops_on_error_without_rollback() {
        let mut sim = initialized();
        let req = BulkUpdateRequest {
            updates: vec![
                tilt_update("HSITE0001A1", 4.0),
                tilt_update("NOPE", 4.0),
                tilt_update("LSITE0001A1", 5.0),
            ],
            stop_on_error: true,
        };
        let res = sim.bulk_update(&req).unwrap();
        assert_eq!(res.num_successful, 1);
        assert!(res.stopped_early);
        let first = sim.cell(&CellRef::Name("HSITE0001A1".into())).unwrap();
        assert_eq!(first.tilt_deg, Some(4.0));
        let third = sim.cell(&CellRef::Name("LSITE0001A1".into())).unwrap();
        assert_eq!(third.tilt_deg, Some(9.0));
    }

    #[test]
    fn query_update_requires_a_filter() {
        let mut sim = initialized();
        let req = QueryUpdateRequest {
            query: CellQuery::default(),
            update: CellFields {
                tilt_deg: Some(3.0),
                ..Default::default()
            },
            stop_on_error: false,
            rename: true,
        };
        assert!(matches!(sim.update_by_query(&req), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn query_update_touches_only_matches() {
        let mut sim = initialized();
        let req = QueryUpdateRequest {
            query: CellQuery {
                band: Some("L".into()),
                ..Default::default()
            },
            update: CellFields {
                tilt_deg: Some(3.0),
                ..Default::default()
            },
            stop_on_error: false,
            rename: true,
        };
        let res = sim.update_by_query(&req).unwrap();
        assert_eq!(res.query_matched, 6);
        assert_eq!(res.num_updated, 6);
        for row in table::cell_rows(sim.topology()) {
            let expected = if row.band == "L" { 3.0 } else { 9.0 };
            assert_eq!(row.tilt_deg, Some(expected));
        }
    }

    #[test]
    fn dropping_ues_clears_last_result() {
        let mut sim = initialized();
        let result = ComputeResult {
            matrix: ransim_compute::RsrpMatrix::new(20, 12),
            columns: Vec::new(),
        };
        sim.record_result("r1".into(), result);
        assert!(sim.ue_info().has_results);

        let req: DropUesRequest = serde_json::from_value(json!({ "num_ue": 5 })).unwrap();
        let res = sim.drop_ues(req).unwrap();
        assert!(res.results_cleared);
        assert_eq!(res.num_ues, 5);
        let info = sim.ue_info();
        assert!(!info.has_results);
        assert_eq!(info.num_ues, 5);
    }
}
