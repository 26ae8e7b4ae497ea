//! The chunked compute engine.
//!
//! For every compute group, in planner order, the engine builds exactly one
//! evaluator, then walks cell-chunks (outer) and UE-chunks (inner). Columns
//! are assigned sequentially: group order, then chunk order, then position
//! within the chunk. The resulting layout depends only on the cell list, so
//! repeated computes over the same topology and UEs are bit-identical given a
//! deterministic evaluator.

use tracing::{debug, info};

use ransim_core::{Topology, UeDrop};

use crate::chunk::{chunk_ranges, ChunkSettings};
use crate::error::ComputeError;
use crate::evaluator::EvaluatorFactory;
use crate::geometry::{BsGeometry, UeChunk};
use crate::matrix::{ColumnMeta, ComputeResult, RsrpMatrix};
use crate::planner::plan_groups;
use crate::power::{dbm_to_watt, watt_to_dbm};

/// Computes RSRP matrices with bounded evaluator calls.
pub struct ChunkedComputeEngine<'f> {
    factory: &'f dyn EvaluatorFactory,
    settings: ChunkSettings,
}

impl<'f> ChunkedComputeEngine<'f> {
    pub fn new(factory: &'f dyn EvaluatorFactory, settings: ChunkSettings) -> Self {
        ChunkedComputeEngine { factory, settings }
    }

    /// Computes the full `U x C` matrix.
    ///
    /// Fails without evaluating anything when there are no UEs, no sites, or
    /// no cells.
    pub fn compute(
        &self,
        topology: &Topology,
        ues: Option<&UeDrop>,
    ) -> Result<ComputeResult, ComputeError> {
        let ues = match ues {
            Some(ues) if !ues.is_empty() => ues,
            _ => return Err(ComputeError::NoUes),
        };
        if topology.sites().is_empty() {
            return Err(ComputeError::NoSites);
        }
        if topology.cells().is_empty() {
            return Err(ComputeError::NoCells);
        }

        let groups = plan_groups(topology.cells());
        let num_ues = ues.len();
        let num_cells = topology.cells().len();
        let ue_ranges = chunk_ranges(num_ues, self.settings.ue_chunk);
        info!(
            groups = groups.len(),
            ues = num_ues,
            cells = num_cells,
            ue_chunks = ue_ranges.len(),
            "computing RSRP matrix"
        );

        let mut matrix = RsrpMatrix::new(num_ues, num_cells);
        let mut columns = Vec::with_capacity(num_cells);

        for (g, group) in groups.iter().enumerate() {
            let mut evaluator = self.factory.build(group.frequency_hz, &group.array)?;
            let cell_ranges = chunk_ranges(group.cells.len(), self.settings.cells_chunk);
            debug!(
                group = g,
                fc_hz = group.frequency_hz,
                cells = group.cells.len(),
                cell_chunks = cell_ranges.len(),
                "evaluating group"
            );

            for cell_range in cell_ranges {
                let chunk = &group.cells[cell_range];
                let bs = BsGeometry::for_cells(topology, chunk)?;
                let first_col = columns.len();

                for ue_range in &ue_ranges {
                    let ue_chunk = UeChunk::slice(ues, ue_range.clone());
                    let gains = evaluator.evaluate(&bs, &ue_chunk)?;
                    if gains.num_ues() != ue_chunk.len() || gains.num_cells() != chunk.len() {
                        return Err(ComputeError::GainShape {
                            ues: ue_chunk.len(),
                            cells: chunk.len(),
                            got: gains.num_ues() * gains.num_cells(),
                        });
                    }
                    for (c, (_, cell)) in chunk.iter().enumerate() {
                        let tx_w = dbm_to_watt(cell.tx_power_dbm);
                        for u in 0..ue_chunk.len() {
                            let rx_w = tx_w * gains.get(u, c);
                            matrix.set(ue_range.start + u, first_col + c, watt_to_dbm(rx_w));
                        }
                    }
                }

                for ((cell_idx, cell), position) in chunk.iter().zip(&bs.positions) {
                    let azimuth_deg = topology
                        .site(cell.site)
                        .map(|s| s.azimuth(cell.sector))
                        .unwrap_or_default();
                    columns.push(ColumnMeta {
                        cell_idx: *cell_idx,
                        name: cell.name.clone(),
                        band: cell.band.clone(),
                        fc_hz: cell.frequency_hz,
                        tx_rs_power_dbm: cell.tx_power_dbm,
                        site_idx: cell.site,
                        sector_id: cell.sector,
                        azimuth_deg,
                        tilt_deg: cell.effective_downtilt(),
                        roll_deg: cell.roll_deg,
                        height_m: position[2],
                    });
                }
            }
        }

        Ok(ComputeResult { matrix, columns })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use proptest::prelude::*;
    use ransim_core::ue::drop_ues;
    use ransim_core::{
        AntennaArray, ArrayOverrides, CellIdx, CellRef, CellSpec, CellUpdate, DropRequest,
        SectorId, SiteIdx, SiteSpec,
    };

    use super::*;
    use crate::evaluator::{GainMatrix, PropagationEvaluator};
    use crate::reference::ReferenceFactory;

    /// Gain encodes the (ue x, cell x) pair so misplaced writes are visible.
    struct CoordEvaluator;

    impl PropagationEvaluator for CoordEvaluator {
        fn evaluate(
            &mut self,
            bs: &BsGeometry,
            ues: &UeChunk<'_>,
        ) -> Result<GainMatrix, ComputeError> {
            let mut data = Vec::new();
            for ue in ues.positions {
                for pos in &bs.positions {
                    data.push(1e-9 * (1.0 + ue[0].abs() + 1000.0 * pos[0].abs()));
                }
            }
            GainMatrix::new(ues.len(), bs.len(), data)
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    impl EvaluatorFactory for CountingFactory {
        fn build(
            &self,
            _frequency_hz: f64,
            _array: &AntennaArray,
        ) -> Result<Box<dyn PropagationEvaluator>, ComputeError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(CoordEvaluator))
        }
    }

    struct ShortEvaluator;

    impl PropagationEvaluator for ShortEvaluator {
        fn evaluate(&mut self, _: &BsGeometry, _: &UeChunk<'_>) -> Result<GainMatrix, ComputeError> {
            GainMatrix::new(0, 0, Vec::new())
        }
    }

    struct ShortFactory;

    impl EvaluatorFactory for ShortFactory {
        fn build(&self, _: f64, _: &AntennaArray) -> Result<Box<dyn PropagationEvaluator>, ComputeError> {
            Ok(Box::new(ShortEvaluator))
        }
    }

    fn network() -> Topology {
        let mut topo = Topology::new();
        topo.add_site(SiteSpec::at(0.0, 0.0)).unwrap();
        topo.add_site(SiteSpec::at(800.0, 300.0)).unwrap();
        let wide = ArrayOverrides {
            rows: Some(8),
            cols: Some(1),
            ..Default::default()
        };
        for site in 0..2 {
            for sector in SectorId::ALL {
                topo.add_cell(
                    CellSpec::new(SiteIdx(site), sector, "H", 2.5e9)
                        .with_downtilt(9.0)
                        .with_array(wide.clone()),
                )
                .unwrap();
                topo.add_cell(CellSpec::new(SiteIdx(site), sector, "L", 6e8).with_tx_power(3.0))
                    .unwrap();
            }
        }
        topo
    }

    fn ues(topo: &Topology, n: usize) -> UeDrop {
        drop_ues(&DropRequest::new(n), topo.sites()).unwrap()
    }

    #[test]
    fn preconditions_are_checked_in_order() {
        let factory = ReferenceFactory;
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::default());
        let empty = Topology::new();
        assert!(matches!(engine.compute(&empty, None), Err(ComputeError::NoUes)));

        let ue_drop = ues(&network(), 4);
        assert!(matches!(
            engine.compute(&empty, Some(&ue_drop)),
            Err(ComputeError::NoSites)
        ));

        let mut sites_only = Topology::new();
        sites_only.add_site(SiteSpec::at(0.0, 0.0)).unwrap();
        let err = engine.compute(&sites_only, Some(&ue_drop)).unwrap_err();
        assert!(matches!(err, ComputeError::NoCells));
        assert!(err.is_precondition());
    }

    #[test]
    fn one_evaluator_per_group() {
        let topo = network();
        let factory = CountingFactory::default();
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::new(Some(1), Some(3)));
        let result = engine.compute(&topo, Some(&ues(&topo, 10))).unwrap();
        assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
        assert_eq!(result.matrix.num_cells(), 12);
        assert_eq!(result.matrix.num_ues(), 10);
    }

    #[test]
    fn columns_follow_group_order() {
        let topo = network();
        let factory = ReferenceFactory;
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::default());
        let result = engine.compute(&topo, Some(&ues(&topo, 5))).unwrap();
        let order: Vec<usize> = result.columns.iter().map(|c| c.cell_idx.0).collect();
        // H cells sit at even indices, L cells at odd ones
        assert_eq!(order, vec![0, 2, 4, 6, 8, 10, 1, 3, 5, 7, 9, 11]);
        assert_eq!(result.columns[0].tilt_deg, 9.0);
        assert_eq!(result.columns[6].tilt_deg, 0.0);
        assert_eq!(result.columns[6].tx_rs_power_dbm, 3.0);
        assert_eq!(result.column_of(CellIdx(1)), Some(6));
    }

    #[test]
    fn power_conversion_uses_tx_power() {
        let mut topo = Topology::new();
        topo.add_site(SiteSpec::at(0.0, 0.0)).unwrap();
        topo.add_cell(CellSpec::new(SiteIdx(0), SectorId::ALL[0], "A", 1e9).with_tx_power(30.0))
            .unwrap();
        let mut ue_drop = ues(&topo, 1);
        ue_drop.positions[0] = [0.0, 0.0, 0.0];
        let factory = CountingFactory::default();
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::default());
        let result = engine.compute(&topo, Some(&ue_drop)).unwrap();
        // 30 dBm = 1 W; gain = 1e-9 * (1 + 0 + 0) -> -60 dBm
        assert!((result.matrix.get(0, 0) + 60.0).abs() < 1e-9);
    }

    #[test]
    fn compute_is_deterministic() {
        let topo = network();
        let ue_drop = ues(&topo, 40);
        let factory = ReferenceFactory;
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::new(Some(4), Some(7)));
        let a = engine.compute(&topo, Some(&ue_drop)).unwrap();
        let b = engine.compute(&topo, Some(&ue_drop)).unwrap();
        assert_eq!(a.matrix.as_slice(), b.matrix.as_slice());
        assert_eq!(a.columns, b.columns);
    }

    #[test]
    fn tilt_round_trip_restores_matrix() {
        let mut topo = network();
        let ue_drop = ues(&topo, 30);
        let factory = ReferenceFactory;
        let engine = ChunkedComputeEngine::new(&factory, ChunkSettings::default());
        let before = engine.compute(&topo, Some(&ue_drop)).unwrap();

        let cell = CellRef::Index(0);
        topo.update_cell(&cell, &CellUpdate::downtilt(2.0), false).unwrap();
        let changed = engine.compute(&topo, Some(&ue_drop)).unwrap();
        assert_ne!(before.matrix.as_slice(), changed.matrix.as_slice());

        topo.update_cell(&cell, &CellUpdate::downtilt(9.0), false).unwrap();
        let after = engine.compute(&topo, Some(&ue_drop)).unwrap();
        assert_eq!(before.matrix.as_slice(), after.matrix.as_slice());
    }

    #[test]
    fn wrong_gain_shape_is_an_error() {
        let topo = network();
        let engine = ChunkedComputeEngine::new(&ShortFactory, ChunkSettings::default());
        assert!(matches!(
            engine.compute(&topo, Some(&ues(&topo, 3))),
            Err(ComputeError::GainShape { .. })
        ));
    }

    proptest! {
        #[test]
        fn chunk_sizes_do_not_change_the_matrix(
            cells_chunk in 0usize..8,
            ue_chunk in 0usize..12,
            n in 1usize..25,
        ) {
            let topo = network();
            let ue_drop = ues(&topo, n);
            let factory = CountingFactory::default();
            let whole = ChunkedComputeEngine::new(&factory, ChunkSettings::default())
                .compute(&topo, Some(&ue_drop))
                .unwrap();
            let chunked = ChunkedComputeEngine::new(
                &factory,
                ChunkSettings::new(Some(cells_chunk), Some(ue_chunk)),
            )
            .compute(&topo, Some(&ue_drop))
            .unwrap();
            prop_assert_eq!(whole.matrix.as_slice(), chunked.matrix.as_slice());
            prop_assert_eq!(whole.columns, chunked.columns);
        }
    }
}
