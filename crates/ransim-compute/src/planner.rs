//! Compute-group planning.
//!
//! Cells sharing a carrier frequency and an identical antenna descriptor are
//! evaluated together. Groups come out in first-seen order over the cell
//! list, and cells within a group keep their list order; together these fix
//! the column layout of the RSRP matrix.

use indexmap::IndexMap;

use ransim_core::{AntennaArray, Cell, CellIdx, Polarization, PolarizationType};

/// The 8-part grouping key. Floats are compared bitwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    frequency_bits: u64,
    rows: u32,
    cols: u32,
    polarization: Polarization,
    polarization_type: PolarizationType,
    vertical_spacing_bits: u64,
    horizontal_spacing_bits: u64,
    pattern: String,
}

impl GroupKey {
    pub fn of(cell: &Cell) -> Self {
        let array = &cell.array;
        GroupKey {
            frequency_bits: cell.frequency_hz.to_bits(),
            rows: array.rows,
            cols: array.cols,
            polarization: array.polarization,
            polarization_type: array.polarization_type,
            vertical_spacing_bits: array.vertical_spacing.to_bits(),
            horizontal_spacing_bits: array.horizontal_spacing.to_bits(),
            pattern: array.pattern.clone(),
        }
    }

    pub fn frequency_hz(&self) -> f64 {
        f64::from_bits(self.frequency_bits)
    }
}

/// Cells evaluated with one evaluator instance.
#[derive(Debug, Clone)]
pub struct ComputeGroup<'a> {
    pub key: GroupKey,
    pub frequency_hz: f64,
    pub array: AntennaArray,
    pub cells: Vec<(CellIdx, &'a Cell)>,
}

/// Groups `cells` in a single pass, preserving first-seen key order.
pub fn plan_groups(cells: &[Cell]) -> Vec<ComputeGroup<'_>> {
    let mut groups: IndexMap<GroupKey, Vec<(CellIdx, &Cell)>> = IndexMap::new();
    for (i, cell) in cells.iter().enumerate() {
        groups
            .entry(GroupKey::of(cell))
            .or_default()
            .push((CellIdx(i), cell));
    }
    groups
        .into_iter()
        .map(|(key, members)| {
            // every group has at least one member by construction
            let (_, first) = members[0];
            ComputeGroup {
                frequency_hz: key.frequency_hz(),
                array: first.array.clone(),
                key,
                cells: members,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ransim_core::{ArrayOverrides, CellSpec, SectorId, SiteIdx, SiteSpec, Topology};

    fn cells_in(order: &[(f64, u32)]) -> Topology {
        let mut topo = Topology::new();
        topo.add_site(SiteSpec::at(0.0, 0.0)).unwrap();
        for (i, &(fc, rows)) in order.iter().enumerate() {
            topo.add_cell(
                CellSpec::new(SiteIdx(0), SectorId::ALL[0], &format!("B{}", i), fc).with_array(
                    ArrayOverrides {
                        rows: Some(rows),
                        ..Default::default()
                    },
                ),
            )
            .unwrap();
        }
        topo
    }

    #[test]
    fn groups_are_first_seen_not_sorted() {
        let topo = cells_in(&[(2.5e9, 4), (6e8, 8), (2.5e9, 4)]);
        let groups = plan_groups(topo.cells());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].frequency_hz, 2.5e9);
        let first: Vec<usize> = groups[0].cells.iter().map(|(i, _)| i.0).collect();
        assert_eq!(first, vec![0, 2]);
        let second: Vec<usize> = groups[1].cells.iter().map(|(i, _)| i.0).collect();
        assert_eq!(second, vec![1]);
    }

    #[test]
    fn array_difference_splits_group() {
        let topo = cells_in(&[(2.5e9, 4), (2.5e9, 8)]);
        let groups = plan_groups(topo.cells());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].array.rows, 8);
    }

    #[test]
    fn empty_cell_list_has_no_groups() {
        assert!(plan_groups(&[]).is_empty());
    }
}
