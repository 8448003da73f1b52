//! Level-of-detail grouping and navigation over administrative regions.

use std::collections::BTreeMap;

use crate::types::{Region, RegionGroup};

/// Group regions by `admin_level`, ascending.
///
/// The resulting group index is the rank of the level among the distinct
/// levels present in the data, not the raw OSM admin_level: index 0 is
/// always the coarsest available level, whatever its numeric value.
pub fn group_by_level(regions: Vec<Region>) -> Vec<RegionGroup> {
    let mut by_level: BTreeMap<i32, Vec<Region>> = BTreeMap::new();
    for region in regions {
        by_level.entry(region.admin_level).or_default().push(region);
    }
    by_level
        .into_iter()
        .map(|(admin_level, regions)| RegionGroup {
            admin_level,
            regions,
        })
        .collect()
}

/// Navigation state over grouped districts.
///
/// The current level always starts at 0 (coarsest). Out-of-range jumps are
/// no-ops and stepping saturates at the bounds instead of wrapping.
#[derive(Clone, Debug, Default)]
pub struct LevelOfDetail {
    groups: Vec<RegionGroup>,
    current: usize,
}

impl LevelOfDetail {
    pub fn new(groups: Vec<RegionGroup>) -> Self {
        Self { groups, current: 0 }
    }

    /// Group regions and start navigation at the coarsest level.
    pub fn from_regions(regions: Vec<Region>) -> Self {
        Self::new(group_by_level(regions))
    }

    pub fn groups(&self) -> &[RegionGroup] {
        &self.groups
    }

    pub fn level_count(&self) -> usize {
        self.groups.len()
    }

    pub fn current_level(&self) -> usize {
        self.current
    }

    /// Jump to a level index; ignored when out of `[0, level_count)`.
    pub fn set_level(&mut self, level: usize) {
        if level < self.groups.len() {
            self.current = level;
        }
    }

    pub fn next_level(&mut self) {
        self.current = (self.current + 1).min(self.groups.len().saturating_sub(1));
    }

    pub fn prev_level(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    /// Districts of the current level; a pure projection of the grouping
    /// plus the current index.
    pub fn current_districts(&self) -> &[Region] {
        self.groups
            .get(self.current)
            .map(|group| group.regions.as_slice())
            .unwrap_or(&[])
    }
}
