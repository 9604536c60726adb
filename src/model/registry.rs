use std::collections::BTreeMap;

use super::region::{Region, RegionId};

/// Exclusive owner of every region, keyed by id.
///
/// Iteration is in id order so ticks replay identically.
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: BTreeMap<RegionId, Region>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new region. On a duplicate id the registry is left untouched
    /// and the rejected region is handed back.
    pub fn insert(&mut self, region: Region) -> Result<(), Region> {
        if self.regions.contains_key(&region.id) {
            return Err(region);
        }
        self.regions.insert(region.id.clone(), region);
        Ok(())
    }

    /// Replace an existing region. Unknown ids are handed back.
    pub fn replace(&mut self, region: Region) -> Result<Region, Region> {
        match self.regions.get_mut(&region.id) {
            Some(slot) => Ok(std::mem::replace(slot, region)),
            None => Err(region),
        }
    }

    pub fn get(&self, id: &RegionId) -> Option<&Region> {
        self.regions.get(id)
    }

    pub fn get_mut(&mut self, id: &RegionId) -> Option<&mut Region> {
        self.regions.get_mut(id)
    }

    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    pub fn ids(&self) -> Vec<RegionId> {
        self.regions.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Region> {
        self.regions.values_mut()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }
}
