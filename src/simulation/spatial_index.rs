//! Uniform-grid spatial hash for vehicle neighbour queries

use std::collections::HashMap;

use log::debug;

use super::types::{VehicleId, WorldPos};

/// Coarse bucket coordinate: `floor(position / cell_size)` on both axes
pub type BucketKey = (i32, i32);

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    buckets: HashMap<BucketKey, Vec<VehicleId>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bucket_key(&self, position: WorldPos) -> BucketKey {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        // Keep bucket allocations around for the next rebuild
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Clear everything and insert each vehicle once, writing the bucket it
    /// landed in back through its slot
    pub fn rebuild<'a>(
        &mut self,
        vehicles: impl IntoIterator<Item = (VehicleId, WorldPos, &'a mut BucketKey)>,
    ) {
        self.clear();
        for (id, position, bucket) in vehicles {
            *bucket = self.insert(id, position);
        }
    }

    /// Insert and return the bucket the vehicle landed in
    pub fn insert(&mut self, id: VehicleId, position: WorldPos) -> BucketKey {
        let key = self.bucket_key(position);
        self.buckets.entry(key).or_default().push(id);
        self.len += 1;
        key
    }

    /// Fill `out` with every vehicle in the 3x3 bucket neighbourhood of
    /// `position`, excluding `id` itself. `out` is cleared first.
    pub fn neighbors(&self, id: VehicleId, position: WorldPos, out: &mut Vec<VehicleId>) {
        out.clear();
        let (bx, by) = self.bucket_key(position);
        for y in by - 1..=by + 1 {
            for x in bx - 1..=bx + 1 {
                if let Some(bucket) = self.buckets.get(&(x, y)) {
                    out.extend(bucket.iter().copied().filter(|other| *other != id));
                }
            }
        }
    }

    /// Move a vehicle between buckets after a mid-tick position update.
    /// If `from` does not hold it, every bucket is scanned instead.
    pub fn move_vehicle(&mut self, id: VehicleId, from: BucketKey, to: BucketKey) {
        if from == to {
            return;
        }
        self.remove(id, Some(from));
        self.buckets.entry(to).or_default().push(id);
        self.len += 1;
    }

    /// Remove a vehicle, looking in `hint` first and falling back to a
    /// full scan. Returns whether the vehicle was found.
    pub fn remove(&mut self, id: VehicleId, hint: Option<BucketKey>) -> bool {
        if let Some(key) = hint {
            if let Some(bucket) = self.buckets.get_mut(&key) {
                if let Some(pos) = bucket.iter().position(|other| *other == id) {
                    bucket.swap_remove(pos);
                    self.len -= 1;
                    return true;
                }
            }
            debug!("Vehicle {:?} missing from bucket {:?}, scanning", id, key);
        }

        for bucket in self.buckets.values_mut() {
            if let Some(pos) = bucket.iter().position(|other| *other == id) {
                bucket.swap_remove(pos);
                self.len -= 1;
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
