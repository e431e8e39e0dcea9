//! Scoreboard collaborator contract.
//!
//! The kernel never owns spatial storage; it reads and writes simulated
//! quantities through [`Scoreboard`], one value per `(location, box)`.
//! [`MemoryScoreboard`] is a plain in-memory implementation used by the
//! builder, the demo binary and the tests.

use std::collections::BTreeMap;

use crate::descriptor::{Location, QuantityId, StoreIndex};

/// Index of one spatial storage unit inside a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct BoxIndex(usize);

impl BoxIndex {
    #[inline]
    pub fn new(raw: usize) -> Self {
        BoxIndex(raw)
    }

    #[inline]
    pub fn raw(self) -> usize {
        self.0
    }
}

/// Iterator over the boxes of one store.
pub type Boxes = std::iter::Map<std::ops::Range<usize>, fn(usize) -> BoxIndex>;

/// Spatial storage for simulated quantities.
pub trait Scoreboard {
    /// Number of boxes in `store`.
    fn box_count(&self, store: StoreIndex) -> usize;

    fn read(&self, at: Location, cell: BoxIndex) -> f64;

    fn add(&mut self, at: Location, delta: f64, cell: BoxIndex);

    fn set(&mut self, at: Location, value: f64, cell: BoxIndex);

    /// Every box of `store`, in index order.
    fn boxes(&self, store: StoreIndex) -> Boxes {
        (0..self.box_count(store)).map(BoxIndex::new as fn(usize) -> BoxIndex)
    }

    /// Sum of a quantity over every box of its store.
    fn total(&self, at: Location) -> f64 {
        self.boxes(at.store).map(|b| self.read(at, b)).sum()
    }
}

#[derive(Debug, Clone)]
struct Store {
    boxes: usize,
    values: BTreeMap<QuantityId, Vec<f64>>,
}

/// In-memory scoreboard: a dense `Vec<f64>` per declared quantity.
///
/// Reads of undeclared quantities return `0.0`; writes declare them on
/// first touch. Out-of-range boxes are a programming error and panic.
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreboard {
    stores: Vec<Store>,
}

impl MemoryScoreboard {
    pub fn new() -> Self {
        MemoryScoreboard { stores: Vec::new() }
    }

    /// Add a store with `boxes` storage units and return its index.
    pub fn add_store(&mut self, boxes: usize) -> StoreIndex {
        self.stores.push(Store {
            boxes,
            values: BTreeMap::new(),
        });
        StoreIndex::new((self.stores.len() - 1) as u16)
    }

    /// Declare a quantity, filling every box with `initial`.
    pub fn declare(&mut self, at: Location, initial: f64) {
        let store = self.store_mut(at.store);
        let boxes = store.boxes;
        store.values.insert(at.quantity, vec![initial; boxes]);
    }

    /// Per-box snapshot of a quantity.
    pub fn values(&self, at: Location) -> Vec<f64> {
        self.boxes(at.store).map(|b| self.read(at, b)).collect()
    }

    fn store(&self, index: StoreIndex) -> &Store {
        self.stores
            .get(index.raw() as usize)
            .unwrap_or_else(|| panic!("unknown store S{}", index.raw()))
    }

    fn store_mut(&mut self, index: StoreIndex) -> &mut Store {
        self.stores
            .get_mut(index.raw() as usize)
            .unwrap_or_else(|| panic!("unknown store S{}", index.raw()))
    }

    fn cell_mut(&mut self, at: Location, cell: BoxIndex) -> &mut f64 {
        let store = self.store_mut(at.store);
        assert!(
            cell.raw() < store.boxes,
            "box {} out of range for {} ({} boxes)",
            cell.raw(),
            at,
            store.boxes
        );
        let boxes = store.boxes;
        let column = store
            .values
            .entry(at.quantity)
            .or_insert_with(|| vec![0.0; boxes]);
        &mut column[cell.raw()]
    }
}

impl Scoreboard for MemoryScoreboard {
    fn box_count(&self, store: StoreIndex) -> usize {
        self.store(store).boxes
    }

    fn read(&self, at: Location, cell: BoxIndex) -> f64 {
        let store = self.store(at.store);
        assert!(
            cell.raw() < store.boxes,
            "box {} out of range for {}",
            cell.raw(),
            at
        );
        store
            .values
            .get(&at.quantity)
            .map_or(0.0, |column| column[cell.raw()])
    }

    fn add(&mut self, at: Location, delta: f64, cell: BoxIndex) {
        *self.cell_mut(at, cell) += delta;
    }

    fn set(&mut self, at: Location, value: f64, cell: BoxIndex) {
        *self.cell_mut(at, cell) = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_read() {
        let mut sb = MemoryScoreboard::new();
        let soil = sb.add_store(3);
        let n = Location::new(QuantityId::new(1), soil);
        sb.declare(n, 2.0);
        assert_eq!(sb.box_count(soil), 3);
        assert_eq!(sb.values(n), vec![2.0, 2.0, 2.0]);
        assert_eq!(sb.total(n), 6.0);
    }

    #[test]
    fn test_add_and_set() {
        let mut sb = MemoryScoreboard::new();
        let soil = sb.add_store(2);
        let n = Location::new(QuantityId::new(1), soil);
        sb.add(n, 1.5, BoxIndex::new(1));
        sb.set(n, 4.0, BoxIndex::new(0));
        sb.add(n, -0.5, BoxIndex::new(1));
        assert_eq!(sb.values(n), vec![4.0, 1.0]);
    }

    #[test]
    fn test_undeclared_reads_zero() {
        let mut sb = MemoryScoreboard::new();
        let soil = sb.add_store(1);
        assert_eq!(sb.read(Location::new(QuantityId::new(9), soil), BoxIndex::new(0)), 0.0);
    }

    #[test]
    fn test_stores_are_independent() {
        let mut sb = MemoryScoreboard::new();
        let soil = sb.add_store(2);
        let plant = sb.add_store(1);
        let q = QuantityId::new(1);
        sb.declare(Location::new(q, soil), 1.0);
        sb.declare(Location::new(q, plant), 7.0);
        assert_eq!(sb.boxes(soil).count(), 2);
        assert_eq!(sb.total(Location::new(q, soil)), 2.0);
        assert_eq!(sb.total(Location::new(q, plant)), 7.0);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_box_out_of_range_panics() {
        let mut sb = MemoryScoreboard::new();
        let soil = sb.add_store(1);
        sb.add(Location::new(QuantityId::new(1), soil), 1.0, BoxIndex::new(4));
    }
}
