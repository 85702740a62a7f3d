//! Candidate cell storage.
//!
//! Cells live in an arena and are addressed by [`CellId`], which stays valid
//! for the whole reconstruction. Repair stages read the arena and return a
//! list of [`Edit`]s; the engine applies each list in one step, so no stage
//! ever observes a collection that changes under it.

use crate::geometry::Rect;

/// Exact-duplicate guard for inserts.
const DUPLICATE_EPS: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(usize);

impl CellId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// How a cell's geometry was obtained. Never affects geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Bounded by rulings (source or border-completed).
    Ruling,
    /// Bounded at least on one side by a virtual line.
    Synthesized,
    /// Average of several near-identical candidates.
    Consensus,
    /// Supplied by the caller.
    Seed,
}

impl Provenance {
    pub const fn as_str(self) -> &'static str {
        match self {
            Provenance::Ruling => "ruling",
            Provenance::Synthesized => "synthesized",
            Provenance::Consensus => "consensus",
            Provenance::Seed => "seed",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    pub rect: Rect,
    pub provenance: Provenance,
}

impl Cell {
    pub const fn new(rect: Rect, provenance: Provenance) -> Self {
        Self { rect, provenance }
    }

    pub const fn ruling(rect: Rect) -> Self {
        Self::new(rect, Provenance::Ruling)
    }

    pub const fn synthesized(rect: Rect) -> Self {
        Self::new(rect, Provenance::Synthesized)
    }
}

/// One change to the candidate set.
#[derive(Clone, Debug, PartialEq)]
pub enum Edit {
    Insert(Cell),
    Remove(CellId),
    /// New geometry for an existing cell; provenance is kept.
    Replace(CellId, Rect),
}

/// Counts reported by [`CellArena::apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub inserted: usize,
    pub removed: usize,
    pub replaced: usize,
    pub skipped: usize,
}

impl EditSummary {
    pub fn changed(&self) -> bool {
        self.inserted + self.removed + self.replaced > 0
    }
}

#[derive(Clone, Debug)]
struct Slot {
    cell: Cell,
    deleted: bool,
}

#[derive(Clone, Debug, Default)]
pub struct CellArena {
    slots: Vec<Slot>,
}

impl CellArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut arena = Self::new();
        for cell in cells {
            arena.insert(cell);
        }
        arena
    }

    pub fn insert(&mut self, cell: Cell) -> CellId {
        let id = CellId(self.slots.len());
        self.slots.push(Slot {
            cell,
            deleted: false,
        });
        id
    }

    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.slots
            .get(id.0)
            .filter(|slot| !slot.deleted)
            .map(|slot| &slot.cell)
    }

    pub fn rect(&self, id: CellId) -> Option<Rect> {
        self.get(id).map(|c| c.rect)
    }

    /// Live cells in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.deleted)
            .map(|(idx, slot)| (CellId(idx), &slot.cell))
    }

    pub fn ids(&self) -> Vec<CellId> {
        self.iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.deleted).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn has_live_duplicate(&self, rect: &Rect) -> bool {
        self.iter()
            .any(|(_, c)| c.rect.nearly_equals(rect, DUPLICATE_EPS))
    }

    /// Apply one stage's edits: replacements, then removals, then inserts.
    ///
    /// Removal wins over replacement of the same id. Inserts that exactly
    /// duplicate a live cell are skipped.
    pub fn apply(&mut self, edits: Vec<Edit>) -> EditSummary {
        let mut summary = EditSummary::default();
        let mut removes = Vec::new();
        let mut inserts = Vec::new();

        for edit in edits {
            match edit {
                Edit::Replace(id, rect) => {
                    if let Some(slot) = self.slots.get_mut(id.0)
                        && !slot.deleted
                        && slot.cell.rect != rect
                    {
                        slot.cell.rect = rect;
                        summary.replaced += 1;
                    }
                }
                Edit::Remove(id) => removes.push(id),
                Edit::Insert(cell) => inserts.push(cell),
            }
        }

        for id in removes {
            if let Some(slot) = self.slots.get_mut(id.0)
                && !slot.deleted
            {
                slot.deleted = true;
                summary.removed += 1;
            }
        }

        for cell in inserts {
            if self.has_live_duplicate(&cell.rect) {
                summary.skipped += 1;
                continue;
            }
            self.insert(cell);
            summary.inserted += 1;
        }

        summary
    }

    /// Live cells sorted top-to-bottom, left-to-right.
    pub fn snapshot(&self) -> Vec<Cell> {
        let mut cells: Vec<Cell> = self.iter().map(|(_, c)| *c).collect();
        cells.sort_by(|a, b| a.rect.reading_order(&b.rect));
        cells
    }
}
