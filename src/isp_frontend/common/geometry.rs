//! Geometry primitives and per-instance slot indexing

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Axis-aligned pixel rectangle. `x`/`y` are relative to whatever frame the
/// owning record documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// One past the last column.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Horizontal intersection with the column range `[start, end)`, keeping
    /// the vertical extent.
    pub fn clip_columns(&self, start: u32, end: u32) -> Rect {
        let x0 = self.x.max(start);
        let x1 = self.right().min(end);
        if x1 <= x0 {
            return Rect::new(x0.min(end), self.y, 0, self.height);
        }
        Rect::new(x0, self.y, x1 - x0, self.height)
    }
}

/// Which hardware instance a record belongs to. `Common` is the unsplit
/// full-frame view used in single mode and for frame-level bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StripeId {
    Left,
    Right,
    Common,
}

impl StripeId {
    pub const ALL: [StripeId; 3] = [StripeId::Left, StripeId::Right, StripeId::Common];
    pub const INSTANCES: [StripeId; 2] = [StripeId::Left, StripeId::Right];

    const fn slot(self) -> usize {
        match self {
            StripeId::Left => 0,
            StripeId::Right => 1,
            StripeId::Common => 2,
        }
    }
}

/// Small owned array with one slot per [`StripeId`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StripeSlots<T>([T; 3]);

impl<T> StripeSlots<T> {
    pub fn new(left: T, right: T, common: T) -> Self {
        Self([left, right, common])
    }

    pub fn iter(&self) -> impl Iterator<Item = (StripeId, &T)> {
        StripeId::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U>(self, mut f: impl FnMut(StripeId, T) -> U) -> StripeSlots<U> {
        let [l, r, c] = self.0;
        StripeSlots([
            f(StripeId::Left, l),
            f(StripeId::Right, r),
            f(StripeId::Common, c),
        ])
    }
}

impl<T> StripeSlots<Option<T>> {
    pub fn empty() -> Self {
        Self([None, None, None])
    }

    /// Occupied slots in `Left, Right, Common` order.
    pub fn occupied(&self) -> impl Iterator<Item = (StripeId, &T)> {
        self.iter().filter_map(|(id, v)| v.as_ref().map(|v| (id, v)))
    }
}

impl<T> Index<StripeId> for StripeSlots<T> {
    type Output = T;

    fn index(&self, id: StripeId) -> &T {
        &self.0[id.slot()]
    }
}

impl<T> IndexMut<StripeId> for StripeSlots<T> {
    fn index_mut(&mut self, id: StripeId) -> &mut T {
        &mut self.0[id.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_columns_partial_overlap() {
        let r = Rect::new(100, 10, 200, 50);
        assert_eq!(r.clip_columns(150, 400), Rect::new(150, 10, 150, 50));
        assert_eq!(r.clip_columns(0, 120), Rect::new(100, 10, 20, 50));
    }

    #[test]
    fn test_clip_columns_disjoint_is_empty() {
        let r = Rect::new(100, 0, 50, 10);
        assert!(r.clip_columns(300, 400).is_empty());
    }

    #[test]
    fn test_slots_index_by_stripe() {
        let mut slots: StripeSlots<Option<u32>> = StripeSlots::empty();
        slots[StripeId::Right] = Some(7);
        assert_eq!(slots[StripeId::Right], Some(7));
        assert_eq!(slots[StripeId::Left], None);
        let ids: Vec<StripeId> = slots.occupied().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![StripeId::Right]);
    }
}
