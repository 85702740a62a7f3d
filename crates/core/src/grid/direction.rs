//! Search directions as an `(Axis, Sign)` pair.
//!
//! A gap-fill moving left is the same search as one moving up, with x and y
//! swapped; [`Direction`] and [`Side`] carry the few coordinate flips that
//! differ so the searches are written once.

use crate::geometry::{Axis, Rect, Ruling};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sign {
    /// Toward smaller coordinates (left, up).
    Neg,
    /// Toward larger coordinates (right, down).
    Pos,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Direction {
    pub axis: Axis,
    pub sign: Sign,
}

impl Direction {
    pub const LEFT: Direction = Direction::new(Axis::X, Sign::Neg);
    pub const RIGHT: Direction = Direction::new(Axis::X, Sign::Pos);
    pub const UP: Direction = Direction::new(Axis::Y, Sign::Neg);
    pub const DOWN: Direction = Direction::new(Axis::Y, Sign::Pos);

    pub const fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    pub const fn cross(self) -> Axis {
        self.axis.cross()
    }

    /// Edge of `rect` facing the direction of travel.
    pub fn near(self, rect: &Rect) -> f64 {
        match self.sign {
            Sign::Neg => rect.lo(self.axis),
            Sign::Pos => rect.hi(self.axis),
        }
    }

    /// How far `b` lies past `a` when moving in this direction.
    pub fn beyond(self, a: f64, b: f64) -> f64 {
        match self.sign {
            Sign::Neg => a - b,
            Sign::Pos => b - a,
        }
    }

    /// End of `line`'s span that points in this direction.
    pub fn outer_end(self, line: &Ruling) -> f64 {
        match self.sign {
            Sign::Neg => line.start,
            Sign::Pos => line.end,
        }
    }

    pub fn inner_end(self, line: &Ruling) -> f64 {
        match self.sign {
            Sign::Neg => line.end,
            Sign::Pos => line.start,
        }
    }

    /// `lines` (sorted ascending by position) in travel order.
    pub fn in_travel_order(self, lines: &[Ruling]) -> Vec<&Ruling> {
        match self.sign {
            Sign::Pos => lines.iter().collect(),
            Sign::Neg => lines.iter().rev().collect(),
        }
    }

    /// `rect` stretched along the axis so its near edge sits at `to`.
    pub fn stretch(self, rect: &Rect, to: f64) -> Rect {
        match self.sign {
            Sign::Neg => rect.with_span(self.axis, to, rect.hi(self.axis)),
            Sign::Pos => rect.with_span(self.axis, rect.lo(self.axis), to),
        }
    }
}

/// One side of the cross axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Lo,
    Hi,
}

impl Side {
    pub fn of(self, rect: &Rect, axis: Axis) -> f64 {
        match self {
            Side::Lo => rect.lo(axis),
            Side::Hi => rect.hi(axis),
        }
    }

    pub const fn opposite(self) -> Side {
        match self {
            Side::Lo => Side::Hi,
            Side::Hi => Side::Lo,
        }
    }

    /// Distance from `anchor` to `v` moving away from this side.
    pub fn inward(self, anchor: f64, v: f64) -> f64 {
        match self {
            Side::Lo => v - anchor,
            Side::Hi => anchor - v,
        }
    }

    /// `line` reaches `anchor` from outside this side, with `eps` of slack.
    pub fn covers(self, line: &Ruling, anchor: f64, eps: f64) -> bool {
        match self {
            Side::Lo => line.start - anchor < eps,
            Side::Hi => anchor - line.end < eps,
        }
    }

    /// End of `line`'s span reaching away from this side.
    pub fn inner_end(self, line: &Ruling) -> f64 {
        match self {
            Side::Lo => line.end,
            Side::Hi => line.start,
        }
    }

    /// `lines` (sorted ascending) starting from this side.
    pub fn in_inward_order(self, lines: &[Ruling]) -> Vec<&Ruling> {
        match self {
            Side::Lo => lines.iter().collect(),
            Side::Hi => lines.iter().rev().collect(),
        }
    }
}
