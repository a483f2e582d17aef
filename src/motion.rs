use serde::{Deserialize, Serialize};

use crate::grid::wrap_xy;

/// Commanded displacement in cells. Any integer pair is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Motion {
    pub dx: i64,
    pub dy: i64,
}

impl Motion {
    pub const fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    /// Displacement reduced onto a `w` x `h` torus, each axis in `[0, extent)`.
    #[inline]
    pub fn wrapped(self, w: usize, h: usize) -> (i64, i64) {
        (self.dx.rem_euclid(w as i64), self.dy.rem_euclid(h as i64))
    }
}

/// Unit compass moves. y grows downward, matching screen rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Up,
    Right,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Up,
        Direction::Right,
        Direction::Down,
    ];

    pub fn motion(self) -> Motion {
        match self {
            Direction::Left => Motion::new(-1, 0),
            Direction::Up => Motion::new(0, -1),
            Direction::Right => Motion::new(1, 0),
            Direction::Down => Motion::new(0, 1),
        }
    }
}

impl From<Direction> for Motion {
    fn from(d: Direction) -> Self {
        d.motion()
    }
}

/// True agent cell, kept inside `[0, w) x [0, h)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn moved(self, motion: Motion, w: usize, h: usize) -> Self {
        let (dx, dy) = motion.wrapped(w, h);
        let (x, y) = wrap_xy(self.x as i64 + dx, self.y as i64 + dy, w, h);
        Self { x, y }
    }
}
