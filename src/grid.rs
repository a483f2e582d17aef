use crate::error::{Error, Result};

/// Row-major flat grid with toroidal topology: both axes wrap.
/// x wraps by `w`, y wraps by `h`, so any signed coordinate is addressable.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub w: usize,
    pub h: usize,
}

impl<T: Copy + Default> Grid<T> {
    pub fn new(w: usize, h: usize) -> Self {
        Self::filled(w, h, T::default())
    }
}

impl<T: Copy> Grid<T> {
    pub fn filled(w: usize, h: usize, v: T) -> Self {
        debug_assert!(w > 0 && h > 0);
        Self {
            data: vec![v; w * h],
            w,
            h,
        }
    }

    pub fn from_vec(w: usize, h: usize, data: Vec<T>) -> Result<Self> {
        if w == 0 || h == 0 || data.len() != w * h {
            return Err(Error::ShapeMismatch {
                width: w,
                height: h,
                len: data.len(),
            });
        }
        Ok(Self { data, w, h })
    }

    #[inline]
    pub fn position_count(&self) -> usize {
        self.w * self.h
    }

    #[inline]
    pub fn idx(&self, x: i64, y: i64) -> usize {
        let (wx, wy) = wrap_xy(x, y, self.w, self.h);
        wy * self.w + wx
    }

    #[inline]
    pub fn get(&self, x: i64, y: i64) -> T {
        self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: i64, y: i64, v: T) -> &mut Self {
        let i = self.idx(x, y);
        self.data[i] = v;
        self
    }

    /// Element-wise transform into a fresh grid of the same shape.
    pub fn map<U, F>(&self, f: F) -> Grid<U>
    where
        F: Fn(T) -> U,
    {
        Grid {
            data: self.data.iter().map(|&v| f(v)).collect(),
            w: self.w,
            h: self.h,
        }
    }

    /// Iterate `(x, y, value)` in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        let w = self.w;
        self.data
            .iter()
            .enumerate()
            .map(move |(i, &v)| (i % w, i / w, v))
    }
}

impl Grid<f64> {
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Rescale so the cells sum to `total`.
    ///
    /// Zero or non-finite mass has no meaningful rescaling and is reported
    /// as [`Error::DegenerateMass`] instead of filling the grid with NaN.
    pub fn normalize(&self, total: f64) -> Result<Grid<f64>> {
        let mass = self.sum();
        if !(mass.is_finite() && mass > 0.0) {
            return Err(Error::DegenerateMass { mass });
        }
        let divisor = mass / total;
        Ok(self.map(|e| e / divisor))
    }
}

/// Wrap a signed coordinate pair onto a `w` x `h` torus.
#[inline]
pub fn wrap_xy(x: i64, y: i64, w: usize, h: usize) -> (usize, usize) {
    (
        x.rem_euclid(w as i64) as usize,
        y.rem_euclid(h as i64) as usize,
    )
}
