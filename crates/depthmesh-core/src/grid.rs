//! Row-major 2D grids aligned with image pixels.

use crate::error::{DepthmeshError, Result};

/// A dense 2D grid stored in row-major order.
///
/// The value for pixel (row `i`, column `j`) lives at index `i * width + j`,
/// which is the same layout as an `image::ImageBuffer`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    data: Vec<T>,
}

impl<T> Grid<T> {
    /// Wraps an existing buffer.
    ///
    /// Fails when `data.len() != width * height`.
    pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Result<Self> {
        let expected = (width as usize) * (height as usize);
        if data.len() != expected {
            return Err(DepthmeshError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Builds a grid by evaluating `f(row, col)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> T) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the cell at (`row`, `col`), or `None` when out of bounds.
    pub fn get(&self, row: u32, col: u32) -> Option<&T> {
        if row >= self.height || col >= self.width {
            return None;
        }
        self.data
            .get((row as usize) * (self.width as usize) + col as usize)
    }

    /// Row-major view of all cells.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Returns true when `other` covers the same pixel layout.
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Applies `f` to every cell, keeping the layout.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid filled with `value`.
    pub fn filled(width: u32, height: u32, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; (width as usize) * (height as usize)],
        }
    }
}

impl<T: Copy> Grid<T> {
    /// Copies out the cells selected by `mask`, in row-major order.
    ///
    /// Fails when the two grids do not share a pixel layout.
    pub fn select(&self, mask: &Grid<bool>) -> Result<Vec<T>> {
        if !self.same_shape(mask) {
            return Err(DepthmeshError::SizeMismatch {
                expected: self.len(),
                actual: mask.len(),
            });
        }
        Ok(self
            .data
            .iter()
            .zip(mask.iter())
            .filter_map(|(value, &keep)| keep.then_some(*value))
            .collect())
    }
}
