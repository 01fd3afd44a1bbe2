//! Integer grid coordinates and a dense 2D array

use std::ops::{Add, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Grid coordinate or offset: `x` grows east (columns), `y` grows south (rows)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Row-major 2D array
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Array2D<T> {
    rows: usize,
    columns: usize,
    array: Vec<T>,
}

impl<T: Clone + Default> Array2D<T> {
    /// A `rows` x `columns` array filled with `T::default()`
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            array: vec![T::default(); rows * columns],
        }
    }
}

impl<T: Clone> Array2D<T> {
    /// Build from nested rows; shorter rows are padded with `fill`
    pub fn from_rows(rows: Vec<Vec<T>>, fill: T) -> Self {
        let columns = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let row_count = rows.len();
        let mut array = Vec::with_capacity(row_count * columns);
        for mut row in rows {
            row.resize(columns, fill.clone());
            array.extend(row);
        }
        Self {
            rows: row_count,
            columns,
            array,
        }
    }

    /// Rotate a quarter turn clockwise
    pub fn rotated_clockwise(&self) -> Self {
        let mut array = Vec::with_capacity(self.array.len());
        for row in 0..self.columns {
            for column in 0..self.rows {
                array.push(self.array[self.index(self.rows - 1 - column, row)].clone());
            }
        }
        Self {
            rows: self.columns,
            columns: self.rows,
            array,
        }
    }

    /// Flip left to right
    pub fn mirrored_horizontally(&self) -> Self {
        let mut array = Vec::with_capacity(self.array.len());
        for row in 0..self.rows {
            for column in (0..self.columns).rev() {
                array.push(self.array[self.index(row, column)].clone());
            }
        }
        Self { array, ..*self }
    }

    /// Flip top to bottom
    pub fn mirrored_vertically(&self) -> Self {
        let mut array = Vec::with_capacity(self.array.len());
        for row in (0..self.rows).rev() {
            for column in 0..self.columns {
                array.push(self.array[self.index(row, column)].clone());
            }
        }
        Self { array, ..*self }
    }

    /// Apply `f` to every element
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Array2D<U> {
        Array2D {
            rows: self.rows,
            columns: self.columns,
            array: self.array.iter().map(f).collect(),
        }
    }
}

impl<T> Array2D<T> {
    fn index(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&T> {
        if row < self.rows && column < self.columns {
            self.array.get(self.index(row, column))
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, row: usize, column: usize) -> Option<&mut T> {
        if row < self.rows && column < self.columns {
            let i = self.index(row, column);
            self.array.get_mut(i)
        } else {
            None
        }
    }

    /// Element at a grid coordinate (`x` = column, `y` = row)
    pub fn at(&self, position: Vec2) -> Option<&T> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        self.get(position.y as usize, position.x as usize)
    }

    /// Elements with their coordinates, row by row
    pub fn iter(&self) -> impl Iterator<Item = (Vec2, &T)> {
        let columns = self.columns.max(1);
        self.array
            .iter()
            .enumerate()
            .map(move |(i, v)| (Vec2::new((i % columns) as i32, (i / columns) as i32), v))
    }
}
