use bytemuck::Zeroable;
use bytemuck::allocation::zeroed_slice_box;

use std::ops::{Index, IndexMut};

// Two-dimensional array type
//
// Scratch arrays are allocated once at their maximum size and then only the
// top-left region matching the active block is touched, so most callers
// work in terms of (row, col) offsets plus an explicit region size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Array2D<T> {
  rows: usize,
  cols: usize,
  stride: usize,
  data: Box<[T]>,
}

impl<T> Array2D<T> {
  pub fn rows(&self) -> usize {
    self.rows
  }

  pub fn cols(&self) -> usize {
    self.cols
  }

  pub fn fill_with<F: FnMut(usize, usize) -> T>(&mut self, mut f: F) {
    for i in 0..self.rows {
      for j in 0..self.cols {
        self[i][j] = f(i, j);
      }
    }
  }

  fn check_region(&self, row_start: usize, col_start: usize, rows: usize, cols: usize) {
    let row_end = row_start.checked_add(rows).unwrap();
    let col_end = col_start.checked_add(cols).unwrap();

    if row_end > self.rows {
      panic!("Array2D row indices out of bounds (index {}..{} vs. size {})", row_start, row_end, self.rows);
    }
    if col_end > self.cols {
      panic!("Array2D column indices out of bounds (index {}..{} vs. size {})", col_start, col_end, self.cols);
    }
  }
}

impl<T: Clone> Array2D<T> {
  // Fill a region of a given size with (cloned) copies of `value`
  pub fn fill_region(&mut self, row_start: usize, col_start: usize, rows: usize, cols: usize, value: &T) {
    self.check_region(row_start, col_start, rows, cols);

    for row in row_start .. row_start + rows {
      self[row][col_start .. col_start + cols].fill(value.clone());
    }
  }
}

impl<T: Zeroable> Array2D<T> {
  pub fn zeroed(rows: usize, cols: usize) -> Self {
    let stride = cols;
    let num_elements = rows.checked_mul(stride).unwrap();
    let data = zeroed_slice_box(num_elements);

    Self {
      rows: rows,
      cols: cols,
      stride: stride,
      data: data
    }
  }

  pub fn new_with<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, f: F) -> Self {
    let mut result = Array2D::zeroed(rows, cols);
    result.fill_with(f);
    return result;
  }
}

impl<T: Zeroable + Copy> Array2D<T> {
  // Copy out a rows x cols region starting at (row_start, col_start)
  pub fn region(&self, row_start: usize, col_start: usize, rows: usize, cols: usize) -> Self {
    self.check_region(row_start, col_start, rows, cols);
    Array2D::new_with(rows, cols, |i, j| self[row_start + i][col_start + j])
  }

  // Copy the top-left rows x cols region of `src` into this array at (row_start, col_start)
  pub fn copy_region_from(&mut self, row_start: usize, col_start: usize, rows: usize, cols: usize, src: &Self) {
    self.check_region(row_start, col_start, rows, cols);
    src.check_region(0, 0, rows, cols);
    for i in 0..rows {
      self[row_start + i][col_start .. col_start + cols].copy_from_slice(&src[i][0 .. cols]);
    }
  }

  pub fn map<F: FnMut(usize, usize, T) -> T>(&mut self, mut f: F) {
    for i in 0..self.rows {
      for j in 0..self.cols {
        self[i][j] = f(i, j, self[i][j]);
      }
    }
  }
}

// Allow indexing by array[row][col]
// This is done by having array[row] return a normal slice which
// references the entire row in question. Then a normal slice index
// can pick out the desired element
impl<T> Index<usize> for Array2D<T> {
  type Output = [T];
  fn index(&self, index: usize) -> &[T] {
    if index >= self.rows {
      panic!("Array2D row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    // Due to the above check, these calculations should never overflow
    let start_index = index * self.stride;
    let end_index = start_index + self.cols;
    &self.data[start_index .. end_index]
  }
}

impl<T> IndexMut<usize> for Array2D<T> {
  fn index_mut(&mut self, index: usize) -> &mut [T] {
    if index >= self.rows {
      panic!("Array2D row index out of bounds (index {} vs. size {})", index, self.rows);
    }
    // Due to the above check, these calculations should never overflow
    let start_index = index * self.stride;
    let end_index = start_index + self.cols;
    &mut self.data[start_index .. end_index]
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn region_copies_round_trip() {
    let src = Array2D::<u16>::new_with(6, 5, |i, j| (i * 10 + j) as u16);
    let block = src.region(2, 1, 3, 2);
    assert_eq!(block.rows(), 3);
    assert_eq!(block.cols(), 2);
    assert_eq!(block[0][0], 21);
    assert_eq!(block[2][1], 42);

    let mut dst = Array2D::<u16>::zeroed(6, 5);
    dst.copy_region_from(2, 1, 3, 2, &block);
    assert_eq!(dst[4][2], 42);
    assert_eq!(dst[1][1], 0);
  }

  #[test]
  #[should_panic]
  fn region_out_of_bounds_panics() {
    let mut a = Array2D::<u16>::zeroed(4, 4);
    a.fill_region(2, 2, 3, 1, &7);
  }
}
