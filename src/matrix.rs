//! Dense row-major matrix utility consumed by the control-loop transforms.
//!
//! Every operation is a pure function over owned buffers: no shared state,
//! nothing here ever touches a monitor. Shape errors are reported by value
//! (`None`), never by panicking, so a degenerate result inside a task body
//! can be degraded locally instead of tearing the task down.

use std::ops::{Index, IndexMut};

/// A `rows × cols` matrix of `f64`, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Mat {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Mat {
    /// Allocates a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Builds a matrix from a nested row slice. Panics if rows are ragged;
    /// intended for literals in construction code and tests.
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let r = rows.len();
        let c = rows.first().map_or(0, |row| row.len());
        let mut m = Self::zeros(r, c);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), c, "ragged matrix literal");
            for (j, &v) in row.iter().enumerate() {
                m[(i, j)] = v;
            }
        }
        m
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element-wise sum; `None` when shapes differ.
    pub fn add(&self, other: &Mat) -> Option<Mat> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Element-wise difference; `None` when shapes differ.
    pub fn sub(&self, other: &Mat) -> Option<Mat> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &Mat, f: impl Fn(f64, f64) -> f64) -> Option<Mat> {
        if self.rows != other.rows || self.cols != other.cols {
            return None;
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Some(Mat {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// Multiplies every element by `k`.
    pub fn scale(&self, k: f64) -> Mat {
        Mat {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| v * k).collect(),
        }
    }

    /// Matrix product; `None` when the inner dimensions disagree.
    pub fn mul(&self, other: &Mat) -> Option<Mat> {
        if self.cols != other.rows {
            return None;
        }
        let mut out = Mat::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    acc += self[(i, k)] * other[(k, j)];
                }
                out[(i, j)] = acc;
            }
        }
        Some(out)
    }

    pub fn transpose(&self) -> Mat {
        let mut out = Mat::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out[(j, i)] = self[(i, j)];
            }
        }
        out
    }

    /// Determinant by Laplace expansion along the first row.
    /// `None` for non-square inputs.
    pub fn det(&self) -> Option<f64> {
        if self.rows != self.cols {
            return None;
        }
        Some(self.det_square())
    }

    fn det_square(&self) -> f64 {
        match self.rows {
            0 => 1.0,
            1 => self[(0, 0)],
            2 => self[(0, 0)] * self[(1, 1)] - self[(0, 1)] * self[(1, 0)],
            n => {
                let mut det = 0.0;
                for j in 0..n {
                    let sign = if j % 2 == 0 { 1.0 } else { -1.0 };
                    det += sign * self[(0, j)] * self.minor(0, j).det_square();
                }
                det
            }
        }
    }

    /// Inverse via the adjugate. `None` for non-square inputs and whenever
    /// the determinant is exactly zero.
    pub fn inverse(&self) -> Option<Mat> {
        let det = self.det()?;
        if det == 0.0 {
            return None;
        }
        let n = self.rows;
        let mut cofactors = Mat::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
                cofactors[(i, j)] = sign * self.minor(i, j).det_square();
            }
        }
        Some(cofactors.transpose().scale(1.0 / det))
    }

    /// Copy of `self` with row `skip_r` and column `skip_c` removed.
    fn minor(&self, skip_r: usize, skip_c: usize) -> Mat {
        let mut out = Mat::zeros(self.rows - 1, self.cols - 1);
        let mut r = 0;
        for i in 0..self.rows {
            if i == skip_r {
                continue;
            }
            let mut c = 0;
            for j in 0..self.cols {
                if j == skip_c {
                    continue;
                }
                out[(r, c)] = self[(i, j)];
                c += 1;
            }
            r += 1;
        }
        out
    }
}

impl Index<(usize, usize)> for Mat {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        &self.data[r * self.cols + c]
    }
}

impl IndexMut<(usize, usize)> for Mat {
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut f64 {
        &mut self.data[r * self.cols + c]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "expected {b}, got {a}");
    }

    #[test]
    fn add_sub_require_matching_shapes() {
        let a = Mat::zeros(2, 3);
        let b = Mat::zeros(3, 2);
        assert!(a.add(&b).is_none());
        assert!(a.sub(&b).is_none());
        assert!(a.add(&Mat::zeros(2, 3)).is_some());
    }

    #[test]
    fn mul_dimension_mismatch_is_invalid_not_a_crash() {
        let a = Mat::zeros(2, 3);
        let b = Mat::zeros(2, 3);
        assert!(a.mul(&b).is_none());
    }

    #[test]
    fn mul_known_product() {
        let a = Mat::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let b = Mat::from_rows(&[&[5.0, 6.0], &[7.0, 8.0]]);
        let c = a.mul(&b).unwrap();
        assert_eq!(c, Mat::from_rows(&[&[19.0, 22.0], &[43.0, 50.0]]));
    }

    #[test]
    fn transpose_swaps_shape() {
        let a = Mat::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let t = a.transpose();
        assert_eq!(t.rows(), 3);
        assert_eq!(t.cols(), 2);
        assert_eq!(t[(2, 1)], 6.0);
    }

    #[test]
    fn determinant_small_cases() {
        let a = Mat::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert_close(a.det().unwrap(), -2.0, 1e-12);

        let b = Mat::from_rows(&[
            &[1.0, 2.0, 3.0],
            &[4.0, 5.0, 6.0],
            &[7.0, 8.0, 10.0],
        ]);
        assert_close(b.det().unwrap(), -3.0, 1e-12);

        assert!(Mat::zeros(2, 3).det().is_none());
    }

    #[test]
    fn inverse_of_singular_is_invalid() {
        let singular = Mat::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert_eq!(singular.det().unwrap(), 0.0);
        assert!(singular.inverse().is_none());
    }

    #[test]
    fn inverse_roundtrip_recovers_original() {
        let m = Mat::from_rows(&[
            &[4.0, 7.0, 2.0],
            &[3.0, 6.0, 1.0],
            &[2.0, 5.0, 3.0],
        ]);
        let twice = m.inverse().unwrap().inverse().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_close(twice[(i, j)], m[(i, j)], 1e-9);
            }
        }
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let m = Mat::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let id = m.mul(&m.inverse().unwrap()).unwrap();
        assert_close(id[(0, 0)], 1.0, 1e-12);
        assert_close(id[(0, 1)], 0.0, 1e-12);
        assert_close(id[(1, 0)], 0.0, 1e-12);
        assert_close(id[(1, 1)], 1.0, 1e-12);
    }
}
