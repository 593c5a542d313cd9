// Copyright 2025 the Semantics Bridge Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 transforms as sent by the engine.

use kurbo::{Point, Rect};

/// A 4×4 matrix in column-major order.
///
/// Element `(row, col)` lives at index `col * 4 + row`, matching the layout of the
/// sixteen floats on the wire.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix4(pub [f64; 16]);

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    /// The identity transform.
    pub const IDENTITY: Self = Self([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0, //
    ]);

    /// All-zero matrix; maps every point to the origin with `w = 0`.
    pub const ZERO: Self = Self([0.0; 16]);

    /// A pure translation.
    pub const fn translate(x: f64, y: f64) -> Self {
        let mut m = Self::IDENTITY.0;
        m[12] = x;
        m[13] = y;
        Self(m)
    }

    /// A scale about the origin.
    pub const fn scale(sx: f64, sy: f64) -> Self {
        let mut m = Self::IDENTITY.0;
        m[0] = sx;
        m[5] = sy;
        Self(m)
    }

    /// Element at `(row, col)`.
    #[inline]
    pub const fn get(&self, row: usize, col: usize) -> f64 {
        self.0[col * 4 + row]
    }

    /// Returns `self * rhs`.
    pub fn mul(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.get(row, k) * rhs.get(k, col);
                }
                out[col * 4 + row] = acc;
            }
        }
        Self(out)
    }

    /// Multiply a homogeneous column vector.
    pub fn transform_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = (0..4).map(|k| self.get(row, k) * v[k]).sum();
        }
        out
    }

    /// Transform a 2D point (`z = 0`, `w = 1`) and apply the perspective divide.
    ///
    /// Returns `None` when the resulting `w` is zero or the result is not finite.
    pub fn project_point(&self, p: Point) -> Option<Point> {
        let [x, y, _, w] = self.transform_vec4([p.x, p.y, 0.0, 1.0]);
        homogeneous_to_point([x, y, 0.0, w])
    }

    /// Axis-aligned bounds of `rect` after transformation.
    ///
    /// All four corners are projected; a rotation or perspective can move any
    /// corner to the extremes, so the top-left/bottom-right pair alone is not enough.
    /// Returns `None` if any corner degenerates.
    pub fn transform_rect_bbox(&self, rect: Rect) -> Option<Rect> {
        let corners = [
            Point::new(rect.x0, rect.y0),
            Point::new(rect.x1, rect.y0),
            Point::new(rect.x1, rect.y1),
            Point::new(rect.x0, rect.y1),
        ];
        let mut min = Point::new(f64::INFINITY, f64::INFINITY);
        let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
        for corner in corners {
            let p = self.project_point(corner)?;
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Rect::new(min.x, min.y, max.x, max.y))
    }

    /// General inverse, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Self> {
        let m = &self.0;
        let mut inv = [0.0; 16];

        inv[0] = m[5] * m[10] * m[15] - m[5] * m[11] * m[14] - m[9] * m[6] * m[15]
            + m[9] * m[7] * m[14]
            + m[13] * m[6] * m[11]
            - m[13] * m[7] * m[10];
        inv[4] = -m[4] * m[10] * m[15] + m[4] * m[11] * m[14] + m[8] * m[6] * m[15]
            - m[8] * m[7] * m[14]
            - m[12] * m[6] * m[11]
            + m[12] * m[7] * m[10];
        inv[8] = m[4] * m[9] * m[15] - m[4] * m[11] * m[13] - m[8] * m[5] * m[15]
            + m[8] * m[7] * m[13]
            + m[12] * m[5] * m[11]
            - m[12] * m[7] * m[9];
        inv[12] = -m[4] * m[9] * m[14] + m[4] * m[10] * m[13] + m[8] * m[5] * m[14]
            - m[8] * m[6] * m[13]
            - m[12] * m[5] * m[10]
            + m[12] * m[6] * m[9];
        inv[1] = -m[1] * m[10] * m[15] + m[1] * m[11] * m[14] + m[9] * m[2] * m[15]
            - m[9] * m[3] * m[14]
            - m[13] * m[2] * m[11]
            + m[13] * m[3] * m[10];
        inv[5] = m[0] * m[10] * m[15] - m[0] * m[11] * m[14] - m[8] * m[2] * m[15]
            + m[8] * m[3] * m[14]
            + m[12] * m[2] * m[11]
            - m[12] * m[3] * m[10];
        inv[9] = -m[0] * m[9] * m[15] + m[0] * m[11] * m[13] + m[8] * m[1] * m[15]
            - m[8] * m[3] * m[13]
            - m[12] * m[1] * m[11]
            + m[12] * m[3] * m[9];
        inv[13] = m[0] * m[9] * m[14] - m[0] * m[10] * m[13] - m[8] * m[1] * m[14]
            + m[8] * m[2] * m[13]
            + m[12] * m[1] * m[10]
            - m[12] * m[2] * m[9];
        inv[2] = m[1] * m[6] * m[15] - m[1] * m[7] * m[14] - m[5] * m[2] * m[15]
            + m[5] * m[3] * m[14]
            + m[13] * m[2] * m[7]
            - m[13] * m[3] * m[6];
        inv[6] = -m[0] * m[6] * m[15] + m[0] * m[7] * m[14] + m[4] * m[2] * m[15]
            - m[4] * m[3] * m[14]
            - m[12] * m[2] * m[7]
            + m[12] * m[3] * m[6];
        inv[10] = m[0] * m[5] * m[15] - m[0] * m[7] * m[13] - m[4] * m[1] * m[15]
            + m[4] * m[3] * m[13]
            + m[12] * m[1] * m[7]
            - m[12] * m[3] * m[5];
        inv[14] = -m[0] * m[5] * m[14] + m[0] * m[6] * m[13] + m[4] * m[1] * m[14]
            - m[4] * m[2] * m[13]
            - m[12] * m[1] * m[6]
            + m[12] * m[2] * m[5];
        inv[3] = -m[1] * m[6] * m[11] + m[1] * m[7] * m[10] + m[5] * m[2] * m[11]
            - m[5] * m[3] * m[10]
            - m[9] * m[2] * m[7]
            + m[9] * m[3] * m[6];
        inv[7] = m[0] * m[6] * m[11] - m[0] * m[7] * m[10] - m[4] * m[2] * m[11]
            + m[4] * m[3] * m[10]
            + m[8] * m[2] * m[7]
            - m[8] * m[3] * m[6];
        inv[11] = -m[0] * m[5] * m[11] + m[0] * m[7] * m[9] + m[4] * m[1] * m[11]
            - m[4] * m[3] * m[9]
            - m[8] * m[1] * m[7]
            + m[8] * m[3] * m[5];
        inv[15] = m[0] * m[5] * m[10] - m[0] * m[6] * m[9] - m[4] * m[1] * m[10]
            + m[4] * m[2] * m[9]
            + m[8] * m[1] * m[6]
            - m[8] * m[2] * m[5];

        let det = m[0] * inv[0] + m[1] * inv[4] + m[2] * inv[8] + m[3] * inv[12];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv_det = 1.0 / det;
        for v in &mut inv {
            *v *= inv_det;
        }
        Some(Self(inv))
    }

    /// Inverse, or [`Matrix4::ZERO`] when singular.
    ///
    /// The zero matrix sends every point to `w = 0`, which hit testing treats as a miss.
    pub fn inverse_or_zero(&self) -> Self {
        self.inverse().unwrap_or(Self::ZERO)
    }
}

/// Perspective-divide a homogeneous point.
pub(crate) fn homogeneous_to_point(v: [f64; 4]) -> Option<Point> {
    let w = v[3];
    if w == 0.0 {
        return None;
    }
    let p = Point::new(v[0] / w, v[1] / w);
    p.is_finite().then_some(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotate_90() -> Matrix4 {
        // (x, y) -> (-y, x)
        let mut m = Matrix4::IDENTITY.0;
        m[0] = 0.0;
        m[1] = 1.0;
        m[4] = -1.0;
        m[5] = 0.0;
        Matrix4(m)
    }

    #[test]
    fn multiply_composes_translations() {
        let a = Matrix4::translate(10.0, 5.0);
        let b = Matrix4::translate(1.0, 2.0);
        assert_eq!(a.mul(&b), Matrix4::translate(11.0, 7.0));
        assert_eq!(Matrix4::IDENTITY.mul(&a), a);
    }

    #[test]
    fn rotated_bbox_uses_all_corners() {
        let r = rotate_90().transform_rect_bbox(Rect::new(0.0, 0.0, 10.0, 20.0));
        assert_eq!(r, Some(Rect::new(-20.0, 0.0, 0.0, 10.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let m = Matrix4::translate(3.0, -4.0).mul(&Matrix4::scale(2.0, 0.5));
        let inv = m.inverse().unwrap();
        let p = m.project_point(Point::new(7.0, 9.0)).unwrap();
        assert_eq!(inv.project_point(p), Some(Point::new(7.0, 9.0)));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let flat = Matrix4::scale(0.0, 1.0);
        assert!(flat.inverse().is_none(), "zero scale must be singular");
        assert_eq!(flat.inverse_or_zero(), Matrix4::ZERO);
        assert!(Matrix4::ZERO.project_point(Point::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn perspective_divides_by_w() {
        let mut m = Matrix4::IDENTITY.0;
        m[15] = 2.0;
        let p = Matrix4(m).project_point(Point::new(10.0, 4.0));
        assert_eq!(p, Some(Point::new(5.0, 2.0)));
    }
}
