//! Transform algebra and vertex helpers.
//!
//! Matrices act on column vectors: `m.0[row][col]`, translation lives in column 3, and
//! `&a * &b` applies `b` first.

#![allow(missing_docs)]

use core::fmt;
use std::ops;

use serde::{Deserialize, Serialize};

use crate::cmd::TileWrapMode;

/// How a sampler treats coordinates outside of `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    Repeat,
    MirrorRepeat,
    Clamp,
}

impl Default for WrapMode {
    fn default() -> Self {
        Self::Repeat
    }
}

impl From<TileWrapMode> for WrapMode {
    fn from(m: TileWrapMode) -> Self {
        if m.clamp {
            WrapMode::Clamp
        } else if m.mirror {
            WrapMode::MirrorRepeat
        } else {
            WrapMode::Repeat
        }
    }
}

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrixf(pub [[f32; 4]; 4]);

impl Matrixf {
    pub fn identity() -> Self {
        Self([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translate(t: [f32; 3]) -> Self {
        let mut mtx = Self::identity();
        mtx.0[0][3] = t[0];
        mtx.0[1][3] = t[1];
        mtx.0[2][3] = t[2];
        mtx
    }

    pub fn scale(s: f32) -> Self {
        Self::scale_vec([s, s, s])
    }

    pub fn scale_vec(s: [f32; 3]) -> Self {
        let mut mtx = Self::identity();
        mtx.0[0][0] = s[0];
        mtx.0[1][1] = s[1];
        mtx.0[2][2] = s[2];
        mtx
    }

    /// Note: angle is in degrees
    pub fn rotate_x(angle: f32) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        let mut mtx = Self::identity();
        mtx.0[1][1] = c;
        mtx.0[1][2] = -s;
        mtx.0[2][1] = s;
        mtx.0[2][2] = c;
        mtx
    }

    /// Note: angle is in degrees
    pub fn rotate_y(angle: f32) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        let mut mtx = Self::identity();
        mtx.0[0][0] = c;
        mtx.0[0][2] = s;
        mtx.0[2][0] = -s;
        mtx.0[2][2] = c;
        mtx
    }

    /// Note: angle is in degrees
    pub fn rotate_z(angle: f32) -> Self {
        let (s, c) = angle.to_radians().sin_cos();
        let mut mtx = Self::identity();
        mtx.0[0][0] = c;
        mtx.0[0][1] = -s;
        mtx.0[1][0] = s;
        mtx.0[1][1] = c;
        mtx
    }

    /// The rotation used by scene graph nodes: z is applied first, then x, then y.
    ///
    /// Angles are in degrees.
    pub fn rotate_zxy(r: [f32; 3]) -> Self {
        &(&Self::rotate_y(r[1]) * &Self::rotate_x(r[0])) * &Self::rotate_z(r[2])
    }

    /// The rotation used by animation joints: x is applied first, then y, then z.
    ///
    /// Angles are in degrees.
    pub fn rotate_xyz(r: [f32; 3]) -> Self {
        &(&Self::rotate_z(r[2]) * &Self::rotate_y(r[1])) * &Self::rotate_x(r[0])
    }

    pub fn transpose(&self) -> Self {
        let mut r = Self::default();
        for i in 0..4 {
            for j in 0..4 {
                r.0[i][j] = self.0[j][i];
            }
        }
        r
    }

    pub fn translation(&self) -> [f32; 3] {
        [self.0[0][3], self.0[1][3], self.0[2][3]]
    }

    pub fn transform_point(&self, p: [f32; 3]) -> [f32; 3] {
        let v = self * [p[0], p[1], p[2], 1.0];
        [v[0], v[1], v[2]]
    }

    pub fn transform_direction(&self, d: [f32; 3]) -> [f32; 3] {
        let v = self * [d[0], d[1], d[2], 0.0];
        [v[0], v[1], v[2]]
    }
}

impl fmt::Debug for Matrixf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Matrixf [")?;
        for i in 0..4 {
            write!(f, "  [ ")?;
            for j in 0..4 {
                write!(f, "\t{:.3} ", self.0[i][j])?;
            }
            writeln!(f, "\t]")?;
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl ops::Mul<&Matrixf> for &Matrixf {
    type Output = Matrixf;

    fn mul(self, rhs: &Matrixf) -> Self::Output {
        let mut out = Matrixf::default();
        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    out.0[i][j] += self.0[i][k] * rhs.0[k][j];
                }
            }
        }
        out
    }
}

impl ops::Mul<[f32; 4]> for &Matrixf {
    type Output = [f32; 4];

    fn mul(self, rhs: [f32; 4]) -> Self::Output {
        let mut out = [0.0; 4];
        for i in 0..4 {
            for k in 0..4 {
                out[i] += self.0[i][k] * rhs[k];
            }
        }
        out
    }
}

pub fn normalize(v: [f32; 4]) -> [f32; 4] {
    let mag = dot(v, v).sqrt();
    if mag == 0.0 {
        v
    } else {
        scalar_mul(v, 1.0 / mag)
    }
}

pub fn dot(v: [f32; 4], w: [f32; 4]) -> f32 {
    v[0] * w[0] + v[1] * w[1] + v[2] * w[2] + v[3] * w[3]
}

pub fn scalar_mul(v: [f32; 4], s: f32) -> [f32; 4] {
    [v[0] * s, v[1] * s, v[2] * s, v[3] * s]
}

/// A `Vtx` entry: position, a flag word, S10.5 texture coordinates, and either a color or
/// a normal depending on the lighting mode it is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: [i16; 3],
    #[serde(default)]
    pub flag: u16,
    pub uv: [i16; 2],
    pub cn: [u8; 4],
}

impl Vertex {
    /// The color/normal field as a normal vector.
    pub fn normal(&self) -> [f32; 3] {
        let n = normalize([
            self.cn[0] as i8 as f32,
            self.cn[1] as i8 as f32,
            self.cn[2] as i8 as f32,
            0.0,
        ]);
        [n[0], n[1], n[2]]
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    #[track_caller]
    pub(crate) fn assert_matrix_eq(a: &Matrixf, b: &Matrixf) {
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    (a.0[i][j] - b.0[i][j]).abs() < 1e-4,
                    "matrices differ at [{}][{}]:\n{:?}\n{:?}",
                    i,
                    j,
                    a,
                    b
                );
            }
        }
    }

    #[track_caller]
    fn assert_vec_eq(a: [f32; 3], b: [f32; 3]) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() < 1e-4, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_translate_then_rotate() {
        let m = &Matrixf::translate([10.0, 0.0, 0.0]) * &Matrixf::rotate_y(90.0);
        assert_vec_eq(m.transform_point([1.0, 0.0, 0.0]), [10.0, 0.0, -1.0]);
        assert_vec_eq(m.translation(), [10.0, 0.0, 0.0]);
    }

    #[test]
    fn test_rotations() {
        assert_vec_eq(
            Matrixf::rotate_x(90.0).transform_point([0.0, 1.0, 0.0]),
            [0.0, 0.0, 1.0],
        );
        assert_vec_eq(
            Matrixf::rotate_z(90.0).transform_point([1.0, 0.0, 0.0]),
            [0.0, 1.0, 0.0],
        );
        assert_vec_eq(
            Matrixf::rotate_zxy([0.0, 90.0, 0.0]).transform_direction([0.0, 0.0, 1.0]),
            [1.0, 0.0, 0.0],
        );
    }

    #[test]
    fn test_rotation_order() {
        let r = [30.0, 45.0, 60.0];
        let zxy = &(&Matrixf::rotate_y(r[1]) * &Matrixf::rotate_x(r[0])) * &Matrixf::rotate_z(r[2]);
        assert_matrix_eq(&Matrixf::rotate_zxy(r), &zxy);
        let inverse = Matrixf::rotate_zxy(r).transpose();
        assert_matrix_eq(&(&inverse * &Matrixf::rotate_zxy(r)), &Matrixf::identity());
    }

    #[test]
    fn test_scale() {
        let m = &Matrixf::scale(2.0) * &Matrixf::scale(0.5);
        assert_matrix_eq(&m, &Matrixf::identity());
        assert_vec_eq(
            Matrixf::scale(3.0).transform_direction([1.0, 2.0, 0.0]),
            [3.0, 6.0, 0.0],
        );
    }

    #[test]
    fn test_wrap_mode() {
        assert_eq!(WrapMode::from(TileWrapMode::CLAMP), WrapMode::Clamp);
        assert_eq!(WrapMode::from(TileWrapMode::MIRROR), WrapMode::MirrorRepeat);
        assert_eq!(WrapMode::from(TileWrapMode::WRAP), WrapMode::Repeat);
    }
}
