use std::ops::{Mul, MulAssign};

use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// 4×4 matrix in the row-vector convention.
///
/// Storage is row-major and points are row vectors multiplied on the left,
/// so `point * world * view_proj` applies `world` first and `view_proj`
/// second. glam's `Mat4` uses the column-vector convention; converting
/// between the two is a transpose (see [`RowMat4::to_column_major`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowMat4 {
    pub rows: [[f32; 4]; 4],
}

impl Default for RowMat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RowMat4 {
    pub const IDENTITY: RowMat4 = RowMat4 {
        rows: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    pub fn from_scale(scale: Vec3) -> Self {
        Self::from_rows([
            [scale.x, 0.0, 0.0, 0.0],
            [0.0, scale.y, 0.0, 0.0],
            [0.0, 0.0, scale.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_uniform_scale(scale: f32) -> Self {
        Self::from_scale(Vec3::splat(scale))
    }

    /// Rotation about the x-axis by `theta` radians.
    pub fn from_rotation_x(theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, cos, sin, 0.0],
            [0.0, -sin, cos, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the y-axis by `theta` radians.
    pub fn from_rotation_y(theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::from_rows([
            [cos, 0.0, -sin, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [sin, 0.0, cos, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the z-axis by `theta` radians.
    pub fn from_rotation_z(theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self::from_rows([
            [cos, sin, 0.0, 0.0],
            [-sin, cos, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_quat(q: Quat) -> Self {
        Self::from_rows([
            [
                1.0 - 2.0 * q.y * q.y - 2.0 * q.z * q.z,
                2.0 * q.x * q.y + 2.0 * q.w * q.z,
                2.0 * q.x * q.z - 2.0 * q.w * q.y,
                0.0,
            ],
            [
                2.0 * q.x * q.y - 2.0 * q.w * q.z,
                1.0 - 2.0 * q.x * q.x - 2.0 * q.z * q.z,
                2.0 * q.y * q.z + 2.0 * q.w * q.x,
                0.0,
            ],
            [
                2.0 * q.x * q.z + 2.0 * q.w * q.y,
                2.0 * q.y * q.z - 2.0 * q.w * q.x,
                1.0 - 2.0 * q.x * q.x - 2.0 * q.y * q.y,
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [translation.x, translation.y, translation.z, 1.0],
        ])
    }

    /// Left-handed view matrix looking from `eye` towards `target`.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let z_axis = (target - eye).normalize();
        let x_axis = up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis).normalize();
        let trans = Vec3::new(-x_axis.dot(eye), -y_axis.dot(eye), -z_axis.dot(eye));
        Self::from_rows([
            [x_axis.x, y_axis.x, z_axis.x, 0.0],
            [x_axis.y, y_axis.y, z_axis.y, 0.0],
            [x_axis.z, y_axis.z, z_axis.z, 0.0],
            [trans.x, trans.y, trans.z, 1.0],
        ])
    }

    /// Perspective projection. Clip-space depth lands in `[0, w]`.
    pub fn perspective_fov(fov_y: f32, width: f32, height: f32, near: f32, far: f32) -> Self {
        let y_scale = 1.0 / (fov_y / 2.0).tan();
        let x_scale = y_scale * height / width;
        Self::from_rows([
            [x_scale, 0.0, 0.0, 0.0],
            [0.0, y_scale, 0.0, 0.0],
            [0.0, 0.0, far / (far - near), 1.0],
            [0.0, 0.0, -near * far / (far - near), 0.0],
        ])
    }

    pub fn orthographic(width: f32, height: f32, near: f32, far: f32) -> Self {
        Self::from_rows([
            [2.0 / width, 0.0, 0.0, 0.0],
            [0.0, 2.0 / height, 0.0, 0.0],
            [0.0, 0.0, 1.0 / (far - near), 0.0],
            [0.0, 0.0, near / (near - far), 1.0],
        ])
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[3][0], self.rows[3][1], self.rows[3][2])
    }

    pub fn transpose(&self) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.rows[c][r];
            }
        }
        Self { rows }
    }

    /// The column-vector matrix `G` with `G * v == v * self`.
    ///
    /// Row-major rows read as glam columns are exactly the transpose, so no
    /// data is shuffled.
    pub fn to_column_major(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.rows)
    }

    pub fn from_column_major(matrix: Mat4) -> Self {
        Self::from_rows(matrix.to_cols_array_2d())
    }

    /// Inverse matrix. Singular input yields non-finite entries.
    pub fn inverse(&self) -> Self {
        Self::from_column_major(self.to_column_major().inverse())
    }
}

/// Object-to-world matrix: scale, then rotate, then translate.
pub fn world_transform(scale: Vec3, rotation: Quat, translation: Vec3) -> RowMat4 {
    RowMat4::from_scale(scale) * RowMat4::from_quat(rotation) * RowMat4::from_translation(translation)
}

impl Mul for RowMat4 {
    type Output = RowMat4;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                let mut sum = 0.0;
                for i in 0..4 {
                    sum += self.rows[r][i] * rhs.rows[i][c];
                }
                *value = sum;
            }
        }
        RowMat4 { rows }
    }
}

impl MulAssign for RowMat4 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

/// Row vector times matrix: `out[j] = v.x*m[0][j] + v.y*m[1][j] + v.z*m[2][j] + v.w*m[3][j]`.
impl Mul<RowMat4> for Vec4 {
    type Output = Vec4;

    fn mul(self, rhs: RowMat4) -> Self::Output {
        let m = &rhs.rows;
        let column = |j: usize| self.x * m[0][j] + self.y * m[1][j] + self.z * m[2][j] + self.w * m[3][j];
        Vec4::new(column(0), column(1), column(2), column(3))
    }
}
