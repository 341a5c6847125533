//! Math type re-exports and renderer-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the
//! axis-aligned bounding box used by the BVH, plus the rotation
//! helpers shared by the raycaster and the serializer.

// Re-export glam types
pub use glam::{
    // Single precision (GPU-facing data)
    Vec2, Vec3, Vec3A, Vec4,
    // Double precision (CPU picking)
    DVec2, DVec3, DVec4,
    // Integer vectors
    IVec3, UVec3,
    // Matrices
    Mat3, Mat4, DMat3, DMat4,
    // Quaternions
    Quat, DQuat,
    EulerRot,
};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// Axis-aligned bounding box, single precision.
///
/// Layout matches the WGSL-side struct (two vec3 stored as arrays to
/// avoid 16-byte alignment padding inside BVH nodes).
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: [f32::INFINITY; 3],
        max: [f32::NEG_INFINITY; 3],
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1] || self.min[2] > self.max[2]
    }

    /// Grow to include a point.
    #[inline]
    pub fn grow_point(&mut self, p: [f32; 3]) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Grow to include another AABB (componentwise min/max union).
    #[inline]
    pub fn grow(&mut self, other: &Aabb) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    /// Centroid of the AABB.
    #[inline]
    pub fn centroid(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    /// Longest axis (0=x, 1=y, 2=z). Ties resolve X, then Y, then Z.
    #[inline]
    pub fn longest_axis(&self) -> usize {
        let dx = self.max[0] - self.min[0];
        let dy = self.max[1] - self.min[1];
        let dz = self.max[2] - self.min[2];
        if dx >= dy && dx >= dz {
            0
        } else if dy >= dz {
            1
        } else {
            2
        }
    }

    /// Check whether `other` is contained within this box, expanded by `eps`.
    pub fn contains(&self, other: &Aabb, eps: f32) -> bool {
        (0..3).all(|i| other.min[i] >= self.min[i] - eps && other.max[i] <= self.max[i] + eps)
    }

    /// Slab test against a double-precision ray.
    ///
    /// Returns the entry parameter when the ray overlaps `[t_min, t_max]`
    /// along all three axes. Zero-direction axes fall back to an origin
    /// containment check, so no NaN is produced.
    pub fn hit(&self, origin: DVec3, dir: DVec3, mut t_min: f64, mut t_max: f64) -> Option<f64> {
        let o = [origin.x, origin.y, origin.z];
        let d = [dir.x, dir.y, dir.z];
        for i in 0..3 {
            let lo = self.min[i] as f64;
            let hi = self.max[i] as f64;
            if d[i] != 0.0 {
                let inv = 1.0 / d[i];
                let mut t0 = (lo - o[i]) * inv;
                let mut t1 = (hi - o[i]) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return None;
                }
            } else if o[i] < lo || o[i] > hi {
                return None;
            }
        }
        Some(t_min)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Aabb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Aabb({:?} - {:?})", self.min, self.max)
    }
}

/// Rotation matrix from intrinsic XYZ Euler angles (radians), double precision.
#[inline]
pub fn rotation_from_euler(euler: DVec3) -> DMat3 {
    DMat3::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Invert a matrix, falling back to identity when the determinant is
/// too close to zero for a stable inverse.
pub fn inverse_or_identity(m: DMat4) -> DMat4 {
    if m.determinant().abs() < 1e-12 {
        DMat4::IDENTITY
    } else {
        m.inverse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_grow() {
        let mut b = Aabb::EMPTY;
        assert!(b.is_empty());

        b.grow_point([0.0; 3]);
        assert!(!b.is_empty());
        b.grow_point([1.0, 2.0, 3.0]);
        assert_eq!(b.min, [0.0; 3]);
        assert_eq!(b.max, [1.0, 2.0, 3.0]);
        assert_eq!(b.centroid(), [0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_aabb_longest_axis_tiebreak() {
        // Equal extents prefer X, then Y
        let b = Aabb::new([0.0; 3], [1.0, 1.0, 1.0]);
        assert_eq!(b.longest_axis(), 0);
        let b = Aabb::new([0.0; 3], [0.5, 1.0, 1.0]);
        assert_eq!(b.longest_axis(), 1);
        let b = Aabb::new([0.0; 3], [0.5, 0.5, 1.0]);
        assert_eq!(b.longest_axis(), 2);
    }

    #[test]
    fn test_aabb_slab_hit() {
        let b = Aabb::new([-1.0; 3], [1.0; 3]);
        let t = b.hit(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0), 0.0, f64::INFINITY);
        assert!((t.unwrap() - 4.0).abs() < 1e-9);

        // Parallel axis outside the slab
        let t = b.hit(DVec3::new(5.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0), 0.0, f64::INFINITY);
        assert!(t.is_none());
    }

    #[test]
    fn test_aabb_pod() {
        assert_eq!(std::mem::size_of::<Aabb>(), 24);
    }

    #[test]
    fn test_inverse_fallback() {
        let singular = DMat4::from_cols_array(&[0.0; 16]);
        assert_eq!(inverse_or_identity(singular), DMat4::IDENTITY);

        let m = DMat4::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let inv = inverse_or_identity(m);
        assert!((inv * m - DMat4::IDENTITY).to_cols_array().iter().all(|v| v.abs() < 1e-12));
    }
}
