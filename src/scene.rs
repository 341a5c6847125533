//! Editor-side scene object model.
//!
//! The renderer core reads an ordered object list owned by the editor
//! store and never mutates it. Each object carries a transform and a
//! material; the `scale` vector is overloaded per primitive type to
//! encode the analytic parameters (see [`Transform::scale`]).

use glam::{DVec3, Vec3};

/// Closed set of analytic primitives the renderer understands.
///
/// Adding a variant forces every dispatch site (serializer, raycaster,
/// intersection dispatch) to be updated via exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Sphere,
    Cuboid,
    Cylinder,
    Cone,
    Capsule,
    Torus,
}

impl PrimitiveKind {
    /// Integer type code written into the GPU scene record.
    /// Part of the wire contract with the compute kernel.
    pub fn gpu_code(self) -> u32 {
        match self {
            PrimitiveKind::Sphere => 0,
            PrimitiveKind::Cuboid => 1,
            PrimitiveKind::Cylinder => 2,
            PrimitiveKind::Cone => 3,
            PrimitiveKind::Capsule => 4,
            PrimitiveKind::Torus => 5,
        }
    }
}

/// Material categories with fixed GPU codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    Plastic,
    Metal,
    Glass,
    Light,
}

impl MaterialKind {
    /// Integer material code written into the GPU scene record.
    pub fn gpu_code(self) -> u32 {
        match self {
            MaterialKind::Plastic => 0,
            MaterialKind::Metal => 1,
            MaterialKind::Glass => 2,
            MaterialKind::Light => 3,
        }
    }
}

/// Surface material of a scene object.
#[derive(Debug, Clone, Copy)]
pub struct Material {
    pub color: Vec3,
    pub kind: MaterialKind,
    /// Index of refraction (glass-like materials).
    pub ior: f32,
    /// Emission strength (light materials).
    pub intensity: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::splat(0.8),
            kind: MaterialKind::Plastic,
            ior: 1.5,
            intensity: 1.0,
        }
    }
}

/// Object transform: translation, intrinsic XYZ Euler rotation
/// (radians), and the per-primitive parameter encoding in `scale`.
///
/// `scale` encoding by primitive type:
/// - sphere: `x` = radius
/// - cuboid: half-extents
/// - cylinder/cone: `(radius_or_base_radius, half_height, radius_or_base_radius)`
/// - capsule: `(radius, half_height_total, radius)`
/// - torus: `(major_radius, minor_radius, minor_radius)`
#[derive(Debug, Clone, Copy)]
pub struct Transform {
    pub position: DVec3,
    pub rotation: DVec3,
    pub scale: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            rotation: DVec3::ZERO,
            scale: DVec3::ONE,
        }
    }
}

/// A renderable object from the editor's object list.
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: u64,
    pub name: String,
    pub kind: PrimitiveKind,
    pub transform: Transform,
    pub material: Material,
    pub visible: bool,
}

impl SceneObject {
    pub fn new(id: u64, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            transform: Transform::default(),
            material: Material::default(),
            visible: true,
        }
    }

    /// Whether the encoded primitive parameters are usable.
    ///
    /// Non-finite or non-positive parameters make the primitive a
    /// guaranteed non-hit; they never error.
    pub fn params_valid(&self) -> bool {
        let s = self.transform.scale;
        let relevant: &[f64] = match self.kind {
            PrimitiveKind::Sphere => &[s.x],
            PrimitiveKind::Cuboid => &[s.x, s.y, s.z],
            PrimitiveKind::Cylinder | PrimitiveKind::Cone | PrimitiveKind::Capsule => &[s.x, s.y],
            PrimitiveKind::Torus => &[s.x, s.y],
        };
        relevant.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_codes_are_stable() {
        // Wire contract with the compute kernel; these must never change.
        assert_eq!(PrimitiveKind::Sphere.gpu_code(), 0);
        assert_eq!(PrimitiveKind::Cuboid.gpu_code(), 1);
        assert_eq!(PrimitiveKind::Cylinder.gpu_code(), 2);
        assert_eq!(PrimitiveKind::Cone.gpu_code(), 3);
        assert_eq!(PrimitiveKind::Capsule.gpu_code(), 4);
        assert_eq!(PrimitiveKind::Torus.gpu_code(), 5);

        assert_eq!(MaterialKind::Plastic.gpu_code(), 0);
        assert_eq!(MaterialKind::Metal.gpu_code(), 1);
        assert_eq!(MaterialKind::Glass.gpu_code(), 2);
        assert_eq!(MaterialKind::Light.gpu_code(), 3);
    }

    #[test]
    fn test_params_valid() {
        let mut obj = SceneObject::new(1, "ball", PrimitiveKind::Sphere);
        assert!(obj.params_valid());

        obj.transform.scale = DVec3::new(0.0, 1.0, 1.0);
        assert!(!obj.params_valid());

        obj.transform.scale = DVec3::new(f64::NAN, 1.0, 1.0);
        assert!(!obj.params_valid());

        // Cuboid needs all three half-extents positive
        let mut cube = SceneObject::new(2, "box", PrimitiveKind::Cuboid);
        cube.transform.scale = DVec3::new(1.0, -1.0, 1.0);
        assert!(!cube.params_valid());
    }
}
