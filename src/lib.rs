//! # Glint
//!
//! Core of an interactive path-traced primitive renderer: analytic
//! ray intersection, deterministic BVH construction, fixed-layout
//! scene serialization for the GPU, a progressive accumulation compute
//! pipeline, and CPU-side picking for editor interaction.
//!
//! ## Modules
//!
//! - [`util`] - Errors, AABB and small math helpers
//! - [`scene`] - Scene object model (primitives, materials, transforms)
//! - [`intersect`] - Analytic ray-primitive intersection (f64)
//! - [`bvh`] - Deterministic median-split BVH for triangle meshes
//! - [`pick`] - CPU picking against the object list
//! - [`render`] - wgpu compute pipeline, scene buffer, WGSL kernels
//! - [`settings`] - Persistent renderer settings
//!
//! ## Example
//!
//! ```ignore
//! use glint::prelude::*;
//!
//! let mut obj = SceneObject::new(1, "ball", PrimitiveKind::Sphere);
//! obj.transform.scale = DVec3::splat(2.0);
//!
//! let ray = Ray::new(DVec3::new(0.0, 0.0, 10.0), DVec3::new(0.0, 0.0, -1.0));
//! let result = pick(&[obj], &ray);
//! assert!(result.is_hit());
//! ```

pub mod bvh;
pub mod intersect;
pub mod pick;
pub mod render;
pub mod scene;
pub mod settings;
pub mod util;

// Re-export commonly used types
pub use pick::{pick, pick_with_tolerance, PickResult};
pub use scene::{Material, MaterialKind, PrimitiveKind, SceneObject, Transform};
pub use util::{Error, Result};

/// Build date baked in at compile time.
pub const BUILD_DATE: &str = env!("GLINT_BUILD_DATE");

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bvh::{build_blas, Blas, BvhNode};
    pub use crate::intersect::Ray;
    pub use crate::pick::{pick, pick_with_tolerance, PickResult};
    pub use crate::render::{CameraUniform, PathTracer, SceneData};
    pub use crate::scene::{Material, MaterialKind, PrimitiveKind, SceneObject, Transform};
    pub use crate::settings::RenderSettings;
    pub use crate::util::{Error, Result};
    pub use glam::{DVec3, Vec3};
}
