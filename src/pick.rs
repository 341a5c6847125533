//! CPU-side picking: world-space ray to nearest visible object.
//!
//! Runs in double precision against the current object-list snapshot;
//! safe to call from an input-event context since it only reads the
//! objects. The same routine, parameterized with a tolerance that
//! inflates primitive sizes, serves gizmo handle hit-testing.

use crate::intersect::{self, Ray};
use crate::scene::{PrimitiveKind, SceneObject};
use crate::util::rotation_from_euler;
use glam::DVec3;

/// Outcome of a pick query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickResult {
    pub object_id: Option<u64>,
    pub point: Option<DVec3>,
    pub distance: f64,
}

impl PickResult {
    /// The "nothing under the cursor" result.
    pub fn miss() -> Self {
        Self {
            object_id: None,
            point: None,
            distance: f64::INFINITY,
        }
    }

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.object_id.is_some()
    }
}

/// Pick the nearest visible object along `ray`.
///
/// Callers should pass a normalized direction so distances are
/// comparable across objects.
pub fn pick(objects: &[SceneObject], ray: &Ray) -> PickResult {
    pick_with_tolerance(objects, ray, 0.0)
}

/// Pick with inflated primitive sizes, for forgiving gizmo-handle hit
/// areas. `tolerance` is added to each encoded size parameter;
/// object picking uses zero.
///
/// The ray is transformed into each object's local space using
/// translation and the transpose of the rotation matrix only —
/// primitive parameters already encode size, so the ray is never
/// scaled. Ties at equal `t` keep the first object in iteration order.
pub fn pick_with_tolerance(objects: &[SceneObject], ray: &Ray, tolerance: f64) -> PickResult {
    let mut best_t = f64::INFINITY;
    let mut best_id = None;

    for obj in objects {
        if !obj.visible || !obj.params_valid() {
            continue;
        }

        let inv_rot = rotation_from_euler(obj.transform.rotation).transpose();
        let local = Ray::new(
            inv_rot * (ray.origin - obj.transform.position),
            inv_rot * ray.dir,
        );

        let s = obj.transform.scale;
        let t = match obj.kind {
            PrimitiveKind::Sphere => intersect::sphere(&local, DVec3::ZERO, s.x + tolerance),
            PrimitiveKind::Cuboid => {
                intersect::cuboid(&local, DVec3::ZERO, s + DVec3::splat(tolerance))
            }
            PrimitiveKind::Cylinder => {
                intersect::cylinder(&local, s.x + tolerance, s.y + tolerance)
            }
            PrimitiveKind::Cone => intersect::cone(&local, s.x + tolerance, s.y + tolerance),
            PrimitiveKind::Capsule => intersect::capsule(&local, s.x + tolerance, s.y + tolerance),
            // Analytic torus picking is not implemented on the CPU path
            PrimitiveKind::Torus => intersect::torus(&local, s.x, s.y),
        };

        if let Some(t) = t {
            if t < best_t {
                best_t = t;
                best_id = Some(obj.id);
            }
        }
    }

    match best_id {
        Some(id) => PickResult {
            object_id: Some(id),
            point: Some(ray.at(best_t)),
            distance: best_t,
        },
        None => PickResult::miss(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    fn probe() -> Ray {
        Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0))
    }

    fn sphere_at(id: u64, z: f64, radius: f64) -> SceneObject {
        let mut obj = SceneObject::new(id, format!("sphere-{id}"), PrimitiveKind::Sphere);
        obj.transform.position = DVec3::new(0.0, 0.0, z);
        obj.transform.scale = DVec3::new(radius, radius, radius);
        obj
    }

    #[test]
    fn test_empty_scene_misses() {
        let result = pick(&[], &probe());
        assert_eq!(result, PickResult::miss());
        assert!(result.distance.is_infinite());
    }

    #[test]
    fn test_closest_object_wins() {
        // Far sphere listed first; the near one must still win
        let objects = vec![sphere_at(1, -3.0, 1.0), sphere_at(2, 0.0, 1.0)];
        let result = pick(&objects, &probe());
        assert_eq!(result.object_id, Some(2));
        assert!((result.distance - 4.0).abs() < 1e-9);
        let p = result.point.unwrap();
        assert!((p - DVec3::new(0.0, 0.0, 1.0)).length() < 1e-9);
    }

    #[test]
    fn test_invisible_objects_skipped() {
        let mut near = sphere_at(1, 0.0, 1.0);
        near.visible = false;
        let objects = vec![near, sphere_at(2, -3.0, 1.0)];
        let result = pick(&objects, &probe());
        assert_eq!(result.object_id, Some(2));
    }

    #[test]
    fn test_tie_keeps_first_in_order() {
        // Identical spheres at the same depth
        let objects = vec![sphere_at(7, 0.0, 1.0), sphere_at(8, 0.0, 1.0)];
        let result = pick(&objects, &probe());
        assert_eq!(result.object_id, Some(7));
    }

    #[test]
    fn test_invalid_params_are_non_hits() {
        let mut bad = sphere_at(1, 0.0, 1.0);
        bad.transform.scale = DVec3::new(-1.0, 1.0, 1.0);
        let result = pick(&[bad], &probe());
        assert!(!result.is_hit());
    }

    #[test]
    fn test_rotation_only_transform() {
        // Tall cuboid rotated 90 degrees about Z: the ray passes where
        // its long axis now lies, so the hit only happens if rotation
        // is applied (and the un-rotated shape would miss).
        let mut obj = SceneObject::new(1, "bar", PrimitiveKind::Cuboid);
        obj.transform.scale = DVec3::new(0.1, 3.0, 0.1);
        obj.transform.rotation = DVec3::new(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let ray = Ray::new(DVec3::new(2.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(pick(&[obj.clone()], &ray).is_hit());

        obj.transform.rotation = DVec3::ZERO;
        assert!(!pick(&[obj], &ray).is_hit());
    }

    #[test]
    fn test_tolerance_inflates_hit_area() {
        let objects = vec![sphere_at(1, 0.0, 1.0)];
        // Passes 1.05 units from the center: misses the radius-1 sphere
        let ray = Ray::new(DVec3::new(1.05, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(!pick(&objects, &ray).is_hit());
        assert!(pick_with_tolerance(&objects, &ray, 0.1).is_hit());
    }

    #[test]
    fn test_torus_never_selectable() {
        let mut obj = SceneObject::new(1, "donut", PrimitiveKind::Torus);
        obj.transform.scale = DVec3::new(1.0, 0.25, 0.25);
        assert!(!pick(&[obj], &probe()).is_hit());
    }

    #[test]
    fn test_cylinder_cone_capsule_dispatch() {
        let mut cyl = SceneObject::new(1, "cyl", PrimitiveKind::Cylinder);
        cyl.transform.scale = DVec3::new(1.0, 0.5, 1.0);
        let mut cone = SceneObject::new(2, "cone", PrimitiveKind::Cone);
        cone.transform.scale = DVec3::new(1.0, 0.5, 1.0);
        let mut cap = SceneObject::new(3, "capsule", PrimitiveKind::Capsule);
        cap.transform.scale = DVec3::new(1.0, 1.5, 1.0);

        let r = pick(&[cyl], &probe());
        assert!((r.distance - 4.0).abs() < 1e-9);
        let r = pick(&[cone], &probe());
        assert!((r.distance - 4.5).abs() < 1e-9);
        let r = pick(&[cap], &probe());
        assert!((r.distance - 4.0).abs() < 1e-9);
    }
}
