//! Analytic ray-primitive intersection library.
//!
//! All routines take a ray and primitive parameters in the primitive's
//! own local space (centered at origin, canonical +Y orientation) and
//! return the nearest hit parameter `t >= T_MIN`, or `None`. Every
//! function is pure, allocation-free, and degrades degenerate input
//! (zero, negative or NaN parameters) to a non-hit instead of
//! panicking — these run on the per-frame picking path.
//!
//! `t` is a multiple of the ray direction; callers that compare
//! distances across objects normalize the direction first.

use glam::DVec3;

/// Minimum accepted hit parameter in front of the ray origin.
pub const T_MIN: f64 = 1e-3;

/// Degenerate-quadratic threshold (Möller–Trumbore det, cone linear case).
const EPSILON: f64 = 1e-12;

/// A ray in some space; direction need not be normalized.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: DVec3,
    pub dir: DVec3,
}

impl Ray {
    #[inline]
    pub fn new(origin: DVec3, dir: DVec3) -> Self {
        Self { origin, dir }
    }

    /// Point along the ray at parameter `t`.
    #[inline]
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

#[inline]
fn valid_param(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Ray vs. sphere.
///
/// Smaller quadratic root first, larger root as fallback so a ray
/// starting inside the sphere still reports the exit point.
pub fn sphere(ray: &Ray, center: DVec3, radius: f64) -> Option<f64> {
    if !valid_param(radius) {
        return None;
    }
    let oc = ray.origin - center;
    let a = ray.dir.dot(ray.dir);
    if a == 0.0 {
        return None;
    }
    let half_b = oc.dot(ray.dir);
    let c = oc.dot(oc) - radius * radius;
    let discriminant = half_b * half_b - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    let t = (-half_b - sqrtd) / a;
    if t >= T_MIN {
        return Some(t);
    }
    let t = (-half_b + sqrtd) / a;
    if t >= T_MIN {
        return Some(t);
    }
    None
}

/// Ray vs. axis-aligned box (slab method).
///
/// Origin inside the box reports the exit point.
pub fn cuboid(ray: &Ray, center: DVec3, half_extents: DVec3) -> Option<f64> {
    if !valid_param(half_extents.x) || !valid_param(half_extents.y) || !valid_param(half_extents.z)
    {
        return None;
    }
    let o = (ray.origin - center).to_array();
    let d = ray.dir.to_array();
    let h = half_extents.to_array();
    let mut t_min = f64::NEG_INFINITY;
    let mut t_max = f64::INFINITY;
    for i in 0..3 {
        if d[i] != 0.0 {
            let inv = 1.0 / d[i];
            let mut t0 = (-h[i] - o[i]) * inv;
            let mut t1 = (h[i] - o[i]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        } else if o[i] < -h[i] || o[i] > h[i] {
            return None;
        }
    }
    // A zero direction skips every slab and leaves t_max infinite
    if !t_max.is_finite() || t_max < T_MIN {
        return None;
    }
    if t_min < T_MIN {
        Some(t_max)
    } else {
        Some(t_min)
    }
}

/// Ray vs. capped cylinder, axis = local +Y.
///
/// Side surface from the 2D (x,z) quadratic clipped to `|y| <= half_height`,
/// plus the two cap disks; minimum valid candidate wins.
pub fn cylinder(ray: &Ray, radius: f64, half_height: f64) -> Option<f64> {
    if !valid_param(radius) || !valid_param(half_height) {
        return None;
    }
    let (ox, oy, oz) = (ray.origin.x, ray.origin.y, ray.origin.z);
    let (dx, dy, dz) = (ray.dir.x, ray.dir.y, ray.dir.z);

    let mut best: Option<f64> = None;
    let mut consider = |t: f64| {
        if t >= T_MIN && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    };

    // Infinite side surface, then clip to the height range
    let a = dx * dx + dz * dz;
    if a > EPSILON {
        let half_b = ox * dx + oz * dz;
        let c = ox * ox + oz * oz - radius * radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant >= 0.0 {
            let sqrtd = discriminant.sqrt();
            for t in [(-half_b - sqrtd) / a, (-half_b + sqrtd) / a] {
                let y = oy + t * dy;
                if y.abs() <= half_height {
                    consider(t);
                }
            }
        }
    }

    // Cap disks at y = ±half_height
    if dy != 0.0 {
        for cap_y in [half_height, -half_height] {
            let t = (cap_y - oy) / dy;
            let x = ox + t * dx;
            let z = oz + t * dz;
            if x * x + z * z <= radius * radius {
                consider(t);
            }
        }
    }

    best
}

/// Ray vs. capped cone, axis = local +Y, apex at `y = +half_height`,
/// base disk of `base_radius` at `y = -half_height`.
///
/// Derived by substituting the linear radius function
/// `r(y) = base_radius * (half_height - y) / (2 * half_height)` into the
/// implicit quadric. The apex needs no cap (radius tapers to zero).
pub fn cone(ray: &Ray, base_radius: f64, half_height: f64) -> Option<f64> {
    if !valid_param(base_radius) || !valid_param(half_height) {
        return None;
    }
    let (ox, oy, oz) = (ray.origin.x, ray.origin.y, ray.origin.z);
    let (dx, dy, dz) = (ray.dir.x, ray.dir.y, ray.dir.z);

    let mut best: Option<f64> = None;
    let mut consider = |t: f64| {
        if t >= T_MIN && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    };

    // Slope of the radius function; w = height above the ray origin to the apex
    let k = base_radius / (2.0 * half_height);
    let w = half_height - oy;

    let a = dx * dx + dz * dz - k * k * dy * dy;
    let b = 2.0 * (ox * dx + oz * dz + k * k * w * dy);
    let c = ox * ox + oz * oz - k * k * w * w;

    let mut clip = |t: f64| {
        let y = oy + t * dy;
        if (-half_height..=half_height).contains(&y) {
            consider(t);
        }
    };

    if a.abs() > EPSILON {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant >= 0.0 {
            let sqrtd = discriminant.sqrt();
            clip((-b - sqrtd) / (2.0 * a));
            clip((-b + sqrtd) / (2.0 * a));
        }
    } else if b.abs() > EPSILON {
        // Ray parallel to the cone surface: the quadric degenerates to linear
        clip(-c / b);
    }

    // Base cap disk at y = -half_height
    if dy != 0.0 {
        let t = (-half_height - oy) / dy;
        let x = ox + t * dx;
        let z = oz + t * dz;
        if x * x + z * z <= base_radius * base_radius {
            consider(t);
        }
    }

    best
}

/// Ray vs. capsule: a capped cylinder of half-length
/// `max(half_height_total - radius, 0)` plus two sphere caps centered
/// at `(0, ±segment_half, 0)`; minimum valid candidate across all three.
pub fn capsule(ray: &Ray, radius: f64, half_height_total: f64) -> Option<f64> {
    if !valid_param(radius) || !valid_param(half_height_total) {
        return None;
    }
    let segment_half = (half_height_total - radius).max(0.0);

    let mut best: Option<f64> = None;
    let mut consider = |t: Option<f64>| {
        if let Some(t) = t {
            if best.map_or(true, |b| t < b) {
                best = Some(t);
            }
        }
    };

    consider(cylinder(ray, radius, segment_half));
    consider(sphere(ray, DVec3::new(0.0, segment_half, 0.0), radius));
    consider(sphere(ray, DVec3::new(0.0, -segment_half, 0.0), radius));

    best
}

/// Ray vs. torus.
///
/// The CPU path intentionally reports a miss: the analytic quartic
/// solver is not implemented, so a torus cannot be click-selected.
/// The GPU kernel renders it with a numeric method instead.
pub fn torus(_ray: &Ray, _major_radius: f64, _minor_radius: f64) -> Option<f64> {
    None
}

/// Ray vs. triangle (Möller–Trumbore), winding independent.
pub fn triangle(ray: &Ray, v0: DVec3, v1: DVec3, v2: DVec3) -> Option<f64> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let pvec = ray.dir.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let v = ray.dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    if t < T_MIN {
        return None;
    }
    Some(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> Ray {
        Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0))
    }

    fn assert_t(t: Option<f64>, expected: f64) {
        let t = t.expect("expected a hit");
        assert!((t - expected).abs() < 1e-9, "t = {t}, expected {expected}");
    }

    #[test]
    fn test_sphere_hit() {
        assert_t(sphere(&probe(), DVec3::ZERO, 1.0), 4.0);
    }

    #[test]
    fn test_sphere_origin_inside() {
        // Origin at center: smaller root is behind, larger root is the exit
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        assert_t(sphere(&ray, DVec3::ZERO, 1.0), 1.0);
    }

    #[test]
    fn test_sphere_miss_and_degenerate() {
        let away = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, 1.0));
        assert!(sphere(&away, DVec3::ZERO, 1.0).is_none());
        assert!(sphere(&probe(), DVec3::new(10.0, 0.0, 0.0), 1.0).is_none());
        assert!(sphere(&probe(), DVec3::ZERO, 0.0).is_none());
        assert!(sphere(&probe(), DVec3::ZERO, -1.0).is_none());
        assert!(sphere(&probe(), DVec3::ZERO, f64::NAN).is_none());
    }

    #[test]
    fn test_cuboid_hit() {
        assert_t(cuboid(&probe(), DVec3::ZERO, DVec3::ONE), 4.0);
    }

    #[test]
    fn test_cuboid_origin_inside() {
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        assert_t(cuboid(&ray, DVec3::ZERO, DVec3::ONE), 1.0);
    }

    #[test]
    fn test_cuboid_parallel_axis_miss() {
        // Direction has a zero component and the origin lies outside that slab
        let ray = Ray::new(DVec3::new(2.0, 0.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(cuboid(&ray, DVec3::ZERO, DVec3::ONE).is_none());
    }

    #[test]
    fn test_cuboid_zero_direction_is_non_hit() {
        // Origin inside the box: no slab constrains t, so this must
        // be rejected, matching the sphere's a == 0 behavior
        let ray = Ray::new(DVec3::ZERO, DVec3::ZERO);
        assert!(cuboid(&ray, DVec3::ZERO, DVec3::ONE).is_none());
        assert!(sphere(&ray, DVec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn test_cuboid_degenerate() {
        assert!(cuboid(&probe(), DVec3::ZERO, DVec3::new(1.0, 0.0, 1.0)).is_none());
        assert!(cuboid(&probe(), DVec3::ZERO, DVec3::splat(f64::INFINITY)).is_none());
    }

    #[test]
    fn test_cylinder_side_hit() {
        assert_t(cylinder(&probe(), 1.0, 0.5), 4.0);
    }

    #[test]
    fn test_cylinder_cap_hit() {
        // Straight down onto the top cap
        let ray = Ray::new(DVec3::new(0.0, 5.0, 0.0), DVec3::new(0.0, -1.0, 0.0));
        assert_t(cylinder(&ray, 1.0, 0.5), 4.5);
    }

    #[test]
    fn test_cylinder_clipped_above() {
        // Passes over the cylinder: infinite side roots exist but are clipped
        let ray = Ray::new(DVec3::new(0.0, 2.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(cylinder(&ray, 1.0, 0.5).is_none());
    }

    #[test]
    fn test_cylinder_degenerate() {
        assert!(cylinder(&probe(), 0.0, 0.5).is_none());
        assert!(cylinder(&probe(), 1.0, -0.5).is_none());
    }

    #[test]
    fn test_cone_equator_hit() {
        // Surface radius at y=0 is base_radius/2 = 0.5, so t = 5 - 0.5
        assert_t(cone(&probe(), 1.0, 0.5), 4.5);
    }

    #[test]
    fn test_cone_base_cap_hit() {
        let ray = Ray::new(DVec3::new(0.0, -5.0, 0.0), DVec3::new(0.0, 1.0, 0.0));
        assert_t(cone(&ray, 1.0, 0.5), 4.5);
    }

    #[test]
    fn test_cone_mirror_rejected() {
        // Above the apex only the mirror cone exists; it must be clipped out
        let ray = Ray::new(DVec3::new(0.0, 1.0, 5.0), DVec3::new(0.0, 0.0, -1.0));
        assert!(cone(&ray, 1.0, 0.5).is_none());
    }

    #[test]
    fn test_cone_degenerate() {
        assert!(cone(&probe(), f64::NAN, 0.5).is_none());
        assert!(cone(&probe(), 1.0, 0.0).is_none());
    }

    #[test]
    fn test_capsule_cylinder_section() {
        assert_t(capsule(&probe(), 1.0, 1.5), 4.0);
    }

    #[test]
    fn test_capsule_sphere_cap() {
        // Straight down the axis: top sphere cap at y = segment_half + radius
        let ray = Ray::new(DVec3::new(0.0, 5.0, 0.0), DVec3::new(0.0, -1.0, 0.0));
        assert_t(capsule(&ray, 1.0, 1.5), 3.5);
    }

    #[test]
    fn test_capsule_degenerates_to_sphere() {
        // half_height_total <= radius leaves no cylindrical segment
        assert_t(capsule(&probe(), 1.0, 1.0), 4.0);
    }

    #[test]
    fn test_torus_always_misses_on_cpu() {
        assert!(torus(&probe(), 1.0, 0.25).is_none());
    }

    #[test]
    fn test_triangle_hit() {
        let v0 = DVec3::new(-1.0, -1.0, 0.0);
        let v1 = DVec3::new(1.0, -1.0, 0.0);
        let v2 = DVec3::new(0.0, 1.0, 0.0);
        assert_t(triangle(&probe(), v0, v1, v2), 5.0);
        // Winding independent
        assert_t(triangle(&probe(), v0, v2, v1), 5.0);
    }

    #[test]
    fn test_triangle_miss_outside() {
        let v0 = DVec3::new(2.0, 2.0, 0.0);
        let v1 = DVec3::new(3.0, 2.0, 0.0);
        let v2 = DVec3::new(2.5, 3.0, 0.0);
        assert!(triangle(&probe(), v0, v1, v2).is_none());
    }

    #[test]
    fn test_triangle_parallel_miss() {
        let ray = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(1.0, 0.0, 0.0));
        let v0 = DVec3::new(-1.0, -1.0, 0.0);
        let v1 = DVec3::new(1.0, -1.0, 0.0);
        let v2 = DVec3::new(0.0, 1.0, 0.0);
        assert!(triangle(&ray, v0, v1, v2).is_none());
    }

    #[test]
    fn test_reversed_direction_never_hits() {
        let away = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::new(0.0, 0.0, 1.0));
        assert!(cuboid(&away, DVec3::ZERO, DVec3::ONE).is_none());
        assert!(cylinder(&away, 1.0, 0.5).is_none());
        assert!(cone(&away, 1.0, 0.5).is_none());
        assert!(capsule(&away, 1.0, 1.5).is_none());
    }
}
