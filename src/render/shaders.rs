//! Embedded WGSL kernels.
//!
//! The compute kernel traces analytic primitives directly (no mesh
//! BVH on this path); the struct declarations at the top of the source
//! must stay bit-compatible with the Pod structs in
//! [`scene_buffer`](super::scene_buffer) and
//! [`compute`](super::compute).

/// Progressive path-trace kernel.
///
/// Bind group 0 layout (the wire contract):
/// 0 camera uniform, 1 settings uniform, 2 tone-mapped output
/// (rgba8unorm storage), 3 previous accumulation (sampled rgba32float),
/// 4 current accumulation (rgba32float storage), 5 scene header,
/// 6 object array.
pub const PATH_TRACE_WGSL: &str = r#"
struct Camera {
    inv_view: mat4x4<f32>,
    inv_proj: mat4x4<f32>,
    position: vec3<f32>,
    _pad: f32,
}

struct Settings {
    frame_index: u32,
    samples_per_pixel: u32,
    max_bounces: u32,
    flags: u32,
}

struct SceneHeader {
    object_count: u32,
}

// 128-byte object record. Field offsets are frozen; the CPU encoder
// writes this layout byte for byte.
struct SceneObject {
    position: vec3<f32>,
    object_type: u32,
    scale: vec3<f32>,
    _pad0: f32,
    rotation: vec3<f32>,
    _pad1: f32,
    _reserved0: vec4<f32>,
    color: vec3<f32>,
    material_type: u32,
    ior: f32,
    intensity: f32,
    _reserved1a: vec2<f32>,
    _reserved1b: vec4<f32>,
    _reserved1c: vec4<f32>,
}

const OBJ_SPHERE: u32 = 0u;
const OBJ_CUBOID: u32 = 1u;
const OBJ_CYLINDER: u32 = 2u;
const OBJ_CONE: u32 = 3u;
const OBJ_CAPSULE: u32 = 4u;
const OBJ_TORUS: u32 = 5u;

const MAT_PLASTIC: u32 = 0u;
const MAT_METAL: u32 = 1u;
const MAT_GLASS: u32 = 2u;
const MAT_LIGHT: u32 = 3u;

const T_MIN: f32 = 1e-3;
const T_MAX: f32 = 1e8;
const FLAG_FIREFLY_CLAMP: u32 = 1u;
const FIREFLY_LIMIT: f32 = 10.0;

@group(0) @binding(0) var<uniform> camera: Camera;
@group(0) @binding(1) var<uniform> settings: Settings;
@group(0) @binding(2) var output_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(3) var prev_accum: texture_2d<f32>;
@group(0) @binding(4) var curr_accum: texture_storage_2d<rgba32float, write>;
@group(0) @binding(5) var<storage, read> scene_header: SceneHeader;
@group(0) @binding(6) var<storage, read> objects: array<SceneObject, 256>;

// ---- RNG (PCG) ------------------------------------------------------

var<private> rng_state: u32;

fn pcg_hash(input: u32) -> u32 {
    let state = input * 747796405u + 2891336453u;
    let word = ((state >> ((state >> 28u) + 4u)) ^ state) * 277803737u;
    return (word >> 22u) ^ word;
}

fn rand() -> f32 {
    rng_state = pcg_hash(rng_state);
    return f32(rng_state) / 4294967295.0;
}

fn rand_unit_vector() -> vec3<f32> {
    let z = rand() * 2.0 - 1.0;
    let a = rand() * 6.28318530718;
    let r = sqrt(max(0.0, 1.0 - z * z));
    return vec3<f32>(r * cos(a), r * sin(a), z);
}

fn cosine_hemisphere(n: vec3<f32>) -> vec3<f32> {
    let d = n + rand_unit_vector();
    if (dot(d, d) < 1e-12) {
        return n;
    }
    return normalize(d);
}

// ---- Rotation (intrinsic XYZ euler, matches the CPU side) -----------

fn rot_euler(r: vec3<f32>) -> mat3x3<f32> {
    let cx = cos(r.x); let sx = sin(r.x);
    let cy = cos(r.y); let sy = sin(r.y);
    let cz = cos(r.z); let sz = sin(r.z);
    let mx = mat3x3<f32>(
        vec3<f32>(1.0, 0.0, 0.0),
        vec3<f32>(0.0, cx, sx),
        vec3<f32>(0.0, -sx, cx),
    );
    let my = mat3x3<f32>(
        vec3<f32>(cy, 0.0, -sy),
        vec3<f32>(0.0, 1.0, 0.0),
        vec3<f32>(sy, 0.0, cy),
    );
    let mz = mat3x3<f32>(
        vec3<f32>(cz, sz, 0.0),
        vec3<f32>(-sz, cz, 0.0),
        vec3<f32>(0.0, 0.0, 1.0),
    );
    return mx * my * mz;
}

// ---- Local-space primitive intersection -----------------------------
// Each returns hit distance (< 0.0 for miss) and writes the local
// normal through `hit_normal`.

var<private> hit_normal: vec3<f32>;

fn isect_sphere(ro: vec3<f32>, rd: vec3<f32>, radius: f32) -> f32 {
    let half_b = dot(ro, rd);
    let c = dot(ro, ro) - radius * radius;
    let disc = half_b * half_b - c;
    if (disc < 0.0) {
        return -1.0;
    }
    let sq = sqrt(disc);
    var t = -half_b - sq;
    if (t < T_MIN) {
        t = -half_b + sq;
    }
    if (t < T_MIN) {
        return -1.0;
    }
    hit_normal = normalize(ro + rd * t);
    return t;
}

fn isect_box(ro: vec3<f32>, rd: vec3<f32>, half: vec3<f32>) -> f32 {
    let inv = 1.0 / rd;
    let t0 = (-half - ro) * inv;
    let t1 = (half - ro) * inv;
    let tmin3 = min(t0, t1);
    let tmax3 = max(t0, t1);
    let t_near = max(max(tmin3.x, tmin3.y), tmin3.z);
    let t_far = min(min(tmax3.x, tmax3.y), tmax3.z);
    if (t_near > t_far || t_far < T_MIN) {
        return -1.0;
    }
    var t = t_near;
    if (t < T_MIN) {
        t = t_far;
    }
    let p = ro + rd * t;
    let q = abs(p / half);
    if (q.x >= q.y && q.x >= q.z) {
        hit_normal = vec3<f32>(sign(p.x), 0.0, 0.0);
    } else if (q.y >= q.z) {
        hit_normal = vec3<f32>(0.0, sign(p.y), 0.0);
    } else {
        hit_normal = vec3<f32>(0.0, 0.0, sign(p.z));
    }
    return t;
}

fn isect_cylinder(ro: vec3<f32>, rd: vec3<f32>, radius: f32, half_h: f32) -> f32 {
    var best = T_MAX;
    var best_n = vec3<f32>(0.0);

    // Side surface
    let a = rd.x * rd.x + rd.z * rd.z;
    if (a > 1e-12) {
        let b = ro.x * rd.x + ro.z * rd.z;
        let c = ro.x * ro.x + ro.z * ro.z - radius * radius;
        let disc = b * b - a * c;
        if (disc >= 0.0) {
            let sq = sqrt(disc);
            for (var k = 0; k < 2; k++) {
                var t = (-b - sq) / a;
                if (k == 1) {
                    t = (-b + sq) / a;
                }
                if (t >= T_MIN && t < best) {
                    let p = ro + rd * t;
                    if (abs(p.y) <= half_h) {
                        best = t;
                        best_n = normalize(vec3<f32>(p.x, 0.0, p.z));
                    }
                }
            }
        }
    }

    // Caps
    if (abs(rd.y) > 1e-12) {
        for (var k = 0; k < 2; k++) {
            var y = half_h;
            if (k == 1) {
                y = -half_h;
            }
            let t = (y - ro.y) / rd.y;
            if (t >= T_MIN && t < best) {
                let p = ro + rd * t;
                if (p.x * p.x + p.z * p.z <= radius * radius) {
                    best = t;
                    best_n = vec3<f32>(0.0, sign(y), 0.0);
                }
            }
        }
    }

    if (best >= T_MAX) {
        return -1.0;
    }
    hit_normal = best_n;
    return best;
}

// Cone with apex at +half_h and base disk of `radius` at -half_h.
fn isect_cone(ro: vec3<f32>, rd: vec3<f32>, radius: f32, half_h: f32) -> f32 {
    var best = T_MAX;
    var best_n = vec3<f32>(0.0);

    let k = radius / (2.0 * half_h);
    let k2 = k * k;
    let w = half_h - ro.y;
    let a = rd.x * rd.x + rd.z * rd.z - k2 * rd.y * rd.y;
    let b = ro.x * rd.x + ro.z * rd.z + k2 * w * rd.y;
    let c = ro.x * ro.x + ro.z * ro.z - k2 * w * w;

    if (abs(a) > 1e-12) {
        let disc = b * b - a * c;
        if (disc >= 0.0) {
            let sq = sqrt(disc);
            for (var i = 0; i < 2; i++) {
                var t = (-b - sq) / a;
                if (i == 1) {
                    t = (-b + sq) / a;
                }
                if (t >= T_MIN && t < best) {
                    let p = ro + rd * t;
                    if (p.y >= -half_h && p.y <= half_h) {
                        best = t;
                        let xz = normalize(vec2<f32>(p.x, p.z));
                        best_n = normalize(vec3<f32>(xz.x, k, xz.y));
                    }
                }
            }
        }
    } else if (abs(b) > 1e-12) {
        let t = -c / (2.0 * b);
        if (t >= T_MIN && t < best) {
            let p = ro + rd * t;
            if (p.y >= -half_h && p.y <= half_h) {
                best = t;
                let xz = normalize(vec2<f32>(p.x, p.z));
                best_n = normalize(vec3<f32>(xz.x, k, xz.y));
            }
        }
    }

    // Base disk
    if (abs(rd.y) > 1e-12) {
        let t = (-half_h - ro.y) / rd.y;
        if (t >= T_MIN && t < best) {
            let p = ro + rd * t;
            if (p.x * p.x + p.z * p.z <= radius * radius) {
                best = t;
                best_n = vec3<f32>(0.0, -1.0, 0.0);
            }
        }
    }

    if (best >= T_MAX) {
        return -1.0;
    }
    hit_normal = best_n;
    return best;
}

fn isect_capsule(ro: vec3<f32>, rd: vec3<f32>, radius: f32, half_total: f32) -> f32 {
    let seg = max(half_total - radius, 0.0);
    var best = T_MAX;

    // Cylindrical body
    let a = rd.x * rd.x + rd.z * rd.z;
    if (a > 1e-12) {
        let b = ro.x * rd.x + ro.z * rd.z;
        let c = ro.x * ro.x + ro.z * ro.z - radius * radius;
        let disc = b * b - a * c;
        if (disc >= 0.0) {
            let t = (-b - sqrt(disc)) / a;
            if (t >= T_MIN && t < best) {
                let p = ro + rd * t;
                if (abs(p.y) <= seg) {
                    best = t;
                }
            }
        }
    }

    // End spheres
    for (var i = 0; i < 2; i++) {
        var cy = seg;
        if (i == 1) {
            cy = -seg;
        }
        let oc = ro - vec3<f32>(0.0, cy, 0.0);
        let half_b = dot(oc, rd);
        let c = dot(oc, oc) - radius * radius;
        let disc = half_b * half_b - c;
        if (disc >= 0.0) {
            let t = -half_b - sqrt(disc);
            if (t >= T_MIN && t < best) {
                best = t;
            }
        }
    }

    if (best >= T_MAX) {
        return -1.0;
    }
    let p = ro + rd * best;
    let cy = clamp(p.y, -seg, seg);
    hit_normal = normalize(p - vec3<f32>(0.0, cy, 0.0));
    return best;
}

// Torus via sphere-bounded SDF marching; major radius R, tube radius r.
fn sdf_torus(p: vec3<f32>, major: f32, minor: f32) -> f32 {
    let q = vec2<f32>(length(p.xz) - major, p.y);
    return length(q) - minor;
}

fn isect_torus(ro: vec3<f32>, rd: vec3<f32>, major: f32, minor: f32) -> f32 {
    // Cheap bounding-sphere reject
    let bound = major + minor;
    let half_b = dot(ro, rd);
    if (half_b * half_b - (dot(ro, ro) - bound * bound) < 0.0) {
        return -1.0;
    }

    var t = T_MIN;
    for (var i = 0; i < 96; i++) {
        let p = ro + rd * t;
        let d = sdf_torus(p, major, minor);
        if (d < 1e-4) {
            let e = 1e-3;
            let px = ro + rd * t;
            hit_normal = normalize(vec3<f32>(
                sdf_torus(px + vec3<f32>(e, 0.0, 0.0), major, minor)
                    - sdf_torus(px - vec3<f32>(e, 0.0, 0.0), major, minor),
                sdf_torus(px + vec3<f32>(0.0, e, 0.0), major, minor)
                    - sdf_torus(px - vec3<f32>(0.0, e, 0.0), major, minor),
                sdf_torus(px + vec3<f32>(0.0, 0.0, e), major, minor)
                    - sdf_torus(px - vec3<f32>(0.0, 0.0, e), major, minor),
            ));
            return t;
        }
        t += d;
        if (t > 2.0 * bound + length(ro)) {
            break;
        }
    }
    return -1.0;
}

// ---- Scene traversal -------------------------------------------------

struct SceneHit {
    t: f32,
    normal: vec3<f32>,
    object: u32,
}

fn trace_scene(ro: vec3<f32>, rd: vec3<f32>) -> SceneHit {
    var hit: SceneHit;
    hit.t = -1.0;
    var closest = T_MAX;

    let count = min(scene_header.object_count, 256u);
    for (var i = 0u; i < count; i++) {
        let obj = objects[i];
        let rot = rot_euler(obj.rotation);
        let inv_rot = transpose(rot);
        let lo = inv_rot * (ro - obj.position);
        let ld = inv_rot * rd;
        let s = obj.scale;

        var t = -1.0;
        switch obj.object_type {
            case OBJ_SPHERE: {
                t = isect_sphere(lo, ld, s.x);
            }
            case OBJ_CUBOID: {
                t = isect_box(lo, ld, s);
            }
            case OBJ_CYLINDER: {
                t = isect_cylinder(lo, ld, s.x, s.y);
            }
            case OBJ_CONE: {
                t = isect_cone(lo, ld, s.x, s.y);
            }
            case OBJ_CAPSULE: {
                t = isect_capsule(lo, ld, s.x, s.y);
            }
            case OBJ_TORUS: {
                t = isect_torus(lo, ld, s.x, s.y);
            }
            default: {}
        }

        if (t >= T_MIN && t < closest) {
            closest = t;
            hit.t = t;
            hit.normal = normalize(rot * hit_normal);
            hit.object = i;
        }
    }
    return hit;
}

// ---- Shading ---------------------------------------------------------

fn sky(rd: vec3<f32>) -> vec3<f32> {
    let t = 0.5 * (rd.y + 1.0);
    return mix(vec3<f32>(1.0, 1.0, 1.0), vec3<f32>(0.5, 0.7, 1.0), t);
}

fn schlick(cosine: f32, ior: f32) -> f32 {
    var r0 = (1.0 - ior) / (1.0 + ior);
    r0 = r0 * r0;
    return r0 + (1.0 - r0) * pow(1.0 - cosine, 5.0);
}

fn trace_path(ro_in: vec3<f32>, rd_in: vec3<f32>) -> vec3<f32> {
    var ro = ro_in;
    var rd = rd_in;
    var throughput = vec3<f32>(1.0);
    var radiance = vec3<f32>(0.0);

    for (var bounce = 0u; bounce <= settings.max_bounces; bounce++) {
        let hit = trace_scene(ro, rd);
        if (hit.t < 0.0) {
            radiance += throughput * sky(rd);
            break;
        }

        let obj = objects[hit.object];
        let p = ro + rd * hit.t;
        var n = hit.normal;
        let front_face = dot(rd, n) < 0.0;
        if (!front_face) {
            n = -n;
        }

        switch obj.material_type {
            case MAT_LIGHT: {
                radiance += throughput * obj.color * obj.intensity;
                return radiance;
            }
            case MAT_METAL: {
                throughput *= obj.color;
                rd = reflect(rd, n);
                ro = p + n * T_MIN;
            }
            case MAT_GLASS: {
                var eta = 1.0 / obj.ior;
                if (!front_face) {
                    eta = obj.ior;
                }
                let cos_theta = min(dot(-rd, n), 1.0);
                let sin_theta = sqrt(max(0.0, 1.0 - cos_theta * cos_theta));
                let cannot_refract = eta * sin_theta > 1.0;
                if (cannot_refract || schlick(cos_theta, eta) > rand()) {
                    rd = reflect(rd, n);
                } else {
                    rd = refract(rd, n, eta);
                    throughput *= obj.color;
                }
                ro = p + rd * T_MIN;
            }
            default: {
                // Plastic: cosine-weighted diffuse
                throughput *= obj.color;
                rd = cosine_hemisphere(n);
                ro = p + n * T_MIN;
            }
        }
    }
    return radiance;
}

// ---- Entry point -----------------------------------------------------

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let dims = textureDimensions(output_tex);
    if (gid.x >= dims.x || gid.y >= dims.y) {
        return;
    }
    let pix = vec2<i32>(gid.xy);

    rng_state = pcg_hash(gid.x + gid.y * dims.x + settings.frame_index * 719393u);

    var color = vec3<f32>(0.0);
    let spp = max(settings.samples_per_pixel, 1u);
    for (var s = 0u; s < spp; s++) {
        // Jittered NDC position through the inverse matrices
        let jitter = vec2<f32>(rand(), rand());
        let uv = (vec2<f32>(gid.xy) + jitter) / vec2<f32>(dims);
        let ndc = vec2<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0);
        let view_target = camera.inv_proj * vec4<f32>(ndc, 1.0, 1.0);
        let view_dir = normalize(view_target.xyz / view_target.w);
        let rd = normalize((camera.inv_view * vec4<f32>(view_dir, 0.0)).xyz);

        color += trace_path(camera.position, rd);
    }
    color /= f32(spp);

    if ((settings.flags & FLAG_FIREFLY_CLAMP) != 0u) {
        color = min(color, vec3<f32>(FIREFLY_LIMIT));
    }

    // Progressive mean: frame 0 overwrites, later frames blend
    var accum = color;
    if (settings.frame_index > 0u) {
        let prev = textureLoad(prev_accum, pix, 0).rgb;
        accum = prev + (color - prev) / f32(settings.frame_index + 1u);
    }
    textureStore(curr_accum, pix, vec4<f32>(accum, 1.0));

    // Reinhard + gamma for display
    let mapped = pow(accum / (accum + vec3<f32>(1.0)), vec3<f32>(1.0 / 2.2));
    textureStore(output_tex, pix, vec4<f32>(mapped, 1.0));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_declares_wire_bindings() {
        for binding in 0..=6 {
            assert!(
                PATH_TRACE_WGSL.contains(&format!("@binding({binding})")),
                "missing binding {binding}"
            );
        }
        assert!(PATH_TRACE_WGSL.contains("@workgroup_size(8, 8, 1)"));
    }

    #[test]
    fn test_kernel_object_capacity_matches_encoder() {
        assert!(PATH_TRACE_WGSL.contains("array<SceneObject, 256>"));
    }
}
