//! Bounding-volume hierarchy for triangulated meshes.
//!
//! Flat node arena with index-based children (no recursion anywhere),
//! GPU-uploadable as-is:
//! - [`BvhNode`] - 40-byte Pod node, root always at index 0
//! - [`Blas`] - node array + reordered triangle-reference array
//! - [`build`] - deterministic median-split builder
//!
//! The triangle-reference array is a permutation of `0..tri_count`;
//! leaves own disjoint contiguous slices of it.

pub mod build;

pub use build::{build_blas, DEFAULT_MAX_LEAF};

/// Filter a flat triangle-index list down to renderable triangles.
///
/// Drops incomplete trailing chunks, out-of-range indices, and
/// zero-area triangles (repeated indices or coincident positions).
/// Feed the result to [`build_blas`] when the mesh source is untrusted.
pub fn sanitize_triangles(positions: &[Vec3], indices: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(indices.len());
    for chunk in indices.chunks_exact(3) {
        let (i0, i1, i2) = (chunk[0], chunk[1], chunk[2]);
        let (Some(v0), Some(v1), Some(v2)) = (
            positions.get(i0 as usize),
            positions.get(i1 as usize),
            positions.get(i2 as usize),
        ) else {
            continue;
        };
        if (*v1 - *v0).cross(*v2 - *v0).length_squared() <= f32::EPSILON {
            continue;
        }
        out.extend_from_slice(chunk);
    }
    if out.len() < indices.len() {
        tracing::debug!(
            dropped = (indices.len() - out.len()) / 3,
            "dropped degenerate triangles"
        );
    }
    out
}

use crate::intersect::{self, Ray};
use crate::util::Aabb;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// A single BVH node.
///
/// Interior node: `left`/`right` are child indices (>= 0) and
/// `tri_offset == tri_count == 0`. Leaf node: `left == right == -1`
/// and `tri_offset`/`tri_count` describe a contiguous slice of the
/// triangle-reference array. The stored AABB is the tight union of
/// all triangle AABBs in the subtree.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub aabb_min: [f32; 3],
    pub left: i32,
    pub aabb_max: [f32; 3],
    pub right: i32,
    pub tri_offset: u32,
    pub tri_count: u32,
}

impl BvhNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left < 0
    }

    #[inline]
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.aabb_min, self.aabb_max)
    }
}

/// Bottom-level acceleration structure for one mesh.
///
/// Built once per mesh topology change and rebuilt wholesale; there is
/// no incremental update.
pub struct Blas {
    /// Flat node array (index 0 = root).
    pub nodes: Vec<BvhNode>,
    /// Permutation of `0..tri_count`; leaves reference into this.
    pub tri_refs: Vec<u32>,
}

impl Blas {
    /// BVH nodes as bytes for GPU upload.
    pub fn nodes_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Triangle references as bytes for GPU upload.
    pub fn tri_refs_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.tri_refs)
    }

    /// Nearest triangle intersection along `ray`, in mesh-local space.
    ///
    /// Returns `(t, triangle_id)` for the closest hit at
    /// `t >= intersect::T_MIN`, or `None`. Traversal uses an explicit
    /// stack and prunes nodes farther than the best hit so far.
    /// Triangles with out-of-range indices are skipped.
    pub fn intersect(&self, positions: &[Vec3], indices: &[u32], ray: &Ray) -> Option<(f64, u32)> {
        if self.nodes.is_empty() {
            return None;
        }
        let mut best: Option<(f64, u32)> = None;
        let mut closest = f64::INFINITY;
        let mut stack: Vec<usize> = Vec::with_capacity(64);
        stack.push(0);

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if node.aabb().hit(ray.origin, ray.dir, intersect::T_MIN, closest).is_none() {
                continue;
            }
            if node.is_leaf() {
                let start = node.tri_offset as usize;
                let end = start + node.tri_count as usize;
                for &tri_id in &self.tri_refs[start..end] {
                    let base = tri_id as usize * 3;
                    let Some(chunk) = indices.get(base..base + 3) else {
                        continue;
                    };
                    let (i0, i1, i2) = (chunk[0] as usize, chunk[1] as usize, chunk[2] as usize);
                    if i0 >= positions.len() || i1 >= positions.len() || i2 >= positions.len() {
                        continue;
                    }
                    let v0 = positions[i0].as_dvec3();
                    let v1 = positions[i1].as_dvec3();
                    let v2 = positions[i2].as_dvec3();
                    if let Some(t) = intersect::triangle(ray, v0, v1, v2) {
                        if t < closest {
                            closest = t;
                            best = Some((t, tri_id));
                        }
                    }
                }
            } else {
                // Near child first: push the farther one below it on the stack
                let l = node.left as usize;
                let r = node.right as usize;
                let lt = self.nodes[l].aabb().hit(ray.origin, ray.dir, intersect::T_MIN, closest);
                let rt = self.nodes[r].aabb().hit(ray.origin, ray.dir, intersect::T_MIN, closest);
                match (lt, rt) {
                    (Some(ln), Some(rn)) => {
                        if ln <= rn {
                            stack.push(r);
                            stack.push(l);
                        } else {
                            stack.push(l);
                            stack.push(r);
                        }
                    }
                    (Some(_), None) => stack.push(l),
                    (None, Some(_)) => stack.push(r),
                    (None, None) => {}
                }
            }
        }

        best
    }
}
