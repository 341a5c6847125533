//! Deterministic median-split BVH builder.
//!
//! Constructs a flat node arena from a triangle soup using an explicit
//! worklist instead of recursion, so pathological meshes cannot blow
//! the call stack. The build is fully deterministic: identical input
//! yields byte-identical `nodes` and `tri_refs` (stable sort with
//! triangle-id tie-break, no hashing anywhere).

use super::{Blas, BvhNode};
use crate::util::Aabb;
use glam::Vec3;

/// Default maximum triangles per leaf.
pub const DEFAULT_MAX_LEAF: usize = 4;

/// Build a BLAS from a vertex-position array and a flat triangle-index
/// array (three indices per triangle).
///
/// Split policy: longest axis of the node AABB (ties prefer X, then Y,
/// then Z), stable sort of the triangle-id slice by centroid on that
/// axis, split at the exact median. Out-of-range vertex indices are
/// treated as the origin for bounds purposes rather than erroring.
#[tracing::instrument(skip_all, fields(tri_count = indices.len() / 3))]
pub fn build_blas(positions: &[Vec3], indices: &[u32], max_leaf: usize) -> Blas {
    let n = indices.len() / 3;
    let max_leaf = max_leaf.max(1);

    if n == 0 {
        return Blas {
            nodes: vec![BvhNode {
                aabb_min: [0.0; 3],
                left: -1,
                aabb_max: [0.0; 3],
                right: -1,
                tri_offset: 0,
                tri_count: 0,
            }],
            tri_refs: vec![],
        };
    }

    let vertex = |i: u32| positions.get(i as usize).copied().unwrap_or(Vec3::ZERO);

    // Pre-compute per-triangle AABBs and centroids
    let mut tri_aabbs = Vec::with_capacity(n);
    let mut centroids = Vec::with_capacity(n);
    for tri in 0..n {
        let v0 = vertex(indices[tri * 3]);
        let v1 = vertex(indices[tri * 3 + 1]);
        let v2 = vertex(indices[tri * 3 + 2]);
        let mut b = Aabb::EMPTY;
        b.grow_point(v0.to_array());
        b.grow_point(v1.to_array());
        b.grow_point(v2.to_array());
        tri_aabbs.push(b);
        centroids.push(b.centroid());
    }

    let mut tri_refs: Vec<u32> = (0..n as u32).collect();

    let mut nodes: Vec<BvhNode> = Vec::with_capacity(2 * n);
    nodes.push(BvhNode::default());

    struct Task {
        node_idx: usize,
        start: usize,
        count: usize,
    }

    let mut stack = vec![Task {
        node_idx: 0,
        start: 0,
        count: n,
    }];

    while let Some(task) = stack.pop() {
        let start = task.start;
        let end = start + task.count;

        // Tight AABB over the referenced triangle range
        let mut node_aabb = Aabb::EMPTY;
        for &id in &tri_refs[start..end] {
            node_aabb.grow(&tri_aabbs[id as usize]);
        }

        if task.count <= max_leaf {
            nodes[task.node_idx] = BvhNode {
                aabb_min: node_aabb.min,
                left: -1,
                aabb_max: node_aabb.max,
                right: -1,
                tri_offset: start as u32,
                tri_count: task.count as u32,
            };
            continue;
        }

        // Longest axis, X >= Y >= Z tie preference
        let axis = node_aabb.longest_axis();

        // Stable sort by centroid, triangle id breaks exact ties
        tri_refs[start..end].sort_by(|&a, &b| {
            centroids[a as usize][axis]
                .total_cmp(&centroids[b as usize][axis])
                .then(a.cmp(&b))
        });

        let left_count = task.count / 2;

        let left_idx = nodes.len();
        let right_idx = left_idx + 1;
        nodes.push(BvhNode::default());
        nodes.push(BvhNode::default());

        nodes[task.node_idx] = BvhNode {
            aabb_min: node_aabb.min,
            left: left_idx as i32,
            aabb_max: node_aabb.max,
            right: right_idx as i32,
            tri_offset: 0,
            tri_count: 0,
        };

        // Right first so the left child is processed next (depth-first)
        stack.push(Task {
            node_idx: right_idx,
            start: start + left_count,
            count: task.count - left_count,
        });
        stack.push(Task {
            node_idx: left_idx,
            start,
            count: left_count,
        });
    }

    Blas { nodes, tri_refs }
}
