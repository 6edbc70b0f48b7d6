//! Queue-driven BVH construction and depth-first compaction.

use std::collections::VecDeque;

use strata_math::{Aabb, Distribution1D, Frame, Vec3};

use super::{
    BvhNode, BvhPrimitive, PrimitiveInfo, TriangleBvh, LEAF_SIZE_THRESHOLD, TRAVERSAL_STACK_SIZE,
};
use crate::triangle::Triangle;

/// Below this depth nodes are split at the centroid midpoint; at or beyond
/// it only median splits are used, which bounds the remaining depth.
const MIDPOINT_SPLIT_DEPTH: usize = TRAVERSAL_STACK_SIZE / 2;

/// A triangle reduced to what the partitioner needs.
struct BuildPrimitive {
    bounds: Aabb,
    centroid: Vec3,
    index: u32,
}

enum BuildKind {
    Leaf { start: usize, end: usize },
    Interior { left: usize, right: usize },
}

/// Node of the temporary tree. Children are addressed by index.
struct BuildNode {
    bounds: Aabb,
    kind: BuildKind,
}

impl BuildNode {
    fn pending() -> Self {
        Self {
            bounds: Aabb::EMPTY,
            kind: BuildKind::Leaf { start: 0, end: 0 },
        }
    }
}

struct BuildTask {
    node: usize,
    start: usize,
    end: usize,
    depth: usize,
}

impl TriangleBvh {
    /// Build a hierarchy over `triangles`.
    ///
    /// Degenerate triangles (zero area or non-finite vertices) are dropped;
    /// they could never be hit anyway. An input without any usable triangle
    /// yields an empty hierarchy that never reports a hit.
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut prims: Vec<BuildPrimitive> = triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| !tri.is_degenerate())
            .map(|(index, tri)| BuildPrimitive {
                bounds: tri.bounds(),
                centroid: tri.centroid(),
                index: index as u32,
            })
            .collect();

        let dropped = triangles.len() - prims.len();
        if dropped > 0 {
            log::debug!("BVH build dropped {} degenerate triangles", dropped);
        }
        if prims.is_empty() {
            return Self {
                nodes: Vec::new(),
                primitives: Vec::new(),
                infos: Vec::new(),
                area_table: None,
                world_bound: Aabb::EMPTY,
                depth: 0,
            };
        }

        let (tree, depth) = build_tree(&mut prims);
        let bvh = compact(&tree, &prims, triangles, depth);

        log::info!(
            "Built BVH: {} triangles, {} nodes, depth {}",
            bvh.primitives.len(),
            bvh.nodes.len(),
            bvh.depth
        );
        bvh
    }
}

/// Partition `prims` in place into a temporary tree.
///
/// Returns the nodes (root at index 0) and the maximum depth reached.
fn build_tree(prims: &mut [BuildPrimitive]) -> (Vec<BuildNode>, usize) {
    let mut nodes = vec![BuildNode::pending()];
    let mut queue = VecDeque::new();
    queue.push_back(BuildTask {
        node: 0,
        start: 0,
        end: prims.len(),
        depth: 0,
    });
    let mut max_depth = 0;

    while let Some(task) = queue.pop_front() {
        max_depth = max_depth.max(task.depth);
        let slice = &mut prims[task.start..task.end];

        let bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, p| Aabb::surrounding(&acc, &p.bounds));
        let centroid_bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, p| acc.include_point(p.centroid));
        let axis = centroid_bounds.longest_axis();
        let extent = centroid_bounds.axis_interval(axis);

        if slice.len() <= LEAF_SIZE_THRESHOLD || extent.size() <= 0.0 {
            nodes[task.node] = BuildNode {
                bounds,
                kind: BuildKind::Leaf {
                    start: task.start,
                    end: task.end,
                },
            };
            continue;
        }

        let split = split_primitives(slice, axis, extent.center(), task.depth);

        let left = nodes.len();
        let right = left + 1;
        nodes.push(BuildNode::pending());
        nodes.push(BuildNode::pending());
        nodes[task.node] = BuildNode {
            bounds,
            kind: BuildKind::Interior { left, right },
        };

        queue.push_back(BuildTask {
            node: left,
            start: task.start,
            end: task.start + split,
            depth: task.depth + 1,
        });
        queue.push_back(BuildTask {
            node: right,
            start: task.start + split,
            end: task.end,
            depth: task.depth + 1,
        });
    }

    (nodes, max_depth)
}

/// Reorder `prims` so that `[0, split)` goes left and `[split, len)` goes right.
///
/// Uses a single scan-and-swap around the centroid midpoint when shallow
/// enough; falls back to a median split when that is too deep or would put
/// every primitive on one side.
fn split_primitives(prims: &mut [BuildPrimitive], axis: usize, mid: f32, depth: usize) -> usize {
    if depth < MIDPOINT_SPLIT_DEPTH {
        let mut i = 0;
        let mut j = prims.len();
        while i < j {
            if prims[i].centroid[axis] < mid {
                i += 1;
            } else {
                j -= 1;
                prims.swap(i, j);
            }
        }
        if i != 0 && i != prims.len() {
            return i;
        }
    }

    let half = prims.len() / 2;
    prims.select_nth_unstable_by(half, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
    half
}

/// Flatten the temporary tree depth-first into the final node array.
fn compact(
    tree: &[BuildNode],
    prims: &[BuildPrimitive],
    triangles: &[Triangle],
    depth: usize,
) -> TriangleBvh {
    let mut nodes: Vec<BvhNode> = Vec::with_capacity(tree.len());
    let mut primitives = Vec::with_capacity(prims.len());
    let mut infos = Vec::with_capacity(prims.len());
    let mut areas = Vec::with_capacity(prims.len());

    // (tree node, flat index of the parent whose right link points here)
    let mut stack: Vec<(usize, Option<usize>)> = vec![(0, None)];
    while let Some((tree_index, parent)) = stack.pop() {
        let slot = nodes.len();
        if let Some(parent) = parent {
            nodes[parent].end_or_right = slot as u32;
        }

        let node = &tree[tree_index];
        match node.kind {
            BuildKind::Leaf { start, end } => {
                let first = primitives.len();
                for prim in &prims[start..end] {
                    let tri = &triangles[prim.index as usize];
                    let [a, b, c] = tri.positions();
                    primitives.push(BvhPrimitive { a, b, c });
                    infos.push(primitive_info(tri, prim.index));
                    areas.push(tri.area());
                }
                nodes.push(BvhNode::leaf(&node.bounds, first, primitives.len()));
            }
            BuildKind::Interior { left, right } => {
                nodes.push(BvhNode::interior(&node.bounds));
                // Right first so the left child is popped next and lands in slot + 1.
                stack.push((right, Some(slot)));
                stack.push((left, None));
            }
        }
    }

    TriangleBvh {
        world_bound: tree[0].bounds,
        nodes,
        primitives,
        infos,
        area_table: Distribution1D::new(&areas),
        depth,
    }
}

/// Precompute interpolation deltas and the geometry frame of a triangle.
///
/// The frame normal is the face normal flipped toward the mean vertex
/// normal; the tangent follows the texture `u` direction, or the first edge
/// when the UV mapping is degenerate.
fn primitive_info(tri: &Triangle, source: u32) -> PrimitiveInfo {
    let [a, b, c] = tri.vertices;
    let ab = b.position - a.position;
    let ac = c.position - a.position;

    let mut z = ab.cross(ac).normalize();
    if z.dot(a.normal + b.normal + c.normal) < 0.0 {
        z = -z;
    }

    let duv1 = b.uv - a.uv;
    let duv2 = c.uv - a.uv;
    let det = duv1.x * duv2.y - duv1.y * duv2.x;
    let geometry = if det.abs() > 1e-8 {
        let dpdu = (ab * duv2.y - ac * duv1.y) / det;
        Frame::from_z_x(z, dpdu)
    } else {
        Frame::from_z_x(z, ab)
    };

    PrimitiveInfo {
        normal_a: a.normal,
        normal_ab: b.normal - a.normal,
        normal_ac: c.normal - a.normal,
        uv_a: a.uv,
        uv_ab: duv1,
        uv_ac: duv2,
        geometry,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prim_at(x: f32, index: u32) -> BuildPrimitive {
        let c = Vec3::new(x, 0.0, 0.0);
        BuildPrimitive {
            bounds: Aabb::from_points(c, c),
            centroid: c,
            index,
        }
    }

    #[test]
    fn test_midpoint_split() {
        let mut prims: Vec<_> = [0.0, 9.0, 1.0, 8.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, x)| prim_at(*x, i as u32))
            .collect();
        let split = split_primitives(&mut prims, 0, 4.5, 0);
        assert_eq!(split, 3);
        assert!(prims[..split].iter().all(|p| p.centroid.x < 4.5));
        assert!(prims[split..].iter().all(|p| p.centroid.x >= 4.5));
    }

    #[test]
    fn test_degenerate_midpoint_falls_back_to_median() {
        // Every centroid is below the midpoint, so the scan puts all on the left.
        let mut prims: Vec<_> = (0..8).map(|i| prim_at(i as f32, i)).collect();
        let split = split_primitives(&mut prims, 0, 100.0, 0);
        assert_eq!(split, 4);
        let max_left = prims[..4].iter().map(|p| p.centroid.x).fold(f32::MIN, f32::max);
        let min_right = prims[4..].iter().map(|p| p.centroid.x).fold(f32::MAX, f32::min);
        assert!(max_left <= min_right);
    }

    #[test]
    fn test_deep_levels_use_median() {
        let mut prims: Vec<_> = [0.0, 0.1, 0.2, 0.3, 10.0, 10.1]
            .iter()
            .enumerate()
            .map(|(i, x)| prim_at(*x, i as u32))
            .collect();
        let split = split_primitives(&mut prims, 0, 5.05, MIDPOINT_SPLIT_DEPTH);
        assert_eq!(split, 3);
    }

    #[test]
    fn test_build_tree_root_covers_everything() {
        let mut prims: Vec<_> = (0..40).map(|i| prim_at(i as f32, i)).collect();
        let (tree, depth) = build_tree(&mut prims);
        assert!(depth >= 3);
        assert_eq!(tree[0].bounds.x.min, 0.0);
        assert_eq!(tree[0].bounds.x.max, 39.0);
        let leaf_total: usize = tree
            .iter()
            .map(|n| match n.kind {
                BuildKind::Leaf { start, end } => end - start,
                BuildKind::Interior { .. } => 0,
            })
            .sum();
        assert_eq!(leaf_total, 40);
    }
}
