//! Triangle Bounding Volume Hierarchy (BVH).
//!
//! The tree is built top-down from a work queue into an index-linked
//! temporary tree, then compacted depth-first into one flat node array:
//! the left child of an interior node is always the next slot, the right
//! child index is stored in the node. Triangles are copied into a
//! BVH-owned array reordered so that every leaf covers a contiguous range.
//!
//! Once built the hierarchy is immutable and shared freely across threads.

mod build;
mod traverse;

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use strata_math::{sampling, Aabb, Distribution1D, Frame, Vec2, Vec3};

use crate::intersection::SurfacePoint;

/// Leaves hold at most this many triangles unless their centroids coincide.
pub const LEAF_SIZE_THRESHOLD: usize = 5;

/// Inline capacity of the traversal stack. Deeper trees spill to the heap.
pub const TRAVERSAL_STACK_SIZE: usize = 128;

/// One node of the flat hierarchy.
///
/// Interior nodes have `start == BvhNode::INTERIOR` and store the index of
/// their right child in `end_or_right`; leaves store the primitive range
/// `[start, end_or_right)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BvhNode {
    pub low: [f32; 3],
    pub high: [f32; 3],
    pub start: u32,
    pub end_or_right: u32,
}

impl BvhNode {
    /// Sentinel start index marking an interior node.
    pub const INTERIOR: u32 = u32::MAX;

    fn leaf(bounds: &Aabb, start: usize, end: usize) -> Self {
        Self {
            low: bounds.low().to_array(),
            high: bounds.high().to_array(),
            start: start as u32,
            end_or_right: end as u32,
        }
    }

    fn interior(bounds: &Aabb) -> Self {
        Self {
            low: bounds.low().to_array(),
            high: bounds.high().to_array(),
            start: Self::INTERIOR,
            end_or_right: 0,
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.start != Self::INTERIOR
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(Vec3::from_array(self.low), Vec3::from_array(self.high))
    }

    /// Index of the right child. Only meaningful for interior nodes.
    #[inline]
    pub fn right_child(&self) -> usize {
        self.end_or_right as usize
    }

    /// Primitive range of a leaf. Empty for interior nodes.
    #[inline]
    pub fn primitive_range(&self) -> Range<usize> {
        if self.is_leaf() {
            self.start as usize..self.end_or_right as usize
        } else {
            0..0
        }
    }
}

/// Triangle positions as stored for intersection.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BvhPrimitive {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

/// Shading data precomputed per primitive during compaction.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PrimitiveInfo {
    pub normal_a: Vec3,
    pub normal_ab: Vec3,
    pub normal_ac: Vec3,
    pub uv_a: Vec2,
    pub uv_ab: Vec2,
    pub uv_ac: Vec2,
    pub geometry: Frame,
    pub source: u32,
}

impl PrimitiveInfo {
    #[inline]
    pub fn uv_at(&self, b1: f32, b2: f32) -> Vec2 {
        self.uv_a + self.uv_ab * b1 + self.uv_ac * b2
    }

    /// Interpolated vertex normal, or the face normal when the vertex
    /// normals cancel out.
    #[inline]
    pub fn normal_at(&self, b1: f32, b2: f32) -> Vec3 {
        let n = self.normal_a + self.normal_ab * b1 + self.normal_ac * b2;
        let len2 = n.length_squared();
        if len2 > 1e-12 && len2.is_finite() {
            n / len2.sqrt()
        } else {
            self.geometry.z
        }
    }
}

/// Flat triangle BVH answering closest-hit and any-hit queries.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    primitives: Vec<BvhPrimitive>,
    infos: Vec<PrimitiveInfo>,
    area_table: Option<Distribution1D>,
    world_bound: Aabb,
    depth: usize,
}

impl TriangleBvh {
    /// All nodes, root first.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Raw bytes of the node array.
    pub fn node_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.nodes)
    }

    /// Number of triangles kept after dropping degenerate input.
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Deepest level of the hierarchy, the root being level 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Vertex positions of the primitive at `index` in BVH order.
    pub fn primitive_vertices(&self, index: usize) -> [Vec3; 3] {
        let p = &self.primitives[index];
        [p.a, p.b, p.c]
    }

    /// Index of the input triangle the primitive at `index` came from.
    pub fn source_index(&self, index: usize) -> usize {
        self.infos[index].source as usize
    }

    pub fn world_bound(&self) -> Aabb {
        self.world_bound
    }

    /// Total area of all primitives.
    pub fn surface_area(&self) -> f32 {
        self.area_table.as_ref().map_or(0.0, |t| t.total())
    }

    /// Area-measure density of [`TriangleBvh::sample`].
    pub fn pdf_area(&self) -> f32 {
        match &self.area_table {
            Some(table) => 1.0 / table.total(),
            None => 0.0,
        }
    }

    /// Pick a point uniformly by area over all primitives.
    ///
    /// `sam.x` selects the triangle, `sam.y`/`sam.z` the point on it.
    /// Returns the point and its area-measure pdf.
    pub fn sample(&self, sam: Vec3) -> Option<(SurfacePoint, f32)> {
        let table = self.area_table.as_ref()?;
        let (index, _) = table.sample(sam.x);
        let (b1, b2) = sampling::uniform_triangle(Vec2::new(sam.y, sam.z));
        let prim = &self.primitives[index];
        let info = &self.infos[index];
        let position = prim.a + (prim.b - prim.a) * b1 + (prim.c - prim.a) * b2;
        let point = SurfacePoint {
            position,
            normal: info.geometry.z,
            uv: info.uv_at(b1, b2),
        };
        Some((point, 1.0 / table.total()))
    }
}
