//! Iterative BVH traversal.

use strata_math::{Ray, Vec3};

use super::{TriangleBvh, TRAVERSAL_STACK_SIZE};
use crate::intersection::SurfaceIntersection;
use crate::triangle::{TriangleHit, WatertightRay};

/// Node stack with inline storage that spills to the heap when full.
struct TraversalStack {
    inline: [u32; TRAVERSAL_STACK_SIZE],
    len: usize,
    spill: Vec<u32>,
}

impl TraversalStack {
    fn new() -> Self {
        Self {
            inline: [0; TRAVERSAL_STACK_SIZE],
            len: 0,
            spill: Vec::new(),
        }
    }

    #[inline]
    fn push(&mut self, node: u32) {
        if self.len < TRAVERSAL_STACK_SIZE {
            self.inline[self.len] = node;
            self.len += 1;
        } else {
            self.spill.push(node);
        }
    }

    #[inline]
    fn pop(&mut self) -> Option<u32> {
        if let Some(node) = self.spill.pop() {
            return Some(node);
        }
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.inline[self.len])
    }
}

impl TriangleBvh {
    #[inline]
    fn node_entry(&self, index: usize, origin: Vec3, inv_dir: Vec3, t_min: f32, t_max: f32) -> Option<f32> {
        self.nodes[index].bounds().hit(origin, inv_dir, t_min, t_max)
    }

    /// Any-hit query: true as soon as one triangle is hit inside the ray range.
    pub fn has_intersection(&self, ray: &Ray) -> bool {
        if self.nodes.is_empty() {
            return false;
        }
        let inv_dir = ray.direction.recip();
        let tri_ray = WatertightRay::new(ray);
        if self.node_entry(0, ray.origin, inv_dir, ray.t_min, ray.t_max).is_none() {
            return false;
        }

        let mut stack = TraversalStack::new();
        stack.push(0);
        while let Some(index) = stack.pop() {
            let index = index as usize;
            let node = &self.nodes[index];
            if node.is_leaf() {
                for p in node.primitive_range() {
                    let prim = &self.primitives[p];
                    if tri_ray.intersect(prim.a, prim.b, prim.c, ray.t_max).is_some() {
                        return true;
                    }
                }
                continue;
            }

            let left = index + 1;
            let right = node.right_child();
            if self.node_entry(right, ray.origin, inv_dir, ray.t_min, ray.t_max).is_some() {
                stack.push(right as u32);
            }
            if self.node_entry(left, ray.origin, inv_dir, ray.t_min, ray.t_max).is_some() {
                stack.push(left as u32);
            }
        }
        false
    }

    /// Closest-hit query.
    ///
    /// The nearer child is visited first and the far bound shrinks with every
    /// hit, so subtrees behind the current closest hit are skipped.
    pub fn closest_intersection(&self, ray: &Ray) -> Option<SurfaceIntersection> {
        if self.nodes.is_empty() {
            return None;
        }
        let inv_dir = ray.direction.recip();
        let tri_ray = WatertightRay::new(ray);
        let mut t_max = ray.t_max;
        self.node_entry(0, ray.origin, inv_dir, ray.t_min, t_max)?;

        let mut closest: Option<(usize, TriangleHit)> = None;
        let mut stack = TraversalStack::new();
        stack.push(0);
        while let Some(index) = stack.pop() {
            let index = index as usize;
            let node = &self.nodes[index];
            if node.is_leaf() {
                for p in node.primitive_range() {
                    let prim = &self.primitives[p];
                    if let Some(hit) = tri_ray.intersect(prim.a, prim.b, prim.c, t_max) {
                        t_max = hit.t;
                        closest = Some((p, hit));
                    }
                }
                continue;
            }

            let left = index + 1;
            let right = node.right_child();
            let t_left = self.node_entry(left, ray.origin, inv_dir, ray.t_min, t_max);
            let t_right = self.node_entry(right, ray.origin, inv_dir, ray.t_min, t_max);
            match (t_left, t_right) {
                (Some(tl), Some(tr)) => {
                    // Nearer child last so it is popped first.
                    if tl <= tr {
                        stack.push(right as u32);
                        stack.push(left as u32);
                    } else {
                        stack.push(left as u32);
                        stack.push(right as u32);
                    }
                }
                (Some(_), None) => stack.push(left as u32),
                (None, Some(_)) => stack.push(right as u32),
                (None, None) => {}
            }
        }

        closest.map(|(p, hit)| self.surface_intersection(ray, p, hit))
    }

    fn surface_intersection(&self, ray: &Ray, p: usize, hit: TriangleHit) -> SurfaceIntersection {
        let prim = &self.primitives[p];
        let info = &self.infos[p];
        let position = prim.a + (prim.b - prim.a) * hit.b1 + (prim.c - prim.a) * hit.b2;
        let shading = info.geometry.rotate_to_new_z(info.normal_at(hit.b1, hit.b2));
        SurfaceIntersection {
            position,
            geometry: info.geometry,
            shading,
            uv: info.uv_at(hit.b1, hit.b2),
            wr: -ray.direction.normalize(),
            t: hit.t,
            entity: 0,
            primitive: p,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_spills_and_stays_lifo() {
        let mut stack = TraversalStack::new();
        let count = (TRAVERSAL_STACK_SIZE * 3) as u32;
        for i in 0..count {
            stack.push(i);
        }
        for i in (0..count).rev() {
            assert_eq!(stack.pop(), Some(i));
        }
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_stack_interleaved_after_spill() {
        let mut stack = TraversalStack::new();
        for i in 0..TRAVERSAL_STACK_SIZE as u32 {
            stack.push(i);
        }
        stack.push(1000);
        assert_eq!(stack.pop(), Some(1000));
        stack.push(2000);
        stack.push(3000);
        assert_eq!(stack.pop(), Some(3000));
        assert_eq!(stack.pop(), Some(2000));
        assert_eq!(stack.pop(), Some(TRAVERSAL_STACK_SIZE as u32 - 1));
    }
}
