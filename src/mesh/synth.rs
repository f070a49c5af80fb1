use glam::Vec3;
use log::debug;
use serde::Deserialize;

use super::buffers::MeshBuffers;
use super::slice::TreeSlice;
use crate::error::ConfigError;
use crate::random::RandomSource;
use crate::skeleton::{NodeId, Skeleton};

/// Minimum cosine for a pass-through node to count as straight.
const COLINEAR_COSINE: f32 = 1.0 - 1e-5;
const RADIUS_EPSILON: f32 = 1e-6;

/// Parameters for mesh synthesis
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct MeshParams {
    /// Vertices around each ring, not counting the seam duplicate
    pub sides: usize,
    /// Texture repeats per unit of branch length
    pub uv_length_scale: f32,
    /// Largest random twist applied to a node's rings (degrees)
    pub ring_jitter_degrees: f32,
    /// Emit no ring at straight pass-through nodes of constant radius
    pub merge_colinear_rings: bool,
}

impl Default for MeshParams {
    fn default() -> Self {
        Self {
            sides: 8,
            uv_length_scale: 1.0,
            ring_jitter_degrees: 0.5,
            merge_colinear_rings: true,
        }
    }
}

impl MeshParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sides < 3 {
            return Err(ConfigError::parameter("sides", format!("must be >= 3, got {}", self.sides)));
        }
        if !self.uv_length_scale.is_finite() {
            return Err(ConfigError::parameter("uv_length_scale", "must be finite"));
        }
        if !self.ring_jitter_degrees.is_finite() || self.ring_jitter_degrees < 0.0 {
            return Err(ConfigError::parameter("ring_jitter_degrees", "must be finite and >= 0"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    /// Childless node closed by a single apex vertex
    Tip,
    /// One ring per child
    Rings,
    /// Straight pass-through; the child reuses the incoming ring
    Merged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct NodePlan {
    role: Role,
    first_vertex: u32,
    incoming_ring: Option<u32>,
    arc_length: f32,
}

/// Result of the counting pass: buffer sizes plus where each node's
/// vertices start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshLayout {
    pub vertex_count: usize,
    pub triangle_count: usize,
    order: Vec<NodeId>,
    plans: Vec<Option<NodePlan>>,
}

impl MeshLayout {
    /// Buffer index of the first vertex emitted for `id`. `None` for nodes
    /// whose ring was merged away.
    pub fn vertex_start(&self, id: NodeId) -> Option<u32> {
        self.plans
            .get(id.index())
            .copied()
            .flatten()
            .filter(|plan| plan.role != Role::Merged)
            .map(|plan| plan.first_vertex)
    }
}

/// Sweeps rings along a skeleton and stitches them into a closed surface.
pub struct MeshSynthesizer {
    params: MeshParams,
}

impl MeshSynthesizer {
    pub fn new(params: MeshParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &MeshParams {
        &self.params
    }

    /// Count vertices and triangles without emitting geometry.
    pub fn layout(&self, skeleton: &Skeleton) -> MeshLayout {
        let sides = self.params.sides as u32;
        let ring_len = sides + 1;
        let mut plans: Vec<Option<NodePlan>> = vec![None; skeleton.len()];
        let mut order = Vec::with_capacity(skeleton.len());
        let mut vertices = 0u32;
        let mut triangles = 0usize;

        for id in skeleton.breadth_first() {
            let node = skeleton.node(id);
            let parent = skeleton
                .parent(id)
                .and_then(|parent| plans[parent.index()].map(|plan| (parent, plan)));

            let (incoming_ring, arc_length) = match parent {
                Some((parent, plan)) => {
                    let ring = match plan.role {
                        Role::Merged => plan.incoming_ring,
                        _ => Some(plan.first_vertex + skeleton.child_order(id) as u32 * ring_len),
                    };
                    let step = node.position.distance(skeleton.node(parent).position);
                    (ring, plan.arc_length + step)
                }
                None => (None, 0.0),
            };

            let role = if node.children.is_empty() {
                Role::Tip
            } else if self.params.merge_colinear_rings && is_pass_through(skeleton, id) {
                Role::Merged
            } else {
                Role::Rings
            };

            let (emitted, stitched) = match role {
                Role::Tip => (1, sides),
                Role::Rings => (node.children.len() as u32 * ring_len, 2 * sides),
                Role::Merged => (0, 0),
            };
            if incoming_ring.is_some() {
                triangles += stitched as usize;
            }

            plans[id.index()] = Some(NodePlan {
                role,
                first_vertex: vertices,
                incoming_ring,
                arc_length,
            });
            vertices += emitted;
            order.push(id);
        }

        MeshLayout {
            vertex_count: vertices as usize,
            triangle_count: triangles,
            order,
            plans,
        }
    }

    /// Mesh for `skeleton` in fresh buffers.
    pub fn synthesize(&self, skeleton: &Skeleton, rng: &mut dyn RandomSource) -> MeshBuffers {
        let mut buffers = MeshBuffers::new();
        self.synthesize_into(skeleton, rng, &mut buffers);
        buffers
    }

    /// Replace the contents of `out` with the mesh for `skeleton`. Ring
    /// jitter is drawn from `rng` once per ring-emitting node.
    pub fn synthesize_into(
        &self,
        skeleton: &Skeleton,
        rng: &mut dyn RandomSource,
        out: &mut MeshBuffers,
    ) -> MeshLayout {
        let params = &self.params;
        let sides = params.sides as u32;
        let ring_len = sides + 1;

        let layout = self.layout(skeleton);
        out.clear();
        out.reserve(layout.vertex_count, layout.triangle_count);

        for &id in &layout.order {
            let Some(plan) = layout.plans[id.index()] else {
                continue;
            };
            let node = skeleton.node(id);

            match plan.role {
                Role::Merged => {}
                Role::Tip => {
                    let apex = out.add_slice(&TreeSlice::apex(node.position, skeleton.incoming_direction(id)));
                    if let Some(ring) = plan.incoming_ring {
                        out.add_fan(ring, sides, apex);
                    }
                }
                Role::Rings => {
                    let jitter = rng.range(-params.ring_jitter_degrees, params.ring_jitter_degrees);
                    let v = plan.arc_length * params.uv_length_scale;
                    for slot in 0..node.children.len() {
                        out.add_slice(&TreeSlice::ring(
                            node.position,
                            ring_normal(skeleton, id, slot),
                            ring_radius(skeleton, id, slot),
                            params.sides,
                            jitter,
                            v,
                        ));
                    }
                    if let (Some(ring), Some(slot)) = (plan.incoming_ring, skeleton.most_colinear_child(id)) {
                        out.add_band(ring, plan.first_vertex + slot as u32 * ring_len, sides);
                    }
                }
            }
        }

        debug_assert_eq!(out.vertex_count(), layout.vertex_count);
        debug_assert_eq!(out.triangle_count(), layout.triangle_count);
        debug!(
            "synthesized {} vertices, {} triangles from {} nodes",
            layout.vertex_count,
            layout.triangle_count,
            skeleton.len()
        );
        layout
    }
}

/// A non-root node with one child that continues straight on at the same
/// radius as both neighbours.
fn is_pass_through(skeleton: &Skeleton, id: NodeId) -> bool {
    let (Some(parent), [child]) = (skeleton.parent(id), skeleton.children(id)) else {
        return false;
    };
    let radius = skeleton.node(id).radius;
    let straight = skeleton.incoming_direction(id).dot(skeleton.child_direction(id, 0)) >= COLINEAR_COSINE;

    straight
        && (skeleton.node(parent).radius - radius).abs() <= RADIUS_EPSILON
        && (skeleton.node(*child).radius - radius).abs() <= RADIUS_EPSILON
}

/// Plane normal of the ring at `id` leading to its `slot`-th child: the
/// child direction for the root, otherwise bent towards the incoming
/// direction in proportion to how straight the joint is.
fn ring_normal(skeleton: &Skeleton, id: NodeId, slot: usize) -> Vec3 {
    let outgoing = skeleton.child_direction(id, slot);
    if skeleton.parent(id).is_none() {
        return outgoing;
    }
    let incoming = skeleton.incoming_direction(id);
    let cosine = incoming.dot(outgoing).max(0.0);
    (outgoing + incoming * cosine).try_normalize().unwrap_or(outgoing)
}

fn ring_radius(skeleton: &Skeleton, id: NodeId, slot: usize) -> f32 {
    let node = skeleton.node(id);
    if skeleton.parent(id).is_none() {
        return node.radius;
    }
    let child = skeleton.children(id)[slot];
    (node.radius + skeleton.node(child).radius) / 2.0
}
