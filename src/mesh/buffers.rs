use glam::{Vec2, Vec3};

use super::slice::TreeSlice;

/// Flat, index-addressable geometry handed to a renderer. All per-vertex
/// arrays have the same length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshBuffers {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Three indices per triangle, counter-clockwise seen from outside
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all geometry but keep the allocations.
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.tangents.clear();
        self.uvs.clear();
        self.indices.clear();
    }

    pub fn reserve(&mut self, vertices: usize, triangles: usize) {
        self.positions.reserve(vertices);
        self.normals.reserve(vertices);
        self.tangents.reserve(vertices);
        self.uvs.reserve(vertices);
        self.indices.reserve(triangles * 3);
    }

    /// Append one vertex and return its index.
    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3, tangent: Vec3, uv: Vec2) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position);
        self.normals.push(normal);
        self.tangents.push(tangent);
        self.uvs.push(uv);
        index
    }

    /// Append every vertex of `slice` and return the index of the first.
    pub fn add_slice(&mut self, slice: &TreeSlice) -> u32 {
        let start = self.positions.len() as u32;
        self.positions.extend_from_slice(&slice.positions);
        self.normals.extend_from_slice(&slice.normals);
        self.tangents.extend_from_slice(&slice.tangents);
        self.uvs.extend_from_slice(&slice.uvs);
        start
    }

    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Fan from consecutive ring vertices to a single apex.
    pub fn add_fan(&mut self, ring_start: u32, sides: u32, apex: u32) {
        for i in 0..sides {
            let a = ring_start + i;
            self.add_triangle(a, a + 1, apex);
        }
    }

    /// Band of quads (two triangles each) between two rings of `sides + 1`
    /// vertices.
    pub fn add_band(&mut self, lower_start: u32, upper_start: u32, sides: u32) {
        for i in 0..sides {
            let a = lower_start + i;
            let b = upper_start + i;
            self.add_triangle(a, a + 1, b);
            self.add_triangle(a + 1, b + 1, b);
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Centroid of all vertices and the largest distance from it.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        if self.positions.is_empty() {
            return (Vec3::ZERO, 0.0);
        }
        let center = self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32;
        let radius = self
            .positions
            .iter()
            .map(|p| p.distance(center))
            .fold(0.0f32, f32::max);
        (center, radius)
    }

    /// Layout: x, y, z per vertex
    pub fn position_data(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|v| v.to_array()).collect()
    }

    pub fn normal_data(&self) -> Vec<f32> {
        self.normals.iter().flat_map(|v| v.to_array()).collect()
    }

    pub fn tangent_data(&self) -> Vec<f32> {
        self.tangents.iter().flat_map(|v| v.to_array()).collect()
    }

    /// Layout: u, v per vertex
    pub fn uv_data(&self) -> Vec<f32> {
        self.uvs.iter().flat_map(|v| v.to_array()).collect()
    }
}
