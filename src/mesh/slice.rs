use glam::{Quat, Vec2, Vec3};

/// UV assigned to the apex vertex that closes a branch tip.
pub const CAP_UV: Vec2 = Vec2::new(0.5, 1.0);

/// Vertices of one cross-section of a branch, ready to append to a
/// [`MeshBuffers`](super::MeshBuffers).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeSlice {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub tangents: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
}

impl TreeSlice {
    /// Ring of `sides + 1` vertices around `center` in the plane orthogonal
    /// to `axis`. The last vertex duplicates the first position with `u = 1`
    /// so the texture seam closes. `jitter_degrees` rotates the whole ring
    /// about `axis`.
    pub fn ring(center: Vec3, axis: Vec3, radius: f32, sides: usize, jitter_degrees: f32, v: f32) -> Self {
        let axis = axis.try_normalize().unwrap_or(Vec3::Y);
        let reference = reference_vector(axis);
        let step = 360.0 / sides as f32;

        let mut slice = Self::with_capacity(sides + 1);
        for i in 0..=sides {
            let angle = (jitter_degrees + i as f32 * step).to_radians();
            let outward = Quat::from_axis_angle(axis, angle) * reference;
            let tangent = Quat::from_axis_angle(axis, angle + std::f32::consts::FRAC_PI_2) * reference;

            slice.positions.push(center + outward * radius);
            slice.normals.push(outward);
            slice.tangents.push(tangent);
            slice.uvs.push(Vec2::new(i as f32 / sides as f32, v));
        }
        slice
    }

    /// Single vertex closing a branch tip.
    pub fn apex(position: Vec3, direction: Vec3) -> Self {
        let direction = direction.try_normalize().unwrap_or(Vec3::Y);
        Self {
            positions: vec![position],
            normals: vec![direction],
            tangents: vec![reference_vector(direction)],
            uvs: vec![CAP_UV],
        }
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            normals: Vec::with_capacity(capacity),
            tangents: Vec::with_capacity(capacity),
            uvs: Vec::with_capacity(capacity),
        }
    }
}

/// Unit vector orthogonal to `axis`: `axis × Z`, or `axis × X` when the axis
/// is parallel to Z.
pub fn reference_vector(axis: Vec3) -> Vec3 {
    axis.cross(Vec3::Z)
        .try_normalize()
        .or_else(|| axis.cross(Vec3::X).try_normalize())
        .unwrap_or(Vec3::X)
}
