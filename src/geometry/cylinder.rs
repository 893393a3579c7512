use bytemuck::{Pod, Zeroable};

/// Interleaved position + normal, matching the vertex buffer layout in
/// `renderer::gpu`.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

pub struct CylinderMesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl CylinderMesh {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Builds a closed unit-height cylinder (y in [0, 1]) centered on the y axis:
/// two fan-triangulated caps plus a ruled side wall, `tessellation` vertices
/// around the circumference.
///
/// Caps and wall do not share vertices (the normals differ), so the output
/// holds exactly `4 * tessellation` vertices. Inputs are caller-trusted:
/// a tessellation below 3 yields degenerate geometry, not an error.
pub fn cylinder(tessellation: u32, radius: f32) -> CylinderMesh {
    let n = tessellation;
    let mut vertices = Vec::with_capacity(4 * n as usize);
    let mut indices = Vec::new();

    let angle = |i: u32| 2.0 * std::f32::consts::PI * i as f32 / n as f32;

    // Bottom cap, fanned from the first perimeter vertex.
    for i in 0..n {
        let a = angle(i);
        vertices.push(Vertex {
            position: [radius * a.cos(), 0.0, radius * a.sin()],
            normal: [0.0, -1.0, 0.0],
        });
        if i + 2 < n {
            indices.extend_from_slice(&[0, i + 1, i + 2]);
        }
    }

    // Top cap, same fan offset by one ring.
    for i in 0..n {
        let a = angle(i);
        vertices.push(Vertex {
            position: [radius * a.cos(), 1.0, radius * a.sin()],
            normal: [0.0, 1.0, 0.0],
        });
        if i + 2 < n {
            indices.extend_from_slice(&[n, n + i + 1, n + i + 2]);
        }
    }

    // Side wall: two rings with radial normals.
    for y in [0.0, 1.0] {
        for i in 0..n {
            let a = angle(i);
            vertices.push(Vertex {
                position: [radius * a.cos(), y, radius * a.sin()],
                normal: [a.cos(), 0.0, a.sin()],
            });
        }
    }

    let lower = 2 * n;
    let upper = 3 * n;
    for i in 0..n.saturating_sub(1) {
        indices.extend_from_slice(&[lower + i, lower + i + 1, upper + i + 1]);
        indices.extend_from_slice(&[lower + i, upper + i + 1, upper + i]);
    }

    // Close the loop: stitch the last column back to the first.
    if n > 0 {
        indices.extend_from_slice(&[lower + n - 1, lower, upper]);
        indices.extend_from_slice(&[lower + n - 1, upper, upper + n - 1]);
    }

    CylinderMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len(v: [f32; 3]) -> f32 {
        (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
    }

    #[test]
    fn vertex_and_triangle_counts() {
        for n in [3u32, 4, 15, 64] {
            let mesh = cylinder(n, 0.1);
            assert_eq!(mesh.vertices.len(), 4 * n as usize);

            // bottom fan + top fan + side quads + wraparound pair
            let triangles = (n - 2) + (n - 2) + 2 * (n - 1) + 2;
            assert_eq!(mesh.indices.len(), 3 * triangles as usize, "n = {n}");
        }
    }

    #[test]
    fn indices_stay_in_bounds() {
        for n in [3u32, 15, 33] {
            let mesh = cylinder(n, 1.0);
            let count = mesh.vertices.len() as u32;
            assert!(mesh.indices.iter().all(|&i| i < count));
        }
    }

    #[test]
    fn normals_are_unit_length() {
        let mesh = cylinder(15, 0.1);
        for v in &mesh.vertices {
            assert!((len(v.normal) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn positions_lie_on_the_radius() {
        let mesh = cylinder(20, 0.25);
        for v in &mesh.vertices {
            let r = (v.position[0] * v.position[0] + v.position[2] * v.position[2]).sqrt();
            assert!((r - 0.25).abs() < 1e-5);
            assert!(v.position[1] == 0.0 || v.position[1] == 1.0);
        }
    }

    #[test]
    fn cap_normals_point_along_y() {
        let n = 8usize;
        let mesh = cylinder(n as u32, 0.5);
        for v in &mesh.vertices[..n] {
            assert_eq!(v.normal, [0.0, -1.0, 0.0]);
        }
        for v in &mesh.vertices[n..2 * n] {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn degenerate_tessellation_does_not_panic() {
        let mesh = cylinder(2, 0.1);
        assert_eq!(mesh.vertices.len(), 8);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
    }
}
