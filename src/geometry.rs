use std::f32::consts::{PI, TAU};

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use id_arena::Id;
use itertools::iproduct;

pub type GeometryId = Id<Geometry>;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coords: Vec2,
}

impl Vertex {
    fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }
}

/// Indexed triangle list, counter-clockwise front faces.
pub struct Geometry {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        let half = Vec3::new(width, height, depth) * 0.5;

        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);

        for (normal, u, v) in faces {
            let first = vertices.len() as u32;

            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * half;
                let tex_coords = Vec2::new((su + 1.0) * 0.5, 1.0 - (sv + 1.0) * 0.5);
                vertices.push(Vertex::new(position, normal, tex_coords));
            }

            indices.extend_from_slice(&[first, first + 1, first + 2, first, first + 2, first + 3]);
        }

        Self {
            name: format!("Box {}x{}x{}", width, height, depth),
            vertices,
            indices,
        }
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let vertices = iproduct!(0..=height_segments, 0..=width_segments)
            .map(|(iy, ix)| {
                let u = ix as f32 / width_segments as f32;
                let v = iy as f32 / height_segments as f32;
                let theta = u * TAU;
                let phi = v * PI;

                let normal = Vec3::new(
                    -theta.cos() * phi.sin(),
                    phi.cos(),
                    theta.sin() * phi.sin(),
                );

                Vertex::new(normal * radius, normal, Vec2::new(u, 1.0 - v))
            })
            .collect();

        let row = width_segments + 1;
        let mut indices = Vec::new();

        for (iy, ix) in iproduct!(0..height_segments, 0..width_segments) {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            // The poles collapse to a single point, so skip their degenerate halves.
            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }

        Self {
            name: format!("Sphere r={}", radius),
            vertices,
            indices,
        }
    }

    /// Ring in the XY plane around the Z axis.
    pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> Self {
        let radial_segments = radial_segments.max(3);
        let tubular_segments = tubular_segments.max(3);

        let vertices = iproduct!(0..=radial_segments, 0..=tubular_segments)
            .map(|(j, i)| {
                let u = i as f32 / tubular_segments as f32 * TAU;
                let v = j as f32 / radial_segments as f32 * TAU;

                let position = Vec3::new(
                    (radius + tube * v.cos()) * u.cos(),
                    (radius + tube * v.cos()) * u.sin(),
                    tube * v.sin(),
                );
                let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
                let normal = (position - center).normalize();

                let tex_coords = Vec2::new(
                    i as f32 / tubular_segments as f32,
                    j as f32 / radial_segments as f32,
                );

                Vertex::new(position, normal, tex_coords)
            })
            .collect();

        let row = tubular_segments + 1;
        let indices = iproduct!(1..=radial_segments, 1..=tubular_segments)
            .flat_map(|(j, i)| {
                let a = row * j + i - 1;
                let b = row * (j - 1) + i - 1;
                let c = row * (j - 1) + i;
                let d = row * j + i;
                [a, b, d, b, c, d]
            })
            .collect();

        Self {
            name: format!("Torus r={} tube={}", radius, tube),
            vertices,
            indices,
        }
    }

    /// Single quad in the XY plane facing +Z.
    pub fn plane(width: f32, height: f32) -> Self {
        let vertices = iproduct!(0..=1u32, 0..=1u32)
            .map(|(iy, ix)| {
                let x = ix as f32 * width - width * 0.5;
                let y = height * 0.5 - iy as f32 * height;
                Vertex::new(
                    Vec3::new(x, y, 0.0),
                    Vec3::Z,
                    Vec2::new(ix as f32, iy as f32),
                )
            })
            .collect();

        // 0 --- 1
        // |     |
        // 2 --- 3
        let indices = vec![0, 2, 1, 2, 3, 1];

        Self {
            name: format!("Plane {}x{}", width, height),
            vertices,
            indices,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_front_faces_point_along_normals(geometry: &Geometry) {
        for triangle in geometry.indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|k| geometry.vertices[triangle[k] as usize]);
            let face_normal = (b.position - a.position).cross(c.position - a.position);

            if face_normal.length_squared() < 1e-12 {
                continue;
            }

            let vertex_normals = a.normal + b.normal + c.normal;
            assert!(
                face_normal.dot(vertex_normals) > 0.0,
                "{} has a triangle wound against its normals",
                geometry.name
            );
        }
    }

    #[test]
    fn cuboid_has_four_vertices_per_face() {
        let geometry = Geometry::cuboid(0.75, 0.75, 0.75);
        assert_eq!(geometry.vertices.len(), 24);
        assert_eq!(geometry.triangle_count(), 12);

        for vertex in &geometry.vertices {
            assert_eq!(vertex.position.abs(), Vec3::splat(0.375));
        }

        assert_front_faces_point_along_normals(&geometry);
    }

    #[test]
    fn sphere_skips_degenerate_pole_triangles() {
        let geometry = Geometry::sphere(1.0, 8, 6);
        assert_eq!(geometry.vertices.len(), 9 * 7);
        assert_eq!(geometry.triangle_count(), 8 * (2 * 6 - 2));

        for vertex in &geometry.vertices {
            assert!((vertex.position.length() - 1.0).abs() < 1e-5);
        }

        assert_front_faces_point_along_normals(&geometry);
    }

    #[test]
    fn torus_stays_within_tube() {
        let geometry = Geometry::torus(0.3, 0.2, 32, 64);
        assert_eq!(geometry.vertices.len(), 33 * 65);
        assert_eq!(geometry.triangle_count(), 32 * 64 * 2);

        for vertex in &geometry.vertices {
            let ring_distance = Vec2::new(vertex.position.x, vertex.position.y).length();
            let to_tube = Vec2::new(ring_distance - 0.3, vertex.position.z).length();
            assert!((to_tube - 0.2).abs() < 1e-5);
        }

        assert_front_faces_point_along_normals(&geometry);
    }

    #[test]
    fn plane_faces_positive_z() {
        let geometry = Geometry::plane(5.0, 5.0);
        assert_eq!(geometry.vertices.len(), 4);
        assert_eq!(geometry.triangle_count(), 2);
        assert_front_faces_point_along_normals(&geometry);
    }
}
