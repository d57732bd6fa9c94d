use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;

use crate::model::{Aabb, Triangle};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    /// Zero for line vertices, which are drawn unlit.
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// CPU-side indexed geometry, either a triangle list or a line list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Flat-shaded triangle.
    pub fn push_triangle(&mut self, triangle: &Triangle, color: [f32; 4]) {
        let normal = (triangle.b - triangle.a).cross(triangle.c - triangle.a).normalize_or_zero();
        let base = self.vertices.len() as u32;
        for p in [triangle.a, triangle.b, triangle.c] {
            self.vertices.push(Vertex { pos: p.to_array(), normal: normal.to_array(), color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2]);
    }

    pub fn push_triangles<'a, I>(&mut self, triangles: I, color: [f32; 4])
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        for t in triangles {
            self.push_triangle(t, color);
        }
    }

    pub fn push_line(&mut self, a: Vec3, b: Vec3, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        for p in [a, b] {
            self.vertices.push(Vertex { pos: p.to_array(), normal: [0.0; 3], color });
        }
        self.indices.extend_from_slice(&[base, base + 1]);
    }

    /// Every triangle edge as a line segment. Shared edges are drawn twice.
    pub fn push_wireframe(&mut self, triangles: &[Triangle], color: [f32; 4]) {
        for t in triangles {
            self.push_line(t.a, t.b, color);
            self.push_line(t.b, t.c, color);
            self.push_line(t.c, t.a, color);
        }
    }

    /// Box `bounds` placed by `transform`.
    pub fn push_box(&mut self, bounds: &Aabb, transform: &Mat4, color: [f32; 4]) {
        let triangles: Vec<Triangle> = crate::model::scene::cuboid(bounds.min, bounds.max)
            .iter()
            .map(|t| t.transformed(transform))
            .collect();
        self.push_triangles(&triangles, color);
    }

    /// `None` for an empty mesh, which wgpu would reject as a zero-sized buffer.
    pub fn upload(&self, device: &wgpu::Device, label: &str) -> Option<MeshBuffer> {
        if self.is_empty() {
            return None;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} vertices")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} indices")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Some(MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_gets_flat_normal() {
        let mut mesh = Mesh::new();
        mesh.push_triangle(&Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y), [1.0; 4]);
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn wireframe_has_three_segments_per_triangle() {
        let mut mesh = Mesh::new();
        let tris = crate::model::scene::cuboid(Vec3::ZERO, Vec3::ONE);
        mesh.push_wireframe(&tris, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(mesh.indices.len(), tris.len() * 6);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0; 3]));
    }
}
