use std::path::Path;

use anyhow::{Context, Result};
use cgmath::InnerSpace;

use crate::error::Error;
use crate::render::mesh::{Mesh, Vertex};

/// Sample grid of heights laid out row by row along +X, rows advancing along +Z.
pub struct Heightmap {
    pub columns: u32,
    pub rows: u32,
    pub heights: Vec<f32>,
}

impl Heightmap {
    pub fn new(columns: u32, rows: u32, heights: Vec<f32>) -> Result<Self> {
        if columns < 2 || rows < 2 {
            return Err(Error::new(format!(
                "A heightmap needs at least 2x2 samples, got {columns}x{rows}"
            ))
            .into());
        }

        if heights.len() != (columns * rows) as usize {
            return Err(Error::new(format!(
                "A {columns}x{rows} heightmap needs {} samples, got {}",
                columns * rows,
                heights.len()
            ))
            .into());
        }

        Ok(Self {
            columns,
            rows,
            heights,
        })
    }

    pub fn flat(columns: u32, rows: u32) -> Result<Self> {
        Heightmap::new(columns, rows, vec![0.0; (columns * rows) as usize])
    }

    /// Reads a grayscale image; luminance 0..255 maps to height 0..`height_scale`.
    pub fn from_path(path: &Path, height_scale: f32) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Unable to open heightmap {}", path.display()))?
            .to_luma8();

        let (columns, rows) = image.dimensions();
        let heights = image
            .pixels()
            .map(|pixel| pixel.0[0] as f32 / 255.0 * height_scale)
            .collect();

        Heightmap::new(columns, rows, heights)
    }

    fn height(&self, column: u32, row: u32) -> f32 {
        let column = column.min(self.columns - 1);
        let row = row.min(self.rows - 1);
        self.heights[(row * self.columns + column) as usize]
    }

    fn max_height(&self) -> f32 {
        self.heights.iter().copied().fold(0.0, f32::max)
    }

    /// Builds an indexed patch centered on the origin with `spacing` between samples.
    pub fn create_patch_mesh(&self, name: &str, spacing: f32) -> Mesh {
        let max_height = self.max_height();
        let half_width = (self.columns - 1) as f32 * spacing / 2.0;
        let half_depth = (self.rows - 1) as f32 * spacing / 2.0;

        let mut vertices = Vec::with_capacity((self.columns * self.rows) as usize);

        for row in 0..self.rows {
            for column in 0..self.columns {
                let height = self.height(column, row);

                let dx = self.height(column + 1, row) - self.height(column.saturating_sub(1), row);
                let dz = self.height(column, row + 1) - self.height(column, row.saturating_sub(1));
                let normal = cgmath::Vector3::new(-dx, 2.0 * spacing, -dz).normalize();
                let tangent = cgmath::Vector3::new(2.0 * spacing, dx, 0.0).normalize();
                let bitangent = normal.cross(tangent);

                let shade = match max_height > 0.0 {
                    true => 0.25 + 0.75 * height / max_height,
                    false => 1.0,
                };

                vertices.push(Vertex {
                    position: [
                        column as f32 * spacing - half_width,
                        height,
                        row as f32 * spacing - half_depth,
                    ],
                    normal: normal.into(),
                    color: [shade, shade, shade],
                    tangent: tangent.into(),
                    bitangent: bitangent.into(),
                    uv: [
                        column as f32 / (self.columns - 1) as f32,
                        row as f32 / (self.rows - 1) as f32,
                    ],
                });
            }
        }

        let mut indices = Vec::with_capacity(((self.columns - 1) * (self.rows - 1) * 6) as usize);

        for row in 0..self.rows - 1 {
            for column in 0..self.columns - 1 {
                let top_left = row * self.columns + column;
                let top_right = top_left + 1;
                let bottom_left = top_left + self.columns;
                let bottom_right = bottom_left + 1;

                indices.extend_from_slice(&[
                    top_left,
                    bottom_left,
                    top_right,
                    top_right,
                    bottom_left,
                    bottom_right,
                ]);
            }
        }

        Mesh::new(name, vertices, Some(indices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_grid_has_upward_normals_and_two_triangles_per_cell() {
        let mesh = Heightmap::flat(3, 4).unwrap().create_patch_mesh("flat", 1.0);

        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(mesh.index_count(), Some(2 * 3 * 6));
        assert!(mesh.vertices.iter().all(|vertex| vertex.normal == [0.0, 1.0, 0.0]));
        assert_eq!(mesh.vertices[0].position, [-1.0, 0.0, -1.5]);
    }

    #[test]
    fn triangles_face_up() {
        let mesh = Heightmap::flat(2, 2).unwrap().create_patch_mesh("flat", 1.0);
        let indices = mesh.indices.as_ref().unwrap();

        for triangle in indices.chunks_exact(3) {
            let [a, b, c] = [0, 1, 2].map(|i| {
                cgmath::Vector3::from(mesh.vertices[triangle[i] as usize].position)
            });
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn slopes_tilt_the_normal_away_from_the_rise() {
        let heightmap = Heightmap::new(3, 2, vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0]).unwrap();

        let mesh = heightmap.create_patch_mesh("ramp", 1.0);

        let normal = mesh.vertices[1].normal;
        assert!(normal[0] < 0.0);
        assert!(normal[1] > 0.0);
        assert_eq!(mesh.vertices[2].position[1], 2.0);
    }

    #[test]
    fn sample_count_must_match_the_grid() {
        assert!(Heightmap::new(2, 2, vec![0.0; 3]).is_err());
        assert!(Heightmap::new(1, 4, vec![0.0; 4]).is_err());
    }
}
