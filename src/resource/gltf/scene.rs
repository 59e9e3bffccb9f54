use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;

use crate::data::transform::Transform;
use crate::render::entity::Entity;
use crate::render::material::Material;
use crate::render::mesh::{Mesh, Vertex};
use crate::render::texture::Texture;
use crate::resource::gltf::asset::GltfAsset;
use crate::resource::gltf::loader::GltfLoader;
use crate::resource::texture::MISSING_TEXTURE_COLOR;

const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// A mesh primitive placed by a scene node.
struct PrimitivePlacement {
    transform: Transform,
    mesh_id: usize,
    primitive_id: usize,
    material_id: Option<usize>,
}

struct MaterialDescription {
    name: String,
    base_color: [f32; 3],
    roughness: f32,
    diffuse_image_id: Option<usize>,
    normal_image_id: Option<usize>,
}

/// Turns the triangle primitives of a glTF scene into renderable entities.
///
/// Meshes, materials and images are shared between the entities that
/// reference them, so repeated nodes upload their geometry once.
pub struct GltfSceneLoader<'a, T: GltfLoader> {
    loader: &'a mut T,
    mip_level_count: u32,
    mesh_registry: HashMap<(usize, usize), Rc<Mesh>>,
    material_registry: HashMap<usize, Rc<Material>>,
    texture_registry: HashMap<usize, Rc<Texture>>,
    missing_texture: Rc<Texture>,
}

impl<'a, T: GltfLoader> GltfSceneLoader<'a, T> {
    pub fn new(loader: &'a mut T, mip_level_count: u32) -> Self {
        Self {
            loader,
            mip_level_count,
            mesh_registry: HashMap::new(),
            material_registry: HashMap::new(),
            texture_registry: HashMap::new(),
            missing_texture: Rc::new(Texture::solid("MISSING", MISSING_TEXTURE_COLOR)),
        }
    }

    pub fn load_entities(&mut self, scene_id: usize) -> Result<Vec<Entity>> {
        let buffer_ids = self
            .loader
            .asset()
            .gltf()
            .buffers()
            .map(|buffer| buffer.index())
            .collect::<Vec<_>>();

        for buffer_id in buffer_ids {
            self.loader.load_buffer(buffer_id)?;
        }

        let mut placements = vec![];
        {
            let scene = self.loader.asset().get_scene(scene_id)?;
            for node in scene.nodes() {
                collect_placements(&node, &Transform::default(), &mut placements);
            }
        }

        let mut entities = Vec::with_capacity(placements.len());

        for placement in placements {
            let mesh = match self.load_mesh(placement.mesh_id, placement.primitive_id)? {
                Some(mesh) => mesh,
                None => continue,
            };

            let mut entity = Entity::new()
                .with_name(mesh.name.clone())
                .with_transform(placement.transform)
                .with_mesh(mesh);

            if let Some(material_id) = placement.material_id {
                entity = entity.with_material(self.load_material(material_id)?);
            }

            entities.push(entity);
        }

        log::info!(
            "Loaded {} entities from glTF scene {scene_id} ({} unique meshes)",
            entities.len(),
            self.mesh_registry.len()
        );

        Ok(entities)
    }

    fn load_mesh(&mut self, mesh_id: usize, primitive_id: usize) -> Result<Option<Rc<Mesh>>> {
        if let Some(mesh) = self.mesh_registry.get(&(mesh_id, primitive_id)) {
            log::debug!("Skipping duplicate load of mesh: {}", mesh.name);
            return Ok(Some(mesh.clone()));
        }

        let gltf = self.loader.asset().gltf();
        let primitive = match gltf
            .meshes()
            .nth(mesh_id)
            .and_then(|mesh| mesh.primitives().nth(primitive_id))
        {
            Some(primitive) => primitive,
            None => return Ok(None),
        };

        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::info!(
                "Ignoring unsupported primitive mode {:?} in mesh {mesh_id}",
                primitive.mode()
            );
            return Ok(None);
        }

        let reader = primitive.reader(|buffer| self.loader.buffer_data(buffer.index()));

        let positions = match reader.read_positions() {
            Some(positions) => positions.collect::<Vec<_>>(),
            None => {
                log::info!("Ignoring primitive {primitive_id} of mesh {mesh_id} without positions");
                return Ok(None);
            }
        };

        let vertices = build_vertices(
            &positions,
            reader.read_normals().map(|normals| normals.collect()),
            reader.read_tangents().map(|tangents| tangents.collect()),
            reader
                .read_colors(0)
                .map(|colors| colors.into_rgb_f32().collect()),
            reader
                .read_tex_coords(0)
                .map(|tex_coords| tex_coords.into_f32().collect()),
        );
        let indices = reader
            .read_indices()
            .map(|indices| indices.into_u32().collect());

        let name = match gltf.meshes().nth(mesh_id).and_then(|mesh| mesh.name().map(String::from)) {
            Some(name) => format!("{name}_{primitive_id}"),
            None => format!("MESH_{mesh_id}_{primitive_id}"),
        };

        let mesh = Rc::new(Mesh::new(name, vertices, indices));
        self.mesh_registry
            .insert((mesh_id, primitive_id), mesh.clone());

        Ok(Some(mesh))
    }

    fn load_material(&mut self, material_id: usize) -> Result<Rc<Material>> {
        if let Some(material) = self.material_registry.get(&material_id) {
            return Ok(material.clone());
        }

        let description = match self.loader.asset().gltf().materials().nth(material_id) {
            Some(material) => {
                let pbr = material.pbr_metallic_roughness();
                let [r, g, b, _] = pbr.base_color_factor();

                MaterialDescription {
                    name: match material.name() {
                        Some(name) => String::from(name),
                        None => format!("MATERIAL_{material_id}"),
                    },
                    base_color: [r, g, b],
                    roughness: pbr.roughness_factor(),
                    diffuse_image_id: pbr
                        .base_color_texture()
                        .map(|info| info.texture().source().index()),
                    normal_image_id: material
                        .normal_texture()
                        .map(|normal| normal.texture().source().index()),
                }
            }
            None => MaterialDescription {
                name: format!("MATERIAL_{material_id}"),
                base_color: DEFAULT_COLOR,
                roughness: 1.0,
                diffuse_image_id: None,
                normal_image_id: None,
            },
        };

        let mut material = Material::new(
            description.name,
            description.base_color,
            description.roughness,
        );

        if let Some(image_id) = description.diffuse_image_id {
            material = material.with_diffuse_texture(self.load_texture(image_id));
        }

        if let Some(image_id) = description.normal_image_id {
            material = material.with_normal_texture(self.load_texture(image_id));
        }

        let material = Rc::new(material);
        self.material_registry.insert(material_id, material.clone());

        Ok(material)
    }

    /// An image that cannot be read is replaced by the shared missing texture.
    fn load_texture(&mut self, image_id: usize) -> Rc<Texture> {
        if let Some(texture) = self.texture_registry.get(&image_id) {
            return texture.clone();
        }

        let texture = match self.read_texture(image_id) {
            Ok(texture) => Rc::new(texture),
            Err(error) => {
                log::error!("{error:#}; using the missing texture for image {image_id}");
                self.missing_texture.clone()
            }
        };

        self.texture_registry.insert(image_id, texture.clone());

        texture
    }

    fn read_texture(&mut self, image_id: usize) -> Result<Texture> {
        let image = self.loader.load_image(image_id)?;
        let (width, height) = image.dimensions();

        Texture::new(
            format!("IMAGE_{image_id}"),
            image.into_raw(),
            width,
            height,
            self.mip_level_count,
        )
    }
}

fn collect_placements(
    node: &gltf::Node,
    parent_transform: &Transform,
    placements: &mut Vec<PrimitivePlacement>,
) {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local_transform = Transform {
        translation: translation.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    };
    let transform = parent_transform.compose(&local_transform);

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            placements.push(PrimitivePlacement {
                transform,
                mesh_id: mesh.index(),
                primitive_id: primitive.index(),
                material_id: primitive.material().index(),
            });
        }
    }

    for child in node.children() {
        collect_placements(&child, &transform, placements);
    }
}

/// Interleaves glTF vertex attributes. Missing attributes fall back to an up
/// normal, white color and zero uvs; bitangents follow the tangent handedness.
pub fn build_vertices(
    positions: &[[f32; 3]],
    normals: Option<Vec<[f32; 3]>>,
    tangents: Option<Vec<[f32; 4]>>,
    colors: Option<Vec<[f32; 3]>>,
    tex_coords: Option<Vec<[f32; 2]>>,
) -> Vec<Vertex> {
    positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let normal = normals
                .as_ref()
                .and_then(|normals| normals.get(i).copied())
                .unwrap_or(DEFAULT_NORMAL);

            let (tangent, bitangent) = match tangents.as_ref().and_then(|tangents| tangents.get(i)) {
                Some([x, y, z, w]) => {
                    let tangent = cgmath::Vector3::new(*x, *y, *z);
                    let bitangent = cgmath::Vector3::from(normal).cross(tangent) * *w;
                    (tangent.into(), bitangent.into())
                }
                None => ([0.0; 3], [0.0; 3]),
            };

            Vertex {
                position: *position,
                normal,
                color: colors
                    .as_ref()
                    .and_then(|colors| colors.get(i).copied())
                    .unwrap_or(DEFAULT_COLOR),
                tangent,
                bitangent,
                uv: tex_coords
                    .as_ref()
                    .and_then(|tex_coords| tex_coords.get(i).copied())
                    .unwrap_or([0.0, 0.0]),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::resource::gltf::asset::file::FileSystemGltfAsset;
    use crate::resource::gltf::loader::file::FileSystemGltfLoader;

    #[test]
    fn missing_attributes_use_defaults() {
        let vertices = build_vertices(&[[1.0, 2.0, 3.0]], None, None, None, None);

        assert_eq!(vertices[0].position, [1.0, 2.0, 3.0]);
        assert_eq!(vertices[0].normal, DEFAULT_NORMAL);
        assert_eq!(vertices[0].color, [1.0, 1.0, 1.0]);
        assert_eq!(vertices[0].uv, [0.0, 0.0]);
    }

    #[test]
    fn bitangent_follows_tangent_handedness() {
        let normals = Some(vec![[0.0, 0.0, 1.0], [0.0, 0.0, 1.0]]);
        let tangents = Some(vec![[1.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, -1.0]]);

        let vertices = build_vertices(&[[0.0; 3], [0.0; 3]], normals, tangents, None, None);

        assert_eq!(vertices[0].bitangent, [0.0, 1.0, 0.0]);
        assert_eq!(vertices[1].bitangent, [0.0, -1.0, 0.0]);
        assert_eq!(vertices[1].tangent, [1.0, 0.0, 0.0]);
    }

    /// Two nodes sharing one triangle mesh. With `diffuse_uri` set, the primitive
    /// gets a material whose base color texture points at that file.
    fn write_triangle_asset(directory: &Path, diffuse_uri: Option<&str>) -> std::path::PathBuf {
        std::fs::create_dir_all(directory).unwrap();

        let mut bin = Vec::new();
        for value in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&value.to_le_bytes());
        }
        for index in [0u16, 1, 2] {
            bin.extend_from_slice(&index.to_le_bytes());
        }
        std::fs::write(directory.join("triangle.bin"), &bin).unwrap();

        let (material, materials) = match diffuse_uri {
            Some(uri) => (
                r#", "material": 0"#.to_string(),
                format!(
                    r#""materials": [{{ "name": "painted", "pbrMetallicRoughness": {{ "baseColorTexture": {{ "index": 0 }} }} }}],
            "textures": [{{ "source": 0 }}],
            "images": [{{ "uri": "{uri}" }}],"#
                ),
            ),
            None => (String::new(), String::new()),
        };

        let json = r#"{
            "asset": { "version": "2.0" },
            MATERIALS
            "scene": 0,
            "scenes": [{ "nodes": [0, 1] }],
            "nodes": [
                { "mesh": 0, "translation": [1.0, 2.0, 3.0] },
                { "mesh": 0 }
            ],
            "meshes": [{ "name": "triangle", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1MATERIAL }] }],
            "buffers": [{ "uri": "triangle.bin", "byteLength": 42 }],
            "bufferViews": [
                { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
                { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
            ],
            "accessors": [
                { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
                { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
            ]
        }"#
        .replace("MATERIALS", &materials)
        .replace("MATERIAL", &material);
        let path = directory.join("triangle.gltf");
        std::fs::write(&path, json).unwrap();

        path
    }

    #[test]
    fn scene_nodes_become_entities_sharing_one_mesh() {
        let directory = std::env::temp_dir().join("arena_renderer_gltf_scene_test");
        let path = write_triangle_asset(&directory, None);
        let asset = FileSystemGltfAsset::from_path(&path).unwrap();
        let mut loader = FileSystemGltfLoader::new(&asset);
        let scene_id = asset.default_scene_id().unwrap();

        let entities = GltfSceneLoader::new(&mut loader, 8)
            .load_entities(scene_id)
            .unwrap();

        assert_eq!(entities.len(), 2);
        let first = entities[0].mesh.as_ref().unwrap();
        let second = entities[1].mesh.as_ref().unwrap();
        assert!(Rc::ptr_eq(first, second));
        assert_eq!(first.vertex_count(), 3);
        assert_eq!(first.indices, Some(vec![0, 1, 2]));
        assert_eq!(first.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(
            entities[0].transform.translation,
            cgmath::Vector3::new(1.0, 2.0, 3.0)
        );
        assert!(entities[0].material.is_none());

        let _ = std::fs::remove_dir_all(directory);
    }

    #[test]
    fn unreadable_images_fall_back_to_the_missing_texture() {
        let directory = std::env::temp_dir().join("arena_renderer_gltf_missing_image_test");
        let path = write_triangle_asset(&directory, Some("missing.png"));
        let asset = FileSystemGltfAsset::from_path(&path).unwrap();
        let mut loader = FileSystemGltfLoader::new(&asset);

        let entities = GltfSceneLoader::new(&mut loader, 8).load_entities(0).unwrap();

        assert_eq!(entities.len(), 2);
        let first = entities[0].material.as_ref().unwrap();
        let second = entities[1].material.as_ref().unwrap();
        assert!(Rc::ptr_eq(first, second));
        assert_eq!(first.name, "painted");

        let diffuse = first.diffuse_texture.as_ref().unwrap();
        assert_eq!(diffuse.name, "MISSING");
        assert_eq!(diffuse.pixels, MISSING_TEXTURE_COLOR.to_vec());

        let _ = std::fs::remove_dir_all(directory);
    }
}
