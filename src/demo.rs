use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};

use crate::args::Args;
use crate::data::transform::Transform;
use crate::render::entity::Entity;
use crate::render::material::Material;
use crate::render::primitive::create_cube_mesh;
use crate::render::skybox::create_sky_mesh;
use crate::render::texture::{Texture, DEFAULT_MIP_LEVEL_COUNT};
use crate::render::RenderSystem;
use crate::resource::gltf::asset::file::FileSystemGltfAsset;
use crate::resource::gltf::asset::GltfAsset;
use crate::resource::gltf::loader::file::FileSystemGltfLoader;
use crate::resource::gltf::scene::GltfSceneLoader;
use crate::resource::heightmap::Heightmap;
use crate::resource::texture::{FileSystemTextureLoader, TextureLoader};

const SKY_COLOR: [u8; 4] = [120, 170, 230, 255];

const TERRAIN_SAMPLES: u32 = 65;
const TERRAIN_SPACING: f32 = 0.5;
const TERRAIN_HEIGHT_SCALE: f32 = 4.0;
const TERRAIN_GRID: i32 = 1;
const TERRAIN_ELEVATION: f32 = -2.0;

/// Fills the render system with the sky, the optional glTF scene, a cube
/// prototype with its instances and a grid of terrain patches.
pub fn populate_scene(render_system: &mut RenderSystem, args: &Args) -> Result<()> {
    let texture_loader = FileSystemTextureLoader::new(DEFAULT_MIP_LEVEL_COUNT);

    add_sky(render_system, args.sky.as_deref(), &texture_loader).context("Unable to add the sky")?;

    if let Some(gltf_path) = &args.gltf {
        add_gltf_scene(render_system, Path::new(gltf_path))
            .with_context(|| format!("Unable to add the glTF scene {gltf_path}"))?;
    }

    add_instanced_cubes(render_system, args.instances).context("Unable to add the cubes")?;

    add_terrain(render_system, args.heightmap.as_deref()).context("Unable to add the terrain")?;

    Ok(())
}

fn add_sky(
    render_system: &mut RenderSystem,
    sky_path: Option<&str>,
    texture_loader: &impl TextureLoader,
) -> Result<()> {
    let texture = match sky_path {
        Some(sky_path) => texture_loader.load_texture(Path::new(sky_path)),
        None => Rc::new(Texture::solid("SKY", SKY_COLOR)),
    };

    let material = Material::new("SKY", [1.0, 1.0, 1.0], 1.0).with_diffuse_texture(texture);

    render_system.set_sky(
        Entity::new()
            .with_name("SKY")
            .with_mesh(Rc::new(create_sky_mesh()))
            .with_material(Rc::new(material)),
    )?;

    Ok(())
}

fn add_gltf_scene(render_system: &mut RenderSystem, gltf_path: &Path) -> Result<()> {
    let asset = FileSystemGltfAsset::from_path(gltf_path)?;
    let scene_id = asset.default_scene_id()?;
    let mut gltf_loader = FileSystemGltfLoader::new(&asset);

    let entities =
        GltfSceneLoader::new(&mut gltf_loader, DEFAULT_MIP_LEVEL_COUNT).load_entities(scene_id)?;

    for entity in entities {
        render_system.add_entity(entity)?;
    }

    Ok(())
}

fn add_instanced_cubes(render_system: &mut RenderSystem, instance_count: u32) -> Result<()> {
    let material = Rc::new(Material::new("CUBE", [0.9, 0.45, 0.1], 0.4));
    render_system.register_material(&material)?;

    let prototype = render_system.add_entity(
        Entity::new()
            .with_name("CUBE")
            .with_transform(Transform::from_translation(0.0, 1.0, 0.0))
            .with_mesh(Rc::new(create_cube_mesh("CUBE", 0.5)))
            .with_material(material),
    )?;

    let radius = 4.0 + instance_count as f32 * 0.2;

    for i in 0..instance_count {
        let angle = i as f32 / instance_count as f32 * std::f32::consts::TAU;
        let instance = Entity::new()
            .with_name(format!("CUBE_{i}"))
            .with_transform(
                Transform::from_translation(radius * angle.cos(), 1.0, radius * angle.sin())
                    .with_uniform_scale(0.5 + (i % 3) as f32 * 0.25),
            )
            .instance_of(prototype);

        if render_system.add_instance(instance)?.is_none() {
            log::warn!("Skipped cube instance {i}");
        }
    }

    Ok(())
}

fn add_terrain(render_system: &mut RenderSystem, heightmap_path: Option<&str>) -> Result<()> {
    let heightmap = match heightmap_path {
        Some(heightmap_path) => Heightmap::from_path(Path::new(heightmap_path), TERRAIN_HEIGHT_SCALE)?,
        None => Heightmap::flat(TERRAIN_SAMPLES, TERRAIN_SAMPLES)?,
    };

    let patch_width = (heightmap.columns - 1) as f32 * TERRAIN_SPACING;
    let patch_depth = (heightmap.rows - 1) as f32 * TERRAIN_SPACING;
    let mesh = Rc::new(heightmap.create_patch_mesh("TERRAIN_PATCH", TERRAIN_SPACING));

    for z in -TERRAIN_GRID..=TERRAIN_GRID {
        for x in -TERRAIN_GRID..=TERRAIN_GRID {
            render_system.add_terrain_patch(
                &mesh,
                Transform::from_translation(
                    x as f32 * patch_width,
                    TERRAIN_ELEVATION,
                    z as f32 * patch_depth,
                ),
            )?;
        }
    }

    Ok(())
}
