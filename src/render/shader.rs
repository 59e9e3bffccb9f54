use anyhow::{Context, Result};

pub struct ShaderModulePackage {
    pub vertex_shader_module: wgpu::ShaderModule,
    pub fragment_shader_module: wgpu::ShaderModule,
}

impl ShaderModulePackage {
    pub fn from_templates(
        vertex_template_name: &str,
        fragment_template_name: &str,
        name: &str,
        device: &wgpu::Device,
        tera: &tera::Tera,
        shader_template_config: &ShaderTemplateConfiguration,
    ) -> Result<Self> {
        let shader_template_context = tera::Context::from_serialize(shader_template_config)?;

        let vertex_shader_source =
            render_shader(vertex_template_name, tera, &shader_template_context)?;

        let fragment_shader_source =
            render_shader(fragment_template_name, tera, &shader_template_context)?;

        log::debug!(
            "Creating shader module package {name} from config: {:?}",
            shader_template_config
        );

        Ok(ShaderModulePackage {
            vertex_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_VERTEX_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(vertex_shader_source.into()),
            }),
            fragment_shader_module: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{}_FRAGMENT_SHADER_MODULE", name)),
                source: wgpu::ShaderSource::Wgsl(fragment_shader_source.into()),
            }),
        })
    }
}

pub fn render_shader(
    template_name: &str,
    tera: &tera::Tera,
    template_context: &tera::Context,
) -> Result<String> {
    tera.render(template_name, template_context)
        .with_context(|| format!("Unable to render shader template {template_name}"))
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Serialize)]
pub struct ShaderTemplateConfiguration {
    pub texture_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_count_is_substituted_into_the_binding_array() {
        let mut tera = tera::Tera::default();
        tera.add_raw_template(
            "common/bindings.wgsl",
            "var textures: binding_array<texture_2d<f32>, {{ texture_count }}>;",
        )
        .unwrap();
        tera.add_raw_template("scene/scene.frag", "{% include \"common/bindings.wgsl\" %}")
            .unwrap();

        let context =
            tera::Context::from_serialize(ShaderTemplateConfiguration { texture_count: 5 })
                .unwrap();

        assert_eq!(
            render_shader("scene/scene.frag", &tera, &context).unwrap(),
            "var textures: binding_array<texture_2d<f32>, 5>;"
        );
    }

    #[test]
    fn unknown_template_reports_its_name() {
        let error = render_shader("missing.vert", &tera::Tera::default(), &tera::Context::new())
            .unwrap_err();

        assert!(error.to_string().contains("missing.vert"));
    }
}
