pub const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.2,
    b: 0.3,
    a: 1.0,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FramePass {
    Skybox,
    Geometry,
    Terrain,
}

/// Passes run in this order every frame. Only the first pass clears the color target.
pub const FRAME_PASS_ORDER: [FramePass; 3] =
    [FramePass::Skybox, FramePass::Geometry, FramePass::Terrain];

impl FramePass {
    pub fn label(&self) -> &'static str {
        match self {
            FramePass::Skybox => "SKYBOX",
            FramePass::Geometry => "GEOMETRY",
            FramePass::Terrain => "TERRAIN",
        }
    }

    pub fn color_operations(&self) -> wgpu::Operations<wgpu::Color> {
        let load = match self {
            FramePass::Skybox => wgpu::LoadOp::Clear(CLEAR_COLOR),
            FramePass::Geometry | FramePass::Terrain => wgpu::LoadOp::Load,
        };

        wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        }
    }

    pub fn depth_operations(&self) -> wgpu::Operations<f32> {
        let load = match self {
            FramePass::Skybox => wgpu::LoadOp::Load,
            FramePass::Geometry | FramePass::Terrain => wgpu::LoadOp::Clear(1.0),
        };

        wgpu::Operations {
            load,
            store: wgpu::StoreOp::Store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_pass_after_the_first_loads_the_color_target() {
        let (first, rest) = FRAME_PASS_ORDER.split_first().unwrap();

        assert!(matches!(first.color_operations().load, wgpu::LoadOp::Clear(_)));
        for pass in rest {
            assert_eq!(pass.color_operations().load, wgpu::LoadOp::Load, "{pass:?}");
        }
    }

    #[test]
    fn geometry_directly_follows_skybox_and_loads_its_output() {
        let position = FRAME_PASS_ORDER
            .iter()
            .position(|pass| *pass == FramePass::Geometry)
            .unwrap();

        assert!(position > 0);
        assert_eq!(FRAME_PASS_ORDER[position - 1], FramePass::Skybox);
        assert_eq!(
            FramePass::Geometry.color_operations().load,
            wgpu::LoadOp::Load
        );
    }

    #[test]
    fn sky_keeps_depth_and_scene_passes_clear_it() {
        assert_eq!(FramePass::Skybox.depth_operations().load, wgpu::LoadOp::Load);
        assert_eq!(
            FramePass::Geometry.depth_operations().load,
            wgpu::LoadOp::Clear(1.0)
        );
        assert_eq!(
            FramePass::Terrain.depth_operations().load,
            wgpu::LoadOp::Clear(1.0)
        );
    }

    #[test]
    fn every_pass_stores_its_results() {
        for pass in FRAME_PASS_ORDER {
            assert_eq!(pass.color_operations().store, wgpu::StoreOp::Store);
            assert_eq!(pass.depth_operations().store, wgpu::StoreOp::Store);
        }
    }
}
