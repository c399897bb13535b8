//! Device abstraction the draw queue flushes into
//!
//! A backend implements [`RenderDevice`] over its real GPU api. The
//! [`RecordingDevice`] here is the headless implementation used by the test
//! suite and by applications that want to inspect the command stream.

use std::collections::HashSet;

use crate::foundation::math::Mat4;

use super::state::{BlendMode, Color, DepthMode, MaterialId, MeshId, TargetId, TextureId};
use super::RenderError;

/// Backend surface the core drives during the render phase
///
/// Calls arrive already ordered and state-diffed; an implementation can
/// translate them one to one into its command stream.
pub trait RenderDevice {
    /// Current drawable surface size in pixels
    fn surface_size(&self) -> (u32, u32);

    /// Begin a pass into the given targets; empty means the surface
    fn begin_targets(&mut self, targets: &[TargetId]) -> Result<(), RenderError>;

    /// Clear the bound targets
    fn clear(&mut self, color: Color);

    /// Switch the blend equation
    fn apply_blend(&mut self, blend: BlendMode);

    /// Switch depth buffer behaviour
    fn apply_depth(&mut self, depth: DepthMode);

    /// Bind a material pipeline
    fn bind_material(&mut self, material: MaterialId) -> Result<(), RenderError>;

    /// Bind a texture into the active material's sampler slot
    fn bind_texture(&mut self, texture: TextureId);

    /// Issue one draw of a mesh under the given world transform
    fn draw(&mut self, mesh: MeshId, transform: &Mat4);
}

/// One recorded device command
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOp {
    /// `begin_targets` call with its target list
    BeginTargets(Vec<TargetId>),
    /// `clear` call
    Clear(Color),
    /// `apply_blend` call
    Blend(BlendMode),
    /// `apply_depth` call
    Depth(DepthMode),
    /// `bind_material` call
    Material(MaterialId),
    /// `bind_texture` call
    Texture(TextureId),
    /// `draw` call with its mesh
    Draw(MeshId),
}

/// Headless device that records the command stream instead of submitting it
#[derive(Debug)]
pub struct RecordingDevice {
    width: u32,
    height: u32,
    ops: Vec<DeviceOp>,
    missing_materials: HashSet<MaterialId>,
}

impl RecordingDevice {
    /// Recording device with the given surface size
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
            missing_materials: HashSet::new(),
        }
    }

    /// Make `bind_material` fail for the given id
    pub fn fail_material(&mut self, material: MaterialId) {
        self.missing_materials.insert(material);
    }

    /// All recorded commands, in order
    pub fn ops(&self) -> &[DeviceOp] {
        &self.ops
    }

    /// Clear the recording
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    /// Number of recorded draw commands
    pub fn draw_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, DeviceOp::Draw(_)))
            .count()
    }

    /// Number of recorded state-change commands (blend, depth, material,
    /// texture)
    pub fn state_change_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| {
                matches!(
                    op,
                    DeviceOp::Blend(_)
                        | DeviceOp::Depth(_)
                        | DeviceOp::Material(_)
                        | DeviceOp::Texture(_)
                )
            })
            .count()
    }
}

impl RenderDevice for RecordingDevice {
    fn surface_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn begin_targets(&mut self, targets: &[TargetId]) -> Result<(), RenderError> {
        self.ops.push(DeviceOp::BeginTargets(targets.to_vec()));
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.ops.push(DeviceOp::Clear(color));
    }

    fn apply_blend(&mut self, blend: BlendMode) {
        self.ops.push(DeviceOp::Blend(blend));
    }

    fn apply_depth(&mut self, depth: DepthMode) {
        self.ops.push(DeviceOp::Depth(depth));
    }

    fn bind_material(&mut self, material: MaterialId) -> Result<(), RenderError> {
        if self.missing_materials.contains(&material) {
            return Err(RenderError::MissingMaterial(material));
        }
        self.ops.push(DeviceOp::Material(material));
        Ok(())
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.ops.push(DeviceOp::Texture(texture));
    }

    fn draw(&mut self, mesh: MeshId, _transform: &Mat4) {
        self.ops.push(DeviceOp::Draw(mesh));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_device_captures_command_order() {
        let mut device = RecordingDevice::new(64, 64);
        device.apply_blend(BlendMode::Alpha);
        device.bind_material(MaterialId(1)).unwrap();
        device.draw(MeshId(9), &Mat4::identity());

        assert_eq!(
            device.ops(),
            &[
                DeviceOp::Blend(BlendMode::Alpha),
                DeviceOp::Material(MaterialId(1)),
                DeviceOp::Draw(MeshId(9)),
            ]
        );
        assert_eq!(device.draw_count(), 1);
        assert_eq!(device.state_change_count(), 2);
    }

    #[test]
    fn test_fail_material_surfaces_missing_material() {
        let mut device = RecordingDevice::new(64, 64);
        device.fail_material(MaterialId(3));
        assert!(matches!(
            device.bind_material(MaterialId(3)),
            Err(RenderError::MissingMaterial(MaterialId(3)))
        ));
    }
}
