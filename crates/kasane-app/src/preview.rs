//! Central preview: uploads the selected stage's output frame to a GPU
//! texture and draws it scaled to fit.

use egui::{ColorImage, TextureHandle, TextureOptions, Ui};
use kasane_pipeline::Frame;

/// Caches the last shown frame so the texture is re-uploaded only when
/// the pixels actually change.
#[derive(Default)]
pub struct PreviewCache {
    texture: Option<TextureHandle>,
    shown: Option<Frame>,
}

impl PreviewCache {
    /// Draw `frame` centered in the available space, downscaling to fit
    /// but never upscaling.
    pub fn show(&mut self, ui: &mut Ui, frame: Option<&Frame>) {
        let Some(frame) = frame else {
            self.texture = None;
            self.shown = None;
            ui.centered_and_justified(|ui| {
                ui.label("No output for this stage yet.");
            });
            return;
        };

        if self.shown.as_ref() != Some(frame) {
            let rgb = frame.to_rgb();
            let size = [rgb.width() as usize, rgb.height() as usize];
            let color = ColorImage::from_rgb(size, rgb.as_raw());
            self.texture = Some(ui.ctx().load_texture("stage-preview", color, TextureOptions::NEAREST));
            self.shown = Some(frame.clone());
        }

        if let Some(texture) = &self.texture {
            let available = ui.available_size();
            let tex_size = texture.size_vec2();
            let scale = (available.x / tex_size.x)
                .min(available.y / tex_size.y)
                .min(1.0);
            ui.centered_and_justified(|ui| {
                ui.image((texture.id(), tex_size * scale));
            });
        }
    }
}
