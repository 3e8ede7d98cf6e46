//! Main application state and frame loop.

use std::path::Path;

use kasane_pipeline::{Pipeline, PipelineParams, StageId};

use crate::panels;
use crate::preview::PreviewCache;

/// Top-level application state: the pipeline, the stage selection, and
/// transient UI bits.
pub struct KasaneApp {
    pipeline: Pipeline,
    selected: StageId,
    preview: PreviewCache,
    last_error: Option<String>,
}

impl KasaneApp {
    /// Build the app inside the eframe creation context.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self {
            pipeline: Pipeline::new(),
            selected: StageId::Sink,
            preview: PreviewCache::default(),
            last_error: None,
        }
    }

    fn report<E: std::fmt::Display>(&mut self, context: &str, result: Result<(), E>) {
        match result {
            Ok(()) => self.last_error = None,
            Err(err) => {
                tracing::error!("{context}: {err}");
                self.last_error = Some(format!("{context}: {err}"));
            }
        }
    }

    fn open_image(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Open Image")
            .add_filter("Images", &["png", "jpg", "jpeg", "bmp", "webp"])
            .pick_file()
        {
            let result = self.pipeline.load_image(&path);
            self.report("failed to open image", result);
        }
    }

    fn save_output(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Save Output")
            .add_filter("PNG", &["png"])
            .add_filter("JPEG", &["jpg", "jpeg"])
            .add_filter("BMP", &["bmp"])
            .set_file_name("output.png")
            .save_file()
        {
            let result = self.pipeline.save_output(&path);
            self.report("failed to save output", result);
        }
    }

    fn save_params(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Save Parameters")
            .add_filter("JSON", &["json"])
            .set_file_name("params.json")
            .save_file()
        {
            let result = write_params(&path, &self.pipeline.params());
            self.report("failed to save parameters", result);
        }
    }

    fn load_params(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .set_title("Load Parameters")
            .add_filter("JSON", &["json"])
            .pick_file()
        {
            match read_params(&path) {
                Ok(params) => {
                    self.pipeline.set_params(params);
                    self.last_error = None;
                }
                Err(err) => self.report::<String>("failed to load parameters", Err(err)),
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.spacing_mut().item_spacing.x = 4.0;
            if ui.button("Open Image…").clicked() {
                self.open_image();
            }
            if ui.button("Save Output…").clicked() {
                self.save_output();
            }
            ui.separator();
            if ui.button("Load Params…").clicked() {
                self.load_params();
            }
            if ui.button("Save Params…").clicked() {
                self.save_params();
            }
            ui.separator();
            if ui.button("Reset All").clicked() {
                self.pipeline.reset_all();
            }
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if let Some(path) = self.pipeline.source.path() {
                    ui.label(egui::RichText::new(path.display().to_string()).small());
                }
            });
        });
    }

    fn stage_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Stages");
        ui.separator();
        for id in StageId::ALL {
            if ui.selectable_label(self.selected == id, id.label()).clicked() {
                self.selected = id;
            }
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(error) = &self.last_error {
                ui.colored_label(egui::Color32::RED, "●");
                ui.label(egui::RichText::new(error).small());
            } else if let Some(frame) = self.pipeline.output_of(self.selected) {
                ui.colored_label(egui::Color32::GREEN, "●");
                ui.label(
                    egui::RichText::new(format!(
                        "{} — {}x{}, {} channel(s)",
                        self.selected.label(),
                        frame.width(),
                        frame.height(),
                        frame.channels(),
                    ))
                    .small(),
                );
            } else {
                ui.colored_label(egui::Color32::GRAY, "●");
                ui.label(egui::RichText::new("No image loaded").small());
            }
        });
    }
}

impl eframe::App for KasaneApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));

        egui::SidePanel::left("stages")
            .resizable(false)
            .default_width(170.0)
            .show(ctx, |ui| self.stage_list(ui));

        egui::SidePanel::right("properties")
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    panels::stage_properties(ui, &mut self.pipeline, self.selected);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.preview.show(ui, self.pipeline.output_of(self.selected));
        });

        // Single driver per frame; parameter edits above marked the
        // affected stages dirty, everything else short-circuits.
        self.pipeline.run();
    }
}

fn write_params(path: &Path, params: &PipelineParams) -> Result<(), String> {
    let json = serde_json::to_string_pretty(params).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), "saved pipeline parameters");
    Ok(())
}

fn read_params(path: &Path) -> Result<PipelineParams, String> {
    let json = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    let params = serde_json::from_str(&json).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), "loaded pipeline parameters");
    Ok(params)
}
