//! Per-stage property panels.
//!
//! Each panel copies the stage's parameters, renders widgets against
//! the copy, and hands the copy back through `set_params`, which marks
//! the stage dirty only when something actually changed. No pixel work
//! happens here; the app drives the pipeline once per frame after all
//! panels have rendered.

use egui::Ui;
use egui_plot::{Bar, BarChart, Line, Plot, PlotPoints};
use kasane_pipeline::blend::BlendMode;
use kasane_pipeline::blur::BlurParams;
use kasane_pipeline::brightness::BrightnessContrastParams;
use kasane_pipeline::convolve::{KernelPreset, KernelSize};
use kasane_pipeline::edge::{EdgeMethod, EdgeParams};
use kasane_pipeline::noise::NoiseParams;
use kasane_pipeline::threshold::{ThresholdMethod, ThresholdParams};
use kasane_pipeline::{Pipeline, Stage, StageId};

/// Render the property editor for the selected stage.
pub fn stage_properties(ui: &mut Ui, pipeline: &mut Pipeline, selected: StageId) {
    ui.heading(selected.label());
    ui.separator();
    match selected {
        StageId::Source => source_panel(ui, pipeline),
        StageId::BrightnessContrast => brightness_panel(ui, pipeline),
        StageId::ChannelSplitter => channels_panel(ui, pipeline),
        StageId::Blur => blur_panel(ui, pipeline),
        StageId::Blend => blend_panel(ui, pipeline),
        StageId::Threshold => threshold_panel(ui, pipeline),
        StageId::NoiseGenerator => noise_panel(ui, pipeline),
        StageId::EdgeDetector => edge_panel(ui, pipeline),
        StageId::ConvolutionFilter => convolution_panel(ui, pipeline),
        StageId::Sink => sink_panel(ui, pipeline),
    }
    ui.separator();
    if ui.button("Reset Stage").clicked() {
        reset_stage(pipeline, selected);
    }
}

fn reset_stage(pipeline: &mut Pipeline, selected: StageId) {
    match selected {
        StageId::Source => pipeline.source.reset(),
        StageId::BrightnessContrast => pipeline.brightness.reset(),
        StageId::ChannelSplitter => pipeline.channels.reset(),
        StageId::Blur => pipeline.blur.reset(),
        StageId::Blend => pipeline.blend.reset(),
        StageId::Threshold => pipeline.threshold.reset(),
        StageId::NoiseGenerator => pipeline.noise.reset(),
        StageId::EdgeDetector => pipeline.edge.reset(),
        StageId::ConvolutionFilter => pipeline.convolution.reset(),
        StageId::Sink => pipeline.sink.reset(),
    }
}

fn source_panel(ui: &mut Ui, pipeline: &Pipeline) {
    match pipeline.source.path() {
        Some(path) => {
            ui.label("Loaded from:");
            ui.monospace(path.display().to_string());
        }
        None => {
            ui.label("No image loaded.");
            ui.label("Use \"Open Image…\" in the toolbar.");
        }
    }
    if let Some(frame) = pipeline.source.output() {
        ui.label(format!("{}x{} pixels", frame.width(), frame.height()));
    }
}

fn brightness_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.brightness.params();
    ui.add(
        egui::Slider::new(&mut p.brightness, BrightnessContrastParams::BRIGHTNESS_RANGE)
            .text("Brightness"),
    );
    ui.add(
        egui::Slider::new(&mut p.contrast, BrightnessContrastParams::CONTRAST_RANGE)
            .text("Contrast"),
    );
    pipeline.brightness.set_params(p);
}

fn channels_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.channels.params();
    ui.checkbox(&mut p.show_red, "Red");
    ui.checkbox(&mut p.show_green, "Green");
    ui.checkbox(&mut p.show_blue, "Blue");
    pipeline.channels.set_params(p);
}

fn blur_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.blur.params();
    ui.checkbox(&mut p.enabled, "Enable blur");
    ui.add(
        egui::Slider::new(&mut p.radius, BlurParams::MIN_RADIUS..=BlurParams::MAX_RADIUS)
            .text("Radius"),
    );
    ui.checkbox(&mut p.uniform, "Both axes");
    ui.add_enabled_ui(!p.uniform, |ui| {
        ui.horizontal(|ui| {
            ui.radio_value(&mut p.horizontal, true, "Horizontal");
            ui.radio_value(&mut p.horizontal, false, "Vertical");
        });
    });
    pipeline.blur.set_params(p);

    ui.separator();
    ui.label("Kernel:");
    #[allow(clippy::cast_precision_loss)]
    let points: PlotPoints = pipeline
        .blur
        .kernel()
        .iter()
        .enumerate()
        .map(|(i, w)| [i as f64, f64::from(*w)])
        .collect();
    Plot::new("blur-kernel")
        .height(72.0)
        .show_axes(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new("kernel", points));
        });
}

fn blend_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.blend.params();
    egui::ComboBox::from_label("Mode")
        .selected_text(p.mode.label())
        .show_ui(ui, |ui| {
            for mode in BlendMode::ALL {
                ui.selectable_value(&mut p.mode, mode, mode.label());
            }
        });
    ui.add_enabled(
        p.mode != BlendMode::Difference,
        egui::Slider::new(&mut p.opacity, 0.0..=1.0).text("Opacity"),
    );
    pipeline.blend.set_params(p);
    ui.label("Blends the working frame with the source image.");
}

fn threshold_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.threshold.params();
    ui.checkbox(&mut p.enabled, "Enable threshold");
    egui::ComboBox::from_label("Method")
        .selected_text(p.method.label())
        .show_ui(ui, |ui| {
            for method in ThresholdMethod::ALL {
                ui.selectable_value(&mut p.method, method, method.label());
            }
        });
    match p.method {
        ThresholdMethod::Fixed => {
            ui.add(egui::Slider::new(&mut p.value, 0..=255u8).text("Cutoff"));
        }
        ThresholdMethod::Otsu => {
            if let Some(level) = pipeline.threshold.otsu_level() {
                ui.label(format!("Computed cutoff: {level}"));
            }
        }
        ThresholdMethod::Adaptive => {
            ui.add(
                egui::Slider::new(&mut p.block_size, ThresholdParams::BLOCK_RANGE)
                    .step_by(2.0)
                    .text("Block size"),
            );
            ui.add(
                egui::Slider::new(&mut p.constant, ThresholdParams::CONSTANT_RANGE)
                    .text("Constant"),
            );
        }
    }
    pipeline.threshold.set_params(p);

    ui.separator();
    ui.label("Histogram:");
    let bars: Vec<Bar> = pipeline
        .threshold
        .histogram()
        .iter()
        .enumerate()
        .map(|(i, &count)| {
            #[allow(clippy::cast_precision_loss)]
            Bar::new(i as f64, f64::from(count))
        })
        .collect();
    Plot::new("intensity-histogram")
        .height(110.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("histogram", bars));
        });
}

fn noise_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.noise.params();
    ui.checkbox(&mut p.enabled, "Generate noise");
    ui.add(
        egui::Slider::new(&mut p.scale, NoiseParams::SCALE_RANGE)
            .logarithmic(true)
            .text("Scale"),
    );
    ui.add(egui::Slider::new(&mut p.octaves, NoiseParams::OCTAVE_RANGE).text("Octaves"));
    ui.add(
        egui::Slider::new(&mut p.persistence, NoiseParams::PERSISTENCE_RANGE)
            .text("Persistence"),
    );
    ui.add(egui::Slider::new(&mut p.width, NoiseParams::SIZE_RANGE).text("Width"));
    ui.add(egui::Slider::new(&mut p.height, NoiseParams::SIZE_RANGE).text("Height"));
    ui.checkbox(&mut p.color, "Color (independent planes)");
    pipeline.noise.set_params(p);
    ui.label("When enabled, replaces the frame with a synthetic field.");
}

fn edge_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = pipeline.edge.params();
    egui::ComboBox::from_label("Method")
        .selected_text(p.method.label())
        .show_ui(ui, |ui| {
            for method in EdgeMethod::ALL {
                ui.selectable_value(&mut p.method, method, method.label());
            }
        });
    match p.method {
        EdgeMethod::Sobel => {
            ui.add(
                egui::Slider::new(&mut p.kernel_size, 1..=EdgeParams::MAX_KERNEL_SIZE)
                    .step_by(2.0)
                    .text("Kernel size"),
            );
        }
        EdgeMethod::Canny => {
            ui.add(egui::Slider::new(&mut p.low_threshold, 0..=255u8).text("Low threshold"));
            ui.add(egui::Slider::new(&mut p.high_threshold, 0..=255u8).text("High threshold"));
        }
    }
    ui.checkbox(&mut p.overlay, "Overlay onto original");
    pipeline.edge.set_params(p);
}

fn convolution_panel(ui: &mut Ui, pipeline: &mut Pipeline) {
    let mut p = *pipeline.convolution.params();
    ui.checkbox(&mut p.enabled, "Enable filter");
    ui.horizontal(|ui| {
        ui.radio_value(&mut p.size, KernelSize::Three, "3x3");
        ui.radio_value(&mut p.size, KernelSize::Five, "5x5");
    });
    egui::ComboBox::from_label("Preset")
        .selected_text(p.preset.label())
        .show_ui(ui, |ui| {
            for preset in KernelPreset::ALL {
                ui.selectable_value(&mut p.preset, preset, preset.label());
            }
        });
    if p.preset == KernelPreset::Custom {
        let side = p.size.side() as usize;
        egui::Grid::new("custom-kernel").show(ui, |ui| {
            for row in 0..side {
                for col in 0..side {
                    let index = row * side + col;
                    let value = match p.size {
                        KernelSize::Three => &mut p.custom3[index],
                        KernelSize::Five => &mut p.custom5[index],
                    };
                    ui.add(egui::DragValue::new(value).speed(0.1).fixed_decimals(2));
                }
                ui.end_row();
            }
        });
    } else {
        ui.label("Switch to the Custom preset to edit coefficients.");
    }
    pipeline.convolution.set_params(p);
}

fn sink_panel(ui: &mut Ui, pipeline: &Pipeline) {
    match pipeline.sink.output() {
        Some(frame) => {
            ui.label(format!(
                "Final frame: {}x{}, {} channel(s)",
                frame.width(),
                frame.height(),
                frame.channels(),
            ));
            ui.label("Use \"Save Output…\" in the toolbar to export.");
        }
        None => {
            ui.label("Nothing processed yet.");
        }
    }
}
