use eframe::egui;
use egui_plot::{Bar, BarChart, Line, Plot};
use replwatch_lib::classify::OutputDisplay;
use replwatch_lib::image::RgbaImage;
use replwatch_lib::plot::{Figure, Series, Style};
use replwatch_lib::surface::{Field, LabelSlot};
use replwatch_lib::{UiEvent, View, WidgetId};
use std::collections::HashMap;

const MINUTE_MS: i64 = 60_000;

/// Host-side state that outlives a frame: text being typed and uploaded
/// image textures.
#[derive(Default)]
pub struct PanelState {
    edits: HashMap<(WidgetId, Field), String>,
    textures: HashMap<WidgetId, egui::TextureHandle>,
}

impl PanelState {
    pub fn forget(&mut self, id: WidgetId) {
        self.edits.retain(|(owner, _), _| *owner != id);
        self.textures.remove(&id);
    }
}

fn field_name(field: Field) -> &'static str {
    match field {
        Field::Input => "Value",
        Field::Position => "Position",
        Field::Window => "Window",
    }
}

fn slot_name(slot: LabelSlot) -> Option<&'static str> {
    match slot {
        LabelSlot::Elapsed => Some("Elapsed"),
        LabelSlot::Total => Some("Total"),
        LabelSlot::Frame => Some("Frame"),
        LabelSlot::Input | LabelSlot::Function => None,
    }
}

/// Draw one widget's last view and collect the interactions it produced.
pub fn show_view(
    ui: &mut egui::Ui,
    id: WidgetId,
    kind: &str,
    view: &View,
    state: &mut PanelState,
) -> Vec<UiEvent> {
    let mut events = Vec::new();

    if view.labels.contains_key(&LabelSlot::Input) || view.output.is_some() {
        ui.horizontal(|ui| {
            if let Some(input) = view.label(LabelSlot::Input) {
                ui.monospace(input);
            }
            if let Some(function) = view.label(LabelSlot::Function) {
                ui.add_enabled(view.connection != Some(false), egui::Label::new(function));
            }
            match &view.output {
                Some(OutputDisplay::Indicator(on)) => {
                    let color = if *on {
                        egui::Color32::GREEN
                    } else {
                        egui::Color32::RED
                    };
                    ui.colored_label(color, "⏺");
                }
                Some(OutputDisplay::Literal(text)) | Some(OutputDisplay::Name(text)) => {
                    ui.monospace(text);
                }
                None => {}
            }
        });
    }

    if !view.items.is_empty() {
        let selected = view.selected.unwrap_or(0);
        let current = view.items.get(selected).cloned().unwrap_or_default();
        egui::ComboBox::from_id_salt(("items", id.0))
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (index, item) in view.items.iter().enumerate() {
                    if ui.selectable_label(index == selected, item).clicked() {
                        events.push(UiEvent::ItemSelected { index });
                    }
                }
            });
    }

    for (&field, text) in &view.fields {
        ui.horizontal(|ui| {
            ui.label(field_name(field));
            let key = (id, field);
            let mut buffer = state.edits.get(&key).cloned().unwrap_or_else(|| text.clone());
            let response = ui.add(egui::TextEdit::singleline(&mut buffer).desired_width(96.0));
            if response.changed() {
                events.push(UiEvent::TextEdited {
                    field,
                    text: buffer.clone(),
                });
                state.edits.insert(key, buffer);
            }
            if response.lost_focus() && state.edits.contains_key(&key) {
                if ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    events.push(UiEvent::TextCommitted { field });
                } else {
                    events.push(UiEvent::EditCancelled { field });
                }
                state.edits.remove(&key);
            }
        });
    }

    if let Some(slider) = view.slider {
        ui.horizontal(|ui| {
            if kind != "video" && ui.small_button("◀").clicked() {
                events.push(UiEvent::Backward);
            }
            let mut value = slider.value;
            let max = slider.max.max(slider.min);
            if ui
                .add(egui::Slider::new(&mut value, slider.min..=max).show_value(false))
                .changed()
            {
                events.push(UiEvent::SliderMoved { value });
            }
            if kind != "video" && ui.small_button("▶").clicked() {
                events.push(UiEvent::Forward);
            }
        });
    }

    if let Some(playing) = view.playing {
        ui.horizontal(|ui| {
            let label = if playing { "Stop" } else { "Play" };
            if ui.button(label).clicked() {
                events.push(if playing { UiEvent::Stop } else { UiEvent::Play });
            }
            if kind == "video" {
                for (text, delta_ms) in [
                    ("-10 min", -10 * MINUTE_MS),
                    ("-1 min", -MINUTE_MS),
                    ("+1 min", MINUTE_MS),
                    ("+10 min", 10 * MINUTE_MS),
                ] {
                    if ui.small_button(text).clicked() {
                        events.push(UiEvent::Seek { delta_ms });
                    }
                }
            }
        });
    }

    let clocks: Vec<String> = view
        .labels
        .iter()
        .filter_map(|(&slot, text)| slot_name(slot).map(|name| format!("{name}: {text}")))
        .collect();
    if !clocks.is_empty() {
        ui.label(clocks.join("   "));
    }

    if let Some(enabled) = view.connection {
        let mut connected = enabled;
        if ui.checkbox(&mut connected, "Connected").changed() {
            events.push(UiEvent::ToggleConnection { enabled: connected });
        }
    }

    if let Some(figure) = &view.figure {
        Plot::new(("figure", id.0)).height(240.0).show(ui, |plot_ui| {
            plot_figure(plot_ui, figure);
        });
    }

    if let Some(image) = &view.image {
        show_image(ui, id, image, state);
    }

    events
}

fn show_image(ui: &mut egui::Ui, id: WidgetId, image: &RgbaImage, state: &mut PanelState) {
    if image.width == 0 || image.height == 0 {
        return;
    }
    let bytes: Vec<u8> = image.pixels.iter().flatten().copied().collect();
    let color_image = egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &bytes);
    let texture = match state.textures.get_mut(&id) {
        Some(texture) => {
            texture.set(color_image, egui::TextureOptions::NEAREST);
            texture.clone()
        }
        None => {
            let texture =
                ui.ctx()
                    .load_texture(format!("widget-{}", id.0), color_image, egui::TextureOptions::NEAREST);
            state.textures.insert(id, texture.clone());
            texture
        }
    };
    let scale = (320.0 / image.width.max(image.height) as f32).max(1.0);
    let size = egui::vec2(image.width as f32 * scale, image.height as f32 * scale);
    ui.add(egui::Image::new((texture.id(), size)));
}

fn plot_figure(plot_ui: &mut egui_plot::PlotUi, figure: &Figure) {
    for series in &figure.series {
        match series {
            Series::Line(line) => {
                plot_ui.line(
                    Line::new(line.points.clone())
                        .stroke(stroke_from_style(&line.style))
                        .name(line.name.clone()),
                );
            }
            Series::Histogram(hist) => {
                let bars = hist
                    .edges
                    .windows(2)
                    .zip(&hist.counts)
                    .map(|(edge, &count)| {
                        Bar::new((edge[0] + edge[1]) / 2.0, count).width((edge[1] - edge[0]).abs())
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .color(color_from_u32(hist.style.color.0))
                        .name(hist.name.clone()),
                );
            }
        }
    }
}

fn stroke_from_style(style: &Style) -> egui::Stroke {
    egui::Stroke::new(style.width, color_from_u32(style.color.0))
}

fn color_from_u32(color: u32) -> egui::Color32 {
    let r = ((color >> 16) & 0xFF) as u8;
    let g = ((color >> 8) & 0xFF) as u8;
    let b = (color & 0xFF) as u8;
    egui::Color32::from_rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_unpack_from_rgb_words() {
        assert_eq!(color_from_u32(0x1f77b4), egui::Color32::from_rgb(0x1f, 0x77, 0xb4));
    }

    #[test]
    fn forgetting_a_widget_drops_its_edits() {
        let mut state = PanelState::default();
        state.edits.insert((WidgetId(1), Field::Position), "4".into());
        state.edits.insert((WidgetId(2), Field::Position), "7".into());
        state.forget(WidgetId(1));
        assert_eq!(state.edits.len(), 1);
        assert!(state.edits.contains_key(&(WidgetId(2), Field::Position)));
    }
}
