use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use eframe::egui;
use egui::{Color32, Rect, Stroke, Vec2};

mod frames;

use frames::Frame;

/// Browse the generation files written by `halo_life -o`
#[derive(Parser, Debug)]
#[command(name = "grid_display")]
struct Cli {
    /// A single PGM file or a directory of out_<workers>_<generation>.pgm files
    #[arg(default_value = "ann")]
    path: PathBuf,
}

fn main() -> Result<(), eframe::Error> {
    let cli = Cli::parse();
    let app = GridApp::open(cli.path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([800.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native("Grid Display", options, Box::new(|_cc| Box::new(app)))
}

struct GridApp {
    path: PathBuf,
    frames: Vec<Frame>,
    current: usize,
    error: Option<String>,
    fg_color: Color32,
    bg_color: Color32,
    is_running: bool,
    update_interval: Duration,
    last_update: Instant,
}

impl GridApp {
    fn open(path: PathBuf) -> Self {
        let mut app = Self {
            path,
            frames: Vec::new(),
            current: 0,
            error: None,
            fg_color: Color32::BLACK,
            bg_color: Color32::WHITE,
            is_running: false,
            update_interval: Duration::from_millis(250),
            last_update: Instant::now(),
        };
        app.reload();
        app
    }

    fn reload(&mut self) {
        match frames::load(&self.path) {
            Ok(frames) => {
                self.current = self.current.min(frames.len().saturating_sub(1));
                self.frames = frames;
                self.error = None;
            }
            Err(err) => {
                self.frames.clear();
                self.current = 0;
                self.error = Some(err.to_string());
            }
        }
    }

    fn step(&mut self, forward: bool) {
        if self.frames.is_empty() {
            return;
        }
        let last = self.frames.len() - 1;
        self.current = match (forward, self.current) {
            (true, c) if c == last => 0,
            (true, c) => c + 1,
            (false, 0) => last,
            (false, c) => c - 1,
        };
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("⏮ Prev").clicked() {
                self.is_running = false;
                self.step(false);
            }
            let button_text = if self.is_running { "⏸ Pause" } else { "▶ Play" };
            if ui.button(button_text).clicked() {
                self.is_running = !self.is_running;
                self.last_update = Instant::now();
            }
            if ui.button("Next ⏭").clicked() {
                self.is_running = false;
                self.step(true);
            }
            if ui.button("⟳ Reload").clicked() {
                self.reload();
            }

            ui.separator();

            if !self.frames.is_empty() {
                egui::ComboBox::from_id_source("frame_selector")
                    .selected_text(self.frames[self.current].label())
                    .show_ui(ui, |ui| {
                        for (i, frame) in self.frames.iter().enumerate() {
                            ui.selectable_value(&mut self.current, i, frame.label());
                        }
                    });
            }
        });

        ui.horizontal(|ui| {
            ui.label("Speed:");
            let mut speed = 1000.0 / self.update_interval.as_millis().max(1) as f32;
            if ui.add(egui::Slider::new(&mut speed, 0.5..=60.0).suffix(" frames/sec")).changed() {
                self.update_interval = Duration::from_millis((1000.0 / speed) as u64);
            }

            ui.separator();

            ui.label("Live:");
            ui.color_edit_button_srgba(&mut self.fg_color);
            ui.label("Dead:");
            ui.color_edit_button_srgba(&mut self.bg_color);
        });
    }

    fn draw_grid(&self, ui: &mut egui::Ui, frame: &Frame) {
        let spacing = if frame.size > 100 { 0.0 } else { 0.5 };
        let available = ui.available_width().min(ui.available_height() - 40.0).max(50.0);
        let box_size = ((available / frame.size as f32) - spacing).clamp(1.0, 15.0);

        let start_pos = ui.cursor().min;
        let total_size = Vec2::splat((box_size + spacing) * frame.size as f32 - spacing);
        let (_response, painter) = ui.allocate_painter(total_size, egui::Sense::hover());

        painter.rect_filled(Rect::from_min_size(start_pos, total_size), 0.0, self.bg_color);

        for row in 0..frame.size {
            for col in 0..frame.size {
                if !frame.alive(row, col) {
                    continue;
                }
                let x = start_pos.x + col as f32 * (box_size + spacing);
                let y = start_pos.y + row as f32 * (box_size + spacing);
                let rect = Rect::from_min_size(egui::pos2(x, y), Vec2::splat(box_size));
                painter.rect_filled(rect, 0.0, self.fg_color);
                if spacing > 0.0 {
                    painter.rect_stroke(rect, 0.0, Stroke::new(0.2, Color32::GRAY));
                }
            }
        }
    }
}

impl eframe::App for GridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.is_running && self.last_update.elapsed() >= self.update_interval {
            self.step(true);
            self.last_update = Instant::now();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Generations in {}", self.path.display()));
            self.controls(ui);
            ui.separator();

            if let Some(err) = &self.error {
                ui.colored_label(Color32::RED, err);
                return;
            }
            let Some(frame) = self.frames.get(self.current) else {
                return;
            };

            self.draw_grid(ui, frame);
            ui.separator();

            let total = frame.size * frame.size;
            let live = frame.live_cells();
            ui.horizontal(|ui| {
                ui.label(format!("{0}x{0}", frame.size));
                ui.label(format!("Live cells: {live}"));
                ui.label(format!("Dead cells: {}", total - live));
                ui.label(format!("Population: {:.1}%", live as f32 / total.max(1) as f32 * 100.0));
            });
        });

        if self.is_running {
            ctx.request_repaint();
        }
    }
}
