use digit_mlp::{MlpClassifier, IMAGE_SIZE, INPUT_SIZE, OUTPUT_SIZE};

use eframe::egui;
use egui::{pos2, vec2, Color32, Rect, Stroke, Vec2};

const MODEL_PATH: &str = "trained_network.bin";
const CELL_SIZE: f32 = 20.0;
const CANVAS_SIDE: f32 = CELL_SIZE * IMAGE_SIZE as f32;

/// Drawing surface with one cell per network input. A cell is either dark (0.0) or lit (1.0).
struct Canvas {
    cells: Vec<f32>,
}

impl Canvas {
    fn new() -> Self {
        Canvas { cells: vec![0.0; INPUT_SIZE] }
    }

    /// Index of the cell under `offset`, measured from the canvas' top-left corner
    /// on a canvas `side` points wide.
    fn cell_at(offset: Vec2, side: f32) -> Option<usize> {
        if offset.x < 0.0 || offset.y < 0.0 || side <= 0.0 {
            return None;
        }
        let col = (offset.x * IMAGE_SIZE as f32 / side) as usize;
        let row = (offset.y * IMAGE_SIZE as f32 / side) as usize;
        (col < IMAGE_SIZE && row < IMAGE_SIZE).then_some(row * IMAGE_SIZE + col)
    }

    /// Lights the cell under `offset`. Returns whether anything changed.
    fn paint(&mut self, offset: Vec2, side: f32) -> bool {
        match Self::cell_at(offset, side) {
            Some(idx) if self.cells[idx] < 1.0 => {
                self.cells[idx] = 1.0;
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        self.cells.fill(0.0);
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|&c| c == 0.0)
    }

    /// Normalized network input, row by row.
    fn input(&self) -> &[f32] {
        &self.cells
    }

    fn render(&self, painter: &egui::Painter, rect: Rect) {
        painter.rect_filled(rect, 0.0, Color32::BLACK);

        let cell = rect.width() / IMAGE_SIZE as f32;
        for (idx, _) in self.cells.iter().enumerate().filter(|&(_, &c)| c > 0.0) {
            let (row, col) = (idx / IMAGE_SIZE, idx % IMAGE_SIZE);
            let min = rect.min + vec2(col as f32 * cell, row as f32 * cell);
            painter.rect_filled(Rect::from_min_size(min, Vec2::splat(cell)), 0.0, Color32::WHITE);
        }

        let grid = Stroke::new(1.0, Color32::from_gray(40));
        for k in 1..IMAGE_SIZE {
            let at = k as f32 * cell;
            painter.line_segment(
                [pos2(rect.min.x + at, rect.min.y), pos2(rect.min.x + at, rect.max.y)],
                grid,
            );
            painter.line_segment(
                [pos2(rect.min.x, rect.min.y + at), pos2(rect.max.x, rect.min.y + at)],
                grid,
            );
        }
    }
}

struct DrawApp {
    net: Option<MlpClassifier>,
    canvas: Canvas,
    prediction: Option<(usize, [f32; OUTPUT_SIZE])>,
    status: String,
}

impl DrawApp {
    fn new(model_path: &str) -> Self {
        let (net, status) = match MlpClassifier::from_file(model_path) {
            Ok(net) => (
                Some(net),
                format!("Loaded {}. Enter predicts, Space clears.", model_path),
            ),
            Err(e) => (None, format!("Could not load model: {}", e)),
        };
        DrawApp { net, canvas: Canvas::new(), prediction: None, status }
    }

    fn reset(&mut self) {
        self.canvas.clear();
        self.prediction = None;
    }

    fn predict(&mut self) {
        let Some(net) = &self.net else {
            return;
        };
        if self.canvas.is_blank() {
            self.status = "Canvas is empty".to_string();
            return;
        }
        match net.predict_proba(self.canvas.input()) {
            Ok(probs) => {
                let digit = digit_mlp::helpers::argmax(&probs);
                log::info!("Prediction: {}", digit);
                self.prediction = Some((digit, probs));
            }
            Err(e) => self.status = format!("Prediction failed: {}", e),
        }
    }
}

impl eframe::App for DrawApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let (clear, enter) =
            ctx.input(|i| (i.key_pressed(egui::Key::Space), i.key_pressed(egui::Key::Enter)));
        if clear {
            self.reset();
        }
        if enter {
            self.predict();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Draw a digit");
            ui.label(&self.status);

            let (response, painter) =
                ui.allocate_painter(Vec2::splat(CANVAS_SIDE), egui::Sense::click_and_drag());
            if response.is_pointer_button_down_on() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.canvas.paint(pos - response.rect.min, response.rect.width());
                }
            }
            self.canvas.render(&painter, response.rect);

            ui.horizontal(|ui| {
                if ui.button("Clear").clicked() {
                    self.reset();
                }
                if ui.add_enabled(self.net.is_some(), egui::Button::new("Predict")).clicked() {
                    self.predict();
                }
            });

            if let Some((digit, probs)) = &self.prediction {
                ui.separator();
                ui.heading(format!("Prediction: {}", digit));
                for (class, &p) in probs.iter().enumerate() {
                    ui.add(
                        egui::ProgressBar::new(p).text(format!("{}: {:.1}%", class, p * 100.0)),
                    );
                }
            }
        });
    }
}

fn main() -> Result<(), eframe::Error> {
    pretty_env_logger::init();

    let model_path = std::env::args().nth(1).unwrap_or_else(|| MODEL_PATH.to_string());
    let app = DrawApp::new(&model_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([600.0, 900.0]),
        ..Default::default()
    };

    eframe::run_native("Digit MLP canvas", options, Box::new(|_cc| Ok(Box::new(app))))
}
