use eframe::egui::{self, Align2, Color32, FontId, Mesh, Pos2, Rect, Sense, Shape, Stroke, Vec2};

use notch_delta_lattice::lattice::hexagon_vertices;
use notch_delta_lattice::notch_delta::{notch_color, CellSnapshot, BOUNDARY_COLOR};
use notch_delta_lattice::simulation::Simulation;

const COLORBAR_WIDTH: f32 = 90.0;

pub struct LatticeApp {
    simulation: Simulation,
    hovered: Option<CellSnapshot>,
}

impl LatticeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, simulation: Simulation) -> Self {
        Self {
            simulation,
            hovered: None,
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Notch-Delta Signaling");

        let mut params = *self.simulation.params();
        ui.add(egui::Slider::new(&mut params.alpha_n, 0.0..=5.0).text("alpha N"));
        ui.add(egui::Slider::new(&mut params.beta_n, 0.0..=5.0).text("beta N"));
        ui.add(egui::Slider::new(&mut params.alpha_d, 0.0..=5.0).text("alpha D"));
        ui.add(egui::Slider::new(&mut params.beta_d, 0.0..=5.0).text("beta D"));
        ui.add(egui::Slider::new(&mut params.gamma_d, 0.0..=10.0).text("gamma D"));
        ui.add(egui::Slider::new(&mut params.lambda, 0.0..=1.0).text("lambda"));
        self.simulation.set_params(params);

        let mut steps = self.simulation.steps_per_frame();
        ui.add(egui::Slider::new(&mut steps, 1..=20).text("steps/frame"));
        self.simulation.set_steps_per_frame(steps);

        ui.horizontal(|ui| {
            if ui
                .button(if self.simulation.is_running() {
                    "Stop simulation"
                } else {
                    "Start simulation"
                })
                .clicked()
            {
                self.simulation.toggle();
            }

            if ui.button("Reset").clicked() {
                self.simulation.reset();
            }
        });

        ui.separator();
        let geometry = self.simulation.geometry();
        ui.label(format!("Lattice: {} x {}", geometry.columns, geometry.rows));
        ui.label(format!("Cells: {}", self.simulation.field().len()));
        ui.label(format!("Seed: {}", self.simulation.seed()));
        ui.label(format!(
            "Parameter revision: {}",
            self.simulation.params_revision()
        ));

        if let Some(cell) = self.hovered {
            ui.separator();
            ui.label(if cell.is_boundary {
                "Boundary cell".to_owned()
            } else {
                format!(
                    "N {:.3}  D {:.3}  signal {:.3}",
                    cell.notch, cell.delta, cell.notch_signal
                )
            });
        }
    }

    fn draw_visuals(&mut self, ui: &mut egui::Ui) {
        let features = self.simulation.features();
        let field = self.simulation.field();
        let mut hovered = None;

        ui.horizontal(|ui| {
            ui.label(format!("mean D: {:.4}", features.mean_delta));
            ui.separator();
            ui.label(format!("variance: {:.5}", features.delta_variance));
            ui.separator();
            ui.label(format!("signal: {:.4}", features.mean_signal));
            ui.separator();
            ui.label(format!("senders: {:.1}%", features.sender_fraction * 100.0));
            ui.separator();
            ui.label(format!("contrast: {:.4}", features.lateral_contrast));
            ui.separator();
            ui.label(format!("flux: {:.5}", features.temporal_flux));
            ui.separator();
            ui.label(format!("t = {:.1}", field.time()));
        });

        ui.separator();

        let geometry = self.simulation.geometry();
        let canvas = Vec2::new(geometry.canvas_width, geometry.canvas_height);
        let available = ui.available_size() - Vec2::new(COLORBAR_WIDTH, 0.0);
        let scale = (available.x / canvas.x)
            .min(available.y / canvas.y)
            .clamp(0.3, 3.0);

        ui.horizontal(|ui| {
            let (response, painter) = ui.allocate_painter(canvas * scale, Sense::hover());
            let origin = response.rect.min;
            let radius = field.topology().radius();
            let stroke = Stroke::new(1.0, Color32::BLACK);
            let pointer = response
                .hover_pos()
                .map(|pos| (pos - origin) / scale);

            for cell in field.cells() {
                let [r, g, b] = if cell.is_boundary {
                    BOUNDARY_COLOR
                } else {
                    notch_color(cell.notch_signal)
                };
                if let Some(p) = pointer {
                    let [x, y] = cell.position;
                    if (p.x - x).hypot(p.y - y) < radius * 0.85 {
                        hovered = Some(cell);
                    }
                }
                let points = hexagon_vertices(cell.position, radius)
                    .iter()
                    .map(|&[x, y]| origin + Vec2::new(x, y) * scale)
                    .collect();
                painter.add(Shape::convex_polygon(
                    points,
                    Color32::from_rgb(r, g, b),
                    stroke,
                ));
            }

            let (response, painter) =
                ui.allocate_painter(Vec2::new(COLORBAR_WIDTH, canvas.y * scale), Sense::hover());
            draw_colorbar(&painter, response.rect, ui.visuals().text_color());
        });

        self.hovered = hovered;
    }
}

/// Vertical legend: high signal on top, low at the bottom.
fn draw_colorbar(painter: &egui::Painter, area: Rect, text_color: Color32) {
    let font = FontId::proportional(14.0);
    let bar = Rect::from_min_max(
        Pos2::new(area.left() + 10.0, area.top() + 20.0),
        Pos2::new(area.left() + 40.0, area.bottom() - 20.0),
    );

    let [hr, hg, hb] = notch_color(1.0);
    let [lr, lg, lb] = notch_color(0.0);
    let high = Color32::from_rgb(hr, hg, hb);
    let low = Color32::from_rgb(lr, lg, lb);

    let mut mesh = Mesh::default();
    mesh.colored_vertex(bar.left_top(), high);
    mesh.colored_vertex(bar.right_top(), high);
    mesh.colored_vertex(bar.left_bottom(), low);
    mesh.colored_vertex(bar.right_bottom(), low);
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(1, 3, 2);
    painter.add(Shape::mesh(mesh));

    painter.text(
        Pos2::new(area.left() + 2.0, area.top()),
        Align2::LEFT_TOP,
        "Notch Signaling",
        font.clone(),
        text_color,
    );
    painter.text(
        Pos2::new(bar.right() + 8.0, bar.top()),
        Align2::LEFT_TOP,
        "High",
        font.clone(),
        text_color,
    );
    painter.text(
        Pos2::new(bar.right() + 8.0, bar.bottom()),
        Align2::LEFT_BOTTOM,
        "Low",
        font,
        text_color,
    );
}

impl eframe::App for LatticeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.simulation.frame();

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(290.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_controls(ui);
                    });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_visuals(ui);
        });

        if self.simulation.is_running() {
            ctx.request_repaint();
        }
    }
}
