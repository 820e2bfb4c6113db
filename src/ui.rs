use std::collections::VecDeque;

use egui_macroquad::egui;
use egui_plot::{Line, Plot, PlotPoints};
use flappy_evo::simulation::evolution::GenerationStats;
use flappy_evo::simulation::state::SimulationState;

const MAX_HISTORY_POINTS: usize = 500;

pub struct UIState {
    pub stats_panel_width: f32,
    pub simulation_speed: f32,
    pub rendering_enabled: bool,
    pub status_message: Option<String>,
    best_history: VecDeque<(f64, f64)>,
    mean_history: VecDeque<(f64, f64)>,
}

impl UIState {
    pub fn new() -> Self {
        Self {
            stats_panel_width: 260.0,
            simulation_speed: 1.0,
            rendering_enabled: true,
            status_message: None,
            best_history: VecDeque::new(),
            mean_history: VecDeque::new(),
        }
    }

    pub fn record_generation(&mut self, stats: &GenerationStats) {
        let x = f64::from(stats.generation);
        self.best_history.push_back((x, stats.best));
        self.mean_history.push_back((x, stats.mean));
        if self.best_history.len() > MAX_HISTORY_POINTS {
            self.best_history.pop_front();
            self.mean_history.pop_front();
        }
    }
}

/// What the side panel shows besides the simulation state.
pub struct Hud<'a> {
    pub title: &'a str,
    pub generation: Option<u32>,
    pub fitness: Option<f64>,
}

pub fn draw_ui(state: &mut UIState, sim: &SimulationState, hud: &Hud<'_>) {
    egui_macroquad::ui(|egui_ctx| {
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::from_rgb(240, 240, 240));
        egui_ctx.set_visuals(visuals);

        egui::SidePanel::right("stats_panel")
            .default_width(state.stats_panel_width)
            .resizable(false)
            .show(egui_ctx, |ui| {
                ui.heading(hud.title);
                ui.separator();

                ui.label("Simulation Speed");
                ui.add(egui::Slider::new(&mut state.simulation_speed, 0.25..=50.0).text("x"));

                ui.horizontal(|ui| {
                    let button_text = if state.rendering_enabled {
                        "Rendering: ON"
                    } else {
                        "Rendering: OFF"
                    };
                    if ui.button(button_text).clicked() {
                        state.rendering_enabled = !state.rendering_enabled;
                    }
                });

                if let Some(ref msg) = state.status_message {
                    ui.label(msg);
                }

                ui.separator();

                if let Some(generation) = hud.generation {
                    ui.label(format!("Generation: {}", generation));
                }
                ui.label(format!("Alive: {}", sim.alive()));
                ui.label(format!("Tick: {}", sim.tick()));
                ui.label(format!("Best score: {}", sim.best_score()));
                if let Some(fitness) = hud.fitness {
                    ui.label(format!("Fitness: {:.1}", fitness));
                }

                if !state.best_history.is_empty() {
                    ui.separator();
                    ui.label("Fitness per generation");
                    draw_fitness_plot(ui, state);
                }
            });
    });
}

fn draw_fitness_plot(ui: &mut egui::Ui, state: &UIState) {
    let best: PlotPoints = state.best_history.iter().map(|&(x, y)| [x, y]).collect();
    let mean: PlotPoints = state.mean_history.iter().map(|&(x, y)| [x, y]).collect();

    Plot::new("fitness_plot")
        .height(180.0)
        .show_axes([true, true])
        .label_formatter(|name, value| {
            format!("{}: Generation: {:.0}, Fitness: {:.1}", name, value.x, value.y)
        })
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(best)
                    .color(egui::Color32::from_rgb(255, 200, 60))
                    .name("best"),
            );
            plot_ui.line(
                Line::new(mean)
                    .color(egui::Color32::from_rgb(100, 150, 255))
                    .name("mean"),
            );
        });
}

pub fn process_egui() {
    egui_macroquad::draw();
}
