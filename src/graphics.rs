use flappy_evo::simulation::agent::StrategyKind;
use flappy_evo::simulation::params::Params;
use flappy_evo::simulation::state::{Entrant, SimulationState};
use macroquad::prelude::*;

const SKY: Color = Color::new(0.31, 0.75, 0.79, 1.0);
const GROUND: Color = Color::new(0.87, 0.84, 0.58, 1.0);
const GRASS: Color = Color::new(0.45, 0.75, 0.18, 1.0);
const PIPE: Color = Color::new(0.33, 0.62, 0.16, 1.0);
const PIPE_EDGE: Color = Color::new(0.2, 0.4, 0.1, 1.0);
const BIRD: Color = Color::new(0.98, 0.78, 0.16, 0.85);
const REFLEX_BIRD: Color = Color::new(0.91, 0.36, 0.24, 0.85);
const KEYBOARD_BIRD: Color = Color::new(0.96, 0.96, 0.96, 0.95);

/// Game area drawn at the left of the window, scaled to the window height.
trait ToScreen {
    type Output;
    fn to_screen(&self, params: &Params) -> Self::Output;
}

impl ToScreen for f32 {
    type Output = f32;
    fn to_screen(&self, params: &Params) -> f32 {
        self * (screen_height() / params.screen_height)
    }
}

impl ToScreen for (f32, f32) {
    type Output = Vec2;
    fn to_screen(&self, params: &Params) -> Vec2 {
        vec2(self.0.to_screen(params), self.1.to_screen(params))
    }
}

/// Width in window pixels of the game area.
pub fn game_width(params: &Params) -> f32 {
    params.screen_width.to_screen(params)
}

pub fn draw_scene(state: &SimulationState) {
    let params = state.params();
    let width = game_width(params);

    draw_rectangle(0.0, 0.0, width, screen_height(), SKY);
    draw_pipes(state);
    draw_ground(params);
    draw_birds(state);
}

fn draw_pipes(state: &SimulationState) {
    let params = state.params();
    let sprites = state.sprites();
    let w = (sprites.pipe_width() as f32).to_screen(params);
    let h = (sprites.pipe_height() as f32).to_screen(params);

    for pair in state.pipes().iter() {
        for top in [pair.upper_y, pair.lower_y] {
            let pos = (pair.x, top).to_screen(params);
            draw_rectangle(pos.x, pos.y, w, h, PIPE);
            draw_rectangle_lines(pos.x, pos.y, w, h, 2.0, PIPE_EDGE);
        }
    }
}

fn draw_ground(params: &Params) {
    let y = params.ground_y.to_screen(params);
    let width = game_width(params);
    draw_rectangle(0.0, y, width, screen_height() - y, GROUND);
    draw_rectangle(0.0, y, width, 4.0_f32.to_screen(params), GRASS);
}

fn draw_birds(state: &SimulationState) {
    let params = state.params();
    let sprites = state.sprites();
    let w = (sprites.bird_width() as f32).to_screen(params);
    let h = (sprites.bird_height() as f32).to_screen(params);

    let mid_frame = (sprites.bird_frame_count() as f32 - 1.0) / 2.0;

    for Entrant { bird, controller } in state.entrants() {
        let color = match controller.kind() {
            StrategyKind::Neural => BIRD,
            StrategyKind::Reflex => REFLEX_BIRD,
            StrategyKind::Keyboard => KEYBOARD_BIRD,
        };
        let centre = (bird.x, bird.y).to_screen(params) + vec2(w / 2.0, h / 2.0);
        // positive rotation tilts the beak up
        let rotation = -bird.visible_rotation(params).to_radians();
        draw_rectangle_ex(
            centre.x,
            centre.y,
            w,
            h,
            DrawRectangleParams {
                offset: vec2(0.5, 0.5),
                rotation,
                color,
            },
        );

        // wing, shifted by animation frame
        let wing_y = centre.y + (bird.frame as f32 - mid_frame) * 4.0_f32.to_screen(params);
        draw_circle(centre.x - w * 0.25, wing_y, h * 0.2, WHITE);
    }

    let score = state.birds().map(|b| b.score).max().unwrap_or(0);
    let text = score.to_string();
    let font_size = 48.0_f32.to_screen(params);
    let size = measure_text(&text, None, font_size as u16, 1.0);
    draw_text(
        &text,
        game_width(params) / 2.0 - size.width / 2.0,
        (0.1 * params.screen_height).to_screen(params) + size.height,
        font_size,
        WHITE,
    );
}

pub fn draw_message(text: &str, params: &Params) {
    let font_size = 24.0_f32.to_screen(params);
    let size = measure_text(text, None, font_size as u16, 1.0);
    draw_text(
        text,
        game_width(params) / 2.0 - size.width / 2.0,
        screen_height() / 2.0 - size.height / 2.0,
        font_size,
        DARKGRAY,
    );
}
