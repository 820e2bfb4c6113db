//! Bird entity and its per-tick physics.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::collision::Collision;
use super::params::Params;

/// Wing animation frame order.
const WING_CYCLE: [usize; 4] = [0, 1, 2, 1];
/// The wing frame advances every this many ticks.
const WING_PERIOD: u32 = 3;
/// Length of the animation tick counter before it wraps.
const ANIM_WRAP: u32 = 30;

/// Stable identifier of a bird within a [`SimulationState`](super::state::SimulationState).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BirdId(pub u64);

impl fmt::Display for BirdId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bird#{}", self.0)
    }
}

/// A single bird.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bird {
    /// Stable identifier.
    pub id: BirdId,
    /// Horizontal position (fixed for the episode).
    pub x: f32,
    /// Vertical position of the sprite's top edge.
    pub y: f32,
    /// Vertical velocity (positive is down).
    pub vel_y: f32,
    /// Rotation in degrees.
    pub rot: f32,
    /// Set by a successful flap, cleared during integration.
    pub flapped: bool,
    /// Set once the bird crashed.
    pub dead: bool,
    /// Pipes passed.
    pub score: u32,
    /// What killed the bird, if anything.
    pub crash: Option<Collision>,
    /// Current wing animation frame.
    pub frame: usize,
    anim_tick: u32,
    cycle_pos: usize,
}

impl Bird {
    /// Creates a bird mid-flap at `(x, y)`, the way every episode starts.
    pub fn new(id: BirdId, x: f32, y: f32, params: &Params) -> Self {
        Self {
            id,
            x,
            y,
            vel_y: params.flap_velocity,
            rot: params.flap_rotation,
            flapped: false,
            dead: false,
            score: 0,
            crash: None,
            frame: WING_CYCLE[0],
            anim_tick: 0,
            cycle_pos: 0,
        }
    }

    /// Whether the bird is still flying.
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Applies a flap if the bird is not too far above the screen.
    ///
    /// Returns whether the flap took effect; a dropped request is not an error.
    pub fn flap(&mut self, params: &Params, height: u32) -> bool {
        if self.y > -2.0 * height as f32 {
            self.vel_y = params.flap_velocity;
            self.flapped = true;
            true
        } else {
            false
        }
    }

    /// Advances rotation, velocity and position by one tick.
    ///
    /// Descent is clamped so the sprite never sinks below the ground line.
    pub fn integrate(&mut self, params: &Params, height: u32) {
        if self.rot > params.min_rotation {
            self.rot -= params.rotation_speed;
        }

        if self.vel_y < params.max_velocity_y && !self.flapped {
            self.vel_y += params.gravity;
        }
        if self.flapped {
            self.flapped = false;
            self.rot = params.flap_rotation;
        }

        self.y += self.vel_y.min(params.ground_y - self.y - height as f32);
    }

    /// Advances the wing animation.
    pub fn animate(&mut self) {
        if (self.anim_tick + 1) % WING_PERIOD == 0 {
            self.cycle_pos = (self.cycle_pos + 1) % WING_CYCLE.len();
            self.frame = WING_CYCLE[self.cycle_pos];
        }
        self.anim_tick = (self.anim_tick + 1) % ANIM_WRAP;
    }

    /// Marks the bird as crashed.
    pub fn kill(&mut self, crash: Collision) {
        self.dead = true;
        self.crash = Some(crash);
    }

    /// Rotation to draw, capped so a climbing bird does not tilt too far.
    pub fn visible_rotation(&self, params: &Params) -> f32 {
        self.rot.min(params.rotation_threshold)
    }

    /// Horizontal centre of the sprite.
    pub fn mid_x(&self, width: u32) -> f32 {
        self.x + width as f32 / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: u32 = 24;

    fn bird() -> Bird {
        Bird::new(BirdId(0), 57.0, 200.0, &Params::default())
    }

    #[test]
    fn test_gravity_accelerates_until_cap() {
        let params = Params::default();
        let mut b = bird();
        for _ in 0..40 {
            b.integrate(&params, H);
            assert!(b.vel_y <= params.max_velocity_y);
        }
        assert!((b.vel_y - params.max_velocity_y).abs() < f32::EPSILON);
    }

    #[test]
    fn test_flap_resets_velocity_and_rotation() {
        let params = Params::default();
        let mut b = bird();
        b.vel_y = 7.0;
        b.rot = -60.0;
        assert!(b.flap(&params, H));
        b.integrate(&params, H);
        assert!((b.vel_y - params.flap_velocity).abs() < f32::EPSILON);
        assert!((b.rot - params.flap_rotation).abs() < f32::EPSILON);
        assert!(!b.flapped);
    }

    #[test]
    fn test_flap_ignored_far_above_screen() {
        let params = Params::default();
        let mut b = bird();
        b.y = -2.0 * H as f32;
        b.vel_y = 3.0;
        assert!(!b.flap(&params, H));
        assert!((b.vel_y - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rotation_bottoms_out() {
        let params = Params::default();
        let mut b = bird();
        b.y = 0.0;
        for _ in 0..100 {
            b.integrate(&params, H);
            b.y = 0.0;
        }
        assert!(b.rot <= params.min_rotation);
        assert!(b.rot > params.min_rotation - params.rotation_speed);
        assert!((b.visible_rotation(&params) - b.rot).abs() < f32::EPSILON);
    }

    #[test]
    fn test_descent_clamped_at_ground() {
        let params = Params::default();
        let mut b = bird();
        for _ in 0..200 {
            b.integrate(&params, H);
            assert!(b.y <= params.ground_y - H as f32 + 1e-3);
        }
        assert!((b.y - (params.ground_y - H as f32)).abs() < 1e-3);
    }

    #[test]
    fn test_wing_cycle() {
        let mut b = bird();
        let frames: Vec<usize> = (0..12)
            .map(|_| {
                b.animate();
                b.frame
            })
            .collect();
        assert_eq!(frames, vec![0, 0, 1, 1, 1, 2, 2, 2, 1, 1, 1, 0]);
    }
}
