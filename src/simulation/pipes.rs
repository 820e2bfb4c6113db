//! Pipe generation and the FIFO pipe sequence.
//!
//! Pipes enter at the tail (right of the screen) and leave from the front
//! (left of the screen), so the sequence is always sorted by x and the pipe
//! nearest a bird is found by looking at the first two entries.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::params::Params;

/// New pipes are only generated while fewer than this many pairs exist.
const MAX_PAIRS: usize = 3;
/// The front pipe triggers generation on the tick it scrolls past this x.
const SPAWN_LINE: f32 = 5.0;

/// An upper and a lower pipe sharing one x position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipePair {
    /// Left edge of both pipes.
    pub x: f32,
    /// Top of the gap window.
    pub gap_y: f32,
    /// Top edge of the upper pipe sprite.
    pub upper_y: f32,
    /// Top edge of the lower pipe sprite.
    pub lower_y: f32,
}

impl PipePair {
    /// Places a pair so that the gap window spans `[gap_y, gap_y + gap)`.
    pub fn new(x: f32, gap_y: f32, gap: f32, pipe_height: u32) -> Self {
        Self {
            x,
            gap_y,
            upper_y: gap_y - pipe_height as f32,
            lower_y: gap_y + gap,
        }
    }

    /// Horizontal centre of the pipes.
    pub fn mid_x(&self, width: u32) -> f32 {
        self.x + width as f32 / 2.0
    }
}

/// Draws a gap row uniformly from `[0.2 * ground_y, 0.8 * ground_y - gap)`.
///
/// Rows are whole pixels, so the draw is over the integers inside that range.
pub fn random_gap_y<R: Rng + ?Sized>(rng: &mut R, params: &Params) -> f32 {
    let low = params.min_gap_y();
    let high = params.max_gap_y().max(low + 1);
    rng.random_range(low..high) as f32
}

/// What [`PipeQueue::maintain`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Maintenance {
    /// A new pair was appended.
    pub spawned: bool,
    /// The front pair was retired.
    pub retired: bool,
}

/// Ordered pipe pairs, oldest (leftmost) first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipeQueue {
    pairs: VecDeque<PipePair>,
}

impl PipeQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the queue holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates pairs from left to right.
    pub fn iter(&self) -> impl Iterator<Item = &PipePair> {
        self.pairs.iter()
    }

    /// The leftmost pair.
    pub fn front(&self) -> Option<&PipePair> {
        self.pairs.front()
    }

    /// Removes every pair.
    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Appends a pair at the tail.
    ///
    /// Pairs must be pushed in non-decreasing x order.
    pub fn push(&mut self, pair: PipePair) {
        debug_assert!(
            self.pairs.back().is_none_or(|back| back.x <= pair.x),
            "pipe pushed left of the tail"
        );
        self.pairs.push_back(pair);
    }

    /// Generates a pair with a random gap at `x` and appends it.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        x: f32,
        params: &Params,
        pipe_height: u32,
    ) -> PipePair {
        let pair = PipePair::new(x, random_gap_y(rng, params), params.pipe_gap, pipe_height);
        self.push(pair);
        pair
    }

    /// Moves every pair horizontally by `dx`.
    pub fn scroll(&mut self, dx: f32) {
        for pair in &mut self.pairs {
            pair.x += dx;
        }
    }

    /// Spawns a pair when the front pipe crosses the spawn line this tick (or
    /// when fewer than two pairs are left) and retires the front pair once it
    /// is fully off screen.
    ///
    /// Expects to run once per tick, after a scroll by `-params.pipe_speed`.
    pub fn maintain<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        params: &Params,
        pipe_width: u32,
        pipe_height: u32,
    ) -> Maintenance {
        let mut done = Maintenance::default();

        let crossed = self.pairs.front().is_some_and(|front| {
            front.x < SPAWN_LINE && front.x + params.pipe_speed >= SPAWN_LINE
        });
        if self.pairs.len() < MAX_PAIRS && (crossed || self.pairs.len() < 2) {
            let x = params.screen_width + params.pipe_spawn_offset;
            self.spawn(rng, x, params, pipe_height);
            done.spawned = true;
        }

        if self
            .pairs
            .front()
            .is_some_and(|front| front.x < -(pipe_width as f32))
        {
            self.pairs.pop_front();
            done.retired = true;
        }

        done
    }

    /// The pair a bird at `bird_x` should steer for.
    ///
    /// Looks at the next two pairs and takes the first whose x is no further
    /// than `margin` behind the bird.
    ///
    /// # Panics
    ///
    /// Panics if the queue is empty; episodes seed pipes before any bird acts.
    pub fn nearest(&self, bird_x: f32, margin: f32) -> &PipePair {
        self.pairs
            .iter()
            .take(2)
            .find(|pair| pair.x >= bird_x - margin)
            .or_else(|| self.pairs.front())
            .expect("pipe sequence is seeded before birds act")
    }

    /// Whether the pairs are ordered by x.
    pub fn is_sorted(&self) -> bool {
        self.pairs
            .iter()
            .zip(self.pairs.iter().skip(1))
            .all(|(a, b)| a.x <= b.x)
    }
}
