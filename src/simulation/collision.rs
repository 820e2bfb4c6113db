//! Pixel-exact collision detection between sprites.
//!
//! Every sprite carries a [`HitMask`] derived from its alpha channel. Two
//! sprites collide only when an opaque pixel of one lands on an opaque pixel of
//! the other, so the transparent padding around the bird never counts as a hit.

use serde::{Deserialize, Serialize};

use super::bird::Bird;
use super::error::{Error, Result};
use super::pipes::PipeQueue;
use super::sprites::SpriteSet;

/// Integer axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub w: i32,
    /// Height in pixels.
    pub h: i32,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Builds a rectangle from a floating point position; coordinates truncate toward zero.
    pub fn at(x: f32, y: f32, w: u32, h: u32) -> Self {
        Self::new(x as i32, y as i32, w as i32, h as i32)
    }

    /// Returns the overlapping area of both rectangles, or `None` if it is empty.
    pub fn clip(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.w).min(other.x + other.w);
        let bottom = (self.y + self.h).min(other.y + other.h);

        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Per-pixel opacity of a sprite, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitMask {
    width: u32,
    height: u32,
    opaque: Vec<bool>,
}

impl HitMask {
    /// Builds a mask by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut opaque = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                opaque.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            opaque,
        }
    }

    /// A fully opaque mask.
    pub fn solid(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    /// Builds a mask from RGBA8 pixel data; any non-zero alpha is opaque.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidSprite(format!(
                "{}x{} RGBA image needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            )));
        }
        let opaque = rgba.chunks_exact(4).map(|px| px[3] != 0).collect();
        Ok(Self {
            width,
            height,
            opaque,
        })
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the pixel at `(x, y)` is opaque. Out-of-range pixels are transparent.
    #[inline]
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.opaque[(y * self.width + x) as usize]
    }

    /// Returns the mask mirrored top to bottom.
    pub fn flipped_vertical(&self) -> Self {
        Self::from_fn(self.width, self.height, |x, y| {
            self.is_opaque(x, self.height - 1 - y)
        })
    }
}

/// Outcome of a crash test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Collision {
    /// The bird is clear.
    None,
    /// The bird hit a pipe.
    Pipe,
    /// The bird touched the ground.
    Ground,
}

impl Collision {
    /// Whether this outcome kills the bird.
    pub fn is_crash(self) -> bool {
        self != Collision::None
    }
}

/// Tests whether two sprites placed at `rect1` and `rect2` overlap on opaque pixels.
///
/// Only the clipped sub-rectangle is scanned. The test is symmetric in its
/// arguments.
pub fn pixel_collision(rect1: &Rect, rect2: &Rect, mask1: &HitMask, mask2: &HitMask) -> bool {
    let Some(clip) = rect1.clip(rect2) else {
        return false;
    };

    let (x1, y1) = ((clip.x - rect1.x) as u32, (clip.y - rect1.y) as u32);
    let (x2, y2) = ((clip.x - rect2.x) as u32, (clip.y - rect2.y) as u32);

    for dx in 0..clip.w as u32 {
        for dy in 0..clip.h as u32 {
            if mask1.is_opaque(x1 + dx, y1 + dy) && mask2.is_opaque(x2 + dx, y2 + dy) {
                return true;
            }
        }
    }
    false
}

/// Checks a bird against the ground and every pipe pair, front to back.
pub fn check_crash(bird: &Bird, pipes: &PipeQueue, sprites: &SpriteSet, ground_y: f32) -> Collision {
    let bird_w = sprites.bird_width();
    let bird_h = sprites.bird_height();

    if bird.y + bird_h as f32 >= ground_y - 1.0 {
        return Collision::Ground;
    }

    let bird_rect = Rect::at(bird.x, bird.y, bird_w, bird_h);
    let bird_mask = sprites.bird_mask(bird.frame);
    let (pipe_w, pipe_h) = (sprites.pipe_width(), sprites.pipe_height());

    for pair in pipes.iter() {
        let upper = Rect::at(pair.x, pair.upper_y, pipe_w, pipe_h);
        let lower = Rect::at(pair.x, pair.lower_y, pipe_w, pipe_h);

        if pixel_collision(&bird_rect, &upper, bird_mask, sprites.upper_pipe())
            || pixel_collision(&bird_rect, &lower, bird_mask, sprites.lower_pipe())
        {
            return Collision::Pipe;
        }
    }

    Collision::None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(size: u32) -> HitMask {
        // opaque border, transparent centre
        HitMask::from_fn(size, size, |x, y| x == 0 || y == 0 || x == size - 1 || y == size - 1)
    }

    #[test]
    fn test_clip_disjoint_and_touching() {
        let a = Rect::new(0, 0, 10, 10);
        assert!(a.clip(&Rect::new(20, 20, 5, 5)).is_none());
        // sharing an edge is not an overlap
        assert!(a.clip(&Rect::new(10, 0, 5, 5)).is_none());
        assert_eq!(a.clip(&Rect::new(5, 5, 10, 10)), Some(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn test_rect_truncates_toward_zero() {
        let r = Rect::at(10.9, -3.7, 4, 4);
        assert_eq!((r.x, r.y), (10, -3));
    }

    #[test]
    fn test_transparent_padding_does_not_collide() {
        let hollow = ring(10);
        let dot = HitMask::solid(2, 2);
        // dot sits inside the transparent middle of the ring
        assert!(!pixel_collision(
            &Rect::new(0, 0, 10, 10),
            &Rect::new(4, 4, 2, 2),
            &hollow,
            &dot
        ));
        // dot overlaps the opaque border
        assert!(pixel_collision(
            &Rect::new(0, 0, 10, 10),
            &Rect::new(-1, 4, 2, 2),
            &hollow,
            &dot
        ));
    }

    #[test]
    fn test_collision_is_symmetric() {
        let a = ring(12);
        let b = HitMask::from_fn(7, 5, |x, y| (x + y) % 3 == 0);
        let ra = Rect::new(0, 0, 12, 12);
        for ox in -8..14 {
            for oy in -6..14 {
                let rb = Rect::new(ox, oy, 7, 5);
                assert_eq!(
                    pixel_collision(&ra, &rb, &a, &b),
                    pixel_collision(&rb, &ra, &b, &a),
                    "asymmetric at offset ({ox}, {oy})"
                );
            }
        }
    }

    #[test]
    fn test_from_rgba_reads_alpha() {
        let rgba = [255, 0, 0, 0, 0, 255, 0, 128];
        let mask = HitMask::from_rgba(2, 1, &rgba).unwrap();
        assert!(!mask.is_opaque(0, 0));
        assert!(mask.is_opaque(1, 0));
        assert!(HitMask::from_rgba(2, 2, &rgba).is_err());
    }

    #[test]
    fn test_flip_vertical() {
        let mask = HitMask::from_fn(3, 4, |_, y| y == 0);
        let flipped = mask.flipped_vertical();
        assert!(flipped.is_opaque(1, 3));
        assert!(!flipped.is_opaque(1, 0));
        for y in 0..4 {
            for x in 0..3 {
                assert_eq!(flipped.is_opaque(x, y), mask.is_opaque(x, 3 - y));
            }
        }
    }
}
