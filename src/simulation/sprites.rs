//! Sprite hit-mask resources.
//!
//! A [`SpriteSet`] is built once per session and shared read-only (usually
//! behind an `Arc`) by everything that needs sprite geometry. Masks can come
//! from decoded image data via [`HitMask::from_rgba`] or from the procedural
//! [`SpriteSet::classic`] set, which mirrors the shapes of the original art.

use super::collision::HitMask;
use super::error::{Error, Result};

/// Width of the classic bird sprite.
pub const BIRD_WIDTH: u32 = 34;
/// Height of the classic bird sprite.
pub const BIRD_HEIGHT: u32 = 24;
/// Width of the classic pipe sprite.
pub const PIPE_WIDTH: u32 = 52;
/// Height of the classic pipe sprite.
pub const PIPE_HEIGHT: u32 = 320;

/// Rows of the pipe lip at the open end.
const PIPE_LIP_ROWS: u32 = 26;
/// Transparent columns on each side of the pipe body below the lip.
const PIPE_BODY_INSET: u32 = 2;

/// Hit masks for every sprite that takes part in collisions.
#[derive(Debug, Clone)]
pub struct SpriteSet {
    bird_frames: Vec<HitMask>,
    upper_pipe: HitMask,
    lower_pipe: HitMask,
}

impl SpriteSet {
    /// Creates a sprite set from bird animation frames and the lower pipe mask.
    ///
    /// The upper pipe is the lower pipe flipped vertically. All bird frames
    /// must share the same dimensions.
    pub fn new(bird_frames: Vec<HitMask>, lower_pipe: HitMask) -> Result<Self> {
        let Some(first) = bird_frames.first() else {
            return Err(Error::InvalidSprite("at least one bird frame is required".into()));
        };
        if let Some(bad) = bird_frames
            .iter()
            .find(|f| f.width() != first.width() || f.height() != first.height())
        {
            return Err(Error::InvalidSprite(format!(
                "bird frame is {}x{}, expected {}x{}",
                bad.width(),
                bad.height(),
                first.width(),
                first.height()
            )));
        }
        if lower_pipe.width() == 0 || lower_pipe.height() == 0 {
            return Err(Error::InvalidSprite("pipe sprite is empty".into()));
        }

        Ok(Self {
            upper_pipe: lower_pipe.flipped_vertical(),
            lower_pipe,
            bird_frames,
        })
    }

    /// The built-in sprite set: an oval bird with three wing poses and a
    /// lipped pipe.
    pub fn classic() -> Self {
        let bird_frames = [4, 9, 13]
            .into_iter()
            .map(|wing_top| bird_mask(BIRD_WIDTH, BIRD_HEIGHT, wing_top))
            .collect();

        let pipe = HitMask::from_fn(PIPE_WIDTH, PIPE_HEIGHT, |x, y| {
            y < PIPE_LIP_ROWS || (PIPE_BODY_INSET..PIPE_WIDTH - PIPE_BODY_INSET).contains(&x)
        });

        Self {
            upper_pipe: pipe.flipped_vertical(),
            lower_pipe: pipe,
            bird_frames,
        }
    }

    /// Bird sprite width (taken from the first frame).
    pub fn bird_width(&self) -> u32 {
        self.bird_frames[0].width()
    }

    /// Bird sprite height (taken from the first frame).
    pub fn bird_height(&self) -> u32 {
        self.bird_frames[0].height()
    }

    /// Number of bird animation frames.
    pub fn bird_frame_count(&self) -> usize {
        self.bird_frames.len()
    }

    /// Hit mask for an animation frame; out-of-range frames wrap around.
    pub fn bird_mask(&self, frame: usize) -> &HitMask {
        &self.bird_frames[frame % self.bird_frames.len()]
    }

    /// Pipe sprite width.
    pub fn pipe_width(&self) -> u32 {
        self.lower_pipe.width()
    }

    /// Pipe sprite height.
    pub fn pipe_height(&self) -> u32 {
        self.lower_pipe.height()
    }

    /// Mask of the upper (flipped) pipe.
    pub fn upper_pipe(&self) -> &HitMask {
        &self.upper_pipe
    }

    /// Mask of the lower pipe.
    pub fn lower_pipe(&self) -> &HitMask {
        &self.lower_pipe
    }
}

impl Default for SpriteSet {
    fn default() -> Self {
        Self::classic()
    }
}

/// Oval body plus a wing blob on the left whose height selects the pose.
fn bird_mask(width: u32, height: u32, wing_top: u32) -> HitMask {
    let cx = (width as f32 - 1.0) / 2.0;
    let cy = (height as f32 - 1.0) / 2.0;
    let rx = width as f32 / 2.0;
    let ry = height as f32 / 2.0;

    HitMask::from_fn(width, height, |x, y| {
        let nx = (x as f32 - cx) / rx;
        let ny = (y as f32 - cy) / ry;
        let body = nx * nx + ny * ny <= 1.0;
        let wing = x < 10 && (wing_top..wing_top + 6).contains(&y);
        body || wing
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_dimensions() {
        let sprites = SpriteSet::classic();
        assert_eq!(sprites.bird_width(), BIRD_WIDTH);
        assert_eq!(sprites.bird_height(), BIRD_HEIGHT);
        assert_eq!(sprites.pipe_width(), PIPE_WIDTH);
        assert_eq!(sprites.pipe_height(), PIPE_HEIGHT);
        assert_eq!(sprites.bird_frame_count(), 3);
    }

    #[test]
    fn test_bird_has_transparent_corners() {
        let sprites = SpriteSet::classic();
        let mask = sprites.bird_mask(0);
        assert!(!mask.is_opaque(BIRD_WIDTH - 1, 0));
        assert!(!mask.is_opaque(BIRD_WIDTH - 1, BIRD_HEIGHT - 1));
        assert!(mask.is_opaque(BIRD_WIDTH / 2, BIRD_HEIGHT / 2));
    }

    #[test]
    fn test_pipe_lip_is_at_the_open_end() {
        let sprites = SpriteSet::classic();
        // lower pipe opens upward, upper pipe opens downward
        assert!(sprites.lower_pipe().is_opaque(0, 0));
        assert!(!sprites.lower_pipe().is_opaque(0, PIPE_HEIGHT - 1));
        assert!(sprites.upper_pipe().is_opaque(0, PIPE_HEIGHT - 1));
        assert!(!sprites.upper_pipe().is_opaque(0, 0));
    }

    #[test]
    fn test_mismatched_frames_rejected() {
        let frames = vec![HitMask::solid(4, 4), HitMask::solid(5, 4)];
        assert!(SpriteSet::new(frames, HitMask::solid(2, 2)).is_err());
        assert!(SpriteSet::new(Vec::new(), HitMask::solid(2, 2)).is_err());
    }
}
