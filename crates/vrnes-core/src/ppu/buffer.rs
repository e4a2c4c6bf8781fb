//! Pixel storage shared by the background and sprite pipelines.

use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Number of pixels in one frame.
pub(crate) const FRAME_PIXELS: usize = SCREEN_WIDTH * SCREEN_HEIGHT;

/// Mask bit: background was drawn opaque at this pixel.
pub(crate) const BG_OPAQUE: u16 = 0x100;
/// Mask value of a pixel no sprite has claimed yet.
pub(crate) const NO_SPRITE: u16 = 65;

/// The visible frame, the background row buffer and the per-pixel mask.
///
/// The mask's low byte holds the lowest sprite slot that drew the pixel;
/// [`BG_OPAQUE`] marks pixels where the background is not transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrameBuffers {
    pub(crate) pixels: Vec<u32>,
    pub(crate) background: Vec<u32>,
    pub(crate) mask: Vec<u16>,
    /// Previous frame, compared row by row for dirty tracking.
    old_frame: Vec<u32>,
    pub(crate) changed_rows: Vec<bool>,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self {
            pixels: vec![0; FRAME_PIXELS],
            background: vec![0; FRAME_PIXELS],
            mask: vec![0; FRAME_PIXELS],
            old_frame: vec![u32::MAX; FRAME_PIXELS],
            changed_rows: vec![true; SCREEN_HEIGHT],
        }
    }
}

impl FrameBuffers {
    /// Paints the whole frame in the background color and releases every
    /// pixel for sprites.
    pub(crate) fn start_frame(&mut self, color: u32) {
        self.pixels.fill(color);
        self.mask.fill(NO_SPRITE);
    }

    /// Copies opaque background pixels of `rows` over the frame.
    pub(crate) fn composite_background(&mut self, rows: core::ops::Range<usize>) {
        let start = rows.start * SCREEN_WIDTH;
        let end = (rows.end * SCREEN_WIDTH).min(FRAME_PIXELS);
        for i in start..end {
            if self.mask[i] > 0xFF {
                self.pixels[i] = self.background[i];
            }
        }
    }

    /// Flags which of `rows` differ from the previous frame.
    pub(crate) fn track_changes(&mut self, rows: core::ops::Range<usize>) {
        for row in rows.start..rows.end.min(SCREEN_HEIGHT) {
            let span = row * SCREEN_WIDTH..(row + 1) * SCREEN_WIDTH;
            let changed = self.pixels[span.clone()] != self.old_frame[span.clone()];
            self.changed_rows[row] = changed;
            if changed {
                self.old_frame[span.clone()].copy_from_slice(&self.pixels[span]);
            }
        }
    }

    /// Forgets the previous frame so every row reports as changed.
    pub(crate) fn invalidate(&mut self) {
        self.old_frame.fill(u32::MAX);
        self.changed_rows.fill(true);
    }

    pub(crate) fn fill_rect(&mut self, x: core::ops::Range<usize>, y: core::ops::Range<usize>, color: u32) {
        for row in y {
            let base = row * SCREEN_WIDTH;
            self.pixels[base + x.start..base + x.end].fill(color);
        }
    }
}
