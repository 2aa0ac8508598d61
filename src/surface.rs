//! Surface Module — the drawing contract and its cell-grid implementation.
//!
//! Widgets and the render pass only ever talk to a `Canvas`. `Surface` is
//! the production canvas: a cell `Buffer` plus the active clip rectangle.
//! Every write outside the clip (or off the buffer) is silently dropped.

use crate::types::{Buffer, Cell, CellAttrs, Rect};

/// Drawing operations available to widgets during a render pass.
///
/// Coordinates are absolute surface coordinates. One cell is one pixel.
pub trait Canvas {
    /// Full drawable area.
    fn bounds(&self) -> Rect;

    fn set_clip_rect(&mut self, clip: Rect);

    fn clip_rect(&self) -> Rect;

    /// Paint the background of every cell in `rect`, erasing glyphs.
    fn fill_rect(&mut self, rect: Rect, color: u32);

    /// Outline `rect`. The lower-right pixel is not part of the outline;
    /// callers that need a closed ring draw it with `draw_point`.
    fn draw_rect(&mut self, rect: Rect, color: u32);

    fn draw_point(&mut self, x: i32, y: i32, color: u32);

    /// Place a glyph, keeping the cell's background.
    fn put_char(&mut self, x: i32, y: i32, ch: char, fg: u32, attrs: CellAttrs);
}

// ============================================================================
// Surface
// ============================================================================

pub struct Surface {
    pub buffer: Buffer,
    clip: Rect,
}

impl Surface {
    pub fn new(width: u16, height: u16) -> Self {
        let buffer = Buffer::new(width, height);
        let clip = buffer.bounds();
        Self { buffer, clip }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffer.resize(width, height);
        self.clip = self.buffer.bounds();
    }

    /// Blank every cell and drop any clip.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.clip = self.buffer.bounds();
    }

    /// Mutate one cell, respecting the clip rect.
    fn clip_update(&mut self, x: i32, y: i32, f: impl FnOnce(&mut Cell)) {
        if !self.clip.contains(x, y) || x < 0 || y < 0 {
            return;
        }
        if x > u16::MAX as i32 || y > u16::MAX as i32 {
            return;
        }
        if let Some(cell) = self.buffer.get_mut(x as u16, y as u16) {
            f(cell);
        }
    }

    fn paint(&mut self, x: i32, y: i32, color: u32) {
        self.clip_update(x, y, |cell| {
            cell.ch = ' ';
            cell.bg = color;
        });
    }
}

impl Canvas for Surface {
    fn bounds(&self) -> Rect {
        self.buffer.bounds()
    }

    fn set_clip_rect(&mut self, clip: Rect) {
        self.clip = clip;
    }

    fn clip_rect(&self) -> Rect {
        self.clip
    }

    fn fill_rect(&mut self, rect: Rect, color: u32) {
        let visible = rect.intersect(self.clip);
        for y in visible.y..visible.bottom() {
            for x in visible.x..visible.right() {
                self.paint(x, y, color);
            }
        }
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        if rect.is_empty() {
            return;
        }
        let right = rect.right() - 1;
        let bottom = rect.bottom() - 1;
        // Only the visible span of each edge is walked
        let visible = rect.intersect(self.clip);
        if visible.is_empty() {
            return;
        }
        let (x0, x1) = (visible.x, visible.right() - 1);
        let (y0, y1) = (visible.y, visible.bottom() - 1);
        for x in x0..=x1 {
            self.paint(x, rect.y, color);
            if x < right {
                self.paint(x, bottom, color);
            }
        }
        for y in y0..=y1.min(bottom.saturating_sub(1)) {
            self.paint(rect.x, y, color);
            self.paint(right, y, color);
        }
    }

    fn draw_point(&mut self, x: i32, y: i32, color: u32) {
        self.paint(x, y, color);
    }

    fn put_char(&mut self, x: i32, y: i32, ch: char, fg: u32, attrs: CellAttrs) {
        self.clip_update(x, y, |cell| {
            cell.ch = ch;
            cell.fg = fg;
            cell.attrs = attrs;
        });
    }
}

// ============================================================================
// Recording canvas (tests)
// ============================================================================

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DrawCall {
    Clip(Rect),
    Fill(Rect, u32),
    Outline(Rect, u32),
    Point(i32, i32, u32),
    Char(i32, i32, char),
}

/// Canvas that records every call, for asserting draw order.
#[cfg(test)]
pub(crate) struct RecordingCanvas {
    pub bounds: Rect,
    pub clip: Rect,
    pub calls: Vec<DrawCall>,
}

#[cfg(test)]
impl RecordingCanvas {
    pub fn new(width: i32, height: i32) -> Self {
        let bounds = Rect::new(0, 0, width, height);
        Self {
            bounds,
            clip: bounds,
            calls: Vec::new(),
        }
    }

    pub fn fills(&self) -> Vec<Rect> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Fill(r, _) => Some(*r),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl Canvas for RecordingCanvas {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn set_clip_rect(&mut self, clip: Rect) {
        self.clip = clip;
        self.calls.push(DrawCall::Clip(clip));
    }

    fn clip_rect(&self) -> Rect {
        self.clip
    }

    fn fill_rect(&mut self, rect: Rect, color: u32) {
        self.calls.push(DrawCall::Fill(rect, color));
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        self.calls.push(DrawCall::Outline(rect, color));
    }

    fn draw_point(&mut self, x: i32, y: i32, color: u32) {
        self.calls.push(DrawCall::Point(x, y, color));
    }

    fn put_char(&mut self, x: i32, y: i32, ch: char, _fg: u32, _attrs: CellAttrs) {
        self.calls.push(DrawCall::Char(x, y, ch));
    }
}
