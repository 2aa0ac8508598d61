//! Shared types, enums, and constants.
//!
//! Geometry, color encoding, cells and the cell buffer live here because
//! every other module (tree, render, surface, terminal) exchanges them.

use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

use bitflags::bitflags;

// ============================================================================
// Position
// ============================================================================

/// Integer 2D point. Used as a node-local offset and, once propagated, as an
/// absolute surface coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl AddAssign for Position {
    fn add_assign(&mut self, rhs: Position) {
        *self = *self + rhs;
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, rhs: Position) -> Position {
        Position {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

impl Neg for Position {
    type Output = Position;

    fn neg(self) -> Position {
        Position {
            x: self.x.saturating_neg(),
            y: self.y.saturating_neg(),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Rect
// ============================================================================

/// Axis-aligned rectangle in absolute surface coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Sizes beyond `i32::MAX` are clamped.
    pub fn at(position: Position, w: u32, h: u32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            w: i32::try_from(w).unwrap_or(i32::MAX),
            h: i32::try_from(h).unwrap_or(i32::MAX),
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(self) -> i32 {
        self.x.saturating_add(self.w)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.h)
    }

    /// Intersect with another rect. Width and height never go negative, so
    /// a fully clipped region is an empty rect anchored inside `self`.
    pub fn intersect(self, other: Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        Rect {
            x: x1,
            y: y1,
            w: x2.saturating_sub(x1).max(0),
            h: y2.saturating_sub(y1).max(0),
        }
    }

    pub fn contains(self, sx: i32, sy: i32) -> bool {
        sx >= self.x && sx < self.right() && sy >= self.y && sy < self.bottom()
    }

    pub fn is_empty(self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

// ============================================================================
// Color Encoding (u32)
// ============================================================================
//
// Bits 31-24: Mode tag
//   0x00 = Default (terminal default)
//   0x01 = RGB truecolor (bits 23-0 = 0xRRGGBB)
//   0x02 = Indexed (bits 7-0 = palette index 0-255)

pub const COLOR_DEFAULT: u32 = 0x00000000;
pub const COLOR_BLACK: u32 = 0x01000000;
pub const COLOR_WHITE: u32 = 0x01FFFFFF;

pub fn color_tag(color: u32) -> u8 {
    ((color >> 24) & 0xFF) as u8
}

pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0x01000000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// A grey of the given shade, `0` black through `255` white.
pub fn shade(value: u8) -> u32 {
    rgb(value, value, value)
}

/// Look up a named color. Names are matched case-insensitively.
pub fn named_color(name: &str) -> Option<u32> {
    let color = match name.trim().to_ascii_lowercase().as_str() {
        "black" => COLOR_BLACK,
        "white" => COLOR_WHITE,
        "red" => rgb(255, 0, 0),
        "green" => rgb(0, 255, 0),
        "blue" => rgb(0, 0, 255),
        "yellow" => rgb(255, 255, 0),
        "cyan" => rgb(0, 255, 255),
        "magenta" => rgb(255, 0, 255),
        "grey" | "gray" => rgb(128, 128, 128),
        "orange" => rgb(255, 165, 0),
        "purple" => rgb(128, 0, 128),
        "default" | "none" => COLOR_DEFAULT,
        _ => return None,
    };
    Some(color)
}

pub fn color_to_crossterm(color: u32) -> Option<crossterm::style::Color> {
    match color_tag(color) {
        0x00 => None,
        0x01 => {
            let r = ((color >> 16) & 0xFF) as u8;
            let g = ((color >> 8) & 0xFF) as u8;
            let b = (color & 0xFF) as u8;
            Some(crossterm::style::Color::Rgb { r, g, b })
        }
        0x02 => {
            let index = (color & 0xFF) as u8;
            Some(crossterm::style::Color::AnsiValue(index))
        }
        _ => None, // Invalid tag — treat as Default
    }
}

// ============================================================================
// Cell Attributes (bitflags)
// ============================================================================

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellAttrs: u8 {
        const BOLD      = 0b0000_0001;
        const ITALIC    = 0b0000_0010;
        const UNDERLINE = 0b0000_0100;
    }
}

// ============================================================================
// Cell & Buffer
// ============================================================================

/// One surface pixel. A terminal cell carries a glyph on top of its
/// background, so text and fills share the same grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub fg: u32,
    pub bg: u32,
    pub attrs: CellAttrs,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: 0,
            bg: 0,
            attrs: CellAttrs::empty(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Buffer {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Buffer {
    pub fn new(width: u16, height: u16) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = (width as usize) * (height as usize);
        self.cells.resize(size, Cell::default());
        self.clear();
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[(y as usize) * (self.width as usize) + (x as usize)])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, x: u16, y: u16) -> Option<&mut Cell> {
        if x < self.width && y < self.height {
            Some(&mut self.cells[(y as usize) * (self.width as usize) + (x as usize)])
        } else {
            None
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }
}

/// A changed cell, produced by diffing two buffers.
#[derive(Debug, Clone)]
pub struct CellUpdate {
    pub x: u16,
    pub y: u16,
    pub cell: Cell,
}

// ============================================================================
// Input Events (internal, produced by TerminalBackend)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Key { code: u32, character: char },
    MouseMove { x: u16, y: u16 },
    MouseDown { x: u16, y: u16, button: u8 },
    Scroll { x: u16, y: u16, delta: i32 },
    Resize { width: u16, height: u16 },
}

pub mod key {
    pub const BACKSPACE: u32 = 0x0100;
    pub const ENTER: u32 = 0x0101;
    pub const LEFT: u32 = 0x0102;
    pub const RIGHT: u32 = 0x0103;
    pub const UP: u32 = 0x0104;
    pub const DOWN: u32 = 0x0105;
    pub const TAB: u32 = 0x010A;
    pub const ESCAPE: u32 = 0x010E;
    pub const F1: u32 = 0x0110;
}
