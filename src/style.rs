//! Style Module — per-node style pair and style key application.
//!
//! Responsibilities:
//! - `Style` value type (colors, border, background/overflow/hidden flags)
//! - `StyleSlot` selector naming a node's current style
//! - Applying builder style keys (`border`, `background`, `x`, ...) to a node
//! - Best-effort color parsing (numeric shade first, then named color)

use std::collections::BTreeMap;

use crate::context::SceneContext;
use crate::types::{named_color, shade, CellAttrs, COLOR_BLACK, COLOR_DEFAULT};

/// Visual state of a node. Read by the render pass every frame; mutations
/// take effect on the next render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// Background color.
    pub color: u32,
    /// Glyph color for text widgets.
    pub text_color: u32,
    pub border_color: u32,
    /// Border thickness in cells.
    pub border_width: u32,
    pub has_background: bool,
    pub has_border: bool,
    pub overflow: bool,
    pub hidden: bool,
    pub attrs: CellAttrs,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: COLOR_DEFAULT,
            text_color: COLOR_DEFAULT,
            border_color: COLOR_BLACK,
            border_width: 1,
            has_background: false,
            has_border: false,
            overflow: false,
            hidden: false,
            attrs: CellAttrs::empty(),
        }
    }
}

/// Which of a node's two owned styles is current. A slot can only ever
/// resolve to the owning node's own style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StyleSlot {
    #[default]
    Default,
    Hover,
}

/// Parse a color value. An integer prefix is read as a grey shade (wrapping
/// into 0-255); anything else is looked up as a named color. Unknown names
/// fall back to the default color.
pub fn parse_color(value: &str) -> u32 {
    if let Some(number) = parse_leading_int(value) {
        return shade(number.rem_euclid(256) as u8);
    }
    match named_color(value) {
        Some(color) => color,
        None => {
            log::warn!("unknown color {value:?}, using default");
            COLOR_DEFAULT
        }
    }
}

/// Parse the leading (optionally signed) decimal digits of a value.
/// `"12px"` yields 12, `"red"` yields `None`.
fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['-', '+']));
    let digits_len = trimmed[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits_len == 0 {
        return None;
    }
    trimmed[..digits_start + digits_len].parse().ok()
}

fn parse_flag(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

/// Set the background color of both styles of a node.
pub fn set_color(ctx: &mut SceneContext, handle: u32, value: &str) -> Result<(), String> {
    let color = parse_color(value);
    let node = ctx.node_mut(handle)?;
    for style in [&mut node.default_style, &mut node.hover_style] {
        style.color = color;
        style.has_background = true;
    }
    Ok(())
}

/// Give a node a distinct hover background.
pub fn set_hover_color(ctx: &mut SceneContext, handle: u32, value: &str) -> Result<(), String> {
    let color = parse_color(value);
    let node = ctx.node_mut(handle)?;
    node.hover_style.color = color;
    node.hover_style.has_background = true;
    node.has_hover_style = true;
    Ok(())
}

/// Set a text decoration flag on both styles.
pub fn set_flag(
    ctx: &mut SceneContext,
    handle: u32,
    flag: CellAttrs,
    enabled: bool,
) -> Result<(), String> {
    let node = ctx.node_mut(handle)?;
    for style in [&mut node.default_style, &mut node.hover_style] {
        style.attrs.set(flag, enabled);
    }
    Ok(())
}

/// Apply one style key to a node.
///
/// Numeric keys that fail to parse are ignored with a warning; unknown keys
/// are ignored silently. Geometry keys go through the regular move/resize
/// paths so absolute positions stay consistent.
pub fn apply_style_attribute(
    ctx: &mut SceneContext,
    handle: u32,
    key: &str,
    value: &str,
) -> Result<(), String> {
    match key {
        "border" => {
            let node = ctx.node_mut(handle)?;
            node.default_style.has_border = true;
            node.hover_style.has_border = true;
            if !value.is_empty() && !parse_flag(value) {
                let color = parse_color(value);
                node.default_style.border_color = color;
                node.hover_style.border_color = color;
            }
        }
        "border_width" => match parse_leading_int(value).and_then(|w| u32::try_from(w).ok()) {
            Some(width) => {
                let node = ctx.node_mut(handle)?;
                node.default_style.border_width = width;
                node.hover_style.border_width = width;
            }
            _ => log::warn!("ignoring border_width {value:?} on node {handle}"),
        },
        "background" | "color" => set_color(ctx, handle, value)?,
        "hover" => set_hover_color(ctx, handle, value)?,
        "text_color" | "foreground" => {
            let color = parse_color(value);
            let node = ctx.node_mut(handle)?;
            node.default_style.text_color = color;
            node.hover_style.text_color = color;
        }
        "width" | "height" => match parse_leading_int(value).and_then(|s| u32::try_from(s).ok()) {
            Some(size) => {
                let node = ctx.node(handle)?;
                let (mut width, mut height) = (node.width, node.height);
                if key == "width" {
                    width = size;
                } else {
                    height = size;
                }
                crate::drawable::set_size(ctx, handle, width, height)?;
            }
            _ => log::warn!("ignoring {key} {value:?} on node {handle}"),
        },
        "x" | "y" => match parse_leading_int(value).and_then(|c| i32::try_from(c).ok()) {
            Some(coord) => {
                let mut position = ctx.node(handle)?.position;
                if key == "x" {
                    position.x = coord;
                } else {
                    position.y = coord;
                }
                crate::drawable::set_position(ctx, handle, position)?;
            }
            None => log::warn!("ignoring {key} {value:?} on node {handle}"),
        },
        "overflow" => {
            let overflow = parse_flag(value);
            let node = ctx.node_mut(handle)?;
            node.default_style.overflow = overflow;
            node.hover_style.overflow = overflow;
        }
        "scrollable" => ctx.node_mut(handle)?.scrollable = parse_flag(value),
        "bold" => set_flag(ctx, handle, CellAttrs::BOLD, parse_flag(value))?,
        "italic" => set_flag(ctx, handle, CellAttrs::ITALIC, parse_flag(value))?,
        "underline" => set_flag(ctx, handle, CellAttrs::UNDERLINE, parse_flag(value))?,
        _ => {}
    }
    Ok(())
}

/// Apply every recognized style key of a builder attribute map.
pub fn apply_style(
    ctx: &mut SceneContext,
    handle: u32,
    attributes: &BTreeMap<String, String>,
) -> Result<(), String> {
    for (key, value) in attributes {
        apply_style_attribute(ctx, handle, key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;
    use crate::types::{rgb, Position};
    use crate::widget::Widget;

    fn test_ctx() -> SceneContext {
        SceneContext::new()
    }

    #[test]
    fn test_parse_color_numeric_then_named() {
        assert_eq!(parse_color("0"), shade(0));
        assert_eq!(parse_color("200"), shade(200));
        assert_eq!(parse_color("300"), shade(44)); // wraps like an unsigned byte
        assert_eq!(parse_color("12abc"), shade(12));
        assert_eq!(parse_color("red"), rgb(255, 0, 0));
        assert_eq!(parse_color("no-such-color"), COLOR_DEFAULT);
    }

    #[test]
    fn test_set_color_applies_to_both_styles() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();

        set_color(&mut ctx, h, "blue").unwrap();
        let node = ctx.node(h).unwrap();
        assert_eq!(node.default_style.color, rgb(0, 0, 255));
        assert!(node.default_style.has_background);
        assert_eq!(node.hover_style.color, rgb(0, 0, 255));
        assert!(node.hover_style.has_background);
    }

    #[test]
    fn test_hover_key_marks_hover_style() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        assert!(!ctx.node(h).unwrap().has_hover_style);

        apply_style_attribute(&mut ctx, h, "hover", "yellow").unwrap();
        let node = ctx.node(h).unwrap();
        assert!(node.has_hover_style);
        assert_eq!(node.hover_style.color, rgb(255, 255, 0));
        assert!(!node.default_style.has_background);
    }

    #[test]
    fn test_geometry_keys() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();

        let mut attributes = BTreeMap::new();
        attributes.insert("x".to_string(), "10".to_string());
        attributes.insert("y".to_string(), "4".to_string());
        attributes.insert("width".to_string(), "30".to_string());
        attributes.insert("height".to_string(), "7".to_string());
        apply_style(&mut ctx, h, &attributes).unwrap();

        let node = ctx.node(h).unwrap();
        assert_eq!(node.position, Position::new(10, 4));
        assert_eq!(node.absolute_position, Position::new(10, 4));
        assert_eq!((node.width, node.height), (30, 7));
    }

    #[test]
    fn test_malformed_numbers_and_unknown_keys_ignored() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();

        apply_style_attribute(&mut ctx, h, "width", "wide").unwrap();
        apply_style_attribute(&mut ctx, h, "x", "left").unwrap();
        apply_style_attribute(&mut ctx, h, "sparkle", "yes").unwrap();

        let node = ctx.node(h).unwrap();
        assert_eq!(node.width, 0);
        assert_eq!(node.position, Position::ORIGIN);
        assert_eq!(node.default_style, Style::default());
    }

    #[test]
    fn test_out_of_range_numbers_ignored() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        apply_style_attribute(&mut ctx, h, "x", "7").unwrap();
        apply_style_attribute(&mut ctx, h, "width", "12").unwrap();

        apply_style_attribute(&mut ctx, h, "x", "5000000000").unwrap();
        apply_style_attribute(&mut ctx, h, "y", "-5000000000").unwrap();
        apply_style_attribute(&mut ctx, h, "width", "4294967296").unwrap();
        apply_style_attribute(&mut ctx, h, "height", "-1").unwrap();
        apply_style_attribute(&mut ctx, h, "border_width", "4294967300").unwrap();

        let node = ctx.node(h).unwrap();
        assert_eq!(node.position, Position::new(7, 0));
        assert_eq!((node.width, node.height), (12, 0));
        assert_eq!(node.default_style.border_width, Style::default().border_width);
    }

    #[test]
    fn test_border_and_overflow_keys() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::Rect).unwrap();

        apply_style_attribute(&mut ctx, h, "border", "red").unwrap();
        apply_style_attribute(&mut ctx, h, "border_width", "2").unwrap();
        apply_style_attribute(&mut ctx, h, "overflow", "true").unwrap();

        let style = ctx.node(h).unwrap().default_style;
        assert!(style.has_border);
        assert_eq!(style.border_color, rgb(255, 0, 0));
        assert_eq!(style.border_width, 2);
        assert!(style.overflow);

        // A bare `border` keeps the default border color
        let plain = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        apply_style_attribute(&mut ctx, plain, "border", "").unwrap();
        assert_eq!(ctx.node(plain).unwrap().default_style.border_color, COLOR_BLACK);
    }

    #[test]
    fn test_text_flags() {
        let mut ctx = test_ctx();
        let h = tree::create_node(&mut ctx, Widget::text("hi")).unwrap();

        apply_style_attribute(&mut ctx, h, "bold", "true").unwrap();
        assert!(ctx.node(h).unwrap().style().attrs.contains(CellAttrs::BOLD));

        apply_style_attribute(&mut ctx, h, "bold", "false").unwrap();
        assert!(!ctx.node(h).unwrap().style().attrs.contains(CellAttrs::BOLD));
    }
}
