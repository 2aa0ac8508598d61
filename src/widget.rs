//! Widget Module — the concrete drawable variants.
//!
//! `Widget` is the one polymorphic point of a node: how it paints itself.
//! Tree linkage, position, styles and attributes live on `Drawable`; the
//! widget only sees the absolute position, size and current style it is
//! handed by the render pass.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::style::Style;
use crate::surface::Canvas;
use crate::texture;
use crate::types::{Position, Rect};

#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Draws nothing. Used by the null drawable sentinel.
    Null,
    Rect,
    Text(TextContent),
    Texture { path: String },
    VerticalLine,
}

impl Widget {
    pub fn text(content: &str) -> Self {
        Widget::Text(TextContent::new(content))
    }

    pub fn texture(path: &str) -> Self {
        Widget::Texture {
            path: path.to_string(),
        }
    }

    /// Builder type name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Widget::Null => "null",
            Widget::Rect => "rect",
            Widget::Text(_) => "text",
            Widget::Texture { .. } => "texture",
            Widget::VerticalLine => "vertical_line",
        }
    }

    /// Refresh cached state derived from size and style.
    pub fn update(&mut self, width: u32, style: &Style) {
        if let Widget::Text(text) = self {
            text.rewrap(width, !style.overflow);
        }
    }

    /// Paint the widget at `position`. Clipping is the canvas's concern.
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        position: Position,
        width: u32,
        height: u32,
        style: &Style,
    ) {
        let area = Rect::at(position, width, height);
        match self {
            Widget::Null => {}
            Widget::Rect => {
                if style.has_background {
                    canvas.fill_rect(area, style.color);
                }
            }
            Widget::Text(text) => {
                if style.has_background {
                    canvas.fill_rect(area, style.color);
                }
                for (row, line) in text.lines().iter().enumerate() {
                    let y = position.y.saturating_add(row as i32);
                    let mut col = 0i32;
                    for grapheme in line.graphemes(true) {
                        if let Some(ch) = grapheme.chars().next() {
                            canvas.put_char(position.x.saturating_add(col), y, ch, style.text_color, style.attrs);
                        }
                        col = col.saturating_add(UnicodeWidthStr::width(grapheme) as i32);
                    }
                }
            }
            Widget::Texture { path } => {
                if let Some(texture) = texture::get(path) {
                    let dest = if area.is_empty() {
                        Rect::at(position, texture.width, texture.height)
                    } else {
                        area
                    };
                    texture.blit(canvas, dest);
                }
            }
            Widget::VerticalLine => {
                let line = Rect::at(position, width.max(1), height);
                canvas.fill_rect(line, style.border_color);
            }
        }
    }
}

// ============================================================================
// Text
// ============================================================================

/// Text content plus its cached, wrapped display lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextContent {
    pub content: String,
    lines: Vec<String>,
}

impl TextContent {
    pub fn new(content: &str) -> Self {
        Self {
            content: content.to_string(),
            lines: split_lines(content),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn set(&mut self, content: &str, width: u32, wrap: bool) {
        self.content = content.to_string();
        self.rewrap(width, wrap);
    }

    /// Recompute display lines. A zero width never wraps.
    pub fn rewrap(&mut self, width: u32, wrap: bool) {
        self.lines = if wrap && width > 0 {
            wrap_text(&self.content, width as usize)
        } else {
            split_lines(&self.content)
        };
    }
}

fn split_lines(content: &str) -> Vec<String> {
    content.split('\n').map(str::to_string).collect()
}

fn push_line(lines: &mut Vec<String>, line: &mut String, line_width: &mut usize) {
    lines.push(line.trim_end().to_string());
    line.clear();
    *line_width = 0;
}

/// Word-wrap to `width` display columns. Words wider than a whole line are
/// broken at grapheme boundaries. Explicit newlines always break.
pub fn wrap_text(content: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for logical in content.split('\n') {
        let mut line = String::new();
        let mut line_width = 0usize;

        for word in logical.split_word_bounds() {
            let word_width = UnicodeWidthStr::width(word);
            if line_width + word_width <= width {
                line.push_str(word);
                line_width += word_width;
                continue;
            }
            if word.trim().is_empty() {
                // Whitespace at a break is swallowed
                push_line(&mut lines, &mut line, &mut line_width);
                continue;
            }
            if !line.is_empty() {
                push_line(&mut lines, &mut line, &mut line_width);
            }
            for grapheme in word.graphemes(true) {
                let grapheme_width = UnicodeWidthStr::width(grapheme);
                if line_width + grapheme_width > width && !line.is_empty() {
                    push_line(&mut lines, &mut line, &mut line_width);
                }
                line.push_str(grapheme);
                line_width += grapheme_width;
            }
        }
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCall, RecordingCanvas, Surface};
    use crate::types::{rgb, CellAttrs, COLOR_DEFAULT};

    #[test]
    fn test_wrap_at_word_boundaries() {
        assert_eq!(wrap_text("hello world", 5), vec!["hello", "world"]);
        assert_eq!(wrap_text("ab cd", 10), vec!["ab cd"]);
        assert_eq!(wrap_text("one two three", 8), vec!["one two", "three"]);
    }

    #[test]
    fn test_wrap_breaks_long_words_and_keeps_newlines() {
        assert_eq!(wrap_text("abcdefgh", 3), vec!["abc", "def", "gh"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 4), vec![""]);
    }

    #[test]
    fn test_wrap_counts_wide_glyphs() {
        // CJK glyphs occupy two columns each
        assert_eq!(wrap_text("世界世界", 4), vec!["世界", "世界"]);
    }

    #[test]
    fn test_overflow_disables_wrapping() {
        let mut text = TextContent::new("hello world");
        text.rewrap(5, true);
        assert_eq!(text.lines().len(), 2);
        text.rewrap(5, false);
        assert_eq!(text.lines(), &["hello world".to_string()]);
    }

    #[test]
    fn test_update_rewraps_text_with_style() {
        let mut widget = Widget::text("aa bb");
        let mut style = Style::default();
        widget.update(2, &style);
        match &widget {
            Widget::Text(t) => assert_eq!(t.lines().len(), 2),
            _ => unreachable!(),
        }
        style.overflow = true;
        widget.update(2, &style);
        match &widget {
            Widget::Text(t) => assert_eq!(t.lines().len(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_rect_fills_only_with_background() {
        let mut canvas = RecordingCanvas::new(20, 20);
        let mut style = Style::default();
        Widget::Rect.draw(&mut canvas, Position::new(1, 2), 3, 4, &style);
        assert!(canvas.calls.is_empty());

        style.has_background = true;
        style.color = rgb(9, 9, 9);
        Widget::Rect.draw(&mut canvas, Position::new(1, 2), 3, 4, &style);
        assert_eq!(canvas.calls, vec![DrawCall::Fill(Rect::new(1, 2, 3, 4), rgb(9, 9, 9))]);
    }

    #[test]
    fn test_null_draws_nothing() {
        let mut canvas = RecordingCanvas::new(5, 5);
        let style = Style {
            has_background: true,
            ..Style::default()
        };
        Widget::Null.draw(&mut canvas, Position::ORIGIN, 5, 5, &style);
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_text_draws_glyphs_with_text_color() {
        let mut surface = Surface::new(10, 3);
        let style = Style {
            text_color: rgb(255, 255, 255),
            attrs: CellAttrs::UNDERLINE,
            ..Style::default()
        };
        Widget::text("hi\nyo").draw(&mut surface, Position::new(2, 1), 0, 0, &style);

        let cell = surface.buffer.get(2, 1).unwrap();
        assert_eq!(cell.ch, 'h');
        assert_eq!(cell.fg, rgb(255, 255, 255));
        assert!(cell.attrs.contains(CellAttrs::UNDERLINE));
        assert_eq!(surface.buffer.get(3, 2).unwrap().ch, 'o');
        assert_eq!(surface.buffer.get(2, 1).unwrap().bg, COLOR_DEFAULT);
    }

    #[test]
    fn test_vertical_line_is_one_column() {
        let mut canvas = RecordingCanvas::new(10, 10);
        let style = Style::default();
        Widget::VerticalLine.draw(&mut canvas, Position::new(4, 0), 0, 6, &style);
        assert_eq!(canvas.fills(), vec![Rect::new(4, 0, 1, 6)]);
    }

    #[test]
    fn test_uncached_texture_draws_nothing() {
        let mut canvas = RecordingCanvas::new(10, 10);
        Widget::texture("memory://never-loaded").draw(
            &mut canvas,
            Position::ORIGIN,
            4,
            4,
            &Style::default(),
        );
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Widget::Rect.type_name(), "rect");
        assert_eq!(Widget::text("").type_name(), "text");
        assert_eq!(Widget::VerticalLine.type_name(), "vertical_line");
    }
}
