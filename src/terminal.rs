//! TerminalBackend trait + CrosstermBackend implementation.
//!
//! The application loop depends on this trait, not on crossterm directly,
//! so tests can drive it with a scripted mock and CI can run headless.

#[cfg(test)]
use std::collections::VecDeque;

use crate::types::{CellUpdate, InputEvent};

// ============================================================================
// TerminalBackend Trait
// ============================================================================

pub trait TerminalBackend {
    fn init(&mut self) -> Result<(), String>;
    fn shutdown(&mut self) -> Result<(), String>;
    fn size(&self) -> (u16, u16);
    fn set_title(&mut self, title: &str) -> Result<(), String>;
    fn write_diff(&mut self, diff: &[CellUpdate]) -> Result<(), String>;
    fn flush(&mut self) -> Result<(), String>;
    fn read_events(&mut self, timeout_ms: u32) -> Vec<InputEvent>;

    /// Downcast support for test code. Returns self as Any for type-safe downcasting.
    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

// ============================================================================
// CrosstermBackend
// ============================================================================

pub struct CrosstermBackend {
    width: u16,
    height: u16,
}

impl CrosstermBackend {
    pub fn new() -> Self {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        Self {
            width: w,
            height: h,
        }
    }
}

impl Default for CrosstermBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalBackend for CrosstermBackend {
    fn init(&mut self) -> Result<(), String> {
        use crossterm::{
            cursor,
            event::EnableMouseCapture,
            terminal::{enable_raw_mode, EnterAlternateScreen},
            ExecutableCommand,
        };

        enable_raw_mode().map_err(|e| format!("raw mode: {e}"))?;
        let mut stdout = std::io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(|e| format!("alternate screen: {e}"))?;
        // Any-event tracking: reports movement as well as clicks and wheel
        stdout
            .execute(EnableMouseCapture)
            .map_err(|e| format!("mouse capture: {e}"))?;
        stdout
            .execute(cursor::Hide)
            .map_err(|e| format!("hide cursor: {e}"))?;

        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        self.width = w;
        self.height = h;

        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        use crossterm::{
            cursor,
            event::DisableMouseCapture,
            terminal::{disable_raw_mode, LeaveAlternateScreen},
            ExecutableCommand,
        };

        let mut stdout = std::io::stdout();
        stdout
            .execute(cursor::Show)
            .map_err(|e| format!("show cursor: {e}"))?;
        stdout
            .execute(DisableMouseCapture)
            .map_err(|e| format!("disable mouse: {e}"))?;
        stdout
            .execute(LeaveAlternateScreen)
            .map_err(|e| format!("leave alternate screen: {e}"))?;
        disable_raw_mode().map_err(|e| format!("disable raw mode: {e}"))?;

        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((self.width, self.height))
    }

    fn set_title(&mut self, title: &str) -> Result<(), String> {
        use crossterm::{terminal::SetTitle, ExecutableCommand};

        std::io::stdout()
            .execute(SetTitle(title))
            .map_err(|e| format!("set title: {e}"))?;
        Ok(())
    }

    fn write_diff(&mut self, diff: &[CellUpdate]) -> Result<(), String> {
        use crate::types::{color_to_crossterm, CellAttrs};
        use crossterm::{
            cursor::MoveTo,
            style::{
                Attribute, Color, Print, SetAttribute, SetBackgroundColor, SetForegroundColor,
            },
            QueueableCommand,
        };

        let mut stdout = std::io::stdout();

        for update in diff {
            stdout
                .queue(MoveTo(update.x, update.y))
                .map_err(|e| format!("move: {e}"))?;

            let fg = color_to_crossterm(update.cell.fg).unwrap_or(Color::Reset);
            stdout
                .queue(SetForegroundColor(fg))
                .map_err(|e| format!("fg: {e}"))?;

            let bg = color_to_crossterm(update.cell.bg).unwrap_or(Color::Reset);
            stdout
                .queue(SetBackgroundColor(bg))
                .map_err(|e| format!("bg: {e}"))?;

            for (flag, attribute) in [
                (CellAttrs::BOLD, Attribute::Bold),
                (CellAttrs::ITALIC, Attribute::Italic),
                (CellAttrs::UNDERLINE, Attribute::Underlined),
            ] {
                if update.cell.attrs.contains(flag) {
                    stdout
                        .queue(SetAttribute(attribute))
                        .map_err(|e| format!("attribute: {e}"))?;
                }
            }

            stdout
                .queue(Print(update.cell.ch))
                .map_err(|e| format!("print: {e}"))?;

            // Reset attributes after each cell
            stdout
                .queue(SetAttribute(Attribute::Reset))
                .map_err(|e| format!("reset: {e}"))?;
        }

        Ok(())
    }

    fn flush(&mut self) -> Result<(), String> {
        use std::io::Write;
        std::io::stdout().flush().map_err(|e| format!("flush: {e}"))
    }

    fn read_events(&mut self, timeout_ms: u32) -> Vec<InputEvent> {
        use crossterm::event;

        let mut events = Vec::new();
        let timeout = std::time::Duration::from_millis(timeout_ms as u64);

        if event::poll(timeout).unwrap_or(false) {
            while event::poll(std::time::Duration::ZERO).unwrap_or(false) {
                match event::read() {
                    Ok(raw) => {
                        if let event::Event::Resize(w, h) = raw {
                            self.width = w;
                            self.height = h;
                        }
                        if let Some(translated) = translate_event(raw) {
                            events.push(translated);
                        }
                    }
                    Err(e) => {
                        log::warn!("terminal event read failed: {e}");
                        break;
                    }
                }
            }
        }

        events
    }

    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Map a crossterm event onto the crate's input events. Key releases,
/// focus changes and paste are dropped.
pub fn translate_event(raw: crossterm::event::Event) -> Option<InputEvent> {
    use crate::types::key;
    use crossterm::event::{Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind};

    match raw {
        Event::Key(key_event) => {
            if key_event.kind != KeyEventKind::Press {
                return None;
            }
            let (code, character) = match key_event.code {
                KeyCode::Char(c) => (c as u32, c),
                KeyCode::Backspace => (key::BACKSPACE, '\0'),
                KeyCode::Enter => (key::ENTER, '\0'),
                KeyCode::Left => (key::LEFT, '\0'),
                KeyCode::Right => (key::RIGHT, '\0'),
                KeyCode::Up => (key::UP, '\0'),
                KeyCode::Down => (key::DOWN, '\0'),
                KeyCode::Tab => (key::TAB, '\0'),
                KeyCode::Esc => (key::ESCAPE, '\0'),
                KeyCode::F(n) if n >= 1 => (key::F1 + (n as u32 - 1), '\0'),
                _ => return None,
            };
            Some(InputEvent::Key { code, character })
        }
        Event::Mouse(mouse_event) => {
            let (x, y) = (mouse_event.column, mouse_event.row);
            match mouse_event.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => Some(InputEvent::MouseMove { x, y }),
                MouseEventKind::Down(button) => {
                    let button = match button {
                        MouseButton::Left => 0u8,
                        MouseButton::Middle => 1,
                        MouseButton::Right => 2,
                    };
                    Some(InputEvent::MouseDown { x, y, button })
                }
                MouseEventKind::ScrollUp => Some(InputEvent::Scroll { x, y, delta: -1 }),
                MouseEventKind::ScrollDown => Some(InputEvent::Scroll { x, y, delta: 1 }),
                _ => None,
            }
        }
        Event::Resize(width, height) => Some(InputEvent::Resize { width, height }),
        _ => None,
    }
}

// ============================================================================
// HeadlessBackend (for CI environments and dry runs)
// ============================================================================

pub struct HeadlessBackend {
    pub width: u16,
    pub height: u16,
}

impl HeadlessBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

impl TerminalBackend for HeadlessBackend {
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_title(&mut self, _title: &str) -> Result<(), String> {
        Ok(())
    }

    fn write_diff(&mut self, _diff: &[CellUpdate]) -> Result<(), String> {
        Ok(()) // Discard output
    }

    fn flush(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn read_events(&mut self, _timeout_ms: u32) -> Vec<InputEvent> {
        Vec::new() // No terminal input
    }

    #[cfg(test)]
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// ============================================================================
// MockBackend (for Rust unit tests only)
// ============================================================================

/// Scripted backend: each `read_events` call yields the next queued batch.
#[cfg(test)]
pub struct MockBackend {
    pub width: u16,
    pub height: u16,
    pub title: Option<String>,
    pub diff_log: Vec<CellUpdate>,
    pub flushes: usize,
    pub initialised: bool,
    pub shut_down: bool,
    pub script: VecDeque<Vec<InputEvent>>,
}

#[cfg(test)]
impl MockBackend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            title: None,
            diff_log: Vec::new(),
            flushes: 0,
            initialised: false,
            shut_down: false,
            script: VecDeque::new(),
        }
    }

    pub fn with_script(mut self, batches: Vec<Vec<InputEvent>>) -> Self {
        self.script = batches.into();
        self
    }
}

#[cfg(test)]
impl TerminalBackend for MockBackend {
    fn init(&mut self) -> Result<(), String> {
        self.initialised = true;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        self.shut_down = true;
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_title(&mut self, title: &str) -> Result<(), String> {
        self.title = Some(title.to_string());
        Ok(())
    }

    fn write_diff(&mut self, diff: &[CellUpdate]) -> Result<(), String> {
        self.diff_log.extend_from_slice(diff);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), String> {
        self.flushes += 1;
        Ok(())
    }

    fn read_events(&mut self, _timeout_ms: u32) -> Vec<InputEvent> {
        self.script.pop_front().unwrap_or_default()
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::key;
    use crossterm::event::{
        Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    };

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn test_translate_keys() {
        let press = Event::Key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(
            translate_event(press),
            Some(InputEvent::Key {
                code: 'q' as u32,
                character: 'q'
            })
        );

        let f1 = Event::Key(KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE));
        assert!(matches!(
            translate_event(f1),
            Some(InputEvent::Key { code: key::F1, .. })
        ));

        let mut release = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(translate_event(Event::Key(release)), None);
    }

    #[test]
    fn test_translate_mouse() {
        assert_eq!(
            translate_event(mouse(MouseEventKind::Moved, 3, 4)),
            Some(InputEvent::MouseMove { x: 3, y: 4 })
        );
        assert_eq!(
            translate_event(mouse(MouseEventKind::Down(MouseButton::Right), 1, 2)),
            Some(InputEvent::MouseDown { x: 1, y: 2, button: 2 })
        );
        assert_eq!(
            translate_event(mouse(MouseEventKind::ScrollDown, 0, 0)),
            Some(InputEvent::Scroll { x: 0, y: 0, delta: 1 })
        );
        assert_eq!(translate_event(mouse(MouseEventKind::Up(MouseButton::Left), 0, 0)), None);
    }

    #[test]
    fn test_mock_backend_replays_script() {
        let mut backend = MockBackend::new(10, 4).with_script(vec![
            vec![InputEvent::Resize { width: 5, height: 5 }],
            vec![],
        ]);
        assert_eq!(backend.read_events(0).len(), 1);
        assert!(backend.read_events(0).is_empty());
        assert!(backend.read_events(0).is_empty());
        assert_eq!(backend.size(), (10, 4));
    }
}
