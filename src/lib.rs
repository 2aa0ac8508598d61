//! Drawable TUI — a retained-mode scene graph rendered into a terminal.
//!
//! The scene is an arena of `Drawable` nodes (`context`) linked into a tree
//! (`tree`), positioned by explicit coordinates, styled, tagged with
//! attributes and queried by predicate traversals. `render` draws the tree
//! into any `Canvas` with clip intersection; `app` drives it from a
//! fixed-timestep loop over a `TerminalBackend`.
//!
//! There is no layout engine: positions and sizes are assigned by the
//! builder or by controllers.

pub mod app;
pub mod builder;
pub mod config;
pub mod context;
pub mod drawable;
pub mod render;
pub mod scroll;
pub mod style;
pub mod surface;
pub mod terminal;
pub mod texture;
pub mod tree;
pub mod types;
pub mod widget;

pub use app::{Application, Controller, InputController};
pub use config::AppConfig;
pub use context::{SceneContext, NULL_DRAWABLE};
pub use drawable::Drawable;
pub use style::{Style, StyleSlot};
pub use surface::{Canvas, Surface};
pub use types::{InputEvent, Position, Rect};
pub use widget::Widget;
