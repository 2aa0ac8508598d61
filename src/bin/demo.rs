//! Interactive scene demo.
//!
//! Usage: cargo run --bin drawable_demo [CONFIG_PATH]
//! Without a config (or without a `layout` in it) a built-in scene is used.
//! Esc or `q` quits, F1 toggles the debug overlay, the wheel scrolls the list.

use std::ops::ControlFlow;

use drawable_tui::terminal::{CrosstermBackend, HeadlessBackend, TerminalBackend};
use drawable_tui::types::InputEvent;
use drawable_tui::{builder, drawable, texture};
use drawable_tui::{AppConfig, Application, Controller, InputController, SceneContext};

const DEMO_LAYOUT: &str = r#"{
    "type": "rect",
    "attributes": {"attributes": "root", "width": 80, "height": 24, "background": "30"},
    "children": [
        {"type": "text", "attributes": {"attributes": "title", "x": 2, "y": 1, "width": 40,
                                        "text": "drawable demo", "bold": true, "text_color": "white"}},
        {"type": "text", "attributes": {"attributes": "ticks", "x": 60, "y": 1, "width": 18,
                                        "text_color": "yellow"}},
        {
            "type": "rect",
            "attributes": {"attributes": "list", "x": 2, "y": 3, "width": 36, "height": 12,
                           "background": "60", "hover": "80", "border": "grey", "scrollable": true},
            "children": [
                {"type": "rect", "attributes": {"attributes": "row", "x": 1, "y": 1, "width": 34, "height": 3, "background": "red", "hover": "orange"}},
                {"type": "rect", "attributes": {"attributes": "row", "x": 1, "y": 5, "width": 34, "height": 3, "background": "green", "hover": "cyan"}},
                {"type": "rect", "attributes": {"attributes": "row", "x": 1, "y": 9, "width": 34, "height": 3, "background": "blue", "hover": "magenta"}},
                {"type": "rect", "attributes": {"attributes": "row", "x": 1, "y": 13, "width": 34, "height": 3, "background": "purple", "hover": "yellow"}}
            ]
        },
        {"type": "vertical_line", "attributes": {"x": 40, "y": 3, "height": 12, "border": "white"}},
        {"type": "text", "attributes": {"attributes": "help", "x": 42, "y": 3, "width": 30,
                                        "text": "Wheel over the list to scroll it. Hover rows to highlight them. F1 shows debug labels, q quits."}}
    ]
}"#;

/// Writes the tick count into the `ticks` label and, when headless, stops
/// the loop after a fixed number of ticks.
struct TickCounter {
    ticks: u64,
    limit: Option<u64>,
}

impl Controller for TickCounter {
    fn update(
        &mut self,
        ctx: &mut SceneContext,
        _events: &[InputEvent],
    ) -> Result<ControlFlow<()>, String> {
        self.ticks += 1;
        if let Some(root) = ctx.root {
            let label = drawable::find_first_with_attribute(ctx, root, "ticks");
            if label != drawable_tui::NULL_DRAWABLE {
                drawable::set_text(ctx, label, &format!("tick {}", self.ticks))?;
            }
        }
        match self.limit {
            Some(limit) if self.ticks >= limit => Ok(ControlFlow::Break(())),
            _ => Ok(ControlFlow::Continue(())),
        }
    }
}

fn run() -> Result<(), String> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let backend: Box<dyn TerminalBackend> = if config.headless {
        Box::new(HeadlessBackend::new(config.width, config.height))
    } else {
        Box::new(CrosstermBackend::new())
    };
    let tick_limit = config.headless.then(|| config.target_tps as u64 * 2);

    let mut app = Application::new(config, backend);
    let root = match app.config.layout.clone() {
        Some(path) => builder::load(&mut app.scene, path)?,
        None => builder::from_json(&mut app.scene, DEMO_LAYOUT)?,
    };
    app.scene.set_root(root)?;

    app.add_controller(Box::new(InputController::new()));
    app.add_controller(Box::new(TickCounter {
        ticks: 0,
        limit: tick_limit,
    }));

    let result = app.run();
    texture::clear_texture_cache()?;
    log::info!(
        "exited after {} ticks, {} frames",
        app.stats().total_ticks,
        app.stats().total_frames
    );
    result
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
