//! Application loop — fixed-timestep logic ticks, one render per frame.
//!
//! Each logic tick reads input, runs every controller in registration order
//! and recalculates the scene. Each frame renders the scene into the
//! surface, diffs it against the previous frame and writes only the changed
//! cells to the backend. Structural mutation belongs in controllers, which
//! always run before the frame is rendered.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::context::{SceneContext, NULL_DRAWABLE};
use crate::drawable::{self, Drawable};
use crate::render;
use crate::scroll;
use crate::style::StyleSlot;
use crate::surface::Surface;
use crate::terminal::TerminalBackend;
use crate::tree;
use crate::types::{key, Buffer, InputEvent, Position};

/// Logic attached to the loop. Returning `ControlFlow::Break` stops the
/// application after the current tick.
pub trait Controller {
    fn update(
        &mut self,
        ctx: &mut SceneContext,
        events: &[InputEvent],
    ) -> Result<ControlFlow<()>, String>;
}

/// Recalculate every node reachable from the root, debug labels included.
pub fn update(ctx: &mut SceneContext) -> Result<(), String> {
    match ctx.root {
        Some(root) => drawable::recalculate_all(ctx, root),
        None => Ok(()),
    }
}

// ============================================================================
// InputController
// ============================================================================

/// Built-in controller: hover styles, wheel scrolling, debug overlay toggle
/// (F1) and quit (Esc or `q`).
#[derive(Debug, Default)]
pub struct InputController;

impl InputController {
    pub fn new() -> Self {
        Self
    }
}

impl Controller for InputController {
    fn update(
        &mut self,
        ctx: &mut SceneContext,
        events: &[InputEvent],
    ) -> Result<ControlFlow<()>, String> {
        for event in events {
            match *event {
                InputEvent::Key { code, character } => {
                    if code == key::ESCAPE || character == 'q' {
                        return Ok(ControlFlow::Break(()));
                    }
                    if code == key::F1 {
                        ctx.debug_overlay = !ctx.debug_overlay;
                        log::debug!("debug overlay: {}", ctx.debug_overlay);
                    }
                }
                InputEvent::MouseMove { x, y } => {
                    update_hover(ctx, Position::new(x as i32, y as i32))?;
                }
                InputEvent::Scroll { x, y, delta } => {
                    scroll_at(ctx, Position::new(x as i32, y as i32), delta)?;
                }
                InputEvent::MouseDown { .. } | InputEvent::Resize { .. } => {}
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// Put every node with a hover style under `point` into its hover style and
/// every other one back into its default style.
pub fn update_hover(ctx: &mut SceneContext, point: Position) -> Result<(), String> {
    let root = match ctx.root {
        Some(root) => root,
        None => return Ok(()),
    };
    for handle in tree::filter(ctx, root, &|d: &Drawable| d.has_hover_style) {
        let node = ctx.node(handle)?;
        let wanted = if node.is_inside(point) {
            StyleSlot::Hover
        } else {
            StyleSlot::Default
        };
        if node.current_style() != wanted {
            drawable::set_current_style(ctx, handle, wanted)?;
        }
    }
    Ok(())
}

/// Scroll the nearest scrollable ancestor of the node under `point`. A
/// positive wheel delta moves content up.
pub fn scroll_at(ctx: &mut SceneContext, point: Position, delta: i32) -> Result<(), String> {
    let root = match ctx.root {
        Some(root) => root,
        None => return Ok(()),
    };
    let target = scroll::find_scrollable_ancestor(ctx, drawable::hit_test(ctx, root, point));
    if target == NULL_DRAWABLE {
        return Ok(());
    }
    scroll::scroll(ctx, target, Position::new(0, -delta))
}

// ============================================================================
// Application
// ============================================================================

/// Ticks and frames counted over the last full second.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub current_fps: u32,
    pub current_tps: u32,
    pub total_ticks: u64,
    pub total_frames: u64,
}

pub struct Application {
    pub config: AppConfig,
    pub scene: SceneContext,
    backend: Box<dyn TerminalBackend>,
    surface: Surface,
    back_buffer: Buffer,
    full_redraw: bool,
    controllers: Vec<Box<dyn Controller>>,
    running: bool,
    stats: LoopStats,
}

impl Application {
    pub fn new(config: AppConfig, backend: Box<dyn TerminalBackend>) -> Self {
        let (width, height) = backend.size();
        let mut scene = SceneContext::new();
        scene.debug_overlay = config.debug_overlay;
        Self {
            config,
            scene,
            backend,
            surface: Surface::new(width, height),
            back_buffer: Buffer::new(width, height),
            full_redraw: true,
            controllers: Vec::new(),
            running: false,
            stats: LoopStats::default(),
        }
    }

    pub fn add_controller(&mut self, controller: Box<dyn Controller>) {
        self.controllers.push(controller);
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// One logic tick: input, controllers, recalculation.
    pub fn tick(&mut self) -> Result<(), String> {
        let events = self.backend.read_events(0);
        for event in &events {
            if let InputEvent::Resize { width, height } = *event {
                self.resize(width, height);
            }
        }
        for controller in &mut self.controllers {
            if controller.update(&mut self.scene, &events)?.is_break() {
                self.running = false;
            }
        }
        update(&mut self.scene)?;
        self.stats.total_ticks += 1;
        Ok(())
    }

    /// Render, diff, write, swap. Returns the number of changed cells.
    pub fn render_frame(&mut self) -> Result<usize, String> {
        self.surface.clear();
        render::render(&mut self.scene, &mut self.surface, Position::ORIGIN)?;

        let diff = if self.full_redraw {
            self.full_redraw = false;
            render::diff_buffers(&self.surface.buffer, &Buffer::new(0, 0))
        } else {
            render::diff_buffers(&self.surface.buffer, &self.back_buffer)
        };
        self.backend.write_diff(&diff)?;
        self.backend.flush()?;
        std::mem::swap(&mut self.surface.buffer, &mut self.back_buffer);

        self.stats.total_frames += 1;
        log::trace!("frame {}: {} cells changed", self.stats.total_frames, diff.len());
        Ok(diff.len())
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.surface.resize(width, height);
        self.back_buffer.resize(width, height);
        self.full_redraw = true;
        log::debug!("resize: {width}x{height}");
    }

    /// Run until a controller breaks or `stop` is called. The backend is
    /// shut down even when the loop fails.
    pub fn run(&mut self) -> Result<(), String> {
        self.backend.init()?;
        self.running = true;
        let result = self
            .backend
            .set_title(&self.config.title)
            .and_then(|_| self.main_loop());
        self.running = false;
        let shutdown = self.backend.shutdown();
        result.and(shutdown)
    }

    fn main_loop(&mut self) -> Result<(), String> {
        let tick_dt = Duration::from_micros(1_000_000 / self.config.target_tps.max(1) as u64);
        let frame_dt = Duration::from_micros(1_000_000 / self.config.target_fps.max(1) as u64);

        let mut previous = Instant::now();
        // Start with one tick owed so input is read before the first frame
        let mut lag = tick_dt;
        let mut second_start = previous;
        let (mut ticks, mut frames) = (0u32, 0u32);

        while self.running {
            let frame_start = Instant::now();
            lag += frame_start - previous;
            previous = frame_start;

            while lag >= tick_dt && self.running {
                self.tick()?;
                ticks += 1;
                lag -= tick_dt;
            }
            if !self.running {
                break;
            }

            self.render_frame()?;
            frames += 1;

            if second_start.elapsed() >= Duration::from_secs(1) {
                self.stats.current_fps = frames;
                self.stats.current_tps = ticks;
                log::trace!("fps={frames} tps={ticks}");
                (ticks, frames) = (0, 0);
                second_start = Instant::now();
            }

            let spent = frame_start.elapsed();
            if spent < frame_dt {
                std::thread::sleep(frame_dt - spent);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    fn mock(&mut self) -> &mut crate::terminal::MockBackend {
        self.backend
            .as_any_mut()
            .downcast_mut::<crate::terminal::MockBackend>()
            .expect("MockBackend")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::builder;
    use crate::terminal::MockBackend;
    use crate::types::rgb;

    const SCENE: &str = r#"{
        "type": "rect",
        "attributes": {"attributes": "root", "width": 20, "height": 10, "background": "black"},
        "children": [
            {
                "type": "rect",
                "attributes": {"attributes": "list", "x": 2, "y": 2, "width": 10, "height": 4,
                               "scrollable": true, "hover": "red"},
                "children": [
                    {"type": "rect", "attributes": {"attributes": "item", "y": 1, "width": 10,
                                                    "height": 1, "background": "green"}}
                ]
            }
        ]
    }"#;

    fn test_app(script: Vec<Vec<InputEvent>>) -> Application {
        let backend = MockBackend::new(20, 10).with_script(script);
        let mut app = Application::new(AppConfig::default(), Box::new(backend));
        let root = builder::from_json(&mut app.scene, SCENE).unwrap();
        app.scene.set_root(root).unwrap();
        app.add_controller(Box::new(InputController::new()));
        app
    }

    fn handle(app: &Application, tag: &str) -> u32 {
        let root = app.scene.root.unwrap();
        drawable::find_first_with_attribute(&app.scene, root, tag)
    }

    #[test]
    fn test_escape_and_q_stop_the_loop() {
        for key_event in [
            InputEvent::Key {
                code: key::ESCAPE,
                character: '\0',
            },
            InputEvent::Key {
                code: 'q' as u32,
                character: 'q',
            },
        ] {
            let mut app = test_app(vec![vec![key_event]]);
            app.running = true;
            app.tick().unwrap();
            assert!(!app.is_running());
        }
    }

    #[test]
    fn test_f1_toggles_debug_overlay() {
        let f1 = InputEvent::Key {
            code: key::F1,
            character: '\0',
        };
        let mut app = test_app(vec![vec![f1.clone()], vec![f1]]);
        app.tick().unwrap();
        assert!(app.scene.debug_overlay);
        app.tick().unwrap();
        assert!(!app.scene.debug_overlay);
    }

    #[test]
    fn test_mouse_move_switches_hover_style() {
        let mut app = test_app(vec![
            vec![InputEvent::MouseMove { x: 3, y: 3 }],
            vec![InputEvent::MouseMove { x: 15, y: 8 }],
        ]);
        let list = handle(&app, "list");

        app.tick().unwrap();
        assert_eq!(app.scene.nodes[&list].current_style(), StyleSlot::Hover);
        assert_eq!(app.scene.nodes[&list].style().color, rgb(255, 0, 0));

        app.tick().unwrap();
        assert_eq!(app.scene.nodes[&list].current_style(), StyleSlot::Default);
    }

    #[test]
    fn test_wheel_scrolls_nearest_scrollable_ancestor() {
        let mut app = test_app(vec![vec![InputEvent::Scroll { x: 3, y: 3, delta: 1 }]]);
        let list = handle(&app, "list");
        let item = handle(&app, "item");

        app.tick().unwrap();
        assert_eq!(scroll::get_scroll(&app.scene, list).unwrap(), Position::new(0, -1));
        assert_eq!(app.scene.nodes[&item].absolute_position, Position::new(2, 2));

        // Outside any scrollable node the wheel does nothing
        scroll_at(&mut app.scene, Position::new(18, 9), 1).unwrap();
        assert_eq!(scroll::get_scroll(&app.scene, list).unwrap(), Position::new(0, -1));
    }

    #[test]
    fn test_render_frame_writes_only_changes() {
        let mut app = test_app(vec![]);
        let first = app.render_frame().unwrap();
        assert_eq!(first, 20 * 10);
        assert_eq!(app.render_frame().unwrap(), 0);

        let item = handle(&app, "item");
        drawable::hide(&mut app.scene, item).unwrap();
        assert_eq!(app.render_frame().unwrap(), 10);
        assert_eq!(app.mock().flushes, 3);
    }

    #[test]
    fn test_resize_forces_full_redraw() {
        let mut app = test_app(vec![vec![InputEvent::Resize {
            width: 30,
            height: 12,
        }]]);
        app.render_frame().unwrap();
        app.tick().unwrap();
        assert_eq!(app.surface().buffer.width, 30);
        assert_eq!(app.render_frame().unwrap(), 30 * 12);
        assert_eq!(app.render_frame().unwrap(), 0);
        assert_eq!(app.surface().buffer.width, 30);
    }

    #[test]
    fn test_update_refreshes_debug_labels() {
        let mut app = test_app(vec![]);
        let list = handle(&app, "list");
        let label = app.scene.nodes[&list].debug_information()[0];

        drawable::move_by(&mut app.scene, list, Position::new(1, 0)).unwrap();
        update(&mut app.scene).unwrap();
        match &app.scene.nodes[&label].widget {
            crate::widget::Widget::Text(text) => assert_eq!(text.content, "(3, 2)"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<usize>>>,
    }

    impl Controller for Recorder {
        fn update(
            &mut self,
            _ctx: &mut SceneContext,
            events: &[InputEvent],
        ) -> Result<ControlFlow<()>, String> {
            self.seen.borrow_mut().push(events.len());
            Ok(ControlFlow::Continue(()))
        }
    }

    #[test]
    fn test_run_until_quit() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut app = test_app(vec![
            vec![InputEvent::MouseMove { x: 0, y: 0 }],
            vec![InputEvent::Key {
                code: 'q' as u32,
                character: 'q',
            }],
        ]);
        app.config.target_tps = 1000;
        app.config.target_fps = 1000;
        app.add_controller(Box::new(Recorder {
            seen: Rc::clone(&seen),
        }));

        app.run().unwrap();

        let mock = app.mock();
        assert!(mock.initialised);
        assert!(mock.shut_down);
        assert_eq!(mock.title.as_deref(), Some("drawable"));
        assert!(!mock.diff_log.is_empty());
        assert_eq!(seen.borrow()[..2], [1, 1]);
        assert!(app.stats().total_ticks >= 2);
        assert!(!app.is_running());
    }
}
