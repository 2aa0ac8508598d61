//! Drawable Module — the scene graph node and its per-node operations.
//!
//! A `Drawable` composes tree linkage, position, scroll state, the attribute
//! set, the style pair and a `Widget`. Everything that needs to reach other
//! nodes (moving a subtree, debug labels, hooks) is a free function over
//! `&mut SceneContext` and a handle.
//!
//! Hooks are reference-counted closures stored on the node. They are cloned
//! out of the node before being invoked so they can borrow the context
//! mutably.

use std::fmt;
use std::rc::Rc;

use crate::context::{SceneContext, NULL_DRAWABLE};
use crate::style::{Style, StyleSlot};
use crate::tree;
use crate::types::{Position, Rect, COLOR_WHITE};
use crate::widget::Widget;

/// Attribute carried by every debug information node.
pub const DEBUG_ATTRIBUTE: &str = "debug";

/// Attribute label text for a node without attributes.
pub const NO_NAME: &str = "--noname--";

pub type NodeCallback = Rc<dyn Fn(&mut SceneContext, u32) -> Result<(), String>>;
pub type ScrollCallback = Rc<dyn Fn(&mut SceneContext, u32, Position) -> Result<(), String>>;
pub type StyleCallback = Rc<dyn Fn(&mut SceneContext, u32, StyleSlot) -> Result<(), String>>;

pub struct Drawable {
    pub widget: Widget,
    pub(crate) parent: Option<u32>,
    pub(crate) children: Vec<u32>,

    /// Offset from the parent's origin.
    pub position: Position,
    /// Cached surface coordinate, kept in sync by add/move/scroll cascades.
    pub absolute_position: Position,
    pub width: u32,
    pub height: u32,

    pub(crate) scroll_offset: Position,
    pub scrollable: bool,

    pub(crate) attributes: Vec<String>,

    pub default_style: Style,
    pub hover_style: Style,
    pub(crate) current_style: StyleSlot,
    pub has_hover_style: bool,

    pub(crate) debug_information: Vec<u32>,
    pub debug_information_initialised: bool,

    pub(crate) init_debug_information_callback: Option<NodeCallback>,
    pub(crate) pre_render_hook: Option<NodeCallback>,
    pub(crate) post_scroll_hook: Option<ScrollCallback>,
    pub(crate) style_hook: Option<StyleCallback>,
    pub(crate) recalculation_callbacks: Vec<NodeCallback>,
}

impl Drawable {
    pub fn new(widget: Widget) -> Self {
        Self {
            widget,
            parent: None,
            children: Vec::new(),
            position: Position::ORIGIN,
            absolute_position: Position::ORIGIN,
            width: 0,
            height: 0,
            scroll_offset: Position::ORIGIN,
            scrollable: false,
            attributes: Vec::new(),
            default_style: Style::default(),
            hover_style: Style::default(),
            current_style: StyleSlot::Default,
            has_hover_style: false,
            debug_information: Vec::new(),
            debug_information_initialised: false,
            init_debug_information_callback: None,
            pre_render_hook: None,
            post_scroll_hook: None,
            style_hook: None,
            recalculation_callbacks: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<u32> {
        self.parent
    }

    /// Children in insertion order (render order).
    pub fn children(&self) -> &[u32] {
        &self.children
    }

    /// Children last-added first. A live view over the same storage.
    pub fn children_reversed(&self) -> impl Iterator<Item = u32> + '_ {
        self.children.iter().rev().copied()
    }

    /// The current style.
    pub fn style(&self) -> &Style {
        match self.current_style {
            StyleSlot::Default => &self.default_style,
            StyleSlot::Hover => &self.hover_style,
        }
    }

    pub fn style_mut(&mut self) -> &mut Style {
        match self.current_style {
            StyleSlot::Default => &mut self.default_style,
            StyleSlot::Hover => &mut self.hover_style,
        }
    }

    pub fn current_style(&self) -> StyleSlot {
        self.current_style
    }

    pub fn is_hidden(&self) -> bool {
        self.style().hidden
    }

    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }

    pub fn scroll_offset(&self) -> Position {
        self.scroll_offset
    }

    pub fn debug_information(&self) -> &[u32] {
        &self.debug_information
    }

    pub fn bounds(&self) -> Rect {
        Rect::at(self.absolute_position, self.width, self.height)
    }

    /// Containment in `[absolute_position, absolute_position + (width, height))`.
    pub fn is_inside(&self, point: Position) -> bool {
        self.bounds().contains(point.x, point.y)
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("widget", &self.widget.type_name())
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("position", &self.position)
            .field("absolute_position", &self.absolute_position)
            .field("size", &(self.width, self.height))
            .field("scroll_offset", &self.scroll_offset)
            .field("attributes", &self.attributes)
            .field("current_style", &self.current_style)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Geometry
// ============================================================================

/// Shift a node's cached absolute position without touching its local one.
pub fn move_absolute(ctx: &mut SceneContext, handle: u32, delta: Position) -> Result<(), String> {
    ctx.node_mut(handle)?.absolute_position += delta;
    Ok(())
}

/// `move_absolute` every node of the subtree rooted at `handle`.
pub(crate) fn shift_subtree(
    ctx: &mut SceneContext,
    handle: u32,
    delta: Position,
) -> Result<(), String> {
    let mut result = Ok(());
    tree::map(
        ctx,
        handle,
        &mut |ctx: &mut SceneContext, h: u32| {
            if result.is_ok() {
                result = move_absolute(ctx, h, delta);
            }
        },
        false,
    );
    result
}

/// Move a node by `delta`. Descendants' absolute positions are derived from
/// the move, their local positions stay put.
pub fn move_by(ctx: &mut SceneContext, handle: u32, delta: Position) -> Result<(), String> {
    let children = {
        let node = ctx.node_mut(handle)?;
        node.position += delta;
        node.absolute_position += delta;
        node.children.clone()
    };
    for child in children {
        shift_subtree(ctx, child, delta)?;
    }
    Ok(())
}

pub fn set_position(ctx: &mut SceneContext, handle: u32, position: Position) -> Result<(), String> {
    let delta = position - ctx.node(handle)?.position;
    move_by(ctx, handle, delta)
}

pub fn set_size(ctx: &mut SceneContext, handle: u32, width: u32, height: u32) -> Result<(), String> {
    let node = ctx.node_mut(handle)?;
    node.width = width;
    node.height = height;
    refresh_widget(node);
    Ok(())
}

fn refresh_widget(node: &mut Drawable) {
    let style = *node.style();
    node.widget.update(node.width, &style);
}

// ============================================================================
// Style & visibility
// ============================================================================

/// Switch the current style, then run the style hook.
pub fn set_current_style(ctx: &mut SceneContext, handle: u32, slot: StyleSlot) -> Result<(), String> {
    let hook = {
        let node = ctx.node_mut(handle)?;
        node.current_style = slot;
        refresh_widget(node);
        node.style_hook.clone()
    };
    if let Some(hook) = hook {
        hook(ctx, handle, slot)?;
    }
    Ok(())
}

/// Clear `hidden` on the current style only.
pub fn show(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    ctx.node_mut(handle)?.style_mut().hidden = false;
    Ok(())
}

/// Set `hidden` on the current style only.
pub fn hide(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    ctx.node_mut(handle)?.style_mut().hidden = true;
    Ok(())
}

pub fn is_hidden(ctx: &SceneContext, handle: u32) -> Result<bool, String> {
    Ok(ctx.node(handle)?.is_hidden())
}

/// Replace the content of a text widget and re-wrap it.
pub fn set_text(ctx: &mut SceneContext, handle: u32, content: &str) -> Result<(), String> {
    let node = ctx.node_mut(handle)?;
    let (width, wrap) = (node.width, !node.style().overflow);
    match &mut node.widget {
        Widget::Text(text) => {
            text.set(content, width, wrap);
            Ok(())
        }
        other => Err(format!(
            "Node {handle} is a {} widget, not text",
            other.type_name()
        )),
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// Add a tag. Adding a tag the node already has is a no-op.
pub fn add_attribute(ctx: &mut SceneContext, handle: u32, attribute: &str) -> Result<(), String> {
    let node = ctx.node_mut(handle)?;
    if !node.has_attribute(attribute) {
        node.attributes.push(attribute.to_string());
    }
    Ok(())
}

/// First node (in `find` order) holding `attribute`, or `NULL_DRAWABLE`.
pub fn find_first_with_attribute(ctx: &SceneContext, handle: u32, attribute: &str) -> u32 {
    tree::find_first(ctx, handle, &|d: &Drawable| d.has_attribute(attribute))
}

/// Every node (in `find` order) holding `attribute`.
pub fn find_all_with_attribute(ctx: &SceneContext, handle: u32, attribute: &str) -> Vec<u32> {
    tree::find(ctx, handle, &|d: &Drawable| d.has_attribute(attribute))
}

// ============================================================================
// Hooks & recalculation
// ============================================================================

pub fn set_init_debug_information_callback(
    ctx: &mut SceneContext,
    handle: u32,
    callback: NodeCallback,
) -> Result<(), String> {
    ctx.node_mut(handle)?.init_debug_information_callback = Some(callback);
    Ok(())
}

pub fn set_pre_render_hook(ctx: &mut SceneContext, handle: u32, hook: NodeCallback) -> Result<(), String> {
    ctx.node_mut(handle)?.pre_render_hook = Some(hook);
    Ok(())
}

/// Replace the default post-scroll behaviour.
pub fn set_post_scroll_hook(
    ctx: &mut SceneContext,
    handle: u32,
    hook: ScrollCallback,
) -> Result<(), String> {
    ctx.node_mut(handle)?.post_scroll_hook = Some(hook);
    Ok(())
}

pub fn set_style_hook(ctx: &mut SceneContext, handle: u32, hook: StyleCallback) -> Result<(), String> {
    ctx.node_mut(handle)?.style_hook = Some(hook);
    Ok(())
}

pub fn add_recalculation_callback(
    ctx: &mut SceneContext,
    handle: u32,
    callback: NodeCallback,
) -> Result<(), String> {
    ctx.node_mut(handle)?.recalculation_callbacks.push(callback);
    Ok(())
}

/// Refresh the widget, then run recalculation callbacks in registration
/// order.
pub fn recalculate(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    let callbacks = {
        let node = ctx.node_mut(handle)?;
        refresh_widget(node);
        node.recalculation_callbacks.clone()
    };
    for callback in callbacks {
        callback(ctx, handle)?;
    }
    Ok(())
}

/// Recalculate every node of a subtree together with its debug nodes.
pub fn recalculate_all(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    for h in tree::filter(ctx, handle, &|_: &Drawable| true) {
        let debug = match ctx.nodes.get(&h) {
            Some(node) => node.debug_information.clone(),
            None => continue,
        };
        recalculate(ctx, h)?;
        for d in debug {
            recalculate(ctx, d)?;
        }
    }
    Ok(())
}

// ============================================================================
// Debug information
// ============================================================================

/// Build the node's debug information, once. Uses the injected callback if
/// one is set, otherwise `default_init_debug_information`.
///
/// If the callback fails, the labels it registered are destroyed and the
/// node is left uninitialised so a later attach retries.
pub fn init_debug_information(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    let (callback, registered) = {
        let node = ctx.node_mut(handle)?;
        if node.debug_information_initialised {
            return Ok(());
        }
        node.debug_information_initialised = true;
        (
            node.init_debug_information_callback.clone(),
            node.debug_information.len(),
        )
    };
    let result = match callback {
        Some(callback) => callback(ctx, handle),
        None => default_init_debug_information(ctx, handle),
    };
    if let Err(e) = result {
        let created = match ctx.nodes.get_mut(&handle) {
            Some(node) => {
                node.debug_information_initialised = false;
                node.debug_information.split_off(registered.min(node.debug_information.len()))
            }
            None => Vec::new(),
        };
        for label in created {
            if ctx.nodes.contains_key(&label) {
                tree::destroy_node(ctx, label)?;
            }
        }
        log::debug!("debug information failed: owner={handle}: {e}");
        return Err(e);
    }
    Ok(())
}

/// Register an unattached node as one of `owner`'s debug labels. Labels are
/// rendered relative to the owner and destroyed with it.
pub fn add_debug_information(ctx: &mut SceneContext, owner: u32, label: u32) -> Result<(), String> {
    ctx.validate_handle(label)?;
    if label == owner || ctx.node(label)?.parent.is_some() {
        return Err(format!("Node {label} cannot be a debug label of {owner}"));
    }
    let node = ctx.node_mut(owner)?;
    if !node.debug_information.contains(&label) {
        node.debug_information.push(label);
    }
    Ok(())
}

/// Two text labels tagged `debug`: the absolute position at (1, 0), kept
/// current by a recalculation callback, and the attribute list at (1, 1).
pub fn default_init_debug_information(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    let (absolute, attribute_text) = {
        let node = ctx.node(handle)?;
        let attributes = if node.attributes.is_empty() {
            NO_NAME.to_string()
        } else {
            node.attributes.join(" ")
        };
        (node.absolute_position, attributes)
    };

    let position_label = create_debug_label(ctx, handle, &absolute.to_string(), Position::new(1, 0))?;
    let owner = handle;
    add_recalculation_callback(
        ctx,
        position_label,
        Rc::new(move |ctx: &mut SceneContext, label: u32| {
            let absolute = ctx.node(owner)?.absolute_position;
            set_text(ctx, label, &absolute.to_string())
        }),
    )?;

    let attribute_label = create_debug_label(ctx, handle, &attribute_text, Position::new(1, 1))?;

    log::debug!("debug information: owner={handle}, labels=[{position_label}, {attribute_label}]");
    Ok(())
}

/// Create a label already registered in `owner`'s debug information.
fn create_debug_label(
    ctx: &mut SceneContext,
    owner: u32,
    text: &str,
    position: Position,
) -> Result<u32, String> {
    let label = tree::create_node(ctx, Widget::text(text))?;
    add_debug_information(ctx, owner, label)?;

    let node = ctx.node_mut(label)?;
    node.position = position;
    node.absolute_position = position;
    node.default_style.text_color = COLOR_WHITE;
    node.hover_style.text_color = COLOR_WHITE;
    // Labels never carry labels of their own
    node.debug_information_initialised = true;
    add_attribute(ctx, label, DEBUG_ATTRIBUTE)?;
    Ok(label)
}

// ============================================================================
// Hit testing
// ============================================================================

const UNBOUNDED: Rect = Rect::new(i32::MIN / 2, i32::MIN / 2, i32::MAX, i32::MAX);

/// Topmost visible node under `point`: the last match in render order.
/// Hidden subtrees and regions clipped away by an ancestor never hit.
/// Returns `NULL_DRAWABLE` on a miss.
pub fn hit_test(ctx: &SceneContext, handle: u32, point: Position) -> u32 {
    let mut hit = NULL_DRAWABLE;
    hit_test_into(ctx, handle, point, UNBOUNDED, &mut hit);
    hit
}

fn hit_test_into(ctx: &SceneContext, handle: u32, point: Position, clip: Rect, hit: &mut u32) {
    if handle == NULL_DRAWABLE {
        return;
    }
    let node = match ctx.nodes.get(&handle) {
        Some(n) => n,
        None => return,
    };
    if node.is_hidden() {
        return;
    }
    if clip.contains(point.x, point.y) && node.is_inside(point) {
        *hit = handle;
    }
    let child_clip = clip.intersect(node.bounds());
    for &child in node.children() {
        hit_test_into(ctx, child, point, child_clip, hit);
    }
}
