//! Render Module — recursive scene render with clip intersection.
//!
//! Responsibilities:
//! - Walk the tree from the root, computing each node's absolute position
//!   from its parent's origin (parent position plus scroll offset)
//! - Clip every node to its parent's clip rect, and its children to the
//!   intersection of that clip with the node's own bounds
//! - Draw borders after children and the debug overlay last
//! - Diff two cell buffers into a minimal `CellUpdate` list

use crate::context::{SceneContext, NULL_DRAWABLE};
use crate::drawable::Drawable;
use crate::surface::Canvas;
use crate::types::{Buffer, CellUpdate, Position, Rect};

/// Render the scene root at `origin`, clipped to the canvas bounds.
pub fn render(ctx: &mut SceneContext, canvas: &mut dyn Canvas, origin: Position) -> Result<(), String> {
    let root = match ctx.root {
        Some(root) => root,
        None => return Ok(()),
    };
    let clip = canvas.bounds();
    render_node(ctx, canvas, root, origin, clip, false)?;
    canvas.set_clip_rect(clip);
    Ok(())
}

/// Render one node and its subtree.
///
/// The pre-render hook runs even for hidden nodes. A hidden (or
/// force-hidden) node returns before any clip or draw work, so none of its
/// descendants are visited.
pub fn render_node(
    ctx: &mut SceneContext,
    canvas: &mut dyn Canvas,
    handle: u32,
    parent_position: Position,
    parent_clip: Rect,
    force_hidden: bool,
) -> Result<(), String> {
    if handle == NULL_DRAWABLE {
        return Ok(());
    }

    let hook = ctx.node(handle)?.pre_render_hook.clone();
    if let Some(hook) = hook {
        hook(ctx, handle)?;
    }

    let node = ctx.node(handle)?;
    let position = parent_position + node.position;
    if force_hidden || node.is_hidden() {
        return Ok(());
    }

    canvas.set_clip_rect(parent_clip);
    node.widget
        .draw(canvas, position, node.width, node.height, node.style());

    let child_clip = parent_clip.intersect(Rect::at(position, node.width, node.height));
    let child_origin = position + node.scroll_offset();
    let children = node.children().to_vec();
    for child in children {
        render_node(ctx, canvas, child, child_origin, child_clip, false)?;
    }

    canvas.set_clip_rect(parent_clip);
    draw_border(canvas, ctx.node(handle)?, position);
    if ctx.debug_overlay {
        draw_debug_information(ctx, canvas, handle, position, parent_clip)?;
    }
    Ok(())
}

/// Draw `border_width` inset rings in the border color. Each ring's
/// lower-right pixel is drawn explicitly since outlines leave it open.
pub fn draw_border(canvas: &mut dyn Canvas, node: &Drawable, position: Position) {
    let style = node.style();
    if !style.has_border {
        return;
    }
    let (w, h) = (
        i32::try_from(node.width).unwrap_or(i32::MAX),
        i32::try_from(node.height).unwrap_or(i32::MAX),
    );
    for i in 0..i32::try_from(style.border_width).unwrap_or(i32::MAX) {
        let inset = i.saturating_mul(2);
        let ring = Rect::new(
            position.x.saturating_add(i),
            position.y.saturating_add(i),
            w.saturating_sub(inset),
            h.saturating_sub(inset),
        );
        if ring.is_empty() {
            break;
        }
        canvas.draw_rect(ring, style.border_color);
        canvas.draw_point(ring.right() - 1, ring.bottom() - 1, style.border_color);
    }
}

/// Render the node's debug labels relative to its absolute position.
fn draw_debug_information(
    ctx: &mut SceneContext,
    canvas: &mut dyn Canvas,
    handle: u32,
    position: Position,
    clip: Rect,
) -> Result<(), String> {
    let labels = ctx.node(handle)?.debug_information().to_vec();
    for label in labels {
        render_node(ctx, canvas, label, position, clip, false)?;
    }
    Ok(())
}

// ============================================================================
// Buffer Diffing
// ============================================================================

/// Diff front buffer vs back buffer. Returns updates for changed cells.
pub fn diff_buffers(front: &Buffer, back: &Buffer) -> Vec<CellUpdate> {
    let mut updates = Vec::new();

    for y in 0..front.height {
        for x in 0..front.width {
            let cell = match front.get(x, y) {
                Some(cell) => cell,
                None => continue,
            };
            let changed = match back.get(x, y) {
                Some(b) => cell != b,
                None => true,
            };
            if changed {
                updates.push(CellUpdate {
                    x,
                    y,
                    cell: cell.clone(),
                });
            }
        }
    }

    updates
}

// ============================================================================
// Tests
// ============================================================================
