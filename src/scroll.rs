//! Scroll Module — per-node scroll offset.
//!
//! Responsibilities:
//! - Store the scroll offset of every node (any node can scroll)
//! - Shift descendants' absolute positions through the post-scroll hook
//! - Locate the nearest ancestor flagged `scrollable` for wheel input
//!
//! Offsets are not clamped: content may be scrolled arbitrarily far in
//! either direction.

use crate::context::{SceneContext, NULL_DRAWABLE};
use crate::drawable::shift_subtree;
use crate::types::Position;

/// Scroll by `delta`, then run the node's post-scroll hook (or the default).
pub fn scroll(ctx: &mut SceneContext, handle: u32, delta: Position) -> Result<(), String> {
    let hook = {
        let node = ctx.node_mut(handle)?;
        node.scroll_offset += delta;
        node.post_scroll_hook.clone()
    };
    match hook {
        Some(hook) => hook(ctx, handle, delta),
        None => default_post_scroll(ctx, handle, delta),
    }
}

/// Set an absolute scroll offset by scrolling the difference.
pub fn set_scroll(ctx: &mut SceneContext, handle: u32, offset: Position) -> Result<(), String> {
    let delta = offset - ctx.node(handle)?.scroll_offset;
    scroll(ctx, handle, delta)
}

pub fn get_scroll(ctx: &SceneContext, handle: u32) -> Result<Position, String> {
    Ok(ctx.node(handle)?.scroll_offset)
}

/// Shift the absolute position of every descendant by `delta`.
pub fn default_post_scroll(ctx: &mut SceneContext, handle: u32, delta: Position) -> Result<(), String> {
    let children = ctx.node(handle)?.children().to_vec();
    for child in children {
        shift_subtree(ctx, child, delta)?;
    }
    Ok(())
}

/// Closest node at or above `handle` flagged `scrollable`, or
/// `NULL_DRAWABLE`.
pub fn find_scrollable_ancestor(ctx: &SceneContext, handle: u32) -> u32 {
    let mut current = Some(handle);
    while let Some(h) = current {
        if h == NULL_DRAWABLE {
            break;
        }
        match ctx.nodes.get(&h) {
            Some(node) if node.scrollable => return h,
            Some(node) => current = node.parent(),
            None => break,
        }
    }
    NULL_DRAWABLE
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::drawable::{self, Drawable};
    use crate::tree;
    use crate::widget::Widget;

    fn test_ctx() -> SceneContext {
        SceneContext::new()
    }

    fn rect_at(ctx: &mut SceneContext, x: i32, y: i32) -> u32 {
        let h = tree::create_node(ctx, Widget::Rect).unwrap();
        drawable::set_position(ctx, h, Position::new(x, y)).unwrap();
        h
    }

    #[test]
    fn test_scroll_set_get() {
        let mut ctx = test_ctx();
        let h = rect_at(&mut ctx, 0, 0);

        set_scroll(&mut ctx, h, Position::new(0, -20)).unwrap();
        assert_eq!(get_scroll(&ctx, h).unwrap(), Position::new(0, -20));
        scroll(&mut ctx, h, Position::new(3, 5)).unwrap();
        assert_eq!(get_scroll(&ctx, h).unwrap(), Position::new(3, -15));
    }

    #[test]
    fn test_scroll_is_not_clamped() {
        let mut ctx = test_ctx();
        let h = rect_at(&mut ctx, 0, 0);
        scroll(&mut ctx, h, Position::new(-1000, 1000)).unwrap();
        assert_eq!(get_scroll(&ctx, h).unwrap(), Position::new(-1000, 1000));
    }

    #[test]
    fn test_scroll_shifts_descendants_only() {
        let mut ctx = test_ctx();
        let panel = rect_at(&mut ctx, 10, 10);
        let row = rect_at(&mut ctx, 0, 2);
        let cell = rect_at(&mut ctx, 1, 0);
        tree::add_child(&mut ctx, row, cell).unwrap();
        tree::add_child(&mut ctx, panel, row).unwrap();

        scroll(&mut ctx, panel, Position::new(0, -2)).unwrap();

        let node = |h: u32| &ctx.nodes[&h];
        assert_eq!(node(panel).absolute_position, Position::new(10, 10));
        assert_eq!(node(row).position, Position::new(0, 2));
        assert_eq!(node(row).absolute_position, Position::new(10, 10));
        assert_eq!(node(cell).absolute_position, Position::new(11, 10));

        // Absolute position = parent absolute + parent scroll + local
        for h in tree::filter(&ctx, panel, &|_: &Drawable| true) {
            if let Some(p) = node(h).parent() {
                assert_eq!(
                    node(h).absolute_position,
                    node(p).absolute_position + node(p).scroll_offset() + node(h).position
                );
            }
        }
    }

    #[test]
    fn test_child_added_after_scroll_respects_offset() {
        let mut ctx = test_ctx();
        let panel = rect_at(&mut ctx, 0, 0);
        scroll(&mut ctx, panel, Position::new(0, -5)).unwrap();
        let late = rect_at(&mut ctx, 0, 8);
        tree::add_child(&mut ctx, panel, late).unwrap();
        assert_eq!(ctx.nodes[&late].absolute_position, Position::new(0, 3));
    }

    #[test]
    fn test_custom_post_scroll_hook_replaces_default() {
        let mut ctx = test_ctx();
        let panel = rect_at(&mut ctx, 0, 0);
        let child = rect_at(&mut ctx, 1, 1);
        tree::add_child(&mut ctx, panel, child).unwrap();

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        drawable::set_post_scroll_hook(
            &mut ctx,
            panel,
            Rc::new(move |_: &mut SceneContext, _: u32, _: Position| -> Result<(), String> {
                counter.set(counter.get() + 1);
                Ok(())
            }),
        )
        .unwrap();

        scroll(&mut ctx, panel, Position::new(4, 4)).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.nodes[&child].absolute_position, Position::new(1, 1));
        assert_eq!(get_scroll(&ctx, panel).unwrap(), Position::new(4, 4));
    }

    #[test]
    fn test_find_scrollable_ancestor() {
        let mut ctx = test_ctx();
        let outer = rect_at(&mut ctx, 0, 0);
        let inner = rect_at(&mut ctx, 0, 0);
        let leaf = rect_at(&mut ctx, 0, 0);
        tree::add_child(&mut ctx, inner, leaf).unwrap();
        tree::add_child(&mut ctx, outer, inner).unwrap();

        assert_eq!(find_scrollable_ancestor(&ctx, leaf), NULL_DRAWABLE);
        ctx.node_mut(outer).unwrap().scrollable = true;
        assert_eq!(find_scrollable_ancestor(&ctx, leaf), outer);
        ctx.node_mut(inner).unwrap().scrollable = true;
        assert_eq!(find_scrollable_ancestor(&ctx, leaf), inner);
        assert_eq!(find_scrollable_ancestor(&ctx, NULL_DRAWABLE), NULL_DRAWABLE);
    }
}
