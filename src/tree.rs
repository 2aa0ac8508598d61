//! Tree Module — node ownership, linkage and traversal.
//!
//! Responsibilities:
//! - Handle allocation (sequential u32, never recycled)
//! - Node creation / cascading destruction
//! - Parent-child relationships and absolute-position propagation
//! - The traversal family: find, find_bottom_up, find_first,
//!   find_first_bottom_up, filter, map, bottom_up_map
//!
//! Child order: `children` is insertion order and drives rendering. The
//! reversed view puts the most recently added child first. `find` and
//! `find_first` walk children reversed, `filter` walks them forward; the two
//! orders are separate operations and call sites depend on each.

use crate::context::{SceneContext, NULL_DRAWABLE};
use crate::drawable::Drawable;
use crate::types::Position;
use crate::widget::Widget;

/// Allocate a new handle and create an unattached node.
pub fn create_node(ctx: &mut SceneContext, widget: Widget) -> Result<u32, String> {
    let handle = ctx.next_handle;
    ctx.next_handle = handle
        .checked_add(1)
        .ok_or_else(|| "Handle space exhausted".to_string())?;

    let type_name = widget.type_name();
    ctx.nodes.insert(handle, Drawable::new(widget));
    log::debug!("create_node: type={type_name}, handle={handle}");

    Ok(handle)
}

/// Destroy a node and its whole subtree, children before parents. The
/// node's debug information nodes go with it.
pub fn destroy_node(ctx: &mut SceneContext, handle: u32) -> Result<(), String> {
    ctx.validate_handle(handle)?;

    match ctx.nodes[&handle].parent {
        Some(parent_handle) => {
            if let Some(parent) = ctx.nodes.get_mut(&parent_handle) {
                parent.children.retain(|&h| h != handle);
            }
        }
        // A parentless node may be some node's debug label
        None => {
            for node in ctx.nodes.values_mut() {
                node.debug_information.retain(|&h| h != handle);
            }
        }
    }

    let mut doomed = Vec::new();
    collect_post_order(ctx, handle, &mut doomed);
    for h in &doomed {
        ctx.nodes.remove(h);
        if ctx.root == Some(*h) {
            ctx.root = None;
        }
    }

    log::debug!("destroy_node: handle={handle}, removed={}", doomed.len());
    Ok(())
}

fn collect_post_order(ctx: &SceneContext, handle: u32, out: &mut Vec<u32>) {
    if let Some(node) = ctx.nodes.get(&handle) {
        for &child in node.children() {
            collect_post_order(ctx, child, out);
        }
        for &debug in &node.debug_information {
            collect_post_order(ctx, debug, out);
        }
        out.push(handle);
    }
}

/// Whether `ancestor` lies on the parent chain of `handle` (or is it).
pub fn is_ancestor(ctx: &SceneContext, ancestor: u32, handle: u32) -> bool {
    let mut current = Some(handle);
    while let Some(h) = current {
        if h == ancestor {
            return true;
        }
        current = ctx.nodes.get(&h).and_then(|n| n.parent);
    }
    false
}

/// Append `child` to `parent`.
///
/// Initialises the child's debug information, then links it and recomputes
/// absolute positions for the child's entire subtree, since a node may carry
/// pre-built children when it is attached. If the debug initialisation
/// fails, nothing is linked.
pub fn add_child(ctx: &mut SceneContext, parent: u32, child: u32) -> Result<(), String> {
    ctx.validate_handle(parent)?;
    ctx.validate_handle(child)?;

    if let Some(existing) = ctx.nodes[&child].parent {
        return Err(format!(
            "Node {child} already has parent {existing}; remove it first"
        ));
    }
    if ctx.root == Some(child) {
        return Err(format!("Node {child} is the scene root"));
    }
    if is_ancestor(ctx, child, parent) {
        return Err(format!(
            "Adding node {child} under {parent} would create a cycle"
        ));
    }

    crate::drawable::init_debug_information(ctx, child)?;
    ctx.node_mut(parent)?.children.push(child);
    set_parent(ctx, child, parent)?;

    log::debug!("add_child: parent={parent}, child={child}");
    Ok(())
}

pub fn add_children(ctx: &mut SceneContext, parent: u32, children: &[u32]) -> Result<(), String> {
    for &child in children {
        add_child(ctx, parent, child)?;
    }
    Ok(())
}

/// Detach `child` from `parent`. The child becomes the root of a free
/// subtree whose absolute positions equal its local ones.
pub fn remove_child(ctx: &mut SceneContext, parent: u32, child: u32) -> Result<(), String> {
    ctx.validate_handle(parent)?;
    ctx.validate_handle(child)?;

    if ctx.nodes[&child].parent != Some(parent) {
        return Err(format!("Node {child} is not a child of {parent}"));
    }

    ctx.node_mut(parent)?.children.retain(|&h| h != child);
    ctx.node_mut(child)?.parent = None;
    set_parents_absolute_position(ctx, child, Position::ORIGIN);

    log::debug!("remove_child: parent={parent}, child={child}");
    Ok(())
}

/// Assign the owning parent and cascade absolute positions through the
/// subtree rooted at `child`. Callers keep the parent's child list in sync.
pub(crate) fn set_parent(ctx: &mut SceneContext, child: u32, parent: u32) -> Result<(), String> {
    let origin = {
        let p = ctx.node(parent)?;
        p.absolute_position + p.scroll_offset
    };
    ctx.node_mut(child)?.parent = Some(parent);
    set_parents_absolute_position(ctx, child, origin);
    Ok(())
}

/// Recompute `absolute = parent_origin + position` for a node and every
/// descendant. `parent_origin` already includes the parent's scroll offset.
pub(crate) fn set_parents_absolute_position(
    ctx: &mut SceneContext,
    handle: u32,
    parent_origin: Position,
) {
    let (origin, children) = match ctx.nodes.get_mut(&handle) {
        Some(node) => {
            node.absolute_position = parent_origin + node.position;
            (
                node.absolute_position + node.scroll_offset,
                node.children.clone(),
            )
        }
        None => return,
    };
    for child in children {
        set_parents_absolute_position(ctx, child, origin);
    }
}

/// Children of a node in forward (insertion) or reversed order.
pub fn children(ctx: &SceneContext, handle: u32, reversed: bool) -> Vec<u32> {
    match ctx.nodes.get(&handle) {
        Some(node) if reversed => node.children_reversed().collect(),
        Some(node) => node.children().to_vec(),
        None => Vec::new(),
    }
}

/// Real nodes only: traversals treat the null drawable as an empty tree.
fn real(ctx: &SceneContext, handle: u32) -> Option<&Drawable> {
    if handle == NULL_DRAWABLE {
        return None;
    }
    ctx.nodes.get(&handle)
}

// ============================================================================
// Traversal
// ============================================================================

/// Pre-order search, children visited last-added first.
pub fn find<F>(ctx: &SceneContext, handle: u32, f: &F) -> Vec<u32>
where
    F: Fn(&Drawable) -> bool,
{
    let mut found = Vec::new();
    find_into(ctx, handle, f, &mut found);
    found
}

fn find_into<F>(ctx: &SceneContext, handle: u32, f: &F, out: &mut Vec<u32>)
where
    F: Fn(&Drawable) -> bool,
{
    let node = match real(ctx, handle) {
        Some(n) => n,
        None => return,
    };
    if f(node) {
        out.push(handle);
    }
    for child in node.children_reversed() {
        find_into(ctx, child, f, out);
    }
}

/// Post-order search: every child subtree (forward order) before the node.
pub fn find_bottom_up<F>(ctx: &SceneContext, handle: u32, f: &F) -> Vec<u32>
where
    F: Fn(&Drawable) -> bool,
{
    let mut found = Vec::new();
    find_bottom_up_into(ctx, handle, f, &mut found);
    found
}

fn find_bottom_up_into<F>(ctx: &SceneContext, handle: u32, f: &F, out: &mut Vec<u32>)
where
    F: Fn(&Drawable) -> bool,
{
    let node = match real(ctx, handle) {
        Some(n) => n,
        None => return,
    };
    for &child in node.children() {
        find_bottom_up_into(ctx, child, f, out);
    }
    if f(node) {
        out.push(handle);
    }
}

/// First match in `find` order, or `NULL_DRAWABLE`.
pub fn find_first<F>(ctx: &SceneContext, handle: u32, f: &F) -> u32
where
    F: Fn(&Drawable) -> bool,
{
    find_first_inner(ctx, handle, f).unwrap_or(NULL_DRAWABLE)
}

fn find_first_inner<F>(ctx: &SceneContext, handle: u32, f: &F) -> Option<u32>
where
    F: Fn(&Drawable) -> bool,
{
    let node = real(ctx, handle)?;
    if f(node) {
        return Some(handle);
    }
    node.children_reversed()
        .find_map(|child| find_first_inner(ctx, child, f))
}

/// First match in `find_bottom_up` order, or `NULL_DRAWABLE`.
pub fn find_first_bottom_up<F>(ctx: &SceneContext, handle: u32, f: &F) -> u32
where
    F: Fn(&Drawable) -> bool,
{
    find_first_bottom_up_inner(ctx, handle, f).unwrap_or(NULL_DRAWABLE)
}

fn find_first_bottom_up_inner<F>(ctx: &SceneContext, handle: u32, f: &F) -> Option<u32>
where
    F: Fn(&Drawable) -> bool,
{
    let node = real(ctx, handle)?;
    if let Some(found) = node
        .children()
        .iter()
        .find_map(|&child| find_first_bottom_up_inner(ctx, child, f))
    {
        return Some(found);
    }
    f(node).then_some(handle)
}

/// Pre-order search, children visited in insertion order.
pub fn filter<F>(ctx: &SceneContext, handle: u32, f: &F) -> Vec<u32>
where
    F: Fn(&Drawable) -> bool,
{
    let mut filtered = Vec::new();
    filter_into(ctx, handle, f, &mut filtered);
    filtered
}

fn filter_into<F>(ctx: &SceneContext, handle: u32, f: &F, out: &mut Vec<u32>)
where
    F: Fn(&Drawable) -> bool,
{
    let node = match real(ctx, handle) {
        Some(n) => n,
        None => return,
    };
    if f(node) {
        out.push(handle);
    }
    for &child in node.children() {
        filter_into(ctx, child, f, out);
    }
}

/// Visit a node, then each child subtree. The child list is read after `f`
/// returns, so `f` may restructure the node it is given.
pub fn map<F>(ctx: &mut SceneContext, handle: u32, f: &mut F, reversed: bool)
where
    F: FnMut(&mut SceneContext, u32),
{
    if real(ctx, handle).is_none() {
        return;
    }
    f(ctx, handle);
    for child in children(ctx, handle, reversed) {
        map(ctx, child, f, reversed);
    }
}

/// Visit each child subtree, then the node.
pub fn bottom_up_map<F>(ctx: &mut SceneContext, handle: u32, f: &mut F, reversed: bool)
where
    F: FnMut(&mut SceneContext, u32),
{
    if real(ctx, handle).is_none() {
        return;
    }
    for child in children(ctx, handle, reversed) {
        bottom_up_map(ctx, child, f, reversed);
    }
    f(ctx, handle);
}
