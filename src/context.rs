//! SceneContext struct — the node arena.
//!
//! The context owns every Drawable of a scene, addressed by stable `u32`
//! handles. Handles are allocated sequentially and never recycled.
//! Handle 0 is the null drawable: a permanent, parentless node that draws
//! nothing and is returned by single-result queries that find no match.

use std::collections::HashMap;

use crate::drawable::Drawable;
use crate::widget::Widget;

/// Handle of the null drawable sentinel.
pub const NULL_DRAWABLE: u32 = 0;

pub struct SceneContext {
    pub nodes: HashMap<u32, Drawable>,
    pub next_handle: u32,
    pub root: Option<u32>,

    /// Draw the per-node debug overlay on top of each node.
    pub debug_overlay: bool,
}

impl SceneContext {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(NULL_DRAWABLE, Drawable::new(Widget::Null));
        Self {
            nodes,
            next_handle: 1, // Handle(0) is the null drawable
            root: None,
            debug_overlay: false,
        }
    }

    /// Validate that a handle refers to an existing, real node.
    pub fn validate_handle(&self, handle: u32) -> Result<(), String> {
        if handle == NULL_DRAWABLE {
            return Err("Handle(0) is the null drawable".to_string());
        }
        if !self.nodes.contains_key(&handle) {
            return Err(format!("Invalid handle: {handle}"));
        }
        Ok(())
    }

    /// Borrow a node. The null drawable is readable like any other node.
    pub fn node(&self, handle: u32) -> Result<&Drawable, String> {
        self.nodes
            .get(&handle)
            .ok_or_else(|| format!("Invalid handle: {handle}"))
    }

    /// Mutably borrow a real node. The null drawable is never mutable.
    pub fn node_mut(&mut self, handle: u32) -> Result<&mut Drawable, String> {
        if handle == NULL_DRAWABLE {
            return Err("Handle(0) is the null drawable".to_string());
        }
        self.nodes
            .get_mut(&handle)
            .ok_or_else(|| format!("Invalid handle: {handle}"))
    }

    pub fn null_drawable(&self) -> &Drawable {
        &self.nodes[&NULL_DRAWABLE]
    }

    /// Make `handle` the root drawn by `render::render`. The root never goes
    /// through `add_child`, so its debug information is initialised here.
    pub fn set_root(&mut self, handle: u32) -> Result<(), String> {
        self.validate_handle(handle)?;
        if self.nodes[&handle].parent.is_some() {
            return Err(format!("Node {handle} has a parent and cannot be the root"));
        }
        crate::drawable::init_debug_information(self, handle)?;
        self.root = Some(handle);
        log::debug!("set_root: handle={handle}");
        Ok(())
    }

    /// Number of real nodes (the null drawable is not counted).
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }
}

impl Default for SceneContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree;

    #[test]
    fn test_null_drawable_always_present() {
        let ctx = SceneContext::new();
        assert_eq!(ctx.node_count(), 0);
        let null = ctx.node(NULL_DRAWABLE).unwrap();
        assert!(matches!(null.widget, Widget::Null));
        assert!(null.parent.is_none());
        assert!(null.children().is_empty());
        assert!(std::ptr::eq(null, ctx.null_drawable()));
    }

    #[test]
    fn test_handle_zero_invalid_for_mutation() {
        let mut ctx = SceneContext::new();
        assert!(ctx.validate_handle(0).is_err());
        assert!(ctx.node_mut(0).is_err());
        assert!(ctx.node(42).is_err());
    }

    #[test]
    fn test_set_root_rejects_parented_node() {
        let mut ctx = SceneContext::new();
        let root = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        let child = tree::create_node(&mut ctx, Widget::Rect).unwrap();
        tree::add_child(&mut ctx, root, child).unwrap();

        assert!(ctx.set_root(child).is_err());
        ctx.set_root(root).unwrap();
        assert_eq!(ctx.root, Some(root));
        assert!(ctx.node(root).unwrap().debug_information_initialised);
    }
}
