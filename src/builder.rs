//! Builder Module — construct Drawable trees from JSON node descriptions.
//!
//! A description is `{type, attributes, children}`. `attributes` is a flat
//! string map: the `attributes` key holds space-separated tags, `text` and
//! `path` feed the widget, and every other key is handed to the style
//! layer. Numbers and booleans are accepted wherever a string is.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::context::SceneContext;
use crate::{drawable, style, texture, tree};
use crate::widget::Widget;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NodeDescription {
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(default)]
    pub children: Vec<NodeDescription>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl AttributeValue {
    pub fn as_value_string(&self) -> String {
        match self {
            AttributeValue::Text(s) => s.clone(),
            AttributeValue::Number(n) => n.to_string(),
            AttributeValue::Flag(b) => b.to_string(),
        }
    }
}

/// Keys consumed by the builder itself rather than the style layer.
const TAGS_KEY: &str = "attributes";
const TEXT_KEY: &str = "text";
const PATH_KEY: &str = "path";

fn widget_for(node_type: &str, attributes: &BTreeMap<String, String>) -> Result<Widget, String> {
    let text = || attributes.get(TEXT_KEY).map(String::as_str).unwrap_or("");
    match node_type.to_ascii_lowercase().as_str() {
        "rect" => Ok(Widget::Rect),
        "text" => Ok(Widget::text(text())),
        "vertical_line" | "verticalline" => Ok(Widget::VerticalLine),
        "texture" => {
            let path = attributes
                .get(PATH_KEY)
                .ok_or_else(|| "Texture node requires a \"path\" attribute".to_string())?;
            texture::load(path)?;
            Ok(Widget::texture(path))
        }
        other => Err(format!("Unknown node type: {other}")),
    }
}

/// Create one unattached node from a description (children are ignored).
pub fn construct_node(ctx: &mut SceneContext, description: &NodeDescription) -> Result<u32, String> {
    let attributes: BTreeMap<String, String> = description
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.as_value_string()))
        .collect();

    let widget = widget_for(&description.node_type, &attributes)?;
    let handle = tree::create_node(ctx, widget)?;

    if let Some(tags) = attributes.get(TAGS_KEY) {
        for tag in tags.split_whitespace() {
            drawable::add_attribute(ctx, handle, tag)?;
        }
    }
    style::apply_style(ctx, handle, &attributes)?;

    Ok(handle)
}

/// Construct a description and its whole subtree, returning the root.
pub fn build_tree(ctx: &mut SceneContext, description: &NodeDescription) -> Result<u32, String> {
    let handle = construct_node(ctx, description)?;
    for child in &description.children {
        let child_handle = build_tree(ctx, child)?;
        tree::add_child(ctx, handle, child_handle)?;
    }
    Ok(handle)
}

pub fn from_json(ctx: &mut SceneContext, source: &str) -> Result<u32, String> {
    let description: NodeDescription =
        serde_json::from_str(source).map_err(|e| format!("Invalid layout: {e}"))?;
    let root = build_tree(ctx, &description)?;
    log::debug!("layout built: root={root}, nodes={}", ctx.node_count());
    Ok(root)
}

pub fn load(ctx: &mut SceneContext, path: impl AsRef<Path>) -> Result<u32, String> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read layout {}: {e}", path.display()))?;
    from_json(ctx, &source)
}
