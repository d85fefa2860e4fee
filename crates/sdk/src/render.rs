//! Render element builder API.
//!
//! Tiles return structured render elements (never raw HTML). The theme layer
//! renders these via Tera templates: `#theme` elements go through a named
//! template with `#vars`, everything else is rendered inline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::types::{CacheMetadata, Url};

/// A render element in the render tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderElement {
    #[serde(rename = "#type")]
    pub element_type: String,
    #[serde(rename = "#weight", skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
    #[serde(rename = "#tag", skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(rename = "#value", skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "#format", skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(rename = "#attributes", skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Value>,
    /// Theme hook used to render this element (e.g. `collapsible_links`).
    #[serde(rename = "#theme", skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    /// Variables passed to the theme hook template.
    #[serde(rename = "#vars", default, skip_serializing_if = "Map::is_empty")]
    pub vars: Map<String, Value>,
    /// `Some(false)` hides the element and its children.
    #[serde(rename = "#access", skip_serializing_if = "Option::is_none")]
    pub access: Option<bool>,
    #[serde(rename = "#cache", skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheMetadata>,
    #[serde(flatten)]
    pub children: BTreeMap<String, RenderElement>,
}

impl RenderElement {
    pub fn set_child(&mut self, key: &str, element: RenderElement) {
        self.children.insert(key.into(), element);
    }

    pub fn child(&self, key: &str) -> Option<&RenderElement> {
        self.children.get(key)
    }

    pub fn child_mut(&mut self, key: &str) -> Option<&mut RenderElement> {
        self.children.get_mut(key)
    }

    pub fn set_var(&mut self, key: &str, value: impl Into<Value>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn var(&self, key: &str) -> Option<&Value> {
        self.vars.get(key)
    }

    pub fn remove_var(&mut self, key: &str) -> Option<Value> {
        self.vars.remove(key)
    }

    /// Whether the element may be shown to the current user.
    pub fn is_accessible(&self) -> bool {
        self.access != Some(false)
    }

    /// Children sorted by weight; ties keep key order.
    pub fn sorted_children(&self) -> Vec<(&String, &RenderElement)> {
        let mut children: Vec<_> = self.children.iter().collect();
        children.sort_by_key(|(_, child)| child.weight.unwrap_or(0));
        children
    }

    /// Keys of the accessible children, in weight order.
    pub fn visible_children(&self) -> Vec<&str> {
        self.sorted_children()
            .into_iter()
            .filter(|(_, child)| child.is_accessible())
            .map(|(key, _)| key.as_str())
            .collect()
    }

    /// Merge cache metadata into this element's `#cache`.
    pub fn apply_cacheability(&mut self, metadata: &CacheMetadata) {
        let merged = match self.cache.take() {
            Some(existing) => existing.merge(metadata),
            None => metadata.clone(),
        };
        self.cache = Some(merged);
    }

    /// Append a class to `#attributes.class`, creating the list if needed.
    pub fn add_class(&mut self, class: &str) {
        let attrs = self
            .attributes
            .get_or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(map) = attrs else {
            return;
        };
        match map.get_mut("class") {
            Some(Value::Array(classes)) => classes.push(Value::String(class.into())),
            Some(Value::String(existing)) => {
                let joined = format!("{existing} {class}");
                *existing = joined;
            }
            _ => {
                map.insert("class".into(), Value::Array(vec![Value::String(class.into())]));
            }
        }
    }

    /// Class list from `#attributes.class`.
    pub fn classes(&self) -> Vec<String> {
        match self.attributes.as_ref().and_then(|a| a.get("class")) {
            Some(Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            Some(Value::String(s)) => s.split_whitespace().map(String::from).collect(),
            _ => Vec::new(),
        }
    }
}

/// Builder for constructing render elements.
pub struct ElementBuilder {
    element_type: String,
    weight: Option<i32>,
    tag: Option<String>,
    value: Option<String>,
    theme: Option<String>,
    classes: Vec<String>,
    attrs: Map<String, Value>,
    vars: Map<String, Value>,
    access: Option<bool>,
    cache: Option<CacheMetadata>,
    children: BTreeMap<String, RenderElement>,
}

impl ElementBuilder {
    fn new(element_type: &str) -> Self {
        Self {
            element_type: element_type.into(),
            weight: None,
            tag: None,
            value: None,
            theme: None,
            classes: Vec::new(),
            attrs: Map::new(),
            vars: Map::new(),
            access: None,
            cache: None,
            children: BTreeMap::new(),
        }
    }

    pub fn weight(mut self, w: i32) -> Self {
        self.weight = Some(w);
        self
    }

    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Merge a JSON object of attributes (`class` lists are appended).
    pub fn attributes(mut self, attributes: &Map<String, Value>) -> Self {
        for (key, value) in attributes {
            if key == "class" {
                match value {
                    Value::Array(arr) => self
                        .classes
                        .extend(arr.iter().filter_map(|v| v.as_str().map(String::from))),
                    Value::String(s) => self
                        .classes
                        .extend(s.split_whitespace().map(String::from)),
                    _ => {}
                }
            } else {
                self.attrs.insert(key.clone(), value.clone());
            }
        }
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn access(mut self, access: bool) -> Self {
        self.access = Some(access);
        self
    }

    pub fn cache(mut self, cache: CacheMetadata) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn child(mut self, key: &str, element: RenderElement) -> Self {
        self.children.insert(key.into(), element);
        self
    }

    pub fn build(self) -> RenderElement {
        let attributes = if self.classes.is_empty() && self.attrs.is_empty() {
            None
        } else {
            let mut map = self.attrs;
            if !self.classes.is_empty() {
                map.insert(
                    "class".into(),
                    Value::Array(self.classes.into_iter().map(Value::String).collect()),
                );
            }
            Some(Value::Object(map))
        };

        RenderElement {
            element_type: self.element_type,
            weight: self.weight,
            tag: self.tag,
            value: self.value,
            format: None,
            attributes,
            theme: self.theme,
            vars: self.vars,
            access: self.access,
            cache: self.cache,
            children: self.children,
        }
    }
}

/// Create a container element (groups children).
pub fn container() -> ElementBuilder {
    ElementBuilder::new("container")
}

/// Create a markup element with an HTML tag and text value.
pub fn markup(tag: &str, value: &str) -> ElementBuilder {
    let mut b = ElementBuilder::new("markup");
    b.tag = Some(tag.into());
    b.value = Some(value.into());
    b
}

/// Create an HTML tag element; `hr` and other void tags take no value.
pub fn html_tag(tag: &str) -> ElementBuilder {
    let mut b = ElementBuilder::new("html_tag");
    b.tag = Some(tag.into());
    b
}

/// Create an HTML tag element with an escaped text value.
pub fn html_tag_with_value(tag: &str, value: &str) -> ElementBuilder {
    let mut b = html_tag(tag);
    b.value = Some(value.into());
    b
}

/// Create a link element.
pub fn link(url: &Url, text: &str) -> ElementBuilder {
    let mut b = ElementBuilder::new("link");
    b.tag = Some("a".into());
    b.value = Some(text.into());
    b.attrs.insert("href".into(), Value::String(url.to_string()));
    b
}

/// Create an element rendered through a theme hook template.
pub fn theme(hook: &str) -> ElementBuilder {
    let mut b = ElementBuilder::new("theme");
    b.theme = Some(hook.into());
    b
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_classes() {
        let el = html_tag_with_value("span", "Acme")
            .class("fs-2")
            .class("fw-bold")
            .build();
        assert_eq!(el.classes(), vec!["fs-2", "fw-bold"]);
        assert_eq!(el.tag.as_deref(), Some("span"));
    }

    #[test]
    fn add_class_appends_to_existing_list() {
        let mut el = html_tag("span").class("fs-2").build();
        el.add_class("d-none");
        assert_eq!(el.classes(), vec!["fs-2", "d-none"]);

        let mut bare = html_tag("span").build();
        bare.add_class("h4");
        assert_eq!(bare.classes(), vec!["h4"]);
    }

    #[test]
    fn visible_children_skip_denied() {
        let el = container()
            .child("a", markup("span", "A").weight(1).build())
            .child("b", markup("span", "B").access(false).build())
            .child("c", markup("span", "C").weight(0).build())
            .build();
        assert_eq!(el.visible_children(), vec!["c", "a"]);
    }

    #[test]
    fn serializes_with_hash_keys() {
        let el = theme("collapsible_links")
            .var("title", "Main")
            .child("home", link(&Url::front(), "Home").build())
            .build();
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["#theme"], "collapsible_links");
        assert_eq!(json["#vars"]["title"], "Main");
        assert_eq!(json["home"]["#type"], "link");

        let back: RenderElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, el);
    }

    #[test]
    fn apply_cacheability_merges() {
        let mut el = container()
            .cache(CacheMetadata::new().with_tag("one"))
            .build();
        el.apply_cacheability(&CacheMetadata::new().with_tag("two"));
        let cache = el.cache.unwrap();
        assert!(cache.tags.contains("one"));
        assert!(cache.tags.contains("two"));
    }
}
