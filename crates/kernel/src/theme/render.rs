//! Render tree consumer - converts RenderElement trees to HTML.
//!
//! `#theme` elements go through a template resolved by the [`ThemeEngine`];
//! html tags, links, markup and containers are rendered inline.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tera::Context as TeraContext;
use tracing::warn;

use dom_bootstrap_sdk::render::RenderElement;

use super::ThemeEngine;

/// Elements rendered without a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "meta", "link"];

/// Consumer that converts RenderElement trees to HTML.
pub struct RenderTreeConsumer {
    _private: (),
}

impl RenderTreeConsumer {
    /// Create a new render tree consumer.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Render a RenderElement tree to HTML.
    ///
    /// `key` names the element within its parent; theme templates use it to
    /// derive stable DOM ids.
    pub fn render(&self, engine: &ThemeEngine, element: &RenderElement, key: &str) -> Result<String> {
        if !element.is_accessible() {
            return Ok(String::new());
        }

        match element.element_type.as_str() {
            "theme" => self.render_theme(engine, element, key),
            "html_tag" => {
                let children = self.render_children(engine, element, key)?;
                Ok(self.render_tag(element, &children))
            }
            "link" => Ok(self.render_link(element)),
            "markup" => Ok(self.render_markup(element)),
            "container" => {
                let children = self.render_children(engine, element, key)?;
                Ok(self.render_container(element, &children))
            }
            other => {
                let children = self.render_children(engine, element, key)?;
                Ok(format!(
                    "<div{}>{children}</div>",
                    render_attributes(
                        element.attributes.as_ref(),
                        Some(&format!("element element--{other}")),
                    )
                ))
            }
        }
    }

    /// Render accessible children, sorted by weight, one string each.
    fn render_child_list(
        &self,
        engine: &ThemeEngine,
        element: &RenderElement,
        key: &str,
    ) -> Result<Vec<String>> {
        element
            .sorted_children()
            .into_iter()
            .filter(|(_, child)| child.is_accessible())
            .map(|(child_key, child)| self.render(engine, child, &format!("{key}-{child_key}")))
            .collect()
    }

    fn render_children(&self, engine: &ThemeEngine, element: &RenderElement, key: &str) -> Result<String> {
        Ok(self.render_child_list(engine, element, key)?.concat())
    }

    /// Render a `#theme` element through its template.
    ///
    /// Children are rendered first and handed to the template as `links`.
    fn render_theme(&self, engine: &ThemeEngine, element: &RenderElement, key: &str) -> Result<String> {
        let Some(hook) = element.theme.as_deref() else {
            warn!(key, "theme element without a hook");
            return self.render_children(engine, element, key);
        };

        let links = self.render_child_list(engine, element, key)?;

        let mut context =
            TeraContext::from_value(Value::Object(element.vars.clone())).context("invalid theme variables")?;
        context.insert("links", &links);
        context.insert("element_key", &dom_id(key));
        context.insert(
            "attributes",
            element
                .attributes
                .as_ref()
                .unwrap_or(&Value::Object(Map::new())),
        );
        let class = class_string(element.attributes.as_ref());
        if !class.is_empty() {
            context.insert("class", &class);
        }

        engine.render_theme_hook(hook, &context)
    }

    /// Render an html tag; void tags take no value.
    fn render_tag(&self, element: &RenderElement, children: &str) -> String {
        let tag = element.tag.as_deref().unwrap_or("div");
        let attrs = render_attributes(element.attributes.as_ref(), None);

        if VOID_ELEMENTS.contains(&tag) {
            return format!("<{tag}{attrs} />");
        }

        let value = element
            .value
            .as_deref()
            .map(|v| self.process_value(v, element.format.as_deref()))
            .unwrap_or_default();
        format!("<{tag}{attrs}>{value}{children}</{tag}>")
    }

    /// Render a link element (`href` lives in the attributes).
    fn render_link(&self, element: &RenderElement) -> String {
        let text = element.value.as_deref().map(html_escape).unwrap_or_default();
        format!(
            "<a{}>{text}</a>",
            render_attributes(element.attributes.as_ref(), None)
        )
    }

    /// Render a markup element.
    fn render_markup(&self, element: &RenderElement) -> String {
        let value = element
            .value
            .as_ref()
            .map(|v| self.process_value(v, element.format.as_deref()))
            .unwrap_or_default();

        match element.tag.as_deref() {
            Some(tag) if VOID_ELEMENTS.contains(&tag) => {
                format!("<{tag}{} />", render_attributes(element.attributes.as_ref(), None))
            }
            Some(tag) => format!(
                "<{tag}{}>{value}</{tag}>",
                render_attributes(element.attributes.as_ref(), None)
            ),
            None => value,
        }
    }

    /// Render a container; without attributes it only groups its children.
    fn render_container(&self, element: &RenderElement, children: &str) -> String {
        if element.attributes.is_none() {
            return children.to_string();
        }
        format!(
            "<div{}>{children}</div>",
            render_attributes(element.attributes.as_ref(), None)
        )
    }

    /// Plain text is escaped; any other text format is sanitized.
    fn process_value(&self, value: &str, format: Option<&str>) -> String {
        match format.unwrap_or("plain_text") {
            "plain_text" => html_escape(value),
            _ => ammonia::clean(value),
        }
    }
}

impl Default for RenderTreeConsumer {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape text for HTML content and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Convert a classes value (array or string) to a space-separated string.
fn classes_to_string(classes: &Value) -> String {
    match classes {
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

fn class_string(attributes: Option<&Value>) -> String {
    attributes
        .and_then(|attrs| attrs.get("class"))
        .map(classes_to_string)
        .unwrap_or_default()
}

/// Whether `name` can be written into a tag as an attribute name.
fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b':' | b'.' | b'-'))
}

/// Render an attribute object as ` name="value"` pairs.
///
/// `class` comes first, prefixed with `base_class` when given. `true` renders
/// a bare attribute, `false` and `null` are dropped. Names that aren't valid
/// attribute names are dropped with a warning.
pub fn render_attributes(attributes: Option<&Value>, base_class: Option<&str>) -> String {
    let mut html = String::new();

    let own_class = class_string(attributes);
    let class = match (base_class.filter(|c| !c.is_empty()), own_class.is_empty()) {
        (Some(base), true) => base.to_string(),
        (Some(base), false) => format!("{base} {own_class}"),
        (None, _) => own_class,
    };
    if !class.is_empty() {
        let _ = write!(html, " class=\"{}\"", html_escape(&class));
    }

    let Some(Value::Object(obj)) = attributes else {
        return html;
    };

    let mut pairs: Vec<_> = obj.iter().filter(|(k, _)| *k != "class").collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));

    for (name, value) in pairs {
        if !is_attribute_name(name) {
            warn!(attribute = %name, "dropping invalid attribute name");
            continue;
        }
        match value {
            Value::String(s) => {
                let _ = write!(html, " {name}=\"{}\"", html_escape(s));
            }
            Value::Bool(true) => {
                let _ = write!(html, " {name}");
            }
            Value::Bool(false) | Value::Null => {}
            Value::Array(_) => {
                let _ = write!(html, " {name}=\"{}\"", html_escape(&classes_to_string(value)));
            }
            other => {
                let _ = write!(html, " {name}=\"{}\"", html_escape(&other.to_string()));
            }
        }
    }
    html
}

/// Turn an element key path into a DOM id fragment.
pub fn dom_id(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}
