//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::{debug, warn};

use dom_bootstrap_sdk::render::RenderElement;

use super::render::{RenderTreeConsumer, html_escape, render_attributes};

/// Templates shipped with the kernel, one per theme hook.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (
        "collapsible_links.html",
        include_str!("../../templates/collapsible_links.html"),
    ),
    (
        "bootstrap_icon.html",
        include_str!("../../templates/bootstrap_icon.html"),
    ),
    (
        "menu_local_task.html",
        include_str!("../../templates/menu_local_task.html"),
    ),
];

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
    /// Render tree consumer for RenderElement to HTML.
    render_consumer: RenderTreeConsumer,
}

impl ThemeEngine {
    /// Create a theme engine.
    ///
    /// Templates in `template_dir` (`**/*.html`) take precedence over the
    /// built-in ones, which fill in any hook the directory doesn't cover.
    pub fn new(template_dir: Option<&Path>) -> Result<Self> {
        let mut builtin = Tera::default();
        builtin
            .add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .context("failed to load built-in templates")?;

        let mut tera = match template_dir {
            Some(dir) if dir.is_dir() => {
                let pattern = dir.join("**/*.html");
                let pattern_str = pattern
                    .to_str()
                    .context("invalid template directory path")?;
                let mut overrides =
                    Tera::new(pattern_str).context("failed to initialize Tera templates")?;
                overrides
                    .extend(&builtin)
                    .context("failed to merge built-in templates")?;
                overrides
            }
            Some(dir) => {
                warn!(dir = %dir.display(), "template directory not found, using built-in templates");
                builtin
            }
            None => builtin,
        };

        Self::register_filters(&mut tera);

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
            render_consumer: RenderTreeConsumer::new(),
        })
    }

    /// Create a theme engine with only the built-in templates.
    pub fn builtin() -> Result<Self> {
        Self::new(None)
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Renders an attribute object; `class` is prepended to the element's own classes
        tera.register_filter(
            "attrs",
            |value: &tera::Value, args: &HashMap<String, tera::Value>| {
                let base_class = args.get("class").and_then(|v| v.as_str());
                let attributes = value.is_object().then_some(value);
                Ok(tera::Value::String(render_attributes(attributes, base_class)))
            },
        );

        // Escapes for attribute values without touching `/`, unlike Tera's autoescape
        tera.register_filter(
            "escape_attr",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let text = tera::try_get_value!("escape_attr", "value", String, value);
                Ok(tera::Value::String(html_escape(&text)))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached for performance.
    ///
    /// Example suggestions: `["collapsible_links__main_menu", "collapsible_links"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");

        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }

            // Also try without .html extension (in case suggestion already has it)
            if self.tera.get_template(suggestion).is_ok() {
                let name = (*suggestion).to_string();
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }

        // Don't cache negative results to allow hot-reload
        None
    }

    /// Generate template suggestions for a theme hook.
    ///
    /// `__` separates suggestion parts, most specific first:
    /// `collapsible_links__tabs__primary` yields itself,
    /// `collapsible_links__tabs` and `collapsible_links`.
    pub fn theme_suggestions(hook: &str) -> Vec<String> {
        let parts: Vec<&str> = hook.split("__").collect();
        (1..=parts.len())
            .rev()
            .map(|n| parts[..n].join("__"))
            .collect()
    }

    /// Render a theme hook with prepared variables.
    pub fn render_theme_hook(&self, hook: &str, context: &tera::Context) -> Result<String> {
        let suggestions = Self::theme_suggestions(hook);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let template = self
            .resolve_template(&suggestion_refs)
            .with_context(|| format!("no template for theme hook '{hook}'"))?;

        self.tera
            .render(&template, context)
            .with_context(|| format!("failed to render theme hook '{hook}'"))
    }

    /// Render a RenderElement tree to HTML.
    pub fn render_element(&self, element: &RenderElement, key: &str) -> Result<String> {
        self.render_consumer.render(self, element, key)
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

/// Wrap ThemeEngine in Arc for sharing.
pub type SharedThemeEngine = Arc<ThemeEngine>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use dom_bootstrap_sdk::render;
    use dom_bootstrap_sdk::types::Url;

    #[test]
    fn test_theme_suggestions() {
        assert_eq!(
            ThemeEngine::theme_suggestions("collapsible_links__tabs__primary"),
            vec![
                "collapsible_links__tabs__primary",
                "collapsible_links__tabs",
                "collapsible_links"
            ]
        );
        assert_eq!(ThemeEngine::theme_suggestions("bootstrap_icon"), vec!["bootstrap_icon"]);
    }

    #[test]
    fn test_resolve_falls_back_to_base_hook() {
        let engine = ThemeEngine::builtin().unwrap();
        let resolved = engine.resolve_template(&["collapsible_links__main", "collapsible_links"]);
        assert_eq!(resolved.as_deref(), Some("collapsible_links.html"));
        assert!(engine.resolve_template(&["nope"]).is_none());
    }

    #[test]
    fn test_template_dir_overrides_builtin() {
        let dir = std::env::temp_dir().join(format!("dom_bootstrap_theme_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("collapsible_links__main.html"),
            "custom {{ title }}",
        )
        .unwrap();

        let engine = ThemeEngine::new(Some(&dir)).unwrap();
        let el = render::theme("collapsible_links__main").var("title", "Menu").build();
        assert_eq!(engine.render_element(&el, "m").unwrap(), "custom Menu");

        let plain = render::theme("collapsible_links").var("title", "Menu").build();
        assert!(engine.render_element(&plain, "m").unwrap().contains("collapsible-links"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_template_dir_uses_builtin() {
        let engine = ThemeEngine::new(Some(Path::new("/nonexistent/templates"))).unwrap();
        assert!(engine.tera().get_template("bootstrap_icon.html").is_ok());
    }

    #[test]
    fn test_render_collapsible_links_with_children() {
        let engine = ThemeEngine::builtin().unwrap();
        let el = render::theme("collapsible_links")
            .var("title", "About")
            .var("collapsed", false)
            .var("active", true)
            .child("team", render::link(&Url::unrouted("/about/team"), "Team").weight(0).build())
            .child("hr", render::html_tag("hr").weight(1).build())
            .build();
        let html = engine.render_element(&el, "main-about").unwrap();
        assert!(html.contains("collapsible-links active"));
        assert!(html.contains("id=\"collapsible-main-about\""));
        assert!(html.contains("<a href=\"/about/team\">Team</a>"));
        assert!(html.contains("<hr />"));
        assert!(html.contains("collapse show"));
        assert!(html.find("Team").unwrap() < html.find("<hr />").unwrap());
    }

    #[test]
    fn test_render_collapsible_links_leaf() {
        let engine = ThemeEngine::builtin().unwrap();
        let el = render::theme("collapsible_links")
            .var("title", "News")
            .var("title_url", "/news")
            .var(
                "title_attributes",
                serde_json::json!({"data-drupal-link-system-path": "news"}),
            )
            .build();
        let html = engine.render_element(&el, "news").unwrap();
        assert!(html.contains("href=\"/news\""));
        assert!(html.contains("data-drupal-link-system-path=\"news\""));
        assert!(!html.contains("data-bs-toggle"));
    }

    #[test]
    fn test_render_bootstrap_icon() {
        let engine = ThemeEngine::builtin().unwrap();
        let el = render::theme("bootstrap_icon")
            .var("icon", "house")
            .class("h4")
            .class("d-md-none")
            .build();
        let html = engine.render_element(&el, "mobile").unwrap();
        assert_eq!(html.trim(), "<i class=\"bi bi-house h4 d-md-none\" aria-hidden=\"true\"></i>");
    }
}
