//! Two-part text logo tile: a bold word followed by a thin one, with an
//! optional house icon standing in for both on small screens.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use dom_bootstrap_sdk::render::{self, RenderElement};

use super::{BOOTSTRAP_ICON_THEME, Tile, TileContext, decode_settings, encode_settings};
use crate::error::Result;
use crate::form::{Form, FormElement, FormState};
use crate::host::HostServices;

pub const PLUGIN_ID: &str = "dom_bootstrap_text_logo";

/// Longest value the logo text fields accept.
const TEXT_MAX_LENGTH: usize = 128;

const MOBILE_ICON: &str = "house";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLogoConfig {
    pub bold: String,
    pub thin: String,
    /// Swap the text for a home icon below the `md` breakpoint.
    pub include_mobile: bool,
}

impl Default for TextLogoConfig {
    fn default() -> Self {
        Self {
            bold: String::new(),
            thin: String::new(),
            include_mobile: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextLogoTile {
    config: TextLogoConfig,
}

impl TextLogoTile {
    pub fn new(config: TextLogoConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: &Value) -> Result<Self> {
        decode_settings(PLUGIN_ID, settings).map(Self::new)
    }

    pub fn config(&self) -> &TextLogoConfig {
        &self.config
    }
}

impl Tile for TextLogoTile {
    fn plugin_id(&self) -> &'static str {
        PLUGIN_ID
    }

    fn admin_label(&self) -> &'static str {
        "Text Logo"
    }

    fn default_configuration(&self) -> Value {
        encode_settings(&TextLogoConfig::default())
    }

    fn configuration(&self) -> Value {
        encode_settings(&self.config)
    }

    fn form(&self, _services: &HostServices) -> Form {
        Form::new(PLUGIN_ID)
            .title(self.admin_label())
            .element(
                "bold",
                FormElement::textfield()
                    .title("Bold part")
                    .default_value(self.config.bold.clone())
                    .max_length(TEXT_MAX_LENGTH)
                    .weight(0),
            )
            .element(
                "thin",
                FormElement::textfield()
                    .title("Thin part")
                    .default_value(self.config.thin.clone())
                    .max_length(TEXT_MAX_LENGTH)
                    .weight(1),
            )
            .element(
                "include_mobile",
                FormElement::checkbox()
                    .title("Include home icon for mobile")
                    .default_value(self.config.include_mobile)
                    .weight(2),
            )
    }

    fn submit(&mut self, state: &FormState) {
        self.config.bold = state.string("bold").unwrap_or_default();
        self.config.thin = state.string("thin").unwrap_or_default();
        self.config.include_mobile = state.bool("include_mobile").unwrap_or(false);
    }

    fn build(&self, _ctx: &TileContext) -> RenderElement {
        let mut bold = render::html_tag_with_value("span", &self.config.bold)
            .class("fs-2")
            .class("fw-bold")
            .weight(0)
            .build();
        let mut thin = render::html_tag_with_value("span", &self.config.thin)
            .class("fs-2")
            .class("fw-lighter")
            .weight(1)
            .build();

        let mut output = render::container().build();
        if self.config.include_mobile {
            for part in [&mut bold, &mut thin] {
                part.add_class("d-none");
                part.add_class("d-md-inline");
            }
            output.set_child(
                "mobile",
                render::theme(BOOTSTRAP_ICON_THEME)
                    .var("icon", MOBILE_ICON)
                    .class("h4")
                    .class("d-md-none")
                    .weight(2)
                    .build(),
            );
        }
        output.set_child("bold_part", bold);
        output.set_child("thin_part", thin);
        output
    }
}
