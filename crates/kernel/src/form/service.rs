//! Form processing: coercing submitted values and validating them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::types::{ElementType, Form};

/// Submitted values for one form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormState {
    /// Form ID.
    pub form_id: String,

    /// Form build ID.
    pub form_build_id: String,

    /// Current form values.
    pub values: HashMap<String, Value>,
}

impl FormState {
    /// Create a new form state.
    pub fn new(form_id: impl Into<String>, form_build_id: impl Into<String>) -> Self {
        Self {
            form_id: form_id.into(),
            form_build_id: form_build_id.into(),
            values: HashMap::new(),
        }
    }

    /// Start a state for a built form.
    pub fn for_form(form: &Form) -> Self {
        Self::new(form.form_id.clone(), form.form_build_id.clone())
    }

    /// Set a submitted value.
    pub fn set_value(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Get a submitted value.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Submitted value as a string; strings pass through, scalars are stringified.
    pub fn string(&self, name: &str) -> Option<String> {
        match self.values.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Submitted value as a checkbox state.
    ///
    /// Accepts booleans, `1`/`0`, and the strings "1", "true", "on", "yes".
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.values.get(name)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => Some(n.as_i64().unwrap_or(0) != 0),
            Value::String(s) => Some(matches!(
                s.to_ascii_lowercase().as_str(),
                "1" | "true" | "on" | "yes"
            )),
            _ => None,
        }
    }
}

/// Validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field name (None for form-level errors).
    pub field: Option<String>,

    /// Error message.
    pub message: String,
}

impl ValidationError {
    /// Create a field-level error.
    pub fn field(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(name.into()),
            message: message.into(),
        }
    }

    /// Create a form-level error.
    pub fn form(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{field}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Run the built-in validation for a submission.
///
/// Required fields must be present and non-empty, select values must be one
/// of the options, and textfields must respect their max length.
pub fn validate_form(form: &Form, state: &FormState) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (name, element) in form.sorted_elements() {
        if !element.is_input() {
            continue;
        }
        let label = element.title.as_deref().unwrap_or(name.as_str());
        let submitted = state.string(name).filter(|s| !s.is_empty());

        if element.required
            && submitted.is_none()
            && !matches!(element.element_type, ElementType::Checkbox)
        {
            errors.push(ValidationError::field(name.as_str(), format!("{label} field is required.")));
            continue;
        }

        let Some(value) = submitted else {
            continue;
        };

        match &element.element_type {
            ElementType::Select { options } => {
                if !options.iter().any(|(key, _)| *key == value) {
                    errors.push(ValidationError::field(
                        name.as_str(),
                        "An illegal choice has been detected. Please contact the site administrator.",
                    ));
                }
            }
            ElementType::Textfield {
                max_length: Some(max),
            } if value.chars().count() > *max => {
                errors.push(ValidationError::field(
                    name.as_str(),
                    format!("{label} cannot be longer than {max} characters."),
                ));
            }
            _ => {}
        }
    }

    debug!(form_id = %form.form_id, errors = errors.len(), "form validated");
    errors
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::form::FormElement;

    fn menu_form() -> Form {
        Form::new("tile_form")
            .element(
                "menu_name",
                FormElement::select(vec![
                    ("main".into(), "Main navigation".into()),
                    ("footer".into(), "Footer".into()),
                ])
                .title("Menu")
                .required(),
            )
            .element("bold", FormElement::textfield().title("Bold").max_length(5))
            .element("include_mobile", FormElement::checkbox().required())
    }

    #[test]
    fn test_form_state_new() {
        let state = FormState::new("test_form", "build-123");
        assert_eq!(state.form_id, "test_form");
        assert_eq!(state.form_build_id, "build-123");
        assert!(state.values.is_empty());
    }

    #[test]
    fn test_validation_error() {
        let field_error = ValidationError::field("email", "Invalid email");
        assert_eq!(field_error.field, Some("email".to_string()));
        assert_eq!(field_error.to_string(), "email: Invalid email");

        let form_error = ValidationError::form("Form expired");
        assert!(form_error.field.is_none());
    }

    #[test]
    fn test_checkbox_coercion() {
        let mut state = FormState::new("f", "b");
        state.set_value("a", "on");
        state.set_value("b", "0");
        state.set_value("c", true);
        state.set_value("d", 1);
        assert_eq!(state.bool("a"), Some(true));
        assert_eq!(state.bool("b"), Some(false));
        assert_eq!(state.bool("c"), Some(true));
        assert_eq!(state.bool("d"), Some(true));
        assert_eq!(state.bool("missing"), None);
    }

    #[test]
    fn required_select_is_enforced() {
        let form = menu_form();
        let state = FormState::for_form(&form);
        let errors = validate_form(&form, &state);
        assert_eq!(errors, vec![ValidationError::field("menu_name", "Menu field is required.")]);
    }

    #[test]
    fn select_rejects_unknown_option() {
        let form = menu_form();
        let mut state = FormState::for_form(&form);
        state.set_value("menu_name", "secret");
        let errors = validate_form(&form, &state);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("illegal choice"));
    }

    #[test]
    fn textfield_max_length() {
        let form = menu_form();
        let mut state = FormState::for_form(&form);
        state.set_value("menu_name", "main");
        state.set_value("bold", "Too long");
        let errors = validate_form(&form, &state);
        assert_eq!(errors[0].field.as_deref(), Some("bold"));

        state.set_value("bold", "Acme");
        assert!(validate_form(&form, &state).is_empty());
    }
}
