use thiserror::Error;

use crate::config::Settings;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(settings: &Settings) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        let required = [
            ("submit.post_form_id", &settings.submit.post_form_id),
            ("submit.default_method", &settings.submit.default_method),
            ("formset.template_id_prefix", &settings.formset.template_id_prefix),
            ("formset.placeholder", &settings.formset.placeholder),
            ("schema.placeholder", &settings.schema.placeholder),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingField(field.to_string()));
            }
        }

        if settings.formset.placeholder.chars().any(|c| c.is_ascii_digit()) {
            errors.push(ValidationError::InvalidValue {
                field: "formset.placeholder".to_string(),
                reason: "Placeholder must not contain digits, it would be read as a row index".to_string(),
            });
        }

        for (field, id) in [
            ("schema.busy_indicator_id", &settings.schema.busy_indicator_id),
            ("schema.error_element_id", &settings.schema.error_element_id),
        ] {
            if matches!(id, Some(id) if id.trim().is_empty()) {
                errors.push(ValidationError::InvalidValue {
                    field: field.to_string(),
                    reason: "Element id must not be empty; omit it instead".to_string(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
