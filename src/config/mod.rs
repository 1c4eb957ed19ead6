use serde::{Deserialize, Serialize};

pub mod validator;

/// Engine settings.
///
/// Every field has a default matching the markup the server renders, so an
/// empty source yields a working configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub submit: SubmitSettings,
    pub formset: FormsetSettings,
    pub schema: SchemaSettings,
    pub units: UnitSettings,
}

/// Confirm-and-submit links
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubmitSettings {
    /// Id of the shared hidden form used for POST submissions
    pub post_form_id: String,
    /// Method assumed when a link declares none
    pub default_method: String,
    /// Link target that means "do nothing"
    pub noop_href: String,
    /// Class that opts a POST link out of interception
    pub opt_out_class: String,
}

impl Default for SubmitSettings {
    fn default() -> Self {
        Self {
            post_form_id: "post-form".to_string(),
            default_method: "POST".to_string(),
            noop_href: "#".to_string(),
            opt_out_class: "no-submit".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FormsetSettings {
    /// Rows at or below this count keep their remove button hidden
    pub floor: usize,
    /// Template id is this prefix followed by the formset id
    pub template_id_prefix: String,
    /// Index placeholder used inside the template
    pub placeholder: String,
    pub add_text: String,
    pub add_class: String,
    pub remove_text: String,
    pub remove_class: String,
}

impl Default for FormsetSettings {
    fn default() -> Self {
        Self {
            floor: 1,
            template_id_prefix: "id_empty_".to_string(),
            placeholder: "__prefix__".to_string(),
            add_text: "Add another".to_string(),
            add_class: "btn btn-outline-primary".to_string(),
            remove_text: "Remove".to_string(),
            remove_class: "btn btn-danger".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SchemaSettings {
    /// Token in the endpoint template replaced by the driver value
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_indicator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_element_id: Option<String>,
    pub failure_message: String,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            placeholder: "999".to_string(),
            busy_indicator_id: Some("product-ingredients-loading".to_string()),
            error_element_id: Some("product-ingredients-error".to_string()),
            failure_message: "Could not load ingredients, please try again.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UnitSettings {
    /// Suffix text shown before the linked field first changes
    pub initial_text: String,
    /// Appended to every looked-up label
    pub plural_suffix: String,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            initial_text: "Units".to_string(),
            plural_suffix: "s".to_string(),
        }
    }
}

impl Settings {
    /// Settings from `<root>/formwork.{toml,json,yaml}`, falling back to defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_root(root: &str) -> Result<Self, anyhow::Error> {
        use config::{Config, File};

        let config_path = std::path::Path::new(root).join("formwork");
        let s = Config::builder()
            .add_source(File::from(config_path).required(false))
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validated()
    }

    /// Settings from the JSON the page embeds inline
    pub fn from_json(raw: &str) -> Result<Self, anyhow::Error> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validated()
    }

    fn validated(self) -> Result<Self, anyhow::Error> {
        validator::ConfigValidator::validate(&self).map_err(|errors| {
            let error_messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow::anyhow!("Configuration validation failed:\n{}", error_messages.join("\n"))
        })?;
        Ok(self)
    }
}
