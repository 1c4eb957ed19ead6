use formwork::config::Settings;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_settings_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let formwork_toml = r#"
[submit]
post_form_id = "action-form"

[formset]
floor = 2
remove_text = "Delete"

[schema]
failure_message = "Ingredients unavailable"
"#;
    fs::write(root.join("formwork.toml"), formwork_toml)?;

    let settings = Settings::from_root(root.to_str().unwrap())?;

    assert_eq!(settings.submit.post_form_id, "action-form");
    assert_eq!(settings.submit.default_method, "POST");
    assert_eq!(settings.formset.floor, 2);
    assert_eq!(settings.formset.remove_text, "Delete");
    assert_eq!(settings.formset.placeholder, "__prefix__");
    assert_eq!(settings.schema.failure_message, "Ingredients unavailable");
    assert_eq!(
        settings.schema.busy_indicator_id.as_deref(),
        Some("product-ingredients-loading")
    );

    Ok(())
}

#[test]
fn test_missing_file_yields_defaults() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let settings = Settings::from_root(temp_dir.path().to_str().unwrap())?;
    assert_eq!(settings, Settings::default());
    Ok(())
}

#[test]
fn test_yaml_settings_file() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let formwork_yaml = r#"
units:
  initial_text: "Unit"
  plural_suffix: ""
"#;
    fs::write(root.join("formwork.yaml"), formwork_yaml)?;

    let settings = Settings::from_root(root.to_str().unwrap())?;
    assert_eq!(settings.units.initial_text, "Unit");
    assert_eq!(settings.units.plural_suffix, "");
    Ok(())
}

#[test]
fn test_invalid_settings_file_rejected() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    let formwork_toml = r#"
[formset]
placeholder = "__1__"

[submit]
default_method = ""
"#;
    fs::write(root.join("formwork.toml"), formwork_toml)?;

    let err = Settings::from_root(root.to_str().unwrap()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("submit.default_method"));
    assert!(message.contains("formset.placeholder"));

    Ok(())
}
