use std::path::Path;

use anyhow::anyhow;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const ENVIRONMENT_PREFIX: &str = "STOWAGE_JSON";

/// File- and environment-loadable subset of [`crate::JsonSerializerOptions`].
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SerializerSettings {
    pub property_name_case_insensitive: bool,
    pub ignore_null_on_write: bool,
    pub write_indented: bool,
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self { property_name_case_insensitive: true, ignore_null_on_write: true, write_indented: false }
    }
}

/// Loads settings from defaults, an optional TOML file, then `STOWAGE_JSON_*` variables.
pub fn load_settings(path_override: Option<&Path>) -> anyhow::Result<SerializerSettings> {
    let defaults = SerializerSettings::default();

    let mut builder = Config::builder()
        .set_default("property_name_case_insensitive", defaults.property_name_case_insensitive)?
        .set_default("ignore_null_on_write", defaults.ignore_null_on_write)?
        .set_default("write_indented", defaults.write_indented)?;

    if let Some(path) = path_override {
        let path = path.to_str().ok_or_else(|| anyhow!("config path is not valid utf-8: {}", path.display()))?;
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    }

    let settings: SerializerSettings = builder
        .add_source(Environment::with_prefix(ENVIRONMENT_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()?;

    Ok(settings)
}
