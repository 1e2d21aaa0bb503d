use std::{collections::HashMap, fs};

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: String,
    pub share_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: "./data/builder".into(),
            share_base_url: "https://builder.example/team".into(),
        }
    }
}

/// Defaults, overridden by `builder.toml`, overridden by environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("builder.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("data_dir") {
                settings.data_dir = v.clone();
            }
            if let Some(v) = file_cfg.get("share_base_url") {
                settings.share_base_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("BUILDER_DATA_DIR") {
        settings.data_dir = v;
    }
    if let Ok(v) = std::env::var("BUILDER_SHARE_BASE_URL") {
        settings.share_base_url = v;
    }

    settings
}
