use super::{Settings, smart_load};
use crate::error::SetupError;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;
use std::path::Path;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "PRECOMPRESS_";

pub struct PrecompressConfig {
    figment: Figment,
}

impl PrecompressConfig {
    pub fn load() -> Result<Self, SetupError> {
        Self::load_with(None, None::<()>)
    }

    /// Layer every configuration source, lowest priority first
    pub fn load_with<T: Serialize>(
        custom_config: Option<&str>,
        cli_overrides: Option<T>,
    ) -> Result<Self, SetupError> {
        tracing::trace!("CONFIG LOAD: Starting");

        let user_base = Self::user_config_base_path();
        let mut figment = Figment::new()
            .merge(Toml::string(DEFAULT_CONFIG))
            // User config - support multiple formats
            .merge(Toml::file(format!("{user_base}.toml")))
            .merge(Json::file(format!("{user_base}.json")))
            .merge(Yaml::file(format!("{user_base}.yaml")))
            .merge(Yaml::file(format!("{user_base}.yml")))
            // Repository config - support multiple formats
            .merge(Toml::file("precompress.toml"))
            .merge(Json::file("precompress.json"))
            .merge(Yaml::file("precompress.yaml"))
            .merge(Yaml::file("precompress.yml"));

        if let Some(custom_path) = custom_config {
            if !Path::new(custom_path).is_file() {
                return Err(SetupError::InvalidConfig(format!(
                    "config file not found: {custom_path}"
                )));
            }
            figment = figment.merge(smart_load::auto(custom_path));
        }

        // Environment variables override files, CLI flags override everything
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(PrecompressConfig { figment })
    }

    /// Deserialize the merged configuration
    pub fn settings(&self) -> Result<Settings, SetupError> {
        Ok(self.figment.extract()?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value, SetupError> {
        Ok(self.figment.extract()?)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/precompress/config"),
            Err(_) => "~/.config/precompress/config".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Toggle;
    use crate::logging::LogLevel;
    use crate::request::GzipOptions;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_load() {
        let config = PrecompressConfig::load_with(None, None::<()>).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.gzip, Toggle::Enabled(true));
        assert_eq!(settings.brotli, Toggle::Enabled(true));
        assert_eq!(settings.buffer_size, 65536);
        assert_eq!(settings.max_workers, 0);
    }

    #[test]
    fn test_custom_config_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        fs::write(
            &path,
            r#"{"glob": "site/**/*.js", "gzip": {"level": 9}, "log_level": "debug"}"#,
        )
        .unwrap();

        let config = PrecompressConfig::load_with(path.to_str(), None::<()>).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.glob.as_deref(), Some("site/**/*.js"));
        assert_eq!(settings.gzip, Toggle::Options(GzipOptions { level: 9 }));
        assert_eq!(settings.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_cli_overrides_win() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "glob = \"from-file/*.txt\"\nmax_workers = 2\n").unwrap();

        let overrides = serde_json::json!({ "glob": "from-cli/*.txt", "zstd": true });
        let config = PrecompressConfig::load_with(path.to_str(), Some(overrides)).unwrap();
        let settings = config.settings().unwrap();

        assert_eq!(settings.glob.as_deref(), Some("from-cli/*.txt"));
        assert_eq!(settings.max_workers, 2);
        assert!(settings.zstd);
    }

    #[test]
    fn test_missing_custom_config_is_setup_error() {
        let result = PrecompressConfig::load_with(Some("does-not-exist.toml"), None::<()>);
        assert!(matches!(result, Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_value_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "max_workers = \"lots\"\n").unwrap();

        let config = PrecompressConfig::load_with(path.to_str(), None::<()>).unwrap();
        assert!(matches!(config.settings(), Err(SetupError::Config(_))));
    }
}
