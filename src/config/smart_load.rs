use figment::providers::{Format, Json, Toml, Yaml};
use figment::value::{Dict, Map};
use figment::{Error, Metadata, Profile, Provider};
use std::path::{Path, PathBuf};

/// Provider for a config file whose format follows its extension
pub fn auto<P: AsRef<Path>>(path: P) -> impl Provider {
    let path = path.as_ref();
    ConfigFile {
        format: FileFormat::detect(path),
        path: path.to_path_buf(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Json,
    Yaml,
}

impl FileFormat {
    /// Unknown or missing extensions are read as TOML
    fn detect(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => FileFormat::Json,
            Some("yaml" | "yml") => FileFormat::Yaml,
            _ => FileFormat::Toml,
        }
    }
}

struct ConfigFile {
    path: PathBuf,
    format: FileFormat,
}

impl Provider for ConfigFile {
    fn metadata(&self) -> Metadata {
        match self.format {
            FileFormat::Toml => Toml::file(&self.path).metadata(),
            FileFormat::Json => Json::file(&self.path).metadata(),
            FileFormat::Yaml => Yaml::file(&self.path).metadata(),
        }
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        match self.format {
            FileFormat::Toml => Toml::file(&self.path).data(),
            FileFormat::Json => Json::file(&self.path).data(),
            FileFormat::Yaml => Yaml::file(&self.path).data(),
        }
    }
}
