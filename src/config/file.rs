// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! File-based configuration provider implementation.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

use super::ConfigError;
use super::ConfigProvider;

/// Supported file formats for configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// JSON format (.json)
    Json,
    /// TOML format (.toml)
    Toml,
    /// YAML format (.yaml, .yml)
    Yaml,
}

impl FileFormat {
    /// Detect the file format from the file extension.
    pub fn from_extension(path: &Path) -> Option<Self> {
        path.extension().and_then(|ext| {
            match ext.to_string_lossy().to_lowercase().as_str() {
                "json" => Some(FileFormat::Json),
                "toml" => Some(FileFormat::Toml),
                "yaml" | "yml" => Some(FileFormat::Yaml),
                _ => None,
            }
        })
    }

    pub const fn name(self) -> &'static str {
        match self {
            FileFormat::Json => "JSON",
            FileFormat::Toml => "TOML",
            FileFormat::Yaml => "YAML",
        }
    }
}

/// File-based configuration provider.
///
/// The whole document is parsed once; keys are dot-separated paths into it.
#[derive(Debug)]
pub struct FileConfigProvider {
    path: PathBuf,
    format: FileFormat,
    data: serde_json::Map<String, Value>,
}

impl FileConfigProvider {
    /// Create a new file-based configuration provider.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let path_buf = PathBuf::from(path);
        let format = FileFormat::from_extension(&path_buf)
            .ok_or_else(|| ConfigError::UnsupportedFormat(path_buf.clone()))?;

        let content = fs::read_to_string(&path_buf).map_err(|source| ConfigError::Read {
            path: path_buf.clone(),
            source,
        })?;
        let data = Self::parse(&content, format)?;

        Ok(Self {
            path: path_buf,
            format,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Parse a document into the unified JSON representation.
    fn parse(content: &str, format: FileFormat) -> Result<serde_json::Map<String, Value>, ConfigError> {
        let value = match format {
            FileFormat::Json => serde_json::from_str::<Value>(content)
                .map_err(|e| ConfigError::syntax("JSON", e))?,
            FileFormat::Toml => {
                let toml_value: toml::Value = toml::from_str(content).map_err(|e| ConfigError::syntax("TOML", e))?;
                serde_json::to_value(toml_value).map_err(|e| ConfigError::syntax("TOML", e))?
            }
            FileFormat::Yaml => {
                let yaml_value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| ConfigError::syntax("YAML", e))?;
                serde_json::to_value(yaml_value).map_err(|e| ConfigError::syntax("YAML", e))?
            }
        };

        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::syntax(format.name(), "root must be an object")),
        }
    }

    fn get_nested_value(&self, key_path: &str) -> Option<&Value> {
        let mut parts = key_path.split('.');
        let mut current = self.data.get(parts.next()?)?;

        for part in parts {
            current = current.get(part)?;
        }

        Some(current)
    }
}

impl ConfigProvider for FileConfigProvider {
    fn has(&self, key: &str) -> bool {
        self.get_nested_value(key).is_some()
    }

    fn provider_name(&self) -> &str {
        "file"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.get_nested_value(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigProviderExt;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_toml_nested_keys() {
        let file = write_temp(
            ".toml",
            r#"
            [saml.sso]
            sso_login_url = "/login"
            enable_sso_hok = false

            [saml.metadata_manager]
            metadata_locations = ["file:idp.xml"]
            "#,
        );

        let provider = FileConfigProvider::new(file.path().to_str().unwrap()).unwrap();
        assert_eq!(provider.format(), FileFormat::Toml);

        let login: String = provider.get("saml.sso.sso_login_url").unwrap().unwrap();
        assert_eq!(login, "/login");
        let hok: bool = provider.get("saml.sso.enable_sso_hok").unwrap().unwrap();
        assert!(!hok);
        let locations: Vec<String> = provider.get("saml.metadata_manager.metadata_locations").unwrap().unwrap();
        assert_eq!(locations, vec!["file:idp.xml"]);
        assert!(!provider.has("saml.sso.missing"));
    }

    #[test]
    fn test_yaml_and_json() {
        let yaml = write_temp(".yaml", "saml:\n  key_manager:\n    default_key: apollo\n");
        let provider = FileConfigProvider::new(yaml.path().to_str().unwrap()).unwrap();
        let alias: String = provider.get("saml.key_manager.default_key").unwrap().unwrap();
        assert_eq!(alias, "apollo");

        let json = write_temp(".json", r#"{"saml": {"tls": {"protocol": "https"}}}"#);
        let provider = FileConfigProvider::new(json.path().to_str().unwrap()).unwrap();
        assert!(provider.has("saml.tls.protocol"));
    }

    #[test]
    fn test_unsupported_extension_and_non_object_root() {
        let ini = write_temp(".ini", "a=b");
        assert!(matches!(
            FileConfigProvider::new(ini.path().to_str().unwrap()),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let array = write_temp(".json", "[1, 2]");
        assert!(matches!(
            FileConfigProvider::new(array.path().to_str().unwrap()),
            Err(ConfigError::Syntax { format: "JSON", .. })
        ));
    }
}
