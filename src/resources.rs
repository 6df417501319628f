// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Build-time resource loading (key files, metadata documents).
//!
//! | location form           | resolved through                      |
//! |-------------------------|---------------------------------------|
//! | `/abs/path`, `rel/path` | file system (relative to `base_dir`)  |
//! | `file:<path>`           | file system                           |
//! | `classpath:<path>`      | file system, relative to `base_dir`   |
//! | `http://`, `https://`   | HTTP GET                              |

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BuildError, ResourceError};
use crate::{debug_fmt, error_fmt};

/// A loaded resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub location: String,
    pub content: Bytes,
}

/// Resolves resource locations to their content.
#[async_trait]
pub trait ResourceLoader: fmt::Debug + Send + Sync {
    async fn load(&self, location: &str) -> Result<Resource, BuildError>;
}

/// File system + HTTP loader.
#[derive(Debug, Clone)]
pub struct DefaultResourceLoader {
    base_dir: PathBuf,
    client: reqwest::Client,
}

impl Default for DefaultResourceLoader {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DefaultResourceLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self::with_timeout(base_dir, Duration::from_secs(30))
    }

    pub fn with_timeout(base_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        // Falls back to a client without a timeout
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        Self {
            base_dir: base_dir.into(),
            client,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    async fn load_file(&self, location: &str, path: &str) -> Result<Resource, BuildError> {
        let resolved = self.resolve_path(path);
        debug_fmt!("ResourceLoader", "Reading {} from {}", location, resolved.display());

        let content = tokio::fs::read(&resolved).await.map_err(|e| {
            error_fmt!("ResourceLoader", "Failed to read {}: {}", resolved.display(), e);
            BuildError::resource(location, e)
        })?;

        Ok(Resource {
            location: location.to_string(),
            content: Bytes::from(content),
        })
    }

    async fn load_http(&self, location: &str) -> Result<Resource, BuildError> {
        debug_fmt!("ResourceLoader", "Fetching {}", location);

        let response = self
            .client
            .get(location)
            .send()
            .await
            .map_err(|e| BuildError::resource(location, e))?;

        let status = response.status();
        if !status.is_success() {
            error_fmt!("ResourceLoader", "Fetching {} returned {}", location, status);
            return Err(BuildError::resource(location, ResourceError::Status(status.as_u16())));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| BuildError::resource(location, e))?;

        Ok(Resource {
            location: location.to_string(),
            content,
        })
    }
}

#[async_trait]
impl ResourceLoader for DefaultResourceLoader {
    async fn load(&self, location: &str) -> Result<Resource, BuildError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            return self.load_http(location).await;
        }
        if let Some(path) = location.strip_prefix("file:") {
            return self.load_file(location, path).await;
        }
        if let Some(path) = location.strip_prefix("classpath:") {
            return self.load_file(location, path.trim_start_matches('/')).await;
        }
        if let Some((scheme, _)) = location.split_once("://") {
            return Err(BuildError::resource(
                location,
                ResourceError::UnsupportedScheme(scheme.to_string()),
            ));
        }

        self.load_file(location, location).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_file_locations() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("idp.xml")).unwrap();
        file.write_all(b"<EntityDescriptor/>").unwrap();

        let loader = DefaultResourceLoader::new(dir.path());

        let plain = loader.load("idp.xml").await.unwrap();
        assert_eq!(plain.content, Bytes::from_static(b"<EntityDescriptor/>"));

        let classpath = loader.load("classpath:/idp.xml").await.unwrap();
        assert_eq!(classpath.location, "classpath:/idp.xml");

        let absolute = format!("file:{}", dir.path().join("idp.xml").display());
        assert!(loader.load(&absolute).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_file_is_resource_error() {
        let loader = DefaultResourceLoader::new("/nonexistent-dir");
        let err = loader.load("file:missing.pem").await.unwrap_err();

        match err {
            BuildError::Resource { location, source: ResourceError::Io(io) } => {
                assert_eq!(location, "file:missing.pem");
                assert_eq!(io.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let loader = DefaultResourceLoader::default();
        let err = loader.load("ftp://idp.example.com/metadata").await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Resource { source: ResourceError::UnsupportedScheme(_), .. }
        ));
    }

    #[tokio::test]
    async fn test_http_locations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/idp/metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<EntityDescriptor/>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = DefaultResourceLoader::default();

        let ok = loader.load(&format!("{}/idp/metadata", server.uri())).await.unwrap();
        assert_eq!(ok.content, Bytes::from_static(b"<EntityDescriptor/>"));

        let err = loader.load(&format!("{}/gone", server.uri())).await.unwrap_err();
        assert!(matches!(
            err,
            BuildError::Resource { source: ResourceError::Status(404), .. }
        ));
    }
}
