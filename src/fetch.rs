//! Make sure the input dataset is present locally before a run reads it.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::error::{GeoVectorizeError, Result};

/// Retrieves a dataset into a local path.
pub trait DatasetFetcher {
    /// Ensure `local` exists, retrieving it from `url` when it does not.
    ///
    /// An existing file is never overwritten.
    fn fetch(&self, local: &Path, url: Option<&str>) -> Result<()>;
}

fn is_http(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// A fetcher that only deals with the local filesystem.
///
/// Sources are given as `file://` URLs and copied into place. Any other scheme is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFetcher;

impl DatasetFetcher for LocalFetcher {
    fn fetch(&self, local: &Path, url: Option<&str>) -> Result<()> {
        if local.is_file() {
            debug!(path = %local.display(), "Dataset already present");
            return Ok(());
        }

        let Some(url) = url else {
            return Err(GeoVectorizeError::FileNotFound(local.to_path_buf()));
        };
        let Some(source) = url.strip_prefix("file://") else {
            return Err(GeoVectorizeError::NotYetImplemented(format!(
                "fetching datasets from {url}"
            )));
        };

        let source = Path::new(source);
        if !source.is_file() {
            return Err(GeoVectorizeError::FileNotFound(source.to_path_buf()));
        }
        create_parent(local)?;
        info!(
            source = %source.display(),
            path = %local.display(),
            "Caching dataset"
        );
        fs::copy(source, local)?;
        Ok(())
    }
}

/// Downloads `http://` and `https://` sources with a blocking client.
///
/// The body is streamed into a `.part` file next to the target and renamed once complete, so
/// an interrupted download never leaves a truncated dataset behind.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn download(&self, url: &str, local: &Path) -> Result<()> {
        let mut response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeoVectorizeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let partial = local.with_extension("part");
        let mut writer = BufWriter::new(File::create(&partial)?);
        let written = response
            .copy_to(&mut writer)
            .map_err(GeoVectorizeError::from)
            .and_then(|written| {
                writer.flush()?;
                Ok(written)
            });
        drop(writer);
        match written {
            Ok(num_bytes) => {
                fs::rename(&partial, local)?;
                info!(url, path = %local.display(), num_bytes, "Downloaded dataset");
                Ok(())
            }
            Err(err) => {
                if let Err(remove_err) = fs::remove_file(&partial) {
                    warn!(path = %partial.display(), %remove_err, "Could not remove partial download");
                }
                Err(err)
            }
        }
    }
}

impl DatasetFetcher for HttpFetcher {
    fn fetch(&self, local: &Path, url: Option<&str>) -> Result<()> {
        if local.is_file() {
            debug!(path = %local.display(), "Dataset already present");
            return Ok(());
        }

        let Some(url) = url else {
            return Err(GeoVectorizeError::FileNotFound(local.to_path_buf()));
        };
        if !is_http(url) {
            return Err(GeoVectorizeError::NotYetImplemented(format!(
                "fetching datasets from {url}"
            )));
        }

        create_parent(local)?;
        info!(url, path = %local.display(), "Downloading dataset");
        self.download(url, local)
    }
}

/// Picks a fetcher by the scheme of the source URL.
#[derive(Debug, Clone)]
pub struct SchemeFetcher {
    local: LocalFetcher,
    http: HttpFetcher,
}

impl SchemeFetcher {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            local: LocalFetcher,
            http,
        }
    }
}

impl DatasetFetcher for SchemeFetcher {
    fn fetch(&self, local: &Path, url: Option<&str>) -> Result<()> {
        match url {
            Some(url) if is_http(url) => self.http.fetch(local, Some(url)),
            _ => self.local.fetch(local, url),
        }
    }
}
