//! PDF location and download helpers.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::Client;
use shared::domain::CertificateId;
use tracing::info;

use crate::error::LookupError;

const DOWNLOAD_FILENAME_PREFIX: &str = "TN_Birth_Certificate_";

/// `base_url + cert_id + ".pdf"`. The id grammar only admits url-safe characters,
/// so nothing is escaped.
pub fn build_pdf_url(base_url: &str, cert_id: &CertificateId) -> String {
    format!("{base_url}{cert_id}.pdf")
}

/// Suggested name for a saved document, derived from the last `_`-delimited
/// segment of its url.
pub fn download_filename(pdf_url: &str) -> String {
    let last_segment = pdf_url.rsplit('_').next().unwrap_or(pdf_url);
    let cert_id = last_segment.replacen(".pdf", "", 1);
    format!("{DOWNLOAD_FILENAME_PREFIX}{cert_id}.pdf")
}

pub struct DocumentFetcher {
    http: Client,
    timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self { http, timeout }
    }

    /// Fetches `pdf_url` and writes it under `dest_dir` using [`download_filename`].
    pub async fn download(&self, pdf_url: &str, dest_dir: &Path) -> Result<PathBuf, LookupError> {
        let download_err = |source| LookupError::Download {
            url: pdf_url.to_string(),
            source,
        };
        let bytes = self
            .http
            .get(pdf_url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(download_err)?
            .error_for_status()
            .map_err(download_err)?
            .bytes()
            .await
            .map_err(download_err)?;

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|source| LookupError::Io {
                path: dest_dir.to_path_buf(),
                source,
            })?;
        let path = dest_dir.join(download_filename(pdf_url));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| LookupError::Io {
                path: path.clone(),
                source,
            })?;

        info!(url = pdf_url, path = %path.display(), size_bytes = bytes.len(), "certificate saved");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "tests/document_tests.rs"]
mod tests;
