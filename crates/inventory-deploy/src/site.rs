//! Static dashboard publishing.
//!
//! The web assets ship with an API endpoint placeholder baked in; publishing
//! rewrites it with the real URL while uploading, then flips the bucket into
//! website mode. Public access is best effort since many accounts block it
//! at the organization level, and a private site is no reason to fail an
//! otherwise good deploy.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::aws::S3Client;

/// Where the dashboard assets live, relative to the launch directory.
pub const DEFAULT_SITE_DIR: &str = "website";

/// Token the shipped assets carry where the API endpoint belongs.
const API_PLACEHOLDER: &str = "REPLACE_WITH_API_ENDPOINT";

/// What [`publish_site`] accomplished.
pub struct PublishOutcome {
    /// Website endpoint of the bucket.
    pub url: String,
    /// Whether public read access was granted.
    pub public: bool,
    /// Number of files uploaded.
    pub files: usize,
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    match ext {
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Assets that may carry the endpoint placeholder and get rewritten.
fn is_text_asset(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "css" | "js")
    )
}

fn rewrite_placeholder(text: &str, api_endpoint: &str) -> String {
    text.replace(API_PLACEHOLDER, api_endpoint)
}

/// Upload the site directory into the web bucket and enable hosting.
///
/// A missing directory downgrades to a warning and `Ok(None)`; the rest of
/// the pipeline works fine without the dashboard.
pub async fn publish_site(
    s3: &S3Client,
    bucket: &str,
    site_dir: &Path,
    api_endpoint: &str,
) -> Result<Option<PublishOutcome>> {
    if !site_dir.is_dir() {
        warn!(
            dir = %site_dir.display(),
            "Site directory not found, skipping the dashboard"
        );
        return Ok(None);
    }

    let mut files = 0usize;
    for entry in WalkDir::new(site_dir).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk {}", site_dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let key = path
            .strip_prefix(site_dir)
            .with_context(|| format!("{} escapes {}", path.display(), site_dir.display()))?
            .to_string_lossy()
            .into_owned();

        let body = if is_text_asset(path) {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            rewrite_placeholder(&text, api_endpoint).into_bytes()
        } else {
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
        };

        debug!(%key, bytes = body.len(), "Uploading site asset");
        s3.put_object_bytes(bucket, &key, body, content_type_for(path))
            .await?;
        files += 1;
    }

    s3.configure_website(bucket).await?;

    let public = match s3.allow_public_read(bucket).await {
        Ok(()) => true,
        Err(err) => {
            warn!("Could not make the site public, it stays private: {err:#}");
            false
        }
    };

    let url = format!(
        "http://{bucket}.s3-website-{region}.amazonaws.com",
        region = s3.region()
    );
    info!(%url, files, public, "Site published");
    Ok(Some(PublishOutcome { url, public, files }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_the_shipped_assets() {
        assert_eq!(content_type_for(Path::new("index.html")), "text/html");
        assert_eq!(content_type_for(Path::new("styles.css")), "text/css");
        assert_eq!(content_type_for(Path::new("app.js")), "application/javascript");
        assert_eq!(
            content_type_for(Path::new("favicon.ico")),
            "image/x-icon"
        );
        assert_eq!(
            content_type_for(Path::new("mystery.bin")),
            "application/octet-stream"
        );
    }

    #[test]
    fn only_text_assets_get_rewritten() {
        assert!(is_text_asset(Path::new("app.js")));
        assert!(is_text_asset(Path::new("nested/index.html")));
        assert!(!is_text_asset(Path::new("logo.png")));
    }

    #[test]
    fn placeholder_is_replaced_everywhere() {
        let source = "const API = 'REPLACE_WITH_API_ENDPOINT';\nfetch('REPLACE_WITH_API_ENDPOINT/items');";
        let rewritten = rewrite_placeholder(source, "https://abc.execute-api.us-east-1.amazonaws.com/prod");
        assert!(!rewritten.contains(API_PLACEHOLDER));
        assert_eq!(rewritten.matches("https://abc").count(), 2);
    }

    #[test]
    fn untouched_text_passes_through() {
        let source = "body { color: black; }";
        assert_eq!(rewrite_placeholder(source, "https://x"), source);
    }
}
