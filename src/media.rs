//! Media upload gateway and variant URL derivation.
//!
//! Uploads go to the hosted media service as a multipart form. Sized
//! variants are never uploaded: the host transforms on the fly when a
//! `f_auto,q_auto,w_<width>` segment follows `/upload/` in the path.

use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::{self, RawlineConfig};
use crate::error::{RawlineError, Result};

const UPLOAD_MARKER: &str = "/upload/";
const HOST_MARKER: &str = "cloudinary.com";

/// Upload a single file and get back its canonical URL.
pub trait MediaHost: Send {
    fn upload(&self, bytes: Vec<u8>, mime_type: &str, file_name: &str) -> Result<String>;
}

/// Unsigned-preset uploads to the hosted media service.
pub struct CloudinaryHost {
    client: Client,
    cloud: String,
    preset: String,
    folder: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
}

impl CloudinaryHost {
    pub fn new(config: &RawlineConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            cloud: config.cloudinary_cloud.clone(),
            preset: config.cloudinary_preset.clone(),
            folder: config.cloudinary_folder.clone(),
        })
    }

    fn endpoint(&self, mime_type: &str) -> String {
        let resource = if mime_type.starts_with("video/") {
            "video"
        } else {
            "image"
        };
        format!(
            "{}/{}/{}/upload",
            config::CLOUDINARY_BASE,
            self.cloud,
            resource
        )
    }

    fn try_upload(&self, bytes: Vec<u8>, mime_type: &str, file_name: &str) -> Result<String> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.preset.clone())
            .text("folder", self.folder.clone());

        let resp = self
            .client
            .post(self.endpoint(mime_type))
            .multipart(form)
            .send()?;
        if !resp.status().is_success() {
            return Err(RawlineError::Upload(format!(
                "media host returned {}",
                resp.status()
            )));
        }
        let body: UploadResponse = resp.json()?;
        body.secure_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| RawlineError::Upload("response carried no secure_url".into()))
    }
}

impl MediaHost for CloudinaryHost {
    fn upload(&self, bytes: Vec<u8>, mime_type: &str, file_name: &str) -> Result<String> {
        let size = bytes.len();
        match self.try_upload(bytes, mime_type, file_name) {
            Ok(url) => {
                info!("Uploaded {} ({} bytes) -> {}", file_name, size, url);
                Ok(url)
            }
            Err(e) => {
                warn!("Media upload of {} failed: {}", file_name, e);
                Err(match e {
                    RawlineError::Upload(_) => e,
                    other => RawlineError::Upload(other.to_string()),
                })
            }
        }
    }
}

/// Rewrite a hosted media URL to request a `width`-pixel, auto-format,
/// auto-quality variant.
///
/// URLs that are not on the media host, or lack the `/upload/` marker,
/// come back unchanged. An existing directive of the same shape is
/// replaced, so the function is idempotent.
pub fn derive_variant_url(url: &str, width: u32) -> String {
    if !url.contains(HOST_MARKER) {
        return url.to_string();
    }
    let Some((base, tail)) = url.split_once(UPLOAD_MARKER) else {
        return url.to_string();
    };

    let tail = match tail.split_once('/') {
        Some((segment, rest)) if is_variant_directive(segment) => rest,
        _ => tail,
    };
    format!("{}{}f_auto,q_auto,w_{}/{}", base, UPLOAD_MARKER, width, tail)
}

fn is_variant_directive(segment: &str) -> bool {
    segment
        .strip_prefix("f_auto,q_auto,w_")
        .is_some_and(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str =
        "https://res.cloudinary.com/demo/image/upload/v1712345/rawline/jacket.jpg";

    #[test]
    fn inserts_directive_after_upload_marker() {
        assert_eq!(
            derive_variant_url(CANONICAL, 800),
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto,w_800/v1712345/rawline/jacket.jpg"
        );
    }

    #[test]
    fn idempotent_for_same_width() {
        let once = derive_variant_url(CANONICAL, 1200);
        assert_eq!(derive_variant_url(&once, 1200), once);
    }

    #[test]
    fn width_change_replaces_directive() {
        let small = derive_variant_url(CANONICAL, 400);
        assert_eq!(
            derive_variant_url(&small, 1600),
            derive_variant_url(CANONICAL, 1600)
        );
    }

    #[test]
    fn foreign_urls_untouched() {
        let url = "https://images.unsplash.com/photo-1520975916090-3105956dac38";
        assert_eq!(derive_variant_url(url, 800), url);
        let no_marker = "https://res.cloudinary.com/demo/image/fetch/x.jpg";
        assert_eq!(derive_variant_url(no_marker, 800), no_marker);
    }

    #[test]
    fn video_uploads_use_video_endpoint() {
        let host = CloudinaryHost::new(&RawlineConfig::new("p", "k", "demo"), None).unwrap();
        assert_eq!(
            host.endpoint("video/mp4"),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
        assert_eq!(
            host.endpoint("image/jpeg"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
