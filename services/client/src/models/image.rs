//! Image uploads

use std::path::Path;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};
use crate::transport::FormPart;

/// Image identifier
pub type ImageId = i64;

/// Result of `POST /images`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    #[serde(alias = "image_id")]
    pub image_id: ImageId,
    #[serde(default, alias = "image_url")]
    pub image_url: Option<String>,
}

/// An image file ready to be sent as a multipart part
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

impl std::fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Content type for an accepted image extension
fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

impl ImageFile {
    /// Wrap in-memory bytes; the content type follows the file extension
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> ClientResult<Self> {
        let file_name = file_name.into();
        let content_type =
            content_type_for(&file_name).ok_or_else(|| ClientError::UnsupportedImage(file_name.clone()))?;
        Ok(Self {
            file_name,
            content_type,
            bytes: bytes.into(),
        })
    }

    /// Read an image from disk
    pub async fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ClientError::UnsupportedImage(path.display().to_string()))?
            .to_string();
        if content_type_for(&file_name).is_none() {
            return Err(ClientError::UnsupportedImage(file_name));
        }

        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(file_name, bytes)
    }

    /// Multipart part under the given field name
    pub fn to_part(&self, name: &str) -> FormPart {
        FormPart::File {
            name: name.to_string(),
            file_name: self.file_name.clone(),
            content_type: self.content_type.to_string(),
            bytes: self.bytes.clone(),
        }
    }
}
