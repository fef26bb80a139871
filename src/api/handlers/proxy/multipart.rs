//! Multipart relay: read the client's form part by part and rebuild it for reqwest.

use super::mapping::FieldMap;
use axum::extract::{Multipart, multipart::MultipartError};
use bytes::Bytes;
use reqwest::multipart::{Form, Part};

/// One form part, held in memory until it is forwarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl RelayPart {
    #[must_use]
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            data: Bytes::copy_from_slice(value.as_bytes()),
        }
    }
}

/// Drain every part of the client's form, in order.
///
/// # Errors
/// Returns the multipart error if the body is not a readable form.
pub async fn collect(multipart: &mut Multipart) -> Result<Vec<RelayPart>, MultipartError> {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(ToString::to_string);
        let content_type = field.content_type().map(ToString::to_string);
        let data = field.bytes().await?;
        parts.push(RelayPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(parts)
}

/// Apply a field table; dropped fields disappear, order is kept.
#[must_use]
pub fn rename(parts: Vec<RelayPart>, map: &FieldMap) -> Vec<RelayPart> {
    parts
        .into_iter()
        .filter_map(|mut part| {
            let name = map.translate(&part.name)?.to_string();
            part.name = name;
            Some(part)
        })
        .collect()
}

/// Build a fresh reqwest form. Called once per attempt since a sent form is consumed.
#[must_use]
pub fn build_form(parts: &[RelayPart]) -> Form {
    parts.iter().fold(Form::new(), |form, part| {
        form.part(part.name.clone(), to_part(part))
    })
}

fn to_part(part: &RelayPart) -> Part {
    let bare = || {
        let built = Part::bytes(part.data.to_vec());
        match &part.file_name {
            Some(file_name) => built.file_name(file_name.clone()),
            None => built,
        }
    };
    match &part.content_type {
        // An unparsable content type is dropped rather than failing the upload.
        Some(content_type) => bare().mime_str(content_type).unwrap_or_else(|_| bare()),
        None => bare(),
    }
}
