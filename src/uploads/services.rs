use std::collections::HashMap;

use anyhow::Context;
use axum::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use uuid::Uuid;

use crate::state::AppState;

/// Largest request body accepted by the upload routes.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct UploadItem {
    pub body: Bytes,
    pub content_type: String,
}

impl UploadItem {
    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// A multipart form: the `file` part plus every text field.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<UploadItem>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    /// A text field, `None` when missing or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

pub async fn read_form(mut mp: Multipart) -> Result<UploadForm, MultipartError> {
    let mut form = UploadForm::default();
    while let Some(field) = mp.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "file" {
            let content_type = field
                .content_type()
                .map(str::to_string)
                .unwrap_or_else(|| "application/octet-stream".into());
            let body = field.bytes().await?;
            form.file = Some(UploadItem { body, content_type });
        } else {
            form.fields.insert(name, field.text().await?);
        }
    }
    Ok(form)
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/heic" => Some("heic"),
        "image/gif" => Some("gif"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

pub fn object_key(prefix: &str, user_id: Uuid, content_type: &str) -> String {
    let ext = ext_from_mime(content_type).unwrap_or("bin");
    format!("{prefix}/{user_id}/{}.{ext}", Uuid::new_v4())
}

/// Stores `item` and returns the URL records should point at.
pub async fn store(
    st: &AppState,
    prefix: &str,
    user_id: Uuid,
    item: UploadItem,
) -> anyhow::Result<String> {
    anyhow::ensure!(!item.body.is_empty(), "empty upload");
    let key = object_key(prefix, user_id, &item.content_type);
    st.storage
        .put_object(&key, item.body, &item.content_type)
        .await
        .with_context(|| format!("put_object {key}"))?;
    st.storage
        .object_url(&key)
        .await
        .with_context(|| format!("object url for {key}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), Some("webp"));
        assert_eq!(ext_from_mime("image/heic"), Some("heic"));
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn keys_are_scoped_by_user() {
        let user = Uuid::new_v4();
        let key = object_key("uploads", user, "image/png");
        assert!(key.starts_with(&format!("uploads/{user}/")));
        assert!(key.ends_with(".png"));
        assert!(object_key("chat", user, "text/plain").ends_with(".bin"));
    }

    #[tokio::test]
    async fn store_returns_object_url() {
        let state = AppState::fake();
        let user = Uuid::new_v4();
        let url = store(
            &state,
            "uploads",
            user,
            UploadItem {
                body: Bytes::from_static(b"\x89PNG"),
                content_type: "image/png".into(),
            },
        )
        .await
        .unwrap();
        assert!(url.starts_with(&format!("https://fake.local/uploads/{user}/")));
    }

    #[tokio::test]
    async fn store_rejects_empty_body() {
        let state = AppState::fake();
        let item = UploadItem {
            body: Bytes::new(),
            content_type: "image/png".into(),
        };
        assert!(store(&state, "uploads", Uuid::new_v4(), item).await.is_err());
    }

    #[test]
    fn blank_text_fields_are_missing() {
        let mut form = UploadForm::default();
        form.fields.insert("caption".into(), "  ".into());
        form.fields.insert("date".into(), "2025-03-10".into());
        assert_eq!(form.text("caption"), None);
        assert_eq!(form.text("date"), Some("2025-03-10"));
        assert_eq!(form.text("other"), None);
    }
}
