//! Per-endpoint field name tables between the portal and the backend.

use serde_json::{Map, Value};

/// How one endpoint's client field names map onto the backend's.
#[derive(Clone, Copy, Debug)]
pub struct FieldMap {
    /// Backend path, relative to the API base.
    pub endpoint: &'static str,
    /// `(client, backend)` pairs.
    pub renames: &'static [(&'static str, &'static str)],
    /// Whether fields without an entry are forwarded under their own name.
    pub keep_unmapped: bool,
}

pub const CHANGE_PASSWORD: FieldMap = FieldMap {
    endpoint: "/auth/password/change/",
    renames: &[
        ("currentPassword", "old_password"),
        ("newPassword", "new_password1"),
    ],
    keep_unmapped: false,
};

pub const VIDEO_LECTURE_UPLOAD: FieldMap = FieldMap {
    endpoint: "/faculty/videos/",
    renames: &[("video", "video_file"), ("courseId", "course")],
    keep_unmapped: true,
};

pub const COURSE_VIDEO_UPLOAD: FieldMap = FieldMap {
    endpoint: "/faculty/videos/",
    renames: &[("file", "video_file"), ("courseId", "course")],
    keep_unmapped: true,
};

pub const CHAT: FieldMap = FieldMap {
    endpoint: "/chat/",
    renames: &[("message", "message")],
    keep_unmapped: false,
};

impl FieldMap {
    /// Backend name for a client field, `None` if the field is dropped.
    #[must_use]
    pub fn translate<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.renames
            .iter()
            .find(|(client, _)| *client == name)
            .map(|(_, backend)| *backend)
            .or(self.keep_unmapped.then_some(name))
    }

    /// Rename the top-level keys of a JSON object; anything else becomes `{}`.
    #[must_use]
    pub fn apply_json(&self, body: Value) -> Value {
        let Value::Object(fields) = body else {
            return Value::Object(Map::new());
        };
        let renamed = fields
            .into_iter()
            .filter_map(|(key, value)| {
                self.translate(&key)
                    .map(|backend| (backend.to_string(), value))
            })
            .collect::<Map<_, _>>();
        Value::Object(renamed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn change_password_fields_are_renamed() {
        let body = json!({ "currentPassword": "a", "newPassword": "b" });
        assert_eq!(
            CHANGE_PASSWORD.apply_json(body),
            json!({ "old_password": "a", "new_password1": "b" })
        );
    }

    #[test]
    fn unmapped_fields_are_dropped_unless_kept() {
        let body = json!({ "message": "hi", "history": [1, 2] });
        assert_eq!(CHAT.apply_json(body), json!({ "message": "hi" }));

        assert_eq!(VIDEO_LECTURE_UPLOAD.translate("title"), Some("title"));
        assert_eq!(CHANGE_PASSWORD.translate("confirmPassword"), None);
    }

    #[test]
    fn upload_tables_rename_file_fields() {
        assert_eq!(VIDEO_LECTURE_UPLOAD.translate("video"), Some("video_file"));
        assert_eq!(COURSE_VIDEO_UPLOAD.translate("file"), Some("video_file"));
        assert_eq!(COURSE_VIDEO_UPLOAD.translate("courseId"), Some("course"));
    }

    #[test]
    fn non_object_bodies_become_empty() {
        assert_eq!(CHANGE_PASSWORD.apply_json(json!([1])), json!({}));
    }
}
