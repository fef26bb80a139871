use super::handlers::{
    auth::{login, oauth, register, session},
    config, health,
    proxy::{chat, faculty, quizzes, student},
};
use axum::extract::DefaultBodyLimit;
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

/// Body limit used when only the document is needed.
const DOCUMENT_UPLOAD_LIMIT: usize = 500 * 1024 * 1024;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    let (_router, openapi) = api_router(DOCUMENT_UPLOAD_LIMIT).split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Multipart upload routes get their own body limit; everything else keeps
/// axum's default. Routes added in `api::app` (pages, `/auth/logout`) are not
/// documented.
pub(crate) fn api_router(max_upload_bytes: usize) -> OpenApiRouter {
    let uploads = OpenApiRouter::new()
        .routes(routes!(faculty::upload_video_lecture))
        .routes(routes!(faculty::upload_course_video))
        .routes(routes!(faculty::upload_for_processing))
        .routes(routes!(student::upload_note))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let mut router = OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(config::config))
        .routes(routes!(login::login))
        .routes(routes!(register::register))
        .routes(routes!(session::session))
        .routes(routes!(session::logout))
        .routes(routes!(oauth::signin))
        .routes(routes!(oauth::callback))
        .routes(routes!(faculty::change_password))
        .routes(routes!(faculty::get_profile, faculty::update_profile))
        .routes(routes!(faculty::list_meetings, faculty::create_meeting))
        .routes(routes!(faculty::list_courses, faculty::create_course))
        .routes(routes!(
            faculty::list_course_quizzes,
            faculty::create_course_quiz
        ))
        .routes(routes!(faculty::list_course_videos))
        .routes(routes!(faculty::list_video_lectures))
        .routes(routes!(student::list_notes))
        .routes(routes!(quizzes::list_quizzes, quizzes::create_quiz))
        .routes(routes!(
            quizzes::get_quiz,
            quizzes::update_quiz,
            quizzes::delete_quiz
        ))
        .routes(routes!(chat::chat))
        .merge(uploads);

    let tags = [
        ("auth", "Sign-in, registration and the session cookie"),
        ("faculty", "Faculty profile, courses, meetings and lecture uploads"),
        ("student", "Student notes"),
        ("quizzes", "Quiz authoring"),
        ("chat", "Campus assistant"),
        ("config", "Public runtime configuration"),
        ("health", "Gateway and backend health"),
    ]
    .into_iter()
    .map(|(name, description)| {
        let mut tag = Tag::new(name);
        tag.description = Some(description.to_string());
        tag
    })
    .collect();

    router.get_openapi_mut().tags = Some(tags);

    router
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).build()
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    match author.split_once('<') {
        Some((name, email)) => {
            let name = name.trim();
            let email = email.trim_end_matches('>').trim();
            (
                (!name.is_empty()).then_some(name),
                (!email.is_empty()).then_some(email),
            )
        }
        None => {
            let name = author.trim();
            ((!name.is_empty()).then_some(name), None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Campus Genius Team"));
            assert_eq!(contact.email.as_deref(), Some("team@campusgenius.dev"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        for name in ["auth", "faculty", "student", "quizzes", "chat", "health"] {
            assert!(tags.iter().any(|tag| tag.name == name), "missing tag {name}");
        }
        for path in [
            "/api/auth/login",
            "/api/auth/session",
            "/api/faculty/change-password",
            "/api/faculty/video-lectures",
            "/api/quizzes/{id}",
            "/api/notes",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn author_without_email() {
        assert_eq!(parse_author("Campus Genius"), (Some("Campus Genius"), None));
        assert_eq!(
            parse_author("A <a@b.c>"),
            (Some("A"), Some("a@b.c"))
        );
    }
}
