//! Faculty resources: profile, password, meetings, courses, quizzes and videos.

use super::{
    Upstream, json_body,
    mapping::{CHANGE_PASSWORD, COURSE_VIDEO_UPLOAD, VIDEO_LECTURE_UPLOAD},
    multipart::{self, RelayPart},
};
use crate::api::{handlers::auth::types::ErrorResponse, state::AppState};
use axum::{
    Json,
    extract::{Extension, Multipart, Path, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::ToSchema;

/// Password change form as the portal submits it.
#[derive(ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePassword {
    pub current_password: String,
    pub new_password: String,
}

#[utoipa::path(
    put,
    path = "/api/faculty/change-password",
    request_body = ChangePassword,
    responses(
        (status = 200, description = "Password updated"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn change_password(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    let body = match json_body(payload) {
        Ok(body) => CHANGE_PASSWORD.apply_json(body),
        Err(response) => return response,
    };
    upstream
        .forward_json_with_message(
            Method::POST,
            CHANGE_PASSWORD.endpoint,
            &body,
            "Password updated successfully",
        )
        .await
}

#[utoipa::path(
    get,
    path = "/api/faculty/profile",
    responses(
        (status = 200, description = "Faculty profile of the signed-in user"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn get_profile(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, "/faculty/profile/me/", None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    put,
    path = "/api/faculty/profile",
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn update_profile(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    send_json(&state, &headers, payload, Method::PUT, "/faculty/profile/me/", None).await
}

#[utoipa::path(
    get,
    path = "/api/faculty/meetings",
    responses(
        (status = 200, description = "Meetings of the signed-in faculty member"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn list_meetings(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, "/faculty/meetings/", None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/faculty/meetings",
    responses(
        (status = 201, description = "Meeting scheduled"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn create_meeting(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    send_json(
        &state,
        &headers,
        payload,
        Method::POST,
        "/faculty/meetings/",
        Some(StatusCode::CREATED),
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/faculty/courses",
    responses(
        (status = 200, description = "Courses taught by the signed-in faculty member"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn list_courses(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, "/faculty/courses/", None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/faculty/courses",
    responses(
        (status = 201, description = "Course created"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn create_course(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    send_json(
        &state,
        &headers,
        payload,
        Method::POST,
        "/faculty/courses/",
        Some(StatusCode::CREATED),
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/faculty/courses/{courseId}/quizzes",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Quizzes of the course"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn list_course_quizzes(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => {
            let path = format!("/faculty/courses/{course_id}/quizzes/");
            upstream.forward(Method::GET, &path, None).await
        }
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/faculty/courses/{courseId}/quizzes",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 201, description = "Quiz created in the course"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn create_course_quiz(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(course_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let path = format!("/faculty/courses/{course_id}/quizzes/");
    send_json(
        &state,
        &headers,
        payload,
        Method::POST,
        &path,
        Some(StatusCode::CREATED),
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/faculty/courses/{courseId}/videos",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Video lectures of the course"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn list_course_videos(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => {
            let query: String = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("course_id", &course_id)
                .finish();
            let path = format!("{}?{query}", COURSE_VIDEO_UPLOAD.endpoint);
            upstream.forward(Method::GET, &path, None).await
        }
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/faculty/courses/{courseId}/videos",
    params(("courseId" = String, Path, description = "Course id")),
    responses(
        (status = 201, description = "Video uploaded to the course (multipart form, `file` field)"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn upload_course_video(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(course_id): Path<String>,
    form: Multipart,
) -> Response {
    send_form(&state, &headers, form, COURSE_VIDEO_UPLOAD.endpoint, |parts| {
        // The path decides the course, whatever the form says.
        let mut parts: Vec<RelayPart> = multipart::rename(parts, &COURSE_VIDEO_UPLOAD)
            .into_iter()
            .filter(|part| part.name != "course")
            .collect();
        parts.push(RelayPart::text("course", &course_id));
        parts
    })
    .await
}

#[utoipa::path(
    get,
    path = "/api/faculty/video-lectures",
    responses(
        (status = 200, description = "All video lectures of the signed-in faculty member"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn list_video_lectures(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => {
            upstream
                .forward(Method::GET, VIDEO_LECTURE_UPLOAD.endpoint, None)
                .await
        }
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/faculty/video-lectures",
    responses(
        (status = 201, description = "Video lecture uploaded (multipart form, `video` and `courseId` fields)"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn upload_video_lecture(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    form: Multipart,
) -> Response {
    send_form(&state, &headers, form, VIDEO_LECTURE_UPLOAD.endpoint, |parts| {
        multipart::rename(parts, &VIDEO_LECTURE_UPLOAD)
    })
    .await
}

#[utoipa::path(
    post,
    path = "/api/faculty/upload",
    responses(
        (status = 200, description = "Processing result for the uploaded document (multipart form)"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "faculty"
)]
pub async fn upload_for_processing(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    form: Multipart,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    let parts = match read_form(form).await {
        Ok(parts) => parts,
        Err(response) => return response,
    };
    upstream
        .forward_form(Method::POST, "/faculty/ai/process/", &parts, None)
        .await
}

async fn send_json(
    state: &AppState,
    headers: &HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
    method: Method,
    path: &str,
    success: Option<StatusCode>,
) -> Response {
    let upstream = match Upstream::authorize(state, headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    match json_body(payload) {
        Ok(body) => upstream.forward_json(method, path, &body, success).await,
        Err(response) => response,
    }
}

async fn send_form<F>(
    state: &AppState,
    headers: &HeaderMap,
    form: Multipart,
    endpoint: &str,
    remap: F,
) -> Response
where
    F: FnOnce(Vec<RelayPart>) -> Vec<RelayPart>,
{
    let upstream = match Upstream::authorize(state, headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    let parts = match read_form(form).await {
        Ok(parts) => remap(parts),
        Err(response) => return response,
    };
    upstream
        .forward_form(Method::POST, endpoint, &parts, Some(StatusCode::CREATED))
        .await
}

pub(super) async fn read_form(mut form: Multipart) -> Result<Vec<RelayPart>, Response> {
    multipart::collect(&mut form).await.map_err(|err| {
        (
            err.status(),
            Json(json!({ "error": err.body_text() })),
        )
            .into_response()
    })
}
