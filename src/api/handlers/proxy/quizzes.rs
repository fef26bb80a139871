//! Quiz endpoints. Creation translates the portal's quiz builder payload.

use super::{Upstream, json_body};
use crate::api::{handlers::auth::types::ErrorResponse, state::AppState};
use axum::{
    Json,
    extract::{Extension, Path, rejection::JsonRejection},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use utoipa::ToSchema;

const QUIZZES: &str = "/quizzes/";

/// Quiz as the portal's builder submits it.
#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuizDraft {
    pub title: Option<String>,
    #[schema(value_type = Object)]
    pub course_id: Option<Value>,
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub time_limit: Option<Value>,
    #[schema(value_type = Object)]
    pub maximum_attempts: Option<Value>,
    pub shuffle_questions: Option<bool>,
    /// `active` publishes the quiz.
    pub status: Option<String>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(ToSchema, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[schema(value_type = Object)]
    pub marks: Option<Value>,
    #[serde(default)]
    pub choices: Vec<String>,
    pub correct_answer: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct BackendQuiz {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shuffle_questions: Option<bool>,
    pub is_published: bool,
    pub questions: Vec<BackendQuestion>,
}

#[derive(Serialize, Debug)]
pub struct BackendQuestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<Value>,
    pub choices: Vec<BackendChoice>,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct BackendChoice {
    pub choice_text: String,
    pub is_correct: bool,
}

impl From<QuizDraft> for BackendQuiz {
    fn from(draft: QuizDraft) -> Self {
        Self {
            title: draft.title,
            course: draft.course_id,
            description: draft.description,
            time_limit: draft.time_limit,
            max_attempts: draft.maximum_attempts,
            shuffle_questions: draft.shuffle_questions,
            is_published: draft.status.as_deref() == Some("active"),
            questions: draft.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<QuestionDraft> for BackendQuestion {
    fn from(question: QuestionDraft) -> Self {
        let correct = question.correct_answer;
        let choices = question
            .choices
            .into_iter()
            .map(|choice_text| BackendChoice {
                is_correct: correct.as_deref() == Some(choice_text.as_str()),
                choice_text,
            })
            .collect();
        Self {
            question_text: question.text,
            question_type: question.kind,
            marks: question.marks,
            choices,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/quizzes",
    responses(
        (status = 200, description = "Quizzes visible to the signed-in user"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "quizzes"
)]
pub async fn list_quizzes(headers: HeaderMap, state: Extension<Arc<AppState>>) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, QUIZZES, None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/quizzes",
    request_body = QuizDraft,
    responses(
        (status = 201, description = "Quiz created"),
        (status = 400, description = "Malformed quiz", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "quizzes"
)]
pub async fn create_quiz(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Result<Json<QuizDraft>, JsonRejection>,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    let draft = match payload {
        Ok(Json(draft)) => draft,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": rejection.body_text() })),
            )
                .into_response();
        }
    };
    let quiz = BackendQuiz::from(draft);
    upstream.forward_json(Method::POST, QUIZZES, &quiz, None).await
}

#[utoipa::path(
    get,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz id")),
    responses(
        (status = 200, description = "Quiz"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "quizzes"
)]
pub async fn get_quiz(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream.forward(Method::GET, &quiz_path(&id), None).await,
        Err(response) => response,
    }
}

#[utoipa::path(
    put,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz id")),
    responses(
        (status = 200, description = "Quiz updated"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "quizzes"
)]
pub async fn update_quiz(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let upstream = match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => upstream,
        Err(response) => return response,
    };
    match json_body(payload) {
        Ok(body) => {
            upstream
                .forward_json(Method::PUT, &quiz_path(&id), &body, None)
                .await
        }
        Err(response) => response,
    }
}

#[utoipa::path(
    delete,
    path = "/api/quizzes/{id}",
    params(("id" = String, Path, description = "Quiz id")),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 401, description = "No valid session", body = ErrorResponse)
    ),
    tag = "quizzes"
)]
pub async fn delete_quiz(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match Upstream::authorize(&state, &headers).await {
        Ok(upstream) => {
            upstream
                .forward(Method::DELETE, &quiz_path(&id), Some(StatusCode::NO_CONTENT))
                .await
        }
        Err(response) => response,
    }
}

fn quiz_path(id: &str) -> String {
    format!("{QUIZZES}{id}/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn quiz_draft_is_translated() -> Result<()> {
        let draft: QuizDraft = serde_json::from_value(json!({
            "title": "Midterm",
            "courseId": 4,
            "description": "Chapters 1-3",
            "timeLimit": 30,
            "maximumAttempts": 2,
            "shuffleQuestions": true,
            "status": "active",
            "questions": [{
                "text": "2 + 2?",
                "type": "multiple_choice",
                "marks": 5,
                "choices": ["3", "4"],
                "correctAnswer": "4"
            }]
        }))?;

        let quiz = serde_json::to_value(BackendQuiz::from(draft))?;
        assert_eq!(
            quiz,
            json!({
                "title": "Midterm",
                "course": 4,
                "description": "Chapters 1-3",
                "time_limit": 30,
                "max_attempts": 2,
                "shuffle_questions": true,
                "is_published": true,
                "questions": [{
                    "question_text": "2 + 2?",
                    "question_type": "multiple_choice",
                    "marks": 5,
                    "choices": [
                        { "choice_text": "3", "is_correct": false },
                        { "choice_text": "4", "is_correct": true }
                    ]
                }]
            })
        );
        Ok(())
    }

    #[test]
    fn draft_quiz_is_unpublished() -> Result<()> {
        let draft: QuizDraft = serde_json::from_value(json!({
            "title": "Quiz",
            "status": "draft"
        }))?;
        let quiz = BackendQuiz::from(draft);
        assert!(!quiz.is_published);
        assert!(quiz.questions.is_empty());
        Ok(())
    }

    #[test]
    fn quiz_path_has_trailing_slash() {
        assert_eq!(quiz_path("12"), "/quizzes/12/");
    }
}
