//! Zoho CRM task creation

use axum::{Json, Router, extract::State, routing::post};
use calsync_core::CalSyncError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::convert::ToZoho;
use crate::routes::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/crm/tasks", post(create_task))
}

/// Request body for creating a task
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub subject: String,
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    /// Zoho contact the task is about (`Who_Id`).
    pub contact_id: Option<String>,
    /// Zoho deal the task belongs to (`What_Id`).
    pub deal_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecord {
    pub id: String,
}

/// POST /crm/tasks - Create a task in Zoho CRM
async fn create_task(
    State(state): State<AppState>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<Json<CreatedRecord>, AppError> {
    if req.subject.trim().is_empty() {
        return Err(CalSyncError::InvalidInput("subject must not be empty".into()).into());
    }

    let id = state.zoho.create_task(&req.to_zoho()).await?;
    Ok(Json(CreatedRecord { id }))
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use mockito::Matcher;

    use crate::routes::test_support::{call, test_app};

    #[tokio::test]
    async fn task_is_created_with_defaults() {
        let mut server = mockito::Server::new_async().await;
        let (app, _tokens) = test_app(&mut server).await;

        let insert = server
            .mock("POST", "/crm/v2/Tasks")
            .match_body(Matcher::Json(serde_json::json!({
                "data": [{
                    "Subject": "Send contract",
                    "Due_Date": "2025-04-01",
                    "Status": "Not Started",
                    "Priority": "Normal",
                    "What_Id": {"id": "4150868000000231001"},
                    "$se_module": "Deals"
                }]
            })))
            .with_status(201)
            .with_body(
                r#"{"data":[{"code":"SUCCESS","status":"success",
                    "details":{"id":"4150868000000240001"}}]}"#,
            )
            .create_async()
            .await;

        let (status, body) = call(
            app,
            Method::POST,
            "/crm/tasks",
            Some(serde_json::json!({
                "subject": "Send contract",
                "due_date": "2025-04-01",
                "deal_id": "4150868000000231001"
            })),
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(body, serde_json::json!({"id": "4150868000000240001"}));
        insert.assert_async().await;
    }

    #[tokio::test]
    async fn blank_subject_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let (app, _tokens) = test_app(&mut server).await;

        let blank = serde_json::json!({"subject": " "});
        let (status, body) = call(app, Method::POST, "/crm/tasks", Some(blank)).await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "Invalid input: subject must not be empty");
    }
}
