use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::mail::feedback_message;
use crate::models::feedback::FeedbackRequest;
use crate::models::shared::MessageResponse;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/email/send-feedback/",
    tag = "Feedback",
    operation_id = "sendFeedback",
    summary = "Send a contact-form message to the support inbox",
    description = "Mails the submission to the configured feedback inbox with the subject \
        `{category} - {phone}`. Delivery happens before the response.",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback delivered", body = MessageResponse),
        (status = 400, description = "Blank field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 503, description = "Mail transport failed (SERVICE_UNAVAILABLE)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(category = %payload.category))]
pub async fn send_feedback(
    State(state): State<AppState>,
    AppJson(payload): AppJson<FeedbackRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let feedback = payload.validated()?;
    let (subject, body) = feedback_message(&feedback);

    state
        .mailer
        .send(&state.config.mail.feedback_recipient, &subject, &body)
        .await
        .map_err(|e| AppError::ServiceUnavailable(format!("Error sending feedback: {e}")))?;

    info!("Feedback forwarded");
    Ok(Json(MessageResponse::new("Feedback sent successfully")))
}
