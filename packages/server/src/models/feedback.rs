use serde::Deserialize;

use crate::error::AppError;
use crate::mail::Feedback;

/// Contact-form submission.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct FeedbackRequest {
    #[schema(example = "Alice")]
    pub name: String,
    #[schema(example = "+77001234567")]
    pub phone: String,
    #[schema(example = "alice@example.com")]
    pub user_email: String,
    #[schema(example = "The dice roll twice sometimes.")]
    pub message: String,
    #[schema(example = "Bug")]
    pub category: String,
}

impl FeedbackRequest {
    /// Trimmed view of the request; every field must be non-blank.
    pub fn validated(&self) -> Result<Feedback<'_>, AppError> {
        let feedback = Feedback {
            name: self.name.trim(),
            phone: self.phone.trim(),
            user_email: self.user_email.trim(),
            message: self.message.trim(),
            category: self.category.trim(),
        };
        let missing: Vec<&str> = [
            ("name", feedback.name),
            ("phone", feedback.phone),
            ("user_email", feedback.user_email),
            ("message", feedback.message),
            ("category", feedback.category),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| field)
        .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(feedback)
    }
}
