use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::extract::ClientKey;
use crate::contact::ContactRequest;
use crate::error::{ApiError, ErrorCode};
use crate::metrics::{ContactOutcome, METRICS};
use crate::rate_limit::RateDecision;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ContactAccepted {
    pub success: bool,
    pub id: Uuid,
    pub message: &'static str,
}

/// `POST /api/contact`
///
/// The body is parsed after the rate limit check so malformed requests use up
/// the client's budget too.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    ClientKey(client): ClientKey,
    body: Bytes,
) -> Result<Json<ContactAccepted>, ApiError> {
    if let RateDecision::Limited { retry_after } = state.rate_limiter().check(&client) {
        METRICS.record_contact_submission(ContactOutcome::RateLimited);
        tracing::info!(client = %client, retry_after_secs = retry_after.as_secs(), "contact rate limit hit");
        // Round up so clients never retry inside the window.
        let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
        return Err(ApiError::builder(ErrorCode::RateLimited)
            .message("too many contact requests, please try again later")
            .retry_after(seconds.max(1))
            .build());
    }

    let request: ContactRequest = serde_json::from_slice(&body).map_err(|error| {
        METRICS.record_contact_submission(ContactOutcome::Invalid);
        ApiError::builder(ErrorCode::InvalidRequest)
            .message(format!("invalid JSON body: {error}"))
            .build()
    })?;

    let submission = request.validate().inspect_err(|_| {
        METRICS.record_contact_submission(ContactOutcome::Invalid);
    })?;

    let email = state
        .notifications()
        .contact_notification(&submission)
        .inspect_err(|_| METRICS.record_contact_submission(ContactOutcome::MailFailed))?;

    if let Err(error) = state.mailer().send(&email).await {
        METRICS.record_contact_submission(ContactOutcome::MailFailed);
        tracing::error!(
            contact.id = %submission.id,
            mailer = state.mailer().name(),
            %error,
            "failed to deliver contact notification"
        );
        return Err(error.into());
    }

    METRICS.record_contact_submission(ContactOutcome::Sent);
    tracing::info!(
        contact.id = %submission.id,
        contact.product = submission.product.as_deref().unwrap_or("-"),
        mailer = state.mailer().name(),
        "contact submission accepted"
    );

    Ok(Json(ContactAccepted {
        success: true,
        id: submission.id,
        message: "Thank you for your enquiry. Our team will contact you shortly.",
    }))
}
