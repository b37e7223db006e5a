//! Handler for lead form submissions.

use serde_json::Value;

use super::handler::AppState;
use super::helpers::json_response;
use super::parsing::Request;
use crate::errors::RelayError;
use crate::leads::{LeadSubmission, submit_lead};

/// `POST /api/leads`
///
/// # Errors
///
/// 400-class errors for a malformed or incomplete body, upstream errors of
/// the client creation call.
pub async fn handle_lead(state: &AppState, request: &Request) -> Result<Value, RelayError> {
    let body = request.json_body()?;
    let mut lead: LeadSubmission = serde_json::from_value(body)
        .map_err(|e| RelayError::InvalidInput(format!("invalid lead payload: {e}")))?;
    if lead.lang.is_none() {
        lead.lang = request.param("lang").map(str::to_string);
    }

    let receipt = submit_lead(state.crm.as_ref(), &state.config, &lead).await?;
    Ok(json_response(201, &receipt))
}
