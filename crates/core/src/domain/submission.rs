use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::draft::QuoteDraft;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

/// Payload handed to the submission sink once the contact stage passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSubmission {
    pub submission_id: SubmissionId,
    pub session_id: SessionId,
    pub draft: QuoteDraft,
    pub estimated_price: Decimal,
    pub submitted_at: DateTime<Utc>,
}

impl QuoteSubmission {
    pub fn new(session_id: SessionId, draft: QuoteDraft, estimated_price: Decimal) -> Self {
        Self {
            submission_id: SubmissionId(Uuid::new_v4().to_string()),
            session_id,
            draft,
            estimated_price,
            submitted_at: Utc::now(),
        }
    }
}
