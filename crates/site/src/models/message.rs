//! Contact message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::{Email, MessageId};

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// A validated contact form submission.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub name: String,
    pub email: Email,
    pub subject: String,
    pub message: String,
}
