//! Contact form route handlers.
//!
//! Messages are stored for the admin inbox.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use folio_core::Email;

use crate::db::MessageRepository;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::NewMessage;
use crate::state::AppState;

const MAX_NAME_LEN: usize = 100;
const MAX_SUBJECT_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

/// Contact form data.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Contact page template.
#[derive(Template, WebTemplate)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub form: ContactForm,
    pub errors: Vec<String>,
    pub sent: bool,
}

fn check_length(errors: &mut Vec<String>, label: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.push(format!("{label} is required"));
    } else if value.chars().count() > max {
        errors.push(format!("{label} must be at most {max} characters"));
    }
}

/// Check a submitted contact form.
///
/// # Errors
///
/// Returns every problem found, in form order.
pub fn validate_message(form: &ContactForm) -> std::result::Result<NewMessage, Vec<String>> {
    let mut errors = Vec::new();

    let name = form.name.trim();
    check_length(&mut errors, "Name", name, MAX_NAME_LEN);

    let email = Email::parse(&form.email);
    if let Err(e) = &email {
        errors.push(format!("Invalid email: {e}"));
    }

    let subject = form.subject.trim();
    check_length(&mut errors, "Subject", subject, MAX_SUBJECT_LEN);

    let message = form.message.trim();
    check_length(&mut errors, "Message", message, MAX_MESSAGE_LEN);

    match email {
        Ok(email) if errors.is_empty() => Ok(NewMessage {
            name: name.to_string(),
            email,
            subject: subject.to_string(),
            message: message.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Display the contact page.
pub async fn page() -> ContactTemplate {
    ContactTemplate {
        form: ContactForm::default(),
        errors: Vec::new(),
        sent: false,
    }
}

/// Store a contact message.
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<Response> {
    let message = match validate_message(&form) {
        Ok(message) => message,
        Err(errors) => {
            return Ok((
                StatusCode::BAD_REQUEST,
                ContactTemplate {
                    form,
                    errors,
                    sent: false,
                },
            )
                .into_response());
        }
    };

    let stored = MessageRepository::new(state.pool()).create(&message).await?;
    tracing::info!(message_id = %stored.id, "Contact message received");
    add_breadcrumb("contact", "Sent contact message", None);

    Ok(ContactTemplate {
        form: ContactForm::default(),
        errors: Vec::new(),
        sent: true,
    }
    .into_response())
}
