//! Contact form submissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{is_valid_phone, non_blank, sanitize_text};
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub subject: Option<String>,
    pub message: Option<String>,
}

impl ContactSubmission {
    pub fn submit(request: &ContactRequest) -> Result<Self> {
        request.validate()?;
        let name = non_blank(request.name.as_deref()).ok_or(CommerceError::MissingField("name"))?;
        let email = non_blank(request.email.as_deref())
            .ok_or(CommerceError::MissingField("email"))?;
        let message = non_blank(request.message.as_deref())
            .ok_or(CommerceError::MissingField("message"))?;
        if !validator::validate_email(email) {
            return Err(CommerceError::InvalidEmail);
        }
        let phone = non_blank(request.phone.as_deref());
        if phone.is_some_and(|p| !is_valid_phone(p)) {
            return Err(CommerceError::InvalidPhone);
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            name: sanitize_text(name),
            email: email.to_lowercase(),
            phone: phone.map(sanitize_text),
            subject: non_blank(request.subject.as_deref()).map(sanitize_text),
            message: sanitize_text(message),
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: Some("Tahmid".into()),
            email: Some(" Tahmid@Example.COM ".into()),
            phone: None,
            subject: Some("Order".into()),
            message: Some("Where is my <parcel>?".into()),
        }
    }

    #[test]
    fn test_contact_normalizes_fields() {
        let submission = ContactSubmission::submit(&request()).unwrap();
        assert_eq!(submission.email, "tahmid@example.com");
        assert_eq!(submission.message, "Where is my &lt;parcel&gt;?");
    }

    #[test]
    fn test_contact_rejects_bad_email_and_phone() {
        let req = ContactRequest {
            email: Some("not-an-email".into()),
            ..request()
        };
        let err = ContactSubmission::submit(&req).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidEmail));

        let req = ContactRequest {
            phone: Some("12-34".into()),
            ..request()
        };
        let err = ContactSubmission::submit(&req).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidPhone));
    }

    #[test]
    fn test_contact_requires_message() {
        let req = ContactRequest {
            message: None,
            ..request()
        };
        let err = ContactSubmission::submit(&req).unwrap_err();
        assert!(matches!(err, CommerceError::MissingField("message")));
    }
}
