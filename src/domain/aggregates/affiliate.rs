//! Affiliate applications submitted from the public site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::{non_blank, sanitize_text};
use crate::{CommerceError, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AffiliateStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl AffiliateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl FromStr for AffiliateStatus {
    type Err = CommerceError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            _ => Err(CommerceError::InvalidAffiliateStatus(s.to_string())),
        }
    }
}

impl fmt::Display for AffiliateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateSubmission {
    pub id: Uuid,
    pub name: String,
    pub about: String,
    pub phone: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,
    pub youtube: Option<String>,
    pub linkedin: Option<String>,
    pub other_social: Option<String>,
    pub status: AffiliateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateRequest {
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub about: Option<String>,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(length(max = 255))]
    pub instagram: Option<String>,
    #[validate(length(max = 255))]
    pub facebook: Option<String>,
    #[validate(length(max = 255))]
    pub youtube: Option<String>,
    #[validate(length(max = 255))]
    pub linkedin: Option<String>,
    #[validate(length(max = 255))]
    pub other_social: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateStatusRequest {
    pub status: String,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

/// Sanitized copy of an optional field; blank becomes `None`.
fn clean(value: Option<&str>) -> Option<String> {
    non_blank(value).map(sanitize_text)
}

impl AffiliateSubmission {
    pub fn submit(request: &AffiliateRequest) -> Result<Self> {
        request.validate()?;
        let name = clean(request.name.as_deref()).ok_or(CommerceError::MissingField("name"))?;
        let about = clean(request.about.as_deref()).ok_or(CommerceError::MissingField("about"))?;
        let socials = [
            &request.instagram,
            &request.facebook,
            &request.youtube,
            &request.linkedin,
            &request.other_social,
        ];
        if socials.iter().all(|s| non_blank(s.as_deref()).is_none()) {
            return Err(CommerceError::NoSocialMediaProvided);
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            name,
            about,
            phone: clean(request.phone.as_deref()),
            instagram: clean(request.instagram.as_deref()),
            facebook: clean(request.facebook.as_deref()),
            youtube: clean(request.youtube.as_deref()),
            linkedin: clean(request.linkedin.as_deref()),
            other_social: clean(request.other_social.as_deref()),
            status: AffiliateStatus::Pending,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn review(&mut self, request: &AffiliateStatusRequest) -> Result<()> {
        request.validate()?;
        self.status = request.status.parse()?;
        self.admin_notes = clean(request.notes.as_deref());
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AffiliateRequest {
        AffiliateRequest {
            name: Some("Rafi <Scents>".into()),
            about: Some("Fragrance reviews".into()),
            instagram: Some("@rafi".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_submit_sanitizes_and_starts_pending() {
        let submission = AffiliateSubmission::submit(&request()).unwrap();
        assert_eq!(submission.name, "Rafi &lt;Scents&gt;");
        assert_eq!(submission.status, AffiliateStatus::Pending);
        assert_eq!(submission.facebook, None);
    }

    #[test]
    fn test_submit_needs_a_social_handle() {
        let req = AffiliateRequest {
            instagram: Some("   ".into()),
            ..request()
        };
        let err = AffiliateSubmission::submit(&req).unwrap_err();
        assert!(matches!(err, CommerceError::NoSocialMediaProvided));
    }

    #[test]
    fn test_review_parses_status() {
        let mut submission = AffiliateSubmission::submit(&request()).unwrap();
        let review = AffiliateStatusRequest {
            status: "approved".into(),
            notes: Some(" welcome ".into()),
        };
        submission.review(&review).unwrap();
        assert_eq!(submission.status, AffiliateStatus::Approved);
        assert_eq!(submission.admin_notes.as_deref(), Some("welcome"));

        let bad = AffiliateStatusRequest {
            status: "MAYBE".into(),
            notes: None,
        };
        let err = submission.review(&bad).unwrap_err();
        assert!(matches!(err, CommerceError::InvalidAffiliateStatus(s) if s == "MAYBE"));
    }
}
