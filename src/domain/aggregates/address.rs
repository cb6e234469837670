//! Address book entry. Each user keeps at most one live address.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::value_objects::non_blank;
use crate::{CommerceError, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for both create and partial update.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(max = 255, message = "full name is too long"))]
    pub full_name: Option<String>,
    #[validate(length(max = 50, message = "phone number is too long"))]
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_default: Option<bool>,
}

fn required(value: Option<&str>, field: &'static str) -> Result<String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or(CommerceError::MissingField(field))
}

impl Address {
    pub fn create(user_id: Uuid, request: &AddressRequest) -> Result<Self> {
        request.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::now_v7(),
            user_id,
            full_name: required(request.full_name.as_deref(), "full name")?,
            phone_number: required(request.phone_number.as_deref(), "phone number")?,
            address: required(request.address.as_deref(), "address")?,
            is_default: request.is_default.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    /// Blank or absent fields keep their value.
    pub fn apply(&mut self, patch: &AddressRequest) -> Result<()> {
        patch.validate()?;
        if let Some(name) = non_blank(patch.full_name.as_deref()) {
            self.full_name = name.to_string();
        }
        if let Some(phone) = non_blank(patch.phone_number.as_deref()) {
            self.phone_number = phone.to_string();
        }
        if let Some(address) = non_blank(patch.address.as_deref()) {
            self.address = address.to_string();
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AddressRequest {
        AddressRequest {
            full_name: Some(" Nadia Rahman ".into()),
            phone_number: Some("01711000000".into()),
            address: Some("House 7, Road 3".into()),
            is_default: None,
        }
    }

    #[test]
    fn test_address_create_trims() {
        let address = Address::create(Uuid::now_v7(), &request()).unwrap();
        assert_eq!(address.full_name, "Nadia Rahman");
        assert!(!address.is_default);
    }

    #[test]
    fn test_address_requires_fields() {
        let req = AddressRequest {
            address: Some("  ".into()),
            ..request()
        };
        let err = Address::create(Uuid::now_v7(), &req).unwrap_err();
        assert!(matches!(err, CommerceError::MissingField("address")));
    }

    #[test]
    fn test_address_patch_skips_blank_fields() {
        let mut address = Address::create(Uuid::now_v7(), &request()).unwrap();
        address
            .apply(&AddressRequest {
                full_name: Some("".into()),
                address: Some("Flat 2B, Banani".into()),
                is_default: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(address.full_name, "Nadia Rahman");
        assert_eq!(address.address, "Flat 2B, Banani");
        assert!(address.is_default);
    }
}
