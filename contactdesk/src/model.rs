//! Records held in the `users` and `contacts` collections.
//!
//! Records deserialize from BSON with a native `ObjectId` under `_id` and
//! serialize to JSON with that id rendered as a 24-character hex string.

use std::fmt;

use bson::oid::ObjectId;
use bson::serde_helpers::serialize_object_id_as_hex_string;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a contact submission. New submissions always start `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    Pending,
    Completed,
}

impl ContactStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContactStatus::Pending => "Pending",
            ContactStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account. `password` always holds a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// A contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "_id", serialize_with = "serialize_object_id_as_hex_string")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
    #[serde(default)]
    pub status: ContactStatus,
}

/// Writable user fields. The password must already be hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Writable contact fields. Status is written separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{record} validation failed: {field}: Path `{field}` is required.")]
pub struct ValidationError {
    pub record: &'static str,
    pub field: &'static str,
}

impl UserFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("User", "username", &self.username)?;
        require("User", "email", &self.email)?;
        require("User", "password", &self.password)
    }

    pub fn into_user(self, id: ObjectId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password: self.password,
        }
    }
}

impl ContactFields {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("Contact", "name", &self.name)?;
        require("Contact", "email", &self.email)?;
        require("Contact", "message", &self.message)
    }

    pub fn into_contact(self, id: ObjectId, status: ContactStatus) -> Contact {
        Contact {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            message: self.message,
            status,
        }
    }
}

fn require(record: &'static str, field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError { record, field })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bson::oid::ObjectId;
    use serde_json::Value;

    use super::{ContactFields, ContactStatus, UserFields};

    fn contact_fields() -> ContactFields {
        ContactFields {
            name: String::from("Ada"),
            email: String::from("ada@example.com"),
            phone: String::new(),
            message: String::from("hello"),
        }
    }

    #[test]
    fn contact_serializes_id_as_hex_and_status_as_name() -> anyhow::Result<()> {
        let id = ObjectId::new();
        let contact = contact_fields().into_contact(id, ContactStatus::Pending);

        let json = serde_json::to_value(&contact)?;

        assert_eq!(json.get("_id"), Some(&Value::String(id.to_hex())));
        assert_eq!(json.get("status"), Some(&Value::String("Pending".into())));
        assert!(json.get("id").is_none());
        Ok(())
    }

    #[test]
    fn contact_without_phone_is_valid() {
        assert!(contact_fields().validate().is_ok());
    }

    #[test]
    fn blank_contact_message_is_rejected() {
        let fields = ContactFields {
            message: String::from("   "),
            ..contact_fields()
        };

        let err = fields.validate().err();
        assert_eq!(err.map(|e| e.field), Some("message"));
    }

    #[test]
    fn user_requires_username_and_email() {
        let fields = UserFields {
            username: String::new(),
            email: String::from("a@b.c"),
            password: String::from("$2b$10$hash"),
        };
        assert!(fields.validate().is_err());

        let fields = UserFields {
            username: String::from("ada"),
            email: String::new(),
            password: String::from("$2b$10$hash"),
        };
        assert!(fields.validate().is_err());
    }

    #[test]
    fn status_default_is_pending() {
        assert_eq!(ContactStatus::default(), ContactStatus::Pending);
        assert_eq!(ContactStatus::Completed.to_string(), "Completed");
    }
}
