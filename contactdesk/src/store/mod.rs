//! Persistence gateway: storage ports for users and contacts plus their adapters.
//!
//! - [`MongoStore`]: the production adapter over the `users` and `contacts` collections
//! - [`MemoryStore`]: a process-local adapter with the same semantics
//!
//! Every operation maps to exactly one database call. Nothing spans documents
//! atomically.

mod memory;
mod mongo;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

use crate::model::{Contact, ContactFields, ContactStatus, User, UserFields, ValidationError};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("duplicate key: {field} \"{value}\" already exists")]
    Duplicate { field: &'static str, value: String },
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Database(#[from] mongodb::error::Error),
}

/// Parse a path id the way the document store casts it.
pub fn parse_id(raw: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(raw).map_err(|_| StoreError::InvalidId(raw.to_string()))
}

#[async_trait]
pub trait UserStore: fmt::Debug + Send + Sync {
    async fn insert_user(&self, fields: UserFields) -> Result<User, StoreError>;

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError>;

    /// First user whose username equals `username` or whose email equals `email`.
    /// Absent arguments do not match anything.
    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError>;

    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn count_users(&self) -> Result<u64, StoreError>;

    /// Overwrites all user fields. Returns the updated record, or `None` if absent.
    async fn update_user(&self, id: ObjectId, fields: UserFields)
        -> Result<Option<User>, StoreError>;

    /// Returns the removed record, or `None` if absent.
    async fn delete_user(&self, id: ObjectId) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ContactStore: fmt::Debug + Send + Sync {
    async fn insert_contact(
        &self,
        fields: ContactFields,
        status: ContactStatus,
    ) -> Result<Contact, StoreError>;

    async fn find_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError>;

    /// All contacts, or only those with the given status.
    async fn list_contacts(&self, status: Option<ContactStatus>)
        -> Result<Vec<Contact>, StoreError>;

    async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64, StoreError>;

    /// Overwrites name, email, phone and message. Status is untouched.
    async fn update_contact(
        &self,
        id: ObjectId,
        fields: ContactFields,
    ) -> Result<Option<Contact>, StoreError>;

    async fn update_contact_status(
        &self,
        id: ObjectId,
        status: ContactStatus,
    ) -> Result<Option<Contact>, StoreError>;

    async fn delete_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError>;
}

/// Shared handle to both collections, created once at startup.
#[derive(Debug, Clone)]
pub struct Store {
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
}

impl Store {
    pub fn from_backend<B>(backend: B) -> Self
    where
        B: UserStore + ContactStore + 'static,
    {
        let backend = Arc::new(backend);
        Self {
            users: Arc::clone(&backend) as Arc<dyn UserStore>,
            contacts: backend,
        }
    }
}
