use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::model::{Contact, ContactFields, ContactStatus, User, UserFields};

use super::{ContactStore, StoreError, UserStore};

/// Process-local store with the same semantics as the MongoDB adapter,
/// including the unique username/email constraint. Data is lost on exit.
///
/// Listings come back in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: DashMap<ObjectId, (u64, User)>,
    contacts: DashMap<ObjectId, (u64, Contact)>,
    next_seq: AtomicU64,
    // Serializes user writes so the uniqueness check and the write are one step.
    user_writes: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }

    fn check_unique(&self, fields: &UserFields, except: Option<ObjectId>) -> Result<(), StoreError> {
        for entry in self.users.iter() {
            if Some(*entry.key()) == except {
                continue;
            }
            let (_, user) = entry.value();
            if user.username == fields.username {
                return Err(StoreError::Duplicate {
                    field: "username",
                    value: fields.username.clone(),
                });
            }
            if user.email == fields.email {
                return Err(StoreError::Duplicate {
                    field: "email",
                    value: fields.email.clone(),
                });
            }
        }
        Ok(())
    }
}

fn sorted<T>(mut records: Vec<(u64, T)>) -> Vec<T> {
    records.sort_by_key(|(seq, _)| *seq);
    records.into_iter().map(|(_, record)| record).collect()
}

fn count(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, fields: UserFields) -> Result<User, StoreError> {
        fields.validate()?;
        let _guard = self.user_writes.lock().await;
        self.check_unique(&fields, None)?;

        let user = fields.into_user(ObjectId::new());
        self.users.insert(user.id, (self.seq(), user.clone()));
        Ok(user)
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|entry| entry.value().1.clone()))
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let matches = self
            .users
            .iter()
            .filter(|entry| {
                let (_, user) = entry.value();
                username.is_some_and(|name| user.username == name)
                    || email.is_some_and(|mail| user.email == mail)
            })
            .map(|entry| entry.value().clone())
            .collect();
        Ok(sorted(matches).into_iter().next())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let all = self
            .users
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(sorted(all))
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(count(self.users.len()))
    }

    async fn update_user(
        &self,
        id: ObjectId,
        fields: UserFields,
    ) -> Result<Option<User>, StoreError> {
        fields.validate()?;
        let _guard = self.user_writes.lock().await;
        if !self.users.contains_key(&id) {
            return Ok(None);
        }
        self.check_unique(&fields, Some(id))?;

        Ok(self.users.get_mut(&id).map(|mut entry| {
            let (_, user) = entry.value_mut();
            user.username = fields.username;
            user.email = fields.email;
            user.password = fields.password;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        let _guard = self.user_writes.lock().await;
        Ok(self.users.remove(&id).map(|(_, (_, user))| user))
    }
}

#[async_trait]
impl ContactStore for MemoryStore {
    async fn insert_contact(
        &self,
        fields: ContactFields,
        status: ContactStatus,
    ) -> Result<Contact, StoreError> {
        fields.validate()?;
        let contact = fields.into_contact(ObjectId::new(), status);
        self.contacts.insert(contact.id, (self.seq(), contact.clone()));
        Ok(contact)
    }

    async fn find_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.get(&id).map(|entry| entry.value().1.clone()))
    }

    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<Contact>, StoreError> {
        let matching = self
            .contacts
            .iter()
            .filter(|entry| status.map_or(true, |status| entry.value().1.status == status))
            .map(|entry| entry.value().clone())
            .collect();
        Ok(sorted(matching))
    }

    async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64, StoreError> {
        let n = match status {
            None => self.contacts.len(),
            Some(status) => self
                .contacts
                .iter()
                .filter(|entry| entry.value().1.status == status)
                .count(),
        };
        Ok(count(n))
    }

    async fn update_contact(
        &self,
        id: ObjectId,
        fields: ContactFields,
    ) -> Result<Option<Contact>, StoreError> {
        fields.validate()?;
        Ok(self.contacts.get_mut(&id).map(|mut entry| {
            let (_, contact) = entry.value_mut();
            contact.name = fields.name;
            contact.email = fields.email;
            contact.phone = fields.phone;
            contact.message = fields.message;
            contact.clone()
        }))
    }

    async fn update_contact_status(
        &self,
        id: ObjectId,
        status: ContactStatus,
    ) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.get_mut(&id).map(|mut entry| {
            let (_, contact) = entry.value_mut();
            contact.status = status;
            contact.clone()
        }))
    }

    async fn delete_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts.remove(&id).map(|(_, (_, contact))| contact))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use anyhow::Result;
    use bson::oid::ObjectId;

    use crate::model::{ContactFields, ContactStatus, UserFields};
    use crate::store::{ContactStore, StoreError, UserStore};

    use super::MemoryStore;

    fn user(username: &str, email: &str) -> UserFields {
        UserFields {
            username: String::from(username),
            email: String::from(email),
            password: String::from("$2b$10$hash"),
        }
    }

    fn contact(name: &str) -> ContactFields {
        ContactFields {
            name: String::from(name),
            email: format!("{name}@example.com"),
            phone: String::from("555-0100"),
            message: String::from("please call back"),
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() -> Result<()> {
        let store = MemoryStore::new();
        store.insert_user(user("ada", "ada@example.com")).await?;

        let same_name = store.insert_user(user("ada", "other@example.com")).await;
        let same_email = store.insert_user(user("bob", "ada@example.com")).await;

        assert!(matches!(
            same_name,
            Err(StoreError::Duplicate { field: "username", .. })
        ));
        assert!(matches!(
            same_email,
            Err(StoreError::Duplicate { field: "email", .. })
        ));
        assert_eq!(store.count_users().await?, 1);
        Ok(())
    }

    #[tokio::test]
    async fn update_may_keep_its_own_username() -> Result<()> {
        let store = MemoryStore::new();
        let ada = store.insert_user(user("ada", "ada@example.com")).await?;

        let updated = store
            .update_user(ada.id, user("ada", "ada@new.example.com"))
            .await?
            .unwrap();

        assert_eq!(updated.email, "ada@new.example.com");
        Ok(())
    }

    #[tokio::test]
    async fn login_lookup_matches_username_or_email() -> Result<()> {
        let store = MemoryStore::new();
        let ada = store.insert_user(user("ada", "ada@example.com")).await?;
        store.insert_user(user("bob", "bob@example.com")).await?;

        let by_name = store.find_user_by_login(Some("ada"), None).await?;
        let by_email = store
            .find_user_by_login(None, Some("ada@example.com"))
            .await?;
        let neither = store.find_user_by_login(None, None).await?;

        assert_eq!(by_name.map(|u| u.id), Some(ada.id));
        assert_eq!(by_email.map(|u| u.id), Some(ada.id));
        assert!(neither.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn listings_follow_insertion_order() -> Result<()> {
        let store = MemoryStore::new();
        let first = store.insert_contact(contact("a"), ContactStatus::Pending).await?;
        let second = store.insert_contact(contact("b"), ContactStatus::Pending).await?;
        let third = store.insert_contact(contact("c"), ContactStatus::Pending).await?;

        let ids: Vec<ObjectId> = store
            .list_contacts(None)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec![first.id, second.id, third.id]);
        Ok(())
    }

    #[tokio::test]
    async fn status_filters_partition_contacts() -> Result<()> {
        let store = MemoryStore::new();
        let done = store.insert_contact(contact("a"), ContactStatus::Pending).await?;
        store.insert_contact(contact("b"), ContactStatus::Pending).await?;
        store
            .update_contact_status(done.id, ContactStatus::Completed)
            .await?;

        let completed = store.list_contacts(Some(ContactStatus::Completed)).await?;
        let pending = store.list_contacts(Some(ContactStatus::Pending)).await?;

        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, done.id);
        assert_eq!(pending.len(), 1);
        assert_eq!(store.count_contacts(Some(ContactStatus::Completed)).await?, 1);
        assert_eq!(store.count_contacts(None).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn updating_contact_fields_keeps_status() -> Result<()> {
        let store = MemoryStore::new();
        let created = store.insert_contact(contact("a"), ContactStatus::Pending).await?;
        store
            .update_contact_status(created.id, ContactStatus::Completed)
            .await?;

        let updated = store
            .update_contact(created.id, contact("renamed"))
            .await?
            .unwrap();

        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.status, ContactStatus::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn missing_records_yield_none() -> Result<()> {
        let store = MemoryStore::new();
        let id = ObjectId::new();

        assert!(store.find_contact(id).await?.is_none());
        assert!(store.update_contact(id, contact("a")).await?.is_none());
        assert!(store
            .update_contact_status(id, ContactStatus::Completed)
            .await?
            .is_none());
        assert!(store.delete_contact(id).await?.is_none());
        assert!(store.delete_user(id).await?.is_none());
        assert!(store.update_user(id, user("x", "x@y.z")).await?.is_none());
        Ok(())
    }
}
