use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, error, info, warn};

use crate::model::{Contact, ContactFields, ContactStatus, User, UserFields};

use super::{ContactStore, StoreError, UserStore};

const USERS: &str = "users";
const CONTACTS: &str = "contacts";
const DEFAULT_DATABASE: &str = "contactdesk";

/// MongoDB adapter. Holds one long-lived client; pooling is left to the driver.
///
/// When the client cannot be created the store stays up in a degraded state and
/// every call fails with [`StoreError::Unavailable`].
#[derive(Debug, Clone)]
pub struct MongoStore {
    connection: Connection,
}

#[derive(Debug, Clone)]
enum Connection {
    Ready(Database),
    Failed(String),
}

impl MongoStore {
    /// Connect to `uri`. Never fails: problems are logged and surface per request.
    pub async fn connect(uri: Option<&str>, database: Option<&str>) -> Self {
        let Some(uri) = uri else {
            warn!("no MongoDB connection string configured; requests will fail");
            return Self::failed("MONGODB_URI is not set");
        };

        let db = match open(uri, database).await {
            Ok(db) => db,
            Err(err) => {
                error!(error = %err, "MongoDB connection error");
                return Self::failed(err.to_string());
            }
        };

        match db.run_command(doc! { "ping": 1 }).await {
            Ok(_) => info!(database = %db.name(), "connected to MongoDB successfully"),
            Err(err) => error!(
                database = %db.name(),
                error = %err,
                "MongoDB connection error; the driver will keep retrying per request"
            ),
        }
        ensure_indexes(&db).await;

        Self {
            connection: Connection::Ready(db),
        }
    }

    fn failed(reason: impl Into<String>) -> Self {
        Self {
            connection: Connection::Failed(reason.into()),
        }
    }

    fn database(&self) -> Result<&Database, StoreError> {
        match &self.connection {
            Connection::Ready(db) => Ok(db),
            Connection::Failed(reason) => Err(StoreError::Unavailable(reason.clone())),
        }
    }

    fn users(&self) -> Result<Collection<User>, StoreError> {
        Ok(self.database()?.collection(USERS))
    }

    fn contacts(&self) -> Result<Collection<Contact>, StoreError> {
        Ok(self.database()?.collection(CONTACTS))
    }

    fn raw(&self, name: &str) -> Result<Collection<Document>, StoreError> {
        Ok(self.database()?.collection(name))
    }
}

async fn open(uri: &str, database: Option<&str>) -> Result<Database, mongodb::error::Error> {
    let options = ClientOptions::parse(uri).await?;
    let name = database
        .map(str::to_owned)
        .or_else(|| options.default_database.clone())
        .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());
    let client = Client::with_options(options)?;
    Ok(client.database(&name))
}

/// Unique indexes on `users.username` and `users.email`. Failure is not fatal.
async fn ensure_indexes(db: &Database) {
    let unique = || IndexOptions::builder().unique(true).build();
    let indexes = [
        IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(unique())
            .build(),
        IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(unique())
            .build(),
    ];

    match db.collection::<Document>(USERS).create_indexes(indexes).await {
        Ok(_) => debug!("user indexes ensured"),
        Err(err) => warn!(error = %err, "failed to ensure user indexes"),
    }
}

fn status_filter(status: Option<ContactStatus>) -> Document {
    match status {
        Some(status) => doc! { "status": status.as_str() },
        None => doc! {},
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, fields: UserFields) -> Result<User, StoreError> {
        fields.validate()?;
        let id = ObjectId::new();
        self.raw(USERS)?
            .insert_one(doc! {
                "_id": id,
                "username": fields.username.as_str(),
                "email": fields.email.as_str(),
                "password": fields.password.as_str(),
            })
            .await?;
        Ok(fields.into_user(id))
    }

    async fn find_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users()?.find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, StoreError> {
        let mut clauses = Vec::new();
        if let Some(username) = username {
            clauses.push(doc! { "username": username });
        }
        if let Some(email) = email {
            clauses.push(doc! { "email": email });
        }
        if clauses.is_empty() {
            return Ok(None);
        }

        Ok(self.users()?.find_one(doc! { "$or": clauses }).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let cursor = self.users()?.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_users(&self) -> Result<u64, StoreError> {
        Ok(self.users()?.count_documents(doc! {}).await?)
    }

    async fn update_user(
        &self,
        id: ObjectId,
        fields: UserFields,
    ) -> Result<Option<User>, StoreError> {
        fields.validate()?;
        let update = doc! {
            "$set": {
                "username": fields.username,
                "email": fields.email,
                "password": fields.password,
            }
        };
        Ok(self
            .users()?
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_user(&self, id: ObjectId) -> Result<Option<User>, StoreError> {
        Ok(self.users()?.find_one_and_delete(doc! { "_id": id }).await?)
    }
}

#[async_trait]
impl ContactStore for MongoStore {
    async fn insert_contact(
        &self,
        fields: ContactFields,
        status: ContactStatus,
    ) -> Result<Contact, StoreError> {
        fields.validate()?;
        let id = ObjectId::new();
        self.raw(CONTACTS)?
            .insert_one(doc! {
                "_id": id,
                "name": fields.name.as_str(),
                "email": fields.email.as_str(),
                "phone": fields.phone.as_str(),
                "message": fields.message.as_str(),
                "status": status.as_str(),
            })
            .await?;
        Ok(fields.into_contact(id, status))
    }

    async fn find_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError> {
        Ok(self.contacts()?.find_one(doc! { "_id": id }).await?)
    }

    async fn list_contacts(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<Contact>, StoreError> {
        let cursor = self.contacts()?.find(status_filter(status)).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_contacts(&self, status: Option<ContactStatus>) -> Result<u64, StoreError> {
        Ok(self
            .contacts()?
            .count_documents(status_filter(status))
            .await?)
    }

    async fn update_contact(
        &self,
        id: ObjectId,
        fields: ContactFields,
    ) -> Result<Option<Contact>, StoreError> {
        fields.validate()?;
        let update = doc! {
            "$set": {
                "name": fields.name,
                "email": fields.email,
                "phone": fields.phone,
                "message": fields.message,
            }
        };
        Ok(self
            .contacts()?
            .find_one_and_update(doc! { "_id": id }, update)
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn update_contact_status(
        &self,
        id: ObjectId,
        status: ContactStatus,
    ) -> Result<Option<Contact>, StoreError> {
        Ok(self
            .contacts()?
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_contact(&self, id: ObjectId) -> Result<Option<Contact>, StoreError> {
        Ok(self
            .contacts()?
            .find_one_and_delete(doc! { "_id": id })
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bson::oid::ObjectId;

    use crate::model::{ContactStatus, UserFields};
    use crate::store::{StoreError, UserStore};

    use super::{status_filter, MongoStore};

    #[test]
    fn status_filter_matches_stored_status_names() {
        assert_eq!(status_filter(None), doc! {});
        assert_eq!(
            status_filter(Some(ContactStatus::Completed)),
            doc! { "status": "Completed" }
        );
    }

    #[tokio::test]
    async fn missing_connection_string_degrades_instead_of_failing() {
        let store = MongoStore::connect(None, None).await;

        let result = store.find_user(ObjectId::new()).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn invalid_connection_string_degrades_instead_of_failing() {
        let store = MongoStore::connect(Some("not a mongodb uri"), None).await;

        let result = store
            .insert_user(UserFields {
                username: String::from("ada"),
                email: String::from("ada@example.com"),
                password: String::from("$2b$10$hash"),
            })
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }
}
