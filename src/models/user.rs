use chrono::{DateTime, Utc};
use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime, Document},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::hash::hash_password;

#[derive(Debug, Deserialize, Serialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "userType", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    #[serde(rename = "lastLogin", with = "chrono_datetime_as_bson_datetime")]
    pub last_login: DateTime<Utc>,
    #[serde(rename = "createdAt", with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Admin update body. Unknown fields are dropped by the deserializer; `None`
/// means the field was not supplied.
#[derive(Debug, Default, Deserialize)]
pub struct AdminUserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "userType")]
    pub user_type: Option<String>,
    pub password: Option<String>,
}

/// Profile update body. Unlike the admin update, empty strings are treated as
/// absent.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Read shape for listings. The password never appears here; timestamps are
/// projected to ISO strings.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserResponse {
    pub _id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "userType", skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    #[serde(rename = "lastLogin")]
    pub last_login: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
}

impl AdminUserUpdate {
    pub fn changes(&self) -> Document {
        let mut updates = Document::new();
        if let Some(email) = &self.email {
            updates.insert("email", email);
        }
        if let Some(name) = &self.name {
            updates.insert("name", name);
        }
        if let Some(user_type) = &self.user_type {
            updates.insert("userType", user_type);
        }
        if let Some(password) = &self.password {
            updates.insert("password", password);
        }
        updates
    }
}

impl ProfileUpdate {
    pub fn changes(&self) -> Document {
        let mut updates = Document::new();
        let fields = [
            ("name", &self.name),
            ("email", &self.email),
            ("address", &self.address),
            ("phone", &self.phone),
            ("password", &self.password),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                if !value.is_empty() {
                    updates.insert(key, value);
                }
            }
        }
        updates
    }
}

#[derive(Clone)]
pub struct UserStore {
    collection: Collection<User>,
}

impl UserStore {
    pub fn new(db: &Database) -> Self {
        UserStore {
            collection: db.collection::<User>("users"),
        }
    }

    pub async fn find_many(&self) -> Result<Vec<UserResponse>, ApiError> {
        let pipeline = vec![doc! {
            "$project": {
                "_id": { "$toString": "$_id" },
                "email": "$email",
                "name": "$name",
                "userType": "$userType",
                "address": "$address",
                "phone": "$phone",
                "isVerified": "$isVerified",
                "lastLogin": { "$dateToString": { "date": "$lastLogin" } },
                "createdAt": { "$dateToString": { "date": "$createdAt" } },
                "updatedAt": { "$dateToString": { "date": "$updatedAt" } },
            }
        }];

        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        let mut users: Vec<UserResponse> = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            users.push(from_document::<UserResponse>(doc)?);
        }
        Ok(users)
    }

    // Uniqueness is a lookup followed by an insert, so concurrent creates with
    // the same email can race past each other.
    pub async fn create(&self, request: UserRequest) -> Result<(), ApiError> {
        let existing = self
            .collection
            .find_one(doc! { "email": &request.email }, None)
            .await?;
        if existing.is_some() {
            return Err(ApiError::Conflict(String::from("Email already exists")));
        }

        let now = Utc::now();
        let user = User {
            _id: Some(ObjectId::new()),
            email: request.email,
            password: hash_password(&request.password)?,
            name: request.name,
            user_type: request.user_type,
            address: request.address,
            phone: request.phone,
            is_verified: true,
            last_login: now,
            created_at: now,
            updated_at: now,
        };

        self.collection.insert_one(&user, None).await?;
        Ok(())
    }

    /// Allow-listed admin update. Does not touch `updatedAt`.
    pub async fn admin_update(&self, _id: &ObjectId, update: AdminUserUpdate) -> Result<(), ApiError> {
        let mut updates = update.changes();
        if updates.is_empty() {
            return Err(ApiError::Validation(String::from("No valid fields to update")));
        }

        let hashed = match updates.get_str("password") {
            Ok(password) => Some(hash_password(password)?),
            Err(_) => None,
        };
        if let Some(hashed) = hashed {
            updates.insert("password", hashed);
        }

        let result = self
            .collection
            .update_one(doc! { "_id": _id }, doc! { "$set": updates }, None)
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(String::from("User not found")));
        }
        Ok(())
    }

    pub async fn delete(&self, _id: &ObjectId) -> Result<(), ApiError> {
        let result = self.collection.delete_one(doc! { "_id": _id }, None).await?;
        if result.deleted_count == 0 {
            return Err(ApiError::NotFound(String::from("User not found")));
        }
        Ok(())
    }

    pub async fn profile_update(&self, _id: &ObjectId, update: ProfileUpdate) -> Result<(), ApiError> {
        let user = self
            .collection
            .find_one(doc! { "_id": _id }, None)
            .await?
            .ok_or_else(|| ApiError::NotFound(String::from("User not found")))?;

        let mut updates = update.changes();
        if updates.is_empty() {
            return Err(ApiError::Validation(String::from("No valid fields to update")));
        }

        if let Ok(email) = updates.get_str("email") {
            if email != user.email {
                let taken = self
                    .collection
                    .find_one(doc! { "email": email }, None)
                    .await?;
                if taken.is_some() {
                    return Err(ApiError::Conflict(String::from("Email already in use")));
                }
            }
        }

        let hashed = match updates.get_str("password") {
            Ok(password) => Some(hash_password(password)?),
            Err(_) => None,
        };
        if let Some(hashed) = hashed {
            updates.insert("password", hashed);
        }

        updates.insert("updatedAt", mongodb::bson::DateTime::now());

        let result = self
            .collection
            .update_one(doc! { "_id": _id }, doc! { "$set": updates }, None)
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(String::from("User not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_update_honors_allow_list_only() {
        let body = serde_json::json!({
            "email": "new@example.com",
            "userType": "Admin",
            "isVerified": false,
            "role": "superuser"
        });
        let update: AdminUserUpdate = serde_json::from_value(body).unwrap();
        let changes = update.changes();

        assert_eq!(changes.get_str("email").unwrap(), "new@example.com");
        assert_eq!(changes.get_str("userType").unwrap(), "Admin");
        assert!(!changes.contains_key("isVerified"));
        assert!(!changes.contains_key("role"));
    }

    #[test]
    fn admin_update_keeps_empty_strings() {
        let update = AdminUserUpdate {
            name: Some(String::new()),
            ..Default::default()
        };
        let changes = update.changes();
        assert_eq!(changes.get_str("name").unwrap(), "");
    }

    #[test]
    fn profile_update_ignores_empty_strings() {
        let update = ProfileUpdate {
            email: Some(String::new()),
            phone: Some(String::from("0712345678")),
            ..Default::default()
        };
        let changes = update.changes();

        assert!(!changes.contains_key("email"));
        assert_eq!(changes.get_str("phone").unwrap(), "0712345678");
    }

    #[test]
    fn profile_update_with_nothing_valid_is_empty() {
        let update = ProfileUpdate {
            name: Some(String::new()),
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(update.changes().is_empty());
    }

    #[test]
    fn user_response_never_carries_a_password() {
        let projected = doc! {
            "_id": ObjectId::new().to_hex(),
            "email": "jane@example.com",
            "isVerified": true,
            "lastLogin": "2024-06-01T08:00:00.000Z",
            "createdAt": "2024-06-01T08:00:00.000Z",
            "updatedAt": "2024-06-01T08:00:00.000Z",
        };
        let response = from_document::<UserResponse>(projected).unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "jane@example.com");
        assert_eq!(value["isVerified"], true);
    }

    #[test]
    fn stored_user_uses_wire_field_names() {
        let now = Utc::now();
        let user = User {
            _id: Some(ObjectId::new()),
            email: String::from("jane@example.com"),
            password: String::from("$2b$10$hash"),
            name: Some(String::from("Jane")),
            user_type: Some(String::from("User")),
            address: None,
            phone: None,
            is_verified: true,
            last_login: now,
            created_at: now,
            updated_at: now,
        };

        let doc = mongodb::bson::to_document(&user).unwrap();
        assert!(doc.contains_key("userType"));
        assert!(doc.contains_key("isVerified"));
        assert!(doc.contains_key("lastLogin"));
        assert!(doc.get_datetime("createdAt").is_ok());
        assert!(!doc.contains_key("address"));
    }
}
