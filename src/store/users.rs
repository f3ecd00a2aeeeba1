//! User profiles: settings, device tokens, blocked-app policy.
//!
//! Users are the one entity whose lookups are fully lenient: keys here
//! predate every other collection and mix native ids with arbitrary
//! strings. Mutations mirror the upstream contract by returning `None`
//! when no record matched instead of an error, so the handlers keep the
//! original "failed to update" response shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::document::DocumentBackend;
use super::error::{StoreError, StoreResult};
use super::ident::{IdQuery, RecordId};

const COLLECTION: &str = "users";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    pub email: String,
    /// Subject id from the external identity provider.
    pub auth_subject: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login_at: Option<DateTime<Utc>>,
    /// Free-form preferences; merge-patched, never replaced wholesale.
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Device notification tokens. Set semantics: unique, unordered.
    #[serde(default)]
    pub fcm_tokens: Vec<String>,
    /// Applications the user wants flagged. Set semantics.
    #[serde(default)]
    pub blocked_apps: Vec<String>,
}

#[derive(Clone)]
pub struct UserStore {
    db: Arc<dyn DocumentBackend>,
}

impl UserStore {
    pub fn new(db: Arc<dyn DocumentBackend>) -> Self {
        Self { db }
    }

    fn decode(doc: super::Document) -> StoreResult<UserRecord> {
        serde_json::from_value(doc).map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))
    }

    /// Look up a user by id, tolerating both key representations.
    pub async fn get(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        let query = IdQuery::lenient(user_id);
        match self.db.find_one(COLLECTION, &query).await? {
            None => Ok(None),
            Some(doc) => Self::decode(doc).map(Some),
        }
    }

    /// Look up a user by external-auth subject id.
    pub async fn get_by_subject(&self, auth_subject: &str) -> StoreResult<Option<UserRecord>> {
        for doc in self.db.scan(COLLECTION).await? {
            let user = Self::decode(doc)?;
            if user.auth_subject == auth_subject {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Fetch the user for an external subject, creating the profile on
    /// first login. Called by the (external) auth layer.
    pub async fn get_or_create(&self, auth_subject: &str, email: &str) -> StoreResult<UserRecord> {
        if let Some(existing) = self.get_by_subject(auth_subject).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let record = UserRecord {
            id: RecordId::mint_native(),
            email: email.to_string(),
            auth_subject: auth_subject.to_string(),
            created_at: now,
            last_login_at: Some(now),
            settings: Map::new(),
            fcm_tokens: Vec::new(),
            blocked_apps: Vec::new(),
        };

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        self.db.insert_one(COLLECTION, doc).await?;
        Ok(record)
    }

    /// Stamp a successful login.
    pub async fn update_last_login(&self, user_id: &str) -> StoreResult<Option<UserRecord>> {
        self.mutate(user_id, |user| {
            user.last_login_at = Some(Utc::now());
        })
        .await
    }

    /// Shallow merge-patch: each supplied key overwrites, everything else
    /// stays. An empty patch is a read.
    pub async fn merge_settings(
        &self,
        user_id: &str,
        patch: Map<String, Value>,
    ) -> StoreResult<Option<UserRecord>> {
        if patch.is_empty() {
            return self.get(user_id).await;
        }
        self.mutate(user_id, |user| {
            for (key, value) in patch {
                user.settings.insert(key, value);
            }
        })
        .await
    }

    /// Set-insert: adding a token that is already present is a no-op.
    pub async fn add_fcm_token(
        &self,
        user_id: &str,
        token: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let token = token.to_string();
        self.mutate(user_id, move |user| {
            if !user.fcm_tokens.contains(&token) {
                user.fcm_tokens.push(token);
            }
        })
        .await
    }

    /// Remove one named token (idempotent), or — with no token named —
    /// clear the whole set. The wildcard is part of the public contract
    /// and kept on purpose.
    pub async fn remove_fcm_token(
        &self,
        user_id: &str,
        token: Option<&str>,
    ) -> StoreResult<Option<UserRecord>> {
        let token = token.map(str::to_string);
        self.mutate(user_id, move |user| match &token {
            Some(t) => user.fcm_tokens.retain(|stored| stored != t),
            None => user.fcm_tokens.clear(),
        })
        .await
    }

    /// Set-insert into the blocked-application list.
    pub async fn add_blocked_app(
        &self,
        user_id: &str,
        app_name: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let app_name = app_name.to_string();
        self.mutate(user_id, move |user| {
            if !user.blocked_apps.contains(&app_name) {
                user.blocked_apps.push(app_name);
            }
        })
        .await
    }

    /// Remove one blocked application (idempotent).
    pub async fn remove_blocked_app(
        &self,
        user_id: &str,
        app_name: &str,
    ) -> StoreResult<Option<UserRecord>> {
        let app_name = app_name.to_string();
        self.mutate(user_id, move |user| {
            user.blocked_apps.retain(|stored| stored != &app_name);
        })
        .await
    }

    /// Read-modify-write against the lenient id filter. Not atomic with
    /// concurrent writers; last write wins, matching the upstream
    /// behavior.
    async fn mutate(
        &self,
        user_id: &str,
        apply: impl FnOnce(&mut UserRecord),
    ) -> StoreResult<Option<UserRecord>> {
        let query = IdQuery::lenient(user_id);
        let Some(doc) = self.db.find_one(COLLECTION, &query).await? else {
            return Ok(None);
        };
        let mut user = Self::decode(doc)?;

        apply(&mut user);

        let doc = serde_json::to_value(&user)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        if !self.db.replace_one(COLLECTION, &query, doc).await? {
            return Ok(None);
        }
        Ok(Some(user))
    }
}
