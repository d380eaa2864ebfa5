//! Profile API Tests
//!
//! The profile service runs for real over in-memory user and role stores.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use netrock::application::services::{
    AccountContext, AuditServiceImpl, EmailTokenServiceImpl, UserServiceImpl,
};
use netrock::domain::{Role, RoleRepository, RoleWithCount, User, UserRepository};
use netrock::infrastructure::email::NoopEmailService;
use netrock::infrastructure::repositories::{PgAuditEventRepository, PgEmailTokenRepository};
use netrock::shared::error::AppError;

use crate::common::{body_json, request, test_settings, test_user, TestApp};

#[derive(Default)]
struct ProfileStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl ProfileStore {
    fn with(user: &User) -> Arc<Self> {
        let store = Self::default();
        store.users.lock().insert(user.id, user.clone());
        Arc::new(store)
    }
}

#[async_trait]
impl UserRepository for ProfileStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.lock().get(&id).cloned())
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<User>, AppError> {
        unimplemented!()
    }

    async fn email_exists(&self, _email: &str) -> Result<bool, AppError> {
        unimplemented!()
    }

    async fn create(&self, _user: &User) -> Result<User, AppError> {
        unimplemented!()
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        self.users.lock().insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn delete(&self, _id: Uuid) -> Result<(), AppError> {
        unimplemented!()
    }

    async fn list(
        &self,
        _search: Option<String>,
        _limit: i64,
        _offset: i64,
    ) -> Result<(Vec<User>, i64), AppError> {
        unimplemented!()
    }

    async fn get_security_stamp(&self, id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.users.lock().get(&id).map(|u| u.security_stamp.clone()))
    }

    async fn rotate_security_stamps(&self, _ids: &[Uuid]) -> Result<(), AppError> {
        unimplemented!()
    }
}

#[async_trait]
impl RoleRepository for ProfileStore {
    async fn find_by_id(&self, _id: Uuid) -> Result<Option<Role>, AppError> {
        unimplemented!()
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<Role>, AppError> {
        unimplemented!()
    }

    async fn list_with_counts(&self) -> Result<Vec<RoleWithCount>, AppError> {
        unimplemented!()
    }

    async fn count_users(&self, _role_id: Uuid) -> Result<i64, AppError> {
        unimplemented!()
    }

    async fn create(&self, _role: &Role) -> Result<Role, AppError> {
        unimplemented!()
    }

    async fn update(&self, _role: &Role) -> Result<Role, AppError> {
        unimplemented!()
    }

    async fn delete(&self, _id: Uuid) -> Result<(), AppError> {
        unimplemented!()
    }

    async fn permissions(&self, _role_id: Uuid) -> Result<Vec<String>, AppError> {
        unimplemented!()
    }

    async fn set_permissions(
        &self,
        _role_id: Uuid,
        _permissions: &[String],
    ) -> Result<(), AppError> {
        unimplemented!()
    }

    async fn user_roles(&self, _user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(vec!["User".to_string()])
    }

    async fn user_permissions(&self, _user_id: Uuid) -> Result<Vec<String>, AppError> {
        Ok(vec![])
    }

    async fn roles_for_users(&self, _user_ids: &[Uuid]) -> Result<Vec<(Uuid, String)>, AppError> {
        unimplemented!()
    }

    async fn assign(&self, _user_id: Uuid, _role_id: Uuid) -> Result<(), AppError> {
        unimplemented!()
    }

    async fn remove(&self, _user_id: Uuid, _role_id: Uuid) -> Result<bool, AppError> {
        unimplemented!()
    }

    async fn replace_user_roles(&self, _user_id: Uuid, _role_id: Uuid) -> Result<(), AppError> {
        unimplemented!()
    }

    async fn user_ids_in_role(&self, _role_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        unimplemented!()
    }
}

/// App whose profile service reads and writes `user` in memory.
async fn app_with_user(user: &User) -> (TestApp, Arc<ProfileStore>) {
    let store = ProfileStore::with(user);
    let repo = store.clone();

    let app = TestApp::with_state(test_settings(), move |state| {
        let ctx = AccountContext {
            audit: Arc::new(AuditServiceImpl::new(Arc::new(PgAuditEventRepository::new(
                state.db.clone(),
            )))),
            email_tokens: Arc::new(EmailTokenServiceImpl::new(
                Arc::new(PgEmailTokenRepository::new(state.db.clone())),
                state.settings.auth.email_token.clone(),
            )),
            mailer: Arc::new(NoopEmailService),
            cache: state.cache.clone(),
            settings: state.settings.clone(),
        };
        state.profile = Arc::new(UserServiceImpl::new(repo.clone(), repo, ctx));
    })
    .await;

    (app, store)
}

fn patch_me(token: &str, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    request(Method::PATCH, "/api/v1/users/me", Some(token), Some(body))
}

#[tokio::test]
async fn test_blank_avatar_url_clears_avatar() {
    let mut user = test_user();
    user.avatar_url = Some("https://cdn.example.com/ada.png".into());
    user.bio = Some("Engineer".into());
    let (app, store) = app_with_user(&user).await;
    let token = app.token_for(&user, &["User"], &[]).await;

    let response = app.send(patch_me(&token, json!({ "avatar_url": "" }))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["avatar_url"].is_null());
    assert_eq!(json["bio"], "Engineer");
    assert_eq!(store.users.lock()[&user.id].avatar_url, None);
}

#[tokio::test]
async fn test_avatar_url_is_stored() {
    let user = test_user();
    let (app, _store) = app_with_user(&user).await;
    let token = app.token_for(&user, &["User"], &[]).await;

    let response = app
        .send(patch_me(&token, json!({ "avatar_url": "https://cdn.example.com/new.png" })))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["avatar_url"], "https://cdn.example.com/new.png");
}

#[tokio::test]
async fn test_relative_avatar_url_rejected() {
    let user = test_user();
    let (app, _store) = app_with_user(&user).await;
    let token = app.token_for(&user, &["User"], &[]).await;

    let response = app.send(patch_me(&token, json!({ "avatar_url": "ada.png" }))).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["errors"][0]["field"], "avatar_url");
}
