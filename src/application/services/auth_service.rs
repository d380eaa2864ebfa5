//! Authentication Service
//!
//! Handles registration, credential checks with lockout, refresh token
//! rotation with reuse detection, and the password and email flows that
//! run through opaque email tokens.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{AccountContext, TokenService};
use crate::application::dto::request::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, VerifyEmailRequest,
};
use crate::application::dto::response::{AuthTokensResponse, UserResponse};
use crate::domain::{
    effective_permissions, entity_types, normalize_email, AuditAction, EmailToken,
    EmailTokenPurpose, RefreshToken, RefreshTokenRepository, RoleRepository, SystemRole, User,
    UserRepository,
};
use crate::infrastructure::captcha::CaptchaService;
use crate::infrastructure::email::templates;
use crate::shared::crypto::{hash_password, random_token_hex, sha256_hex, verify_password};
use crate::shared::error::AppError;

const REFRESH_TOKEN_BYTES: usize = 32;

const INVALID_CREDENTIALS: &str = "Invalid username or password.";
const ACCOUNT_LOCKED: &str = "Account is temporarily locked. Please try again later.";
const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token.";
const INVALID_EMAIL_TOKEN: &str = "Invalid or expired token.";

/// Authentication service trait for dependency injection
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account with the `User` role and send a verification email.
    async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError>;

    async fn login(&self, req: LoginRequest) -> Result<AuthTokensResponse, AppError>;

    /// Exchange a refresh token for a new pair. Presenting a token twice
    /// revokes every token of its owner.
    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokensResponse, AppError>;

    async fn logout(&self, user_id: Uuid) -> Result<(), AppError>;

    /// Succeeds for unknown emails so accounts cannot be enumerated.
    async fn forgot_password(&self, req: ForgotPasswordRequest) -> Result<(), AppError>;

    async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError>;

    async fn verify_email(&self, req: VerifyEmailRequest) -> Result<(), AppError>;

    async fn resend_verification(&self, user_id: Uuid) -> Result<(), AppError>;

    async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError>;
}

/// AuthService implementation
pub struct AuthServiceImpl<U, R, T>
where
    U: UserRepository,
    R: RoleRepository,
    T: RefreshTokenRepository,
{
    user_repo: Arc<U>,
    role_repo: Arc<R>,
    refresh_repo: Arc<T>,
    captcha: Arc<dyn CaptchaService>,
    tokens: TokenService,
    ctx: AccountContext,
}

impl<U, R, T> AuthServiceImpl<U, R, T>
where
    U: UserRepository,
    R: RoleRepository,
    T: RefreshTokenRepository,
{
    /// Create a new AuthServiceImpl
    pub fn new(
        user_repo: Arc<U>,
        role_repo: Arc<R>,
        refresh_repo: Arc<T>,
        captcha: Arc<dyn CaptchaService>,
        ctx: AccountContext,
    ) -> Self {
        let tokens = TokenService::new(ctx.settings.auth.jwt.clone());
        Self {
            user_repo,
            role_repo,
            refresh_repo,
            captcha,
            tokens,
            ctx,
        }
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".into()))
    }

    /// Sign an access token and store a new refresh token.
    async fn issue_tokens(
        &self,
        user: &User,
        persistent: bool,
    ) -> Result<AuthTokensResponse, AppError> {
        let roles = self.role_repo.user_roles(user.id).await?;
        let granted = self.role_repo.user_permissions(user.id).await?;
        let permissions = effective_permissions(&roles, granted);

        let access = self.tokens.issue(user, roles, permissions)?;

        let raw_refresh = random_token_hex(REFRESH_TOKEN_BYTES);
        let refresh = RefreshToken::new(
            user.id,
            sha256_hex(&raw_refresh),
            self.tokens.refresh_token_lifetime(),
            persistent,
        );
        self.refresh_repo.create(&refresh).await?;

        Ok(AuthTokensResponse {
            access_token: access.token,
            refresh_token: raw_refresh,
            token_type: "Bearer".to_string(),
            expires_in: access.expires_in,
        })
    }

    /// Resolve an email token and check it was issued against the user's
    /// current security stamp.
    async fn redeem(
        &self,
        raw_token: &str,
        purpose: EmailTokenPurpose,
    ) -> Result<(EmailToken, User), AppError> {
        let invalid = || AppError::BadRequest(INVALID_EMAIL_TOKEN.into());

        let token = self
            .ctx
            .email_tokens
            .resolve(raw_token, purpose)
            .await?
            .ok_or_else(invalid)?;

        let user = self
            .user_repo
            .find_by_id(token.user_id)
            .await?
            .ok_or_else(invalid)?;

        if token.identity_token != user.security_stamp {
            debug!(user_id = %user.id, purpose = purpose.as_str(), "Email token stamp mismatch");
            return Err(invalid());
        }

        Ok((token, user))
    }

    /// Rotate the stamp, revoke refresh tokens and clear caches.
    async fn revoke_sessions(&self, user_id: Uuid) -> Result<(), AppError> {
        self.refresh_repo.invalidate_all_for_user(user_id).await?;
        self.ctx.evict_users(&[user_id]).await;
        Ok(())
    }

    async fn send_verification(&self, user: &User) -> Result<(), AppError> {
        let raw = self
            .ctx
            .email_tokens
            .create(
                user.id,
                user.security_stamp.clone(),
                EmailTokenPurpose::EmailVerification,
            )
            .await?;

        let message = templates::email_verification(&self.ctx.settings.email, &user.email, &raw);
        self.ctx.deliver("email_verification", message).await;
        Ok(())
    }

    async fn audit(
        &self,
        user_id: Option<Uuid>,
        action: AuditAction,
        metadata: Option<serde_json::Value>,
    ) {
        let entity_type = user_id.map(|_| entity_types::USER);
        self.ctx
            .audit
            .log(user_id, action, entity_type, user_id, metadata)
            .await;
    }
}

#[async_trait]
impl<U, R, T> AuthService for AuthServiceImpl<U, R, T>
where
    U: UserRepository + 'static,
    R: RoleRepository + 'static,
    T: RefreshTokenRepository + 'static,
{
    async fn register(&self, req: RegisterRequest) -> Result<UserResponse, AppError> {
        let email = normalize_email(&req.email);
        if self.user_repo.email_exists(&email).await? {
            return Err(AppError::Conflict("Email is already registered".into()));
        }

        let mut user = User::new(&email, Some(hash_password(&req.password)?));
        user.first_name = req.first_name.filter(|s| !s.trim().is_empty());
        user.last_name = req.last_name.filter(|s| !s.trim().is_empty());

        let user = self.user_repo.create(&user).await?;

        let role = self
            .role_repo
            .find_by_name(SystemRole::User.as_str())
            .await?
            .ok_or_else(|| AppError::Internal("Default role 'User' is missing".into()))?;
        self.role_repo.assign(user.id, role.id).await?;

        self.send_verification(&user).await?;

        info!(user_id = %user.id, "User registered");
        self.audit(Some(user.id), AuditAction::Register, None).await;

        Ok(UserResponse::new(user, vec![role.name], vec![]))
    }

    async fn login(&self, req: LoginRequest) -> Result<AuthTokensResponse, AppError> {
        let now = Utc::now();

        let Some(mut user) = self.user_repo.find_by_email(&req.username).await? else {
            debug!("Login attempt for unknown account");
            self.audit(
                None,
                AuditAction::LoginFailure,
                Some(serde_json::json!({ "reason": "unknown_user" })),
            )
            .await;
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if user.is_locked_out(now) {
            self.audit(
                Some(user.id),
                AuditAction::LoginFailure,
                Some(serde_json::json!({ "reason": "locked_out" })),
            )
            .await;
            return Err(AppError::Unauthorized(ACCOUNT_LOCKED.into()));
        }

        let password_ok = match user.password_hash.as_deref() {
            Some(hash) => verify_password(&req.password, hash)?,
            None => false,
        };

        if !password_ok {
            let lockout = &self.ctx.settings.auth.lockout;
            let locked = user.record_failed_login(
                lockout.max_failed_attempts,
                Duration::minutes(lockout.duration_minutes),
                now,
            );
            self.user_repo.update(&user).await?;

            self.audit(
                Some(user.id),
                AuditAction::LoginFailure,
                Some(serde_json::json!({ "reason": "invalid_password", "locked_out": locked })),
            )
            .await;

            if locked {
                warn!(user_id = %user.id, "Account locked after repeated failed logins");
                return Err(AppError::Unauthorized(ACCOUNT_LOCKED.into()));
            }
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        if user.access_failed_count > 0 || user.lockout_end.is_some() {
            user.reset_failed_logins();
            self.user_repo.update(&user).await?;
        }

        let tokens = self.issue_tokens(&user, req.remember_me).await?;

        info!(user_id = %user.id, "User logged in");
        self.audit(Some(user.id), AuditAction::LoginSuccess, None).await;

        Ok(tokens)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthTokensResponse, AppError> {
        let now = Utc::now();
        let stored = self
            .refresh_repo
            .find_by_token(&sha256_hex(refresh_token))
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()))?;

        if stored.is_replayed() {
            warn!(user_id = %stored.user_id, "Refresh token reuse detected, revoking all sessions");
            self.revoke_sessions(stored.user_id).await?;
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        if stored.expires_at <= now {
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        // Lost a race with a concurrent refresh of the same token.
        if !self.refresh_repo.mark_used(stored.id).await? {
            warn!(user_id = %stored.user_id, "Concurrent refresh token use, revoking all sessions");
            self.revoke_sessions(stored.user_id).await?;
            return Err(AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()));
        }

        let user = self
            .user_repo
            .find_by_id(stored.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(INVALID_REFRESH_TOKEN.into()))?;

        if user.is_locked_out(now) {
            return Err(AppError::Unauthorized(ACCOUNT_LOCKED.into()));
        }

        debug!(user_id = %user.id, "Refresh token rotated");
        self.issue_tokens(&user, stored.persistent).await
    }

    async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.user_repo.rotate_security_stamps(&[user_id]).await?;
        self.revoke_sessions(user_id).await?;

        info!(user_id = %user_id, "User logged out");
        self.audit(Some(user_id), AuditAction::Logout, None).await;
        Ok(())
    }

    async fn forgot_password(&self, req: ForgotPasswordRequest) -> Result<(), AppError> {
        if !self.captcha.validate(&req.captcha_token).await {
            return Err(AppError::BadRequest("Captcha verification failed.".into()));
        }

        let Some(user) = self.user_repo.find_by_email(&req.email).await? else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let raw = self
            .ctx
            .email_tokens
            .create(
                user.id,
                user.security_stamp.clone(),
                EmailTokenPurpose::PasswordReset,
            )
            .await?;

        let message = templates::password_reset(&self.ctx.settings.email, &user.email, &raw);
        self.ctx.deliver("password_reset", message).await;

        self.audit(Some(user.id), AuditAction::PasswordResetRequest, None)
            .await;
        Ok(())
    }

    async fn reset_password(&self, req: ResetPasswordRequest) -> Result<(), AppError> {
        let (token, mut user) = self.redeem(&req.token, EmailTokenPurpose::PasswordReset).await?;

        user.password_hash = Some(hash_password(&req.new_password)?);
        // Invited users prove ownership of the address by setting a password.
        user.email_confirmed = true;
        user.reset_failed_logins();
        user.rotate_security_stamp();
        self.user_repo.update(&user).await?;

        self.ctx.email_tokens.mark_used(token.id).await?;
        self.revoke_sessions(user.id).await?;

        info!(user_id = %user.id, "Password reset");
        self.audit(Some(user.id), AuditAction::PasswordReset, None).await;
        Ok(())
    }

    async fn verify_email(&self, req: VerifyEmailRequest) -> Result<(), AppError> {
        let (token, mut user) = self
            .redeem(&req.token, EmailTokenPurpose::EmailVerification)
            .await?;

        user.email_confirmed = true;
        user.updated_at = Some(Utc::now());
        self.user_repo.update(&user).await?;

        self.ctx.email_tokens.mark_used(token.id).await?;
        self.ctx.evict_users(&[user.id]).await;

        info!(user_id = %user.id, "Email verified");
        self.audit(Some(user.id), AuditAction::EmailVerification, None)
            .await;
        Ok(())
    }

    async fn resend_verification(&self, user_id: Uuid) -> Result<(), AppError> {
        let user = self.load_user(user_id).await?;
        if user.email_confirmed {
            return Err(AppError::BadRequest("Email is already verified.".into()));
        }

        self.send_verification(&user).await?;
        self.audit(Some(user.id), AuditAction::ResendVerificationEmail, None)
            .await;
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let mut user = self.load_user(user_id).await?;

        let current_ok = match user.password_hash.as_deref() {
            Some(hash) => verify_password(&req.current_password, hash)?,
            None => false,
        };
        if !current_ok {
            return Err(AppError::BadRequest("Current password is incorrect.".into()));
        }

        user.password_hash = Some(hash_password(&req.new_password)?);
        user.rotate_security_stamp();
        self.user_repo.update(&user).await?;
        self.revoke_sessions(user.id).await?;

        info!(user_id = %user.id, "Password changed");
        self.audit(Some(user.id), AuditAction::PasswordChange, None).await;
        Ok(())
    }
}
