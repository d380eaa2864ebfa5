//! Request DTOs
//!
//! Data structures for API request bodies and query strings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidateUrl, ValidationError};

use crate::domain::{ContactSource, ContactStatus, NoteCategory};
use crate::shared::pagination::{PaginationQuery, DEFAULT_PAGE_SIZE};

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn validate_contact_status(value: &String) -> Result<(), ValidationError> {
    value
        .parse::<ContactStatus>()
        .map(|_| ())
        .map_err(|_| invalid("status", "Status must be one of Lead, Prospect, Customer, Churned."))
}

fn validate_contact_source(value: &String) -> Result<(), ValidationError> {
    value.parse::<ContactSource>().map(|_| ()).map_err(|_| {
        invalid(
            "source",
            "Source must be one of Website, Referral, Social, Email, Phone, Other.",
        )
    })
}

fn validate_note_category(value: &String) -> Result<(), ValidationError> {
    value
        .parse::<NoteCategory>()
        .map(|_| ())
        .map_err(|_| invalid("category", "Category must be one of Personal, Work, Ideas."))
}

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid("value", "Value must be greater than or equal to 0."));
    }
    Ok(())
}

/// Empty strings are treated as "no email".
fn validate_optional_email(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(invalid("email", "Email must be a valid email address."))
    }
}

/// Blank clears the avatar.
fn validate_optional_url(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() || value.validate_url() {
        Ok(())
    } else {
        Err(invalid("url", "Avatar URL must be an absolute URL."))
    }
}

fn default_status() -> String {
    ContactStatus::Lead.as_str().to_string()
}

fn default_source() -> String {
    ContactSource::Other.as_str().to_string()
}

fn default_category() -> String {
    NoteCategory::Personal.as_str().to_string()
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

// ============================================================================
// Contacts
// ============================================================================

/// Body of `POST /contacts` and `PUT /contacts/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required and must be at most 200 characters."))]
    pub name: String,

    #[validate(
        length(max = 256, message = "Email must be at most 256 characters."),
        custom(function = "validate_optional_email")
    )]
    pub email: Option<String>,

    #[validate(length(max = 200, message = "Company must be at most 200 characters."))]
    pub company: Option<String>,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters."))]
    pub phone: Option<String>,

    #[serde(default = "default_status")]
    #[validate(custom(function = "validate_contact_status"))]
    pub status: String,

    #[serde(default = "default_source")]
    #[validate(custom(function = "validate_contact_source"))]
    pub source: String,

    #[validate(custom(function = "validate_non_negative"))]
    pub value: Option<Decimal>,

    #[validate(length(max = 10000, message = "Notes must be at most 10000 characters."))]
    pub notes: Option<String>,

    /// Only read on update. New contacts are never favorites.
    #[serde(default)]
    pub is_favorite: bool,
}

/// `GET /contacts` query string.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactListParams {
    #[serde(default = "default_page_number", alias = "page")]
    pub page_number: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: i64,
    pub search: Option<String>,
    #[serde(alias = "sortBy")]
    pub sort_by: Option<String>,
}

impl ContactListParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page_number, self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkDeleteRequest {
    #[validate(length(min = 1, message = "At least one contact id is required."))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SeedContactsRequest {
    #[validate(range(min = 1, max = 100, message = "Count must be between 1 and 100."))]
    pub count: i32,
}

// ============================================================================
// Notes
// ============================================================================

/// Body of `POST /notes` and `PUT /notes/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NoteRequest {
    #[validate(length(min = 1, max = 200, message = "Title is required and must be at most 200 characters."))]
    pub title: String,

    #[validate(length(min = 1, max = 10000, message = "Content is required and must be at most 10000 characters."))]
    pub content: String,

    #[serde(default = "default_category")]
    #[validate(custom(function = "validate_note_category"))]
    pub category: String,

    #[serde(default)]
    pub is_pinned: bool,
}

// ============================================================================
// Authentication
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        email(message = "Email must be a valid email address."),
        length(max = 256, message = "Email must be at most 256 characters.")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters."))]
    pub password: String,

    #[validate(length(max = 255, message = "First name must be at most 255 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name must be at most 255 characters."))]
    pub last_name: Option<String>,
}

/// The username is the account email.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,

    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required."))]
    pub refresh_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Email must be a valid email address."))]
    pub email: String,

    #[validate(length(min = 1, message = "Captcha token is required."))]
    pub captcha_token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,

    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters."))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required."))]
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required."))]
    pub current_password: String,

    #[validate(length(min = 6, max = 255, message = "Password must be at least 6 characters."))]
    pub new_password: String,
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 255, message = "First name must be at most 255 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name must be at most 255 characters."))]
    pub last_name: Option<String>,

    #[validate(length(max = 20, message = "Phone number must be at most 20 characters."))]
    pub phone_number: Option<String>,

    #[validate(length(max = 1000, message = "Bio must be at most 1000 characters."))]
    pub bio: Option<String>,

    #[validate(
        custom(function = "validate_optional_url"),
        length(max = 500, message = "Avatar URL must be at most 500 characters.")
    )]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeleteAccountRequest {
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

// ============================================================================
// Admin
// ============================================================================

/// `GET /admin/users` query string.
#[derive(Debug, Clone, Deserialize)]
pub struct UserListParams {
    #[serde(default = "default_page_number", alias = "page")]
    pub page_number: i64,
    #[serde(default = "default_page_size", alias = "pageSize")]
    pub page_size: i64,
    pub search: Option<String>,
}

impl UserListParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery::new(self.page_number, self.page_size)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        email(message = "Email must be a valid email address."),
        length(max = 256, message = "Email must be at most 256 characters.")
    )]
    pub email: String,

    #[validate(length(max = 255, message = "First name must be at most 255 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 255, message = "Last name must be at most 255 characters."))]
    pub last_name: Option<String>,
}

/// Optional body of `POST /admin/users/{id}/lock`. Omitted means indefinitely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockUserRequest {
    pub lockout_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Role is required."))]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Name is required and must be at most 50 characters."))]
    pub name: String,

    #[validate(length(max = 200, message = "Description must be at most 200 characters."))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be between 1 and 50 characters."))]
    pub name: Option<String>,

    #[validate(length(max = 200, message = "Description must be at most 200 characters."))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetPermissionsRequest {
    pub permissions: Vec<String>,
}

// ============================================================================
// Demo
// ============================================================================

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SwitchRoleRequest {
    #[validate(length(min = 1, message = "Role is required."))]
    pub role: String,
}
