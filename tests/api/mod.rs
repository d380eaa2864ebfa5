mod admin_tests;
mod auth_tests;
mod contact_tests;
mod health_tests;
mod middleware_tests;
mod user_tests;
