//! Message templates. Each returns a ready [`EmailMessage`].

use super::layout::{html_escape, EmailLayout};
use super::EmailMessage;
use crate::config::EmailSettings;

fn render(
    settings: &EmailSettings,
    to: &str,
    subject: String,
    html: String,
    text: String,
) -> EmailMessage {
    let layout = EmailLayout::new(&settings.app_name);
    EmailMessage {
        to: to.to_string(),
        subject,
        html_body: layout.render_html(&html),
        text_body: Some(layout.render_text(&text)),
    }
}

fn support_line(settings: &EmailSettings) -> (String, String) {
    match settings.support_email.as_deref() {
        Some(support) => (
            format!(
                r#"<p style="font-size:13px; color:#71717a;">Need help? Contact <a href="mailto:{0}">{0}</a>.</p>"#,
                html_escape(support)
            ),
            format!("\nNeed help? Contact {}.", support),
        ),
        None => (String::new(), String::new()),
    }
}

pub fn password_reset(settings: &EmailSettings, to: &str, raw_token: &str) -> EmailMessage {
    let url = settings.frontend_url(&format!("/reset-password?token={}", raw_token));
    let (support_html, support_text) = support_line(settings);

    render(
        settings,
        to,
        format!("Reset your {} password", settings.app_name),
        format!(
            "<p>We received a request to reset your password.</p>{}\
             <p>If you did not ask for this, you can ignore this email.</p>{}",
            EmailLayout::button(&url, "Reset password"),
            support_html
        ),
        format!(
            "We received a request to reset your password.\n\nReset it here: {}\n\n\
             If you did not ask for this, you can ignore this email.{}",
            url, support_text
        ),
    )
}

pub fn email_verification(settings: &EmailSettings, to: &str, raw_token: &str) -> EmailMessage {
    let url = settings.frontend_url(&format!("/verify-email?token={}", raw_token));
    let (support_html, support_text) = support_line(settings);

    render(
        settings,
        to,
        format!("Verify your {} email", settings.app_name),
        format!(
            "<p>Welcome to {}! Please confirm your email address.</p>{}{}",
            html_escape(&settings.app_name),
            EmailLayout::button(&url, "Verify email"),
            support_html
        ),
        format!(
            "Welcome to {}! Please confirm your email address.\n\nVerify here: {}{}",
            settings.app_name, url, support_text
        ),
    )
}

/// Sent to users created by an admin. The link sets their first password.
pub fn invitation(settings: &EmailSettings, to: &str, raw_token: &str) -> EmailMessage {
    let url = settings.frontend_url(&format!("/reset-password?token={}&invited=1", raw_token));
    let (support_html, support_text) = support_line(settings);

    render(
        settings,
        to,
        format!("You have been invited to {}", settings.app_name),
        format!(
            "<p>An account was created for you on {}. Choose a password to get started.</p>{}{}",
            html_escape(&settings.app_name),
            EmailLayout::button(&url, "Set password"),
            support_html
        ),
        format!(
            "An account was created for you on {}. Choose a password to get started.\n\n{}{}",
            settings.app_name, url, support_text
        ),
    )
}
