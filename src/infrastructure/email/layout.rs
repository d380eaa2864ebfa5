//! Shared HTML and plain-text frame for transactional emails. Styles are
//! inline so mail clients render them.

/// Escape text for HTML element and attribute content.
pub fn html_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone)]
pub struct EmailLayout {
    app_name: String,
}

impl EmailLayout {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Wrap `inner_html` in a full document with header and footer.
    /// `inner_html` is inserted as is.
    pub fn render_html(&self, inner_html: &str) -> String {
        let app = html_escape(&self.app_name);
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{app}</title>
</head>
<body style="margin:0; padding:0; background-color:#f4f4f5; font-family:-apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif;">
    <table role="presentation" width="100%" cellpadding="0" cellspacing="0" style="background-color:#f4f4f5;">
        <tr>
            <td align="center" style="padding:24px 16px;">
                <table role="presentation" width="600" cellpadding="0" cellspacing="0" style="max-width:600px; width:100%;">
                    <tr>
                        <td style="background-color:#18181b; padding:24px 32px; border-radius:8px 8px 0 0; text-align:center;">
                            <h1 style="margin:0; color:#ffffff; font-size:20px; font-weight:600;">{app}</h1>
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color:#ffffff; padding:32px; font-size:16px; line-height:1.6; color:#27272a;">
                            {inner_html}
                        </td>
                    </tr>
                    <tr>
                        <td style="background-color:#ffffff; padding:20px 32px 24px; border-top:1px solid #e4e4e7; border-radius:0 0 8px 8px; text-align:center; font-size:13px; color:#71717a;">
                            Sent by {app}
                        </td>
                    </tr>
                </table>
            </td>
        </tr>
    </table>
</body>
</html>"#
        )
    }

    pub fn render_text(&self, inner_text: &str) -> String {
        let rule = "-".repeat(32);
        format!(
            "{app}\n{rule}\n\n{inner_text}\n\n{rule}\nSent by {app}\n",
            app = self.app_name
        )
    }

    /// Call-to-action link styled as a button.
    pub fn button(url: &str, label: &str) -> String {
        format!(
            r#"<table role="presentation" cellpadding="0" cellspacing="0" style="margin:24px 0;">
    <tr>
        <td align="center" style="border-radius:6px; background-color:#18181b;">
            <a href="{url}" target="_blank" style="display:inline-block; padding:12px 32px; color:#ffffff; text-decoration:none; font-size:15px; font-weight:600; border-radius:6px;">{label}</a>
        </td>
    </tr>
</table>"#,
            url = html_escape(url),
            label = html_escape(label)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_app_name_is_escaped() {
        let html = EmailLayout::new("<Acme>").render_html("<p>body</p>");
        assert!(html.contains("&lt;Acme&gt;"));
        assert!(!html.contains("<Acme>"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_button_escapes_url() {
        let button = EmailLayout::button("https://x.io/?a=1&b=2", "Go");
        assert!(button.contains("https://x.io/?a=1&amp;b=2"));
    }

    #[test]
    fn test_plain_text_frame() {
        let text = EmailLayout::new("Acme").render_text("Hello");
        assert!(text.starts_with("Acme\n"));
        assert!(text.contains("\n\nHello\n\n"));
        assert!(text.trim_end().ends_with("Sent by Acme"));
    }
}
