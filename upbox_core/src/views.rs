//! Server-rendered pages.

use std::fmt::Write;

use chrono::Local;

use crate::auth::FlashMessage;
use crate::files::StoredFile;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; background: #f4f5f7; margin: 0; }
.container { max-width: 860px; margin: 0 auto; padding: 24px; }
header { display: flex; justify-content: space-between; align-items: center; }
.header-actions a { margin-left: 12px; }
.login-box, section { background: #fff; border-radius: 8px; padding: 24px; margin-top: 20px; }
.success, .error { padding: 12px; border-radius: 6px; margin-top: 16px; }
.success { background: #e3f6e8; color: #1d6b34; }
.error { background: #fbe4e4; color: #8a1f1f; }
.file-item { display: flex; align-items: center; gap: 12px; padding: 8px 0; border-bottom: 1px solid #eee; }
.file-info { flex: 1; }
.file-meta { color: #666; font-size: 0.85em; }
.form-group { margin-bottom: 12px; }
"#;

/// Listing date, in server local time: `Mar 7, 2025 14:05`.
pub const DATE_FORMAT: &str = "%b %-d, %Y %H:%M";

/// Dashboard state for one render.
#[derive(Debug, Default)]
pub struct DashboardView<'a> {
    pub flash: Option<FlashMessage>,
    pub files: &'a [StoredFile],
    pub settings: bool,
}

pub fn login_page(error: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str(r#"<div class="login-box"><h1>&#x1F510; File Upload Tool</h1>"#);
    body.push_str("<p>Please enter the password to access the upload tool</p>");
    if let Some(error) = error {
        let _ = write!(body, r#"<div class="error">{}</div>"#, escape_html(error));
    }
    body.push_str(
        r#"<form method="post" action="/login" class="login-form">
<input type="password" name="password" placeholder="Enter password" required autofocus>
<button type="submit">Login</button>
</form></div>"#,
    );
    layout(&body)
}

pub fn dashboard(view: &DashboardView<'_>) -> String {
    let mut body = String::new();
    body.push_str(
        r#"<header><h1>&#x1F4C1; File Upload Tool</h1><div class="header-actions">
<a href="/?settings=1">&#x2699;&#xFE0F; Settings</a><a href="/logout">Logout</a></div></header>"#,
    );

    if let Some(flash) = &view.flash {
        let _ = write!(
            body,
            r#"<div class="{}">{}</div>"#,
            flash.css_class(),
            escape_html(&flash.text)
        );
    }

    if view.settings {
        body.push_str(SETTINGS_SECTION);
    } else {
        body.push_str(UPLOAD_SECTION);
        render_files(&mut body, view.files);
    }

    layout(&body)
}

const SETTINGS_SECTION: &str = r#"<section class="password-change-section">
<h2>Settings</h2><h3>Change Password</h3>
<form method="post" action="/change_password" class="password-form">
<div class="form-group"><label for="current_password">Current Password:</label>
<input type="password" name="current_password" id="current_password" required></div>
<div class="form-group"><label for="new_password">New Password:</label>
<input type="password" name="new_password" id="new_password" required minlength="6"></div>
<div class="form-group"><label for="confirm_password">Confirm New Password:</label>
<input type="password" name="confirm_password" id="confirm_password" required minlength="6"></div>
<button type="submit">Change Password</button> <a href="/">Back to Files</a>
</form></section>"#;

const UPLOAD_SECTION: &str = r#"<section class="upload-section">
<h2>Upload Files</h2>
<p>Allowed types: HTML, SVG, Images (JPG, PNG, GIF, WebP), Markdown, Text files<br>
Maximum size: 10MB per file</p>
<form method="post" action="/upload" enctype="multipart/form-data" class="upload-form">
<input type="file" name="file" accept=".html,.svg,.jpg,.jpeg,.png,.gif,.webp,.md,.txt" required>
<button type="submit">Upload File</button>
</form></section>"#;

fn render_files(body: &mut String, files: &[StoredFile]) {
    body.push_str(r#"<section class="files-section"><h2>Uploaded Files</h2>"#);

    if files.is_empty() {
        body.push_str(r#"<p class="no-files">No files uploaded yet.</p></section>"#);
        return;
    }

    body.push_str(r#"<div class="files-grid">"#);
    for file in files {
        let name = escape_html(&file.name);
        let modified = file.modified_at.with_timezone(&Local).format(DATE_FORMAT);
        let _ = write!(
            body,
            r#"<div class="file-item">
<div class="file-icon" title="{label}">{icon}</div>
<div class="file-info"><a href="/content/{href}" target="_blank" class="file-name">{name}</a>
<div class="file-meta"><span class="file-size">{size}</span> &middot; <span class="file-date">{modified}</span></div></div>
<form method="post" action="/delete" class="delete-form" onsubmit="return confirm('Delete this file?')">
<input type="hidden" name="filename" value="{name}">
<button type="submit" title="Delete file">&#x1F5D1;&#xFE0F;</button></form>
</div>"#,
            label = file.category.label(),
            icon = file.category.icon(),
            href = escape_html(&encode_path_segment(&file.name)),
            name = name,
            size = file.formatted_size(),
            modified = modified,
        );
    }
    body.push_str("</div></section>");
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>UpBox - File Upload Tool</title>
<style>{STYLE}</style>
</head>
<body><div class="container">
{body}
</div></body>
</html>
"#
    )
}

/// Escapes text for element content and quoted attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encodes everything outside the unreserved set for a single URL path segment.
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            _ => {
                let _ = write!(encoded, "%{:02X}", byte);
            }
        }
    }
    encoded
}
