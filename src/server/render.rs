//! HTML pages served by the upload front end.

use crate::error::FollowbackError;
use crate::pipeline::ScanOutcome;

const STYLESHEET: &str =
    r#"<link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">"#;

const GENERIC_FAILURE: &str =
    "We could not process your file. Make sure you uploaded the .zip export exactly as the platform delivered it.";

const BACK_LINK: &str = r#"<a href="/" class="btn btn-secondary mt-4">Back to start</a>"#;

pub fn index_page(expected_extension: &str) -> String {
    let extension = escape_html(expected_extension);
    page(
        "Who doesn't follow me back?",
        &format!(
            r#"<h1 class="mb-3">Who doesn't follow me back?</h1>
<p class="text-muted">Upload the .{ext} export of your account data. It is processed on this server and deleted right after.</p>
<form action="/upload" method="post" enctype="multipart/form-data" class="mt-4">
  <input type="file" name="file" accept=".{ext}" class="form-control mb-3" required>
  <button type="submit" class="btn btn-dark">Check</button>
</form>"#,
            ext = extension
        ),
    )
}

pub fn outcome_page(outcome: &ScanOutcome) -> String {
    match outcome {
        ScanOutcome::AllFollowBack { .. } => page(
            "All good",
            &format!(
                r#"<h2 class="text-success mb-3">🎉 All good!</h2>
<p class="text-muted">Every account you follow follows you back.</p>
{}"#,
                BACK_LINK
            ),
        ),
        ScanOutcome::NotFollowingBack {
            accounts, artifact, ..
        } => {
            let items: String = accounts
                .iter()
                .map(|account| {
                    format!(
                        r#"<li class="list-group-item">@{}</li>"#,
                        escape_html(account.as_str())
                    )
                })
                .collect();

            page(
                "Accounts not following back",
                &format!(
                    r#"<h2 class="text-danger mb-3">👥 {count} accounts don't follow you back:</h2>
<ul class="list-group list-group-flush my-4">{items}</ul>
<a href="{url}" download class="btn btn-dark mt-4">📥 Download list (.txt)</a><br>
{back}"#,
                    count = accounts.len(),
                    items = items,
                    url = escape_html(&artifact.public_url()),
                    back = BACK_LINK
                ),
            )
        }
    }
}

/// Only input rejections are explained; every other failure gets the same
/// generic text so internal details never reach the browser.
pub fn error_page(error: &FollowbackError) -> String {
    let message = match error {
        FollowbackError::InvalidInput { reason } => format!("Upload rejected: {}.", reason),
        _ => GENERIC_FAILURE.to_string(),
    };

    page(
        "Error",
        &format!(
            r#"<h2 class="text-danger mb-3">❌ {}</h2>
{}"#,
            escape_html(&message),
            BACK_LINK
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{stylesheet}
</head>
<body>
<div class="container" style="max-width: 700px; margin: 50px auto; text-align: center;">
<div class="card p-5 shadow">
{body}
</div>
</div>
</body>
</html>
"#,
        title = escape_html(title),
        stylesheet = STYLESHEET,
        body = body
    )
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
