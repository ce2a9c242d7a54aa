//! Support web form
//!
//! `GET /` serves the form, `POST /support` runs the personas and renders
//! their replies under fixed headings, `GET /health` is for probes.

use crate::backend::{SupportError, SupportSettings};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use pulldown_cmark::{html, Event, Options, Parser};
use solace_agent::{Credential, ImageUpload, SupportReport, SupportRequest};
use solace_llm::ErrorKind;
use std::sync::Arc;

/// Upload limit for one form submission
pub const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub const MISSING_KEY: &str = "Please enter your API key first";
pub const MISSING_INPUT: &str = "Please share your feelings or upload screenshots to get help.";
pub const GATE_FAILED: &str = "Failed to initialize agents. Please check your API key.";
pub const ANALYSIS_FAILED: &str = "An error occurred during analysis. Please check the logs for details.";
const BAD_FORM: &str = "The form could not be read. Please try again.";

pub fn router(settings: SupportSettings) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            "/support",
            post(support).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route("/health", get(health))
        .with_state(Arc::new(settings))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn index() -> Html<String> {
    Html(render_page(None, None, ""))
}

#[derive(Debug, Default)]
struct SupportForm {
    api_key: String,
    feelings: String,
    uploads: Vec<ImageUpload>,
}

async fn read_form(mut multipart: Multipart) -> Result<SupportForm, axum::extract::multipart::MultipartError> {
    let mut form = SupportForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "api_key" => form.api_key = field.text().await?,
            "feelings" => form.feelings = field.text().await?,
            "screenshots" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                // Browsers send an empty part when no file was picked
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                form.uploads.push(ImageUpload::new(file_name, content_type, bytes.to_vec()));
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn support(
    State(settings): State<Arc<SupportSettings>>,
    multipart: Multipart,
) -> (StatusCode, Html<String>) {
    let form = match read_form(multipart).await {
        Ok(form) => form,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read support form");
            return respond(StatusCode::BAD_REQUEST, Banner::Error(BAD_FORM), None, "");
        }
    };

    let credential = match Credential::new(form.api_key) {
        Ok(credential) => credential,
        Err(_) => {
            return respond(StatusCode::BAD_REQUEST, Banner::Warning(MISSING_KEY), None, &form.feelings);
        }
    };

    let request = SupportRequest {
        text: Some(form.feelings.clone()),
        uploads: form.uploads,
    };

    match settings.run(&credential, &request).await {
        Ok(report) => respond(StatusCode::OK, Banner::None, Some(&report), &form.feelings),
        Err(SupportError::Gate(e)) => {
            tracing::error!(error = %e, "error initializing agents");
            respond(StatusCode::INTERNAL_SERVER_ERROR, Banner::Error(GATE_FAILED), None, &form.feelings)
        }
        Err(SupportError::Analysis(e)) if e.kind() == ErrorKind::InputMissing => {
            respond(StatusCode::BAD_REQUEST, Banner::Warning(MISSING_INPUT), None, &form.feelings)
        }
        Err(SupportError::Analysis(e)) => {
            tracing::error!(error = %e, "error during analysis");
            respond(StatusCode::BAD_GATEWAY, Banner::Error(ANALYSIS_FAILED), None, &form.feelings)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Banner {
    None,
    Warning(&'static str),
    Error(&'static str),
}

fn respond(
    status: StatusCode,
    banner: Banner,
    report: Option<&SupportReport>,
    feelings: &str,
) -> (StatusCode, Html<String>) {
    (status, Html(render_page(Some(banner), report, feelings)))
}

fn render_page(banner: Option<Banner>, report: Option<&SupportReport>, feelings: &str) -> String {
    let banner = match banner {
        Some(Banner::Warning(text)) => format!(r#"<div class="banner warning">{}</div>"#, escape_html(text)),
        Some(Banner::Error(text)) => format!(r#"<div class="banner error">{}</div>"#, escape_html(text)),
        Some(Banner::None) | None => String::new(),
    };

    let results = report.map(render_report).unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Emotional Support</title>
<style>
body {{ font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }}
textarea, input {{ width: 100%; box-sizing: border-box; margin-bottom: 1rem; }}
.banner {{ padding: 0.75rem 1rem; border-radius: 4px; margin: 1rem 0; }}
.warning {{ background: #fff4ce; }}
.error {{ background: #fde7e9; }}
section {{ border-top: 1px solid #ddd; margin-top: 1.5rem; }}
</style>
</head>
<body>
<h1>Emotional Support Chatbot</h1>
<p>Share your feelings and chat screenshots, and we'll provide emotional support to you in this harsh time.</p>
{banner}
<form method="post" action="/support" enctype="multipart/form-data">
<label for="api_key">Gemini API key</label>
<input type="password" id="api_key" name="api_key" autocomplete="off">
<label for="feelings">How are you feeling?</label>
<textarea id="feelings" name="feelings" rows="6" placeholder="Tell us your story...">{feelings}</textarea>
<label for="screenshots">Upload your chats (optional)</label>
<input type="file" id="screenshots" name="screenshots" accept=".jpg,.jpeg,.png,image/jpeg,image/png" multiple>
<button type="submit">Get Recovery Plan</button>
</form>
{results}
</body>
</html>
"#,
        banner = banner,
        feelings = escape_html(feelings),
        results = results,
    )
}

fn render_report(report: &SupportReport) -> String {
    let mut out = String::from("<h2>Your personalized recovery plan</h2>\n");
    for response in &report.responses {
        out.push_str("<section>\n<h3>");
        out.push_str(&escape_html(&response.heading));
        out.push_str("</h3>\n");
        out.push_str(&markdown_to_html(&response.content));
        out.push_str("</section>\n");
    }
    out
}

/// Render model markdown; raw HTML in the reply is shown as text
fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            other => other,
        });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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
