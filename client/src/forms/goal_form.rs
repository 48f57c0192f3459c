//! Goal create/edit payloads.
//!
//! Create sends every field with defaults filled in. Edit is sparse: only
//! fields that are set travel, and the server treats a missing field as
//! "unchanged", never as "clear".

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use shared::Goal;

use crate::services::multipart::{FilePart, MultipartForm};

/// Image attached to a goal
#[derive(Debug, Clone, PartialEq)]
pub enum GoalImage {
    /// Image already stored server-side (relative path or resolved URL)
    Reference(String),
    /// New image to upload
    Upload(FilePart),
}

impl GoalImage {
    pub fn upload(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        GoalImage::Upload(FilePart {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        })
    }

    /// Read an image file from disk, guessing its content type from the extension
    pub async fn upload_from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::upload(file_name, content_type_for(path), bytes))
    }

    fn append_to(self, form: MultipartForm, uploads_url: &str) -> MultipartForm {
        match self {
            GoalImage::Reference(reference) => {
                form.text("goal_image", relative_image_path(uploads_url, &reference))
            }
            GoalImage::Upload(file) => form.file("goal_image", file),
        }
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Input for creating a goal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalDraft {
    pub goal_name: String,
    pub goal_description: String,
    pub goal_amount: Option<f64>,
    pub amount_raised: Option<f64>,
    pub goal_date: Option<DateTime<Utc>>,
    pub goal_image: Option<GoalImage>,
}

impl GoalDraft {
    pub fn new(goal_name: impl Into<String>, goal_amount: f64) -> Self {
        Self {
            goal_name: goal_name.into(),
            goal_amount: Some(goal_amount),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.goal_description = description.into();
        self
    }

    pub fn raised(mut self, amount_raised: f64) -> Self {
        self.amount_raised = Some(amount_raised);
        self
    }

    /// Target date, taken as midnight UTC like a browser date input
    pub fn due(mut self, date: NaiveDate) -> Self {
        self.goal_date = Some(midnight_utc(date));
        self
    }

    pub fn image(mut self, image: GoalImage) -> Self {
        self.goal_image = Some(image);
        self
    }

    /// Full form for `POST /goals/add`
    pub fn into_form(self, user_id: &str, uploads_url: &str) -> MultipartForm {
        let amount = match self.goal_amount {
            Some(amount) if amount != 0.0 => amount.to_string(),
            _ => "0".to_string(),
        };
        let raised = self
            .amount_raised
            .map(|r| r.to_string())
            .unwrap_or_else(|| "0".to_string());
        let date = self.goal_date.map(iso_timestamp).unwrap_or_default();

        let form = MultipartForm::new()
            .text("user_id", user_id)
            .text("goal_name", self.goal_name)
            .text("goal_description", self.goal_description)
            .text("goal_amount", amount)
            .text("amount_raised", raised)
            .text("goal_date", date);

        match self.goal_image {
            Some(image) => image.append_to(form, uploads_url),
            None => form.text("goal_image", ""),
        }
    }
}

/// Partial update for `PUT /goals/edit/:id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalPatch {
    pub id: Option<i64>,
    pub goal_name: Option<String>,
    pub goal_description: Option<String>,
    pub goal_amount: Option<f64>,
    pub amount_raised: Option<f64>,
    pub goal_date: Option<DateTime<Utc>>,
    pub goal_image: Option<GoalImage>,
}

impl GoalPatch {
    pub fn new(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.goal_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.goal_description = Some(description.into());
        self
    }

    pub fn amount(mut self, amount: f64) -> Self {
        self.goal_amount = Some(amount);
        self
    }

    pub fn raised(mut self, amount_raised: f64) -> Self {
        self.amount_raised = Some(amount_raised);
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.goal_date = Some(midnight_utc(date));
        self
    }

    pub fn image(mut self, image: GoalImage) -> Self {
        self.goal_image = Some(image);
        self
    }

    /// Sparse form: `user_id` plus whatever is set. Empty strings count as unset.
    pub fn into_form(self, user_id: &str, uploads_url: &str) -> MultipartForm {
        let form = MultipartForm::new()
            .text("user_id", user_id)
            .text_opt("goal_name", self.goal_name.filter(|n| !n.is_empty()))
            .text_opt(
                "goal_description",
                self.goal_description.filter(|d| !d.is_empty()),
            )
            .text_opt("goal_amount", self.goal_amount.map(|a| a.to_string()))
            .text_opt("amount_raised", self.amount_raised.map(|r| r.to_string()))
            .text_opt("goal_date", self.goal_date.map(iso_timestamp));

        match self.goal_image {
            Some(GoalImage::Reference(reference)) if reference.is_empty() => form,
            Some(image) => image.append_to(form, uploads_url),
            None => form,
        }
    }
}

impl From<&Goal> for GoalPatch {
    /// Patch resubmitting every field the goal currently has
    fn from(goal: &Goal) -> Self {
        Self {
            id: goal.id,
            goal_name: Some(goal.goal_name.clone()),
            goal_description: Some(goal.goal_description.clone()),
            goal_amount: goal.goal_amount,
            amount_raised: goal.amount_raised,
            goal_date: goal.goal_date.as_deref().and_then(parse_goal_date),
            goal_image: goal.goal_image.clone().map(GoalImage::Reference),
        }
    }
}

/// `2025-06-01T00:00:00.000Z`
pub fn iso_timestamp(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Accepts full RFC 3339 timestamps or bare `YYYY-MM-DD` dates
fn parse_goal_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(midnight_utc)
}

/// Prefix a server-relative image path with the uploads base URL.
///
/// Already absolute URLs are returned untouched.
pub fn resolve_image_url(uploads_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!("{}/{}", uploads_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Inverse of [`resolve_image_url`] for references pointing into the uploads base
pub fn relative_image_path(uploads_url: &str, reference: &str) -> String {
    let prefix = format!("{}/", uploads_url.trim_end_matches('/'));
    reference
        .strip_prefix(&prefix)
        .unwrap_or(reference)
        .to_string()
}
