// src/models/video.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use url::Url;
use validator::Validate;

use crate::config::XP_VALUES;

/// Represents the 'videos' table in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub title: String,
    /// Link to the hosted video.
    pub url: String,
    pub summary: String,
    /// XP granted the first time a user finishes the video.
    pub xp_value: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub created_by: Option<i64>,
}

/// DTO for creating a new video entry.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_create_xp))]
pub struct CreateVideoRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: String,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub url: String,
    #[validate(length(max = 2000))]
    pub summary: Option<String>,
    pub xp_value: i32,
}

/// DTO for updating a video entry. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_update_xp))]
pub struct UpdateVideoRequest {
    #[validate(length(min = 1, max = 100))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500), custom(function = validate_url_string))]
    pub url: Option<String>,
    #[validate(length(max = 2000))]
    pub summary: Option<String>,
    pub xp_value: Option<i32>,
}

impl UpdateVideoRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none() && self.summary.is_none() && self.xp_value.is_none()
    }
}

/// Validates that a string is a correctly formatted http(s) URL.
fn validate_url_string(url: &str) -> Result<(), validator::ValidationError> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_url")),
    }
}

fn validate_xp_value(xp_value: i32) -> Result<(), validator::ValidationError> {
    if XP_VALUES.contains(&xp_value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_xp_value"))
    }
}

fn validate_create_xp(req: &CreateVideoRequest) -> Result<(), validator::ValidationError> {
    validate_xp_value(req.xp_value)
}

fn validate_update_xp(req: &UpdateVideoRequest) -> Result<(), validator::ValidationError> {
    req.xp_value.map_or(Ok(()), validate_xp_value)
}
