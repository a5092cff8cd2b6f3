use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ReportReason;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Post {
    pub post_id: i32,
    pub title: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub author_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Comment {
    pub comment_id: i32,
    pub post_id: i32,
    pub author_id: i32,
    /// Commento padre per le risposte annidate
    pub parent_id: Option<i32>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Report {
    pub report_id: i32,
    pub post_id: i32,
    pub reporter_id: i32,
    pub reason: ReportReason,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UploadedImage {
    pub image_id: i32,
    pub file_path: String,
    pub created_at: DateTime<Utc>,
}
