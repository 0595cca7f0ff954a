//! JSON types exchanged with the textbook backend

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A textbook category
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Image path relative to the API root
    #[serde(default)]
    pub image: Option<String>,
}

/// Topic entry inside a textbook listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct TopicSummary {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
}

/// A textbook and its table of contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Textbook {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Owning category id
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub topics: Vec<TopicSummary>,
}

/// One page of textbook content
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Topic {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// The signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ProgressStatus {
    #[serde(default)]
    pub exists: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct UserRating {
    #[serde(rename = "userRating", default)]
    pub user_rating: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RoleCheck {
    #[serde(rename = "isAdmin", default)]
    pub is_admin: bool,
}

#[derive(Debug, Serialize)]
pub(super) struct StartProgress<'a> {
    pub user: &'a str,
    pub textbook: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct IncreaseProgress<'a> {
    pub user_id: &'a str,
    pub textbook_id: &'a str,
    pub topic_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RateRequest<'a> {
    pub textbook_id: &'a str,
    pub rating: u8,
}

/// Fields submitted when creating or editing a category
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    /// Local image file to upload
    pub image: Option<PathBuf>,
}
