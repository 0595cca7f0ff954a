//! Textbook backend API

mod client;
mod types;

pub use client::ApiClient;
pub use types::{Category, CategoryForm, Profile, Textbook, Topic, TopicSummary};
