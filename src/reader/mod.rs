//! Interactive reader: library, book and topic screens

mod app;
mod fetch;
mod state;
mod view;

pub use app::Reader;
pub use state::{CONTINUE_LABEL, START_LABEL, TOPIC_ERROR};
