//! Background requests
//!
//! Each request runs as its own task on the tokio runtime and reports back
//! over an unbounded channel that the event loop drains between frames.

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::state::{Fetch, FetchEvent, Payload, Request};
use crate::api::ApiClient;

/// Spawns requests and hands their results to the event loop
pub struct Fetcher {
    api: ApiClient,
    rt: Handle,
    tx: UnboundedSender<FetchEvent>,
}

impl Fetcher {
    pub fn new(api: ApiClient, rt: Handle) -> (Self, UnboundedReceiver<FetchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { api, rt, tx }, rx)
    }

    pub fn is_signed_in(&self) -> bool {
        self.api.is_signed_in()
    }

    /// Start a request in the background
    pub fn dispatch(&self, fetch: Fetch) {
        tracing::debug!(request = ?fetch.request, generation = ?fetch.generation, "dispatch");
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.rt.spawn(async move {
            run(&api, fetch, &tx).await;
        });
    }
}

fn send(tx: &UnboundedSender<FetchEvent>, generation: Option<u64>, payload: Payload) {
    // The receiver is gone only when the reader is shutting down
    let _ = tx.send(FetchEvent::new(generation, payload));
}

fn failed(what: &'static str, error: impl std::fmt::Display) -> Payload {
    Payload::Failed {
        what,
        message: error.to_string(),
    }
}

/// Perform one request and report every result it produces
pub(super) async fn run(api: &ApiClient, fetch: Fetch, tx: &UnboundedSender<FetchEvent>) {
    let generation = fetch.generation;
    let payload = match fetch.request {
        Request::Categories => match api.categories().await {
            Ok(categories) => Payload::Categories(categories),
            Err(e) => failed("categories", e),
        },
        Request::Textbooks => match api.textbooks().await {
            Ok(textbooks) => Payload::Textbooks(textbooks),
            Err(e) => failed("textbooks", e),
        },
        Request::Textbook(id) => match api.textbook(&id).await {
            Ok(textbook) => Payload::Textbook(textbook),
            Err(e) => failed("textbook", e),
        },
        Request::Topic { textbook_id, index } => match api.topic(&textbook_id, index).await {
            Ok(topic) => Payload::Topic(topic),
            Err(e) => Payload::TopicFailed(e.to_string()),
        },
        Request::Profile => match api.profile().await {
            Ok(profile) => Payload::Profile {
                user_id: profile.id,
            },
            Err(e) => failed("profile", e),
        },
        Request::ProgressFlags {
            user_id,
            textbook_ids,
        } => {
            // One at a time; a failed check counts as not started
            for textbook_id in textbook_ids {
                let exists = match api.progress_exists(&user_id, &textbook_id).await {
                    Ok(exists) => exists,
                    Err(e) => {
                        tracing::warn!(textbook = %textbook_id, error = %e, "progress check failed");
                        false
                    }
                };
                send(
                    tx,
                    generation,
                    Payload::Progress {
                        textbook_id,
                        exists,
                    },
                );
            }
            return;
        }
        Request::UserRating(textbook_id) => match api.user_rating(&textbook_id).await {
            Ok(rating) => Payload::UserRating {
                textbook_id,
                rating,
            },
            Err(e) => failed("rating", e),
        },
        Request::StartProgress {
            user_id,
            textbook_id,
        } => match api.start_progress(&user_id, &textbook_id).await {
            Ok(()) => Payload::Done("start progress"),
            Err(e) => failed("start progress", e),
        },
        Request::IncreaseProgress {
            user_id,
            textbook_id,
            topic_id,
        } => match api
            .increase_progress(&user_id, &textbook_id, topic_id.as_deref())
            .await
        {
            Ok(()) => Payload::Done("increase progress"),
            Err(e) => failed("increase progress", e),
        },
        Request::Rate {
            textbook_id,
            rating,
        } => match api.rate(&textbook_id, rating).await {
            Ok(()) => Payload::Rated {
                textbook_id,
                rating,
            },
            Err(e) => failed("rate", e),
        },
    };
    send(tx, generation, payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    #[tokio::test]
    async fn test_signed_out_requests_report_failure() {
        let api = ApiClient::new("http://127.0.0.1:9", &Session::ephemeral(None)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        run(
            &api,
            Fetch {
                request: Request::Profile,
                generation: None,
            },
            &tx,
        )
        .await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event.payload, Payload::Failed { what: "profile", .. }));

        run(
            &api,
            Fetch {
                request: Request::Rate {
                    textbook_id: "b1".into(),
                    rating: 5,
                },
                generation: Some(3),
            },
            &tx,
        )
        .await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.generation, Some(3));
        assert!(matches!(event.payload, Payload::Failed { what: "rate", .. }));
    }

    #[tokio::test]
    async fn test_progress_flags_default_to_not_started() {
        let api = ApiClient::new("http://127.0.0.1:9", &Session::ephemeral(None)).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        run(
            &api,
            Fetch {
                request: Request::ProgressFlags {
                    user_id: "u1".into(),
                    textbook_ids: vec!["b1".into(), "b2".into()],
                },
                generation: Some(1),
            },
            &tx,
        )
        .await;

        for id in ["b1", "b2"] {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.generation, Some(1));
            assert_eq!(
                event.payload,
                Payload::Progress {
                    textbook_id: id.into(),
                    exists: false
                }
            );
        }
    }
}
