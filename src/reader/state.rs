//! Reader state and its reload triggers
//!
//! The state never performs I/O. Navigation, key actions and fetch results
//! return [`Effect`]s that the event loop carries out; results come back as
//! [`FetchEvent`]s. Every route change bumps a generation counter and
//! route-scoped requests are tagged with it, so a slow response for a page
//! the user already left is dropped instead of overwriting the current one.
//!
//! Reload triggers:
//! 1. route changed: fetch what the new screen shows
//! 2. session changed: fetch the profile (user id)
//! 3. topic or user resolved: record the topic as read, once per topic
//! 4. reload key: trigger 1 again for the current route

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::api::{Category, Textbook, Topic};
use crate::copy::CopyFeedback;
use crate::input::Action;
use crate::navigation::{next_route, prev_route, Route};
use crate::render::CodeRegion;

/// Shown in place of a topic that could not be fetched
pub const TOPIC_ERROR: &str = "Не удалось загрузить тему";
/// Library button for a book the user has started
pub const CONTINUE_LABEL: &str = "Продолжить";
/// Library button for a book the user has not started
pub const START_LABEL: &str = "Начать";

/// A backend call the event loop should make
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Categories,
    Textbooks,
    Textbook(String),
    Topic { textbook_id: String, index: usize },
    Profile,
    /// Progress flag for each listed textbook
    ProgressFlags { user_id: String, textbook_ids: Vec<String> },
    UserRating(String),
    StartProgress { user_id: String, textbook_id: String },
    IncreaseProgress {
        user_id: String,
        textbook_id: String,
        topic_id: Option<String>,
    },
    Rate { textbook_id: String, rating: u8 },
}

/// A request with the route generation it belongs to
///
/// `generation` is `None` for requests whose result matters regardless of
/// the screen (profile, progress updates, ratings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetch {
    pub request: Request,
    pub generation: Option<u64>,
}

/// Work for the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Fetch(Fetch),
    /// Put `code` on the clipboard, then report back with `copied`
    Copy { block_index: usize, code: String },
    Quit,
}

/// Result of a request
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Categories(Vec<Category>),
    Textbooks(Vec<Textbook>),
    Textbook(Textbook),
    Topic(Topic),
    TopicFailed(String),
    Profile { user_id: String },
    Progress { textbook_id: String, exists: bool },
    UserRating { textbook_id: String, rating: Option<u8> },
    Rated { textbook_id: String, rating: u8 },
    /// A request with nothing to report succeeded
    Done(&'static str),
    /// A request other than the topic failed
    Failed { what: &'static str, message: String },
}

/// A fetch result tagged with the generation of its request
#[derive(Debug, Clone, PartialEq)]
pub struct FetchEvent {
    pub generation: Option<u64>,
    pub payload: Payload,
}

impl FetchEvent {
    pub fn new(generation: Option<u64>, payload: Payload) -> Self {
        Self {
            generation,
            payload,
        }
    }
}

/// What the topic screen currently shows
#[derive(Debug, Clone, PartialEq)]
pub enum TopicView {
    Loading,
    Loaded(Topic),
    Failed(String),
}

/// Geometry of the last drawn frame, needed to scroll and pick code blocks
#[derive(Debug, Clone, Default)]
pub struct Viewport {
    /// Rows available for content
    pub height: usize,
    /// Content lines on the topic screen
    pub total_lines: usize,
    pub code_blocks: Vec<CodeRegion>,
}

/// Interactive reader state
pub struct ReaderState {
    route: Route,
    generation: u64,
    signed_in: bool,
    user_id: Option<String>,

    categories: Vec<Category>,
    textbooks: Vec<Textbook>,
    progress: HashMap<String, bool>,
    textbook: Option<Textbook>,
    topic: TopicView,
    rating: Option<u8>,
    /// (textbook, topic index) pairs already recorded as read
    progress_sent: HashSet<(String, usize)>,
    /// Book opened before the profile resolved; started once it does
    pending_start: Option<String>,

    copy: CopyFeedback,
    /// First visible line on the topic screen
    scroll: usize,
    /// Highlighted row on the library and book screens
    cursor: usize,
    /// Position in `Viewport::code_blocks` of the focused code block
    selected_block: Option<usize>,
    status: Option<String>,
}

impl ReaderState {
    pub fn new(signed_in: bool, copy_feedback: Duration) -> Self {
        Self {
            route: Route::Library,
            generation: 0,
            signed_in,
            user_id: None,
            categories: Vec::new(),
            textbooks: Vec::new(),
            progress: HashMap::new(),
            textbook: None,
            topic: TopicView::Loading,
            rating: None,
            progress_sent: HashSet::new(),
            pending_start: None,
            copy: CopyFeedback::new(copy_feedback),
            scroll: 0,
            cursor: 0,
            selected_block: None,
            status: None,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn textbook(&self) -> Option<&Textbook> {
        self.textbook.as_ref()
    }

    pub fn topic(&self) -> &TopicView {
        &self.topic
    }

    pub fn rating(&self) -> Option<u8> {
        self.rating
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Block index showing the "copied" label
    pub fn copied(&self, now: Instant) -> Option<usize> {
        self.copy.active(now)
    }

    /// Block index of the focused code block
    pub fn selected_block(&self, viewport: &Viewport) -> Option<usize> {
        self.selected_block
            .and_then(|i| viewport.code_blocks.get(i))
            .map(|region| region.block_index)
    }

    /// Books of a category, in listing order
    pub fn books_in(&self, category_id: &str) -> Vec<&Textbook> {
        self.textbooks
            .iter()
            .filter(|book| book.category.as_deref() == Some(category_id))
            .collect()
    }

    /// Books as listed on the library screen: grouped by category order
    pub fn library_books(&self) -> Vec<&Textbook> {
        self.categories
            .iter()
            .flat_map(|category| self.books_in(&category.id))
            .collect()
    }

    pub fn progress_label(&self, textbook_id: &str) -> &'static str {
        if self.progress.get(textbook_id).copied().unwrap_or(false) {
            CONTINUE_LABEL
        } else {
            START_LABEL
        }
    }

    /// The loaded textbook, if it belongs to the current route
    fn route_textbook(&self) -> Option<&Textbook> {
        self.textbook
            .as_ref()
            .filter(|book| Some(book.id.as_str()) == self.route.textbook_id())
    }

    /// Number of topics in the current textbook, when it is loaded
    fn topic_total(&self, textbook_id: &str) -> Option<usize> {
        self.textbook
            .as_ref()
            .filter(|book| book.id == textbook_id)
            .map(|book| book.topics.len())
    }

    fn scoped(&self, request: Request) -> Effect {
        Effect::Fetch(Fetch {
            request,
            generation: Some(self.generation),
        })
    }

    fn unscoped(request: Request) -> Effect {
        Effect::Fetch(Fetch {
            request,
            generation: None,
        })
    }

    /// Switch screens (trigger 1)
    pub fn navigate(&mut self, route: Route) -> Vec<Effect> {
        tracing::info!(route = %route, "navigate");
        self.route = route;
        self.generation += 1;
        self.scroll = 0;
        self.cursor = 0;
        self.selected_block = None;
        self.status = None;
        self.copy = CopyFeedback::new(self.copy.duration());
        self.route_requests()
    }

    /// Fetch everything the current screen shows (triggers 1 and 4)
    fn route_requests(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        match self.route.clone() {
            Route::Library => {
                effects.push(self.scoped(Request::Categories));
                effects.push(self.scoped(Request::Textbooks));
            }
            Route::Book { textbook_id } => {
                self.rating = None;
                effects.push(self.scoped(Request::Textbook(textbook_id.clone())));
                if self.signed_in {
                    effects.push(self.scoped(Request::UserRating(textbook_id)));
                }
            }
            Route::Topic { textbook_id, index } => {
                self.topic = TopicView::Loading;
                effects.push(self.scoped(Request::Topic {
                    textbook_id: textbook_id.clone(),
                    index,
                }));
                if self.topic_total(&textbook_id).is_none() {
                    effects.push(self.scoped(Request::Textbook(textbook_id)));
                }
            }
        }
        effects
    }

    /// Re-issue the current screen's requests (trigger 4)
    pub fn reload(&mut self) -> Vec<Effect> {
        tracing::info!(route = %self.route, "reload");
        self.generation += 1;
        self.status = None;
        self.route_requests()
    }

    /// Session established or dropped (trigger 2)
    pub fn session_changed(&mut self, signed_in: bool) -> Vec<Effect> {
        self.signed_in = signed_in;
        self.user_id = None;
        self.progress.clear();
        self.progress_sent.clear();
        if !signed_in {
            self.pending_start = None;
        }
        if signed_in {
            vec![Self::unscoped(Request::Profile)]
        } else {
            Vec::new()
        }
    }

    /// Record the open topic as read once both it and the user are known (trigger 3)
    fn topic_or_user_resolved(&mut self) -> Vec<Effect> {
        let (Some(user_id), Route::Topic { textbook_id, index }, TopicView::Loaded(topic)) =
            (&self.user_id, &self.route, &self.topic)
        else {
            return Vec::new();
        };

        if !self.progress_sent.insert((textbook_id.clone(), *index)) {
            return Vec::new();
        }

        vec![Self::unscoped(Request::IncreaseProgress {
            user_id: user_id.clone(),
            textbook_id: textbook_id.clone(),
            topic_id: topic.id.clone(),
        })]
    }

    /// Library progress flags once both the books and the user are known
    fn progress_flags(&self) -> Vec<Effect> {
        match (&self.user_id, &self.route) {
            (Some(user_id), Route::Library) if !self.textbooks.is_empty() => {
                vec![self.scoped(Request::ProgressFlags {
                    user_id: user_id.clone(),
                    textbook_ids: self.textbooks.iter().map(|b| b.id.clone()).collect(),
                })]
            }
            _ => Vec::new(),
        }
    }

    /// Apply a fetch result
    pub fn apply(&mut self, event: FetchEvent) -> Vec<Effect> {
        if let Some(generation) = event.generation {
            if generation != self.generation {
                tracing::debug!(
                    generation,
                    current = self.generation,
                    "dropping response for a previous screen"
                );
                return Vec::new();
            }
        }

        match event.payload {
            Payload::Categories(categories) => {
                self.categories = categories;
                Vec::new()
            }
            Payload::Textbooks(textbooks) => {
                self.textbooks = textbooks;
                self.progress_flags()
            }
            Payload::Textbook(textbook) => {
                if self.route.textbook_id() == Some(textbook.id.as_str()) {
                    self.textbook = Some(textbook);
                }
                Vec::new()
            }
            Payload::Topic(topic) => {
                self.topic = TopicView::Loaded(topic);
                self.topic_or_user_resolved()
            }
            Payload::TopicFailed(message) => {
                tracing::error!(route = %self.route, error = %message, "failed to fetch topic");
                self.topic = TopicView::Failed(TOPIC_ERROR.to_string());
                Vec::new()
            }
            Payload::Profile { user_id } => {
                tracing::info!(user = %user_id, "profile resolved");
                self.user_id = Some(user_id.clone());
                let mut effects: Vec<Effect> = self
                    .pending_start
                    .take()
                    .map(|textbook_id| {
                        tracing::debug!(textbook = %textbook_id, "starting deferred progress");
                        Self::unscoped(Request::StartProgress {
                            user_id,
                            textbook_id,
                        })
                    })
                    .into_iter()
                    .collect();
                effects.extend(self.topic_or_user_resolved());
                effects.extend(self.progress_flags());
                effects
            }
            Payload::Progress {
                textbook_id,
                exists,
            } => {
                self.progress.insert(textbook_id, exists);
                Vec::new()
            }
            Payload::UserRating {
                textbook_id,
                rating,
            } => {
                if self.route.textbook_id() == Some(textbook_id.as_str()) {
                    self.rating = rating;
                }
                Vec::new()
            }
            Payload::Rated {
                textbook_id,
                rating,
            } => {
                if self.route.textbook_id() == Some(textbook_id.as_str()) {
                    self.rating = Some(rating);
                    self.status = Some(format!("Оценка {rating} сохранена"));
                }
                Vec::new()
            }
            Payload::Done(what) => {
                tracing::debug!(what, "request finished");
                Vec::new()
            }
            Payload::Failed { what, message } => {
                tracing::warn!(what, error = %message, "request failed");
                if matches!(what, "categories" | "textbooks" | "textbook") {
                    self.status = Some(format!("Ошибка загрузки ({what})"));
                }
                Vec::new()
            }
        }
    }

    /// Clear an expired "copied" label; true when a redraw is due
    pub fn tick(&mut self, now: Instant) -> bool {
        self.copy.expire(now)
    }

    /// Time until the "copied" label needs clearing
    pub fn copy_remaining(&self, now: Instant) -> Option<Duration> {
        self.copy.remaining(now)
    }

    /// A code block reached the clipboard
    pub fn copied_block(&mut self, block_index: usize, now: Instant) {
        self.copy.trigger(block_index, now);
    }

    /// Handle a key action against the last drawn frame
    pub fn handle_action(&mut self, action: Action, viewport: &Viewport) -> Vec<Effect> {
        tracing::trace!(?action, route = %self.route, "action");
        match action {
            Action::Quit => vec![Effect::Quit],
            Action::Reload => self.reload(),
            Action::Back => match self.route {
                Route::Library => Vec::new(),
                _ => self.navigate(self.route.parent()),
            },
            Action::ScrollUp => {
                self.move_by(-1, viewport);
                Vec::new()
            }
            Action::ScrollDown => {
                self.move_by(1, viewport);
                Vec::new()
            }
            Action::PageUp => {
                self.move_by(-(viewport.height.max(2) as isize - 1), viewport);
                Vec::new()
            }
            Action::PageDown => {
                self.move_by(viewport.height.max(2) as isize - 1, viewport);
                Vec::new()
            }
            Action::Top => {
                self.move_by(isize::MIN / 2, viewport);
                Vec::new()
            }
            Action::Bottom => {
                self.move_by(isize::MAX / 2, viewport);
                Vec::new()
            }
            Action::Open => self.open(),
            Action::NextTopic | Action::PrevTopic => {
                let Route::Topic { textbook_id, index } = &self.route else {
                    return Vec::new();
                };
                let target = if action == Action::NextTopic {
                    next_route(textbook_id, *index, self.topic_total(textbook_id))
                } else {
                    prev_route(textbook_id, *index)
                };
                self.navigate(target)
            }
            Action::NextBlock => {
                self.select_block(true, viewport);
                Vec::new()
            }
            Action::PrevBlock => {
                self.select_block(false, viewport);
                Vec::new()
            }
            Action::Copy => self.copy_selected(viewport),
            Action::Rate(rating) => self.rate(rating),
        }
    }

    fn list_len(&self) -> usize {
        match &self.route {
            Route::Library => self.library_books().len(),
            Route::Book { .. } => self.route_textbook().map_or(0, |b| b.topics.len()),
            Route::Topic { .. } => 0,
        }
    }

    fn move_by(&mut self, delta: isize, viewport: &Viewport) {
        match self.route {
            Route::Topic { .. } => {
                let max = viewport.total_lines.saturating_sub(viewport.height);
                self.scroll = self.scroll.saturating_add_signed(delta).min(max);
            }
            _ => {
                let max = self.list_len().saturating_sub(1);
                self.cursor = self.cursor.saturating_add_signed(delta).min(max);
            }
        }
    }

    fn open(&mut self) -> Vec<Effect> {
        match self.route.clone() {
            Route::Library => {
                let Some(book_id) = self.library_books().get(self.cursor).map(|b| b.id.clone())
                else {
                    return Vec::new();
                };
                if !self.signed_in {
                    self.status = Some("Войдите, чтобы начать: tbread login --token <TOKEN>".into());
                    return Vec::new();
                }
                let start = match self.user_id.clone() {
                    Some(user_id) => Some(Self::unscoped(Request::StartProgress {
                        user_id,
                        textbook_id: book_id.clone(),
                    })),
                    None => {
                        tracing::debug!(textbook = %book_id, "profile pending, deferring progress start");
                        self.pending_start = Some(book_id.clone());
                        None
                    }
                };
                let mut effects = self.navigate(Route::book(book_id));
                effects.extend(start);
                effects
            }
            Route::Book { textbook_id } => {
                if self.cursor < self.list_len() {
                    self.navigate(Route::topic(textbook_id, self.cursor))
                } else {
                    Vec::new()
                }
            }
            Route::Topic { .. } => Vec::new(),
        }
    }

    fn select_block(&mut self, forward: bool, viewport: &Viewport) {
        let count = viewport.code_blocks.len();
        if count == 0 || !matches!(self.route, Route::Topic { .. }) {
            return;
        }
        let next = match (self.selected_block, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.selected_block = Some(next);

        let start = viewport.code_blocks[next].lines.start;
        if start < self.scroll || start >= self.scroll + viewport.height {
            let max = viewport.total_lines.saturating_sub(viewport.height);
            self.scroll = start.min(max);
        }
    }

    /// Copy the focused code block, or the first one on screen
    fn copy_selected(&mut self, viewport: &Viewport) -> Vec<Effect> {
        if !matches!(self.route, Route::Topic { .. }) {
            return Vec::new();
        }
        let visible = self.scroll..self.scroll + viewport.height.max(1);
        let region = self
            .selected_block
            .and_then(|i| viewport.code_blocks.get(i))
            .or_else(|| {
                viewport
                    .code_blocks
                    .iter()
                    .find(|r| r.lines.start < visible.end && r.lines.end > visible.start)
            });

        match region {
            Some(region) => vec![Effect::Copy {
                block_index: region.block_index,
                code: region.code.clone(),
            }],
            None => {
                self.status = Some("Нет кода для копирования".into());
                Vec::new()
            }
        }
    }

    fn rate(&mut self, rating: u8) -> Vec<Effect> {
        let Route::Book { textbook_id } = &self.route else {
            return Vec::new();
        };
        if !self.signed_in {
            self.status = Some("Войдите, чтобы оценить учебник".into());
            return Vec::new();
        }
        vec![Self::unscoped(Request::Rate {
            textbook_id: textbook_id.clone(),
            rating,
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::TopicSummary;

    fn book(id: &str, category: &str, topics: usize) -> Textbook {
        Textbook {
            id: id.to_string(),
            title: format!("Book {id}"),
            description: String::new(),
            avatar: None,
            category: Some(category.to_string()),
            topics: (0..topics)
                .map(|i| TopicSummary {
                    id: Some(format!("{id}-t{i}")),
                    title: format!("Topic {i}"),
                })
                .collect(),
        }
    }

    fn topic(id: &str) -> Topic {
        Topic {
            id: Some(id.to_string()),
            title: "Title".to_string(),
            content: "{code}let a = 1;{/code}".to_string(),
        }
    }

    fn category(id: &str) -> Category {
        Category {
            id: id.to_string(),
            name: format!("Category {id}"),
            description: String::new(),
            image: None,
        }
    }

    fn requests(effects: &[Effect]) -> Vec<Request> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Fetch(fetch) => Some(fetch.request.clone()),
                _ => None,
            })
            .collect()
    }

    fn current(state: &ReaderState, payload: Payload) -> FetchEvent {
        FetchEvent::new(Some(state.generation()), payload)
    }

    fn state() -> ReaderState {
        ReaderState::new(true, Duration::from_millis(2000))
    }

    #[test]
    fn test_route_change_requests() {
        let mut state = state();
        let effects = state.navigate(Route::Library);
        assert_eq!(requests(&effects), vec![Request::Categories, Request::Textbooks]);

        let effects = state.navigate(Route::book("b1"));
        assert_eq!(
            requests(&effects),
            vec![
                Request::Textbook("b1".into()),
                Request::UserRating("b1".into())
            ]
        );

        let effects = state.navigate(Route::topic("b1", 0));
        assert_eq!(
            requests(&effects),
            vec![
                Request::Topic {
                    textbook_id: "b1".into(),
                    index: 0
                },
                Request::Textbook("b1".into()),
            ]
        );
    }

    #[test]
    fn test_signed_out_book_skips_rating() {
        let mut state = ReaderState::new(false, Duration::from_millis(2000));
        let effects = state.navigate(Route::book("b1"));
        assert_eq!(requests(&effects), vec![Request::Textbook("b1".into())]);
        assert!(state.session_changed(false).is_empty());
    }

    #[test]
    fn test_stale_generation_dropped() {
        let mut state = state();
        state.navigate(Route::topic("b1", 0));
        let stale = state.generation();
        state.navigate(Route::topic("b1", 1));

        state.apply(FetchEvent::new(Some(stale), Payload::Topic(topic("old"))));
        assert_eq!(state.topic(), &TopicView::Loading);

        state.apply(current(&state, Payload::Topic(topic("new"))));
        assert_eq!(state.topic(), &TopicView::Loaded(topic("new")));
    }

    #[test]
    fn test_topic_failure_message() {
        let mut state = state();
        state.navigate(Route::topic("b1", 3));
        state.apply(current(&state, Payload::TopicFailed("404".into())));
        assert_eq!(state.topic(), &TopicView::Failed(TOPIC_ERROR.to_string()));
    }

    #[test]
    fn test_progress_recorded_once_per_topic() {
        let mut state = state();
        assert_eq!(state.session_changed(true).len(), 1);
        state.navigate(Route::topic("b1", 0));

        // Topic first, user later
        let effects = state.apply(current(&state, Payload::Topic(topic("t0"))));
        assert!(requests(&effects).is_empty());
        let effects = state.apply(FetchEvent::new(
            None,
            Payload::Profile {
                user_id: "u1".into(),
            },
        ));
        assert_eq!(
            requests(&effects),
            vec![Request::IncreaseProgress {
                user_id: "u1".into(),
                textbook_id: "b1".into(),
                topic_id: Some("t0".into()),
            }]
        );

        // Reloading the same topic does not record it again
        state.reload();
        let effects = state.apply(current(&state, Payload::Topic(topic("t0"))));
        assert!(requests(&effects).is_empty());

        // A different topic does
        state.navigate(Route::topic("b1", 1));
        let effects = state.apply(current(&state, Payload::Topic(topic("t1"))));
        assert_eq!(requests(&effects).len(), 1);
    }

    #[test]
    fn test_library_progress_flags_and_labels() {
        let mut state = state();
        state.navigate(Route::Library);
        state.apply(FetchEvent::new(
            None,
            Payload::Profile {
                user_id: "u1".into(),
            },
        ));
        state.apply(current(&state, Payload::Categories(vec![category("c1")])));
        let effects = state.apply(current(
            &state,
            Payload::Textbooks(vec![book("b1", "c1", 2), book("b2", "c1", 1), book("b3", "zz", 1)]),
        ));
        assert_eq!(
            requests(&effects),
            vec![Request::ProgressFlags {
                user_id: "u1".into(),
                textbook_ids: vec!["b1".into(), "b2".into(), "b3".into()],
            }]
        );

        state.apply(current(
            &state,
            Payload::Progress {
                textbook_id: "b1".into(),
                exists: true,
            },
        ));
        assert_eq!(state.progress_label("b1"), CONTINUE_LABEL);
        assert_eq!(state.progress_label("b2"), START_LABEL);

        // Books of unknown categories are not listed
        let listed: Vec<&str> = state.library_books().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(listed, vec!["b1", "b2"]);
    }

    #[test]
    fn test_open_book_starts_progress() {
        let mut state = state();
        state.navigate(Route::Library);
        state.apply(FetchEvent::new(
            None,
            Payload::Profile {
                user_id: "u1".into(),
            },
        ));
        state.apply(current(&state, Payload::Categories(vec![category("c1")])));
        state.apply(current(&state, Payload::Textbooks(vec![book("b1", "c1", 2), book("b2", "c1", 2)])));

        let viewport = Viewport::default();
        state.handle_action(Action::ScrollDown, &viewport);
        let effects = state.handle_action(Action::Open, &viewport);
        assert_eq!(state.route(), &Route::book("b2"));
        assert!(requests(&effects).contains(&Request::StartProgress {
            user_id: "u1".into(),
            textbook_id: "b2".into(),
        }));
    }

    #[test]
    fn test_open_book_before_profile_starts_progress_later() {
        let mut state = state();
        state.session_changed(true);
        state.navigate(Route::Library);
        state.apply(current(&state, Payload::Categories(vec![category("c1")])));
        state.apply(current(&state, Payload::Textbooks(vec![book("b1", "c1", 2)])));

        let effects = state.handle_action(Action::Open, &Viewport::default());
        assert_eq!(state.route(), &Route::book("b1"));
        assert!(!requests(&effects)
            .iter()
            .any(|r| matches!(r, Request::StartProgress { .. })));

        let effects = state.apply(FetchEvent::new(
            None,
            Payload::Profile {
                user_id: "u1".into(),
            },
        ));
        assert_eq!(
            requests(&effects),
            vec![Request::StartProgress {
                user_id: "u1".into(),
                textbook_id: "b1".into(),
            }]
        );

        // Sent once only
        let effects = state.apply(FetchEvent::new(
            None,
            Payload::Profile {
                user_id: "u1".into(),
            },
        ));
        assert!(requests(&effects).is_empty());
    }

    #[test]
    fn test_book_list_ignores_previous_textbook() {
        let mut state = state();
        state.navigate(Route::book("b1"));
        state.apply(current(&state, Payload::Textbook(book("b1", "c1", 10))));

        state.navigate(Route::book("b2"));
        let viewport = Viewport::default();
        state.handle_action(Action::Bottom, &viewport);
        assert_eq!(state.cursor(), 0);
        let effects = state.handle_action(Action::Open, &viewport);
        assert!(effects.is_empty());
        assert_eq!(state.route(), &Route::book("b2"));

        state.apply(current(&state, Payload::Textbook(book("b2", "c1", 3))));
        state.handle_action(Action::Bottom, &viewport);
        assert_eq!(state.cursor(), 2);
        state.handle_action(Action::Open, &viewport);
        assert_eq!(state.route(), &Route::topic("b2", 2));
    }

    #[test]
    fn test_open_book_signed_out_is_refused() {
        let mut state = ReaderState::new(false, Duration::from_millis(2000));
        state.navigate(Route::Library);
        state.apply(current(&state, Payload::Categories(vec![category("c1")])));
        state.apply(current(&state, Payload::Textbooks(vec![book("b1", "c1", 2)])));

        let effects = state.handle_action(Action::Open, &Viewport::default());
        assert!(effects.is_empty());
        assert_eq!(state.route(), &Route::Library);
        assert!(state.status().is_some());
    }

    #[test]
    fn test_topic_navigation_clamps_to_book() {
        let mut state = state();
        state.navigate(Route::topic("b1", 1));
        state.apply(current(&state, Payload::Textbook(book("b1", "c1", 2))));

        let viewport = Viewport::default();
        state.handle_action(Action::NextTopic, &viewport);
        assert_eq!(state.route(), &Route::book("b1"));

        state.navigate(Route::topic("b1", 0));
        state.handle_action(Action::PrevTopic, &viewport);
        assert_eq!(state.route(), &Route::book("b1"));

        // Textbook already loaded: moving between topics does not refetch it
        let effects = state.navigate(Route::topic("b1", 0));
        let effects2 = state.handle_action(Action::NextTopic, &viewport);
        assert_eq!(requests(&effects).len(), 1);
        assert_eq!(state.route(), &Route::topic("b1", 1));
        assert_eq!(requests(&effects2).len(), 1);
    }

    #[test]
    fn test_book_screen_open_topic_and_rate() {
        let mut state = state();
        state.navigate(Route::book("b1"));
        state.apply(current(&state, Payload::Textbook(book("b1", "c1", 3))));

        let effects = state.handle_action(Action::Rate(4), &Viewport::default());
        assert_eq!(
            requests(&effects),
            vec![Request::Rate {
                textbook_id: "b1".into(),
                rating: 4
            }]
        );
        state.apply(FetchEvent::new(
            None,
            Payload::Rated {
                textbook_id: "b1".into(),
                rating: 4,
            },
        ));
        assert_eq!(state.rating(), Some(4));

        let viewport = Viewport::default();
        state.handle_action(Action::Bottom, &viewport);
        assert_eq!(state.cursor(), 2);
        state.handle_action(Action::Open, &viewport);
        assert_eq!(state.route(), &Route::topic("b1", 2));
    }

    fn code_viewport() -> Viewport {
        Viewport {
            height: 5,
            total_lines: 30,
            code_blocks: vec![
                CodeRegion {
                    block_index: 1,
                    lines: 2..4,
                    code: "first".into(),
                },
                CodeRegion {
                    block_index: 3,
                    lines: 20..25,
                    code: "second".into(),
                },
            ],
        }
    }

    #[test]
    fn test_select_and_copy_code_blocks() {
        let mut state = state();
        state.navigate(Route::topic("b1", 0));
        let viewport = code_viewport();

        // Nothing selected: first block on screen
        let effects = state.handle_action(Action::Copy, &viewport);
        assert_eq!(
            effects,
            vec![Effect::Copy {
                block_index: 1,
                code: "first".into()
            }]
        );

        state.handle_action(Action::PrevBlock, &viewport);
        assert_eq!(state.selected_block(&viewport), Some(3));
        assert_eq!(state.scroll(), 20.min(30 - 5));
        state.handle_action(Action::NextBlock, &viewport);
        assert_eq!(state.selected_block(&viewport), Some(1));
        assert_eq!(state.scroll(), 2);
    }

    #[test]
    fn test_copy_feedback_follows_latest_block() {
        let mut state = state();
        state.navigate(Route::topic("b1", 0));
        let t0 = Instant::now();
        state.copied_block(2, t0);
        state.copied_block(5, t0 + Duration::from_millis(500));

        assert_eq!(state.copied(t0 + Duration::from_millis(2100)), Some(5));
        assert!(!state.tick(t0 + Duration::from_millis(2100)));
        assert!(state.tick(t0 + Duration::from_millis(2500)));
        assert_eq!(state.copied(t0 + Duration::from_millis(2500)), None);
    }

    #[test]
    fn test_navigation_resets_copy_feedback() {
        let mut state = state();
        state.navigate(Route::topic("b1", 0));
        let now = Instant::now();
        state.copied_block(1, now);
        state.navigate(Route::topic("b1", 1));
        assert_eq!(state.copied(now), None);
    }

    #[test]
    fn test_scroll_clamped() {
        let mut state = state();
        state.navigate(Route::topic("b1", 0));
        let viewport = code_viewport();
        state.handle_action(Action::ScrollUp, &viewport);
        assert_eq!(state.scroll(), 0);
        state.handle_action(Action::Bottom, &viewport);
        assert_eq!(state.scroll(), 25);
        state.handle_action(Action::PageUp, &viewport);
        assert_eq!(state.scroll(), 21);
    }

    #[test]
    fn test_back_and_quit() {
        let mut state = state();
        state.navigate(Route::topic("b1", 2));
        let viewport = Viewport::default();
        state.handle_action(Action::Back, &viewport);
        assert_eq!(state.route(), &Route::book("b1"));
        state.handle_action(Action::Back, &viewport);
        assert_eq!(state.route(), &Route::Library);
        assert!(state.handle_action(Action::Back, &viewport).is_empty());
        assert_eq!(state.handle_action(Action::Quit, &viewport), vec![Effect::Quit]);
    }
}
