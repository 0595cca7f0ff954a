//! Reader main loop

use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use super::fetch::Fetcher;
use super::state::{Effect, FetchEvent, ReaderState, Viewport};
use super::view::{Display, ViewOptions};
use crate::api::ApiClient;
use crate::config::Config;
use crate::copy::{self, Clipboard};
use crate::error::Result;
use crate::highlight::Highlighter;
use crate::input::KeyMap;
use crate::navigation::Route;
use crate::terminal::{TermEvent, Terminal};

/// Longest wait for input before fetch results and timers are checked
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interactive reader
pub struct Reader {
    terminal: Terminal,
    display: Display,
    state: ReaderState,
    keymap: KeyMap,
    fetcher: Fetcher,
    events: UnboundedReceiver<FetchEvent>,
    clipboard: Box<dyn Clipboard>,
    /// Geometry of the last frame
    viewport: Viewport,
    running: bool,
}

impl Reader {
    pub fn new(config: &Config, api: ApiClient, rt: Handle) -> Result<Self> {
        let signed_in = api.is_signed_in();
        let (fetcher, events) = Fetcher::new(api, rt);

        let mut keymap = KeyMap::with_defaults();
        keymap.apply_overrides(&config.keys);

        let display = Display::new(
            Highlighter::new(&config.code_language),
            ViewOptions {
                line_numbers: config.show_line_numbers,
                tab_width: config.tab_width,
                wrap_width: config.wrap_width,
            },
        );

        Ok(Self {
            terminal: Terminal::new()?,
            display,
            state: ReaderState::new(signed_in, config.copy_feedback),
            keymap,
            fetcher,
            events,
            clipboard: copy::open_clipboard(),
            viewport: Viewport::default(),
            running: true,
        })
    }

    /// Open `start` and run until the user quits
    pub fn run(&mut self, start: Route) -> Result<()> {
        let signed_in = self.fetcher.is_signed_in();
        let effects = self.state.session_changed(signed_in);
        self.apply_effects(effects);
        let effects = self.state.navigate(start);
        self.apply_effects(effects);
        self.display.route_changed();

        while self.running {
            let generation = self.state.generation();

            self.viewport = self.display.render(
                &mut self.terminal,
                &self.state,
                &self.viewport,
                Instant::now(),
            )?;

            let timeout = self
                .state
                .copy_remaining(Instant::now())
                .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));

            match self.terminal.next_event(timeout)? {
                Some(TermEvent::Key(key)) => {
                    if let Some(action) = self.keymap.lookup(key) {
                        let effects = self.state.handle_action(action, &self.viewport);
                        self.apply_effects(effects);
                    } else {
                        tracing::trace!(%key, "unbound key");
                    }
                }
                Some(TermEvent::Resize) => self.display.force_redraw(),
                None => {}
            }

            while let Ok(event) = self.events.try_recv() {
                let effects = self.state.apply(event);
                self.apply_effects(effects);
            }

            self.state.tick(Instant::now());

            if self.state.generation() != generation {
                self.display.route_changed();
            }
        }

        Ok(())
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch(fetch) => self.fetcher.dispatch(fetch),
                Effect::Copy { block_index, code } => {
                    if let Err(e) = self.clipboard.set_text(&code) {
                        tracing::warn!(error = %e, "copy to clipboard failed");
                    }
                    self.state.copied_block(block_index, Instant::now());
                }
                Effect::Quit => self.running = false,
            }
        }
    }
}
