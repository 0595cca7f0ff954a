//! Input handling - key translation and the action binding table

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A key the reader can bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Char(char),
    Ctrl(char),
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Backspace,
    Tab,
    BackTab,
    Esc,
}

impl Key {
    /// Translate a crossterm event; release and repeat events are dropped
    pub fn from_event(event: KeyEvent) -> Option<Key> {
        let KeyEvent {
            code, modifiers, kind, ..
        } = event;

        // Windows reports press and release separately
        if kind != KeyEventKind::Press {
            return None;
        }

        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        Some(match code {
            KeyCode::Char(ch) if ctrl => Key::Ctrl(ch.to_ascii_lowercase()),
            KeyCode::Char(ch) => Key::Char(ch),
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Tab if modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Esc => Key::Esc,
            _ => return None,
        })
    }

    /// Parse a key name as written in the config file
    ///
    /// Single characters are taken literally; named keys and `C-x` are
    /// case-insensitive.
    pub fn parse(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(ch));
        }

        let lower = name.to_lowercase();
        if let Some(rest) = lower.strip_prefix("c-").or_else(|| lower.strip_prefix("ctrl-")) {
            let mut chars = rest.chars();
            return match (chars.next(), chars.next()) {
                (Some(ch), None) => Some(Key::Ctrl(ch)),
                _ => None,
            };
        }

        Some(match lower.as_str() {
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "pageup" | "pgup" => Key::PageUp,
            "pagedown" | "pgdn" => Key::PageDown,
            "home" => Key::Home,
            "end" => Key::End,
            "enter" | "ret" => Key::Enter,
            "backspace" | "bs" => Key::Backspace,
            "tab" => Key::Tab,
            "backtab" | "s-tab" => Key::BackTab,
            "esc" | "escape" => Key::Esc,
            "space" | "spc" => Key::Char(' '),
            _ => return None,
        })
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => write!(f, "Space"),
            Key::Char(ch) => write!(f, "{ch}"),
            Key::Ctrl(ch) => write!(f, "C-{ch}"),
            Key::Up => write!(f, "Up"),
            Key::Down => write!(f, "Down"),
            Key::Left => write!(f, "Left"),
            Key::Right => write!(f, "Right"),
            Key::PageUp => write!(f, "PageUp"),
            Key::PageDown => write!(f, "PageDown"),
            Key::Home => write!(f, "Home"),
            Key::End => write!(f, "End"),
            Key::Enter => write!(f, "Enter"),
            Key::Backspace => write!(f, "Backspace"),
            Key::Tab => write!(f, "Tab"),
            Key::BackTab => write!(f, "BackTab"),
            Key::Esc => write!(f, "Esc"),
        }
    }
}

/// Something the user asked the reader to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
    NextTopic,
    PrevTopic,
    Open,
    Back,
    NextBlock,
    PrevBlock,
    Copy,
    Rate(u8),
    Reload,
    Quit,
}

impl Action {
    /// Name used in the `[keys]` config table
    pub fn name(&self) -> String {
        match self {
            Action::ScrollUp => "scroll-up".into(),
            Action::ScrollDown => "scroll-down".into(),
            Action::PageUp => "page-up".into(),
            Action::PageDown => "page-down".into(),
            Action::Top => "top".into(),
            Action::Bottom => "bottom".into(),
            Action::NextTopic => "next-topic".into(),
            Action::PrevTopic => "prev-topic".into(),
            Action::Open => "open".into(),
            Action::Back => "back".into(),
            Action::NextBlock => "next-block".into(),
            Action::PrevBlock => "prev-block".into(),
            Action::Copy => "copy".into(),
            Action::Rate(n) => format!("rate-{n}"),
            Action::Reload => "reload".into(),
            Action::Quit => "quit".into(),
        }
    }

    pub fn from_name(name: &str) -> Option<Action> {
        Some(match name {
            "scroll-up" => Action::ScrollUp,
            "scroll-down" => Action::ScrollDown,
            "page-up" => Action::PageUp,
            "page-down" => Action::PageDown,
            "top" => Action::Top,
            "bottom" => Action::Bottom,
            "next-topic" => Action::NextTopic,
            "prev-topic" => Action::PrevTopic,
            "open" => Action::Open,
            "back" => Action::Back,
            "next-block" => Action::NextBlock,
            "prev-block" => Action::PrevBlock,
            "copy" => Action::Copy,
            "reload" => Action::Reload,
            "quit" => Action::Quit,
            other => {
                let n: u8 = other.strip_prefix("rate-")?.parse().ok()?;
                if !(1..=5).contains(&n) {
                    return None;
                }
                Action::Rate(n)
            }
        })
    }
}

/// Key binding table
pub struct KeyMap {
    bindings: HashMap<Key, Action>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Table with the stock bindings
    pub fn with_defaults() -> Self {
        let mut map = Self::new();
        map.setup_defaults();
        map
    }

    fn setup_defaults(&mut self) {
        use Action::*;

        self.bind(Key::Up, ScrollUp);
        self.bind(Key::Char('k'), ScrollUp);
        self.bind(Key::Down, ScrollDown);
        self.bind(Key::Char('j'), ScrollDown);
        self.bind(Key::PageUp, PageUp);
        self.bind(Key::PageDown, PageDown);
        self.bind(Key::Char(' '), PageDown);
        self.bind(Key::Home, Top);
        self.bind(Key::Char('g'), Top);
        self.bind(Key::End, Bottom);
        self.bind(Key::Char('G'), Bottom);

        self.bind(Key::Right, NextTopic);
        self.bind(Key::Char('n'), NextTopic);
        self.bind(Key::Left, PrevTopic);
        self.bind(Key::Char('p'), PrevTopic);
        self.bind(Key::Enter, Open);
        self.bind(Key::Backspace, Back);
        self.bind(Key::Char('b'), Back);

        self.bind(Key::Tab, NextBlock);
        self.bind(Key::BackTab, PrevBlock);
        self.bind(Key::Char('c'), Copy);
        self.bind(Key::Char('y'), Copy);

        for n in 1..=5u8 {
            self.bind(Key::Char(char::from(b'0' + n)), Rate(n));
        }

        self.bind(Key::Char('r'), Reload);
        self.bind(Key::Char('q'), Quit);
        self.bind(Key::Esc, Quit);
        self.bind(Key::Ctrl('c'), Quit);
    }

    pub fn bind(&mut self, key: Key, action: Action) {
        self.bindings.insert(key, action);
    }

    pub fn unbind(&mut self, key: Key) {
        self.bindings.remove(&key);
    }

    pub fn lookup(&self, key: Key) -> Option<Action> {
        self.bindings.get(&key).copied()
    }

    /// Keys bound to `action`, sorted
    pub fn keys_for(&self, action: Action) -> Vec<Key> {
        let mut keys: Vec<Key> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }

    /// Apply `[keys]` overrides: action name to comma separated key names
    ///
    /// Unknown names are skipped with a warning. The listed keys replace
    /// every default key of that action.
    pub fn apply_overrides(&mut self, overrides: &BTreeMap<String, String>) {
        for (name, keys) in overrides {
            let Some(action) = Action::from_name(name) else {
                tracing::warn!(action = %name, "unknown action in [keys]");
                continue;
            };

            let parsed: Vec<Key> = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .filter_map(|k| {
                    let key = Key::parse(k);
                    if key.is_none() {
                        tracing::warn!(key = %k, action = %name, "unknown key name in [keys]");
                    }
                    key
                })
                .collect();
            if parsed.is_empty() {
                continue;
            }

            for old in self.keys_for(action) {
                self.unbind(old);
            }
            for key in parsed {
                self.bind(key, action);
            }
        }
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_translate_events() {
        assert_eq!(
            Key::from_event(press(KeyCode::Char('j'), KeyModifiers::NONE)),
            Some(Key::Char('j'))
        );
        assert_eq!(
            Key::from_event(press(KeyCode::Char('C'), KeyModifiers::CONTROL)),
            Some(Key::Ctrl('c'))
        );
        assert_eq!(
            Key::from_event(press(KeyCode::Tab, KeyModifiers::SHIFT)),
            Some(Key::BackTab)
        );

        let mut release = press(KeyCode::Char('j'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(Key::from_event(release), None);
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(Key::parse("l"), Some(Key::Char('l')));
        assert_eq!(Key::parse("L"), Some(Key::Char('L')));
        assert_eq!(Key::parse("PageDown"), Some(Key::PageDown));
        assert_eq!(Key::parse("C-n"), Some(Key::Ctrl('n')));
        assert_eq!(Key::parse("space"), Some(Key::Char(' ')));
        assert_eq!(Key::parse("hyper-x"), None);
        assert_eq!(Key::parse(""), None);
    }

    #[test]
    fn test_action_names_roundtrip() {
        for action in [Action::Copy, Action::Rate(3), Action::NextTopic, Action::Quit] {
            assert_eq!(Action::from_name(&action.name()), Some(action));
        }
        assert_eq!(Action::from_name("rate-6"), None);
        assert_eq!(Action::from_name("fly"), None);
    }

    #[test]
    fn test_default_bindings() {
        let map = KeyMap::with_defaults();
        assert_eq!(map.lookup(Key::Char('n')), Some(Action::NextTopic));
        assert_eq!(map.lookup(Key::Left), Some(Action::PrevTopic));
        assert_eq!(map.lookup(Key::Char('y')), Some(Action::Copy));
        assert_eq!(map.lookup(Key::Char('4')), Some(Action::Rate(4)));
        assert_eq!(map.lookup(Key::Char('z')), None);
        assert_eq!(map.keys_for(Action::Copy), vec![Key::Char('c'), Key::Char('y')]);
    }

    #[test]
    fn test_overrides_replace_action_keys() {
        let mut map = KeyMap::with_defaults();
        let mut overrides = BTreeMap::new();
        overrides.insert("next-topic".to_string(), "l, Right".to_string());
        overrides.insert("warp".to_string(), "w".to_string());
        overrides.insert("copy".to_string(), "nonsense-key".to_string());
        map.apply_overrides(&overrides);

        assert_eq!(map.lookup(Key::Char('l')), Some(Action::NextTopic));
        assert_eq!(map.lookup(Key::Right), Some(Action::NextTopic));
        assert_eq!(map.lookup(Key::Char('n')), None);
        assert_eq!(map.lookup(Key::Char('w')), None);
        // No valid key listed, defaults stay
        assert_eq!(map.lookup(Key::Char('c')), Some(Action::Copy));
    }
}
