//! Keyboard shortcut routing.

/// A key press with its modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    /// Key character as reported by the host
    pub key: char,
    /// Shift held
    pub shift: bool,
    /// Control held
    pub ctrl: bool,
    /// Alt held
    pub alt: bool,
    /// Meta (command) held
    pub meta: bool,
}

impl KeyChord {
    /// Key without modifiers
    pub fn plain(key: char) -> Self {
        Self {
            key,
            shift: false,
            ctrl: false,
            alt: false,
            meta: false,
        }
    }

    /// Key with Shift
    pub fn shift(key: char) -> Self {
        Self {
            shift: true,
            ..Self::plain(key)
        }
    }
}

/// Action bound to a chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    /// Flip the page-wide collapse state
    ToggleAllComments,
}

/// Resolve a chord to its bound action
pub fn resolve(chord: KeyChord) -> Option<ShortcutAction> {
    if chord.ctrl || chord.alt || chord.meta {
        return None;
    }
    if chord.shift && chord.key.eq_ignore_ascii_case(&'c') {
        return Some(ShortcutAction::ToggleAllComments);
    }
    None
}
