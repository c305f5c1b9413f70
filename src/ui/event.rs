//! Events the UI reducer consumes (§5, "Signals → events"): keypresses, the
//! 1 Hz progress tick, and child-exit notifications, replacing the
//! original's `SIGALRM`/`SIGCHLD` handlers sharing globals with an explicit
//! channel of values.

/// A decoded keypress, after escape-sequence translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character, including space and the search-mode markers
    /// (`!`, `:`, `%`, `/`).
    Char(char),
    Backspace,
    Enter,
    Esc,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Insert,
    Delete,
    /// `F(1)..=F(12)`.
    F(u8),
    /// A control character by its ASCII code point (e.g. Ctrl-P is `16`).
    Ctrl(u8),
    Resize,
}

/// One item out of the event loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Key(Key),
    /// The 1 Hz progress timer fired.
    Tick,
    /// The decoder child exited; carries its exit status if known.
    ChildExited(Option<i32>),
}
