//! The UI reducer (§4.7): a single-threaded cooperative event loop state
//! machine. `App` owns every piece of mutable session state and
//! [`App::handle_event`] is the one place that mutates it, mirroring the
//! original's `action()` dispatch chain
//! (`handle_search_input` → `handle_input_mode` → `handle_function_keys` →
//! `handle_navigation_keys` → `handle_special_commands`) but as a pure
//! state transition returning [`Command`]s for the caller to execute
//! (spawn a player, save a file, quit) instead of reaching into globals.

pub mod event;
pub mod keys;
pub mod render;
pub mod views;

use crate::config::Config;
use crate::library::Library;
use crate::model::{DisplaySlot, Playlist};
use crate::search::Query;
use event::{Event, Key};
use std::path::PathBuf;
use std::sync::Arc;

const CONTEXT_RADIUS: usize = 20;

/// Which column `displaytunes` is ordered by. Mirrors the original's sort
/// columns; F3 cycles through them and a repeated F3 on the same column
/// flips direction, same double-tap rule as [`PendingPrompt::ContextMenu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortMode {
    Normal,
    Length,
    Size,
    Date,
    Bitrate,
    Genre,
    Rating,
    Path,
}

impl SortMode {
    fn next(self) -> Self {
        match self {
            SortMode::Normal => SortMode::Length,
            SortMode::Length => SortMode::Size,
            SortMode::Size => SortMode::Date,
            SortMode::Date => SortMode::Bitrate,
            SortMode::Bitrate => SortMode::Genre,
            SortMode::Genre => SortMode::Rating,
            SortMode::Rating => SortMode::Path,
            SortMode::Path => SortMode::Normal,
        }
    }
}

/// Which screen the result list currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Splash,
    /// The default result list: either search results or the whole catalog.
    Results,
    Playlists,
    /// Argument: whether F12 (show all playlists) opened this vs. F6.
    PlaylistSort { show_digits: bool },
    Context,
}

/// What the UI reducer wants the caller to do. The reducer itself never
/// touches the filesystem, spawns a process, or exits — it only describes
/// the effect.
#[derive(Debug, Clone)]
pub enum Command {
    Play(Arc<crate::model::Track>),
    PlayNext,
    TogglePause,
    Stop,
    SavePlaylist(String),
    SaveConfig,
    ReloadCatalog,
    /// Symlink the given track's file into the burn staging directory.
    /// Mirrors the original's `F8` "Burn" action.
    Burn(Arc<crate::model::Track>),
    Quit,
}

/// Which function-key prompt is currently awaiting its next keystroke (the
/// original's blocking `read_input_key()` calls inside `do_view`/
/// `do_show_new_songs`/`do_context`, modeled here as explicit reducer
/// states instead of nested blocking reads).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingPrompt {
    None,
    ViewMenu,
    ViewArtistLetter,
    ViewWeeksBack,
    ContextMenu,
    SavePlaylistName,
}

/// All mutable session state for the player binary.
pub struct App {
    pub config: Config,
    pub library: Library,
    pub view: View,
    pub search_string: String,
    pub displaytunes: Vec<DisplaySlot>,
    pub selected: usize,
    pub playlist: Playlist,
    pub playlist_dir: PathBuf,
    pub now_playing_index: Option<usize>,
    pub quit: bool,
    pending_prompt: PendingPrompt,
    key_count: u32,
    last_space_count: u32,
    context_radius: usize,
    context_last_count: u32,
    in_input_mode: bool,
    sort_mode: SortMode,
    sort_ascending: bool,
    last_sort_key_count: u32,
    /// F1: whether the info panel shows extended per-track stats.
    pub show_info: bool,
    /// F9: whether the info panel shows a cumulative-finish-time estimate
    /// alongside each row instead of plain durations.
    pub show_finish: bool,
}

impl App {
    /// A freshly started session showing the splash view over the whole
    /// catalog.
    pub fn new(config: Config, library: Library, playlist_dir: PathBuf) -> Self {
        let displaytunes = library.tracks().iter().cloned().map(DisplaySlot::Catalog).collect();
        Self {
            config,
            library,
            view: View::Splash,
            search_string: String::new(),
            displaytunes,
            selected: 0,
            playlist: Playlist::default(),
            playlist_dir,
            now_playing_index: None,
            quit: false,
            pending_prompt: PendingPrompt::None,
            key_count: 0,
            last_space_count: 0,
            context_radius: CONTEXT_RADIUS,
            context_last_count: 0,
            in_input_mode: false,
            sort_mode: SortMode::Normal,
            sort_ascending: true,
            last_sort_key_count: 0,
            show_info: false,
            show_finish: false,
        }
    }

    /// Currently selected display slot, if the list isn't empty.
    pub fn selected_slot(&self) -> Option<&DisplaySlot> {
        self.displaytunes.get(self.selected)
    }

    fn show_whole_catalog(&mut self) {
        self.displaytunes = self.library.tracks().iter().cloned().map(DisplaySlot::Catalog).collect();
        self.selected = 0;
        self.view = View::Results;
    }

    fn run_search(&mut self) {
        self.view = View::Results;
        self.selected = 0;
        if self.search_string.is_empty() {
            self.show_whole_catalog();
            return;
        }
        let query = Query::parse(&self.search_string);
        if query.is_barcode() {
            let name = self.search_string.clone();
            self.search_string.clear();
            self.load_playlist_by_name(&name);
            return;
        }
        self.displaytunes = query.run_as_slots(self.library.tracks());
    }

    fn load_playlist_by_name(&mut self, name: &str) {
        let find = |display: &str| self.library.tracks().iter().find(|t| t.display == display).cloned();
        if let Ok(playlist) = crate::playlist::load(&self.playlist_dir, name, find) {
            self.displaytunes = playlist.entries.clone();
            self.playlist = playlist;
            self.view = View::Results;
            self.selected = 0;
        }
    }

    /// Re-orders `displaytunes` by the current [`SortMode`] and direction.
    /// Non-catalog (synthetic) rows sort as if every numeric field were
    /// zero, matching the original's behavior of sort keys living on the
    /// `tuneinfo` struct that synthetic rows never populate.
    fn apply_sort(&mut self) {
        if self.sort_mode == SortMode::Path {
            self.displaytunes.sort_by(|a, b| a.path().cmp(&b.path()));
        } else {
            self.displaytunes.sort_by(|a, b| {
                let ka = sort_key(a, self.sort_mode);
                let kb = sort_key(b, self.sort_mode);
                ka.cmp(&kb).then_with(|| a.display().to_ascii_lowercase().cmp(&b.display().to_ascii_lowercase()))
            });
        }
        if !self.sort_ascending {
            self.displaytunes.reverse();
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        if self.displaytunes.is_empty() {
            return;
        }
        let len = self.displaytunes.len() as isize;
        let new = (self.selected as isize + delta).clamp(0, len - 1);
        self.selected = new as usize;
    }

    /// Advances the reducer by one event, returning any effects the caller
    /// should carry out.
    pub fn handle_event(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Tick => Vec::new(),
            Event::ChildExited(_) => vec![Command::PlayNext],
            Event::Key(key) => {
                self.key_count = self.key_count.wrapping_add(1);
                self.dispatch_key(key)
            }
        }
    }

    fn dispatch_key(&mut self, key: Key) -> Vec<Command> {
        if self.pending_prompt != PendingPrompt::None {
            return self.dispatch_prompt(key);
        }
        if self.in_input_mode {
            return self.dispatch_input_mode(key);
        }
        if let Some(cmds) = self.dispatch_search_input(key) {
            return cmds;
        }
        if let Some(cmds) = self.dispatch_function_key(key) {
            return cmds;
        }
        if let Some(cmds) = self.dispatch_navigation(key) {
            return cmds;
        }
        self.dispatch_special(key)
    }

    /// Mirrors `handle_search_input`: rejects navigation/function keys so
    /// they fall through to the later handlers, otherwise edits
    /// `search_string` with its per-character validation rules.
    fn dispatch_search_input(&mut self, key: Key) -> Option<Vec<Command>> {
        match key {
            Key::Up
            | Key::Down
            | Key::Left
            | Key::Right
            | Key::Home
            | Key::End
            | Key::PageUp
            | Key::PageDown
            | Key::Insert
            | Key::Delete
            | Key::Enter
            | Key::F(_) => return None,
            _ => {}
        }

        match key {
            Key::Backspace => {
                self.search_string.pop();
                self.run_search();
                Some(Vec::new())
            }
            Key::Char(' ') => {
                if self.last_space_count > 0 {
                    self.search_string.pop();
                    self.run_search();
                    self.last_space_count = 0;
                    return Some(vec![Command::PlayNext]);
                }
                self.last_space_count += 1;
                if self.search_string.is_empty() || self.search_string.ends_with(' ') {
                    return Some(Vec::new());
                }
                self.push_search_char(' ');
                Some(Vec::new())
            }
            Key::Char(c @ (':' | '/' | '!' | '%')) => {
                self.last_space_count = 0;
                let allowed = match c {
                    ':' => !self.search_string.is_empty() && !self.search_string.contains(':'),
                    '/' => self.search_string.is_empty(),
                    '!' => self.search_string.chars().last() != Some('!'),
                    '%' => self.search_string.is_empty(),
                    _ => unreachable!(),
                };
                if allowed {
                    self.push_search_char(c);
                }
                Some(Vec::new())
            }
            Key::Char(c) if keys::is_typeable(c) => {
                self.last_space_count = 0;
                self.push_search_char(c);
                Some(Vec::new())
            }
            _ => None,
        }
    }

    fn push_search_char(&mut self, c: char) {
        if self.search_string.chars().count() < 70 {
            self.search_string.push(c);
            self.run_search();
        }
    }

    /// Mirrors `handle_input_mode`: while saving a playlist name, only
    /// Enter/Escape do anything.
    fn dispatch_input_mode(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Enter => {
                let name = self.search_string.clone();
                self.in_input_mode = false;
                self.search_string.clear();
                vec![Command::SavePlaylist(name)]
            }
            Key::Esc => {
                self.in_input_mode = false;
                self.search_string.clear();
                Vec::new()
            }
            Key::Backspace => {
                self.search_string.pop();
                Vec::new()
            }
            Key::Char(c) if keys::is_typeable(c) => {
                self.search_string.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Mirrors `handle_function_keys`.
    fn dispatch_function_key(&mut self, key: Key) -> Option<Vec<Command>> {
        match key {
            Key::F(1) => {
                self.show_info = !self.show_info;
                Some(Vec::new())
            }
            Key::F(2) => {
                self.pending_prompt = PendingPrompt::ViewMenu;
                Some(Vec::new())
            }
            Key::F(3) => {
                if self.key_count.wrapping_sub(self.last_sort_key_count) <= 1 {
                    self.sort_ascending = !self.sort_ascending;
                } else {
                    self.sort_mode = self.sort_mode.next();
                    self.sort_ascending = true;
                }
                self.last_sort_key_count = self.key_count;
                self.apply_sort();
                Some(Vec::new())
            }
            Key::F(4) => {
                if self.now_playing_index.is_none() {
                    return Some(Vec::new());
                }
                self.pending_prompt = PendingPrompt::ContextMenu;
                Some(Vec::new())
            }
            Key::F(5) => {
                self.displaytunes = self.playlist.entries.clone();
                self.view = View::Results;
                Some(Vec::new())
            }
            Key::F(6) => {
                if let Ok(names) = crate::playlist::available_playlists(&self.playlist_dir) {
                    self.displaytunes = names.into_iter().map(synthetic_row).collect();
                }
                self.view = View::Playlists;
                self.search_string.clear();
                Some(Vec::new())
            }
            Key::F(7) => {
                self.in_input_mode = true;
                Some(Vec::new())
            }
            Key::F(8) => match self.selected_slot().cloned() {
                Some(DisplaySlot::Catalog(t)) => Some(vec![Command::Burn(t)]),
                _ => Some(Vec::new()),
            },
            Key::F(9) => {
                self.show_finish = !self.show_finish;
                Some(Vec::new())
            }
            Key::F(11) => Some(vec![Command::ReloadCatalog]),
            Key::F(12) => {
                if let Ok(names) = crate::playlist::available_playlists(&self.playlist_dir) {
                    self.displaytunes = names.into_iter().map(synthetic_row).collect();
                }
                self.view = View::PlaylistSort { show_digits: true };
                self.search_string.clear();
                Some(Vec::new())
            }
            _ => None,
        }
    }

    /// Mirrors `handle_navigation_keys`.
    fn dispatch_navigation(&mut self, key: Key) -> Option<Vec<Command>> {
        match key {
            Key::Home => {
                self.selected = 0;
                Some(Vec::new())
            }
            Key::End => {
                self.selected = self.displaytunes.len().saturating_sub(1);
                Some(Vec::new())
            }
            Key::Down => {
                self.move_cursor(1);
                Some(Vec::new())
            }
            Key::Up => {
                self.move_cursor(-1);
                Some(Vec::new())
            }
            Key::PageDown => {
                self.move_cursor(10);
                Some(Vec::new())
            }
            Key::PageUp => {
                self.move_cursor(-10);
                Some(Vec::new())
            }
            _ => None,
        }
    }

    /// Mirrors `handle_special_commands`: Esc clears search, Ctrl-P
    /// pauses, `+`/`*` add to playlist, Tab shows info, Enter plays the
    /// selection.
    fn dispatch_special(&mut self, key: Key) -> Vec<Command> {
        match key {
            Key::Esc => {
                self.search_string.clear();
                self.show_whole_catalog();
                Vec::new()
            }
            Key::Ctrl(16) => vec![Command::TogglePause],
            Key::Ctrl(21) => {
                self.move_cursor(-5);
                Vec::new()
            }
            Key::Ctrl(4) => {
                self.move_cursor(5);
                Vec::new()
            }
            // Ctrl-L: the terminal is redrawn unconditionally every frame by
            // the render loop, so a forced redraw is a no-op here.
            Key::Ctrl(12) => Vec::new(),
            Key::Char('+') => {
                self.add_selected_to_playlist();
                Vec::new()
            }
            Key::Char('*') => {
                self.add_selected_to_playlist();
                if let Some(DisplaySlot::Catalog(t)) = self.selected_slot() {
                    return vec![Command::Play(t.clone())];
                }
                Vec::new()
            }
            Key::Enter => {
                if let Some(DisplaySlot::Catalog(t)) = self.selected_slot().cloned() {
                    return vec![Command::Play(t)];
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn add_selected_to_playlist(&mut self) {
        if let Some(DisplaySlot::Catalog(t)) = self.selected_slot().cloned() {
            self.playlist.add(t);
        }
    }

    /// Resolves a function-key sub-prompt (§4.7 "Views"), mirroring the
    /// blocking follow-up reads in `do_view`/`do_view_artists`/
    /// `do_show_new_songs`/`do_context`.
    fn dispatch_prompt(&mut self, key: Key) -> Vec<Command> {
        let prompt = self.pending_prompt;
        self.pending_prompt = PendingPrompt::None;
        match prompt {
            PendingPrompt::ViewMenu => match key {
                Key::Char('a') | Key::Char('A') => {
                    self.pending_prompt = PendingPrompt::ViewArtistLetter;
                }
                Key::Char('g') | Key::Char('G') => {
                    self.displaytunes = views::available_genres(self.library.tracks());
                    self.view = View::Results;
                }
                Key::Char('t') | Key::Char('T') => {
                    if let Ok(rows) = views::top_list(&self.playlist_dir, self.library.tracks()) {
                        self.displaytunes = rows;
                        self.view = View::Results;
                    }
                }
                Key::Char('n') | Key::Char('N') => {
                    self.pending_prompt = PendingPrompt::ViewWeeksBack;
                }
                _ => {}
            },
            PendingPrompt::ViewArtistLetter => {
                let letter = match key {
                    Key::Char(' ') => None,
                    Key::Char(c) if c.is_ascii_alphanumeric() => Some(c),
                    _ => return Vec::new(),
                };
                self.displaytunes = views::artist_rollup(self.library.tracks(), letter);
                self.view = View::Results;
            }
            PendingPrompt::ViewWeeksBack => {
                if let Key::Char(c) = key {
                    if let Some(weeks) = c.to_digit(10) {
                        self.displaytunes = views::new_songs(self.library.tracks(), weeks);
                        self.view = View::Results;
                    }
                }
            }
            PendingPrompt::ContextMenu => {
                if key == Key::F(4) {
                    if self.key_count.wrapping_sub(self.context_last_count) <= 1 {
                        self.context_radius += CONTEXT_RADIUS;
                    } else {
                        self.context_radius = CONTEXT_RADIUS;
                    }
                    self.context_last_count = self.key_count;
                    if let Some(center) = self.now_playing_index {
                        self.displaytunes = views::context_window(self.library.tracks(), center, self.context_radius);
                        self.view = View::Context;
                    }
                }
            }
            PendingPrompt::SavePlaylistName | PendingPrompt::None => {}
        }
        Vec::new()
    }
}

/// Sort key for one [`SortMode`]. Catalog rows contribute their `tuneinfo`
/// field; synthetic rows (which carry no bitrate/genre/rating) sort as zero
/// for every mode but `Normal`/`Path`, where display/path text still applies.
fn sort_key(slot: &DisplaySlot, mode: SortMode) -> i64 {
    match (mode, slot) {
        (SortMode::Normal, _) => 0,
        (SortMode::Length, _) => slot.duration() as i64,
        (SortMode::Size, DisplaySlot::Catalog(t)) => t.tuneinfo.filesize as i64,
        (SortMode::Size, DisplaySlot::Synthetic(t)) => t.filesize as i64,
        (SortMode::Date, DisplaySlot::Catalog(t)) => t.tuneinfo.filedate,
        (SortMode::Date, DisplaySlot::Synthetic(t)) => t.filedate,
        (SortMode::Bitrate, DisplaySlot::Catalog(t)) => t.tuneinfo.bitrate as i64,
        (SortMode::Bitrate, DisplaySlot::Synthetic(_)) => 0,
        (SortMode::Genre, DisplaySlot::Catalog(t)) => t.tuneinfo.genre as i64,
        (SortMode::Genre, DisplaySlot::Synthetic(_)) => 0,
        (SortMode::Rating, DisplaySlot::Catalog(t)) => t.tuneinfo.rating as i64,
        (SortMode::Rating, DisplaySlot::Synthetic(_)) => 0,
        (SortMode::Path, _) => 0,
    }
}

fn synthetic_row(name: String) -> DisplaySlot {
    DisplaySlot::Synthetic(Arc::new(crate::model::SyntheticTrack {
        display: name,
        duration: 0,
        filesize: 0,
        filedate: 0,
        genre_marker: None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Track, TuneInfo};
    use std::path::PathBuf;

    fn app_with_tracks(names: &[&str]) -> App {
        let tracks: Vec<Track> = names
            .iter()
            .enumerate()
            .map(|(i, n)| Track::new(i as i64, PathBuf::from(format!("/m/{i}.mp3")), n.to_string(), TuneInfo::default(), 0))
            .collect();
        App::new(Config::default(), Library::new(tracks), PathBuf::from("/tmp/glaciera-test-playlists"))
    }

    #[test]
    fn typing_filters_the_result_list() {
        let mut app = app_with_tracks(&["Alpha Song", "Beta Song"]);
        for c in "alpha".chars() {
            app.handle_event(Event::Key(Key::Char(c)));
        }
        assert_eq!(app.displaytunes.len(), 1);
        assert_eq!(app.displaytunes[0].display(), "Alpha Song");
    }

    #[test]
    fn escape_clears_search_and_restores_full_catalog() {
        let mut app = app_with_tracks(&["Alpha", "Beta"]);
        app.handle_event(Event::Key(Key::Char('a')));
        app.handle_event(Event::Key(Key::Esc));
        assert!(app.search_string.is_empty());
        assert_eq!(app.displaytunes.len(), 2);
    }

    #[test]
    fn double_space_plays_next() {
        let mut app = app_with_tracks(&["Alpha"]);
        app.handle_event(Event::Key(Key::Char('a')));
        app.handle_event(Event::Key(Key::Char(' ')));
        let cmds = app.handle_event(Event::Key(Key::Char(' ')));
        assert!(matches!(cmds.as_slice(), [Command::PlayNext]));
    }

    #[test]
    fn enter_plays_the_selected_catalog_track() {
        let mut app = app_with_tracks(&["Alpha"]);
        let cmds = app.handle_event(Event::Key(Key::Enter));
        assert!(matches!(cmds.as_slice(), [Command::Play(_)]));
    }

    #[test]
    fn plus_adds_selection_to_playlist_without_playing() {
        let mut app = app_with_tracks(&["Alpha"]);
        let cmds = app.handle_event(Event::Key(Key::Char('+')));
        assert!(cmds.is_empty());
        assert_eq!(app.playlist.entries.len(), 1);
    }

    #[test]
    fn f7_enters_playlist_save_prompt() {
        let mut app = app_with_tracks(&["Alpha"]);
        app.handle_event(Event::Key(Key::F(7)));
        assert!(app.in_input_mode);
        for c in "mymix".chars() {
            app.handle_event(Event::Key(Key::Char(c)));
        }
        let cmds = app.handle_event(Event::Key(Key::Enter));
        assert!(matches!(cmds.as_slice(), [Command::SavePlaylist(n)] if n == "mymix"));
    }

    #[test]
    fn barcode_query_loads_a_playlist() {
        let mut app = app_with_tracks(&["Alpha"]);
        std::fs::create_dir_all(&app.playlist_dir).unwrap();
        std::fs::write(app.playlist_dir.join("12345.list"), "Alpha\n").unwrap();
        for c in "12345".chars() {
            app.handle_event(Event::Key(Key::Char(c)));
        }
        assert_eq!(app.displaytunes.len(), 1);
        assert!(app.search_string.is_empty());
    }
}
