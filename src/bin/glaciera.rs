//! The interactive player: loads the catalog into memory and runs the
//! single-threaded cooperative event loop described in §4.7/§5. Mirrors
//! `glaciera.c`'s `main`.

use clap::Parser;
use glaciera::catalog::CatalogStore;
use glaciera::config::Config;
use glaciera::library::Library;
use glaciera::logging::{error, info, log_pause, log_resume};
use glaciera::playback::{progress, Controller};
use glaciera::ui::event::{Event, Key};
use glaciera::ui::{render, App, Command};
use ratatui::crossterm::event::{self, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::{execute, terminal};
use std::io::stdout;
use std::time::{Duration, Instant, SystemTime};

/// The glaciera terminal jukebox.
#[derive(Parser, Debug)]
#[command(name = "glaciera", version)]
struct Cli {
    /// Disable read-ahead precaching during playback.
    #[arg(short = 'r')]
    no_read_ahead: bool,

    /// Print every theme file as ANSI true-color swatches and exit.
    #[arg(long = "theme-preview")]
    theme_preview: bool,

    /// Verbose logging.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    glaciera::logging::LOG_LEVEL.store(1 + cli.verbose, std::sync::atomic::Ordering::Relaxed);

    if cli.theme_preview {
        print_theme_preview();
        return;
    }

    let config = Config::load();
    let Some(db_path) = glaciera::config::db_path() else {
        error!("glaciera: could not determine the catalog path");
        std::process::exit(1);
    };
    let store = match CatalogStore::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("glaciera: failed to open catalog: {e}");
            std::process::exit(1);
        }
    };
    let tracks = store.load_all().unwrap_or_default();
    let library = Library::new(tracks);

    let Some(data_dir) = glaciera::config::data_dir() else {
        error!("glaciera: could not determine the data directory");
        std::process::exit(1);
    };
    let playlist_dir = glaciera::playlist::playlist_dir_default(&data_dir);
    if let Err(e) = std::fs::create_dir_all(&playlist_dir) {
        error!("glaciera: could not create playlist directory: {e}");
    }

    let mut app = App::new(config, library, playlist_dir);
    let mut controller = Controller::new();
    let read_ahead = !cli.no_read_ahead;

    if let Err(e) = run(&mut app, &mut controller, read_ahead) {
        error!("glaciera: {e}");
    }
    controller.stop();
}

fn run(app: &mut App, controller: &mut Controller, read_ahead: bool) -> std::io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen)?;
    log_pause!();
    let backend = ratatui::backend::CrosstermBackend::new(stdout());
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_secs(1);

    let result = (|| -> std::io::Result<()> {
        loop {
            terminal.draw(|frame| render::draw(frame, app))?;

            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            let mut events = Vec::new();
            if event::poll(timeout)? {
                if let event::Event::Key(key_event) = event::read()? {
                    if key_event.kind == KeyEventKind::Press {
                        if let Some(key) = translate_crossterm_key(key_event.code, key_event.modifiers) {
                            events.push(Event::Key(key));
                        }
                    }
                }
            }
            if last_tick.elapsed() >= tick_rate {
                last_tick = Instant::now();
                events.push(Event::Tick);
                run_tick(app, controller, read_ahead);
            }

            for event in events {
                for command in app.handle_event(event) {
                    execute_command(app, controller, command);
                }
            }

            if app.quit {
                break;
            }
        }
        Ok(())
    })();

    log_resume!();
    terminal::disable_raw_mode()?;
    execute!(stdout(), terminal::LeaveAlternateScreen)?;
    result
}

fn run_tick(app: &mut App, controller: &mut Controller, read_ahead: bool) {
    let Some(now_playing) = controller.now_playing() else { return };
    if now_playing.paused {
        return;
    }
    let seconds_played =
        SystemTime::now().duration_since(now_playing.started_at).map(|d| d.as_secs() as u32).unwrap_or(0);
    let duration = now_playing.track.tuneinfo.duration;
    let prog = progress::compute(duration, seconds_played);

    if progress::should_precache_next(&prog, false) {
        if let Some(idx) = app.now_playing_index {
            if let Some(next) = app.library.tracks().get(idx + 1) {
                Controller::precache(&next.path);
            }
        }
    }
    if progress::should_save_history(&prog) {
        let entry = glaciera::playlist::history_entry_now(&now_playing.track);
        let _ = glaciera::playlist::append_history(&app.playlist_dir, &entry);
    }
    if read_ahead {
        progress::read_ahead(&now_playing.track.path, now_playing.track.tuneinfo.filesize, prog.percent_played);
    }
}

fn execute_command(app: &mut App, controller: &mut Controller, command: Command) {
    match command {
        Command::Play(track) => {
            let idx = app.library.tracks().iter().position(|t| t.path == track.path);
            match controller.play(&app.config, track) {
                Ok(()) => app.now_playing_index = idx,
                Err(e) => error!("glaciera: could not start playback: {e}"),
            }
        }
        Command::PlayNext => {
            if let Some(idx) = app.now_playing_index {
                if let Some(next) = app.library.tracks().get(idx + 1).cloned() {
                    match controller.play(&app.config, next) {
                        Ok(()) => app.now_playing_index = Some(idx + 1),
                        Err(e) => error!("glaciera: could not start playback: {e}"),
                    }
                }
            }
        }
        Command::TogglePause => {
            if let Err(e) = controller.toggle_pause() {
                error!("glaciera: could not toggle pause: {e}");
            }
        }
        Command::Stop => controller.stop(),
        Command::SavePlaylist(name) => {
            let mut playlist = app.playlist.clone();
            playlist.name = name.clone();
            match glaciera::playlist::save(&app.playlist_dir, &playlist) {
                Ok(()) => info!("glaciera: saved playlist '{name}'"),
                Err(e) => error!("glaciera: could not save playlist '{name}': {e}"),
            }
        }
        Command::SaveConfig => {
            if let Err(e) = app.config.save() {
                error!("glaciera: could not save config: {e}");
            }
        }
        Command::ReloadCatalog => {
            if let Some(db_path) = glaciera::config::db_path() {
                if let Ok(store) = CatalogStore::open(&db_path) {
                    if let Ok(tracks) = store.load_all() {
                        app.library = Library::new(tracks);
                    }
                }
            }
        }
        Command::Burn(track) => {
            let burn_dir = app.playlist_dir.join("burn");
            if let Err(e) = std::fs::create_dir_all(&burn_dir) {
                error!("glaciera: could not create burn directory: {e}");
                return;
            }
            let Some(file_name) = track.path.file_name() else { return };
            let link = burn_dir.join(file_name);
            let _ = std::fs::remove_file(&link);
            if let Err(e) = std::os::unix::fs::symlink(&track.path, &link) {
                error!("glaciera: could not symlink '{}' for burning: {e}", track.path.display());
            }
        }
        Command::Quit => app.quit = true,
    }
}

fn translate_crossterm_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Key> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char(c) = code {
            return Some(Key::Ctrl(c.to_ascii_uppercase() as u8 - b'A' + 1));
        }
    }
    match code {
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Esc => Some(Key::Esc),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Left => Some(Key::Left),
        KeyCode::Right => Some(Key::Right),
        KeyCode::Home => Some(Key::Home),
        KeyCode::End => Some(Key::End),
        KeyCode::PageUp => Some(Key::PageUp),
        KeyCode::PageDown => Some(Key::PageDown),
        KeyCode::Insert => Some(Key::Insert),
        KeyCode::Delete => Some(Key::Delete),
        KeyCode::F(n) => Some(Key::F(n)),
        _ => None,
    }
}

/// `--theme-preview`: an external-collaborator concern (ANSI true-color
/// emission isn't part of the core per §1), kept to the one built-in
/// palette since no theme file loader exists yet.
fn print_theme_preview() {
    println!("glaciera built-in theme: default");
    println!("\x1b[38;2;200;200;200m  foreground  \x1b[0m");
    println!("\x1b[48;2;30;30;40m  background  \x1b[0m");
    println!("\x1b[38;2;90;200;250m  accent      \x1b[0m");
}
