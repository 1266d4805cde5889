mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::mpsc::Sender,
    time::Duration,
};
use typeduel::{
    config::{Config, ConfigStore, FileConfigStore, TextSource},
    profile::ProfileSummary,
    runtime::{
        CrosstermEventSource, FixedTicker, Runner, SessionDriver, SessionEvent, ThreadScheduler,
        TickKind,
    },
    session::{Mode, Transition, TypingSession},
    target::{LibraryProvider, SentenceProvider, TargetProvider, TargetSource},
    InvalidTargetError,
};

const TICK_RATE_MS: u64 = 100;

/// typing practice, timed exercises, and races against a simulated opponent
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    version,
    about,
    long_about = "Type a paragraph as fast and as accurately as you can. Practice untimed, run a timed exercise you can finish early, or race a simulated opponent typing the same text."
)]
pub struct Cli {
    /// typing mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// opponent speed in words per minute (race mode)
    #[clap(long)]
    opponent_wpm: Option<f64>,

    /// percentage of characters the opponent types correctly (race mode)
    #[clap(long)]
    opponent_accuracy: Option<f64>,

    /// end the round after this many seconds
    #[clap(short = 's', long)]
    time_limit: Option<u64>,

    /// custom text to type in the first round
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// where round text comes from
    #[clap(long, value_enum)]
    source: Option<TextSource>,

    /// number of generated sentences per round (with --source sentences)
    #[clap(short = 'f', long = "full-sentences")]
    sentences: Option<usize>,

    /// save these settings as the new defaults
    #[clap(long)]
    save: bool,
}

impl Cli {
    /// Overlays the flags that were given on top of the stored config.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(mode) = self.mode {
            cfg.mode = mode;
        }
        if let Some(wpm) = self.opponent_wpm {
            cfg.opponent_wpm = wpm;
        }
        if let Some(accuracy) = self.opponent_accuracy {
            cfg.opponent_accuracy = accuracy;
        }
        if let Some(secs) = self.time_limit {
            cfg.time_limit_secs = Some(secs).filter(|s| *s > 0);
        }
        if let Some(source) = self.source {
            cfg.source = Some(source);
        }
        if let Some(sentences) = self.sentences {
            cfg.sentences = sentences;
        }
        cfg
    }
}

fn provider_for(cfg: &Config) -> Box<dyn TargetProvider> {
    match cfg.text_source() {
        TextSource::Library => Box::new(LibraryProvider::new()),
        TextSource::Sentences => Box::new(SentenceProvider::new(cfg.sentences)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub settings: Config,
    pub source: TargetSource,
    pub driver: SessionDriver<ThreadScheduler, ProfileSummary>,
    pub state: AppState,
    pub status: Option<String>,
}

impl App {
    pub fn new(
        settings: Config,
        mut source: TargetSource,
        tx: Sender<SessionEvent>,
    ) -> Result<Self, InvalidTargetError> {
        let target = source.next_target()?;
        let session = TypingSession::new(target, settings.session_options());
        let driver = SessionDriver::new(
            session,
            ThreadScheduler::new(TickKind::Clock, tx.clone()),
            ThreadScheduler::new(TickKind::Opponent, tx),
            ProfileSummary::new(),
        );

        Ok(Self {
            settings,
            source,
            driver,
            state: AppState::Typing,
            status: None,
        })
    }

    pub fn session(&self) -> &TypingSession {
        self.driver.session()
    }

    /// Starts a new round. `same_text` repeats the current target.
    pub fn reset(&mut self, same_text: bool) {
        if same_text {
            let text = self.session().target().as_str().to_string();
            self.source.set_custom_text(text);
        }

        let target = match self.source.next_target() {
            Ok(target) => target,
            Err(e) => {
                warn!("{e}; falling back to the text provider");
                match self.source.next_target() {
                    Ok(target) => target,
                    Err(_) => self.session().target().clone(),
                }
            }
        };

        self.driver
            .replace(TypingSession::new(target, self.settings.session_options()));
        self.state = AppState::Typing;
        self.status = None;
    }

    fn after(&mut self, transition: Transition) {
        if let Transition::Finished(result) = transition {
            self.state = AppState::Results;
            self.status = None;
            info!(
                "result forwarded: {:.1} wpm / {:.1}%",
                result.words_per_minute, result.accuracy_percent
            );
        }
    }

    pub fn on_tick_event(&mut self, event: &SessionEvent) {
        let transition = self.driver.on_event(event);
        self.after(transition);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return Flow::Quit,
                KeyCode::Char('r') => self.reset(true),
                KeyCode::Char('n') => self.reset(false),
                _ => {}
            }
            return Flow::Continue;
        }

        if key.code == KeyCode::Esc {
            self.driver.stop_schedules();
            return Flow::Quit;
        }

        match self.state {
            AppState::Typing => {
                let transition = match key.code {
                    KeyCode::Char(c) => self.driver.edit(|s| s.write(c)),
                    KeyCode::Backspace => self.driver.edit(|s| s.backspace()),
                    KeyCode::Delete => self.driver.edit(|s| s.delete()),
                    KeyCode::Left => self.driver.edit(|s| {
                        s.cursor_left();
                        Transition::Ignored
                    }),
                    KeyCode::Right => self.driver.edit(|s| {
                        s.cursor_right();
                        Transition::Ignored
                    }),
                    KeyCode::Enter => {
                        self.check();
                        Transition::Ignored
                    }
                    KeyCode::Tab if self.settings.mode != Mode::Race => {
                        self.driver.finish().map_or(Transition::Ignored, Transition::Finished)
                    }
                    _ => Transition::Ignored,
                };
                self.after(transition);
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.reset(true),
                KeyCode::Char('n') => self.reset(false),
                _ => {}
            },
        }

        Flow::Continue
    }

    fn check(&mut self) {
        self.status = Some(if self.session().check() {
            "Perfect!".to_string()
        } else {
            "Mismatch. Errors are highlighted in red.".to_string()
        });
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    typeduel::logging::init();

    let store = FileConfigStore::new();
    let settings = cli.apply(store.load());
    if cli.save {
        store.save(&settings)?;
        info!("saved settings to {}", store.path().display());
    }

    let mut source = TargetSource::new(provider_for(&settings));
    if let Some(prompt) = cli.prompt.clone() {
        source.set_custom_text(prompt);
    }

    let events = CrosstermEventSource::new();
    let mut app = match App::new(settings, source, events.sender()) {
        Ok(app) => app,
        Err(e) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, e.to_string()).exit();
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    app.driver.stop_schedules();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;

        match runner.step() {
            SessionEvent::Key(key) => {
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
            event @ (SessionEvent::ClockTick(_) | SessionEvent::OpponentTick(_)) => {
                app.on_tick_event(&event);
            }
            SessionEvent::Resize | SessionEvent::Tick => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use typeduel::{runtime::Scheduler, session::SessionState};

    struct Fixed(&'static str);

    impl TargetProvider for Fixed {
        fn next_text(&self) -> String {
            self.0.to_string()
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn code(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(text: &'static str, settings: Config) -> App {
        let (tx, _rx) = mpsc::channel();
        App::new(settings, TargetSource::new(Box::new(Fixed(text))), tx).unwrap()
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(key(c));
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["typeduel"]);

        assert_eq!(cli.mode, None);
        assert_eq!(cli.time_limit, None);
        assert_eq!(cli.prompt, None);
        assert!(!cli.save);
        assert_eq!(cli.apply(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_mode() {
        let cli = Cli::parse_from(["typeduel", "-m", "race"]);
        assert_eq!(cli.mode, Some(Mode::Race));

        let cli = Cli::parse_from(["typeduel", "--mode", "exercise"]);
        assert_eq!(cli.mode, Some(Mode::Exercise));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "typeduel",
            "--opponent-wpm",
            "55",
            "--opponent-accuracy",
            "80",
            "-s",
            "45",
            "--source",
            "sentences",
            "-f",
            "3",
        ]);
        let cfg = cli.apply(Config::default());

        assert_eq!(cfg.opponent_wpm, 55.0);
        assert_eq!(cfg.opponent_accuracy, 80.0);
        assert_eq!(cfg.time_limit_secs, Some(45));
        assert_eq!(cfg.source, Some(TextSource::Sentences));
        assert_eq!(cfg.sentences, 3);
    }

    #[test]
    fn test_cli_zero_time_limit_disables_countdown() {
        let cli = Cli::parse_from(["typeduel", "-s", "0"]);
        let cfg = cli.apply(Config {
            time_limit_secs: Some(30),
            ..Config::default()
        });
        assert_eq!(cfg.time_limit_secs, None);
    }

    #[test]
    fn test_cli_custom_prompt() {
        let cli = Cli::parse_from(["typeduel", "-p", "hello world"]);
        assert_eq!(cli.prompt, Some("hello world".to_string()));
    }

    #[test]
    fn test_app_new_rejects_blank_prompt() {
        let (tx, _rx) = mpsc::channel();
        let mut source = TargetSource::new(Box::new(Fixed("fallback")));
        source.set_custom_text("   ");
        assert!(App::new(Config::default(), source, tx).is_err());
    }

    #[test]
    fn test_typing_to_completion_shows_results() {
        let mut app = test_app("hi there", Config::default());
        type_str(&mut app, "hi there");

        assert_eq!(app.state, AppState::Results);
        assert_eq!(app.session().state(), SessionState::Finished);
        assert_eq!(app.driver.sink().sessions(), 1);
    }

    #[test]
    fn test_editing_keys() {
        let mut app = test_app("cat", Config::default());
        type_str(&mut app, "cx");
        app.handle_key(code(KeyCode::Backspace));
        app.handle_key(code(KeyCode::Left));
        app.handle_key(code(KeyCode::Delete));
        assert_eq!(app.session().typed_string(), "");
        assert_eq!(app.session().state(), SessionState::Active);
    }

    #[test]
    fn test_check_reports_mismatch() {
        let mut app = test_app("cat", Config::default());
        type_str(&mut app, "cx");
        app.handle_key(code(KeyCode::Enter));
        assert_eq!(
            app.status.as_deref(),
            Some("Mismatch. Errors are highlighted in red.")
        );
    }

    #[test]
    fn test_tab_finishes_early() {
        let settings = Config {
            mode: Mode::Exercise,
            ..Config::default()
        };
        let mut app = test_app("cat sat", settings);
        type_str(&mut app, "cat");
        app.handle_key(code(KeyCode::Tab));

        assert_eq!(app.state, AppState::Results);
        let result = app.session().result().copied().unwrap();
        assert!(!result.completed);
        assert_eq!(app.driver.sink().sessions(), 1);
    }

    #[test]
    fn test_tab_does_not_forfeit_race() {
        let settings = Config {
            mode: Mode::Race,
            ..Config::default()
        };
        let mut app = test_app("cat sat", settings);
        type_str(&mut app, "c");
        app.handle_key(code(KeyCode::Tab));
        assert_eq!(app.state, AppState::Typing);
    }

    #[test]
    fn test_restart_keeps_text_and_next_fetches_new() {
        let mut app = test_app("cat", Config::default());
        let generation = app.driver.generation();
        type_str(&mut app, "cat");
        assert_eq!(app.state, AppState::Results);

        app.handle_key(key('r'));
        assert_eq!(app.state, AppState::Typing);
        assert_eq!(app.session().target().as_str(), "cat");
        assert_eq!(app.session().state(), SessionState::Idle);
        assert_eq!(app.driver.generation(), generation + 1);

        app.handle_key(ctrl('n'));
        assert_eq!(app.session().state(), SessionState::Idle);
        assert_eq!(app.driver.generation(), generation + 2);
        assert_eq!(app.driver.sink().sessions(), 1);
    }

    #[test]
    fn test_escape_quits_and_stops_timers() {
        let settings = Config {
            mode: Mode::Race,
            ..Config::default()
        };
        let mut app = test_app("cat", settings);
        type_str(&mut app, "c");
        assert!(app.driver.clock_scheduler().is_running());
        assert!(app.driver.opponent_scheduler().is_running());

        assert_eq!(app.handle_key(code(KeyCode::Esc)), Flow::Quit);
        assert!(!app.driver.clock_scheduler().is_running());
        assert!(!app.driver.opponent_scheduler().is_running());
        assert_eq!(app.handle_key(ctrl('c')), Flow::Quit);
    }

    #[test]
    fn test_clock_events_update_session() {
        let mut app = test_app("cat", Config::default());
        type_str(&mut app, "c");
        app.on_tick_event(&SessionEvent::ClockTick(app.driver.generation()));
        assert_eq!(app.session().elapsed_secs(), 1);
    }
}
