pub mod ui;

use std::{
    cell::Cell,
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use typur::{
    app_dirs::AppDirs,
    config::Preferences,
    logging,
    quote::{
        FixedQuote, OfflineQuotes, QuotableClient, Quote, QuoteDelivery, QuoteFetcher,
        QuoteSource, DEFAULT_API_URL, DEFAULT_MAX_LENGTH,
    },
    runtime::{CrosstermEventSource, FixedTicker, Runner, TypurEvent},
    sentence::{InputOutcome, Sentence},
    session::SessionConfig,
    share::{BrowserShare, ShareSink},
    store::FileKvStore,
};

/// How long the hard-mode shake lasts.
const SHAKE_DURATION: Duration = Duration::from_millis(300);

/// typing speed practice: retype a random quote as fast as you can
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Retype a random quote as quickly and accurately as you can. Tracks elapsed time, characters per minute and your last five results."
)]
pub struct Cli {
    /// custom text to type instead of a fetched quote
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// author shown for a custom prompt
    #[clap(short = 'a', long, requires = "prompt")]
    author: Option<String>,

    /// pick quotes from the bundled collection instead of the network
    #[clap(short = 'o', long)]
    offline: bool,

    /// longest quote to ask the quote service for
    #[clap(short = 'm', long, default_value_t = DEFAULT_MAX_LENGTH)]
    max_length: usize,

    /// quote service endpoint returning {content, author}
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// restart the quote on the first wrong character (saved)
    #[clap(long)]
    hard_mode: bool,

    /// hide the running clock while typing (saved)
    #[clap(long)]
    hide_time: bool,

    /// directory for settings, history and the log file
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// do not write a log file
    #[clap(long)]
    no_log: bool,
}

impl Cli {
    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(AppDirs::data_dir)
    }

    fn quote_source(&self) -> Result<Arc<dyn QuoteSource>, Box<dyn Error>> {
        if let Some(prompt) = &self.prompt {
            let author = self.author.clone().unwrap_or_else(|| "you".to_string());
            return Ok(Arc::new(FixedQuote(Quote::new(prompt.trim(), author))));
        }
        if self.offline {
            return Ok(Arc::new(OfflineQuotes::load()?));
        }
        Ok(Arc::new(QuotableClient::new(
            self.api_url.clone(),
            self.max_length,
        )?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Loading,
    Typing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Control {
    Continue,
    Quit,
}

pub struct App {
    pub state: AppState,
    pub sentence: Option<Sentence>,
    pub prefs: Preferences,
    pub settings_open: bool,
    pub fetch_error: Option<String>,
    pub spinner_frame: usize,
    pub shake_started: Option<Instant>,
    /// Latest clock reading, pushed by the timer subscription.
    pub clock: Rc<Cell<Option<u64>>>,
    clock_changed: Rc<Cell<bool>>,
    fetcher: QuoteFetcher,
    share: Box<dyn ShareSink>,
}

impl App {
    pub fn new(prefs: Preferences, fetcher: QuoteFetcher, share: Box<dyn ShareSink>) -> Self {
        Self {
            state: AppState::Loading,
            sentence: None,
            prefs,
            settings_open: false,
            fetch_error: None,
            spinner_frame: 0,
            shake_started: None,
            clock: Rc::new(Cell::new(None)),
            clock_changed: Rc::new(Cell::new(false)),
            fetcher,
            share,
        }
    }

    pub fn request_quote(&mut self) {
        let generation = self.fetcher.request();
        tracing::debug!(generation, "requested quote");
        self.state = AppState::Loading;
        self.fetch_error = None;
    }

    fn on_quote(&mut self, delivery: QuoteDelivery) {
        if !self.fetcher.is_current(delivery.generation) {
            tracing::debug!(generation = delivery.generation, "ignoring stale quote");
            return;
        }
        match delivery.result {
            Ok(quote) => {
                tracing::info!(author = %quote.author, chars = quote.content.chars().count(), "new quote");
                self.install(quote);
                self.state = AppState::Typing;
            }
            Err(e) => {
                self.fetch_error = Some(e.to_string());
            }
        }
    }

    fn install(&mut self, quote: Quote) {
        match self.sentence.as_mut() {
            Some(sentence) => sentence.replace_quote(quote),
            None => {
                let config = SessionConfig {
                    hard_mode: self.prefs.settings().hard_mode,
                };
                let mut sentence = Sentence::new(quote, config);
                // one subscription per clock, kept for the life of the app
                let clock = Rc::clone(&self.clock);
                sentence.timer_mut().subscribe(move |secs| clock.set(*secs));
                let changed = Rc::clone(&self.clock_changed);
                sentence.timer_mut().subscribe(move |_| changed.set(true));
                self.sentence = Some(sentence);
            }
        }
    }

    /// Returns true when the screen needs a redraw.
    fn on_tick(&mut self, now: Instant) -> bool {
        let mut dirty = false;
        match self.state {
            AppState::Loading => {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                dirty = true;
            }
            AppState::Typing => {
                if let Some(sentence) = self.sentence.as_mut() {
                    sentence.on_tick(now);
                }
            }
        }
        if let Some(started) = self.shake_started {
            if now.saturating_duration_since(started) >= SHAKE_DURATION {
                self.shake_started = None;
            }
            dirty = true;
        }
        dirty || self.clock_changed.replace(false)
    }

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Control {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc if !self.settings_open => return Control::Quit,
            KeyCode::Char('c') if ctrl => return Control::Quit,
            KeyCode::Char('s') if ctrl => {
                self.settings_open = !self.settings_open;
                return Control::Continue;
            }
            KeyCode::Char('n') if ctrl => {
                self.request_quote();
                return Control::Continue;
            }
            _ => {}
        }

        if self.settings_open {
            self.on_settings_key(key);
            return Control::Continue;
        }

        if self.state == AppState::Loading {
            return Control::Continue;
        }

        let completed = self.sentence.as_ref().is_some_and(Sentence::is_completed);
        if completed {
            return self.on_results_key(key);
        }

        match key.code {
            KeyCode::Tab => self.restart(),
            KeyCode::Backspace => {
                let mut raw = self.current_input();
                if raw.pop().is_some() {
                    self.submit(&raw, now);
                }
            }
            KeyCode::Char('w') if ctrl => {
                if !self.current_input().is_empty() {
                    self.submit("", now);
                }
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut raw = self.current_input();
                raw.push(c);
                self.submit(&raw, now);
            }
            _ => {}
        }
        Control::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Control {
        match key.code {
            KeyCode::Char('q') => return Control::Quit,
            KeyCode::Char('r') | KeyCode::Tab => self.restart(),
            KeyCode::Char('n') => self.request_quote(),
            KeyCode::Char('s') => self.share_result(),
            _ => {}
        }
        Control::Continue
    }

    fn on_settings_key(&mut self, key: KeyEvent) {
        let result = match key.code {
            KeyCode::Char('h') => self.prefs.update_settings(|s| s.hard_mode = !s.hard_mode),
            KeyCode::Char('t') => self.prefs.update_settings(|s| s.show_time = !s.show_time),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.settings_open = false;
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "could not save settings");
        }
        let hard_mode = self.prefs.settings().hard_mode;
        if let Some(sentence) = self.sentence.as_mut() {
            sentence.set_hard_mode(hard_mode);
        }
    }

    fn current_input(&self) -> String {
        self.sentence
            .as_ref()
            .map(|s| s.current_input().to_string())
            .unwrap_or_default()
    }

    fn submit(&mut self, raw: &str, now: Instant) {
        let Some(sentence) = self.sentence.as_mut() else {
            return;
        };
        match sentence.submit_input(raw, now) {
            InputOutcome::Completed { cpm: Some(cpm) } => {
                if let Err(e) = self.prefs.record(cpm) {
                    tracing::warn!(error = %e, "could not save history");
                }
            }
            InputOutcome::Completed { cpm: None } => {
                tracing::info!("finished within a second, result not recorded");
            }
            InputOutcome::Restarted => self.shake_started = Some(now),
            InputOutcome::Typed | InputOutcome::Advanced | InputOutcome::Ignored => {}
        }
    }

    fn restart(&mut self) {
        if let Some(sentence) = self.sentence.as_mut() {
            sentence.reset();
        }
    }

    fn share_result(&self) {
        let Some(cpm) = self.sentence.as_ref().and_then(Sentence::final_cpm) else {
            return;
        };
        if !self.share.is_available() {
            return;
        }
        if let Err(e) = self.share.share(cpm) {
            tracing::warn!(error = %e, "share failed");
        }
    }

    pub fn can_share(&self) -> bool {
        self.share.is_available()
            && self
                .sentence
                .as_ref()
                .and_then(Sentence::final_cpm)
                .is_some()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let data_dir = cli.data_dir();
    if !cli.no_log {
        let log_path = data_dir.join(logging::LOG_FILE);
        if let Err(e) = logging::init(&log_path) {
            eprintln!("typur: logging disabled, cannot open {}: {e}", log_path.display());
        }
    }

    let mut prefs = Preferences::load(Box::new(FileKvStore::with_dir(&data_dir)));
    if cli.hard_mode {
        prefs.update_settings(|s| s.hard_mode = true)?;
    }
    if cli.hide_time {
        prefs.update_settings(|s| s.show_time = false)?;
    }

    let source = cli.quote_source()?;
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let fetcher = QuoteFetcher::new(source, runner.sender());
    let mut app = App::new(prefs, fetcher, Box::new(BrowserShare));
    app.request_quote();

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    E: typur::runtime::TypurEventSource,
    T: typur::runtime::Ticker,
{
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let now = Instant::now();
        let redraw = match runner.step() {
            TypurEvent::Tick => app.on_tick(now),
            TypurEvent::Resize => true,
            TypurEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.on_key(key, now) == Control::Quit {
                    break;
                }
                true
            }
            TypurEvent::QuoteLoaded(delivery) => {
                app.on_quote(delivery);
                true
            }
        };

        if redraw {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use typur::store::MemoryKvStore;

    struct NoShare;

    impl ShareSink for NoShare {
        fn is_available(&self) -> bool {
            false
        }

        fn share(&self, _cpm: f64) -> io::Result<()> {
            Ok(())
        }
    }

    fn app_with(quote: &str) -> (App, mpsc::Receiver<TypurEvent>) {
        let (tx, rx) = mpsc::channel();
        let source = Arc::new(FixedQuote(Quote::new(quote, "someone")));
        let prefs = Preferences::load(Box::new(MemoryKvStore::new()));
        let mut app = App::new(prefs, QuoteFetcher::new(source, tx), Box::new(NoShare));
        app.request_quote();
        (app, rx)
    }

    fn deliver(app: &mut App, rx: &mpsc::Receiver<TypurEvent>) {
        match rx.recv_timeout(Duration::from_secs(5)) {
            Ok(TypurEvent::QuoteLoaded(delivery)) => app.on_quote(delivery),
            other => panic!("expected a quote, got {other:?}"),
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn type_str(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            assert_eq!(app.on_key(key(c), now), Control::Continue);
        }
    }

    #[test]
    fn typing_a_quote_records_history() {
        let (mut app, rx) = app_with("hi there");
        deliver(&mut app, &rx);
        assert_eq!(app.state, AppState::Typing);

        let t0 = Instant::now();
        type_str(&mut app, "hi ", t0);
        type_str(&mut app, "ther", t0);
        app.on_tick(t0 + Duration::from_secs(2));
        assert_eq!(app.clock.get(), Some(2));
        type_str(&mut app, "e", t0 + Duration::from_secs(4));

        let sentence = app.sentence.as_ref().unwrap();
        assert!(sentence.is_completed());
        assert_eq!(app.prefs.history().latest(), Some(120.0));
        assert_eq!(app.clock.get(), Some(4));
        assert!(!app.can_share());
    }

    #[test]
    fn backspace_edits_the_input() {
        let (mut app, rx) = app_with("cat");
        deliver(&mut app, &rx);
        let now = Instant::now();
        type_str(&mut app, "cx", now);
        app.on_key(KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE), now);
        assert_eq!(app.current_input(), "c");
    }

    #[test]
    fn hard_mode_toggle_reaches_the_engine() {
        let (mut app, rx) = app_with("cat");
        deliver(&mut app, &rx);
        let now = Instant::now();
        app.on_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL), now);
        assert!(app.settings_open);
        app.on_key(key('h'), now);
        app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now);
        assert!(!app.settings_open);
        assert!(app.prefs.settings().hard_mode);

        type_str(&mut app, "cb", now);
        assert_eq!(app.current_input(), "");
        assert!(app.shake_started.is_some());
    }

    #[test]
    fn stale_quotes_are_ignored() {
        let (mut app, rx) = app_with("first");
        app.request_quote();
        // both workers may deliver; only the newest generation is accepted
        let mut accepted = 0;
        while let Ok(TypurEvent::QuoteLoaded(delivery)) = rx.recv_timeout(Duration::from_millis(500)) {
            if app.fetcher.is_current(delivery.generation) {
                accepted += 1;
            }
            app.on_quote(delivery);
        }
        assert_eq!(accepted, 1);
        assert_eq!(app.state, AppState::Typing);
    }

    #[test]
    fn escape_quits() {
        let (mut app, _rx) = app_with("x");
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.on_key(esc, Instant::now()), Control::Quit);
    }
}
