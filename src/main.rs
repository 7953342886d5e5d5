mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use pacer::{
    engine::{EngineState, SessionEngine, SessionEvent},
    queue::OfflineQueue,
    recorder::{
        HttpRemoteStore, OfflineRemote, RecordOutcome, RemoteStore, SessionRecorder,
        SessionSummary,
    },
    runtime::{CrosstermEventSource, PacerEvent, Runner},
    settings::{FileSettingsStore, Settings, SettingsStore},
    wave::{self, WaveTrace},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin, Write},
    sync::mpsc::{self, Receiver, Sender},
    thread,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;
pub const WAVE_POINTS: usize = 200;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// guided breathing pacer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A guided breathing pacer: configure the phase durations, follow the pacer, and completed sessions sync to your backend (or queue locally until it is reachable)."
)]
pub struct Cli {
    /// inhale duration in seconds
    #[clap(short = 'i', long)]
    inhale: Option<f64>,

    /// hold duration after inhaling, in seconds
    #[clap(long)]
    hold_high: Option<f64>,

    /// exhale duration in seconds
    #[clap(short = 'e', long)]
    exhale: Option<f64>,

    /// hold duration after exhaling, in seconds
    #[clap(long)]
    hold_low: Option<f64>,

    /// session length in minutes
    #[clap(short = 'm', long)]
    minutes: Option<u64>,

    /// pacer rendering: a discrete gauge or a continuous oscilloscope
    #[clap(short = 's', long, value_enum, default_value_t = PacerStyle::Gauge)]
    style: PacerStyle,

    /// base URL of the sessions API
    #[clap(long, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// bearer token for the sessions API
    #[clap(long, env = "PACER_TOKEN")]
    token: Option<String>,

    /// skip the backend entirely; completed sessions queue locally
    #[clap(long)]
    offline: bool,

    /// disable the terminal-bell cue on phase changes
    #[clap(long)]
    no_cue: bool,

    /// deliver locally queued sessions and exit
    #[clap(long)]
    flush_pending: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum PacerStyle {
    Gauge,
    Scope,
}

impl PacerStyle {
    /// Technique label recorded with the session; matches the labels the
    /// mobile client uses so history interleaves cleanly.
    pub fn technique(&self) -> &'static str {
        match self {
            PacerStyle::Gauge => "Breathing 1",
            PacerStyle::Scope => "Breathing 2 (Oscilloscope)",
        }
    }

    fn toggled(&self) -> Self {
        match self {
            PacerStyle::Gauge => PacerStyle::Scope,
            PacerStyle::Scope => PacerStyle::Gauge,
        }
    }
}

impl Cli {
    /// Stored settings with any command-line overrides applied.
    fn apply_to(&self, stored: Settings) -> Settings {
        Settings {
            inhale_secs: self.inhale.unwrap_or(stored.inhale_secs),
            hold_high_secs: self.hold_high.unwrap_or(stored.hold_high_secs),
            exhale_secs: self.exhale.unwrap_or(stored.exhale_secs),
            hold_low_secs: self.hold_low.unwrap_or(stored.hold_low_secs),
            session_minutes: self.minutes.unwrap_or(stored.session_minutes),
            cue_on: if self.no_cue { false } else { stored.cue_on },
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub engine: SessionEngine,
    pub settings: Settings,
    pub style: PacerStyle,
    pub trace: WaveTrace,
    pub summary: Option<SessionSummary>,
    pub sync_notice: Option<String>,
    pub config_error: Option<String>,
}

impl App {
    pub fn new(settings: Settings, style: PacerStyle) -> Self {
        Self {
            engine: SessionEngine::new(),
            settings,
            style,
            trace: WaveTrace::new(WAVE_POINTS),
            summary: None,
            sync_notice: None,
            config_error: None,
        }
    }

    fn reset_session(&mut self) {
        self.engine.reset();
        self.trace.clear();
        self.summary = None;
        self.sync_notice = None;
        self.config_error = None;
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.flush_pending {
        return flush_pending(&cli);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileSettingsStore::new();
    let stored = store.load();
    let settings = cli.apply_to(stored.clone());
    if settings != stored {
        if let Err(e) = store.save(&settings) {
            warn!("could not persist settings: {e}");
        }
    }

    // Sessions queued by earlier offline runs get another delivery attempt
    // in the background, like the mobile client does on launch.
    spawn_startup_flush(&cli);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(settings, cli.style);
    let res = start_tui(&mut terminal, &mut app, &cli);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    cli: &Cli,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );
    let (sync_tx, sync_rx): (Sender<String>, Receiver<String>) = mpsc::channel();

    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        if let Ok(notice) = sync_rx.try_recv() {
            app.sync_notice = Some(notice);
        }

        match runner.step() {
            PacerEvent::Tick => {
                if let Some(event) = app.engine.tick() {
                    handle_session_event(app, cli, event, &sync_tx);
                }
                if app.engine.state() == EngineState::Running {
                    if let Some(pos) = app.engine.position() {
                        app.trace.push(wave::amplitude(&pos), pos.phase);
                    }
                }
            }
            PacerEvent::Resize => {}
            PacerEvent::Key(key) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    break;
                }
                match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => break,
                    KeyCode::Char(' ') => match app.engine.state() {
                        EngineState::Idle | EngineState::Paused => {
                            let settings = app.settings.clone();
                            match app.engine.start(&settings, app.style.technique()) {
                                Ok(()) => app.config_error = None,
                                Err(e) => app.config_error = Some(e.to_string()),
                            }
                        }
                        EngineState::Running => app.engine.pause(),
                        EngineState::Completed => {}
                    },
                    KeyCode::Char('r') => app.reset_session(),
                    KeyCode::Char('s') => {
                        if app.engine.state() == EngineState::Idle {
                            app.style = app.style.toggled();
                        }
                    }
                    _ => {}
                }
            }
        }

        terminal.draw(|f| ui::draw(app, f))?;
    }

    Ok(())
}

fn handle_session_event(app: &mut App, cli: &Cli, event: SessionEvent, sync_tx: &Sender<String>) {
    match event {
        SessionEvent::PhaseChanged { .. } => {
            if app.settings.cue_on {
                // Terminal bell as the phase-transition cue.
                print!("\x07");
                let _ = io::stdout().flush();
            }
        }
        SessionEvent::SessionCompleted { summary } => {
            if app.settings.cue_on {
                print!("\x07");
                let _ = io::stdout().flush();
            }
            app.summary = Some(summary.clone());
            spawn_record(summary, cli, sync_tx.clone());
        }
    }
}

/// Record the finished session off the UI thread; the outcome comes back
/// through the channel as a notice.
fn spawn_record(summary: SessionSummary, cli: &Cli, tx: Sender<String>) {
    let api_url = cli.api_url.clone();
    let token = cli.token.clone();
    let offline = cli.offline;

    thread::spawn(move || {
        let notice = match record_session(&summary, &api_url, token, offline) {
            Ok(RecordOutcome::Persisted) => "session synced".to_string(),
            Ok(RecordOutcome::QueuedLocally) => "offline — session saved locally".to_string(),
            Err(e) => {
                warn!("recording failed entirely: {e}");
                format!("could not save session: {e}")
            }
        };
        let _ = tx.send(notice);
    });
}

fn record_session(
    summary: &SessionSummary,
    api_url: &str,
    token: Option<String>,
    offline: bool,
) -> Result<RecordOutcome, Box<dyn Error + Send + Sync>> {
    let recorder = build_recorder(api_url, token, offline)?;
    Ok(recorder.record(summary)?)
}

fn build_recorder(
    api_url: &str,
    token: Option<String>,
    offline: bool,
) -> Result<SessionRecorder, Box<dyn Error + Send + Sync>> {
    let queue = OfflineQueue::open_default()?;
    let remote: Box<dyn RemoteStore + Send> = if offline {
        Box::new(OfflineRemote)
    } else {
        Box::new(HttpRemoteStore::new(api_url, token)?)
    };
    Ok(SessionRecorder::new(remote, queue))
}

fn spawn_startup_flush(cli: &Cli) {
    if cli.offline {
        return;
    }
    let api_url = cli.api_url.clone();
    let token = cli.token.clone();

    thread::spawn(move || match build_recorder(&api_url, token, false) {
        Ok(recorder) => match recorder.flush_queued() {
            Ok(report) if report.delivered > 0 => {
                info!(
                    "delivered {} previously queued session(s)",
                    report.delivered
                );
            }
            Ok(_) => {}
            Err(e) => warn!("startup flush failed: {e}"),
        },
        Err(e) => warn!("startup flush unavailable: {e}"),
    });
}

/// Headless mode: drain the offline queue and report, no terminal UI.
fn flush_pending(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let recorder =
        build_recorder(&cli.api_url, cli.token.clone(), cli.offline).map_err(|e| -> Box<dyn Error> { e })?;

    if recorder.queued()? == 0 {
        println!("no sessions queued");
        return Ok(());
    }

    let report = recorder.flush_queued()?;
    println!(
        "delivered {}, still queued {}",
        report.delivered, report.remaining
    );
    Ok(())
}
