//! Terminal User Interface for query-console.
//!
//! Provides the main TUI application loop using ratatui and crossterm. Engine
//! requests are sent from spawned tasks; their completions come back over a
//! channel so the loop keeps drawing while the engine works.

pub mod app;
mod events;
mod ui;
pub mod widgets;

pub use app::{Action, App, Focus};
pub use events::{Event, EventHandler};

use crate::console::{Completion, Console, PendingRequest};
use crate::engine::EngineHandle;
use crate::error::{ConsoleError, Result};
use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Capacity of the event and completion channels.
const CHANNEL_CAPACITY: usize = 32;

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    keyboard_enhanced: bool,
    /// Stops the event reader thread.
    shutdown: CancellationToken,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let (terminal, keyboard_enhanced) = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
            keyboard_enhanced,
            shutdown: CancellationToken::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
        enable_raw_mode()
            .map_err(|e| ConsoleError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
            .map_err(|e| ConsoleError::internal(format!("Failed to enter alternate screen: {e}")))?;

        // Lets terminals that support it report Ctrl-Enter distinctly from Enter.
        let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
        if keyboard_enhanced {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )
            .map_err(|e| {
                ConsoleError::internal(format!("Failed to enable keyboard enhancement: {e}"))
            })?;
        }

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)
            .map_err(|e| ConsoleError::internal(format!("Failed to create terminal: {e}")))?;

        Ok((terminal, keyboard_enhanced))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        if self.keyboard_enhanced {
            execute!(self.terminal.backend_mut(), PopKeyboardEnhancementFlags).map_err(|e| {
                ConsoleError::internal(format!("Failed to disable keyboard enhancement: {e}"))
            })?;
        }

        disable_raw_mode()
            .map_err(|e| ConsoleError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        )
        .map_err(|e| ConsoleError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| ConsoleError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    /// Runs the main event loop until the user quits.
    ///
    /// `initial` is sent right away (e.g. loading the database named on the
    /// command line).
    pub async fn run(&mut self, console: &mut Console, initial: Option<PendingRequest>) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        let shutdown = self.shutdown.clone();
        panic::set_hook(Box::new(move |panic_info| {
            shutdown.cancel();
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste);
            original_hook(panic_info);
        }));

        let mut app = App::new(console.query());
        let (completion_tx, mut completion_rx) = mpsc::channel::<Completion>(CHANNEL_CAPACITY);
        let (event_tx, mut event_rx) = mpsc::channel::<Event>(CHANNEL_CAPACITY);
        spawn_event_reader(self.event_handler, event_tx, self.shutdown.clone());

        if let Some(pending) = initial {
            send_request(pending, console.engine(), &completion_tx);
        }

        let result = self
            .run_event_loop(&mut app, console, &completion_tx, &mut completion_rx, &mut event_rx)
            .await;

        self.shutdown.cancel();

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    /// The main event loop, separated for cleaner error handling.
    async fn run_event_loop(
        &mut self,
        app: &mut App,
        console: &mut Console,
        completion_tx: &mpsc::Sender<Completion>,
        completion_rx: &mut mpsc::Receiver<Completion>,
        event_rx: &mut mpsc::Receiver<Event>,
    ) -> Result<()> {
        loop {
            app.clear_expired_toast();
            app.sync_spinner(console.busy());

            self.terminal
                .draw(|frame| ui::render(frame, app, console))
                .map_err(|e| ConsoleError::internal(format!("Failed to draw: {e}")))?;

            if !app.running {
                break;
            }

            tokio::select! {
                event = event_rx.recv() => {
                    let Some(event) = event else {
                        return Err(ConsoleError::internal("Terminal event reader stopped"));
                    };
                    let action = app.handle_event(event, console.awaiting_confirmation());
                    if let Some(pending) = dispatch(action, app, console).await {
                        send_request(pending, console.engine(), completion_tx);
                    }
                }

                Some(completion) = completion_rx.recv() => {
                    if let Some(pending) = absorb(completion, app, console).await {
                        send_request(pending, console.engine(), completion_tx);
                    }
                }
            }
        }

        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        self.shutdown.cancel();
        let _ = self.restore_terminal();
    }
}

/// Reads terminal events on a blocking thread and forwards them.
fn spawn_event_reader(
    handler: EventHandler,
    tx: mpsc::Sender<Event>,
    shutdown: CancellationToken,
) {
    tokio::task::spawn_blocking(move || {
        while !shutdown.is_cancelled() {
            match handler.next() {
                Ok(Event::Tick) => {
                    // Ticks only redraw; skip them when the loop is busy.
                    let _ = tx.try_send(Event::Tick);
                }
                Ok(event) => {
                    if tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("{}: {}", e.category(), e);
                    break;
                }
            }
        }
        debug!("Event reader stopped");
    });
}

/// Sends `pending` from a spawned task and posts its completion back.
fn send_request(pending: PendingRequest, engine: &EngineHandle, tx: &mpsc::Sender<Completion>) {
    let engine = engine.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let completion = pending.send(&engine).await;
        if tx.send(completion).await.is_err() {
            debug!("Completion dropped: event loop has exited");
        }
    });
}

/// Applies a key action to the console. Returns the request to send, if any.
pub async fn dispatch(action: Action, app: &mut App, console: &mut Console) -> Option<PendingRequest> {
    match action {
        Action::None => None,
        Action::Quit => {
            info!("Quit requested");
            None
        }
        Action::Execute => {
            app.results_scroll = 0;
            Some(console.execute_editor())
        }
        Action::Save => Some(console.save()),
        Action::Load(path) => {
            info!("Loading database file {}", path.display());
            console.load_file(&path).await
        }
        Action::Confirm(choice) => {
            app.results_scroll = 0;
            console.confirm(choice);
            None
        }
        Action::QueryEdited => {
            console.set_query(app.editor.text()).await;
            None
        }
    }
}

/// Applies an engine completion and brings the app in step with the console.
pub async fn absorb(
    completion: Completion,
    app: &mut App,
    console: &mut Console,
) -> Option<PendingRequest> {
    let next = console.complete(completion).await;

    if let Some(notice) = console.take_notice() {
        app.show_toast(notice);
    }
    if app.editor.text() != console.query() {
        app.editor.set_text(console.query());
    }
    if next.is_some() {
        app.results_scroll = 0;
    }

    next
}
