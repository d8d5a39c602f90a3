use crate::def::ViewDefinition;
use crate::directive::Directive;
use crate::engine::{Engine, EngineOptions};
use crate::error::{CheckError, ViewError};
use crate::event::DomEvent;
use crate::present::DocumentView;
use crate::renderer::RenderStrategy;
use crate::view::ViewId;
use crossterm::{
    cursor,
    event::{DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use futures::stream::BoxStream;
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stderr, stdout, Stderr, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;

/// Output target for the terminal UI.
///
/// By default the document renders to **stdout**.  When your program's stdout
/// is piped, switch to [`Stderr`](OutputTarget::Stderr) so the UI goes to the
/// terminal while data flows through the pipe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputTarget {
    /// Write to stdout (default).
    #[default]
    Stdout,
    /// Write to stderr (useful when stdout is piped).
    Stderr,
}

/// Writer that wraps either stdout or stderr.
enum Output {
    Stdout(Stdout),
    Stderr(Stderr),
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout(w) => w.write(buf),
            Output::Stderr(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout(w) => w.flush(),
            Output::Stderr(w) => w.flush(),
        }
    }
}

impl Output {
    fn new(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Stdout => Output::Stdout(stdout()),
            OutputTarget::Stderr => Output::Stderr(stderr()),
        }
    }
}

/// Errors that can occur while initializing or running a [`Program`].
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    /// An I/O error from terminal setup, rendering, or teardown.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A change-detection pass failed.
    #[error(transparent)]
    Check(#[from] CheckError),
    /// An event could not be delivered.
    #[error(transparent)]
    View(#[from] ViewError),
}

/// Configuration options for a [`Program`].
///
/// All fields have sensible defaults (see [`Default`] impl).  Use struct
/// update syntax to override only the options you need:
///
/// # Example
///
/// ```rust,ignore
/// use sprig_core::{ProgramOptions, OutputTarget};
/// use std::time::Duration;
///
/// let opts = ProgramOptions {
///     fps: 30,
///     title: Some("Todo".into()),
///     tick: Some(Duration::from_secs(1)),
///     log_file: Some("sprig.log".into()),
///     ..ProgramOptions::default()
/// };
/// ```
pub struct ProgramOptions {
    /// Target frames per second (default: 60, max: 120).
    pub fps: u32,
    /// Start in alternate screen (default: true).
    pub alt_screen: bool,
    /// Set terminal title.
    pub title: Option<String>,
    /// Whether to catch panics and restore terminal (default: true).
    pub catch_panics: bool,
    /// Whether to handle signals gracefully (default: true).
    pub handle_signals: bool,
    /// Write `tracing` output to this file, filtered by `RUST_LOG`
    /// (default filter: `info`).
    pub log_file: Option<std::path::PathBuf>,
    /// Output target: stdout (default) or stderr.
    pub output: OutputTarget,
    /// Run a change-detection pass at this interval even without events.
    pub tick: Option<Duration>,
    /// Verify every pass (default: `cfg!(debug_assertions)`).
    pub dev_mode: bool,
    /// Reflect bindings into `ng-reflect-*` attributes.
    pub debug_info: bool,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            fps: 60,
            alt_screen: true,
            title: None,
            catch_panics: true,
            handle_signals: true,
            log_file: None,
            output: OutputTarget::default(),
            tick: None,
            dev_mode: cfg!(debug_assertions),
            debug_info: false,
        }
    }
}

type EngineUpdate = Box<dyn FnOnce(&mut Engine, ViewId) + Send>;

enum Control {
    Update(EngineUpdate),
    Quit,
}

/// A cloneable handle to a running [`Program`] for external control.
///
/// `ProgramHandle` is [`Clone`] and can safely be sent across threads or into
/// async tasks.  Updates are applied on the program's event loop, followed by
/// a change-detection pass.
///
/// Obtain a handle by calling [`Program::handle`] before entering the run
/// loop.
#[derive(Clone)]
pub struct ProgramHandle {
    tx: mpsc::UnboundedSender<Control>,
    killed: Arc<AtomicBool>,
}

impl ProgramHandle {
    /// Mutate the root component.
    ///
    /// The root view is marked for check, so on-push roots are refreshed too.
    /// Returns silently if the program has already exited.
    pub fn update<T: 'static>(&self, f: impl FnOnce(&mut T) + Send + 'static) {
        self.send(move |engine, root| {
            if let Some(component) = engine.component_mut::<T>(root) {
                f(component);
            }
            engine.mark_for_check(root);
        });
    }

    /// Run an arbitrary closure against the engine on the event loop.
    pub fn send(&self, f: impl FnOnce(&mut Engine, ViewId) + Send + 'static) {
        let _ = self.tx.send(Control::Update(Box::new(f)));
    }

    /// Ask the program to exit after the current iteration.
    pub fn quit(&self) {
        let _ = self.tx.send(Control::Quit);
    }

    /// Force-kill the program immediately.
    ///
    /// Sets an atomic flag that the event loop checks on every iteration.
    pub fn kill(&self) {
        self.killed.store(true, Ordering::SeqCst);
    }
}

/// Drives a root view on a real terminal.
///
/// `Program` owns an [`Engine`] with a direct document backend, renders the
/// document through ratatui, and runs a check (update plus, in dev mode,
/// verification) after every terminal event, handle update and timer tick.
/// Key presses are raised as `keydown` on the `window` and `document`
/// targets; `Ctrl+C` quits.
///
/// # Example
///
/// ```rust,ignore
/// use sprig_core::{Program, ProgramError};
///
/// #[tokio::main]
/// async fn main() -> Result<(), ProgramError> {
///     let (engine, root) = Program::new(app_view()?, App::default())?.run().await?;
///     Ok(())
/// }
/// ```
pub struct Program {
    engine: Engine,
    root: ViewId,
    terminal: Terminal<CrosstermBackend<Output>>,
    tx: mpsc::UnboundedSender<Control>,
    rx: mpsc::UnboundedReceiver<Control>,
    options: ProgramOptions,
    needs_redraw: bool,
    should_quit: bool,
    killed: Arc<AtomicBool>,
    last_generation: Option<u64>,
}

impl Program {
    /// Create a new program with default options.
    ///
    /// Returns an error if terminal initialization fails.
    pub fn new<D: Directive>(def: impl Into<Arc<ViewDefinition>>, component: D) -> Result<Self, ProgramError> {
        Self::with_options(def, component, ProgramOptions::default())
    }

    /// Create a new program with custom options.
    ///
    /// Returns an error if terminal initialization or the first check fails.
    pub fn with_options<D: Directive>(
        def: impl Into<Arc<ViewDefinition>>,
        component: D,
        options: ProgramOptions,
    ) -> Result<Self, ProgramError> {
        if let Some(ref path) = options.log_file {
            log_to_file(path)?;
        }

        let mut engine = Engine::new(EngineOptions {
            dev_mode: options.dev_mode,
            debug_info: options.debug_info,
            strategy: RenderStrategy::default(),
        });
        let root = engine.create_root_view(def.into(), Box::new(component));
        engine.tick(root)?;

        let terminal = init_terminal(&options)?;
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::info!(?root, "program initialized");

        Ok(Self {
            engine,
            root,
            terminal,
            tx,
            rx,
            options,
            needs_redraw: true,
            should_quit: false,
            killed: Arc::new(AtomicBool::new(false)),
            last_generation: None,
        })
    }

    /// Get a handle for external control (updates, quit, force-kill).
    pub fn handle(&self) -> ProgramHandle {
        ProgramHandle {
            tx: self.tx.clone(),
            killed: self.killed.clone(),
        }
    }

    /// Run the program. Returns the engine and root view once it quits.
    pub async fn run(mut self) -> Result<(Engine, ViewId), ProgramError> {
        let result = self.event_loop().await;
        tracing::info!("shutting down");
        restore_terminal(&self.options)?;
        result?;
        Ok((self.engine, self.root))
    }

    async fn event_loop(&mut self) -> Result<(), ProgramError> {
        self.render()?;

        let fps = self.options.fps.clamp(1, 120);
        let mut frame_interval = tokio::time::interval(Duration::from_secs_f64(1.0 / fps as f64));
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks: BoxStream<'static, tokio::time::Instant> = match self.options.tick {
            Some(period) => {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                tokio_stream::wrappers::IntervalStream::new(interval).boxed()
            }
            None => futures::stream::pending().boxed(),
        };
        let mut events = EventStream::new();
        let handle_signals = self.options.handle_signals;

        loop {
            if self.killed.load(Ordering::SeqCst) {
                return Ok(());
            }

            tokio::select! {
                biased;

                _ = tokio::signal::ctrl_c(), if handle_signals => {
                    tracing::info!("received ctrl+c signal");
                    return Ok(());
                }

                Some(control) = self.rx.recv() => {
                    self.apply(control);

                    // Micro-batch: drain additional updates within 100μs, up to 100 of them
                    let deadline = Instant::now() + Duration::from_micros(100);
                    let mut batch_count = 0u32;
                    while Instant::now() < deadline && batch_count < 100 {
                        match self.rx.try_recv() {
                            Ok(control) => {
                                self.apply(control);
                                batch_count += 1;
                            }
                            Err(_) => break,
                        }
                    }
                    self.check()?;

                    if self.should_quit || self.killed.load(Ordering::SeqCst) {
                        return Ok(());
                    }
                }

                Some(event) = events.next() => {
                    match event {
                        Ok(event) => self.handle_terminal_event(event)?,
                        Err(err) => tracing::warn!(%err, "terminal event stream error"),
                    }
                    if self.should_quit {
                        return Ok(());
                    }
                }

                Some(_) = ticks.next() => {
                    self.check()?;
                }

                _ = frame_interval.tick() => {
                    if self.needs_redraw {
                        self.render()?;
                        self.needs_redraw = false;
                    }
                }
            }
        }
    }

    fn apply(&mut self, control: Control) {
        match control {
            Control::Update(f) => f(&mut self.engine, self.root),
            Control::Quit => self.should_quit = true,
        }
    }

    fn handle_terminal_event(&mut self, event: Event) -> Result<(), ProgramError> {
        if let Event::Key(key) = &event {
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                self.should_quit = true;
                return Ok(());
            }
        }
        if matches!(event, Event::Resize(..)) {
            self.needs_redraw = true;
            self.last_generation = None;
        }
        let Some(dom) = DomEvent::from_terminal(&event) else {
            return Ok(());
        };
        let mut delivered = 0;
        for target in ["window", "document"] {
            delivered += self.engine.fire_global(target, dom.name, &dom.payload)?;
        }
        tracing::trace!(event = dom.name, delivered, "terminal event");
        if delivered > 0 {
            self.check()?;
        }
        Ok(())
    }

    fn check(&mut self) -> Result<(), ProgramError> {
        self.engine.tick(self.root)?;
        let generation = self.engine.document().map(|d| d.generation());
        if generation != self.last_generation {
            self.needs_redraw = true;
        }
        Ok(())
    }

    fn render(&mut self) -> Result<(), ProgramError> {
        let Some(document) = self.engine.document() else {
            return Ok(());
        };
        self.last_generation = Some(document.generation());
        self.terminal.draw(|frame| {
            frame.render_widget(DocumentView::new(document), frame.area());
        })?;
        Ok(())
    }
}

/// Send `tracing` output to a file (appending), filtered by `RUST_LOG`.
///
/// The terminal belongs to the UI while a program runs, so this is the way to
/// see the engine's logs. Does nothing if a global subscriber is already set.
///
/// ```rust,ignore
/// sprig_core::runtime::log_to_file("sprig.log")?;
/// tracing::info!("visible in sprig.log");
/// ```
pub fn log_to_file(path: impl AsRef<std::path::Path>) -> Result<(), std::io::Error> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .try_init();
    Ok(())
}

fn init_terminal(options: &ProgramOptions) -> Result<Terminal<CrosstermBackend<Output>>, ProgramError> {
    // Install panic hook that restores terminal (only once to avoid stacking)
    if options.catch_panics {
        use std::sync::Once;
        static HOOK_INSTALLED: Once = Once::new();
        let alt_screen = options.alt_screen;
        let output_target = options.output;
        HOOK_INSTALLED.call_once(|| {
            let original_hook = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                let _ = restore_terminal_minimal(alt_screen, output_target);
                original_hook(info);
            }));
        });
    }

    enable_raw_mode()?;
    let mut writer = Output::new(options.output);

    if options.alt_screen {
        execute!(writer, EnterAlternateScreen)?;
    }
    execute!(writer, EnableBracketedPaste)?;
    if let Some(ref title) = options.title {
        execute!(writer, SetTitle(title))?;
    }
    execute!(writer, cursor::Hide)?;

    let backend = CrosstermBackend::new(writer);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(options: &ProgramOptions) -> Result<(), ProgramError> {
    restore_terminal_minimal(options.alt_screen, options.output)?;
    Ok(())
}

fn restore_terminal_minimal(alt_screen: bool, output_target: OutputTarget) -> Result<(), std::io::Error> {
    // Best-effort cleanup: keep going if individual steps fail.
    let r1 = disable_raw_mode();
    let mut writer = Output::new(output_target);
    execute!(writer, DisableBracketedPaste).ok();
    execute!(writer, cursor::Show).ok();
    if alt_screen {
        execute!(writer, LeaveAlternateScreen).ok();
    }
    r1
}
