use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor::Show,
    event::{self, Event as CEvent, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::{error, info};
use tui::{backend::CrosstermBackend, Terminal};

use pop_dashboard::app::App;
use pop_dashboard::config::DashboardArgs;
use pop_dashboard::{logging, ui};

enum Event<I> {
    Input(I),
    Tick,
}

/// Puts the terminal back on drop, including early returns and panics.
struct TerminalGuard {
    restore: fn(),
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard {
            restore: restore_terminal,
        };
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

fn main() -> anyhow::Result<()> {
    let args = DashboardArgs::parse();
    logging::init_file_tracing(&args.log_file)
        .with_context(|| format!("failed to open log file {}", args.log_file.display()))?;

    let source = args.source.source()?;
    info!(path = %source.path.display(), encoding = source.encoding.name(), "starting dashboard");
    let app = App::new(source).context("failed to load the population table")?;

    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal, app, Duration::from_millis(args.tick_rate_ms));
    drop(terminal);
    drop(guard);

    if let Err(err) = &result {
        error!(error = %err, "dashboard stopped");
    }
    result
}

fn run<B, S>(terminal: &mut Terminal<B>, mut app: App<S>, tick_rate: Duration) -> anyhow::Result<()>
where
    B: tui::backend::Backend,
    S: pop_dashboard::TableSource,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            match event::poll(timeout) {
                Ok(true) => {
                    if let Ok(CEvent::Key(key)) = event::read() {
                        if tx.send(Event::Input(key)).is_err() {
                            return;
                        }
                    }
                }
                Ok(false) => {}
                Err(_) => return,
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.send(Event::Tick).is_err() {
                    return;
                }
                last_tick = Instant::now();
            }
        }
    });

    loop {
        terminal.draw(|f| ui::draw(f, &app))?;

        match rx.recv()? {
            Event::Input(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                app.on_key(code);
                if app.should_quit {
                    info!("quit requested");
                    return Ok(());
                }
            }
            Event::Input(_) | Event::Tick => {}
        }
    }
}
