pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{Result, WatchError};
use crate::config::Config;
use crate::session::SessionController;
use crate::source::reddit::RedditConnector;

use self::app::TuiApp;
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(config: Config) -> Result<()> {
    if config.channels.is_empty() {
        return Err(WatchError::Config(
            "no channels configured; set `channels` in the config or pass --channels".into(),
        ));
    }

    let connector = Arc::new(RedditConnector::new(config.reddit.clone()));
    let mut controller = SessionController::new(connector);

    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, &mut controller, &config).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Tui,
    controller: &mut SessionController,
    config: &Config,
) -> Result<()> {
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(config.tick_rate_ms));

    tui_app.push_info(format!(
        "Press 's' to start monitoring r/{}.",
        config.channels.join(", r/")
    ));

    loop {
        terminal.draw(|frame| {
            layout::render(frame, &mut tui_app, controller.is_running(), &config.channels)
        })?;

        match event_handler.next()? {
            AppEvent::Key(key) => match Action::from(key) {
                Action::Quit => {
                    controller.stop();
                    tui_app.should_quit = true;
                }
                Action::StartMonitor => {
                    if controller.is_running() {
                        continue;
                    }
                    tui_app.push_info("Starting Reddit monitor.".to_string());
                    if let Err(e) = controller.start(config.channels.clone()) {
                        tui_app.push_error(format!("Cannot start: {e}"));
                    }
                }
                Action::StopMonitor => {
                    if controller.is_running() {
                        tui_app.push_info("Stopping Reddit monitor.".to_string());
                        controller.stop();
                    }
                }
                Action::MoveUp => tui_app.move_up(),
                Action::MoveDown => tui_app.move_down(),
                Action::FollowTail => tui_app.follow_tail(),
                Action::OpenInBrowser => {
                    if let Some(url) = tui_app.selected_url() {
                        if let Err(e) = open::that(&url) {
                            tui_app.push_error(format!("Failed to open browser: {e}"));
                        }
                    }
                }
                Action::None => {}
            },
            AppEvent::Tick => {
                for event in controller.drain_all() {
                    tui_app.push_event(event);
                }
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}
