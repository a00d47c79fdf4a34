use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::SetTitle;
use ratatui::DefaultTerminal;
use tracing::info;

use favmap::app::{App, MapConfig};
use favmap::cli::{Cli, Command};
use favmap::client::build_client;
use favmap::favorites::{self, client_user_agent, Platform, PopupContent};
use favmap::locate::{FixedLocator, IpLocator, LocateOptions, Locator};
use favmap::logging::{self, LogTarget};
use favmap::{data, ui};

const WINDOW_TITLE: &str = "Favorite places";

fn main() -> Result<()> {
    let cli = Cli::parse();
    let user_agent = cli.user_agent.clone().unwrap_or_else(client_user_agent);
    let platform = Platform::from_user_agent(&user_agent);

    match &cli.command {
        Some(Command::Popup { index }) => {
            let _guard = logging::init(LogTarget::Stderr)?;
            print_popup(&cli, platform, *index)
        }
        None => {
            let _guard = logging::init(LogTarget::interactive(cli.log_file.clone()))?;
            run_map(&cli, platform)
        }
    }
}

/// Print the popup HTML of one favorite to stdout
fn print_popup(cli: &Cli, platform: Platform, index: usize) -> Result<()> {
    let client = build_client().context("failed to build the HTTP client")?;
    let collection = favorites::load(&client, &cli.source)
        .with_context(|| format!("failed to load favorites from {}", cli.source))?;

    let Some(favorite) = collection.get(index) else {
        bail!("no feature #{index}, the collection has {}", collection.len());
    };
    let Some(position) = favorite.position else {
        bail!("feature #{index} has no point geometry");
    };
    println!("{}", PopupContent::new(favorite, position, platform).to_html());
    Ok(())
}

fn run_map(cli: &Cli, platform: Platform) -> Result<()> {
    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture, SetTitle(WINDOW_TITLE))?;

    // Run the app
    let result = run(&mut terminal, cli, platform);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Build the map, then fetch and show the favorites
fn bootstrap(terminal: &DefaultTerminal, cli: &Cli, platform: Platform) -> Result<App> {
    let size = terminal.size()?;
    let config = MapConfig {
        center: cli.center,
        zoom: cli.zoom,
        platform,
    };
    let base_map = data::load_base_map(&cli.data_dir);
    let mut app = App::new(&config, base_map, size.width as usize, size.height as usize);

    let client = build_client().context("failed to build the HTTP client")?;
    let collection = favorites::load(&client, &cli.source)
        .with_context(|| format!("failed to load favorites from {}", cli.source))?;
    let markers = app.set_favorites(collection);
    info!(markers, source = %cli.source, "favorites shown");

    if !cli.no_locate {
        let locator: Box<dyn Locator> = match cli.here {
            Some(here) => Box::new(FixedLocator::new(here, cli.here_accuracy)),
            None => Box::new(IpLocator::new(client, cli.geoip_url.clone())),
        };
        let options = LocateOptions {
            set_view: !cli.no_follow,
            max_zoom: cli.locate_max_zoom,
        };
        app.enable_locate(locator, options);
    }
    Ok(app)
}

fn handle_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Esc => app.escape(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Markers
        KeyCode::Tab => app.select_next(),
        KeyCode::BackTab => app.select_prev(),

        KeyCode::Char('g') | KeyCode::Char('G') => app.request_location(),
        KeyCode::Char('b') | KeyCode::Char('B') => app.base_map.toggle_borders(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

/// Handle mouse events for clicks, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click, or click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, cli: &Cli, platform: Platform) -> Result<()> {
    let mut app = bootstrap(terminal, cli, platform)?;

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    app.clear_status();
                    handle_key(&mut app, key);
                }
                Event::Mouse(mouse) => {
                    if matches!(mouse.kind, MouseEventKind::Down(_)) {
                        app.clear_status();
                    }
                    handle_mouse(&mut app, mouse);
                }
                Event::Resize(width, height) => {
                    app.resize(width as usize, height as usize);
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
