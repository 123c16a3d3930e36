use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tokio::runtime::{Handle, Runtime};
use tracing::info;

use milspend_map::config::AppConfig;
use milspend_map::controller::ViewController;
use milspend_map::data::lookup::Year;
use milspend_map::ui::{self, DetailsPanel};
use milspend_map::logging;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file; defaults apply if it does not exist
    #[arg(short, long, value_name = "FILE", default_value = "milspend.toml")]
    config: PathBuf,

    /// GeoJSON FeatureCollection of country boundaries
    #[arg(long, value_name = "FILE")]
    boundaries: Option<PathBuf>,

    /// Military expenditure table (CSV)
    #[arg(long, value_name = "FILE")]
    expenditure: Option<PathBuf>,

    /// GDP table (CSV), loaded alongside the expenditure table
    #[arg(long, value_name = "FILE")]
    gdp: Option<PathBuf>,

    /// Year shown once data is loaded (1960-2020)
    #[arg(short, long)]
    year: Option<i64>,

    /// Where to write the log
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line values win over the config file
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(path) = &self.boundaries {
            config.input.boundaries = path.clone();
        }
        if let Some(path) = &self.expenditure {
            config.input.expenditure = path.clone();
        }
        if let Some(path) = &self.gdp {
            config.input.gdp = Some(path.clone());
        }
        if let Some(year) = self.year {
            config.view.initial_year = year;
        }
        if let Some(path) = &self.log_file {
            config.logging.file = path.clone();
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.apply(AppConfig::load_or_default(&cli.config)?);
    let initial_year = config.initial_year()?;

    let _log_guard = logging::init(&config.logging.level, &config.logging.file)?;
    info!(config = ?cli.config, year = %initial_year, "starting");

    let runtime = Runtime::new()?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let result = run(&mut terminal, &config, initial_year, runtime.handle());

    // Restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events: wheel zoom, drag pan, hover tooltips, click details
fn handle_mouse(controller: &mut ViewController, details: &mut DetailsPanel, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => controller.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => controller.zoom_out_at(mouse.column, mouse.row),
        MouseEventKind::ScrollLeft => controller.pan(-15, 0),
        MouseEventKind::ScrollRight => controller.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => controller.mouse_down(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => controller.mouse_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => {
            controller.mouse_up(mouse.column, mouse.row, details);
        }
        MouseEventKind::Moved => controller.hover_at(mouse.column, mouse.row),
        _ => {}
    }
}

fn handle_key(controller: &mut ViewController, details: &mut DetailsPanel, code: KeyCode) {
    match code {
        KeyCode::Esc if details.is_open() => details.close(),
        KeyCode::Char('q') | KeyCode::Esc => controller.quit(),

        // Year control
        KeyCode::Char('[') | KeyCode::Char(',') => {
            controller.step_year(-1);
        }
        KeyCode::Char(']') | KeyCode::Char('.') => {
            controller.step_year(1);
        }
        KeyCode::Char('{') => {
            controller.step_year(-10);
        }
        KeyCode::Char('}') => {
            controller.step_year(10);
        }
        KeyCode::Home => {
            controller.set_year(Year::FIRST);
        }
        KeyCode::End => {
            controller.set_year(Year::LAST);
        }

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => controller.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => controller.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => controller.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => controller.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => controller.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => controller.zoom_out(),

        // Reset view (data stays loaded)
        KeyCode::Char('r') | KeyCode::Char('0') => controller.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, config: &AppConfig, year: Year, runtime: &Handle) -> Result<()> {
    let size = terminal.size()?;
    let mut controller = ViewController::new(
        config.sources(),
        config.alias_table(),
        year,
        size.width,
        size.height,
    );
    let mut details = DetailsPanel::default();

    controller.start(runtime);

    // Main loop
    loop {
        controller.poll_load();
        controller.refresh_raster();

        terminal.draw(|frame| ui::render(frame, &controller, &details))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut controller, &mut details, key.code);
                }
                Event::Mouse(mouse) => handle_mouse(&mut controller, &mut details, mouse),
                Event::Resize(width, height) => controller.resize(width, height),
                _ => {}
            }
        }

        if controller.should_quit {
            break;
        }
    }

    info!("exiting");
    Ok(())
}
