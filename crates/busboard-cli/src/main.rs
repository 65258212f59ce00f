//! Busboard CLI: KMB bus routes and live arrival times in the terminal

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use busboard::config::api::DEFAULT_SERVICE_TYPE;
use busboard::i18n::Language;
use busboard::map::MapDocument;
use busboard::transit::{filter_routes, Bound, Route, RouteBoard};

use busboard_app::app::{fetch_board, BoardCommand, BoardHandle, BoardSnapshot};
use busboard_app::data::{FavoritesManager, Settings, Theme};
use busboard_app::error::{AppError, Result};
use busboard_app::providers::{default_provider, KmbProvider, TransitProvider};

#[derive(Parser)]
#[command(name = "busboard", about = "KMB bus routes and live arrival times", version)]
struct Cli {
    /// Use another API base URL for this run
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List routes, optionally filtered by number or place name
    Routes {
        query: Option<String>,
    },
    /// Print every stop of a route with its arrival times
    Stops {
        route: String,
        #[command(flatten)]
        variant: VariantArgs,
    },
    /// Live arrival board for a route (resumes the last route if omitted)
    Watch {
        route: Option<String>,
        #[command(flatten)]
        variant: VariantArgs,
        /// Seconds between polls (20-60)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// List favorite routes
    Favorites {
        /// Remove this route from favorites
        #[arg(long)]
        remove: Option<String>,
        /// Direction of the route to remove
        #[arg(short, long, default_value = "O")]
        bound: Bound,
    },
    /// Add or remove a favorite route
    Fav {
        route: String,
        #[arg(short, long, default_value = "O")]
        bound: Bound,
    },
    /// Show or set the display language (en, zh)
    Lang {
        language: Option<Language>,
    },
    /// Show or set the watch screen theme (system, light, dark)
    Theme {
        theme: Option<Theme>,
    },
    /// Write a route map page
    Map {
        route: String,
        #[command(flatten)]
        variant: VariantArgs,
        /// Stop to center on, counting from 1
        #[arg(long)]
        stop: Option<usize>,
        #[arg(short, long, default_value = "route-map.html")]
        output: PathBuf,
    },
}

#[derive(Args, Clone)]
struct VariantArgs {
    /// Direction: O (outbound) or I (inbound)
    #[arg(short, long, default_value = "O")]
    bound: Bound,

    /// Service type, 1 for the normal service
    #[arg(short = 's', long, default_value = DEFAULT_SERVICE_TYPE)]
    service_type: String,
}

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.verbose { "debug" } else { "warn" }),
    )
    .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings();
    let base_url = cli.base_url.clone().or_else(|| settings.api_base_url.clone());
    let provider = default_provider(base_url.as_deref())?;
    log::debug!("Using {} at {}", provider.name(), provider.base_url());

    match cli.command {
        Command::Routes { query } => cmd_routes(&provider, &settings, query.as_deref()),
        Command::Stops { route, variant } => cmd_stops(&provider, &settings, &route, &variant),
        Command::Watch {
            route,
            variant,
            interval,
        } => {
            let route = match route {
                Some(id) => resolve_route(&provider, &id, &variant)?,
                None => settings.last_route.clone().ok_or_else(|| {
                    AppError::Config("No route given and no route to resume".to_string())
                })?,
            };
            if let Some(secs) = interval {
                settings.set_poll_interval(secs);
            }
            settings.last_route = Some(route.clone());
            if let Err(e) = settings.save() {
                log::warn!("Could not save settings: {e}");
            }
            cmd_watch(provider, settings, route)
        }
        Command::Favorites { remove, bound } => {
            cmd_favorites(&provider, &settings, remove.as_deref(), bound)
        }
        Command::Fav { route, bound } => cmd_fav(&route, bound),
        Command::Lang { language } => cmd_lang(&mut settings, language),
        Command::Theme { theme } => cmd_theme(&mut settings, theme),
        Command::Map {
            route,
            variant,
            stop,
            output,
        } => cmd_map(&provider, &settings, &route, &variant, stop, &output),
    }
}

/// Settings are a convenience; a broken file falls back to defaults
fn load_settings() -> Settings {
    match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("Using default settings: {e}");
            Settings::default()
        }
    }
}

/// Favorites only decorate listings; a broken file shows none
fn load_favorites() -> FavoritesManager {
    favorites_or_empty(FavoritesManager::load())
}

fn favorites_or_empty(loaded: Result<FavoritesManager>) -> FavoritesManager {
    loaded.unwrap_or_else(|e| {
        log::warn!("Ignoring favorites: {e}");
        FavoritesManager::new()
    })
}

/// Look up the full route record for a route number and variant
fn resolve_route(provider: &KmbProvider, route_id: &str, variant: &VariantArgs) -> Result<Route> {
    let route_id = route_id.trim().to_uppercase();
    provider
        .fetch_routes()?
        .into_iter()
        .find(|r| r.matches(&route_id, variant.bound) && r.service_type == variant.service_type)
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Route {} ({}, service type {})",
                route_id, variant.bound, variant.service_type
            ))
        })
}

fn route_line(route: &Route, lang: Language, favorite: bool) -> String {
    let star = if favorite { "★" } else { " " };
    let variant = if route.service_type == DEFAULT_SERVICE_TYPE {
        String::new()
    } else {
        format!(" [{}]", route.service_type)
    };
    format!(
        "{star} {:<5} {} {} → {}{variant}",
        route.route,
        route.bound,
        route.origin(lang),
        route.destination(lang)
    )
}

fn cmd_routes(provider: &KmbProvider, settings: &Settings, query: Option<&str>) -> Result<()> {
    let lang = settings.language;
    let routes = provider.fetch_routes()?;
    let favorites = load_favorites();
    let query = query.unwrap_or_default();

    let matches = filter_routes(&routes, query);
    if matches.is_empty() {
        println!("{} \"{}\"", lang.strings().no_routes_matching, query.trim());
        return Ok(());
    }

    for route in matches {
        let favorite = favorites.is_favorite(&route.route, route.bound);
        println!("{}", route_line(route, lang, favorite));
    }
    Ok(())
}

fn print_board(board: &RouteBoard, lang: Language) {
    let strings = lang.strings();
    println!(
        "{}  {} {} → {}",
        board.route.route,
        strings.from,
        board.route.origin(lang),
        board.route.destination(lang)
    );

    if board.is_empty() {
        println!("{} {}", strings.no_stops_found, board.route.route);
        return;
    }

    for stop in &board.stops {
        let eta = if stop.eta.is_empty() {
            strings.no_eta.to_string()
        } else {
            stop.eta.join(", ")
        };
        println!("{:>3}. {:<32} {}", stop.seq, stop.info.name(lang), eta);
    }

    if board.failed > 0 {
        println!("({} stops unavailable)", board.failed);
    }
}

fn cmd_stops(
    provider: &KmbProvider,
    settings: &Settings,
    route_id: &str,
    variant: &VariantArgs,
) -> Result<()> {
    let route = resolve_route(provider, route_id, variant)?;
    let board = fetch_board(provider, &route, settings.language, chrono::Local::now, |_, _| {})?;
    print_board(&board, settings.language);
    Ok(())
}

fn cmd_favorites(
    provider: &KmbProvider,
    settings: &Settings,
    remove: Option<&str>,
    bound: Bound,
) -> Result<()> {
    let lang = settings.language;
    let mut favorites = FavoritesManager::load()?;

    if let Some(route_id) = remove {
        let removed = favorites.remove(&route_id.trim().to_uppercase(), bound)?;
        favorites.save()?;
        println!("Removed {} ({})", removed.route_id, removed.bound);
    }

    println!("{}", lang.strings().title);
    if favorites.is_empty() {
        println!("{}", lang.strings().no_favorites);
        return Ok(());
    }

    match provider.fetch_routes() {
        Ok(routes) => {
            for route in favorites.resolve(&routes) {
                println!("{}", route_line(route, lang, true));
            }
        }
        Err(e) => {
            log::warn!("Route list unavailable, showing saved favorites: {e}");
            for fav in favorites.all() {
                println!("★ {:<5} {}", fav.route_id, fav.bound);
            }
        }
    }
    Ok(())
}

fn cmd_fav(route_id: &str, bound: Bound) -> Result<()> {
    let route_id = route_id.trim().to_uppercase();
    let mut favorites = FavoritesManager::load()?;
    let added = favorites.toggle(&route_id, bound);
    favorites.save()?;

    if added {
        println!("★ Added {route_id} ({bound})");
    } else {
        println!("Removed {route_id} ({bound})");
    }
    Ok(())
}

fn cmd_lang(settings: &mut Settings, language: Option<Language>) -> Result<()> {
    if let Some(language) = language {
        settings.language = language;
        settings.save()?;
    }
    println!("{}: {}", settings.language.strings().language, settings.language);
    Ok(())
}

fn cmd_theme(settings: &mut Settings, theme: Option<Theme>) -> Result<()> {
    if let Some(theme) = theme {
        settings.theme = theme;
        settings.save()?;
    }
    println!("Theme: {}", settings.theme);
    Ok(())
}

fn cmd_map(
    provider: &KmbProvider,
    settings: &Settings,
    route_id: &str,
    variant: &VariantArgs,
    stop: Option<usize>,
    output: &Path,
) -> Result<()> {
    let lang = settings.language;
    let route = resolve_route(provider, route_id, variant)?;
    let board = fetch_board(provider, &route, lang, chrono::Local::now, |_, _| {})?;

    let selected = match stop {
        Some(0) => return Err(AppError::Config("Stops are numbered from 1".to_string())),
        Some(n) => Some(n - 1),
        None => None,
    };

    let html = MapDocument::new(&board.stops)
        .selected(selected)
        .language(lang)
        .title(format!("{} {}", route.route, lang.strings().route_map))
        .render()?;
    std::fs::write(output, html)?;
    println!("{}: {}", lang.strings().route_map, output.display());
    Ok(())
}

// =============================================================================
// Watch (TUI)
// =============================================================================

struct App {
    board: BoardHandle,
    settings: Settings,
    favorites: FavoritesManager,
    route: Route,
    cursor: usize,
    status: String,
    map_path: PathBuf,
    map_written: bool,
    /// Board layout the written map was rendered from
    map_layout: u64,
    running: bool,
}

impl App {
    fn toggle_favorite(&mut self) {
        let added = self.favorites.toggle(&self.route.route, self.route.bound);
        self.status = match self.favorites.save() {
            Ok(()) if added => format!("★ {} added", self.route.route),
            Ok(()) => format!("{} removed", self.route.route),
            Err(e) => format!("Error: {e}"),
        };
    }

    fn toggle_language(&mut self) {
        let language = self.settings.toggle_language();
        if let Err(e) = self.settings.save() {
            log::warn!("Could not save settings: {e}");
        }
        self.board.send(BoardCommand::SetLanguage(language));
    }

    fn cycle_theme(&mut self) {
        self.settings.theme = self.settings.theme.cycle();
        self.status = format!("Theme: {}", self.settings.theme);
        if let Err(e) = self.settings.save() {
            log::warn!("Could not save settings: {e}");
        }
    }

    fn move_cursor(&mut self, down: bool, stop_count: usize) {
        if stop_count == 0 {
            return;
        }
        self.cursor = if down {
            (self.cursor + 1).min(stop_count - 1)
        } else {
            self.cursor.saturating_sub(1)
        };
        self.board.send(BoardCommand::SelectStop(Some(self.cursor)));
    }

    fn write_map(&mut self, snapshot: &BoardSnapshot) {
        self.status = match snapshot
            .map_view()
            .document()
            .map_err(AppError::from)
            .and_then(|html| std::fs::write(&self.map_path, html).map_err(AppError::from))
        {
            Ok(()) => {
                self.map_written = true;
                self.map_layout = snapshot.layout_version;
                format!("Map written to {}", self.map_path.display())
            }
            Err(e) => format!("Error: {e}"),
        };
    }
}

fn cmd_watch(provider: KmbProvider, settings: Settings, route: Route) -> Result<()> {
    let provider: Arc<dyn TransitProvider> = Arc::new(provider);
    let board = BoardHandle::spawn(provider, settings.language, settings.poll_interval())?;
    board.send(BoardCommand::Open(route.clone()));

    let mut app = App {
        board,
        favorites: load_favorites(),
        settings,
        map_path: PathBuf::from(format!("route-{}-{}.html", route.route, route.bound)),
        route,
        cursor: 0,
        status: String::new(),
        map_written: false,
        map_layout: 0,
        running: true,
    };

    // Keep log output from corrupting the alternate screen
    let saved_level = log::max_level();
    log::set_max_level(log::LevelFilter::Error);

    let result = enter_screen().and_then(|()| watch_loop(&mut app));
    let restored = leave_screen();
    log::set_max_level(saved_level);

    app.board.send(BoardCommand::Close);
    app.board.shutdown();
    result.and(restored.map_err(AppError::from))
}

fn enter_screen() -> Result<()> {
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    Ok(())
}

/// Undo [`enter_screen`], including a setup that failed halfway
fn leave_screen() -> io::Result<()> {
    let raw = terminal::disable_raw_mode();
    let screen = io::stdout().execute(LeaveAlternateScreen).map(|_| ());
    raw.and(screen)
}

fn watch_loop(app: &mut App) -> Result<()> {
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    while app.running {
        let snapshot = app.board.snapshot();
        if app.cursor >= snapshot.stops.len() {
            app.cursor = snapshot.stops.len().saturating_sub(1);
        }
        terminal.draw(|f| draw_ui(f, app, &snapshot))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.running = false,
                        KeyCode::Up | KeyCode::Char('k') => {
                            app.move_cursor(false, snapshot.stops.len())
                        }
                        KeyCode::Down | KeyCode::Char('j') => {
                            app.move_cursor(true, snapshot.stops.len())
                        }
                        KeyCode::Char('f') => app.toggle_favorite(),
                        KeyCode::Char('l') => app.toggle_language(),
                        KeyCode::Char('r') => app.board.send(BoardCommand::Refresh),
                        KeyCode::Char('m') => app.write_map(&snapshot),
                        KeyCode::Char('t') => app.cycle_theme(),
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            // The map page is a static file; rewrite it when its stops change
            let messages = app.board.drain_map_messages();
            if app.map_written {
                let snapshot = app.board.snapshot();
                if !messages.is_empty() || snapshot.layout_version != app.map_layout {
                    log::debug!("Refreshing map after {} updates", messages.len());
                    app.write_map(&snapshot);
                }
            }
        }
    }

    Ok(())
}

/// Watch screen colors for a theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    text: Color,
    dim: Color,
    accent: Color,
    warn: Color,
    eta: Color,
    highlight: Color,
}

impl Palette {
    fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::System => Self {
                text: Color::Reset,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                warn: Color::Yellow,
                eta: Color::Green,
                highlight: Color::DarkGray,
            },
            Theme::Dark => Self {
                text: Color::White,
                dim: Color::DarkGray,
                accent: Color::Cyan,
                warn: Color::Yellow,
                eta: Color::LightGreen,
                highlight: Color::DarkGray,
            },
            Theme::Light => Self {
                text: Color::Black,
                dim: Color::Gray,
                accent: Color::Blue,
                warn: Color::Magenta,
                eta: Color::Green,
                highlight: Color::LightBlue,
            },
        }
    }
}

fn draw_ui(f: &mut Frame, app: &App, snap: &BoardSnapshot) {
    let area = f.area();
    let palette = Palette::for_theme(app.settings.theme);

    let outer = Block::default()
        .title(format!(" Busboard v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.dim));
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::vertical([
        Constraint::Length(3), // route header
        Constraint::Min(5),    // stops
        Constraint::Length(1), // status
        Constraint::Length(1), // help bar
    ])
    .split(inner);

    draw_header(f, app, snap, &palette, chunks[0]);
    draw_stops(f, app, snap, &palette, chunks[1]);
    draw_status(f, app, snap, &palette, chunks[2]);
    draw_help(f, snap, &palette, chunks[3]);
}

fn draw_header(f: &mut Frame, app: &App, snap: &BoardSnapshot, palette: &Palette, area: Rect) {
    let lang = snap.language;
    let strings = lang.strings();
    let route = &app.route;
    let star = if app.favorites.is_favorite(&route.route, route.bound) {
        "★ "
    } else {
        ""
    };

    let text = vec![
        Line::from(vec![
            Span::styled(format!("  {star}"), Style::default().fg(palette.warn)),
            Span::styled(route.route.as_str(), Style::default().fg(palette.text).bold()),
            Span::raw("  "),
            Span::styled(
                strings.bound_label(route.bound),
                Style::default().fg(palette.dim),
            ),
            Span::raw(" "),
            Span::styled(route.destination(lang), Style::default().fg(palette.accent)),
        ]),
        Line::from(vec![
            Span::styled(format!("  {}: ", strings.from), Style::default().fg(palette.dim)),
            Span::styled(route.origin(lang), Style::default().fg(palette.text)),
        ]),
    ];
    f.render_widget(Paragraph::new(text), area);
}

fn draw_stops(f: &mut Frame, app: &App, snap: &BoardSnapshot, palette: &Palette, area: Rect) {
    let strings = snap.language.strings();
    let block = Block::default()
        .title(format!(" {} / {} ", strings.stop, strings.eta))
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(palette.dim));

    if snap.stops.is_empty() {
        let msg = if snap.is_loading || (snap.poll_count == 0 && snap.last_error.is_none()) {
            strings.loading.to_string()
        } else {
            format!("{} {}", strings.no_stops_found, app.route.route)
        };
        f.render_widget(
            Paragraph::new(Span::styled(msg, Style::default().fg(palette.dim))).block(block),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = snap
        .stops
        .iter()
        .map(|stop| {
            let (eta, color) = if stop.eta.is_empty() {
                (strings.no_eta.to_string(), palette.dim)
            } else {
                (stop.eta.join("  "), palette.eta)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>3} ", stop.seq), Style::default().fg(palette.dim)),
                Span::styled(stop.info.name(snap.language), Style::default().fg(palette.text)),
                Span::raw("  "),
                Span::styled(eta, Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(palette.highlight).bold())
        .highlight_symbol("▶ ");
    let mut state = ListState::default().with_selected(Some(app.cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_status(f: &mut Frame, app: &App, snap: &BoardSnapshot, palette: &Palette, area: Rect) {
    let mut spans = vec![Span::raw("  ")];

    if snap.is_loading {
        spans.push(Span::styled(
            snap.language.strings().loading,
            Style::default().fg(palette.warn),
        ));
        spans.push(Span::raw("  "));
    }
    if let Some(updated) = snap.last_updated {
        spans.push(Span::styled("Updated ", Style::default().fg(palette.dim)));
        spans.push(Span::styled(
            updated.format("%H:%M:%S").to_string(),
            Style::default().fg(palette.text),
        ));
        spans.push(Span::styled(
            format!("  every {}s", snap.interval.as_secs()),
            Style::default().fg(palette.dim),
        ));
    }
    if snap.failed_stops > 0 {
        spans.push(Span::styled(
            format!("  {} unavailable", snap.failed_stops),
            Style::default().fg(palette.warn),
        ));
    }
    if let Some(err) = &snap.last_error {
        spans.push(Span::styled(format!("  {err}"), Style::default().fg(Color::Red)));
    } else if !app.status.is_empty() {
        spans.push(Span::styled(
            format!("  {}", app.status),
            Style::default().fg(palette.accent),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_help(f: &mut Frame, snap: &BoardSnapshot, palette: &Palette, area: Rect) {
    let key = Style::default().fg(palette.warn);
    let help = Line::from(vec![
        Span::styled("  'q' ", key),
        Span::raw("quit  |  "),
        Span::styled("↑/↓ ", key),
        Span::raw("stop  |  "),
        Span::styled("'f' ", key),
        Span::raw("favorite  |  "),
        Span::styled("'l' ", key),
        Span::raw("language  |  "),
        Span::styled("'t' ", key),
        Span::raw("theme  |  "),
        Span::styled("'r' ", key),
        Span::raw("refresh  |  "),
        Span::styled("'m' ", key),
        Span::raw("map  |  "),
        Span::styled(
            snap.language.code().to_uppercase(),
            Style::default().fg(palette.accent).bold(),
        ),
    ]);

    f.render_widget(Paragraph::new(help).alignment(Alignment::Left), area);
}
