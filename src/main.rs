mod app;
mod braille;
mod color;
mod config;
mod debounce;
mod error;
mod export;
mod field;
mod metrics;
mod particle;
mod presets;
mod renderer;
mod settings;
mod surface;
mod ui;

use app::{App, Focus};
use clap::Parser;
use color::Theme;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use error::FlowError;
use export::GifRecorder;
use presets::{Preset, PresetManager};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use renderer::{FlowRenderer, HostEnvironment};
use std::fs::File;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use surface::PixelCanvas;

/// Environment variable that asks for reduced motion (any value but "" / "0" / "false")
const REDUCED_MOTION_ENV: &str = "FLOW_FIELD_REDUCED_MOTION";

#[derive(Parser, Debug)]
#[command(name = "flow-field")]
#[command(about = "Animated flow-field particle trails in the terminal")]
struct Args {
    // === Settings Sources ===
    /// Start from a named preset (aurora, ember, glacier, storm, drift, or a saved one)
    #[arg(long)]
    preset: Option<String>,

    /// Load settings from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings to a JSON config file (on exit in the terminal UI)
    #[arg(long = "save-config")]
    save_config: Option<PathBuf>,

    /// Save the effective settings as a named user preset
    #[arg(long = "save-preset")]
    save_preset: Option<String>,

    /// Delete a user preset and exit
    #[arg(long = "delete-preset")]
    delete_preset: Option<String>,

    /// List available presets and exit
    #[arg(long = "list-presets", default_value = "false")]
    list_presets: bool,

    // === Renderer Parameters ===
    /// Maximum number of particles (1-400)
    #[arg(long)]
    density: Option<usize>,

    /// Surface area in px² that earns one particle (1000-100000)
    #[arg(long = "area-per-particle")]
    area_per_particle: Option<u32>,

    /// Distance past the edge before a particle is recycled (0-200)
    #[arg(long)]
    margin: Option<f32>,

    /// Field time advance per tick (0.1-10.0)
    #[arg(long = "time-step")]
    time_step: Option<f32>,

    /// Trail length as a multiple of velocity (0.5-20.0)
    #[arg(long)]
    trail: Option<f32>,

    /// Background wash alpha per tick (0.01-1.0)
    #[arg(long)]
    fade: Option<f32>,

    /// Background theme (dark, light)
    #[arg(long)]
    theme: Option<String>,

    /// Canvas pixels per braille dot (1-16)
    #[arg(long)]
    scale: Option<u32>,

    /// Renderer ticks per displayed frame (1-8)
    #[arg(long)]
    speed: Option<usize>,

    /// Seed for reproducible particle spawns
    #[arg(long)]
    seed: Option<u64>,

    /// Show a static frame instead of animating
    #[arg(long = "reduced-motion", default_value = "false")]
    reduced_motion: bool,

    // === Headless Rendering ===
    /// Render without a terminal UI and write --png / --gif output
    #[arg(long, default_value = "false")]
    headless: bool,

    /// Headless surface width in pixels (16-8192)
    #[arg(long, default_value = "960")]
    width: u32,

    /// Headless surface height in pixels (16-8192)
    #[arg(long, default_value = "540")]
    height: u32,

    /// Number of ticks to run headless
    #[arg(long, default_value = "600")]
    frames: u64,

    /// Write the final frame to a PNG file
    #[arg(long)]
    png: Option<PathBuf>,

    /// Record an animated GIF
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Ticks between recorded GIF frames (1-60)
    #[arg(long = "gif-every", default_value = "4")]
    gif_every: u64,

    // === Logging ===
    /// Write logs to this file (the terminal UI otherwise logs nothing)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. "info" or "flow_field=debug"
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

/// True when the environment variable value asks for reduced motion
fn reduced_motion_requested(value: Option<&str>) -> bool {
    match value.map(|v| v.trim().to_lowercase()) {
        Some(v) => !(v.is_empty() || v == "0" || v == "false"),
        None => false,
    }
}

/// Set up env_logger. Logs go to `--log-file` when given, otherwise to
/// stderr unless the terminal UI owns the screen.
fn init_logging(args: &Args, stderr_allowed: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&args.log_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    match &args.log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None if stderr_allowed => {
            builder.target(env_logger::Target::Stderr);
        }
        None => return Ok(()),
    }

    builder.try_init()?;
    Ok(())
}

/// Resolve config file, preset and CLI overrides into one config
fn build_config(args: &Args, presets: &PresetManager) -> Result<AppConfig, FlowError> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| FlowError::Config(format!("unknown preset '{}'", name)))?;
        log::info!("using preset '{}'", preset.name);
        config.settings = preset.settings.clone();
        config.theme = preset.theme;
    }

    let settings = &mut config.settings;
    if let Some(density) = args.density {
        settings.max_density = density.clamp(1, 400);
    }
    if let Some(area) = args.area_per_particle {
        settings.area_per_particle = area.clamp(1_000, 100_000);
    }
    if let Some(margin) = args.margin {
        settings.boundary_margin = margin.clamp(0.0, 200.0);
    }
    if let Some(step) = args.time_step {
        settings.time_step = step.clamp(0.1, 10.0);
    }
    if let Some(trail) = args.trail {
        settings.trail_length = trail.clamp(0.5, 20.0);
    }
    if let Some(fade) = args.fade {
        settings.fade_alpha = fade.clamp(0.01, 1.0);
    }
    config.settings = config.settings.sanitized();

    if let Some(theme) = &args.theme {
        config.theme = Theme::parse(theme)
            .ok_or_else(|| FlowError::Config(format!("unknown theme '{}'", theme)))?;
    }
    if let Some(scale) = args.scale {
        config.scale = scale.clamp(1, 16);
    }
    if let Some(speed) = args.speed {
        config.ticks_per_frame = speed.clamp(1, 8);
    }

    Ok(config)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn print_presets(presets: &PresetManager) {
    for preset in presets.all_presets() {
        println!("{:<12} [{}] {}", preset.name, preset.theme.name(), preset.description);
    }
    if let Some(dir) = presets.dir() {
        println!("\nUser presets: {}", dir.display());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let interactive = !args.headless && io::stdout().is_terminal();
    init_logging(&args, !interactive)?;

    let mut presets = PresetManager::new();
    if args.list_presets {
        print_presets(&presets);
        return Ok(());
    }
    if let Some(name) = &args.delete_preset {
        presets.delete_preset(name)?;
        println!("Deleted preset '{}'", name);
        return Ok(());
    }

    let config = build_config(&args, &presets)?;
    if let Some(name) = &args.save_preset {
        let preset = Preset::new(name.clone(), "Saved from the command line", config.settings.clone(), config.theme);
        let path = presets.save_preset(preset)?;
        println!("Saved preset '{}' to {}", name, path.display());
    }

    let reduced_motion =
        args.reduced_motion || reduced_motion_requested(std::env::var(REDUCED_MOTION_ENV).ok().as_deref());
    let rng = make_rng(args.seed);

    if !interactive {
        if let Some(path) = &args.save_config {
            config.save_to_file(path)?;
        }
        if !args.headless {
            log::info!("{}; nothing to draw", FlowError::UnsupportedEnvironment);
            return Ok(());
        }
        return Ok(run_headless(&args, &config, rng, reduced_motion)?);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Get initial terminal size and create app
    let size = terminal.size()?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), false);
    let mut app = App::new(canvas_width, canvas_height, &config, rng, reduced_motion);
    log::info!(
        "renderer {} with {} particles",
        app.state().name(),
        app.renderer.store().len()
    );

    // Run the app
    let res = run_app(&mut terminal, &mut app);
    app.renderer.stop_handle().stop();

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("terminal error: {}", err);
        eprintln!("Error: {:?}", err);
    }
    log::info!("stopped after {} ticks", app.renderer.tick_count());

    // Interactive tweaks end up in the saved config
    if let Some(path) = &args.save_config {
        app.to_config().save_to_file(path)?;
    }

    Ok(())
}

/// Render off-screen for a fixed number of ticks and write PNG/GIF output
fn run_headless(args: &Args, config: &AppConfig, rng: StdRng, reduced_motion: bool) -> Result<(), FlowError> {
    let width = args.width.clamp(16, 8192);
    let height = args.height.clamp(16, 8192);
    let canvas = PixelCanvas::new(0, 0, config.theme.background());
    let mut renderer = FlowRenderer::new(canvas, rng, config.settings.clone(), config.theme);

    match renderer.start(&HostEnvironment {
        viewport: (width, height),
        reduced_motion,
    }) {
        Ok(()) => {}
        Err(err) if err.is_degraded_mode() => {
            log::info!("{}; nothing rendered", err);
            return Ok(());
        }
        Err(err) => return Err(err),
    }
    log::info!(
        "rendering {} ticks at {}x{} with {} particles",
        args.frames,
        width,
        height,
        renderer.store().len()
    );

    let gif_every = args.gif_every.clamp(1, 60);
    // Ticks are paced for 60 Hz; GIF delays are in centiseconds
    let delay_cs = ((gif_every * 100) / 60).max(2) as u16;
    let mut recorder = match &args.gif {
        Some(path) => Some(GifRecorder::create(path, width, height, delay_cs)?),
        None => None,
    };

    for tick in 1..=args.frames {
        renderer.tick();
        if let Some(recorder) = recorder.as_mut() {
            if tick % gif_every == 0 {
                recorder.push_frame(renderer.surface())?;
            }
        }
    }

    if let Some(recorder) = recorder {
        let frames = recorder.finish()?;
        if let Some(path) = &args.gif {
            log::info!("wrote {} frames to {}", frames, path.display());
        }
    }
    if let Some(path) = &args.png {
        renderer.surface().save_png(path)?;
        log::info!("wrote {}", path.display());
    }
    if args.png.is_none() && args.gif.is_none() {
        log::warn!("no --png or --gif given; nothing written");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.reseed(),
                        KeyCode::Char('t') | KeyCode::Char('T') => {
                            app.toggle_theme();
                            app.focus = Focus::Theme;
                        }
                        KeyCode::Char('v') | KeyCode::Char('V') => {
                            app.toggle_fullscreen();
                            // Layout change is deliberate, so skip the debounce
                            let size = terminal.size()?;
                            let (cols, rows) =
                                ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), app.fullscreen_mode);
                            app.resize(cols, rows);
                        }
                        KeyCode::Char('h') | KeyCode::Char('H') => app.toggle_help(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.toggle_metrics(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.snapshot(),
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.increase_speed();
                            app.focus = Focus::Speed;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.decrease_speed();
                            app.focus = Focus::Speed;
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if app.show_help {
                                app.scroll_help_up();
                            } else if app.focus.is_param() {
                                app.adjust_focused_up();
                            }
                        }
                        KeyCode::Down => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            } else if app.focus.is_param() {
                                app.adjust_focused_down();
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) =
                        ui::get_canvas_size(Rect::new(0, 0, width, height), app.fullscreen_mode);
                    app.signal_resize(canvas_width, canvas_height, Instant::now());
                }
                _ => {}
            }
        }

        app.poll_resize(Instant::now());
        app.tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("flow-field").chain(extra.iter().copied()))
    }

    #[test]
    fn test_reduced_motion_env_values() {
        assert!(!reduced_motion_requested(None));
        assert!(!reduced_motion_requested(Some("")));
        assert!(!reduced_motion_requested(Some("0")));
        assert!(!reduced_motion_requested(Some("False")));
        assert!(reduced_motion_requested(Some("1")));
        assert!(reduced_motion_requested(Some("reduce")));
    }

    #[test]
    fn test_defaults_without_flags() {
        let presets = PresetManager::with_dir(None);
        let config = build_config(&args(&[]), &presets).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_values_are_clamped() {
        let presets = PresetManager::with_dir(None);
        let config = build_config(
            &args(&["--density", "9999", "--time-step", "0", "--scale", "99", "--speed", "0"]),
            &presets,
        )
        .unwrap();
        assert_eq!(config.settings.max_density, 400);
        assert!((config.settings.time_step - 0.1).abs() < 1e-6);
        assert_eq!(config.scale, 16);
        assert_eq!(config.ticks_per_frame, 1);
    }

    #[test]
    fn test_preset_then_overrides() {
        let presets = PresetManager::with_dir(None);
        let config = build_config(&args(&["--preset", "glacier", "--theme", "dark"]), &presets).unwrap();
        let glacier = presets.find("Glacier").unwrap();
        assert_eq!(config.settings, glacier.settings);
        assert_eq!(config.theme, Theme::Dark);
    }

    #[test]
    fn test_unknown_preset_and_theme() {
        let presets = PresetManager::with_dir(None);
        assert!(build_config(&args(&["--preset", "nope"]), &presets).is_err());
        assert!(build_config(&args(&["--theme", "sepia"]), &presets).is_err());
    }

    #[test]
    fn test_config_file_is_loaded() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("flow.json");
        let mut saved = AppConfig::default();
        saved.settings.max_density = 12;
        saved.theme = Theme::Light;
        saved.save_to_file(&path).unwrap();

        let presets = PresetManager::with_dir(None);
        let path_arg = path.to_string_lossy().to_string();
        let config = build_config(&args(&["--config", &path_arg]), &presets).unwrap();
        assert_eq!(config.settings.max_density, 12);
        assert_eq!(config.theme, Theme::Light);
    }

    #[test]
    fn test_headless_writes_png_and_gif() {
        let dir = tempfile::TempDir::new().unwrap();
        let png = dir.path().join("out.png");
        let gif = dir.path().join("out.gif");
        let png_arg = png.to_string_lossy().to_string();
        let gif_arg = gif.to_string_lossy().to_string();
        let args = args(&[
            "--headless", "--width", "64", "--height", "48", "--frames", "8", "--gif-every", "4", "--png", &png_arg,
            "--gif", &gif_arg,
        ]);
        run_headless(&args, &AppConfig::default(), make_rng(Some(3)), false).unwrap();
        assert!(png.exists());
        assert!(gif.exists());
    }

    #[test]
    fn test_headless_reduced_motion_writes_nothing() {
        let dir = tempfile::TempDir::new().unwrap();
        let png = dir.path().join("out.png");
        let png_arg = png.to_string_lossy().to_string();
        let args = args(&["--headless", "--png", &png_arg]);
        run_headless(&args, &AppConfig::default(), make_rng(Some(3)), true).unwrap();
        assert!(!png.exists());
    }
}
