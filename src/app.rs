use crate::braille;
use crate::color::Theme;
use crate::config::AppConfig;
use crate::debounce::ResizeDebouncer;
use crate::error::Result;
use crate::metrics::FrameMetrics;
use crate::renderer::{FlowRenderer, HostEnvironment, RenderState};
use crate::surface::PixelCanvas;
use rand::rngs::StdRng;
use std::path::PathBuf;
use std::time::Instant;

/// Focus state for parameter editing in the sidebar
/// Alphabetically ordered for consistent UI display
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Density,
    Fade,
    Hue,
    HueSpan,
    Margin,
    Speed,
    Theme,
    TimeStep,
    Trail,
    // Controls box (not a param)
    Controls,
}

impl Focus {
    /// Tab cycles through parameters in alphabetical order
    pub fn next(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Density,
            Focus::Density => Focus::Fade,
            Focus::Fade => Focus::Hue,
            Focus::Hue => Focus::HueSpan,
            Focus::HueSpan => Focus::Margin,
            Focus::Margin => Focus::Speed,
            Focus::Speed => Focus::Theme,
            Focus::Theme => Focus::TimeStep,
            Focus::TimeStep => Focus::Trail,
            Focus::Trail => Focus::Density, // Loop back
        }
    }

    /// Shift+Tab cycles through parameters in reverse alphabetical order
    pub fn prev(&self) -> Focus {
        match self {
            Focus::None | Focus::Controls => Focus::Trail,
            Focus::Density => Focus::Trail, // Loop back
            Focus::Fade => Focus::Density,
            Focus::Hue => Focus::Fade,
            Focus::HueSpan => Focus::Hue,
            Focus::Margin => Focus::HueSpan,
            Focus::Speed => Focus::Margin,
            Focus::Theme => Focus::Speed,
            Focus::TimeStep => Focus::Theme,
            Focus::Trail => Focus::TimeStep,
        }
    }

    /// Line index of this focus in the parameters box
    pub fn line_index(&self) -> u16 {
        match self {
            Focus::None | Focus::Controls => 0,
            Focus::Density => 0,
            Focus::Fade => 1,
            Focus::Hue => 2,
            Focus::HueSpan => 3,
            Focus::Margin => 4,
            Focus::Speed => 5,
            Focus::Theme => 6,
            Focus::TimeStep => 7,
            Focus::Trail => 8,
        }
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }
}

/// Main application state
pub struct App {
    pub renderer: FlowRenderer<PixelCanvas, StdRng>,
    pub theme: Theme,
    /// Canvas pixels per braille dot
    pub scale: u32,
    pub ticks_per_frame: usize,
    pub focus: Focus,
    pub paused: bool,
    pub fullscreen_mode: bool,
    pub show_help: bool,
    pub show_metrics: bool,
    pub help_scroll: u16,
    pub metrics: FrameMetrics,
    pub resize_debouncer: ResizeDebouncer,
    /// Last status line (snapshot saved, errors)
    pub message: Option<String>,
    /// Where `s` writes PNG snapshots
    pub snapshot_dir: PathBuf,
    snapshots_taken: usize,
}

impl App {
    /// Build the app for a terminal canvas area and start the renderer.
    /// The renderer may end up `Disabled` or `Stopped`; the UI still runs.
    pub fn new(canvas_cols: u16, canvas_rows: u16, config: &AppConfig, rng: StdRng, reduced_motion: bool) -> Self {
        let canvas = PixelCanvas::new(0, 0, config.theme.background());
        let mut renderer = FlowRenderer::new(canvas, rng, config.settings.clone(), config.theme);
        let viewport = braille::calculate_surface_size(canvas_cols, canvas_rows, config.scale);
        let message = match renderer.start(&HostEnvironment {
            viewport,
            reduced_motion,
        }) {
            Ok(()) => None,
            Err(err) if err.is_degraded_mode() => Some(format!("Animation off: {}", err)),
            Err(err) => {
                log::error!("renderer failed to start: {}", err);
                Some(err.to_string())
            }
        };

        Self {
            renderer,
            theme: config.theme,
            scale: config.scale.max(1),
            ticks_per_frame: config.ticks_per_frame.clamp(1, 8),
            focus: Focus::Controls,
            paused: false,
            fullscreen_mode: false,
            show_help: false,
            show_metrics: false,
            help_scroll: 0,
            metrics: FrameMetrics::new(),
            resize_debouncer: ResizeDebouncer::default(),
            message,
            snapshot_dir: PathBuf::from("."),
            snapshots_taken: 0,
        }
    }

    /// Run renderer ticks for the current frame
    pub fn tick(&mut self) {
        let started = Instant::now();
        self.metrics.record_frame(started);
        if !self.paused {
            for _ in 0..self.ticks_per_frame {
                if !self.renderer.tick() {
                    break;
                }
            }
        }
        self.metrics.record_work(started.elapsed());
    }

    pub fn state(&self) -> RenderState {
        self.renderer.state()
    }

    /// Current settings as a saveable config
    pub fn to_config(&self) -> AppConfig {
        AppConfig {
            settings: self.renderer.settings().clone(),
            theme: self.theme,
            scale: self.scale,
            ticks_per_frame: self.ticks_per_frame,
            ..Default::default()
        }
    }

    /// Terminal canvas area changed: queue a debounced resize
    pub fn signal_resize(&mut self, canvas_cols: u16, canvas_rows: u16, now: Instant) {
        self.resize_debouncer.signal((canvas_cols, canvas_rows), now);
    }

    /// Apply a pending resize once the quiet period has passed
    pub fn poll_resize(&mut self, now: Instant) -> bool {
        match self.resize_debouncer.poll(now) {
            Some((cols, rows)) => {
                self.resize(cols, rows);
                true
            }
            None => false,
        }
    }

    /// Resize the renderer to match a new canvas area immediately
    pub fn resize(&mut self, canvas_cols: u16, canvas_rows: u16) {
        let (width, height) = braille::calculate_surface_size(canvas_cols, canvas_rows, self.scale);
        self.renderer.resize(width, height);
    }

    /// Toggle pause state
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Replace every particle
    pub fn reseed(&mut self) {
        self.renderer.reseed();
    }

    /// Switch theme and wipe the canvas so old trails don't flash
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.renderer.set_theme(self.theme);
        let background = self.renderer.background();
        let canvas = self.renderer.surface_mut();
        canvas.set_background(background);
        canvas.clear();
    }

    /// Toggle fullscreen mode
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0; // Reset scroll when opening
        }
    }

    pub fn toggle_metrics(&mut self) {
        self.show_metrics = !self.show_metrics;
        if self.show_metrics {
            self.metrics.reset();
        }
    }

    /// Scroll help content up
    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    /// Scroll help content down
    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    /// Increase ticks per frame
    pub fn increase_speed(&mut self) {
        self.ticks_per_frame = (self.ticks_per_frame + 1).min(8);
    }

    /// Decrease ticks per frame
    pub fn decrease_speed(&mut self) {
        self.ticks_per_frame = self.ticks_per_frame.saturating_sub(1).max(1);
    }

    /// Cycle to next focus
    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    /// Navigate to previous parameter (Shift+Tab)
    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1.0);
    }

    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1.0);
    }

    fn adjust_focused(&mut self, sign: f32) {
        let settings = self.renderer.settings_mut();
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Density => {
                settings.adjust_max_density(4 * sign as i32);
                // Count depends on density, so the store has to be rebuilt
                self.renderer.reseed();
            }
            Focus::Fade => settings.adjust_fade_alpha(0.02 * sign),
            Focus::Hue => settings.adjust_hue_base(10.0 * sign),
            Focus::HueSpan => settings.adjust_hue_span(10.0 * sign),
            Focus::Margin => settings.adjust_boundary_margin(10.0 * sign),
            Focus::Speed => {
                if sign > 0.0 {
                    self.increase_speed();
                } else {
                    self.decrease_speed();
                }
            }
            Focus::Theme => self.toggle_theme(),
            Focus::TimeStep => settings.adjust_time_step(0.1 * sign),
            Focus::Trail => settings.adjust_trail_length(0.5 * sign),
        }
    }

    /// Write the current canvas to a numbered PNG in `snapshot_dir`
    pub fn save_snapshot(&mut self) -> Result<PathBuf> {
        self.snapshots_taken += 1;
        let path = self
            .snapshot_dir
            .join(format!("flow-field-{:04}.png", self.snapshots_taken));
        self.renderer.surface().save_png(&path)?;
        log::info!("snapshot saved to {}", path.display());
        Ok(path)
    }

    /// Save a snapshot and report the outcome in the status line
    pub fn snapshot(&mut self) {
        self.message = Some(match self.save_snapshot() {
            Ok(path) => format!("Saved {}", path.display()),
            Err(err) => {
                log::warn!("snapshot failed: {}", err);
                format!("Snapshot failed: {}", err)
            }
        });
    }
}
