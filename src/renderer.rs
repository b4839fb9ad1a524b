use crate::color::{hsla, Rgba, Theme};
use crate::error::{FlowError, Result};
use crate::particle::ParticleStore;
use crate::settings::FlowSettings;
use crate::surface::DrawingSurface;
use rand::rngs::StdRng;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Lifecycle of the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    /// Not started yet, or started on a host without a drawing surface
    #[default]
    Stopped,
    /// Ticking once per frame
    Running,
    /// Reduced motion was requested at startup; never ticks
    Disabled,
}

impl RenderState {
    pub fn name(&self) -> &'static str {
        match self {
            RenderState::Stopped => "STOPPED",
            RenderState::Running => "RUNNING",
            RenderState::Disabled => "DISABLED",
        }
    }
}

/// What the host reports at startup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostEnvironment {
    /// Viewport size in pixels
    pub viewport: (u32, u32),
    /// Accessibility preference, read once
    pub reduced_motion: bool,
}

/// Cloneable cancellation token. Once stopped, the renderer never ticks again.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Flow-field particle renderer: advances every particle through the
/// field once per tick and paints fading trails onto its surface.
pub struct FlowRenderer<S: DrawingSurface, R: Rng = StdRng> {
    surface: S,
    rng: R,
    settings: FlowSettings,
    background: Rgba,
    store: ParticleStore,
    time_cursor: f64,
    ticks: u64,
    state: RenderState,
    stop: StopHandle,
}

impl<S: DrawingSurface, R: Rng> FlowRenderer<S, R> {
    pub fn new(surface: S, rng: R, settings: FlowSettings, theme: Theme) -> Self {
        Self {
            surface,
            rng,
            settings,
            background: theme.background(),
            store: ParticleStore::default(),
            time_cursor: 0.0,
            ticks: 0,
            state: RenderState::Stopped,
            stop: StopHandle::new(),
        }
    }

    /// Leave `Stopped`: size the surface to the viewport and populate.
    ///
    /// Returns `PreferenceOptOut` (state becomes `Disabled`) when reduced
    /// motion is requested, `UnsupportedEnvironment` (state stays
    /// `Stopped`) when the surface cannot paint. Neither touches the surface.
    pub fn start(&mut self, env: &HostEnvironment) -> Result<()> {
        if self.state != RenderState::Stopped {
            return Ok(());
        }
        if env.reduced_motion {
            self.state = RenderState::Disabled;
            log::info!("reduced motion requested, flow field disabled");
            return Err(FlowError::PreferenceOptOut);
        }
        if !self.surface.is_supported() {
            log::info!("no drawing surface available, flow field not started");
            return Err(FlowError::UnsupportedEnvironment);
        }

        let (width, height) = env.viewport;
        self.surface.resize(width, height);
        self.populate();
        self.state = RenderState::Running;
        log::info!(
            "flow field running on {}x{} with {} particles",
            width,
            height,
            self.store.len()
        );
        Ok(())
    }

    fn populate(&mut self) {
        let (width, height) = self.surface.size();
        self.store = ParticleStore::populate(&mut self.rng, width, height, &self.settings);
    }

    /// Advance one frame. Returns false when nothing ran (not running, or stopped).
    pub fn tick(&mut self) -> bool {
        if self.stop.is_stopped() || self.state != RenderState::Running {
            return false;
        }

        let (width, height) = self.store.surface_size();
        self.surface.fill_rect(
            0.0,
            0.0,
            width as f32,
            height as f32,
            self.background.with_alpha(self.settings.fade_alpha),
        );

        let settings = &self.settings;
        let t = self.time_cursor;
        for particle in self.store.particles_mut() {
            let sample = settings.field.sample(particle.x, particle.y, t);
            let (vx, vy) = sample.velocity();
            particle.vx = vx;
            particle.vy = vy;
            particle.x += vx;
            particle.y += vy;
            particle.age += 1;

            if particle.is_expired() || particle.is_out_of_bounds(width, height, settings.boundary_margin) {
                particle.recycle(&mut self.rng, width, height, &settings.spawn);
            }

            let tail = (
                particle.x - particle.vx * settings.trail_length,
                particle.y - particle.vy * settings.trail_length,
            );
            let alpha = settings.alpha_base + (sample.scalar + 1.0) * settings.alpha_gain;
            let head_color = hsla(particle.hue, settings.saturation, settings.head_lightness, alpha);
            let tail_color = hsla(
                particle.hue + settings.hue_shift,
                settings.saturation,
                settings.tail_lightness,
                0.0,
            );
            self.surface
                .stroke_gradient_line((particle.x, particle.y), tail, particle.size, head_color, tail_color);
        }

        self.time_cursor += self.settings.time_step as f64;
        self.ticks += 1;
        true
    }

    /// Viewport changed: resize the surface and replace every particle
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.state != RenderState::Running {
            return;
        }
        self.surface.resize(width, height);
        self.populate();
        log::debug!("resized to {}x{}, {} particles", width, height, self.store.len());
    }

    /// Replace every particle without resizing (used after settings changes)
    pub fn reseed(&mut self) {
        if self.state == RenderState::Running {
            self.populate();
        }
    }

    /// Background the trails fade into. Takes effect gradually through the
    /// per-tick wash.
    pub fn set_theme(&mut self, theme: Theme) {
        self.background = theme.background();
    }

    pub fn background(&self) -> Rgba {
        self.background
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn time_cursor(&self) -> f64 {
        self.time_cursor
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut ParticleStore {
        &mut self.store
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Settings changes apply to particles spawned from now on; call
    /// `reseed` to apply them to the whole store.
    pub fn settings_mut(&mut self) -> &mut FlowSettings {
        &mut self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SpawnRanges;
    use crate::surface::PixelCanvas;
    use rand::SeedableRng;

    /// Surface that only records what was asked of it
    #[derive(Default)]
    struct RecordingSurface {
        supported: bool,
        size: (u32, u32),
        resizes: usize,
        fills: usize,
        strokes: usize,
    }

    impl RecordingSurface {
        fn supported() -> Self {
            Self {
                supported: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.resizes + self.fills + self.strokes
        }
    }

    impl DrawingSurface for RecordingSurface {
        fn is_supported(&self) -> bool {
            self.supported
        }

        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.size = (width, height);
            self.resizes += 1;
        }

        fn fill_rect(&mut self, _x: f32, _y: f32, _w: f32, _h: f32, _color: Rgba) {
            self.fills += 1;
        }

        fn stroke_gradient_line(&mut self, _from: (f32, f32), _to: (f32, f32), _w: f32, _s: Rgba, _e: Rgba) {
            self.strokes += 1;
        }
    }

    fn env(width: u32, height: u32) -> HostEnvironment {
        HostEnvironment {
            viewport: (width, height),
            reduced_motion: false,
        }
    }

    fn canvas_renderer(settings: FlowSettings, seed: u64) -> FlowRenderer<PixelCanvas> {
        FlowRenderer::new(
            PixelCanvas::new(0, 0, Theme::Dark.background()),
            StdRng::seed_from_u64(seed),
            settings,
            Theme::Dark,
        )
    }

    #[test]
    fn test_start_populates_and_runs() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 1);
        assert_eq!(renderer.state(), RenderState::Stopped);
        renderer.start(&env(1000, 600)).unwrap();
        assert_eq!(renderer.state(), RenderState::Running);
        assert_eq!(renderer.store().len(), 33);
        assert_eq!(renderer.surface().size(), (1000, 600));
    }

    #[test]
    fn test_reduced_motion_disables_without_touching_surface() {
        let mut renderer = FlowRenderer::new(
            RecordingSurface::supported(),
            StdRng::seed_from_u64(2),
            FlowSettings::default(),
            Theme::Dark,
        );
        let result = renderer.start(&HostEnvironment {
            viewport: (800, 600),
            reduced_motion: true,
        });
        assert!(matches!(result, Err(FlowError::PreferenceOptOut)));
        assert_eq!(renderer.state(), RenderState::Disabled);

        for _ in 0..10 {
            assert!(!renderer.tick());
        }
        renderer.resize(400, 300);
        assert_eq!(renderer.tick_count(), 0);
        assert_eq!(renderer.surface().calls(), 0);
        assert!(renderer.store().is_empty());

        // Disabled is terminal
        renderer.start(&env(800, 600)).unwrap();
        assert_eq!(renderer.state(), RenderState::Disabled);
    }

    #[test]
    fn test_disabled_canvas_pixels_stay_as_initialised() {
        let bg = Theme::Light.background();
        let mut renderer = FlowRenderer::new(
            PixelCanvas::new(64, 48, bg),
            StdRng::seed_from_u64(3),
            FlowSettings::default(),
            Theme::Dark,
        );
        let _ = renderer.start(&HostEnvironment {
            viewport: (640, 480),
            reduced_motion: true,
        });
        for _ in 0..5 {
            renderer.tick();
        }
        assert_eq!(renderer.surface().size(), (64, 48));
        assert!(renderer.surface().pixels().iter().all(|p| *p == bg.rgb()));
    }

    #[test]
    fn test_unsupported_surface_stays_stopped() {
        let mut renderer = FlowRenderer::new(
            RecordingSurface::default(),
            StdRng::seed_from_u64(4),
            FlowSettings::default(),
            Theme::Dark,
        );
        let result = renderer.start(&env(800, 600));
        assert!(matches!(result, Err(FlowError::UnsupportedEnvironment)));
        assert_eq!(renderer.state(), RenderState::Stopped);
        assert!(!renderer.tick());
        assert_eq!(renderer.surface().calls(), 0);
    }

    #[test]
    fn test_tick_advances_time_cursor_and_paints() {
        let mut renderer = FlowRenderer::new(
            RecordingSurface::supported(),
            StdRng::seed_from_u64(5),
            FlowSettings::default(),
            Theme::Dark,
        );
        renderer.start(&env(1000, 600)).unwrap();
        for _ in 0..3 {
            assert!(renderer.tick());
        }
        assert_eq!(renderer.tick_count(), 3);
        assert!((renderer.time_cursor() - 3.9).abs() < 1e-5);
        // One wash per tick, one stroke per particle per tick
        assert_eq!(renderer.surface().fills, 3);
        assert_eq!(renderer.surface().strokes, 3 * 33);
    }

    #[test]
    fn test_velocity_is_overwritten_from_field() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 6);
        renderer.start(&env(1000, 600)).unwrap();
        {
            let p = &mut renderer.store_mut().particles_mut()[0];
            p.x = 500.0;
            p.y = 300.0;
            p.vx = 100.0;
            p.vy = 100.0;
            p.age = 0;
        }
        let t = renderer.time_cursor();
        let expected = renderer.settings().field.sample(500.0, 300.0, t).velocity();
        renderer.tick();

        let p = renderer.store().particles()[0];
        assert_eq!((p.vx, p.vy), expected);
        assert!((p.x - (500.0 + expected.0)).abs() < 1e-4);
        assert!((p.y - (300.0 + expected.1)).abs() < 1e-4);
        assert_eq!(p.age, 1);
    }

    #[test]
    fn test_age_never_exceeds_lifetime() {
        let settings = FlowSettings {
            spawn: SpawnRanges {
                lifetime_min: 5,
                lifetime_span: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut renderer = canvas_renderer(settings, 7);
        renderer.start(&env(400, 300)).unwrap();
        assert_eq!(renderer.store().len(), 6);

        for _ in 0..500 {
            renderer.tick();
            for p in renderer.store().particles() {
                assert!(p.age <= p.lifetime, "age {} > lifetime {}", p.age, p.lifetime);
            }
        }
    }

    #[test]
    fn test_expired_particle_is_recycled_same_tick() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 8);
        renderer.start(&env(1000, 600)).unwrap();
        {
            let p = &mut renderer.store_mut().particles_mut()[2];
            p.age = p.lifetime;
        }
        renderer.tick();
        assert_eq!(renderer.store().particles()[2].age, 0);
    }

    #[test]
    fn test_out_of_bounds_particle_is_recycled_same_tick() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 9);
        renderer.start(&env(1000, 600)).unwrap();
        {
            let p = &mut renderer.store_mut().particles_mut()[0];
            p.x = 1000.0 + 50.0 + 5.0;
            p.y = 300.0;
            p.age = 10;
        }
        {
            let p = &mut renderer.store_mut().particles_mut()[1];
            p.x = 500.0;
            p.y = -60.0;
            p.age = 10;
        }
        {
            let p = &mut renderer.store_mut().particles_mut()[2];
            p.x = -60.0;
            p.y = 300.0;
            p.age = 10;
        }
        {
            let p = &mut renderer.store_mut().particles_mut()[3];
            p.x = 500.0;
            p.y = 600.0 + 50.0 + 5.0;
            p.age = 10;
        }
        renderer.tick();

        for p in &renderer.store().particles()[..4] {
            assert_eq!(p.age, 0);
            assert!(p.x >= 0.0 && p.x < 1000.0);
            assert!(p.y >= 0.0 && p.y < 600.0);
        }
    }

    #[test]
    fn test_particle_inside_margin_survives() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 10);
        renderer.start(&env(1000, 600)).unwrap();
        {
            let p = &mut renderer.store_mut().particles_mut()[0];
            p.x = 1020.0;
            p.y = 300.0;
            p.age = 10;
        }
        renderer.tick();
        assert_eq!(renderer.store().particles()[0].age, 11);
    }

    #[test]
    fn test_resize_repopulates_for_new_area() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 11);
        renderer.start(&env(800, 600)).unwrap();
        assert_eq!(renderer.store().len(), 26);
        for _ in 0..20 {
            renderer.tick();
        }

        renderer.resize(400, 300);
        assert_eq!(renderer.store().len(), 6);
        assert_eq!(renderer.store().surface_size(), (400, 300));
        assert_eq!(renderer.surface().size(), (400, 300));
        for p in renderer.store().particles() {
            assert_eq!(p.age, 0);
            assert!(p.x < 400.0 && p.y < 300.0);
        }
        assert_eq!(renderer.state(), RenderState::Running);
        assert!(renderer.tick());
    }

    #[test]
    fn test_stop_handle_halts_ticks() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 12);
        renderer.start(&env(640, 480)).unwrap();
        let handle = renderer.stop_handle();
        assert!(renderer.tick());
        handle.stop();
        assert!(!renderer.tick());
        assert!(handle.is_stopped());
        assert_eq!(renderer.tick_count(), 1);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let run = || {
            let mut renderer = canvas_renderer(FlowSettings::default(), 13);
            renderer.start(&env(320, 240)).unwrap();
            for _ in 0..50 {
                renderer.tick();
            }
            renderer.store().particles().to_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_trails_are_painted() {
        let mut renderer = canvas_renderer(FlowSettings::default(), 14);
        renderer.start(&env(320, 240)).unwrap();
        for _ in 0..10 {
            renderer.tick();
        }
        let bg = Theme::Dark.background().rgb();
        let lit = renderer
            .surface()
            .pixels()
            .iter()
            .filter(|p| (p[2] - bg[2]).abs() > 0.02)
            .count();
        assert!(lit > 0);
    }
}
