use crate::app::{App, Focus};
use crate::braille;
use crate::metrics::format_ms;
use crate::renderer::RenderState;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_metrics {
        render_metrics_panel(frame, area, app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    if fullscreen {
        (frame_area.width.saturating_sub(2), frame_area.height.saturating_sub(2))
    } else {
        let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
        let canvas_height = frame_area.height.saturating_sub(2);
        (canvas_width, canvas_height)
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7),  // Status
            Constraint::Length(11), // Parameters
            Constraint::Min(6),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Flow Field ");

    let (status_text, status_color) = match app.state() {
        RenderState::Running if app.paused => ("PAUSED", HIGHLIGHT_COLOR),
        RenderState::Running => ("RUNNING", Color::Green),
        other => (other.name(), Color::DarkGray),
    };

    let (width, height) = app.renderer.store().surface_size();
    let resizing = if app.resize_debouncer.is_pending() { " ~" } else { "" };
    let mut content = vec![
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
        Line::from(Span::styled(
            if app.renderer.store().is_empty() {
                "Particles: none".to_string()
            } else {
                format!("Particles: {}", app.renderer.store().len())
            },
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("Surface: {}x{}{}", width, height, resizing),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
        Line::from(Span::styled(
            format!("Tick: {}", app.renderer.tick_count()),
            Style::default().fg(DIM_TEXT_COLOR),
        )),
    ];
    if let Some(message) = &app.message {
        content.push(Line::from(Span::styled(
            message.clone(),
            Style::default().fg(HIGHLIGHT_COLOR),
        )));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = app.renderer.settings();

    let content = vec![
        make_line("Density", format!("{}", settings.max_density), app.focus == Focus::Density),
        make_line("Fade", format!("{:.2}", settings.fade_alpha), app.focus == Focus::Fade),
        make_line("Hue", format!("{:.0}", settings.spawn.hue_base), app.focus == Focus::Hue),
        make_line("Hue span", format!("{:.0}", settings.spawn.hue_span), app.focus == Focus::HueSpan),
        make_line("Margin", format!("{:.0}", settings.boundary_margin), app.focus == Focus::Margin),
        make_line("Speed", format!("{}", app.ticks_per_frame), app.focus == Focus::Speed),
        make_line("Theme", app.theme.name().to_string(), app.focus == Focus::Theme),
        make_line("Time step", format!("{:.1}", settings.time_step), app.focus == Focus::TimeStep),
        make_line("Trail", format!("{:.1}", settings.trail_length), app.focus == Focus::Trail),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0 // No scrolling needed
    } else if focus_line >= visible_height {
        // Scroll to show focused line at bottom of visible area
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0 // Focus is within first visible lines
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, _app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &str, desc: &str| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let content = vec![
        make_control("Space", "pause/resume"),
        make_control("R", "reseed"),
        make_control("T", "theme"),
        make_control("V", "fullscreen"),
        make_control("P", "metrics"),
        make_control("S", "snapshot"),
        make_control("Tab", "select param"),
        make_control("↑/↓", "adjust param"),
        make_control("+/-", "speed"),
        make_control("H", "help"),
        make_control("Q", "quit"),
    ];

    let paragraph = Paragraph::new(content).block(styled_block(" Controls "));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let canvas = app.renderer.surface();
    let block = styled_block("").style(Style::default().bg(braille::background_color(canvas)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let cells = braille::render_to_braille(canvas, inner.width, inner.height, braille::DEFAULT_THRESHOLD);

    let buffer = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            if let Some(target) = buffer.cell_mut((x, y)) {
                target.set_char(cell.char).set_fg(cell.color);
            }
        }
    }
}

fn render_metrics_panel(frame: &mut Frame, area: Rect, app: &App) {
    let width = 28.min(area.width);
    let height = 9.min(area.height);
    let panel = Rect {
        x: area.x + area.width.saturating_sub(width),
        y: area.y,
        width,
        height,
    };

    let metrics = &app.metrics;
    let field = &app.renderer.settings().field;
    let fps = metrics
        .fps()
        .map(|f| format!("{:.1}", f))
        .unwrap_or_else(|| "-".to_string());
    let line = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<10}", label), Style::default().fg(DIM_TEXT_COLOR)),
            Span::styled(value, Style::default().fg(TEXT_COLOR)),
        ])
    };
    let content = vec![
        line("FPS", fps),
        line("Frame", format_ms(metrics.average_frame())),
        line("Worst", format_ms(metrics.worst_frame())),
        line("Work", format_ms(metrics.average_work())),
        line("Frames", metrics.total_frames().to_string()),
        line("Time", format!("{:.1}", app.renderer.time_cursor())),
        line(
            "Flow",
            format!("{:.1}-{:.1} px", field.min_speed(), field.max_speed()),
        ),
    ];

    frame.render_widget(Clear, panel);
    let paragraph = Paragraph::new(content).block(styled_block(" Metrics (P) "));
    frame.render_widget(paragraph, panel);
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    // Calculate the canvas area (exclude sidebar unless fullscreen)
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = if app.fullscreen_mode {
        area.width
    } else {
        area.width.saturating_sub(SIDEBAR_WIDTH)
    };

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(30);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("FLOW FIELD", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles follow a slowly shifting field of sine waves, leaving trails that fade into the background. Faster flow paints brighter trails."),
        Line::from(""),
        Line::from(Span::styled("PARAMETERS (Tab, then ↑/↓):", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Density: particle cap. Changing it reseeds."),
        Line::from("Fade: how quickly trails disappear"),
        Line::from("Hue / Hue span: colour band of new particles"),
        Line::from("Margin: how far particles may leave the screen"),
        Line::from("Speed: ticks per frame"),
        Line::from("Time step: how fast the field itself changes"),
        Line::from("Trail: stroke length behind each particle"),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Reseed, T=Theme, V=Fullscreen, P=Metrics, S=Snapshot PNG, +/-=Speed, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let is_scrollable = content_height > visible_height;

    let title = if is_scrollable {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
