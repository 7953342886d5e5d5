use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, Paragraph, Wrap},
    Frame,
};

use pacer::engine::EngineState;
use pacer::phase::Phase;
use pacer::tracker::PhasePosition;
use pacer::util::{ceil_secs, format_mmss};

use crate::{App, PacerStyle, WAVE_POINTS};

// Phase palette carried over from the mobile app.
fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Inhale => Color::Rgb(0x4d, 0xb6, 0xac),
        Phase::HoldHigh | Phase::HoldLow => Color::Rgb(0x81, 0xc7, 0x84),
        Phase::Exhale => Color::Rgb(0xe5, 0xc0, 0x7b),
    }
}

pub fn draw(app: &App, f: &mut Frame) {
    let area = f.area();
    match app.engine.state() {
        EngineState::Idle => draw_idle(app, f, area),
        EngineState::Running | EngineState::Paused => draw_session(app, f, area),
        EngineState::Completed => draw_complete(app, f, area),
    }
}

fn draw_idle(app: &App, f: &mut Frame, area: Rect) {
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let s = &app.settings;

    let mut lines = vec![
        Line::from(Span::styled(
            "pacer",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "inhale {}s · hold {}s · exhale {}s · hold {}s",
            s.inhale_secs, s.hold_high_secs, s.exhale_secs, s.hold_low_secs
        )),
        Line::from(format!(
            "session {} min · {} pacer",
            s.session_minutes,
            app.style.technique()
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(space) start  (s) switch pacer  (q) quit",
            dim_style,
        )),
    ];
    if let Some(err) = &app.config_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::default().fg(Color::Red),
        )));
    }
    if let Some(notice) = &app.sync_notice {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(notice.clone(), dim_style)));
    }

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, centered(area, 12));
}

fn draw_session(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(4)
        .vertical_margin(1)
        .constraints(
            [
                Constraint::Length(2),
                Constraint::Min(6),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(area);

    let position = app.engine.position();
    draw_header(app, f, chunks[0], position.as_ref());

    match app.style {
        PacerStyle::Gauge => draw_gauge(f, chunks[1], position.as_ref()),
        PacerStyle::Scope => draw_scope(app, f, chunks[1]),
    }

    draw_footer(app, f, chunks[2]);
}

fn draw_header(app: &App, f: &mut Frame, area: Rect, position: Option<&PhasePosition>) {
    let mut spans = Vec::new();
    if let Some(pos) = position {
        spans.push(Span::styled(
            format!("{} ", pos.phase),
            Style::default()
                .fg(phase_color(pos.phase))
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(
            "{}  ",
            ceil_secs(pos.time_remaining_secs)
        )));
    }
    spans.push(Span::styled(
        format!(
            "session {}",
            format_mmss(app.engine.remaining_secs().ceil() as u64)
        ),
        Style::default().add_modifier(Modifier::DIM),
    ));

    let header = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(header, area);
}

fn draw_gauge(f: &mut Frame, area: Rect, position: Option<&PhasePosition>) {
    let Some(pos) = position else {
        return;
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(phase_color(pos.phase)))
        .ratio(pos.fraction_complete.clamp(0.0, 1.0))
        .label(format!("{} {}", pos.phase, ceil_secs(pos.time_remaining_secs)));
    f.render_widget(gauge, centered(area, 5));
}

fn draw_scope(app: &App, f: &mut Frame, area: Rect) {
    // One dataset per phase so each wave segment keeps its phase color.
    let mut inhale = Vec::new();
    let mut hold = Vec::new();
    let mut exhale = Vec::new();
    for (i, (amplitude, phase)) in app.trace.iter().enumerate() {
        let point = (i as f64, *amplitude);
        match phase {
            Phase::Inhale => inhale.push(point),
            Phase::HoldHigh | Phase::HoldLow => hold.push(point),
            Phase::Exhale => exhale.push(point),
        }
    }

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(phase_color(Phase::Inhale)))
            .data(&inhale),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(phase_color(Phase::HoldHigh)))
            .data(&hold),
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .style(Style::default().fg(phase_color(Phase::Exhale)))
            .data(&exhale),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL))
        .x_axis(Axis::default().bounds([0.0, WAVE_POINTS as f64]))
        .y_axis(Axis::default().bounds([-0.05, 1.05]));
    f.render_widget(chart, area);
}

fn draw_footer(app: &App, f: &mut Frame, area: Rect) {
    let dim_style = Style::default().add_modifier(Modifier::DIM);
    let hint = if app.engine.state() == EngineState::Paused {
        "paused — (space) resume  (r) reset  (q) quit"
    } else {
        "(space) pause  (r) reset  (q) quit"
    };

    let mut spans = vec![Span::styled(hint, dim_style)];
    if let Some(notice) = &app.sync_notice {
        spans.push(Span::raw("  ·  "));
        spans.push(Span::styled(notice.clone(), dim_style));
    }

    let footer = Paragraph::new(Line::from(spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_complete(app: &App, f: &mut Frame, area: Rect) {
    let dim_style = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![Line::from(Span::styled(
        "Session complete",
        Style::default()
            .fg(phase_color(Phase::Inhale))
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(summary) = &app.summary {
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "{} · {}",
            summary.technique,
            format_mmss(summary.total_seconds)
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        app.sync_notice.clone().unwrap_or_else(|| "saving…".into()),
        dim_style,
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("(r) new session  (q) quit", dim_style)));

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, centered(area, 8));
}

/// Vertically center a block of `height` rows within `area`.
fn centered(area: Rect, height: u16) -> Rect {
    if area.height <= height {
        return area;
    }
    let top = (area.height - height) / 2;
    Rect {
        x: area.x,
        y: area.y + top,
        width: area.width,
        height,
    }
}
