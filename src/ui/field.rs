use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Gauge, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use potholes::{
    difficulty::tutorial_hint,
    obstacle::{Obstacle, RepairStage, Tool},
    session::{Notice, SessionState},
};

use crate::{ui::centered_rect, App};

const CAR: &str = "[=>]";

pub fn render_playing(app: &App, f: &mut Frame) {
    let Some(session) = app.session.as_ref() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(1)
        .constraints([
            Constraint::Length(1), // hud
            Constraint::Length(1), // hint
            Constraint::Min(6),    // road
            Constraint::Length(3), // progress
            Constraint::Length(3), // tools
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    f.render_widget(hud(session), chunks[0]);

    if let Some(hint) = tutorial_hint(session.level) {
        let hint = Paragraph::new(Span::styled(
            hint,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center);
        f.render_widget(hint, chunks[1]);
    }

    let road = Block::bordered().title("Road");
    let inner = road.inner(chunks[2]);
    f.render_widget(road, chunks[2]);
    draw_traffic(session, app.now().as_secs_f64(), inner, f.buffer_mut());
    draw_obstacles(session, app.cursor, inner, f.buffer_mut());

    let progress = session.repair_progress();
    let gauge = Gauge::default()
        .block(Block::bordered().title("Road Repair Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(progress as u16)
        .label(format!(
            "{}% ({}/{})",
            progress,
            session.repaired_count(),
            session.obstacles.len()
        ));
    f.render_widget(gauge, chunks[3]);

    f.render_widget(tool_palette(session), chunks[4]);

    if let Some((notice, _)) = &app.notice {
        let notice = Paragraph::new(Span::styled(notice.to_string(), notice_style(notice)))
            .alignment(Alignment::Center);
        f.render_widget(notice, chunks[5]);
    }

    let legend = Paragraph::new(Span::styled(
        "(1/2/3) tool / (H/S/T) use on next / (←→) pothole / (enter) repair / (p)ause / (esc) exit",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[6]);

    if session.paused && !session.is_complete() {
        let area = centered_rect(30, 3, inner);
        let paused = Paragraph::new("PAUSED - (p) to resume")
            .block(Block::bordered())
            .alignment(Alignment::Center);
        f.render_widget(Clear, area);
        f.render_widget(paused, area);
    }
}

fn hud(session: &SessionState) -> Paragraph<'static> {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let time_style = if session.remaining_secs <= 10 {
        bold_style.fg(Color::Red)
    } else {
        bold_style
    };

    Paragraph::new(Line::from(vec![
        Span::styled(format!("Level {}", session.level), bold_style.fg(Color::Yellow)),
        Span::raw("   "),
        Span::styled(format!("Score: {}", session.score), bold_style),
        Span::raw("   "),
        Span::styled(format!("Time: {}s", session.remaining_secs), time_style),
    ]))
    .alignment(Alignment::Center)
}

fn tool_palette(session: &SessionState) -> Paragraph<'static> {
    let enabled = session.accepts_input();

    let spans = Tool::ALL
        .iter()
        .enumerate()
        .map(|(i, tool)| {
            let mut style = Style::default();
            if session.selected_tool == Some(*tool) {
                style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
            }
            if !enabled {
                style = style.add_modifier(Modifier::DIM);
            }
            Span::styled(format!(" [{}] {}: {} ", i + 1, tool, tool.action()), style)
        })
        .collect::<Vec<_>>();

    let title = if session.is_repairing() {
        "Tools (working...)"
    } else {
        "Tools"
    };

    Paragraph::new(Line::from(spans))
        .block(Block::bordered().title(title))
        .alignment(Alignment::Center)
}

fn notice_style(notice: &Notice) -> Style {
    match notice {
        Notice::WrongTool { .. } => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Notice::RepairStarted { .. } => Style::default().fg(Color::Gray),
        Notice::Progress { .. } => Style::default().fg(Color::Green),
        Notice::Completed(_) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    }
}

fn stage_glyph(stage: RepairStage) -> (&'static str, Style) {
    match stage {
        RepairStage::Unrepaired => (
            "O",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        RepairStage::Cracked => ("X", Style::default().fg(Color::Yellow)),
        RepairStage::Cleaned => ("o", Style::default().fg(Color::Gray)),
        RepairStage::Repaired => ("=", Style::default().fg(Color::Green)),
    }
}

/// Map a percent coordinate onto `len` cells starting at `start`
fn project(percent: f64, start: u16, len: u16) -> u16 {
    let offset = ((percent / 100.0) * len as f64) as u16;
    start + offset.min(len.saturating_sub(1))
}

fn draw_obstacles(session: &SessionState, cursor: usize, area: Rect, buf: &mut Buffer) {
    // Top row is the traffic lane
    if area.width == 0 || area.height < 2 {
        return;
    }
    let field_y = area.y + 1;
    let field_height = area.height - 1;

    let pending = session.pending.map(|p| p.obstacle_id);
    for (idx, obstacle) in session.obstacles.iter().enumerate() {
        let Obstacle { id, position, stage } = obstacle;
        let (glyph, mut style) = stage_glyph(*stage);
        if idx == cursor {
            style = style.add_modifier(Modifier::REVERSED | Modifier::UNDERLINED);
        }
        if pending == Some(*id) {
            style = style.add_modifier(Modifier::SLOW_BLINK);
        }

        let x = project(position.x, area.x, area.width);
        let y = project(position.y, field_y, field_height);
        buf.set_string(x, y, glyph, style);
    }
}

/// One car looping across the lane; a pass takes `obstacle_speed` seconds
fn draw_traffic(session: &SessionState, now_secs: f64, area: Rect, buf: &mut Buffer) {
    let car_width = CAR.width() as u16;
    if area.width <= car_width || area.height == 0 {
        return;
    }
    let period = session.difficulty.obstacle_speed;
    let phase = (now_secs % period) / period;
    let x = area.x + (phase * (area.width - car_width) as f64) as u16;
    buf.set_string(x, area.y, CAR, Style::default().fg(Color::Blue));
}
