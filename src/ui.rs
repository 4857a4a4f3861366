pub mod field;
pub mod levels;
pub mod screen;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::App;

/// Tiles per row on the level selector
pub const LEVEL_COLUMNS: u32 = 4;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

/// Three star slots, filled up to `stars`
pub fn star_line(stars: u8) -> Line<'static> {
    let filled = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let empty = Style::default().fg(Color::DarkGray);

    Line::from(
        (1..=3u8)
            .map(|i| {
                if i <= stars {
                    Span::styled("★ ", filled)
                } else {
                    Span::styled("☆ ", empty)
                }
            })
            .collect::<Vec<_>>(),
    )
}

/// A `width` x `height` rect centered in `area`, clipped to it
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub fn render_menu(f: &mut Frame) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(3), // title
            Constraint::Length(3), // blurb
            Constraint::Length(2), // legend
            Constraint::Min(0),
        ])
        .split(f.area());

    let title = Paragraph::new(Span::styled(
        "EISH, POTHOLES!",
        bold_style.fg(Color::Yellow),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[1]);

    let blurb = Paragraph::new(
        "Take on the role of a road maintenance crew and repair the roads before time runs out. Keep the city moving!",
    )
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(blurb, chunks[2]);

    let legend = Paragraph::new(Span::styled("(enter) start / (q)uit", italic_style))
        .alignment(Alignment::Center);
    f.render_widget(legend, chunks[3]);
}

/// Summary shown over the road once a level ends
pub fn render_level_complete(app: &App, f: &mut Frame) {
    field::render_playing(app, f);

    let Some(outcome) = app.session.as_ref().and_then(|s| s.outcome) else {
        return;
    };

    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let next_hint = if app.progression.next_level(outcome.level).is_some() {
        "(r)etry / (n)ext level / (esc) levels"
    } else {
        "(r)etry / (n) back to levels / (esc) levels"
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("Level {} Complete!", outcome.level),
            bold_style.fg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", outcome.score), bold_style)),
        Line::from(format!("{:.0}%", outcome.percentage)),
        star_line(outcome.stars),
        Line::from(""),
        Line::from(Span::styled(next_hint, italic_style)),
    ];

    let area = centered_rect(50, lines.len() as u16 + 2, f.area());
    let summary = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);

    f.render_widget(Clear, area);
    f.render_widget(summary, area);
}
