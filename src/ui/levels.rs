use itertools::Itertools;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use potholes::progression::LEVEL_COUNT;

use crate::{
    ui::{star_line, LEVEL_COLUMNS},
    App,
};

const TILE_HEIGHT: u16 = 4;

pub fn render_level_select(app: &App, f: &mut Frame) {
    let rows = LEVEL_COUNT.div_ceil(LEVEL_COLUMNS) as usize;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints([
            Constraint::Length(3),                          // title
            Constraint::Length(TILE_HEIGHT * rows as u16), // grid
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Select a level",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "   ★ {}/{}",
            app.progression.total_stars(),
            LEVEL_COUNT * 3
        )),
    ]))
    .block(Block::bordered())
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let grid = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(TILE_HEIGHT); rows])
        .split(chunks[1]);

    let level_rows = (1..=LEVEL_COUNT).chunks(LEVEL_COLUMNS as usize);
    for (row, levels) in (&level_rows).into_iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![
                Constraint::Ratio(1, LEVEL_COLUMNS);
                LEVEL_COLUMNS as usize
            ])
            .split(grid[row]);

        for (col, level) in levels.enumerate() {
            f.render_widget(level_tile(app, level), cols[col]);
        }
    }

    let legend = Paragraph::new(Span::styled(
        "(←↑↓→) choose / (enter) play / (esc) back",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center);
    f.render_widget(legend, chunks[3]);
}

fn level_tile(app: &App, level: u32) -> Paragraph<'static> {
    let unlocked = app.progression.is_unlocked(level);
    let selected = app.selected_level == level;

    let border_style = match (selected, unlocked) {
        (true, _) => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default(),
        (false, false) => Style::default().fg(Color::DarkGray),
    };

    let body = if unlocked {
        star_line(app.progression.stars_for(level))
    } else {
        Line::from(Span::styled("locked", Style::default().fg(Color::DarkGray)))
    };

    Paragraph::new(vec![body])
        .block(
            Block::bordered()
                .title(format!("Level {}", level))
                .border_style(border_style),
        )
        .alignment(Alignment::Center)
}
