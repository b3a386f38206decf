use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use super::app::{LineKind, TuiApp};

pub fn render(frame: &mut Frame, app: &mut TuiApp, running: bool, channels: &[String]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let items: Vec<ListItem> = app
        .lines
        .iter()
        .map(|line| {
            let style = match line.kind {
                LineKind::Info => Style::default().fg(Color::Cyan),
                LineKind::Item => Style::default().fg(Color::White),
                LineKind::Warning => Style::default().fg(Color::Yellow),
                LineKind::Error => Style::default().fg(Color::Red),
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    line.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(line.text.clone(), style),
            ]))
        })
        .collect();

    let title = if running {
        " Reddit activity — monitoring "
    } else {
        " Reddit activity — stopped "
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, chunks[0], &mut app.list_state);

    let status = format!(
        " r/{}  |  s start  x stop  j/k scroll  G follow  o open  q quit",
        channels.join(", r/")
    );
    let bar = Paragraph::new(status).style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(bar, chunks[1]);
}
