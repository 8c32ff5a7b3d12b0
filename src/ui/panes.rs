//! Pane rendering for the inspector TUI
//!
//! Four panes: the source view with a marker on the current line, two memory
//! panes (heap and stack) showing observation rows, and the captured stdout.
//! Memory rows render as `address  value  label` with the value's type on the
//! right edge when there is room.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::model::MemoryValue;
use crate::ui::theme::DEFAULT_THEME;

fn border_style(is_focused: bool) -> Style {
    if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    }
}

/// Clamp a scroll offset so `visible` rows starting there stay in range.
fn clamp_scroll(scroll: &mut usize, total: usize, visible: usize) {
    if total > visible {
        *scroll = (*scroll).min(total - visible);
    } else {
        *scroll = 0;
    }
}

/// Render the source pane with a `->` marker on the current line.
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    source: &str,
    file_name: &str,
    current_line: u32,
    is_focused: bool,
    scroll: &mut usize,
) {
    let block = Block::default()
        .title(format!(" {file_name} "))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    let lines: Vec<&str> = source.lines().collect();

    // Keep the current line in view.
    let current = current_line.saturating_sub(1) as usize;
    if current < *scroll {
        *scroll = current;
    } else if current >= *scroll + visible_height {
        *scroll = current + 1 - visible_height;
    }
    clamp_scroll(scroll, lines.len(), visible_height);

    let items: Vec<ListItem> = lines
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(i, text)| {
            let is_current = i == current;
            let marker = if is_current { "->" } else { "  " };
            let line = Line::from(vec![
                Span::styled(
                    format!("{marker}{:4} ", i + 1),
                    Style::default().fg(DEFAULT_THEME.primary),
                ),
                Span::styled(*text, Style::default().fg(DEFAULT_THEME.fg)),
            ]);
            let item = ListItem::new(line);
            if is_current {
                item.style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Render a memory pane (heap or stack) from observation rows sorted by
/// address.
pub fn render_memory_pane(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    rows: &[&MemoryValue],
    is_focused: bool,
    scroll: &mut usize,
) {
    let block = Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if rows.is_empty() {
        let paragraph = Paragraph::new("(no observations)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let content_width = area.width.saturating_sub(2) as usize;
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    clamp_scroll(scroll, rows.len(), visible_height);

    let items: Vec<ListItem> = rows
        .iter()
        .skip(*scroll)
        .take(visible_height)
        .map(|v| {
            let mut spans = vec![
                Span::styled(v.address_str(), Style::default().fg(DEFAULT_THEME.comment)),
                Span::raw("  "),
                Span::styled(
                    v.value_str().to_string(),
                    Style::default().fg(DEFAULT_THEME.value),
                ),
                Span::raw("  "),
                Span::styled(
                    v.label_str().to_string(),
                    Style::default().fg(DEFAULT_THEME.label),
                ),
            ];

            // Right-align the type when it fits.
            let left_len =
                v.address_str().len() + 2 + v.value_str().len() + 2 + v.label_str().len();
            let type_str = v.type_str();
            if type_str != "(none)" && left_len + type_str.len() + 1 < content_width {
                let padding = content_width - left_len - type_str.len();
                spans.push(Span::raw(" ".repeat(padding)));
                spans.push(Span::styled(
                    type_str.to_string(),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Render the captured-stdout pane.
pub fn render_stdout_pane(
    frame: &mut Frame,
    area: Rect,
    lines: &[String],
    is_focused: bool,
    scroll: &mut usize,
) {
    let block = Block::default()
        .title(" stdout ")
        .borders(Borders::ALL)
        .border_style(border_style(is_focused));

    if lines.is_empty() {
        let paragraph = Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    // Follow the tail as output grows.
    if lines.len() > visible_height {
        *scroll = (*scroll).max(lines.len() - visible_height);
    }
    clamp_scroll(scroll, lines.len(), visible_height);

    let items: Vec<ListItem> = lines
        .iter()
        .skip(*scroll)
        .take(visible_height)
        .map(|l| ListItem::new(l.as_str()).style(Style::default().fg(DEFAULT_THEME.fg)))
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Render the bottom status bar: step position on the left, keybinds on the
/// right.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    steps_taken: usize,
    has_exited: bool,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let badge_bg = if has_exited {
        DEFAULT_THEME.error
    } else {
        DEFAULT_THEME.primary
    };
    let left_spans = vec![
        Span::styled(
            format!(" step {steps_taken} "),
            Style::default()
                .bg(badge_bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {message} "),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.fg),
        ),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let right_spans = vec![
        Span::styled(" ↵ ", key_style),
        Span::styled(" step ", desc_style),
        Span::styled(" tab ", key_style),
        Span::styled(" focus ", desc_style),
        Span::styled(" ↑/↓ ", key_style),
        Span::styled(" scroll ", desc_style),
        Span::styled(" q ", key_style),
        Span::styled(" quit ", desc_style),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Right),
        layout[1],
    );
}
