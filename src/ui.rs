use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, InputMode};
use crate::controller::TextField;

/// Label and body styles for an entry's sender class
fn class_styles(class: &str) -> (Style, Style) {
    match class {
        "user" => (
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Style::default(),
        ),
        "assistant" => (
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            Style::default(),
        ),
        _ => (
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        ),
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, input row, footer
    let [header_area, body_area, input_row, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    if app.debug_window_visible() {
        let [transcript_area, debug_area] = Layout::horizontal([
            Constraint::Percentage(65),
            Constraint::Percentage(35),
        ])
        .areas(body_area);
        render_transcript(app, frame, transcript_area);
        render_debug_window(app, frame, debug_area);
    } else {
        render_transcript(app, frame, body_area);
    }

    render_input_row(app, frame, input_row);
    render_footer(app, frame, footer_area);

    if app.file_prompt.is_some() {
        render_file_prompt(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let pending = app.controller.pending();
    let pending_indicator = if pending > 0 {
        format!(" [{} in flight]", pending)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" docchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.controller.client().base_url().to_string(), Style::default().fg(Color::White)),
        Span::styled(pending_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    app.transcript_area = Some(area);

    let pending = app.controller.pending() > 0;
    let transcript = app.controller.transcript_mut();

    // Inner size minus borders, for wrap and scroll calculations
    transcript.set_viewport(area.width.saturating_sub(2), area.height.saturating_sub(2));
    transcript.set_trailer_lines(if pending { 2 } else { 0 });

    let transcript = app.controller.transcript();

    let text = if transcript.is_empty() && !pending {
        Text::from(Span::styled(
            "Upload a document (Ctrl+O) and ask a question about it...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for entry in transcript.entries() {
            let (label_style, body_style) = class_styles(&entry.class);
            lines.extend(entry.lines(label_style, body_style));
        }

        if pending {
            lines.push(Line::from(Span::styled(
                "...",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Working{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let title = if transcript.is_at_bottom() {
        " Conversation ".to_string()
    } else {
        " Conversation (scrolled, G for latest) ".to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((transcript.scroll(), 0));

    frame.render_widget(paragraph, area);
}

fn render_debug_window(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Debug (D to hide) ");

    let log = app.controller.debug_log();
    let lines: Vec<Line> = log
        .iter()
        .map(|line| Line::from(Span::styled(line.clone(), Style::default().fg(Color::Gray))))
        .collect();

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Long diagnostics wrap, so measure rows rather than log entries
    let wrapped = paragraph.line_count(area.width.saturating_sub(2));
    let max_scroll = u16::try_from(wrapped)
        .unwrap_or(u16::MAX)
        .saturating_sub(area.height.saturating_sub(2));
    app.debug_scroll = app.debug_scroll.min(max_scroll);

    let paragraph = paragraph.block(block).scroll((app.debug_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_input_row(app: &mut App, frame: &mut Frame, area: Rect) {
    let [input_area, send_area, upload_area] = Layout::horizontal([
        Constraint::Min(10),
        Constraint::Length(10),
        Constraint::Length(12),
    ])
    .areas(area);

    app.input_area = Some(input_area);
    app.send_button_area = Some(send_area);
    app.upload_button_area = Some(upload_area);

    let editing = app.input_mode == InputMode::Editing && app.file_prompt.is_none();
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" Ask ");

    let field = app.controller.query_field();
    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = visible_slice(field, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }

    let button = |label: &'static str, color: Color| {
        Paragraph::new(label)
            .alignment(Alignment::Center)
            .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)))
    };

    frame.render_widget(button("Send", Color::Green), send_area);
    frame.render_widget(button("Upload", Color::Blue), upload_area);
}

/// Slice of the field that fits `width`, scrolled so the cursor stays visible
fn visible_slice(field: &TextField, width: usize) -> (String, u16) {
    let cursor_pos = field.cursor();

    let scroll_offset = if width == 0 {
        0
    } else if cursor_pos >= width {
        cursor_pos - width + 1
    } else {
        0
    };

    let visible: String = field.text().chars().skip(scroll_offset).take(width).collect();
    (visible, (cursor_pos - scroll_offset) as u16)
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.file_prompt.is_some() {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" upload ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" cancel ", label_style),
        ]
    } else {
        match app.input_mode {
            InputMode::Editing => vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Ctrl+O ", key_style),
                Span::styled(" upload ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" stop typing ", label_style),
            ],
            InputMode::Normal => {
                let mut hints = vec![
                    Span::styled(" j/k ", key_style),
                    Span::styled(" scroll ", label_style),
                    Span::styled(" G ", key_style),
                    Span::styled(" latest ", label_style),
                    Span::styled(" i ", key_style),
                    Span::styled(" type ", label_style),
                    Span::styled(" u ", key_style),
                    Span::styled(" upload ", label_style),
                ];
                if app.controller.is_debug() {
                    hints.extend(vec![
                        Span::styled(" D ", key_style),
                        Span::styled(" debug ", label_style),
                    ]);
                }
                hints.extend(vec![
                    Span::styled(" q ", key_style),
                    Span::styled(" quit ", label_style),
                ]);
                hints
            }
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_file_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let Some(field) = app.file_prompt.as_ref() else {
        return;
    };

    // Calculate popup size and position (centered)
    let popup_width = 64.min(area.width.saturating_sub(4));
    let popup_height = 7;

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Upload a file ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Path to the document. Enter to upload, Esc to cancel.")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    let (visible_text, cursor_x) = visible_slice(field, input_area.width as usize);
    let input = Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan));
    frame.render_widget(input, input_area);

    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}
