use crate::app::{App, InputMode};
use crate::charts::{ChartData, ChartKind, ACCENT_LIME, GRAY};
use crate::forms::{SubjectField, TaskField};
use crate::nav::Page;
use crate::views::{TaskCard, TODAY_PLACEHOLDER, UPCOMING_PLACEHOLDER};
use crossterm::event::{self, Event as CEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, Clear, Gauge, List, ListItem, ListState,
        Paragraph, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

fn centered_rect_absolute(width: u16, height: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length((r.height.saturating_sub(height)) / 2),
                Constraint::Length(height),
                Constraint::Length((r.height.saturating_sub(height) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Length((r.width.saturating_sub(width)) / 2),
                Constraint::Length(width),
                Constraint::Length((r.width.saturating_sub(width) + 1) / 2),
            ]
            .as_ref(),
        )
        .split(popup_layout[1])[1]
}

fn key_hint(key: &'static str, action: &'static str) -> [Span<'static>; 2] {
    [
        Span::styled(key, Style::default().fg(Color::Red)),
        Span::raw(action),
    ]
}

fn get_legend(input_mode: InputMode, page: Page) -> Text<'static> {
    let hints: Vec<[Span<'static>; 2]> = match input_mode {
        InputMode::Normal => {
            let mut hints = vec![
                key_hint(" q ", ": Quit "),
                key_hint(" 1/2/3 ", ": Home/Subjects/Progress "),
                key_hint(" j/k ", ": Down/Up "),
            ];
            match page {
                Page::Home => {
                    hints.push(key_hint(" x ", ": Toggle Done "));
                    hints.push(key_hint(" e ", ": Edit "));
                    hints.push(key_hint(" o ", ": Open Attachments "));
                    hints.push(key_hint(" a ", ": Add Task "));
                }
                Page::Subjects => {
                    hints.push(key_hint(" Enter ", ": View Subject "));
                    hints.push(key_hint(" a ", ": Add Subject "));
                }
                Page::SubjectDetail => {
                    hints.push(key_hint(" b ", ": Back "));
                    hints.push(key_hint(" a ", ": Add Task "));
                }
                Page::Progress => hints.push(key_hint(" a ", ": Add Task ")),
            }
            hints
        }
        InputMode::TaskForm => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" ←/→ ", ": Change Subject "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Esc ", ": Close "),
        ],
        InputMode::SubjectForm => vec![
            key_hint(" Tab ", ": Next Field "),
            key_hint(" Enter ", ": Save "),
            key_hint(" Esc ", ": Cancel "),
        ],
    };
    Text::from(Line::from(hints.into_iter().flatten().collect::<Vec<_>>()))
}

fn task_item(card: &TaskCard) -> ListItem<'_> {
    let checkbox = if card.is_complete { "[x] " } else { "[ ] " };
    let mut lines = vec![
        Line::from(vec![
            Span::raw(checkbox),
            Span::styled(card.title.as_str(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(" {} ", card.subject_name),
                Style::default().bg(Color::Yellow).fg(Color::Black),
            ),
        ]),
        Line::from(Span::styled(
            format!("    Deadline: {}", card.deadline_label),
            Style::default().fg(Color::Gray),
        )),
    ];
    if !card.attachments.is_empty() {
        let mut spans = vec![Span::raw("    ")];
        for link in &card.attachments {
            spans.push(Span::styled(
                format!("{} {}  ", link.kind.icon(), link.name),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
            ));
        }
        lines.push(Line::from(spans));
    }
    ListItem::new(lines)
}

fn task_list<'a>(cards: &'a [TaskCard], title: &'a str, placeholder: &'a str) -> List<'a> {
    let block = Block::default().borders(Borders::ALL).title(title);
    if cards.is_empty() {
        return List::new(vec![ListItem::new(placeholder)]).block(block);
    }
    List::new(cards.iter().map(task_item).collect::<Vec<_>>())
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ")
}

fn chart_widget<'a>(chart: &'a ChartData, title: &'a str) -> BarChart<'a> {
    let bars: Vec<Bar<'a>> = chart
        .labels
        .iter()
        .zip(&chart.values)
        .enumerate()
        .map(|(i, (label, value))| {
            let color = chart.colors.get(i).copied().unwrap_or(Color::Gray);
            Bar::default()
                .value(*value)
                .label(Line::from(label.as_str()))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();
    let max = chart.values.iter().copied().max().unwrap_or(0).max(1);

    let mut title = title.to_string();
    if let Some(label) = &chart.dataset_label {
        title = format!("{} ({})", title, label);
    }
    let widget = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .data(BarGroup::default().bars(&bars))
        .max(max)
        .bar_gap(1);

    match chart.kind {
        ChartKind::Bar => widget.bar_width(5),
        ChartKind::Pie | ChartKind::Doughnut => {
            widget.direction(Direction::Horizontal).bar_width(1)
        }
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)].as_ref())
        .split(area);

    let title = Paragraph::new(Span::styled(
        app.nav.title().to_string(),
        Style::default().fg(ACCENT_LIME).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let tabs = Tabs::new(Page::NAV_CONTROLS.iter().map(|p| p.nav_label()).collect::<Vec<_>>())
        .block(Block::default().borders(Borders::ALL))
        .select(app.nav.active_control_index())
        .highlight_style(
            Style::default()
                .fg(ACCENT_LIME)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, chunks[1]);
}

fn draw_home(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let ring = app.home.ring;
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Today"))
        .gauge_style(Style::default().fg(ACCENT_LIME).bg(GRAY))
        .ratio((ring.arc_degrees() / 360.0).clamp(0.0, 1.0))
        .label(Span::styled(
            format!("{} ({}%)", ring.label(), ring.percentage),
            Style::default().fg(Color::Black),
        ));
    f.render_widget(gauge, chunks[0]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[1]);

    // one selection spans both lists
    let today_len = app.home.today.len();
    let mut today_state = ListState::default();
    let mut upcoming_state = ListState::default();
    match app.home_state.selected() {
        Some(i) if i < today_len => today_state.select(Some(i)),
        Some(i) => upcoming_state.select(Some(i - today_len)),
        None => {}
    }

    let today = task_list(&app.home.today, "Today", TODAY_PLACEHOLDER);
    f.render_stateful_widget(today, lists[0], &mut today_state);
    let upcoming = task_list(&app.home.upcoming, "Upcoming", UPCOMING_PLACEHOLDER);
    f.render_stateful_widget(upcoming, lists[1], &mut upcoming_state);
}

fn draw_subjects(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)].as_ref())
        .split(area);

    let cards_block = Block::default().borders(Borders::ALL).title("Subjects");
    let cards = if app.subjects.cards.is_empty() {
        List::new(vec![ListItem::new("No subjects yet")]).block(cards_block)
    } else {
        List::new(
            app.subjects
                .cards
                .iter()
                .map(|card| ListItem::new(format!("▣ {}", card.name)))
                .collect::<Vec<_>>(),
        )
        .block(cards_block)
        .highlight_style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ")
    };
    f.render_stateful_widget(cards, chunks[0], &mut app.subjects_state);

    let form = &app.subject_form;
    let block = Block::default().borders(Borders::ALL).title("New Subject");
    if form.show_add_control() {
        let hint = Paragraph::new("Press a to add a subject")
            .block(block)
            .wrap(Wrap { trim: true });
        f.render_widget(hint, chunks[1]);
        return;
    }

    let mut lines = vec![
        field_line("Name", &form.name, form.focus == SubjectField::Name),
        field_line("Teacher", &form.teacher, form.focus == SubjectField::Teacher),
    ];
    if let Some(err) = &form.error {
        lines.push(error_line(err));
    }
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        chunks[1],
    );
}

fn draw_subject_detail(f: &mut Frame, app: &App, area: Rect) {
    let Some(detail) = &app.detail else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)].as_ref())
        .split(area);

    let info = vec![
        Line::from(Span::styled(
            detail.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(detail.teacher_line.as_str()),
        Line::from(Span::styled(
            detail.notes.as_str(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    f.render_widget(
        Paragraph::new(info)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(chunks[1]);

    let items: Vec<ListItem> = detail
        .tasks
        .iter()
        .map(|task| {
            let style = if task.is_complete {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default()
            };
            ListItem::new(vec![
                Line::from(Span::styled(task.title.as_str(), style)),
                Line::from(format!("    Deadline: {}", task.deadline_label)),
            ])
        })
        .collect();
    f.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title("Tasks")),
        body[0],
    );

    if let Some(chart) = app.subject_progress_chart.current() {
        f.render_widget(chart_widget(chart.data(), "Progress"), body[1]);
    }
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)].as_ref())
        .split(area);

    if let Some(chart) = app.tasks_per_day_chart.current() {
        f.render_widget(chart_widget(chart.data(), "Last 7 days"), chunks[0]);
    }
    if let Some(chart) = app.tasks_by_subject_chart.current() {
        f.render_widget(chart_widget(chart.data(), "Tasks per subject"), chunks[1]);
    }
}

fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let label_style = if focused {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let cursor = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::raw(value),
        Span::styled(cursor, Style::default().fg(Color::Green)),
    ])
}

fn error_line(message: &str) -> Line<'_> {
    Line::from(Span::styled(message, Style::default().fg(Color::Red)))
}

fn draw_task_form(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.task_form;
    let subject_label = app
        .subjects
        .options
        .get(form.subject_index)
        .map(|o| o.label.as_str())
        .unwrap_or("");

    let mut lines = vec![
        field_line("Title", &form.title, form.focus == TaskField::Title),
        field_line(
            "Subject",
            subject_label,
            form.focus == TaskField::Subject,
        ),
        field_line(
            "Deadline (YYYY-MM-DDTHH:MM)",
            &form.deadline,
            form.focus == TaskField::Deadline,
        ),
        field_line(
            "Attach files (comma separated)",
            &form.attachment_paths,
            form.focus == TaskField::Attachments,
        ),
    ];
    for name in &form.existing_attachments {
        lines.push(Line::from(Span::styled(
            format!("  ✔ {}", name),
            Style::default().fg(Color::Gray),
        )));
    }
    if let Some(err) = &form.error {
        lines.push(error_line(err));
    }

    let popup_width = (area.width / 10 * 7).max(20);
    let popup_height = (lines.len() as u16 + 2).min(area.height);
    let popup_area = centered_rect_absolute(popup_width, popup_height, area);

    let popup_block = Block::default()
        .title(form.heading)
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Green));
    let input = Paragraph::new(lines)
        .style(Style::default().fg(Color::White))
        .block(popup_block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(input, popup_area);
}

fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(size);

    draw_header(f, app, chunks[0]);
    match app.nav.active() {
        Page::Home => draw_home(f, app, chunks[1]),
        Page::Subjects => draw_subjects(f, app, chunks[1]),
        Page::SubjectDetail => draw_subject_detail(f, app, chunks[1]),
        Page::Progress => draw_progress(f, app, chunks[1]),
    }
    if app.task_form.visible {
        draw_task_form(f, app, chunks[1]);
    }

    if let Some(status) = &app.status {
        f.render_widget(
            Paragraph::new(status.as_str()).style(Style::default().fg(Color::Yellow)),
            chunks[2],
        );
    }

    let legend = Paragraph::new(get_legend(app.input_mode, app.nav.active()))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: true });
    f.render_widget(legend, chunks[3]);
}

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        // Handle input
        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let should_quit = app.handle_input(key).await;
                if should_quit {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::palette_for;
    use crate::store::Store;
    use chrono::Locale;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_centered_rect_absolute_fits_inside() {
        let area = Rect::new(0, 0, 100, 40);
        let popup = centered_rect_absolute(60, 10, area);
        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 10);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn test_legend_follows_page() {
        let text = get_legend(InputMode::Normal, Page::Subjects);
        let rendered: String = text.lines[0]
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert!(rendered.contains("Add Subject"));
        assert!(!rendered.contains("Toggle Done"));
    }

    #[test]
    fn test_chart_widget_accepts_empty_pie() {
        let data = ChartData {
            kind: ChartKind::Pie,
            labels: vec!["Completed".to_string(), "Remaining".to_string()],
            dataset_label: None,
            values: vec![0, 0],
            colors: palette_for(2),
        };
        let backend = ratatui::backend::TestBackend::new(40, 8);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| f.render_widget(chart_widget(&data, "Progress"), f.area()))
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_home_draws_placeholders_and_zero_ring() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::open(&dir.path().join("db.sqlite3"), 1).await.unwrap();
        let mut app = App::new(store, Locale::en_US);
        app.initialize().await.unwrap();

        let mut terminal = Terminal::new(TestBackend::new(120, 20)).unwrap();
        terminal.draw(|f| draw(f, &mut app)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains(TODAY_PLACEHOLDER), "{}", text);
        assert!(text.contains(UPCOMING_PLACEHOLDER), "{}", text);
        assert!(text.contains("0/0"), "{}", text);
    }
}
