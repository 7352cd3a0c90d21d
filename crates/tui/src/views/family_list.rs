use harvest_api_client::Transport;
use harvest_core::summary::{LoadState, SummaryRow};
use ratatui::prelude::*;
use ratatui::widgets::{Cell, Paragraph, Row, Table, TableState};

use crate::app::App;
use crate::theme::Theme;

pub const EMPTY_TABLE: &str = "No families found";
pub const SEARCH_PLACEHOLDER: &str = "Search by family name...";

const COLUMNS: [&str; 4] = [
    "Family Name",
    "No of Children",
    "Amount Paid",
    "Last Payment Date",
];

pub fn render<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let summary = app.controller.summary();
    let notice = app.controller.notice();

    let [search_area, notice_area, table_area, totals_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(if notice.is_some() { 1 } else { 0 }),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_search(frame, app, search_area);

    if let Some(msg) = notice {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!(" {msg}"),
                Style::new().fg(Theme::ACCENT_GREEN),
            ))),
            notice_area,
        );
    }

    match summary.state() {
        LoadState::Failed(message) => {
            let body = Paragraph::new(vec![
                Line::raw(""),
                Line::from(Span::styled(
                    message.clone(),
                    Style::new().fg(Theme::ACCENT_RED),
                )),
                Line::raw(""),
                Line::from(vec![
                    Span::styled("r ", Style::new().fg(Theme::TEXT_KEY)),
                    Span::styled("Retry", Style::new().fg(Theme::TEXT_KEY_DESC)),
                ]),
            ])
            .alignment(Alignment::Center)
            .block(Theme::block_error());
            frame.render_widget(body, table_area);
            return;
        }
        LoadState::Loading | LoadState::Idle if summary.records().is_empty() => {
            let body = Paragraph::new(Span::styled(
                "Loading...",
                Style::new().fg(Theme::ACCENT_YELLOW).italic(),
            ))
            .alignment(Alignment::Center)
            .block(Theme::block_dim());
            frame.render_widget(body, table_area);
            return;
        }
        _ => {}
    }

    let rows = app.visible_rows();
    render_table(frame, &rows, app.selected, summary.is_loading(), table_area);

    let footer = summary.footer(&app.search_query);
    let totals = Line::from(vec![
        Span::styled(
            format!(" {}", footer.total_line()),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ),
        Span::raw("    "),
        Span::styled(footer.count_line(), Style::new().fg(Theme::TEXT_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(totals), totals_area);
}

fn render_search<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let line = if app.searching {
        Line::from(vec![
            Span::styled(
                " / ",
                Style::new()
                    .fg(Color::Black)
                    .bg(Theme::ACCENT_YELLOW)
                    .bold(),
            ),
            Span::styled(
                format!(" {}", app.search_query),
                Style::new().fg(Theme::TEXT_PRIMARY),
            ),
            Span::styled("_", Style::new().fg(Theme::ACCENT_YELLOW)),
        ])
    } else if app.search_query.is_empty() {
        Line::from(Span::styled(
            format!(" {SEARCH_PLACEHOLDER}"),
            Style::new().fg(Theme::TEXT_HINT),
        ))
    } else {
        Line::from(vec![
            Span::styled(" filter: ", Style::new().fg(Theme::TEXT_SECONDARY)),
            Span::styled(
                app.search_query.clone(),
                Style::new().fg(Theme::ACCENT_BLUE),
            ),
        ])
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_table(
    frame: &mut Frame,
    rows: &[SummaryRow],
    selected: usize,
    refreshing: bool,
    area: Rect,
) {
    let header = Row::new(COLUMNS.map(Cell::from))
        .style(Style::new().fg(Theme::TEXT_PRIMARY).bg(Theme::BRAND).bold());

    let body: Vec<Row> = if rows.is_empty() {
        vec![Row::new(vec![Cell::from(Span::styled(
            EMPTY_TABLE,
            Style::new().fg(Theme::TEXT_MUTED),
        ))])]
    } else {
        rows.iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.family_name.clone()),
                    Cell::from(Line::from(r.child_count.clone()).alignment(Alignment::Center)),
                    Cell::from(Line::from(r.amount_paid.clone()).alignment(Alignment::Right)),
                    Cell::from(Line::from(r.last_payment.clone()).alignment(Alignment::Center)),
                ])
            })
            .collect()
    };

    let title = if refreshing { " refreshing\u{2026} " } else { "" };
    let table = Table::new(
        body,
        [
            Constraint::Fill(2),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .column_spacing(2)
    .row_highlight_style(Style::new().bg(Theme::ROW_SELECTED_BG).bold())
    .block(Theme::block().title(title));

    let mut state = TableState::default();
    if !rows.is_empty() {
        state.select(Some(selected.min(rows.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
