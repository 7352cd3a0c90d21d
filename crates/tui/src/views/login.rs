use harvest_api_client::Transport;
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::App;
use crate::theme::Theme;
use crate::ui::{APP_TITLE, centered, hint_line};

pub const SESSION_BANNER_TITLE: &str = "Authentication Error";
pub const SIGNING_IN: &str = "Signing in...";

pub fn render<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let card = centered(area, 60, 22);
    let [banner_area, form_area, hint_area] = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(12),
        Constraint::Fill(1),
    ])
    .areas(card);

    // ── Session banner ────────────────────────────────────────────────
    let session = app.controller.session();
    if let Some(message) = session.last_error() {
        let banner = Paragraph::new(vec![
            Line::from(Span::styled(
                SESSION_BANNER_TITLE,
                Style::new().fg(Theme::ACCENT_RED).bold(),
            )),
            Line::from(Span::styled(
                message.to_string(),
                Style::new().fg(Theme::TEXT_PRIMARY),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(Theme::block_error());
        frame.render_widget(banner, banner_area);
    }

    // ── Form ─────────────────────────────────────────────────────────
    let login = &app.login;
    let masked = "\u{2022}".repeat(login.password.chars().count());
    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                APP_TITLE,
                Style::new().fg(Theme::TEXT_PRIMARY).bg(Theme::BRAND).bold(),
            ),
            Span::styled(" Sign in", Style::new().fg(Theme::TEXT_PRIMARY).bold()),
        ]),
        Line::from(Span::styled(
            app.server_url.clone(),
            Style::new().fg(Theme::TEXT_MUTED),
        )),
        Line::raw(""),
        field_line("Username", &login.username, login.field_index == 0),
        field_line("Password", &masked, login.field_index == 1),
        Line::raw(""),
    ];

    if login.submitting {
        lines.push(Line::from(Span::styled(
            SIGNING_IN,
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        )));
    } else if let Some(ref err) = login.error {
        lines.push(Line::from(Span::styled(
            err.clone(),
            Style::new().fg(Theme::ACCENT_RED),
        )));
    }

    let form = Paragraph::new(lines).block(Theme::block_accent().padding(Theme::PADDING_CARD));
    frame.render_widget(form, form_area);

    // ── Hints ─────────────────────────────────────────────────────────
    let hints = hint_line(&[
        ("Tab ", "switch field  "),
        ("Enter ", "sign in  "),
        ("Esc ", "dismiss  "),
        ("Ctrl+C ", "quit"),
    ]);
    frame.render_widget(Paragraph::new(vec![Line::raw(""), hints]), hint_area);
}

pub(crate) fn field_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let marker = if active { "\u{25b8} " } else { "  " };
    let label_style = if active {
        Style::new().fg(Theme::FIELD_ACTIVE).bold()
    } else {
        Style::new().fg(Theme::TEXT_SECONDARY)
    };
    let mut spans = vec![
        Span::styled(marker, label_style),
        Span::styled(format!("{label:<18}"), label_style),
        Span::styled(value.to_string(), Style::new().fg(Theme::FIELD_VALUE)),
    ];
    if active {
        spans.push(Span::styled("_", Style::new().fg(Theme::FIELD_ACTIVE)));
    }
    Line::from(spans)
}
