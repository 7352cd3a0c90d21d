use harvest_api_client::Transport;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{App, EditField};
use crate::theme::Theme;
use crate::ui::centered;
use crate::views::login::field_line;
use crate::views::payment_form::{method_line, status_line};

pub fn render<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let card = centered(area, 64, 14);
    let Some(form) = app.edit_form.as_ref() else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "No family selected",
                Style::new().fg(Theme::TEXT_MUTED),
            ))
            .block(Theme::block_dim()),
            card,
        );
        return;
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("  Family Name       ", Style::new().fg(Theme::TEXT_SECONDARY)),
            Span::styled(
                form.draft.family_name.clone(),
                Style::new().fg(Theme::TEXT_PRIMARY).bold(),
            ),
        ]),
        Line::raw(""),
        field_line("Amount", &form.draft.amount, form.field == EditField::Amount),
        method_line(form.draft.payment_method, form.field == EditField::Method),
        Line::raw(""),
        status_line(form.submitting, form.error.as_deref()),
    ];

    let body = Paragraph::new(lines).block(
        Theme::block_accent()
            .title(" Record Payment ")
            .padding(Theme::PADDING_CARD),
    );
    frame.render_widget(body, card);
}
