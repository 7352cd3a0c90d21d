use harvest_api::PaymentMethod;
use harvest_api_client::Transport;
use ratatui::prelude::*;
use ratatui::widgets::{Paragraph, Wrap};

use crate::app::{App, CreateField};
use crate::theme::Theme;
use crate::ui::centered;
use crate::views::login::field_line;

pub const SUBMITTING: &str = "Submitting...";

pub fn render<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let form = &app.create_form;
    let active = form.field();
    let card = centered(area, 64, 16);

    let mut lines = vec![
        Line::from(Span::styled(
            "New family and first payment",
            Style::new().fg(Theme::TEXT_SECONDARY),
        )),
        Line::raw(""),
        field_line(
            "Family Name",
            &form.draft.family_name,
            active == CreateField::FamilyName,
        ),
        field_line(
            "No of Children",
            &form.draft.child_count,
            active == CreateField::ChildCount,
        ),
        field_line("Amount", &form.draft.amount, active == CreateField::Amount),
        method_line(form.draft.payment_method, active == CreateField::Method),
        Line::raw(""),
    ];
    lines.push(status_line(form.submitting, form.error.as_deref()));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Theme::block_accent()
                .title(" Create Family Payment ")
                .padding(Theme::PADDING_CARD),
        );
    frame.render_widget(body, card);
}

/// Payment method selector: `◂ Bank Transfer ▸` when focused.
pub(crate) fn method_line(method: PaymentMethod, active: bool) -> Line<'static> {
    let mut line = field_line("Payment Method", "", active);
    if active {
        // drop the text cursor
        line.spans.pop();
        line.spans.push(Span::styled("\u{25c2} ", Style::new().fg(Theme::FIELD_ACTIVE)));
        line.spans.push(Span::styled(
            method.label(),
            Style::new().fg(Theme::TEXT_PRIMARY).bold(),
        ));
        line.spans.push(Span::styled(" \u{25b8}", Style::new().fg(Theme::FIELD_ACTIVE)));
    } else {
        line.spans.push(Span::styled(
            method.label(),
            Style::new().fg(Theme::FIELD_VALUE),
        ));
    }
    line
}

/// In-flight indicator, or the inline error.
pub(crate) fn status_line(submitting: bool, error: Option<&str>) -> Line<'static> {
    if submitting {
        Line::from(Span::styled(
            SUBMITTING,
            Style::new().fg(Theme::ACCENT_YELLOW).italic(),
        ))
    } else if let Some(err) = error {
        Line::from(Span::styled(
            err.to_string(),
            Style::new().fg(Theme::ACCENT_RED),
        ))
    } else {
        Line::raw("")
    }
}
