use harvest_api_client::Transport;
use harvest_core::Screen;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::App;
use crate::theme::{Theme, flash_color};
use crate::views::{family_list, login, payment_form, record_payment};

pub const APP_TITLE: &str = " Harvest ";

pub fn render<T: Transport>(frame: &mut Frame, app: &App<T>) {
    // Login is always full-screen
    if matches!(app.screen(), Screen::Login) {
        login::render(frame, app, frame.area());
        return;
    }

    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    render_header(frame, app, header_area);

    match app.screen() {
        Screen::Summary => family_list::render(frame, app, body_area),
        Screen::CreateForm => payment_form::render(frame, app, body_area),
        Screen::EditForm { .. } => record_payment::render(frame, app, body_area),
        Screen::Login => {} // handled above
    }

    render_footer(frame, app, footer_area);
}

fn render_header<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    let block = Theme::block();
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let section = match app.screen() {
        Screen::Summary => "Families Payments Summary",
        Screen::CreateForm => "Create Family Payment",
        Screen::EditForm { .. } => "Update Family Payment",
        Screen::Login => "",
    };
    let left = Line::from(vec![
        Span::styled(
            APP_TITLE,
            Style::new().fg(Theme::TEXT_PRIMARY).bg(Theme::BRAND).bold(),
        ),
        Span::raw("  "),
        Span::styled(section, Style::new().fg(Theme::BRAND_LIGHT).bold()),
    ]);
    frame.render_widget(Paragraph::new(left), inner);

    let session = app.controller.session();
    let user = session.identity().unwrap_or("signed in");
    let right = Line::from(vec![
        Span::styled(user.to_string(), Style::new().fg(Theme::TEXT_PRIMARY).bold()),
        Span::styled("  Ctrl+L ", Style::new().fg(Theme::TEXT_KEY)),
        Span::styled("logout ", Style::new().fg(Theme::TEXT_KEY_DESC)),
    ]);
    frame.render_widget(Paragraph::new(right).alignment(Alignment::Right), inner);
}

fn render_footer<T: Transport>(frame: &mut Frame, app: &App<T>, area: Rect) {
    if let Some((ref msg, level)) = app.flash_message {
        let line = Line::from(Span::styled(
            format!(" {msg}"),
            Style::new().fg(flash_color(level)),
        ));
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let hints: &[(&str, &str)] = match app.screen() {
        Screen::Summary if app.searching => &[("Esc ", "clear  "), ("Enter ", "done")],
        Screen::Summary => &[
            ("j/k ", "navigate  "),
            ("Enter ", "record payment  "),
            ("/ ", "search  "),
            ("a ", "add new  "),
            ("r ", "reload  "),
            ("q ", "quit"),
        ],
        Screen::CreateForm | Screen::EditForm { .. } => &[
            ("Tab ", "next field  "),
            ("\u{2190}/\u{2192} ", "method  "),
            ("Enter ", "submit  "),
            ("Esc ", "cancel"),
        ],
        Screen::Login => &[],
    };
    frame.render_widget(Paragraph::new(hint_line(hints)), area);
}

/// Footer-style key hints.
pub fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::new().fg(Theme::TEXT_KEY);
    let desc_style = Style::new().fg(Theme::TEXT_KEY_DESC);
    let mut spans = vec![Span::raw(" ")];
    for (key, desc) in hints {
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled(desc.to_string(), desc_style));
    }
    Line::from(spans)
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered(area, 60, 6);
        assert_eq!(rect, Rect::new(0, 2, 40, 6));
    }

    #[test]
    fn hint_line_alternates_key_and_description() {
        let line = hint_line(&[("q ", "quit")]);
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "q ");
        assert_eq!(line.spans[2].content, "quit");
    }
}
