use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Padding};

use crate::app::FlashLevel;

pub struct Theme;

impl Theme {
    // ── Brand ────────────────────────────────────────────────────────
    pub const BRAND: Color = Color::Rgb(48, 64, 120);
    pub const BRAND_LIGHT: Color = Color::Rgb(110, 130, 200);

    // ── Border ───────────────────────────────────────────────────────
    pub const BORDER_DIM: Color = Color::DarkGray;
    pub const BORDER_NORMAL: Color = Color::Rgb(60, 65, 80);
    pub const BORDER_ACCENT: Color = Color::Rgb(110, 130, 200);

    // ── Text hierarchy ───────────────────────────────────────────────
    pub const TEXT_PRIMARY: Color = Color::White;
    pub const TEXT_SECONDARY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_MUTED: Color = Color::Rgb(80, 85, 100);
    pub const TEXT_HINT: Color = Color::Rgb(60, 65, 80);

    // ── Key style (for footer hints) ─────────────────────────────────
    pub const TEXT_KEY: Color = Color::Rgb(140, 145, 160);
    pub const TEXT_KEY_DESC: Color = Color::DarkGray;

    // ── Accent ───────────────────────────────────────────────────────
    pub const ACCENT_BLUE: Color = Color::Rgb(100, 180, 240);
    pub const ACCENT_GREEN: Color = Color::Rgb(80, 200, 120);
    pub const ACCENT_RED: Color = Color::Rgb(220, 80, 80);
    pub const ACCENT_YELLOW: Color = Color::Rgb(220, 180, 60);

    // ── Table ────────────────────────────────────────────────────────
    pub const ROW_SELECTED_BG: Color = Color::Rgb(40, 45, 65);

    // ── Form ─────────────────────────────────────────────────────────
    pub const FIELD_VALUE: Color = Color::Rgb(170, 175, 190);
    pub const FIELD_ACTIVE: Color = Color::Rgb(220, 180, 60);

    // ── Padding ──────────────────────────────────────────────────────
    pub const PADDING_CARD: Padding = Padding::new(2, 2, 1, 1);

    // ── Block helpers ────────────────────────────────────────────────

    pub fn block() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_NORMAL))
    }

    pub fn block_dim() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_DIM))
    }

    pub fn block_accent() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::BORDER_ACCENT))
    }

    pub fn block_error() -> Block<'static> {
        Block::bordered()
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Self::ACCENT_RED))
    }
}

pub fn flash_color(level: FlashLevel) -> Color {
    match level {
        FlashLevel::Success => Theme::ACCENT_GREEN,
        FlashLevel::Error => Theme::ACCENT_RED,
        FlashLevel::Info => Theme::ACCENT_BLUE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flash_levels_have_distinct_colors() {
        let colors = [
            flash_color(FlashLevel::Success),
            flash_color(FlashLevel::Error),
            flash_color(FlashLevel::Info),
        ];
        assert_ne!(colors[0], colors[1]);
        assert_ne!(colors[1], colors[2]);
        assert_ne!(colors[0], colors[2]);
    }
}
