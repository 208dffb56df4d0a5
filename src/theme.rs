use tuirealm::ratatui::style::Color;

use crate::types::{ColumnColor, LabelColor};

/// Board chrome colors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Theme {
    pub canvas: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub focus: Color,
    pub selected_bg: Color,
    pub drop_target: Color,
    pub danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            canvas: Color::Rgb(3, 3, 3),
            text: Color::Rgb(229, 229, 229),
            text_muted: Color::Rgb(115, 115, 115),
            border: Color::Rgb(64, 64, 64),
            focus: Color::Rgb(129, 140, 248),
            selected_bg: Color::Rgb(30, 27, 75),
            drop_target: Color::Rgb(99, 102, 241),
            danger: Color::Rgb(248, 113, 113),
        }
    }
}

/// 500-weight swatch for each column accent.
pub fn column_color(color: ColumnColor) -> Color {
    match color {
        ColumnColor::Neutral => Color::Rgb(115, 115, 115),
        ColumnColor::Red => Color::Rgb(239, 68, 68),
        ColumnColor::Orange => Color::Rgb(249, 115, 22),
        ColumnColor::Amber => Color::Rgb(245, 158, 11),
        ColumnColor::Green => Color::Rgb(34, 197, 94),
        ColumnColor::Emerald => Color::Rgb(16, 185, 129),
        ColumnColor::Teal => Color::Rgb(20, 184, 166),
        ColumnColor::Cyan => Color::Rgb(6, 182, 212),
        ColumnColor::Sky => Color::Rgb(14, 165, 233),
        ColumnColor::Blue => Color::Rgb(59, 130, 246),
        ColumnColor::Indigo => Color::Rgb(99, 102, 241),
        ColumnColor::Violet => Color::Rgb(139, 92, 246),
        ColumnColor::Purple => Color::Rgb(168, 85, 247),
        ColumnColor::Fuchsia => Color::Rgb(217, 70, 239),
        ColumnColor::Pink => Color::Rgb(236, 72, 153),
        ColumnColor::Rose => Color::Rgb(244, 63, 94),
    }
}

pub fn label_color(color: LabelColor) -> Color {
    match color {
        LabelColor::Red => Color::Rgb(239, 68, 68),
        LabelColor::Orange => Color::Rgb(249, 115, 22),
        LabelColor::Yellow => Color::Rgb(234, 179, 8),
        LabelColor::Green => Color::Rgb(34, 197, 94),
        LabelColor::Blue => Color::Rgb(59, 130, 246),
        LabelColor::Purple => Color::Rgb(168, 85, 247),
        LabelColor::Pink => Color::Rgb(236, 72, 153),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_column_palette_colors_are_distinct() {
        let colors: HashSet<Color> = ColumnColor::ALL.into_iter().map(column_color).collect();
        assert_eq!(colors.len(), ColumnColor::ALL.len());
    }

    #[test]
    fn test_shared_swatches_match() {
        assert_eq!(column_color(ColumnColor::Red), label_color(LabelColor::Red));
        assert_eq!(column_color(ColumnColor::Blue), label_color(LabelColor::Blue));
    }
}
