use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub comment: Color, // Grey, for addresses and placeholders
    pub primary: Color, // Blue, for sizes and line numbers
    pub value: Color,   // Orange, for observation values
    pub label: Color,   // Yellow, for variable labels
    pub type_name: Color,
    pub error: Color,
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    comment: Color::Rgb(108, 112, 134),
    primary: Color::Rgb(137, 180, 250),
    value: Color::Rgb(250, 179, 135),
    label: Color::Rgb(249, 226, 175),
    type_name: Color::Rgb(148, 226, 213),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175),
    border_normal: Color::Rgb(108, 112, 134),
    current_line_bg: Color::Rgb(50, 50, 70),
};
