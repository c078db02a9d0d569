//! Color constants for the terminal user interface.

use ratatui::style::Color;

use crate::fields::{Category, Priority};

/// Header and status bar background.
pub const BRAND: Color = Color::Rgb(0, 80, 0);
/// Used for high priority
pub const DARK_RED: Color = Color::Rgb(170, 30, 30);
/// Used for the work category
pub const WORK_BLUE: Color = Color::Rgb(70, 120, 220);
/// Used for the personal category
pub const PERSONAL_GREEN: Color = Color::Rgb(60, 160, 80);
/// Used for the shopping category
pub const SHOPPING_PURPLE: Color = Color::Rgb(150, 100, 200);

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => DARK_RED,
        Priority::Medium => Color::White,
        Priority::Low => Color::Gray,
    }
}

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Work => WORK_BLUE,
        Category::Personal => PERSONAL_GREEN,
        Category::Shopping => SHOPPING_PURPLE,
    }
}
