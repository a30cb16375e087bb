use ratatui::style::Color;

pub mod app;
pub mod keyboard_manager;
pub mod utils;
pub mod widgets;

pub use app::App;
pub use keyboard_manager::{KeyboardEvent, KeyboardManager};

const ROW_COLOR: Color = Color::Rgb(80, 80, 80);
const ROW_ALTERNATE_COLOR: Color = Color::Rgb(50, 50, 50);
const HIGHLIGHT_COLOR: Color = Color::Rgb(255, 191, 0);
const MUTED_COLOR: Color = Color::Rgb(200, 60, 60);
