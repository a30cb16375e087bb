use std::time::{Duration, Instant};

use ratatui::{
    prelude::{Alignment, Line, Rect, Span},
    style::{Color, Modifier, Style},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::HIGHLIGHT_COLOR;

const VISIBLE_FOR: Duration = Duration::from_millis(1500);

/// Native-style volume indicator: a row of `ticks` chiclets.
pub trait OnScreenDisplay {
    fn show(&mut self, percent: f32, ticks: u32);
}

pub struct VolumeOsd {
    percent: f32,
    ticks: u32,
    shown_at: Option<Instant>,
}

impl VolumeOsd {
    pub fn new() -> Self {
        Self {
            percent: 0.0,
            ticks: 0,
            shown_at: None,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.shown_at
            .is_some_and(|shown_at| shown_at.elapsed() < VISIBLE_FOR)
    }

    /// Number of lit chiclets for the current value.
    pub fn lit(&self) -> usize {
        let lit = (self.percent / 100.0 * self.ticks as f32).round();
        (lit.max(0.0) as usize).min(self.ticks as usize)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.is_visible() {
            return;
        }
        let lit = self.lit();
        let unlit = self.ticks as usize - lit;
        let icon = if self.percent <= 0.0 { "mute" } else { "vol" };

        let text = vec![
            Line::from(vec![
                Span::styled(icon, Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {:.0}%", self.percent)),
            ]),
            Line::from(vec![
                Span::styled("▮".repeat(lit), Style::default().fg(HIGHLIGHT_COLOR)),
                Span::styled("▯".repeat(unlit), Style::default().fg(Color::DarkGray)),
            ]),
        ];

        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(HIGHLIGHT_COLOR)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

impl OnScreenDisplay for VolumeOsd {
    fn show(&mut self, percent: f32, ticks: u32) {
        self.percent = percent.clamp(0.0, 100.0);
        self.ticks = ticks;
        self.shown_at = Some(Instant::now());
    }
}

impl Default for VolumeOsd {
    fn default() -> Self {
        Self::new()
    }
}
