use anyhow::Result;
use ratatui::{
    prelude::{Alignment, Constraint, Rect},
    style::Style,
    widgets::{Block, BorderType, Borders, Cell, Clear, Row, Table, TableState},
    Frame,
};

use crate::audio::DeviceId;
use crate::ui::{HIGHLIGHT_COLOR, ROW_ALTERNATE_COLOR, ROW_COLOR};

pub struct DeviceSelector {
    pub state: TableState,
    devices: Vec<(DeviceId, String)>,
}

impl DeviceSelector {
    pub fn new() -> Self {
        Self {
            state: TableState::default(),
            devices: Vec::new(),
        }
    }

    /// Replaces the listed devices and moves the highlight onto `selected` when listed.
    pub fn refresh_device_list(&mut self, devices: Vec<(DeviceId, String)>, selected: Option<DeviceId>) {
        let index = selected
            .and_then(|id| devices.iter().position(|(device, _)| *device == id))
            .or(if devices.is_empty() { None } else { Some(0) });
        self.devices = devices;
        self.state.select(index);
    }

    pub fn highlighted(&self) -> Option<DeviceId> {
        self.state
            .selected()
            .and_then(|i| self.devices.get(i))
            .map(|(id, _)| *id)
    }

    pub fn select_next(&mut self) {
        if self.devices.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < self.devices.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.devices.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.devices.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub(crate) fn render(&mut self, frame: &mut Frame, area: Rect, selected: Option<DeviceId>) -> Result<()> {
        let rows = self.devices.iter().enumerate().map(|(index, (id, name))| {
            Row::new(vec![
                Cell::from(if Some(*id) == selected { "*" } else { " " }),
                Cell::from(name.as_str()),
            ])
            .height(1)
            .style(Style::default().bg(if index % 2 == 0 {
                ROW_COLOR
            } else {
                ROW_ALTERNATE_COLOR
            }))
        });

        let table = Table::new(rows, [Constraint::Length(1), Constraint::Percentage(100)])
            .highlight_symbol("=>")
            .row_highlight_style(Style::default().fg(HIGHLIGHT_COLOR))
            .block(
                Block::default()
                    .title("Select Output Device")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(HIGHLIGHT_COLOR)),
            );

        frame.render_widget(Clear, area);
        frame.render_stateful_widget(table, area, &mut self.state);
        Ok(())
    }
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector() -> DeviceSelector {
        let mut selector = DeviceSelector::new();
        selector.refresh_device_list(
            vec![(7, "Dock".into()), (1, "Speakers".into()), (3, "USB".into())],
            Some(1),
        );
        selector
    }

    #[test]
    fn highlight_starts_on_selected_device() {
        assert_eq!(selector().highlighted(), Some(1));
    }

    #[test]
    fn navigation_wraps() {
        let mut selector = selector();
        selector.select_next();
        selector.select_next();
        assert_eq!(selector.highlighted(), Some(7));
        selector.select_previous();
        assert_eq!(selector.highlighted(), Some(3));
    }

    #[test]
    fn empty_list_has_no_highlight() {
        let mut selector = DeviceSelector::new();
        selector.refresh_device_list(Vec::new(), Some(1));
        selector.select_next();
        assert_eq!(selector.highlighted(), None);
    }
}
