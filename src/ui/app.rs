use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::Result;
use crossterm::event;
use crossterm::terminal::SetTitle;
use crossterm::ExecutableCommand;
use log::{error, info, warn};
use ratatui::{
    prelude::{Alignment, Constraint, Direction, Layout, Line, Span},
    style::{Modifier, Style},
    widgets::{Block, BorderType, Borders, Paragraph},
    DefaultTerminal, Frame,
};

use super::{
    utils::{bottom_right_fixed_size, centered_fixed_size_rect},
    widgets::{DeviceSelector, OnScreenDisplay, VolumeOsd},
    KeyboardEvent, KeyboardManager, HIGHLIGHT_COLOR, MUTED_COLOR,
};
use crate::audio::{DeviceId, DeviceVolumeCoordinator, HostTrait, VolumeStepper};

const HELP: &str = "+/- volume  m mute  o devices  d make default  q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screens {
    Default,
    OutputSelector,
}

pub struct App<H: HostTrait + 'static> {
    coordinator: DeviceVolumeCoordinator<H>,
    stepper: VolumeStepper,
    screen: Screens,
    output_selector: DeviceSelector,
    osd: VolumeOsd,
    keyboard_manager: KeyboardManager,
    event_receiver: Receiver<KeyboardEvent>,
    status: Option<String>,
}

impl<H: HostTrait + 'static> App<H> {
    pub fn new(coordinator: DeviceVolumeCoordinator<H>, stepper: VolumeStepper) -> Result<Self> {
        let mut keyboard_manager = KeyboardManager::new();
        let event_receiver = keyboard_manager.take_receiver()?;

        Ok(Self {
            coordinator,
            stepper,
            screen: Screens::Default,
            output_selector: DeviceSelector::new(),
            osd: VolumeOsd::new(),
            keyboard_manager,
            event_receiver,
            status: None,
        })
    }

    fn render(&mut self, frame: &mut Frame) -> Result<()> {
        let area = frame.area();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        frame.render_widget(self.status_panel(), layout[0]);
        frame.render_widget(
            Paragraph::new(self.status.clone().unwrap_or_else(|| HELP.to_string()))
                .style(Style::default().add_modifier(Modifier::DIM)),
            layout[2],
        );

        if self.screen == Screens::OutputSelector {
            let height = (self.coordinator.devices().len() as u16).saturating_add(2);
            let popup = centered_fixed_size_rect(48, height, area);
            self.output_selector
                .render(frame, popup, self.coordinator.selected_device())?;
        }

        let osd_area = bottom_right_fixed_size(self.stepper.ticks() as u16 + 4, 4, area);
        self.osd.render(frame, osd_area);
        Ok(())
    }

    fn status_panel(&self) -> Paragraph<'static> {
        let device = match self.coordinator.selected_device_info() {
            Some(info) if info.is_aggregate => format!(
                "{} (#{}, aggregate of {} devices)",
                info.name,
                info.id,
                info.sub_devices.len()
            ),
            Some(info) => format!("{} (#{})", info.name, info.id),
            None => match self.coordinator.selected_device() {
                Some(id) => format!("device #{} unavailable", id),
                None => "no device selected".to_string(),
            },
        };

        let volume = if self.coordinator.is_selected_device_muted() {
            Span::styled("muted", Style::default().fg(MUTED_COLOR))
        } else {
            match self.coordinator.display_volume() {
                Some(percent) => Span::raw(format!("{:.2}%", percent)),
                None => Span::raw("--"),
            }
        };

        let text = vec![
            Line::from(vec![
                Span::styled("Output: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(device),
            ]),
            Line::from(vec![
                Span::styled("Volume: ", Style::default().add_modifier(Modifier::BOLD)),
                volume,
            ]),
            Line::from(vec![
                Span::styled("Steps: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(self.stepper.ticks().to_string()),
            ]),
        ];

        Paragraph::new(text).block(
            Block::default()
                .title("aggvol")
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(HIGHLIGHT_COLOR)),
        )
    }

    fn open_selector(&mut self) {
        if let Err(err) = self.coordinator.refresh_devices() {
            warn!("unable to refresh device list: {}", err);
        }
        self.output_selector
            .refresh_device_list(self.coordinator.devices(), self.coordinator.selected_device());
        self.screen = Screens::OutputSelector;
        self.keyboard_manager.set_selector_mode(true);
    }

    fn close_selector(&mut self) {
        self.screen = Screens::Default;
        self.keyboard_manager.set_selector_mode(false);
    }

    /// Returns `false` once the app should exit.
    fn handle_keyboard_event(&mut self, event: KeyboardEvent) -> bool {
        match (self.screen, event) {
            (_, KeyboardEvent::Media(key)) => {
                if let Some(percent) = self.stepper.handle(&self.coordinator, key) {
                    self.osd.show(percent, self.stepper.ticks());
                }
            }
            (Screens::Default, KeyboardEvent::Quit) => return false,
            (Screens::Default, KeyboardEvent::DeviceSelector) => self.open_selector(),
            (Screens::Default, KeyboardEvent::SetDefault) => {
                if let Some(id) = self.coordinator.selected_device() {
                    self.make_default(id);
                }
            }
            (Screens::OutputSelector, KeyboardEvent::Up) => self.output_selector.select_previous(),
            (Screens::OutputSelector, KeyboardEvent::Down) => self.output_selector.select_next(),
            (Screens::OutputSelector, KeyboardEvent::Enter) => {
                if let Some(id) = self.output_selector.highlighted() {
                    self.coordinator.select_device(id);
                    self.status = None;
                }
                self.close_selector();
            }
            (Screens::OutputSelector, KeyboardEvent::SetDefault) => {
                if let Some(id) = self.output_selector.highlighted() {
                    self.make_default(id);
                }
                self.close_selector();
            }
            (
                Screens::OutputSelector,
                KeyboardEvent::Escape | KeyboardEvent::Quit | KeyboardEvent::DeviceSelector,
            ) => self.close_selector(),
            _ => {}
        }
        true
    }

    fn make_default(&mut self, id: DeviceId) {
        let label = match self.coordinator.device_name(id) {
            Some(name) => format!("{} (#{})", name, id),
            None => format!("device #{}", id),
        };
        match self.coordinator.set_output_device(id) {
            Ok(()) => {
                info!("{} is now the default output", label);
                self.status = None;
            }
            Err(err) => {
                error!("unable to make {} the default output: {}", label, err);
                self.status = Some(format!("could not make {} the default output", label));
            }
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        terminal
            .backend_mut()
            .execute(SetTitle("aggvol - aggregate device volume"))?;

        loop {
            terminal.draw(|frame| {
                if let Err(err) = self.render(frame) {
                    error!("error while drawing {}", err);
                }
            })?;

            if event::poll(Duration::from_millis(100))? {
                self.keyboard_manager.handle_event(event::read()?)?;
            }

            while let Ok(event) = self.event_receiver.try_recv() {
                if !self.handle_keyboard_event(event) {
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::api::simulated::SimulatedHost;
    use crate::audio::MediaKey;
    use std::sync::Arc;

    fn app() -> (Arc<SimulatedHost>, App<SimulatedHost>) {
        let host = Arc::new(SimulatedHost::with_demo_devices().unwrap());
        let mut coordinator = DeviceVolumeCoordinator::new(host.clone());
        coordinator.select_device(72);
        (host, App::new(coordinator, VolumeStepper::new(16)).unwrap())
    }

    #[test]
    fn media_key_updates_every_sub_device_and_shows_osd() {
        let (host, mut app) = app();
        assert!(app.handle_keyboard_event(KeyboardEvent::Media(MediaKey::VolumeUp)));

        assert!(app.osd.is_visible());
        assert_eq!(host.get_device_volume(41).unwrap(), vec![0.5625; 3]);
        assert_eq!(host.get_device_volume(57).unwrap(), vec![0.5625; 3]);
    }

    #[test]
    fn selector_picks_highlighted_device() {
        let (_, mut app) = app();
        app.handle_keyboard_event(KeyboardEvent::DeviceSelector);
        assert_eq!(app.screen, Screens::OutputSelector);

        // sorted by name: Built-in Speakers, Multi-Output Device, USB Headphones
        app.handle_keyboard_event(KeyboardEvent::Down);
        app.handle_keyboard_event(KeyboardEvent::Enter);

        assert_eq!(app.screen, Screens::Default);
        assert_eq!(app.coordinator.selected_device(), Some(57));
    }

    #[test]
    fn set_default_from_selector() {
        let (host, mut app) = app();
        app.handle_keyboard_event(KeyboardEvent::DeviceSelector);
        app.handle_keyboard_event(KeyboardEvent::SetDefault);
        assert_eq!(host.get_default_output_device().unwrap(), 72);
        assert_eq!(app.status, None);
    }

    #[test]
    fn failed_set_default_names_the_device() {
        let (_, mut app) = app();
        // 63 is the microphone, which cannot be an output
        app.make_default(63);
        assert_eq!(
            app.status.as_deref(),
            Some("could not make device #63 the default output")
        );

        app.make_default(57);
        assert_eq!(app.status, None);
        assert_eq!(app.coordinator.selected_device(), Some(57));
    }

    #[test]
    fn quit_only_from_main_screen() {
        let (_, mut app) = app();
        app.handle_keyboard_event(KeyboardEvent::DeviceSelector);
        assert!(app.handle_keyboard_event(KeyboardEvent::Quit));
        assert!(!app.handle_keyboard_event(KeyboardEvent::Quit));
    }
}
