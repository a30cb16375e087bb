use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use anyhow::{anyhow, Result};
use crossterm::event::{Event, KeyCode, KeyEventKind, MediaKeyCode};
use log::warn;

use crate::audio::MediaKey;

const EVENT_QUEUE_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    Media(MediaKey),
    DeviceSelector,
    SetDefault,
    Quit,
    Escape,
    Up,
    Down,
    Enter,
}

/// Maps terminal key presses to app events and queues them in arrival order.
pub struct KeyboardManager {
    sender: SyncSender<KeyboardEvent>,
    receiver: Option<Receiver<KeyboardEvent>>,
    selector_mode: bool,
}

impl KeyboardManager {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::sync_channel(EVENT_QUEUE_SIZE);
        Self {
            sender,
            receiver: Some(receiver),
            selector_mode: false,
        }
    }

    /// While the device selector is open the arrow keys move the highlight instead of
    /// stepping the volume.
    pub fn set_selector_mode(&mut self, active: bool) {
        self.selector_mode = active;
    }

    /// Hands out the receiving end; there is only one consumer.
    pub fn take_receiver(&mut self) -> Result<Receiver<KeyboardEvent>> {
        self.receiver
            .take()
            .ok_or_else(|| anyhow!("keyboard event receiver already taken"))
    }

    pub fn handle_event(&self, event: Event) -> Result<()> {
        let Event::Key(key) = event else {
            return Ok(());
        };
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let keyboard_event = match key.code {
            KeyCode::Media(code) => Some(KeyboardEvent::Media(media_key(code))),
            KeyCode::F(10) => Some(KeyboardEvent::Media(MediaKey::Mute)),
            KeyCode::F(11) => Some(KeyboardEvent::Media(MediaKey::VolumeDown)),
            KeyCode::F(12) => Some(KeyboardEvent::Media(MediaKey::VolumeUp)),
            KeyCode::F(7..=9) => Some(KeyboardEvent::Media(MediaKey::Other)),
            KeyCode::Enter => Some(KeyboardEvent::Enter),
            KeyCode::Esc => Some(KeyboardEvent::Escape),
            KeyCode::Char('q') => Some(KeyboardEvent::Quit),
            KeyCode::Char('o') => Some(KeyboardEvent::DeviceSelector),
            KeyCode::Char('d') => Some(KeyboardEvent::SetDefault),
            KeyCode::Up | KeyCode::Char('k') if self.selector_mode => Some(KeyboardEvent::Up),
            KeyCode::Down | KeyCode::Char('j') if self.selector_mode => Some(KeyboardEvent::Down),
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                Some(KeyboardEvent::Media(MediaKey::VolumeUp))
            }
            KeyCode::Down | KeyCode::Char('-') => Some(KeyboardEvent::Media(MediaKey::VolumeDown)),
            KeyCode::Char('m') => Some(KeyboardEvent::Media(MediaKey::Mute)),
            _ => None,
        };

        if let Some(event) = keyboard_event {
            match self.sender.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => warn!("event queue full, dropping {:?}", event),
                Err(TrySendError::Disconnected(_)) => {
                    return Err(anyhow!("keyboard event receiver dropped"))
                }
            }
        }
        Ok(())
    }
}

impl Default for KeyboardManager {
    fn default() -> Self {
        Self::new()
    }
}

fn media_key(code: MediaKeyCode) -> MediaKey {
    match code {
        MediaKeyCode::RaiseVolume => MediaKey::VolumeUp,
        MediaKeyCode::LowerVolume => MediaKey::VolumeDown,
        MediaKeyCode::MuteVolume => MediaKey::Mute,
        _ => MediaKey::Other,
    }
}
