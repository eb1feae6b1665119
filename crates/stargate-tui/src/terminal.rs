//! Terminal driver for the console.
//!
//! Implements the [`Driver`] trait for terminal I/O using crossterm for
//! keyboard events and ratatui for rendering. Frames are paced by a tokio
//! interval.

use std::{
    collections::VecDeque,
    io::{self, Stdout, stdout},
    time::{Duration, Instant},
};

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::{FutureExt, StreamExt};
use ratatui::{Terminal, backend::CrosstermBackend};
use stargate_app::{Driver, GateCommand, GateView};
use stargate_core::DialMode;
use thiserror::Error;
use tokio::time::{Interval, MissedTickBehavior};

use crate::{InputState, KeyInput, ui};

/// Display refresh period (60 Hz).
pub const FRAME_PERIOD: Duration = Duration::from_micros(16_667);

/// Terminal driver errors.
#[derive(Debug, Error)]
pub enum TerminalError {
    /// I/O error from terminal operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Terminal driver implementing the [`Driver`] trait.
///
/// Handles terminal I/O (crossterm) and rendering (ratatui). Owns the glyph
/// entry field.
pub struct TerminalDriver {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_stream: EventStream,
    frames: Interval,
    input: InputState,
    /// Commands decoded but not yet handed to the runtime
    queued: VecDeque<GateCommand>,
    /// Mode of the last rendered view
    mode: DialMode,
    raw_mode: bool,
}

impl TerminalDriver {
    /// Take over the terminal.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self, TerminalError> {
        enable_raw_mode()?;
        stdout().execute(EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend)?;

        let mut frames = tokio::time::interval(FRAME_PERIOD);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

        Ok(Self {
            terminal,
            event_stream: EventStream::new(),
            frames,
            input: InputState::new(),
            queued: VecDeque::new(),
            mode: DialMode::default(),
            raw_mode: true,
        })
    }

    /// Queue a command as if it had been typed.
    pub fn queue(&mut self, command: GateCommand) {
        self.queued.push_back(command);
    }

    /// Convert crossterm `KeyCode` to `KeyInput`.
    fn convert_key(code: KeyCode) -> Option<KeyInput> {
        match code {
            KeyCode::Char(c) => Some(KeyInput::Char(c)),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Esc),
            _ => None,
        }
    }

    /// Decode every terminal event that is already available.
    fn drain_terminal_events(&mut self) -> Result<(), TerminalError> {
        while let Some(next) = self.event_stream.next().now_or_never() {
            match next {
                Some(Ok(Event::Key(key_event))) if key_event.kind == KeyEventKind::Press => {
                    if let Some(key) = Self::convert_key(key_event.code) {
                        let commands = self.input.handle_key(key, self.mode);
                        self.queued.extend(commands);
                    }
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => return Err(TerminalError::Io(e)),
                None => {
                    self.queued.push_back(GateCommand::Quit);
                    break;
                },
            }
        }
        Ok(())
    }
}

impl Driver for TerminalDriver {
    type Error = TerminalError;
    type Instant = Instant;

    async fn poll_command(&mut self) -> Result<Option<GateCommand>, Self::Error> {
        if self.queued.is_empty() {
            self.drain_terminal_events()?;
        }
        Ok(self.queued.pop_front())
    }

    async fn next_frame(&mut self) -> Result<(), Self::Error> {
        self.frames.tick().await;
        Ok(())
    }

    fn now(&self) -> Self::Instant {
        Instant::now()
    }

    fn render(&mut self, view: &GateView) -> Result<(), Self::Error> {
        self.mode = view.gate.mode;
        self.terminal.draw(|frame| ui::render(frame, view, &self.input))?;
        Ok(())
    }

    fn stop(&mut self) {
        if !self.raw_mode {
            return;
        }
        self.raw_mode = false;
        let _ = disable_raw_mode();
        let _ = stdout().execute(LeaveAlternateScreen);
    }
}

impl Drop for TerminalDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
