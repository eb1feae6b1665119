//! Input state and key handling for the console.
//!
//! This module owns the glyph entry field and turns key events into
//! [`GateCommand`]s. Glyphs are typed as numbers and committed with Space or
//! Enter; Enter on an empty field dials.

use stargate_app::GateCommand;
use stargate_core::{DialMode, GLYPH_COUNT, GlyphId};

/// Longest glyph number, in digits.
const MAX_ENTRY_DIGITS: usize = 2;

/// Key input events from the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Character input.
    Char(char),
    /// Enter/Return key.
    Enter,
    /// Backspace key.
    Backspace,
    /// Tab key.
    Tab,
    /// Escape key.
    Esc,
}

/// Glyph entry field.
///
/// Holds the digits of the glyph being typed. Digits that would take the
/// number off the ring are ignored.
#[derive(Debug, Default)]
pub struct InputState {
    entry: String,
}

impl InputState {
    /// Create an empty entry field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Digits typed so far.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Handle a key input event.
    ///
    /// `mode` is the gate's current mode, used to pick the next one on Tab.
    /// Returns the commands to send to the gate, possibly none.
    pub fn handle_key(&mut self, key: KeyInput, mode: DialMode) -> Vec<GateCommand> {
        match key {
            KeyInput::Char(c) if c.is_ascii_digit() => {
                self.push_digit(c);
                vec![]
            },
            KeyInput::Char(' ') => self.commit().into_iter().collect(),
            KeyInput::Enter => match self.commit() {
                Some(command) => vec![command],
                None => vec![GateCommand::Dial],
            },
            KeyInput::Backspace => {
                self.entry.pop();
                vec![]
            },
            KeyInput::Tab | KeyInput::Char('m') => vec![GateCommand::SetMode(next_mode(mode))],
            KeyInput::Char('d') => vec![GateCommand::Dial],
            KeyInput::Char('a') => vec![GateCommand::Abort],
            KeyInput::Char('x') => vec![GateCommand::Shutdown],
            KeyInput::Char('r') => {
                self.entry.clear();
                vec![GateCommand::Reset]
            },
            KeyInput::Esc | KeyInput::Char('q') => vec![GateCommand::Quit],
            KeyInput::Char(_) => vec![],
        }
    }

    fn push_digit(&mut self, c: char) {
        if self.entry.len() >= MAX_ENTRY_DIGITS {
            return;
        }

        self.entry.push(c);
        if self.parse().is_none_or(|glyph| glyph >= GLYPH_COUNT) {
            self.entry.pop();
        }
    }

    fn parse(&self) -> Option<GlyphId> {
        self.entry.parse().ok()
    }

    /// Turn the typed number into an `AddGlyph` and clear the field.
    fn commit(&mut self) -> Option<GateCommand> {
        let glyph = self.parse()?;
        self.entry.clear();
        Some(GateCommand::AddGlyph(glyph))
    }
}

/// Mode after `mode`, wrapping around.
fn next_mode(mode: DialMode) -> DialMode {
    let index = DialMode::ALL.iter().position(|&m| m == mode).unwrap_or(0);
    DialMode::ALL[(index + 1) % DialMode::ALL.len()]
}
