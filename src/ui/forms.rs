use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::models::RsvpStatus;

/// Internal representation of the "add player" form fields.
#[derive(Clone)]
pub(crate) struct PlayerForm {
    pub(crate) name: String,
    pub(crate) phone: String,
    pub(crate) email: String,
    pub(crate) status: RsvpStatus,
    pub(crate) active: PlayerField,
    pub(crate) error: Option<String>,
}

impl Default for PlayerForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            phone: String::new(),
            email: String::new(),
            status: RsvpStatus::Yes,
            active: PlayerField::Name,
            error: None,
        }
    }
}

/// Fields available within the player form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum PlayerField {
    Name,
    Phone,
    Email,
    Status,
}

impl PlayerField {
    const ORDER: [PlayerField; 4] = [
        PlayerField::Name,
        PlayerField::Phone,
        PlayerField::Email,
        PlayerField::Status,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            PlayerField::Name => "Name",
            PlayerField::Phone => "Phone",
            PlayerField::Email => "Email",
            PlayerField::Status => "Status",
        }
    }

    pub(crate) fn row(self) -> u16 {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as u16
    }
}

/// Trimmed, validated form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlayerInput {
    pub(crate) name: String,
    pub(crate) phone: String,
    pub(crate) email: Option<String>,
    pub(crate) status: RsvpStatus,
}

impl PlayerForm {
    /// Move focus forward (`1`) or backward (`-1`), wrapping around.
    pub(crate) fn move_focus(&mut self, offset: isize) {
        let len = PlayerField::ORDER.len() as isize;
        let next = (self.active.row() as isize + offset).rem_euclid(len) as usize;
        self.active = PlayerField::ORDER[next];
    }

    pub(crate) fn cycle_status(&mut self, offset: isize) {
        self.status = self.status.cycle(offset);
    }

    /// Append a character to the active text field. The status field ignores
    /// typed characters.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            PlayerField::Name => self.name.push(ch),
            PlayerField::Phone => self.phone.push(ch),
            PlayerField::Email => self.email.push(ch),
            PlayerField::Status => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            PlayerField::Name => {
                self.name.pop();
            }
            PlayerField::Phone => {
                self.phone.pop();
            }
            PlayerField::Email => {
                self.email.pop();
            }
            PlayerField::Status => {}
        }
    }

    /// Validate the inputs and return trimmed values ready for the store.
    pub(crate) fn parse_inputs(&self) -> Result<PlayerInput> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(anyhow!("Name is required."));
        }
        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(anyhow!("Phone is required."));
        }
        let email = self.email.trim();
        Ok(PlayerInput {
            name: name.to_string(),
            phone: phone.to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
            status: self.status,
        })
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field: PlayerField) -> Line<'static> {
        let is_active = self.active == field;
        let (display, empty) = match field {
            PlayerField::Name => placeholder(&self.name, "<required>"),
            PlayerField::Phone => placeholder(&self.phone, "<required>"),
            PlayerField::Email => placeholder(&self.email, "<optional>"),
            PlayerField::Status => (format!("< {} >", self.status), false),
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if empty {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, style),
        ])
    }

    /// Terminal columns the typed value occupies.
    pub(crate) fn value_len(&self, field: PlayerField) -> usize {
        match field {
            PlayerField::Name => self.name.width(),
            PlayerField::Phone => self.phone.width(),
            PlayerField::Email => self.email.width(),
            PlayerField::Status => 0,
        }
    }
}

fn placeholder(value: &str, hint: &str) -> (String, bool) {
    if value.is_empty() {
        (hint.to_string(), true)
    } else {
        (value.to_string(), false)
    }
}
