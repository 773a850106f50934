use std::cell::Cell;
use std::mem;
use std::rc::Rc;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use crate::ids::IdGenerator;
use crate::models::{Player, RsvpCounts, RsvpEntry, RsvpStatus};
use crate::observable::Subscription;
use crate::store::{Outcome, RsvpStore};

use super::forms::{PlayerField, PlayerForm};
use super::helpers::{centered_rect, counts_line, entry_line, surface_error};
use super::screens::{RosterScreen, RosterView};

/// Footer space: top border, counts, status message and key hints.
const FOOTER_HEIGHT: u16 = 4;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// Fine-grained modes layered over the roster.
enum Mode {
    Normal,
    AddingPlayer(PlayerForm),
    ConfirmClear,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    store: RsvpStore,
    ids: Box<dyn IdGenerator>,
    roster: RosterScreen,
    mode: Mode,
    status: Option<StatusMessage>,
    counts: Rc<Cell<RsvpCounts>>,
    _counts_subscription: Subscription,
}

impl App {
    pub fn new(store: RsvpStore, ids: Box<dyn IdGenerator>) -> Self {
        let counts = Rc::new(Cell::new(RsvpCounts::default()));
        let sink = Rc::clone(&counts);
        let subscription = store.counts().subscribe(move |latest| sink.set(*latest));

        let mut app = Self {
            store,
            ids,
            roster: RosterScreen::new(),
            mode: Mode::Normal,
            status: None,
            counts,
            _counts_subscription: subscription,
        };
        app.storage_failure_reported();
        app
    }

    pub fn store(&self) -> &RsvpStore {
        &self.store
    }

    /// Feed one key press through the active mode. Returns `true` when the
    /// user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingPlayer(form) => self.handle_add_player(code, form)?,
            Mode::ConfirmClear => self.handle_confirm_clear(code)?,
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        let len = self.visible_len();
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.roster.move_selection(-1, len),
            KeyCode::Down => self.roster.move_selection(1, len),
            KeyCode::PageUp => self.roster.move_selection(-PAGE_STEP, len),
            KeyCode::PageDown => self.roster.move_selection(PAGE_STEP, len),
            KeyCode::Home => self.roster.select_first(),
            KeyCode::End => self.roster.select_last(len),
            KeyCode::Char('+') => {
                self.clear_status();
                return Ok(Mode::AddingPlayer(PlayerForm::default()));
            }
            KeyCode::Char('a') | KeyCode::Char('A') => {
                let view = self.roster.toggle_view();
                self.set_status(format!("Showing {}.", view.title()), StatusKind::Info);
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => self.set_selected_status(RsvpStatus::Yes),
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.set_selected_status(RsvpStatus::Maybe)
            }
            KeyCode::Char('n') | KeyCode::Char('N') => self.set_selected_status(RsvpStatus::No),
            KeyCode::Left => self.cycle_selected_status(-1),
            KeyCode::Right => self.cycle_selected_status(1),
            KeyCode::Char('c') | KeyCode::Char('C') => {
                if self.store.entries().is_empty() {
                    self.set_status("Nothing to clear.", StatusKind::Info);
                } else {
                    self.clear_status();
                    return Ok(Mode::ConfirmClear);
                }
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_add_player(&mut self, code: KeyCode, mut form: PlayerForm) -> Result<Mode> {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status("Add player cancelled.", StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(-1),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Left if form.active == PlayerField::Status => form.cycle_status(-1),
            KeyCode::Right if form.active == PlayerField::Status => form.cycle_status(1),
            KeyCode::Char(' ') if form.active == PlayerField::Status => form.cycle_status(1),
            KeyCode::Enter => match self.save_new_player(&form) {
                Ok(()) => keep_open = false,
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        if keep_open {
            Ok(Mode::AddingPlayer(form))
        } else {
            Ok(Mode::Normal)
        }
    }

    fn handle_confirm_clear(&mut self, code: KeyCode) -> Result<Mode> {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let outcome = self.store.clear_all();
                self.roster.select_first();
                self.report(outcome, "", RsvpStatus::Yes);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.set_status("Clear cancelled.", StatusKind::Info);
            }
            _ => return Ok(Mode::ConfirmClear),
        }
        Ok(Mode::Normal)
    }

    fn save_new_player(&mut self, form: &PlayerForm) -> Result<()> {
        let input = form.parse_inputs()?;
        let mut player = Player::new(self.ids.generate(), input.name, input.phone);
        player.email = input.email;
        let name = player.name.clone();

        let outcome = self.store.add(player, input.status);
        self.report(outcome, &name, input.status);
        if outcome == Outcome::Added && self.roster.view == RosterView::All {
            let len = self.visible_len();
            self.roster.select_last(len);
        }
        Ok(())
    }

    fn set_selected_status(&mut self, status: RsvpStatus) {
        let Some(entry) = self.selected_entry() else {
            self.set_status("No player selected.", StatusKind::Error);
            return;
        };
        if entry.status == status {
            return;
        }
        let outcome = self.store.update(&entry.player, status);
        self.report(outcome, &entry.player.name, status);
        let len = self.visible_len();
        self.roster.ensure_in_bounds(len);
    }

    fn cycle_selected_status(&mut self, offset: isize) {
        if let Some(entry) = self.selected_entry() {
            self.set_selected_status(entry.status.cycle(offset));
        }
    }

    /// Turn a store outcome into a footer message. Outcomes that touched
    /// storage defer to a pending storage warning.
    fn report(&mut self, outcome: Outcome, name: &str, status: RsvpStatus) {
        let wrote = matches!(
            outcome,
            Outcome::Added | Outcome::Updated | Outcome::Cleared
        );
        if wrote && self.storage_failure_reported() {
            return;
        }

        let (text, kind) = match outcome {
            Outcome::Added => (format!("Added {name}."), StatusKind::Info),
            Outcome::Updated => (format!("{name} is now {status}."), StatusKind::Info),
            Outcome::DuplicateSkipped => (
                format!("{name} is already on the roster."),
                StatusKind::Error,
            ),
            Outcome::NotFound => (
                format!("{name} is no longer on the roster."),
                StatusKind::Error,
            ),
            Outcome::Cleared => ("Cleared all RSVPs.".to_string(), StatusKind::Info),
        };
        self.set_status(text, kind);
    }

    /// Show the store's storage problem, if it has one. A rejected saved
    /// roster wins over a plain write failure since nothing is being saved.
    fn storage_failure_reported(&mut self) -> bool {
        let text = if let Some(reason) = self.store.load_failure() {
            format!("Not saving, saved RSVPs unreadable: {reason}")
        } else if let Some(err) = self.store.storage_error() {
            format!("Saved in memory only: {err}")
        } else {
            return false;
        };
        self.set_status(text, StatusKind::Error);
        true
    }

    fn selected_entry(&self) -> Option<RsvpEntry> {
        self.roster
            .rows(&self.store)
            .into_iter()
            .nth(self.roster.selected)
    }

    fn visible_len(&self) -> usize {
        self.roster.rows(&self.store).len()
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        self.draw_roster(frame, content_area);

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingPlayer(form) => self.draw_player_form(frame, area, form),
            Mode::ConfirmClear => self.draw_confirm_clear(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_roster(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.roster.view.title());
        let rows = self.roster.rows(&self.store);

        if rows.is_empty() {
            let text = match self.roster.view {
                RosterView::All => "No RSVPs yet. Press '+' to add a player.",
                RosterView::Confirmed => "Nobody has confirmed yet.",
            };
            let message = Paragraph::new(text)
                .alignment(Alignment::Center)
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = rows.iter().map(|entry| ListItem::new(entry_line(entry))).collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        state.select(Some(self.roster.selected.min(rows.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let lines = vec![
            counts_line(self.counts.get()),
            status_line,
            self.footer_instructions(),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::AddingPlayer(_) => Line::from(vec![
                Span::styled("[Tab]", key_style),
                Span::raw(" Next field   "),
                Span::styled("[←→]", key_style),
                Span::raw(" Status   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Save   "),
                Span::styled("[Esc]", key_style),
                Span::raw(" Cancel"),
            ]),
            Mode::ConfirmClear => Line::from(vec![
                Span::styled("[y]", key_style),
                Span::raw(" Clear everything   "),
                Span::styled("[n]", key_style),
                Span::raw(" Keep"),
            ]),
            Mode::Normal => Line::from(vec![
                Span::styled("[↑↓]", key_style),
                Span::raw(" Navigate   "),
                Span::styled("[y/m/n ←→]", key_style),
                Span::raw(" Set RSVP   "),
                Span::styled("[+]", key_style),
                Span::raw(" Add   "),
                Span::styled("[a]", key_style),
                Span::raw(" All/Confirmed   "),
                Span::styled("[c]", key_style),
                Span::raw(" Clear   "),
                Span::styled("[q]", key_style),
                Span::raw(" Quit"),
            ]),
        }
    }

    fn draw_player_form(&self, frame: &mut Frame, area: Rect, form: &PlayerForm) {
        let popup_area = centered_rect(60, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Add Player").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line(PlayerField::Name),
            form.build_line(PlayerField::Phone),
            form.build_line(PlayerField::Email),
            form.build_line(PlayerField::Status),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        if form.active != PlayerField::Status {
            let prefix = format!("{}: ", form.active.label()).width();
            let offset =
                u16::try_from(prefix + form.value_len(form.active)).unwrap_or(u16::MAX);
            let cursor_x = inner.x.saturating_add(offset);
            let cursor_y = inner.y.saturating_add(form.active.row());
            frame.set_cursor_position((cursor_x, cursor_y));
        }
    }

    fn draw_confirm_clear(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(50, 30, area);
        frame.render_widget(Clear, popup_area);

        let total = self.counts.get().total;
        let lines = vec![
            Line::from(format!("Remove all {total} RSVPs?")),
            Line::from(""),
            Line::from(Span::styled(
                "This also deletes the saved roster. (y/n)",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().title("Clear All").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}
