use crate::client::{
    AppSnapshot,
    CollectionEntry,
    ToastVariant,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEvent,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use gacha_machine::{
    catalog::{
        Doll,
        DollId,
    },
    session::{
        CollectionView,
        MachinePhase,
    },
};
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::{
    Stdout,
    stdout,
};
use unicode_width::UnicodeWidthStr;

const CELL_WIDTH: usize = 18;
const VISIBLE_TOASTS: usize = 3;

pub type InputEvents = EventStream;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserEvent {
    Quit,
    Spin,
    OpenCapsule,
    Collect,
    MintDraw,
    Decline,
    MintOwned(DollId),
    ToggleView,
    ToggleLanguage,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    selected: usize,
    // what was on screen at the last draw, for key handling
    prize_pending: bool,
    visible: Vec<(DollId, bool)>,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
enum Mode {
    #[default]
    Normal,
    MintConfirm(DollId),
    QuitModal,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(
        stdout(),
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(
        stdout(),
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    remember(state, snap);
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

fn remember(state: &mut UiState, snap: &AppSnapshot) {
    state.prize_pending = snap.pending_draw.is_some() && snap.minting.is_none();
    state.visible = snap
        .collection
        .iter()
        .map(|entry| (entry.doll.id, entry.owned()))
        .collect();
    if state.selected >= state.visible.len() {
        state.selected = state.visible.len().saturating_sub(1);
    }
}

pub async fn next_raw_event(events: &mut InputEvents) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("terminal input stream closed")),
    }
}

/// Maps a terminal event to an intent, updating modal and selection state.
pub fn interpret_event(state: &mut UiState, event: Event) -> Option<UserEvent> {
    let key = match event {
        Event::Key(key) => key,
        Event::Resize(..) => return Some(UserEvent::Redraw),
        _ => return None,
    };
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match state.mode {
        Mode::MintConfirm(doll) => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::MintOwned(doll))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::QuitModal => {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    Some(UserEvent::Redraw)
                }
                _ => None,
            };
        }
        Mode::Normal => {}
    }
    normal_key(state, key)
}

fn normal_key(state: &mut UiState, key: KeyEvent) -> Option<UserEvent> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            state.mode = Mode::QuitModal;
            Some(UserEvent::Redraw)
        }
        KeyCode::Char(' ') => Some(UserEvent::Spin),
        KeyCode::Enter => Some(UserEvent::OpenCapsule),
        KeyCode::Char('y') if state.prize_pending => Some(UserEvent::MintDraw),
        KeyCode::Char('n') if state.prize_pending => Some(UserEvent::Decline),
        KeyCode::Char('c') if state.prize_pending => Some(UserEvent::Collect),
        KeyCode::Right => {
            if !state.visible.is_empty() {
                state.selected = (state.selected + 1) % state.visible.len();
            }
            Some(UserEvent::Redraw)
        }
        KeyCode::Left => {
            let len = state.visible.len();
            if len > 0 {
                state.selected = (state.selected + len - 1) % len;
            }
            Some(UserEvent::Redraw)
        }
        KeyCode::Char('m') => match state.visible.get(state.selected) {
            Some((doll, true)) => {
                state.mode = Mode::MintConfirm(*doll);
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        KeyCode::Char('v') => Some(UserEvent::ToggleView),
        KeyCode::Char('g') => Some(UserEvent::ToggleLanguage),
        _ => None,
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(9), // machine + balance + prize
            Constraint::Min(6),    // collection
            Constraint::Length(3), // reminder
            Constraint::Length(5), // toasts
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_header(f, chunks[0], snap);
    draw_middle(f, chunks[1], snap);
    draw_collection(f, state, chunks[2], snap);
    draw_reminder(f, chunks[3], snap);
    draw_toasts(f, chunks[4], snap);
    draw_help(f, chunks[5], snap);
    draw_modals(f, state, snap);
}

fn draw_header(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = snap.text();
    let wallet = match &snap.account {
        Some(account) => Span::styled(account.short(), Style::default().fg(Color::Green)),
        None => Span::styled(text.connect_wallet(), Style::default().fg(Color::DarkGray)),
    };
    let line = Line::from(vec![
        Span::styled(
            text.title(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | {} | {} | ", snap.language.label(), snap.network)),
        wallet,
    ]);
    let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

fn draw_middle(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(30),
            Constraint::Percentage(30),
        ])
        .split(area);
    draw_machine(f, cols[0], snap);
    draw_balance(f, cols[1], snap);
    draw_prize(f, cols[2], snap);
}

fn draw_machine(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = snap.text();
    let capsules: Vec<Span> = snap
        .capsules
        .iter()
        .map(|doll| Span::styled("● ", Style::default().fg(doll_color(doll))))
        .collect();
    let tray = match (snap.minting, snap.phase) {
        (Some(doll), _) => Line::styled(
            text.minting_body(doll.name),
            Style::default().fg(Color::Yellow),
        ),
        (None, MachinePhase::Ready) => Line::from(text.machine_idle(snap.cost_per_play)),
        (None, MachinePhase::Dispensed) => Line::styled(
            text.capsule_ready(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        (None, MachinePhase::Revealed(_)) => match snap.pending_draw {
            Some(doll) => Line::styled(doll.name, Style::default().fg(doll_color(doll))),
            None => Line::from(""),
        },
    };
    let lines = vec![
        Line::from(capsules),
        Line::from(text.capsules_left(snap.capsules.len() as u32)),
        Line::from("  (◎)"),
        tray,
    ];
    let machine = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(text.title()));
    f.render_widget(machine, area);
}

fn draw_balance(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = snap.text();
    let lines = vec![
        Line::styled(
            text.balance(snap.balance),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(text.cost_per_play(snap.cost_per_play)),
        Line::from(text.owned_dolls(snap.owned_total)),
        Line::from(text.unique_dolls(snap.unique)),
        Line::from(text.chain_balance(
            gacha_machine::network::SUI_SYMBOL,
            snap.chain_balance,
        )),
    ];
    let card = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(card, area);
}

fn draw_prize(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let text = snap.text();
    let mut lines = Vec::new();
    if let Some(doll) = snap.pending_draw {
        lines.push(Line::styled(
            text.you_got(doll.name),
            Style::default()
                .fg(doll_color(doll))
                .add_modifier(Modifier::BOLD),
        ));
        if snap.minting.is_none() {
            lines.push(Line::from(text.mint_prompt(doll.name)));
            lines.push(Line::from(format!(
                "[y] {}  [n] {}",
                text.yes(),
                text.no()
            )));
        }
    }
    let card = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(text.mint_as_nft()));
    f.render_widget(card, area);
}

fn draw_collection(f: &mut Frame, state: &UiState, area: Rect, snap: &AppSnapshot) {
    let text = snap.text();
    let toggle = match snap.view {
        CollectionView::OwnedOnly => text.show_all(),
        CollectionView::ShowAll => text.hide_unowned(),
    };
    let title = format!("{} [v] {}", text.your_collection(), toggle);
    let mut lines: Vec<Line> = Vec::new();
    if snap.collection.is_empty() {
        lines.push(Line::styled(
            text.empty_collection(),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let per_row = (area.width.saturating_sub(2) as usize / CELL_WIDTH).max(1);
        for row in &snap.collection.iter().enumerate().chunks(per_row) {
            let spans: Vec<Span> = row
                .map(|(idx, entry)| collection_cell(entry, idx == state.selected))
                .collect();
            lines.push(Line::from(spans));
        }
        lines.push(Line::from(format!("[m] {}", text.mint())));
    }
    if snap.view == CollectionView::OwnedOnly && snap.hidden > 0 {
        lines.push(Line::styled(
            text.spoiler_warning(),
            Style::default().fg(Color::DarkGray),
        ));
    }
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(panel, area);
}

fn collection_cell(entry: &CollectionEntry, selected: bool) -> Span<'static> {
    let label = if entry.owned() {
        format!("{} x{}", entry.doll.name, entry.count)
    } else {
        entry.doll.name.to_string()
    };
    let marker = if selected { ">" } else { " " };
    let mut style = Style::default().fg(doll_color(entry.doll));
    if !entry.owned() {
        style = Style::default().fg(Color::DarkGray);
    }
    if selected {
        style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    Span::styled(pad(&format!("{marker}{label}"), CELL_WIDTH), style)
}

fn draw_reminder(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let reminder = Paragraph::new(snap.text().mint_reminder())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(reminder, area);
}

fn draw_toasts(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let lines: Vec<Line> = snap
        .toasts
        .iter()
        .rev()
        .take(VISIBLE_TOASTS)
        .map(|toast| {
            let color = match toast.variant {
                ToastVariant::Default => Color::Green,
                ToastVariant::Destructive => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} ", toast.at.format("%H:%M:%S")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{}: ", toast.title),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw(toast.description.clone()),
            ])
        })
        .collect();
    let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(panel, area);
}

fn draw_help(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let help = Paragraph::new(snap.text().help()).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    let text = snap.text();
    match state.mode {
        Mode::MintConfirm(doll) => {
            let name = snap
                .collection
                .iter()
                .find(|entry| entry.doll.id == doll)
                .map(|entry| entry.doll.name)
                .unwrap_or_default();
            let area = centered_rect(50, 25, f.area());
            let block = Block::default()
                .borders(Borders::ALL)
                .title(text.mint_nft_title());
            let p = Paragraph::new(vec![
                Line::from(text.mint_prompt(name)),
                Line::from(""),
                Line::from(format!("[y] {}  [n] {}", text.yes(), text.no())),
            ])
            .wrap(Wrap { trim: true });
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL);
            let p = Paragraph::new(text.quit_prompt());
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn doll_color(doll: &Doll) -> Color {
    doll.rgb()
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::White)
}

// Pads by display width so CJK and ASCII names line up.
fn pad(s: &str, width: usize) -> String {
    let used = s.width();
    if used >= width {
        return s.to_string();
    }
    format!("{s}{}", " ".repeat(width - used))
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn state_with(prize_pending: bool, visible: Vec<(DollId, bool)>) -> UiState {
        UiState {
            prize_pending,
            visible,
            ..UiState::default()
        }
    }

    #[test]
    fn interpret_event__space_spins_and_enter_opens() {
        let mut state = UiState::default();
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char(' '))),
            Some(UserEvent::Spin)
        );
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Enter)),
            Some(UserEvent::OpenCapsule)
        );
    }

    #[test]
    fn interpret_event__prize_prompt_only_when_pending() {
        let mut idle = UiState::default();
        assert_eq!(interpret_event(&mut idle, press(KeyCode::Char('y'))), None);

        let mut pending = state_with(true, Vec::new());
        assert_eq!(
            interpret_event(&mut pending, press(KeyCode::Char('y'))),
            Some(UserEvent::MintDraw)
        );
        assert_eq!(
            interpret_event(&mut pending, press(KeyCode::Char('n'))),
            Some(UserEvent::Decline)
        );
    }

    #[test]
    fn interpret_event__mint_owned_requires_confirmation() {
        // given
        let mut state = state_with(false, vec![(DollId(1), true), (DollId(2), false)]);

        // when
        let opened = interpret_event(&mut state, press(KeyCode::Char('m')));
        let confirmed = interpret_event(&mut state, press(KeyCode::Char('y')));

        // then
        assert_eq!(opened, Some(UserEvent::Redraw));
        assert_eq!(confirmed, Some(UserEvent::MintOwned(DollId(1))));
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn interpret_event__unowned_selection_cannot_mint() {
        let mut state = state_with(false, vec![(DollId(1), true), (DollId(2), false)]);
        interpret_event(&mut state, press(KeyCode::Right));
        assert_eq!(state.selected, 1);
        assert_eq!(interpret_event(&mut state, press(KeyCode::Char('m'))), None);
        interpret_event(&mut state, press(KeyCode::Right));
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn interpret_event__quit_needs_confirmation() {
        let mut state = UiState::default();
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('q'))),
            Some(UserEvent::Redraw)
        );
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char(' '))),
            None
        );
        assert_eq!(
            interpret_event(&mut state, press(KeyCode::Char('y'))),
            Some(UserEvent::Quit)
        );
    }

    #[test]
    fn pad__uses_display_width() {
        assert_eq!(pad("ab", 4), "ab  ");
        assert_eq!(pad("中文", 6).width(), 6);
        assert_eq!(pad("toolong", 3), "toolong");
    }
}
