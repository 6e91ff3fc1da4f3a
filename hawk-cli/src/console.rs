//! Console state machine
//!
//! `Browsing` polls, renders and reads keys without blocking. `Prompting`
//! collects one line of note text; while it is active nothing is polled
//! and the panes are not redrawn, only the prompt row.

use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::{execute, queue};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use hawk_core::config::HawkConfig;
use hawk_core::files;
use hawk_core::lifecycle::LifecycleAction;
use hawk_core::probe::Gateway;
use hawk_core::scheduler::{Poller, Source};
use hawk_core::state::{Section, Snapshot};
use hawk_core::text::{clock_label, pad};

use crate::ui::{self, View, motion_frame};

/// Flash lifetime for navigation, run and refresh feedback
pub const ACTION_FLASH: Duration = Duration::from_millis(1_500);
/// Flash lifetime for note outcomes
pub const NOTE_FLASH: Duration = Duration::from_millis(1_800);

pub const PROMPT: &str = "Note> ";

const KEY_POLL: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    PrevSection,
    NextSection,
    Jump(Section),
    PrevCommand,
    NextCommand,
    RunCommand,
    Refresh,
    Lifecycle(LifecycleAction),
    Note,
}

/// Key bindings while browsing
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c')).then_some(Action::Quit);
    }

    let action = match key.code {
        KeyCode::Char('q' | 'Q') => Action::Quit,
        KeyCode::Up | KeyCode::Char('k') => Action::PrevSection,
        KeyCode::Down | KeyCode::Char('j') => Action::NextSection,
        KeyCode::Char(c @ '1'..='4') => Action::Jump(Section::from_index(c as usize - '1' as usize)?),
        KeyCode::Char('[') => Action::PrevCommand,
        KeyCode::Char(']') => Action::NextCommand,
        KeyCode::Enter => Action::RunCommand,
        KeyCode::Char('r' | 'R') => Action::Refresh,
        KeyCode::Char('a' | 'A') => Action::Lifecycle(LifecycleAction::Start),
        KeyCode::Char('z' | 'Z') => Action::Lifecycle(LifecycleAction::Stop),
        KeyCode::Char('e' | 'E') => Action::Lifecycle(LifecycleAction::Restart),
        KeyCode::Char('h' | 'H') => Action::Lifecycle(LifecycleAction::Health),
        KeyCode::Char('u' | 'U') => Action::Lifecycle(LifecycleAction::Status),
        KeyCode::Char('m' | 'M') => Action::Note,
        _ => return None,
    };
    Some(action)
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PromptState {
    pub input: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptStep {
    Editing,
    /// Trimmed line; empty when cancelled
    Submit(String),
}

impl PromptState {
    /// Apply one key. Input stops growing at `max_len` characters.
    pub fn handle_key(&mut self, key: KeyEvent, max_len: usize) -> PromptStep {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter => PromptStep::Submit(std::mem::take(&mut self.input).trim().to_string()),
            KeyCode::Esc => {
                self.input.clear();
                PromptStep::Submit(String::new())
            }
            KeyCode::Char('c') if ctrl => {
                self.input.clear();
                PromptStep::Submit(String::new())
            }
            KeyCode::Backspace => {
                self.input.pop();
                PromptStep::Editing
            }
            KeyCode::Char(c) if !ctrl => {
                if self.input.chars().count() < max_len {
                    self.input.push(c);
                }
                PromptStep::Editing
            }
            _ => PromptStep::Editing,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Browsing,
    Prompting(PromptState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Console<G> {
    poller: Poller<G>,
    snap: Snapshot,
    mode: Mode,
}

impl<G: Gateway> Console<G> {
    pub fn new(poller: Poller<G>) -> Self {
        Self {
            poller,
            snap: Snapshot::new(),
            mode: Mode::Browsing,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snap
    }

    pub fn config(&self) -> &HawkConfig {
        self.poller.config()
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    /// Load the catalog, then run the first round of periodic polls
    pub async fn start(&mut self, now: Instant) {
        self.poller.poll(Source::Catalog, &mut self.snap, now).await;
        self.poller.tick(&mut self.snap, now).await;
    }

    /// Scheduler step; skipped while the prompt is open
    pub async fn tick(&mut self, now: Instant) {
        if self.mode == Mode::Browsing {
            self.poller.tick(&mut self.snap, now).await;
        }
    }

    pub fn view(&self, frame: &'static str, clock: String, now: Instant) -> View<'_> {
        View {
            snap: &self.snap,
            config: self.poller.config(),
            frame,
            clock,
            flash: self.snap.flash_text(now),
        }
    }

    pub async fn dispatch(&mut self, action: Action, now: Instant) -> Flow {
        tracing::debug!(?action, "dispatch");
        let section = self.snap.nav.section;
        match action {
            Action::Quit => return Flow::Quit,
            Action::PrevSection => self.snap.nav.section = section.prev(),
            Action::NextSection => self.snap.nav.section = section.next(),
            Action::Jump(target) => self.snap.nav.section = target,
            Action::PrevCommand => self.cycle_command(-1, now),
            Action::NextCommand => self.cycle_command(1, now),
            Action::RunCommand => {
                if let Some(run) = self.poller.run_command(&mut self.snap, now).await {
                    if run.success() {
                        self.snap.ctl(format!("run {} ok", run.id));
                    } else {
                        self.snap.ctl(format!("run {} failed :: {}", run.id, run.status));
                    }
                }
                self.snap.set_flash("command executed", ACTION_FLASH, now);
            }
            Action::Refresh => {
                self.poller.poll_all(&mut self.snap, now).await;
                self.snap.set_flash("refreshed", ACTION_FLASH, now);
            }
            Action::Lifecycle(action) => {
                let ok = self.poller.run_lifecycle(action, &mut self.snap).await;
                let outcome = if ok { "ok" } else { "failed" };
                self.snap
                    .set_flash(format!("{} {}", action, outcome), ACTION_FLASH, now);
            }
            Action::Note => self.mode = Mode::Prompting(PromptState::default()),
        }
        Flow::Continue
    }

    fn cycle_command(&mut self, step: isize, now: Instant) {
        let len = self.snap.catalog.len();
        if self.snap.nav.cycle_command(step, len).is_none() {
            return;
        }
        if let Some(entry) = self.snap.selected_command() {
            let text = format!("selected cmd: {}", entry.id);
            self.snap.set_flash(text, ACTION_FLASH, now);
        }
    }

    /// Feed one key to the open prompt. Submitting or cancelling returns
    /// the console to `Browsing`.
    pub async fn prompt_key(&mut self, key: KeyEvent, max_len: usize, now: Instant) {
        let Mode::Prompting(prompt) = &mut self.mode else {
            return;
        };
        if let PromptStep::Submit(text) = prompt.handle_key(key, max_len) {
            self.mode = Mode::Browsing;
            self.submit_note(&text, now).await;
        }
    }

    async fn submit_note(&mut self, text: &str, now: Instant) {
        let notes_file = self.poller.config().notes_file.clone();
        match files::append_note(&notes_file, text, Utc::now()) {
            Ok(true) => {
                self.poller.poll(Source::Logs, &mut self.snap, now).await;
                self.snap.set_flash("note appended", NOTE_FLASH, now);
            }
            Ok(false) => self.snap.set_flash("empty note", NOTE_FLASH, now),
            Err(e) => {
                tracing::warn!(error = %e, "note append failed");
                self.snap.ctl(format!("note failed :: {}", e));
                self.snap.set_flash("note failed", NOTE_FLASH, now);
            }
        }
    }
}

/// Characters that fit after the prompt on a row of `width` columns
pub fn prompt_capacity(width: u16) -> usize {
    (width as usize).saturating_sub(PROMPT.len() + 1).max(1)
}

/// Run the interactive loop until the operator quits
pub async fn run<G: Gateway>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    console: &mut Console<G>,
) -> io::Result<()> {
    let started = Instant::now();
    console.start(started).await;

    loop {
        let prompt_input = match console.mode() {
            Mode::Prompting(state) => Some(state.input.clone()),
            Mode::Browsing => None,
        };

        if let Some(input) = prompt_input {
            let size = terminal.size()?;
            draw_prompt(terminal.backend_mut(), size.width, size.height, &input)?;

            // Blocking read: the only place the loop waits on the operator
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            console
                .prompt_key(key, prompt_capacity(size.width), Instant::now())
                .await;
            if *console.mode() == Mode::Browsing {
                execute!(terminal.backend_mut(), Hide)?;
                terminal.clear()?;
            }
            continue;
        }

        let now = Instant::now();
        console.tick(now).await;

        let view = console.view(motion_frame(now - started), clock_label(), now);
        terminal.draw(|f| ui::draw(f, &view))?;

        if !event::poll(KEY_POLL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let Some(action) = map_key(key) else {
            continue;
        };
        if console.dispatch(action, Instant::now()).await == Flow::Quit {
            break;
        }
    }

    Ok(())
}

fn draw_prompt(out: &mut impl Write, width: u16, height: u16, input: &str) -> io::Result<()> {
    let row = height.saturating_sub(1);
    let line = format!("{}{}", PROMPT, input);
    let cursor = (line.chars().count() as u16).min(width.saturating_sub(1));

    queue!(
        out,
        MoveTo(0, row),
        SetForegroundColor(Color::Black),
        SetBackgroundColor(Color::AnsiValue(208)),
        SetAttribute(Attribute::Bold),
        Print(pad(&line, width.saturating_sub(1) as usize)),
        SetAttribute(Attribute::Reset),
        ResetColor,
        MoveTo(cursor, row),
        Show
    )?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use hawk_core::fake::ScriptedGateway;
    use hawk_core::probe::ProbeOutcome;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn console(dir: &Path) -> Console<ScriptedGateway> {
        let poller = Poller::new(HawkConfig::from_base(dir), ScriptedGateway::new());
        Console::new(poller)
    }

    async fn type_line(c: &mut Console<ScriptedGateway>, text: &str, now: Instant) {
        for ch in text.chars() {
            c.prompt_key(key(KeyCode::Char(ch)), 80, now).await;
        }
        c.prompt_key(key(KeyCode::Enter), 80, now).await;
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(map_key(key(KeyCode::Up)), Some(Action::PrevSection));
        assert_eq!(map_key(key(KeyCode::Char('j'))), Some(Action::NextSection));
        assert_eq!(
            map_key(key(KeyCode::Char('3'))),
            Some(Action::Jump(Section::Streams))
        );
        assert_eq!(map_key(key(KeyCode::Char('5'))), None);
        assert_eq!(map_key(key(KeyCode::Char(']'))), Some(Action::NextCommand));
        assert_eq!(map_key(key(KeyCode::Enter)), Some(Action::RunCommand));
        assert_eq!(
            map_key(key(KeyCode::Char('E'))),
            Some(Action::Lifecycle(LifecycleAction::Restart))
        );
        assert_eq!(map_key(key(KeyCode::Char('M'))), Some(Action::Note));
        assert_eq!(map_key(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_prompt_editing() {
        let mut p = PromptState::default();
        for ch in "abcd".chars() {
            assert_eq!(p.handle_key(key(KeyCode::Char(ch)), 3), PromptStep::Editing);
        }
        assert_eq!(p.input, "abc");
        p.handle_key(key(KeyCode::Backspace), 3);
        assert_eq!(p.input, "ab");
        p.handle_key(key(KeyCode::Char(' ')), 3);
        assert_eq!(
            p.handle_key(key(KeyCode::Enter), 3),
            PromptStep::Submit("ab".into())
        );
        assert!(p.input.is_empty());

        p.handle_key(key(KeyCode::Char('x')), 3);
        assert_eq!(
            p.handle_key(key(KeyCode::Esc), 3),
            PromptStep::Submit(String::new())
        );
    }

    #[test]
    fn test_prompt_capacity() {
        assert_eq!(prompt_capacity(150), 143);
        assert_eq!(prompt_capacity(4), 1);
    }

    #[tokio::test]
    async fn test_note_is_appended_with_utc_stamp() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();
        std::fs::write(&c.config().notes_file, "").unwrap();

        c.dispatch(Action::Note, now).await;
        assert!(matches!(c.mode(), Mode::Prompting(_)));
        type_line(&mut c, "deploy v2", now).await;

        assert_eq!(*c.mode(), Mode::Browsing);
        let content = std::fs::read_to_string(&c.config().notes_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);
        let (stamp, text) = lines[0].split_once(' ').unwrap();
        assert_eq!(text, "deploy v2");
        assert_eq!(stamp.len(), 20);
        assert!(stamp.ends_with('Z'));
        assert_eq!(&stamp[10..11], "T");

        assert_eq!(c.snapshot().notes, vec![lines[0].to_string()]);
        assert_eq!(c.snapshot().flash_text(now), Some("note appended"));
    }

    #[tokio::test]
    async fn test_empty_note_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();

        c.dispatch(Action::Note, now).await;
        type_line(&mut c, "   ", now).await;

        assert_eq!(*c.mode(), Mode::Browsing);
        let content = std::fs::read_to_string(&c.config().notes_file).unwrap_or_default();
        assert!(content.is_empty());
        assert_eq!(c.snapshot().flash_text(now), Some("empty note"));
        assert_eq!(
            c.snapshot().flash_text(now + NOTE_FLASH + Duration::from_millis(1)),
            None
        );
    }

    #[tokio::test]
    async fn test_no_polling_while_prompting() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();

        c.dispatch(Action::Note, now).await;
        c.tick(now + Duration::from_secs(10)).await;
        assert!(c.poller.gateway().calls().is_empty());
        assert_eq!(c.snapshot().health.last, "never");
    }

    #[tokio::test]
    async fn test_command_cycling_flashes_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        c.poller
            .gateway()
            .respond_ok("list", "build|Build|shell|b\ndeploy|Deploy|shell|d");
        let now = Instant::now();
        c.start(now).await;

        c.dispatch(Action::NextCommand, now).await;
        assert_eq!(c.snapshot().nav.command, 1);
        assert_eq!(c.snapshot().flash_text(now), Some("selected cmd: deploy"));

        c.dispatch(Action::NextCommand, now).await;
        assert_eq!(c.snapshot().nav.command, 0);
        c.dispatch(Action::PrevCommand, now).await;
        assert_eq!(c.snapshot().nav.command, 1);

        let later = now + ACTION_FLASH + Duration::from_millis(1);
        assert_eq!(c.snapshot().flash_text(later), None);
    }

    #[tokio::test]
    async fn test_command_cycling_on_empty_catalog_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();

        c.dispatch(Action::NextCommand, now).await;
        assert_eq!(c.snapshot().nav.command, 0);
        assert!(c.snapshot().flash.is_none());
    }

    #[tokio::test]
    async fn test_run_command_records_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        c.poller.gateway().respond_ok("list", "build|Build|shell|b");
        c.poller
            .gateway()
            .respond("run build", ProbeOutcome::exited(2, "no target"));
        let now = Instant::now();
        c.start(now).await;

        c.dispatch(Action::RunCommand, now).await;
        assert_eq!(
            c.snapshot().command.lines,
            vec!["command failed: build", "no target"]
        );
        let last = c.snapshot().control.iter().last().unwrap();
        assert_eq!(last.message, "run build failed :: exit 2");
        assert_eq!(c.snapshot().flash_text(now), Some("command executed"));
    }

    #[tokio::test]
    async fn test_section_navigation_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();

        c.dispatch(Action::PrevSection, now).await;
        assert_eq!(c.snapshot().nav.section, Section::Commands);
        c.dispatch(Action::NextSection, now).await;
        assert_eq!(c.snapshot().nav.section, Section::Overview);
        c.dispatch(Action::Jump(Section::Grpc), now).await;
        assert_eq!(c.snapshot().nav.section, Section::Grpc);
        assert_eq!(c.dispatch(Action::Quit, now).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_refresh_reloads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        let now = Instant::now();
        c.start(now).await;
        assert!(c.snapshot().catalog.is_empty());

        c.poller.gateway().respond_ok("list", "build|Build|shell|b");
        c.dispatch(Action::Refresh, now).await;
        assert_eq!(c.snapshot().catalog.len(), 1);
        assert_eq!(c.poller.gateway().call_count("list"), 2);
        assert_eq!(c.snapshot().flash_text(now), Some("refreshed"));
    }

    #[tokio::test]
    async fn test_lifecycle_key_flashes_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let mut c = console(dir.path());
        c.poller
            .gateway()
            .respond_ok("status hawk-agent.service", "active (running)");
        let now = Instant::now();

        c.dispatch(Action::Lifecycle(LifecycleAction::Status), now).await;
        assert_eq!(c.snapshot().flash_text(now), Some("status ok"));
        let msgs: Vec<_> = c.snapshot().control.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["status ok :: hawk-agent.service", "active (running)"]);
    }
}
