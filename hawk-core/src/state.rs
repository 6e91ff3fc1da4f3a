//! Snapshot store
//!
//! One aggregate holding the latest parsed view of every data source plus
//! UI-only state. It is owned by the console loop and passed by reference
//! to the scheduler and renderers; probes never touch it directly.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::text::clock_label;

/// Label shown for a source that has not been polled yet
pub const NEVER: &str = "never";

/// Most recent lines kept from a command run
pub const COMMAND_OUTPUT_CAP: usize = 80;
/// Lines kept from the tail of the log and notes files
pub const TAIL_CAP: usize = 200;
/// Control log capacity; oldest entries are evicted first
pub const CONTROL_LOG_CAP: usize = 400;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandCatalogEntry {
    pub id: String,
    pub title: String,
    pub runner: String,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointHealth {
    pub endpoint: String,
    /// Upper-cased status as reported by the probe
    pub status: String,
    pub latency: String,
    pub source: String,
}

impl EndpointHealth {
    pub const SERVING: &'static str = "SERVING";

    pub fn is_serving(&self) -> bool {
        self.status == Self::SERVING
    }
}

#[derive(Clone, Debug)]
pub struct HealthSnapshot {
    pub rows: Vec<EndpointHealth>,
    pub ok: usize,
    pub bad: usize,
    pub last: String,
    /// The latest poll failed; rows and counts are from an earlier poll
    pub stale: bool,
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            ok: 0,
            bad: 0,
            last: NEVER.to_string(),
            stale: false,
        }
    }
}

impl HealthSnapshot {
    /// Replace rows wholesale; counts are recomputed, never accumulated
    pub fn replace(&mut self, rows: Vec<EndpointHealth>, at: String) {
        self.ok = rows.iter().filter(|r| r.is_serving()).count();
        self.bad = rows.len() - self.ok;
        self.rows = rows;
        self.last = at;
        self.stale = false;
    }
}

#[derive(Clone, Debug)]
pub struct StreamSnapshot {
    pub rows: Vec<String>,
    pub last: String,
    pub stale: bool,
}

impl Default for StreamSnapshot {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            last: NEVER.to_string(),
            stale: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub last: String,
}

impl Default for CommandOutput {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            last: NEVER.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LogSnapshot {
    pub tail: Vec<String>,
    pub size: u64,
    pub delta: u64,
    pub last_modified: String,
}

impl Default for LogSnapshot {
    fn default() -> Self {
        Self {
            tail: Vec::new(),
            size: 0,
            delta: 0,
            last_modified: NEVER.to_string(),
        }
    }
}

impl LogSnapshot {
    /// Record a new file size and return the growth since the last poll.
    /// Shrinking (truncation, rotation) counts as zero growth.
    pub fn observe_size(&mut self, size: u64) -> u64 {
        self.delta = size.saturating_sub(self.size);
        self.size = size;
        self.delta
    }
}

#[derive(Clone, Debug)]
pub struct ControlLogEntry {
    pub at: String,
    pub message: String,
}

impl std::fmt::Display for ControlLogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.at, self.message)
    }
}

/// Bounded history of lifecycle and command results
#[derive(Debug)]
pub struct ControlLog {
    cap: usize,
    entries: VecDeque<ControlLogEntry>,
}

impl ControlLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            entries: VecDeque::with_capacity(cap.min(64)),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(clock_label(), message);
    }

    pub fn push_at(&mut self, at: String, message: impl Into<String>) {
        self.entries.push_back(ControlLogEntry {
            at,
            message: message.into(),
        });
        while self.entries.len() > self.cap {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ControlLogEntry> {
        self.entries.iter()
    }

    /// The `n` most recent entries, oldest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &ControlLogEntry> {
        self.entries.iter().skip(self.entries.len().saturating_sub(n))
    }
}

impl Default for ControlLog {
    fn default() -> Self {
        Self::new(CONTROL_LOG_CAP)
    }
}

/// Main-pane sections, in navigation order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Overview,
    Grpc,
    Streams,
    Commands,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Overview,
        Section::Grpc,
        Section::Streams,
        Section::Commands,
    ];

    pub fn index(&self) -> usize {
        match self {
            Section::Overview => 0,
            Section::Grpc => 1,
            Section::Streams => 2,
            Section::Commands => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Section> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Grpc => "gRPC",
            Section::Streams => "Streams",
            Section::Commands => "Commands",
        }
    }

    pub fn next(&self) -> Section {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Section {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub section: Section,
    /// Index into the catalog; 0 when the catalog is empty
    pub command: usize,
}

impl NavigationState {
    /// Move the command selection by `step` (wrapping). No-op on an empty
    /// catalog. Returns the new index when it moved.
    pub fn cycle_command(&mut self, step: isize, catalog_len: usize) -> Option<usize> {
        if catalog_len == 0 {
            return None;
        }
        let len = catalog_len as isize;
        let current = (self.command.min(catalog_len - 1)) as isize;
        self.command = (current + step).rem_euclid(len) as usize;
        Some(self.command)
    }
}

/// Short-lived status text
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlashMessage {
    pub text: String,
    pub expires_at: Instant,
}

impl FlashMessage {
    /// Visible up to and including the expiry instant
    pub fn is_visible(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

#[derive(Debug, Default)]
pub struct Snapshot {
    pub catalog: Vec<CommandCatalogEntry>,
    pub health: HealthSnapshot,
    pub streams: StreamSnapshot,
    pub command: CommandOutput,
    pub log: LogSnapshot,
    pub notes: Vec<String>,
    pub control: ControlLog,
    pub nav: NavigationState,
    pub flash: Option<FlashMessage>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a freshly parsed catalog, keeping the selection in range
    pub fn replace_catalog(&mut self, rows: Vec<CommandCatalogEntry>) {
        self.catalog = rows;
        if self.nav.command >= self.catalog.len() {
            self.nav.command = 0;
        }
    }

    pub fn selected_command(&self) -> Option<&CommandCatalogEntry> {
        self.catalog.get(self.nav.command)
    }

    pub fn set_flash(&mut self, text: impl Into<String>, ttl: Duration, now: Instant) {
        self.flash = Some(FlashMessage {
            text: text.into(),
            expires_at: now + ttl,
        });
    }

    /// Drop the flash message once `now` is past its expiry
    pub fn expire_flash(&mut self, now: Instant) {
        if self.flash.as_ref().is_some_and(|f| !f.is_visible(now)) {
            self.flash = None;
        }
    }

    pub fn flash_text(&self, now: Instant) -> Option<&str> {
        self.flash
            .as_ref()
            .filter(|f| f.is_visible(now))
            .map(|f| f.text.as_str())
    }

    pub fn ctl(&mut self, message: impl Into<String>) {
        self.control.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> CommandCatalogEntry {
        CommandCatalogEntry {
            id: id.into(),
            title: id.to_uppercase(),
            runner: "shell".into(),
            description: String::new(),
        }
    }

    #[test]
    fn test_control_log_evicts_oldest() {
        let mut log = ControlLog::new(3);
        for i in 0..5 {
            log.push_at("00:00:00".into(), format!("msg {}", i));
        }
        assert_eq!(log.len(), 3);
        let msgs: Vec<_> = log.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(msgs, vec!["msg 2", "msg 3", "msg 4"]);

        let recent: Vec<_> = log.recent(2).map(|e| e.to_string()).collect();
        assert_eq!(recent, vec!["00:00:00 msg 3", "00:00:00 msg 4"]);
    }

    #[test]
    fn test_section_cycle_wraps() {
        assert_eq!(Section::Overview.prev(), Section::Commands);
        assert_eq!(Section::Commands.next(), Section::Overview);
        assert_eq!(Section::from_index(1), Some(Section::Grpc));
        assert_eq!(Section::from_index(4), None);
    }

    #[test]
    fn test_cycle_command_wraps_and_ignores_empty() {
        let mut nav = NavigationState::default();
        assert_eq!(nav.cycle_command(1, 0), None);
        assert_eq!(nav.command, 0);

        assert_eq!(nav.cycle_command(-1, 3), Some(2));
        assert_eq!(nav.cycle_command(1, 3), Some(0));
        assert_eq!(nav.cycle_command(1, 3), Some(1));
    }

    #[test]
    fn test_catalog_shrink_resets_selection() {
        let mut snap = Snapshot::new();
        snap.replace_catalog(vec![entry("a"), entry("b"), entry("c")]);
        snap.nav.command = 2;

        snap.replace_catalog(vec![entry("a"), entry("b"), entry("c"), entry("d")]);
        assert_eq!(snap.nav.command, 2);

        snap.replace_catalog(vec![entry("a")]);
        assert_eq!(snap.nav.command, 0);
        assert_eq!(snap.selected_command().map(|e| e.id.as_str()), Some("a"));

        snap.replace_catalog(vec![]);
        assert_eq!(snap.nav.command, 0);
        assert!(snap.selected_command().is_none());
    }

    #[test]
    fn test_flash_visible_until_expiry() {
        let mut snap = Snapshot::new();
        let t0 = Instant::now();
        snap.set_flash("refreshed", Duration::from_millis(1_500), t0);

        let expiry = t0 + Duration::from_millis(1_500);
        assert_eq!(snap.flash_text(t0), Some("refreshed"));
        assert_eq!(snap.flash_text(expiry), Some("refreshed"));

        snap.expire_flash(expiry);
        assert!(snap.flash.is_some());

        let after = expiry + Duration::from_millis(1);
        assert_eq!(snap.flash_text(after), None);
        snap.expire_flash(after);
        assert!(snap.flash.is_none());
    }

    #[test]
    fn test_log_delta_never_negative() {
        let mut log = LogSnapshot::default();
        assert_eq!(log.observe_size(100), 100);
        assert_eq!(log.observe_size(180), 80);
        assert_eq!(log.observe_size(180), 0);
        assert_eq!(log.observe_size(50), 0);
        assert_eq!(log.size, 50);
    }

    #[test]
    fn test_health_counts_recomputed() {
        let mut health = HealthSnapshot::default();
        let row = |status: &str| EndpointHealth {
            endpoint: "svc".into(),
            status: status.into(),
            latency: "1ms".into(),
            source: "p".into(),
        };
        health.replace(vec![row("SERVING"), row("DOWN")], "12:00:00".into());
        assert_eq!((health.ok, health.bad), (1, 1));

        health.replace(vec![row("SERVING")], "12:00:02".into());
        assert_eq!((health.ok, health.bad), (1, 0));
    }
}
