//! Poll scheduler
//!
//! Each data source has its own cadence. On every tick of the console loop
//! the sources whose interval has elapsed are polled through the gateway
//! and the parsed results are copied into the [`Snapshot`]. Probes run to
//! completion (bounded by their timeout) before the tick returns.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::config::{Cadences, HawkConfig};
use crate::files;
use crate::lifecycle::LifecycleAction;
use crate::parse::{parse_catalog, parse_health, parse_streams};
use crate::probe::{Gateway, ProbeOutcome, ProbeStatus};
use crate::state::{COMMAND_OUTPUT_CAP, Snapshot, TAIL_CAP};
use crate::text::clock_label;

/// Lines of lifecycle output copied into the control log
pub const LIFECYCLE_TAIL: usize = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Catalog,
    Health,
    Streams,
    Command,
    Logs,
}

impl Source {
    /// Polled in this order by a full refresh
    pub const ALL: [Source; 5] = [
        Source::Catalog,
        Source::Health,
        Source::Streams,
        Source::Command,
        Source::Logs,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Source::Catalog => "catalog",
            Source::Health => "grpc",
            Source::Streams => "streams",
            Source::Command => "command",
            Source::Logs => "logs",
        }
    }
}

/// Last-poll bookkeeping per source
#[derive(Clone, Debug)]
pub struct PollClock {
    cadences: Cadences,
    last: HashMap<Source, Instant>,
}

impl PollClock {
    pub fn new(cadences: Cadences) -> Self {
        Self {
            cadences,
            last: HashMap::new(),
        }
    }

    /// `None` for sources that only refresh on demand
    pub fn interval(&self, source: Source) -> Option<Duration> {
        match source {
            Source::Catalog => None,
            Source::Health => Some(self.cadences.health),
            Source::Streams => Some(self.cadences.streams),
            Source::Command => Some(self.cadences.command),
            Source::Logs => Some(self.cadences.logs),
        }
    }

    pub fn is_due(&self, source: Source, now: Instant) -> bool {
        let Some(interval) = self.interval(source) else {
            return false;
        };
        match self.last.get(&source) {
            None => true,
            Some(last) => now.saturating_duration_since(*last) >= interval,
        }
    }

    pub fn due(&self, now: Instant) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|s| self.is_due(*s, now))
            .collect()
    }

    pub fn mark(&mut self, source: Source, now: Instant) {
        self.last.insert(source, now);
    }

}

/// Result of running the selected catalog command
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRun {
    pub id: String,
    pub status: ProbeStatus,
}

impl CommandRun {
    pub fn success(&self) -> bool {
        self.status == ProbeStatus::Exited(Some(0))
    }
}

pub struct Poller<G> {
    config: HawkConfig,
    gateway: G,
    clock: PollClock,
    env: Vec<(String, String)>,
}

impl<G: Gateway> Poller<G> {
    pub fn new(config: HawkConfig, gateway: G) -> Self {
        let clock = PollClock::new(config.cadences);
        let env = config.probe_env();
        Self {
            config,
            gateway,
            clock,
            env,
        }
    }

    pub fn config(&self) -> &HawkConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// One scheduler step: expire the flash message, then poll every due
    /// source. Returns the sources that were polled.
    pub async fn tick(&mut self, snap: &mut Snapshot, now: Instant) -> Vec<Source> {
        snap.expire_flash(now);
        let due = self.clock.due(now);
        for source in &due {
            tracing::trace!(source = source.label(), "cadence poll");
            self.poll(*source, snap, now).await;
        }
        due
    }

    /// Poll one source immediately, regardless of its cadence
    pub async fn poll(&mut self, source: Source, snap: &mut Snapshot, now: Instant) {
        match source {
            Source::Catalog => self.poll_catalog(snap).await,
            Source::Health => self.poll_health(snap).await,
            Source::Streams => self.poll_streams(snap).await,
            Source::Command => {
                self.poll_command(snap).await;
            }
            Source::Logs => self.poll_logs_and_notes(snap),
        }
        self.clock.mark(source, now);
    }

    /// Manual run of the selected command; also resets its cadence
    pub async fn run_command(&mut self, snap: &mut Snapshot, now: Instant) -> Option<CommandRun> {
        let run = self.poll_command(snap).await;
        self.clock.mark(Source::Command, now);
        run
    }

    /// Catalog first, so the command poll sees the fresh selection
    pub async fn poll_all(&mut self, snap: &mut Snapshot, now: Instant) {
        for source in Source::ALL {
            self.poll(source, snap, now).await;
        }
    }

    async fn probe(&self, args: &[&str], timeout: Duration) -> ProbeOutcome {
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.config.bin.to_string_lossy().into_owned());
        argv.extend(args.iter().map(|a| a.to_string()));
        self.gateway
            .execute(&argv, &self.config.base_dir, &self.env, timeout)
            .await
    }

    /// A failed catalog probe leaves an empty catalog
    pub async fn poll_catalog(&self, snap: &mut Snapshot) {
        let out = self.probe(&["list"], self.config.timeouts.catalog).await;
        let rows = if out.success() {
            parse_catalog(&out.output)
        } else {
            tracing::warn!(status = %out.status, "catalog probe failed");
            snap.ctl(format!("catalog failed :: {}", out.status));
            Vec::new()
        };
        snap.replace_catalog(rows);
    }

    /// A failed health probe keeps the previous rows and counts on screen,
    /// flagged as stale
    pub async fn poll_health(&self, snap: &mut Snapshot) {
        let out = self
            .probe(&["run", "grpc_health"], self.config.timeouts.health)
            .await;
        if out.success() {
            snap.health.replace(parse_health(&out.output), clock_label());
        } else {
            tracing::warn!(status = %out.status, "health probe failed");
            snap.health.stale = true;
        }
    }

    pub async fn poll_streams(&self, snap: &mut Snapshot) {
        let out = self
            .probe(&["run", "stream_lag"], self.config.timeouts.streams)
            .await;
        if out.success() {
            snap.streams.rows = parse_streams(&out.output);
            snap.streams.last = clock_label();
            snap.streams.stale = false;
        } else {
            tracing::warn!(status = %out.status, "stream probe failed");
            snap.streams.stale = true;
        }
    }

    /// Run the selected catalog command. `None` when the catalog is empty.
    pub async fn poll_command(&self, snap: &mut Snapshot) -> Option<CommandRun> {
        let Some(entry) = snap.selected_command() else {
            snap.command.lines = vec!["no commands loaded".to_string()];
            return None;
        };
        let id = entry.id.clone();

        let out = self.probe(&["run", id.as_str()], self.config.timeouts.command).await;
        snap.command.lines = if out.success() && !out.output.is_empty() {
            out.tail(COMMAND_OUTPUT_CAP)
        } else if out.success() {
            vec!["(no output)".to_string()]
        } else {
            let detail = if out.output.is_empty() {
                "unknown error".to_string()
            } else {
                out.output.clone()
            };
            vec![format!("command failed: {}", id), detail]
        };
        snap.command.last = clock_label();

        Some(CommandRun {
            id,
            status: out.status,
        })
    }

    pub fn poll_logs_and_notes(&self, snap: &mut Snapshot) {
        match files::stat(&self.config.log_file) {
            Some(st) => {
                snap.log.observe_size(st.size);
                if let Some(modified) = st.modified {
                    snap.log.last_modified = modified;
                }
            }
            None => snap.log.delta = 0,
        }
        snap.log.tail = files::tail_lines(&self.config.log_file, TAIL_CAP);

        if let Err(e) = files::ensure_file(&self.config.notes_file) {
            tracing::warn!(error = %e, "notes file unavailable");
        }
        snap.notes = files::tail_lines(&self.config.notes_file, TAIL_CAP);
    }

    /// Invoke the lifecycle executable for the managed unit and record the
    /// result in the control log. Returns whether the action succeeded.
    pub async fn run_lifecycle(&self, action: LifecycleAction, snap: &mut Snapshot) -> bool {
        let unit = self.config.default_unit.clone();
        let argv = vec![
            self.config.daemon_ctl.to_string_lossy().into_owned(),
            action.as_str().to_string(),
            unit.clone(),
        ];
        let out = self
            .gateway
            .execute(
                &argv,
                &self.config.base_dir,
                &self.env,
                self.config.timeouts.lifecycle,
            )
            .await;

        let ok = out.success();
        tracing::info!(action = action.as_str(), unit = %unit, status = %out.status, "lifecycle action");
        if ok {
            snap.ctl(format!("{} ok :: {}", action, unit));
        } else {
            snap.ctl(format!("{} failed :: {}", action, unit));
        }
        for line in out.tail(LIFECYCLE_TAIL) {
            snap.ctl(line);
        }
        ok
    }
}
