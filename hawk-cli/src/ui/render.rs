//! Pane renderers
//!
//! Each function paints one pane from the [`View`]. They only read state
//! and only write through a [`Surface`], so they can be exercised against
//! a plain `Buffer`.

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use hawk_core::state::Section;
use hawk_core::text::{pad, truncate, wrap_lines};

use super::View;
use super::layout::{MIN_HEIGHT, MIN_WIDTH, Panes, ScreenLayout, Split};
use super::surface::{HEADER, Surface};
use super::theme::styles;

/// Stream rows previewed on the overview
const STREAM_PREVIEW: usize = 10;
const ENDPOINT_ROWS: usize = 16;
const LOG_EXCERPT: usize = 12;
const CATALOG_ROWS: usize = 12;
/// Raw notes considered for the chat pane before wrapping
const CHAT_NOTES: usize = 80;
/// Rows at the bottom of the nav pane kept for the controls list
const NAV_CONTROLS_RESERVE: u16 = 10;

const CONTROLS: [&str; 6] = [
    "a/z/e daemon",
    "h/u health status",
    "[ ] choose command",
    "enter run command",
    "m add note",
    "r refresh   q quit",
];

pub fn screen(buf: &mut Buffer, area: Rect, view: &View) {
    let mut root = Surface::new(buf, area);
    root.clear();

    match ScreenLayout::compute(root.area()) {
        ScreenLayout::TooSmall { width, height } => too_small(&mut root, width, height),
        ScreenLayout::Panes(p) => {
            banner(&mut root.region(p.banner), view);
            nav(&mut root.region(p.nav), view);
            main_pane(&mut root, &p, view);
            ops(&mut root, &p, view);
            chat(&mut root.region(p.chat), view);
        }
    }
}

fn too_small(s: &mut Surface, width: u16, height: u16) {
    s.put(1, 2, "Terminal too small for Hawk-tui.", styles::bold());
    s.put(
        2,
        2,
        &format!(
            "Current {}x{}; need at least {}x{}",
            width, height, MIN_WIDTH, MIN_HEIGHT
        ),
        styles::text(),
    );
    s.put(4, 2, "Resize then press r. q to quit.", styles::text());
}

fn banner(s: &mut Surface, view: &View) {
    s.fill_row(0, styles::banner());
    let text = format!(" Hawk-tui [{}] {} ", view.frame, view.clock);
    let fill = "█".repeat(
        (s.width() as usize).saturating_sub(text.chars().count() + 1),
    );
    s.put(0, 1, &format!("{}{}", text, fill), styles::banner());
}

fn card(section: Section) -> (&'static str, [&'static str; 2]) {
    match section {
        Section::Overview => ("🛰", ["runtime snapshot", "buffer growth and ingest"]),
        Section::Grpc => ("🩺", ["serving vs non-serving", "latency per endpoint"]),
        Section::Streams => ("🌊", ["lag by stream", "moving event activity"]),
        Section::Commands => ("🧰", ["awk command palette", "run selected command"]),
    }
}

fn nav(s: &mut Surface, view: &View) {
    let (w, h) = (s.width(), s.height());
    s.boxed("NAV");

    s.put(1, 2, &"█".repeat(28), styles::accent());
    s.put(2, 2, &format!("{} Hawk-tui", HEADER), styles::accent_bold());
    s.put_wrapped(
        3,
        2,
        "awk-command operator surface",
        (w as usize).saturating_sub(4).max(8),
        styles::muted(),
        Some(2),
    );

    let inner_w = (w as usize).saturating_sub(4).max(10);
    let frame_w = inner_w.saturating_sub(2).max(8);
    let limit = h.saturating_sub(NAV_CONTROLS_RESERVE);
    let mut row: u16 = 5;

    for section in Section::ALL {
        if row + 3 >= limit {
            break;
        }
        let selected = section == view.snap.nav.section;
        let (title_style, frame_style, marker) = if selected {
            (styles::accent_bold(), styles::accent(), "▾")
        } else {
            (styles::muted().patch(styles::bold()), styles::dim(), "▸")
        };
        let (icon, subs) = card(section);
        let title = format!(
            " {} {} {} {} {} ",
            section.index() + 1,
            HEADER,
            icon,
            section.label().to_uppercase(),
            marker
        );

        s.put(row, 2, &format!("┌{}┐", "─".repeat(frame_w)), frame_style);
        s.put(
            row + 1,
            2,
            &format!("│{}│", truncate(&pad(&title, frame_w), frame_w)),
            title_style,
        );
        s.put(row + 2, 2, &format!("└{}┘", "─".repeat(frame_w)), frame_style);
        row += 3;

        if selected && row + 2 < limit {
            for sub in subs {
                if row >= limit {
                    break;
                }
                s.put_wrapped(
                    row,
                    4,
                    &format!("• {}", sub),
                    (w as usize).saturating_sub(8).max(6),
                    styles::muted(),
                    Some(1),
                );
                row += 1;
            }
        }
        row += 1;
    }

    let k = row.max(h.saturating_sub(9));
    s.put(k, 2, "Controls", styles::accent_bold());
    for (i, line) in CONTROLS.iter().enumerate() {
        let y = k + 1 + i as u16;
        if y >= h.saturating_sub(2) {
            break;
        }
        s.put(y, 2, &format!("- {}", line), styles::faint());
    }

    if let Some(flash) = view.flash {
        s.put_wrapped(
            h.saturating_sub(2),
            2,
            flash,
            (w as usize).saturating_sub(4).max(8),
            styles::accent_bold(),
            Some(1),
        );
    }
}

fn main_pane(root: &mut Surface, p: &Panes, view: &View) {
    let section = view.snap.nav.section;
    root.region(p.main)
        .boxed(&format!("MAIN :: {}", section.label().to_uppercase()));

    let split = &p.main_split;
    match section {
        Section::Overview => overview(root, split, view),
        Section::Grpc => grpc(root, split, view),
        Section::Streams => streams(root, split, view),
        Section::Commands => commands(root, split, view),
    }
}

fn stale_marker(stale: bool) -> &'static str {
    if stale { " (stale)" } else { "" }
}

fn overview(root: &mut Surface, split: &Split, view: &View) {
    let snap = view.snap;
    let cfg = view.config;

    let mut top = root.region(split.top);
    top.boxed("MAIN TOP :: OVERVIEW");
    let lines = [
        format!("log file        : {}", cfg.log_file.display()),
        format!("stream file     : {}", cfg.stream_file.display()),
        format!("grpc targets    : {}", cfg.grpc_targets.display()),
        format!(
            "grpc checks     : ok={} bad={} last={}{}",
            snap.health.ok,
            snap.health.bad,
            snap.health.last,
            stale_marker(snap.health.stale)
        ),
        format!("log bytes       : {}", snap.log.size),
        format!("log growth      : +{} bytes", snap.log.delta),
        format!("command poll    : {}", snap.command.last),
    ];
    for (i, line) in lines.iter().enumerate() {
        top.put(i as u16 + 1, 2, line, styles::text());
    }

    let mut bottom = root.region(split.bottom);
    bottom.boxed("MAIN BOTTOM :: RATE WINDOW");
    for (i, line) in snap.streams.rows.iter().take(STREAM_PREVIEW).enumerate() {
        bottom.put(i as u16 + 1, 2, line, styles::text());
    }
}

fn grpc(root: &mut Surface, split: &Split, view: &View) {
    let health = &view.snap.health;

    let mut top = root.region(split.top);
    top.boxed("MAIN TOP :: GRPC HEALTH");
    top.put(
        1,
        2,
        &format!("last poll: {}{}", health.last, stale_marker(health.stale)),
        styles::text(),
    );
    top.put(2, 2, &format!("serving: {}", health.ok), styles::good_bold());
    top.put(3, 2, &format!("non-serving: {}", health.bad), styles::bad_bold());

    let mut bottom = root.region(split.bottom);
    bottom.boxed("MAIN BOTTOM :: ENDPOINT TABLE");
    for (i, row) in health.rows.iter().take(ENDPOINT_ROWS).enumerate() {
        let line = format!(
            "{:<32} {:<12} {:<8} {}",
            row.endpoint, row.status, row.latency, row.source
        );
        bottom.put(i as u16 + 1, 2, &line, styles::health(row.is_serving()));
    }
}

fn streams(root: &mut Surface, split: &Split, view: &View) {
    let snap = view.snap;

    let mut top = root.region(split.top);
    top.boxed("MAIN TOP :: STREAM LAG");
    top.put(
        1,
        2,
        &format!(
            "last poll: {}{}",
            snap.streams.last,
            stale_marker(snap.streams.stale)
        ),
        styles::text(),
    );
    let room = (top.height() as usize).saturating_sub(3).max(1);
    for (i, line) in snap.streams.rows.iter().take(room).enumerate() {
        top.put(i as u16 + 2, 2, line, styles::text());
    }

    let mut bottom = root.region(split.bottom);
    bottom.boxed("MAIN BOTTOM :: STREAM SUMMARY");
    for (i, line) in last_n(&snap.log.tail, LOG_EXCERPT).iter().enumerate() {
        bottom.put(i as u16 + 1, 2, line, styles::text());
    }
}

fn commands(root: &mut Surface, split: &Split, view: &View) {
    let snap = view.snap;

    root.region(split.top).boxed("MAIN TOP :: COMMAND LIBRARY");
    root.region(split.bottom)
        .boxed("MAIN BOTTOM :: SELECTED OUTPUT");

    let mut top = root.region(split.top);
    if snap.catalog.is_empty() {
        top.put(1, 2, "No command catalog loaded.", styles::text());
        return;
    }

    let mut row: u16 = 1;
    for (i, cmd) in snap.catalog.iter().take(CATALOG_ROWS).enumerate() {
        let style = if i == snap.nav.command {
            styles::selection()
        } else {
            styles::text()
        };
        top.put(row, 2, &format!("{:<16} {}", cmd.id, cmd.title), style);
        row += 1;
    }
    top.put(row + 1, 2, &format!("last run: {}", snap.command.last), styles::text());

    let mut bottom = root.region(split.bottom);
    let room = (bottom.height() as usize).saturating_sub(2).max(1);
    for (i, line) in snap.command.lines.iter().take(room).enumerate() {
        bottom.put(i as u16 + 1, 2, line, styles::text());
    }
}

fn ops(root: &mut Surface, p: &Panes, view: &View) {
    let snap = view.snap;
    root.region(p.ops).boxed("OPS :: DETAIL + LIVE LOG");
    let split = &p.ops_split;

    let mut gap = root.region(split.gap);
    let dots = "·".repeat(gap.width() as usize);
    gap.put(0, 0, &dots, styles::dim());

    let mut detail = root.region(split.top);
    detail.put(0, 0, "Control plane", styles::accent_bold());
    let room = (detail.height() as usize).saturating_sub(2).max(1);
    for (i, entry) in snap.control.recent(room).enumerate() {
        detail.put(i as u16 + 1, 0, &entry.to_string(), styles::text());
    }

    let mut log = root.region(split.bottom);
    log.put(
        0,
        0,
        &format!("Run log [{}]", view.frame),
        styles::accent_bold(),
    );
    let room = (log.height() as usize).saturating_sub(2).max(1);
    for (i, line) in last_n(&snap.log.tail, room).iter().enumerate() {
        log.put(i as u16 + 1, 0, line, styles::faint());
    }
}

fn chat(s: &mut Surface, view: &View) {
    let snap = view.snap;
    let (w, h) = (s.width(), s.height());
    s.boxed("CHAT :: DETAILS");

    s.put(1, 2, "Agent notes", styles::accent_bold());
    s.put(
        2,
        2,
        &format!("log bytes={} delta={}", snap.log.size, snap.log.delta),
        styles::muted(),
    );

    let width = (w as usize).saturating_sub(4).max(8);
    let wrapped: Vec<String> = last_n(&snap.notes, CHAT_NOTES)
        .iter()
        .flat_map(|note| wrap_lines(note, width))
        .collect();

    if wrapped.is_empty() {
        s.put(4, 2, "No notes yet. Press m to append.", styles::muted());
        return;
    }

    let room = (h as usize).saturating_sub(5).max(1);
    let mut row: u16 = 4;
    for line in last_n(&wrapped, room) {
        s.put(row, 2, line, styles::text());
        row += 1;
        if row >= h.saturating_sub(1) {
            break;
        }
    }
}

fn last_n<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use ratatui::style::{Color, Modifier};

    use hawk_core::config::HawkConfig;
    use hawk_core::parse::{parse_catalog, parse_health};
    use hawk_core::state::Snapshot;

    use super::*;

    fn render(snap: &Snapshot, w: u16, h: u16) -> Buffer {
        let config = HawkConfig::from_base("/srv/hawk");
        let view = View {
            snap,
            config: &config,
            frame: "/",
            clock: "12:00:00".to_string(),
            flash: snap.flash_text(Instant::now()),
        };
        let area = Rect::new(0, 0, w, h);
        let mut buf = Buffer::empty(area);
        screen(&mut buf, area, &view);
        buf
    }

    /// Position of the first cell run spelling `needle`
    fn find(buf: &Buffer, needle: &str) -> Option<(u16, u16)> {
        let chars: Vec<String> = needle.chars().map(|c| c.to_string()).collect();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                let fits = chars.iter().enumerate().all(|(k, c)| {
                    let cx = x as usize + k;
                    cx < buf.area.width as usize && buf[(cx as u16, y)].symbol() == c
                });
                if fits {
                    return Some((x, y));
                }
            }
        }
        None
    }

    #[test]
    fn test_too_small_draws_only_notice() {
        let buf = render(&Snapshot::new(), 120, 40);
        assert!(find(&buf, "Terminal too small for Hawk-tui.").is_some());
        assert!(find(&buf, "Current 120x40; need at least 150x28").is_some());
        assert!(find(&buf, "Resize then press r. q to quit.").is_some());
        assert!(find(&buf, "NAV").is_none());
        assert!(find(&buf, "Hawk-tui [").is_none());
    }

    #[test]
    fn test_full_layout_has_every_pane() {
        let buf = render(&Snapshot::new(), 150, 28);
        assert_eq!(find(&buf, " Hawk-tui [/] 12:00:00 "), Some((1, 0)));
        for title in [
            "▛▞// NAV",
            "▛▞// MAIN :: OVERVIEW",
            "▛▞// MAIN TOP :: OVERVIEW",
            "▛▞// MAIN BOTTOM :: RATE WINDOW",
            "▛▞// OPS ::",
            "▛▞// CHAT :: DETAILS",
        ] {
            assert!(find(&buf, title).is_some(), "missing {}", title);
        }
        assert!(find(&buf, "Control plane").is_some());
        assert!(find(&buf, "Run log [/]").is_some());
        assert!(find(&buf, "No notes yet.").is_some());
        assert!(find(&buf, "grpc checks     : ok=0 bad=0 last=never").is_some());
    }

    #[test]
    fn test_grpc_rows_colored_by_status() {
        let mut snap = Snapshot::new();
        snap.nav.section = Section::Grpc;
        snap.health.replace(
            parse_health("svcA\tSERVING\t12ms\tprobe1\nsvcB\tDOWN\t--\tprobe1"),
            "09:30:00".into(),
        );
        let buf = render(&snap, 160, 30);

        let (ax, ay) = find(&buf, "svcA").unwrap();
        let (bx, by) = find(&buf, "svcB").unwrap();
        assert_eq!(buf[(ax, ay)].fg, Color::Green);
        assert_eq!(buf[(bx, by)].fg, Color::Red);
        assert!(find(&buf, "serving: 1").is_some());
        assert!(find(&buf, "non-serving: 1").is_some());
        assert!(find(&buf, "MAIN TOP :: GRPC HEALTH").is_some());
    }

    #[test]
    fn test_stale_health_is_marked() {
        let mut snap = Snapshot::new();
        snap.nav.section = Section::Grpc;
        snap.health.replace(parse_health("a\tSERVING\t1ms\tp"), "09:30:00".into());
        snap.health.stale = true;
        let buf = render(&snap, 150, 28);
        assert!(find(&buf, "last poll: 09:30:00 (stale)").is_some());
    }

    #[test]
    fn test_commands_highlight_selection() {
        let mut snap = Snapshot::new();
        snap.nav.section = Section::Commands;
        snap.replace_catalog(parse_catalog(
            "build|Build Service|shell|b\ndeploy|Deploy|shell|d",
        ));
        snap.nav.command = 1;
        snap.command.lines = vec!["deployed".into()];
        let buf = render(&snap, 150, 28);

        let (bx, by) = find(&buf, "build").unwrap();
        let (dx, dy) = find(&buf, "deploy ").unwrap();
        assert!(!buf[(bx, by)].modifier.contains(Modifier::REVERSED));
        assert!(buf[(dx, dy)].modifier.contains(Modifier::REVERSED));
        assert!(find(&buf, "last run: never").is_some());
        assert!(find(&buf, "deployed").is_some());
    }

    #[test]
    fn test_empty_catalog_notice() {
        let mut snap = Snapshot::new();
        snap.nav.section = Section::Commands;
        let buf = render(&snap, 150, 28);
        assert!(find(&buf, "No command catalog loaded.").is_some());
        assert!(find(&buf, "MAIN BOTTOM :: SELECTED OUTPUT").is_some());
    }

    #[test]
    fn test_chat_shows_most_recent_notes_last() {
        let mut snap = Snapshot::new();
        snap.notes = (0..40)
            .map(|i| format!("note {}", i))
            .collect();
        snap.log.size = 42;
        let buf = render(&snap, 150, 28);

        assert!(find(&buf, "log bytes=42 delta=0").is_some());
        assert!(find(&buf, "note 39").is_some());
        assert!(find(&buf, "note 0 ").is_none());
        let (_, y) = find(&buf, "note 39").unwrap();
        assert!(y < 27);
    }

    #[test]
    fn test_flash_and_control_log_visible() {
        let mut snap = Snapshot::new();
        snap.set_flash("refreshed", Duration::from_secs(60), Instant::now());
        snap.control.push_at("10:00:00".into(), "restart ok :: hawk-agent.service");
        let buf = render(&snap, 150, 28);

        let (_, y) = find(&buf, "refreshed").unwrap();
        assert_eq!(y, 1 + 27 - 2);
        assert!(find(&buf, "10:00:00 restart ok").is_some());
    }

    #[test]
    fn test_streams_view_lists_rows_and_log_excerpt() {
        let mut snap = Snapshot::new();
        snap.nav.section = Section::Streams;
        snap.streams.rows = vec!["orders lag=3".into(), "billing lag=0".into()];
        snap.log.tail = (0..30).map(|i| format!("log line {:02}", i)).collect();
        let buf = render(&snap, 150, 28);

        assert!(find(&buf, "orders lag=3").is_some());
        assert!(find(&buf, "billing lag=0").is_some());
        assert!(find(&buf, "log line 29").is_some());
    }
}
