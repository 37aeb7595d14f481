use std::env;
use std::io::Write;

use anyhow::{Context, Result};

#[cfg(feature = "colors")]
use owo_colors::OwoColorize;

// Provide a no-op color shim when "colors" feature is disabled
#[cfg(not(feature = "colors"))]
pub mod color_shim {
    use std::fmt::{self, Display, Formatter};

    #[derive(Clone)]
    pub struct Plain(pub String);

    impl Display for Plain {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    pub trait ColorizeShim {
        fn as_str(&self) -> &str;

        fn bold(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn dimmed(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn red(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn yellow(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
        fn bright_black(&self) -> Plain {
            Plain(self.as_str().to_string())
        }
    }

    impl ColorizeShim for &str {
        fn as_str(&self) -> &str {
            self
        }
    }
    impl ColorizeShim for String {
        fn as_str(&self) -> &str {
            self.as_str()
        }
    }
    impl ColorizeShim for Plain {
        fn as_str(&self) -> &str {
            &self.0
        }
    }
}

#[cfg(not(feature = "colors"))]
use color_shim::ColorizeShim as OwoColorize;

use crate::locale::Lang;
use crate::models::{Block, BlocksResponse};
use crate::utils::{format_currency, format_number, format_rate};
use crate::window::{BurnRateLevel, find_active_block, session_progress};

pub const TITLE_GLYPH: &str = "🦉";

/// Number of dropdown lines a sink keeps, enough for every render.
pub const MENU_SLOTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Loading,
    Active,
    NoData,
    Inactive,
    Error,
}

impl StatusState {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusState::Loading => "loading",
            StatusState::Active => "active",
            StatusState::NoData => "no-data",
            StatusState::Inactive => "inactive",
            StatusState::Error => "error",
        }
    }
}

/// One frame for the status surface: the always-visible title plus the
/// dropdown lines. Empty lines are separators and are hidden by sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatus {
    pub state: StatusState,
    pub title: String,
    pub lines: Vec<String>,
}

impl RenderedStatus {
    fn single(state: StatusState, title: String, line: String) -> Self {
        Self {
            state,
            title,
            lines: vec![line],
        }
    }
}

pub fn compact_title(block: &Block) -> String {
    format!("{TITLE_GLYPH} ${}", format_currency(block.cost_usd))
}

/// The eight dropdown lines for an active block. Indices 1 and 5 are blank
/// separators.
pub fn detailed_lines(block: &Block, lang: Lang) -> Vec<String> {
    let (remaining, started) =
        session_progress(&block.start_time, &block.end_time, &block.actual_end_time);
    let burn = BurnRateLevel::classify(block.burn_rate.tokens_per_minute);

    vec![
        format!(
            "⏱️ {}: {} {} / {} {}",
            lang.pick("Session", "セッション"),
            lang.pick("Started", "開始"),
            started,
            lang.pick("Remaining", "残り"),
            remaining
        ),
        String::new(),
        format!(
            "💰 {}: ${}",
            lang.pick("Current Cost", "現在の費用"),
            format_currency(block.cost_usd)
        ),
        format!(
            "🔥 {}: {} ({} token/min)",
            lang.pick("Burn Rate", "消費ペース"),
            burn.label(),
            format_rate(block.burn_rate.tokens_per_minute)
        ),
        format!(
            "📊 {}: {}",
            lang.pick("Tokens Used", "使用トークン"),
            format_number(block.total_tokens)
        ),
        String::new(),
        format!(
            "📈 {}: ${}",
            lang.pick("Projected Cost", "予想最終費用"),
            format_currency(block.projection.total_cost)
        ),
        format!(
            "🎯 {}: {}{}",
            lang.pick("API Calls", "API呼び出し"),
            format_number(block.entries),
            lang.pick("", "回")
        ),
    ]
}

pub fn loading_status(lang: Lang) -> RenderedStatus {
    RenderedStatus::single(
        StatusState::Loading,
        format!("{TITLE_GLYPH} {}...", lang.pick("Loading", "読み込み中")),
        lang.pick("Loading...", "読み込み中...").to_string(),
    )
}

pub fn error_status(lang: Lang) -> RenderedStatus {
    RenderedStatus::single(
        StatusState::Error,
        format!("{TITLE_GLYPH} {}", lang.pick("Error", "エラー")),
        format!(
            "❌ {}",
            lang.pick("Failed to fetch data", "データを取得できませんでした")
        ),
    )
}

pub fn no_data_status(lang: Lang) -> RenderedStatus {
    RenderedStatus::single(
        StatusState::NoData,
        format!("{TITLE_GLYPH} {}", lang.pick("No Data", "データなし")),
        format!("⚠️ {}", lang.pick("No data available", "データがありません")),
    )
}

pub fn inactive_status(lang: Lang) -> RenderedStatus {
    RenderedStatus::single(
        StatusState::Inactive,
        format!("{TITLE_GLYPH} {}", lang.pick("Inactive", "非アクティブ")),
        format!(
            "💤 {}",
            lang.pick("No active session", "アクティブなセッションがありません")
        ),
    )
}

pub fn active_status(block: &Block, lang: Lang) -> RenderedStatus {
    RenderedStatus {
        state: StatusState::Active,
        title: compact_title(block),
        lines: detailed_lines(block, lang),
    }
}

/// Turn a successful fetch into a frame: no blocks, no active block, or the
/// first active block.
pub fn render_response(resp: &BlocksResponse, lang: Lang) -> RenderedStatus {
    if resp.blocks.is_empty() {
        return no_data_status(lang);
    }
    match find_active_block(&resp.blocks) {
        Some(block) => active_status(block, lang),
        None => inactive_status(lang),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub text: String,
    pub visible: bool,
}

/// Fixed set of index-addressed dropdown lines, retained between updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuSlots {
    slots: Vec<Slot>,
}

impl MenuSlots {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![Slot::default(); count],
        }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|s| s.visible)
            .map(|s| s.text.as_str())
    }

    /// Show non-empty lines in order, hide blank ones and every slot past the
    /// end of `lines`. Lines beyond the slot count are dropped. A hidden slot
    /// keeps its old text. Returns whether any slot changed.
    pub fn apply(&mut self, lines: &[String]) -> bool {
        let mut changed = false;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match lines.get(i) {
                Some(text) if !text.is_empty() => {
                    if !slot.visible || slot.text != *text {
                        slot.visible = true;
                        slot.text.clone_from(text);
                        changed = true;
                    }
                }
                _ => {
                    if slot.visible {
                        slot.visible = false;
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

/// The surface a [`RenderedStatus`] is pushed into.
pub trait DisplaySink {
    fn set_title(&mut self, title: &str, state: StatusState);
    fn set_lines(&mut self, lines: &[String]);
    /// Make the latest title/lines visible to the consumer.
    fn flush(&mut self) -> Result<()>;
}

pub fn update_display<D: DisplaySink + ?Sized>(sink: &mut D, status: &RenderedStatus) -> Result<()> {
    sink.set_title(&status.title, status.state);
    sink.set_lines(&status.lines);
    sink.flush()
}

/// Shared bookkeeping for the writer-backed sinks: only emit when something
/// actually changed since the last flush.
#[derive(Debug)]
struct Surface {
    title: String,
    state: StatusState,
    menu: MenuSlots,
    dirty: bool,
}

impl Surface {
    fn new() -> Self {
        Self {
            title: String::new(),
            state: StatusState::Loading,
            menu: MenuSlots::new(MENU_SLOTS),
            dirty: false,
        }
    }

    fn set_title(&mut self, title: &str, state: StatusState) {
        if self.title != title || self.state != state {
            self.title = title.to_string();
            self.state = state;
            self.dirty = true;
        }
    }

    fn set_lines(&mut self, lines: &[String]) {
        if self.menu.apply(lines) {
            self.dirty = true;
        }
    }

    fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}

/// Human-readable sink: redraws the title and visible lines on change.
pub struct TerminalSink<W: Write> {
    out: W,
    surface: Surface,
    plain: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        // Respect NO_COLOR if set
        let plain = env::var("NO_COLOR").is_ok();
        Self {
            out,
            surface: Surface::new(),
            plain,
        }
    }

    pub fn plain(mut self, plain: bool) -> Self {
        self.plain = plain;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn styled_title(&self) -> String {
        let title = self.surface.title.as_str();
        if self.plain {
            return title.to_string();
        }
        match self.surface.state {
            StatusState::Error => title.red().bold().to_string(),
            StatusState::NoData | StatusState::Inactive => title.yellow().to_string(),
            StatusState::Loading => title.dimmed().to_string(),
            StatusState::Active => title.bold().to_string(),
        }
    }
}

impl<W: Write> DisplaySink for TerminalSink<W> {
    fn set_title(&mut self, title: &str, state: StatusState) {
        self.surface.set_title(title, state);
    }

    fn set_lines(&mut self, lines: &[String]) {
        self.surface.set_lines(lines);
    }

    fn flush(&mut self) -> Result<()> {
        if !self.surface.take_dirty() {
            return Ok(());
        }
        let title = self.styled_title();
        writeln!(self.out, "{title}").context("write status title")?;
        for line in self.surface.menu.visible() {
            let written = if self.plain {
                writeln!(self.out, "  {line}")
            } else {
                writeln!(self.out, "  {}", line.bright_black())
            };
            written.context("write status line")?;
        }
        writeln!(self.out).context("write status separator")?;
        self.out.flush().context("flush status output")
    }
}

/// Machine-readable sink: one JSON object per change, shaped for waybar/i3bar
/// custom modules (`text`, `tooltip`, `class`) plus the raw `lines`.
pub struct JsonSink<W: Write> {
    out: W,
    surface: Surface,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            surface: Surface::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn build_json_output(title: &str, state: StatusState, lines: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "text": title,
        "tooltip": lines.join("\n"),
        "class": state.as_str(),
        "lines": lines,
    })
}

impl<W: Write> DisplaySink for JsonSink<W> {
    fn set_title(&mut self, title: &str, state: StatusState) {
        self.surface.set_title(title, state);
    }

    fn set_lines(&mut self, lines: &[String]) {
        self.surface.set_lines(lines);
    }

    fn flush(&mut self) -> Result<()> {
        if !self.surface.take_dirty() {
            return Ok(());
        }
        let lines: Vec<&str> = self.surface.menu.visible().collect();
        let value = build_json_output(&self.surface.title, self.surface.state, &lines);
        serde_json::to_writer(&mut self.out, &value).context("serialize status json")?;
        writeln!(self.out).context("write status json")?;
        self.out.flush().context("flush status output")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        let mut b = Block {
            id: "2025-06-30T05:00:00.000Z".to_string(),
            start_time: "2025-06-30T05:00:00.000Z".to_string(),
            end_time: "2025-06-30T10:00:00.000Z".to_string(),
            actual_end_time: "2025-06-30T07:00:00.000Z".to_string(),
            is_active: true,
            cost_usd: 15.58,
            total_tokens: 38144,
            entries: 359,
            ..Default::default()
        };
        b.burn_rate.tokens_per_minute = 250.0;
        b.burn_rate.cost_per_hour = 12.88;
        b.projection.total_cost = 53.65;
        b.projection.remaining_minutes = 177;
        b
    }

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_compact_title() {
        let mut b = sample_block();
        assert_eq!(compact_title(&b), "🦉 $15.58");
        b.cost_usd = 15.581772000000006;
        assert_eq!(compact_title(&b), "🦉 $15.58");
        b.cost_usd = 0.0;
        assert_eq!(compact_title(&b), "🦉 $0.00");
    }

    #[test]
    fn test_detailed_lines_english() {
        let got = detailed_lines(&sample_block(), Lang::English);
        assert_eq!(
            got,
            lines(&[
                "⏱️ Session: Started 05:00 / Remaining 3h 0m",
                "",
                "💰 Current Cost: $15.58",
                "🔥 Burn Rate: 🟢 LOW (250 token/min)",
                "📊 Tokens Used: 38.1k",
                "",
                "📈 Projected Cost: $53.65",
                "🎯 API Calls: 359",
            ])
        );
    }

    #[test]
    fn test_detailed_lines_japanese() {
        let got = detailed_lines(&sample_block(), Lang::Japanese);
        assert_eq!(got.len(), 8);
        assert_eq!(got[0], "⏱️ セッション: 開始 05:00 / 残り 3h 0m");
        assert_eq!(got[2], "💰 現在の費用: $15.58");
        assert_eq!(got[3], "🔥 消費ペース: 🟢 LOW (250 token/min)");
        assert_eq!(got[4], "📊 使用トークン: 38.1k");
        assert_eq!(got[6], "📈 予想最終費用: $53.65");
        assert_eq!(got[7], "🎯 API呼び出し: 359回");
    }

    #[test]
    fn test_detailed_lines_separators() {
        let mut b = sample_block();
        for tpm in [0.0, 450.0, 9000.0] {
            b.burn_rate.tokens_per_minute = tpm;
            for lang in [Lang::English, Lang::Japanese] {
                let got = detailed_lines(&b, lang);
                assert_eq!(got.len(), 8);
                assert!(got[1].is_empty());
                assert!(got[5].is_empty());
                assert!(got.iter().enumerate().all(|(i, l)| i == 1 || i == 5 || !l.is_empty()));
            }
        }
    }

    #[test]
    fn test_render_response_states() {
        let empty = BlocksResponse::default();
        assert_eq!(render_response(&empty, Lang::English).state, StatusState::NoData);

        let mut idle = sample_block();
        idle.is_active = false;
        let resp = BlocksResponse { blocks: vec![idle] };
        let status = render_response(&resp, Lang::English);
        assert_eq!(status.state, StatusState::Inactive);
        assert_eq!(status.title, "🦉 Inactive");
        assert_eq!(status.lines, lines(&["💤 No active session"]));

        let resp = BlocksResponse {
            blocks: vec![sample_block()],
        };
        let status = render_response(&resp, Lang::English);
        assert_eq!(status.state, StatusState::Active);
        assert_eq!(status.title, "🦉 $15.58");
        assert_eq!(status.lines.len(), 8);
    }

    #[test]
    fn test_degraded_statuses_localized() {
        assert_eq!(error_status(Lang::English).title, "🦉 Error");
        assert_eq!(error_status(Lang::Japanese).title, "🦉 エラー");
        assert_eq!(
            error_status(Lang::English).lines,
            lines(&["❌ Failed to fetch data"])
        );
        assert_eq!(no_data_status(Lang::Japanese).title, "🦉 データなし");
        assert_eq!(loading_status(Lang::English).title, "🦉 Loading...");
    }

    #[test]
    fn test_menu_slots_apply() {
        let mut menu = MenuSlots::new(4);
        assert!(menu.apply(&lines(&["a", "", "c"])));
        assert_eq!(menu.visible().collect::<Vec<_>>(), vec!["a", "c"]);
        assert!(!menu.slots()[1].visible);
        assert!(!menu.slots()[3].visible);

        // same content again: nothing to do
        assert!(!menu.apply(&lines(&["a", "", "c"])));

        // shorter sequence hides the tail
        assert!(menu.apply(&lines(&["x"])));
        assert_eq!(menu.visible().collect::<Vec<_>>(), vec!["x"]);

        // overflow is dropped
        menu.apply(&lines(&["1", "2", "3", "4", "5"]));
        assert_eq!(menu.visible().count(), 4);
    }

    #[test]
    fn test_terminal_sink_writes_only_on_change() {
        let mut sink = TerminalSink::new(Vec::new()).plain(true);
        let status = error_status(Lang::English);
        update_display(&mut sink, &status).unwrap();
        update_display(&mut sink, &status).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "🦉 Error\n  ❌ Failed to fetch data\n\n");
    }

    #[test]
    fn test_json_sink_shape() {
        let mut sink = JsonSink::new(Vec::new());
        let resp = BlocksResponse {
            blocks: vec![sample_block()],
        };
        update_display(&mut sink, &render_response(&resp, Lang::English)).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out.lines().count(), 1);

        let v: serde_json::Value = serde_json::from_str(out.trim()).unwrap();
        assert_eq!(v["text"], "🦉 $15.58");
        assert_eq!(v["class"], "active");
        // separators are hidden
        assert_eq!(v["lines"].as_array().unwrap().len(), 6);
        assert!(v["tooltip"].as_str().unwrap().contains("Tokens Used: 38.1k"));
    }
}
