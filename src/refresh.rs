//! # Refresh Module
//!
//! Drives fetch → render → display on a fixed period until shut down.
//!
//! A single task owns both the source and the sink, so ticks never overlap:
//! a slow `ccusage` delays the next tick instead of running concurrently
//! with it.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::display::{
    DisplaySink, RenderedStatus, StatusState, error_status, loading_status, render_response,
    update_display,
};
use crate::locale::Lang;
use crate::usage::UsageSource;

/// Where the loop is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Fetching,
    Rendering,
    DegradedNoActive,
    DegradedError,
}

impl RefreshState {
    fn after(status: &RenderedStatus) -> Self {
        match status.state {
            StatusState::Active => RefreshState::Rendering,
            StatusState::NoData | StatusState::Inactive => RefreshState::DegradedNoActive,
            StatusState::Error => RefreshState::DegradedError,
            StatusState::Loading => RefreshState::Idle,
        }
    }
}

pub struct RefreshLoop<S, D> {
    source: S,
    sink: D,
    lang: Lang,
    period: Duration,
    state: RefreshState,
    ticks: u64,
}

impl<S: UsageSource, D: DisplaySink> RefreshLoop<S, D> {
    pub fn new(source: S, sink: D, lang: Lang, period: Duration) -> Self {
        Self {
            source,
            sink,
            lang,
            period,
            state: RefreshState::Idle,
            ticks: 0,
        }
    }

    pub fn state(&self) -> RefreshState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    pub fn into_sink(self) -> D {
        self.sink
    }

    /// Build the next frame. Never fails: a fetch error becomes the error frame.
    pub async fn poll(&mut self) -> RenderedStatus {
        self.state = RefreshState::Fetching;
        match self.source.fetch().await {
            Ok(resp) => {
                debug!(blocks = resp.blocks.len(), "usage fetched");
                render_response(&resp, self.lang)
            }
            Err(err) => {
                warn!(error = %err, "Error getting usage data");
                error_status(self.lang)
            }
        }
    }

    /// Run one complete fetch → render → display cycle.
    ///
    /// Only sink failures are returned.
    pub async fn tick(&mut self) -> Result<RefreshState> {
        let status = self.poll().await;
        let next = RefreshState::after(&status);
        self.state = next;
        update_display(&mut self.sink, &status)?;
        self.ticks += 1;
        debug!(tick = self.ticks, state = ?next, title = %status.title, "display updated");
        Ok(next)
    }

    /// Show the loading frame, refresh immediately, then every `period` until
    /// `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Shutdown is checked only between ticks; an in-flight fetch completes
    /// and is displayed before the loop notices.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        if *shutdown.borrow() {
            return Ok(());
        }
        update_display(&mut self.sink, &loading_status(self.lang))?;

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(period_secs = self.period.as_secs_f64(), "refresh loop started");

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.tick().await?;
                }
            }
        }

        self.state = RefreshState::Idle;
        info!(ticks = self.ticks, "refresh loop stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlocksResponse};
    use crate::usage::FetchError;
    use std::sync::{Arc, Mutex};

    struct Fixed(Result<BlocksResponse, ()>);

    impl UsageSource for Fixed {
        async fn fetch(&self) -> Result<BlocksResponse, FetchError> {
            match &self.0 {
                Ok(resp) => Ok(resp.clone()),
                Err(()) => Err(crate::usage::parse_blocks(b"oops").unwrap_err()),
            }
        }
    }

    #[derive(Default, Clone)]
    struct Recorder(Arc<Mutex<Vec<(String, StatusState, Vec<String>)>>>);

    impl DisplaySink for Recorder {
        fn set_title(&mut self, title: &str, state: StatusState) {
            self.0
                .lock()
                .unwrap()
                .push((title.to_string(), state, Vec::new()));
        }

        fn set_lines(&mut self, lines: &[String]) {
            if let Some(last) = self.0.lock().unwrap().last_mut() {
                last.2 = lines.to_vec();
            }
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn active_response() -> BlocksResponse {
        BlocksResponse {
            blocks: vec![Block {
                is_active: true,
                cost_usd: 1.5,
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn test_tick_states() {
        let cases = [
            (Ok(active_response()), RefreshState::Rendering),
            (Ok(BlocksResponse::default()), RefreshState::DegradedNoActive),
            (Err(()), RefreshState::DegradedError),
        ];
        for (resp, expected) in cases {
            let mut lp = RefreshLoop::new(
                Fixed(resp),
                Recorder::default(),
                Lang::English,
                Duration::from_secs(5),
            );
            assert_eq!(lp.state(), RefreshState::Idle);
            assert_eq!(lp.tick().await.unwrap(), expected);
            assert_eq!(lp.state(), expected);
            assert_eq!(lp.ticks(), 1);
        }
    }

    #[tokio::test]
    async fn test_error_tick_renders_error_frame() {
        let rec = Recorder::default();
        let mut lp = RefreshLoop::new(
            Fixed(Err(())),
            rec.clone(),
            Lang::English,
            Duration::from_secs(5),
        );
        lp.tick().await.unwrap();

        let frames = rec.0.lock().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].0, "🦉 Error");
        assert_eq!(frames[0].1, StatusState::Error);
        assert_eq!(frames[0].2, vec!["❌ Failed to fetch data".to_string()]);
    }

    struct Broken;

    impl DisplaySink for Broken {
        fn set_title(&mut self, _title: &str, _state: StatusState) {}

        fn set_lines(&mut self, _lines: &[String]) {}

        fn flush(&mut self) -> Result<()> {
            anyhow::bail!("broken pipe")
        }
    }

    #[tokio::test]
    async fn test_sink_failure_keeps_rendered_state() {
        let mut lp = RefreshLoop::new(
            Fixed(Ok(active_response())),
            Broken,
            Lang::English,
            Duration::from_secs(5),
        );
        assert!(lp.tick().await.is_err());
        assert_eq!(lp.state(), RefreshState::Rendering);
        assert_eq!(lp.ticks(), 0);

        let mut lp = RefreshLoop::new(
            Fixed(Err(())),
            Broken,
            Lang::English,
            Duration::from_secs(5),
        );
        assert!(lp.tick().await.is_err());
        assert_eq!(lp.state(), RefreshState::DegradedError);
    }

    #[tokio::test]
    async fn test_run_stops_when_already_cancelled() {
        let rec = Recorder::default();
        let (_tx, rx) = watch::channel(true);
        let mut lp = RefreshLoop::new(
            Fixed(Ok(active_response())),
            rec.clone(),
            Lang::English,
            Duration::from_secs(5),
        );
        lp.run(rx).await.unwrap();
        assert!(rec.0.lock().unwrap().is_empty());
        assert_eq!(lp.ticks(), 0);
    }
}
