use chrono::{DateTime, Local};
use ratatui::widgets::ListState;

use crate::session::{TerminationReason, WorkerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Info,
    Item,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub kind: LineKind,
    pub text: String,
    /// Set for item lines, so the selection can be opened in a browser.
    pub url: Option<String>,
}

/// UI state: the scrolling activity log plus selection.
///
/// The log follows the tail until the user scrolls up; `G` re-enables
/// following.
pub struct TuiApp {
    pub lines: Vec<LogLine>,
    pub list_state: ListState,
    pub follow: bool,
    pub should_quit: bool,
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            list_state: ListState::default(),
            follow: true,
            should_quit: false,
        }
    }

    pub fn push_event(&mut self, event: WorkerEvent) {
        match event {
            WorkerEvent::Started { channels } => {
                self.push(
                    LineKind::Info,
                    format!("Connected. Monitoring r/{}.", channels.join(", r/")),
                    None,
                );
            }
            WorkerEvent::Item(item) => {
                let text = format!(
                    "New {} in r/{}: {}",
                    item.kind_label(),
                    item.channel(),
                    item.summary()
                );
                let url = item.url();
                self.push(LineKind::Item, text, Some(url));
            }
            WorkerEvent::Reconnecting { delay } => {
                self.push(
                    LineKind::Warning,
                    format!(
                        "Connection lost. Reconnecting in {} seconds...",
                        delay.as_secs()
                    ),
                    None,
                );
            }
            WorkerEvent::Terminated(reason) => {
                let kind = match reason {
                    TerminationReason::Stopped => LineKind::Info,
                    TerminationReason::Fatal(_) | TerminationReason::Unexpected => LineKind::Error,
                };
                self.push(kind, reason.to_string(), None);
            }
        }
    }

    pub fn push_info(&mut self, text: String) {
        self.push(LineKind::Info, text, None);
    }

    pub fn push_error(&mut self, text: String) {
        self.push(LineKind::Error, text, None);
    }

    fn push(&mut self, kind: LineKind, text: String, url: Option<String>) {
        self.lines.push(LogLine {
            timestamp: Local::now(),
            kind,
            text,
            url,
        });
        if self.follow {
            self.list_state.select(Some(self.lines.len() - 1));
        }
    }

    pub fn move_up(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        self.follow = false;
        let selected = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(selected.saturating_sub(1)));
    }

    pub fn move_down(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        let last = self.lines.len() - 1;
        let selected = self.list_state.selected().unwrap_or(last);
        let next = (selected + 1).min(last);
        self.list_state.select(Some(next));
        // Reaching the tail resumes following.
        self.follow = next == last;
    }

    pub fn follow_tail(&mut self) {
        self.follow = true;
        if !self.lines.is_empty() {
            self.list_state.select(Some(self.lines.len() - 1));
        }
    }

    pub fn selected_url(&self) -> Option<String> {
        let selected = self.list_state.selected()?;
        self.lines.get(selected)?.url.clone()
    }
}
