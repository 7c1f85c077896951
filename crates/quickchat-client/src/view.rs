//! Headless presenter that records the rendered state.
//!
//! [`ChatView`] is what a UI layer would draw from; [`SharedView`] lets the
//! connection task write it while another task reads snapshots.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::presenter::{ConnectionStatus, LogLevel, Presenter, RenderedMessage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub level: LogLevel,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatView {
    messages: Vec<RenderedMessage>,
    placeholder: Option<String>,
    username_field: String,
    message_input: String,
    log: Vec<LogLine>,
    status: ConnectionStatus,
    /// Index of the last message scrolled into view
    scrolled_to: Option<usize>,
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            placeholder: None,
            username_field: String::new(),
            message_input: String::new(),
            log: Vec::new(),
            status: ConnectionStatus::Disconnected,
            scrolled_to: None,
        }
    }
}

impl ChatView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[RenderedMessage] {
        &self.messages
    }

    pub fn message_texts(&self) -> Vec<&str> {
        self.messages.iter().map(|m| m.text.as_str()).collect()
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.placeholder.as_deref()
    }

    pub fn username_field(&self) -> &str {
        &self.username_field
    }

    pub fn message_input(&self) -> &str {
        &self.message_input
    }

    /// Simulate the user typing into the message box.
    pub fn type_message(&mut self, text: &str) {
        self.message_input = text.to_string();
    }

    /// Simulate the user typing into the username box.
    pub fn type_username(&mut self, text: &str) {
        self.username_field = text.to_string();
    }

    pub fn log_lines(&self) -> &[LogLine] {
        &self.log
    }

    pub fn errors(&self) -> Vec<&str> {
        self.log
            .iter()
            .filter(|l| l.level == LogLevel::Error)
            .map(|l| l.text.as_str())
            .collect()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Whether the newest message is scrolled into view.
    pub fn is_scrolled_to_bottom(&self) -> bool {
        match self.scrolled_to {
            Some(idx) => idx + 1 == self.messages.len(),
            None => self.messages.is_empty(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Presenter for ChatView {
    fn clear_messages(&mut self) {
        self.messages.clear();
        self.placeholder = None;
        self.scrolled_to = None;
    }

    fn render_message(&mut self, message: RenderedMessage) {
        self.placeholder = None;
        self.messages.push(message);
    }

    fn show_placeholder(&mut self, text: &str) {
        self.messages.clear();
        self.scrolled_to = None;
        self.placeholder = Some(text.to_string());
    }

    fn scroll_to_bottom(&mut self) {
        self.scrolled_to = self.messages.len().checked_sub(1);
    }

    fn set_username_field(&mut self, value: &str) {
        self.username_field = value.to_string();
    }

    fn clear_message_input(&mut self) {
        self.message_input.clear();
    }

    fn log(&mut self, level: LogLevel, line: String) {
        self.log.push(LogLine { level, text: line });
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status = status;
    }
}

/// A [`ChatView`] behind a mutex, writable from the connection task and
/// readable from anywhere.
#[derive(Debug, Clone, Default)]
pub struct SharedView {
    inner: Arc<Mutex<ChatView>>,
}

impl SharedView {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ChatView> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ChatView {
        self.lock().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut ChatView) -> R) -> R {
        f(&mut self.lock())
    }
}

impl Presenter for SharedView {
    fn clear_messages(&mut self) {
        self.lock().clear_messages();
    }

    fn render_message(&mut self, message: RenderedMessage) {
        self.lock().render_message(message);
    }

    fn show_placeholder(&mut self, text: &str) {
        self.lock().show_placeholder(text);
    }

    fn scroll_to_bottom(&mut self) {
        self.lock().scroll_to_bottom();
    }

    fn set_username_field(&mut self, value: &str) {
        self.lock().set_username_field(value);
    }

    fn clear_message_input(&mut self) {
        self.lock().clear_message_input();
    }

    fn log(&mut self, level: LogLevel, line: String) {
        Presenter::log(&mut *self.lock(), level, line);
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.lock().set_status(status);
    }
}
