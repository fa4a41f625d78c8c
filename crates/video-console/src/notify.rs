//! Transient user notifications and confirmation prompts.

use std::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// Follow-up the user can take from a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    ViewQuiz,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            action: None,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            ..Self::info(message)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            ..Self::info(message)
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Sink for user-facing notifications
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Asks the user to approve a destructive operation
pub trait Confirmer: Send + Sync {
    fn confirm(&self, title: &str, message: &str) -> bool;
}

/// Prints notifications to stdout and mirrors them into the log
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let marker = match notification.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => " ok ",
            NotificationLevel::Error => "fail",
        };

        match notification.level {
            NotificationLevel::Error => error!(message = %notification.message, "Notification"),
            _ => info!(message = %notification.message, "Notification"),
        }

        match notification.action {
            Some(NotificationAction::ViewQuiz) => {
                println!("[{}] {} (run `quiz` to take it)", marker, notification.message)
            }
            None => println!("[{}] {}", marker, notification.message),
        }
    }
}

/// Keeps every notification in memory, in emission order
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything received so far
    pub fn snapshot(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|list| list.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut list) = self.notifications.lock() {
            list.push(notification);
        }
    }
}

/// Answers every prompt the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmer for FixedAnswer {
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        self.0
    }
}
