//! User-facing notifications.
//!
//! The tracker only decides whether a notification is due and which one.
//! Delivery is delegated to a [`Notifier`] supplied by the host.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// Notifications the tracker can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// An antique lamp was obtained.
    AntiqueLampFound,
    /// The session counters were reset.
    TrackerReset,
}

impl Notification {
    /// The chat message text.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Notification::AntiqueLampFound => "You found an antique lamp!",
            Notification::TrackerReset => "Specimen cleaning tracker reset.",
        }
    }

    /// Whether the host should render the message in its highlight colour.
    #[must_use]
    pub fn is_highlighted(self) -> bool {
        matches!(self, Notification::AntiqueLampFound)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Delivery channel for notifications.
pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn notify(&mut self, notification: Notification) {
        (**self).notify(notification);
    }
}

impl Notifier for mpsc::UnboundedSender<Notification> {
    fn notify(&mut self, notification: Notification) {
        if self.send(notification).is_err() {
            warn!(%notification, "Notification receiver dropped");
        }
    }
}

/// A shared, clonable notification buffer.
///
/// One clone is handed to the plugin, another is kept by the host to read
/// what was emitted.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl NotificationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&mut self, notification: Notification) {
        self.entries.borrow_mut().push(notification);
    }
}
