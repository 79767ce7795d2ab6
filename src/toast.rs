//! Ephemeral notification queue.
//!
//! SYSTEM CONTEXT
//! ==============
//! Views push short messages (save succeeded, request failed) and render the
//! queue newest-first. Each entry animates in, stays for a variant-dependent
//! duration, animates out, then leaves the queue.
//!
//! DESIGN
//! ======
//! Every entry owns at most one Tokio task that walks it through its phases.
//! The task holds a weak reference to the queue and is aborted whenever the
//! entry leaves early (eviction, `remove`, `dismiss`) or the queue itself is
//! dropped, so no timer ever touches an entry that is gone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::env_parse;

const DEFAULT_MAX_TOASTS: usize = 5;

/// Delay before the enter transition so the hidden style applies first.
pub const ENTER_DELAY: Duration = Duration::from_millis(10);
/// Exit transition length; removal waits this long after dismissal.
pub const EXIT_ANIMATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastVariant {
    Success,
    Error,
    Info,
    Warning,
}

impl ToastVariant {
    #[must_use]
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::from_millis(5000),
            Self::Error | Self::Warning => Duration::from_millis(7000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Entering,
    Visible,
    Exiting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastConfig {
    pub variant: ToastVariant,
    pub title: Option<String>,
    pub message: String,
    /// `None` uses the variant default; zero never auto-dismisses.
    pub duration: Option<Duration>,
}

impl ToastConfig {
    #[must_use]
    pub fn new(variant: ToastVariant, message: impl Into<String>) -> Self {
        Self { variant, title: None, message: message.into(), duration: None }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToastEntry {
    pub id: String,
    pub variant: ToastVariant,
    pub title: Option<String>,
    pub message: String,
    pub duration: Duration,
    pub phase: ToastPhase,
}

struct ToastSlot {
    entry: ToastEntry,
    timer: Option<JoinHandle<()>>,
}

impl ToastSlot {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct QueueInner {
    slots: Vec<ToastSlot>,
    max: usize,
}

impl QueueInner {
    fn position(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.entry.id == id)
    }

    fn set_phase(&mut self, id: &str, phase: ToastPhase) -> bool {
        match self.slots.iter_mut().find(|slot| slot.entry.id == id) {
            Some(slot) => {
                slot.entry.phase = phase;
                true
            }
            None => false,
        }
    }
}

impl Drop for QueueInner {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            slot.cancel_timer();
        }
    }
}

#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOASTS)
    }
}

impl ToastQueue {
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn new(max_toasts: usize) -> Self {
        Self { inner: Arc::new(Mutex::new(QueueInner { slots: Vec::new(), max: max_toasts.max(1) })) }
    }

    /// Optional:
    /// - `TALENTBASE_MAX_TOASTS`: queue cap, default 5
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(env_parse("TALENTBASE_MAX_TOASTS", DEFAULT_MAX_TOASTS))
    }

    #[must_use]
    pub fn max_toasts(&self) -> usize {
        self.lock().max
    }

    /// Prepends a new entry, evicting the oldest beyond the cap, and returns
    /// its id.
    pub fn add_toast(&self, config: ToastConfig) -> String {
        let id = format!("toast-{}", Uuid::new_v4());
        let duration = config.duration.unwrap_or_else(|| config.variant.default_duration());
        let entry = ToastEntry {
            id: id.clone(),
            variant: config.variant,
            title: config.title,
            message: config.message,
            duration,
            phase: ToastPhase::Entering,
        };

        let timer = self.spawn(toast_lifecycle(Arc::downgrade(&self.inner), id.clone(), duration));

        let mut inner = self.lock();
        inner.slots.insert(0, ToastSlot { entry, timer });
        let max = inner.max;
        if inner.slots.len() > max {
            for mut evicted in inner.slots.drain(max..) {
                debug!(id = %evicted.entry.id, "toast evicted");
                evicted.cancel_timer();
            }
        }
        id
    }

    pub fn success(&self, message: impl Into<String>, title: Option<&str>, duration: Option<Duration>) -> String {
        self.add_variant(ToastVariant::Success, message.into(), title, duration)
    }

    pub fn error(&self, message: impl Into<String>, title: Option<&str>, duration: Option<Duration>) -> String {
        self.add_variant(ToastVariant::Error, message.into(), title, duration)
    }

    pub fn info(&self, message: impl Into<String>, title: Option<&str>, duration: Option<Duration>) -> String {
        self.add_variant(ToastVariant::Info, message.into(), title, duration)
    }

    pub fn warning(&self, message: impl Into<String>, title: Option<&str>, duration: Option<Duration>) -> String {
        self.add_variant(ToastVariant::Warning, message.into(), title, duration)
    }

    fn add_variant(
        &self,
        variant: ToastVariant,
        message: String,
        title: Option<&str>,
        duration: Option<Duration>,
    ) -> String {
        self.add_toast(ToastConfig { variant, title: title.map(str::to_owned), message, duration })
    }

    /// Starts the exit transition; the entry is removed once it finishes.
    /// Returns false for unknown or already-exiting ids.
    pub fn dismiss(&self, id: &str) -> bool {
        {
            let mut inner = self.lock();
            let Some(slot) = inner.slots.iter_mut().find(|slot| slot.entry.id == id) else {
                return false;
            };
            if slot.entry.phase == ToastPhase::Exiting {
                return false;
            }
            slot.cancel_timer();
            slot.entry.phase = ToastPhase::Exiting;
        }

        let timer = self.spawn(remove_after_exit(Arc::downgrade(&self.inner), id.to_owned()));
        let mut inner = self.lock();
        match timer {
            Some(timer) => {
                if let Some(slot) = inner.slots.iter_mut().find(|slot| slot.entry.id == id) {
                    slot.timer = Some(timer);
                } else {
                    timer.abort();
                }
            }
            None => {
                if let Some(index) = inner.position(id) {
                    inner.slots.remove(index);
                }
            }
        }
        true
    }

    /// Drops the entry immediately, skipping the exit transition.
    pub fn remove(&self, id: &str) -> bool {
        let mut inner = self.lock();
        let Some(index) = inner.position(id) else {
            return false;
        };
        let mut slot = inner.slots.remove(index);
        slot.cancel_timer();
        true
    }

    /// Newest first.
    #[must_use]
    pub fn toasts(&self) -> Vec<ToastEntry> {
        self.lock().slots.iter().map(|slot| slot.entry.clone()).collect()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<ToastEntry> {
        self.lock().slots.iter().find(|slot| slot.entry.id == id).map(|slot| slot.entry.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    fn spawn<F>(&self, task: F) -> Option<JoinHandle<()>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            Some(runtime.spawn(task))
        } else {
            warn!("no tokio runtime; toast timers disabled");
            None
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn with_queue(queue: &Weak<Mutex<QueueInner>>, f: impl FnOnce(&mut QueueInner) -> bool) -> bool {
    let Some(inner) = queue.upgrade() else {
        return false;
    };
    let mut guard = inner.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}

/// Enter, wait out the duration, exit, remove. The dismiss clock starts at
/// mount, like the enter delay.
async fn toast_lifecycle(queue: Weak<Mutex<QueueInner>>, id: String, duration: Duration) {
    tokio::time::sleep(ENTER_DELAY).await;
    if !with_queue(&queue, |inner| inner.set_phase(&id, ToastPhase::Visible)) {
        return;
    }
    if duration.is_zero() {
        return;
    }
    tokio::time::sleep(duration.saturating_sub(ENTER_DELAY)).await;
    if !with_queue(&queue, |inner| inner.set_phase(&id, ToastPhase::Exiting)) {
        return;
    }
    remove_after_exit(queue, id).await;
}

async fn remove_after_exit(queue: Weak<Mutex<QueueInner>>, id: String) {
    tokio::time::sleep(EXIT_ANIMATION).await;
    with_queue(&queue, |inner| {
        let Some(index) = inner.position(&id) else {
            return false;
        };
        // The slot's timer is this task; dropping the handle detaches it.
        inner.slots.remove(index);
        debug!(id = %id, "toast removed");
        true
    });
}

#[cfg(test)]
#[path = "toast_test.rs"]
mod tests;
