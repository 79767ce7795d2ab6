//! Draft auto-save for long forms.
//!
//! SYSTEM CONTEXT
//! ==============
//! Multi-step forms keep an in-progress draft in local storage so a reload
//! or crash loses at most one save interval of typing. The draft is a flat
//! JSON object keyed by field name.
//!
//! DESIGN
//! ======
//! `DraftAutoSave` is a cheap clonable handle over shared state. `start()`
//! spawns a Tokio interval task that persists the current data; the returned
//! `AutoSaveHandle` stops it on drop. The task holds only a weak reference
//! to the draft, so it also exits once every handle to the draft is gone.
//!
//! ERROR HANDLING
//! ==============
//! Storage failures are logged and swallowed. In-memory data is never
//! rolled back because a write failed.
//!
//! TRADE-OFFS
//! ==========
//! `has_draft()` is computed once at load and then only changes through
//! `save()`/`clear()`. Another writer touching the same key is not observed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::{env_bool, env_parse};
use crate::storage::{SharedStorage, Storage};

pub type FormDraft = Map<String, Value>;

const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DraftOptions {
    pub interval: Duration,
    pub enabled: bool,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self { interval: Duration::from_millis(DEFAULT_AUTOSAVE_INTERVAL_MS), enabled: true }
    }
}

impl DraftOptions {
    /// Optional:
    /// - `TALENTBASE_DRAFT_AUTOSAVE`: boolean, default on
    /// - `TALENTBASE_DRAFT_AUTOSAVE_MS`: interval, default 30000
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_millis(env_parse("TALENTBASE_DRAFT_AUTOSAVE_MS", DEFAULT_AUTOSAVE_INTERVAL_MS)),
            enabled: env_bool("TALENTBASE_DRAFT_AUTOSAVE").unwrap_or(true),
        }
    }
}

#[derive(Debug)]
struct DraftState {
    data: FormDraft,
    has_draft: bool,
    options: DraftOptions,
}

#[derive(Debug, Default)]
struct TaskSlot {
    started: bool,
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    fn abort(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[derive(Clone)]
pub struct DraftAutoSave {
    storage: SharedStorage,
    key: Arc<str>,
    state: Arc<Mutex<DraftState>>,
    task: Arc<Mutex<TaskSlot>>,
}

impl std::fmt::Debug for DraftAutoSave {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftAutoSave").field("key", &self.key).finish_non_exhaustive()
    }
}

impl DraftAutoSave {
    /// Load the stored draft for `key`, falling back to `initial_data` when
    /// nothing usable is stored.
    pub fn new(storage: SharedStorage, key: impl Into<String>, initial_data: FormDraft, options: DraftOptions) -> Self {
        let key: Arc<str> = Arc::from(key.into());
        let (data, has_draft) = load_draft(storage.as_ref(), &key, initial_data);
        Self {
            storage,
            key,
            state: Arc::new(Mutex::new(DraftState { data, has_draft, options })),
            task: Arc::new(Mutex::new(TaskSlot::default())),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn data(&self) -> FormDraft {
        self.state().data.clone()
    }

    /// Typed read of one field.
    #[must_use]
    pub fn get<T: DeserializeOwned>(&self, field: &str) -> Option<T> {
        let value = self.state().data.get(field).cloned()?;
        serde_json::from_value(value).ok()
    }

    /// Shallow merge: keys in `partial` overwrite, others are kept.
    pub fn update(&self, partial: FormDraft) {
        let mut state = self.state();
        for (field, value) in partial {
            state.data.insert(field, value);
        }
    }

    /// # Errors
    ///
    /// Returns the encoding error if `value` cannot become JSON.
    pub fn update_field<T: Serialize>(&self, field: &str, value: T) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(value)?;
        self.state().data.insert(field.to_owned(), value);
        Ok(())
    }

    /// Replace the whole draft.
    pub fn set(&self, data: FormDraft) {
        self.state().data = data;
    }

    /// Persist now. Returns whether the draft was written.
    pub fn save(&self) -> bool {
        persist(self.storage.as_ref(), &self.key, &self.state)
    }

    /// Remove the stored draft. In-memory data is kept.
    pub fn clear(&self) {
        match self.storage.remove_item(&self.key) {
            Ok(()) => {
                self.state().has_draft = false;
                debug!(key = %self.key, "draft cleared");
            }
            Err(e) => error!(key = %self.key, error = %e, "failed to clear draft"),
        }
    }

    #[must_use]
    pub fn has_draft(&self) -> bool {
        self.state().has_draft
    }

    #[must_use]
    pub fn options(&self) -> DraftOptions {
        self.state().options
    }

    /// Start periodic persistence. Dropping the handle stops it.
    #[must_use = "auto-save stops when the handle is dropped"]
    pub fn start(&self) -> AutoSaveHandle {
        self.slot().started = true;
        self.arm();
        AutoSaveHandle { task: Arc::clone(&self.task) }
    }

    /// Change settings; a running auto-save is re-armed with them.
    pub fn configure(&self, enabled: bool, interval: Duration) {
        self.state().options = DraftOptions { interval, enabled };
        if self.slot().started {
            self.arm();
        }
    }

    #[must_use]
    pub fn is_auto_saving(&self) -> bool {
        self.slot().handle.is_some()
    }

    fn arm(&self) {
        let options = self.options();
        let mut slot = self.slot();
        slot.abort();
        if !options.enabled || options.interval.is_zero() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %self.key, "no tokio runtime; draft auto-save not started");
            return;
        };

        let storage = Arc::clone(&self.storage);
        let key = Arc::clone(&self.key);
        let state = Arc::downgrade(&self.state);
        let interval = options.interval;
        info!(key = %key, ?interval, "draft auto-save started");
        slot.handle = Some(runtime.spawn(autosave_loop(storage, key, state, interval)));
    }

    fn state(&self) -> MutexGuard<'_, DraftState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self) -> MutexGuard<'_, TaskSlot> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stops the auto-save task on drop.
#[derive(Debug)]
pub struct AutoSaveHandle {
    task: Arc<Mutex<TaskSlot>>,
}

impl AutoSaveHandle {
    pub fn stop(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        slot.started = false;
        slot.abort();
    }
}

impl Drop for AutoSaveHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn autosave_loop(storage: SharedStorage, key: Arc<str>, state: Weak<Mutex<DraftState>>, interval: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(state) = state.upgrade() else {
            debug!(key = %key, "draft dropped; auto-save exiting");
            return;
        };
        persist(storage.as_ref(), &key, &state);
    }
}

fn persist(storage: &dyn Storage, key: &str, state: &Mutex<DraftState>) -> bool {
    let data = {
        let state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.options.enabled {
            return false;
        }
        state.data.clone()
    };
    let raw = match serde_json::to_string(&data) {
        Ok(raw) => raw,
        Err(e) => {
            error!(key, error = %e, "failed to encode draft");
            return false;
        }
    };
    match storage.set_item(key, &raw) {
        Ok(()) => {
            state.lock().unwrap_or_else(PoisonError::into_inner).has_draft = true;
            debug!(key, bytes = raw.len(), "draft saved");
            true
        }
        Err(e) => {
            error!(key, error = %e, "failed to save draft");
            false
        }
    }
}

/// Stored draft if it is a JSON object, otherwise `initial_data` unchanged.
/// The flag reports whether anything was stored under the key at all.
fn load_draft(storage: &dyn Storage, key: &str, initial_data: FormDraft) -> (FormDraft, bool) {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (initial_data, false),
        Err(e) => {
            error!(key, error = %e, "failed to read draft");
            return (initial_data, false);
        }
    };
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(data)) => (data, true),
        Ok(_) => {
            warn!(key, "stored draft is not an object; using initial data");
            (initial_data, true)
        }
        Err(e) => {
            error!(key, error = %e, "failed to parse draft; using initial data");
            (initial_data, true)
        }
    }
}

#[cfg(test)]
#[path = "draft_test.rs"]
mod tests;
