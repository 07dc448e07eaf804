//! Name Suggester - debounced party name lookup per input field
//!
//! Each field key owns at most one scheduled lookup. A keystroke aborts the
//! scheduled lookup of its field and schedules a new one after the quiet
//! period. Once the timer fires the lookup can no longer be aborted; if the
//! field has moved on by the time it returns, the result is dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use triplog_domain::EntityRepository;

/// Which end of a route a field edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    From,
    To,
}

/// Identifies one input field: a route pair and its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub pair_id: u32,
    pub direction: Direction,
}

impl FieldKey {
    pub fn new(pair_id: u32, direction: Direction) -> Self {
        Self { pair_id, direction }
    }

    pub fn from_end(pair_id: u32) -> Self {
        Self::new(pair_id, Direction::From)
    }

    pub fn to_end(pair_id: u32) -> Self {
        Self::new(pair_id, Direction::To)
    }
}

impl std::fmt::Display for FieldKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let end = match self.direction {
            Direction::From => "from",
            Direction::To => "to",
        };
        write!(f, "{}-{}", self.pair_id, end)
    }
}

struct FieldState {
    value: String,
    generation: u64,
    timer: Option<AbortHandle>,
    suggestions: watch::Sender<Vec<String>>,
}

impl FieldState {
    fn new() -> Self {
        let (suggestions, _) = watch::channel(Vec::new());
        Self {
            value: String::new(),
            generation: 0,
            timer: None,
            suggestions,
        }
    }

    /// Supersede whatever is scheduled or in flight
    fn supersede(&mut self) -> u64 {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation
    }
}

struct Inner<R> {
    repo: R,
    delay: Duration,
    limit: usize,
    fields: Mutex<HashMap<FieldKey, FieldState>>,
}

impl<R: EntityRepository + 'static> Inner<R> {
    fn lock(&self) -> MutexGuard<'_, HashMap<FieldKey, FieldState>> {
        self.fields.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn lookup(self: Arc<Self>, key: FieldKey, generation: u64, prefix: String) {
        tokio::time::sleep(self.delay).await;

        {
            let mut fields = self.lock();
            match fields.get_mut(&key) {
                // From here on the lookup is in flight and runs to completion
                Some(state) if state.generation == generation => state.timer = None,
                _ => return,
            }
        }

        debug!(field = %key, prefix = %prefix, "looking up party names");
        let names: Vec<String> = match self.repo.search_parties(&prefix, self.limit).await {
            Ok(parties) => parties.into_iter().map(|p| p.name).collect(),
            Err(e) => {
                warn!(field = %key, error = %e, "party name lookup failed");
                Vec::new()
            }
        };

        let fields = self.lock();
        match fields.get(&key) {
            Some(state) if state.generation == generation => {
                state.suggestions.send_replace(names);
            }
            _ => debug!(field = %key, prefix = %prefix, "discarding stale suggestions"),
        }
    }
}

/// Debounced party name suggestions, independent per field key
///
/// Must be used from within a tokio runtime. Pending lookups are aborted
/// when the suggester is dropped.
pub struct NameSuggester<R> {
    inner: Arc<Inner<R>>,
}

impl<R: EntityRepository + 'static> NameSuggester<R> {
    pub fn new(repo: R, delay: Duration, limit: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                repo,
                delay,
                limit,
                fields: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Handle an edit of a field's text
    pub fn on_text_changed(&self, key: FieldKey, text: &str) {
        let mut fields = self.inner.lock();
        let state = fields.entry(key).or_insert_with(FieldState::new);

        let prefix = text.trim();
        if prefix == state.value.trim() {
            state.value = text.to_string();
            return;
        }
        state.value = text.to_string();
        let generation = state.supersede();

        if prefix.is_empty() {
            state.suggestions.send_replace(Vec::new());
            return;
        }

        let task = tokio::spawn(Arc::clone(&self.inner).lookup(key, generation, prefix.to_string()));
        state.timer = Some(task.abort_handle());
    }

    /// Accept a suggestion: sets the field value and clears its list without a lookup
    pub fn select(&self, key: FieldKey, name: &str) -> String {
        let mut fields = self.inner.lock();
        let state = fields.entry(key).or_insert_with(FieldState::new);
        state.supersede();
        state.value = name.to_string();
        state.suggestions.send_replace(Vec::new());
        state.value.clone()
    }

    /// Current suggestions of a field
    pub fn suggestions(&self, key: FieldKey) -> Vec<String> {
        self.inner
            .lock()
            .get(&key)
            .map(|state| state.suggestions.borrow().clone())
            .unwrap_or_default()
    }

    /// Current text of a field
    pub fn value(&self, key: FieldKey) -> Option<String> {
        self.inner.lock().get(&key).map(|state| state.value.clone())
    }

    /// Receive every replacement of a field's suggestion list
    pub fn subscribe(&self, key: FieldKey) -> watch::Receiver<Vec<String>> {
        let mut fields = self.inner.lock();
        fields
            .entry(key)
            .or_insert_with(FieldState::new)
            .suggestions
            .subscribe()
    }

    /// Drop a field (its input was removed), aborting any pending lookup
    pub fn forget(&self, key: FieldKey) {
        if let Some(mut state) = self.inner.lock().remove(&key) {
            state.supersede();
        }
    }
}

impl<R> Drop for NameSuggester<R> {
    fn drop(&mut self) {
        let mut fields = self.inner.fields.lock().unwrap_or_else(PoisonError::into_inner);
        for state in fields.values_mut() {
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
        }
    }
}
