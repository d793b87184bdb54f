//! Generic change tracking for form-backed records.
//!
//! The console auto-fills `estado`/`municipio`/`ciudad` (and the transient
//! `colonias` candidate list) from the postal lookup. Those fills must never
//! count as user edits: a record whose only divergence from its loaded
//! snapshot is lookup-derived data is "unchanged" and its save is skipped.
//!
//! [`ChangeTracker`] holds the live record next to a pristine snapshot and
//! diffs the two after stripping the auto-populated keys from both sides.

use serde::Serialize;
use serde_json::Value;

/// Keys written by the postal lookup rather than by the user.
pub const CAMPOS_AUTOCOMPLETADOS: &[&str] = &["estado", "municipio", "ciudad", "colonias"];

/// A record that may already exist server-side.
pub trait Persistible {
    /// Server-assigned id, `None` until first persisted.
    fn id(&self) -> Option<i64>;
}

/// Tracks a mutable record alongside its pristine snapshot.
#[derive(Debug, Clone)]
pub struct ChangeTracker<T> {
    current: T,
    original: T,
    excluidos: &'static [&'static str],
}

impl<T: Serialize + Clone> ChangeTracker<T> {
    /// Starts tracking `record`, excluding the standard auto-populated keys
    /// from change detection.
    pub fn new(record: T) -> Self {
        Self::con_exclusiones(record, CAMPOS_AUTOCOMPLETADOS)
    }

    /// Starts tracking with a caller-supplied exclusion list.
    pub fn con_exclusiones(record: T, excluidos: &'static [&'static str]) -> Self {
        Self {
            original: record.clone(),
            current: record,
            excluidos,
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn original(&self) -> &T {
        &self.original
    }

    /// Replaces both sides with a fresh snapshot of `record`, e.g. when the
    /// operator selects an existing record from search results. Clears any
    /// pending changes.
    pub fn select(&mut self, record: T) {
        self.original = record.clone();
        self.current = record;
    }

    /// Applies a user edit to the live record only.
    pub fn edit(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.current);
    }

    /// Applies a lookup-driven fill to **both** the live record and the
    /// snapshot, so the fill is never classified as a user edit. Applying
    /// the same fill twice leaves `has_changes` untouched.
    pub fn apply_autofill(&mut self, f: impl Fn(&mut T)) {
        f(&mut self.current);
        f(&mut self.original);
    }

    /// Whether the live record genuinely diverges from the snapshot, after
    /// discounting the auto-populated keys on both sides.
    pub fn has_changes(&self) -> bool {
        self.stripped(&self.current) != self.stripped(&self.original)
    }

    fn stripped(&self, record: &T) -> Value {
        let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            for key in self.excluidos {
                map.remove(*key);
            }
        }
        value
    }
}

impl<T: Serialize + Clone + Persistible> ChangeTracker<T> {
    /// Save gate: an existing record with no genuine edits is a no-op
    /// "continue" and must skip the network write entirely.
    pub fn needs_save(&self) -> bool {
        self.current.id().is_none() || self.has_changes()
    }

    /// Propagates a server-assigned id into both sides without flagging a
    /// change.
    pub fn asignar_id(&mut self, id: i64, set: impl Fn(&mut T, i64)) {
        set(&mut self.current, id);
        set(&mut self.original, id);
    }
}
