//! Field identifiers and the shared change queue.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Tag naming one of the five tracked model fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    Variables,
    Substitutions,
    Parameters,
    FocEquations,
    ShockCovariance,
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldId::Variables => "variables",
            FieldId::Substitutions => "substitutions",
            FieldId::Parameters => "parameters",
            FieldId::FocEquations => "foc_equations",
            FieldId::ShockCovariance => "shock_covariance",
        };
        f.write_str(name)
    }
}

/// Ordered log of fields whose buffered copy has diverged from the live
/// model and is pending commit.
///
/// Duplicates are allowed; the replay pipeline tests membership rather than
/// popping entries. A single queue is created alongside the model and shared
/// by every updater of an edit session.
#[derive(Debug, Default)]
pub struct ChangeQueue {
    entries: RefCell<Vec<FieldId>>,
}

impl ChangeQueue {
    /// Create an empty queue behind a shared handle.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Append a field identifier to the log.
    pub fn record(&self, field: FieldId) {
        self.entries.borrow_mut().push(field);
    }

    /// Whether the given field has been recorded at least once.
    pub fn contains(&self, field: FieldId) -> bool {
        self.entries.borrow().iter().any(|f| *f == field)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Snapshot of the recorded entries in insertion order.
    pub fn entries(&self) -> Vec<FieldId> {
        self.entries.borrow().clone()
    }

    /// Forget all recorded changes.
    ///
    /// The replay pipeline never clears the queue; the embedding application
    /// decides when an edit session is over.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
