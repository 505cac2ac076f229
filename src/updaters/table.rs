//! Updater for the three key-value table fields.

use crate::errors::{DsgeError, DsgeResult};
use crate::field::{ChangeQueue, FieldId};
use crate::model::{Model, Variable};
use log::{debug, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Getter<V> = fn(&Model) -> &HashMap<String, V>;
type GetterMut<V> = fn(&mut Model) -> &mut HashMap<String, V>;
type Propagate<V> = fn(&mut Model, &HashMap<String, V>);

/// Change-tracking proxy over one of the model's key-value tables.
///
/// Which table is wrapped is fixed at construction through a typed accessor
/// pair, so the same updater serves the variable, substitution and parameter
/// fields. Tables are fixed-key containers: values can be replaced but keys
/// can never be introduced through an updater.
pub struct TableUpdater<V> {
    model: Rc<RefCell<Model>>,
    queue: Rc<ChangeQueue>,
    field: FieldId,
    buffered: HashMap<String, V>,
    get: Getter<V>,
    get_mut: GetterMut<V>,
    /// Cross-field consistency hook run after a committed write.
    propagate: Option<Propagate<V>>,
}

impl TableUpdater<Variable> {
    pub(crate) fn variables(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        let buffered = model.borrow().variables().clone();
        Self {
            model,
            queue,
            field: FieldId::Variables,
            buffered,
            get: Model::variables,
            get_mut: Model::variables_mut,
            propagate: None,
        }
    }
}

impl TableUpdater<String> {
    pub(crate) fn substitutions(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        let buffered = model.borrow().substitutions().clone();
        Self {
            model,
            queue,
            field: FieldId::Substitutions,
            buffered,
            get: Model::substitutions,
            get_mut: Model::substitutions_mut,
            // A committed substitution write must re-resolve the raw pair
            // list before the change is logged.
            propagate: Some(Model::resolve_raw_pairs),
        }
    }
}

impl TableUpdater<f64> {
    pub(crate) fn parameters(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        let buffered = model.borrow().parameters().clone();
        Self {
            model,
            queue,
            field: FieldId::Parameters,
            buffered,
            get: Model::parameters,
            get_mut: Model::parameters_mut,
            propagate: None,
        }
    }
}

impl<V: Clone + PartialEq> TableUpdater<V> {
    pub fn field(&self) -> FieldId {
        self.field
    }

    /// Read a value from the buffered table.
    pub fn get(&self, key: &str) -> DsgeResult<&V> {
        self.buffered.get(key).ok_or_else(|| DsgeError::UnknownKey {
            field: self.field,
            key: key.to_string(),
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.buffered.contains_key(key)
    }

    /// The buffered copy of the wrapped table.
    pub fn buffered(&self) -> &HashMap<String, V> {
        &self.buffered
    }

    /// Write a single value.
    ///
    /// The live field is always updated. Only when the buffered table differs
    /// from the live table after the write does the buffered copy converge
    /// and the field get queued; writing the value a key already holds
    /// records nothing.
    pub fn set(&mut self, key: &str, value: V) {
        let mut model = self.model.borrow_mut();
        (self.get_mut)(&mut *model).insert(key.to_string(), value.clone());
        if self.buffered != *(self.get)(&*model) {
            self.buffered.insert(key.to_string(), value);
            if let Some(propagate) = self.propagate {
                propagate(&mut *model, &self.buffered);
            }
            debug!("{} changed at '{}'", self.field, key);
            self.queue.record(self.field);
        }
    }

    /// Update several existing keys at once.
    ///
    /// Any key missing from the buffered table rejects the whole call before
    /// anything is touched. At most one queue entry is recorded regardless of
    /// how many keys change.
    pub fn update(&mut self, entries: &HashMap<String, V>) -> DsgeResult<()> {
        for key in entries.keys() {
            if !self.buffered.contains_key(key) {
                warn!("rejected update to {}: unknown key '{}'", self.field, key);
                return Err(DsgeError::UnknownKey {
                    field: self.field,
                    key: key.clone(),
                });
            }
        }

        let mut model = self.model.borrow_mut();
        let live = (self.get_mut)(&mut *model);
        for (key, value) in entries {
            live.insert(key.clone(), value.clone());
        }
        if self.buffered != *(self.get)(&*model) {
            for (key, value) in entries {
                self.buffered.insert(key.clone(), value.clone());
            }
            if let Some(propagate) = self.propagate {
                propagate(&mut *model, &self.buffered);
            }
            debug!("{} changed by bulk update", self.field);
            self.queue.record(self.field);
        }
        Ok(())
    }
}
