//! Updater for the ordered first-order-condition equations.

use crate::errors::{DsgeError, DsgeResult};
use crate::field::{ChangeQueue, FieldId};
use crate::model::Model;
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Change-tracking proxy over the first-order-condition equation list.
pub struct EquationUpdater {
    model: Rc<RefCell<Model>>,
    queue: Rc<ChangeQueue>,
    buffered: Vec<String>,
}

impl EquationUpdater {
    pub(crate) fn new(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        let buffered = model.borrow().foc_equations().clone();
        Self {
            model,
            queue,
            buffered,
        }
    }

    /// Read an equation from the buffered list.
    pub fn get(&self, index: usize) -> DsgeResult<&str> {
        self.buffered
            .get(index)
            .map(String::as_str)
            .ok_or(DsgeError::IndexOutOfBounds {
                field: FieldId::FocEquations,
                index,
                len: self.buffered.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.buffered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffered.is_empty()
    }

    /// The buffered copy of the equation list.
    pub fn buffered(&self) -> &[String] {
        &self.buffered
    }

    /// Replace the equation at `index`.
    ///
    /// Out-of-bounds indices reject the call without mutating anything.
    /// An unchanged value leaves both copies and the queue untouched.
    pub fn set(&mut self, index: usize, equation: impl Into<String>) -> DsgeResult<()> {
        let equation = equation.into();
        if index >= self.buffered.len() {
            return Err(DsgeError::IndexOutOfBounds {
                field: FieldId::FocEquations,
                index,
                len: self.buffered.len(),
            });
        }

        if self.buffered[index] != equation {
            let mut model = self.model.borrow_mut();
            model.foc_equations_mut()[index] = equation.clone();
            self.buffered[index] = equation;
            debug!("{} changed at index {}", FieldId::FocEquations, index);
            self.queue.record(FieldId::FocEquations);
        }
        Ok(())
    }

    /// Replace the equations in `lo..hi`.
    ///
    /// `hi` must be strictly less than the buffered length; the final
    /// equation is only reachable through [`EquationUpdater::set`]. The
    /// replacement may have a different length than the range it replaces.
    pub fn set_range(&mut self, lo: usize, hi: usize, equations: Vec<String>) -> DsgeResult<()> {
        let len = self.buffered.len();
        if lo > hi || hi >= len {
            return Err(DsgeError::RangeOutOfBounds {
                field: FieldId::FocEquations,
                lo,
                hi,
                len,
            });
        }

        if self.buffered[lo..hi] != equations[..] {
            let mut model = self.model.borrow_mut();
            model
                .foc_equations_mut()
                .splice(lo..hi, equations.iter().cloned());
            self.buffered.splice(lo..hi, equations);
            debug!("{} changed in range {}..{}", FieldId::FocEquations, lo, hi);
            self.queue.record(FieldId::FocEquations);
        }
        Ok(())
    }
}
