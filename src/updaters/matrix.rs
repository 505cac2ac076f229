//! Updater for the shock covariance matrix.

use crate::errors::{DsgeError, DsgeResult};
use crate::field::{ChangeQueue, FieldId};
use crate::model::Model;
use log::debug;
use ndarray::Array2;
use std::cell::RefCell;
use std::rc::Rc;

/// Change-tracking proxy over the shock covariance matrix.
pub struct CovarianceUpdater {
    model: Rc<RefCell<Model>>,
    queue: Rc<ChangeQueue>,
    buffered: Array2<f64>,
}

impl CovarianceUpdater {
    pub(crate) fn new(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        let buffered = model.borrow().shock_covariance().clone();
        Self {
            model,
            queue,
            buffered,
        }
    }

    /// Read a cell from the buffered matrix.
    pub fn get(&self, index: (usize, usize)) -> DsgeResult<f64> {
        self.buffered
            .get(index)
            .copied()
            .ok_or(DsgeError::CellOutOfBounds {
                field: FieldId::ShockCovariance,
                row: index.0,
                col: index.1,
            })
    }

    /// The buffered copy of the matrix.
    pub fn buffered(&self) -> &Array2<f64> {
        &self.buffered
    }

    /// Write a single cell, coercing the value to `f64`.
    ///
    /// An unchanged cell leaves both copies and the queue untouched.
    pub fn set(&mut self, index: (usize, usize), value: impl Into<f64>) -> DsgeResult<()> {
        let value = value.into();
        let current = self.get(index)?;

        if current != value {
            let mut model = self.model.borrow_mut();
            model.shock_covariance_mut()[index] = value;
            self.buffered[index] = value;
            debug!(
                "{} changed at ({}, {})",
                FieldId::ShockCovariance,
                index.0,
                index.1
            );
            self.queue.record(FieldId::ShockCovariance);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelBuilder;
    use crate::updaters::EditSession;
    use ndarray::array;

    fn session() -> EditSession {
        let model = ModelBuilder::new()
            .with_shock_covariance(array![[0.01, 0.0], [0.0, 0.04]])
            .build()
            .unwrap();
        EditSession::new(Rc::new(RefCell::new(model)), ChangeQueue::new())
    }

    #[test]
    fn changed_cell_queues_once_and_converges() {
        let mut session = session();
        session.shock_covariance.set((0, 1), 0.002).unwrap();

        assert_eq!(session.queue().entries(), vec![FieldId::ShockCovariance]);
        assert_eq!(session.shock_covariance.get((0, 1)).unwrap(), 0.002);
        assert_eq!(
            session.model().borrow().shock_covariance()[[0, 1]],
            0.002
        );
    }

    #[test]
    fn unchanged_cell_queues_nothing() {
        let mut session = session();
        session.shock_covariance.set((1, 1), 0.04).unwrap();
        assert!(session.queue().is_empty());
    }

    #[test]
    fn integer_values_are_coerced_to_float() {
        let mut session = session();
        session.shock_covariance.set((0, 0), 1u32).unwrap();
        assert_eq!(session.shock_covariance.get((0, 0)).unwrap(), 1.0);
    }

    #[test]
    fn out_of_bounds_cell_rejects_without_mutation() {
        let mut session = session();
        let result = session.shock_covariance.set((2, 0), 0.5);

        assert!(matches!(
            result,
            Err(DsgeError::CellOutOfBounds { row: 2, col: 0, .. })
        ));
        assert!(session.queue().is_empty());
    }
}
