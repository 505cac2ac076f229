//! Change-tracking proxies over individual model fields.
//!
//! Each updater wraps exactly one tracked field with a private buffered copy
//! taken when the updater is created. Writes land in the live model
//! immediately; when the buffered copy and the live field differ after a
//! write, the buffered copy converges and the field is recorded in the shared
//! [`ChangeQueue`]. The replay pipeline consumes the queue later.

mod matrix;
mod sequence;
mod table;

pub use matrix::CovarianceUpdater;
pub use sequence::EquationUpdater;
pub use table::TableUpdater;

use crate::field::ChangeQueue;
use crate::model::{Model, Variable};
use std::cell::RefCell;
use std::rc::Rc;

/// One edit session's worth of updaters over a shared model and queue.
///
/// Sessions are created fresh against the current live fields; the queue
/// outlives sessions and accumulates until the embedding application clears
/// it.
pub struct EditSession {
    pub variables: TableUpdater<Variable>,
    pub substitutions: TableUpdater<String>,
    pub parameters: TableUpdater<f64>,
    pub foc_equations: EquationUpdater,
    pub shock_covariance: CovarianceUpdater,
    model: Rc<RefCell<Model>>,
    queue: Rc<ChangeQueue>,
}

impl EditSession {
    pub fn new(model: Rc<RefCell<Model>>, queue: Rc<ChangeQueue>) -> Self {
        Self {
            variables: TableUpdater::variables(Rc::clone(&model), Rc::clone(&queue)),
            substitutions: TableUpdater::substitutions(Rc::clone(&model), Rc::clone(&queue)),
            parameters: TableUpdater::parameters(Rc::clone(&model), Rc::clone(&queue)),
            foc_equations: EquationUpdater::new(Rc::clone(&model), Rc::clone(&queue)),
            shock_covariance: CovarianceUpdater::new(Rc::clone(&model), Rc::clone(&queue)),
            model,
            queue,
        }
    }

    pub fn queue(&self) -> &Rc<ChangeQueue> {
        &self.queue
    }

    pub(crate) fn model(&self) -> &Rc<RefCell<Model>> {
        &self.model
    }
}
