#![allow(dead_code)]

use crate::errors::{DsgeError, DsgeResult};
use crate::model::Model;
use crate::pipeline::RebuildStages;
use std::collections::HashMap;

/// Snapshot of the model taken at an emission point.
#[derive(Debug, Clone)]
pub(crate) struct PartialResult {
    pub parameters: HashMap<String, f64>,
    pub foc_equations: Vec<String>,
    pub raw_substitution_pairs: Vec<(String, String)>,
}

/// Stage implementation that records the order hooks run in.
///
/// Setting `fail_at` to a stage name makes that hook fail after being
/// recorded, for exercising the pipeline's failure semantics.
#[derive(Debug, Default)]
pub(crate) struct RecordingStages {
    pub invoked: Vec<&'static str>,
    pub fail_at: Option<&'static str>,
}

impl RecordingStages {
    fn hit(&mut self, stage: &'static str) -> DsgeResult<()> {
        self.invoked.push(stage);
        if self.fail_at == Some(stage) {
            return Err(DsgeError::Stage {
                stage,
                message: "forced failure".to_string(),
            });
        }
        Ok(())
    }
}

impl RebuildStages for RecordingStages {
    type Output = PartialResult;

    fn structural_init(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("structural_init")
    }

    fn substitution_init(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("substitution_init")
    }

    fn parameter_init(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("parameter_init")
    }

    fn equation_init(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("equation_init")
    }

    fn steady_state_prep(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("steady_state_prep")
    }

    fn steady_state_solve(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("steady_state_solve")
    }

    fn dynamics_prep(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("dynamics_prep")
    }

    fn dynamics_solve(&mut self, _model: &mut Model) -> DsgeResult<()> {
        self.hit("dynamics_solve")
    }

    fn emit_partial(&mut self, model: &Model) -> PartialResult {
        self.invoked.push("emit_partial");
        PartialResult {
            parameters: model.parameters().clone(),
            foc_equations: model.foc_equations().clone(),
            raw_substitution_pairs: model.raw_substitution_pairs().clone(),
        }
    }
}
