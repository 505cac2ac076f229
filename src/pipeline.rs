//! Replay pipeline: fixed stage order with conditional field commits.
//!
//! A [`RebuildPipeline`] replays the rebuild sequence once. Stage hooks
//! always run; in between, each queued field's buffered value is committed
//! into the live model at the checkpoint immediately preceding the first
//! stage that consumes it. Depending on the configured [`SolveDepth`] the run
//! stops after the pre-steady-state stage, the steady-state solve or the
//! dynamic solve, emitting a partial result either way.
//!
//! Stage failures are terminal for the run and propagate unmodified; fields
//! committed before the failure stay committed.

use crate::errors::DsgeResult;
use crate::field::{ChangeQueue, FieldId};
use crate::model::{Model, Variable};
use crate::updaters::EditSession;
use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// How far a rebuild run proceeds before emitting a partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SolveDepth {
    /// Stop once the model is prepared for a steady-state computation.
    PreSteadyState,
    /// Stop once the steady state has been solved.
    SteadyState,
    /// Run through the dynamic solution.
    Dynamics,
}

impl SolveDepth {
    /// Map an integer level to a depth.
    ///
    /// Levels above 2 clamp to [`SolveDepth::Dynamics`]; there is no level
    /// beyond the full dynamic solve.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Self::PreSteadyState,
            1 => Self::SteadyState,
            _ => Self::Dynamics,
        }
    }
}

/// The rebuild hooks a model embedder supplies.
///
/// The hooks are trusted external calls: the pipeline does not retry them,
/// interpret their errors or roll back commits already applied when one
/// fails.
pub trait RebuildStages {
    /// Externally visible result of a partial rebuild.
    type Output;

    fn structural_init(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn substitution_init(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn parameter_init(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn equation_init(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn steady_state_prep(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn steady_state_solve(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn dynamics_prep(&mut self, model: &mut Model) -> DsgeResult<()>;
    fn dynamics_solve(&mut self, model: &mut Model) -> DsgeResult<()>;

    /// Produce the partial result emitted when the run stops.
    fn emit_partial(&mut self, model: &Model) -> Self::Output;
}

/// One-shot replay of the rebuild sequence against a session's buffered
/// edits.
///
/// Construction captures a consistent point-in-time view of all five
/// buffered fields; edits made through the session afterwards do not affect
/// the run. [`RebuildPipeline::run`] consumes the pipeline.
pub struct RebuildPipeline {
    model: Rc<RefCell<Model>>,
    queue: Rc<ChangeQueue>,
    depth: SolveDepth,
    variables: HashMap<String, Variable>,
    substitutions: HashMap<String, String>,
    parameters: HashMap<String, f64>,
    foc_equations: Vec<String>,
    shock_covariance: Array2<f64>,
}

impl RebuildPipeline {
    /// Capture the session's buffered values for a run at the given depth.
    pub fn new(session: &EditSession, depth: SolveDepth) -> Self {
        Self {
            model: Rc::clone(session.model()),
            queue: Rc::clone(session.queue()),
            depth,
            variables: session.variables.buffered().clone(),
            substitutions: session.substitutions.buffered().clone(),
            parameters: session.parameters.buffered().clone(),
            foc_equations: session.foc_equations.buffered().to_vec(),
            shock_covariance: session.shock_covariance.buffered().clone(),
        }
    }

    /// Execute the staged sequence exactly once.
    pub fn run<S: RebuildStages>(self, stages: &mut S) -> DsgeResult<S::Output> {
        let handle = Rc::clone(&self.model);
        let mut model = handle.borrow_mut();
        let queue = self.queue;

        debug!("stage structural_init");
        stages.structural_init(&mut model)?;
        if queue.contains(FieldId::Variables) {
            debug!("commit {}", FieldId::Variables);
            *model.variables_mut() = self.variables;
        }

        debug!("stage substitution_init");
        stages.substitution_init(&mut model)?;
        if queue.contains(FieldId::Substitutions) {
            debug!("commit {}", FieldId::Substitutions);
            model.resolve_raw_pairs(&self.substitutions);
            *model.substitutions_mut() = self.substitutions;
        }

        debug!("stage parameter_init");
        stages.parameter_init(&mut model)?;
        if queue.contains(FieldId::Parameters) {
            debug!("commit {}", FieldId::Parameters);
            *model.parameters_mut() = self.parameters;
        }

        debug!("stage equation_init");
        stages.equation_init(&mut model)?;
        if queue.contains(FieldId::FocEquations) {
            debug!("commit {}", FieldId::FocEquations);
            *model.foc_equations_mut() = self.foc_equations;
        }

        debug!("stage steady_state_prep");
        stages.steady_state_prep(&mut model)?;
        if self.depth == SolveDepth::PreSteadyState {
            debug!("emitting at depth {:?}", self.depth);
            return Ok(stages.emit_partial(&model));
        }

        debug!("stage steady_state_solve");
        stages.steady_state_solve(&mut model)?;
        if self.depth == SolveDepth::SteadyState {
            debug!("emitting at depth {:?}", self.depth);
            return Ok(stages.emit_partial(&model));
        }

        debug!("stage dynamics_prep");
        stages.dynamics_prep(&mut model)?;
        if queue.contains(FieldId::ShockCovariance) {
            debug!("commit {}", FieldId::ShockCovariance);
            *model.shock_covariance_mut() = self.shock_covariance;
        }

        debug!("stage dynamics_solve");
        stages.dynamics_solve(&mut model)?;
        debug!("emitting at depth {:?}", self.depth);
        Ok(stages.emit_partial(&model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DsgeError;
    use crate::example_stages::RecordingStages;
    use crate::model::{ModelBuilder, VarKind};
    use is_close::is_close;
    use ndarray::array;

    fn make_session() -> EditSession {
        let model = ModelBuilder::new()
            .with_variable("k", Variable::new("capital stock", VarKind::State))
            .with_parameter("beta", 0.95)
            .with_parameter("delta", 0.025)
            .with_substitution("@F", "z*k**alpha")
            .with_substitution("@R", "1+@F_bar-delta")
            .with_foc_equation("c**(-1) - beta*E(t)|c(t+1)**(-1)*@R(t+1)")
            .with_foc_equation("k - @F + c - (1-delta)*k(-1)")
            .with_shock_covariance(array![[0.01]])
            .build()
            .unwrap();
        EditSession::new(Rc::new(RefCell::new(model)), ChangeQueue::new())
    }

    #[test]
    fn from_level_clamps_out_of_range_depths() {
        assert_eq!(SolveDepth::from_level(0), SolveDepth::PreSteadyState);
        assert_eq!(SolveDepth::from_level(1), SolveDepth::SteadyState);
        assert_eq!(SolveDepth::from_level(2), SolveDepth::Dynamics);
        assert_eq!(SolveDepth::from_level(7), SolveDepth::Dynamics);
    }

    #[test]
    fn pre_steady_state_run_stops_before_the_solvers() {
        let mut session = make_session();
        session.parameters.set("beta", 0.96);

        let pipeline = RebuildPipeline::new(&session, SolveDepth::PreSteadyState);
        let mut stages = RecordingStages::default();
        pipeline.run(&mut stages).unwrap();

        assert_eq!(
            stages.invoked,
            vec![
                "structural_init",
                "substitution_init",
                "parameter_init",
                "equation_init",
                "steady_state_prep",
                "emit_partial",
            ]
        );
    }

    #[test]
    fn full_depth_run_with_empty_queue_runs_every_stage_and_commits_nothing() {
        let session = make_session();
        let before = session.model().borrow().clone();

        let pipeline = RebuildPipeline::new(&session, SolveDepth::Dynamics);
        let mut stages = RecordingStages::default();
        pipeline.run(&mut stages).unwrap();

        assert_eq!(
            stages.invoked,
            vec![
                "structural_init",
                "substitution_init",
                "parameter_init",
                "equation_init",
                "steady_state_prep",
                "steady_state_solve",
                "dynamics_prep",
                "dynamics_solve",
                "emit_partial",
            ]
        );

        let after = session.model().borrow();
        assert_eq!(after.parameters(), before.parameters());
        assert_eq!(after.foc_equations(), before.foc_equations());
        assert_eq!(after.shock_covariance(), before.shock_covariance());
        assert!(session.queue().is_empty());
    }

    #[test]
    fn steady_state_run_commits_the_edited_parameter() {
        let mut session = make_session();
        session.parameters.set("beta", 0.96);
        assert_eq!(session.queue().entries(), vec![FieldId::Parameters]);

        let pipeline = RebuildPipeline::new(&session, SolveDepth::SteadyState);
        let mut stages = RecordingStages::default();
        let partial = pipeline.run(&mut stages).unwrap();

        assert_eq!(
            stages.invoked,
            vec![
                "structural_init",
                "substitution_init",
                "parameter_init",
                "equation_init",
                "steady_state_prep",
                "steady_state_solve",
                "emit_partial",
            ]
        );
        assert!(is_close!(partial.parameters["beta"], 0.96));
        assert!(is_close!(
            session.model().borrow().parameters()["beta"],
            0.96
        ));
    }

    #[test]
    fn substitution_commit_reresolves_raw_pairs() {
        let mut session = make_session();
        session.substitutions.set("@R", "1+@F_bar".to_string());

        let pipeline = RebuildPipeline::new(&session, SolveDepth::PreSteadyState);
        let mut stages = RecordingStages::default();
        let partial = pipeline.run(&mut stages).unwrap();

        assert_eq!(
            partial.raw_substitution_pairs,
            vec![
                ("@F".to_string(), "z*k**alpha".to_string()),
                ("@R".to_string(), "1+@F_bar".to_string()),
            ]
        );
        assert_eq!(
            session.model().borrow().substitutions()["@R"],
            "1+@F_bar"
        );
    }

    #[test]
    fn covariance_commit_only_happens_at_full_depth() {
        let mut session = make_session();
        session.shock_covariance.set((0, 0), 0.02).unwrap();
        // Desync the live cell so the commit itself is observable.
        session.model().borrow_mut().shock_covariance_mut()[[0, 0]] = 0.01;

        // The covariance commit sits behind the dynamics_prep stage, so a
        // steady-state run never reaches it.
        let pipeline = RebuildPipeline::new(&session, SolveDepth::SteadyState);
        pipeline.run(&mut RecordingStages::default()).unwrap();
        assert_eq!(session.model().borrow().shock_covariance()[[0, 0]], 0.01);

        let pipeline = RebuildPipeline::new(&session, SolveDepth::Dynamics);
        pipeline.run(&mut RecordingStages::default()).unwrap();
        assert_eq!(session.model().borrow().shock_covariance()[[0, 0]], 0.02);
    }

    #[test]
    fn stage_failure_propagates_and_keeps_earlier_commits() {
        let mut session = make_session();
        session.parameters.set("beta", 0.99);
        session.foc_equations.set(0, "replaced").unwrap();

        let pipeline = RebuildPipeline::new(&session, SolveDepth::Dynamics);
        let mut stages = RecordingStages {
            fail_at: Some("steady_state_solve"),
            ..Default::default()
        };
        let result = pipeline.run(&mut stages);

        assert!(matches!(
            result,
            Err(DsgeError::Stage { stage: "steady_state_solve", .. })
        ));
        assert_eq!(*stages.invoked.last().unwrap(), "steady_state_solve");

        // Commits made before the failing stage remain applied.
        let model = session.model().borrow();
        assert!(is_close!(model.parameters()["beta"], 0.99));
        assert_eq!(model.foc_equations()[0], "replaced");
    }

    #[test]
    fn pipeline_captures_buffered_values_at_construction() {
        let mut session = make_session();
        session.parameters.set("beta", 0.96);

        let pipeline = RebuildPipeline::new(&session, SolveDepth::PreSteadyState);
        // A later edit through the session must not leak into the captured
        // view, even though it queues a second entry.
        session.parameters.set("beta", 0.99);
        // Undo the live write so the commit is observable.
        session.model().borrow_mut().parameters_mut().insert("beta".to_string(), 0.0);

        let mut stages = RecordingStages::default();
        let partial = pipeline.run(&mut stages).unwrap();
        assert!(is_close!(partial.parameters["beta"], 0.96));
    }
}
