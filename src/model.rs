//! The editable DSGE model state and its builder.

use crate::errors::{DsgeError, DsgeResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Classification of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarKind {
    /// Endogenous state variable (e.g. capital stock)
    State,
    /// Control variable chosen each period (e.g. consumption)
    Control,
    /// Exogenous forcing process (e.g. technology)
    Exogenous,
    /// Innovation driving an exogenous process
    Shock,
    Other,
}

/// Descriptor for a single model variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub long_name: String,
    pub kind: VarKind,
}

impl Variable {
    pub fn new(long_name: &str, kind: VarKind) -> Self {
        Self {
            long_name: long_name.to_string(),
            kind,
        }
    }
}

/// The composite model object the updaters and the replay pipeline operate on.
///
/// Five fields are tracked for change: the variable table, the symbolic
/// substitution table, the parameter table, the ordered first-order-condition
/// equations and the shock covariance matrix. The raw substitution pairs are
/// derived from the substitution table and kept consistent with it; their
/// order is fixed at construction.
///
/// How the model is rebuilt from these fields is external to this crate and
/// supplied through [`crate::pipeline::RebuildStages`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    variables: HashMap<String, Variable>,
    substitutions: HashMap<String, String>,
    parameters: HashMap<String, f64>,
    foc_equations: Vec<String>,
    shock_covariance: Array2<f64>,
    raw_substitution_pairs: Vec<(String, String)>,
}

impl Model {
    pub fn variables(&self) -> &HashMap<String, Variable> {
        &self.variables
    }

    pub fn substitutions(&self) -> &HashMap<String, String> {
        &self.substitutions
    }

    pub fn parameters(&self) -> &HashMap<String, f64> {
        &self.parameters
    }

    pub fn foc_equations(&self) -> &Vec<String> {
        &self.foc_equations
    }

    pub fn shock_covariance(&self) -> &Array2<f64> {
        &self.shock_covariance
    }

    /// The (symbol, expression) pairs derived from the substitution table,
    /// in construction order.
    pub fn raw_substitution_pairs(&self) -> &Vec<(String, String)> {
        &self.raw_substitution_pairs
    }

    pub(crate) fn variables_mut(&mut self) -> &mut HashMap<String, Variable> {
        &mut self.variables
    }

    pub(crate) fn substitutions_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.substitutions
    }

    pub(crate) fn parameters_mut(&mut self) -> &mut HashMap<String, f64> {
        &mut self.parameters
    }

    pub(crate) fn foc_equations_mut(&mut self) -> &mut Vec<String> {
        &mut self.foc_equations
    }

    pub(crate) fn shock_covariance_mut(&mut self) -> &mut Array2<f64> {
        &mut self.shock_covariance
    }

    /// Rewrite the body of every raw substitution pair whose symbol appears
    /// in the supplied table.
    pub(crate) fn resolve_raw_pairs(&mut self, substitutions: &HashMap<String, String>) {
        for (symbol, body) in &mut self.raw_substitution_pairs {
            if let Some(expression) = substitutions.get(symbol) {
                *body = expression.clone();
            }
        }
    }
}

/// Build a new model from its tracked fields.
///
/// Substitutions are registered in order; that order is retained for the
/// derived raw substitution pairs.
pub struct ModelBuilder {
    variables: HashMap<String, Variable>,
    substitutions: Vec<(String, String)>,
    parameters: HashMap<String, f64>,
    foc_equations: Vec<String>,
    shock_covariance: Array2<f64>,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            substitutions: vec![],
            parameters: HashMap::new(),
            foc_equations: vec![],
            shock_covariance: Array2::zeros((0, 0)),
        }
    }

    pub fn with_variable(&mut self, symbol: &str, variable: Variable) -> &mut Self {
        self.variables.insert(symbol.to_string(), variable);
        self
    }

    pub fn with_parameter(&mut self, symbol: &str, value: f64) -> &mut Self {
        self.parameters.insert(symbol.to_string(), value);
        self
    }

    /// Register a symbolic substitution.
    ///
    /// Re-registering a symbol replaces its expression but keeps its position
    /// in the derived pair list.
    pub fn with_substitution(&mut self, symbol: &str, expression: &str) -> &mut Self {
        match self.substitutions.iter_mut().find(|(s, _)| s == symbol) {
            Some((_, body)) => *body = expression.to_string(),
            None => self
                .substitutions
                .push((symbol.to_string(), expression.to_string())),
        }
        self
    }

    pub fn with_foc_equation(&mut self, equation: &str) -> &mut Self {
        self.foc_equations.push(equation.to_string());
        self
    }

    pub fn with_shock_covariance(&mut self, covariance: Array2<f64>) -> &mut Self {
        self.shock_covariance = covariance;
        self
    }

    /// Validate the registered fields and create a concrete model.
    pub fn build(&self) -> DsgeResult<Model> {
        let (rows, cols) = self.shock_covariance.dim();
        if rows != cols {
            return Err(DsgeError::NonSquareCovariance { rows, cols });
        }

        Ok(Model {
            variables: self.variables.clone(),
            substitutions: self.substitutions.iter().cloned().collect(),
            parameters: self.parameters.clone(),
            foc_equations: self.foc_equations.clone(),
            shock_covariance: self.shock_covariance.clone(),
            raw_substitution_pairs: self.substitutions.clone(),
        })
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}
