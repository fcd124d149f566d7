//! Solver-agnostic 0-1 integer linear programs.
//!
//! The binder builds an [IlpProblem] as plain data (coefficient rows over
//! dense variable indices) and hands it to an [IlpSolver]. Keeping the
//! modeling pure and the solver behind a small trait means alternate
//! backends can be swapped in without touching the formulation.

use good_lp::{constraint, variable, variables, Expression, Solution,
    SolverModel, Variable};
use takt_utils::{Error, TaktResult};

/// Sense of one linear constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEq,
    Eq,
}

/// One linear constraint: `sum(coeff * var) sense rhs`.
#[derive(Clone, Debug)]
pub struct IlpConstraint {
    pub terms: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl IlpConstraint {
    pub fn less_eq(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        IlpConstraint {
            terms,
            sense: ConstraintSense::LessEq,
            rhs,
        }
    }

    pub fn eq(terms: Vec<(usize, f64)>, rhs: f64) -> Self {
        IlpConstraint {
            terms,
            sense: ConstraintSense::Eq,
            rhs,
        }
    }
}

/// A minimization problem over binary variables `0..num_vars`.
#[derive(Clone, Debug, Default)]
pub struct IlpProblem {
    pub num_vars: usize,
    /// Objective coefficient per variable.
    pub objective: Vec<f64>,
    pub constraints: Vec<IlpConstraint>,
}

impl IlpProblem {
    pub fn new(num_vars: usize) -> Self {
        IlpProblem {
            num_vars,
            objective: vec![0.0; num_vars],
            constraints: Vec::new(),
        }
    }
}

/// An optimal assignment to the problem's binary variables.
#[derive(Clone, Debug)]
pub struct IlpSolution {
    pub values: Vec<bool>,
    pub objective: f64,
}

/// A MILP backend. The entire contract is "solve this binary-variable
/// linear program and report optimality": any failure to prove optimality
/// (infeasible, unbounded, aborted) must come back as an error.
pub trait IlpSolver {
    fn solve(&self, problem: &IlpProblem) -> TaktResult<IlpSolution>;
}

/// The shipped backend, built on `good_lp`'s pluggable solver stack.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoodLpSolver;

impl IlpSolver for GoodLpSolver {
    fn solve(&self, problem: &IlpProblem) -> TaktResult<IlpSolution> {
        let mut vars = variables!();
        let xs: Vec<Variable> = (0..problem.num_vars)
            .map(|_| vars.add(variable().binary()))
            .collect();
        let objective: Expression = problem
            .objective
            .iter()
            .zip(&xs)
            .map(|(coeff, var)| *coeff * *var)
            .sum();
        let mut model =
            vars.minimise(objective).using(good_lp::default_solver);
        for c in &problem.constraints {
            let lhs: Expression = c
                .terms
                .iter()
                .map(|(var, coeff)| *coeff * xs[*var])
                .sum();
            model = match c.sense {
                ConstraintSense::LessEq => {
                    model.with(constraint!(lhs <= c.rhs))
                }
                ConstraintSense::Eq => model.with(constraint!(lhs == c.rhs)),
            };
        }
        let solution = model.solve().map_err(|e| {
            Error::infeasible(format!("no optimal solution: {e}"))
        })?;
        let values: Vec<bool> =
            xs.iter().map(|v| solution.value(*v) > 0.5).collect();
        let objective = problem
            .objective
            .iter()
            .zip(&values)
            .filter(|(_, used)| **used)
            .map(|(coeff, _)| *coeff)
            .sum();
        Ok(IlpSolution { values, objective })
    }
}
