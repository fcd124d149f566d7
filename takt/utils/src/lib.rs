//! Shared utilities for the takt synthesis core.
mod errors;
mod id;
mod namegenerator;
mod weight_graph;

pub mod math;

pub use errors::{Error, TaktResult};
pub use id::{GSym, GetName, Id};
pub use math::bits_needed_for;
pub use namegenerator::NameGenerator;
pub use weight_graph::{BoolIdx, WeightGraph};
