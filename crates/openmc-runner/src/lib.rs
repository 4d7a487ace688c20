//! OpenMC adapter for breeder-core
//!
//! Renders a [`breeder_core::Model`] into OpenMC's XML input deck, stages
//! the DAGMC mesh, runs the `openmc` executable and hands back the tally
//! report. Also provides a [`SourceCompiler`](breeder_core::SourceCompiler)
//! that builds the plasma source library with an external command.

pub mod compiler;
pub mod deck;
pub mod engine;
pub mod error;

pub use compiler::CommandSourceCompiler;
pub use deck::InputDeck;
pub use engine::{EngineRun, OpenmcEngine, TALLIES_OUT};
pub use error::{Result, RunnerError};
