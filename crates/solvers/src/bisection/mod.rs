//! Data structures, types, and the participant implementations for the bisection game.

mod trace;
pub use trace::Trace;

mod types;
pub use types::*;

mod participant;
pub use participant::Participant;

mod solver;
pub use solver::SolverAgent;

mod verifier;
pub use verifier::VerifierAgent;
