//! Off-chain participants for the verification game.

pub mod bisection;
