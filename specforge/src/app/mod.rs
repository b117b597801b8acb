//! Composition root

pub mod options;
pub mod run;
pub mod state;
