//! Subcommand modules for the `msav` binary.

pub mod blanks;
pub mod coord;
pub mod features;
pub mod layout;
pub mod pack;
pub mod tiles;
