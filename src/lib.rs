//! Viewport virtualization and coordinate mapping for multiple sequence alignments
//! and their phylogenetic trees.
//!
//! The crate is a set of pure building blocks meant to be driven from a render loop:
//!
//! * [`libs::coord`] converts between visible columns, alignment columns and
//!   ungapped sequence positions.
//! * [`libs::tiler`] decides which canvas tiles need to be drawn for a scroll position.
//! * [`libs::phylo::layout`] places the nodes of a tree.
//! * [`libs::pack`] stacks overlapping intervals into display rows, and
//!   [`libs::annotation`] feeds it with sequence features mapped to visible columns.

pub mod libs;

pub use crate::libs::io::*;
