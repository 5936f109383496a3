pub mod alignment;
pub mod annotation;
pub mod coord;
pub mod io;
pub mod pack;
pub mod phylo;
pub mod tiler;
