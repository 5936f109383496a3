pub mod error;
pub mod layout;
pub mod node;
pub mod parser;
pub mod tree;

pub use error::TreeError;
pub use layout::{LayoutError, LayoutOptions, NodePosition, TreeLayout};
pub use node::{Node, NodeId};
pub use tree::Tree;
