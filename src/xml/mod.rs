pub mod node;
pub mod parser;

pub use node::Node;
pub use parser::parse_document;
