//! An in-memory linked-data graph: nodes with relation-keyed edges,
//! literals, a small path language over the graph, conversion to and
//! from RDF style triples, and JSON and XML rendering.

mod error;
mod lang;
mod literal;
mod node;
mod object;
mod result;

pub mod graph_path;
pub mod json;
pub mod ntriples;
pub mod triples;
pub mod vocab;
pub mod xml;

pub use self::error::{LinkedDataError, Result};
pub use self::graph_path::GraphPath;
pub use self::lang::Locale;
pub use self::literal::{LangString, Literal, NodeReference};
pub use self::node::Node;
pub use self::object::{Kind, ObjectType};
pub use self::result::ResultSet;
pub use self::triples::{NamedNodes, Term, Triple, TripleSet};
pub use self::vocab::{Namespaces, Relation};
