use std::fmt;

use crate::error::{LinkedDataError, Result};
use crate::lang::Locale;
use crate::literal::{LangString, Literal, NodeReference};
use crate::node::Node;
use crate::vocab::{is_uri, rdf, xml};

/// Anything that can be the target of an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectType {
    Node(Node),
    Literal(Literal),
    LangString(LangString),
    NodeReference(NodeReference),
}

/// Capabilities to filter objects by, used by [`ResultSet`](crate::ResultSet)
/// reducers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Any,
    /// Nodes and literals, the objects whose content can be matched
    AccessibleObject,
    /// Named nodes and references
    IdentifiableNode,
    NamedNode,
    Node,
    NodeReference,
    /// Nodes and references
    NodeType,
    /// Literals and language strings
    Literal,
    LangString,
}

impl ObjectType {
    /// Creates a leaf from a string: a language string if a language is
    /// given, a reference if the value looks like a URI, a plain literal
    /// otherwise.
    pub fn leaf(value: &str, language: Option<&str>) -> Result<ObjectType> {
        match language {
            Some(language) if !language.is_empty() => {
                Ok(ObjectType::LangString(LangString::new(value, language)?))
            }
            _ if is_uri(value) => Ok(ObjectType::NodeReference(NodeReference::new(value))),
            _ => Ok(ObjectType::Literal(Literal::plain(value))),
        }
    }

    pub fn is(&self, kind: Kind) -> bool {
        match kind {
            Kind::Any => true,
            Kind::AccessibleObject => !matches!(self, ObjectType::NodeReference(_)),
            Kind::IdentifiableNode => match self {
                ObjectType::Node(node) => node.is_named(),
                ObjectType::NodeReference(_) => true,
                _ => false,
            },
            Kind::NamedNode => matches!(self, ObjectType::Node(node) if node.is_named()),
            Kind::Node => matches!(self, ObjectType::Node(_)),
            Kind::NodeReference => matches!(self, ObjectType::NodeReference(_)),
            Kind::NodeType => matches!(self, ObjectType::Node(_) | ObjectType::NodeReference(_)),
            Kind::Literal => matches!(self, ObjectType::Literal(_) | ObjectType::LangString(_)),
            Kind::LangString => matches!(self, ObjectType::LangString(_)),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            ObjectType::Node(node) => Some(node),
            _ => None,
        }
    }

    /// The identifier of a named node or reference.
    pub fn identifier(&self) -> Option<String> {
        match self {
            ObjectType::Node(node) => node.identifier(),
            ObjectType::NodeReference(reference) => Some(reference.identifier().to_owned()),
            _ => None,
        }
    }

    /// The lexical value of a literal or language string.
    pub fn literal_value(&self) -> Option<&str> {
        match self {
            ObjectType::Literal(literal) => Some(literal.value()),
            ObjectType::LangString(lang) => Some(lang.value()),
            _ => None,
        }
    }

    /// Whether this object satisfies `condition`.
    ///
    /// Fails if the condition asserts several values where a leaf can only
    /// carry one.
    pub fn matches(&self, condition: &ObjectType) -> Result<bool> {
        match self {
            ObjectType::Node(node) => node.matches(condition),
            ObjectType::Literal(literal) => match condition {
                ObjectType::Literal(c) => Ok(literal.matches_literal(c)),
                ObjectType::Node(c) => {
                    leaf_matches_node(literal.value(), literal.datatype(), None, c)
                }
                _ => Ok(false),
            },
            ObjectType::LangString(lang) => match condition {
                ObjectType::Literal(c) => Ok(lang.matches_literal(c)),
                ObjectType::LangString(c) => Ok(lang.matches_lang_string(c)),
                ObjectType::Node(c) => {
                    leaf_matches_node(lang.value(), lang.datatype(), Some(lang.locale()), c)
                }
                _ => Ok(false),
            },
            ObjectType::NodeReference(reference) => match condition {
                ObjectType::NodeReference(c) => Ok(reference == c),
                ObjectType::Node(c) => Ok(c.identifier().as_deref()
                    == Some(reference.identifier())
                    && c.is_empty()),
                _ => Ok(false),
            },
        }
    }
}

/// Matches a leaf against a node describing it by `rdf:type`, `rdf:value`
/// and `xml:lang`.
fn leaf_matches_node(
    value: &str,
    datatype: &str,
    locale: Option<&Locale>,
    condition: &Node,
) -> Result<bool> {
    if condition.is_named() {
        return Ok(false);
    }
    for relation in condition.relations() {
        let asserted = condition.get(&relation);
        match relation.as_str() {
            rdf::TYPE => {
                if asserted.len() > 1 {
                    return Err(LinkedDataError::ambiguous(format!(
                        "a literal has only one type, but the condition asserts {}",
                        asserted.len()
                    )));
                }
                let type_matches = asserted.iter().all(|t| match t.identifier() {
                    Some(id) => {
                        id == datatype
                            || (id == rdf::PLAIN_LITERAL && datatype == rdf::LANG_STRING)
                    }
                    None => false,
                });
                if !type_matches {
                    return Ok(false);
                }
            }
            rdf::VALUE => {
                if asserted.len() > 1 {
                    return Err(LinkedDataError::ambiguous(format!(
                        "a literal has only one value, but the condition asserts {}",
                        asserted.len()
                    )));
                }
                if !asserted.iter().all(|v| v.literal_value() == Some(value)) {
                    return Ok(false);
                }
            }
            xml::LANG => {
                let Some(locale) = locale else {
                    return Ok(false);
                };
                let covered = asserted.iter().all(|range| {
                    range
                        .literal_value()
                        .and_then(|range| Locale::parse(range).ok())
                        .is_some_and(|range| range.covers(locale))
                });
                if !covered {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
    }
    Ok(true)
}

impl From<Node> for ObjectType {
    fn from(node: Node) -> Self {
        ObjectType::Node(node)
    }
}

impl From<&Node> for ObjectType {
    fn from(node: &Node) -> Self {
        ObjectType::Node(node.clone())
    }
}

impl From<Literal> for ObjectType {
    fn from(literal: Literal) -> Self {
        ObjectType::Literal(literal)
    }
}

impl From<LangString> for ObjectType {
    fn from(lang: LangString) -> Self {
        ObjectType::LangString(lang)
    }
}

impl From<NodeReference> for ObjectType {
    fn from(reference: NodeReference) -> Self {
        ObjectType::NodeReference(reference)
    }
}

/// URI-shaped strings become references, anything else a plain literal.
impl From<&str> for ObjectType {
    fn from(value: &str) -> Self {
        if is_uri(value) {
            ObjectType::NodeReference(NodeReference::new(value))
        } else {
            ObjectType::Literal(Literal::plain(value))
        }
    }
}

impl From<String> for ObjectType {
    fn from(value: String) -> Self {
        ObjectType::from(value.as_str())
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Node(node) => write!(f, "{node}"),
            ObjectType::Literal(literal) => write!(f, "{literal}"),
            ObjectType::LangString(lang) => write!(f, "{lang}"),
            ObjectType::NodeReference(reference) => write!(f, "{reference}"),
        }
    }
}
