//! Conversion between the graph and flat subject-predicate-object triples.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{LinkedDataError, Result};
use crate::literal::{LangString, Literal};
use crate::node::Node;
use crate::object::ObjectType;
use crate::result::ResultSet;
use crate::vocab::{is_uri, rdf};

/// A subject or object of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    /// A blank node label, without `_:`
    Blank(String),
    Literal {
        value: String,
        /// `None` for plain literals
        datatype: Option<String>,
        language: Option<String>,
    },
}

impl Term {
    pub fn is_resource(&self) -> bool {
        !matches!(self, Term::Literal { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// A set of triples, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripleSet {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    next_blank: usize,
}

impl TripleSet {
    pub fn new() -> TripleSet {
        TripleSet::default()
    }

    /// Adds a triple unless it is already present.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if !self.seen.insert(triple.clone()) {
            return false;
        }
        self.triples.push(triple);
        true
    }

    /// A blank node label not used by any earlier call.
    pub fn fresh_blank(&mut self) -> Term {
        self.next_blank += 1;
        Term::Blank(format!("b{}", self.next_blank))
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Triple> {
        self.triples.iter()
    }
}

impl FromIterator<Triple> for TripleSet {
    fn from_iter<T: IntoIterator<Item = Triple>>(iter: T) -> Self {
        let mut set = TripleSet::new();
        for triple in iter {
            set.insert(triple);
        }
        set
    }
}

/// How far named nodes are written out on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamedNodes {
    /// Named nodes, the starting node included, are written as bare IRIs.
    Shallow,
    /// Only the starting node is written out with its edges.
    #[default]
    RootOnly,
    /// Every named node reached is written out, each once.
    Deep,
}

/// Writes `node` and everything reachable from it as triples.
pub fn export(node: &Node, named: NamedNodes) -> TripleSet {
    export_all([node], named)
}

/// Writes several starting nodes into one set. A node reachable from more
/// than one of them is written once, under a single blank label.
pub fn export_all<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    named: NamedNodes,
) -> TripleSet {
    let mut triples = TripleSet::new();
    let mut exporter = Exporter {
        triples: &mut triples,
        named,
        visited: HashMap::new(),
    };
    let mut roots = 0;
    for node in nodes {
        exporter.node(node, named != NamedNodes::Shallow);
        roots += 1;
    }
    debug!(target: "bridge", roots, triples = triples.len(), "exported nodes");
    triples
}

struct Exporter<'a> {
    triples: &'a mut TripleSet,
    named: NamedNodes,
    visited: HashMap<usize, Term>,
}

impl Exporter<'_> {
    fn node(&mut self, node: &Node, expand: bool) -> Term {
        if let Some(term) = self.visited.get(&node.key()) {
            return term.clone();
        }
        let subject = match node.identifier() {
            Some(identifier) if !expand => return Term::Iri(identifier),
            Some(identifier) => Term::Iri(identifier),
            None => self.triples.fresh_blank(),
        };
        self.visited.insert(node.key(), subject.clone());
        for (predicate, objects) in node.edges() {
            for object in objects {
                let object = self.object(&object);
                self.triples.insert(Triple {
                    subject: subject.clone(),
                    predicate: predicate.clone(),
                    object,
                });
            }
        }
        subject
    }

    fn object(&mut self, object: &ObjectType) -> Term {
        match object {
            ObjectType::Node(child) => self.node(child, self.named == NamedNodes::Deep),
            ObjectType::Literal(literal) => Term::Literal {
                value: literal.value().to_owned(),
                datatype: (!literal.is_plain()).then(|| literal.datatype().to_owned()),
                language: None,
            },
            ObjectType::LangString(lang) => Term::Literal {
                value: lang.value().to_owned(),
                datatype: None,
                language: Some(lang.language()),
            },
            ObjectType::NodeReference(reference) => Term::Iri(reference.identifier().to_owned()),
        }
    }
}

/// Builds nodes from triples.
///
/// IRIs become named nodes and blank nodes anonymous ones; named nodes that
/// end up without edges are replaced by references. Returns the nodes that
/// are never an object, or every subject node if there are none or if
/// `all_nodes` is set.
pub fn import(triples: &TripleSet, all_nodes: bool) -> Result<ResultSet> {
    let mut nodes: HashMap<Term, Node> = HashMap::new();
    let mut subjects: Vec<Term> = vec![];
    let mut seen_subjects: HashSet<Term> = HashSet::new();
    let mut objects: HashSet<Term> = HashSet::new();

    for triple in triples.iter() {
        if !triple.subject.is_resource() {
            warn!(target: "bridge", ?triple, "literal subject, skipped");
            continue;
        }
        if triple.predicate == rdf::ABOUT {
            warn!(target: "bridge", ?triple, "identity used as a predicate");
        }
        let subject = resource(&mut nodes, &triple.subject)?;
        if seen_subjects.insert(triple.subject.clone()) {
            subjects.push(triple.subject.clone());
        }
        let object = match &triple.object {
            Term::Literal {
                value,
                datatype,
                language,
            } => leaf(value, datatype.as_deref(), language.as_deref())?,
            resource_term => {
                objects.insert(resource_term.clone());
                resource(&mut nodes, resource_term)?.into()
            }
        };
        subject.put(&triple.predicate, object)?;
    }

    for node in nodes.values() {
        node.collapse_empty_named_nodes();
    }

    let top: Vec<&Term> = subjects.iter().filter(|s| !objects.contains(*s)).collect();
    let chosen: Vec<&Term> = if all_nodes || top.is_empty() {
        subjects.iter().collect()
    } else {
        top
    };
    let result: ResultSet = chosen
        .into_iter()
        .filter_map(|term| nodes.get(term))
        .map(ObjectType::from)
        .collect();
    debug!(
        target: "bridge",
        triples = triples.len(),
        nodes = result.len(),
        "imported triples"
    );
    Ok(result)
}

fn resource(nodes: &mut HashMap<Term, Node>, term: &Term) -> Result<Node> {
    if let Some(node) = nodes.get(term) {
        return Ok(node.clone());
    }
    let node = match term {
        Term::Iri(iri) if !is_uri(iri) => return Err(LinkedDataError::InvalidIri(iri.clone())),
        Term::Iri(iri) => Node::named(iri.as_str()),
        _ => Node::new(),
    };
    nodes.insert(term.clone(), node.clone());
    Ok(node)
}

fn leaf(value: &str, datatype: Option<&str>, language: Option<&str>) -> Result<ObjectType> {
    if let Some(language) = language.filter(|l| !l.is_empty()) {
        return Ok(LangString::new(value, language)?.into());
    }
    let Some(datatype) = datatype else {
        return Ok(Literal::plain(value).into());
    };
    match Literal::new(value, datatype) {
        Ok(literal) => Ok(literal.into()),
        Err(error) => {
            warn!(target: "bridge", datatype, %error, "kept as plain literal");
            Ok(Literal::plain(value).into())
        }
    }
}
