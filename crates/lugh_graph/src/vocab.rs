use std::borrow::Cow;

use bimap::BiMap;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace#";
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink#";
pub const GRAPH_PATH_NS: &str = "http://names.kitodo.org/graphpath#";

/// RDF vocabulary
pub mod rdf {
    pub const ABOUT: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#about";
    pub const BAG: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Bag";
    pub const DESCRIPTION: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Description";
    pub const HTML: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#HTML";
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
    pub const PLAIN_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#PlainLiteral";
    pub const PREDICATE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#predicate";
    pub const PROPERTY: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#Property";
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const VALUE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#value";
    pub const XML_LITERAL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#XMLLiteral";

    /// Prefix of the container membership properties `rdf:_1`, `rdf:_2`, ...
    pub const SEQ_NO_PREFIX: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#_";
}

pub mod xsd {
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";
    pub const NON_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";
    pub const UNSIGNED_SHORT: &str = "http://www.w3.org/2001/XMLSchema#unsignedShort";
    pub const UNSIGNED_BYTE: &str = "http://www.w3.org/2001/XMLSchema#unsignedByte";
}

pub mod xml {
    pub const LANG: &str = "http://www.w3.org/XML/1998/namespace#lang";
    pub const SPACE: &str = "http://www.w3.org/XML/1998/namespace#space";
}

pub mod xlink {
    pub const HREF: &str = "http://www.w3.org/1999/xlink#href";
}

/// Vocabulary of compiled graph paths
pub mod graph_path {
    pub const GRAPH_PATH: &str = "http://names.kitodo.org/graphpath#GraphPath";
    pub const TO: &str = "http://names.kitodo.org/graphpath#to";
    pub const PREDICATE: &str = "http://names.kitodo.org/graphpath#predicate";
    pub const OBJECT: &str = "http://names.kitodo.org/graphpath#object";
    pub const ANY_PREDICATE: &str = "http://names.kitodo.org/graphpath#anyPredicate";
}

/// First index of a node's sequence.
pub const FIRST_INDEX: u64 = 1;

/// An edge label as seen by the getters.
///
/// Relations are IRIs, except for the wildcard that selects every outgoing
/// edge. The wildcard still has a reserved IRI ([`graph_path::ANY_PREDICATE`])
/// so it can be stored as the key of a condition node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Relation {
    Any,
    Iri(Cow<'static, str>),
}

impl Relation {
    pub fn new_iri(iri: &str) -> Relation {
        Relation::from(iri)
    }

    pub const fn const_iri(iri: &'static str) -> Relation {
        Relation::Iri(Cow::Borrowed(iri))
    }

    pub fn sequence(index: u64) -> Relation {
        Relation::Iri(Cow::Owned(sequence_key(index)))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Relation::Any => graph_path::ANY_PREDICATE,
            Relation::Iri(iri) => iri,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Relation::Any)
    }
}

impl From<&str> for Relation {
    fn from(iri: &str) -> Self {
        if iri == graph_path::ANY_PREDICATE {
            Relation::Any
        } else {
            Relation::Iri(Cow::Owned(iri.to_owned()))
        }
    }
}

impl From<String> for Relation {
    fn from(iri: String) -> Self {
        if iri == graph_path::ANY_PREDICATE {
            Relation::Any
        } else {
            Relation::Iri(Cow::Owned(iri))
        }
    }
}

pub const ANY_RELATION: Relation = Relation::Any;
pub const TYPE: Relation = Relation::const_iri(rdf::TYPE);
pub const VALUE: Relation = Relation::const_iri(rdf::VALUE);

/// Returns the relation IRI for a sequence position.
pub fn sequence_key(index: u64) -> String {
    format!("{}{index}", rdf::SEQ_NO_PREFIX)
}

/// Returns the sequence position encoded in a relation, if it is a sequence
/// key.
pub fn sequence_number_of(relation: &str) -> Option<u64> {
    let digits = relation.strip_prefix(rdf::SEQ_NO_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // One key per position: `rdf:_01` is not `rdf:_1`.
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}

/// Whether the string starts with a URI scheme (`scheme:` followed by at
/// least one character).
pub fn is_uri(value: &str) -> bool {
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

/// A prefix table, mapping short prefixes to namespace IRIs and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespaces {
    prefixes: BiMap<String, String>,
}

impl Default for Namespaces {
    /// The `rdf`, `rdfs`, `xsd` and `xml` prefixes.
    fn default() -> Self {
        let mut namespaces = Namespaces::empty();
        namespaces.insert("rdf", RDF_NS);
        namespaces.insert("rdfs", RDFS_NS);
        namespaces.insert("xsd", XSD_NS);
        namespaces.insert("xml", XML_NS);
        namespaces
    }
}

impl Namespaces {
    pub fn empty() -> Namespaces {
        Namespaces {
            prefixes: BiMap::new(),
        }
    }

    /// Binds a prefix. An earlier binding of the same prefix, or of the same
    /// namespace, is replaced.
    pub fn insert(&mut self, prefix: &str, namespace: &str) {
        self.prefixes
            .insert(prefix.to_owned(), namespace.to_owned());
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get_by_left(prefix).map(String::as_str)
    }

    pub fn prefix(&self, namespace: &str) -> Option<&str> {
        self.prefixes.get_by_right(namespace).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Expands `prefix:suffix` if the prefix is bound. Anything else,
    /// including `scheme://` IRIs and unbound prefixes, is returned as is.
    pub fn expand<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let Some((prefix, suffix)) = value.split_once(':') else {
            return Cow::Borrowed(value);
        };
        if suffix.starts_with("//") {
            return Cow::Borrowed(value);
        }
        match self.namespace(prefix) {
            Some(namespace) => Cow::Owned(format!("{namespace}{suffix}")),
            None => Cow::Borrowed(value),
        }
    }

    /// Shortens an IRI to `prefix:local` using the longest bound namespace
    /// it starts with.
    pub fn abbreviate(&self, iri: &str) -> Option<String> {
        self.prefixes
            .iter()
            .filter(|(_, namespace)| iri.starts_with(namespace.as_str()))
            .max_by_key(|(_, namespace)| namespace.len())
            .map(|(prefix, namespace)| format!("{prefix}:{}", &iri[namespace.len()..]))
    }
}
