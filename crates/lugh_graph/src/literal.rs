use std::fmt;

use crate::error::{LinkedDataError, Result};
use crate::lang::Locale;
use crate::vocab::{Namespaces, XSD_NS, is_uri, rdf, xsd};

/// A typed leaf value.
///
/// The type is always set. An empty type and `xsd:string` both normalise to
/// `rdf:PlainLiteral`, so `Literal::new("x", "")` and
/// `Literal::new("x", xsd::STRING)` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Literal {
    value: String,
    datatype: String,
}

impl Literal {
    /// Creates a literal of one of `rdf:PlainLiteral`, `rdf:HTML`,
    /// `rdf:XMLLiteral` or any XML Schema datatype.
    pub fn new(value: impl Into<String>, datatype: &str) -> Result<Literal> {
        let datatype = match datatype {
            "" | xsd::STRING => rdf::PLAIN_LITERAL,
            rdf::PLAIN_LITERAL | rdf::HTML | rdf::XML_LITERAL => datatype,
            _ if datatype.starts_with(XSD_NS) && datatype.len() > XSD_NS.len() => datatype,
            _ => {
                return Err(LinkedDataError::InvalidLiteralType {
                    datatype: datatype.to_owned(),
                });
            }
        };
        Ok(Literal {
            value: value.into(),
            datatype: datatype.to_owned(),
        })
    }

    pub fn plain(value: impl Into<String>) -> Literal {
        Literal {
            value: value.into(),
            datatype: rdf::PLAIN_LITERAL.to_owned(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn datatype(&self) -> &str {
        &self.datatype
    }

    pub fn is_plain(&self) -> bool {
        self.datatype == rdf::PLAIN_LITERAL
    }

    /// Literal-against-literal matching. The condition's value only
    /// constrains when it is non-empty.
    pub fn matches_literal(&self, condition: &Literal) -> bool {
        self.datatype == condition.datatype
            && (condition.value.is_empty() || self.value == condition.value)
    }

    fn is_bare(&self) -> bool {
        matches!(
            self.datatype.as_str(),
            xsd::BOOLEAN
                | xsd::INTEGER
                | xsd::DECIMAL
                | xsd::DOUBLE
                | xsd::FLOAT
                | xsd::LONG
                | xsd::INT
                | xsd::SHORT
                | xsd::BYTE
                | xsd::NON_NEGATIVE_INTEGER
                | xsd::POSITIVE_INTEGER
                | xsd::NEGATIVE_INTEGER
                | xsd::NON_POSITIVE_INTEGER
                | xsd::UNSIGNED_LONG
                | xsd::UNSIGNED_INT
                | xsd::UNSIGNED_SHORT
                | xsd::UNSIGNED_BYTE
        )
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_plain() {
            return write!(f, "\"{}\"", self.value);
        }
        if self.is_bare() {
            return f.write_str(&self.value);
        }
        match Namespaces::default().abbreviate(&self.datatype) {
            Some(datatype) => write!(f, "\"{}\"^^{datatype}", self.value),
            None => write!(f, "\"{}\"^^<{}>", self.value, self.datatype),
        }
    }
}

/// A string in a natural language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LangString {
    value: String,
    locale: Locale,
}

impl LangString {
    pub fn new(value: impl Into<String>, language: &str) -> Result<LangString> {
        Ok(LangString {
            value: value.into(),
            locale: Locale::parse(language)?,
        })
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    pub fn language(&self) -> String {
        self.locale.to_string()
    }

    pub fn datatype(&self) -> &'static str {
        rdf::LANG_STRING
    }

    /// A language string also satisfies plain literal conditions, in the
    /// sense of RDF 1.0 plain literals carrying an optional language.
    pub fn matches_literal(&self, condition: &Literal) -> bool {
        matches!(condition.datatype(), rdf::PLAIN_LITERAL | rdf::LANG_STRING)
            && (condition.value.is_empty() || self.value == condition.value)
    }

    pub fn matches_lang_string(&self, condition: &LangString) -> bool {
        (condition.value.is_empty() || self.value == condition.value)
            && condition.locale.covers(&self.locale)
    }
}

impl fmt::Display for LangString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"@{}", self.value, self.locale)
    }
}

/// A pointer to a named node, by identifier only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeReference {
    identifier: String,
}

impl NodeReference {
    pub fn new(identifier: impl Into<String>) -> NodeReference {
        let identifier = identifier.into();
        debug_assert!(is_uri(&identifier), "not a URI: {identifier:?}");
        NodeReference { identifier }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for NodeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.identifier)
    }
}
