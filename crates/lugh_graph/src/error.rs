/// Errors raised by the graph store, the path compiler and the triple bridge.
///
/// Looking something up that is not there is never an error; getters return
/// an empty [`ResultSet`](crate::ResultSet) instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkedDataError {
    /// A reducer expected exactly one value and found none.
    #[error("no data")]
    NoData,

    /// A reducer or a matcher expected exactly one value and found several.
    #[error("ambiguous data: {0}")]
    AmbiguousData(String),

    /// The relation cannot be written with `put`.
    #[error("forbidden relation {relation}: {reason}")]
    ForbiddenRelation { relation: String, reason: String },

    #[error("{datatype} is not a valid literal type")]
    InvalidLiteralType { datatype: String },

    #[error("language tag must not be empty")]
    EmptyLanguage,

    #[error("invalid language tag {0:?}")]
    InvalidLanguage(String),

    /// Several distinct node objects carry the same identifier.
    #[error("merging nodes not yet implemented: {identifier}")]
    MergeUnsupported { identifier: String },

    #[error("the empty result is immutable")]
    ImmutableResult,

    #[error("syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("{construct} at position {position} is not supported")]
    Unsupported { position: usize, construct: String },

    #[error("N-Triples error on line {line}: {message}")]
    NTriples { line: usize, message: String },

    /// A node would need a sequence index past `u64::MAX`.
    #[error("sequence index overflow")]
    SequenceOverflow,

    #[error("{0:?} is not an absolute IRI")]
    InvalidIri(String),

    /// The graph cannot be laid out as an XML tree.
    #[error("cannot write XML: {0}")]
    Xml(String),
}

pub type Result<T> = std::result::Result<T, LinkedDataError>;

impl LinkedDataError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub fn unsupported(position: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            position,
            construct: construct.into(),
        }
    }

    pub fn ntriples(line: usize, message: impl Into<String>) -> Self {
        Self::NTriples {
            line,
            message: message.into(),
        }
    }

    pub fn ambiguous(message: impl Into<String>) -> Self {
        Self::AmbiguousData(message.into())
    }
}
