use std::collections::BTreeSet;

use crate::error::{LinkedDataError, Result};
use crate::literal::NodeReference;
use crate::node::Node;
use crate::object::{Kind, ObjectType};

/// The objects found by a getter, a path or an import.
///
/// Order is irrelevant and equal objects are kept only once.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    items: Vec<ObjectType>,
    frozen: bool,
}

impl ResultSet {
    /// The empty result. It rejects [`add`](ResultSet::add).
    pub const EMPTY: ResultSet = ResultSet {
        items: Vec::new(),
        frozen: true,
    };

    pub fn new() -> ResultSet {
        ResultSet::default()
    }

    /// Adds an object unless an equal one is present. Returns whether it was
    /// added.
    pub fn add(&mut self, object: impl Into<ObjectType>) -> Result<bool> {
        if self.frozen {
            return Err(LinkedDataError::ImmutableResult);
        }
        Ok(self.push(object.into()))
    }

    pub(crate) fn push(&mut self, object: ObjectType) -> bool {
        if self.items.contains(&object) {
            return false;
        }
        self.items.push(object);
        true
    }

    /// Adds all objects of `other`.
    pub fn union(&mut self, other: ResultSet) -> Result<()> {
        if self.frozen && !other.is_empty() {
            return Err(LinkedDataError::ImmutableResult);
        }
        for object in other.items {
            self.push(object);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ObjectType> {
        self.items.iter()
    }

    pub fn contains(&self, object: &ObjectType) -> bool {
        self.items.contains(object)
    }

    /// Counts objects of a kind, stopping once `limit` is reached.
    pub fn count(&self, kind: Kind, limit: usize) -> usize {
        self.items
            .iter()
            .filter(|object| object.is(kind))
            .take(limit)
            .count()
    }

    /// The objects of a kind.
    pub fn subset(&self, kind: Kind) -> ResultSet {
        self.items
            .iter()
            .filter(|object| object.is(kind))
            .cloned()
            .collect()
    }

    pub fn is_any(&self, kind: Kind) -> bool {
        self.count(kind, 1) == 1
    }

    pub fn is_unique(&self) -> bool {
        self.items.len() == 1
    }

    /// Whether exactly one object of the kind is present.
    pub fn is_singleton(&self, kind: Kind) -> bool {
        self.count(kind, 2) == 1
    }

    /// The one object of a kind.
    pub fn singleton(&self, kind: Kind) -> Result<ObjectType> {
        let mut found = self.items.iter().filter(|object| object.is(kind));
        match (found.next(), found.next()) {
            (None, _) => Err(LinkedDataError::NoData),
            (Some(object), None) => Ok(object.clone()),
            (Some(_), Some(_)) => Err(LinkedDataError::ambiguous(format!(
                "more than one {kind:?} in result"
            ))),
        }
    }

    /// The only object, or `default` if there is none.
    pub fn or_else(&self, default: impl Into<ObjectType>) -> Result<ObjectType> {
        match self.singleton(Kind::Any) {
            Err(LinkedDataError::NoData) => Ok(default.into()),
            found => found,
        }
    }

    pub fn node(&self) -> Result<Node> {
        match self.singleton(Kind::Node)? {
            ObjectType::Node(node) => Ok(node),
            _ => Err(LinkedDataError::NoData),
        }
    }

    pub fn literal(&self) -> Result<ObjectType> {
        self.singleton(Kind::Literal)
    }

    /// The identifier of the one named node or reference.
    pub fn identifiable_node(&self) -> Result<String> {
        self.singleton(Kind::IdentifiableNode)?
            .identifier()
            .ok_or(LinkedDataError::NoData)
    }

    pub fn nodes(&self) -> Vec<Node> {
        self.items
            .iter()
            .filter_map(|object| object.as_node().cloned())
            .collect()
    }

    pub fn literals(&self) -> Vec<ObjectType> {
        self.subset(Kind::Literal).items
    }

    pub fn node_references(&self) -> Vec<NodeReference> {
        self.items
            .iter()
            .filter_map(|object| match object {
                ObjectType::NodeReference(reference) => Some(reference.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn identifiable_nodes(&self) -> Vec<ObjectType> {
        self.subset(Kind::IdentifiableNode).items
    }

    /// The values of all literals.
    pub fn strings(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter_map(|object| object.literal_value().map(str::to_owned))
            .collect()
    }

    /// The values of all literals and the identifiers of all references.
    pub fn leaves(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .filter_map(|object| match object {
                ObjectType::NodeReference(reference) => Some(reference.identifier().to_owned()),
                other => other.literal_value().map(str::to_owned),
            })
            .collect()
    }

    pub fn strings_joined(&self, separator: &str) -> String {
        Vec::from_iter(self.strings()).join(separator)
    }

    pub fn leaves_joined(&self, separator: &str) -> String {
        Vec::from_iter(self.leaves()).join(separator)
    }
}

impl PartialEq for ResultSet {
    fn eq(&self, other: &Self) -> bool {
        self.items.len() == other.items.len()
            && self.items.iter().all(|object| other.items.contains(object))
    }
}

impl FromIterator<ObjectType> for ResultSet {
    fn from_iter<T: IntoIterator<Item = ObjectType>>(iter: T) -> Self {
        let mut result = ResultSet::new();
        for object in iter {
            result.push(object);
        }
        result
    }
}

impl IntoIterator for ResultSet {
    type Item = ObjectType;
    type IntoIter = std::vec::IntoIter<ObjectType>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ObjectType;
    type IntoIter = std::slice::Iter<'a, ObjectType>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl From<ObjectType> for ResultSet {
    fn from(object: ObjectType) -> Self {
        ResultSet {
            items: vec![object],
            frozen: false,
        }
    }
}

impl From<&Node> for ResultSet {
    fn from(node: &Node) -> Self {
        ResultSet::from(ObjectType::from(node))
    }
}

impl From<Node> for ResultSet {
    fn from(node: Node) -> Self {
        ResultSet::from(ObjectType::from(node))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::ResultSet;
    use crate::error::{LinkedDataError, Result};
    use crate::literal::{LangString, Literal, NodeReference};
    use crate::node::Node;
    use crate::object::{Kind, ObjectType};

    fn sample() -> Result<ResultSet> {
        let mut result = ResultSet::new();
        result.add(Literal::plain("b"))?;
        result.add(LangString::new("a", "en")?)?;
        result.add(NodeReference::new("http://example.org/c"))?;
        result.add(Node::new())?;
        Ok(result)
    }

    #[test]
    fn equal_objects_are_kept_once() -> Result<()> {
        let mut result = ResultSet::new();
        assert!(result.add("x")?);
        assert!(!result.add("x")?);
        assert!(result.add(Node::new())?);
        assert!(!result.add(Node::new())?);
        assert_eq!(result.len(), 2);
        Ok(())
    }

    #[test]
    fn empty_is_immutable() {
        let mut empty = ResultSet::EMPTY;
        assert_eq!(empty.add("x"), Err(LinkedDataError::ImmutableResult));
        assert!(empty.union(ResultSet::new()).is_ok());
        assert!(empty.is_empty());
        assert_eq!(empty, ResultSet::new());
    }

    #[test]
    fn order_does_not_matter() {
        let one: ResultSet = ["a", "b"].map(ObjectType::from).into_iter().collect();
        let other: ResultSet = ["b", "a"].map(ObjectType::from).into_iter().collect();
        assert_eq!(one, other);
    }

    #[test]
    fn strings_and_leaves() -> Result<()> {
        let result = sample()?;
        assert_eq!(
            result.strings(),
            BTreeSet::from(["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(result.leaves().len(), 3);
        assert!(result.leaves().contains("http://example.org/c"));
        assert_eq!(result.strings_joined(", "), "a, b");
        assert_eq!(result.leaves_joined(" ; "), "a ; b ; http://example.org/c");
        Ok(())
    }

    #[test]
    fn counting_stops_at_the_limit() -> Result<()> {
        let result = sample()?;
        assert_eq!(result.count(Kind::Any, usize::MAX), 4);
        assert_eq!(result.count(Kind::Any, 2), 2);
        assert_eq!(result.count(Kind::Literal, usize::MAX), 2);
        assert_eq!(result.count(Kind::NodeType, usize::MAX), 2);
        assert_eq!(result.subset(Kind::LangString).len(), 1);
        Ok(())
    }

    #[test]
    fn singletons() -> Result<()> {
        let result = sample()?;
        assert!(result.is_singleton(Kind::Node));
        assert!(!result.is_singleton(Kind::Literal));
        assert!(result.is_any(Kind::LangString));
        assert!(!result.is_any(Kind::NamedNode));
        assert!(!result.is_unique());
        assert!(result.node()?.is_empty());
        assert_eq!(result.identifiable_node()?, "http://example.org/c");
        assert!(matches!(
            result.literal(),
            Err(LinkedDataError::AmbiguousData(_))
        ));
        assert_eq!(ResultSet::new().node(), Err(LinkedDataError::NoData));
        assert_eq!(result.nodes().len(), 1);
        assert_eq!(result.literals().len(), 2);
        assert_eq!(result.node_references().len(), 1);
        assert_eq!(result.identifiable_nodes().len(), 1);
        Ok(())
    }

    #[test]
    fn or_else() -> Result<()> {
        assert_eq!(ResultSet::new().or_else("d")?, ObjectType::from("d"));
        assert_eq!(ResultSet::from(ObjectType::from("x")).or_else("d")?, ObjectType::from("x"));
        assert!(sample()?.or_else("d").is_err());
        Ok(())
    }
}
