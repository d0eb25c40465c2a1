use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::error::{LinkedDataError, Result};
use crate::graph_path::GraphPath;
use crate::literal::{Literal, NodeReference};
use crate::object::{Kind, ObjectType};
use crate::result::ResultSet;
use crate::vocab::{
    FIRST_INDEX, Relation, graph_path, is_uri, rdf, sequence_key, sequence_number_of,
};

/// A vertex of the graph.
///
/// `Node` is a shared handle: cloning it yields another handle to the same
/// vertex, and a mutation through any handle is visible through all of
/// them. This is what lets a graph contain cycles. A node created with
/// [`Node::named`] carries an identifier for its whole lifetime and compares
/// equal to every node with the same identifier, whatever its edges;
/// anonymous nodes compare by their edges.
#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

#[derive(Default)]
struct NodeData {
    identifier: Option<String>,
    edges: BTreeMap<String, Vec<ObjectType>>,
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}

impl Node {
    pub fn new() -> Node {
        Node(Rc::new(RefCell::new(NodeData::default())))
    }

    pub fn named(identifier: impl Into<String>) -> Node {
        let identifier = identifier.into();
        debug_assert!(is_uri(&identifier), "not a URI: {identifier:?}");
        Node(Rc::new(RefCell::new(NodeData {
            identifier: Some(identifier),
            edges: BTreeMap::new(),
        })))
    }

    /// Creates an anonymous node with an `rdf:type`.
    pub fn typed(rdf_type: &str) -> Node {
        let node = Node::new();
        node.insert(rdf::TYPE, NodeReference::new(rdf_type).into());
        node
    }

    pub fn identifier(&self) -> Option<String> {
        self.0.borrow().identifier.clone()
    }

    pub fn is_named(&self) -> bool {
        self.0.borrow().identifier.is_some()
    }

    /// An address identifying the vertex while it is alive.
    pub(crate) fn key(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Whether both handles point to the same vertex.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn relations(&self) -> Vec<String> {
        self.0.borrow().edges.keys().cloned().collect()
    }

    /// A snapshot of all edges, relations in order.
    pub fn edges(&self) -> Vec<(String, Vec<ObjectType>)> {
        self.0
            .borrow()
            .edges
            .iter()
            .map(|(relation, objects)| (relation.clone(), objects.clone()))
            .collect()
    }

    /// All objects of all relations.
    pub fn children(&self) -> Vec<ObjectType> {
        self.0.borrow().edges.values().flatten().cloned().collect()
    }

    pub fn contains_key(&self, relation: &str) -> bool {
        self.0.borrow().edges.contains_key(relation)
    }

    pub fn contains(&self, object: &ObjectType) -> bool {
        self.children().iter().any(|child| child == object)
    }

    /// Number of edges.
    pub fn size(&self) -> usize {
        self.0.borrow().edges.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().edges.is_empty()
    }

    fn objects(&self, relation: &str) -> Vec<ObjectType> {
        self.0
            .borrow()
            .edges
            .get(relation)
            .cloned()
            .unwrap_or_default()
    }

    fn insert(&self, relation: &str, object: ObjectType) {
        self.0
            .borrow_mut()
            .edges
            .entry(relation.to_owned())
            .or_default()
            .push(object);
    }

    pub fn get(&self, relation: &str) -> ResultSet {
        self.objects(relation).into_iter().collect()
    }

    /// Returns the objects under any of `relations` that satisfy every
    /// condition. No relations means any relation; no conditions means any
    /// object. References carry no content, so they are never returned when
    /// there are conditions.
    pub fn get_matching(
        &self,
        relations: &[Relation],
        conditions: &[ObjectType],
    ) -> Result<ResultSet> {
        let any = [Relation::Any];
        let relations = if relations.is_empty() {
            &any[..]
        } else {
            relations
        };
        let mut result = ResultSet::new();
        for relation in relations {
            let candidates = match relation {
                Relation::Any => self.children(),
                Relation::Iri(iri) => self.objects(iri),
            };
            for candidate in candidates {
                if conditions.is_empty() {
                    result.push(candidate);
                } else if candidate.is(Kind::AccessibleObject)
                    && satisfies_all(&candidate, conditions)?
                {
                    result.push(candidate);
                }
            }
        }
        Ok(result)
    }

    /// Whether this node holds at least the data of `condition`.
    ///
    /// Every object of every relation of the condition must be matched by
    /// some object of this node under the same relation. One object may
    /// satisfy several condition objects at once. A named condition also
    /// requires the same identifier.
    pub fn matches(&self, condition: &ObjectType) -> Result<bool> {
        let condition = match condition {
            ObjectType::Node(node) => node,
            ObjectType::NodeReference(reference) => {
                return Ok(self.identifier().as_deref() == Some(reference.identifier()));
            }
            _ => return Ok(false),
        };
        if self.ptr_eq(condition) {
            return Ok(true);
        }
        if let Some(identifier) = condition.identifier() {
            if self.identifier() != Some(identifier) {
                return Ok(false);
            }
        }
        for (relation, expected) in condition.edges() {
            let candidates = if relation == graph_path::ANY_PREDICATE {
                self.children()
            } else {
                let related = self.0.borrow().edges.get(&relation).cloned();
                let Some(related) = related else {
                    return Ok(false);
                };
                related
            };
            let mut remaining = expected;
            for candidate in candidates {
                if remaining.is_empty() {
                    break;
                }
                let mut unmatched = Vec::with_capacity(remaining.len());
                for condition in remaining {
                    if !candidate.matches(&condition)? {
                        unmatched.push(condition);
                    }
                }
                remaining = unmatched;
            }
            if !remaining.is_empty() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Sequence indices in use, ascending.
    fn indices(&self) -> Vec<u64> {
        let mut indices: Vec<u64> = self
            .0
            .borrow()
            .edges
            .keys()
            .filter_map(|key| sequence_number_of(key))
            .collect();
        indices.sort_unstable();
        indices
    }

    /// The lowest and highest sequence index in use.
    pub fn range(&self) -> Option<(u64, u64)> {
        let indices = self.indices();
        Some((*indices.first()?, *indices.last()?))
    }

    pub fn first(&self) -> Option<u64> {
        self.range().map(|(first, _)| first)
    }

    pub fn last(&self) -> Option<u64> {
        self.range().map(|(_, last)| last)
    }

    pub fn get_at(&self, index: u64) -> ResultSet {
        self.get(&sequence_key(index))
    }

    pub fn get_first(&self) -> ResultSet {
        self.first().map(|i| self.get_at(i)).unwrap_or_default()
    }

    pub fn get_last(&self) -> ResultSet {
        self.last().map(|i| self.get_at(i)).unwrap_or_default()
    }

    /// One result per position from the first to the last index, empty for
    /// gaps.
    pub fn get_enumerated(&self) -> Vec<ResultSet> {
        match self.range() {
            Some((first, last)) => (first..=last).map(|i| self.get_at(i)).collect(),
            None => vec![],
        }
    }

    /// Appends after the last index in use. Fails if that index is
    /// `u64::MAX`.
    pub fn add(&self, object: impl Into<ObjectType>) -> Result<&Node> {
        let index = match self.last() {
            Some(last) => last.checked_add(1).ok_or(LinkedDataError::SequenceOverflow)?,
            None => FIRST_INDEX,
        };
        Ok(self.set(index, object))
    }

    /// Inserts at `index`, moving every entry at or above it one up.
    pub fn add_at(&self, index: u64, object: impl Into<ObjectType>) -> Result<&Node> {
        let object = object.into();
        let moved: Vec<u64> = self.indices().into_iter().filter(|&i| i >= index).collect();
        if moved.last() == Some(&u64::MAX) {
            return Err(LinkedDataError::SequenceOverflow);
        }
        {
            let mut data = self.0.borrow_mut();
            for i in moved.into_iter().rev() {
                if let Some(objects) = data.edges.remove(&sequence_key(i)) {
                    data.edges.insert(sequence_key(i + 1), objects);
                }
            }
            data.edges.insert(sequence_key(index), vec![object]);
        }
        Ok(self)
    }

    pub fn add_first(&self, object: impl Into<ObjectType>) -> Result<&Node> {
        self.add_at(FIRST_INDEX, object)
    }

    pub fn add_all<T: Into<ObjectType>>(
        &self,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<&Node> {
        for object in objects {
            self.add(object)?;
        }
        Ok(self)
    }

    /// Stores `object` at `index`, replacing whatever was there.
    pub fn set(&self, index: u64, object: impl Into<ObjectType>) -> &Node {
        let object = object.into();
        self.0
            .borrow_mut()
            .edges
            .insert(sequence_key(index), vec![object]);
        self
    }

    /// Adds an object under a relation. The identity of a node cannot be
    /// written this way; use [`Node::named`].
    pub fn put(&self, relation: &str, object: impl Into<ObjectType>) -> Result<&Node> {
        check_writable(relation)?;
        self.insert(relation, object.into());
        Ok(self)
    }

    pub fn put_all<T: Into<ObjectType>>(
        &self,
        relation: &str,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<&Node> {
        let objects: Vec<ObjectType> = objects.into_iter().map(Into::into).collect();
        if objects.is_empty() {
            return Ok(self);
        }
        check_writable(relation)?;
        self.0
            .borrow_mut()
            .edges
            .entry(relation.to_owned())
            .or_default()
            .extend(objects);
        Ok(self)
    }

    /// Replaces all objects of a relation, returning the previous ones.
    pub fn replace<T: Into<ObjectType>>(
        &self,
        relation: &str,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<ResultSet> {
        check_writable(relation)?;
        let previous = self.remove_all(relation);
        self.put_all(relation, objects)?;
        Ok(previous)
    }

    /// Removes the first object equal to `object`, under any relation.
    pub fn remove(&self, object: &ObjectType) -> bool {
        let found = self.0.borrow().edges.iter().find_map(|(relation, objects)| {
            objects
                .iter()
                .position(|o| o == object)
                .map(|position| (relation.clone(), position))
        });
        match found {
            Some((relation, position)) => {
                self.take(&relation, position);
                true
            }
            None => false,
        }
    }

    pub fn remove_all(&self, relation: &str) -> ResultSet {
        let removed = self.0.borrow_mut().edges.remove(relation);
        removed.unwrap_or_default().into_iter().collect()
    }

    /// Removes the element at the first index and moves the following
    /// elements one down.
    pub fn remove_first(&self) -> ResultSet {
        let Some(first) = self.first() else {
            return ResultSet::default();
        };
        let removed = {
            let mut data = self.0.borrow_mut();
            let removed = data.edges.remove(&sequence_key(first));
            compact(&mut data.edges, first);
            removed
        };
        removed.unwrap_or_default().into_iter().collect()
    }

    /// Removes the element at the last index. Unlike
    /// [`remove_first`](Node::remove_first), nothing is moved.
    pub fn remove_last(&self) -> ResultSet {
        let Some(last) = self.last() else {
            return ResultSet::default();
        };
        self.remove_all(&sequence_key(last))
    }

    pub fn remove_first_occurrence(&self, object: &ObjectType) -> bool {
        let indices = self.indices();
        self.remove_occurrence(indices.into_iter(), object)
    }

    pub fn remove_last_occurrence(&self, object: &ObjectType) -> bool {
        let indices = self.indices();
        self.remove_occurrence(indices.into_iter().rev(), object)
    }

    fn remove_occurrence(&self, mut indices: impl Iterator<Item = u64>, object: &ObjectType) -> bool {
        let found = {
            let data = self.0.borrow();
            let found = indices.find_map(|index| {
                data.edges
                    .get(&sequence_key(index))
                    .and_then(|objects| objects.iter().position(|o| o == object))
                    .map(|position| (index, position))
            });
            found
        };
        let Some((index, position)) = found else {
            return false;
        };
        if self.take(&sequence_key(index), position) {
            compact(&mut self.0.borrow_mut().edges, index);
        }
        true
    }

    /// Removes one object, dropping the relation once empty. Returns
    /// whether the relation was dropped.
    fn take(&self, relation: &str, position: usize) -> bool {
        let mut data = self.0.borrow_mut();
        let Some(objects) = data.edges.get_mut(relation) else {
            return false;
        };
        objects.remove(position);
        if objects.is_empty() {
            data.edges.remove(relation);
            return true;
        }
        false
    }

    /// Makes this node hold a single plain literal: sequence entries and
    /// child nodes are dropped, other attributes are kept.
    pub fn set_value(&self, value: &str) -> &Node {
        {
            let mut data = self.0.borrow_mut();
            data.edges
                .retain(|relation, _| sequence_number_of(relation).is_none());
            for objects in data.edges.values_mut() {
                objects.retain(|object| !object.is(Kind::Node));
            }
            data.edges.retain(|_, objects| !objects.is_empty());
            data.edges.insert(
                sequence_key(FIRST_INDEX),
                vec![Literal::plain(value).into()],
            );
        }
        self
    }

    /// The single `rdf:type` of this node.
    pub fn get_type(&self) -> Result<String> {
        self.get(rdf::TYPE)
            .singleton(Kind::IdentifiableNode)?
            .identifier()
            .ok_or(LinkedDataError::NoData)
    }

    pub fn has_type(&self, rdf_type: &str) -> bool {
        self.objects(rdf::TYPE)
            .iter()
            .any(|t| t.identifier().as_deref() == Some(rdf_type))
    }

    /// The nodes under `relation` having the given type.
    pub fn get_with_type(&self, relation: &str, rdf_type: &str) -> ResultSet {
        self.objects(relation)
            .into_iter()
            .filter(|object| object.as_node().is_some_and(|node| node.has_type(rdf_type)))
            .collect()
    }

    /// The child nodes having the given type, under any relation.
    pub fn get_by_type(&self, rdf_type: &str) -> ResultSet {
        self.children()
            .into_iter()
            .filter(|object| object.as_node().is_some_and(|node| node.has_type(rdf_type)))
            .collect()
    }

    /// The child nodes having the given type and `id_value` among the
    /// values of `id_relation`.
    pub fn get_by_type_and_id(
        &self,
        rdf_type: &str,
        id_relation: &str,
        id_value: &str,
    ) -> ResultSet {
        self.children()
            .into_iter()
            .filter(|object| {
                object.as_node().is_some_and(|node| {
                    node.has_type(rdf_type) && node.get(id_relation).strings().contains(id_value)
                })
            })
            .collect()
    }

    /// The named child node with the given identifier.
    pub fn get_by_identifier(&self, identifier: &str) -> Result<Node> {
        let mut found: Vec<Node> = vec![];
        for child in self.children() {
            let ObjectType::Node(node) = child else {
                continue;
            };
            if node.identifier().as_deref() == Some(identifier)
                && !found.iter().any(|n| n.ptr_eq(&node))
            {
                found.push(node);
            }
        }
        match found.len() {
            0 => Err(LinkedDataError::NoData),
            1 => Ok(found.remove(0)),
            _ => Err(LinkedDataError::MergeUnsupported {
                identifier: identifier.to_owned(),
            }),
        }
    }

    /// Replaces named child nodes without edges by references to them.
    pub(crate) fn collapse_empty_named_nodes(&self) {
        let edges = self.edges();
        let mut changed = false;
        let mut collapsed = BTreeMap::new();
        for (relation, objects) in edges {
            let mut kept = Vec::with_capacity(objects.len());
            let mut references = vec![];
            for object in objects {
                match &object {
                    ObjectType::Node(node) if node.is_named() && node.is_empty() => {
                        if let Some(identifier) = node.identifier() {
                            references.push(NodeReference::new(identifier).into());
                        }
                        changed = true;
                    }
                    _ => kept.push(object),
                }
            }
            kept.extend(references);
            collapsed.insert(relation, kept);
        }
        if changed {
            self.0.borrow_mut().edges = collapsed;
        }
    }

    /// Turns ordered, typed content into named attributes.
    ///
    /// Child nodes under sequence keys or `rdf:value` that have exactly one
    /// type are moved under that type (their type removed); other such
    /// children stay where they are. Leaves under sequence keys go to
    /// `rdf:value`. A result holding nothing but one literal under
    /// `rdf:value` is replaced by that literal.
    pub fn as_unordered(&self, remove_type: bool) -> ObjectType {
        let result = match self.identifier() {
            Some(identifier) => Node::named(identifier),
            None => Node::new(),
        };
        for (relation, objects) in self.edges() {
            if remove_type && relation == rdf::TYPE {
                continue;
            }
            if relation.starts_with(rdf::SEQ_NO_PREFIX) || relation == rdf::VALUE {
                for object in objects {
                    match &object {
                        ObjectType::Node(child) => match child.get_type() {
                            Ok(rdf_type) => result.insert(&rdf_type, child.as_unordered(true)),
                            Err(_) => result.insert(&relation, child.as_unordered(false)),
                        },
                        _ => result.insert(rdf::VALUE, object),
                    }
                }
            } else {
                result
                    .0
                    .borrow_mut()
                    .edges
                    .entry(relation)
                    .or_default()
                    .extend(objects);
            }
        }
        if result.relations() == [rdf::VALUE] {
            let values = result.objects(rdf::VALUE);
            if let [value] = values.as_slice() {
                if value.is(Kind::Literal) {
                    return value.clone();
                }
            }
        }
        ObjectType::Node(result)
    }

    /// Evaluates a compiled path starting at this node.
    pub fn find(&self, path: &GraphPath) -> Result<ResultSet> {
        path.apply(&ResultSet::from(self))
    }

    fn write_tree(
        &self,
        f: &mut fmt::Formatter<'_>,
        indent: usize,
        visiting: &mut Vec<*const RefCell<NodeData>>,
    ) -> fmt::Result {
        let pad = " ".repeat(indent);
        if let Some(identifier) = self.identifier() {
            writeln!(f, "{pad}[{identifier}]")?;
        }
        let ptr = Rc::as_ptr(&self.0);
        if visiting.contains(&ptr) {
            return writeln!(f, "{pad}...");
        }
        visiting.push(ptr);
        let (mut elements, attributes): (Vec<_>, Vec<_>) = self
            .edges()
            .into_iter()
            .partition(|(relation, _)| sequence_number_of(relation).is_some());
        elements.sort_by_key(|(relation, _)| sequence_number_of(relation));
        for (relation, objects) in attributes.into_iter().chain(elements) {
            for object in objects {
                match object {
                    ObjectType::Node(child) => {
                        writeln!(f, "{pad}{relation} {{")?;
                        child.write_tree(f, indent + 2, visiting)?;
                        writeln!(f, "{pad}}}")?;
                    }
                    leaf => writeln!(f, "{pad}{relation} = {leaf}")?,
                }
            }
        }
        visiting.pop();
        Ok(())
    }
}

fn check_writable(relation: &str) -> Result<()> {
    if relation == rdf::ABOUT {
        return Err(LinkedDataError::ForbiddenRelation {
            relation: relation.to_owned(),
            reason: "use Node::named to create a node with an identity".to_owned(),
        });
    }
    Ok(())
}

fn satisfies_all(candidate: &ObjectType, conditions: &[ObjectType]) -> Result<bool> {
    for condition in conditions {
        if !candidate.matches(condition)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Closes the gap at `index` by moving the contiguous run above it one down.
fn compact(edges: &mut BTreeMap<String, Vec<ObjectType>>, index: u64) {
    let mut previous = index;
    while let Some(next) = previous.checked_add(1) {
        let Some(objects) = edges.remove(&sequence_key(next)) else {
            break;
        };
        edges.insert(sequence_key(previous), objects);
        previous = next;
    }
}

fn same_multiset(left: &[ObjectType], right: &[ObjectType]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut used = vec![false; right.len()];
    for object in left {
        let Some(i) = (0..right.len()).find(|&i| !used[i] && right[i] == *object) else {
            return false;
        };
        used[i] = true;
    }
    true
}

thread_local! {
    static COMPARING: RefCell<Vec<(usize, usize)>> = const { RefCell::new(Vec::new()) };
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (this, that) = (self.0.borrow(), other.0.borrow());
        match (&this.identifier, &that.identifier) {
            (Some(a), Some(b)) => a == b,
            (None, None) => {
                // A pair met again further down a cycle is taken as equal.
                let pair = (self.key(), other.key());
                if COMPARING.with_borrow(|pairs| pairs.contains(&pair)) {
                    return true;
                }
                COMPARING.with_borrow_mut(|pairs| pairs.push(pair));
                let equal = this.edges.len() == that.edges.len()
                    && this.edges.iter().all(|(relation, objects)| {
                        that.edges
                            .get(relation)
                            .is_some_and(|others| same_multiset(objects, others))
                    });
                COMPARING.with_borrow_mut(|pairs| pairs.pop());
                equal
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("identifier", &data.identifier)
            .field("relations", &data.edges.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_tree(f, 0, &mut vec![])
    }
}
