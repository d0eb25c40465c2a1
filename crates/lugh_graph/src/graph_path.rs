//! Path queries over the graph.
//!
//! A path is a whitespace separated list of steps, each going one edge
//! forward:
//!
//! ```text
//! * [rdf:type ex:Person] ex:name
//! ex:knows|ex:likes [ex:name "Alice", ex:age 42] > ex:name
//! ```
//!
//! A step names the predicates it may follow (`|` separated, `*` for any)
//! and may be followed by a condition in brackets. Inside the brackets the
//! first token names a predicate and the following tokens are values under
//! it; a comma starts over with a new predicate. Values in double quotes are
//! plain literals, bare values that expand to a URI are references, and a
//! nested bracket is a condition on a node.
//!
//! A path compiles to a small graph of its own: the root has a
//! `gp:to` edge to the first step, and every step node lists its
//! `gp:predicate`s, its `gp:object` condition and a `gp:to` edge to the next
//! step.

use std::iter::Peekable;
use std::str::Chars;

use tracing::{debug, trace, warn};

use crate::error::{LinkedDataError, Result};
use crate::literal::{Literal, NodeReference};
use crate::node::Node;
use crate::object::ObjectType;
use crate::result::ResultSet;
use crate::vocab::{Namespaces, Relation, graph_path as gp, is_uri};

/// A compiled path.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPath {
    root: Node,
}

impl GraphPath {
    /// Compiles a path, expanding prefixes with `namespaces`.
    pub fn parse(path: &str, namespaces: &Namespaces) -> Result<GraphPath> {
        let root = Node::typed(gp::GRAPH_PATH);
        let mut scanner = Scanner::new(path);
        scanner.eat_ws();
        let mut last = root.clone();
        while !scanner.at_end() {
            let step = parse_step(&mut scanner, namespaces)?;
            last.put(gp::TO, &step)?;
            last = step;
            scanner.eat_ws();
        }
        debug!(target: "graph_path", path, "compiled path");
        Ok(GraphPath { root })
    }

    /// Wraps an already compiled path graph.
    pub fn from_node(root: Node) -> GraphPath {
        GraphPath { root }
    }

    pub fn as_node(&self) -> &Node {
        &self.root
    }

    /// Whether the path has no steps, and so returns its input unchanged.
    pub fn is_identity(&self) -> bool {
        !self.root.contains_key(gp::TO)
    }

    /// Follows the path from every node of `input`.
    pub fn apply(&self, input: &ResultSet) -> Result<ResultSet> {
        let result = apply_steps(input, &self.root)?;
        debug!(
            target: "graph_path",
            input = input.len(),
            output = result.len(),
            "applied path"
        );
        Ok(result)
    }
}

fn apply_steps(input: &ResultSet, from: &Node) -> Result<ResultSet> {
    let steps = from.get(gp::TO).nodes();
    if steps.is_empty() || input.is_empty() {
        return Ok(input.clone());
    }
    let mut result = ResultSet::new();
    for step in steps {
        let predicates: Vec<Relation> = step
            .get(gp::PREDICATE)
            .iter()
            .filter_map(|predicate| {
                predicate
                    .identifier()
                    .or_else(|| predicate.literal_value().map(str::to_owned))
            })
            .map(Relation::from)
            .collect();
        let conditions: Vec<ObjectType> = step.get(gp::OBJECT).into_iter().collect();
        let mut frontier = ResultSet::new();
        for node in input.nodes() {
            frontier.union(node.get_matching(&predicates, &conditions)?)?;
        }
        trace!(target: "graph_path", frontier = frontier.len(), "step");
        result.union(apply_steps(&frontier, &step)?)?;
    }
    Ok(result)
}

struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Scanner<'a> {
        Scanner {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        self.position += 1;
        Some(c)
    }

    fn next_if(&mut self, predicate: impl FnOnce(&char) -> bool) -> Option<char> {
        let c = self.chars.next_if(predicate)?;
        self.position += 1;
        Some(c)
    }

    fn eat_ws(&mut self) {
        while self.next_if(char::is_ascii_whitespace).is_some() {}
    }

    fn eat_token(&mut self) -> Result<String> {
        let mut token = String::new();
        while let Some(c) = self.next_if(is_token_char) {
            token.push(c);
        }
        if token.is_empty() {
            return Err(self.unexpected("a predicate or value"));
        }
        Ok(token)
    }

    fn eat_quoted_string(&mut self) -> Result<String> {
        if self.next_if(|&c| c == '"').is_none() {
            return Err(self.unexpected("'\"'"));
        }
        let mut string = String::new();
        loop {
            match self.next() {
                Some('"') => return Ok(string),
                Some('\\') => match self.next() {
                    Some(c) => string.push(c),
                    None => break,
                },
                Some(c) => string.push(c),
                None => break,
            }
        }
        Err(LinkedDataError::syntax(
            self.position,
            "unterminated quoted string",
        ))
    }

    fn unexpected(&mut self, expected: &str) -> LinkedDataError {
        let found = match self.peek() {
            Some(c) => format!("'{c}'"),
            None => "end of path".to_owned(),
        };
        LinkedDataError::syntax(self.position, format!("expected {expected}, found {found}"))
    }
}

fn is_token_char(c: &char) -> bool {
    !c.is_whitespace() && !matches!(c, '[' | ']' | '|' | ',' | '"')
}

/// Rejects every direction but forward, and eats an explicit `>`.
fn eat_direction(scanner: &mut Scanner<'_>) -> Result<()> {
    let start = scanner.position;
    match scanner.peek() {
        Some('<') => Err(LinkedDataError::unsupported(start, "backward step '<'")),
        Some('|') => {
            scanner.next();
            if scanner.peek() == Some('<') {
                Err(LinkedDataError::unsupported(start, "step '|<'"))
            } else {
                Err(scanner.unexpected("a predicate"))
            }
        }
        Some('>') => {
            scanner.next();
            match scanner.peek() {
                Some('>') => Err(LinkedDataError::unsupported(start, "step '>>'")),
                Some('|') => Err(LinkedDataError::unsupported(start, "step '>|'")),
                _ => {
                    scanner.eat_ws();
                    Ok(())
                }
            }
        }
        _ => Ok(()),
    }
}

fn parse_step(scanner: &mut Scanner<'_>, namespaces: &Namespaces) -> Result<Node> {
    eat_direction(scanner)?;
    let step = Node::new();
    loop {
        let token = scanner.eat_token()?;
        let predicate = if token == "*" {
            gp::ANY_PREDICATE.to_owned()
        } else {
            expand(&token, namespaces)
        };
        step.put(gp::PREDICATE, predicate_object(predicate))?;
        if scanner.next_if(|&c| c == '|').is_none() {
            break;
        }
    }
    scanner.eat_ws();
    if scanner.next_if(|&c| c == '[').is_some() {
        let condition = parse_condition(scanner, namespaces)?;
        step.put(gp::OBJECT, condition)?;
    }
    Ok(step)
}

/// Parses the inside of a bracket, up to and including `]`.
fn parse_condition(scanner: &mut Scanner<'_>, namespaces: &Namespaces) -> Result<Node> {
    let condition = Node::new();
    let mut predicate: Option<String> = None;
    loop {
        scanner.eat_ws();
        let value: ObjectType = match scanner.peek() {
            None => {
                return Err(LinkedDataError::syntax(
                    scanner.position,
                    "unterminated condition, expected ']'",
                ));
            }
            Some(']') => {
                scanner.next();
                return Ok(condition);
            }
            Some(',') => {
                scanner.next();
                predicate = None;
                continue;
            }
            Some('[') => {
                scanner.next();
                parse_condition(scanner, namespaces)?.into()
            }
            Some('"') => Literal::plain(scanner.eat_quoted_string()?).into(),
            Some(_) => {
                let token = scanner.eat_token()?;
                if predicate.is_none() {
                    predicate = Some(if token == "*" {
                        gp::ANY_PREDICATE.to_owned()
                    } else {
                        expand(&token, namespaces)
                    });
                    continue;
                }
                let expanded = namespaces.expand(&token);
                if is_uri(&expanded) {
                    NodeReference::new(expanded).into()
                } else {
                    Literal::plain(token).into()
                }
            }
        };
        let Some(predicate) = &predicate else {
            return Err(LinkedDataError::syntax(
                scanner.position,
                "condition value without a predicate",
            ));
        };
        condition.put(predicate, value)?;
    }
}

/// Predicates that did not expand to a URI are kept as plain literals, and
/// still select edges of exactly that name.
fn predicate_object(predicate: String) -> ObjectType {
    if is_uri(&predicate) {
        NodeReference::new(predicate).into()
    } else {
        Literal::plain(predicate).into()
    }
}

fn expand(token: &str, namespaces: &Namespaces) -> String {
    let expanded = namespaces.expand(token).into_owned();
    if !is_uri(&expanded) {
        warn!(target: "graph_path", token, "predicate is not a URI");
    }
    expanded
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::GraphPath;
    use crate::error::{LinkedDataError, Result};
    use crate::literal::{Literal, NodeReference};
    use crate::node::Node;
    use crate::object::ObjectType;
    use crate::result::ResultSet;
    use crate::vocab::{Namespaces, graph_path as gp, rdf};

    const EX: &str = "http://example.org/";

    fn namespaces() -> Namespaces {
        let mut namespaces = Namespaces::default();
        namespaces.insert("ex", EX);
        namespaces
    }

    fn ex(local: &str) -> String {
        format!("{EX}{local}")
    }

    #[test]
    fn empty_path_is_identity() -> Result<()> {
        let path = GraphPath::parse("  ", &namespaces())?;
        assert!(path.is_identity());
        let input = ResultSet::from(Node::new());
        assert_eq!(path.apply(&input)?, input);
        Ok(())
    }

    #[test]
    fn compiled_shape() -> Result<()> {
        let path = GraphPath::parse("ex:a|ex:b [ex:c \"d\", ex:e ex:f [rdf:value g]] * ", &namespaces())?;
        let root = path.as_node();
        assert!(root.has_type(gp::GRAPH_PATH));
        let first = root.get(gp::TO).node()?;
        assert_eq!(
            first.get(gp::PREDICATE).leaves(),
            BTreeSet::from([ex("a"), ex("b")])
        );
        let condition = first.get(gp::OBJECT).node()?;
        assert_eq!(
            condition.get(&ex("c")),
            ResultSet::from(ObjectType::from(Literal::plain("d")))
        );
        let under_e = condition.get(&ex("e"));
        assert!(under_e.contains(&NodeReference::new(ex("f")).into()));
        let nested = under_e.node()?;
        assert_eq!(nested.get(rdf::VALUE).strings_joined(""), "g");

        let second = first.get(gp::TO).node()?;
        assert_eq!(
            second.get(gp::PREDICATE).identifiable_node()?,
            gp::ANY_PREDICATE
        );
        assert!(!second.contains_key(gp::TO));
        Ok(())
    }

    #[test]
    fn unsupported_directions() {
        for path in ["< ex:a", "ex:a >> ex:b", ">| ex:a", "ex:a |< ex:b"] {
            assert!(
                matches!(
                    GraphPath::parse(path, &namespaces()),
                    Err(LinkedDataError::Unsupported { .. })
                ),
                "{path}"
            );
        }
        assert!(GraphPath::parse("> ex:a >ex:b", &namespaces()).is_ok());
    }

    #[test]
    fn syntax_errors() {
        for path in ["ex:a [ex:b", "ex:a [\"x\"]", "ex:a [ex:b \"x]", "ex:a|", "]"] {
            assert!(
                matches!(
                    GraphPath::parse(path, &namespaces()),
                    Err(LinkedDataError::Syntax { .. })
                ),
                "{path}"
            );
        }
    }

    #[test]
    fn typed_child_with_name() -> Result<()> {
        let root = Node::new();
        let child = Node::typed(&ex("Person"));
        root.put(&ex("knows"), &child)?;
        let path = GraphPath::parse("* [rdf:type ex:Person] ex:name", &namespaces())?;
        let input = ResultSet::from(&root);

        assert!(path.apply(&input)?.is_empty());

        child.put(&ex("name"), "X")?;
        assert_eq!(
            path.apply(&input)?.strings(),
            BTreeSet::from(["X".to_owned()])
        );
        assert_eq!(root.find(&path)?.strings_joined(""), "X");
        Ok(())
    }

    #[test]
    fn alternatives_and_unions() -> Result<()> {
        let root = Node::new();
        root.put(&ex("a"), "1")?.put(&ex("b"), "2")?.put(&ex("c"), "3")?;
        let path = GraphPath::parse("ex:a|ex:b", &namespaces())?;
        assert_eq!(
            root.find(&path)?.strings(),
            BTreeSet::from(["1".to_owned(), "2".to_owned()])
        );
        let any = GraphPath::parse("*", &namespaces())?;
        assert_eq!(root.find(&any)?.len(), 3);
        Ok(())
    }

    #[test]
    fn literal_conditions_in_brackets() -> Result<()> {
        let root = Node::new();
        let alice = Node::new();
        alice.put(&ex("name"), "Alice")?.put(&ex("age"), "42")?;
        let bob = Node::new();
        bob.put(&ex("name"), "Bob")?;
        root.add(&alice)?.add(&bob)?;

        let path = GraphPath::parse("* [ex:name \"Alice\"] ex:age", &namespaces())?;
        assert_eq!(root.find(&path)?.strings_joined(""), "42");

        let path = GraphPath::parse("*[ex:name Bob]", &namespaces())?;
        assert_eq!(root.find(&path)?, ResultSet::from(&bob));
        Ok(())
    }

    #[test]
    fn bare_names_select_edges_of_that_name() -> Result<()> {
        let root = Node::new();
        root.put("name", "Alice")?.put(&ex("name"), "Bob")?;

        let path = GraphPath::parse("name", &Namespaces::default())?;
        let first = path.as_node().get(gp::TO).node()?;
        assert_eq!(
            first.get(gp::PREDICATE),
            ResultSet::from(ObjectType::from(Literal::plain("name")))
        );
        assert_eq!(root.find(&path)?.strings_joined(""), "Alice");

        let mixed = GraphPath::parse("name|ex:name", &namespaces())?;
        assert_eq!(
            root.find(&mixed)?.strings(),
            BTreeSet::from(["Alice".to_owned(), "Bob".to_owned()])
        );
        Ok(())
    }
}
