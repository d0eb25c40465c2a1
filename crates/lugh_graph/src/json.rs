//! Rendering of graph objects as JSON-LD shaped values.

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value as JsonValue, json};

use crate::object::ObjectType;
use crate::result::ResultSet;
use crate::vocab::Namespaces;

/// Nesting depth at which rendering stops. Deeper named nodes are cut down
/// to their `@id`, deeper anonymous nodes to `null`.
pub const DEPTH_LIMIT: u8 = 64;

/// Renders an object. Relations are abbreviated with `namespaces` where
/// possible.
///
/// Every node is written out once. Meeting a named node again gives its
/// `@id`; an anonymous node met again is labelled `_:bN` at the place it
/// was written out and referenced by that label.
pub fn to_json(object: &ObjectType, namespaces: &Namespaces) -> JsonValue {
    to_json_limited(object, namespaces, DEPTH_LIMIT)
}

/// Renders every object of a result as one array, each object on its own.
pub fn result_to_json(result: &ResultSet, namespaces: &Namespaces) -> JsonValue {
    JsonValue::Array(result.iter().map(|o| to_json(o, namespaces)).collect())
}

fn to_json_limited(object: &ObjectType, namespaces: &Namespaces, limit: u8) -> JsonValue {
    // The first pass only finds the anonymous nodes that are met twice.
    let mut scan = Renderer::new(namespaces, limit, HashMap::new());
    scan.render(object, 0);
    let labels = scan
        .met_again
        .into_iter()
        .enumerate()
        .map(|(n, key)| (key, format!("_:b{}", n + 1)))
        .collect();
    Renderer::new(namespaces, limit, labels).render(object, 0)
}

struct Renderer<'a> {
    namespaces: &'a Namespaces,
    limit: u8,
    written: HashSet<usize>,
    labels: HashMap<usize, String>,
    met_again: Vec<usize>,
}

impl<'a> Renderer<'a> {
    fn new(namespaces: &'a Namespaces, limit: u8, labels: HashMap<usize, String>) -> Self {
        Renderer {
            namespaces,
            limit,
            written: HashSet::new(),
            labels,
            met_again: vec![],
        }
    }

    fn render(&mut self, object: &ObjectType, depth: u8) -> JsonValue {
        let ObjectType::Node(node) = object else {
            return leaf(object, self.namespaces);
        };
        let key = node.key();
        let identifier = node.identifier().or_else(|| self.labels.get(&key).cloned());
        let written = self.written.contains(&key);
        if depth == self.limit || written {
            if written && identifier.is_none() && !self.met_again.contains(&key) {
                self.met_again.push(key);
            }
            return match identifier {
                Some(id) => json!({ "@id": id }),
                None => JsonValue::Null,
            };
        }
        self.written.insert(key);
        let mut map = Map::new();
        if let Some(id) = identifier {
            map.insert("@id".to_owned(), JsonValue::String(id));
        }
        for (relation, objects) in node.edges() {
            let key = self.namespaces.abbreviate(&relation).unwrap_or(relation);
            let values = objects.iter().map(|o| self.render(o, depth + 1)).collect();
            map.insert(key, JsonValue::Array(values));
        }
        JsonValue::Object(map)
    }
}

fn leaf(object: &ObjectType, namespaces: &Namespaces) -> JsonValue {
    match object {
        ObjectType::Literal(literal) if literal.is_plain() => json!({ "@value": literal.value() }),
        ObjectType::Literal(literal) => json!({
            "@value": literal.value(),
            "@type": namespaces
                .abbreviate(literal.datatype())
                .unwrap_or_else(|| literal.datatype().to_owned()),
        }),
        ObjectType::LangString(lang) => json!({
            "@value": lang.value(),
            "@language": lang.language(),
        }),
        ObjectType::NodeReference(reference) => json!({ "@id": reference.identifier() }),
        ObjectType::Node(node) => match node.identifier() {
            Some(id) => json!({ "@id": id }),
            None => JsonValue::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{to_json, to_json_limited};
    use crate::error::Result;
    use crate::literal::{LangString, Literal};
    use crate::node::Node;
    use crate::object::ObjectType;
    use crate::vocab::{Namespaces, xsd};

    #[test]
    fn render_node() -> Result<()> {
        let mut namespaces = Namespaces::default();
        namespaces.insert("ex", "http://example.org/");
        let node = Node::named("http://example.org/a");
        node.put("http://example.org/name", "Alice")?
            .put("http://example.org/age", Literal::new("42", xsd::INTEGER)?)?
            .put("http://example.org/greeting", LangString::new("Hallo", "de")?)?
            .put("http://example.org/knows", "http://example.org/b")?;
        assert_eq!(
            to_json(&node.into(), &namespaces),
            json!({
                "@id": "http://example.org/a",
                "ex:age": [{ "@value": "42", "@type": "xsd:integer" }],
                "ex:greeting": [{ "@value": "Hallo", "@language": "de" }],
                "ex:knows": [{ "@id": "http://example.org/b" }],
                "ex:name": [{ "@value": "Alice" }],
            })
        );
        Ok(())
    }

    #[test]
    fn depth_limit_cuts_cycles() -> Result<()> {
        let namespaces = Namespaces::empty();
        let a = Node::named("http://example.org/a");
        let b = Node::new();
        a.put("http://example.org/next", &b)?;
        b.put("http://example.org/next", &a)?;
        let rendered = to_json_limited(&ObjectType::from(&a), &namespaces, 2);
        assert_eq!(
            rendered,
            json!({
                "@id": "http://example.org/a",
                "http://example.org/next": [{
                    "http://example.org/next": [{ "@id": "http://example.org/a" }]
                }]
            })
        );
        let rendered = to_json_limited(&ObjectType::from(&b), &namespaces, 1);
        assert_eq!(
            rendered,
            json!({ "http://example.org/next": [{ "@id": "http://example.org/a" }] })
        );
        assert_eq!(
            to_json_limited(&ObjectType::from(&b), &namespaces, 0),
            serde_json::Value::Null
        );
        Ok(())
    }

    #[test]
    fn branching_cycles_are_written_once() -> Result<()> {
        let mut namespaces = Namespaces::empty();
        namespaces.insert("ex", "http://example.org/");
        let knows = "http://example.org/knows";
        let a = Node::named("http://example.org/a");
        let b = Node::named("http://example.org/b");
        let c = Node::named("http://example.org/c");
        a.put(knows, &b)?.put(knows, &c)?;
        b.put(knows, &a)?.put(knows, &c)?;
        c.put(knows, &a)?.put(knows, &b)?;
        assert_eq!(
            to_json(&ObjectType::from(&a), &namespaces),
            json!({
                "@id": "http://example.org/a",
                "ex:knows": [
                    {
                        "@id": "http://example.org/b",
                        "ex:knows": [
                            { "@id": "http://example.org/a" },
                            {
                                "@id": "http://example.org/c",
                                "ex:knows": [
                                    { "@id": "http://example.org/a" },
                                    { "@id": "http://example.org/b" }
                                ]
                            }
                        ]
                    },
                    { "@id": "http://example.org/c" }
                ]
            })
        );
        Ok(())
    }

    #[test]
    fn shared_anonymous_nodes_get_a_label() -> Result<()> {
        let namespaces = Namespaces::empty();
        let link = "http://example.org/link";
        let shared = Node::new();
        shared.put("http://example.org/name", "X")?;
        let root = Node::new();
        root.put(link, &shared)?.put(link, &shared)?;
        assert_eq!(
            to_json(&ObjectType::from(&root), &namespaces),
            json!({
                "http://example.org/link": [
                    { "@id": "_:b1", "http://example.org/name": [{ "@value": "X" }] },
                    { "@id": "_:b1" }
                ]
            })
        );
        Ok(())
    }

    #[test]
    fn layered_diamonds_stay_small() -> Result<()> {
        let namespaces = Namespaces::empty();
        let next = "http://example.org/next";
        let root = Node::new();
        let mut layer = vec![root.clone()];
        for _ in 0..40 {
            let below = vec![Node::new(), Node::new()];
            for node in &layer {
                for child in &below {
                    node.put(next, child)?;
                }
            }
            layer = below;
        }
        let rendered = to_json(&ObjectType::from(&root), &namespaces).to_string();
        assert!(rendered.len() < 20_000, "{} bytes", rendered.len());
        assert!(rendered.contains("\"_:b1\""));
        Ok(())
    }
}
