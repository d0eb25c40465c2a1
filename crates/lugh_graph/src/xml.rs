//! Writing a node tree as an XML document.
//!
//! A node becomes an element named after its type (`rdf:Description` if it
//! has none). Single literals and references are written as attributes,
//! sequence entries as ordered child content, and everything else as
//! `rdf:predicate` bags. Namespaces bound in the given prefix table keep
//! their prefix; other namespaces get generated ones (`a`, `b`, ...).

use std::collections::BTreeMap;
use std::fmt;
use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::error::{LinkedDataError, Result};
use crate::node::Node;
use crate::object::ObjectType;
use crate::vocab::{FIRST_INDEX, Namespaces, XML_NS, rdf, sequence_number_of, xlink, xml};

/// Renders `node` as an indented XML document.
pub fn to_xml(node: &Node, namespaces: &Namespaces) -> Result<String> {
    let mut buffer = vec![];
    write_xml(node, namespaces, &mut buffer)?;
    String::from_utf8(buffer).map_err(xml_error)
}

/// Writes `node` as an indented XML document to `out`.
///
/// Fails if the tree has a cycle, if a sequence has gaps, does not start at
/// the first index or holds several objects at one index, or if a type or
/// relation cannot be turned into an XML name.
pub fn write_xml(node: &Node, namespaces: &Namespaces, out: impl io::Write) -> Result<()> {
    let root = build(node, namespaces)?;
    let mut writer = Writer::new_with_indent(out, b' ', 2);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;
    let mut elements = 0;
    write_element(&mut writer, &root, &mut elements)?;
    io::Write::write_all(writer.get_mut(), b"\n").map_err(xml_error)?;
    debug!(target: "xml", elements, "wrote document");
    Ok(())
}

fn xml_error(error: impl fmt::Display) -> LinkedDataError {
    LinkedDataError::Xml(error.to_string())
}

#[derive(Debug, PartialEq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
}

#[derive(Debug, PartialEq)]
enum Content {
    Element(Element),
    Text(String),
}

impl Element {
    fn new(name: String) -> Element {
        Element {
            name,
            attributes: vec![],
            content: vec![],
        }
    }
}

fn build(node: &Node, namespaces: &Namespaces) -> Result<Element> {
    let mut builder = Builder {
        names: Names::new(namespaces),
        visiting: vec![],
    };
    let mut root = builder.node(node)?;
    root.attributes.extend(builder.names.declarations());
    Ok(root)
}

struct Builder<'a> {
    names: Names<'a>,
    visiting: Vec<usize>,
}

impl Builder<'_> {
    fn node(&mut self, node: &Node) -> Result<Element> {
        let key = node.key();
        if self.visiting.contains(&key) {
            return Err(LinkedDataError::Xml(format!(
                "cycle through {}",
                node.identifier().unwrap_or_else(|| "an anonymous node".to_owned())
            )));
        }
        self.visiting.push(key);
        let element = self.node_element(node);
        self.visiting.pop();
        element
    }

    fn node_element(&mut self, node: &Node) -> Result<Element> {
        let rdf_type = type_or_description(node)?;
        let mut element = Element::new(self.names.element(&rdf_type)?);
        if let Some(identifier) = node.identifier() {
            let about = self.names.attribute(&rdf_type, rdf::ABOUT)?;
            element.attributes.push((about, identifier));
        }

        let mut ordered: BTreeMap<u64, ObjectType> = BTreeMap::new();
        let mut bags: Vec<(String, Vec<ObjectType>)> = vec![];
        for (relation, mut objects) in node.edges() {
            if let Some(index) = sequence_number_of(&relation) {
                if objects.len() > 1 {
                    return Err(LinkedDataError::Xml(format!(
                        "{} objects at sequence index {index}",
                        objects.len()
                    )));
                }
                if let Some(object) = objects.pop() {
                    ordered.insert(index, object);
                }
                continue;
            }
            let single = match objects.as_slice() {
                [object] => Some(object.clone()),
                _ => None,
            };
            match single {
                Some(ObjectType::Literal(literal)) => {
                    let name = self.names.attribute(&rdf_type, &relation)?;
                    element.attributes.push((name, literal.value().to_owned()));
                }
                Some(ObjectType::NodeReference(_)) if relation == rdf::TYPE => {}
                Some(ObjectType::NodeReference(reference)) => {
                    let name = self.names.attribute(&rdf_type, &relation)?;
                    element
                        .attributes
                        .push((name, reference.identifier().to_owned()));
                }
                _ => bags.push((relation, objects)),
            }
        }

        if let Some((&first, _)) = ordered.first_key_value() {
            if first != FIRST_INDEX {
                return Err(LinkedDataError::Xml(format!(
                    "sequence starts at index {first}, must start at {FIRST_INDEX}"
                )));
            }
        }
        if let Some((&last, _)) = ordered.last_key_value() {
            if ordered.len() as u64 != last {
                return Err(LinkedDataError::Xml(format!(
                    "sequence has gaps: {} entries up to index {last}",
                    ordered.len()
                )));
            }
        }
        for object in ordered.into_values() {
            let content = match &object {
                ObjectType::Node(child) => Content::Element(self.node(child)?),
                ObjectType::NodeReference(reference) => {
                    Content::Text(reference.identifier().to_owned())
                }
                leaf => Content::Text(leaf.literal_value().unwrap_or_default().to_owned()),
            };
            element.content.push(content);
        }

        for (relation, objects) in bags {
            let mut bag = Element::new(self.names.element(rdf::PREDICATE)?);
            bag.attributes
                .push((self.names.attribute(rdf::PREDICATE, rdf::VALUE)?, relation));
            bag.attributes.push((
                self.names.attribute(rdf::PREDICATE, rdf::PROPERTY)?,
                rdf::BAG.to_owned(),
            ));
            for object in &objects {
                bag.content.push(Content::Element(self.object(object)?));
            }
            element.content.push(Content::Element(bag));
        }
        Ok(element)
    }

    fn object(&mut self, object: &ObjectType) -> Result<Element> {
        match object {
            ObjectType::Node(node) => self.node(node),
            ObjectType::NodeReference(reference) => {
                let mut element = Element::new(self.names.element(xlink::HREF)?);
                element
                    .content
                    .push(Content::Text(reference.identifier().to_owned()));
                Ok(element)
            }
            ObjectType::Literal(literal) => self.text(literal.datatype(), literal.value(), None),
            ObjectType::LangString(lang) => {
                self.text(lang.datatype(), lang.value(), Some(lang.language()))
            }
        }
    }

    fn text(&mut self, datatype: &str, value: &str, language: Option<String>) -> Result<Element> {
        let mut element = Element::new(self.names.element(datatype)?);
        if let Some(language) = language {
            let name = self.names.attribute(datatype, xml::LANG)?;
            element.attributes.push((name, language));
        }
        if needs_preserving(value) {
            let name = self.names.attribute(datatype, xml::SPACE)?;
            element.attributes.push((name, "preserve".to_owned()));
        }
        element.content.push(Content::Text(value.to_owned()));
        Ok(element)
    }
}

fn type_or_description(node: &Node) -> Result<String> {
    match node.get_type() {
        Ok(rdf_type) => Ok(rdf_type),
        Err(LinkedDataError::NoData) => Ok(rdf::DESCRIPTION.to_owned()),
        Err(error) => Err(error),
    }
}

/// Whitespace an XML reader would otherwise be free to collapse.
fn needs_preserving(value: &str) -> bool {
    value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace)
        || value.contains(['\n', '\t'])
        || value.contains("  ")
}

/// Qualified names for the document, remembering which namespaces need a
/// declaration on the root element.
struct Names<'a> {
    namespaces: &'a Namespaces,
    used: BTreeMap<String, String>,
    generated: u64,
}

impl<'a> Names<'a> {
    fn new(namespaces: &'a Namespaces) -> Names<'a> {
        Names {
            namespaces,
            used: BTreeMap::new(),
            generated: 0,
        }
    }

    fn element(&mut self, iri: &str) -> Result<String> {
        let (namespace, local) = split(iri)?;
        let prefix = self.prefix(namespace);
        Ok(format!("{prefix}:{local}"))
    }

    /// Attributes in the namespace of their element go unprefixed.
    fn attribute(&mut self, element_iri: &str, iri: &str) -> Result<String> {
        let (namespace, local) = split(iri)?;
        if split(element_iri).is_ok_and(|(element_ns, _)| element_ns == namespace) {
            return Ok(local.to_owned());
        }
        let prefix = self.prefix(namespace);
        Ok(format!("{prefix}:{local}"))
    }

    fn prefix(&mut self, namespace: &str) -> String {
        if namespace == XML_NS {
            return "xml".to_owned();
        }
        if let Some(prefix) = self.used.get(namespace) {
            return prefix.clone();
        }
        let prefix = match self.namespaces.prefix(namespace) {
            Some(prefix) if !is_reserved(prefix) => prefix.to_owned(),
            _ => loop {
                self.generated += 1;
                let candidate = letters(self.generated);
                if self.namespaces.namespace(&candidate).is_none() && !is_reserved(&candidate) {
                    break candidate;
                }
            },
        };
        self.used.insert(namespace.to_owned(), prefix.clone());
        prefix
    }

    fn declarations(&self) -> Vec<(String, String)> {
        self.used
            .iter()
            .map(|(namespace, prefix)| (format!("xmlns:{prefix}"), namespace.clone()))
            .collect()
    }
}

fn is_reserved(prefix: &str) -> bool {
    prefix.to_ascii_lowercase().starts_with("xml")
}

/// 1 is `a`, 26 is `z`, 27 is `aa`.
fn letters(mut n: u64) -> String {
    let mut out = String::new();
    while n > 0 {
        n -= 1;
        out.insert(0, char::from(b'a' + (n % 26) as u8));
        n /= 26;
    }
    out
}

/// Splits after the first `#`, or else after the last `/`. The local part
/// must be usable as an XML name.
fn split(iri: &str) -> Result<(&str, &str)> {
    let at = match iri.find('#') {
        Some(hash) => hash + 1,
        None => iri.rfind('/').map_or(0, |slash| slash + 1),
    };
    let (namespace, local) = iri.split_at(at);
    let mut chars = local.chars();
    let valid = !namespace.is_empty()
        && chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if !valid {
        return Err(LinkedDataError::Xml(format!("{iri} cannot be used as an XML name")));
    }
    Ok((namespace, local))
}

fn write_element<W: io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    count: &mut usize,
) -> Result<()> {
    *count += 1;
    let mut start = BytesStart::new(element.name.as_str());
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    if element.content.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_error);
    }
    writer.write_event(Event::Start(start)).map_err(xml_error)?;
    for content in &element.content {
        match content {
            Content::Element(child) => write_element(writer, child, count)?,
            Content::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(xml_error)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)
}

#[cfg(test)]
mod tests {
    use super::{Content, build, letters, to_xml};
    use crate::error::{LinkedDataError, Result};
    use crate::literal::{LangString, Literal, NodeReference};
    use crate::node::Node;
    use crate::vocab::{Namespaces, RDF_NS, rdf, sequence_key, xsd};

    const EX: &str = "http://example.org/";

    fn ex(local: &str) -> String {
        format!("{EX}{local}")
    }

    fn namespaces() -> Namespaces {
        let mut namespaces = Namespaces::default();
        namespaces.insert("ex", EX);
        namespaces
    }

    fn book() -> Result<Node> {
        let book = Node::named(ex("b1"));
        book.put(rdf::TYPE, NodeReference::new(ex("Book")))?
            .put(&ex("title"), "Der Zauberberg")?
            .put(&ex("pages"), Literal::new("1008", xsd::INTEGER)?)?
            .put(&ex("publisher"), NodeReference::new(ex("fischer")))?
            .put(&ex("subtitle"), LangString::new("Roman", "de")?)?;
        let chapter = Node::typed(&ex("Chapter"));
        chapter.put(&ex("title"), "Vorsatz")?;
        book.add(&chapter)?.add("loose leaf")?;
        Ok(book)
    }

    #[test]
    fn layout_of_a_typed_node() -> Result<()> {
        let root = build(&book()?, &namespaces())?;
        assert_eq!(root.name, "ex:Book");
        let attribute = |name: &str| {
            root.attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(attribute("rdf:about"), Some("http://example.org/b1"));
        assert_eq!(attribute("title"), Some("Der Zauberberg"));
        assert_eq!(attribute("pages"), Some("1008"));
        assert_eq!(attribute("publisher"), Some("http://example.org/fischer"));
        assert_eq!(attribute("type"), None);
        assert_eq!(attribute("xmlns:ex"), Some(EX));
        assert_eq!(attribute("xmlns:rdf"), Some(RDF_NS));

        let [Content::Element(chapter), Content::Text(leaf), Content::Element(bag)] =
            root.content.as_slice()
        else {
            panic!("unexpected content {:?}", root.content);
        };
        assert_eq!(chapter.name, "ex:Chapter");
        assert_eq!(leaf, "loose leaf");
        assert_eq!(bag.name, "rdf:predicate");
        assert_eq!(
            bag.attributes,
            [
                ("value".to_owned(), ex("subtitle")),
                ("property".to_owned(), rdf::BAG.to_owned()),
            ]
        );
        let [Content::Element(roman)] = bag.content.as_slice() else {
            panic!("unexpected bag {:?}", bag.content);
        };
        assert_eq!(roman.name, "rdf:langString");
        assert_eq!(roman.attributes, [("xml:lang".to_owned(), "de".to_owned())]);
        Ok(())
    }

    #[test]
    fn written_document() -> Result<()> {
        let written = to_xml(&book()?, &namespaces())?;
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(written.contains("<ex:Book rdf:about=\"http://example.org/b1\""));
        assert!(written.contains("<ex:Chapter title=\"Vorsatz\"/>"));
        assert!(written.contains("<rdf:langString xml:lang=\"de\">Roman</rdf:langString>"));
        assert!(written.contains("xmlns:ex=\"http://example.org/\""));
        assert!(!written.contains("xmlns:xml"));
        assert!(written.trim_end().ends_with("</ex:Book>"));
        Ok(())
    }

    #[test]
    fn untyped_nodes_and_unbound_namespaces() -> Result<()> {
        let node = Node::new();
        node.put("http://other.example/terms#note", LangString::new("  spaced", "en")?)?
            .put("http://other.example/terms#note", "second")?
            .put("http://other.example/terms#status", "draft")?;
        let written = to_xml(&node, &Namespaces::default())?;
        assert!(written.contains("<rdf:Description"));
        assert!(written.contains("a:status=\"draft\""));
        assert!(written.contains("xmlns:a=\"http://other.example/terms#\""));
        assert!(written.contains("value=\"http://other.example/terms#note\""));
        assert!(written.contains("xml:space=\"preserve\""));
        assert!(written.contains("<rdf:PlainLiteral>second</rdf:PlainLiteral>"));
        Ok(())
    }

    #[test]
    fn text_is_escaped() -> Result<()> {
        let node = Node::new();
        node.add("a < b & c")?;
        let written = to_xml(&node, &Namespaces::default())?;
        assert!(written.contains("a &lt; b &amp; c"));
        Ok(())
    }

    #[test]
    fn sequences_must_be_complete() -> Result<()> {
        let gap = Node::new();
        gap.set(1, "a").set(3, "c");
        assert!(matches!(
            to_xml(&gap, &Namespaces::default()),
            Err(LinkedDataError::Xml(_))
        ));

        let late = Node::new();
        late.set(2, "b");
        assert!(matches!(
            to_xml(&late, &Namespaces::default()),
            Err(LinkedDataError::Xml(_))
        ));

        let crowded = Node::new();
        crowded.put(&sequence_key(1), "a")?.put(&sequence_key(1), "b")?;
        assert!(matches!(
            to_xml(&crowded, &Namespaces::default()),
            Err(LinkedDataError::Xml(_))
        ));
        Ok(())
    }

    #[test]
    fn cycles_and_unnameable_relations_are_errors() -> Result<()> {
        let a = Node::new();
        let b = Node::new();
        a.put(&ex("next"), &b)?.put(&ex("name"), LangString::new("A", "en")?)?;
        b.put(&ex("next"), &a)?;
        assert!(matches!(
            to_xml(&a, &namespaces()),
            Err(LinkedDataError::Xml(_))
        ));

        let odd = Node::new();
        odd.put("urn:isbn:123", "x")?;
        assert!(matches!(
            to_xml(&odd, &namespaces()),
            Err(LinkedDataError::Xml(_))
        ));

        let shared = Node::typed(&ex("Leaf"));
        let twice = Node::new();
        twice.add(&shared)?.add(&shared)?;
        to_xml(&twice, &namespaces())?;
        Ok(())
    }

    #[test]
    fn generated_prefixes() {
        assert_eq!(letters(1), "a");
        assert_eq!(letters(26), "z");
        assert_eq!(letters(27), "aa");
        assert_eq!(letters(28), "ab");
    }
}
