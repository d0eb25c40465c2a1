use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use graph::triples::{self, NamedNodes};
use graph::{GraphPath, Node, ObjectType, ResultSet, json, ntriples, xml};
use tracing::info;

use crate::config::Config;
use crate::flags;

fn read_graph(input: &Path, all_nodes: bool) -> Result<ResultSet> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let triples = ntriples::parse(&text).with_context(|| format!("in {}", input.display()))?;
    let nodes = triples::import(&triples, all_nodes)
        .with_context(|| format!("failed to build graph from {}", input.display()))?;
    info!(
        target: "commands",
        input = %input.display(),
        triples = triples.len(),
        nodes = nodes.len(),
        "read graph"
    );
    Ok(nodes)
}

pub(crate) fn query(cmd: &flags::Query, out: &mut impl Write) -> Result<()> {
    let mut config = Config::find(cmd.config.as_deref())?;
    config.bind_prefixes(&cmd.prefix)?;
    let namespaces = config.namespaces();
    let path = GraphPath::parse(&cmd.path, &namespaces)
        .with_context(|| format!("invalid path {:?}", cmd.path))?;
    let nodes = read_graph(&cmd.input, false)?;
    let result = path.apply(&nodes)?;

    if cmd.json || config.output.json {
        let rendered = json::result_to_json(&result, &namespaces);
        writeln!(out, "{}", serde_json::to_string_pretty(&rendered)?)?;
        return Ok(());
    }
    let separator = &config.output.separator;
    let leaves = if config.query.include_references {
        result.leaves_joined(separator)
    } else {
        result.strings_joined(separator)
    };
    if !leaves.is_empty() {
        writeln!(out, "{leaves}")?;
    }
    for node in result.nodes() {
        write!(out, "{node}")?;
    }
    Ok(())
}

pub(crate) fn dump(cmd: &flags::Dump, out: &mut impl Write) -> Result<()> {
    if cmd.json && cmd.xml {
        bail!("--json and --xml cannot be combined");
    }
    let config = Config::find(cmd.config.as_deref())?;
    let nodes = read_graph(&cmd.input, cmd.all)?;
    let objects: ResultSet = nodes
        .nodes()
        .iter()
        .map(|node| {
            if cmd.unordered {
                node.as_unordered(false)
            } else {
                ObjectType::from(node)
            }
        })
        .collect();

    if cmd.xml {
        // One document: several objects go into an rdf:Description sequence.
        let root = match objects.iter().as_slice() {
            [ObjectType::Node(node)] => node.clone(),
            all => {
                let wrapper = Node::new();
                wrapper.add_all(all.iter().cloned())?;
                wrapper
            }
        };
        xml::write_xml(&root, &config.namespaces(), &mut *out)?;
        return Ok(());
    }
    if cmd.json || config.output.json {
        let rendered = json::result_to_json(&objects, &config.namespaces());
        writeln!(out, "{}", serde_json::to_string_pretty(&rendered)?)?;
        return Ok(());
    }
    for object in &objects {
        match object {
            ObjectType::Node(node) => write!(out, "{node}")?,
            leaf => writeln!(out, "{leaf}")?,
        }
    }
    Ok(())
}

pub(crate) fn export(cmd: &flags::Export, out: &mut impl Write) -> Result<()> {
    let nodes = read_graph(&cmd.input, false)?.nodes();
    let written = triples::export_all(&nodes, NamedNodes::Deep);
    out.write_all(ntriples::serialize(&written).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use anyhow::Result;
    use tempfile::NamedTempFile;

    use super::{dump, export, query};
    use crate::flags;

    const DATA: &str = r#"
<http://example.org/alice> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://example.org/Person> .
<http://example.org/alice> <http://example.org/name> "Alice" .
<http://example.org/alice> <http://example.org/knows> _:b .
_:b <http://example.org/name> "Bob" .
_:b <http://example.org/name> "Robert"@en .
"#;

    fn data_file() -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(DATA.as_bytes())?;
        Ok(file)
    }

    fn empty_config() -> Result<NamedTempFile> {
        Ok(NamedTempFile::new()?)
    }

    fn query_flags(input: PathBuf, config: PathBuf, path: &str) -> flags::Query {
        flags::Query {
            input,
            path: path.to_owned(),
            config: Some(config),
            prefix: vec!["ex=http://example.org/".to_owned()],
            json: false,
        }
    }

    #[test]
    fn query_leaves() -> Result<()> {
        let data = data_file()?;
        let config = empty_config()?;
        let mut out = vec![];
        let cmd = query_flags(
            data.path().to_owned(),
            config.path().to_owned(),
            "ex:knows ex:name",
        );
        query(&cmd, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "Bob ; Robert\n");

        let mut out = vec![];
        let cmd = query_flags(data.path().to_owned(), config.path().to_owned(), "rdf:type");
        query(&cmd, &mut out)?;
        assert_eq!(String::from_utf8(out)?, "http://example.org/Person\n");
        Ok(())
    }

    #[test]
    fn query_json() -> Result<()> {
        let data = data_file()?;
        let config = empty_config()?;
        let mut cmd = query_flags(data.path().to_owned(), config.path().to_owned(), "ex:name");
        cmd.json = true;
        let mut out = vec![];
        query(&cmd, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value, serde_json::json!([{ "@value": "Alice" }]));
        Ok(())
    }

    #[test]
    fn query_rejects_bad_path() -> Result<()> {
        let data = data_file()?;
        let config = empty_config()?;
        let cmd = query_flags(data.path().to_owned(), config.path().to_owned(), "<ex:knows");
        assert!(query(&cmd, &mut vec![]).is_err());
        Ok(())
    }

    #[test]
    fn dump_top_and_all_nodes() -> Result<()> {
        let data = data_file()?;
        let config = empty_config()?;
        let mut cmd = flags::Dump {
            input: data.path().to_owned(),
            config: Some(config.path().to_owned()),
            unordered: false,
            json: true,
            xml: false,
            all: false,
        };
        let mut out = vec![];
        dump(&cmd, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value.as_array().map(Vec::len), Some(1));
        assert_eq!(value[0]["@id"], "http://example.org/alice");

        cmd.all = true;
        let mut out = vec![];
        dump(&cmd, &mut out)?;
        let value: serde_json::Value = serde_json::from_slice(&out)?;
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn dump_as_xml() -> Result<()> {
        let data = data_file()?;
        let config = empty_config()?;
        let mut cmd = flags::Dump {
            input: data.path().to_owned(),
            config: Some(config.path().to_owned()),
            unordered: false,
            json: false,
            xml: true,
            all: false,
        };
        let mut out = vec![];
        dump(&cmd, &mut out)?;
        let written = String::from_utf8(out)?;
        assert!(written.contains("rdf:about=\"http://example.org/alice\""));
        assert!(written.contains("name=\"Alice\""));
        assert!(written.contains("<rdf:langString xml:lang=\"en\">Robert</rdf:langString>"));
        assert!(written.contains("xmlns:a=\"http://example.org/\""));

        cmd.all = true;
        let mut out = vec![];
        dump(&cmd, &mut out)?;
        let written = String::from_utf8(out)?;
        assert_eq!(written.matches("<?xml").count(), 1);
        assert!(written.contains("<rdf:Description xmlns:"));

        cmd.json = true;
        assert!(dump(&cmd, &mut vec![]).is_err());
        Ok(())
    }

    #[test]
    fn export_keeps_every_triple() -> Result<()> {
        let data = data_file()?;
        let mut out = vec![];
        export(
            &flags::Export {
                input: data.path().to_owned(),
            },
            &mut out,
        )?;
        let written = graph::ntriples::parse(&String::from_utf8(out)?)?;
        assert_eq!(written.len(), 5);
        Ok(())
    }
}
