//! N-Triples reading and writing for [`TripleSet`].

use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use tracing::debug;

use crate::error::{LinkedDataError, Result};
use crate::triples::{Term, Triple, TripleSet};
use crate::vocab::is_uri;

/// Parses an N-Triples document.
pub fn parse(input: &str) -> Result<TripleSet> {
    let mut triples = TripleSet::new();
    for (number, line) in input.lines().enumerate() {
        let line_number = number + 1;
        let mut it = line.chars().peekable();
        eat_ws(&mut it);
        if matches!(it.peek(), None | Some('#')) {
            continue;
        }
        let triple = parse_triple(&mut it)
            .map_err(|message| LinkedDataError::ntriples(line_number, message))?;
        triples.insert(triple);
    }
    debug!(target: "ntriples", triples = triples.len(), "parsed document");
    Ok(triples)
}

type Parsed<T> = std::result::Result<T, String>;

fn parse_triple(it: &mut Peekable<Chars<'_>>) -> Parsed<Triple> {
    let subject = match it.peek() {
        Some('<') => Term::Iri(eat_iri(it)?),
        Some('_') => Term::Blank(eat_blank(it)?),
        _ => return Err("expected an IRI or blank node as subject".to_owned()),
    };
    eat_ws(it);
    let predicate = eat_iri(it)?;
    eat_ws(it);
    let object = match it.peek() {
        Some('<') => Term::Iri(eat_iri(it)?),
        Some('_') => Term::Blank(eat_blank(it)?),
        Some('"') => eat_literal(it)?,
        _ => return Err("expected an IRI, blank node or literal as object".to_owned()),
    };
    eat_ws(it);
    if it.next_if_eq(&'.').is_none() {
        return Err("expected '.' after object".to_owned());
    }
    eat_ws(it);
    if !matches!(it.peek(), None | Some('#')) {
        return Err("unexpected content after '.'".to_owned());
    }
    Ok(Triple {
        subject,
        predicate,
        object,
    })
}

fn eat_ws(it: &mut Peekable<Chars<'_>>) {
    while it.next_if(|c| *c == ' ' || *c == '\t').is_some() {}
}

fn eat_iri(it: &mut Peekable<Chars<'_>>) -> Parsed<String> {
    if it.next_if_eq(&'<').is_none() {
        return Err("expected '<'".to_owned());
    }
    let mut iri = String::new();
    loop {
        match it.next() {
            Some('>') => break,
            Some('\\') => iri.push(eat_unicode_escape(it)?),
            Some(c) if c.is_whitespace() => return Err("whitespace in IRI".to_owned()),
            Some(c) => iri.push(c),
            None => return Err("unterminated IRI".to_owned()),
        }
    }
    if iri.is_empty() {
        return Err("empty IRI".to_owned());
    }
    if !is_uri(&iri) {
        return Err(format!("relative IRI <{iri}>"));
    }
    Ok(iri)
}

fn eat_blank(it: &mut Peekable<Chars<'_>>) -> Parsed<String> {
    if it.next_if_eq(&'_').is_none() || it.next_if_eq(&':').is_none() {
        return Err("expected '_:'".to_owned());
    }
    let mut label = String::new();
    while let Some(c) = it.next_if(|c| c.is_alphanumeric() || matches!(c, '_' | '-')) {
        label.push(c);
    }
    if label.is_empty() {
        return Err("empty blank node label".to_owned());
    }
    Ok(label)
}

fn eat_literal(it: &mut Peekable<Chars<'_>>) -> Parsed<Term> {
    if it.next_if_eq(&'"').is_none() {
        return Err("expected '\"'".to_owned());
    }
    let mut value = String::new();
    loop {
        match it.next() {
            Some('"') => break,
            Some('\\') => match it.peek() {
                Some('u' | 'U') => value.push(eat_unicode_escape(it)?),
                _ => value.push(eat_string_escape(it)?),
            },
            Some(c) => value.push(c),
            None => return Err("unterminated literal".to_owned()),
        }
    }
    let mut datatype = None;
    let mut language = None;
    if it.next_if_eq(&'@').is_some() {
        let mut tag = String::new();
        while let Some(c) = it.next_if(|c| c.is_ascii_alphanumeric() || *c == '-') {
            tag.push(c);
        }
        if tag.is_empty() {
            return Err("empty language tag".to_owned());
        }
        language = Some(tag);
    } else if it.next_if_eq(&'^').is_some() {
        if it.next_if_eq(&'^').is_none() {
            return Err("expected '^^'".to_owned());
        }
        datatype = Some(eat_iri(it)?);
    }
    Ok(Term::Literal {
        value,
        datatype,
        language,
    })
}

fn eat_string_escape(it: &mut Peekable<Chars<'_>>) -> Parsed<char> {
    match it.next() {
        Some('t') => Ok('\t'),
        Some('b') => Ok('\u{8}'),
        Some('n') => Ok('\n'),
        Some('r') => Ok('\r'),
        Some('f') => Ok('\u{c}'),
        Some('"') => Ok('"'),
        Some('\'') => Ok('\''),
        Some('\\') => Ok('\\'),
        Some(c) => Err(format!("unknown escape '\\{c}'")),
        None => Err("unterminated escape".to_owned()),
    }
}

/// Decodes `uXXXX` or `UXXXXXXXX`, the backslash already eaten.
fn eat_unicode_escape(it: &mut Peekable<Chars<'_>>) -> Parsed<char> {
    let len = match it.next() {
        Some('u') => 4,
        Some('U') => 8,
        _ => return Err("expected a unicode escape".to_owned()),
    };
    let hex: String = it.by_ref().take(len).collect();
    if hex.len() != len {
        return Err("truncated unicode escape".to_owned());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid unicode escape {hex}"))
}

/// Writes triples as N-Triples, one per line.
pub fn serialize(triples: &TripleSet) -> String {
    let mut out = String::new();
    for triple in triples.iter() {
        write_term(&mut out, &triple.subject);
        out.push(' ');
        write_iri(&mut out, &triple.predicate);
        out.push(' ');
        write_term(&mut out, &triple.object);
        out.push_str(" .\n");
    }
    out
}

fn write_iri(out: &mut String, iri: &str) {
    out.push('<');
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' | '\0'..=' ' => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('>');
}

fn write_term(out: &mut String, term: &Term) {
    match term {
        Term::Iri(iri) => write_iri(out, iri),
        Term::Blank(label) => {
            out.push_str("_:");
            out.push_str(label);
        }
        Term::Literal {
            value,
            datatype,
            language,
        } => {
            out.push('"');
            for c in value.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    '\t' => out.push_str("\\t"),
                    c => out.push(c),
                }
            }
            out.push('"');
            if let Some(language) = language {
                out.push('@');
                out.push_str(language);
            } else if let Some(datatype) = datatype {
                out.push_str("^^");
                write_iri(out, datatype);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse, serialize};
    use crate::error::{LinkedDataError, Result};
    use crate::triples::{Term, Triple};

    const DOCUMENT: &str = r#"
# a comment
<http://example.org/a> <http://example.org/name> "Alice" .
<http://example.org/a> <http://example.org/greeting> "Hallo\n\"Welt\""@de-DE .
<http://example.org/a> <http://example.org/age> "42"^^<http://www.w3.org/2001/XMLSchema#integer> .
<http://example.org/a> <http://example.org/knows> _:b1 .
_:b1 <http://example.org/name> "café" . # trailing comment
"#;

    #[test]
    fn parse_document() -> Result<()> {
        let triples = parse(DOCUMENT)?;
        assert_eq!(triples.len(), 5);
        let mut it = triples.iter();
        assert_eq!(
            it.next(),
            Some(&Triple {
                subject: Term::Iri("http://example.org/a".to_owned()),
                predicate: "http://example.org/name".to_owned(),
                object: Term::Literal {
                    value: "Alice".to_owned(),
                    datatype: None,
                    language: None,
                },
            })
        );
        let greeting = it.next().map(|t| t.object.clone());
        assert_eq!(
            greeting,
            Some(Term::Literal {
                value: "Hallo\n\"Welt\"".to_owned(),
                datatype: None,
                language: Some("de-DE".to_owned()),
            })
        );
        let last = triples.iter().last().map(|t| (t.subject.clone(), t.object.clone()));
        assert_eq!(
            last,
            Some((
                Term::Blank("b1".to_owned()),
                Term::Literal {
                    value: "café".to_owned(),
                    datatype: None,
                    language: None,
                }
            ))
        );
        Ok(())
    }

    #[test]
    fn serialize_then_parse() -> Result<()> {
        let triples = parse(DOCUMENT)?;
        let written = serialize(&triples);
        assert!(written.contains("\"Hallo\\n\\\"Welt\\\"\"@de-DE"));
        assert_eq!(parse(&written)?, triples);
        Ok(())
    }

    #[test]
    fn errors_carry_line_numbers() {
        let input = "<http://example.org/a> <http://example.org/b> \"c\" .\n\"s\" <http://example.org/b> <http://example.org/c> .";
        assert!(matches!(
            parse(input),
            Err(LinkedDataError::NTriples { line: 2, .. })
        ));
        for line in [
            "<http://example.org/a> <http://example.org/b> \"c\"",
            "<http://example.org/a> <http://example.org/b> \"c .",
            "<http://example.org/a> <http://example.org/b> <c d> .",
            "<http://example.org/a> _:p <http://example.org/c> .",
        ] {
            assert!(parse(line).is_err(), "{line}");
        }
    }

    #[test]
    fn relative_iris_are_errors() {
        let input = "<http://example.org/a> <http://example.org/b> \"c\" .\n<a> <http://example.org/b> <http://example.org/c> .";
        assert!(matches!(
            parse(input),
            Err(LinkedDataError::NTriples { line: 2, .. })
        ));
        for line in [
            "<http://example.org/a> <b> <http://example.org/c> .",
            "<http://example.org/a> <http://example.org/b> <#c> .",
            "<http://example.org/a> <http://example.org/b> \"1\"^^<integer> .",
        ] {
            assert!(
                matches!(parse(line), Err(LinkedDataError::NTriples { line: 1, .. })),
                "{line}"
            );
        }
    }
}
