use std::fmt;

use crate::error::{LinkedDataError, Result};

/// A language tag split into its subtags.
///
/// Subtags are normalised on parse: the language is lower case, the script
/// title case and the region upper case, so comparisons are plain string
/// comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locale {
    language: String,
    script: Option<String>,
    region: Option<String>,
    variants: Vec<String>,
}

impl Locale {
    /// Parses tags of the shape `language[-script][-region][-variant]*`.
    /// Both `-` and `_` separate subtags. Subtags after the region that are
    /// not well-formed variants are kept as variants, so no information is
    /// lost for tags using extensions.
    pub fn parse(tag: &str) -> Result<Locale> {
        if tag.is_empty() {
            return Err(LinkedDataError::EmptyLanguage);
        }
        let mut parts = tag.split(['-', '_']).peekable();
        let language = match parts.next() {
            Some(lang)
                if (2..=8).contains(&lang.len())
                    && lang.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                lang.to_ascii_lowercase()
            }
            _ => return Err(LinkedDataError::InvalidLanguage(tag.to_owned())),
        };
        let script = parts
            .next_if(|s| s.len() == 4 && s.chars().all(|c| c.is_ascii_alphabetic()))
            .map(title_case);
        let region = parts
            .next_if(|s| {
                (s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
                    || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit()))
            })
            .map(str::to_ascii_uppercase);
        let mut variants = vec![];
        for variant in parts {
            if variant.is_empty() || !variant.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(LinkedDataError::InvalidLanguage(tag.to_owned()));
            }
            variants.push(variant.to_ascii_lowercase());
        }
        Ok(Locale {
            language,
            script,
            region,
            variants,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Whether `self`, used as a locale range, covers `tag`. Every subtag
    /// present in the range must equal the subtag of the tag; absent ones
    /// match anything.
    pub fn covers(&self, tag: &Locale) -> bool {
        if self.language != tag.language {
            return false;
        }
        if self.script.is_some() && self.script != tag.script {
            return false;
        }
        if self.region.is_some() && self.region != tag.region {
            return false;
        }
        self.variants.is_empty() || self.variants == tag.variants
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        if let Some(script) = &self.script {
            write!(f, "-{script}")?;
        }
        if let Some(region) = &self.region {
            write!(f, "-{region}")?;
        }
        for variant in &self.variants {
            write!(f, "-{variant}")?;
        }
        Ok(())
    }
}

fn title_case(s: &str) -> String {
    let mut out = s.to_ascii_lowercase();
    out[..1].make_ascii_uppercase();
    out
}

#[cfg(test)]
mod tests {
    use super::Locale;
    use crate::error::{LinkedDataError, Result};

    #[test]
    fn parse_full_tag() -> Result<()> {
        let locale = Locale::parse("sr_latn_rs_1994")?;
        assert_eq!(locale.language(), "sr");
        assert_eq!(locale.script(), Some("Latn"));
        assert_eq!(locale.region(), Some("RS"));
        assert_eq!(locale.variants(), ["1994"]);
        assert_eq!(locale.to_string(), "sr-Latn-RS-1994");
        Ok(())
    }

    #[test]
    fn parse_numeric_region() -> Result<()> {
        let locale = Locale::parse("es-419")?;
        assert_eq!(locale.region(), Some("419"));
        assert_eq!(locale.script(), None);
        Ok(())
    }

    #[test]
    fn reject_bad_tags() {
        assert_eq!(Locale::parse(""), Err(LinkedDataError::EmptyLanguage));
        assert!(Locale::parse("l").is_err());
        assert!(Locale::parse("12").is_err());
        assert!(Locale::parse("de--DE").is_err());
    }

    #[test]
    fn ranges_leave_missing_subtags_open() -> Result<()> {
        let tag = Locale::parse("de-DE")?;
        assert!(Locale::parse("de")?.covers(&tag));
        assert!(Locale::parse("DE-de")?.covers(&tag));
        assert!(!Locale::parse("de-AT")?.covers(&tag));
        assert!(!Locale::parse("en")?.covers(&tag));
        assert!(!Locale::parse("de-Latn")?.covers(&tag));
        assert!(!tag.covers(&Locale::parse("de")?));
        Ok(())
    }
}
