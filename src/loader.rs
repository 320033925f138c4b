//! YAML world description loading and validation
//!
//! A world description is a YAML mapping with two sections:
//!
//! ```yaml
//! items:
//!   normal: [Sword, Shield]
//!   trap: [Bee Trap]
//!   filler: [Coin]
//!   prog: [Key]
//! locations:
//!   town: [Well, Gate]
//! ```
//!
//! Both sections map category names to lists of names. Category order and
//! name order are kept exactly as written. Keys and names are normalized with
//! [`decode_unicode_escapes`] so literal `\u00e9` text becomes `é`.

use crate::codegen::decode_unicode_escapes;
use crate::error::{Error, Result};
use crate::types::{CategoryMapping, WorldConfig};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Top-level key holding the item categories
pub const ITEMS_KEY: &str = "items";

/// Top-level key holding the location categories
pub const LOCATIONS_KEY: &str = "locations";

/// Load and validate the world description stored at `path`.
///
/// # Errors
///
/// - [`Error::ConfigNotFound`] if nothing exists at `path`
/// - [`Error::InvalidYaml`] / [`Error::EmptyDocument`] if the text does not parse
/// - [`Error::Schema`] if the document has the wrong shape
pub async fn load_world_config(path: &Path) -> Result<WorldConfig> {
    tracing::info!(path = %path.display(), "loading world description");

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::error!(path = %path.display(), "world description not found");
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(Error::Io(e)),
    };

    let world = parse_world_config(&text)?;
    tracing::info!(
        item_categories = world.items.len(),
        location_categories = world.locations.len(),
        "loaded world description"
    );
    Ok(world)
}

/// Parse and validate a world description from YAML text.
pub fn parse_world_config(text: &str) -> Result<WorldConfig> {
    let document = parse_document(text)?;
    require_sections(&document)?;
    WorldConfig::from_document(&document)
}

/// Parse YAML text into its root mapping.
///
/// A document that parses to nothing (only comments, or a bare `~`) yields an
/// empty mapping.
pub fn parse_document(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Err(Error::EmptyDocument);
    }

    let value: Value =
        serde_yaml::from_str(text).map_err(|e| Error::InvalidYaml(e.to_string()))?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(Error::Schema("YAML root must be a mapping/dict".to_string())),
    }
}

/// Check that both top-level sections are present.
pub fn require_sections(document: &Mapping) -> Result<()> {
    for key in [ITEMS_KEY, LOCATIONS_KEY] {
        if !document.contains_key(key) {
            return Err(Error::Schema(format!("YAML must contain '{key}' key")));
        }
    }
    Ok(())
}

/// Serialize a document back to YAML, keeping key order.
pub fn to_yaml(document: &Mapping) -> Result<String> {
    serde_yaml::to_string(document).map_err(|e| Error::Other(e.to_string()))
}

impl WorldConfig {
    /// Build a normalized world description from a parsed document.
    ///
    /// A missing or null section is treated as empty.
    pub fn from_document(document: &Mapping) -> Result<Self> {
        Ok(Self {
            items: section(document, ITEMS_KEY)?,
            locations: section(document, LOCATIONS_KEY)?,
        })
    }
}

fn section(document: &Mapping, key: &str) -> Result<CategoryMapping> {
    match document.get(key).map(untag) {
        None | Some(Value::Null) => Ok(CategoryMapping::new()),
        Some(Value::Mapping(categories)) => category_mapping(key, categories),
        Some(_) => Err(Error::Schema(format!("'{key}' must be a mapping"))),
    }
}

fn category_mapping(section: &str, categories: &Mapping) -> Result<CategoryMapping> {
    let mut mapping = CategoryMapping::with_capacity(categories.len());

    for (key, value) in categories {
        let category = scalar_to_string(key).ok_or_else(|| {
            Error::Schema(format!("'{section}' category names must be scalars"))
        })?;

        let Value::Sequence(entries) = untag(value) else {
            return Err(Error::Schema(format!(
                "'{section}' category '{category}' must be a list"
            )));
        };

        let names = entries
            .iter()
            .map(|entry| {
                scalar_to_string(entry)
                    .map(|name| decode_unicode_escapes(&name).into_owned())
                    .ok_or_else(|| {
                        Error::Schema(format!(
                            "'{section}' category '{category}' must contain only scalar names"
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        mapping.insert(decode_unicode_escapes(&category).into_owned(), names);
    }

    Ok(mapping)
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

/// Stringify a YAML scalar the way the world code expects to see it.
///
/// Booleans become `True`/`False` and null becomes `None`, matching how the
/// generated module's host language prints them. Sequences and mappings are
/// not scalars and yield `None`.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        Value::Null => Some("None".to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToHttpStatus;
    use tempfile::tempdir;

    #[test]
    fn parses_minimal_document() {
        let world = parse_world_config("items:\n normal: [Sword]\nlocations:\n town: [Well]\n")
            .unwrap();
        assert_eq!(world.items["normal"], vec!["Sword"]);
        assert_eq!(world.locations["town"], vec!["Well"]);
    }

    #[test]
    fn preserves_category_and_name_order() {
        let text = "\
items:
  prog: [Z, A]
  normal: [M, B]
locations:
  zeta: [x]
  alpha: [y]
  mid: [z]
";
        let world = parse_world_config(text).unwrap();
        let item_keys: Vec<&str> = world.items.keys().map(String::as_str).collect();
        let location_keys: Vec<&str> = world.locations.keys().map(String::as_str).collect();
        assert_eq!(item_keys, vec!["prog", "normal"]);
        assert_eq!(location_keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(world.items["prog"], vec!["Z", "A"]);
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(matches!(parse_world_config(""), Err(Error::EmptyDocument)));
        assert!(matches!(
            parse_world_config("  \n\t\n"),
            Err(Error::EmptyDocument)
        ));
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = parse_world_config("items: [unclosed\n").unwrap_err();
        assert!(matches!(err, Error::InvalidYaml(_)));
        assert!(err.to_string().starts_with("Invalid YAML syntax: "));
    }

    #[test]
    fn non_mapping_root_is_rejected() {
        let err = parse_world_config("- a\n- b\n").unwrap_err();
        assert_eq!(err.to_string(), "YAML root must be a mapping/dict");
    }

    #[test]
    fn comment_only_document_is_missing_items() {
        let err = parse_world_config("# nothing here\n").unwrap_err();
        assert_eq!(err.to_string(), "YAML must contain 'items' key");
    }

    #[test]
    fn missing_sections_are_named() {
        let err = parse_world_config("items: {}\n").unwrap_err();
        assert_eq!(err.to_string(), "YAML must contain 'locations' key");

        let err = parse_world_config("locations: {}\n").unwrap_err();
        assert_eq!(err.to_string(), "YAML must contain 'items' key");
    }

    #[test]
    fn section_must_be_a_mapping() {
        let err = parse_world_config("items: [a]\nlocations: {}\n").unwrap_err();
        assert_eq!(err.to_string(), "'items' must be a mapping");

        let err = parse_world_config("items: {}\nlocations: text\n").unwrap_err();
        assert_eq!(err.to_string(), "'locations' must be a mapping");
    }

    #[test]
    fn null_section_is_empty() {
        let world = parse_world_config("items:\nlocations:\n  town: [Well]\n").unwrap();
        assert!(world.items.is_empty());
        assert_eq!(world.locations.len(), 1);
    }

    #[test]
    fn category_value_must_be_a_list() {
        let err = parse_world_config("items:\n  normal: Sword\nlocations: {}\n").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
        assert_eq!(err.to_string(), "'items' category 'normal' must be a list");
    }

    #[test]
    fn nested_collections_inside_lists_are_rejected() {
        let err =
            parse_world_config("items: {}\nlocations:\n  town: [[nested]]\n").unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }

    #[test]
    fn scalars_are_stringified() {
        let world =
            parse_world_config("items:\n  normal: [42, 1.5, true, false, ~]\nlocations:\n  7: [x]\n")
                .unwrap();
        assert_eq!(
            world.items["normal"],
            vec!["42", "1.5", "True", "False", "None"]
        );
        assert!(world.locations.contains_key("7"));
    }

    #[test]
    fn literal_unicode_escapes_are_decoded() {
        // Single-quoted YAML keeps the backslash sequences as text.
        let text = "items:\n  normal: ['Caf\\u00e9']\nlocations:\n  'r\\u00e9gion': ['\\U0001F600']\n";
        let world = parse_world_config(text).unwrap();
        assert_eq!(world.items["normal"], vec!["Café"]);
        assert_eq!(world.locations["région"], vec!["😀"]);
    }

    #[test]
    fn double_quoted_yaml_escapes_are_already_decoded() {
        let text = "items:\n  normal: [\"Caf\\u00e9\"]\nlocations: {}\n";
        let world = parse_world_config(text).unwrap();
        assert_eq!(world.items["normal"], vec!["Café"]);
    }

    #[test]
    fn to_yaml_keeps_order_and_unicode() {
        let document = parse_document("locations:\n  b: [é]\nitems:\n  a: [x]\n").unwrap();
        let text = to_yaml(&document).unwrap();
        let locations = text.find("locations").unwrap();
        let items = text.find("items").unwrap();
        assert!(locations < items);
        assert!(text.contains('é'));
        assert_eq!(parse_document(&text).unwrap(), document);
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        let err = load_world_config(&path).await.unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(ref p) if p == &path));
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chati.yaml");
        tokio::fs::write(&path, "items:\n  trap: [Bee]\nlocations:\n  den: [Hole]\n")
            .await
            .unwrap();

        let world = load_world_config(&path).await.unwrap();
        assert_eq!(world.items["trap"], vec!["Bee"]);
        assert_eq!(world.locations["den"], vec!["Hole"]);
    }
}
