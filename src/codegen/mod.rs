//! Python source generation for the `names` package of the world
//!
//! Two modules are produced:
//!
//! - `RegionName.py` binds one identifier per location category to the list
//!   of location names in that category.
//! - `ItemName.py` binds one `ItemNum<N>` constant per item, where `N` is the
//!   item's position inside its category plus the category's fixed base
//!   (see [`ItemCategory::base`]).
//!
//! Rendering is pure and deterministic: the same mapping always produces
//! byte-identical text.

use crate::types::{CategoryMapping, ItemCategory};

pub mod escape;

pub use escape::{decode_unicode_escapes, escape_literal, python_literal};

/// File name of the generated location module
pub const REGION_FILE_NAME: &str = "RegionName.py";

/// File name of the generated item module
pub const ITEM_FILE_NAME: &str = "ItemName.py";

const HEADER: &str = "# Auto-generated by apworld-forge";

/// Derive a Python identifier from a location category name.
///
/// Every character that is not alphanumeric or `_` becomes `_`, and the
/// result is prefixed with `_` when it is empty or starts with a digit.
/// Distinct categories can map to the same identifier (`"a-b"` and `"a b"`
/// both give `a_b`); the later assignment then shadows the earlier one.
pub fn location_identifier(category: &str) -> String {
    let mut ident: String = category
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.chars().next().is_none_or(|c| c.is_numeric()) {
        ident.insert(0, '_');
    }
    ident
}

/// Identifier of the item at `position` within `category`.
pub fn item_identifier(category: ItemCategory, position: usize) -> String {
    format!("ItemNum{}", category.base() + position)
}

/// Render the `RegionName` module for `locations`.
pub fn render_locations(locations: &CategoryMapping) -> String {
    let mut lines = Vec::with_capacity(locations.len() + 1);
    lines.push(HEADER.to_string());

    for (category, names) in locations {
        let ident = location_identifier(category);
        let rendered: Vec<String> = names.iter().map(|name| python_literal(name)).collect();
        tracing::trace!(category = %category, ident = %ident, count = names.len(), "rendered region category");
        lines.push(format!("{ident} = [{}]", rendered.join(", ")));
    }

    finish(lines)
}

/// Render the `ItemName` module for `items`.
///
/// Only the `normal`, `trap`, `filler` and `prog` categories are written;
/// any other key is skipped with a warning.
pub fn render_items(items: &CategoryMapping) -> String {
    for key in items.keys() {
        if ItemCategory::from_key(key).is_none() {
            tracing::warn!(category = %key, "ignoring unknown item category");
        }
    }

    let total: usize = ItemCategory::ALL
        .iter()
        .filter_map(|category| items.get(category.key()))
        .map(Vec::len)
        .sum();

    let mut lines = Vec::with_capacity(total + 1);
    lines.push(HEADER.to_string());

    for category in ItemCategory::ALL {
        let Some(names) = items.get(category.key()) else {
            continue;
        };
        for (position, name) in names.iter().enumerate() {
            lines.push(format!(
                "{} = {}",
                item_identifier(category, position),
                python_literal(name)
            ));
        }
    }

    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
