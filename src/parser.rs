use crate::config::LayoutConfigFile;
use crate::ir::{Entity, EntitySet};
use anyhow::{Result, anyhow};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

static TIER_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)[\s_\-:]+(?:(?:mk|tier|level|lvl)\.?[\s_\-]*)?(?:[ivx]+|\d+)$").unwrap()
});
static TRAILING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+$").unwrap());

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityRecord {
    id: String,
    label: Option<String>,
    category: Option<String>,
    #[serde(default)]
    prerequisites: Vec<String>,
    #[serde(default)]
    finished: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<EntityRecord>),
    Wrapped {
        entities: Vec<EntityRecord>,
        #[serde(default)]
        layout: Option<LayoutConfigFile>,
    },
}

#[derive(Debug, Default)]
pub struct ParseOutput {
    pub entities: EntitySet,
    pub layout_overrides: Option<LayoutConfigFile>,
    /// Ids that appeared more than once; only the first record was kept.
    pub duplicates: Vec<String>,
}

pub fn parse_entities(input: &str) -> Result<ParseOutput> {
    let document = match serde_json::from_str::<Document>(input) {
        Ok(document) => document,
        Err(strict_err) => json5::from_str::<Document>(input)
            .map_err(|_| anyhow!("invalid entity document: {strict_err}"))?,
    };
    let (records, layout_overrides) = match document {
        Document::List(records) => (records, None),
        Document::Wrapped { entities, layout } => (entities, layout),
    };

    let mut output = ParseOutput {
        layout_overrides,
        ..Default::default()
    };
    for (idx, record) in records.into_iter().enumerate() {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(anyhow!("entity #{idx} has an empty id"));
        }
        let label = record
            .label
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| id.clone());
        let category = record
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| derive_category(&label));
        let entity = Entity {
            prerequisites: record
                .prerequisites
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            id: id.clone(),
            label,
            category,
            finished: record.finished,
        };
        if !output.entities.push(entity) {
            tracing::warn!(entity = %id, "duplicate entity id, keeping the first record");
            output.duplicates.push(id);
        }
    }
    Ok(output)
}

/// Strips a trailing tier marker so that "Construction III" and
/// "Construction IV" land in the same category.
pub fn derive_category(label: &str) -> String {
    let trimmed = label.trim();
    let stripped = TIER_SUFFIX_RE.replace(trimmed, "");
    let stripped = stripped.trim();
    if !stripped.is_empty() && stripped != trimmed {
        return stripped.to_string();
    }
    // Glued numbers such as "Smithing2".
    let glued = TRAILING_DIGITS_RE.replace(trimmed, "");
    let glued = glued.trim();
    if glued.is_empty() {
        trimmed.to_string()
    } else {
        glued.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bare_list() {
        let input = r#"[
            {"id": "basics", "label": "Basics"},
            {"id": "smith1", "label": "Smithing I", "prerequisites": ["basics"], "finished": true},
            {"id": "smith2", "label": "Smithing II", "prerequisites": ["smith1"]}
        ]"#;
        let parsed = parse_entities(input).unwrap();
        assert_eq!(parsed.entities.len(), 3);
        let smith1 = parsed.entities.get("smith1").unwrap();
        assert_eq!(smith1.category, "Smithing");
        assert!(smith1.finished);
        assert_eq!(smith1.prerequisites, vec!["basics".to_string()]);
        assert!(parsed.layout_overrides.is_none());
    }

    #[test]
    fn parse_wrapped_document_with_layout() {
        let input = r#"{
            "entities": [{"id": "a", "category": "Power"}],
            "layout": {"displayWidth": 900}
        }"#;
        let parsed = parse_entities(input).unwrap();
        assert_eq!(parsed.entities.get("a").unwrap().category, "Power");
        assert_eq!(parsed.entities.get("a").unwrap().label, "a");
        assert_eq!(parsed.layout_overrides.unwrap().display_width, Some(900.0));
    }

    #[test]
    fn json5_fallback_accepts_comments() {
        let input = "[\n  // starting point\n  {id: 'a', label: 'Alpha',},\n]";
        let parsed = parse_entities(input).unwrap();
        assert_eq!(parsed.entities.len(), 1);
    }

    #[test]
    fn duplicates_are_reported() {
        let input = r#"[{"id": "a"}, {"id": "a", "label": "Again"}]"#;
        let parsed = parse_entities(input).unwrap();
        assert_eq!(parsed.entities.len(), 1);
        assert_eq!(parsed.duplicates, vec!["a".to_string()]);
    }

    #[test]
    fn empty_id_is_an_error() {
        assert!(parse_entities(r#"[{"id": "  "}]"#).is_err());
        assert!(parse_entities("not a document").is_err());
    }

    #[test]
    fn derives_category_from_tier_suffix() {
        assert_eq!(derive_category("Construction III"), "Construction");
        assert_eq!(derive_category("Smithing 2"), "Smithing");
        assert_eq!(derive_category("Smithing2"), "Smithing");
        assert_eq!(derive_category("Rifle Mk 4"), "Rifle");
        assert_eq!(derive_category("Armor tier-2"), "Armor");
        assert_eq!(derive_category("Electricity"), "Electricity");
        assert_eq!(derive_category("IV"), "IV");
        assert_eq!(derive_category("42"), "42");
    }
}
