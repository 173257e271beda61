//! Ordered list of user-added sections on the free-form canvas.
//!
//! Sections are kept as the raw JSON entries of the document, so keys the
//! manager does not touch survive every structural change untouched, even when
//! they do not fit the typed model. After every structural change the `order`
//! field of each section equals its index, so `order` is always exactly `0..N-1`.

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::models::document::{ResumeSection, SectionType};
use crate::sections::shapes::{seed_payload, shape_for};

#[derive(Debug, Clone, Default)]
pub struct SectionManager {
    sections: Vec<Value>,
}

fn section_id(section: &Value) -> Option<&str> {
    section.get("id").and_then(Value::as_str)
}

impl SectionManager {
    /// Takes section entries in any order and normalises them (stable sort by
    /// `order`, entries without a numeric order last, then renumbered).
    pub fn new(mut sections: Vec<Value>) -> Self {
        sections.sort_by_key(|s| s.get("order").and_then(Value::as_u64).unwrap_or(u64::MAX));
        let mut manager = SectionManager { sections };
        manager.renumber();
        manager
    }

    /// Typed view, for assertions.
    #[cfg(test)]
    pub fn sections(&self) -> Vec<ResumeSection> {
        self.sections
            .iter()
            .map(|s| serde_json::from_value(s.clone()).unwrap_or_default())
            .collect()
    }

    pub fn into_sections(self) -> Vec<Value> {
        self.sections
    }

    /// Appends a new section seeded with starter content shaped for `variant`.
    pub fn add_section(&mut self, section_type: SectionType, variant: Option<&str>) -> ResumeSection {
        let shape = shape_for(section_type, variant);
        let index = self.sections.len();

        let section = ResumeSection {
            id: Uuid::new_v4().to_string(),
            section_type,
            variant_id: variant.map(str::to_string),
            order: index as u32,
            enabled: true,
            title: section_type.default_title().to_string(),
            data: seed_payload(section_type, shape),
        };
        let mut entry = json!({
            "id": section.id,
            "type": section_type,
            "order": section.order,
            "enabled": true,
            "title": section.title,
            "data": section.data,
        });
        if let Some(variant) = variant {
            entry["variantId"] = json!(variant);
        }
        self.sections.push(entry);
        debug!("Added {section_type} section ({shape:?}) at position {index}");

        section
    }

    /// Moves `active_id` to the position held by `over_id`.
    ///
    /// Returns false (and leaves the list untouched) for a drop outside any
    /// target, a drop onto itself, or unknown ids.
    pub fn reorder(&mut self, active_id: &str, over_id: Option<&str>) -> bool {
        let Some(over_id) = over_id else {
            return false;
        };
        if active_id == over_id {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(active_id), self.position(over_id)) else {
            return false;
        };

        let moved = self.sections.remove(from);
        self.sections.insert(to, moved);
        self.renumber();
        true
    }

    pub fn delete_section(&mut self, id: &str) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        self.sections.remove(index);
        self.renumber();
        true
    }

    /// Shows or hides a section without deleting it.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        self.set_key(id, "enabled", Value::Bool(enabled))
    }

    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        self.set_key(id, "title", Value::String(title.trim().to_string()))
    }

    fn set_key(&mut self, id: &str, key: &str, value: Value) -> bool {
        let Some(Value::Object(map)) = self.sections.iter_mut().find(|s| section_id(s) == Some(id)) else {
            return false;
        };
        if map.get(key) == Some(&value) {
            return false;
        }
        map.insert(key.to_string(), value);
        true
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.sections.iter().position(|s| section_id(s) == Some(id))
    }

    fn renumber(&mut self) {
        for (index, section) in self.sections.iter_mut().enumerate() {
            if let Value::Object(map) = section {
                map.insert("order".to_string(), json!(index));
            }
        }
    }
}
