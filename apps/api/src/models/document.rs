//! The resume document of record and its item entities.
//!
//! The editor works on the untyped JSON tree (see `editor::tree`); these types are
//! the typed projection used by renderers, defaults and analysis. Every field
//! defaults when absent so sparse or older documents always deserialize.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Top-level keys that always hold arrays.
pub const LIST_KEYS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "languages",
    "volunteer",
    "projects",
    "certifications",
    "awards",
    "sections",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperienceItem {
    pub id: String,
    pub company: String,
    pub position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    pub honors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillItem {
    pub id: String,
    pub name: String,
    /// 1-5 proficiency, used by the bars variant.
    #[serde(deserialize_with = "lenient_level", skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LanguageItem {
    pub id: String,
    pub language: String,
    pub proficiency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
}

impl LanguageItem {
    /// Maps the free-text proficiency onto a 1-5 scale for bar/grid variants.
    pub fn proficiency_level(&self) -> u8 {
        match self.proficiency.to_ascii_lowercase().as_str() {
            "native" | "bilingual" => 5,
            "fluent" => 5,
            "professional" | "advanced" => 4,
            "intermediate" => 3,
            "basic" => 2,
            "elementary" | "beginner" => 1,
            _ => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolunteerItem {
    pub id: String,
    pub organization: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectItem {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CertificationItem {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AwardItem {
    pub id: String,
    pub title: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Tag of a resume section. Unknown tags from older documents become `Custom`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Languages,
    Volunteer,
    Certifications,
    Awards,
    #[default]
    #[serde(other)]
    Custom,
}

impl SectionType {
    pub const ALL: [SectionType; 10] = [
        SectionType::Summary,
        SectionType::Experience,
        SectionType::Education,
        SectionType::Skills,
        SectionType::Projects,
        SectionType::Languages,
        SectionType::Volunteer,
        SectionType::Certifications,
        SectionType::Awards,
        SectionType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Summary => "summary",
            SectionType::Experience => "experience",
            SectionType::Education => "education",
            SectionType::Skills => "skills",
            SectionType::Projects => "projects",
            SectionType::Languages => "languages",
            SectionType::Volunteer => "volunteer",
            SectionType::Certifications => "certifications",
            SectionType::Awards => "awards",
            SectionType::Custom => "custom",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            SectionType::Summary => "Professional Summary",
            SectionType::Experience => "Experience",
            SectionType::Education => "Education",
            SectionType::Skills => "Skills",
            SectionType::Projects => "Projects",
            SectionType::Languages => "Languages",
            SectionType::Volunteer => "Volunteer Experience",
            SectionType::Certifications => "Certifications",
            SectionType::Awards => "Awards & Honors",
            SectionType::Custom => "Custom Section",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section type '{0}'")]
pub struct UnknownSectionType(pub String);

impl FromStr for SectionType {
    type Err = UnknownSectionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSectionType(s.to_string()))
    }
}

/// A user-added block on the free-form canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeSection {
    pub id: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    pub order: u32,
    #[serde(deserialize_with = "lenient_bool")]
    pub enabled: bool,
    pub title: String,
    /// Payload whose structure follows the variant's `DataShape`.
    pub data: Value,
}

impl Default for ResumeSection {
    fn default() -> Self {
        ResumeSection {
            id: String::new(),
            section_type: SectionType::Custom,
            variant_id: None,
            order: 0,
            enabled: true,
            title: String::new(),
            data: Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeData {
    pub personal_info: PersonalInfo,
    pub experience: Vec<ExperienceItem>,
    pub education: Vec<EducationItem>,
    pub skills: Vec<SkillItem>,
    pub languages: Vec<LanguageItem>,
    pub volunteer: Vec<VolunteerItem>,
    pub projects: Vec<ProjectItem>,
    pub certifications: Vec<CertificationItem>,
    pub awards: Vec<AwardItem>,
    #[serde(alias = "dynamicSections")]
    pub sections: Vec<ResumeSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
}

impl ResumeData {
    /// Typed projection of an edited tree.
    ///
    /// Malformed entries are replaced by defaults in place, so list positions (and
    /// therefore edit paths) stay aligned with the underlying document.
    pub fn from_value_lossy(value: &Value) -> Self {
        let root = normalize_document(value.clone());
        let personal_info = root
            .get("personalInfo")
            .cloned()
            .map(|v| lenient_entry("personalInfo", v))
            .unwrap_or_default();

        ResumeData {
            personal_info,
            experience: lenient_list(&root, "experience"),
            education: lenient_list(&root, "education"),
            skills: lenient_list(&root, "skills"),
            languages: lenient_list(&root, "languages"),
            volunteer: lenient_list(&root, "volunteer"),
            projects: lenient_list(&root, "projects"),
            certifications: lenient_list(&root, "certifications"),
            awards: lenient_list(&root, "awards"),
            sections: lenient_list(&root, "sections"),
            theme_color: root
                .get("themeColor")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

fn lenient_entry<T: DeserializeOwned + Default>(key: &str, value: Value) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Malformed '{key}' entry replaced with default: {e}");
        T::default()
    })
}

/// Deserializes the array at `root[key]` entry by entry; malformed entries become defaults.
pub fn lenient_list<T: DeserializeOwned + Default>(root: &Value, key: &str) -> Vec<T> {
    root.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| lenient_entry(key, item.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Ensures the root is an object, every list key holds an array and
/// `personalInfo` is an object. Other keys are left untouched.
pub fn normalize_document(value: Value) -> Value {
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    if !map.get("personalInfo").is_some_and(Value::is_object) {
        map.insert("personalInfo".to_string(), Value::Object(Map::new()));
    }
    if let Some(dynamic) = map.remove("dynamicSections") {
        map.entry("sections").or_insert(dynamic);
    }
    for key in LIST_KEYS {
        if !map.get(*key).is_some_and(Value::is_array) {
            map.insert(key.to_string(), Value::Array(Vec::new()));
        }
    }

    Value::Object(map)
}

/// Counts words across every string leaf, ignoring `id` fields.
pub fn word_count(value: &Value) -> usize {
    match value {
        Value::String(s) => s.split_whitespace().count(),
        Value::Array(items) => items.iter().map(word_count).sum(),
        Value::Object(map) => map
            .iter()
            .filter(|(key, _)| key.as_str() != "id")
            .map(|(_, v)| word_count(v))
            .sum(),
        _ => 0,
    }
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        _ => false,
    })
}

fn lenient_level<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let level = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(level.map(|l| l.round().clamp(0.0, 100.0) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_document_deserializes() {
        let data = ResumeData::from_value_lossy(&json!({ "personalInfo": { "fullName": "Ada" } }));
        assert_eq!(data.personal_info.full_name, "Ada");
        assert!(data.experience.is_empty());
        assert!(data.sections.is_empty());
    }

    #[test]
    fn test_dynamic_sections_alias() {
        let data = ResumeData::from_value_lossy(&json!({
            "dynamicSections": [{ "id": "s1", "type": "skills", "order": 0, "enabled": true, "title": "Skills" }]
        }));
        assert_eq!(data.sections.len(), 1);
        assert_eq!(data.sections[0].section_type, SectionType::Skills);
    }

    #[test]
    fn test_section_without_enabled_flag_is_visible() {
        let section: ResumeSection = serde_json::from_value(json!({ "id": "x", "type": "summary" })).unwrap();
        assert!(section.enabled);
        assert!(section.data.is_object());
    }

    #[test]
    fn test_unknown_section_type_is_custom() {
        let section: ResumeSection =
            serde_json::from_value(json!({ "id": "x", "type": "hobbies-retired" })).unwrap();
        assert_eq!(section.section_type, SectionType::Custom);
    }

    #[test]
    fn test_malformed_item_keeps_position() {
        let data = ResumeData::from_value_lossy(&json!({
            "volunteer": [
                { "id": "a", "role": 42 },
                { "id": "b", "role": "Tutor", "current": "yes" }
            ]
        }));
        assert_eq!(data.volunteer.len(), 2);
        assert_eq!(data.volunteer[0].role, "");
        assert_eq!(data.volunteer[1].role, "Tutor");
        assert!(data.volunteer[1].current);
    }

    #[test]
    fn test_normalize_repairs_lists() {
        let normalized = normalize_document(json!({ "experience": "oops", "personalInfo": null }));
        assert!(normalized["experience"].as_array().unwrap().is_empty());
        assert!(normalized["personalInfo"].is_object());
        assert!(normalized["sections"].is_array());
    }

    #[test]
    fn test_normalize_non_object_root() {
        let normalized = normalize_document(json!([1, 2, 3]));
        assert!(normalized.is_object());
        assert!(normalized["skills"].is_array());
    }

    #[test]
    fn test_word_count_skips_ids() {
        let doc = json!({
            "personalInfo": { "fullName": "Ada Lovelace" },
            "experience": [{ "id": "one two three", "highlights": ["Built the engine", "Wrote notes"] }]
        });
        assert_eq!(word_count(&doc), 7);
    }

    #[test]
    fn test_section_type_from_str() {
        assert_eq!("Volunteer".parse::<SectionType>().unwrap(), SectionType::Volunteer);
        let err = "hobbies".parse::<SectionType>().unwrap_err();
        assert_eq!(err.to_string(), "unknown section type 'hobbies'");
    }

    #[test]
    fn test_language_proficiency_level() {
        let item = LanguageItem {
            proficiency: "Intermediate".into(),
            ..Default::default()
        };
        assert_eq!(item.proficiency_level(), 3);
    }
}
