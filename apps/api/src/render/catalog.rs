//! Built-in template catalog.
//!
//! A template is a layout (which sections, in which order, with which variant)
//! plus design tokens. Lookups never fail: unknown ids resolve to the fallback
//! entry so documents naming retired templates still render.

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::document::SectionType;
use crate::render::format::DateStyle;

pub const FALLBACK_TEMPLATE_ID: &str = "professional-classic";
pub const DEFAULT_THEME_COLOR: &str = "#2563eb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateCategory {
    Professional,
    Modern,
    Minimal,
    Creative,
    Fresher,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingStyle {
    Simple,
    Underline,
    LeftBorder,
    Background,
}

#[derive(Debug, Clone, Serialize)]
pub struct Typography {
    pub font_family: String,
    pub name_size: String,
    pub heading_size: String,
    pub item_size: String,
    pub body_size: String,
    pub small_size: String,
    pub body_color: String,
    pub muted_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Spacing {
    pub page_padding: String,
    pub section_gap: String,
    pub item_gap: String,
}

/// Design tokens consumed by every variant.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateConfig {
    pub typography: Typography,
    pub spacing: Spacing,
    pub date_style: DateStyle,
    pub heading_style: HeadingStyle,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        TemplateConfig {
            typography: Typography {
                font_family: "'Inter', 'Helvetica Neue', Arial, sans-serif".to_string(),
                name_size: "28px".to_string(),
                heading_size: "14px".to_string(),
                item_size: "13px".to_string(),
                body_size: "12px".to_string(),
                small_size: "11px".to_string(),
                body_color: "#1f2937".to_string(),
                muted_color: "#6b7280".to_string(),
            },
            spacing: Spacing {
                page_padding: "40px 48px".to_string(),
                section_gap: "18px".to_string(),
                item_gap: "12px".to_string(),
            },
            date_style: DateStyle::Short,
            heading_style: HeadingStyle::Underline,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSlot {
    pub section: SectionType,
    pub variant: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateDefinition {
    pub id: String,
    pub name: String,
    pub category: TemplateCategory,
    pub layout: Vec<SectionSlot>,
    pub config: TemplateConfig,
    pub default_theme_color: String,
}

fn slots(entries: &[(SectionType, &str)]) -> Vec<SectionSlot> {
    entries
        .iter()
        .map(|(section, variant)| SectionSlot {
            section: *section,
            variant: variant.to_string(),
        })
        .collect()
}

pub struct TemplateCatalog {
    templates: Vec<TemplateDefinition>,
}

impl TemplateCatalog {
    pub fn builtin() -> Self {
        use SectionType::*;

        let professional = TemplateDefinition {
            id: FALLBACK_TEMPLATE_ID.to_string(),
            name: "Professional Classic".to_string(),
            category: TemplateCategory::Professional,
            layout: slots(&[
                (Experience, "standard"),
                (Education, "standard"),
                (Skills, "pills"),
                (Projects, "standard"),
                (Certifications, "standard"),
                (Languages, "standard"),
                (Volunteer, "standard"),
                (Awards, "standard"),
            ]),
            config: TemplateConfig::default(),
            default_theme_color: DEFAULT_THEME_COLOR.to_string(),
        };

        let mut modern_config = TemplateConfig::default();
        modern_config.heading_style = HeadingStyle::LeftBorder;
        modern_config.typography.name_size = "32px".to_string();
        let modern = TemplateDefinition {
            id: "modern-timeline".to_string(),
            name: "Modern Timeline".to_string(),
            category: TemplateCategory::Modern,
            layout: slots(&[
                (Experience, "timeline"),
                (Projects, "cards"),
                (Skills, "bars"),
                (Education, "timeline"),
                (Languages, "bars"),
                (Volunteer, "timeline"),
                (Awards, "timeline"),
            ]),
            config: modern_config,
            default_theme_color: "#0d9488".to_string(),
        };

        let mut minimal_config = TemplateConfig::default();
        minimal_config.heading_style = HeadingStyle::Simple;
        minimal_config.date_style = DateStyle::YearOnly;
        minimal_config.spacing.section_gap = "12px".to_string();
        minimal_config.spacing.item_gap = "6px".to_string();
        let minimal = TemplateDefinition {
            id: "compact-minimal".to_string(),
            name: "Compact Minimal".to_string(),
            category: TemplateCategory::Minimal,
            layout: slots(&[
                (Experience, "compact"),
                (Education, "compact"),
                (Skills, "inline"),
                (Certifications, "compact"),
                (Languages, "inline"),
                (Volunteer, "compact"),
            ]),
            config: minimal_config,
            default_theme_color: "#111827".to_string(),
        };

        let mut creative_config = TemplateConfig::default();
        creative_config.heading_style = HeadingStyle::Background;
        creative_config.typography.font_family = "'Poppins', 'Segoe UI', sans-serif".to_string();
        let creative = TemplateDefinition {
            id: "creative-cards".to_string(),
            name: "Creative Cards".to_string(),
            category: TemplateCategory::Creative,
            layout: slots(&[
                (Experience, "cards"),
                (Projects, "detailed"),
                (Skills, "grouped"),
                (Education, "cards"),
                (Languages, "grid"),
                (Volunteer, "cards"),
            ]),
            config: creative_config,
            default_theme_color: "#9333ea".to_string(),
        };

        let mut fresher_config = TemplateConfig::default();
        fresher_config.date_style = DateStyle::Long;
        let fresher = TemplateDefinition {
            id: "fresher-starter".to_string(),
            name: "Fresher Starter".to_string(),
            category: TemplateCategory::Fresher,
            layout: slots(&[
                (Education, "standard"),
                (Projects, "standard"),
                (Skills, "columns"),
                (Experience, "minimal"),
                (Volunteer, "detailed"),
                (Certifications, "standard"),
                (Awards, "standard"),
            ]),
            config: fresher_config,
            default_theme_color: "#16a34a".to_string(),
        };

        TemplateCatalog {
            templates: vec![professional, modern, minimal, creative, fresher],
        }
    }

    pub fn all(&self) -> &[TemplateDefinition] {
        &self.templates
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.iter().any(|t| t.id == id)
    }

    /// Looks up `id`, falling back to the default template.
    pub fn get(&self, id: &str) -> &TemplateDefinition {
        self.templates
            .iter()
            .find(|t| t.id == id)
            .unwrap_or_else(|| self.fallback())
    }

    pub fn fallback(&self) -> &TemplateDefinition {
        // `builtin` always places the fallback first
        &self.templates[0]
    }
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn id() -> String {
    Uuid::new_v4().to_string()
}

/// Starter document for a new resume on `template`.
pub fn default_document(template: &TemplateDefinition) -> Value {
    let mut document = match template.category {
        TemplateCategory::Fresher => fresher_sample(),
        _ => professional_sample(),
    };
    document["themeColor"] = json!(template.default_theme_color);
    document
}

fn professional_sample() -> Value {
    json!({
        "personalInfo": {
            "fullName": "Alex Morgan",
            "title": "Senior Software Engineer",
            "email": "alex.morgan@email.com",
            "phone": "+1 (555) 123-4567",
            "location": "San Francisco, CA",
            "summary": "Software engineer with 8+ years building scalable web platforms. Led teams that shipped distributed systems serving millions of users.",
            "linkedin": "linkedin.com/in/alexmorgan",
            "github": "github.com/alexmorgan"
        },
        "experience": [
            {
                "id": id(),
                "company": "Tech Corp",
                "position": "Senior Software Engineer",
                "location": "San Francisco, CA",
                "startDate": "2020-01",
                "endDate": "",
                "current": true,
                "description": "Own the platform team's core services.",
                "highlights": [
                    "Led migration to microservices, reducing latency by 40%",
                    "Mentored 5 engineers and introduced design reviews"
                ]
            },
            {
                "id": id(),
                "company": "StartupXYZ",
                "position": "Software Engineer",
                "location": "Remote",
                "startDate": "2017-06",
                "endDate": "2019-12",
                "current": false,
                "highlights": [
                    "Built the real-time analytics dashboard in React and TypeScript",
                    "Implemented CI/CD pipelines cutting release time from days to hours"
                ]
            }
        ],
        "education": [{
            "id": id(),
            "school": "University of California, Berkeley",
            "degree": "Bachelor of Science",
            "field": "Computer Science",
            "startDate": "2013-09",
            "endDate": "2017-05",
            "honors": []
        }],
        "skills": [
            { "id": id(), "name": "TypeScript", "level": 5, "category": "Languages" },
            { "id": id(), "name": "Rust", "level": 4, "category": "Languages" },
            { "id": id(), "name": "React", "level": 5, "category": "Frontend" },
            { "id": id(), "name": "PostgreSQL", "level": 4, "category": "Backend" },
            { "id": id(), "name": "AWS", "level": 4, "category": "Cloud" },
            { "id": id(), "name": "Docker", "level": 3, "category": "Cloud" }
        ],
        "languages": [
            { "id": id(), "language": "English", "proficiency": "Native" },
            { "id": id(), "language": "Spanish", "proficiency": "Professional" }
        ],
        "volunteer": [],
        "projects": [{
            "id": id(),
            "name": "Open Source Observability Kit",
            "description": "Tracing and metrics toolkit adopted by 200+ teams.",
            "technologies": ["Rust", "OpenTelemetry"],
            "highlights": []
        }],
        "certifications": [{
            "id": id(),
            "name": "AWS Certified Solutions Architect",
            "issuer": "Amazon Web Services",
            "date": "2022-03"
        }],
        "awards": [],
        "sections": []
    })
}

fn fresher_sample() -> Value {
    json!({
        "personalInfo": {
            "fullName": "Jordan Lee",
            "title": "Computer Science Graduate",
            "email": "jordan.lee@email.com",
            "phone": "+1 (555) 987-6543",
            "location": "Austin, TX",
            "summary": "Recent graduate with hands-on project experience in web development and a strong foundation in algorithms.",
            "github": "github.com/jordanlee"
        },
        "experience": [{
            "id": id(),
            "company": "Campus IT Services",
            "position": "Student Developer",
            "startDate": "2023-01",
            "endDate": "2024-05",
            "current": false,
            "highlights": ["Built an internal ticketing tool used by 30 staff"]
        }],
        "education": [{
            "id": id(),
            "school": "University of Texas at Austin",
            "degree": "Bachelor of Science",
            "field": "Computer Science",
            "startDate": "2020-09",
            "endDate": "2024-05",
            "gpa": "3.8",
            "honors": ["Dean's List"]
        }],
        "skills": [
            { "id": id(), "name": "Python" },
            { "id": id(), "name": "JavaScript" },
            { "id": id(), "name": "React" },
            { "id": id(), "name": "SQL" },
            { "id": id(), "name": "Git" }
        ],
        "languages": [],
        "volunteer": [{
            "id": id(),
            "organization": "Code for Good",
            "role": "Mentor",
            "startDate": "2022-09",
            "endDate": "",
            "current": true,
            "highlights": ["Teach weekly programming sessions to high school students"]
        }],
        "projects": [{
            "id": id(),
            "name": "Study Buddy",
            "description": "Web app that matches students into study groups.",
            "role": "Lead developer",
            "technologies": ["React", "Node.js", "PostgreSQL"],
            "highlights": ["300+ active users in the first semester"]
        }],
        "certifications": [],
        "awards": [{
            "id": id(),
            "title": "Hackathon Winner",
            "issuer": "HackTX",
            "date": "2023-10"
        }],
        "sections": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::ResumeData;

    #[test]
    fn test_unknown_template_falls_back() {
        let catalog = TemplateCatalog::builtin();
        assert_eq!(catalog.get("does-not-exist").id, FALLBACK_TEMPLATE_ID);
        assert_eq!(catalog.get("modern-timeline").id, "modern-timeline");
        assert!(!catalog.contains("does-not-exist"));
    }

    #[test]
    fn test_template_ids_unique() {
        let catalog = TemplateCatalog::builtin();
        let mut ids: Vec<_> = catalog.all().iter().map(|t| t.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.all().len());
    }

    #[test]
    fn test_default_document_by_category() {
        let catalog = TemplateCatalog::builtin();
        let fresher = ResumeData::from_value_lossy(&default_document(catalog.get("fresher-starter")));
        assert_eq!(fresher.personal_info.full_name, "Jordan Lee");
        assert_eq!(fresher.theme_color.as_deref(), Some("#16a34a"));

        let pro = ResumeData::from_value_lossy(&default_document(catalog.fallback()));
        assert_eq!(pro.experience.len(), 2);
        assert!(pro.experience.iter().all(|e| !e.id.is_empty()));
    }
}
