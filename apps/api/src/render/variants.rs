//! Section variants: interchangeable visual projections of one section's items.
//!
//! All variants of a section type consume the same [`SectionProps`]; the registry
//! only decides which template draws them. Unknown or missing variant ids resolve
//! to the type's default so documents naming retired variants keep rendering.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::document::{
    AwardItem, CertificationItem, EducationItem, ExperienceItem, LanguageItem, ProjectItem,
    SectionType, SkillItem, VolunteerItem,
};
use crate::render::catalog::TemplateConfig;
use crate::render::format::DateStyle;
use crate::render::style::StyleTokens;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantCategory {
    Standard,
    Modern,
    Minimal,
    Creative,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantMeta {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: VariantCategory,
    pub recommended: bool,
}

const fn variant(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: VariantCategory,
    recommended: bool,
) -> VariantMeta {
    VariantMeta {
        id,
        name,
        description,
        category,
        recommended,
    }
}

use VariantCategory::*;

/// Registered variants per type. The first entry of each list is the default.
const VARIANTS: &[(SectionType, &[VariantMeta])] = &[
    (
        SectionType::Experience,
        &[
            variant("standard", "Standard", "Position, company, dates and bullet points", Standard, true),
            variant("compact", "Compact", "Single-line entries for long histories", Minimal, false),
            variant("timeline", "Timeline", "Vertical timeline with connecting line and dots", Modern, true),
            variant("cards", "Cards", "Bordered cards per role", Modern, false),
            variant("minimal", "Minimal", "Text-only layout", Minimal, false),
        ],
    ),
    (
        SectionType::Education,
        &[
            variant("standard", "Standard", "Degree, school and dates", Standard, true),
            variant("compact", "Compact", "Single-line entries", Minimal, false),
            variant("timeline", "Timeline", "Educational progression on a timeline", Modern, false),
            variant("cards", "Cards", "Card per institution", Modern, true),
        ],
    ),
    (
        SectionType::Skills,
        &[
            variant("pills", "Pills", "Rounded pill badges", Standard, true),
            variant("bars", "Progress Bars", "Bars showing proficiency levels", Modern, true),
            variant("columns", "Columns", "Multi-column list", Standard, false),
            variant("grouped", "Grouped", "Skills grouped by category", Standard, true),
            variant("inline", "Inline", "Bullet-separated line", Minimal, false),
        ],
    ),
    (
        SectionType::Languages,
        &[
            variant("standard", "Standard", "Language with proficiency label", Standard, true),
            variant("bars", "Bars", "Proficiency bars", Modern, false),
            variant("grid", "Grid", "Two-column grid with level dots", Creative, false),
            variant("inline", "Inline", "Comma-separated line", Minimal, false),
        ],
    ),
    (
        SectionType::Volunteer,
        &[
            variant("standard", "Standard", "Role, organization, dates and highlights", Standard, true),
            variant("compact", "Compact", "Single-line entries", Minimal, false),
            variant("timeline", "Timeline", "Timeline with dots per role", Modern, false),
            variant("cards", "Cards", "Card per organization", Modern, false),
            variant("detailed", "Detailed", "Full description and every highlight", Standard, false),
        ],
    ),
    (
        SectionType::Projects,
        &[
            variant("standard", "Standard", "Name, description and technologies", Standard, true),
            variant("cards", "Cards", "Project cards with technology tags", Modern, true),
            variant("detailed", "Detailed", "Role, link, description and highlights", Standard, false),
        ],
    ),
    (
        SectionType::Certifications,
        &[
            variant("standard", "Standard", "Name, issuer and date", Standard, true),
            variant("compact", "Compact", "Single-line entries", Minimal, false),
        ],
    ),
    (
        SectionType::Awards,
        &[
            variant("standard", "Standard", "Title, issuer and date", Standard, true),
            variant("timeline", "Timeline", "Awards on a timeline", Modern, false),
        ],
    ),
];

/// An entity that can appear in a variant-rendered section.
pub trait SectionItem: Serialize {
    const SECTION: SectionType;

    /// 1-5 level for bar and dot variants.
    fn level(&self) -> Option<u8> {
        None
    }

    /// Grouping key for grouped variants.
    fn group(&self) -> Option<&str> {
        None
    }
}

macro_rules! section_item {
    ($ty:ty, $section:expr) => {
        impl SectionItem for $ty {
            const SECTION: SectionType = $section;
        }
    };
}

section_item!(ExperienceItem, SectionType::Experience);
section_item!(EducationItem, SectionType::Education);
section_item!(VolunteerItem, SectionType::Volunteer);
section_item!(ProjectItem, SectionType::Projects);
section_item!(CertificationItem, SectionType::Certifications);
section_item!(AwardItem, SectionType::Awards);

impl SectionItem for SkillItem {
    const SECTION: SectionType = SectionType::Skills;

    fn level(&self) -> Option<u8> {
        self.level.map(|l| l.clamp(1, 5))
    }

    fn group(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| !c.trim().is_empty())
    }
}

impl SectionItem for LanguageItem {
    const SECTION: SectionType = SectionType::Languages;

    fn level(&self) -> Option<u8> {
        Some(self.proficiency_level())
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionActions {
    pub can_add: bool,
    pub can_remove: bool,
}

impl SectionActions {
    pub fn for_editable(editable: bool) -> Self {
        SectionActions {
            can_add: editable,
            can_remove: editable,
        }
    }
}

/// The per-type contract shared by every variant of a section.
#[derive(Debug, Serialize)]
pub struct SectionProps<'a, I: SectionItem> {
    /// Root of the item list in the document, e.g. `volunteer` or `sections.2.data.items`.
    pub section_key: String,
    pub title: String,
    /// Set when the heading itself is editable.
    pub title_path: Option<String>,
    pub items: &'a [I],
    pub config: &'a TemplateConfig,
    pub style: &'a StyleTokens,
    pub accent_color: &'a str,
    pub editable: bool,
    pub actions: SectionActions,
    pub date_style: DateStyle,
}

pub struct VariantRegistry {
    variants: HashMap<SectionType, &'static [VariantMeta]>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        VariantRegistry {
            variants: VARIANTS.iter().copied().collect(),
        }
    }

    /// Whether the type renders through registered variants.
    pub fn supports(&self, section_type: SectionType) -> bool {
        self.variants.contains_key(&section_type)
    }

    pub fn variants(&self, section_type: SectionType) -> &'static [VariantMeta] {
        self.variants.get(&section_type).copied().unwrap_or(&[])
    }

    pub fn default_variant(&self, section_type: SectionType) -> Option<&'static VariantMeta> {
        self.variants(section_type).first()
    }

    /// Resolves `id` for `section_type`, falling back to the default variant.
    pub fn resolve(&self, section_type: SectionType, id: Option<&str>) -> Option<&'static VariantMeta> {
        let variants = self.variants(section_type);
        id.and_then(|id| variants.iter().find(|v| v.id == id))
            .or_else(|| variants.first())
    }

    pub fn template_name(section_type: SectionType, variant: &VariantMeta) -> String {
        format!("sections/{}/{}.html", section_type.as_str(), variant.id)
    }

    /// Every registered `(type, variant)` pair, in table order.
    pub fn all(&self) -> impl Iterator<Item = (SectionType, &'static VariantMeta)> + '_ {
        VARIANTS
            .iter()
            .flat_map(|(section_type, variants)| variants.iter().map(move |v| (*section_type, v)))
    }
}

impl Default for VariantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
