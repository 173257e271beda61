//! Declarative data shapes for dynamic sections.
//!
//! Different variants of one section type expect structurally different payloads
//! (a flat list of names, a list of records, grouped lists, a stats column next to
//! a paragraph). Section creation consults [`SHAPES`] instead of branching per
//! variant; adding a variant means adding one row.
//!
//! Payload keys per shape:
//! - `Paragraph`, `InlineText`: `{ "content": string }`
//! - `StringList`, `ObjectList`: `{ "items": [...] }`
//! - `GroupedList`: `{ "groups": [{ "category", "items": [string] }] }`
//! - `TwoColumn`: `{ "stats": [string], "content": string }`

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::document::SectionType;

use DataShape::*;
use SectionType::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataShape {
    Paragraph,
    StringList,
    ObjectList,
    GroupedList,
    TwoColumn,
    InlineText,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ShapeDescriptor {
    pub section_type: SectionType,
    pub variant: &'static str,
    pub shape: DataShape,
}

const fn entry(section_type: SectionType, variant: &'static str, shape: DataShape) -> ShapeDescriptor {
    ShapeDescriptor {
        section_type,
        variant,
        shape,
    }
}

pub const SHAPES: &[ShapeDescriptor] = &[
    entry(Summary, "standard", Paragraph),
    entry(Summary, "highlighted", Paragraph),
    entry(Summary, "achievements", StringList),
    entry(Summary, "two-column", TwoColumn),
    entry(Skills, "pills", StringList),
    entry(Skills, "columns", StringList),
    entry(Skills, "bars", ObjectList),
    entry(Skills, "grouped", GroupedList),
    entry(Skills, "inline", InlineText),
    entry(Experience, "standard", ObjectList),
    entry(Experience, "compact", ObjectList),
    entry(Experience, "timeline", ObjectList),
    entry(Experience, "cards", ObjectList),
    entry(Experience, "minimal", ObjectList),
    entry(Education, "standard", ObjectList),
    entry(Education, "compact", ObjectList),
    entry(Education, "timeline", ObjectList),
    entry(Education, "cards", ObjectList),
    entry(Projects, "standard", ObjectList),
    entry(Projects, "cards", ObjectList),
    entry(Projects, "detailed", ObjectList),
    entry(Languages, "standard", ObjectList),
    entry(Languages, "bars", ObjectList),
    entry(Languages, "grid", ObjectList),
    entry(Languages, "inline", StringList),
    entry(Volunteer, "standard", ObjectList),
    entry(Volunteer, "compact", ObjectList),
    entry(Volunteer, "timeline", ObjectList),
    entry(Volunteer, "cards", ObjectList),
    entry(Volunteer, "detailed", ObjectList),
    entry(Certifications, "standard", ObjectList),
    entry(Certifications, "compact", ObjectList),
    entry(Awards, "standard", ObjectList),
    entry(Awards, "timeline", ObjectList),
    entry(Custom, "paragraph", Paragraph),
    entry(Custom, "list", StringList),
];

/// Shape used when the variant is absent or not listed for the type.
pub fn default_shape(section_type: SectionType) -> DataShape {
    match section_type {
        Summary | Custom => Paragraph,
        Skills => StringList,
        _ => ObjectList,
    }
}

pub fn shape_for(section_type: SectionType, variant: Option<&str>) -> DataShape {
    variant
        .and_then(|v| {
            SHAPES
                .iter()
                .find(|d| d.section_type == section_type && d.variant == v)
        })
        .map(|d| d.shape)
        .unwrap_or_else(|| default_shape(section_type))
}

/// Variants declared for a section type, in table order.
pub fn variants_of(section_type: SectionType) -> impl Iterator<Item = &'static ShapeDescriptor> {
    SHAPES.iter().filter(move |d| d.section_type == section_type)
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Starter content for a new section of `section_type` laid out as `shape`.
pub fn seed_payload(section_type: SectionType, shape: DataShape) -> Value {
    match (section_type, shape) {
        (Summary, Paragraph) => json!({
            "content": "Results-driven professional with proven expertise in delivering impactful solutions. Combines technical depth with strategic thinking to move products forward."
        }),
        (Summary, StringList) => json!({
            "items": [
                "Increased system performance by 40% through optimization",
                "Led a team of 5 engineers to deliver critical features",
                "Reduced deployment time from 2 hours to 15 minutes"
            ]
        }),
        (Summary, TwoColumn) => json!({
            "stats": ["5+ Years", "20+ Projects", "Cloud Expert"],
            "content": "Full-stack engineer with deep expertise in modern web technologies and cloud infrastructure."
        }),
        (Skills, StringList) => json!({
            "items": ["React", "TypeScript", "Node.js", "Python", "AWS", "Docker"]
        }),
        (Skills, ObjectList) => json!({
            "items": [
                { "id": new_id(), "name": "React & TypeScript", "level": 5 },
                { "id": new_id(), "name": "Node.js", "level": 4 },
                { "id": new_id(), "name": "Python", "level": 4 },
                { "id": new_id(), "name": "AWS", "level": 3 }
            ]
        }),
        (Skills, GroupedList) => json!({
            "groups": [
                { "category": "Frontend", "items": ["React", "TypeScript", "Tailwind CSS"] },
                { "category": "Backend", "items": ["Node.js", "Python", "PostgreSQL"] }
            ]
        }),
        (Skills, InlineText) => json!({
            "content": "JavaScript, React, TypeScript, Node.js, Python, AWS, Docker"
        }),
        (Experience, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "company": "Tech Company Inc.",
                "position": "Senior Software Engineer",
                "startDate": "2020-01",
                "endDate": "",
                "current": true,
                "highlights": [
                    "Led development of a scalable microservices architecture",
                    "Mentored junior developers and ran code reviews"
                ]
            }]
        }),
        (Education, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "school": "University Name",
                "degree": "Bachelor of Science",
                "field": "Computer Science",
                "startDate": "2014-09",
                "endDate": "2018-05"
            }]
        }),
        (Projects, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "name": "Project Name",
                "description": "A short description of what the project does and why it matters.",
                "technologies": ["React", "Node.js"],
                "highlights": []
            }]
        }),
        (Languages, ObjectList) => json!({
            "items": [
                { "id": new_id(), "language": "English", "proficiency": "Native" },
                { "id": new_id(), "language": "Spanish", "proficiency": "Professional" }
            ]
        }),
        (Languages, StringList) => json!({ "items": ["English", "Spanish", "French"] }),
        (Volunteer, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "organization": "Local Food Bank",
                "role": "Volunteer Coordinator",
                "startDate": "2021-03",
                "endDate": "",
                "current": true,
                "highlights": ["Coordinated weekly distribution for 200+ families"]
            }]
        }),
        (Certifications, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "name": "AWS Certified Solutions Architect",
                "issuer": "Amazon Web Services",
                "date": "2023-06"
            }]
        }),
        (Awards, ObjectList) => json!({
            "items": [{
                "id": new_id(),
                "title": "Employee of the Year",
                "issuer": "Tech Company Inc.",
                "date": "2022-12"
            }]
        }),
        (Custom, Paragraph) => json!({ "content": "Add your content here." }),
        (Custom, StringList) => json!({ "items": ["First point", "Second point"] }),
        (_, shape) => empty_payload(shape),
    }
}

pub fn empty_payload(shape: DataShape) -> Value {
    match shape {
        Paragraph | InlineText => json!({ "content": "" }),
        StringList | ObjectList => json!({ "items": [] }),
        GroupedList => json!({ "groups": [] }),
        TwoColumn => json!({ "stats": [], "content": "" }),
    }
}
