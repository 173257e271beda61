//! Full-page rendering: header, template layout slots, then dynamic sections.
//!
//! The same `ResumeData` feeds the interactive preview (`editable = true`) and the
//! PDF export (`editable = false`).

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::models::document::{
    lenient_list, AwardItem, CertificationItem, EducationItem, ExperienceItem, LanguageItem,
    PersonalInfo, ProjectItem, ResumeData, ResumeSection, SectionType, SkillItem, VolunteerItem,
};
use crate::render::catalog::{TemplateConfig, TemplateDefinition};
use crate::render::style::{StyleOptions, StyleTokens};
use crate::render::templates::TemplateEngine;
use crate::render::variants::{SectionActions, SectionItem, SectionProps, VariantRegistry};
use crate::render::RenderError;
use crate::sections::shapes::{shape_for, DataShape};

/// Items sharing a grouping key, as positions into the item list.
#[derive(Debug, Serialize)]
struct ItemGroup {
    category: String,
    indices: Vec<usize>,
}

#[derive(Serialize)]
struct VariantContext<'a, I: SectionItem> {
    #[serde(flatten)]
    props: &'a SectionProps<'a, I>,
    levels: Vec<Option<u8>>,
    groups: Vec<ItemGroup>,
}

#[derive(Serialize)]
struct FrameContext<'a> {
    section_type: SectionType,
    variant: &'a str,
    section_key: &'a str,
    title: &'a str,
    title_path: Option<&'a str>,
    add_path: Option<String>,
    accent_color: &'a str,
    config: &'a TemplateConfig,
    style: &'a StyleTokens,
    editable: bool,
    can_add: bool,
    body: String,
}

#[derive(Serialize)]
struct HeaderContext<'a> {
    info: &'a PersonalInfo,
    accent_color: &'a str,
    config: &'a TemplateConfig,
    style: &'a StyleTokens,
    editable: bool,
}

#[derive(Serialize)]
struct DynamicContext<'a> {
    section_key: String,
    data: &'a Value,
    accent_color: &'a str,
    config: &'a TemplateConfig,
    style: &'a StyleTokens,
    editable: bool,
    actions: SectionActions,
}

#[derive(Serialize)]
struct PageContext<'a> {
    title: &'a str,
    template_id: &'a str,
    accent_color: &'a str,
    config: &'a TemplateConfig,
    style: &'a StyleTokens,
    editable: bool,
    body: String,
}

/// Settings shared by every section of one render pass.
#[derive(Clone, Copy)]
struct Pass<'a> {
    config: &'a TemplateConfig,
    style: &'a StyleTokens,
    accent_color: &'a str,
    editable: bool,
}

impl<'a> Pass<'a> {
    fn props<'i, I: SectionItem>(
        &self,
        items: &'i [I],
        section_key: String,
        title: String,
        title_path: Option<String>,
    ) -> SectionProps<'i, I>
    where
        'a: 'i,
    {
        SectionProps {
            section_key,
            title,
            title_path,
            items,
            config: self.config,
            style: self.style,
            accent_color: self.accent_color,
            editable: self.editable,
            actions: SectionActions::for_editable(self.editable),
            date_style: self.config.date_style,
        }
    }
}

pub struct ResumeRenderer {
    engine: TemplateEngine,
    variants: VariantRegistry,
}

impl ResumeRenderer {
    pub fn new() -> Result<Self, RenderError> {
        Ok(ResumeRenderer {
            engine: TemplateEngine::new()?,
            variants: VariantRegistry::new(),
        })
    }

    pub fn variants(&self) -> &VariantRegistry {
        &self.variants
    }

    /// Renders a complete HTML document for `data` laid out by `template`, with
    /// `style` layered over the template's tokens.
    pub fn render(
        &self,
        template: &TemplateDefinition,
        data: &ResumeData,
        theme_color: Option<&str>,
        editable: bool,
        style: &StyleOptions,
    ) -> Result<String, RenderError> {
        let accent_color = theme_color
            .or(data.theme_color.as_deref())
            .unwrap_or(&template.default_theme_color);
        let config = style.apply(&template.config);
        let tokens = style.tokens(accent_color);
        let pass = Pass {
            config: &config,
            style: &tokens,
            accent_color,
            editable,
        };

        let mut body = self.engine.render(
            "header.html",
            HeaderContext {
                info: &data.personal_info,
                accent_color,
                config: pass.config,
                style: pass.style,
                editable,
            },
        )?;

        for slot in template.layout.iter().filter(|slot| style.shows(slot.section)) {
            body.push_str(&self.render_slot(slot.section, &slot.variant, data, pass)?);
        }

        let mut dynamic: Vec<(usize, &ResumeSection)> = data
            .sections
            .iter()
            .enumerate()
            .filter(|(_, section)| {
                section.enabled && style.show_sections && style.shows(section.section_type)
            })
            .collect();
        dynamic.sort_by_key(|(_, section)| section.order);
        for (index, section) in dynamic {
            body.push_str(&self.render_dynamic(index, section, pass)?);
        }

        let title = if data.personal_info.full_name.trim().is_empty() {
            "Resume"
        } else {
            data.personal_info.full_name.as_str()
        };

        self.engine.render(
            "page.html",
            PageContext {
                title,
                template_id: &template.id,
                accent_color,
                config: pass.config,
                style: pass.style,
                editable,
                body,
            },
        )
    }

    /// Renders one section through its variant, wrapped in the shared frame.
    ///
    /// An empty list renders nothing unless the section is editable, in which case
    /// the heading and add affordance still appear.
    pub fn render_section<I: SectionItem>(
        &self,
        variant: Option<&str>,
        props: &SectionProps<'_, I>,
    ) -> Result<String, RenderError> {
        if props.items.is_empty() && !props.editable {
            return Ok(String::new());
        }
        let Some(meta) = self.variants.resolve(I::SECTION, variant) else {
            return Ok(String::new());
        };
        if variant.is_some_and(|v| v != meta.id) {
            debug!("Unknown {} variant {variant:?}, using '{}'", I::SECTION, meta.id);
        }

        let body = self.engine.render(
            &VariantRegistry::template_name(I::SECTION, meta),
            VariantContext {
                props,
                levels: props.items.iter().map(|item| item.level()).collect(),
                groups: group_items(props.items),
            },
        )?;

        self.frame(FrameContext {
            section_type: I::SECTION,
            variant: meta.id,
            section_key: &props.section_key,
            title: &props.title,
            title_path: props.title_path.as_deref(),
            add_path: None,
            accent_color: props.accent_color,
            config: props.config,
            style: props.style,
            editable: props.editable,
            can_add: props.actions.can_add,
            body,
        })
    }

    fn frame(&self, ctx: FrameContext<'_>) -> Result<String, RenderError> {
        self.engine.render("frame.html", ctx)
    }

    fn render_slot(
        &self,
        section: SectionType,
        variant: &str,
        data: &ResumeData,
        pass: Pass<'_>,
    ) -> Result<String, RenderError> {
        fn slot<I: SectionItem>(
            renderer: &ResumeRenderer,
            items: &[I],
            variant: &str,
            pass: Pass<'_>,
        ) -> Result<String, RenderError> {
            let props = pass.props(
                items,
                I::SECTION.as_str().to_string(),
                I::SECTION.default_title().to_string(),
                None,
            );
            renderer.render_section(Some(variant), &props)
        }

        match section {
            SectionType::Experience => slot(self, &data.experience, variant, pass),
            SectionType::Education => slot(self, &data.education, variant, pass),
            SectionType::Skills => slot(self, &data.skills, variant, pass),
            SectionType::Languages => slot(self, &data.languages, variant, pass),
            SectionType::Volunteer => slot(self, &data.volunteer, variant, pass),
            SectionType::Projects => slot(self, &data.projects, variant, pass),
            SectionType::Certifications => slot(self, &data.certifications, variant, pass),
            SectionType::Awards => slot(self, &data.awards, variant, pass),
            // the summary is part of the header; custom content only exists as dynamic sections
            SectionType::Summary | SectionType::Custom => Ok(String::new()),
        }
    }

    fn render_dynamic(
        &self,
        index: usize,
        section: &ResumeSection,
        pass: Pass<'_>,
    ) -> Result<String, RenderError> {
        let shape = shape_for(section.section_type, section.variant_id.as_deref());

        if shape == DataShape::ObjectList && self.variants.supports(section.section_type) {
            return match section.section_type {
                SectionType::Experience => self.dynamic_items::<ExperienceItem>(index, section, pass),
                SectionType::Education => self.dynamic_items::<EducationItem>(index, section, pass),
                SectionType::Skills => self.dynamic_items::<SkillItem>(index, section, pass),
                SectionType::Languages => self.dynamic_items::<LanguageItem>(index, section, pass),
                SectionType::Volunteer => self.dynamic_items::<VolunteerItem>(index, section, pass),
                SectionType::Projects => self.dynamic_items::<ProjectItem>(index, section, pass),
                SectionType::Certifications => {
                    self.dynamic_items::<CertificationItem>(index, section, pass)
                }
                SectionType::Awards => self.dynamic_items::<AwardItem>(index, section, pass),
                SectionType::Summary | SectionType::Custom => Ok(String::new()),
            };
        }

        if is_empty_payload(shape, &section.data) && !pass.editable {
            return Ok(String::new());
        }

        let section_key = format!("sections.{index}.data");
        let can_add = pass.editable
            && matches!(
                shape,
                DataShape::StringList | DataShape::ObjectList | DataShape::GroupedList
            );
        let add_path = match shape {
            DataShape::GroupedList => Some(format!("{section_key}.groups")),
            DataShape::StringList | DataShape::ObjectList => Some(format!("{section_key}.items")),
            _ => None,
        };

        let body = self.engine.render(
            shape_template(shape),
            DynamicContext {
                section_key: section_key.clone(),
                data: &section.data,
                accent_color: pass.accent_color,
                config: pass.config,
                style: pass.style,
                editable: pass.editable,
                actions: SectionActions::for_editable(pass.editable),
            },
        )?;

        let title_path = format!("sections.{index}.title");
        self.frame(FrameContext {
            section_type: section.section_type,
            variant: section.variant_id.as_deref().unwrap_or("default"),
            section_key: &section_key,
            title: &section.title,
            title_path: Some(&title_path),
            add_path,
            accent_color: pass.accent_color,
            config: pass.config,
            style: pass.style,
            editable: pass.editable,
            can_add,
            body,
        })
    }

    fn dynamic_items<I>(&self, index: usize, section: &ResumeSection, pass: Pass<'_>) -> Result<String, RenderError>
    where
        I: SectionItem + DeserializeOwned + Default,
    {
        let items: Vec<I> = lenient_list(&section.data, "items");
        let props = pass.props(
            &items,
            format!("sections.{index}.data.items"),
            section.title.clone(),
            Some(format!("sections.{index}.title")),
        );
        self.render_section(section.variant_id.as_deref(), &props)
    }
}

fn shape_template(shape: DataShape) -> &'static str {
    match shape {
        DataShape::Paragraph => "dynamic/paragraph.html",
        DataShape::StringList => "dynamic/string_list.html",
        DataShape::ObjectList => "dynamic/object_list.html",
        DataShape::GroupedList => "dynamic/grouped_list.html",
        DataShape::TwoColumn => "dynamic/two_column.html",
        DataShape::InlineText => "dynamic/inline_text.html",
    }
}

fn is_empty_payload(shape: DataShape, data: &Value) -> bool {
    let blank = |key: &str| data.get(key).and_then(Value::as_str).map_or(true, |s| s.trim().is_empty());
    let none = |key: &str| data.get(key).and_then(Value::as_array).map_or(true, Vec::is_empty);
    match shape {
        DataShape::Paragraph | DataShape::InlineText => blank("content"),
        DataShape::StringList | DataShape::ObjectList => none("items"),
        DataShape::GroupedList => none("groups"),
        DataShape::TwoColumn => blank("content") && none("stats"),
    }
}

/// Groups items by their grouping key in first-seen order; ungrouped items go last.
fn group_items<I: SectionItem>(items: &[I]) -> Vec<ItemGroup> {
    let mut groups: Vec<ItemGroup> = Vec::new();
    let mut ungrouped = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match item.group() {
            Some(category) => match groups.iter_mut().find(|g| g.category == category) {
                Some(group) => group.indices.push(index),
                None => groups.push(ItemGroup {
                    category: category.to_string(),
                    indices: vec![index],
                }),
            },
            None => ungrouped.push(index),
        }
    }
    if !ungrouped.is_empty() {
        groups.push(ItemGroup {
            category: "Other".to_string(),
            indices: ungrouped,
        });
    }
    groups
}
