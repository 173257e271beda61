//! The minijinja environment holding every embedded resume template.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::render::format::{date_range, format_date, DateStyle};
use crate::render::RenderError;

macro_rules! embed {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../../templates/", $name)))),*]
    };
}

const TEMPLATES: &[(&str, &str)] = embed![
    "macros.html",
    "frame.html",
    "header.html",
    "page.html",
    "dynamic/paragraph.html",
    "dynamic/string_list.html",
    "dynamic/object_list.html",
    "dynamic/grouped_list.html",
    "dynamic/two_column.html",
    "dynamic/inline_text.html",
    "sections/experience/standard.html",
    "sections/experience/compact.html",
    "sections/experience/timeline.html",
    "sections/experience/cards.html",
    "sections/experience/minimal.html",
    "sections/education/standard.html",
    "sections/education/compact.html",
    "sections/education/timeline.html",
    "sections/education/cards.html",
    "sections/skills/pills.html",
    "sections/skills/bars.html",
    "sections/skills/columns.html",
    "sections/skills/grouped.html",
    "sections/skills/inline.html",
    "sections/languages/standard.html",
    "sections/languages/bars.html",
    "sections/languages/grid.html",
    "sections/languages/inline.html",
    "sections/volunteer/standard.html",
    "sections/volunteer/compact.html",
    "sections/volunteer/timeline.html",
    "sections/volunteer/cards.html",
    "sections/volunteer/detailed.html",
    "sections/projects/standard.html",
    "sections/projects/cards.html",
    "sections/projects/detailed.html",
    "sections/certifications/standard.html",
    "sections/certifications/compact.html",
    "sections/awards/standard.html",
    "sections/awards/timeline.html",
];

/// Template engine. Names end in `.html`, so output is HTML-escaped. Sparse
/// documents never fail a render: missing attributes chain to undefined.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        env.add_filter("format_date", format_date_filter);
        env.add_function("date_range", date_range_function);

        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
        let template = self.env.get_template(name)?;
        Ok(template.render(ctx)?)
    }
}

fn format_date_filter(value: Option<String>, style: Option<String>) -> String {
    let style = style.as_deref().map(DateStyle::from_name).unwrap_or_default();
    format_date(value.as_deref().unwrap_or_default(), style)
}

fn date_range_function(
    start: Option<String>,
    end: Option<String>,
    current: Option<bool>,
    style: Option<String>,
) -> String {
    let style = style.as_deref().map(DateStyle::from_name).unwrap_or_default();
    date_range(
        start.as_deref().unwrap_or_default(),
        end.as_deref().unwrap_or_default(),
        current.unwrap_or(false),
        style,
    )
}
