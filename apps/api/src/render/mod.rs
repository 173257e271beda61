pub mod catalog;
pub mod format;
pub mod page;
pub mod style;
pub mod templates;
pub mod variants;

use thiserror::Error;

pub use catalog::{default_document, TemplateCatalog, TemplateDefinition};
pub use page::ResumeRenderer;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}
