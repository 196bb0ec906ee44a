use thiserror::Error;

use super::types::DocumentData;

#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("template `{template}` not found")]
    NotFound { template: String },
    #[error("template `{template}` failed to render: {message}")]
    Render { template: String, message: String },
}

impl TemplateError {
    pub fn not_found(template: impl Into<String>) -> Self {
        Self::NotFound {
            template: template.into(),
        }
    }

    pub fn render(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            template: template.into(),
            message: message.into(),
        }
    }
}

/// Maps a template name plus its data bag to an HTML document.
///
/// Implementations must be pure: no process launches, no I/O beyond reading
/// the template itself. A failure here stops the pipeline before the render
/// engine is started.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, data: &DocumentData) -> Result<String, TemplateError>;
}
