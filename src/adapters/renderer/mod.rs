//! Document renderer adapters.

pub mod template_renderer;

pub use template_renderer::TemplateDocumentRenderer;
