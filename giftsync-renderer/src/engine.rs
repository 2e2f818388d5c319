//! Tera rendering engine: [`TemplateEngine`] and [`Renderer`].
//!
//! # Artifacts
//!
//! | Artifact          | Template                 | Source                    |
//! |-------------------|--------------------------|---------------------------|
//! | Gift page         | `gift_page.html`         | [`GiftPageContext`]       |
//! | Collection index  | `collection_index.html`  | [`IndexContext`]          |
//! | Gift JSON         | (none)                   | record minus `artifact_path` |
//!
//! Template names end in `.html`, so Tera autoescapes every interpolation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::Tera;

use giftsync_core::GiftRecord;

use crate::context::{GiftPageContext, IndexContext};
use crate::error::RenderError;

pub const GIFT_PAGE_TEMPLATE: &str = "gift_page.html";
pub const INDEX_TEMPLATE: &str = "collection_index.html";

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    (GIFT_PAGE_TEMPLATE, include_str!("templates/gift_page.html")),
    (INDEX_TEMPLATE, include_str!("templates/collection_index.html")),
];

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy()
        .replace('\\', "/")
        .to_lowercase()
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    let mut templates = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("html") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera engine with embedded templates and optional user overrides.
///
/// `user_template_dir` may contain `.html` files whose names match an
/// embedded template; those replace the default.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        let tera = build_tera(user_template_dir)?;
        Ok(TemplateEngine { tera })
    }

    /// Render `template` with any serializable context.
    pub fn render<C: serde::Serialize>(&self, template: &str, ctx: &C) -> Result<String, RenderError> {
        let tera_ctx = tera::Context::from_serialize(ctx)?;
        let rendered = self.tera.render(template, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renderer for every published artifact. Create once and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Construct a [`Renderer`], letting templates in `dir` replace defaults.
    pub fn with_overrides(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(dir)? })
    }

    pub fn render_gift_page(&self, record: &GiftRecord) -> Result<String, RenderError> {
        let ctx = GiftPageContext::from_record(record);
        self.engine.render(GIFT_PAGE_TEMPLATE, &ctx)
    }

    pub fn render_index(&self, ctx: &IndexContext) -> Result<String, RenderError> {
        self.engine.render(INDEX_TEMPLATE, ctx)
    }

    /// Pretty JSON of `record` without its `artifact_path`.
    pub fn render_gift_json(&self, record: &GiftRecord) -> Result<String, RenderError> {
        let mut value = serde_json::to_value(record)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("artifact_path");
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
