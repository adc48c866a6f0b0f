//! Prompt templates for the narrative insight backends
//!
//! Each prompt ships embedded in the binary. An analyst may drop a file named
//! `<id>.md` into the override directory (~/.local/share/vigil/prompts/overrides/
//! on Linux) to reword it without a rebuild. Overrides must keep every
//! placeholder the backends fill in; an override that drops one is ignored
//! with a warning and the embedded prompt is used instead.
//!
//! File format:
//!
//! ```text
//! ---
//! id: trend_insights
//! version: 1
//! ---
//! # System
//! ...
//! # User
//! Metric: {{metric}}
//! {{#if context}}Context: {{context}}{{/if}}
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

const TREND_INSIGHTS: &str = include_str!("../../../prompts/trend_insights.md");

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Short narrative insights for one analysed metric
    TrendInsights,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendInsights => "trend_insights",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::TrendInsights]
    }

    fn embedded(&self) -> &'static str {
        match self {
            Self::TrendInsights => TREND_INSIGHTS,
        }
    }

    /// Placeholders an override must keep
    ///
    /// `context` and `max_insights` are optional: the first sits inside an
    /// `{{#if}}` block, the second only bounds the answer length.
    pub fn required_placeholders(&self) -> &'static [&'static str] {
        match self {
            Self::TrendInsights => &["metric", "trend_kind", "slope", "r_squared", "anomaly_count"],
        }
    }
}

impl std::str::FromStr for PromptId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| Error::NotFound(format!("Prompt {}", s)))
    }
}

/// Where a loaded prompt came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptSource {
    Embedded,
    Override(PathBuf),
}

impl PromptSource {
    pub fn is_override(&self) -> bool {
        matches!(self, Self::Override(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Override(path) => Some(path),
            Self::Embedded => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Frontmatter {
    id: String,
    version: u32,
}

/// A parsed prompt template
#[derive(Debug, Clone)]
pub struct Prompt {
    pub id: PromptId,
    pub version: u32,
    pub source: PromptSource,
    /// Everything after the frontmatter
    pub body: String,
}

impl Prompt {
    fn parse(id: PromptId, text: &str, source: PromptSource) -> Result<Self> {
        let invalid = |msg: String| Error::InvalidData(format!("Prompt {}: {}", id.as_str(), msg));

        let rest = text
            .trim_start()
            .strip_prefix("---")
            .ok_or_else(|| invalid("missing YAML frontmatter (---)".into()))?;
        let (frontmatter, body) = rest
            .split_once("\n---")
            .ok_or_else(|| invalid("frontmatter not closed (missing second ---)".into()))?;

        let meta: Frontmatter = serde_yaml::from_str(frontmatter)
            .map_err(|e| invalid(format!("invalid frontmatter: {}", e)))?;
        if meta.id != id.as_str() {
            return Err(invalid(format!("frontmatter id is '{}'", meta.id)));
        }

        Ok(Self {
            id,
            version: meta.version,
            source,
            body: body.trim().to_string(),
        })
    }

    /// The `# System` section, if any
    pub fn system_section(&self) -> Option<&str> {
        section(&self.body, "System")
    }

    /// The `# User` section, if any
    pub fn user_section(&self) -> Option<&str> {
        section(&self.body, "User")
    }

    /// Render the user section (or the whole body when there is none)
    pub fn render_user(&self, vars: &HashMap<&str, String>) -> String {
        render_template(self.user_section().unwrap_or(&self.body), vars)
    }

    /// Required placeholders this template does not use
    pub fn missing_placeholders(&self) -> Vec<&'static str> {
        let used = placeholders(&self.body);
        self.id
            .required_placeholders()
            .iter()
            .copied()
            .filter(|p| !used.contains(p))
            .collect()
    }
}

/// Loads prompts, preferring valid overrides, and caches them
#[derive(Debug)]
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Library reading overrides from the default data dir
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// No overrides at all
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("Prompt {}", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(path) = self.existing_override(id) {
            match self.load_override(id, &path) {
                Ok(prompt) => return Ok(prompt),
                Err(e) => warn!(
                    path = %path.display(),
                    error = %e,
                    "Ignoring prompt override, using embedded prompt"
                ),
            }
        }
        Prompt::parse(id, id.embedded(), PromptSource::Embedded)
    }

    fn load_override(&self, id: PromptId, path: &Path) -> Result<Prompt> {
        let text = fs::read_to_string(path)?;
        let prompt = Prompt::parse(id, &text, PromptSource::Override(path.to_path_buf()))?;

        let missing = prompt.missing_placeholders();
        if !missing.is_empty() {
            return Err(Error::InvalidData(format!(
                "Prompt {} override is missing placeholders: {}",
                id.as_str(),
                missing.join(", ")
            )));
        }
        Ok(prompt)
    }

    /// Every known prompt with the version actually in use
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.existing_override(id);
                let (version, override_active) = match self.get(id) {
                    Ok(prompt) => (prompt.version, prompt.source.is_override()),
                    Err(_) => (0, false),
                };
                PromptInfo {
                    id: id.as_str().to_string(),
                    version,
                    override_path,
                    override_active,
                }
            })
            .collect()
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.existing_override(id).is_some()
    }

    fn existing_override(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
            .filter(|p| p.exists())
    }

    pub fn override_dir(&self) -> Option<&Path> {
        self.override_dir.as_deref()
    }

    /// Forget loaded prompts so edited overrides are re-read
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Listing entry for a prompt
#[derive(Debug, Clone, Serialize)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    /// Override file present in the override dir
    pub override_path: Option<PathBuf>,
    /// False when the override file was rejected
    pub override_active: bool,
}

pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("vigil").join("prompts").join("overrides"))
}

/// Text under the `# <name>` heading, up to the next top-level heading
fn section<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let heading = format!("# {}", name);
    let mut offset = 0;
    let mut start = None;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed.starts_with("# ") {
            if let Some(s) = start {
                return Some(body[s..offset].trim());
            }
            if trimmed == heading {
                start = Some(offset + line.len());
            }
        }
        offset += line.len();
    }

    start.map(|s| body[s..].trim())
}

/// Names of the `{{var}}` placeholders a template uses, `{{#if var}}` included
fn placeholders(template: &str) -> BTreeSet<&str> {
    let mut names = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            break;
        };
        let tag = after[..close].trim();
        if let Some(var) = tag.strip_prefix("#if ") {
            names.insert(var.trim());
        } else if !tag.starts_with('/') {
            names.insert(tag);
        }
        rest = &after[close + 2..];
    }
    names
}

/// Single-pass render of `{{var}}` and `{{#if var}}...{{/if}}`
///
/// An `{{#if}}` block is kept when its variable is set and not blank. Values
/// are inserted verbatim and never re-scanned. Unknown placeholders are left
/// in place.
fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            out.push_str(&rest[open..]);
            return out;
        };
        let tag = after[..close].trim();
        rest = &after[close + 2..];

        if let Some(var) = tag.strip_prefix("#if ") {
            let (block, tail) = rest.split_once("{{/if}}").unwrap_or((rest, ""));
            if vars.get(var.trim()).is_some_and(|v| !v.trim().is_empty()) {
                out.push_str(&render_template(block, vars));
            }
            rest = tail;
        } else {
            match vars.get(tag) {
                Some(value) => out.push_str(value),
                None => {
                    out.push_str("{{");
                    out.push_str(tag);
                    out.push_str("}}");
                }
            }
        }
    }

    out.push_str(rest);
    out
}
