//! Command implementations behind the `titleform` binary
//!
//! Each command takes already-read inputs and returns a serializable
//! report so the binary only deals with files and exit codes.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use shared_types::{ErrorMap, FormState, SignatureEntry};
use titleform_core::{
    title_registry, FieldRegistry, FormConfig, FormController, HiddenFieldPolicy, SectionProgress, SystemClock,
};
use titlepdf_core::{
    resolve, AnnotationField, AssembledDocument, AssemblerConfig, Discovery, DocumentAssembler,
    LopdfPageSource, OverlaySession, PdfTemplate, PlacementRegistry, TargetField, TemplateField, DEFAULT_MAX_TEXT_LEN,
};
use tracing::{debug, info};

/// Settings read from the environment; CLI flags override them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub hidden_fields: HiddenFieldPolicy,
    pub debug_outline: bool,
    pub max_text_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            hidden_fields: HiddenFieldPolicy::default(),
            debug_outline: false,
            max_text_len: DEFAULT_MAX_TEXT_LEN,
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("{} must be a boolean, got {}", name, other)),
    }
}

impl AppConfig {
    /// Read `TITLEFORM_HIDDEN_FIELDS`, `TITLEFORM_DEBUG_OUTLINE` and
    /// `TITLEFORM_MAX_TEXT_LEN`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("TITLEFORM_HIDDEN_FIELDS") {
            config.hidden_fields = raw.parse::<HiddenFieldPolicy>().map_err(|e: String| anyhow!(e))?;
        }
        if let Some(raw) = lookup("TITLEFORM_DEBUG_OUTLINE") {
            config.debug_outline = parse_flag("TITLEFORM_DEBUG_OUTLINE", &raw)?;
        }
        if let Some(raw) = lookup("TITLEFORM_MAX_TEXT_LEN") {
            config.max_text_len = raw
                .trim()
                .parse()
                .with_context(|| format!("TITLEFORM_MAX_TEXT_LEN must be a positive integer, got {}", raw))?;
            if config.max_text_len == 0 {
                bail!("TITLEFORM_MAX_TEXT_LEN must be greater than zero");
            }
        }
        Ok(config)
    }

    pub fn form_config(&self) -> FormConfig {
        FormConfig::default().with_hidden_fields(self.hidden_fields)
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig::default()
            .with_debug_outline(self.debug_outline)
            .with_max_text_len(self.max_text_len)
    }
}

fn registry() -> Result<Arc<FieldRegistry>> {
    Ok(Arc::new(title_registry().context("Title registry is inconsistent")?))
}

fn controller(values: &Value, config: &AppConfig) -> Result<FormController> {
    if !values.is_object() {
        bail!("Values must be a JSON object keyed by field id");
    }
    Ok(FormController::initialize(
        registry()?,
        values,
        config.form_config(),
        Arc::new(SystemClock),
    ))
}

fn failing(errors: &ErrorMap) -> ErrorMap {
    errors
        .iter()
        .filter(|(_, message)| !message.is_empty())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// The title registry as JSON
pub fn registry_json() -> Result<String> {
    Ok(registry()?.to_json()?)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    /// Only fields currently failing
    pub errors: ErrorMap,
    pub sections: Vec<SectionProgress>,
}

pub fn validate(values: &Value, config: &AppConfig) -> Result<ValidationReport> {
    let ctl = controller(values, config)?;
    Ok(ValidationReport {
        is_valid: ctl.is_valid(),
        errors: failing(ctl.errors()),
        sections: ctl.section_progress(),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyResolution {
    pub key: String,
    /// Matched template field, if any
    pub field: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldsReport {
    pub page_count: usize,
    pub fields: Vec<TemplateField>,
    pub keys: Vec<KeyResolution>,
}

/// Template fields and how every non-signature registry key resolves
pub fn describe_fields(template_bytes: &[u8]) -> Result<FieldsReport> {
    let template = PdfTemplate::load(template_bytes).context("Failed to read template")?;
    let registry = registry()?;
    let signature_keys = registry.signature_keys();

    let keys = registry
        .fields()
        .iter()
        .filter(|f| !signature_keys.contains(&f.id.as_str()))
        .map(|f| {
            let target = resolve(&template, &f.id);
            KeyResolution {
                key: f.id.clone(),
                field: target.as_ref().map(|t| t.name().to_string()),
                kind: target.as_ref().map(|t| match t {
                    TargetField::Checkbox(_) => "checkbox".to_string(),
                    TargetField::Text(_) => "text".to_string(),
                    TargetField::Unsupported { kind, .. } => kind.label().to_string(),
                }),
            }
        })
        .collect();

    Ok(FieldsReport {
        page_count: template.page_count(),
        fields: template.fields().to_vec(),
        keys,
    })
}

/// Signature images held in the form state under registry signature keys,
/// with entries from `extra` taking precedence.
pub fn collect_signatures(
    registry: &FieldRegistry,
    state: &FormState,
    extra: Vec<SignatureEntry>,
) -> Vec<SignatureEntry> {
    let mut by_key: BTreeMap<String, SignatureEntry> = registry
        .signature_keys()
        .into_iter()
        .filter_map(|key| {
            let url = state.get(key)?.as_str()?.trim();
            (!url.is_empty()).then(|| SignatureEntry::new(key, url))
        })
        .map(|entry| (entry.key.clone(), entry))
        .collect();
    for entry in extra {
        by_key.insert(entry.key.clone(), entry);
    }
    by_key.into_values().collect()
}

/// Parse a signature list: `[{"key": ..., "dataUrl": ...}]`
pub fn parse_signatures(json: &str) -> Result<Vec<SignatureEntry>> {
    serde_json::from_str(json).context("Signatures must be a JSON array of {key, dataUrl}")
}

/// Validate, then fill, sign and flatten the template.
///
/// An invalid form is refused unless `allow_invalid` is set.
pub fn assemble_document(
    template_bytes: &[u8],
    values: &Value,
    signatures: Vec<SignatureEntry>,
    placements: PlacementRegistry,
    config: &AppConfig,
    allow_invalid: bool,
) -> Result<AssembledDocument> {
    let ctl = controller(values, config)?;
    if !ctl.is_valid() && !allow_invalid {
        let errors = failing(ctl.errors());
        let summary: Vec<String> = errors.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
        bail!("Form has {} invalid fields:\n  {}", errors.len(), summary.join("\n  "));
    }

    let signatures = collect_signatures(ctl.registry(), ctl.state(), signatures);
    debug!(signatures = signatures.len(), "Collected signatures");

    // signature images travel in `signatures`, never as field text
    let signature_keys = ctl.registry().signature_keys();
    let fields: FormState = ctl
        .state()
        .iter()
        .filter(|(key, _)| !signature_keys.contains(&key.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let assembler = DocumentAssembler::new(placements, config.assembler_config());
    let assembled = assembler
        .assemble(template_bytes, &fields, &signatures)
        .context("Failed to assemble document")?;
    info!(
        bytes = assembled.bytes.len(),
        diagnostics = assembled.diagnostics.len(),
        "Document ready"
    );
    Ok(assembled)
}

#[derive(Debug, Clone, Serialize)]
pub struct OverlayReport {
    pub page_index: usize,
    pub fields: Vec<AnnotationField>,
    pub values: FormState,
}

/// Discover one page's widgets in device space and seed their values
pub async fn overlay(template_bytes: &[u8], page_index: usize, scale: f64, rotation: Option<i64>) -> Result<OverlayReport> {
    let source = LopdfPageSource::from_bytes(template_bytes).context("Failed to read template")?;
    let mut session = OverlaySession::new();
    let token = session.begin_render();

    match session.discover(&source, page_index, scale, rotation, token).await? {
        Discovery::Published(fields) => Ok(OverlayReport {
            page_index,
            fields,
            values: session.values().clone(),
        }),
        Discovery::Cancelled => bail!("Render of page {} was cancelled", page_index),
    }
}
