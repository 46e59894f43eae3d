//! Form state controller
//!
//! Owns the single [`FormState`] for a wizard session. Every mutation goes
//! through [`FormController::update`], which rebuilds the prospective state,
//! revalidates the whole form and only then commits.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use shared_types::{ErrorMap, FieldValue, FormState};
use tracing::debug;

use crate::calendar::{format_form_date, Clock};
use crate::config::FormConfig;
use crate::error::FormError;
use crate::registry::{DefaultValue, FieldDefinition, FieldKind, FieldRegistry, SectionProgress};

/// Snapshot handed back after a committed update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub state: FormState,
    pub is_valid: bool,
    pub errors: ErrorMap,
}

pub struct FormController {
    registry: Arc<FieldRegistry>,
    config: FormConfig,
    clock: Arc<dyn Clock>,
    state: FormState,
    errors: ErrorMap,
    touched: BTreeSet<String>,
}

impl std::fmt::Debug for FormController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("errors", &self.errors)
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}

impl FormController {
    /// Seed one value per registry field and run the first validation.
    ///
    /// `initial` is the JSON object collaborators (OCR, saved drafts) hand
    /// over; anything that is not an object seeds nothing.
    pub fn initialize(
        registry: Arc<FieldRegistry>,
        initial: &Value,
        config: FormConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = seed_state(&registry, initial, clock.as_ref());
        let errors = registry.validate_all(&state, &ErrorMap::new(), clock.today(), config.hidden_fields);
        debug!(
            fields = state.len(),
            invalid = errors.values().filter(|e| !e.is_empty()).count(),
            "Form initialized"
        );
        Self {
            registry,
            config,
            clock,
            state,
            errors,
            touched: BTreeSet::new(),
        }
    }

    /// Replace one field's value and revalidate the whole form.
    pub fn update(
        &mut self,
        field_id: &str,
        value: impl Into<FieldValue>,
    ) -> Result<UpdateOutcome, FormError> {
        let field = self
            .registry
            .get(field_id)
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))?;

        let mut next = self.state.clone();
        next.insert(field.id.clone(), coerce_value(field.kind, value.into()));

        let errors = self.registry.validate_all(
            &next,
            &self.errors,
            self.clock.today(),
            self.config.hidden_fields,
        );

        self.state = next;
        self.errors = errors;
        self.touched.insert(field.id.clone());
        debug!(field = field_id, valid = self.is_valid(), "Field updated");

        Ok(UpdateOutcome {
            state: self.state.clone(),
            is_valid: self.is_valid(),
            errors: self.errors.clone(),
        })
    }

    /// Update from a JSON value, coercing it the same way initialization does
    pub fn update_json(&mut self, field_id: &str, value: &Value) -> Result<UpdateOutcome, FormError> {
        let field = self
            .registry
            .get(field_id)
            .ok_or_else(|| FormError::UnknownField(field_id.to_string()))?;
        let coerced = coerce_json(field.kind, value).unwrap_or_else(|| field.kind.empty_value());
        self.update(field_id, coerced)
    }

    /// Discard all edits and reseed from `initial`
    pub fn reset(&mut self, initial: &Value) {
        self.state = seed_state(&self.registry, initial, self.clock.as_ref());
        self.errors = self.registry.validate_all(
            &self.state,
            &ErrorMap::new(),
            self.clock.today(),
            self.config.hidden_fields,
        );
        self.touched.clear();
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn is_valid(&self) -> bool {
        self.errors.values().all(String::is_empty)
    }

    pub fn is_touched(&self, field_id: &str) -> bool {
        self.touched.contains(field_id)
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    pub fn visibility(&self) -> BTreeMap<String, bool> {
        self.registry.evaluate_visibility(&self.state)
    }

    /// Non-empty errors of fields that are visible and have been touched
    pub fn visible_errors(&self) -> ErrorMap {
        let visibility = self.visibility();
        self.errors
            .iter()
            .filter(|(id, error)| {
                !error.is_empty()
                    && self.touched.contains(*id)
                    && visibility.get(*id).copied().unwrap_or(true)
            })
            .map(|(id, error)| (id.clone(), error.clone()))
            .collect()
    }

    pub fn section_progress(&self) -> Vec<SectionProgress> {
        self.registry.section_progress(&self.state)
    }
}

fn seed_state(registry: &FieldRegistry, initial: &Value, clock: &dyn Clock) -> FormState {
    let supplied = initial.as_object();

    if let Some(map) = supplied {
        for key in map.keys().filter(|k| !registry.contains(k)) {
            debug!(key = %key, "Ignoring initial value for unknown field");
        }
    }

    registry
        .fields()
        .iter()
        .map(|field| {
            let provided = supplied
                .and_then(|map| map.get(&field.id))
                .and_then(|v| coerce_json(field.kind, v));
            let value = provided.unwrap_or_else(|| default_for(field, clock));
            (field.id.clone(), value)
        })
        .collect()
}

fn default_for(field: &FieldDefinition, clock: &dyn Clock) -> FieldValue {
    match &field.default {
        Some(DefaultValue::Today) => FieldValue::Text(format_form_date(clock.today())),
        Some(DefaultValue::Value(value)) => coerce_value(field.kind, value.clone()),
        None => field.kind.empty_value(),
    }
}

/// Coerce a JSON value to `kind`; `None` for null and shapes with no meaning.
pub fn coerce_json(kind: FieldKind, value: &Value) -> Option<FieldValue> {
    let coerced = match value {
        Value::Null => return None,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Number(n) => FieldValue::Text(n.to_string()),
        Value::Array(_) | Value::Object(_) => return None,
    };
    Some(coerce_value(kind, coerced))
}

/// Make a value match the storage type of `kind`
pub fn coerce_value(kind: FieldKind, value: FieldValue) -> FieldValue {
    match (kind, value) {
        (FieldKind::Checkbox, FieldValue::Text(s)) => FieldValue::Bool(FieldValue::Text(s).is_checked()),
        (FieldKind::Checkbox, v @ FieldValue::Bool(_)) => v,
        (_, FieldValue::Bool(b)) => FieldValue::Text(b.to_string()),
        (_, v @ FieldValue::Text(_)) => v,
    }
}
