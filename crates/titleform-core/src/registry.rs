//! Field and section declarations plus whole-form evaluation

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared_types::{ErrorMap, FieldValue, FormState};

use crate::config::HiddenFieldPolicy;
use crate::error::RegistryError;
use crate::rules::eval::evaluate_condition;
use crate::rules::{Condition, EvalContext, Rule, RuleSet, REQUIRED_MESSAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Checkbox,
    Signature,
    Dropdown,
}

impl FieldKind {
    /// Value a field of this kind starts with
    pub fn empty_value(self) -> FieldValue {
        match self {
            FieldKind::Checkbox => FieldValue::Bool(false),
            FieldKind::Text | FieldKind::Signature | FieldKind::Dropdown => {
                FieldValue::Text(String::new())
            }
        }
    }
}

/// Default applied at initialization when no value was supplied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    /// The clock's date, formatted MM-DD-YYYY
    Today,
    Value(FieldValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Choices offered by dropdowns
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FieldDefinition {
    fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            rule: None,
            visible: None,
            default: None,
            options: Vec::new(),
        }
    }

    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Text)
    }

    pub fn checkbox(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Checkbox)
    }

    pub fn signature(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Signature)
    }

    pub fn dropdown(id: &str, label: &str, options: &[&str]) -> Self {
        let mut field = Self::new(id, label, FieldKind::Dropdown);
        field.options = options.iter().map(|s| s.to_string()).collect();
        field
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn visible_when(mut self, condition: Condition) -> Self {
        self.visible = Some(condition);
        self
    }

    pub fn default_value(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A contiguous run of fields shown together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    /// Index of the first field
    pub start: usize,
    /// One past the last field
    pub end: usize,
    #[serde(default)]
    pub overall_required: bool,
    #[serde(default)]
    pub collapsible: bool,
}

/// Section metadata before field ranges are known
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub title: String,
    pub overall_required: bool,
    pub collapsible: bool,
}

impl SectionSpec {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            overall_required: false,
            collapsible: false,
        }
    }

    pub fn overall_required(mut self) -> Self {
        self.overall_required = true;
        self
    }

    pub fn collapsible(mut self) -> Self {
        self.collapsible = true;
        self
    }
}

/// Filled/visible counts for one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionProgress {
    pub title: String,
    pub visible: usize,
    pub filled: usize,
    pub overall_required: bool,
}

#[derive(Serialize, Deserialize)]
struct RegistryDocument {
    fields: Vec<FieldDefinition>,
    sections: Vec<Section>,
}

/// Read-only declaration of every field on the form
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    sections: Vec<Section>,
    index: HashMap<String, usize>,
    rules: RuleSet,
}

impl FieldRegistry {
    /// Build a registry, checking ids, section layout, references and patterns
    pub fn new(fields: Vec<FieldDefinition>, sections: Vec<Section>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateField(field.id.clone()));
            }
        }

        check_section_layout(&sections, fields.len())?;

        let mut rules = RuleSet::new();
        let mut anchors: HashMap<Vec<String>, String> = HashMap::new();
        for field in &fields {
            let mut references: Vec<&str> = Vec::new();
            if let Some(rule) = &field.rule {
                references.extend(rule.references());
                for (pattern, case_insensitive) in rule.patterns() {
                    rules.compile(pattern, case_insensitive).map_err(|e| {
                        RegistryError::InvalidPattern {
                            field: field.id.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                }
                for group in rule.anchored_groups() {
                    let mut key = group.to_vec();
                    key.sort();
                    if let Some(first) = anchors.insert(key.clone(), field.id.clone()) {
                        return Err(RegistryError::DuplicateAnchor {
                            group: key,
                            first,
                            second: field.id.clone(),
                        });
                    }
                }
            }
            if let Some(visible) = &field.visible {
                references.extend(visible.references());
            }
            if let Some(missing) = references.into_iter().find(|r| !index.contains_key(*r)) {
                return Err(RegistryError::UnknownReference {
                    field: field.id.clone(),
                    reference: missing.to_string(),
                });
            }
        }

        Ok(Self {
            fields,
            sections,
            index,
            rules,
        })
    }

    /// Build from ordered section groups; ranges are derived from group sizes.
    pub fn from_groups(
        groups: Vec<(SectionSpec, Vec<FieldDefinition>)>,
    ) -> Result<Self, RegistryError> {
        let mut fields = Vec::new();
        let mut sections = Vec::with_capacity(groups.len());
        for (spec, group) in groups {
            let start = fields.len();
            fields.extend(group);
            sections.push(Section {
                title: spec.title,
                start,
                end: fields.len(),
                overall_required: spec.overall_required,
                collapsible: spec.collapsible,
            });
        }
        Self::new(fields, sections)
    }

    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let doc: RegistryDocument = serde_json::from_str(json)?;
        Self::new(doc.fields, doc.sections)
    }

    pub fn to_json(&self) -> Result<String, RegistryError> {
        let doc = RegistryDocument {
            fields: self.fields.clone(),
            sections: self.sections.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn get(&self, id: &str) -> Option<&FieldDefinition> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Ids of signature-kind fields, in registry order
    pub fn signature_keys(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::Signature)
            .map(|f| f.id.as_str())
            .collect()
    }

    /// Visibility of every field; fields without a predicate are visible.
    pub fn evaluate_visibility(&self, state: &FormState) -> BTreeMap<String, bool> {
        self.fields
            .iter()
            .map(|field| {
                let visible = field
                    .visible
                    .as_ref()
                    .map_or(true, |cond| evaluate_condition(cond, state));
                (field.id.clone(), visible)
            })
            .collect()
    }

    /// Validate every field in registry order.
    ///
    /// Hidden fields follow `policy`; `prior` supplies the entries that
    /// [`HiddenFieldPolicy::Retain`] carries forward.
    pub fn validate_all(
        &self,
        state: &FormState,
        prior: &ErrorMap,
        today: NaiveDate,
        policy: HiddenFieldPolicy,
    ) -> ErrorMap {
        let ctx = EvalContext::new(state, today);
        let mut errors = ErrorMap::new();

        for field in &self.fields {
            if let Some(visible) = &field.visible {
                if !evaluate_condition(visible, state) {
                    let kept = match policy {
                        HiddenFieldPolicy::Retain => prior.get(&field.id).cloned().unwrap_or_default(),
                        HiddenFieldPolicy::Clear => String::new(),
                    };
                    errors.insert(field.id.clone(), kept);
                    continue;
                }
            }

            let error = match &field.rule {
                Some(rule) => self.rules.check(rule, &field.id, &ctx).unwrap_or_default(),
                None => {
                    let empty = state.get(&field.id).map_or(true, FieldValue::is_empty);
                    if field.required && empty {
                        REQUIRED_MESSAGE.to_string()
                    } else {
                        String::new()
                    }
                }
            };
            errors.insert(field.id.clone(), error);
        }

        errors
    }

    /// Per-section counts of visible and filled fields
    pub fn section_progress(&self, state: &FormState) -> Vec<SectionProgress> {
        let visibility = self.evaluate_visibility(state);
        self.sections
            .iter()
            .map(|section| {
                let members = &self.fields[section.start..section.end];
                let visible: Vec<_> = members
                    .iter()
                    .filter(|f| visibility.get(&f.id).copied().unwrap_or(true))
                    .collect();
                let filled = visible
                    .iter()
                    .filter(|f| state.get(&f.id).is_some_and(|v| !v.is_empty()))
                    .count();
                SectionProgress {
                    title: section.title.clone(),
                    visible: visible.len(),
                    filled,
                    overall_required: section.overall_required,
                }
            })
            .collect()
    }
}

fn check_section_layout(sections: &[Section], field_count: usize) -> Result<(), RegistryError> {
    let mut expected_start = 0;
    let mut titles = HashSet::new();
    for section in sections {
        if section.start != expected_start {
            return Err(RegistryError::SectionLayout(format!(
                "section {:?} starts at {} but the previous section ended at {}",
                section.title, section.start, expected_start
            )));
        }
        if section.end <= section.start {
            return Err(RegistryError::SectionLayout(format!(
                "section {:?} is empty",
                section.title
            )));
        }
        if !titles.insert(section.title.as_str()) {
            return Err(RegistryError::SectionLayout(format!(
                "section title {:?} appears twice",
                section.title
            )));
        }
        expected_start = section.end;
    }
    if expected_start != field_count {
        return Err(RegistryError::SectionLayout(format!(
            "sections cover {} of {} fields",
            expected_start, field_count
        )));
    }
    Ok(())
}
