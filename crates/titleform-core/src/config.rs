use serde::{Deserialize, Serialize};

/// What validation does with the error of a field whose visibility
/// predicate is currently false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFieldPolicy {
    /// Record "" while hidden; the rule runs again once the field reappears
    #[default]
    Clear,
    /// Keep whatever error the field had when it was hidden
    Retain,
}

impl std::str::FromStr for HiddenFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clear" => Ok(HiddenFieldPolicy::Clear),
            "retain" | "keep" => Ok(HiddenFieldPolicy::Retain),
            other => Err(format!("Unknown hidden field policy: {}", other)),
        }
    }
}

/// Form controller settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub hidden_fields: HiddenFieldPolicy,
}

impl FormConfig {
    pub fn with_hidden_fields(mut self, policy: HiddenFieldPolicy) -> Self {
        self.hidden_fields = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parses_from_env_strings() {
        assert_eq!("clear".parse(), Ok(HiddenFieldPolicy::Clear));
        assert_eq!(" Retain ".parse(), Ok(HiddenFieldPolicy::Retain));
        assert!("sometimes".parse::<HiddenFieldPolicy>().is_err());
    }

    #[test]
    fn test_default_clears_hidden_errors() {
        assert_eq!(FormConfig::default().hidden_fields, HiddenFieldPolicy::Clear);
    }
}
