use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ValidationError;

/// Discriminant of a firewall rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirewallRuleType {
    CustomRange,
    ManagedRange,
}

impl FirewallRuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirewallRuleType::CustomRange => "custom_range",
            FirewallRuleType::ManagedRange => "managed_range",
        }
    }
}

impl fmt::Display for FirewallRuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FirewallRuleType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom_range" => Ok(FirewallRuleType::CustomRange),
            "managed_range" => Ok(FirewallRuleType::ManagedRange),
            other => Err(ValidationError::UnknownFirewallRuleType(other.to_string())),
        }
    }
}

/// The address range a rule allows.
///
/// Variant order is the sort order: custom ranges before managed ranges,
/// then lexicographic on the CIDR or range id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FirewallRange {
    #[serde(rename = "custom_range")]
    Custom { cidr: String },
    #[serde(rename = "managed_range")]
    Managed { range_id: String },
}

impl FirewallRange {
    pub fn rule_type(&self) -> FirewallRuleType {
        match self {
            FirewallRange::Custom { .. } => FirewallRuleType::CustomRange,
            FirewallRange::Managed { .. } => FirewallRuleType::ManagedRange,
        }
    }

    pub fn cidr(&self) -> Option<&str> {
        match self {
            FirewallRange::Custom { cidr } => Some(cidr),
            FirewallRange::Managed { .. } => None,
        }
    }

    pub fn range_id(&self) -> Option<&str> {
        match self {
            FirewallRange::Custom { .. } => None,
            FirewallRange::Managed { range_id } => Some(range_id),
        }
    }
}

/// One entry of a database firewall allow-list.
///
/// Equality, ordering and hashing only look at the range. The label and the
/// remote id never decide whether two rules are the same rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirewallRule {
    /// Remote identifier, `None` until the provider created the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub range: FirewallRange,
    #[serde(default)]
    pub label: String,
}

impl FirewallRule {
    /// Builds a rule from untyped fields, checking the shape required by the type.
    pub fn parse(
        rule_type: &str,
        cidr: &str,
        range_id: &str,
        label: &str,
    ) -> Result<Self, ValidationError> {
        let range = match rule_type.parse::<FirewallRuleType>()? {
            FirewallRuleType::CustomRange if cidr.is_empty() => {
                return Err(ValidationError::MissingCidr)
            }
            FirewallRuleType::CustomRange => FirewallRange::Custom {
                cidr: cidr.to_string(),
            },
            FirewallRuleType::ManagedRange if range_id.is_empty() => {
                return Err(ValidationError::MissingRangeId)
            }
            FirewallRuleType::ManagedRange => FirewallRange::Managed {
                range_id: range_id.to_string(),
            },
        };

        Ok(Self {
            id: None,
            range,
            label: label.to_string(),
        })
    }

    pub fn custom(cidr: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            range: FirewallRange::Custom { cidr: cidr.into() },
            label: label.into(),
        }
    }

    pub fn managed(range_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: None,
            range: FirewallRange::Managed {
                range_id: range_id.into(),
            },
            label: label.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn rule_type(&self) -> FirewallRuleType {
        self.range.rule_type()
    }
}

impl PartialEq for FirewallRule {
    fn eq(&self, other: &Self) -> bool {
        self.range == other.range
    }
}

impl Eq for FirewallRule {}

impl PartialOrd for FirewallRule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FirewallRule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.range.cmp(&other.range)
    }
}

impl Hash for FirewallRule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.range.hash(state);
    }
}

impl fmt::Display for FirewallRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ ID: '{}', Type: {}, CIDR: '{}', Label: '{}', RangeID: '{}' }}",
            self.id.as_deref().unwrap_or_default(),
            self.rule_type(),
            self.range.cidr().unwrap_or_default(),
            self.label,
            self.range.range_id().unwrap_or_default(),
        )
    }
}
