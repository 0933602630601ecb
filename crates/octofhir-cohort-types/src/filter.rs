//! Filter expression tree
//!
//! A filter is a recursive boolean expression: groups combine their children
//! with AND/OR and may negate the combined result, rules compare one field of
//! a row with a literal. The wire format is:
//!
//! ```text
//! FilterRule  = { id, field, operator, value, value2 }
//! FilterGroup = { id, name, logic: "AND"|"OR", negate, rules: (FilterRule|FilterGroup)[] }
//! ```
//!
//! An element of `rules` is a group when it carries `rules`, otherwise a rule.
//! Operator names the engine does not know are kept as [`Operator::Unknown`]
//! so that the offending rule can be reported by validation instead of the
//! whole document failing to deserialize.

use indexmap::{IndexMap, IndexSet};
use octofhir_cohort_diagnostics::{CohortError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dataset::ColumnType;
use crate::value::CellValue;

/// Comparison operator of a filter rule
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    IsEmpty,
    IsNotEmpty,
    InCohort,
    NotInCohort,
    OnDate,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    BetweenDates,
    /// Operator name not supported by the engine
    Unknown(String),
}

impl Operator {
    /// Every supported operator
    pub const ALL: [Operator; 18] = [
        Operator::Equals,
        Operator::NotEquals,
        Operator::Contains,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Between,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::InCohort,
        Operator::NotInCohort,
        Operator::OnDate,
        Operator::Before,
        Operator::After,
        Operator::OnOrBefore,
        Operator::OnOrAfter,
        Operator::BetweenDates,
    ];

    /// Parse a wire name
    pub fn parse(name: &str) -> Self {
        match name {
            "equals" => Operator::Equals,
            "not_equals" => Operator::NotEquals,
            "contains" => Operator::Contains,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "between" => Operator::Between,
            "is_empty" => Operator::IsEmpty,
            "is_not_empty" => Operator::IsNotEmpty,
            "in_cohort" => Operator::InCohort,
            "not_in_cohort" => Operator::NotInCohort,
            "on_date" => Operator::OnDate,
            "before" => Operator::Before,
            "after" => Operator::After,
            "on_or_before" => Operator::OnOrBefore,
            "on_or_after" => Operator::OnOrAfter,
            "between_dates" => Operator::BetweenDates,
            other => Operator::Unknown(other.to_string()),
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Between => "between",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::InCohort => "in_cohort",
            Operator::NotInCohort => "not_in_cohort",
            Operator::OnDate => "on_date",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::OnOrBefore => "on_or_before",
            Operator::OnOrAfter => "on_or_after",
            Operator::BetweenDates => "between_dates",
            Operator::Unknown(name) => name,
        }
    }

    /// Short symbol used in filter summaries
    pub fn symbol(&self) -> &str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::OnDate => "on",
            Operator::OnOrBefore => "on or before",
            Operator::OnOrAfter => "on or after",
            other => other.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Operator::Unknown(_))
    }

    /// Inclusive range operators, which need `value2`
    pub fn is_range(&self) -> bool {
        matches!(self, Operator::Between | Operator::BetweenDates)
    }

    /// Operators that need `value`
    pub fn requires_value(&self) -> bool {
        !matches!(self, Operator::IsEmpty | Operator::IsNotEmpty | Operator::Unknown(_))
    }

    /// Cohort membership operators
    pub fn is_membership(&self) -> bool {
        matches!(self, Operator::InCohort | Operator::NotInCohort)
    }

    /// Date comparison operators
    pub fn is_date(&self) -> bool {
        matches!(
            self,
            Operator::OnDate
                | Operator::Before
                | Operator::After
                | Operator::OnOrBefore
                | Operator::OnOrAfter
                | Operator::BetweenDates
        )
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Operator::parse(&name)
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        op.as_str().to_string()
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group combines its children
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Logic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::And => write!(f, "AND"),
            Logic::Or => write!(f, "OR"),
        }
    }
}

/// Leaf comparison of one row field with a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterRule {
    pub id: String,
    pub field: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: CellValue,
    #[serde(default)]
    pub value2: CellValue,
}

impl FilterRule {
    /// Create a rule without bounds
    pub fn new(id: impl Into<String>, field: impl Into<String>, operator: Operator) -> Self {
        Self {
            id: id.into(),
            field: field.into(),
            operator,
            value: CellValue::Null,
            value2: CellValue::Null,
        }
    }

    /// Set the comparison value
    pub fn with_value(mut self, value: impl Into<CellValue>) -> Self {
        self.value = value.into();
        self
    }

    /// Set the upper bound of a range operator
    pub fn with_value2(mut self, value2: impl Into<CellValue>) -> Self {
        self.value2 = value2.into();
        self
    }

    /// Check the rule is well formed
    pub fn validate(&self) -> Result<()> {
        let op = self.operator.as_str();
        if !self.operator.is_known() {
            return Err(CohortError::unknown_operator(&self.id, &self.field, op));
        }
        if self.field.trim().is_empty() && !self.operator.is_membership() {
            return Err(CohortError::empty_field(&self.id, op));
        }
        if self.operator.requires_value() && self.value.is_null() {
            return Err(CohortError::missing_value(&self.id, &self.field, op));
        }
        if self.operator.is_range() && self.value2.is_null() {
            return Err(CohortError::missing_upper_bound(&self.id, &self.field, op));
        }
        if self.operator.is_membership() && self.value.is_empty() {
            return Err(CohortError::invalid_cohort_reference(&self.id, &self.field, op));
        }
        Ok(())
    }
}

impl fmt::Display for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operator {
            Operator::IsEmpty => write!(f, "{} is empty", self.field),
            Operator::IsNotEmpty => write!(f, "{} is not empty", self.field),
            Operator::InCohort => write!(f, "in cohort {}", self.value),
            Operator::NotInCohort => write!(f, "not in cohort {}", self.value),
            op if op.is_range() => {
                write!(f, "{} {} {} and {}", self.field, op.symbol(), self.value, self.value2)
            }
            op => write!(f, "{} {} {}", self.field, op.symbol(), self.value),
        }
    }
}

/// A child of a filter group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Rule(FilterRule),
}

impl FilterNode {
    /// Id of the node
    pub fn id(&self) -> &str {
        match self {
            FilterNode::Group(group) => &group.id,
            FilterNode::Rule(rule) => &rule.id,
        }
    }
}

impl From<FilterRule> for FilterNode {
    fn from(rule: FilterRule) -> Self {
        FilterNode::Rule(rule)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Group(group) => group.fmt(f),
            FilterNode::Rule(rule) => rule.fmt(f),
        }
    }
}

/// Recursive boolean combination of rules and groups
///
/// An empty group is vacuously true under AND and false under OR; `negate`
/// is applied after combining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub negate: bool,
    pub rules: Vec<FilterNode>,
}

impl FilterGroup {
    /// Create an empty group
    pub fn new(id: impl Into<String>, logic: Logic) -> Self {
        Self {
            id: id.into(),
            name: None,
            logic,
            negate: false,
            rules: Vec::new(),
        }
    }

    /// Create an AND group from children
    pub fn all(id: impl Into<String>, rules: Vec<FilterNode>) -> Self {
        Self {
            rules,
            ..Self::new(id, Logic::And)
        }
    }

    /// Create an OR group from children
    pub fn any(id: impl Into<String>, rules: Vec<FilterNode>) -> Self {
        Self {
            rules,
            ..Self::new(id, Logic::Or)
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: impl Into<FilterNode>) -> Self {
        self.rules.push(child.into());
        self
    }

    /// Copy of this group with `negate` flipped
    pub fn negated(&self) -> Self {
        Self {
            negate: !self.negate,
            ..self.clone()
        }
    }

    /// Depth-first iterator over every rule in the tree
    pub fn iter_rules(&self) -> impl Iterator<Item = &FilterRule> {
        let mut out = Vec::new();
        collect_rules(self, &mut out);
        out.into_iter()
    }

    /// Distinct fields referenced by rules, in first-use order
    pub fn fields(&self) -> Vec<&str> {
        let fields: IndexSet<&str> = self
            .iter_rules()
            .filter(|rule| !rule.operator.is_membership())
            .map(|rule| rule.field.as_str())
            .collect();
        fields.into_iter().collect()
    }

    /// Distinct cohort ids used by membership rules
    pub fn referenced_cohorts(&self) -> Vec<String> {
        let ids: IndexSet<String> = self
            .iter_rules()
            .filter(|rule| rule.operator.is_membership() && !rule.value.is_empty())
            .map(|rule| rule.value.to_text().into_owned())
            .collect();
        ids.into_iter().collect()
    }

    /// Number of rules in the tree
    pub fn rule_count(&self) -> usize {
        self.iter_rules().count()
    }

    /// Check every rule in the tree, reporting all problems at once
    pub fn validate(&self) -> Result<()> {
        let errors: Vec<CohortError> = self
            .iter_rules()
            .filter_map(|rule| rule.validate().err())
            .collect();
        match CohortError::from_errors(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Structural validation plus a check that every field exists in the schema
    pub fn validate_against(&self, columns: &IndexMap<String, ColumnType>) -> Result<()> {
        let mut errors: Vec<CohortError> = Vec::new();
        for rule in self.iter_rules() {
            if let Err(err) = rule.validate() {
                errors.push(err);
            } else if !rule.operator.is_membership() && !columns.contains_key(&rule.field) {
                errors.push(CohortError::unknown_column(&rule.field, &rule.id));
            }
        }
        match CohortError::from_errors(errors) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn collect_rules<'a>(group: &'a FilterGroup, out: &mut Vec<&'a FilterRule>) {
    for child in &group.rules {
        match child {
            FilterNode::Rule(rule) => out.push(rule),
            FilterNode::Group(nested) => collect_rules(nested, out),
        }
    }
}

impl fmt::Display for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negate {
            write!(f, "NOT ")?;
        }
        write!(f, "(")?;
        for (i, child) in self.rules.iter().enumerate() {
            if i > 0 {
                write!(f, " {} ", self.logic)?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}

/// A named, reusable filter owned by a study
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFilter {
    pub id: String,
    pub study_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub filter: FilterGroup,
    #[serde(default)]
    pub is_template: bool,
    #[serde(default)]
    pub usage_count: u64,
}

impl SavedFilter {
    /// Create a saved filter with no recorded uses
    pub fn new(
        id: impl Into<String>,
        study_id: impl Into<String>,
        name: impl Into<String>,
        filter: FilterGroup,
    ) -> Self {
        Self {
            id: id.into(),
            study_id: study_id.into(),
            name: name.into(),
            description: None,
            filter,
            is_template: false,
            usage_count: 0,
        }
    }
}
