//! Playbook parameter dependency validation.
//!
//! NDFC fabric templates declare per-parameter dependency rules: "parameter
//! X is only valid when parameter Y compares true against this literal".
//! [`VerifyPlaybookParams`] evaluates every rule for every parameter the
//! playbook supplies, consulting three candidate sources for the dependent
//! value — the playbook itself, the controller's current configuration, and
//! the template default — and collects every failed combination into one
//! report before raising.
//!
//! Rule operators come from controller-supplied template metadata. They are
//! resolved through a closed comparator table; an operator outside the fixed
//! vocabulary is rejected, never evaluated.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// The fixed comparator vocabulary accepted in template rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Equality
    Eq,
    /// Inequality
    Ne,
    /// Numeric less-than
    Lt,
    /// Numeric less-than-or-equal
    Le,
    /// Numeric greater-than
    Gt,
    /// Numeric greater-than-or-equal
    Ge,
    /// Membership in a list (or substring of a string)
    In,
}

impl Operator {
    /// Applies the comparator: `candidate <op> target`.
    ///
    /// Template values arrive as strings even when they mean booleans or
    /// numbers ("true", "65001"), so both sides are normalized before
    /// comparing. Ordering operators are numeric-only; a non-numeric side
    /// evaluates false rather than erroring.
    pub fn evaluate(self, candidate: &Value, target: &Value) -> bool {
        match self {
            Operator::Eq => values_equal(candidate, target),
            Operator::Ne => !values_equal(candidate, target),
            Operator::Lt => numeric_cmp(candidate, target, |a, b| a < b),
            Operator::Le => numeric_cmp(candidate, target, |a, b| a <= b),
            Operator::Gt => numeric_cmp(candidate, target, |a, b| a > b),
            Operator::Ge => numeric_cmp(candidate, target, |a, b| a >= b),
            Operator::In => match target {
                Value::Array(items) => items.iter().any(|item| values_equal(candidate, item)),
                Value::String(haystack) => candidate
                    .as_str()
                    .map(|needle| haystack.contains(needle))
                    .unwrap_or(false),
                _ => false,
            },
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::In => "in",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "==" => Ok(Operator::Eq),
            "!=" => Ok(Operator::Ne),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Le),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Ge),
            "in" => Ok(Operator::In),
            _ => Err(Error::UnknownOperator(s.to_string())),
        }
    }
}

/// One mandatory-dependency rule: `parameter` is valid only when
/// `dependent_param <operator> value` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    /// The parameter the rule guards
    pub parameter: String,
    /// The parameter whose value the rule inspects
    pub dependent_param: String,
    /// Comparator from the closed vocabulary
    pub operator: Operator,
    /// Literal the dependent value is compared against
    pub value: Value,
}

impl Rule {
    /// Parses a template annotation of the form `DEPENDENT op literal`,
    /// e.g. `UNDERLAY_IS_V6 == false` or `REPLICATION_MODE in Multicast,Ingress`.
    pub fn parse(parameter: impl Into<String>, annotation: &str) -> Result<Self> {
        let parameter = parameter.into();
        let mut parts = annotation.split_whitespace();
        let (dependent, op, literal) = match (parts.next(), parts.next(), parts.next()) {
            (Some(d), Some(o), Some(l)) => (d, o, l),
            _ => {
                return Err(Error::InvalidRule {
                    parameter,
                    rule: annotation.to_string(),
                    message: "expected 'DEPENDENT_PARAM operator literal'".to_string(),
                })
            }
        };
        if parts.next().is_some() {
            return Err(Error::InvalidRule {
                parameter,
                rule: annotation.to_string(),
                message: "trailing tokens after literal".to_string(),
            });
        }

        let operator = literal_operator(&parameter, annotation, op)?;
        // Literals that parse as JSON keep their type; the rest are strings.
        let value = serde_json::from_str(literal)
            .unwrap_or_else(|_| Value::String(literal.to_string()));

        Ok(Self {
            parameter,
            dependent_param: dependent.to_string(),
            operator,
            value,
        })
    }
}

fn literal_operator(parameter: &str, annotation: &str, op: &str) -> Result<Operator> {
    op.parse().map_err(|_| Error::InvalidRule {
        parameter: parameter.to_string(),
        rule: annotation.to_string(),
        message: format!("unknown operator '{op}'"),
    })
}

/// Validates a playbook's fabric configuration against template rules.
#[derive(Debug, Clone, Default)]
pub struct VerifyPlaybookParams {
    fabric_name: String,
    rules: IndexMap<String, Vec<Rule>>,
    playbook: Map<String, Value>,
    controller: Map<String, Value>,
    defaults: Map<String, Value>,
}

impl VerifyPlaybookParams {
    /// Creates a validator for the named fabric.
    pub fn new(fabric_name: impl Into<String>) -> Self {
        Self {
            fabric_name: fabric_name.into(),
            ..Self::default()
        }
    }

    /// Registers one dependency rule.
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.entry(rule.parameter.clone()).or_default().push(rule);
    }

    /// Parses and registers a rule from a template annotation string.
    pub fn add_rule_annotation(
        &mut self,
        parameter: impl Into<String>,
        annotation: &str,
    ) -> Result<()> {
        self.add_rule(Rule::parse(parameter, annotation)?);
        Ok(())
    }

    /// The configuration the playbook is requesting.
    pub fn with_playbook_config(mut self, config: Map<String, Value>) -> Self {
        self.playbook = config;
        self
    }

    /// The fabric's current configuration as held by the controller.
    pub fn with_controller_config(mut self, config: Map<String, Value>) -> Self {
        self.controller = config;
        self
    }

    /// Default values declared by the fabric template.
    pub fn with_template_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.defaults = defaults;
        self
    }

    /// Checks every playbook-supplied parameter against its rules.
    ///
    /// A rule holds when any of the three sources satisfies it, except that
    /// a playbook-supplied dependent value which fails the comparison
    /// invalidates the parameter outright; what the user asks for beats
    /// what the controller or the template default would have provided.
    /// All parameters are checked before failing.
    ///
    /// # Errors
    ///
    /// `Validation` carrying every failed (parameter, dependency) pair,
    /// keyed by fabric name.
    pub fn commit(&self) -> Result<()> {
        let mut report: IndexMap<String, Vec<Value>> = IndexMap::new();

        for (parameter, rules) in &self.rules {
            if !self.playbook.contains_key(parameter) {
                continue;
            }
            for rule in rules {
                if self.rule_satisfied(rule) {
                    continue;
                }
                debug!(
                    fabric = %self.fabric_name,
                    parameter = %parameter,
                    dependent = %rule.dependent_param,
                    "dependency rule failed"
                );
                report.entry(parameter.clone()).or_default().push(json!({
                    "dependent_param": rule.dependent_param,
                    "operator": rule.operator.to_string(),
                    "value": rule.value,
                }));
            }
        }

        if report.is_empty() {
            return Ok(());
        }
        let combined = json!({ &self.fabric_name: report });
        Err(Error::Validation {
            fabric: self.fabric_name.clone(),
            report: combined.to_string(),
        })
    }

    fn rule_satisfied(&self, rule: &Rule) -> bool {
        let dep = rule.dependent_param.as_str();
        let playbook = self
            .playbook
            .get(dep)
            .map(|v| rule.operator.evaluate(v, &rule.value));
        // An explicit playbook value that fails the rule settles the matter.
        if playbook == Some(false) {
            return false;
        }
        let controller = self
            .controller
            .get(dep)
            .map(|v| rule.operator.evaluate(v, &rule.value));
        let defaults = self
            .defaults
            .get(dep)
            .map(|v| rule.operator.evaluate(v, &rule.value));
        [playbook, controller, defaults]
            .into_iter()
            .any(|decision| decision == Some(true))
    }
}

/// Template and playbook values frequently encode booleans and numbers as
/// strings; fold those to their typed forms before comparing.
fn normalize(value: &Value) -> Value {
    if let Value::String(s) = value {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Bool(true),
            "false" => return Value::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(n) {
                return Value::Number(number);
            }
        }
        return Value::String(trimmed.to_string());
    }
    value.clone()
}

fn values_equal(a: &Value, b: &Value) -> bool {
    let (a, b) = (normalize(a), normalize(b));
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn numeric_cmp(a: &Value, b: &Value, cmp: fn(f64, f64) -> bool) -> bool {
    match (normalize(a).as_f64(), normalize(b).as_f64()) {
        (Some(x), Some(y)) => cmp(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn object(entries: Vec<(&str, Value)>) -> Map<String, Value> {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn operator_parsing_covers_the_closed_vocabulary() {
        assert_eq!("==".parse::<Operator>().unwrap(), Operator::Eq);
        assert_eq!("!=".parse::<Operator>().unwrap(), Operator::Ne);
        assert_eq!("<".parse::<Operator>().unwrap(), Operator::Lt);
        assert_eq!("<=".parse::<Operator>().unwrap(), Operator::Le);
        assert_eq!(">".parse::<Operator>().unwrap(), Operator::Gt);
        assert_eq!(">=".parse::<Operator>().unwrap(), Operator::Ge);
        assert_eq!("in".parse::<Operator>().unwrap(), Operator::In);
    }

    #[test]
    fn unknown_operators_are_rejected_not_evaluated() {
        assert!(matches!(
            "=~".parse::<Operator>(),
            Err(Error::UnknownOperator(op)) if op == "=~"
        ));
        assert!("__import__".parse::<Operator>().is_err());
    }

    #[test]
    fn equality_normalizes_stringly_typed_booleans_and_numbers() {
        assert!(Operator::Eq.evaluate(&json!("true"), &json!(true)));
        assert!(Operator::Eq.evaluate(&json!("False"), &json!(false)));
        assert!(Operator::Eq.evaluate(&json!("65001"), &json!(65001)));
        assert!(Operator::Ne.evaluate(&json!("65001"), &json!(65002)));
        assert!(Operator::Eq.evaluate(&json!("Multicast"), &json!("Multicast")));
    }

    #[test]
    fn ordering_is_numeric_only() {
        assert!(Operator::Gt.evaluate(&json!(10), &json!("9")));
        assert!(Operator::Le.evaluate(&json!("3"), &json!(3)));
        assert!(!Operator::Lt.evaluate(&json!("abc"), &json!(5)));
    }

    #[test]
    fn membership_checks_arrays_and_strings() {
        assert!(Operator::In.evaluate(&json!("Multicast"), &json!(["Multicast", "Ingress"])));
        assert!(!Operator::In.evaluate(&json!("Mixed"), &json!(["Multicast", "Ingress"])));
        assert!(Operator::In.evaluate(&json!("Multicast"), &json!("Multicast,Ingress")));
    }

    #[test]
    fn rule_parses_template_annotations() {
        let rule = Rule::parse("ANYCAST_RP_IP_RANGE", "UNDERLAY_IS_V6 == false").unwrap();
        assert_eq!(rule.dependent_param, "UNDERLAY_IS_V6");
        assert_eq!(rule.operator, Operator::Eq);
        assert_eq!(rule.value, json!(false));
    }

    #[test]
    fn malformed_annotations_are_rejected() {
        assert!(matches!(
            Rule::parse("P", "UNDERLAY_IS_V6 =="),
            Err(Error::InvalidRule { .. })
        ));
        assert!(matches!(
            Rule::parse("P", "A ~= b"),
            Err(Error::InvalidRule { .. })
        ));
        assert!(matches!(
            Rule::parse("P", "A == b extra"),
            Err(Error::InvalidRule { .. })
        ));
    }

    #[test]
    fn valid_configuration_passes() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("ANYCAST_RP_IP_RANGE", "UNDERLAY_IS_V6 == false")
            .unwrap();
        let verify = verify.with_playbook_config(object(vec![
            ("ANYCAST_RP_IP_RANGE", json!("10.254.254.0/24")),
            ("UNDERLAY_IS_V6", json!(false)),
        ]));
        verify.commit().unwrap();
    }

    #[test]
    fn playbook_false_overrides_controller_and_default_true() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("ANYCAST_RP_IP_RANGE", "UNDERLAY_IS_V6 == false")
            .unwrap();
        let verify = verify
            .with_playbook_config(object(vec![
                ("ANYCAST_RP_IP_RANGE", json!("10.254.254.0/24")),
                ("UNDERLAY_IS_V6", json!(true)),
            ]))
            .with_controller_config(object(vec![("UNDERLAY_IS_V6", json!(false))]))
            .with_template_defaults(object(vec![("UNDERLAY_IS_V6", json!("false"))]));

        let err = verify.commit().unwrap_err();
        match err {
            Error::Validation { fabric, report } => {
                assert_eq!(fabric, "f1");
                assert!(report.contains("ANYCAST_RP_IP_RANGE"));
                assert!(report.contains("UNDERLAY_IS_V6"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn controller_value_satisfies_when_playbook_is_silent() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("STATIC_UNDERLAY_IP_ALLOC", "UNDERLAY_IS_V6 == false")
            .unwrap();
        let verify = verify
            .with_playbook_config(object(vec![("STATIC_UNDERLAY_IP_ALLOC", json!(true))]))
            .with_controller_config(object(vec![("UNDERLAY_IS_V6", json!("false"))]));
        verify.commit().unwrap();
    }

    #[test]
    fn template_default_satisfies_as_last_resort() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("STATIC_UNDERLAY_IP_ALLOC", "UNDERLAY_IS_V6 == false")
            .unwrap();
        let verify = verify
            .with_playbook_config(object(vec![("STATIC_UNDERLAY_IP_ALLOC", json!(true))]))
            .with_template_defaults(object(vec![("UNDERLAY_IS_V6", json!("false"))]));
        verify.commit().unwrap();
    }

    #[test]
    fn no_source_for_dependency_is_a_failure() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("STATIC_UNDERLAY_IP_ALLOC", "UNDERLAY_IS_V6 == false")
            .unwrap();
        let verify = verify
            .with_playbook_config(object(vec![("STATIC_UNDERLAY_IP_ALLOC", json!(true))]));
        assert!(verify.commit().is_err());
    }

    #[test]
    fn all_failures_are_collected_before_raising() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("PARAM_A", "DEP_A == true")
            .unwrap();
        verify
            .add_rule_annotation("PARAM_B", "DEP_B >= 10")
            .unwrap();
        let verify = verify.with_playbook_config(object(vec![
            ("PARAM_A", json!(1)),
            ("PARAM_B", json!(2)),
            ("DEP_A", json!(false)),
            ("DEP_B", json!(3)),
        ]));

        let err = verify.commit().unwrap_err();
        let Error::Validation { report, .. } = err else {
            panic!("expected Validation");
        };
        assert!(report.contains("PARAM_A"));
        assert!(report.contains("PARAM_B"));
    }

    #[test]
    fn rules_for_parameters_absent_from_the_playbook_are_skipped() {
        let mut verify = VerifyPlaybookParams::new("f1");
        verify
            .add_rule_annotation("PARAM_A", "DEP_A == true")
            .unwrap();
        let verify = verify.with_playbook_config(object(vec![("OTHER", json!(1))]));
        verify.commit().unwrap();
    }
}
