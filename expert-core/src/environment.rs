//! Bundled reference engine.
//!
//! `Environment` implements [`Session`] over an in-process working
//! memory: templates and rules are declared from source syntax, facts
//! are asserted as literals, and `run` forward-chains to fixpoint with
//! refraction (an activation fires at most once).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::router::Router;
use crate::session::{EngineError, FactAccessError, FactIndex, FactView, Session, SessionId};
use crate::syntax::{self, Sexp};
use crate::value::SlotValue;

const DEFAULT_FIRING_LIMIT: usize = 10_000;

/// Whether a slot holds one value or a multifield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlotKind {
    Single,
    Multi,
}

/// A declared slot: name, arity, and optional default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSpec {
    pub name: String,
    pub kind: SlotKind,
    pub default: Option<SlotValue>,
}

/// A declared fact shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    pub name: String,
    pub slots: Vec<SlotSpec>,
}

impl Template {
    pub fn slot(&self, name: &str) -> Option<&SlotSpec> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// A fact in working memory. Immutable once asserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactRecord {
    pub index: FactIndex,
    pub template: String,
    pub slots: BTreeMap<String, SlotValue>,
}

impl fmt::Display for FactRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.template)?;
        for (slot, value) in &self.slots {
            let rendered = value.to_string();
            if rendered.is_empty() {
                write!(f, " ({slot})")?;
            } else {
                write!(f, " ({slot} {rendered})")?;
            }
        }
        f.write_str(")")
    }
}

impl FactView for FactRecord {
    fn template_name(&self) -> Result<&str, FactAccessError> {
        Ok(&self.template)
    }

    fn slot(&self, name: &str) -> Result<SlotValue, FactAccessError> {
        self.slots
            .get(name)
            .cloned()
            .ok_or_else(|| FactAccessError::NoSuchSlot {
                slot: name.to_string(),
            })
    }

    fn render(&self) -> String {
        self.to_string()
    }
}

/// A slot constraint in a rule pattern or consequent.
#[derive(Debug, Clone, PartialEq)]
enum PatternValue {
    Literal(SlotValue),
    Variable(String),
}

#[derive(Debug, Clone)]
struct Pattern {
    template: String,
    tests: Vec<(String, PatternValue)>,
}

#[derive(Debug, Clone)]
struct Consequent {
    template: String,
    slots: Vec<(String, PatternValue)>,
}

#[derive(Debug, Clone)]
struct Rule {
    name: String,
    patterns: Vec<Pattern>,
    consequents: Vec<Consequent>,
}

type Bindings = BTreeMap<String, SlotValue>;

/// An in-process rule-engine session.
pub struct Environment {
    id: SessionId,
    templates: BTreeMap<String, Template>,
    rules: Vec<Rule>,
    facts: Vec<FactRecord>,
    next_index: u64,
    fired: HashSet<(String, Vec<FactIndex>)>,
    firing_limit: usize,
    router: Option<Box<dyn Router>>,
}

impl Environment {
    /// Create a fresh, empty session.
    pub fn new() -> Self {
        let id = SessionId::new();
        tracing::debug!(session = %id, "engine session created");
        Self {
            id,
            templates: BTreeMap::new(),
            rules: Vec::new(),
            facts: Vec::new(),
            next_index: 1,
            fired: HashSet::new(),
            firing_limit: DEFAULT_FIRING_LIMIT,
            router: None,
        }
    }

    /// Cap on total rule firings per `run`.
    pub fn with_firing_limit(mut self, limit: usize) -> Self {
        self.firing_limit = limit;
        self
    }

    pub fn template(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    fn route(&mut self, line: String) {
        if let Some(router) = self.router.as_mut() {
            router.route(&line);
        }
    }

    fn build_template(&mut self, items: &[Sexp]) -> Result<(), EngineError> {
        let mut items = items.iter();
        let name = items
            .next()
            .and_then(Sexp::as_symbol)
            .ok_or_else(|| EngineError::MalformedConstruct {
                message: "deftemplate requires a name symbol".to_string(),
            })?
            .to_string();

        let mut slots = Vec::new();
        for item in items {
            // A bare string after the name is a doc comment.
            if let Sexp::Str(_) = item {
                if slots.is_empty() {
                    continue;
                }
            }
            let Sexp::List(parts) = item else {
                return Err(EngineError::MalformedConstruct {
                    message: format!("expected a slot declaration, got {item}"),
                });
            };
            slots.push(parse_slot_spec(&name, parts)?);
        }

        let template = Template { name: name.clone(), slots };
        if let Some(existing) = self.templates.get(&name) {
            if *existing == template {
                return Ok(());
            }
            return Err(EngineError::TemplateConflict { name });
        }

        self.route(format!("deftemplate {name}"));
        self.templates.insert(name, template);
        Ok(())
    }

    fn build_rule(&mut self, items: &[Sexp]) -> Result<(), EngineError> {
        let mut items = items.iter().peekable();
        let name = items
            .next()
            .and_then(Sexp::as_symbol)
            .ok_or_else(|| EngineError::MalformedConstruct {
                message: "defrule requires a name symbol".to_string(),
            })?
            .to_string();

        if let Some(Sexp::Str(_)) = items.peek() {
            items.next();
        }

        let mut patterns = Vec::new();
        let mut saw_arrow = false;
        let mut consequents = Vec::new();

        for item in items {
            if item.as_symbol() == Some("=>") {
                saw_arrow = true;
                continue;
            }
            let Sexp::List(parts) = item else {
                return Err(EngineError::MalformedConstruct {
                    message: format!("expected a list in rule {name}, got {item}"),
                });
            };
            if saw_arrow {
                consequents.push(self.parse_consequent(&name, parts)?);
            } else {
                patterns.push(self.parse_pattern(&name, parts)?);
            }
        }

        if !saw_arrow {
            return Err(EngineError::MalformedConstruct {
                message: format!("rule {name} is missing =>"),
            });
        }
        if patterns.is_empty() {
            return Err(EngineError::MalformedConstruct {
                message: format!("rule {name} has no patterns"),
            });
        }

        let bound: HashSet<&String> = patterns
            .iter()
            .flat_map(|p| &p.tests)
            .filter_map(|(_, test)| match test {
                PatternValue::Variable(var) => Some(var),
                PatternValue::Literal(_) => None,
            })
            .collect();
        for consequent in &consequents {
            for (_, value) in &consequent.slots {
                if let PatternValue::Variable(var) = value {
                    if !bound.contains(var) {
                        return Err(EngineError::MalformedConstruct {
                            message: format!("unbound variable ?{var} in rule {name}"),
                        });
                    }
                }
            }
        }

        self.route(format!("defrule {name}"));
        self.rules.push(Rule {
            name,
            patterns,
            consequents,
        });
        Ok(())
    }

    fn parse_pattern(&self, rule: &str, parts: &[Sexp]) -> Result<Pattern, EngineError> {
        let (template, tests) = self.parse_slot_tests(rule, parts)?;
        Ok(Pattern { template, tests })
    }

    fn parse_consequent(&self, rule: &str, parts: &[Sexp]) -> Result<Consequent, EngineError> {
        let mut parts_iter = parts.iter();
        let head = parts_iter.next().and_then(Sexp::as_symbol);
        if head != Some("assert") {
            return Err(EngineError::MalformedConstruct {
                message: format!(
                    "rule {rule}: only (assert ...) actions are supported"
                ),
            });
        }
        let Some(Sexp::List(fact_parts)) = parts_iter.next() else {
            return Err(EngineError::MalformedConstruct {
                message: format!("rule {rule}: assert requires a fact form"),
            });
        };
        let (template, slots) = self.parse_slot_tests(rule, fact_parts)?;
        Ok(Consequent { template, slots })
    }

    /// Parse `(template (slot value...) ...)` into slot constraints,
    /// validating template and slot names against declarations.
    fn parse_slot_tests(
        &self,
        rule: &str,
        parts: &[Sexp],
    ) -> Result<(String, Vec<(String, PatternValue)>), EngineError> {
        let mut parts_iter = parts.iter();
        let template_name = parts_iter
            .next()
            .and_then(Sexp::as_symbol)
            .ok_or_else(|| EngineError::MalformedConstruct {
                message: format!("rule {rule}: expected a template name"),
            })?
            .to_string();
        let template = self
            .templates
            .get(&template_name)
            .ok_or_else(|| EngineError::UnknownTemplate {
                name: template_name.clone(),
            })?;

        let mut tests = Vec::new();
        for pair in parts_iter {
            let Sexp::List(pair_parts) = pair else {
                return Err(EngineError::MalformedConstruct {
                    message: format!("rule {rule}: expected a (slot value) pair, got {pair}"),
                });
            };
            let mut pair_iter = pair_parts.iter();
            let slot_name = pair_iter
                .next()
                .and_then(Sexp::as_symbol)
                .ok_or_else(|| EngineError::MalformedConstruct {
                    message: format!("rule {rule}: expected a slot name"),
                })?
                .to_string();
            let spec =
                template
                    .slot(&slot_name)
                    .ok_or_else(|| EngineError::UnknownSlot {
                        template: template_name.clone(),
                        slot: slot_name.clone(),
                    })?;

            let values: Vec<&Sexp> = pair_iter.collect();
            let value = match values.as_slice() {
                [Sexp::Variable(var)] => PatternValue::Variable(var.clone()),
                _ => {
                    let mut literals = Vec::new();
                    for value in &values {
                        let literal = SlotValue::from_sexp(value).ok_or_else(|| {
                            EngineError::MalformedConstruct {
                                message: format!(
                                    "rule {rule}: unsupported value {value} for slot {slot_name}"
                                ),
                            }
                        })?;
                        literals.push(literal);
                    }
                    match spec.kind {
                        SlotKind::Multi => PatternValue::Literal(SlotValue::Multi(literals)),
                        SlotKind::Single => {
                            if literals.len() > 1 {
                                return Err(EngineError::MalformedConstruct {
                                    message: format!(
                                        "slot {slot_name} of template {template_name} takes a single value"
                                    ),
                                });
                            }
                            PatternValue::Literal(
                                literals.into_iter().next().unwrap_or_else(SlotValue::nil),
                            )
                        }
                    }
                }
            };
            tests.push((slot_name, value));
        }

        Ok((template_name, tests))
    }

    /// Parse a fact literal into its template name and completed slots.
    fn parse_fact(&self, fact: &str) -> Result<(String, BTreeMap<String, SlotValue>), EngineError> {
        let sexp = syntax::parse(fact)?;
        let Sexp::List(parts) = sexp else {
            return Err(EngineError::MalformedFact {
                message: format!("expected a fact literal, got {sexp}"),
            });
        };
        let mut parts_iter = parts.iter();
        let template_name = parts_iter
            .next()
            .and_then(Sexp::as_symbol)
            .ok_or_else(|| EngineError::MalformedFact {
                message: "fact literal is missing a template name".to_string(),
            })?
            .to_string();
        let template = self
            .templates
            .get(&template_name)
            .ok_or_else(|| EngineError::UnknownTemplate {
                name: template_name.clone(),
            })?;

        let mut supplied = BTreeMap::new();
        for pair in parts_iter {
            let Sexp::List(pair_parts) = pair else {
                return Err(EngineError::MalformedFact {
                    message: format!("expected a (slot value) pair, got {pair}"),
                });
            };
            let mut pair_iter = pair_parts.iter();
            let slot_name = pair_iter
                .next()
                .and_then(Sexp::as_symbol)
                .ok_or_else(|| EngineError::MalformedFact {
                    message: "slot pair is missing a slot name".to_string(),
                })?
                .to_string();
            let spec =
                template
                    .slot(&slot_name)
                    .ok_or_else(|| EngineError::UnknownSlot {
                        template: template_name.clone(),
                        slot: slot_name.clone(),
                    })?;

            let mut values = Vec::new();
            for value in pair_iter {
                let value =
                    SlotValue::from_sexp(value).ok_or_else(|| EngineError::MalformedFact {
                        message: format!("unsupported value {value} for slot {slot_name}"),
                    })?;
                values.push(value);
            }

            let value = match spec.kind {
                SlotKind::Multi => SlotValue::Multi(values),
                SlotKind::Single => {
                    if values.len() > 1 {
                        return Err(EngineError::MalformedFact {
                            message: format!(
                                "slot {slot_name} of template {template_name} takes a single value"
                            ),
                        });
                    }
                    values.into_iter().next().unwrap_or_else(SlotValue::nil)
                }
            };
            supplied.insert(slot_name, value);
        }

        Ok((template_name.clone(), complete_slots(template, supplied)))
    }

    /// Append a fact, refusing exact duplicates of a live fact.
    fn insert_fact(
        &mut self,
        template: String,
        slots: BTreeMap<String, SlotValue>,
    ) -> Result<FactIndex, EngineError> {
        if let Some(existing) = self
            .facts
            .iter()
            .find(|f| f.template == template && f.slots == slots)
        {
            return Err(EngineError::DuplicateFact {
                fact: existing.to_string(),
            });
        }

        let index = FactIndex(self.next_index);
        self.next_index += 1;
        let record = FactRecord {
            index,
            template,
            slots,
        };
        self.route(format!("==> {index} {record}"));
        self.facts.push(record);
        Ok(index)
    }

    /// First activation not yet fired, if any.
    fn next_activation(&self) -> Option<(usize, Bindings, Vec<FactIndex>)> {
        for (rule_idx, rule) in self.rules.iter().enumerate() {
            let mut tuple = Vec::new();
            if let Some((bindings, tuple)) =
                self.match_patterns(rule, 0, Bindings::new(), &mut tuple)
            {
                return Some((rule_idx, bindings, tuple));
            }
        }
        None
    }

    fn match_patterns(
        &self,
        rule: &Rule,
        depth: usize,
        bindings: Bindings,
        tuple: &mut Vec<FactIndex>,
    ) -> Option<(Bindings, Vec<FactIndex>)> {
        if depth == rule.patterns.len() {
            if self.fired.contains(&(rule.name.clone(), tuple.clone())) {
                return None;
            }
            return Some((bindings, tuple.clone()));
        }

        let pattern = &rule.patterns[depth];
        for fact in &self.facts {
            if fact.template != pattern.template {
                continue;
            }
            let Some(candidate) = bind_pattern(pattern, fact, &bindings) else {
                continue;
            };
            tuple.push(fact.index);
            if let Some(found) = self.match_patterns(rule, depth + 1, candidate, tuple) {
                return Some(found);
            }
            tuple.pop();
        }
        None
    }

    fn instantiate(
        &self,
        consequent: &Consequent,
        bindings: &Bindings,
    ) -> Result<(String, BTreeMap<String, SlotValue>), EngineError> {
        let template =
            self.templates
                .get(&consequent.template)
                .ok_or_else(|| EngineError::UnknownTemplate {
                    name: consequent.template.clone(),
                })?;

        let mut supplied = BTreeMap::new();
        for (slot, value) in &consequent.slots {
            let resolved = match value {
                PatternValue::Literal(literal) => literal.clone(),
                PatternValue::Variable(var) => bindings.get(var).cloned().ok_or_else(|| {
                    EngineError::MalformedConstruct {
                        message: format!("unbound variable ?{var}"),
                    }
                })?,
            };
            supplied.insert(slot.clone(), resolved);
        }

        Ok((consequent.template.clone(), complete_slots(template, supplied)))
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for Environment {
    type Fact = FactRecord;

    fn id(&self) -> SessionId {
        self.id
    }

    fn build(&mut self, construct: &str) -> Result<(), EngineError> {
        let sexp = syntax::parse(construct)?;
        let Sexp::List(items) = sexp else {
            return Err(EngineError::MalformedConstruct {
                message: format!("expected a construct list, got {sexp}"),
            });
        };
        let head = items.first().and_then(Sexp::as_symbol).ok_or_else(|| {
            EngineError::MalformedConstruct {
                message: "construct is missing a head symbol".to_string(),
            }
        })?;
        match head {
            "deftemplate" => self.build_template(&items[1..]),
            "defrule" => self.build_rule(&items[1..]),
            other => Err(EngineError::UnknownConstruct {
                name: other.to_string(),
            }),
        }
    }

    fn assert_string(&mut self, fact: &str) -> Result<FactIndex, EngineError> {
        let (template, slots) = self.parse_fact(fact)?;
        self.insert_fact(template, slots)
    }

    fn run(&mut self) -> Result<usize, EngineError> {
        let mut firings = 0usize;
        while let Some((rule_idx, bindings, tuple)) = self.next_activation() {
            let rule_name = self.rules[rule_idx].name.clone();
            self.fired.insert((rule_name.clone(), tuple.clone()));
            firings += 1;
            if firings > self.firing_limit {
                return Err(EngineError::RunawayRun {
                    limit: self.firing_limit,
                });
            }

            let indices = tuple
                .iter()
                .map(FactIndex::to_string)
                .collect::<Vec<_>>()
                .join(",");
            self.route(format!("FIRE {firings} {rule_name}: {indices}"));

            let consequents = self.rules[rule_idx].consequents.clone();
            for consequent in &consequents {
                let (template, slots) = self.instantiate(consequent, &bindings)?;
                match self.insert_fact(template, slots) {
                    Ok(_) | Err(EngineError::DuplicateFact { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        tracing::debug!(session = %self.id, firings, "run reached fixpoint");
        Ok(firings)
    }

    fn facts(&self) -> Vec<FactRecord> {
        self.facts.clone()
    }

    fn add_router(&mut self, router: Box<dyn Router>) -> Result<(), EngineError> {
        self.router = Some(router);
        Ok(())
    }
}

fn parse_slot_spec(template: &str, parts: &[Sexp]) -> Result<SlotSpec, EngineError> {
    let mut parts_iter = parts.iter();
    let kind = match parts_iter.next().and_then(Sexp::as_symbol) {
        Some("slot") => SlotKind::Single,
        Some("multislot") => SlotKind::Multi,
        _ => {
            return Err(EngineError::MalformedConstruct {
                message: format!("template {template}: expected slot or multislot"),
            })
        }
    };
    let name = parts_iter
        .next()
        .and_then(Sexp::as_symbol)
        .ok_or_else(|| EngineError::MalformedConstruct {
            message: format!("template {template}: slot is missing a name"),
        })?
        .to_string();

    let mut default = None;
    for modifier in parts_iter {
        let Sexp::List(modifier_parts) = modifier else {
            return Err(EngineError::MalformedConstruct {
                message: format!("template {template}: expected a slot modifier, got {modifier}"),
            });
        };
        match modifier_parts.first().and_then(Sexp::as_symbol) {
            Some("default") => {
                let mut values = Vec::new();
                for value in &modifier_parts[1..] {
                    let value =
                        SlotValue::from_sexp(value).ok_or_else(|| {
                            EngineError::MalformedConstruct {
                                message: format!(
                                    "template {template}: unsupported default {value}"
                                ),
                            }
                        })?;
                    values.push(value);
                }
                default = Some(match kind {
                    SlotKind::Multi => SlotValue::Multi(values),
                    SlotKind::Single => values.into_iter().next().unwrap_or_else(SlotValue::nil),
                });
            }
            _ => {
                return Err(EngineError::MalformedConstruct {
                    message: format!(
                        "template {template}: unsupported slot modifier {modifier}"
                    ),
                })
            }
        }
    }

    Ok(SlotSpec {
        name,
        kind,
        default,
    })
}

/// Fill unsupplied slots from defaults, `nil`, or an empty multifield.
fn complete_slots(
    template: &Template,
    mut supplied: BTreeMap<String, SlotValue>,
) -> BTreeMap<String, SlotValue> {
    for spec in &template.slots {
        if supplied.contains_key(&spec.name) {
            continue;
        }
        let value = match (&spec.default, spec.kind) {
            (Some(default), _) => default.clone(),
            (None, SlotKind::Single) => SlotValue::nil(),
            (None, SlotKind::Multi) => SlotValue::Multi(Vec::new()),
        };
        supplied.insert(spec.name.clone(), value);
    }
    supplied
}

fn bind_pattern(pattern: &Pattern, fact: &FactRecord, bindings: &Bindings) -> Option<Bindings> {
    let mut candidate = bindings.clone();
    for (slot, test) in &pattern.tests {
        let value = fact.slots.get(slot)?;
        match test {
            PatternValue::Literal(expected) => {
                if value != expected {
                    return None;
                }
            }
            PatternValue::Variable(var) => match candidate.get(var) {
                Some(bound) => {
                    if bound != value {
                        return None;
                    }
                }
                None => {
                    candidate.insert(var.clone(), value.clone());
                }
            },
        }
    }
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::CaptureRouter;

    fn session_with_result_template() -> Environment {
        let mut env = Environment::new();
        env.build("(deftemplate result (slot name))").unwrap();
        env
    }

    #[test]
    fn test_build_template_with_doc_and_defaults() {
        let mut env = Environment::new();
        env.build(r#"(deftemplate person "a person" (slot name (default "unknown")) (multislot tags))"#)
            .unwrap();

        let template = env.template("person").unwrap();
        assert_eq!(template.slots.len(), 2);
        assert_eq!(
            template.slot("name").unwrap().default,
            Some(SlotValue::Str("unknown".to_string()))
        );
        assert_eq!(template.slot("tags").unwrap().kind, SlotKind::Multi);
    }

    #[test]
    fn test_identical_redefinition_is_noop() {
        let mut env = session_with_result_template();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        env.build("(deftemplate result (slot name))").unwrap();
        assert_eq!(env.fact_count(), 1);
    }

    #[test]
    fn test_conflicting_redefinition_is_recoverable() {
        let mut env = session_with_result_template();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        let err = env
            .build("(deftemplate result (slot name) (slot age))")
            .unwrap_err();
        assert!(matches!(err, EngineError::TemplateConflict { .. }));

        // Previously asserted facts are untouched.
        assert_eq!(env.fact_count(), 1);
        assert_eq!(
            env.facts()[0].slot("name").unwrap(),
            SlotValue::Str("Alice".to_string())
        );
    }

    #[test]
    fn test_assert_requires_template() {
        let mut env = Environment::new();
        let err = env.assert_string(r#"(result (name "Alice"))"#).unwrap_err();
        assert!(matches!(err, EngineError::UnknownTemplate { .. }));
    }

    #[test]
    fn test_assert_rejects_unknown_slot() {
        let mut env = session_with_result_template();
        let err = env.assert_string(r#"(result (age 30))"#).unwrap_err();
        assert!(matches!(err, EngineError::UnknownSlot { .. }));
    }

    #[test]
    fn test_assert_fills_defaults() {
        let mut env = Environment::new();
        env.build(r#"(deftemplate person (slot name (default "unknown")) (slot mood) (multislot tags))"#)
            .unwrap();
        env.assert_string("(person)").unwrap();

        let facts = env.facts();
        assert_eq!(
            facts[0].slot("name").unwrap(),
            SlotValue::Str("unknown".to_string())
        );
        assert_eq!(facts[0].slot("mood").unwrap(), SlotValue::nil());
        assert_eq!(facts[0].slot("tags").unwrap(), SlotValue::Multi(Vec::new()));
    }

    #[test]
    fn test_assert_rejects_duplicates() {
        let mut env = session_with_result_template();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();
        let err = env.assert_string(r#"(result (name "Alice"))"#).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateFact { .. }));
        assert_eq!(env.fact_count(), 1);
    }

    #[test]
    fn test_fact_indices_follow_assertion_order() {
        let mut env = session_with_result_template();
        let first = env.assert_string(r#"(result (name "Alice"))"#).unwrap();
        let second = env.assert_string(r#"(result (name "Bob"))"#).unwrap();
        assert!(first < second);

        let facts = env.facts();
        assert_eq!(facts[0].index, first);
        assert_eq!(facts[1].index, second);
    }

    #[test]
    fn test_run_with_no_rules_is_a_fixpoint() {
        let mut env = session_with_result_template();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();
        assert_eq!(env.run().unwrap(), 0);
        assert_eq!(env.fact_count(), 1);
    }

    #[test]
    fn test_rule_fires_with_variable_binding() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        assert_eq!(env.run().unwrap(), 1);

        let facts = env.facts();
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].template, "greeting");
        assert_eq!(
            facts[1].slot("text").unwrap(),
            SlotValue::Str("Alice".to_string())
        );
    }

    #[test]
    fn test_refraction_prevents_refiring() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        assert_eq!(env.run().unwrap(), 1);
        assert_eq!(env.run().unwrap(), 0);
        assert_eq!(env.fact_count(), 2);
    }

    #[test]
    fn test_rule_fires_once_per_matching_fact() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();
        env.assert_string(r#"(result (name "Bob"))"#).unwrap();

        assert_eq!(env.run().unwrap(), 2);
        assert_eq!(env.fact_count(), 4);
    }

    #[test]
    fn test_chained_rules_reach_fixpoint() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(deftemplate logged (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.build("(defrule log (greeting (text ?t)) => (assert (logged (text ?t))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        assert_eq!(env.run().unwrap(), 2);
        let facts = env.facts();
        assert_eq!(facts[2].template, "logged");
    }

    #[test]
    fn test_literal_pattern_filters_facts() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build(r#"(defrule only-alice (result (name "Alice")) => (assert (greeting (text "hello"))))"#)
            .unwrap();
        env.assert_string(r#"(result (name "Bob"))"#).unwrap();

        assert_eq!(env.run().unwrap(), 0);
        assert_eq!(env.fact_count(), 1);
    }

    #[test]
    fn test_rule_rejects_unbound_consequent_variable() {
        let mut env = session_with_result_template();
        env.build("(deftemplate greeting (slot text))").unwrap();
        let err = env
            .build("(defrule bad (result (name ?n)) => (assert (greeting (text ?other))))")
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedConstruct { .. }));
    }

    #[test]
    fn test_rule_rejects_unknown_pattern_template() {
        let mut env = Environment::new();
        let err = env
            .build("(defrule bad (missing (x 1)) => (assert (missing (x 2))))")
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownTemplate { .. }));
    }

    #[test]
    fn test_firing_limit_trips() {
        let mut env = Environment::new().with_firing_limit(0);
        env.build("(deftemplate result (slot name))").unwrap();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();

        let err = env.run().unwrap_err();
        assert!(matches!(err, EngineError::RunawayRun { limit: 0 }));
    }

    #[test]
    fn test_router_sees_assertions_and_firings() {
        let capture = CaptureRouter::new();
        let mut env = session_with_result_template();
        env.add_router(Box::new(capture.clone())).unwrap();
        env.build("(deftemplate greeting (slot text))").unwrap();
        env.build("(defrule greet (result (name ?n)) => (assert (greeting (text ?n))))")
            .unwrap();
        env.assert_string(r#"(result (name "Alice"))"#).unwrap();
        env.run().unwrap();

        let lines = capture.lines();
        assert!(lines.iter().any(|l| l.starts_with("==> f-1")));
        assert!(lines.iter().any(|l| l.starts_with("FIRE 1 greet")));
    }

    #[test]
    fn test_render_escapes_embedded_quotes() {
        let mut env = session_with_result_template();
        env.assert_string(r#"(result (name "say \"hi\""))"#).unwrap();

        let facts = env.facts();
        assert_eq!(
            facts[0].slot("name").unwrap(),
            SlotValue::Str(r#"say "hi""#.to_string())
        );
        assert_eq!(facts[0].render(), r#"(result (name "say \"hi\""))"#);
    }

    #[test]
    fn test_multislot_values() {
        let mut env = Environment::new();
        env.build("(deftemplate person (slot name) (multislot tags))")
            .unwrap();
        env.assert_string(r#"(person (name "Ada") (tags "pioneer" "mathematician"))"#)
            .unwrap();

        let facts = env.facts();
        let tags = facts[0].slot("tags").unwrap();
        assert_eq!(tags.as_text(), "pioneer mathematician");
    }
}
