//! Plan reconciliation against the target product version
//!
//! Rewrites a proposed new state so that it only carries what the target
//! version understands, fills in version-conditional defaults and marks the
//! values the server will recompute. All problems are collected into
//! [`Diagnostics`]; nothing here fails fast.

use crate::gate::AvailabilityResolver;
use crate::plan_modifier::PlanModifyRequest;
use crate::schema::{Attribute, AttributeType, NestingMode, Schema};
use crate::types::{AttributePath, Diagnostics, Dynamic, DynamicValue};
use crate::INTERNAL_ERROR_SUMMARY;
use std::collections::HashMap;
use tracing::debug;

/// Diagnostic summary for values that need a companion attribute
pub const DEPENDENCY_SUMMARY: &str = "Invalid attribute configuration";

static NULL: Dynamic = Dynamic::Null;

/// Result of reconciling one planned change
#[derive(Debug, Clone)]
pub struct ReconciledPlan {
    pub planned_state: DynamicValue,
    pub requires_replace: Vec<AttributePath>,
    pub diagnostics: Diagnostics,
}

/// Proposed new state for a configuration: computed attributes left null
/// by the user become unknown, so the provider may decide them.
pub fn propose_new_state(schema: &Schema, config: &DynamicValue) -> DynamicValue {
    match &config.value {
        Dynamic::Map(obj) => DynamicValue::new(Dynamic::Map(propose_object(
            schema.attributes(),
            obj,
        ))),
        other => DynamicValue::new(other.clone()),
    }
}

fn propose_object(attrs: &[Attribute], config: &HashMap<String, Dynamic>) -> HashMap<String, Dynamic> {
    attrs
        .iter()
        .map(|attr| {
            let value = match (config.get(&attr.name), &attr.nested_type) {
                (None | Some(Dynamic::Null), _) if attr.computed => Dynamic::Unknown,
                (Some(Dynamic::Map(obj)), Some(nested)) if nested.nesting == NestingMode::Single => {
                    Dynamic::Map(propose_object(&nested.attributes, obj))
                }
                (Some(Dynamic::List(items)), Some(nested)) => Dynamic::List(
                    items
                        .iter()
                        .map(|item| match item {
                            Dynamic::Map(obj) => Dynamic::Map(propose_object(&nested.attributes, obj)),
                            other => other.clone(),
                        })
                        .collect(),
                ),
                (Some(value), _) => value.clone(),
                (None, _) => Dynamic::Null,
            };
            (attr.name.clone(), value)
        })
        .collect()
}

/// Validate-stage checks on a raw configuration.
///
/// Availability is only checked when the provider has been configured and a
/// resolver exists. Companions left unset are not judged here; their
/// defaults are only known at plan time.
pub fn validate_config(
    schema: &Schema,
    resolver: Option<&AvailabilityResolver>,
    config: &DynamicValue,
) -> Diagnostics {
    let mut diags = Diagnostics::new();
    if let Some(obj) = config.value.as_map() {
        validate_object(schema.attributes(), resolver, obj, &AttributePath::root(), &mut diags);
    }
    diags
}

fn validate_object(
    attrs: &[Attribute],
    resolver: Option<&AvailabilityResolver>,
    obj: &HashMap<String, Dynamic>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    for attr in attrs {
        let value = obj.get(&attr.name).unwrap_or(&NULL);
        if !value.is_defined() {
            continue;
        }
        let attr_path = path.clone().attribute(&attr.name);

        if let Some(resolver) = resolver {
            if attr.is_gated() && !resolver.require_available(&attr_path, &attr.gate, diags) {
                continue;
            }
        }

        for validator in &attr.validators {
            validator.validate(value, &attr_path, diags);
        }

        if let Some(nested) = &attr.nested_type {
            match value {
                Dynamic::Map(child) => {
                    validate_object(&nested.attributes, resolver, child, &attr_path, diags)
                }
                Dynamic::List(items) => {
                    for (idx, item) in items.iter().enumerate() {
                        if let Dynamic::Map(child) = item {
                            let item_path = attr_path.clone().index(idx as i64);
                            validate_object(&nested.attributes, resolver, child, &item_path, diags);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    for attr in attrs {
        check_dependencies(attr, obj, obj, false, path, diags);
    }
}

/// Checks `attr`'s dependencies. `supplied` holds what the user wrote,
/// `planned` the values after defaults. With `companions_resolved` unset,
/// companions that are null or unknown are skipped.
fn check_dependencies(
    attr: &Attribute,
    supplied: &HashMap<String, Dynamic>,
    planned: &HashMap<String, Dynamic>,
    companions_resolved: bool,
    path: &AttributePath,
    diags: &mut Diagnostics,
) {
    let Some(user_value) = supplied.get(&attr.name).filter(|v| v.is_defined()) else {
        return;
    };
    if !planned.get(&attr.name).is_some_and(Dynamic::is_defined) {
        return;
    }

    for dep in attr.dependencies.iter().filter(|d| d.validate) {
        if let Some(when) = &dep.when {
            if !user_value.semantically_equals(when) {
                continue;
            }
        }

        let companion = planned.get(&dep.companion).unwrap_or(&NULL);
        if companion.is_unknown() || (!companions_resolved && companion.is_null()) {
            continue;
        }
        if companion.semantically_equals(&dep.value) {
            continue;
        }

        let attr_path = path.clone().attribute(&attr.name);
        let companion_path = path.clone().attribute(&dep.companion);
        let detail = match &dep.when {
            Some(when) => format!(
                "{} can only be set to {} when {} is {}, got {}",
                attr_path, when, companion_path, dep.value, companion
            ),
            None => format!(
                "{} can only be set when {} is {}, got {}",
                attr_path, companion_path, dep.value, companion
            ),
        };
        diags.add_attribute_error(attr_path, DEPENDENCY_SUMMARY, detail);
    }
}

/// Reconciles proposed changes for one resource type
pub struct PlanReconciler<'a> {
    schema: &'a Schema,
    resolver: &'a AvailabilityResolver,
}

impl<'a> PlanReconciler<'a> {
    pub fn new(schema: &'a Schema, resolver: &'a AvailabilityResolver) -> Self {
        Self { schema, resolver }
    }

    /// `prior_state` is `None` (or null) when the resource is being created
    pub fn reconcile(
        &self,
        proposed: &DynamicValue,
        prior_state: Option<&DynamicValue>,
    ) -> ReconciledPlan {
        self.reconcile_with(proposed, prior_state, |_, _| {})
    }

    /// Like [`reconcile`](Self::reconcile), with `adjust` run on the planned
    /// attributes after defaults and modifiers but before server computed
    /// attributes are settled, so values it derives count as plan changes.
    pub fn reconcile_with<F>(
        &self,
        proposed: &DynamicValue,
        prior_state: Option<&DynamicValue>,
        adjust: F,
    ) -> ReconciledPlan
    where
        F: FnOnce(&mut HashMap<String, Dynamic>, &mut Diagnostics),
    {
        let mut diagnostics = Diagnostics::new();
        let mut requires_replace = Vec::new();

        // destroy plans carry no value to reconcile
        let Some(proposed_obj) = proposed.value.as_map() else {
            return ReconciledPlan {
                planned_state: proposed.clone(),
                requires_replace,
                diagnostics,
            };
        };

        let prior_obj = prior_state.and_then(|p| p.value.as_map());
        let creating = prior_obj.is_none();
        let attrs = self.schema.attributes();

        let mut planned = self.reconcile_object(
            attrs,
            proposed_obj,
            prior_obj,
            !creating,
            &AttributePath::root(),
            &mut requires_replace,
            &mut diagnostics,
        );

        adjust(&mut planned, &mut diagnostics);

        let changed = match prior_obj {
            None => true,
            Some(prior) => object_differs(attrs, &planned, prior),
        };
        if changed && !creating {
            debug!(
                target_version = %self.resolver.target(),
                "plan differs from prior state, server computed values will be refreshed"
            );
        }
        self.apply_server_computed(attrs, &mut planned, prior_obj, changed);

        ReconciledPlan {
            planned_state: DynamicValue::new(Dynamic::Map(planned)),
            requires_replace,
            diagnostics,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn reconcile_object(
        &self,
        attrs: &[Attribute],
        proposed: &HashMap<String, Dynamic>,
        prior: Option<&HashMap<String, Dynamic>>,
        updating: bool,
        path: &AttributePath,
        requires_replace: &mut Vec<AttributePath>,
        diags: &mut Diagnostics,
    ) -> HashMap<String, Dynamic> {
        let mut out = HashMap::with_capacity(attrs.len());

        for attr in attrs {
            let attr_path = path.clone().attribute(&attr.name);
            let supplied = proposed.get(&attr.name).unwrap_or(&NULL);
            let prior_value = prior.and_then(|p| p.get(&attr.name));
            let value = self.reconcile_attribute(
                attr,
                supplied,
                prior_value,
                updating,
                &attr_path,
                requires_replace,
                diags,
            );
            out.insert(attr.name.clone(), value);
        }

        for attr in attrs {
            check_dependencies(attr, proposed, &out, true, path, diags);
        }

        if updating {
            for attr in attrs.iter().filter(|a| !a.plan_modifiers.is_empty()) {
                let attr_path = path.clone().attribute(&attr.name);
                let state = prior
                    .and_then(|p| p.get(&attr.name))
                    .cloned()
                    .unwrap_or(Dynamic::Null);
                let config = proposed.get(&attr.name).cloned().unwrap_or(Dynamic::Null);
                let mut plan = out.remove(&attr.name).unwrap_or(Dynamic::Null);

                for modifier in &attr.plan_modifiers {
                    let response = modifier.modify_plan(PlanModifyRequest {
                        state: state.clone(),
                        plan,
                        config: config.clone(),
                        attribute_path: attr_path.clone(),
                    });
                    plan = response.plan_value;
                    if response.requires_replace && !requires_replace.contains(&attr_path) {
                        requires_replace.push(attr_path.clone());
                    }
                    diags.extend(response.diagnostics);
                }
                out.insert(attr.name.clone(), plan);
            }
        }

        out
    }

    #[allow(clippy::too_many_arguments)]
    fn reconcile_attribute(
        &self,
        attr: &Attribute,
        supplied: &Dynamic,
        prior: Option<&Dynamic>,
        updating: bool,
        path: &AttributePath,
        requires_replace: &mut Vec<AttributePath>,
        diags: &mut Diagnostics,
    ) -> Dynamic {
        if attr.is_gated() {
            let available = if supplied.is_defined() {
                self.resolver.require_available(path, &attr.gate, diags)
            } else {
                self.resolver.is_available(&attr.gate).unwrap_or_else(|err| {
                    diags.add_attribute_error(path.clone(), INTERNAL_ERROR_SUMMARY, err.to_string());
                    false
                })
            };
            if !available {
                return Dynamic::Null;
            }
        }

        let mut value = supplied.clone();
        if value.is_unknown() {
            if let Some(default) = &attr.default {
                match default.resolve(self.resolver) {
                    Ok(Some(resolved)) => value = resolved,
                    Ok(None) => {}
                    Err(err) => {
                        diags.add_attribute_error(path.clone(), INTERNAL_ERROR_SUMMARY, err.to_string())
                    }
                }
            }
        }

        let Some(nested) = &attr.nested_type else {
            return value;
        };
        match (nested.nesting, value) {
            (NestingMode::Single, Dynamic::Map(obj)) => Dynamic::Map(self.reconcile_object(
                &nested.attributes,
                &obj,
                prior.and_then(Dynamic::as_map),
                updating,
                path,
                requires_replace,
                diags,
            )),
            (NestingMode::List | NestingMode::Set, Dynamic::List(items)) => {
                let prior_items = prior.and_then(Dynamic::as_list);
                let mut reconciled = Vec::with_capacity(items.len());
                for (idx, item) in items.into_iter().enumerate() {
                    let item = match item {
                        Dynamic::Map(obj) => Dynamic::Map(self.reconcile_object(
                            &nested.attributes,
                            &obj,
                            prior_items
                                .and_then(|l| l.get(idx))
                                .and_then(Dynamic::as_map),
                            updating,
                            &path.clone().index(idx as i64),
                            requires_replace,
                            diags,
                        )),
                        other => other,
                    };
                    reconciled.push(item);
                }
                Dynamic::List(reconciled)
            }
            (_, other) => other,
        }
    }

    fn apply_server_computed(
        &self,
        attrs: &[Attribute],
        planned: &mut HashMap<String, Dynamic>,
        prior: Option<&HashMap<String, Dynamic>>,
        invalidate: bool,
    ) {
        for attr in attrs {
            let prior_value = prior.and_then(|p| p.get(&attr.name));

            if attr.server_computed {
                let available = self.resolver.is_available(&attr.gate).unwrap_or(false);
                let value = if !available {
                    Dynamic::Null
                } else if invalidate {
                    Dynamic::Unknown
                } else {
                    prior_value.cloned().unwrap_or(Dynamic::Null)
                };
                planned.insert(attr.name.clone(), value);
                continue;
            }

            let Some(nested) = &attr.nested_type else {
                continue;
            };
            match planned.get_mut(&attr.name) {
                Some(Dynamic::Map(obj)) => self.apply_server_computed(
                    &nested.attributes,
                    obj,
                    prior_value.and_then(Dynamic::as_map),
                    invalidate,
                ),
                Some(Dynamic::List(items)) => {
                    let prior_items = prior_value.and_then(Dynamic::as_list);
                    for (idx, item) in items.iter_mut().enumerate() {
                        if let Dynamic::Map(obj) = item {
                            self.apply_server_computed(
                                &nested.attributes,
                                obj,
                                prior_items
                                    .and_then(|l| l.get(idx))
                                    .and_then(Dynamic::as_map),
                                invalidate,
                            );
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Compares planned and prior objects, ignoring server computed attributes
fn object_differs(
    attrs: &[Attribute],
    planned: &HashMap<String, Dynamic>,
    prior: &HashMap<String, Dynamic>,
) -> bool {
    attrs.iter().filter(|a| !a.server_computed).any(|attr| {
        let planned_value = planned.get(&attr.name).unwrap_or(&NULL);
        let prior_value = prior.get(&attr.name).unwrap_or(&NULL);
        value_differs(attr, planned_value, prior_value)
    })
}

fn value_differs(attr: &Attribute, planned: &Dynamic, prior: &Dynamic) -> bool {
    match (&attr.nested_type, planned, prior) {
        (Some(nested), Dynamic::Map(a), Dynamic::Map(b)) => {
            object_differs(&nested.attributes, a, b)
        }
        (Some(nested), Dynamic::List(a), Dynamic::List(b)) => {
            let item_differs = |x: &Dynamic, y: &Dynamic| match (x, y) {
                (Dynamic::Map(x), Dynamic::Map(y)) => object_differs(&nested.attributes, x, y),
                (x, y) => !x.semantically_equals(y),
            };
            if nested.nesting == NestingMode::Set {
                !same_elements(a, b, item_differs)
            } else {
                a.len() != b.len() || a.iter().zip(b).any(|(x, y)| item_differs(x, y))
            }
        }
        (None, Dynamic::List(a), Dynamic::List(b)) if matches!(attr.r#type, AttributeType::Set(_)) => {
            !same_elements(a, b, |x, y| !x.semantically_equals(y))
        }
        _ => !planned.semantically_equals(prior),
    }
}

/// Order-insensitive comparison of set elements
fn same_elements(a: &[Dynamic], b: &[Dynamic], differs: impl Fn(&Dynamic, &Dynamic) -> bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut matched = vec![false; b.len()];
    a.iter().all(|x| {
        match (0..b.len()).find(|&i| !matched[i] && !differs(x, &b[i])) {
            Some(i) => {
                matched[i] = true;
                true
            }
            None => false,
        }
    })
}
