use crate::types::{AttributePath, Diagnostics, Dynamic};

#[derive(Debug, Clone)]
pub struct PlanModifyRequest {
    pub state: Dynamic,
    pub plan: Dynamic,
    pub config: Dynamic,
    pub attribute_path: AttributePath,
}

#[derive(Debug, Clone)]
pub struct PlanModifyResponse {
    pub plan_value: Dynamic,
    pub requires_replace: bool,
    pub diagnostics: Diagnostics,
}

/// Trait for modifying terraform plan behavior
///
/// Plan modifiers run on update plans, after version gating and defaults,
/// and can:
/// - Modify the planned value
/// - Mark an attribute as requiring replacement
/// - Add warnings or errors to the plan
pub trait PlanModifier: Send + Sync {
    fn description(&self) -> String;
    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse;
}

/// Marks an attribute as requiring replacement when it changes
pub struct RequiresReplaceIfChanged;

impl RequiresReplaceIfChanged {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for RequiresReplaceIfChanged {
    fn description(&self) -> String {
        "changing this value forces a new resource".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let requires_replace = !matches!(
            (&request.state, &request.plan),
            (Dynamic::Null, Dynamic::Null) | (Dynamic::Unknown, _) | (_, Dynamic::Unknown)
        ) && !request.state.semantically_equals(&request.plan);

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// A plan modifier that uses the prior state value when the planned value is unknown
///
/// Use for computed attributes the server assigns once and never changes,
/// so they don't show as "known after apply" on every update.
pub struct UseStateForUnknown;

impl UseStateForUnknown {
    pub fn create() -> Box<dyn PlanModifier> {
        Box::new(Self)
    }
}

impl PlanModifier for UseStateForUnknown {
    fn description(&self) -> String {
        "keeps the prior state value while the plan value is unknown".to_string()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let plan_value = match (&request.plan, &request.state) {
            (Dynamic::Unknown, state) if !state.is_null() => state.clone(),
            _ => request.plan,
        };

        PlanModifyResponse {
            plan_value,
            requires_replace: false,
            diagnostics: Diagnostics::new(),
        }
    }
}

pub struct RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    predicate: F,
    description: String,
}

impl<F> RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    pub fn new(predicate: F, description: impl Into<String>) -> Self {
        Self {
            predicate,
            description: description.into(),
        }
    }
}

impl<F> PlanModifier for RequiresReplaceIf<F>
where
    F: Fn(&PlanModifyRequest) -> bool + Send + Sync,
{
    fn description(&self) -> String {
        self.description.clone()
    }

    fn modify_plan(&self, request: PlanModifyRequest) -> PlanModifyResponse {
        let mut diagnostics = Diagnostics::new();
        let requires_replace = (self.predicate)(&request);

        if requires_replace {
            diagnostics.add_attribute_warning(
                request.attribute_path.clone(),
                format!(
                    "Attribute '{}' requires resource replacement",
                    request.attribute_path
                ),
                &self.description,
            );
        }

        PlanModifyResponse {
            plan_value: request.plan,
            requires_replace,
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(state: Dynamic, plan: Dynamic) -> PlanModifyRequest {
        PlanModifyRequest {
            config: plan.clone(),
            state,
            plan,
            attribute_path: AttributePath::new("client_id"),
        }
    }

    #[test]
    fn requires_replace_if_changed_does_not_trigger_on_same_value() {
        let response = RequiresReplaceIfChanged
            .modify_plan(request(Dynamic::string("hello"), Dynamic::string("hello")));

        assert!(!response.requires_replace);
        assert!(response.diagnostics.is_empty());
    }

    #[test]
    fn requires_replace_if_changed_triggers_on_different_value() {
        let response = RequiresReplaceIfChanged
            .modify_plan(request(Dynamic::string("hello"), Dynamic::string("world")));

        assert!(response.requires_replace);
    }

    #[test]
    fn requires_replace_if_changed_ignores_null_and_unknown() {
        assert!(
            !RequiresReplaceIfChanged
                .modify_plan(request(Dynamic::Null, Dynamic::Null))
                .requires_replace
        );
        assert!(
            !RequiresReplaceIfChanged
                .modify_plan(request(Dynamic::Unknown, Dynamic::string("v")))
                .requires_replace
        );
        assert!(
            !RequiresReplaceIfChanged
                .modify_plan(request(Dynamic::string("v"), Dynamic::Unknown))
                .requires_replace
        );
    }

    #[test]
    fn use_state_for_unknown_preserves_state_when_unknown() {
        let response = UseStateForUnknown
            .modify_plan(request(Dynamic::string("existing"), Dynamic::Unknown));
        assert_eq!(response.plan_value, Dynamic::string("existing"));
    }

    #[test]
    fn use_state_for_unknown_keeps_explicit_null_and_known_values() {
        let response =
            UseStateForUnknown.modify_plan(request(Dynamic::string("existing"), Dynamic::Null));
        assert_eq!(response.plan_value, Dynamic::Null);

        let response = UseStateForUnknown
            .modify_plan(request(Dynamic::string("existing"), Dynamic::string("new")));
        assert_eq!(response.plan_value, Dynamic::string("new"));

        let response = UseStateForUnknown.modify_plan(request(Dynamic::Null, Dynamic::Unknown));
        assert!(response.plan_value.is_unknown());
    }

    #[test]
    fn requires_replace_if_triggers_on_condition() {
        let modifier = RequiresReplaceIf::new(
            |req| {
                matches!((&req.state, &req.plan),
                    (Dynamic::String(old), Dynamic::String(new)) if !old.is_empty() && new.is_empty()
                )
            },
            "Cannot change to empty string without replacement",
        );

        let response = modifier.modify_plan(request(Dynamic::string("has-value"), Dynamic::string("")));
        assert!(response.requires_replace);
        assert_eq!(response.diagnostics.warnings.len(), 1);

        let response = modifier.modify_plan(request(Dynamic::string(""), Dynamic::string("new")));
        assert!(!response.requires_replace);
        assert!(response.diagnostics.warnings.is_empty());
    }
}
