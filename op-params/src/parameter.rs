//! A single operating parameter: value, origin, lifecycle and validation.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::resolver::DefaultResolver;
use crate::store::{NoStrings, StringResources};
use crate::types::{ParameterSource, ParameterState, ValidationRule};
use crate::Builder;

/// Placeholder for the internal name in a display-name template.
pub const DISPLAY_NAME_SUBSTITUTION_TOKEN: &str = "{0}";

/// Rendering of an absent string value.
const RENDERED_NULL: &str = "[Null]";

/// One named operating parameter.
///
/// Invariants: `internal_name` is non-empty and never changes; `value` is
/// absent exactly when the state is [`ParameterState::Uninitialized`]; a
/// saved default only exists when the default store supplied the value that
/// was later overridden.
#[derive(Debug, Clone)]
pub struct Parameter {
    internal_name: String,
    display_name: String,
    value: Option<String>,
    saved_default_value: Option<String>,
    source: ParameterSource,
    state: ParameterState,
    rule: ValidationRule,
    has_default_from_store: bool,
}

impl Parameter {
    pub fn builder<S: Into<String>>(internal_name: S) -> ParameterBuilder {
        ParameterBuilder::new(internal_name)
    }

    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// The default that was replaced by the first override, if any.
    pub fn saved_default_value(&self) -> Option<&str> {
        self.saved_default_value.as_deref()
    }

    pub fn source(&self) -> ParameterSource {
        self.source
    }

    pub fn state(&self) -> ParameterState {
        self.state
    }

    pub fn rule(&self) -> ValidationRule {
        self.rule
    }

    pub fn has_default_from_store(&self) -> bool {
        self.has_default_from_store
    }

    /// Assign a new value from `source`.
    ///
    /// The first override of a store default keeps that default in
    /// [`Parameter::saved_default_value`]; later assignments leave it alone.
    /// Any assignment returns a validated parameter to
    /// [`ParameterState::Initialized`].
    pub fn set_value<S: Into<String>>(&mut self, value: S, source: ParameterSource) -> Result<()> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::EmptyValue {
                name: self.internal_name.clone(),
            });
        }

        if self.has_default_from_store && self.saved_default_value.is_none() {
            self.saved_default_value = self.value.take();
        }
        if self.state != ParameterState::Initialized {
            tracing::debug!(
                "Parameter '{}' {} -> {}",
                self.internal_name,
                self.state,
                ParameterState::Initialized
            );
        }
        self.state = ParameterState::Initialized;

        tracing::debug!("Set: {} = {:?} ({})", self.internal_name, value, source);
        self.value = Some(value);
        self.source = source;
        Ok(())
    }

    /// Apply the validation rule to the current value.
    ///
    /// On success the parameter becomes [`ParameterState::Validated`]; on
    /// failure its state is unchanged. Fails with
    /// [`Error::UnsupportedValidationRule`] when the rule is undefined and
    /// [`Error::ValueNotSet`] when there is no value.
    pub fn validate(&mut self) -> Result<bool> {
        let value = self
            .value
            .as_deref()
            .ok_or_else(|| Error::ValueNotSet(self.internal_name.clone()))?;
        let valid = self
            .rule
            .check(value)
            .ok_or_else(|| Error::UnsupportedValidationRule {
                name: self.internal_name.clone(),
                rule: self.rule,
            })?;

        tracing::debug!(
            "Validate: {} = {:?} against {} -> {}",
            self.internal_name,
            value,
            self.rule,
            valid
        );
        if valid {
            self.state = ParameterState::Validated;
        }
        Ok(valid)
    }

    /// Order by current value; an absent value sorts first.
    pub fn compare_value(&self, other: &Parameter) -> Ordering {
        self.value.cmp(&other.value)
    }
}

fn render(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => RENDERED_NULL,
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parameter: InternalName = {}", self.internal_name)?;
        writeln!(f, "           DisplayName = {}", render(Some(&self.display_name)))?;
        writeln!(f, "           ParamValue = {}", render(self.value()))?;
        writeln!(f, "           ParamType = {}", self.rule)?;
        writeln!(f, "           HasDefaultFromStore = {}", self.has_default_from_store)?;
        writeln!(f, "           ParamState = {}", self.state)?;
        writeln!(f, "           ParamSource = {}", self.source)?;
        write!(f, "           SavedDefaultValue = {}", render(self.saved_default_value()))
    }
}

/// Builds a [`Parameter`], resolving its display name and default value.
pub struct ParameterBuilder {
    internal_name: String,
    display_name: Option<String>,
    rule: ValidationRule,
    default_source: ParameterSource,
    defaults: DefaultResolver,
    strings: Arc<dyn StringResources>,
}

impl ParameterBuilder {
    pub fn new<S: Into<String>>(internal_name: S) -> Self {
        Self {
            internal_name: internal_name.into(),
            display_name: None,
            rule: ValidationRule::default(),
            default_source: ParameterSource::FromDefaultStore,
            defaults: DefaultResolver::default(),
            strings: Arc::new(NoStrings),
        }
    }

    /// Literal display name, or a template containing
    /// [`DISPLAY_NAME_SUBSTITUTION_TOKEN`] naming a string resource.
    pub fn with_display_name<S: Into<String>>(mut self, display_name: S) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rule = rule;
        self
    }

    /// Source recorded when the default store supplies the value.
    pub fn with_default_source(mut self, source: ParameterSource) -> Self {
        self.default_source = source;
        self
    }

    pub fn with_defaults(mut self, defaults: DefaultResolver) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_strings(mut self, strings: Arc<dyn StringResources>) -> Self {
        self.strings = strings;
        self
    }

    fn resolve_display_name(&self) -> String {
        let Some(display_name) = self.display_name.as_deref().filter(|s| !s.is_empty()) else {
            return self.internal_name.clone();
        };
        if !display_name.contains(DISPLAY_NAME_SUBSTITUTION_TOKEN) {
            return display_name.to_owned();
        }

        let resource_name =
            display_name.replace(DISPLAY_NAME_SUBSTITUTION_TOKEN, &self.internal_name);
        match self.strings.lookup(&resource_name) {
            Some(s) if !s.is_empty() => s,
            _ => {
                tracing::debug!(
                    "No string resource '{}'; display name falls back to '{}'",
                    resource_name,
                    self.internal_name
                );
                self.internal_name.clone()
            }
        }
    }
}

impl Builder for ParameterBuilder {
    type Output = Parameter;

    fn build(self) -> Result<Parameter> {
        if self.internal_name.is_empty() {
            return Err(Error::EmptyInternalName);
        }
        let display_name = self.resolve_display_name();

        let mut param = Parameter {
            internal_name: self.internal_name,
            display_name,
            value: None,
            saved_default_value: None,
            source: ParameterSource::Undefined,
            state: ParameterState::Uninitialized,
            rule: self.rule,
            has_default_from_store: false,
        };
        if let Some(value) = self.defaults.resolve(&param.internal_name)? {
            param.value = Some(value);
            param.has_default_from_store = true;
            param.source = self.default_source;
            param.state = ParameterState::Initialized;
        }
        Ok(param)
    }
}
