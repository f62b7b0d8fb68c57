//! Keyed collection of every declared parameter.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::context::ParamContext;
use crate::descriptor::ParameterTypeDescriptor;
use crate::error::{Error, Result};
use crate::parameter::Parameter;
use crate::store::OverrideStore;
use crate::types::{ParameterSource, ParameterState};
use crate::Builder;

/// A registry shared between the parts of a program that read parameters.
pub type SharedRegistry = Arc<Mutex<ParameterRegistry>>;

/// Parameters keyed by internal name, in descriptor order.
#[derive(Debug, Default, Clone)]
pub struct ParameterRegistry {
    parameters: IndexMap<String, Parameter>,
}

impl ParameterRegistry {
    /// Build a registry from the context's descriptor table and default
    /// store.
    pub fn load(ctx: &ParamContext) -> Result<Self> {
        let descriptors = ctx.load_descriptors()?;
        for name in ctx.required_parameters() {
            if !descriptors.contains_key(name) {
                return Err(Error::MissingDescriptor {
                    name: name.clone(),
                    resource: ctx.descriptor_source().describe(),
                });
            }
        }
        let registry = Self::from_descriptors(descriptors.into_values(), ctx)?;
        tracing::info!(
            "Loaded {} parameters from {}",
            registry.count(),
            ctx.descriptor_source().describe()
        );
        Ok(registry)
    }

    /// Build one parameter per descriptor.
    pub fn from_descriptors<I>(descriptors: I, ctx: &ParamContext) -> Result<Self>
    where
        I: IntoIterator<Item = ParameterTypeDescriptor>,
    {
        let mut parameters = IndexMap::new();
        for descriptor in descriptors {
            if parameters.contains_key(&descriptor.name) {
                return Err(Error::DuplicateParameterName(descriptor.name));
            }
            let param = ctx
                .create_parameter(descriptor.name.clone())
                .with_rule(descriptor.rule)
                .build()?;
            parameters.insert(descriptor.name, param);
        }
        Ok(Self { parameters })
    }

    /// Re-populate from the context's current descriptors and defaults.
    ///
    /// On failure the registry keeps its previous contents.
    pub fn reload(&mut self, ctx: &ParamContext) -> Result<()> {
        *self = Self::load(ctx)?;
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Parameter> {
        self.parameters
            .get(name)
            .ok_or_else(|| Error::UnknownParameterName(name.to_owned()))
    }

    pub fn get_by_name_mut(&mut self, name: &str) -> Result<&mut Parameter> {
        self.parameters
            .get_mut(name)
            .ok_or_else(|| Error::UnknownParameterName(name.to_owned()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parameters.contains_key(name)
    }

    /// Parameter names in descriptor order.
    pub fn names(&self) -> Vec<&str> {
        self.parameters.keys().map(String::as_str).collect()
    }

    pub fn count(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    /// Assign every parameter that `overrides` has a non-empty value for.
    ///
    /// Returns the number of parameters assigned.
    pub fn apply_overrides(
        &mut self,
        overrides: &dyn OverrideStore,
        source: ParameterSource,
    ) -> Result<usize> {
        let mut applied = 0;
        for (name, param) in self.parameters.iter_mut() {
            match overrides.lookup(name) {
                Some(value) if !value.is_empty() => {
                    param.set_value(value, source)?;
                    applied += 1;
                }
                _ => {}
            }
        }
        tracing::debug!("Applied {} overrides from {}", applied, source);
        Ok(applied)
    }

    /// Validate every parameter that has a value, in descriptor order.
    ///
    /// Uninitialized parameters are reported as skipped.
    pub fn validate_all(&mut self) -> Result<ValidationReport> {
        let mut report = ValidationReport::default();
        for param in self.parameters.values_mut() {
            if param.state() == ParameterState::Uninitialized {
                report.skipped.push(param.internal_name().to_owned());
                continue;
            }
            let valid = param.validate()?;
            report.outcomes.push(ValidationOutcome {
                name: param.internal_name().to_owned(),
                display_name: param.display_name().to_owned(),
                value: param.value().unwrap_or_default().to_owned(),
                valid,
            });
        }
        Ok(report)
    }
}

/// Result of validating one parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub name: String,
    pub display_name: String,
    pub value: String,
    pub valid: bool,
}

/// Result of [`ParameterRegistry::validate_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub outcomes: Vec<ValidationOutcome>,
    pub skipped: Vec<String>,
}

impl ValidationReport {
    pub fn all_valid(&self) -> bool {
        self.skipped.is_empty() && self.outcomes.iter().all(|o| o.valid)
    }

    pub fn invalid(&self) -> impl Iterator<Item = &ValidationOutcome> {
        self.outcomes.iter().filter(|o| !o.valid)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::context::ParamContextBuilder;
    use crate::descriptor::DescriptorLoader;
    use crate::store::SettingValue;
    use crate::types::ValidationRule;

    const HEADER: &str = "InternalName\tParamType";

    fn context(rows: &[&str], defaults: &[(&str, &str)]) -> ParamContext {
        let defaults: HashMap<String, SettingValue> = defaults
            .iter()
            .map(|(k, v)| (k.to_string(), SettingValue::from(*v)))
            .collect();
        ParamContextBuilder::default()
            .with_descriptor_loader(Arc::new(DescriptorLoader::new()))
            .with_descriptor_rows(rows.iter().copied())
            .with_defaults(defaults)
            .build()
            .unwrap()
    }

    #[test]
    fn test_load_one_parameter_per_row() {
        let ctx = context(
            &[
                HEADER,
                "LogDir\tMustBeExistingDirectory",
                "ConfigFile\tMustBeExistingFile",
                "ReportFile\tMustNotExistAsFile",
            ],
            &[],
        );
        let registry = ParameterRegistry::load(&ctx).unwrap();
        assert_eq!(registry.count(), 3);
        assert_eq!(registry.names(), ["LogDir", "ConfigFile", "ReportFile"]);
        assert_eq!(
            registry.get_by_name("ConfigFile").unwrap().rule(),
            ValidationRule::MustBeExistingFile
        );
    }

    #[test]
    fn test_unknown_name() {
        let ctx = context(&[HEADER, "LogDir\tMustBeExistingDirectory"], &[]);
        let mut registry = ParameterRegistry::load(&ctx).unwrap();
        assert!(matches!(
            registry.get_by_name("logdir"),
            Err(Error::UnknownParameterName(ref n)) if n == "logdir"
        ));
        assert!(registry.get_by_name_mut("Other").is_err());
        assert!(registry.contains("LogDir"));
    }

    #[test]
    fn test_from_descriptors_rejects_duplicates() {
        let ctx = context(&[], &[]);
        let descriptor = ParameterTypeDescriptor {
            name: "LogDir".into(),
            rule: ValidationRule::MustBeExistingDirectory,
        };
        let err = ParameterRegistry::from_descriptors([descriptor.clone(), descriptor], &ctx)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameterName(ref n) if n == "LogDir"));
    }

    #[test]
    fn test_duplicate_rows_fail_load() {
        let ctx = context(
            &[
                HEADER,
                "LogDir\tMustBeExistingDirectory",
                "LogDir\tMustBeExistingDirectory",
            ],
            &[],
        );
        assert!(matches!(
            ParameterRegistry::load(&ctx),
            Err(Error::DuplicateParameterName(_))
        ));
    }

    #[test]
    fn test_apply_overrides_only_touches_named() {
        let ctx = context(
            &[
                HEADER,
                "LogDir\tMustBeExistingDirectory",
                "OutFile\tMustNotExistAsFile",
                "InFile\tMustBeExistingFile",
            ],
            &[("InFile", "/etc/hosts")],
        );
        let mut registry = ParameterRegistry::load(&ctx).unwrap();

        let mut overrides = HashMap::new();
        overrides.insert("LogDir".to_string(), "/tmp".to_string());
        overrides.insert("OutFile".to_string(), String::new());
        overrides.insert("Unrelated".to_string(), "x".to_string());

        let applied = registry
            .apply_overrides(&overrides, ParameterSource::FromOverrideStore)
            .unwrap();
        assert_eq!(applied, 1);

        let log_dir = registry.get_by_name("LogDir").unwrap();
        assert_eq!(log_dir.value(), Some("/tmp"));
        assert_eq!(log_dir.source(), ParameterSource::FromOverrideStore);

        let out_file = registry.get_by_name("OutFile").unwrap();
        assert_eq!(out_file.state(), ParameterState::Uninitialized);

        let in_file = registry.get_by_name("InFile").unwrap();
        assert_eq!(in_file.value(), Some("/etc/hosts"));
        assert_eq!(in_file.source(), ParameterSource::FromDefaultStore);
    }

    #[test]
    fn test_validate_all_reports_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap().to_string();
        let missing = dir.path().join("missing.cfg");
        let missing_str = missing.to_str().unwrap().to_string();

        let ctx = context(
            &[
                HEADER,
                "LogDir\tMustBeExistingDirectory",
                "ConfigFile\tMustBeExistingFile",
                "OutFile\tMustNotExistAsFile",
            ],
            &[("LogDir", &dir_str), ("ConfigFile", &missing_str)],
        );
        let mut registry = ParameterRegistry::load(&ctx).unwrap();
        let report = registry.validate_all().unwrap();

        assert_eq!(report.skipped, ["OutFile"]);
        assert_eq!(report.outcomes.len(), 2);
        assert!(report.outcomes[0].valid);
        assert!(!report.outcomes[1].valid);
        assert!(!report.all_valid());
        assert_eq!(report.invalid().count(), 1);

        assert_eq!(
            registry.get_by_name("LogDir").unwrap().state(),
            ParameterState::Validated
        );
        assert_eq!(
            registry.get_by_name("ConfigFile").unwrap().state(),
            ParameterState::Initialized
        );
    }

    #[test]
    fn test_validate_all_aborts_on_undefined_rule() {
        let ctx = context(
            &[HEADER, "Mystery\tUndefined"],
            &[("Mystery", "/tmp")],
        );
        let mut registry = ParameterRegistry::load(&ctx).unwrap();
        assert!(matches!(
            registry.validate_all(),
            Err(Error::UnsupportedValidationRule { .. })
        ));
    }
}
