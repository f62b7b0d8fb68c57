use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::{
    Builder,
    descriptor::{DescriptorLoader, DescriptorSource, ParameterTypeDescriptor},
    error::Result,
    parameter::ParameterBuilder,
    registry::{ParameterRegistry, SharedRegistry},
    resolver::DefaultResolver,
    store::{DefaultStore, EmptyDefaults, JsonSettings, NoStrings, SettingValue, StringResources},
    types::ParameterSource,
};

/// JSON settings file used when no default store is configured.
pub const DEFAULTS_FILE_ENV: &str = "OP_PARAMS_DEFAULTS_FILE";

/// Descriptor table used when no descriptor source is configured.
pub const DESCRIPTOR_FILE_ENV: &str = "OP_PARAMS_DESCRIPTOR_FILE";

pub struct ParamContextBuilder {
    defaults: Option<Arc<dyn DefaultStore>>,
    defaults_file: Option<PathBuf>,
    strings: Arc<dyn StringResources>,
    descriptors: Option<DescriptorSource>,
    loader: Arc<DescriptorLoader>,
    display_name_template: Option<String>,
    default_source: ParameterSource,
    required: Vec<String>,
}

impl Default for ParamContextBuilder {
    fn default() -> Self {
        Self {
            defaults: None,
            defaults_file: None,
            strings: Arc::new(NoStrings),
            descriptors: None,
            loader: DescriptorLoader::shared(),
            display_name_template: None,
            default_source: ParameterSource::FromDefaultStore,
            required: Vec::new(),
        }
    }
}

impl ParamContextBuilder {
    /// Use `store` for default values
    pub fn with_defaults<S: DefaultStore + 'static>(mut self, store: S) -> Self {
        self.defaults = Some(Arc::new(store));
        self
    }

    /// Read default values from a JSON settings file when the context is built
    pub fn with_defaults_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.defaults_file = Some(path.into());
        self
    }

    pub fn with_strings<S: StringResources + 'static>(mut self, strings: S) -> Self {
        self.strings = Arc::new(strings);
        self
    }

    pub fn with_descriptor_source(mut self, source: DescriptorSource) -> Self {
        self.descriptors = Some(source);
        self
    }

    pub fn with_descriptor_rows<I, S>(self, rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_descriptor_source(DescriptorSource::Rows(
            rows.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_descriptor_text<S: Into<String>>(self, text: S) -> Self {
        self.with_descriptor_source(DescriptorSource::Text(text.into()))
    }

    pub fn with_embedded_descriptors(self, text: &'static str) -> Self {
        self.with_descriptor_source(DescriptorSource::Embedded(text))
    }

    pub fn with_descriptor_file<P: Into<PathBuf>>(self, path: P) -> Self {
        self.with_descriptor_source(DescriptorSource::File(path.into()))
    }

    /// Parse descriptors with `loader` instead of the process-wide one
    pub fn with_descriptor_loader(mut self, loader: Arc<DescriptorLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Display-name template applied to every parameter, e.g.
    /// `PARAM_DISPLAY_NAME_{0}`
    pub fn with_display_name_template<S: Into<String>>(mut self, template: S) -> Self {
        self.display_name_template = Some(template.into());
        self
    }

    /// Source tag recorded on parameters whose value comes from the defaults
    pub fn with_default_source(mut self, source: ParameterSource) -> Self {
        self.default_source = source;
        self
    }

    /// Names that must appear in the descriptor table
    pub fn with_required_parameters<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }
}

impl Builder for ParamContextBuilder {
    type Output = ParamContext;

    fn build(self) -> Result<ParamContext> {
        // Priority order:
        // 1. Store or file passed to the builder
        // 2. OP_PARAMS_DEFAULTS_FILE environment variable
        // 3. No defaults
        let defaults: Arc<dyn DefaultStore> = if let Some(store) = self.defaults {
            store
        } else if let Some(ref path) = self.defaults_file {
            Arc::new(JsonSettings::from_file(path)?)
        } else if let Ok(path) = std::env::var(DEFAULTS_FILE_ENV) {
            tracing::debug!("Reading defaults from {}={}", DEFAULTS_FILE_ENV, path);
            Arc::new(JsonSettings::from_file(path)?)
        } else {
            Arc::new(EmptyDefaults)
        };

        let descriptors = if let Some(source) = self.descriptors {
            source
        } else if let Ok(path) = std::env::var(DESCRIPTOR_FILE_ENV) {
            tracing::debug!("Reading descriptors from {}={}", DESCRIPTOR_FILE_ENV, path);
            DescriptorSource::File(path.into())
        } else {
            tracing::warn!("No descriptor table configured; the registry will be empty");
            DescriptorSource::default()
        };

        Ok(ParamContext {
            defaults: DefaultResolver::new(defaults),
            strings: self.strings,
            descriptors,
            loader: self.loader,
            display_name_template: self.display_name_template,
            default_source: self.default_source,
            required: self.required,
            registry: Mutex::new(None),
        })
    }
}

/// Every collaborator needed to resolve parameters, plus the shared registry.
pub struct ParamContext {
    defaults: DefaultResolver,
    strings: Arc<dyn StringResources>,
    descriptors: DescriptorSource,
    loader: Arc<DescriptorLoader>,
    display_name_template: Option<String>,
    default_source: ParameterSource,
    required: Vec<String>,
    registry: Mutex<Option<SharedRegistry>>,
}

impl ParamContext {
    /// A parameter builder wired to this context's defaults, strings,
    /// display-name template and default source.
    pub fn create_parameter<S: Into<String>>(&self, name: S) -> ParameterBuilder {
        let builder = ParameterBuilder::new(name)
            .with_defaults(self.defaults.clone())
            .with_strings(self.strings.clone())
            .with_default_source(self.default_source);
        match &self.display_name_template {
            Some(template) => builder.with_display_name(template.clone()),
            None => builder,
        }
    }

    pub fn defaults(&self) -> &DefaultResolver {
        &self.defaults
    }

    /// Every entry of the default store, sorted by name.
    pub fn default_settings(&self) -> Result<Vec<(String, SettingValue)>> {
        self.defaults.store().entries()
    }

    pub fn descriptor_source(&self) -> &DescriptorSource {
        &self.descriptors
    }

    pub fn required_parameters(&self) -> &[String] {
        &self.required
    }

    pub fn default_source(&self) -> ParameterSource {
        self.default_source
    }

    /// Read and parse the descriptor table.
    pub fn load_descriptors(&self) -> Result<IndexMap<String, ParameterTypeDescriptor>> {
        let rows = self.descriptors.rows()?;
        self.loader.parse(&rows)
    }

    /// The registry shared by every caller of this context.
    ///
    /// The first call loads it; concurrent first callers wait for that load
    /// and receive the same instance. Use [`ParameterRegistry::reload`] to
    /// re-populate it.
    pub fn registry(&self) -> Result<SharedRegistry> {
        let mut slot = self.registry.lock();
        if let Some(registry) = slot.as_ref() {
            return Ok(registry.clone());
        }
        let registry = Arc::new(Mutex::new(ParameterRegistry::load(self)?));
        *slot = Some(registry.clone());
        Ok(registry)
    }
}
