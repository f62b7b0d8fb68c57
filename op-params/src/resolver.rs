//! Default-value resolution against the host application's settings.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::{DefaultStore, EmptyDefaults, SettingValue};

/// Values are kept as strings; any other stored type is a misconfiguration.
const EXPECTED_TYPE: &str = "string";

/// Looks up a parameter's default in a [`DefaultStore`].
///
/// Cheap to clone; every clone shares the same store.
#[derive(Clone)]
pub struct DefaultResolver {
    store: Arc<dyn DefaultStore>,
}

impl DefaultResolver {
    pub fn new(store: Arc<dyn DefaultStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DefaultStore {
        self.store.as_ref()
    }

    /// Resolve the default for `name`.
    ///
    /// Not found is `Ok(None)`. A stored value that is not a string fails
    /// with [`Error::DefaultTypeMismatch`]; other store failures are returned
    /// as-is.
    pub fn resolve(&self, name: &str) -> Result<Option<String>> {
        match self.store.lookup(name)? {
            None => {
                tracing::debug!("No default for parameter '{}'", name);
                Ok(None)
            }
            Some(SettingValue::String(value)) => {
                tracing::debug!("Default: {} = {:?}", name, value);
                Ok(Some(value))
            }
            Some(other) => Err(Error::DefaultTypeMismatch {
                name: name.to_owned(),
                stored_type: other.type_name(),
                expected_type: EXPECTED_TYPE,
                value: other.to_string(),
            }),
        }
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new(Arc::new(EmptyDefaults))
    }
}

impl std::fmt::Debug for DefaultResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultResolver").finish_non_exhaustive()
    }
}
