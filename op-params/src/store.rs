//! Name-keyed collaborators consulted while resolving parameters.
//!
//! - [`DefaultStore`]: the host application's baseline settings, typed
//! - [`OverrideStore`]: runtime values such as command-line arguments
//! - [`StringResources`]: localized strings used for display names

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

/// A typed value held by a [`DefaultStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    String(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Structured(serde_json::Value),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Structured(serde_json::Value::Array(_)) => "array",
            Self::Structured(_) => "object",
        }
    }

    /// Convert a JSON value. `null` has no setting value.
    pub fn from_json(value: serde_json::Value) -> Option<Self> {
        use serde_json::Value;
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::String(s) => Some(Self::String(s)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(Self::Integer(i)),
                None => n.as_f64().map(Self::Float),
            },
            other => Some(Self::Structured(other)),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Structured(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Baseline settings of the host application.
pub trait DefaultStore: Send + Sync {
    /// Look up a setting. `Ok(None)` means the store has no such entry.
    fn lookup(&self, name: &str) -> Result<Option<SettingValue>>;

    /// Every setting in the store, sorted by name.
    fn entries(&self) -> Result<Vec<(String, SettingValue)>>;
}

/// A default store with no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyDefaults;

impl DefaultStore for EmptyDefaults {
    fn lookup(&self, _name: &str) -> Result<Option<SettingValue>> {
        Ok(None)
    }

    fn entries(&self) -> Result<Vec<(String, SettingValue)>> {
        Ok(Vec::new())
    }
}

impl DefaultStore for HashMap<String, SettingValue> {
    fn lookup(&self, name: &str) -> Result<Option<SettingValue>> {
        Ok(self.get(name).cloned())
    }

    fn entries(&self) -> Result<Vec<(String, SettingValue)>> {
        let mut entries: Vec<_> = self.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

/// Settings read from a flat JSON object.
///
/// ```json
/// { "LogDir": "/var/log", "Retries": 3 }
/// ```
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(transparent)]
pub struct JsonSettings {
    values: BTreeMap<String, serde_json::Value>,
}

impl JsonSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| Error::Json {
            origin: path.display().to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromStr for JsonSettings {
    type Err = Error;

    fn from_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| Error::Json {
            origin: "<inline>".to_string(),
            source,
        })
    }
}

impl DefaultStore for JsonSettings {
    fn lookup(&self, name: &str) -> Result<Option<SettingValue>> {
        Ok(self
            .values
            .get(name)
            .cloned()
            .and_then(SettingValue::from_json))
    }

    fn entries(&self) -> Result<Vec<(String, SettingValue)>> {
        Ok(self
            .values
            .iter()
            .filter_map(|(k, v)| SettingValue::from_json(v.clone()).map(|v| (k.clone(), v)))
            .collect())
    }
}

/// Runtime values that take precedence over defaults.
pub trait OverrideStore {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl OverrideStore for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl OverrideStore for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Localized strings, looked up by resource name.
pub trait StringResources: Send + Sync {
    fn lookup(&self, name: &str) -> Option<String>;
}

/// A string resource set with no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStrings;

impl StringResources for NoStrings {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

impl StringResources for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Two-column, tab-delimited string table: resource name, then text.
///
/// Lines starting with `#` are comments. Rows with fewer than two columns are
/// ignored.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    strings: HashMap<String, String>,
}

impl StringTable {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .quote(b'"')
            .comment(Some(b'#'))
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut strings = HashMap::new();
        for record in reader.records() {
            let record = record?;
            match (record.get(0), record.get(1)) {
                (Some(name), Some(value)) if !name.is_empty() => {
                    strings.insert(name.to_owned(), value.to_owned());
                }
                _ => tracing::debug!("Skipping string table row {:?}", record),
            }
        }
        Ok(Self { strings })
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl StringResources for StringTable {
    fn lookup(&self, name: &str) -> Option<String> {
        self.strings.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_settings_types() {
        let settings: JsonSettings = r#"{
            "LogDir": "/var/log",
            "Retries": 3,
            "Ratio": 0.5,
            "Enabled": true,
            "Missing": null,
            "List": [1, 2]
        }"#
        .parse()
        .unwrap();

        assert_eq!(
            settings.lookup("LogDir").unwrap(),
            Some(SettingValue::String("/var/log".into()))
        );
        assert_eq!(settings.lookup("Retries").unwrap(), Some(SettingValue::Integer(3)));
        assert_eq!(settings.lookup("Ratio").unwrap(), Some(SettingValue::Float(0.5)));
        assert_eq!(settings.lookup("Enabled").unwrap(), Some(SettingValue::Bool(true)));
        assert_eq!(settings.lookup("Missing").unwrap(), None);
        assert_eq!(settings.lookup("Nope").unwrap(), None);
        assert_eq!(settings.lookup("List").unwrap().unwrap().type_name(), "array");
    }

    #[test]
    fn test_json_settings_entries_sorted_without_nulls() {
        let settings: JsonSettings = r#"{"b": "2", "a": "1", "c": null}"#.parse().unwrap();
        let names: Vec<_> = settings.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(settings.len(), 3);
    }

    #[test]
    fn test_json_settings_rejects_non_object() {
        let err = "[1, 2]".parse::<JsonSettings>().unwrap_err();
        assert!(matches!(err, Error::Json { .. }));
    }

    #[test]
    fn test_json_settings_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonSettings::from_file(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_string_table_parse() {
        let table = StringTable::parse(
            "# display names\nPARAM_DISPLAY_NAME_LogDir\tLog directory\n\"PARAM_DISPLAY_NAME_Out\"\t\"Output, file\"\nlonely\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup("PARAM_DISPLAY_NAME_LogDir").as_deref(),
            Some("Log directory")
        );
        assert_eq!(table.lookup("PARAM_DISPLAY_NAME_Out").as_deref(), Some("Output, file"));
        assert_eq!(table.lookup("lonely"), None);
    }

    #[test]
    fn test_map_stores() {
        let mut defaults = HashMap::new();
        defaults.insert("b".to_string(), SettingValue::from("2"));
        defaults.insert("a".to_string(), SettingValue::Integer(1));
        let names: Vec<_> = defaults.entries().unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["a", "b"]);

        let mut overrides = BTreeMap::new();
        overrides.insert("LogDir".to_string(), "/tmp".to_string());
        assert_eq!(OverrideStore::lookup(&overrides, "LogDir").as_deref(), Some("/tmp"));
        assert_eq!(OverrideStore::lookup(&overrides, "logdir"), None);
    }
}
