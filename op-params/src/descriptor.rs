//! Parameter type descriptors loaded from a tab-delimited table.
//!
//! The first row names the columns, every following row describes one
//! parameter:
//!
//! ```text
//! InternalName	ParamType
//! LogDir	MustBeExistingDirectory
//! "Report File"	MustNotExistAsFile
//! ```
//!
//! Fields are separated by tabs and may be guarded by double quotes, which
//! are stripped. The column layout is resolved from the first table a
//! [`DescriptorLoader`] sees and reused for every later table.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, LazyLock, OnceLock};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::types::ValidationRule;

/// Columns a descriptor table may contain.
#[derive(Debug, Hash, strum::EnumString, strum::Display, Eq, PartialEq, Clone, Copy)]
pub enum DescriptorField {
    InternalName,
    ParamType,
}

/// Name and validation rule of one declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterTypeDescriptor {
    pub name: String,
    pub rule: ValidationRule,
}

/// Where a descriptor table comes from.
#[derive(Debug, Clone)]
pub enum DescriptorSource {
    Rows(Vec<String>),
    Text(String),
    Embedded(&'static str),
    File(PathBuf),
}

impl DescriptorSource {
    /// Row strings of the table, blank lines removed.
    pub fn rows(&self) -> Result<Vec<String>> {
        let rows = match self {
            Self::Rows(rows) => rows.clone(),
            Self::Text(text) => split_lines(text),
            Self::Embedded(text) => split_lines(text),
            Self::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                split_lines(&text)
            }
        };
        Ok(rows
            .into_iter()
            .filter(|row| !row.trim().is_empty())
            .collect())
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Rows(_) => "the supplied descriptor rows".to_string(),
            Self::Text(_) => "the supplied descriptor text".to_string(),
            Self::Embedded(_) => "the embedded descriptor table".to_string(),
            Self::File(path) => format!("descriptor file {}", path.display()),
        }
    }
}

impl Default for DescriptorSource {
    fn default() -> Self {
        Self::Rows(Vec::new())
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}

/// Split one row into its fields.
fn split_row(row: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .from_reader(row.as_bytes());

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    match records.as_slice() {
        [] => Ok(Vec::new()),
        [record] => Ok(record.iter().map(str::to_owned).collect()),
        // A row spanning several lines
        [first, ..] => Err(Error::MalformedDescriptorTable {
            expected: first.len(),
            actual: records.iter().map(csv::StringRecord::len).sum(),
            row: row.to_owned(),
        }),
    }
}

fn parse_layout(header: &str) -> Result<Vec<DescriptorField>> {
    let layout = split_row(header)?
        .iter()
        .map(|name| {
            DescriptorField::from_str(name)
                .map_err(|_| Error::UnknownDescriptorField(name.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    // Every field appears exactly once
    let fields = [DescriptorField::InternalName, DescriptorField::ParamType];
    let complete = layout.len() == fields.len()
        && fields
            .iter()
            .all(|field| layout.iter().filter(|f| *f == field).count() == 1);
    if !complete {
        return Err(Error::InvalidDescriptorHeader {
            header: header.to_owned(),
            expected: fields.map(|f| f.to_string()).join(", "),
        });
    }
    Ok(layout)
}

/// Parses descriptor tables, caching the column layout of the first one.
#[derive(Debug, Default)]
pub struct DescriptorLoader {
    layout: OnceLock<Vec<DescriptorField>>,
}

static SHARED: LazyLock<Arc<DescriptorLoader>> = LazyLock::new(|| Arc::new(DescriptorLoader::new()));

impl DescriptorLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide loader.
    pub fn shared() -> Arc<DescriptorLoader> {
        SHARED.clone()
    }

    /// The cached column layout, if a header has been parsed.
    pub fn layout(&self) -> Option<&[DescriptorField]> {
        self.layout.get().map(Vec::as_slice)
    }

    fn layout_for(&self, header: &str) -> Result<&[DescriptorField]> {
        if let Some(layout) = self.layout.get() {
            if !matches!(parse_layout(header), Ok(ref parsed) if parsed == layout) {
                tracing::warn!(
                    "Ignoring descriptor header {:?}; using cached layout {:?}",
                    header,
                    layout
                );
            }
            return Ok(layout.as_slice());
        }
        // An invalid header is never cached
        let parsed = parse_layout(header)?;
        Ok(self.layout.get_or_init(|| parsed).as_slice())
    }

    /// Parse a table into descriptors keyed by name, in row order.
    ///
    /// An empty table yields no descriptors.
    pub fn parse<S: AsRef<str>>(
        &self,
        rows: &[S],
    ) -> Result<IndexMap<String, ParameterTypeDescriptor>> {
        let Some((header, details)) = rows.split_first() else {
            return Ok(IndexMap::new());
        };
        let layout = self.layout_for(header.as_ref())?;

        let mut descriptors = IndexMap::with_capacity(details.len());
        for row in details {
            let descriptor = parse_detail(layout, row.as_ref())?;
            if descriptors.contains_key(&descriptor.name) {
                return Err(Error::DuplicateParameterName(descriptor.name));
            }
            descriptors.insert(descriptor.name.clone(), descriptor);
        }
        tracing::debug!("Parsed {} parameter descriptors", descriptors.len());
        Ok(descriptors)
    }
}

fn parse_detail(layout: &[DescriptorField], row: &str) -> Result<ParameterTypeDescriptor> {
    let fields = split_row(row)?;
    if fields.len() != layout.len() {
        return Err(Error::MalformedDescriptorTable {
            expected: layout.len(),
            actual: fields.len(),
            row: row.to_owned(),
        });
    }

    let mut name = String::new();
    let mut rule = ValidationRule::default();
    for (field, value) in layout.iter().zip(fields) {
        match field {
            DescriptorField::InternalName => name = value,
            DescriptorField::ParamType => {
                rule = ValidationRule::from_str(&value).map_err(|_| {
                    Error::InvalidValidationRule {
                        value,
                        field: field.to_string(),
                        row: row.to_owned(),
                    }
                })?;
            }
        }
    }
    Ok(ParameterTypeDescriptor { name, rule })
}

/// Parse `rows` with the process-wide [`DescriptorLoader`].
pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<IndexMap<String, ParameterTypeDescriptor>> {
    DescriptorLoader::shared().parse(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "InternalName\tParamType";

    #[test]
    fn test_parse_in_row_order() {
        let loader = DescriptorLoader::new();
        let descriptors = loader
            .parse(&[
                HEADER,
                "OutFile\tMustNotExistAsFile",
                "LogDir\tMustBeExistingDirectory",
                "\"Input File\"\t\"MustBeExistingFile\"",
            ])
            .unwrap();

        let names: Vec<_> = descriptors.keys().cloned().collect();
        assert_eq!(names, ["OutFile", "LogDir", "Input File"]);
        assert_eq!(descriptors["LogDir"].rule, ValidationRule::MustBeExistingDirectory);
        assert_eq!(descriptors["Input File"].rule, ValidationRule::MustBeExistingFile);
    }

    #[test]
    fn test_columns_in_any_order() {
        let loader = DescriptorLoader::new();
        let descriptors = loader
            .parse(&["ParamType\tInternalName", "ExistingFile\tConfigFile"])
            .unwrap();
        assert_eq!(
            descriptors["ConfigFile"],
            ParameterTypeDescriptor {
                name: "ConfigFile".into(),
                rule: ValidationRule::MustBeExistingFile,
            }
        );
    }

    #[test]
    fn test_short_row_is_malformed() {
        let loader = DescriptorLoader::new();
        let err = loader.parse(&[HEADER, "LogDir"]).unwrap_err();
        match err {
            Error::MalformedDescriptorTable {
                expected,
                actual,
                row,
            } => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
                assert_eq!(row, "LogDir");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_long_row_is_malformed() {
        let loader = DescriptorLoader::new();
        let err = loader
            .parse(&[HEADER, "LogDir\tMustBeExistingDirectory\textra"])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedDescriptorTable {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_rule_names_value_and_field() {
        let loader = DescriptorLoader::new();
        let err = loader
            .parse(&[HEADER, "LogDir\tmustbeexistingdirectory"])
            .unwrap_err();
        match err {
            Error::InvalidValidationRule { value, field, .. } => {
                assert_eq!(value, "mustbeexistingdirectory");
                assert_eq!(field, "ParamType");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_header_field_is_not_cached() {
        let loader = DescriptorLoader::new();
        let err = loader
            .parse(&["InternalName\tColor", "LogDir\tBlue"])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownDescriptorField(ref f) if f == "Color"));
        assert!(loader.layout().is_none());

        loader.parse(&[HEADER, "LogDir\tExistingDirectory"]).unwrap();
        assert_eq!(
            loader.layout(),
            Some(&[DescriptorField::InternalName, DescriptorField::ParamType][..])
        );
    }

    #[test]
    fn test_incomplete_header_is_not_cached() {
        let loader = DescriptorLoader::new();
        for header in ["ParamType", "", "InternalName\tInternalName", "InternalName\tParamType\tParamType"] {
            let err = loader.parse(&[header, "MustBeExistingFile"]).unwrap_err();
            assert!(
                matches!(err, Error::InvalidDescriptorHeader { ref expected, .. } if expected == "InternalName, ParamType"),
                "{header:?}: {err:?}"
            );
            assert!(loader.layout().is_none());
        }

        let descriptors = loader
            .parse(&[HEADER, "ConfigFile\tMustBeExistingFile"])
            .unwrap();
        assert_eq!(descriptors["ConfigFile"].rule, ValidationRule::MustBeExistingFile);
    }

    #[test]
    fn test_multi_line_row_is_malformed() {
        let loader = DescriptorLoader::new();
        let err = loader
            .parse(&[HEADER, "LogDir\tMustBeExistingDirectory\nOutFile\tNewFile"])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedDescriptorTable {
                expected: 2,
                actual: 4,
                ..
            }
        ));

        // A quoted newline stays inside its field
        let descriptors = loader
            .parse(&[HEADER, "\"Log\nDir\"\tMustBeExistingDirectory"])
            .unwrap();
        assert!(descriptors.contains_key("Log\nDir"));
    }

    #[test]
    fn test_cached_layout_ignores_new_header() {
        let loader = DescriptorLoader::new();
        loader.parse(&[HEADER, "LogDir\tMustBeExistingDirectory"]).unwrap();

        // The swapped header is ignored; rows are still read as name, rule
        let descriptors = loader
            .parse(&["ParamType\tInternalName", "OutFile\tNewFile"])
            .unwrap();
        assert_eq!(descriptors["OutFile"].rule, ValidationRule::MustNotExistAsFile);

        // Even an unknown header is ignored once a layout is cached
        let descriptors = loader.parse(&["Bogus", "Other\tExistingFile"]).unwrap();
        assert!(descriptors.contains_key("Other"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let loader = DescriptorLoader::new();
        let err = loader
            .parse(&[
                HEADER,
                "LogDir\tMustBeExistingDirectory",
                "LogDir\tMustBeExistingFile",
            ])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateParameterName(ref n) if n == "LogDir"));
    }

    #[test]
    fn test_empty_and_header_only_tables() {
        let loader = DescriptorLoader::new();
        let empty: [&str; 0] = [];
        assert!(loader.parse(&empty).unwrap().is_empty());
        assert!(loader.parse(&[HEADER]).unwrap().is_empty());
    }

    #[test]
    fn test_source_rows_skip_blank_lines() {
        let source = DescriptorSource::Text(format!(
            "{HEADER}\r\nLogDir\tMustBeExistingDirectory\r\n\r\n   \nOutFile\tNewFile\n"
        ));
        let rows = source.rows().unwrap();
        assert_eq!(
            rows,
            [HEADER, "LogDir\tMustBeExistingDirectory", "OutFile\tNewFile"]
        );
    }

    #[test]
    fn test_source_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parameter_types.tsv");
        std::fs::write(&path, format!("{HEADER}\nLogDir\tExistingDirectory\n")).unwrap();

        let source = DescriptorSource::File(path.clone());
        assert_eq!(source.rows().unwrap().len(), 2);
        assert!(source.describe().contains("parameter_types.tsv"));

        let missing = DescriptorSource::File(dir.path().join("missing.tsv"));
        assert!(matches!(missing.rows(), Err(Error::Io { .. })));
    }
}
