//! Lifecycle, origin and validation-rule enumerations shared by every
//! parameter.

use std::path::Path;

/// Lifecycle of a parameter value.
///
/// `Uninitialized` until a value arrives from the default store or an
/// override, `Validated` after a successful [`crate::Parameter::validate`].
#[derive(
    Default, Debug, Hash, strum::EnumString, strum::Display, Eq, PartialEq, Ord, PartialOrd, Clone, Copy,
)]
pub enum ParameterState {
    #[default]
    Uninitialized,
    Initialized,
    Validated,
}

/// Where the current value of a parameter came from.
#[derive(Default, Debug, Hash, strum::EnumString, strum::Display, Eq, PartialEq, Clone, Copy)]
pub enum ParameterSource {
    #[default]
    Undefined,
    #[strum(to_string = "FromDefaultStore", serialize = "ApplicationSettings")]
    FromDefaultStore,
    #[strum(to_string = "FromOverrideStore", serialize = "CommandLine")]
    FromOverrideStore,
}

/// Filesystem predicate applied to a parameter value.
///
/// Parsed case-sensitively from the `ParamType` descriptor column. The short
/// names (`ExistingDirectory`, `ExistingFile`, `NewFile`) are accepted as
/// aliases.
#[derive(
    Default, Debug, Hash, strum::EnumString, strum::Display, strum::EnumIter, Eq, PartialEq, Clone, Copy,
)]
pub enum ValidationRule {
    #[default]
    Undefined,
    #[strum(to_string = "MustBeExistingDirectory", serialize = "ExistingDirectory")]
    MustBeExistingDirectory,
    #[strum(to_string = "MustBeExistingFile", serialize = "ExistingFile")]
    MustBeExistingFile,
    #[strum(to_string = "MustNotExistAsFile", serialize = "NewFile")]
    MustNotExistAsFile,
}

impl ValidationRule {
    /// Apply the rule to `value`.
    ///
    /// Returns `None` for [`ValidationRule::Undefined`], which has no
    /// predicate. Only reads filesystem metadata.
    pub fn check(self, value: &str) -> Option<bool> {
        let path = Path::new(value);
        match self {
            Self::Undefined => None,
            Self::MustBeExistingDirectory => Some(path.is_dir()),
            Self::MustBeExistingFile => Some(path.is_file()),
            // A directory at the path does not count as an existing file
            Self::MustNotExistAsFile => Some(!path.is_file()),
        }
    }
}
