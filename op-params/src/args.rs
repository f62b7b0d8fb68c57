//! Command-line arguments as an [`OverrideStore`].
//!
//! Accepted forms, for a registered parameter `LogDir`:
//!
//! ```text
//! LogDir=/var/log   -LogDir=/var/log   --LogDir=/var/log   /LogDir:/var/log
//! ```

use std::collections::HashMap;

use crate::store::OverrideStore;

/// How argument names are matched against parameter names.
#[derive(Default, Debug, Hash, strum::EnumString, strum::Display, Eq, PartialEq, Clone, Copy)]
pub enum ArgMatching {
    CaseSensitive,
    #[default]
    CaseInsensitive,
}

/// Arguments parsed against a fixed set of parameter names.
#[derive(Debug, Default, Clone)]
pub struct CommandLineArgs {
    values: HashMap<String, String>,
    unrecognized: Vec<String>,
}

impl CommandLineArgs {
    /// Parse `args`, keeping values for names in `valid_names`.
    ///
    /// Values are stored under the registered spelling of the name. When an
    /// argument repeats, the last one wins. Arguments that are not
    /// `name=value` pairs for a registered name end up in
    /// [`CommandLineArgs::unrecognized`].
    pub fn parse<N, A, S>(valid_names: N, args: A, matching: ArgMatching) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let valid_names: Vec<String> = valid_names
            .into_iter()
            .map(|n| n.as_ref().to_owned())
            .collect();
        let mut parsed = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            let Some((name, value)) = split_arg(arg) else {
                tracing::warn!("Ignoring argument {:?}: expected name=value", arg);
                parsed.unrecognized.push(arg.to_owned());
                continue;
            };
            let registered = valid_names.iter().find(|candidate| match matching {
                ArgMatching::CaseSensitive => candidate.as_str() == name,
                ArgMatching::CaseInsensitive => candidate.eq_ignore_ascii_case(name),
            });
            match registered {
                Some(registered) => {
                    tracing::debug!("Argument: {} = {:?}", registered, value);
                    parsed.values.insert(registered.clone(), value.to_owned());
                }
                None => {
                    tracing::warn!("Ignoring argument {:?}: '{}' is not a parameter", arg, name);
                    parsed.unrecognized.push(arg.to_owned());
                }
            }
        }
        parsed
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn unrecognized(&self) -> &[String] {
        &self.unrecognized
    }
}

fn split_arg(arg: &str) -> Option<(&str, &str)> {
    let (name, value) = if let Some(rest) = arg.strip_prefix('/') {
        rest.split_once(':')?
    } else {
        arg.trim_start_matches('-').split_once('=')?
    };
    if name.is_empty() {
        return None;
    }
    Some((name, value))
}

impl OverrideStore for CommandLineArgs {
    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}
