//! Mapping from file extensions to the adapters that read them.

use confstack_rs_core::{Adapter, ConfigError};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Builds the adapter for one discovered file.
pub type AdapterFactory = Arc<dyn Fn(&Path) -> Box<dyn Adapter> + Send + Sync>;

/// Extensions handled by one adapter factory.
#[derive(Clone)]
pub struct AdapterSpecifier {
    pub extensions: Vec<String>,
    pub factory: AdapterFactory,
}

impl AdapterSpecifier {
    /// Extensions are matched as file name suffixes; a missing leading `.` is added.
    pub fn new<I, S, F, A>(extensions: I, factory: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&Path) -> A + Send + Sync + 'static,
        A: Adapter + 'static,
    {
        Self {
            extensions: extensions.into_iter().map(Into::into).collect(),
            factory: Arc::new(move |path: &Path| -> Box<dyn Adapter> { Box::new(factory(path)) }),
        }
    }
}

impl fmt::Debug for AdapterSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterSpecifier")
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Normalized extension to factory lookup.
#[derive(Clone, Default)]
pub(crate) struct ExtensionMap {
    factories: HashMap<String, AdapterFactory>,
}

impl ExtensionMap {
    /// Fails when two specifiers claim the same extension.
    pub(crate) fn build(specifiers: &[AdapterSpecifier]) -> Result<Self, ConfigError> {
        let mut factories = HashMap::new();
        for specifier in specifiers {
            for extension in &specifier.extensions {
                let extension = normalize_extension(extension);
                if factories.contains_key(&extension) {
                    return Err(ConfigError::AmbiguousExtension { extension });
                }
                factories.insert(extension, specifier.factory.clone());
            }
        }
        Ok(Self { factories })
    }

    /// Split `file_name` into basename and the longest registered extension.
    ///
    /// The basename must be non-empty, so `.json` alone never matches `.json`.
    pub(crate) fn split<'a>(&self, file_name: &'a str) -> Option<(&'a str, &'a str)> {
        self.factories
            .keys()
            .filter(|extension| {
                file_name.len() > extension.len() && file_name.ends_with(extension.as_str())
            })
            .max_by_key(|extension| extension.len())
            .map(|extension| file_name.split_at(file_name.len() - extension.len()))
    }

    pub(crate) fn factory(&self, extension: &str) -> Option<&AdapterFactory> {
        self.factories.get(extension)
    }

    pub(crate) fn extensions(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for ExtensionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&str> = self.extensions().collect();
        extensions.sort_unstable();
        f.debug_struct("ExtensionMap")
            .field("extensions", &extensions)
            .finish()
    }
}

fn normalize_extension(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileAdapter;
    use pretty_assertions::assert_eq;

    fn map(specifiers: &[AdapterSpecifier]) -> ExtensionMap {
        ExtensionMap::build(specifiers).expect("map")
    }

    #[test]
    fn duplicate_extension_is_ambiguous() {
        let err = ExtensionMap::build(&[
            AdapterSpecifier::new([".json"], |path: &Path| FileAdapter::json(path)),
            AdapterSpecifier::new(["json", ".json5"], |path: &Path| FileAdapter::json5(path)),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::AmbiguousExtension { ref extension } if extension == ".json"));
    }

    #[test]
    fn longest_registered_suffix_wins() {
        let extensions = map(&[
            AdapterSpecifier::new([".json"], |path: &Path| FileAdapter::json(path)),
            AdapterSpecifier::new([".config.json"], |path: &Path| FileAdapter::json5(path)),
        ]);
        assert_eq!(extensions.split("default.config.json"), Some(("default", ".config.json")));
        assert_eq!(extensions.split("default.json"), Some(("default", ".json")));
        assert_eq!(extensions.split("local.yaml"), None);
        assert_eq!(extensions.split(".json"), None);
    }
}
