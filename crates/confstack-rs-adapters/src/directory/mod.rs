//! Environment-aware loading of a directory of config files.
//!
//! Files are picked by basename (`default`, the deployment, the host, the
//! instance, `local`, and their combinations) and extension, ordered from
//! lowest to highest precedence, read with the adapter registered for their
//! extension and deep-merged so that later files win.

mod resolution;
mod specifier;
mod variables;

pub use resolution::ResolvedFile;
pub use specifier::{AdapterFactory, AdapterSpecifier};
pub use variables::{
    APP_ENV_VAR, APP_INSTANCE_VAR, CONFIG_ENV_VAR, DEFAULT_DEPLOYMENT, ResolutionVariables,
    allowed_basenames,
};

use crate::filter::filtered;
use confstack_rs_core::{
    Adapter, AdapterError, AdapterOptions, AdapterRead, ConfigError, Environment, ReadResult,
    WithAdapterOptions, deep_merge_all,
};
use futures_util::future::join_all;
use log::debug;
use regex::Regex;
use specifier::ExtensionMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Reads every allowed file from one or more directories.
#[derive(Debug, Clone)]
pub struct DirectoryAdapter {
    paths: Vec<PathBuf>,
    extensions: ExtensionMap,
    variables: Option<ResolutionVariables>,
    regex: Option<Regex>,
    options: AdapterOptions,
}

impl DirectoryAdapter {
    /// Create an adapter over `paths`, in ascending precedence order.
    ///
    /// Fails before any I/O when no directory or specifier is given, or when
    /// two specifiers claim the same extension.
    pub fn new<I, P, S>(paths: I, specifiers: S) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
        S: IntoIterator<Item = AdapterSpecifier>,
    {
        let paths: Vec<PathBuf> = paths
            .into_iter()
            .map(|path| path.as_ref().to_path_buf())
            .collect();
        if paths.is_empty() {
            return Err(ConfigError::DirectoryScan(
                "at least one directory is required".to_string(),
            ));
        }
        let specifiers: Vec<AdapterSpecifier> = specifiers.into_iter().collect();
        if specifiers.is_empty() {
            return Err(ConfigError::DirectoryScan(
                "at least one adapter specifier is required".to_string(),
            ));
        }
        Ok(Self {
            paths,
            extensions: ExtensionMap::build(&specifiers)?,
            variables: None,
            regex: None,
            options: AdapterOptions::default(),
        })
    }

    /// Use fixed resolution variables instead of reading the environment.
    pub fn with_variables(mut self, variables: ResolutionVariables) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Keep only top-level keys of the merged data matching `regex`.
    pub fn regex(mut self, regex: Regex) -> Self {
        self.regex = Some(regex);
        self
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Variables used for the next read.
    pub fn variables(&self) -> ResolutionVariables {
        match &self.variables {
            Some(variables) => variables.clone(),
            None => ResolutionVariables::from_environment(&Environment::capture()),
        }
    }

    /// Files the next read would load, lowest precedence first.
    pub fn resolve(&self) -> io::Result<Vec<ResolvedFile>> {
        let allowed = allowed_basenames(&self.variables());
        resolution::resolve_files(&self.paths, &allowed, &self.extensions)
    }

    fn failure(&self, reason: impl fmt::Display) -> AdapterError {
        let dirs: Vec<String> = self
            .paths
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        AdapterError::new(format!(
            "Failed to read config from some of the following directories:\n - {}\nReason: {reason}",
            dirs.join("\n - ")
        ))
    }

    /// Merge per-file results in load order. The first failure fails the directory.
    fn merge<'a>(
        &self,
        reads: impl IntoIterator<Item = (&'a FileEntry, ReadResult)>,
    ) -> ReadResult {
        let mut records = Vec::new();
        for ((path, adapter), result) in reads {
            let record = result.map_err(|err| {
                self.failure(format!(
                    "Cannot read data from {} for {}: {}",
                    adapter.name(),
                    path.display(),
                    err
                ))
            })?;
            records.push(record);
        }
        Ok(filtered(deep_merge_all(records), self.regex.as_ref()))
    }
}

type FileEntry = (PathBuf, Box<dyn Adapter>);

impl Adapter for DirectoryAdapter {
    fn name(&self) -> &str {
        "directory adapter"
    }

    /// Ready when every file adapter reads synchronously, deferred otherwise.
    ///
    /// Nothing is awaited or polled here. A deferred per-file read is dropped
    /// unpolled and issued again when the directory read is awaited; ready
    /// results are kept and not read twice.
    fn read(&self) -> AdapterRead<'_> {
        let files = match self.resolve() {
            Ok(files) => files,
            Err(err) => return AdapterRead::failed(self.failure(err)),
        };
        debug!(
            "directory adapter resolved {} file(s) from {} director(ies)",
            files.len(),
            self.paths.len()
        );

        let adapters: Vec<FileEntry> = files
            .iter()
            .filter_map(|file| {
                let path = file.path();
                let factory = self.extensions.factory(&file.ext)?;
                let adapter = factory(path.as_path());
                Some((path, adapter))
            })
            .collect();

        let mut ready: Vec<Option<ReadResult>> = Vec::with_capacity(adapters.len());
        for (_, adapter) in &adapters {
            ready.push(match adapter.read() {
                AdapterRead::Ready(result) => Some(result),
                AdapterRead::Deferred(_) => None,
            });
        }

        if ready.iter().all(Option::is_some) {
            let results = ready.into_iter().flatten();
            return AdapterRead::Ready(self.merge(adapters.iter().zip(results)));
        }

        debug!("directory adapter has deferred file reads");
        AdapterRead::deferred(async move {
            let reads = adapters
                .iter()
                .zip(ready)
                .map(|((_, adapter), result)| async move {
                    match result {
                        Some(result) => result,
                        None => adapter.read().resolve().await,
                    }
                });
            let results = join_all(reads).await;
            self.merge(adapters.iter().zip(results))
        })
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for DirectoryAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}
