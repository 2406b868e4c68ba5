//! Adapter that runs an executable and reads a JSON object from its stdout.

use crate::filter::filtered;
use confstack_rs_core::{
    Adapter, AdapterError, AdapterOptions, AdapterRead, ConfigRecord, WithAdapterOptions,
};
use log::debug;
use parking_lot::Mutex;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tokio::process::Command;

/// Lookups of interpreter programs on `PATH`, shared by every script adapter.
static INTERPRETERS: OnceLock<Mutex<HashMap<String, Option<PathBuf>>>> = OnceLock::new();

/// One way of running a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptRunner {
    /// Execute the script file itself.
    Direct,
    /// Run `program [args..] <script>`.
    Interpreter { program: String, args: Vec<String> },
}

impl ScriptRunner {
    pub fn interpreter(program: impl Into<String>) -> Self {
        Self::Interpreter {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn interpreter_with_args<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Interpreter {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Runners tried for `path` when none are configured: the file itself,
    /// then the interpreter matching its extension.
    pub fn defaults_for(path: &Path) -> Vec<Self> {
        let mut runners = vec![Self::Direct];
        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
        match extension {
            "sh" => runners.push(Self::interpreter("sh")),
            "py" => runners.push(Self::interpreter("python3")),
            "js" | "mjs" | "cjs" => runners.push(Self::interpreter("node")),
            "ts" => runners.push(Self::interpreter_with_args("deno", ["run", "--allow-all"])),
            _ => {}
        }
        runners
    }

    /// Build the command, or `None` when the interpreter is not installed.
    fn command(&self, script: &Path) -> Option<Command> {
        match self {
            Self::Direct => Some(Command::new(script)),
            Self::Interpreter { program, args } => {
                let program = resolve_interpreter(program)?;
                let mut command = Command::new(program);
                command.args(args).arg(script);
                Some(command)
            }
        }
    }
}

fn resolve_interpreter(program: &str) -> Option<PathBuf> {
    let cache = INTERPRETERS.get_or_init(|| Mutex::new(HashMap::new()));
    cache
        .lock()
        .entry(program.to_string())
        .or_insert_with(|| {
            let resolved = which::which(program).ok();
            debug!("resolved interpreter {program}: {resolved:?}");
            resolved
        })
        .clone()
}

/// Runs a script and parses its standard output as a JSON object.
///
/// Runners are tried in order; one that cannot be started (missing
/// interpreter, file not executable) hands over to the next. A script that
/// starts but exits unsuccessfully fails the read.
#[derive(Debug, Clone)]
pub struct ScriptAdapter {
    path: PathBuf,
    runners: Vec<ScriptRunner>,
    regex: Option<Regex>,
    options: AdapterOptions,
}

impl ScriptAdapter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            runners: ScriptRunner::defaults_for(&path),
            path,
            regex: None,
            options: AdapterOptions::default(),
        }
    }

    /// Replace the runner list.
    pub fn runners(mut self, runners: Vec<ScriptRunner>) -> Self {
        self.runners = runners;
        self
    }

    /// Keep only top-level keys matching `regex`.
    pub fn regex(mut self, regex: Regex) -> Self {
        self.regex = Some(regex);
        self
    }

    async fn run(&self) -> Result<ConfigRecord, String> {
        let mut last_error = "no runner available".to_string();
        for runner in &self.runners {
            let Some(mut command) = runner.command(&self.path) else {
                continue;
            };
            debug!("running script {} with {:?}", self.path.display(), runner);
            let output = match command.kill_on_drop(true).output().await {
                Ok(output) => output,
                Err(err) => {
                    last_error = err.to_string();
                    continue;
                }
            };
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(format!("{} ({})", output.status, stderr.trim()));
            }
            return parse_output(&output.stdout);
        }
        Err(last_error)
    }
}

fn parse_output(stdout: &[u8]) -> Result<ConfigRecord, String> {
    match serde_json::from_slice::<Value>(stdout).map_err(|err| err.to_string())? {
        Value::Object(record) => Ok(record),
        Value::Null => Ok(ConfigRecord::new()),
        _ => Err("script output is not a JSON object".to_string()),
    }
}

impl Adapter for ScriptAdapter {
    fn name(&self) -> &str {
        "script adapter"
    }

    fn read(&self) -> AdapterRead<'_> {
        AdapterRead::deferred(async move {
            let data = self.run().await.map_err(|cause| {
                AdapterError::new(format!(
                    "Failed to execute script at {}: {cause}",
                    self.path.display()
                ))
            })?;
            Ok::<_, AdapterError>(filtered(data, self.regex.as_ref()))
        })
    }

    fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl WithAdapterOptions for ScriptAdapter {
    fn options_mut(&mut self) -> &mut AdapterOptions {
        &mut self.options
    }
}
