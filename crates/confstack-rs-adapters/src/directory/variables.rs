//! Deployment, instance and host names that decide which files are loaded.

use confstack_rs_core::Environment;

/// Deployment name variable checked first.
pub const CONFIG_ENV_VAR: &str = "CONFIG_ENV";
/// Deployment name variable checked when [`CONFIG_ENV_VAR`] is unset.
pub const APP_ENV_VAR: &str = "APP_ENV";
pub const APP_INSTANCE_VAR: &str = "APP_INSTANCE";
pub const DEFAULT_DEPLOYMENT: &str = "development";

/// Context used to build the allowed basename list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionVariables {
    pub deployment: String,
    pub instance: Option<String>,
    pub hostname: String,
    pub short_hostname: String,
}

impl ResolutionVariables {
    pub fn new(
        deployment: impl Into<String>,
        instance: Option<String>,
        hostname: impl Into<String>,
    ) -> Self {
        let hostname = hostname.into();
        Self {
            deployment: deployment.into(),
            instance,
            short_hostname: short_hostname(&hostname).to_string(),
            hostname,
        }
    }

    /// Resolve every variable from an environment snapshot.
    ///
    /// The hostname comes from `HOST`, then `HOSTNAME`, then the operating system.
    pub fn from_environment(environment: &Environment) -> Self {
        let deployment = environment
            .get(CONFIG_ENV_VAR)
            .or_else(|| environment.get(APP_ENV_VAR))
            .unwrap_or(DEFAULT_DEPLOYMENT);
        let instance = environment.get(APP_INSTANCE_VAR).map(str::to_string);
        let hostname = environment
            .get("HOST")
            .or_else(|| environment.get("HOSTNAME"))
            .map(str::to_string)
            .unwrap_or_else(|| os_hostname(environment));
        Self::new(deployment, instance, hostname)
    }
}

fn short_hostname(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

#[cfg(unix)]
fn os_hostname(_environment: &Environment) -> String {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is a live, writable buffer of exactly `buf.len()` bytes and
    // gethostname writes at most that many. A name that does not fit may come
    // back without a NUL, which the `position` fallback below handles.
    let result = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if result != 0 {
        return "localhost".to_string();
    }
    let len = buf.iter().position(|byte| *byte == 0).unwrap_or(buf.len());
    match std::str::from_utf8(&buf[..len]) {
        Ok(name) if !name.is_empty() => name.to_string(),
        _ => "localhost".to_string(),
    }
}

#[cfg(not(unix))]
fn os_hostname(environment: &Environment) -> String {
    environment
        .get("COMPUTERNAME")
        .unwrap_or("localhost")
        .to_string()
}

/// Basenames allowed for `variables`, lowest precedence first.
pub fn allowed_basenames(variables: &ResolutionVariables) -> Vec<String> {
    let ResolutionVariables {
        deployment,
        instance,
        hostname,
        short_hostname,
    } = variables;

    let Some(instance) = instance else {
        return vec![
            "default".to_string(),
            deployment.clone(),
            short_hostname.clone(),
            format!("{short_hostname}-{deployment}"),
            hostname.clone(),
            format!("{hostname}-{deployment}"),
            "local".to_string(),
            format!("local-{deployment}"),
        ];
    };

    vec![
        "default".to_string(),
        format!("default-{instance}"),
        deployment.clone(),
        format!("{deployment}-{instance}"),
        short_hostname.clone(),
        format!("{short_hostname}-{deployment}"),
        format!("{short_hostname}-{instance}"),
        format!("{short_hostname}-{deployment}-{instance}"),
        hostname.clone(),
        format!("{hostname}-{deployment}"),
        format!("{hostname}-{instance}"),
        format!("{hostname}-{deployment}-{instance}"),
        "local".to_string(),
        format!("local-{deployment}"),
        format!("local-{instance}"),
        format!("local-{deployment}-{instance}"),
    ]
}
