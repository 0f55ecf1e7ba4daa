use crate::domain::errors::{MonitoringError, MonitoringResult};
use crate::domain::ports::HostIdentity;
use std::path::PathBuf;
use std::process::Command;

/// Resolves the local hostname on every call, so renames are picked up.
///
/// Lookup order: the env var (`HOSTNAME`, which shells rarely export), the
/// Linux hostname files, then the output of the `hostname` command for hosts
/// without those files (macOS, BSD).
#[derive(Debug, Clone)]
pub struct SystemHostIdentity {
    env_var: String,
    files: Vec<PathBuf>,
    command: Option<String>,
}

impl Default for SystemHostIdentity {
    fn default() -> Self {
        Self {
            env_var: "HOSTNAME".to_string(),
            files: vec![
                PathBuf::from("/proc/sys/kernel/hostname"),
                PathBuf::from("/etc/hostname"),
            ],
            command: Some("hostname".to_string()),
        }
    }
}

impl SystemHostIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom lookup sources, checked in order: env var first, then files.
    /// No command fallback unless `with_command` is added.
    pub fn with_sources(env_var: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            env_var: env_var.into(),
            files,
            command: None,
        }
    }

    /// Program whose trimmed stdout is used when env var and files yield nothing.
    pub fn with_command(mut self, program: impl Into<String>) -> Self {
        self.command = Some(program.into());
        self
    }

    fn from_command(program: &str) -> Option<String> {
        let output = Command::new(program).output().ok()?;
        if !output.status.success() {
            return None;
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!name.is_empty()).then_some(name)
    }
}

impl HostIdentity for SystemHostIdentity {
    fn hostname(&self) -> MonitoringResult<String> {
        if let Ok(name) = std::env::var(&self.env_var) {
            let name = name.trim();
            if !name.is_empty() {
                return Ok(name.to_string());
            }
        }

        for path in &self.files {
            if let Ok(contents) = std::fs::read_to_string(path) {
                let name = contents.trim();
                if !name.is_empty() {
                    return Ok(name.to_string());
                }
            }
        }

        if let Some(name) = self.command.as_deref().and_then(Self::from_command) {
            return Ok(name);
        }

        Err(MonitoringError::LocalEnvironment {
            reason: format!(
                "hostname not found in ${}, {:?} or command {:?}",
                self.env_var, self.files, self.command
            ),
        })
    }
}

/// Fixed hostname, for hosts whose identity is configured explicitly.
#[derive(Debug, Clone)]
pub struct StaticHostIdentity(pub String);

impl HostIdentity for StaticHostIdentity {
    fn hostname(&self) -> MonitoringResult<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_hostname_file() {
        let dir = std::env::temp_dir().join(format!("cloudmon-host-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("hostname");
        std::fs::write(&file, "web-7\n").unwrap();

        let identity = SystemHostIdentity::with_sources(
            "CLOUDMON_TEST_UNSET_HOSTNAME_VAR",
            vec![dir.join("missing"), file],
        );
        assert_eq!(identity.hostname().unwrap(), "web-7");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_sources_is_local_environment_error() {
        let identity = SystemHostIdentity::with_sources(
            "CLOUDMON_TEST_UNSET_HOSTNAME_VAR",
            vec![PathBuf::from("/nonexistent/cloudmon/hostname")],
        );
        assert!(matches!(
            identity.hostname(),
            Err(MonitoringError::LocalEnvironment { .. })
        ));
    }

    #[test]
    fn test_command_fallback_without_files() {
        let identity = SystemHostIdentity::with_sources(
            "CLOUDMON_TEST_UNSET_HOSTNAME_VAR",
            vec![PathBuf::from("/nonexistent/cloudmon/hostname")],
        )
        .with_command("uname");
        let name = identity.hostname().expect("uname prints the kernel name");
        assert!(!name.is_empty());
        assert_eq!(name, name.trim());
    }

    #[test]
    fn test_missing_command_is_local_environment_error() {
        let identity = SystemHostIdentity::with_sources(
            "CLOUDMON_TEST_UNSET_HOSTNAME_VAR",
            Vec::new(),
        )
        .with_command("cloudmon-no-such-program");
        assert!(matches!(
            identity.hostname(),
            Err(MonitoringError::LocalEnvironment { .. })
        ));
    }

    #[test]
    fn test_static_identity() {
        assert_eq!(
            StaticHostIdentity("db-1".to_string()).hostname().unwrap(),
            "db-1"
        );
    }
}
