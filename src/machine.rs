//! Machine definition loading.

use pushdown_core::builtin;
use pushdown_core::{CoreError, MachineDefinition, MachineDefinitionRaw};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a machine definition file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read machine file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse machine file '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to parse machine file '{}': {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error(transparent)]
    Definition(#[from] CoreError),
}

/// Loads the definition at `path`, or the built-in aⁿbⁿ$ machine.
pub fn load(path: Option<&Path>) -> Result<MachineDefinition, LoadError> {
    match path {
        Some(path) => load_file(path),
        None => Ok(builtin::anbn()?),
    }
}

/// Loads a definition file. `.json` files are parsed as JSON, anything
/// else as YAML.
pub fn load_file(path: &Path) -> Result<MachineDefinition, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let raw: MachineDefinitionRaw = if is_json {
        serde_json::from_str(&content).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        serde_yaml::from_str(&content).map_err(|source| LoadError::Yaml {
            path: path.to_path_buf(),
            source,
        })?
    };

    let definition = MachineDefinition::from_raw(raw)?;
    tracing::info!(
        machine = %definition.name,
        checksum = %definition.checksum,
        "loaded machine from {}",
        path.display()
    );
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushdown_core::{Engine, StateRole};
    use std::io::Write;
    use std::sync::Arc;

    fn machines_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("machines")
    }

    #[test]
    fn test_load_builtin() {
        let definition = load(None).unwrap();
        assert_eq!(definition.name, "anbn");
    }

    #[test]
    fn test_yaml_matches_builtin() {
        let loaded = load_file(&machines_dir().join("anbn.yaml")).unwrap();
        let builtin = builtin::anbn().unwrap();

        assert_eq!(loaded.raw, builtin.raw);
        assert_eq!(loaded.checksum, builtin.checksum);
    }

    #[test]
    fn test_json_machine_runs() {
        let definition = load_file(&machines_dir().join("mirror.json")).unwrap();
        let mut engine = Engine::new(Arc::new(definition));

        assert!(engine.process("abcba$", None).unwrap().is_accepted());
        assert!(engine.process("c$", None).unwrap().is_accepted());
        assert!(!engine.process("abcab$", None).unwrap().is_accepted());
        assert!(!engine.process("abba$", None).unwrap().is_accepted());
    }

    #[test]
    fn test_missing_file() {
        let result = load(Some(Path::new("/nonexistent/machine.yaml")));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_bad_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{\"start\": ").unwrap();

        let result = load_file(file.path());
        assert!(matches!(result, Err(LoadError::Json { .. })));
    }

    #[test]
    fn test_missing_end_state_in_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "name: broken\nstart: p\ntransitions:\n  p:\n    - {{ to: p, rule: 1 }}").unwrap();

        let result = load_file(file.path());
        assert!(matches!(
            result,
            Err(LoadError::Definition(CoreError::MissingRequiredState {
                role: StateRole::End
            }))
        ));
    }
}
