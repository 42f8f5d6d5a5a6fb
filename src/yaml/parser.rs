//! YAML reading and writing for project state files

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value, keeping the source for diagnostics
pub fn parse_yaml<T: DeserializeOwned>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content).map_err(|e| {
        YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename))
    })
}

/// Parse YAML from a file path
pub fn parse_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();
    parse_yaml(&content, &filename)
}

/// Serialize a value and write it, creating parent directories
pub fn write_yaml_file<T: Serialize>(path: &Path, value: &T) -> Result<(), YamlError> {
    let content =
        serde_yml::to_string(value).map_err(|e| YamlError::Serialize(e.to_string()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Session {
        username: String,
        plates: u32,
    }

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = "username: alice\nplates: 3";
        let result: Session = parse_yaml(yaml, "session.yaml").unwrap();
        assert_eq!(result.username, "alice");
        assert_eq!(result.plates, 3);
    }

    #[test]
    fn test_parse_error_names_file() {
        let yaml = "username: alice\nplates: [unclosed";
        let err = parse_yaml::<Session>(yaml, "session.yaml").unwrap_err();
        assert!(err.to_string().contains("session.yaml"));
    }

    #[test]
    fn test_write_creates_parents() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested/dir/state.yaml");
        let value = Session {
            username: "bob".to_string(),
            plates: 2,
        };

        write_yaml_file(&path, &value).unwrap();
        let back: Session = parse_yaml_file(&path).unwrap();
        assert_eq!(back, value);
    }
}
