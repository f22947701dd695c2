use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// One entry of a pair-data file. Keys other than `sites` (distributions, bins) belong to
/// target resampling and are ignored here.
#[derive(Debug, Deserialize)]
struct RawRestraint {
    sites: Vec<usize>,
}

type RawPairDataFile = BTreeMap<String, RawRestraint>;

/// The identity of a restraint: its name and the atom indices it couples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestraintDefinition {
    pub name: String,
    pub sites: Vec<usize>,
}

impl RestraintDefinition {
    pub fn new(name: &str, sites: Vec<usize>) -> Self {
        Self {
            name: name.to_string(),
            sites,
        }
    }

    /// Reads every restraint of a pair-data JSON file, sorted by name.
    ///
    /// The file maps restraint names to objects carrying at least a `sites` array:
    ///
    /// ```json
    /// {
    ///     "52_210": { "sites": [3673, 5636], "distribution": [], "bins": [] }
    /// }
    /// ```
    pub fn load_all(path: &Path) -> Result<Vec<Self>, RestraintLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| RestraintLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let raw: RawPairDataFile =
            serde_json::from_str(&content).map_err(|e| RestraintLoadError::Json {
                path: path.to_string_lossy().to_string(),
                source: e,
            })?;

        raw.into_iter()
            .map(|(name, restraint)| {
                if restraint.sites.len() < 2 {
                    return Err(RestraintLoadError::InvalidSites {
                        name,
                        count: restraint.sites.len(),
                    });
                }
                Ok(Self {
                    name,
                    sites: restraint.sites,
                })
            })
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum RestraintLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Restraint '{name}' needs at least two sites, got {count}")]
    InvalidSites { name: String, count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn load_all_reads_sites_and_ignores_other_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pair_data.json");
        fs::write(
            &path,
            r#"{
                "pair2": {"sites": [5, 6], "distribution": [0.1, 0.9], "bins": [1.0, 2.0]},
                "pair1": {"sites": [10, 25]}
            }"#,
        )
        .unwrap();

        let restraints = RestraintDefinition::load_all(&path).unwrap();
        assert_eq!(
            restraints,
            vec![
                RestraintDefinition::new("pair1", vec![10, 25]),
                RestraintDefinition::new("pair2", vec![5, 6]),
            ]
        );
    }

    #[test]
    fn load_all_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = RestraintDefinition::load_all(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(RestraintLoadError::Io { .. })));
    }

    #[test]
    fn load_all_fails_for_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pair_data.json");
        fs::write(&path, r#"{"pair1": {"distribution": []}}"#).unwrap();
        let result = RestraintDefinition::load_all(&path);
        assert!(matches!(result, Err(RestraintLoadError::Json { .. })));
    }

    #[test]
    fn load_all_rejects_single_site_restraints() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pair_data.json");
        fs::write(&path, r#"{"pair1": {"sites": [10]}}"#).unwrap();
        let result = RestraintDefinition::load_all(&path);
        assert!(matches!(
            result,
            Err(RestraintLoadError::InvalidSites { ref name, count: 1 }) if name == "pair1"
        ));
    }
}
