//! Locating feature templates and loading the fixture values of a test case.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};

const TEMPLATE_FILE_NAME: &str = "main.graphql";

/// Placeholder names mapped to the JSON values that replace them, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureMap(Map<String, Value>);

impl FixtureMap {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FixtureMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FixtureMap {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(key, value)| (key.into(), value)).collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("no feature was given, use --feature to select one")]
    MissingFeature,
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} is not valid JSON: {source}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{} must contain a JSON object mapping placeholder names to values", path.display())]
    NotAnObject { path: PathBuf },
}

impl FixtureError {
    /// True if the error is about a file that could not be found or read.
    pub fn is_missing_input(&self) -> bool {
        matches!(self, Self::MissingFeature | Self::Read { .. })
    }
}

/// Resolves features and test cases to files below a features directory.
///
/// A feature `checkout` with test case `2` reads `<root>/checkout/main.graphql`
/// as the SDL template and `<root>/checkout/2.json` as its fixtures.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    root: PathBuf,
}

impl FixtureSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_path(&self, feature: &str) -> PathBuf {
        self.root.join(feature).join(TEMPLATE_FILE_NAME)
    }

    pub fn fixtures_path(&self, feature: &str, test_case: &str) -> PathBuf {
        self.root.join(feature).join(format!("{test_case}.json"))
    }

    /// Reads the SDL template of a feature.
    pub fn load_template(&self, feature: &str) -> Result<String, FixtureError> {
        if feature.is_empty() {
            return Err(FixtureError::MissingFeature);
        }

        let path = self.template_path(feature);
        tracing::debug!("reading SDL template {}", path.display());

        fs::read_to_string(&path).map_err(|source| FixtureError::Read { path, source })
    }

    /// Reads the fixture values of one test case of a feature.
    pub fn load_fixtures(&self, feature: &str, test_case: &str) -> Result<FixtureMap, FixtureError> {
        if feature.is_empty() {
            return Err(FixtureError::MissingFeature);
        }

        let path = self.fixtures_path(feature, test_case);
        tracing::debug!("reading fixtures {}", path.display());

        let content = fs::read_to_string(&path).map_err(|source| FixtureError::Read {
            path: path.clone(),
            source,
        })?;

        match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => Ok(FixtureMap(map)),
            Ok(_) => Err(FixtureError::NotAnObject { path }),
            Err(source) => Err(FixtureError::InvalidJson { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("orders")).unwrap();
        dir
    }

    #[test]
    fn paths() {
        let source = FixtureSource::new("/srv/features");

        assert_eq!(
            PathBuf::from("/srv/features/orders/main.graphql"),
            source.template_path("orders")
        );
        assert_eq!(PathBuf::from("/srv/features/orders/3.json"), source.fixtures_path("orders", "3"));
    }

    #[test]
    fn loads_fixtures_in_file_order() {
        let dir = feature_dir();
        fs::write(
            dir.path().join("orders/1.json"),
            r#"{"zeta": 1, "alpha": {"a": "x"}, "mid": [true]}"#,
        )
        .unwrap();

        let fixtures = FixtureSource::new(dir.path()).load_fixtures("orders", "1").unwrap();
        let names: Vec<_> = fixtures.iter().map(|(name, _)| name).collect();

        assert_eq!(vec!["zeta", "alpha", "mid"], names);
        assert_eq!(Some(&json!({"a": "x"})), fixtures.get("alpha"));
    }

    #[test]
    fn loads_template() {
        let dir = feature_dir();
        fs::write(dir.path().join("orders/main.graphql"), "type Query { a: Int }").unwrap();

        let template = FixtureSource::new(dir.path()).load_template("orders").unwrap();

        assert_eq!("type Query { a: Int }", template);
    }

    #[test]
    fn missing_test_case() {
        let dir = feature_dir();

        let error = FixtureSource::new(dir.path()).load_fixtures("orders", "7").unwrap_err();

        assert!(matches!(error, FixtureError::Read { .. }));
        assert!(error.is_missing_input());
    }

    #[test]
    fn missing_feature_name() {
        let error = FixtureSource::new("/tmp").load_template("").unwrap_err();

        assert!(matches!(error, FixtureError::MissingFeature));
    }

    #[test]
    fn invalid_json() {
        let dir = feature_dir();
        fs::write(dir.path().join("orders/1.json"), "{ not json").unwrap();

        let error = FixtureSource::new(dir.path()).load_fixtures("orders", "1").unwrap_err();

        assert!(matches!(error, FixtureError::InvalidJson { .. }));
        assert!(!error.is_missing_input());
    }

    #[test]
    fn top_level_must_be_an_object() {
        let dir = feature_dir();
        fs::write(dir.path().join("orders/1.json"), "[1, 2]").unwrap();

        let error = FixtureSource::new(dir.path()).load_fixtures("orders", "1").unwrap_err();

        assert!(matches!(error, FixtureError::NotAnObject { .. }));
    }
}
