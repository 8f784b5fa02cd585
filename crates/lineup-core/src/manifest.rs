//! Reading resource declarations from disk.
//!
//! A manifest is a list of [`Resource`]s under a top-level `resources` key.
//! The format follows the file extension:
//!
//! | Extension       | Format |
//! |-----------------|--------|
//! | `.toml`         | TOML   |
//! | `.json`         | JSON   |
//! | `.yaml`, `.yml` | YAML   |
//!
//! ```toml
//! [[resources]]
//! namespace = "apps"
//! name = "web"
//! depends_on = ["db", "infra/cache"]
//!
//! [[resources]]
//! namespace = "apps"
//! name = "db"
//! ```

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::model::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Toml,
    Json,
    Yaml,
}

impl ManifestFormat {
    /// Pick a format from `path`'s extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Manifest {
    /// Load a manifest, choosing the parser from the file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has an unknown extension, or
    /// fails to parse.
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        let Some(format) = ManifestFormat::from_path(path) else {
            bail!(
                "Unsupported manifest extension for {} (expected .toml, .json, .yaml or .yml)",
                path.display()
            );
        };

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let manifest = Self::parse(&content, format)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        debug!(resources = manifest.resources.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Parse manifest text in the given format.
    ///
    /// # Errors
    ///
    /// Returns the underlying parser error.
    pub fn parse(content: &str, format: ManifestFormat) -> Result<Self> {
        let manifest = match format {
            ManifestFormat::Toml => toml::from_str(content)?,
            ManifestFormat::Json => serde_json::from_str(content)?,
            ManifestFormat::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::model::{DependencyRef, Dependent};
    use crate::sort::{SortOptions, sort_with};
    use std::path::PathBuf;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ManifestFormat::from_path(Path::new("a.toml")), Some(ManifestFormat::Toml));
        assert_eq!(ManifestFormat::from_path(Path::new("a.JSON")), Some(ManifestFormat::Json));
        assert_eq!(ManifestFormat::from_path(Path::new("a.yml")), Some(ManifestFormat::Yaml));
        assert_eq!(ManifestFormat::from_path(Path::new("a.yaml")), Some(ManifestFormat::Yaml));
        assert_eq!(ManifestFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(ManifestFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn toml_manifest_parses() {
        let text = r#"
[[resources]]
namespace = "apps"
name = "web"
kind = "Deployment"
depends_on = ["db", "infra/cache"]

[[resources]]
namespace = "apps"
name = "db"
"#;
        let manifest = Manifest::parse(text, ManifestFormat::Toml).expect("parse");
        assert_eq!(manifest.resources.len(), 2);
        let web = &manifest.resources[0];
        assert_eq!(web.kind.as_deref(), Some("Deployment"));
        assert_eq!(
            web.dependencies(),
            &[DependencyRef::path("db"), DependencyRef::path("infra/cache")]
        );
    }

    #[test]
    fn string_references_follow_the_configured_separator() {
        let text = r#"
[[resources]]
namespace = "apps"
name = "web"
depends_on = ["infra::db"]

[[resources]]
namespace = "infra"
name = "db"
depends_on = ["apps::web"]
"#;
        let manifest = Manifest::parse(text, ManifestFormat::Toml).expect("parse");
        let options = SortOptions {
            separator: "::".to_string(),
            strict: true,
        };
        let err = sort_with(&manifest.resources, &options).expect_err("two-resource cycle");
        assert_eq!(err.error_code(), ErrorCode::CycleDetected);
    }

    #[test]
    fn yaml_manifest_parses() {
        let text = "
resources:
  - name: api
    depends_on:
      - name: db
        namespace: data
  - name: db
    namespace: data
";
        let manifest = Manifest::parse(text, ManifestFormat::Yaml).expect("parse");
        assert_eq!(manifest.resources.len(), 2);
        assert_eq!(
            manifest.resources[0].depends_on,
            vec![DependencyRef::qualified("data", "db")]
        );
    }

    #[test]
    fn json_manifest_parses() {
        let text = r#"{"resources": [{"name": "a", "depends_on": ["b"]}, {"name": "b"}]}"#;
        let manifest = Manifest::parse(text, ManifestFormat::Json).expect("parse");
        assert_eq!(manifest.resources[1].name, "b");
    }

    #[test]
    fn missing_name_is_rejected() {
        let text = r#"{"resources": [{"namespace": "x"}]}"#;
        assert!(Manifest::parse(text, ManifestFormat::Json).is_err());
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("stack.json");
        std::fs::write(&path, r#"{"resources": [{"name": "solo"}]}"#).expect("write");

        let manifest = Manifest::load(&path).expect("load");
        assert_eq!(manifest.resources, vec![Resource::new("", "solo")]);
    }

    #[test]
    fn load_rejects_unknown_extension() {
        let err = Manifest::load(&PathBuf::from("stack.ini")).expect_err("unknown ext");
        assert!(err.to_string().contains("Unsupported manifest extension"), "{err}");
    }

    #[test]
    fn load_reports_missing_file_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.toml");
        let err = Manifest::load(&path).expect_err("missing file");
        assert!(err.to_string().contains("absent.toml"), "{err}");
    }
}
