//! Manifest and option loading shared by every graph command.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::Args;
use lineup_core::config::load_project_config;
use lineup_core::error::{ErrorCode, SortError};
use lineup_core::manifest::Manifest;
use lineup_core::{DependencyGraph, Dependent, SortOptions};
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// Arguments common to `sort`, `cycles`, `plan` and `graph`.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Manifest file (.toml, .json, .yaml or .yml).
    pub manifest: PathBuf,

    /// Reject undeclared dependencies and duplicate entities.
    #[arg(long)]
    pub strict: bool,

    /// Separator between namespace and name in vertex ids.
    #[arg(long, value_name = "SEP")]
    pub separator: Option<String>,
}

/// A built graph plus the `kind` label of each declared resource.
#[derive(Debug)]
pub struct LoadedGraph {
    pub graph: DependencyGraph,
    kinds: BTreeMap<String, String>,
}

impl LoadedGraph {
    /// Kind of the resource behind `vertex`. The first declaration with a
    /// kind wins when a vertex is declared twice.
    pub fn kind_of(&self, vertex: &str) -> Option<&str> {
        self.kinds.get(vertex).map(String::as_str)
    }
}

impl InputArgs {
    /// Project config first, then flags on top.
    fn options(&self, project_root: &Path, output: OutputMode) -> anyhow::Result<SortOptions> {
        let mut options = match load_project_config(project_root) {
            Ok(config) => config.sort.to_options(),
            Err(err) => return fail(output, ErrorCode::ConfigParseError, &format!("{err:#}")),
        };
        options.strict |= self.strict;
        if let Some(separator) = &self.separator {
            options.separator.clone_from(separator);
        }
        Ok(options)
    }

    fn manifest(&self, output: OutputMode) -> anyhow::Result<Manifest> {
        if !self.manifest.exists() {
            return fail(
                output,
                ErrorCode::ManifestNotFound,
                &format!("manifest not found: {}", self.manifest.display()),
            );
        }
        match Manifest::load(&self.manifest) {
            Ok(manifest) => Ok(manifest),
            Err(err) => fail(output, ErrorCode::ManifestParseError, &format!("{err:#}")),
        }
    }

    /// Load the manifest and build its dependency graph.
    ///
    /// Every failure is rendered in `output` before it is returned.
    pub fn load_graph(
        &self,
        project_root: &Path,
        output: OutputMode,
    ) -> anyhow::Result<DependencyGraph> {
        Ok(self.load(project_root, output)?.graph)
    }

    /// Like [`Self::load_graph`], also keeping each resource's kind.
    pub fn load(&self, project_root: &Path, output: OutputMode) -> anyhow::Result<LoadedGraph> {
        let options = self.options(project_root, output)?;
        let manifest = self.manifest(output)?;
        debug!(
            manifest = %self.manifest.display(),
            resources = manifest.resources.len(),
            strict = options.strict,
            "building graph"
        );
        let graph = match DependencyGraph::build(&manifest.resources, &options) {
            Ok(graph) => graph,
            Err(err) => return fail_sort(output, &err),
        };

        let mut kinds = BTreeMap::new();
        for resource in &manifest.resources {
            if let Some(kind) = &resource.kind {
                kinds
                    .entry(graph.vertex_id(&resource.object_ref()))
                    .or_insert_with(|| kind.clone());
            }
        }
        Ok(LoadedGraph { graph, kinds })
    }
}

/// Render a sort failure and turn it into the command's error.
pub fn fail_sort<T>(output: OutputMode, err: &SortError) -> anyhow::Result<T> {
    render_error(output, &CliError::from(err))?;
    bail!("{}", err.error_code().message());
}

fn fail<T>(output: OutputMode, code: ErrorCode, message: &str) -> anyhow::Result<T> {
    render_error(
        output,
        &CliError::with_details(message, code.hint().unwrap_or_default(), code.code()),
    )?;
    bail!("{}", code.message());
}
