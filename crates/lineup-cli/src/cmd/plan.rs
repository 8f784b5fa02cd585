//! `lineup plan`: dependency layers for parallel apply.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use clap::Args;
use lineup_core::SortError;
use lineup_core::plan::layers_of;
use serde::Serialize;

use crate::cmd::input::{InputArgs, fail_sort};
use crate::output::{OutputMode, render};

/// Arguments for `lineup plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Include the dependencies of each layered resource.
    #[arg(long)]
    pub explain: bool,
}

#[derive(Debug, Serialize)]
struct PlanOutput {
    layers: Vec<Vec<String>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    kinds: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    explanations: BTreeMap<String, Vec<String>>,
}

/// Execute `lineup plan`.
pub fn run_plan(args: &PlanArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let loaded = args.input.load(project_root, output)?;
    let graph = &loaded.graph;
    let order = match graph.order() {
        Ok(order) => order,
        Err(cycles) => return fail_sort(output, &SortError::from(cycles)),
    };

    let layers: Vec<Vec<String>> = layers_of(graph, &order)
        .iter()
        .map(|layer| layer.iter().map(|entry| graph.vertex_id(entry)).collect())
        .collect();

    let kinds: BTreeMap<String, String> = layers
        .iter()
        .flatten()
        .filter_map(|vertex| Some((vertex.clone(), loaded.kind_of(vertex)?.to_string())))
        .collect();

    let mut explanations = BTreeMap::new();
    if args.explain {
        for vertex in layers.iter().flatten() {
            let deps = graph
                .dependencies_of(vertex)
                .filter(|dep| graph.origin(dep).is_some())
                .map(str::to_string)
                .collect();
            explanations.insert(vertex.clone(), deps);
        }
    }

    let payload = PlanOutput {
        layers,
        kinds,
        explanations,
    };
    render(output, &payload, |report, w| {
        render_plan_human(report, args.explain, w)
    })
}

fn render_plan_human(payload: &PlanOutput, explain: bool, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Apply plan")?;

    if payload.layers.is_empty() {
        writeln!(w, "(no resources)")?;
        return Ok(());
    }

    for (idx, layer) in payload.layers.iter().enumerate() {
        let noun = if layer.len() == 1 { "resource" } else { "resources" };
        writeln!(w, "\nLayer {} ({} {noun}):", idx + 1, layer.len())?;

        for vertex in layer {
            match payload.kinds.get(vertex) {
                Some(kind) => writeln!(w, "  - {vertex} ({kind})")?,
                None => writeln!(w, "  - {vertex}")?,
            }

            if explain {
                let deps = payload
                    .explanations
                    .get(vertex)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if deps.is_empty() {
                    writeln!(w, "    ready: no dependencies")?;
                } else {
                    writeln!(w, "    depends_on: {}", deps.join(", "))?;
                }
            }
        }
    }

    Ok(())
}
