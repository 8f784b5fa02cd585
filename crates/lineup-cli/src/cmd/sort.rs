//! `lineup sort`: print resources in dependency order.

use std::io::Write;
use std::path::Path;

use clap::Args;
use lineup_core::SortError;
use serde::Serialize;

use crate::cmd::input::{InputArgs, fail_sort};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `lineup sort`.
#[derive(Args, Debug)]
pub struct SortArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Print dependents before their dependencies.
    #[arg(long)]
    pub teardown: bool,
}

#[derive(Debug, Serialize)]
struct SortOutput {
    direction: &'static str,
    count: usize,
    graph_hash: String,
    order: Vec<SortEntry>,
}

#[derive(Debug, Serialize)]
struct SortEntry {
    /// Vertex id, joined with the separator in effect.
    id: String,
    namespace: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
}

/// Execute `lineup sort`.
pub fn run_sort(args: &SortArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let loaded = args.input.load(project_root, output)?;
    let graph = &loaded.graph;
    let order = match graph.order() {
        Ok(order) => order,
        Err(cycles) => return fail_sort(output, &SortError::from(cycles)),
    };

    let (direction, order) = if args.teardown {
        ("teardown", order.teardown())
    } else {
        ("apply", order)
    };

    let payload = SortOutput {
        direction,
        count: order.len(),
        graph_hash: graph.content_hash().to_string(),
        order: order
            .into_iter()
            .map(|entry| {
                let id = graph.vertex_id(&entry);
                SortEntry {
                    kind: loaded.kind_of(&id).map(str::to_string),
                    id,
                    namespace: entry.namespace,
                    name: entry.name,
                }
            })
            .collect(),
    };

    render_mode(output, &payload, render_sort_text, render_sort_pretty)
}

fn render_sort_text(payload: &SortOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for entry in &payload.order {
        writeln!(w, "{}", entry.id)?;
    }
    Ok(())
}

fn render_sort_pretty(payload: &SortOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.order.is_empty() {
        writeln!(w, "Nothing to order.")?;
        return Ok(());
    }

    let heading = match payload.direction {
        "teardown" => "Teardown order",
        _ => "Apply order",
    };
    pretty_section(w, &format!("{heading} ({})", payload.count))?;
    let width = payload.count.to_string().len();
    for (idx, entry) in payload.order.iter().enumerate() {
        match &entry.kind {
            Some(kind) => writeln!(w, "{:>width$}. {} ({kind})", idx + 1, entry.id)?,
            None => writeln!(w, "{:>width$}. {}", idx + 1, entry.id)?,
        }
    }
    writeln!(w)?;
    pretty_kv(w, "graph", &payload.graph_hash)
}
