//! `lineup graph`: dependency graph summary or Graphviz export.
//!
//! - `lineup graph <manifest>`:       counts, content hash, cycles and the
//!   most depended-on resources
//! - `lineup graph <manifest> --dot`: DOT text for `dot -Tsvg`
//!
//! # Edge Direction
//!
//! An edge `a -> b` means "`a` depends on `b`", the same direction the sorter
//! uses. Undeclared targets still appear as nodes.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;

use clap::Args;
use lineup_core::DependencyGraph;
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::cmd::input::InputArgs;
use crate::output::{OutputMode, render};

const TOP_DEPENDED_ON: usize = 5;

/// Arguments for `lineup graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Emit Graphviz DOT instead of the summary.
    #[arg(long)]
    pub dot: bool,
}

#[derive(Debug, Serialize)]
struct GraphSummary {
    entities: usize,
    nodes: usize,
    edges: usize,
    dangling: usize,
    graph_hash: String,
    cycles: Vec<Vec<String>>,
    most_depended_on: Vec<(String, usize)>,
}

#[derive(Debug, Serialize)]
struct DotOutput {
    dot: String,
}

/// Execute `lineup graph`.
pub fn run_graph(args: &GraphArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let graph = args.input.load_graph(project_root, output)?;

    if args.dot {
        let payload = DotOutput {
            dot: to_dot(&graph),
        };
        return render(output, &payload, |p, w| write!(w, "{}", p.dot));
    }

    let payload = summarize(&graph);
    render(output, &payload, render_summary_human)
}

fn summarize(graph: &DependencyGraph) -> GraphSummary {
    let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
    for targets in graph.graph().values() {
        for target in targets {
            *in_degree.entry(target.as_str()).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = in_degree
        .into_iter()
        .map(|(id, deg)| (id.to_string(), deg))
        .collect();
    // Stable sort keeps ties in vertex id order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(TOP_DEPENDED_ON);

    GraphSummary {
        entities: graph.entity_count(),
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        dangling: graph.node_count() - graph.entity_count(),
        graph_hash: graph.content_hash().to_string(),
        cycles: graph.cycles(),
        most_depended_on: ranked,
    }
}

/// Build a petgraph copy of `graph` and render it as DOT.
fn to_dot(graph: &DependencyGraph) -> String {
    let mut dot_graph = DiGraph::<String, ()>::new();
    let mut node_indices: HashMap<&str, NodeIndex> = HashMap::new();

    let adjacency = graph.graph();
    let vertices = adjacency
        .keys()
        .chain(adjacency.values().flatten())
        .map(String::as_str);
    for vertex in vertices {
        node_indices
            .entry(vertex)
            .or_insert_with(|| dot_graph.add_node(vertex.to_string()));
    }

    for (from, targets) in adjacency {
        let source = node_indices[from.as_str()];
        for target in targets {
            dot_graph.add_edge(source, node_indices[target.as_str()], ());
        }
    }

    format!("{:?}", Dot::with_config(&dot_graph, &[Config::EdgeNoLabel]))
}

fn render_summary_human(summary: &GraphSummary, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "Dependency graph")?;
    writeln!(w, "  resources:            {}", summary.entities)?;
    writeln!(w, "  nodes:                {}", summary.nodes)?;
    writeln!(w, "  dependency edges:     {}", summary.edges)?;
    writeln!(w, "  undeclared targets:   {}", summary.dangling)?;
    writeln!(w, "  cycles:               {}", summary.cycles.len())?;
    writeln!(w, "  hash:                 {}", summary.graph_hash)?;

    if !summary.cycles.is_empty() {
        writeln!(w, "\n  cycles detected:")?;
        for cycle in &summary.cycles {
            writeln!(w, "    {}", cycle.join(" -> "))?;
        }
    }

    if summary.most_depended_on.is_empty() {
        writeln!(w, "\n  (no dependencies defined)")?;
    } else {
        writeln!(w, "\n  most depended on:")?;
        for (id, deg) in &summary.most_depended_on {
            writeln!(w, "    {id} ({deg} dependents)")?;
        }
    }

    Ok(())
}
