//! `lineup cycles`: list dependency cycles (strongly connected components).

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;

use crate::cmd::input::InputArgs;
use crate::output::{OutputMode, render};

/// Arguments for `lineup cycles`.
#[derive(Args, Debug)]
pub struct CyclesArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct CyclesOutput {
    cycles: Vec<Vec<String>>,
}

/// Execute `lineup cycles`.
///
/// Finding cycles is not a failure here; only loading the manifest can fail.
pub fn run_cycles(args: &CyclesArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let graph = args.input.load_graph(project_root, output)?;
    let payload = CyclesOutput {
        cycles: graph.cycles(),
    };
    render(output, &payload, render_cycles_human)
}

fn render_cycles_human(payload: &CyclesOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if payload.cycles.is_empty() {
        writeln!(w, "No dependency cycles found.")?;
        return Ok(());
    }

    writeln!(w, "Dependency cycles ({})", payload.cycles.len())?;

    for (idx, cycle) in payload.cycles.iter().enumerate() {
        writeln!(w, "\nCycle {}:", idx + 1)?;
        for vertex in cycle {
            writeln!(w, "  - {vertex}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cycles_message() {
        let payload = CyclesOutput { cycles: Vec::new() };
        let mut buf = Vec::new();
        render_cycles_human(&payload, &mut buf).expect("render");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "No dependency cycles found.\n");
    }

    #[test]
    fn groups_are_numbered() {
        let payload = CyclesOutput {
            cycles: vec![
                vec!["apps/a".to_string(), "apps/b".to_string()],
                vec!["apps/c".to_string()],
            ],
        };
        let mut buf = Vec::new();
        render_cycles_human(&payload, &mut buf).expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("Dependency cycles (2)"));
        assert!(text.contains("Cycle 1:\n  - apps/a\n  - apps/b"));
        assert!(text.contains("Cycle 2:\n  - apps/c"));
    }
}
