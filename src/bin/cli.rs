use std::io::{self, Write};

use taskgraph::analysis::{Analysis, Diagnostic};
use taskgraph::config::AnalysisConfig;
use taskgraph::export;
use taskgraph::metadata::TaskgraphInfo;
use taskgraph::persistence::{load_taskgraph_from_json, save_taskgraph_to_json};
use taskgraph::{Task, Taskgraph};
use tracing_subscriber::EnvFilter;

fn parse_depends_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn render_row(cells: &[&str], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(width.saturating_sub(cell.len())));
        line.push_str(" |");
    }
    line
}

fn render_text_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (ci, cell) in row.iter().enumerate() {
            if cell.len() > widths[ci] {
                widths[ci] = cell.len();
            }
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(headers, &widths));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&render_row(&cells, &widths));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn render_tasks(taskgraph: &Taskgraph) -> String {
    let rows: Vec<Vec<String>> = taskgraph
        .tasks()
        .iter()
        .map(|task| {
            vec![
                task.name.clone(),
                task.difficulty.to_string(),
                task.dependency_names().collect::<Vec<_>>().join(","),
                task.layout_pin()
                    .map(|pin| format!("{},{}", pin.x, pin.y))
                    .unwrap_or_default(),
            ]
        })
        .collect();
    render_text_table(&["name", "difficulty", "depends", "pin"], &rows)
}

fn render_timing(analysis: &Analysis) -> String {
    let critical = analysis.critical_path.critical_set();
    let rows: Vec<Vec<String>> = analysis
        .nodes
        .iter()
        .map(|node| {
            vec![
                node.name.clone(),
                node.weight.to_string(),
                node.earliest_start.to_string(),
                node.earliest_finish.to_string(),
                node.latest_start.to_string(),
                node.latest_finish.to_string(),
                node.buffer.to_string(),
                analysis.depths.depth(&node.name).unwrap_or(0).to_string(),
                if critical.contains(node.name.as_str()) {
                    "*".to_string()
                } else {
                    String::new()
                },
            ]
        })
        .collect();
    render_text_table(
        &["name", "weight", "es", "ef", "ls", "lf", "buffer", "depth", "crit"],
        &rows,
    )
}

fn render_layout(analysis: &Analysis) -> String {
    let rows: Vec<Vec<String>> = analysis
        .nodes
        .iter()
        .map(|node| {
            vec![
                node.name.clone(),
                node.level.to_string(),
                node.tree_index.to_string(),
                node.x.to_string(),
                node.y.to_string(),
            ]
        })
        .collect();
    render_text_table(&["name", "level", "tree", "x", "y"], &rows)
}

fn render_grid(analysis: &Analysis) -> String {
    let rows: Vec<Vec<String>> = analysis
        .grid
        .iter()
        .map(|item| {
            let name = analysis
                .nodes
                .iter()
                .find(|node| node.id == item.id)
                .map(|node| node.name.clone())
                .unwrap_or_else(|| item.id.clone());
            vec![
                name,
                item.x.to_string(),
                item.y.to_string(),
                item.w.to_string(),
                item.h.to_string(),
                if item.pinned { "yes".into() } else { String::new() },
            ]
        })
        .collect();
    render_text_table(&["name", "x", "y", "w", "h", "pinned"], &rows)
}

fn print_diagnostics(analysis: &Analysis) {
    for diagnostic in &analysis.diagnostics {
        match diagnostic {
            Diagnostic::Cycle { nodes } => println!("warning: cycle among {}", nodes.join(", ")),
            Diagnostic::StronglyConnected { members } => {
                println!("warning: loop {}", members.join(" -> "))
            }
            Diagnostic::DuplicateName { name } => println!("warning: duplicate task '{name}'"),
            Diagnostic::DanglingDependency { task, dependency } => {
                println!("warning: '{task}' depends on unknown '{dependency}'")
            }
            Diagnostic::SyntheticRoot { name, .. } => {
                println!("warning: layout starts from '{name}' to break a cycle")
            }
        }
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show current tasks\n  add <name> <difficulty> [deps_csv] Upsert a task (deps like a,b,c)\n  delete <name>                      Delete a task and clean up dependencies\n  rename <old> <new>                 Rename a task and every reference to it\n  link <dependency> <dependent>      Make <dependent> depend on <dependency>\n  unlink <dependency> <dependent>    Remove that dependency\n  order                              Print the topological order\n  analyze                            Critical path and timing table\n  layout                             Levels, trees and pixel positions\n  grid                               Grid placement\n  pin <name> <x> <y>                 Pin a task to a grid position\n  save <path>                        Save taskgraph as JSON\n  load <path>                        Load taskgraph from JSON\n  export <md|csv> <path>             Write a markdown document or CSV report\n  quit|exit                          Exit"
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match AnalysisConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {e}; using defaults");
            AnalysisConfig::default()
        }
    };
    let mut taskgraph = Taskgraph::new(TaskgraphInfo::default());

    println!("Taskgraph (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_tasks(&taskgraph)),
            "add" => {
                let name = parts.next();
                let difficulty = parts.next();
                let depends = parts.next();
                match (name, difficulty) {
                    (Some(name), Some(difficulty)) => {
                        let difficulty: f64 = match difficulty.parse() {
                            Ok(v) => v,
                            Err(_) => {
                                println!("Invalid difficulty");
                                continue;
                            }
                        };
                        let task = Task::new(name, difficulty)
                            .with_depends(depends.map(parse_depends_list).unwrap_or_default());
                        match taskgraph.upsert_task(task) {
                            Ok(()) => {
                                println!("Task upserted.");
                                println!("{}", render_tasks(&taskgraph));
                            }
                            Err(e) => println!("Error: {e}"),
                        }
                    }
                    _ => println!("Usage: add <name> <difficulty> [deps_csv]"),
                }
            }
            "delete" => match parts.next() {
                Some(name) => {
                    if taskgraph.delete_task(name) {
                        println!("Deleted task {name}.");
                        println!("{}", render_tasks(&taskgraph));
                    } else {
                        println!("Task {name} not found.");
                    }
                }
                None => println!("Usage: delete <name>"),
            },
            "rename" => match (parts.next(), parts.next()) {
                (Some(old), Some(new)) => match taskgraph.rename_task(old, new) {
                    Ok(()) => println!("Renamed {old} to {new}."),
                    Err(e) => println!("Error: {e}"),
                },
                _ => println!("Usage: rename <old> <new>"),
            },
            "link" => match (parts.next(), parts.next()) {
                (Some(dependency), Some(dependent)) => {
                    match taskgraph.add_dependency(dependency, dependent) {
                        Ok(()) => println!("{dependent} now depends on {dependency}."),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: link <dependency> <dependent>"),
            },
            "unlink" => match (parts.next(), parts.next()) {
                (Some(dependency), Some(dependent)) => {
                    match taskgraph.remove_dependency(dependency, dependent) {
                        Ok(true) => println!("{dependent} no longer depends on {dependency}."),
                        Ok(false) => println!("{dependent} did not depend on {dependency}."),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: unlink <dependency> <dependent>"),
            },
            "order" => {
                let analysis = taskgraph.analyze(&config);
                println!("Order: {}", analysis.order.order.join(" -> "));
                if analysis.order.has_cycle {
                    println!("Unordered (cycle): {}", analysis.order.cycle_nodes.join(", "));
                }
            }
            "analyze" => {
                let analysis = taskgraph.analyze(&config);
                print_diagnostics(&analysis);
                println!(
                    "Analyzed ({})\n{}",
                    analysis.critical_path.to_cli_summary(),
                    render_timing(&analysis)
                );
            }
            "layout" => {
                let analysis = taskgraph.analyze(&config);
                println!(
                    "Canvas {}x{}, {} tree(s)\n{}",
                    analysis.layout.canvas.width,
                    analysis.layout.canvas.height,
                    analysis.layout.trees.len(),
                    render_layout(&analysis)
                );
            }
            "grid" => {
                let analysis = taskgraph.analyze(&config);
                println!("{}", render_grid(&analysis));
            }
            "pin" => {
                let name = parts.next();
                let x = parts.next().and_then(|v| v.parse::<f64>().ok());
                let y = parts.next().and_then(|v| v.parse::<f64>().ok());
                match (name, x, y) {
                    (Some(name), Some(x), Some(y)) => match taskgraph.set_layout(name, x, y) {
                        Ok(()) => println!("Pinned {name} at ({x}, {y})."),
                        Err(e) => println!("Error: {e}"),
                    },
                    _ => println!("Usage: pin <name> <x> <y>"),
                }
            }
            "save" => match parts.next() {
                Some(path) => match save_taskgraph_to_json(&taskgraph, path) {
                    Ok(()) => println!("Taskgraph saved to {path}."),
                    Err(e) => println!("Save error: {e}"),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match parts.next() {
                Some(path) => match load_taskgraph_from_json(path) {
                    Ok(loaded) => {
                        taskgraph = loaded;
                        println!("Taskgraph loaded from {path}.");
                        println!("{}", render_tasks(&taskgraph));
                    }
                    Err(e) => println!("Load error: {e}"),
                },
                None => println!("Usage: load <path>"),
            },
            "export" => match (parts.next(), parts.next()) {
                (Some("md"), Some(path)) => {
                    match std::fs::write(path, export::markdown::render(&taskgraph)) {
                        Ok(()) => println!("Markdown written to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                (Some("csv"), Some(path)) => {
                    let analysis = taskgraph.analyze(&config);
                    match export::save_report_to_csv(&analysis, path) {
                        Ok(()) => println!("Report written to {path}."),
                        Err(e) => println!("Export error: {e}"),
                    }
                }
                _ => println!("Usage: export <md|csv> <path>"),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }
}
