use crate::Taskgraph;
use std::fmt::Write;

/// Renders the taskgraph as a markdown document, tasks in dependency order.
pub fn render(taskgraph: &Taskgraph) -> String {
    let mut out = String::new();
    let title = if taskgraph.info.name.trim().is_empty() {
        "Taskgraph"
    } else {
        taskgraph.info.name.trim()
    };
    let _ = writeln!(out, "# {title}");
    if !taskgraph.info.description.trim().is_empty() {
        let _ = writeln!(out, "\n{}", taskgraph.info.description.trim());
    }

    for (idx, task) in taskgraph.sorted_tasks().into_iter().enumerate() {
        let _ = writeln!(out, "\n## {}. {}", idx + 1, task.name);
        if !task.description.trim().is_empty() {
            let _ = writeln!(out, "\n{}", task.description.trim());
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "- Difficulty: {}", task.difficulty);
        if let Some(category) = task.category() {
            let _ = writeln!(out, "- Category: {category}");
        }
        if let Some(issue) = task.issue_number {
            let _ = writeln!(out, "- Issue: #{issue}");
        }
        let depends: Vec<&str> = task.dependency_names().collect();
        if !depends.is_empty() {
            let _ = writeln!(out, "- Depends on: {}", depends.join(", "));
        }
        if !task.notes.is_empty() {
            let _ = writeln!(out, "\n### Notes\n");
            for note in &task.notes {
                let _ = writeln!(out, "- {note}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Task;
    use crate::metadata::TaskgraphInfo;

    #[test]
    fn sections_follow_topological_order() {
        let mut ship = Task::new("ship", 1.0).with_depends(["build"]);
        ship.notes.push("tag the release".into());
        ship.issue_number = Some(42);
        let graph = Taskgraph::with_tasks(
            TaskgraphInfo::named("Release"),
            vec![ship, Task::new("build", 3.0).with_description("compile it")],
        );
        let md = render(&graph);
        assert!(md.starts_with("# Release\n"));
        let build = md.find("## 1. build").unwrap();
        let ship = md.find("## 2. ship").unwrap();
        assert!(build < ship);
        assert!(md.contains("- Depends on: build"));
        assert!(md.contains("- Issue: #42"));
        assert!(md.contains("- tag the release"));
        assert!(md.contains("compile it"));
    }
}
