use taskgraph::config::AnalysisConfig;
use taskgraph::{Diagnostic, Task, analyze, analyze_with};

fn project() -> Vec<Task> {
    vec![
        Task::new("spec", 2.0),
        Task::new("api", 5.0).with_depends(["spec"]),
        Task::new("ui", 3.0).with_depends(["spec"]),
        Task::new("integration", 2.0).with_depends(["api", "ui", "ghost"]),
        Task::new("loop-a", 1.0).with_depends(["loop-b"]),
        Task::new("loop-b", 1.0).with_depends(["loop-a"]),
    ]
}

#[test]
fn running_twice_gives_identical_output() {
    let tasks = project();
    let config = AnalysisConfig::default();
    let first = analyze(&tasks, &config);
    let second = analyze(&tasks, &config);
    assert_eq!(first, second);
    assert_eq!(first.critical_edges(), second.critical_edges());
    assert_eq!(first.project_duration(), second.project_duration());
}

#[test]
fn caller_tasks_are_left_untouched() {
    let tasks = project();
    let before = tasks.clone();
    let _ = analyze(&tasks, &AnalysisConfig::default());
    assert_eq!(tasks, before);
    assert!(tasks.iter().all(|task| task.layout_pin().is_none()));
}

#[test]
fn anomalies_come_back_as_diagnostics() {
    let mut seen: Vec<Diagnostic> = Vec::new();
    let analysis = analyze_with(&project(), &AnalysisConfig::default(), &mut seen);
    assert_eq!(seen, analysis.diagnostics);
    assert!(seen.contains(&Diagnostic::Cycle {
        nodes: vec!["loop-a".into(), "loop-b".into()],
    }));
    assert!(seen.contains(&Diagnostic::StronglyConnected {
        members: vec!["loop-a".into(), "loop-b".into()],
    }));
    assert!(seen.contains(&Diagnostic::DanglingDependency {
        task: "integration".into(),
        dependency: "ghost".into(),
    }));
    assert_eq!(analysis.nodes.len(), 6);
    assert!(analysis.nodes.iter().all(|node| node.x.is_finite() && node.y.is_finite()));
}

#[test]
fn analysis_serializes_in_camel_case() {
    let analysis = analyze(&project()[..4], &AnalysisConfig::default());
    let value = serde_json::to_value(&analysis).unwrap();
    assert_eq!(value["criticalPath"]["projectDuration"], 9.0);
    assert_eq!(value["nodes"][0]["earliestFinish"], 2.0);
    assert_eq!(value["nodes"][0]["treeIndex"], 0);
    assert_eq!(value["criticalPath"]["edges"][0]["fromId"], "task-0");
    assert_eq!(value["layout"]["trees"][0]["roots"][0]["kind"], "rooted");
    assert!(value["grid"][0]["w"].is_u64());
}

fn chain(len: usize) -> Vec<Task> {
    (0..len)
        .map(|i| {
            let task = Task::new(format!("t{i}"), 1.0);
            if i == 0 {
                task
            } else {
                task.with_depends([format!("t{}", i - 1)])
            }
        })
        .collect()
}

#[test]
fn long_chain_analyzes_on_a_default_stack() {
    let len = 20_000;
    let analysis = analyze(&chain(len), &AnalysisConfig::default());

    assert!(analysis.diagnostics.is_empty());
    assert_eq!(analysis.order.order.len(), len);
    assert_eq!(analysis.critical_path.project_duration, len as f64);
    assert_eq!(analysis.critical_path.critical_task_names.len(), len);
    assert_eq!(analysis.depths.max_depth(), len - 1);
    let last = analysis.nodes.last().unwrap();
    assert_eq!(last.level, len - 1);
    assert_eq!(analysis.layout.trees.len(), 1);
    assert_eq!(analysis.grid.len(), len);
}

#[test]
fn each_builder_anomaly_is_reported_once() {
    let tasks = vec![
        Task::new("a", 1.0),
        Task::new("a", 2.0).with_depends(["ghost"]),
    ];
    let mut seen: Vec<Diagnostic> = Vec::new();
    analyze_with(&tasks, &AnalysisConfig::default(), &mut seen);
    assert_eq!(
        seen,
        vec![
            Diagnostic::DuplicateName { name: "a".into() },
            Diagnostic::DanglingDependency {
                task: "a".into(),
                dependency: "ghost".into(),
            },
        ]
    );
}
