use super::ExportError;
use crate::analysis::Analysis;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct ReportRecord<'a> {
    id: &'a str,
    name: &'a str,
    weight: f64,
    depth: usize,
    level: usize,
    tree: usize,
    earliest_start: f64,
    earliest_finish: f64,
    latest_start: f64,
    latest_finish: f64,
    buffer: f64,
    critical: bool,
    dependencies: String,
}

/// One row per node with its timing, depth and placement.
pub fn write_report<W: Write>(analysis: &Analysis, writer: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);
    let critical = analysis.critical_path.critical_set();
    for node in &analysis.nodes {
        let dependencies = node
            .dependencies
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(";");
        writer.serialize(ReportRecord {
            id: &node.id,
            name: &node.name,
            weight: node.weight,
            depth: analysis.depths.depth(&node.name).unwrap_or(0),
            level: node.level,
            tree: node.tree_index,
            earliest_start: node.earliest_start,
            earliest_finish: node.earliest_finish,
            latest_start: node.latest_start,
            latest_finish: node.latest_finish,
            buffer: node.buffer,
            critical: critical.contains(node.name.as_str()),
            dependencies,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_report_to_csv<P: AsRef<Path>>(analysis: &Analysis, path: P) -> Result<(), ExportError> {
    let file = File::create(path)?;
    write_report(analysis, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::{Task, analyze};

    #[test]
    fn report_has_header_and_one_row_per_node() {
        let tasks = [
            Task::new("a", 1.0),
            Task::new("b", 2.0).with_depends(["a"]),
        ];
        let analysis = analyze(&tasks, &AnalysisConfig::default());
        let mut buf = Vec::new();
        write_report(&analysis, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,name,weight,depth"));
        assert!(lines[2].starts_with("task-1,b,2.0,1,1,0,1.0,3.0,1.0,3.0,0.0,true,a"));
    }

    #[test]
    fn only_zero_slack_rows_are_flagged_critical() {
        let tasks = [
            Task::new("root", 1.0),
            Task::new("short", 1.0).with_depends(["root"]),
            Task::new("long", 5.0).with_depends(["root"]),
            Task::new("end", 1.0).with_depends(["short", "long"]),
        ];
        let analysis = analyze(&tasks, &AnalysisConfig::default());
        let mut buf = Vec::new();
        write_report(&analysis, &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers = reader.headers().unwrap().clone();
        let name_col = headers.iter().position(|h| h == "name").unwrap();
        let critical_col = headers.iter().position(|h| h == "critical").unwrap();
        let flagged: Vec<(String, String)> = reader
            .records()
            .map(|record| {
                let record = record.unwrap();
                (record[name_col].to_string(), record[critical_col].to_string())
            })
            .collect();
        assert_eq!(
            flagged,
            vec![
                ("root".to_string(), "true".to_string()),
                ("short".to_string(), "false".to_string()),
                ("long".to_string(), "true".to_string()),
                ("end".to_string(), "true".to_string()),
            ]
        );
    }
}
