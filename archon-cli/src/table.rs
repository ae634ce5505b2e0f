//! Plain-text table rendering for `archon list`.

use archon_core::Task;

const HEADERS: [&str; 5] = ["ID", "Title", "Owner", "Priority", "Completed"];

pub fn format_task_table(tasks: &[Task]) -> String {
    let rows: Vec<[String; 5]> = tasks
        .iter()
        .map(|t| {
            [
                t.identifier.clone(),
                t.title.clone(),
                t.owner.clone(),
                t.priority.to_string(),
                if t.is_completed() { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();

    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let format_row = |cells: &[&str]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{cell:<width$}", width = widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    let mut lines = vec![format_row(&HEADERS)];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        lines.push(format_row(&cells));
    }
    lines.join("\n")
}
