use std::fmt::Write;

use comfy_table::Cell;

use crate::cleanup::{Policy, RetentionOptions, RunReport, Target};

use super::styling::{bright, bright_green, bright_red, cyan, dim};
use super::tables::{color_coded_failure_count_cell, create_cyan_header, create_table};

/// Prints the default policy and every target with the policy it will get.
pub fn print_plan(defaults: &Policy, targets: &[(Target, Option<RetentionOptions>)]) {
    println!("{}", render_plan(defaults, targets));
}

/// Prints run totals followed by every collected failure.
pub fn print_report(report: &RunReport) {
    println!("{}", render_report(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn render_plan(defaults: &Policy, targets: &[(Target, Option<RetentionOptions>)]) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "⚙️", "Default options");
    let _ = writeln!(output, "  {}\n", cyan(defaults));

    add_section_header(&mut output, "🎯", "Targets");
    if targets.is_empty() {
        let _ = writeln!(output, "  {}", dim("No targets configured"));
        return output;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Target", "Policy"]));

    for (target, options) in targets {
        let policy_cell = match options {
            Some(options) => {
                let policy = options.resolve(defaults);
                if &policy == defaults {
                    Cell::new(dim("defaults"))
                } else {
                    Cell::new(policy)
                }
            }
            None => Cell::new(dim("defaults")),
        };
        table.add_row(vec![Cell::new(target.display_name()), policy_cell]);
    }

    let _ = writeln!(output, "{table}");
    output
}

fn render_report(report: &RunReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Summary");

    let mut totals = create_table();
    totals.set_header(create_cyan_header(&[
        "Projects",
        "Old pipelines",
        "Deleted",
        "Failed",
    ]));
    totals.add_row(vec![
        Cell::new(report.projects),
        Cell::new(report.found),
        Cell::new(report.deleted),
        color_coded_failure_count_cell(report.failures.len()),
    ]);
    let _ = writeln!(output, "{totals}\n");

    if report.is_success() {
        let _ = writeln!(output, "{}", bright_green("Old pipelines were deleted"));
        return output;
    }

    add_section_header(&mut output, "⚠️", "Failures");

    let mut failures = create_table();
    failures.set_header(create_cyan_header(&["Project", "Pipeline", "Error"]));
    for failure in &report.failures {
        let pipeline = failure
            .pipeline_id
            .map_or_else(|| "(listing)".to_string(), |id| id.to_string());
        failures.add_row(vec![
            Cell::new(failure.project_id),
            Cell::new(pipeline),
            Cell::new(&failure.error),
        ]);
    }
    let _ = writeln!(output, "{failures}\n");
    let _ = writeln!(
        output,
        "{}",
        bright_red(format!("{} operations failed", report.failures.len()))
    );

    output
}
