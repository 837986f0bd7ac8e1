use prettytable::{Cell, Row, Table};

use crate::solver::engine::SearchStats;

/// Renders the search counters as a two-column table for CLI output.
pub fn render_stats_table(stats: &SearchStats) -> String {
    let mut table = Table::new();
    table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

    let rows: [(&str, u64); 8] = [
        ("Nodes visited", stats.nodes_visited),
        ("Backtracks", stats.backtracks),
        ("Solutions", stats.solutions),
        ("Revisions", stats.revisions),
        ("Residual-support hits", stats.support_hits),
        ("Prunings", stats.prunings),
        ("Wipeouts", stats.wipeouts),
        ("GAC runs", stats.gac_runs),
    ];
    for (name, value) in rows {
        table.add_row(Row::new(vec![
            Cell::new(name),
            Cell::new(&value.to_string()),
        ]));
    }

    table.to_string()
}
