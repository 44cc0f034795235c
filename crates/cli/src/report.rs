use absa_analysis::ActionCenter;
use std::fmt::Write as _;
use std::path::Path;

pub fn render_action_report(source: &Path, center: &ActionCenter) -> String {
    let mut md = String::new();
    md.push_str("# ABSA action center\n\n");
    let _ = writeln!(md, "- Source: `{}`", source.display());
    let _ = writeln!(
        md,
        "- Filters: min_mentions=`{}`, top_n=`{}`\n",
        center.filters.min_mentions, center.filters.top_n
    );

    if center.is_empty() {
        md.push_str("No aspect reaches the minimum number of mentions.\n");
        return md;
    }

    md.push_str("## Urgent aspects\n\n");
    md.push_str("| aspect | severity | mentions | neg | neg_ratio | avg_score | priority |\n");
    md.push_str("|---|---|---:|---:|---:|---:|---:|\n");
    for urgent in &center.urgent {
        let s = &urgent.stats;
        let _ = writeln!(
            md,
            "| `{}` | {} | {} | {} | {:.0}% | {:.2} | {:.3} |",
            escape_cell(&s.aspect),
            urgent.severity.as_str().to_uppercase(),
            s.mentions,
            s.neg,
            s.neg_ratio * 100.0,
            s.avg_score,
            s.priority_score
        );
    }
    md.push('\n');

    md.push_str("## Opportunities\n\n");
    md.push_str("| aspect | mentions | pos | pos_ratio | avg_score |\n");
    md.push_str("|---|---:|---:|---:|---:|\n");
    for s in &center.opportunities {
        let _ = writeln!(
            md,
            "| `{}` | {} | {} | {:.0}% | {:.2} |",
            escape_cell(&s.aspect),
            s.mentions,
            s.pos,
            s.pos_ratio * 100.0,
            s.avg_score
        );
    }
    md.push('\n');

    md.push_str("## Action plan\n\n");
    if let Some(text) = &center.example_complaint {
        let _ = writeln!(md, "> **Example complaint:** \"{}\"\n", truncate_one_line(text, 200));
    }
    md.push_str("| aspect | owner | focus | severity | mentions | next step |\n");
    md.push_str("|---|---|---|---|---:|---|\n");
    for item in &center.plan {
        let _ = writeln!(
            md,
            "| `{}` | {} | {} | {} | {} | {} |",
            escape_cell(&item.aspect),
            escape_cell(&item.owner),
            item.focus.as_str(),
            capitalize(item.severity.as_str()),
            item.mentions,
            item.next_step
        );
    }
    md
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
