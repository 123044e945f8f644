use std::io::Write;

use dupework_core::session::{SessionEvent, Visit};
use owo_colors::OwoColorize;
use serde_json::json;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a real-time session event.
pub fn print_event(w: &mut dyn Write, event: &SessionEvent, color: ColorMode) -> std::io::Result<()> {
    match event {
        SessionEvent::Visiting { id, automatic } => {
            let prefix = if *automatic { "[auto] " } else { "" };
            let line = format!("{prefix}{id} - searching");
            if color.enabled() {
                writeln!(w, "{}", line.dimmed())?;
            } else {
                writeln!(w, "{line}")?;
            }
        }
        SessionEvent::Visited { id, works, groups } => {
            writeln!(w, "{id}: {works} works, {groups} duplicate groups")?;
        }
        SessionEvent::Advancing { from, to, .. } => {
            let line = format!("advancing {from} -> {to}");
            if color.enabled() {
                writeln!(w, "{}", line.dimmed())?;
            } else {
                writeln!(w, "{line}")?;
            }
        }
        SessionEvent::Superseded { id } => {
            writeln!(w, "{id}: superseded, results discarded")?;
        }
        SessionEvent::AutoLimitReached { visits } => {
            let line = format!("stopping after {visits} automatic visits with nothing found");
            if color.enabled() {
                writeln!(w, "{}", line.yellow())?;
            } else {
                writeln!(w, "{line}")?;
            }
        }
    }
    Ok(())
}

/// Print the final report for a visit: author summary, then each group.
pub fn print_visit(w: &mut dyn Write, visit: &Visit, color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    let name = visit.author.name.as_deref().unwrap_or("(unnamed)");
    if color.enabled() {
        writeln!(w, "{} {}", visit.id.to_string().bold(), name.bold())?;
    } else {
        writeln!(w, "{} {}", visit.id, name)?;
    }
    writeln!(w, "  Works: {}", visit.works.len())?;
    if let Some(lived) = visit.author.lived() {
        writeln!(w, "  Lived: {lived}")?;
    }
    if let Some(wikidata) = &visit.author.remote_ids.wikidata {
        writeln!(w, "  Wikidata: {wikidata}")?;
    }
    if visit.author.is_redirect() {
        writeln!(w, "  Redirect: true")?;
    }
    writeln!(w)?;

    if visit.groups.is_empty() {
        writeln!(w, "No duplicate groups found.")?;
        return Ok(());
    }

    let header = format!(
        "Found {} duplicate group{}:",
        visit.groups.len(),
        if visit.groups.len() == 1 { "" } else { "s" }
    );
    if color.enabled() {
        writeln!(w, "{}", header.green())?;
    } else {
        writeln!(w, "{header}")?;
    }

    for (index, group) in visit.groups.iter().enumerate() {
        writeln!(
            w,
            "  {}. similarity {:.3}",
            index + 1,
            group.max_similarity
        )?;
        for work in &group.works {
            writeln!(w, "     \"{}\" ({})", work.title, work.short_key())?;
        }
        // Comma-joined ids, ready to paste into a merge tool.
        let ids: Vec<&str> = group.works.iter().map(|work| work.short_key()).collect();
        let merge_line = format!("     merge: {}", ids.join(","));
        if color.enabled() {
            writeln!(w, "{}", merge_line.dimmed())?;
        } else {
            writeln!(w, "{merge_line}")?;
        }
    }
    Ok(())
}

/// Machine-readable form of a visit for `--json`.
pub fn visit_json(visit: &Visit) -> serde_json::Value {
    json!({
        "author_id": visit.id,
        "author": &visit.author,
        "work_count": visit.works.len(),
        "groups": &visit.groups,
    })
}
