//! TUI rendering traits for globalcal types.
//!
//! This module provides extension traits that add colored terminal rendering
//! to globalcal-core types using owo_colors.

use globalcal_core::event::StoredEvent;
use globalcal_core::registry::SweepReport;
use globalcal_core::source::SourceConfig;
use globalcal_core::sync::{SyncAction, SyncStats};
use owo_colors::OwoColorize;

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for SyncAction {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            SyncAction::Create => symbol.green().to_string(),
            SyncAction::Update => symbol.yellow().to_string(),
            SyncAction::Delete => symbol.red().to_string(),
        }
    }
}

impl Render for SourceConfig {
    fn render(&self) -> String {
        let mut line = format!("📅 {} {}", self.name, format!("#{}", self.id).dimmed());
        line.push_str(&format!(" {}", self.model.cyan()));

        if !self.active {
            line.push_str(&format!(" {}", "(inactive)".dimmed()));
        }

        let last_sync = match self.last_sync {
            Some(at) => format!("synced {}", at.format("%Y-%m-%d %H:%M")),
            None => "never synced".to_string(),
        };
        line.push_str(&format!(" {}", last_sync.dimmed()));

        line
    }
}

impl Render for SyncStats {
    fn render(&self) -> String {
        let mut parts = Vec::new();

        for action in [SyncAction::Create, SyncAction::Update, SyncAction::Delete] {
            let count = self.count(action);
            if count == 0 {
                continue;
            }
            let label = format!("{} {}", count, action_label(action));
            let label = match action {
                SyncAction::Create => label.green().to_string(),
                SyncAction::Update => label.yellow().to_string(),
                SyncAction::Delete => label.red().to_string(),
            };
            parts.push(format!("{} {}", action.render(), label));
        }

        if parts.is_empty() {
            parts.push("No events".dimmed().to_string());
        } else if !self.changed_membership() {
            parts.push("(no events added or removed)".dimmed().to_string());
        }

        if self.skipped > 0 {
            parts.push(format!("({} without a start)", self.skipped).dimmed().to_string());
        }

        format!("   {}", parts.join("  "))
    }
}

fn action_label(action: SyncAction) -> &'static str {
    match action {
        SyncAction::Create => "created",
        SyncAction::Update => "updated",
        SyncAction::Delete => "deleted",
    }
}

impl Render for SweepReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for outcome in &self.outcomes {
            lines.push(format!(
                "📅 {} {}",
                outcome.name,
                format!("#{}", outcome.source_id).dimmed()
            ));
            match &outcome.result {
                Ok(stats) => lines.push(stats.render()),
                Err(e) => lines.push(format!("   {}", e.to_string().red())),
            }
        }

        let totals = self.totals();
        lines.push(String::new());
        lines.push(format!(
            "Synced {} created, {} updated, {} deleted",
            totals.created, totals.updated, totals.deleted
        ));

        lines.join("\n")
    }
}

impl Render for StoredEvent {
    fn render(&self) -> String {
        let event = &self.event;

        let (br, bg, bb) = event.background.rgb();
        let (fr, fg, fb) = event.text_color.rgb();
        let title = format!(" {} ", event.title)
            .on_truecolor(br, bg, bb)
            .truecolor(fr, fg, fb)
            .to_string();

        let time = if event.all_day {
            if event.start.date() == event.stop.date() {
                event.start.format("%Y-%m-%d").to_string()
            } else {
                format!(
                    "{} → {}",
                    event.start.format("%Y-%m-%d"),
                    event.stop.format("%Y-%m-%d")
                )
            }
        } else if event.start == event.stop {
            event.start.format("%Y-%m-%d %H:%M").to_string()
        } else if event.start.date() == event.stop.date() {
            format!(
                "{} → {}",
                event.start.format("%Y-%m-%d %H:%M"),
                event.stop.format("%H:%M")
            )
        } else {
            format!(
                "{} → {}",
                event.start.format("%Y-%m-%d %H:%M"),
                event.stop.format("%Y-%m-%d %H:%M")
            )
        };

        let owners = match (event.owner_ids.as_slice(), event.visible_to_everyone) {
            ([], true) => "everyone".to_string(),
            ([], false) => "no owner".to_string(),
            (ids, _) => ids
                .iter()
                .map(|id| format!("user {id}"))
                .collect::<Vec<_>>()
                .join(", "),
        };

        format!(
            "{} {} {} {}",
            title,
            time.dimmed(),
            event.origin.to_string().cyan(),
            owners.dimmed()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_list_only_nonzero_counts() {
        let stats = SyncStats {
            created: 2,
            updated: 0,
            deleted: 1,
            skipped: 0,
        };
        let rendered = stats.render();
        assert!(rendered.contains("2 created"));
        assert!(rendered.contains("1 deleted"));
        assert!(!rendered.contains("updated"));
    }

    #[test]
    fn test_empty_stats() {
        assert!(SyncStats::default().render().contains("No events"));
    }
}
