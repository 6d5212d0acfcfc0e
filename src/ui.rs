//! Terminal output: spinners and colored tables.
//!
//! Uses `indicatif` for the scenario spinner and `console` for styling.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use coopflow::demo::ScenarioReport;
use coopflow::workflow::{
    AuditRecord, AvailableAction, EdgeKind, Proposal, Status, TransitionDefinition,
};

/// Spinner shown while a scenario walks a proposal through the graph.
pub struct ScenarioProgress {
    pb: ProgressBar,
    green: Style,
    red: Style,
    yellow: Style,
}

impl ScenarioProgress {
    pub fn start(name: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("{name}: starting"));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
        }
    }

    pub fn step(&self, proposal: &Proposal) {
        self.pb.set_message(format!(
            "{} ({})",
            proposal.status,
            proposal.status.phase()
        ));
    }

    pub fn finish(&self, report: &ScenarioReport) {
        self.pb.finish_and_clear();
        let style = match report.final_status {
            Status::Rejected => &self.red,
            Status::Completed | Status::DocumentExchange => &self.green,
            _ => &self.yellow,
        };
        println!(
            "  {} {}: ended in {} after {} records (revisions: {}, partner signed: {}, leadership signed: {})",
            style.apply_to("●"),
            report.scenario,
            style.apply_to(report.final_status),
            report.history.len(),
            report.revision_count,
            report.partner_track_complete,
            report.leadership_track_complete,
        );
        if let Some(refused) = &report.refused {
            println!("    {} refused as expected: {refused}", self.red.apply_to("✗"));
        }
    }

    pub fn fail(&self, message: &str) {
        self.pb.finish_and_clear();
        println!("  {} {message}", self.red.apply_to("✗"));
    }
}

pub fn print_history(history: &[AuditRecord]) {
    let dim = Style::new().dim();
    for record in history {
        let from = record
            .from_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "    {} {:<22} {:>28} → {:<28} {} ({})",
            dim.apply_to(record.timestamp.format("%H:%M:%S%.3f")),
            record.action,
            from,
            record.to_status,
            record.actor,
            record.role,
        );
        if let Some(comment) = &record.comment {
            println!("      {}", dim.apply_to(format!("“{comment}”")));
        }
    }
}

pub fn print_edges<'a>(edges: impl IntoIterator<Item = &'a TransitionDefinition>) {
    let bold = Style::new().bold();
    let cyan = Style::new().cyan();
    let mut last: Option<Status> = None;
    for edge in edges {
        if last != Some(edge.from) {
            println!("{} [{}]", bold.apply_to(edge.from), edge.from.phase());
            last = Some(edge.from);
        }
        let roles: Vec<&str> = edge.roles.iter().map(|r| r.as_str()).collect();
        let kind = match edge.kind {
            EdgeKind::GatewayReject => Style::new().red().apply_to(edge.kind.to_string()),
            EdgeKind::Join(_) => cyan.apply_to(edge.kind.to_string()),
            _ => Style::new().apply_to(edge.kind.to_string()),
        };
        println!(
            "  {:<22} → {:<28} {:<16} roles: {:<28} evidence: {}",
            edge.action,
            edge.to,
            kind,
            roles.join(","),
            edge.evidence
        );
    }
}

pub fn print_actions(status: Status, actions: &[AvailableAction]) {
    if actions.is_empty() {
        println!("No actions available from {status}.");
        return;
    }
    let yellow = Style::new().yellow();
    for action in actions {
        let evidence = if action.requires_evidence {
            yellow.apply_to(format!("requires {}", action.evidence)).to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<30} {:<22} → {:<28} {evidence}",
            action.label, action.action, action.target
        );
    }
}
