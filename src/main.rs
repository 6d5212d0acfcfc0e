mod cli;
mod ui;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use console::Style;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use coopflow::config::CoopflowConfig;
use coopflow::demo::{self, Scenario};
use coopflow::workflow::{
    AuditRecord, AuthorizationGuard, AvailableAction, InMemoryAuditTrail, InMemoryProposalStore,
    LogNotifier, ProposalId, ProposalStore, Role, Status, TransitionRegistry, WorkflowEngine,
    replay,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CoopflowConfig::load(cli.config.as_deref())?;
    init_tracing(&config, cli.verbose);

    let registry = Arc::new(TransitionRegistry::standard().context("transition graph is invalid")?);

    match cli.command {
        Command::Graph { json } => {
            if json {
                let edges: Vec<_> = registry.iter().collect();
                println!("{}", serde_json::to_string_pretty(&edges)?);
            } else {
                ui::print_edges(registry.iter());
            }
        }
        Command::Validate => {
            let green = Style::new().green().bold();
            println!(
                "{} transition graph is valid: {} statuses, {} edges, {} gateway decisions",
                green.apply_to("✓"),
                Status::ALL.len(),
                registry.len(),
                registry.gateway_count(),
            );
        }
        Command::Actions { status, role } => {
            let role = Role::from(role);
            let actions: Vec<AvailableAction> = AuthorizationGuard::new(&registry)
                .permitted(status, role)
                .map(AvailableAction::from)
                .collect();
            println!("Actions for {role} at {status}:");
            ui::print_actions(status, &actions);
        }
        Command::Demo { scenario, export } => {
            run_demo(registry, &config, &scenario.scenarios(), export.as_deref())?;
        }
        Command::Replay { file } => replay_file(&file)?,
    }

    Ok(())
}

fn init_tracing(config: &CoopflowConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run_demo(
    registry: Arc<TransitionRegistry>,
    config: &CoopflowConfig,
    scenarios: &[Scenario],
    export: Option<&Path>,
) -> Result<()> {
    let engine = WorkflowEngine::new(
        registry,
        InMemoryProposalStore::new(),
        InMemoryAuditTrail::new(),
    )
    .with_join_reset(config.join_reset)
    .with_notifier(LogNotifier);

    let mut events = engine.store().subscribe();
    let bold = Style::new().bold();

    for &scenario in scenarios {
        println!("{}", bold.apply_to(format!("Scenario: {scenario}")));
        let progress = ui::ScenarioProgress::start(&scenario.to_string());
        match demo::run_scenario(&engine, scenario, &mut |proposal| progress.step(proposal)) {
            Ok(report) => {
                progress.finish(&report);
                ui::print_history(&report.history);
            }
            Err(err) => {
                progress.fail(&err.to_string());
                return Err(err).with_context(|| format!("scenario {scenario} failed"));
            }
        }
    }

    let mut event_count = 0usize;
    while events.try_recv().is_ok() {
        event_count += 1;
    }
    tracing::debug!(event_count, "Store events observed during demo");

    if let Some(path) = export {
        let records = engine.audit().export()?;
        std::fs::write(path, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("failed to write audit export {}", path.display()))?;
        println!("Wrote {} audit records to {}", records.len(), path.display());
    }

    Ok(())
}

fn replay_file(path: &Path) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read audit export {}", path.display()))?;
    let records: Vec<AuditRecord> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse audit export {}", path.display()))?;

    let mut histories: Vec<(ProposalId, Vec<AuditRecord>)> = Vec::new();
    for record in records {
        match histories.iter_mut().find(|(id, _)| *id == record.proposal_id) {
            Some((_, history)) => history.push(record),
            None => histories.push((record.proposal_id, vec![record])),
        }
    }

    if histories.is_empty() {
        bail!("{} contains no audit records", path.display());
    }

    let green = Style::new().green();
    for (id, history) in &histories {
        let status = replay(*id, history).with_context(|| format!("history of {id} is broken"))?;
        let status = status.map_or_else(|| "-".to_string(), |s| s.to_string());
        println!(
            "{} {id}: {} records, ends in {}",
            green.apply_to("✓"),
            history.len(),
            status
        );
    }

    Ok(())
}
