//! `leadscout`: find under-served local businesses, keep a small CRM list,
//! and generate analyses and WhatsApp pitches for them.
//!
//! The last scan is kept beside the lead list so `more` and `save` work
//! across invocations.

mod launcher;
mod render;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dialoguer::Confirm;
use launcher::SystemLauncher;
use leadscout_core::{
    read_json, write_json, App, Config, Dispatch, GeminiBackend, GenerativeBackend, LeadStatus,
    LeadStore, ProspectingClient, SaveOutcome, ScanResult, ScanSession, ViewMode,
};
use std::path::PathBuf;

const SESSION_FILE: &str = ".leadscout-scan.json";

#[derive(Debug, Parser)]
#[command(name = "leadscout", version, about = "Sweet-spot lead prospecting from the terminal")]
struct Cli {
    /// Directory holding the saved leads and the last scan.
    #[arg(long, global = true, env = "LEADSCOUT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search for new leads, replacing the previous results.
    Scan {
        /// City and state, e.g. "Recife, PE".
        location: String,
        #[arg(long, short, default_value = leadscout_core::DEFAULT_NICHE)]
        niche: String,
    },
    /// Fetch another batch for the last scan.
    More,
    /// Show the results of the last scan.
    Results,
    /// Save scan results (1-based numbers) as leads.
    Save {
        #[arg(required = true)]
        numbers: Vec<usize>,
    },
    /// List saved leads.
    Leads,
    /// Move a lead to the next pipeline stage.
    Advance { lead: String },
    /// Set a lead's status directly.
    Status { lead: String, status: LeadStatus },
    /// Delete a saved lead.
    Delete {
        lead: String,
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
    /// Run a deep competitive analysis.
    Analyze {
        #[command(flatten)]
        target: Target,
    },
    /// Generate a sales pitch and optionally hand it off.
    Pitch {
        #[command(flatten)]
        target: Target,
        /// Open WhatsApp with the pitch, or copy it when there is no number.
        #[arg(long, conflicts_with = "copy")]
        send: bool,
        /// Copy the pitch to the clipboard.
        #[arg(long)]
        copy: bool,
    },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Saved lead id (or unique prefix).
    #[arg(long)]
    lead: Option<String>,
    /// Result number from the last scan.
    #[arg(long)]
    result: Option<usize>,
}

fn short(id: &str) -> String {
    id.chars().take(8).collect()
}

fn result_at(session: &ScanSession, number: usize) -> Result<&ScanResult> {
    number
        .checked_sub(1)
        .and_then(|index| session.results.get(index))
        .with_context(|| format!("no scan result #{number}; run `leadscout results`"))
}

fn resolve_lead_id<B: GenerativeBackend>(app: &App<B>, reference: &str) -> Result<String> {
    app.store()
        .resolve(reference)
        .map(|lead| lead.id.clone())
        .with_context(|| format!("no saved lead matches '{reference}'"))
}

fn resolve_target<B: GenerativeBackend>(app: &App<B>, target: &Target) -> Result<ScanResult> {
    match (&target.lead, target.result) {
        (Some(reference), _) => {
            let id = resolve_lead_id(app, reference)?;
            app.store()
                .get(&id)
                .map(|lead| lead.details.clone())
                .context("lead disappeared")
        }
        (None, Some(number)) => result_at(app.session(), number).cloned(),
        (None, None) => bail!("pass --lead or --result"),
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    log::debug!("data dir {}", config.data_dir.display());

    let session: ScanSession = read_json(&config.data_dir, SESSION_FILE);
    let store = LeadStore::open(&config.data_dir);
    let backend = GeminiBackend::new(config.api_key.clone());
    let client = ProspectingClient::from_config(backend, &config);
    let mut app = App::new(client, store).with_session(session);

    let outcome = run(&mut app, cli.command);
    render::notices(&app.take_notices());
    outcome?;

    write_json(&config.data_dir, SESSION_FILE, app.session())
        .context("failed to persist the scan session")?;
    Ok(())
}

fn run(app: &mut App<GeminiBackend>, command: Command) -> Result<()> {
    match command {
        Command::Scan { location, niche } => {
            app.switch_mode(ViewMode::Scanning);
            app.scan(&niche, &location);
            render::session(app.session(), |name| app.is_saved(name));
        }
        Command::More => {
            app.switch_mode(ViewMode::Scanning);
            app.load_more();
            render::session(app.session(), |name| app.is_saved(name));
        }
        Command::Results => {
            render::session(app.session(), |name| app.is_saved(name));
        }
        Command::Save { numbers } => {
            for number in numbers {
                let name = result_at(app.session(), number)?.name.clone();
                match app.save_result(number - 1) {
                    SaveOutcome::Saved(lead) => {
                        println!("saved {} ({})", lead.details.name, short(&lead.id))
                    }
                    SaveOutcome::AlreadySaved => println!("{name} is already saved"),
                    SaveOutcome::NoSuchResult => bail!("no scan result #{number}"),
                    SaveOutcome::Failed => eprintln!("{name} was not saved"),
                }
            }
        }
        Command::Leads => {
            app.switch_mode(ViewMode::RelationshipManagement);
            render::leads(app.leads());
        }
        Command::Advance { lead } => {
            let id = resolve_lead_id(app, &lead)?;
            if let Some(status) = app.cycle_status(&id) {
                println!("{} → {}", short(&id), status.label());
            }
        }
        Command::Status { lead, status } => {
            let id = resolve_lead_id(app, &lead)?;
            if let Some(status) = app.set_status(&id, status) {
                println!("{} → {}", short(&id), status.label());
            }
        }
        Command::Delete { lead, yes } => {
            let id = resolve_lead_id(app, &lead)?;
            let mut prompt_error = None;
            let removed = app.delete_lead(&id, |lead| {
                if yes {
                    return true;
                }
                Confirm::new()
                    .with_prompt(format!("Delete {}?", lead.details.name))
                    .default(false)
                    .interact()
                    .unwrap_or_else(|error| {
                        prompt_error = Some(error);
                        false
                    })
            });
            if let Some(error) = prompt_error {
                return Err(error).context("confirmation prompt failed");
            }
            if removed {
                println!("deleted {}", short(&id));
            }
        }
        Command::Analyze { target } => {
            let prospect = resolve_target(app, &target)?;
            app.open_analysis(&prospect);
            if let Some(report) = &app.modal().analysis {
                render::analysis(&prospect.name, report);
            }
        }
        Command::Pitch { target, send, copy } => {
            let prospect = resolve_target(app, &target)?;
            app.open_pitch(&prospect);
            let Some(pitch) = app.modal().pitch.clone() else {
                return Ok(());
            };
            render::pitch(&prospect.name, &pitch);
            if copy {
                app.copy_pitch(&mut SystemLauncher);
            } else if send {
                if let Some(Dispatch::Launched(url)) = app.dispatch_pitch(&mut SystemLauncher) {
                    println!("opened {url}");
                }
            }
        }
    }
    Ok(())
}
