//! CLI for provisioning the SSM tunnel access policy and reconciling its IAM
//! attachments.
//!
//! Exit codes: 0 converged, 1 partial failure or backend failure, 2 invalid
//! input.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use iam_ssm_tunnel_access::{
    tunnel_policy_document, PolicySpec, PrincipalSet, RunReport, TunnelAccessError,
    TunnelAccessService,
};

#[derive(Parser)]
#[command(
    name = "iam-ssm-tunnel-access",
    version,
    about = "Manage the SSM Session Manager tunnel access policy and its IAM attachments"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Provision the managed policy and converge attachments on the declared principals
    Apply(ApplyArgs),
    /// Detach all principals and delete the managed policy
    Destroy(SpecArgs),
}

#[derive(clap::Args)]
struct SpecArgs {
    /// Environment name, prepended to the policy name
    #[arg(long)]
    env: String,

    /// Policy name suffix; the resolved name is `{env}-{name}`
    #[arg(long, default_value = "ssm-tunnel-access")]
    name: String,

    /// Path to a JSON policy document (defaults to the built-in tunnel document)
    #[arg(long)]
    policy_file: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ApplyArgs {
    #[command(flatten)]
    spec: SpecArgs,

    /// IAM user ARN to attach (repeatable)
    #[arg(long = "user-arn")]
    user_arns: Vec<String>,

    /// IAM role ARN to attach (repeatable)
    #[arg(long = "role-arn")]
    role_arns: Vec<String>,

    /// IAM group ARN to attach (repeatable)
    #[arg(long = "group-arn")]
    group_arns: Vec<String>,

    /// Whether attachment should occur at all; `false` detaches attachments
    /// left over from earlier runs
    #[arg(long = "attach-policy", default_value_t = true, action = ArgAction::Set)]
    attach_policy: bool,
}

fn load_document(args: &SpecArgs) -> anyhow::Result<serde_json::Value> {
    match &args.policy_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read policy document {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("policy document {} is not valid JSON", path.display()))
        }
        None => Ok(tunnel_policy_document()),
    }
}

fn policy_spec(args: &SpecArgs, attach_enabled: bool) -> anyhow::Result<PolicySpec> {
    Ok(PolicySpec {
        name_prefix: args.name.clone(),
        env_name: args.env.clone(),
        document: load_document(args)?,
        attach_enabled,
    })
}

/// Cancel the run on ctrl-c; in-flight operations finish, no new ones start.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received, finishing in-flight operations");
            trigger.cancel();
        }
    });
    cancel
}

fn render_report(report: &RunReport) -> ExitCode {
    for failure in &report.outcome.failed {
        log::error!("{}", failure.error);
    }
    for failure in &report.outcome.kind_failures {
        log::error!(
            "failed to list {} attachments: {}",
            failure.kind,
            failure.error
        );
    }
    if report.outcome.cancelled {
        log::error!("{}", TunnelAccessError::Cancelled);
    }
    let body = serde_json::json!({
        "policy_arn": report.policy_arn,
        "summary": report.summary,
    });
    println!("{body:#}");
    ExitCode::from(report_exit_code(report))
}

/// 0 only when the run fully converged: no failures and not cancelled.
fn report_exit_code(report: &RunReport) -> u8 {
    if report.outcome.cancelled || report.outcome.has_failures() {
        1
    } else {
        0
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let cancel = cancel_on_ctrl_c();
    match cli.command {
        Command::Apply(args) => {
            let spec = policy_spec(&args.spec, args.attach_policy)?;
            let principals = PrincipalSet::new(args.user_arns, args.role_arns, args.group_arns)?;
            let service = match TunnelAccessService::new().await {
                Ok(service) => service,
                Err(e) => {
                    log::error!("failed to initialize service: {e}");
                    return Ok(ExitCode::from(1));
                }
            };
            match service.apply(&spec, &principals, &cancel).await {
                Ok(report) => Ok(render_report(&report)),
                Err(e) => {
                    log::error!("apply failed: {e}");
                    Ok(ExitCode::from(1))
                }
            }
        }
        Command::Destroy(args) => {
            let spec = policy_spec(&args, false)?;
            let service = match TunnelAccessService::new().await {
                Ok(service) => service,
                Err(e) => {
                    log::error!("failed to initialize service: {e}");
                    return Ok(ExitCode::from(1));
                }
            };
            match service.destroy(&spec, &cancel).await {
                Ok(None) => Ok(ExitCode::SUCCESS),
                Ok(Some(report)) => Ok(render_report(&report)),
                Err(e) => {
                    log::error!("destroy failed: {e}");
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
