use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use sling_core::RemoteTarget;
use sling_remote::{Orchestrator, Plan, ScpTransfer, SecretStore, SshConnector};

use crate::args::{CommonArgs, OptionArgs, RemoteArgs};
use crate::output::{self, ConsoleSink, Style};

/// Render, write, then run the remote pipeline.
pub async fn deploy(
    common: &CommonArgs,
    flags: &OptionArgs,
    remote: &RemoteArgs,
) -> anyhow::Result<()> {
    let resolved = super::resolve(common, flags, |v| v.deploy_requirements().to_vec())?;
    let style = Style::detect();
    let variant = resolved.variant;
    let options = &resolved.options;
    let settings = &resolved.config.remote;

    // Every artifact is on disk before anything touches the network.
    println!("Rendering {variant} artifacts...");
    let artifacts = sling_render::render_variant(variant, options)?;
    let stored = sling_render::write_all(&common.out_dir, &artifacts)?;
    for artifact in &stored {
        println!("  {}", artifact.path.display());
    }

    let plan = Plan::for_variant(variant, options, &stored)?;
    let secrets = SecretStore::from_options(options);
    plan.validate(&secrets)?;

    let passphrase = remote.key_passphrase.clone().map(SecretString::from);
    let target = RemoteTarget::from_options(options, settings.host_key_policy, passphrase)
        .context("invalid deploy target")?;

    let stage_timeout = remote
        .stage_timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| settings.stage_timeout());
    let connector = SshConnector::new()
        .with_connect_timeout(settings.connect_timeout())
        .with_prompts(resolved.config.prompts.iter().cloned());
    let transfer = ScpTransfer::with_programs(&settings.ssh_program, &settings.scp_program);
    let orchestrator = Orchestrator::new(connector, transfer).with_stage_timeout(stage_timeout);

    println!("Deploying to {target} ({} stages)...", plan.len());
    let mut sink = ConsoleSink::new(style);
    let result = orchestrator.run(&target, &plan, &secrets, &mut sink).await;

    if result.succeeded() {
        println!();
        println!("{}", style.green(&format!("Deployed to {}", target.host)));
        return Ok(());
    }

    eprintln!();
    eprintln!("{}", output::failure_report(style, &result, plan.len()));
    match result.failed_stage() {
        Some(index) => anyhow::bail!("deploy aborted at stage {index}"),
        None => anyhow::bail!("deploy failed before any stage ran"),
    }
}
