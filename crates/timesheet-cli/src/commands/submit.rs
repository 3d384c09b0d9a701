use timesheet_core::{Config, RemoteOutcome};

use super::{open_service, print_json, CliResult, Context};

pub fn run(ctx: &Context, config: Config) -> CliResult {
    let service = open_service(config)?;
    let mut week = ctx.open_week(&service)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let report = runtime.block_on(service.submit(&mut week))?;
    print_json(&report)?;

    if let Some(err) = &report.export_error {
        eprintln!("warning: export failed: {err}");
    }
    if let RemoteOutcome::Failed(msg) = &report.remote {
        eprintln!("warning: could not submit to server: {msg}");
    }
    if let Some(err) = &report.receipt_error {
        eprintln!("warning: could not record submission receipt: {err}");
    }
    Ok(())
}
