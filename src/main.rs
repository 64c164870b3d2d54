use clap::Parser;
use git_multi_pull::cancel::CancellationToken;
use git_multi_pull::cli::Cli;
use git_multi_pull::git::GitCli;
use git_multi_pull::{orchestrator, output};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli.config();

    let Some(root) = cli.resolve_root()? else {
        return Ok(ExitCode::SUCCESS);
    };
    output::print_working_dir(&root, &config);

    let cancel = CancellationToken::new();
    let vcs = GitCli::new(&config, cancel.clone());
    let handle = match orchestrator::spawn(root, vcs, cancel) {
        Ok(handle) => handle,
        Err(err) => {
            output::print_start_failure(&err);
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut renderer = output::EventRenderer::new(&config);
    for event in handle.events() {
        renderer.render(&event)?;
    }
    renderer.finish();

    let summary = handle.join()?;
    output::print_summary(&summary, &config);

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
