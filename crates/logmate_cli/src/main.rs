use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use engine_logging::{engine_info, LogDestination};
use logmate_cli::{session, Args};
use logmate_core::FileHandle;

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let config = args.run_config()?;

    let destination = match &config.log_file {
        Some(path) => LogDestination::File(path.clone()),
        None => LogDestination::Terminal,
    };
    engine_logging::initialize(config.log_level, destination);

    let files = args
        .files
        .iter()
        .map(|path| {
            FileHandle::from_path(path).with_context(|| format!("cannot upload {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    engine_info!("Starting session against {}", config.settings.base_url);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let summary = runtime.block_on(session::run(config, files))?;

    println!(
        "{} uploaded, {} upload failures, {} analysed, {} analysis errors, {} exported",
        summary.accepted,
        summary.failed_uploads,
        summary.completed,
        summary.errored,
        summary.exported.len()
    );
    if summary.interrupted {
        println!("interrupted with {} tasks still processing", summary.unfinished);
    }
    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
