//! llvmpack - LLVM+Clang toolchain release pipeline
//!
//! Builds the toolchain, audits the runtime dependency footprint of the
//! shipped binaries, bundles the install tree into a tar.xz archive, and
//! publishes it as a GitHub release asset.

use clap::Parser;
use llvmpack::cli::CliArgs;
use llvmpack::pipeline::Pipeline;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    if args.verbose {
        eprintln!("llvmpack v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Version: {}", args.bundle_version());
        eprintln!("Work dir: {}", args.work_dir.display());
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<()> {
    let mut pipeline = Pipeline::new(args);
    pipeline.run().await?;
    Ok(())
}
