use std::ffi::OsString;

use clap::Parser;
use startup::{startup, StartupConfig, StartupError};
use tracing::error;

mod telemetry;

#[derive(Parser)]
#[command(name = "prism-entrypoint")]
#[command(
    about = "Prism container entrypoint: wait for the database, migrate, build assets, then exec the server"
)]
struct Args {
    /// Log the resolved startup configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Server command and its arguments, executed in place of this process
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        required_unless_present = "print_config"
    )]
    command: Vec<OsString>,
}

fn main() {
    telemetry::init_tracing();

    // Help and usage errors exit 0 and 2 respectively
    let args = Args::try_parse().unwrap_or_else(|e| e.exit());

    // Environment is read exactly once, before any step touches the application
    let config = match StartupConfig::from_env() {
        Ok(config) => config,
        Err(e) => fail(e),
    };
    config.log_summary();

    if args.print_config {
        return;
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("❌ Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = runtime.block_on(async move {
        startup(config)
            .with_defaults()
            .build()?
            .run(args.command)
            .await
    });

    // Nothing from the runtime may outlive the exec
    drop(runtime);

    let handoff = match result {
        Ok(handoff) => handoff,
        Err(e) => fail(e),
    };

    fail(handoff.exec())
}

fn fail(err: StartupError) -> ! {
    let code = err.exit_code();
    error!(exit_code = code, error = %err, "startup=failed");
    eprintln!("❌ Startup failed: {err}");
    std::process::exit(code);
}
