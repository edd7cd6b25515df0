use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match isotrack::run() {
        Ok(()) => Ok(ExitCode::SUCCESS),
        // Bad input: report and leave state untouched.
        Err(e) if e.is_recoverable() => {
            eprintln!("error: {}", e);
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(anyhow::Error::new(e).context("isotrack failed")),
    }
}
