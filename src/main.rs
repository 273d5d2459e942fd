use clap::Parser;
use http::Method;
use tracing::info;
use tracing_subscriber::EnvFilter;

use restling::registry::Fields;
use restling::{ContentType, Definition, HandlerResult, Server};

#[derive(Parser)]
#[command(name = "restling")]
#[command(about = "Minimal embeddable HTTP server", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut server = Server::new(cli.port);

    server.link("/", Definition::new(Method::GET, ContentType::TEXT_HTML, index));
    server.link("/echo", Definition::new(Method::POST, ContentType::TEXT_PLAIN, echo));

    server.start()?;
    info!(port = server.port(), "Serving; send SIGINT or SIGTERM to stop");

    wait_for_shutdown()?;
    server.stop()?;
    Ok(())
}

fn index(_arguments: &Fields, _headers: &Fields, _fields: &Fields) -> HandlerResult {
    Ok("<!DOCTYPE html>\n<html>\n\t<body>\n\t\t<h1>restling</h1>\n\t</body>\n</html>\n".to_string())
}

/// Echo query arguments and body fields back as `key=value` lines.
fn echo(arguments: &Fields, _headers: &Fields, fields: &Fields) -> HandlerResult {
    let mut lines: Vec<String> = arguments
        .iter()
        .chain(fields.iter())
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    lines.sort();
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

#[cfg(unix)]
fn wait_for_shutdown() -> anyhow::Result<()> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown() -> anyhow::Result<()> {
    loop {
        std::thread::sleep(std::time::Duration::from_secs(3600));
    }
}
