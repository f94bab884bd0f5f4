mod commands;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use walkgraph_cli::client::Client;
use walkgraph_cli::output::OutputFormat;
use walkgraph_cli::point::parse_point;
use walkgraph_cli::terminal::ColorPalette;
use walkgraph_lib::Location;

use commands::Session;

#[derive(Parser, Debug)]
#[command(author, version, about = "Walk graph service client")]
struct Cli {
    /// Service address.
    #[arg(long, env = "WALKGRAPH_ADDR", default_value = "127.0.0.1:12345")]
    addr: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Seconds to wait for a connection or a reply.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a walk through two or more points.
    Walk {
        /// A visited point as `x,y`; repeat in walking order.
        #[arg(long = "point", value_parser = parse_point, required = true, allow_hyphen_values = true)]
        points: Vec<Location>,
        /// Length of each leg; one fewer than the points.
        #[arg(long = "length", required = true)]
        lengths: Vec<u32>,
    },
    /// Shortest path length between two known places.
    Shortest {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Location,
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Location,
    },
    /// Sum of shortest path lengths from a place to everything it reaches.
    Total {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Location,
    },
    /// Forget every place and edge.
    Reset,
    /// Graph size counters.
    Stats,
    /// Send every request in a JSON Lines file (`-` for stdin) in order.
    Replay {
        file: PathBuf,
        /// Stop at the first failed reply.
        #[arg(long)]
        stop_on_error: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let palette = if cli.no_color || cli.format == OutputFormat::Json {
        ColorPalette::plain()
    } else {
        ColorPalette::detect()
    };
    if let Command::Walk { points, lengths } = &cli.command {
        commands::walk::check_legs(points, lengths)?;
    }

    let client = Client::connect(&cli.addr, Duration::from_secs(cli.timeout)).await?;
    let mut session = Session {
        client,
        format: cli.format,
        palette,
    };

    let succeeded = match cli.command {
        Command::Walk { points, lengths } => {
            commands::walk::handle_walk(&mut session, points, lengths).await?
        }
        Command::Shortest { from, to } => {
            commands::query::handle_shortest(&mut session, from, to).await?
        }
        Command::Total { from } => commands::query::handle_total(&mut session, from).await?,
        Command::Reset => commands::admin::handle_reset(&mut session).await?,
        Command::Stats => commands::admin::handle_stats(&mut session).await?,
        Command::Replay {
            file,
            stop_on_error,
        } => commands::replay::handle_replay(&mut session, &file, stop_on_error).await?,
    };

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
