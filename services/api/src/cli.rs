use crate::console::{run_evaluate, run_quote, run_roles, CalculationArgs, TableArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rate_card::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "rate-card",
    about = "Price roles across onshore, offshore, and nearshore locations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the roles and per-location costs in the current rate table
    Roles(TableArgs),
    /// Derive client rates for a role from a desired margin
    Quote(CalculationArgs),
    /// Check a role's fixed client rate against a target margin
    Evaluate(CalculationArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Roles(args) => run_roles(args).await,
        Command::Quote(args) => run_quote(args).await,
        Command::Evaluate(args) => run_evaluate(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rate_card::pricing::Location;

    #[test]
    fn quote_arguments_parse() {
        let cli = Cli::try_parse_from([
            "rate-card",
            "quote",
            "--role",
            "Junior Developer",
            "--location",
            "offshore",
            "--hours",
            "40",
            "--margin",
            "0.3",
            "--table",
            "rates.csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Quote(args)) => {
                assert_eq!(args.role, "Junior Developer");
                assert_eq!(args.location, Location::Offshore);
                assert_eq!(args.hours, 40.0);
                assert_eq!(args.margin, 0.3);
                assert_eq!(
                    args.table.table.as_deref(),
                    Some(std::path::Path::new("rates.csv"))
                );
            }
            other => panic!("expected quote command, got {other:?}"),
        }
    }

    #[test]
    fn unknown_location_is_rejected() {
        let error = Cli::try_parse_from([
            "rate-card",
            "evaluate",
            "--role",
            "Release Manager",
            "--location",
            "lunar",
            "--hours",
            "1",
            "--margin",
            "0.6",
        ])
        .expect_err("location must be known");
        assert!(error.to_string().contains("lunar"));
    }

    #[test]
    fn evaluate_accepts_target_margin_flag() {
        let cli = Cli::try_parse_from([
            "rate-card",
            "evaluate",
            "--role",
            "Release Manager",
            "--location",
            "Nearshore",
            "--hours",
            "12.5",
            "--target-margin",
            "0.6",
            "--url",
            "https://sheets.example.com/export?format=csv",
        ])
        .expect("arguments parse");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.location, Location::Nearshore);
                assert_eq!(args.margin, 0.6);
                assert!(args.table.url.is_some());
                assert!(args.table.table.is_none());
            }
            other => panic!("expected evaluate command, got {other:?}"),
        }
    }

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["rate-card"]).expect("no arguments parse");
        assert!(cli.command.is_none());
    }
}
