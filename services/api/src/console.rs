use clap::Args;
use rate_card::acquisition::{AcquisitionChain, AcquisitionError, LoadedTable};
use rate_card::config::{AppConfig, RateTableConfig};
use rate_card::error::AppError;
use rate_card::pricing::{
    evaluate, format_currency, format_percentage, format_rate_or_na, format_whole_percentage,
    quote, CalculationInput, EvaluationResult, Location, QuoteResult, RateTable,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default, Clone)]
pub(crate) struct TableArgs {
    /// Local CSV or JSON rate table (overrides RATE_CARD_PATH)
    #[arg(long)]
    pub(crate) table: Option<PathBuf>,
    /// Published spreadsheet export URL (overrides RATE_CARD_URL)
    #[arg(long)]
    pub(crate) url: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct CalculationArgs {
    /// Role name exactly as it appears in the rate table
    #[arg(long)]
    pub(crate) role: String,
    /// onshore, offshore, or nearshore
    #[arg(long)]
    pub(crate) location: Location,
    /// Billed hours
    #[arg(long)]
    pub(crate) hours: f64,
    /// Desired margin (quote) or target margin (evaluate) as a fraction, e.g. 0.3
    #[arg(long, visible_alias = "target-margin")]
    pub(crate) margin: f64,
    #[command(flatten)]
    pub(crate) table: TableArgs,
}

impl CalculationArgs {
    fn input(&self) -> Result<CalculationInput, AppError> {
        Ok(CalculationInput::new(
            self.role.as_str(),
            self.location,
            self.hours,
            self.margin,
        )?)
    }
}

pub(crate) async fn run_roles(args: TableArgs) -> Result<(), AppError> {
    let loaded = load_table(&args).await?;
    print!("{}", render_roles(&loaded));
    Ok(())
}

pub(crate) async fn run_quote(args: CalculationArgs) -> Result<(), AppError> {
    let input = args.input()?;
    let loaded = load_table(&args.table).await?;
    let result = quote(&loaded.table, &input)?;
    print!("{}", render_quote(&result));
    println!("{}", source_line(&loaded));
    Ok(())
}

pub(crate) async fn run_evaluate(args: CalculationArgs) -> Result<(), AppError> {
    let input = args.input()?;
    let loaded = load_table(&args.table).await?;
    let result = evaluate(&loaded.table, &input)?;
    print!("{}", render_evaluation(&result));
    println!("{}", source_line(&loaded));
    Ok(())
}

fn table_config(args: &TableArgs) -> Result<RateTableConfig, AppError> {
    let mut config = AppConfig::load()?.rate_table;
    if let Some(path) = &args.table {
        config.path = Some(path.clone());
    }
    if let Some(url) = &args.url {
        config.url = Some(url.clone());
    }
    Ok(config)
}

async fn load_table(args: &TableArgs) -> Result<LoadedTable, AppError> {
    let chain = Arc::new(AcquisitionChain::from_config(&table_config(args)?));
    let loaded = tokio::task::spawn_blocking(move || chain.load())
        .await
        .map_err(|err| AcquisitionError::Interrupted(err.to_string()))??;
    Ok(loaded)
}

fn source_line(loaded: &LoadedTable) -> String {
    format!(
        "\nRate table: {} ({} roles, loaded {})",
        loaded.source,
        loaded.table.len(),
        loaded.loaded_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

pub(crate) fn render_roles(loaded: &LoadedTable) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", role_table(&loaded.table));
    let _ = writeln!(out, "{}", source_line(loaded).trim_start());
    out
}

fn role_table(table: &RateTable) -> String {
    let mut out = String::from("Roles");
    for record in table.records() {
        let costs = record
            .costs
            .iter()
            .map(|(location, cost)| format!("{} {}", location, format_rate_or_na(*cost)))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(out, "\n- {}: {}", record.role, costs);
        if let Some(rate) = record.client_rate {
            let _ = write!(out, " | client rate {}", format_currency(rate));
        }
    }
    out
}

pub(crate) fn render_quote(result: &QuoteResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Quote: {} ({})", result.role, result.location);
    let _ = writeln!(
        out,
        "Hours: {} | Desired margin: {}",
        result.hours,
        format_percentage(result.desired_margin)
    );
    let _ = writeln!(
        out,
        "Cost/hr: {} | Client rate/hr: {} | Total cost to client: {}",
        format_currency(result.cost),
        format_currency(result.client_rate),
        format_currency(result.total_cost)
    );

    let _ = writeln!(out, "\nLocation comparison");
    for (location, entry) in result.comparison.iter() {
        let margin = entry
            .achieved_margin
            .map(format_percentage)
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(
            out,
            "- {}: cost {}, client rate {}, margin {}, total {}",
            location,
            format_rate_or_na(entry.cost),
            format_rate_or_na(entry.client_rate),
            margin,
            format_currency(result.hours * entry.client_rate)
        );
    }
    out
}

pub(crate) fn render_evaluation(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Evaluation: {} ({}) at fixed client rate {}",
        result.role,
        result.location,
        format_currency(result.client_rate)
    );
    let _ = writeln!(
        out,
        "Hours: {} | Target margin: {} | Margin: {} ({})",
        result.hours,
        format_whole_percentage(result.target_margin),
        format_percentage(result.margin),
        if result.meets_target {
            "meets target"
        } else {
            "below target"
        }
    );
    let _ = writeln!(out, "Total cost: {}", format_currency(result.total_cost));

    let _ = writeln!(out, "\nLocation comparison");
    for (location, entry) in result.comparison.iter() {
        let (margin, verdict) = match (entry.cost > 0.0, entry.meets_target) {
            (false, _) => ("N/A".to_string(), "not offered"),
            (true, true) => (format_percentage(entry.margin), "meets target"),
            (true, false) => (format_percentage(entry.margin), "below target"),
        };
        let _ = writeln!(
            out,
            "- {}: cost {}, margin {}, {}",
            location,
            format_rate_or_na(entry.cost),
            margin,
            verdict
        );
    }

    let _ = writeln!(out, "\nRecommendation: {}", result.recommendation);
    out
}
