use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use production_admin::modules::{seed, status_update};
use production_db::{OrderKey, ProductionStatus};
use production_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(
    name = "production-admin",
    version,
    about = "Seed and maintain the productions collection"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the application user, the indexes and three sample records
    Seed,
    /// Set the status of one order, then print it and the per-status counts
    UpdateStatus(UpdateStatusArgs),
    /// Print per-status record counts
    Report {
        /// Count every known status, with its description, instead of
        /// PENDING/IN_PROGRESS/DONE
        #[arg(long)]
        all: bool,
    },
}

#[derive(Debug, Args)]
struct UpdateStatusArgs {
    /// Order identifier to update, matched as an integer. The legacy
    /// maintenance script looked it up as the string "2001"; pass --text-key
    /// to reproduce that lookup
    #[arg(long, default_value_t = status_update::DEFAULT_ORDER_ID.to_string())]
    order_id: String,

    /// New status
    #[arg(long, default_value = "IN_PROGRESS")]
    status: ProductionStatus,

    /// Match the order identifier as a string instead of an integer
    #[arg(long)]
    text_key: bool,

    /// Refuse transitions the status lifecycle does not allow
    #[arg(long)]
    strict: bool,
}

impl UpdateStatusArgs {
    fn change(&self) -> anyhow::Result<status_update::StatusChange> {
        let order = if self.text_key {
            OrderKey::Text(self.order_id.clone())
        } else {
            let order_id = self.order_id.trim().parse::<i64>().map_err(|_| {
                anyhow!(
                    "order id '{}' is not an integer; pass --text-key to match it as a string",
                    self.order_id
                )
            })?;
            OrderKey::Int(order_id)
        };

        Ok(status_update::StatusChange {
            order,
            status: self.status,
            enforce_transitions: self.strict,
        })
    }
}

/// A validated command, ready to run once connected.
enum Task {
    Seed,
    UpdateStatus(status_update::StatusChange),
    Report { all: bool },
}

impl TryFrom<Command> for Task {
    type Error = anyhow::Error;

    fn try_from(command: Command) -> anyhow::Result<Self> {
        Ok(match command {
            Command::Seed => Task::Seed,
            Command::UpdateStatus(args) => Task::UpdateStatus(args.change()?),
            Command::Report { all } => Task::Report { all },
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let task = Task::try_from(Cli::parse().command)?;

    let settings = Settings::load().with_context(|| "failed to load production admin settings")?;
    production_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.name,
        "production-admin starting"
    );

    let store = production_db::connect(&settings.database)
        .await
        .with_context(|| format!("failed to connect to database '{}'", settings.database.name))?;

    let now = chrono::Utc::now();
    match task {
        Task::Seed => {
            let summary = seed::run(&store, &settings.seed, now).await?;
            println!("{summary}");
        }
        Task::UpdateStatus(change) => {
            let outcome = status_update::run(&store, &change, now).await?;
            println!("{}", outcome.render()?);
        }
        Task::Report { all: true } => {
            let counts = status_update::count_statuses(&store, &ProductionStatus::ALL).await?;
            println!("Count by status:\n{}", counts.render_described());
        }
        Task::Report { all: false } => {
            let counts =
                status_update::count_statuses(&store, &status_update::REPORTED_STATUSES).await?;
            println!("Count by status:\n{counts}");
        }
    }

    tracing::info!("production-admin finished");
    Ok(())
}
