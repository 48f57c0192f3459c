//! Finance Client CLI
//!
//! Command-line front end for the finance API client.
//!
//! # Commands
//!
//! - `goals list|add|edit|delete`: savings goals
//! - `categories list|add|delete`: spending categories
//! - `transactions list|add|edit|delete`: income and expense entries
//!
//! The session is taken from `--user-id`/`--token` or `FINANCE_USER_ID`/
//! `FINANCE_TOKEN`. Outcomes are reported as toasts on the log output,
//! listings go to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use finance_client::config;
use finance_client::services::logging;
use finance_client::{
    AuthContext, ClientConfig, FinanceClient, GoalDraft, GoalImage, GoalPatch, LogNotifier, Session,
};
use shared::{Goal, TransactionForm, TransactionType};
use tracing::debug;

/// Personal finance API client
#[derive(Parser)]
#[command(name = "finance-client")]
#[command(version)]
#[command(about = "Manage goals, categories and transactions on the finance API")]
#[command(propagate_version = true)]
struct Cli {
    /// User the requests are made for
    #[arg(long, env = "FINANCE_USER_ID", global = true)]
    user_id: Option<String>,

    /// Bearer token for the API
    #[arg(long, env = "FINANCE_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Savings goals
    Goals {
        #[command(subcommand)]
        action: GoalCommands,
    },
    /// Spending categories
    Categories {
        #[command(subcommand)]
        action: CategoryCommands,
    },
    /// Income and expense entries
    Transactions {
        #[command(subcommand)]
        action: TransactionCommands,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    List,
    Add {
        name: String,
        /// Target amount
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        raised: Option<f64>,
        /// Target date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Image file to upload
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Change only the given fields
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        raised: Option<f64>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum CategoryCommands {
    List,
    Add {
        name: String,
        /// Monthly budget cap
        #[arg(long)]
        max: Option<f64>,
    },
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum TransactionCommands {
    List,
    Add(TransactionArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        fields: TransactionArgs,
    },
    Delete { id: i64 },
}

#[derive(Args)]
struct TransactionArgs {
    name: String,
    amount: String,
    #[arg(long, default_value = "")]
    category: String,
    /// expense or income
    #[arg(long, default_value = "expense")]
    kind: TransactionType,
    /// Due date (YYYY-MM-DD)
    #[arg(long, default_value = "")]
    due: String,
    #[arg(long)]
    paid: bool,
}

impl From<TransactionArgs> for TransactionForm {
    fn from(args: TransactionArgs) -> Self {
        Self {
            transaction_type: args.kind,
            transaction_name: args.name,
            category_name: args.category,
            transaction_amount: args.amount,
            expiration_date: args.due,
            paid: args.paid,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Seed the environment before clap reads its `env` fallbacks
    let dotenv = config::load_dotenv();
    let cli = Cli::parse();

    logging::init(&cli.log_level);
    config::report_dotenv(&dotenv);

    let config = ClientConfig::from_process_env().context("invalid client configuration")?;
    debug!("Using API at {}", config.api_url());

    let auth = match (cli.user_id, cli.token) {
        (Some(user_id), Some(token)) => AuthContext::with_session(Session::new(user_id, token)),
        _ => AuthContext::new(),
    };
    let client = FinanceClient::new(&config, auth, Arc::new(LogNotifier))?;

    match cli.command {
        Commands::Goals { action } => run_goals(&client, action).await,
        Commands::Categories { action } => run_categories(&client, action).await,
        Commands::Transactions { action } => run_transactions(&client, action).await,
    }
}

async fn run_goals(client: &FinanceClient, action: GoalCommands) -> anyhow::Result<()> {
    match action {
        GoalCommands::List => {
            for goal in client.goals.fetch_goals().await? {
                print_goal(&goal);
            }
        }
        GoalCommands::Add { name, amount, description, raised, due, image } => {
            let mut draft = GoalDraft::new(name, amount).description(description);
            if let Some(raised) = raised {
                draft = draft.raised(raised);
            }
            if let Some(due) = due {
                draft = draft.due(due);
            }
            if let Some(path) = image {
                draft = draft.image(read_image(&path).await?);
            }
            client.goals.add_goal(draft).await?;
        }
        GoalCommands::Edit { id, name, description, amount, raised, due, image } => {
            let mut patch = GoalPatch::new(id);
            patch.goal_name = name;
            patch.goal_description = description;
            patch.goal_amount = amount;
            patch.amount_raised = raised;
            if let Some(due) = due {
                patch = patch.due(due);
            }
            if let Some(path) = image {
                patch = patch.image(read_image(&path).await?);
            }
            client.goals.edit_goal(patch).await?;
        }
        GoalCommands::Delete { id } => {
            let goal = Goal { id: Some(id), ..Default::default() };
            client.goals.delete_goal(&goal).await?;
        }
    }
    Ok(())
}

async fn read_image(path: &std::path::Path) -> anyhow::Result<GoalImage> {
    GoalImage::upload_from_path(path)
        .await
        .with_context(|| format!("failed to read image {}", path.display()))
}

fn print_goal(goal: &Goal) {
    println!(
        "{:>5}  {:<24} {:>10.2} / {:<10.2} {:>5.1}%  {}",
        goal.id.map(|id| id.to_string()).unwrap_or_default(),
        goal.goal_name,
        goal.amount_raised.unwrap_or_default(),
        goal.goal_amount.unwrap_or_default(),
        goal.progress() * 100.0,
        goal.target_date().map(|d| d.to_string()).unwrap_or_default(),
    );
}

async fn run_categories(client: &FinanceClient, action: CategoryCommands) -> anyhow::Result<()> {
    match action {
        CategoryCommands::List => {
            for category in client.categories.fetch_categories().await? {
                let max = category
                    .max_amount
                    .map(|m| format!("{:.2}", m))
                    .unwrap_or_else(|| "-".to_string());
                println!("{:>5}  {:<24} {:>10}", category.id, category.category_name, max);
            }
        }
        CategoryCommands::Add { name, max } => client.categories.add_category(&name, max).await?,
        CategoryCommands::Delete { id } => {
            let category = client
                .categories
                .fetch_categories()
                .await?
                .into_iter()
                .find(|c| c.id == id)
                .ok_or_else(|| anyhow!("no category with id {}", id))?;
            client.categories.delete_category(&category).await?;
        }
    }
    Ok(())
}

async fn run_transactions(client: &FinanceClient, action: TransactionCommands) -> anyhow::Result<()> {
    match action {
        TransactionCommands::List => {
            for tx in client.transactions.fetch_transactions().await? {
                println!(
                    "{:>5}  {:<7} {:<24} {:<16} {:>10.2}  {:<10} {}",
                    tx.id.map(|id| id.to_string()).unwrap_or_default(),
                    tx.transaction_type.as_str(),
                    tx.transaction_name,
                    tx.category_name,
                    tx.transaction_amount,
                    tx.expiration_date.as_deref().unwrap_or(""),
                    if tx.paid { "paid" } else { "" },
                );
            }
        }
        TransactionCommands::Add(args) => client.transactions.add_transaction(args.into()).await?,
        TransactionCommands::Edit { id, fields } => {
            let existing = client
                .transactions
                .fetch_transactions()
                .await?
                .into_iter()
                .find(|t| t.id == Some(id))
                .ok_or_else(|| anyhow!("no transaction with id {}", id))?;
            client.transactions.edit_transaction(&existing, fields.into()).await?;
        }
        TransactionCommands::Delete { id } => {
            let existing = client
                .transactions
                .fetch_transactions()
                .await?
                .into_iter()
                .find(|t| t.id == Some(id))
                .ok_or_else(|| anyhow!("no transaction with id {}", id))?;
            client.transactions.delete_transaction(&existing).await?;
        }
    }
    Ok(())
}
