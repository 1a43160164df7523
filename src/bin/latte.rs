//! latte: payment-aware npm companion CLI.
//!
//! Wraps the usual project workflow (init/add/install/remove) and
//! consults the Latte registry before any priced package lands in the
//! tree. Required payments block the install until confirmed on chain.

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;

use latte_registry::config::loader::load_from_env;
use latte_registry::gate::{GateOutcome, PaymentGate, PaymentRequest, RegistryApi, RegistryClient};
use latte_registry::install::Installer;
use latte_registry::ledger::PackageRule;
use latte_registry::observability;

#[derive(Parser)]
#[command(name = "latte", version, about = "Payment-aware package installer for the Latte registry")]
struct Cli {
    /// Registry API base URL (overrides config and LATTE_API_BASE).
    #[arg(long, global = true)]
    registry: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a package.json in the current directory
    Init {
        /// Package name (defaults to the directory name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Add a package, paying for it first if its rule requires that
    Add {
        /// Package, optionally pinned: name or name@version
        package: String,
        /// Record under devDependencies
        #[arg(short = 'D', long)]
        dev: bool,
        /// Identity the payment is recorded against
        #[arg(long, default_value = "anonymous")]
        user: String,
    },
    /// Install everything package.json lists
    Install,
    /// Remove a package from the project
    Remove { package: String },
    /// List the project's dependencies
    List,
    /// Attach or update a payment rule for a package you maintain
    SetPrice {
        package: String,
        #[arg(long)]
        price: f64,
        /// Wallet that receives payments
        #[arg(long)]
        wallet: String,
        /// Block installs until paid (default: optional donation)
        #[arg(long)]
        required: bool,
        #[arg(long, default_value = "Mantle")]
        chain: String,
        #[arg(long, default_value = "USDT")]
        token: String,
    },
    /// Submit a transaction hash for verification
    Verify {
        package: String,
        tx_hash: String,
        #[arg(long, default_value = "anonymous")]
        user: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("latte: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    observability::logging::init(&config.observability.log_level);

    let base = cli
        .registry
        .clone()
        .unwrap_or_else(|| config.payments.api_base.clone());
    let registry = Arc::new(RegistryClient::new(base));

    let result = match cli.command {
        Commands::Init { name } => init(name).await,
        Commands::Add { package, dev, user } => {
            let gate = PaymentGate::new(registry.clone(), config.payments.clone());
            add(&gate, &package, dev, &user).await
        }
        Commands::Install => install_all().await,
        Commands::Remove { package } => remove(&package).await,
        Commands::List => list().await,
        Commands::SetPrice {
            package,
            price,
            wallet,
            required,
            chain,
            token,
        } => {
            set_price(
                registry.as_ref(),
                PackageRule {
                    name: package,
                    price,
                    required,
                    wallet_address: wallet,
                    chain,
                    token_symbol: token,
                },
            )
            .await
        }
        Commands::Verify {
            package,
            tx_hash,
            user,
        } => verify(registry.as_ref(), &package, &user, &tx_hash).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("latte: {e}");
            ExitCode::FAILURE
        }
    }
}

type CommandResult = Result<ExitCode, Box<dyn std::error::Error>>;

async fn init(name: Option<String>) -> CommandResult {
    let installer = Installer::new(".");
    if installer.manifest().exists() {
        println!("package.json already exists");
        return Ok(ExitCode::SUCCESS);
    }
    let name = match name {
        Some(name) => name,
        None => std::env::current_dir()?
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "my-project".to_string()),
    };
    installer.manifest().create(&name, "1.0.0")?;
    println!("Created package.json for {name}");
    Ok(ExitCode::SUCCESS)
}

/// Split `name@version`, leaving scoped names (`@scope/pkg`) intact.
fn split_spec(package: &str) -> (&str, Option<&str>) {
    if package.is_empty() {
        return (package, None);
    }
    match package[1..].rfind('@') {
        Some(i) => (&package[..i + 1], Some(&package[i + 2..])),
        None => (package, None),
    }
}

async fn add(gate: &PaymentGate, package: &str, dev: bool, user: &str) -> CommandResult {
    let (name, spec) = split_spec(package);

    let decision = gate.clear(name, user).await;
    if let Some(request) = &decision.request {
        print_payment_request(request);
    }
    match decision.outcome {
        GateOutcome::TimedOut => {
            eprintln!("Payment for {name} was not confirmed in time; aborting install.");
            eprintln!("Pay and retry, or run: latte verify {name} <txHash>");
            return Ok(ExitCode::FAILURE);
        }
        GateOutcome::Confirmed => println!("Payment confirmed, installing {name}..."),
        _ => {}
    }

    let installer = Installer::new(".");
    let resolved = installer.add(name, spec, dev).await?;
    println!("Added {}@{}", resolved.name, resolved.version);
    Ok(ExitCode::SUCCESS)
}

async fn install_all() -> CommandResult {
    let installer = Installer::new(".");
    if !installer.manifest().exists() {
        eprintln!("No package.json found; run `latte init` first.");
        return Ok(ExitCode::FAILURE);
    }
    let count = installer.install_all().await?;
    println!("Installed {count} package(s)");
    Ok(ExitCode::SUCCESS)
}

async fn remove(package: &str) -> CommandResult {
    let installer = Installer::new(".");
    installer.remove(package).await?;
    println!("Removed {package}");
    Ok(ExitCode::SUCCESS)
}

async fn list() -> CommandResult {
    let installer = Installer::new(".");
    let manifest = installer.manifest().read()?;
    if manifest.dependencies.is_empty() && manifest.dev_dependencies.is_empty() {
        println!("No dependencies");
        return Ok(ExitCode::SUCCESS);
    }
    for (name, range) in &manifest.dependencies {
        println!("{name} {range}");
    }
    for (name, range) in &manifest.dev_dependencies {
        println!("{name} {range} (dev)");
    }
    Ok(ExitCode::SUCCESS)
}

async fn set_price(registry: &dyn RegistryApi, rule: PackageRule) -> CommandResult {
    let saved = registry.upsert_rule(&rule).await?;
    let kind = if saved.required { "required payment" } else { "optional donation" };
    println!(
        "Set {} {} {} ({kind}) for {}",
        saved.price, saved.token_symbol, saved.chain, saved.name
    );
    Ok(ExitCode::SUCCESS)
}

async fn verify(
    registry: &dyn RegistryApi,
    package: &str,
    user: &str,
    tx_hash: &str,
) -> CommandResult {
    let response = registry.verify_payment(package, user, tx_hash).await?;
    if response.verified {
        println!(
            "Payment verified ({} confirmation(s)). You can now install {package}.",
            response.confirmations.unwrap_or(0)
        );
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!(
            "Verification failed: {}",
            response
                .message
                .unwrap_or_else(|| "transaction could not be verified".to_string())
        );
        Ok(ExitCode::FAILURE)
    }
}

fn print_payment_request(request: &PaymentRequest) {
    println!();
    println!(
        "  {} asks for {} {} on {}",
        request.package_name, request.amount, request.token_symbol, request.chain
    );
    println!("  Recipient: {}", request.recipient);
    println!("  Pay via:   {}", request.uri);
    println!();
}
