mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use vt_core::config::Config;

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load_or_default(path).context("Failed to load configuration")
}

async fn start_server(host: Option<String>, port: Option<u16>, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;

    // Override host/port from CLI if specified
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting vitrine server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    vt_server::start(config).await?;
    Ok(())
}

fn create_admin(config_path: Option<&Path>, email: &str, password: &str, role: &str) -> Result<()> {
    let config = load_config(config_path)?;

    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        anyhow::bail!("Email and password are required");
    }

    let pool = vt_server::open_database(&config.server.db_path)?;
    let conn = vt_db::pool::get_conn(&pool)?;
    let hash = vt_server::token::hash_password(password, config.auth.bcrypt_cost)?;
    let user = vt_db::queries::users::create_user(&conn, email, &hash, role)?;

    tracing::info!(user_id = %user.id, "Created administrator");
    println!("Created {} '{}' ({})", user.role, user.email, user.id);
    Ok(())
}

fn hash_password(config_path: Option<&Path>, password: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let hash = vt_server::token::hash_password(password, config.auth.bcrypt_cost)?;
    println!("{hash}");
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        anyhow::bail!("No config file given");
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = Config::from_json(&contents)?;

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("{}: OK", path.display());
    } else {
        println!("{}: {} warning(s)", path.display(), warnings.len());
        for warning in warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "vitrine=trace,vt_core=debug,vt_db=debug,vt_imaging=debug,vt_server=debug,tower_http=debug"
                .to_string()
        } else {
            "vitrine=debug,vt_imaging=info,vt_server=info,vt_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::CreateAdmin {
            email,
            password,
            role,
        } => create_admin(cli.config.as_deref(), &email, &password, &role),
        Commands::HashPassword { password } => hash_password(cli.config.as_deref(), &password),
        Commands::GenerateSecret => {
            println!("{}", vt_server::token::generate_secret());
            Ok(())
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("vitrine {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
