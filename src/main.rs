//! GENESIS - CLI entry point for the A2A orchestration server.

use anyhow::{Context, Result, bail};
use genesis::{
    AgentId, AppState, GenesisConfig, GenesisConfigManager,
    agents::registry::default_topic_agents,
    agents::specialist::default_system_prompt,
    api::routes::create_router,
    cli::{AgentCommands, Cli, Commands, output::Output},
    types::Query,
    utils::toml_config::{ConfigError, LogFormat, ProviderConfig, ServerConfig},
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let Cli {
        config,
        verbose,
        no_color,
        command,
    } = Cli::parse_args();
    let output = if no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    match command {
        None | Some(Commands::Serve) => serve(&config, verbose, &output).await,
        Some(Commands::Config { full, validate }) => show_config(&config, full, validate, &output),
        Some(Commands::Agent(cmd)) => agent_command(&config, cmd, &output),
        Some(Commands::Ask {
            text,
            dry_run,
            session,
        }) => ask(&config, text, dry_run, session, verbose, &output).await,
    }
}

/// Initialize tracing from `[server]`; `RUST_LOG` wins when set
fn init_tracing(server: &ServerConfig, level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("genesis={},tower_http={}", level, level)));
    let registry = tracing_subscriber::registry().with(filter);

    match server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Config file, or built-in defaults when it does not exist
fn load_or_default(path: &Path) -> Result<GenesisConfig, ConfigError> {
    match GenesisConfig::load(path) {
        Err(ConfigError::FileNotFound(_)) => Ok(GenesisConfig::default()),
        other => other,
    }
}

async fn serve(path: &Path, verbose: bool, output: &Output) -> Result<()> {
    let config_manager = Arc::new(
        GenesisConfigManager::new(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
    );
    let config = config_manager.config();

    let level = if verbose {
        "debug"
    } else {
        config.server.log_level.as_str()
    };
    init_tracing(&config.server, level);
    output.banner();

    for warning in config.validate_with_warnings()? {
        warn!("{}", warning);
    }

    let state = AppState::from_config_manager(Arc::clone(&config_manager))
        .context("Failed to build the agent team")?;
    info!(
        agents = ?state.orchestrator.registry().agent_ids(),
        "Agent team ready"
    );

    if let Err(e) = config_manager.start_watching() {
        warn!("Config hot-reload disabled: {}", e);
    }
    state.spawn_settings_listener();

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("GENESIS listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("GENESIS stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

fn show_config(path: &Path, full: bool, validate: bool, output: &Output) -> Result<()> {
    let config = GenesisConfig::load(path)
        .with_context(|| format!("Invalid configuration {}", path.display()))?;

    if validate {
        for warning in config.validate_with_warnings()? {
            output.warning(&warning.to_string());
        }
        output.success(&format!("{} is valid", path.display()));
        return Ok(());
    }

    if full {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    output.section("Server");
    output.field("address", &format!("{}:{}", config.server.host, config.server.port));
    output.field("log_level", &config.server.log_level);
    output.field(
        "api_key",
        if config.api_key().is_some() {
            "required"
        } else {
            "not configured"
        },
    );

    output.section("Providers");
    let mut providers: Vec<_> = config.providers.iter().collect();
    providers.sort_by_key(|(name, _)| name.as_str());
    for (name, provider) in providers {
        let kind = match provider {
            ProviderConfig::Vertex { location, .. } => format!("vertex ({})", location),
            ProviderConfig::OpenAI { api_base, .. } => format!("openai ({})", api_base),
        };
        output.field(name, &kind);
    }

    output.section("Models");
    let mut models: Vec<_> = config.models.iter().collect();
    models.sort_by_key(|(name, _)| name.as_str());
    for (name, model) in models {
        output.field(name, &format!("{} via {}", model.model, model.provider));
    }

    let orch = &config.orchestration;
    output.section("Orchestration");
    output.field("confidence_threshold", &orch.confidence_threshold.to_string());
    output.field("max_agents", &orch.max_agents.to_string());
    output.field("agent_timeout_ms", &orch.agent_timeout_ms.to_string());
    output.field("retry.max_attempts", &orch.retry.max_attempts.to_string());
    output.field(
        "circuit_breaker.failure_threshold",
        &orch.circuit_breaker.failure_threshold.to_string(),
    );
    output.field("synthesis", &format!("{:?}", orch.synthesis).to_lowercase());
    output.hint("Use --full to print the complete configuration");
    Ok(())
}

fn topics_for(config: &GenesisConfig, id: AgentId) -> Vec<String> {
    let overrides = config.topic_overrides();
    genesis::Topic::ALL
        .into_iter()
        .filter(|topic| {
            overrides
                .get(topic)
                .cloned()
                .unwrap_or_else(|| default_topic_agents(*topic))
                .contains(&id)
        })
        .map(|topic| topic.to_string())
        .collect()
}

fn agent_command(path: &Path, cmd: AgentCommands, output: &Output) -> Result<()> {
    let config = load_or_default(path)?;

    match cmd {
        AgentCommands::List => {
            let rows: Vec<Vec<String>> = AgentId::ALL
                .into_iter()
                .map(|id| {
                    let topics = topics_for(&config, id).join(", ");
                    vec![
                        id.to_string(),
                        config.agent_model(id),
                        if config.agent(id).enabled { "yes" } else { "no" }.to_string(),
                        if topics.is_empty() { "-".to_string() } else { topics },
                    ]
                })
                .collect();
            output.section("Agents");
            output.table(&["Agent", "Model", "Enabled", "Topics"], &rows);
        }
        AgentCommands::Show { id } => {
            let Some(agent_id) = AgentId::parse(&id) else {
                output.hint(&format!(
                    "Known agents: {}",
                    AgentId::ALL.map(|a| a.as_str()).join(", ")
                ));
                bail!("Unknown agent '{}'", id);
            };
            let agent = config.agent(agent_id);

            output.section(&agent_id.display_name());
            output.field("description", agent_id.description());
            output.field("model", &config.agent_model(agent_id));
            output.field("enabled", &agent.enabled.to_string());
            output.field("topics", &topics_for(&config, agent_id).join(", "));
            output.subsection("System prompt");
            output.block(
                &agent
                    .system_prompt
                    .unwrap_or_else(|| default_system_prompt(agent_id)),
            );
        }
    }
    Ok(())
}

async fn ask(
    path: &Path,
    text: String,
    dry_run: bool,
    session: Option<String>,
    verbose: bool,
    output: &Output,
) -> Result<()> {
    let config_manager = Arc::new(
        GenesisConfigManager::new(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
    );
    init_tracing(
        &config_manager.config().server,
        if verbose { "debug" } else { "warn" },
    );

    let state = AppState::from_config_manager(config_manager)
        .context("Failed to build the agent team")?;
    let session_id = session.unwrap_or_else(|| Uuid::new_v4().to_string());
    let query = Query::new(text, "cli", session_id);

    if dry_run {
        let preview = state.orchestrator.preview(&query);
        output.section("Intent");
        output.field("label", &preview.intent.intent_label);
        output.field("confidence", &format!("{:.2}", preview.intent.confidence));
        output.field(
            "topics",
            &preview
                .intent
                .matched_topics
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
        output.section("Complexity");
        output.field("level", preview.complexity.level.as_str());
        output.field("score", &preview.complexity.score.to_string());
        output.field("indicators", &preview.complexity.indicators.join(", "));
        output.section("Plan");
        output.field("mode", preview.plan.mode.as_str());
        for id in &preview.plan.participating_agent_ids {
            output.bullet(&id.display_name());
        }
        return Ok(());
    }

    let reply = state.orchestrator.handle(query).await;
    output.section("Response");
    output.block(&reply.response);
    output.newline();
    output.field(
        "agents",
        &reply
            .agents_used
            .iter()
            .map(|a| a.display_name())
            .collect::<Vec<_>>()
            .join(", "),
    );
    output.field("intent", &reply.metadata.intent);
    output.field("complexity", reply.metadata.complexity.as_str());
    if let Some(mode) = reply.metadata.mode {
        output.field("mode", mode.as_str());
    }
    output.field("consensus", &format!("{:.2}", reply.metadata.consensus_score));
    output.field("latency_ms", &reply.metadata.latency_ms.to_string());
    output.field("session", &reply.session_id);
    if reply.metadata.fallback {
        output.warning("Answered by the fallback path");
    }
    Ok(())
}
