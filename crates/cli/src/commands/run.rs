//! `run` command implementation.

use anyhow::{Context, Result};
use config_loader::ConfigLoader;
use contracts::{
    ComponentConfig, ComponentType, Endpoint, RouteBlueprint, RouteConfig,
    BUILTIN_LOG_COMPONENT, DEFAULT_RANDOM_HEADER,
};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use super::load_config;
use crate::cli::{RunArgs, SecondaryMode};
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Name of the secondary component of the ad-hoc route
const SECONDARY_COMPONENT: &str = "lll";

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    let mut blueprint = resolve_blueprint(args)?;
    apply_overrides(&mut blueprint, args)?;
    ConfigLoader::validate(&blueprint).context("Configuration is invalid after overrides")?;

    info!(
        components = blueprint.components.len(),
        routes = blueprint.routes.len(),
        "Configuration loaded"
    );

    if blueprint.routes.is_empty() {
        warn!("No routes configured - nothing to run");
    }

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting routes...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Route execution failed")?;

    info!(
        stop_reason = %stats.stop_reason,
        ticks = stats.metrics.total_ticks,
        delivered = stats.metrics.delivered,
        failed = stats.metrics.failed,
        duration_secs = stats.duration.as_secs_f64(),
        "Routes finished"
    );
    stats.print_summary();

    info!("Timer Route finished");
    Ok(())
}

/// Blueprint from `--config`, or the ad-hoc single route
fn resolve_blueprint(args: &RunArgs) -> Result<RouteBlueprint, CliError> {
    if args.config.is_empty() {
        info!(
            name = %args.name,
            period_ms = args.period.as_millis() as u64,
            secondary_mode = ?args.secondary_mode,
            "No configuration given, using ad-hoc route"
        );
        return adhoc_blueprint(args);
    }

    info!(locations = ?args.config, "Loading configuration");
    Ok(load_config(&args.config)?.blueprint)
}

/// `timer:<name>` -> body -> RandomValue -> `log:<name>`, `lll:<name>`
fn adhoc_blueprint(args: &RunArgs) -> Result<RouteBlueprint, CliError> {
    if args.period.is_zero() {
        return Err(CliError::invalid_arguments("--period must be > 0"));
    }

    let primary = ComponentConfig {
        name: BUILTIN_LOG_COMPONENT.to_string(),
        kind: None,
        alias_of: None,
        label: Some(args.primary_label.clone()),
        params: HashMap::new(),
    };
    let secondary = match args.secondary_mode {
        SecondaryMode::Make => ComponentConfig {
            kind: Some(ComponentType::Log),
            ..secondary_component(args)
        },
        SecondaryMode::Alias => ComponentConfig {
            alias_of: Some(BUILTIN_LOG_COMPONENT.to_string()),
            ..secondary_component(args)
        },
    };

    let route = RouteConfig {
        id: args.name.clone(),
        from: format!("timer:{}?period={}ms", args.name, args.period.as_millis()),
        body: args.body.clone(),
        header: DEFAULT_RANDOM_HEADER.to_string(),
        seed: None,
        dispatch_timeout_ms: None,
        to: vec![
            format!("{BUILTIN_LOG_COMPONENT}:{}", args.name),
            format!("{SECONDARY_COMPONENT}:{}", args.name),
        ],
    };

    Ok(RouteBlueprint {
        components: vec![primary, secondary],
        routes: vec![route],
        ..Default::default()
    })
}

fn secondary_component(args: &RunArgs) -> ComponentConfig {
    ComponentConfig {
        name: SECONDARY_COMPONENT.to_string(),
        kind: None,
        alias_of: None,
        label: Some(args.secondary_label.clone()),
        params: HashMap::new(),
    }
}

/// Apply `--seed` and `--max-ticks` to every route
fn apply_overrides(blueprint: &mut RouteBlueprint, args: &RunArgs) -> Result<(), CliError> {
    for route in &mut blueprint.routes {
        if let Some(seed) = args.seed {
            route.seed = Some(seed);
        }
        if args.max_ticks > 0 {
            let mut from: Endpoint = route.from.parse()?;
            from.params
                .insert("repeatCount".to_string(), args.max_ticks.to_string());
            route.from = from.to_string();
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RouteBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Components ({}):", blueprint.components.len());
    for component in &blueprint.components {
        println!(
            "  - {} ({}){}",
            component.name,
            describe_registration(component),
            component
                .label
                .as_ref()
                .map(|label| format!(" label={label}"))
                .unwrap_or_default()
        );
    }

    println!("\nRoutes ({}):", blueprint.routes.len());
    for route in &blueprint.routes {
        println!("  - {}: {} -> {}", route.id, route.from, route.to.join(", "));
    }

    println!();
}

pub(crate) fn describe_registration(component: &ComponentConfig) -> String {
    use contracts::ComponentRegistration;

    match component.registration() {
        ComponentRegistration::Existing => "existing".to_string(),
        ComponentRegistration::Make(kind) => format!("make {kind:?}").to_lowercase(),
        ComponentRegistration::Alias(source) => format!("alias of {source}"),
        ComponentRegistration::Conflicting => "invalid".to_string(),
    }
}
