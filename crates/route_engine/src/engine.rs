//! RouteEngine - every route of a blueprint over one component registry

use contracts::RouteBlueprint;
use dispatcher::ComponentRegistry;
use observability::RouteMetricsAggregator;
use tracing::{info, instrument, warn};

use crate::error::RouteError;
use crate::route::{Route, RouteState};

/// Owns the registry and the routes built from it
pub struct RouteEngine {
    registry: ComponentRegistry,
    routes: Vec<Route>,
}

impl RouteEngine {
    /// Register components, then bind every route
    #[instrument(
        name = "route_engine_from_blueprint",
        skip(blueprint),
        fields(components = blueprint.components.len(), routes = blueprint.routes.len())
    )]
    pub fn from_blueprint(blueprint: &RouteBlueprint) -> Result<Self, RouteError> {
        let registry = ComponentRegistry::from_configs(&blueprint.components)?;
        Self::with_registry(registry, blueprint)
    }

    /// Bind every route of `blueprint` against a prepared registry
    ///
    /// Component declarations in the blueprint are ignored.
    pub fn with_registry(
        registry: ComponentRegistry,
        blueprint: &RouteBlueprint,
    ) -> Result<Self, RouteError> {
        let routes = blueprint
            .routes
            .iter()
            .map(|config| Route::from_config(config, &registry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { registry, routes })
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn route_mut(&mut self, id: &str) -> Option<&mut Route> {
        self.routes.iter_mut().find(|route| route.id() == id)
    }

    /// Start every route
    ///
    /// On failure the routes already started are stopped again.
    #[instrument(name = "route_engine_start", skip(self))]
    pub async fn start_all(&mut self) -> Result<(), RouteError> {
        for idx in 0..self.routes.len() {
            if let Err(e) = self.routes[idx].start() {
                for route in &mut self.routes[..idx] {
                    if let Err(stop_err) = route.stop().await {
                        warn!(route = %route.id(), error = %stop_err, "Rollback stop failed");
                    }
                }
                return Err(e);
            }
        }
        info!(routes = self.routes.len(), "All routes started");
        Ok(())
    }

    /// Wait for every route to end on its own. Cancel safe.
    pub async fn join_all(&mut self) -> Result<(), RouteError> {
        for route in &mut self.routes {
            route.join().await?;
        }
        Ok(())
    }

    /// Stop every route, then close their sinks
    ///
    /// All routes are attempted; the first error is returned.
    #[instrument(name = "route_engine_shutdown", skip(self))]
    pub async fn shutdown(&mut self) -> Result<(), RouteError> {
        let mut first_error = None;
        for route in &mut self.routes {
            if let Err(e) = route.close().await {
                warn!(route = %route.id(), error = %e, "Route shutdown failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn running(&self) -> usize {
        self.routes
            .iter()
            .filter(|route| route.state() == RouteState::Running)
            .count()
    }

    /// Statistics of all finished runs, merged across routes
    pub fn stats(&self) -> RouteMetricsAggregator {
        let mut total = RouteMetricsAggregator::new();
        for route in &self.routes {
            total.merge(route.stats());
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ComponentConfig, ComponentType, RouteConfig, DEFAULT_RANDOM_HEADER};
    use std::collections::HashMap;

    fn route(id: &str, from: &str) -> RouteConfig {
        RouteConfig {
            id: id.into(),
            from: from.into(),
            body: id.into(),
            header: DEFAULT_RANDOM_HEADER.into(),
            seed: None,
            dispatch_timeout_ms: None,
            to: vec!["log:js".into(), "lll:js".into()],
        }
    }

    fn blueprint() -> RouteBlueprint {
        RouteBlueprint {
            components: vec![ComponentConfig {
                name: "lll".into(),
                kind: Some(ComponentType::Log),
                alias_of: None,
                label: Some("aaa".into()),
                params: HashMap::new(),
            }],
            routes: vec![
                route("js", "timer:js?period=1s&repeatCount=2"),
                route("groovy", "timer:groovy?period=500ms&repeatCount=4"),
            ],
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_all_routes() {
        let mut engine = RouteEngine::from_blueprint(&blueprint()).unwrap();
        assert_eq!(engine.routes().len(), 2);

        engine.start_all().await.unwrap();
        assert_eq!(engine.running(), 2);
        engine.join_all().await.unwrap();
        engine.shutdown().await.unwrap();

        assert_eq!(engine.running(), 0);
        let stats = engine.stats();
        assert_eq!(stats.total_ticks, 6);
        assert_eq!(stats.delivered, 12);
        assert_eq!(stats.random_stats.count(), 6);
    }

    #[tokio::test]
    async fn test_failed_start_rolls_back() {
        let mut bp = blueprint();
        bp.routes[1].from = "timer:groovy?period=0".into();
        let mut engine = RouteEngine::from_blueprint(&bp).unwrap();

        assert!(matches!(
            engine.start_all().await,
            Err(RouteError::Scheduling { .. })
        ));
        assert_eq!(engine.running(), 0);
    }

    #[test]
    fn test_unknown_component_fails_build() {
        let mut bp = blueprint();
        bp.components.clear();
        assert!(RouteEngine::from_blueprint(&bp).is_err());
    }
}
