//! ComponentRegistry - name -> component lookup with aliasing
//!
//! Built once at startup from configuration (plus any programmatic
//! `put`s) and used to turn `to` endpoints into live sink bindings.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use contracts::{
    ComponentConfig, ComponentRegistration, ComponentType, EmittedLine, Endpoint,
    EventFormatter, LabelFormatter, BUILTIN_LOG_COMPONENT,
};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::binding::SinkBinding;
use crate::error::DispatcherError;
use crate::sinks::{AnySink, ChannelSink, FileSink, FileSinkConfig, LogSink};

/// What a component's bindings emit to
#[derive(Clone)]
pub enum ComponentKind {
    /// Process log via tracing
    Log,
    /// Per-logger files
    File(FileSinkConfig),
    /// In-process receiver, shared by every binding of the component
    Channel(mpsc::Sender<EmittedLine>),
}

impl ComponentKind {
    /// Build a kind from its configured type and params
    pub fn from_config(
        name: &str,
        kind: ComponentType,
        params: &HashMap<String, String>,
    ) -> Result<Self, DispatcherError> {
        match kind {
            ComponentType::Log => Ok(Self::Log),
            ComponentType::File => FileSinkConfig::from_params(params)
                .map(Self::File)
                .map_err(|e| DispatcherError::sink_creation(name, e)),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Log => "log",
            Self::File(_) => "file",
            Self::Channel(_) => "channel",
        }
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Log => f.write_str("Log"),
            Self::File(config) => f.debug_tuple("File").field(config).finish(),
            Self::Channel(_) => f.write_str("Channel"),
        }
    }
}

/// Registry entry: a sink kind plus the formatter new bindings receive
#[derive(Clone)]
pub struct Component {
    kind: ComponentKind,
    formatter: Arc<dyn EventFormatter>,
    alias_of: Option<String>,
}

impl Component {
    pub fn new(kind: ComponentKind, formatter: impl EventFormatter + 'static) -> Self {
        Self {
            kind,
            formatter: Arc::new(formatter),
            alias_of: None,
        }
    }

    /// Log component rendering with a [`LabelFormatter`]
    pub fn log(label: impl Into<String>) -> Self {
        Self::new(ComponentKind::Log, LabelFormatter::new(label))
    }

    /// Channel component rendering with a [`LabelFormatter`]
    pub fn channel(tx: mpsc::Sender<EmittedLine>, label: impl Into<String>) -> Self {
        Self::new(ComponentKind::Channel(tx), LabelFormatter::new(label))
    }

    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    pub fn formatter(&self) -> &Arc<dyn EventFormatter> {
        &self.formatter
    }

    /// Component this one was aliased from, if any
    pub fn alias_of(&self) -> Option<&str> {
        self.alias_of.as_deref()
    }

    /// Replace the formatter used by bindings created afterwards
    pub fn set_formatter(&mut self, formatter: impl EventFormatter + 'static) {
        self.formatter = Arc::new(formatter);
    }

    fn instantiate(
        &self,
        binding: &str,
        component: &str,
        logger: &str,
    ) -> Result<AnySink, DispatcherError> {
        let sink = match &self.kind {
            ComponentKind::Log => LogSink::new(binding, component).into(),
            ComponentKind::File(config) => FileSink::new(binding, logger, config)
                .map_err(|e| DispatcherError::sink_creation(binding, e.to_string()))?
                .into(),
            ComponentKind::Channel(tx) => ChannelSink::new(binding, tx.clone()).into(),
        };
        Ok(sink)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind)
            .field("formatter", &self.formatter.describe())
            .field("alias_of", &self.alias_of)
            .finish()
    }
}

/// Name -> component mapping
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    components: HashMap<String, Component>,
    order: Vec<String>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentRegistry {
    /// Registry holding only the built-in `log` component
    pub fn new() -> Self {
        let mut registry = Self {
            components: HashMap::new(),
            order: Vec::new(),
        };
        registry.components.insert(
            BUILTIN_LOG_COMPONENT.to_string(),
            Component::log(BUILTIN_LOG_COMPONENT),
        );
        registry.order.push(BUILTIN_LOG_COMPONENT.to_string());
        registry
    }

    /// Registry with every configured component applied in order
    #[instrument(
        name = "registry_from_configs",
        skip(configs),
        fields(component_count = configs.len())
    )]
    pub fn from_configs(configs: &[ComponentConfig]) -> Result<Self, DispatcherError> {
        let mut registry = Self::new();
        for config in configs {
            registry.apply(config)?;
        }
        Ok(registry)
    }

    /// Apply one component declaration
    pub fn apply(&mut self, config: &ComponentConfig) -> Result<(), DispatcherError> {
        let component = match config.registration() {
            ComponentRegistration::Existing => self.get_mut(&config.name)?,
            ComponentRegistration::Make(kind) => {
                let kind = ComponentKind::from_config(&config.name, kind, &config.params)?;
                self.make(&config.name, kind)?
            }
            ComponentRegistration::Alias(source) => self.alias(source, &config.name)?,
            ComponentRegistration::Conflicting => {
                return Err(DispatcherError::sink_creation(
                    &config.name,
                    "kind and alias_of are mutually exclusive",
                ))
            }
        };

        if let Some(label) = &config.label {
            component.set_formatter(LabelFormatter::new(label));
        }
        debug!(component = %config.name, ?component, "Component registered");
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Component, DispatcherError> {
        self.components
            .get(name)
            .ok_or_else(|| DispatcherError::unknown_component(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Component, DispatcherError> {
        self.components
            .get_mut(name)
            .ok_or_else(|| DispatcherError::unknown_component(name))
    }

    /// Create a new component of `kind`, labelled with its own name
    pub fn make(
        &mut self,
        name: &str,
        kind: ComponentKind,
    ) -> Result<&mut Component, DispatcherError> {
        self.insert(name, Component::new(kind, LabelFormatter::new(name)))
    }

    /// Copy `existing` under `new_name`
    ///
    /// The copy shares the underlying sink kind; its formatter can be
    /// replaced without touching the source.
    pub fn alias(
        &mut self,
        existing: &str,
        new_name: &str,
    ) -> Result<&mut Component, DispatcherError> {
        let mut copy = self.get(existing)?.clone();
        copy.alias_of = Some(existing.to_string());
        self.insert(new_name, copy)
    }

    /// Register a prebuilt component
    pub fn put(
        &mut self,
        name: &str,
        component: Component,
    ) -> Result<&mut Component, DispatcherError> {
        self.insert(name, component)
    }

    pub fn set_formatter(
        &mut self,
        name: &str,
        formatter: impl EventFormatter + 'static,
    ) -> Result<(), DispatcherError> {
        self.get_mut(name)?.set_formatter(formatter);
        Ok(())
    }

    /// Component names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Resolve `<component>:<logger>` into a live binding for `route_id`
    #[instrument(name = "registry_bind", skip(self))]
    pub fn bind(&self, route_id: &str, uri: &str) -> Result<SinkBinding, DispatcherError> {
        let endpoint: Endpoint = uri.parse()?;
        if !endpoint.params.is_empty() {
            return Err(DispatcherError::sink_creation(
                uri,
                "sink endpoints take no parameters",
            ));
        }

        let component = self.get(&endpoint.scheme)?;
        let name = endpoint.to_string();
        let sink = component.instantiate(&name, &endpoint.scheme, &endpoint.path)?;

        Ok(SinkBinding::new(
            name,
            route_id,
            endpoint.scheme,
            endpoint.path,
            sink,
            Arc::clone(&component.formatter),
        ))
    }

    fn insert(
        &mut self,
        name: &str,
        component: Component,
    ) -> Result<&mut Component, DispatcherError> {
        match self.components.entry(name.to_string()) {
            Entry::Occupied(_) => Err(DispatcherError::duplicate_component(name)),
            Entry::Vacant(slot) => {
                self.order.push(name.to_string());
                Ok(slot.insert(component))
            }
        }
    }
}
