//! Layered rule registry.
//!
//! The first layer is the host registry (built-in rules). Project rule files
//! and extension packages add further layers. Lookup walks the layers in
//! order and the first layer defining an id wins, so a later layer can never
//! shadow a host rule.

use std::collections::BTreeMap;

use artifact_resolver::ModuleId;
use tracing::{debug, info, warn};

use crate::builtin::{BUILTINS, RuleFactory};
use crate::declarative::{DeclarativeDefinition, DeclarativeRule};
use crate::errors::{Result, RuleError};
use crate::fields::configure;
use crate::rule::Rule;

pub const HOST_LAYER: &str = "host";

pub enum RuleSource {
    Builtin(RuleFactory),
    Declarative(DeclarativeDefinition),
}

pub struct RegistryLayer {
    name: String,
    /// Set for layers loaded from a versioned package.
    module: Option<ModuleId>,
    rules: Vec<(String, RuleSource)>,
}

impl RegistryLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            rules: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: ModuleId) -> Self {
        self.module = Some(module);
        self
    }

    pub fn from_definitions(name: impl Into<String>, defs: Vec<DeclarativeDefinition>) -> Self {
        let mut layer = Self::new(name);
        for def in defs {
            layer.add_definition(def);
        }
        layer
    }

    pub fn add_builtin(&mut self, id: impl Into<String>, factory: RuleFactory) {
        self.insert(id.into(), RuleSource::Builtin(factory));
    }

    pub fn add_definition(&mut self, def: DeclarativeDefinition) {
        self.insert(def.id.clone(), RuleSource::Declarative(def));
    }

    fn insert(&mut self, id: String, source: RuleSource) {
        if let Some(slot) = self.rules.iter_mut().find(|(existing, _)| *existing == id) {
            warn!("registry: `{id}` defined twice in layer {}, keeping the last", self.name);
            slot.1 = source;
        } else {
            self.rules.push((id, source));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> Option<&ModuleId> {
        self.module.as_ref()
    }

    /// Ids in definition order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|(id, _)| id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&RuleSource> {
        self.rules.iter().find(|(k, _)| k == id).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub struct RuleRegistry {
    layers: Vec<RegistryLayer>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl RuleRegistry {
    pub fn new(primary: RegistryLayer) -> Self {
        Self {
            layers: vec![primary],
        }
    }

    pub fn with_builtins() -> Self {
        let mut host = RegistryLayer::new(HOST_LAYER);
        for (id, factory) in BUILTINS {
            host.add_builtin(*id, *factory);
        }
        Self::new(host)
    }

    pub fn push_layer(&mut self, layer: RegistryLayer) {
        info!(
            "registry: layer {} with {} rule(s)",
            layer.name(),
            layer.len()
        );
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[RegistryLayer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&RegistryLayer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Whether a package with this version-stripped identity is loaded.
    pub fn has_module(&self, module: &ModuleId) -> bool {
        self.layers.iter().any(|l| l.module() == Some(module))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    fn find(&self, id: &str) -> Option<(&RegistryLayer, &RuleSource)> {
        self.layers
            .iter()
            .find_map(|layer| layer.get(id).map(|source| (layer, source)))
    }

    /// Every visible id, first definition only, in layer order.
    pub fn ids(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for id in self.layers.iter().flat_map(RegistryLayer::ids) {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    pub fn instantiate(&self, id: &str) -> Result<Box<dyn Rule>> {
        self.instantiate_inner(id, &mut Vec::new())
    }

    /// Instantiate `id` and apply `options` to it.
    pub fn select(&self, id: &str, options: &BTreeMap<String, String>) -> Result<Box<dyn Rule>> {
        let mut rule = self.instantiate(id)?;
        configure(rule.as_mut(), options)?;
        Ok(rule)
    }

    fn instantiate_inner(&self, id: &str, stack: &mut Vec<String>) -> Result<Box<dyn Rule>> {
        if stack.iter().any(|s| s == id) {
            let mut chain = stack.clone();
            chain.push(id.to_string());
            return Err(RuleError::Cycle {
                id: id.to_string(),
                chain: chain.join(" -> "),
            });
        }
        let Some((layer, source)) = self.find(id) else {
            return Err(RuleError::SelectionFailure { id: id.to_string() });
        };
        debug!("registry: `{id}` from layer {}", layer.name());

        match source {
            RuleSource::Builtin(factory) => Ok(factory()),
            RuleSource::Declarative(def) => {
                stack.push(id.to_string());
                let mut children = Vec::with_capacity(def.steps.len());
                for step in &def.steps {
                    let mut child = match self.instantiate_inner(&step.id, stack) {
                        Err(RuleError::SelectionFailure { id: missing }) => {
                            return Err(RuleError::Definition {
                                origin: def.origin.clone(),
                                reason: format!("`{}` refers to unknown rule `{missing}`", def.id),
                            });
                        }
                        other => other?,
                    };
                    configure(child.as_mut(), &step.options)?;
                    children.push(child);
                }
                stack.pop();
                Ok(Box::new(DeclarativeRule {
                    id: def.id.clone(),
                    display_name: def.display_name.clone(),
                    description: def.description.clone(),
                    children,
                }))
            }
        }
    }
}
