//! Catalog and incident lookups consumed by the context builder.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use solomon_common::{EngineError, Environment, Incident, Result, Runbook, Service};
use uuid::Uuid;

#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn get_service(&self, id: Uuid) -> Result<Service>;

    async fn get_environment(&self, id: Uuid) -> Result<Environment>;

    async fn get_incident(&self, id: Uuid) -> Result<Incident>;

    async fn list_runbooks(&self, service_id: Uuid) -> Result<Vec<Runbook>>;
}

/// Records an [`InMemoryDirectory`] can be seeded from, e.g. a JSON fixtures file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub services: Vec<Service>,
    pub environments: Vec<Environment>,
    pub incidents: Vec<Incident>,
    pub runbooks: Vec<Runbook>,
}

/// Lookup backed by in-process maps.
#[derive(Default)]
pub struct InMemoryDirectory {
    services: RwLock<HashMap<Uuid, Service>>,
    environments: RwLock<HashMap<Uuid, Environment>>,
    incidents: RwLock<HashMap<Uuid, Incident>>,
    runbooks: RwLock<Vec<Runbook>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: DirectorySeed) -> Self {
        let dir = Self::new();
        for service in seed.services {
            dir.add_service(service);
        }
        for env in seed.environments {
            dir.add_environment(env);
        }
        for incident in seed.incidents {
            dir.add_incident(incident);
        }
        for runbook in seed.runbooks {
            dir.add_runbook(runbook);
        }
        dir
    }

    pub fn add_service(&self, service: Service) {
        if let Ok(mut map) = self.services.write() {
            map.insert(service.id, service);
        }
    }

    pub fn add_environment(&self, env: Environment) {
        if let Ok(mut map) = self.environments.write() {
            map.insert(env.id, env);
        }
    }

    pub fn add_incident(&self, incident: Incident) {
        if let Ok(mut map) = self.incidents.write() {
            map.insert(incident.id, incident);
        }
    }

    pub fn add_runbook(&self, runbook: Runbook) {
        if let Ok(mut list) = self.runbooks.write() {
            list.push(runbook);
        }
    }
}

fn find<T: Clone>(map: &RwLock<HashMap<Uuid, T>>, kind: &'static str, id: Uuid) -> Result<T> {
    map.read()
        .ok()
        .and_then(|m| m.get(&id).cloned())
        .ok_or_else(|| EngineError::entity_not_found(kind, id))
}

#[async_trait]
impl EntityLookup for InMemoryDirectory {
    async fn get_service(&self, id: Uuid) -> Result<Service> {
        find(&self.services, "service", id)
    }

    async fn get_environment(&self, id: Uuid) -> Result<Environment> {
        find(&self.environments, "environment", id)
    }

    async fn get_incident(&self, id: Uuid) -> Result<Incident> {
        find(&self.incidents, "incident", id)
    }

    async fn list_runbooks(&self, service_id: Uuid) -> Result<Vec<Runbook>> {
        Ok(self
            .runbooks
            .read()
            .map(|list| {
                list.iter()
                    .filter(|rb| rb.service_id == service_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
