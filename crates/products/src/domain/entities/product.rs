// crates/products/src/domain/entities/product.rs

use chrono::{DateTime, Utc};

use crate::domain::events::ProductEvent;
use crate::domain::value_objects::{Price, ProductName};
use shared_kernel::errors::Result;

/// Agrégat produit. Jamais muté en place : créé puis supprimé par id.
/// Les événements de domaine s'accumulent dans un buffer interne jusqu'à leur
/// persistance dans l'outbox.
#[derive(Debug, Clone)]
pub struct Product {
    id: i32,
    name: ProductName,
    price: Price,
    created_at: DateTime<Utc>,
    events: Vec<ProductEvent>,
}

impl Product {
    /// Instanciation via les factories validantes des value objects.
    /// L'id définitif est assigné par le store à l'insertion.
    pub fn try_new(name: impl Into<String>, price: f64) -> Result<Self> {
        let name = ProductName::try_new(name)?;
        let price = Price::try_new(price)?;

        Ok(Self {
            id: 0,
            name,
            price,
            created_at: Utc::now(),
            events: Vec::new(),
        })
    }

    /// Reconstruction depuis le store : value objects déjà validés par le
    /// mapper, buffer d'événements vide (on ne republie pas le passé).
    pub fn restore(id: i32, name: ProductName, price: Price, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            price,
            created_at,
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn name(&self) -> &ProductName {
        &self.name
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Assigne l'identité rendue par le store (RETURNING id, created_at)
    pub(crate) fn mark_persisted(&mut self, id: i32, created_at: DateTime<Utc>) {
        self.id = id;
        self.created_at = created_at;
    }

    /// Enregistre un fait métier
    pub fn record_created_event(&mut self) {
        self.events.push(ProductEvent::created(self.id));
    }

    pub fn record_deleted_event(&mut self) {
        self.events.push(ProductEvent::deleted(self.id));
    }

    /// Récupère et vide la file des événements pour écriture dans l'outbox
    pub fn pull_events(&mut self) -> Vec<ProductEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}
