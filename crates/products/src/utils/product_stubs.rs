// crates/products/src/utils/product_stubs.rs
#![cfg(test)]

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::ProductApplicationService;
use crate::domain::entities::Product;
use crate::domain::repositories::ProductRepository;
use shared_kernel::domain::outbox::{OutboxEvent, OutboxStore};
use shared_kernel::domain::transaction::{Transaction, UnitOfWork, UowFactory};
use shared_kernel::errors::{DomainError, Result};

// --- STUB PRODUCT REPOSITORY ---
#[derive(Default)]
pub struct ProductRepositoryStub {
    pub created: Mutex<Vec<Product>>,
    pub deleted: Mutex<Vec<i32>>,
    pub product_to_return: Mutex<Option<Product>>,
    pub list_to_return: Mutex<Vec<Product>>,
    pub error_to_return: Mutex<Option<DomainError>>,
    pub delete_error: Mutex<Option<DomainError>>,
}

#[async_trait]
impl ProductRepository for ProductRepositoryStub {
    async fn create(&self, product: &mut Product, _tx: Option<&mut dyn Transaction>) -> Result<()> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        product.mark_persisted(42, Utc::now());
        self.created.lock().unwrap().push(product.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: i32) -> Result<Product> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        self.product_to_return
            .lock()
            .unwrap()
            .clone()
            .ok_or(DomainError::NotFound {
                entity: "Product",
                id: id.to_string(),
            })
    }

    async fn list(&self, _page: u32, _limit: u32) -> Result<(Vec<Product>, i64)> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        let products = self.list_to_return.lock().unwrap().clone();
        let total = products.len() as i64;
        Ok((products, total))
    }

    async fn delete(&self, id: i32, _tx: Option<&mut dyn Transaction>) -> Result<()> {
        if let Some(err) = self.delete_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.deleted.lock().unwrap().push(id);
        Ok(())
    }
}

// --- STUB OUTBOX STORE ---
#[derive(Default)]
pub struct OutboxStoreStub {
    pub saved: Mutex<Vec<OutboxEvent>>,
    pub error_to_return: Mutex<Option<DomainError>>,
}

#[async_trait]
impl OutboxStore for OutboxStoreStub {
    async fn save_event(
        &self,
        event: &mut OutboxEvent,
        _tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        let mut saved = self.saved.lock().unwrap();
        event.id = saved.len() as i64 + 1;
        saved.push(event.clone());
        Ok(())
    }

    async fn get_pending_events(&self, _limit: u32) -> Result<Vec<OutboxEvent>> {
        Ok(Vec::new())
    }

    async fn mark_as_published(&self, _event_id: i64) -> Result<()> {
        Ok(())
    }

    async fn mark_as_failed(&self, _event_id: i64, _retry_count: i32) -> Result<()> {
        Ok(())
    }

    async fn move_to_dlq(&self, _event_id: i64, _reason: &str) -> Result<()> {
        Ok(())
    }

    async fn check_idempotency_key(&self, idempotency_key: &str) -> Result<bool> {
        Ok(self
            .saved
            .lock()
            .unwrap()
            .iter()
            .any(|e| e.idempotency_key.as_deref() == Some(idempotency_key)))
    }
}

// --- UNIT OF WORK STUB ---
#[derive(Default)]
pub struct UowJournal {
    pub begun: AtomicUsize,
    pub committed: AtomicUsize,
    pub rolled_back: AtomicUsize,
}

pub struct UowStub {
    journal: Arc<UowJournal>,
    fail_begin: Arc<AtomicI32>,
    fail_commit: Arc<AtomicI32>,
    active: bool,
}

#[async_trait]
impl UnitOfWork for UowStub {
    async fn begin(&mut self) -> Result<()> {
        if self.active {
            return Ok(());
        }
        if self.fail_begin.load(Ordering::SeqCst) > 0 {
            self.fail_begin.fetch_sub(1, Ordering::SeqCst);
            return Err(DomainError::Infrastructure("begin refused".into()));
        }
        self.journal.begun.fetch_add(1, Ordering::SeqCst);
        self.active = true;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        if self.fail_commit.load(Ordering::SeqCst) > 0 {
            self.fail_commit.fetch_sub(1, Ordering::SeqCst);
            return Err(DomainError::Infrastructure("commit refused".into()));
        }
        self.journal.committed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;
        self.journal.rolled_back.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.active
    }

    fn transaction(&mut self) -> Option<&mut dyn Transaction> {
        None
    }
}

pub struct UowFactoryStub {
    pub journal: Arc<UowJournal>,
    pub fail_begin: Arc<AtomicI32>,
    pub fail_commit: Arc<AtomicI32>,
}

impl Default for UowFactoryStub {
    fn default() -> Self {
        Self {
            journal: Arc::new(UowJournal::default()),
            fail_begin: Arc::new(AtomicI32::new(0)),
            fail_commit: Arc::new(AtomicI32::new(0)),
        }
    }
}

impl UowFactory for UowFactoryStub {
    fn create_unit_of_work(&self) -> Box<dyn UnitOfWork> {
        Box::new(UowStub {
            journal: Arc::clone(&self.journal),
            fail_begin: Arc::clone(&self.fail_begin),
            fail_commit: Arc::clone(&self.fail_commit),
            active: false,
        })
    }
}

// --- STUB METRICS ---
#[derive(Default)]
pub struct MetricsCollectorStub {
    pub outcomes: Mutex<Vec<(String, String)>>,
    pub batch_sizes: Mutex<Vec<(String, usize)>>,
    pub transaction_retries: AtomicUsize,
}

impl shared_kernel::application::ports::MetricsCollector for MetricsCollectorStub {
    fn record_outbox_event_processed(&self, event_type: &str, outcome: &str) {
        self.outcomes
            .lock()
            .unwrap()
            .push((event_type.to_string(), outcome.to_string()));
    }

    fn record_outbox_retry_attempt(&self, _event_type: &str, _retry_count: i32) {}

    fn record_batch_size(&self, operation: &str, size: usize) {
        self.batch_sizes
            .lock()
            .unwrap()
            .push((operation.to_string(), size));
    }

    fn record_database_query_duration(&self, _duration: std::time::Duration) {}

    fn increment_transaction_retry(&self) {
        self.transaction_retries.fetch_add(1, Ordering::SeqCst);
    }

    fn increment_transaction_retry_success(&self) {}

    fn increment_transaction_retry_failed(&self) {}
}

// --- STUB APPLICATION SERVICE ---
#[derive(Default)]
pub struct AppServiceStub {
    pub created: Mutex<Vec<(Product, Option<String>)>>,
    pub deleted: Mutex<Vec<(Product, Option<String>)>>,
    pub error_to_return: Mutex<Option<DomainError>>,
}

#[async_trait]
impl ProductApplicationService for AppServiceStub {
    async fn create_product_with_event(
        &self,
        _cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<Product> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        let mut persisted = product.clone();
        persisted.mark_persisted(1, Utc::now());
        self.created.lock().unwrap().push((product, idempotency_key));
        Ok(persisted)
    }

    async fn delete_product_with_event(
        &self,
        _cancel: &CancellationToken,
        product: Product,
        idempotency_key: Option<String>,
    ) -> Result<()> {
        if let Some(err) = self.error_to_return.lock().unwrap().clone() {
            return Err(err);
        }
        self.deleted.lock().unwrap().push((product, idempotency_key));
        Ok(())
    }
}
