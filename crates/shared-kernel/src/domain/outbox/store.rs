// crates/shared-kernel/src/domain/outbox/store.rs

use async_trait::async_trait;
use crate::domain::outbox::OutboxEvent;
use crate::domain::transaction::Transaction;
use crate::errors::Result;

/// Port du store outbox. Les chemins d'écriture acceptent la transaction du
/// unit of work appelant ; les chemins du dispatcher travaillent en
/// auto-commit sur la pool.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Insère une ligne `pending`. Un conflit sur `idempotency_key` est un
    /// succès silencieux : l'id de l'événement reste à 0.
    async fn save_event(
        &self,
        event: &mut OutboxEvent,
        tx: Option<&mut dyn Transaction>,
    ) -> Result<()>;

    /// Insère N lignes en un seul statement multi-values, en découpant au-delà
    /// de la taille de batch maximale. Les doublons d'idempotency_key sont
    /// ignorés sans erreur.
    ///
    /// Implémentation par défaut : repli ligne à ligne pour les stores qui
    /// n'exposent pas le chemin batch.
    async fn save_events_batch(
        &self,
        events: &mut [OutboxEvent],
        mut tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        for event in events.iter_mut() {
            self.save_event(event, tx.as_deref_mut()).await?;
        }
        Ok(())
    }

    /// Réclame les `limit` plus anciennes lignes éligibles (skip-locked).
    async fn get_pending_events(&self, limit: u32) -> Result<Vec<OutboxEvent>>;

    /// Passe la ligne en `published` et horodate. Exactement une ligne
    /// affectée, sinon erreur.
    async fn mark_as_published(&self, event_id: i64) -> Result<()>;

    /// Passe la ligne en `failed` avec le compteur de tentatives fourni.
    async fn mark_as_failed(&self, event_id: i64, retry_count: i32) -> Result<()>;

    /// Passe la ligne en `dlq`, incrémente `retry_count` et enregistre la
    /// raison du déclassement.
    async fn move_to_dlq(&self, event_id: i64, reason: &str) -> Result<()>;

    /// Existence d'une clé d'idempotence. Clé vide : false, sans requête.
    async fn check_idempotency_key(&self, idempotency_key: &str) -> Result<bool>;

    /// Sérialise les écrivains concurrents partageant la même clé pour la
    /// durée de la transaction appelante, puis rend l'existence de la clé.
    /// Un rejeu concurrent attend donc le commit du premier écrivain au lieu
    /// de lire un état non commité.
    ///
    /// Repli par défaut : simple lecture, pour les stores sans verrouillage
    /// consultatif.
    async fn claim_idempotency_key(
        &self,
        idempotency_key: &str,
        _tx: Option<&mut dyn Transaction>,
    ) -> Result<bool> {
        self.check_idempotency_key(idempotency_key).await
    }
}

// Un store partagé reste un store
#[async_trait]
impl<T: OutboxStore + ?Sized> OutboxStore for std::sync::Arc<T> {
    async fn save_event(
        &self,
        event: &mut OutboxEvent,
        tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        (**self).save_event(event, tx).await
    }

    async fn save_events_batch(
        &self,
        events: &mut [OutboxEvent],
        tx: Option<&mut dyn Transaction>,
    ) -> Result<()> {
        (**self).save_events_batch(events, tx).await
    }

    async fn get_pending_events(&self, limit: u32) -> Result<Vec<OutboxEvent>> {
        (**self).get_pending_events(limit).await
    }

    async fn mark_as_published(&self, event_id: i64) -> Result<()> {
        (**self).mark_as_published(event_id).await
    }

    async fn mark_as_failed(&self, event_id: i64, retry_count: i32) -> Result<()> {
        (**self).mark_as_failed(event_id, retry_count).await
    }

    async fn move_to_dlq(&self, event_id: i64, reason: &str) -> Result<()> {
        (**self).move_to_dlq(event_id, reason).await
    }

    async fn check_idempotency_key(&self, idempotency_key: &str) -> Result<bool> {
        (**self).check_idempotency_key(idempotency_key).await
    }

    async fn claim_idempotency_key(
        &self,
        idempotency_key: &str,
        tx: Option<&mut dyn Transaction>,
    ) -> Result<bool> {
        (**self).claim_idempotency_key(idempotency_key, tx).await
    }
}
