//! The authoritative service over transaction records.
//!
//! [`Ledger`] validates candidates, enforces identifier uniqueness, applies
//! soft deletion, and announces confirmed changes on an [`EventBus`]. It is
//! the only writer of the `transactions` table; readers get copies.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, Statement, prelude::*};
use uuid::Uuid;

pub use error::LedgerError;
pub use events::{EventBus, EventKind, SubscriptionId};
pub use transactions::{DESCRIPTION_MAX_CHARS, NewTransaction, Transaction};

mod error;
mod events;
pub mod money;
mod transactions;

type ResultLedger<T> = Result<T, LedgerError>;

#[derive(Debug)]
pub struct Ledger {
    database: DatabaseConnection,
    events: EventBus,
}

impl Ledger {
    /// Return a builder for `Ledger`. Help to build the struct.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// The bus this ledger publishes change notifications on.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Lists all non-deleted transactions, oldest first.
    pub async fn list_active(&self) -> ResultLedger<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(transactions::Column::IsDeleted.eq(false))
            .order_by_asc(transactions::Column::Id)
            .all(&self.database)
            .await?;

        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Validates and persists a candidate transaction.
    ///
    /// The unique identifier is generated when the caller supplies none, and
    /// is rejected when any record (deleted included) already carries it.
    /// The transaction date is `date_override` or the current UTC time.
    ///
    /// On success the persisted record is re-read and published as a
    /// [`EventKind::TransactionAdded`] event. A row that cannot be read back
    /// after a successful insert yields [`LedgerError::Inconsistent`]: the
    /// record exists but is unconfirmed.
    pub async fn add(
        &self,
        candidate: NewTransaction,
        date_override: Option<DateTime<Utc>>,
    ) -> ResultLedger<Transaction> {
        candidate.validate()?;

        let unique_identifier = candidate.unique_identifier.unwrap_or_else(Uuid::new_v4);

        // Best-effort pre-check; the unique index on the table is the real
        // guard against concurrent writers racing past this lookup.
        if self
            .find_model(unique_identifier, true)
            .await?
            .is_some()
        {
            return Err(LedgerError::DuplicateIdentifier(unique_identifier));
        }

        let transaction_date_utc = date_override.unwrap_or_else(Utc::now);
        candidate
            .into_active_model(unique_identifier, transaction_date_utc)
            .insert(&self.database)
            .await?;

        let persisted = match self.find_model(unique_identifier, false).await? {
            Some(model) => Transaction::try_from(model)?,
            None => {
                return Err(LedgerError::Inconsistent(format!(
                    "transaction {unique_identifier} persisted but unconfirmed"
                )));
            }
        };

        tracing::info!(
            unique_identifier = %persisted.unique_identifier,
            amount_total_cents = persisted.amount_total_cents,
            "transaction added"
        );
        self.events
            .publish(EventKind::TransactionAdded, &persisted);
        Ok(persisted)
    }

    /// Soft-deletes the active transaction with the given identifier.
    ///
    /// Fails with [`LedgerError::NotFound`] when no active record matches.
    /// The [`EventKind::TransactionDeleted`] event carries the pre-deletion
    /// snapshot and is published only after a follow-up lookup confirms the
    /// record is no longer active, so the notification reflects confirmed
    /// state rather than write intent.
    pub async fn delete(&self, unique_identifier: Uuid) -> ResultLedger<()> {
        let model = self
            .find_model(unique_identifier, false)
            .await?
            .ok_or(LedgerError::NotFound(unique_identifier))?;
        let snapshot = Transaction::try_from(model.clone())?;

        let mut active: transactions::ActiveModel = model.into();
        active.is_deleted = ActiveValue::Set(true);
        active.update(&self.database).await?;

        if self
            .find_model(unique_identifier, false)
            .await?
            .is_some()
        {
            return Err(LedgerError::Inconsistent(format!(
                "transaction {unique_identifier} is still active after delete"
            )));
        }

        tracing::info!(%unique_identifier, "transaction soft-deleted");
        self.events
            .publish(EventKind::TransactionDeleted, &snapshot);
        Ok(())
    }

    /// Returns the transaction with the given identifier.
    ///
    /// Soft-deleted records are filtered out unless `include_deleted` is set.
    pub async fn get_by_identifier(
        &self,
        unique_identifier: Uuid,
        include_deleted: bool,
    ) -> ResultLedger<Transaction> {
        let model = self
            .find_model(unique_identifier, include_deleted)
            .await?
            .ok_or(LedgerError::NotFound(unique_identifier))?;
        Transaction::try_from(model)
    }

    /// Sums `amount_total_cents` over all non-deleted records (0 when none).
    pub async fn total_active_cents(&self) -> ResultLedger<u64> {
        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_total_cents), 0) AS total \
             FROM transactions \
             WHERE is_deleted = ?",
            vec![false.into()],
        );
        let row = self.database.query_one(stmt).await?;
        let total: i64 = row.and_then(|r| r.try_get("", "total").ok()).unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }

    async fn find_model(
        &self,
        unique_identifier: Uuid,
        include_deleted: bool,
    ) -> ResultLedger<Option<transactions::Model>> {
        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UniqueIdentifier.eq(unique_identifier.to_string()));
        if !include_deleted {
            query = query.filter(transactions::Column::IsDeleted.eq(false));
        }
        Ok(query.one(&self.database).await?)
    }
}

/// The builder for `Ledger`
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
    events: Option<EventBus>,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Share an existing bus; a fresh one is created otherwise.
    pub fn events(mut self, bus: EventBus) -> LedgerBuilder {
        self.events = Some(bus);
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
            events: self.events.unwrap_or_default(),
        }
    }
}
