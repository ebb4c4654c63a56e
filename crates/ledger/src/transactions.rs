//! Transaction primitives.
//!
//! A `Transaction` is a single recorded expense. Records are never edited or
//! hard-deleted: deletion only flips the `is_deleted` flag.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

/// Maximum length of a transaction description, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 50;

/// A persisted transaction record, as read back from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Store-assigned sequential id.
    pub id: i32,
    /// Externally visible identity.
    pub unique_identifier: Uuid,
    pub description: String,
    pub amount_total_cents: u64,
    pub transaction_date_utc: DateTime<Utc>,
    pub is_deleted: bool,
}

/// A candidate transaction, not yet validated or persisted.
///
/// `amount_total_cents` is signed here so that negative input is representable
/// and can be rejected by validation before coercion to the unsigned domain
/// type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewTransaction {
    pub description: String,
    pub amount_total_cents: i64,
    /// Caller-supplied identity; generated when absent.
    pub unique_identifier: Option<Uuid>,
}

impl NewTransaction {
    pub fn new(description: impl Into<String>, amount_total_cents: i64) -> Self {
        Self {
            description: description.into(),
            amount_total_cents,
            unique_identifier: None,
        }
    }

    pub fn with_identifier(mut self, unique_identifier: Uuid) -> Self {
        self.unique_identifier = Some(unique_identifier);
        self
    }

    /// Checks the business rules a record must satisfy before persistence.
    pub(crate) fn validate(&self) -> Result<(), LedgerError> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "transaction description is null or blank".to_string(),
            ));
        }
        if self.description.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(LedgerError::Validation(format!(
                "transaction description character limit is {DESCRIPTION_MAX_CHARS}"
            )));
        }
        if self.amount_total_cents < 0 {
            return Err(LedgerError::Validation(
                "amount_total_cents is a negative value".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the row to insert. Call [`validate`](Self::validate) first: the
    /// amount cast assumes the negative case was already rejected.
    pub(crate) fn into_active_model(
        self,
        unique_identifier: Uuid,
        transaction_date_utc: DateTime<Utc>,
    ) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::NotSet,
            unique_identifier: ActiveValue::Set(unique_identifier.to_string()),
            description: ActiveValue::Set(self.description),
            amount_total_cents: ActiveValue::Set(self.amount_total_cents.max(0)),
            transaction_date_utc: ActiveValue::Set(transaction_date_utc),
            is_deleted: ActiveValue::Set(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub unique_identifier: String,
    pub description: String,
    pub amount_total_cents: i64,
    pub transaction_date_utc: DateTimeUtc,
    pub is_deleted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Transaction {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let unique_identifier = Uuid::parse_str(&model.unique_identifier).map_err(|_| {
            LedgerError::Inconsistent(format!(
                "stored unique identifier is not a uuid: {}",
                model.unique_identifier
            ))
        })?;
        let amount_total_cents = u64::try_from(model.amount_total_cents).map_err(|_| {
            LedgerError::Inconsistent(format!(
                "stored amount is negative for transaction {unique_identifier}"
            ))
        })?;

        Ok(Self {
            id: model.id,
            unique_identifier,
            description: model.description,
            amount_total_cents,
            transaction_date_utc: model.transaction_date_utc,
            is_deleted: model.is_deleted,
        })
    }
}
