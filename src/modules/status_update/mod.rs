pub mod report;

use anyhow::Context;
use chrono::{DateTime, Utc};
use production_db::{OrderKey, ProductionRecord, ProductionStatus, ProductionStore, UpdateOutcome};
use thiserror::Error;

pub use report::{count_statuses, render_record, StatusCounts, REPORTED_STATUSES};

/// Order targeted when no key is given.
pub const DEFAULT_ORDER_ID: i64 = 2001;

/// A requested status change for one order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub order: OrderKey,
    pub status: ProductionStatus,
    /// Refuse changes the status lifecycle does not allow and stamp
    /// `completedAt` on the first move into a terminal status.
    pub enforce_transitions: bool,
}

impl Default for StatusChange {
    fn default() -> Self {
        Self {
            order: OrderKey::Int(DEFAULT_ORDER_ID),
            status: ProductionStatus::InProgress,
            enforce_transitions: false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("order {order}: transition from {from} to {to} is not allowed")]
pub struct TransitionRejected {
    pub order: String,
    pub from: ProductionStatus,
    pub to: ProductionStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdateOutcome {
    pub update: UpdateOutcome,
    pub record: Option<ProductionRecord>,
    pub counts: StatusCounts,
}

impl StatusUpdateOutcome {
    /// Text printed after the update: the record, then the counts.
    pub fn render(&self) -> anyhow::Result<String> {
        Ok(format!(
            "Updated record:\n{}\n\nCount by status:\n{}",
            render_record(self.record.as_ref())?,
            self.counts
        ))
    }
}

/// Set the status and `updatedAt` of one order, read it back and count
/// records per reported status.
///
/// A key that matches nothing is not an error; the read-back is empty.
#[tracing::instrument(skip_all, fields(order = %change.order, status = %change.status))]
pub async fn run<S>(
    store: &S,
    change: &StatusChange,
    now: DateTime<Utc>,
) -> anyhow::Result<StatusUpdateOutcome>
where
    S: ProductionStore + ?Sized,
{
    let mut completed_at = None;

    if change.enforce_transitions {
        let current = store
            .find_by_order(&change.order)
            .await
            .with_context(|| format!("failed to load order {}", change.order))?;

        if let Some(current) = current {
            if !current.status.can_transition_to(change.status) {
                return Err(TransitionRejected {
                    order: change.order.to_string(),
                    from: current.status,
                    to: change.status,
                }
                .into());
            }
            if change.status.is_completed() && current.completed_at.is_none() {
                completed_at = Some(now);
            }
        }
    }

    let update = store
        .update_status(&change.order, change.status, now, completed_at)
        .await
        .with_context(|| format!("failed to update status of order {}", change.order))?;

    if update.matched == 0 {
        tracing::warn!("no production record matched");
    } else {
        tracing::info!(modified = update.modified, "production status updated");
    }

    let record = store
        .find_by_order(&change.order)
        .await
        .with_context(|| format!("failed to read back order {}", change.order))?;

    let counts = count_statuses(store, &REPORTED_STATUSES).await?;

    Ok(StatusUpdateOutcome {
        update,
        record,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::seed;
    use chrono::Duration;
    use production_db::InMemoryStore;
    use production_kernel::settings::SeedSettings;

    async fn seeded(now: DateTime<Utc>) -> InMemoryStore {
        let store = InMemoryStore::new("productiondb");
        seed::run(&store, &SeedSettings::default(), now).await.unwrap();
        store
    }

    #[test]
    fn default_change_targets_order_2001_in_progress() {
        let change = StatusChange::default();
        assert_eq!(change.order, OrderKey::Int(2001));
        assert_eq!(change.status, ProductionStatus::InProgress);
        assert!(!change.enforce_transitions);
    }

    #[tokio::test]
    async fn missing_order_leaves_collection_unchanged() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;
        let before = store.records();

        let change = StatusChange {
            order: OrderKey::Text("2001".to_string()),
            ..StatusChange::default()
        };
        let outcome = run(&store, &change, seeded_at + Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(outcome.update.matched, 0);
        assert!(outcome.record.is_none());
        assert_eq!(store.records(), before);
        assert!(outcome.render().unwrap().contains("Updated record:\nnull"));
    }

    #[tokio::test]
    async fn existing_order_gets_new_status_and_timestamp() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;
        let later = seeded_at + Duration::seconds(1);

        let change = StatusChange {
            order: OrderKey::Int(1001),
            ..StatusChange::default()
        };
        let outcome = run(&store, &change, later).await.unwrap();

        let record = outcome.record.unwrap();
        assert_eq!(record.status, ProductionStatus::InProgress);
        assert_eq!(record.updated_at, later);
        assert!(record.updated_at > record.created_at);
        assert_eq!(outcome.update.matched, 1);
        assert_eq!(outcome.counts.get(ProductionStatus::InProgress), Some(2));
        assert_eq!(outcome.counts.get(ProductionStatus::Pending), Some(0));
    }

    #[tokio::test]
    async fn lifecycle_is_not_checked_by_default() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1003),
            status: ProductionStatus::Pending,
            enforce_transitions: false,
        };
        let outcome = run(&store, &change, seeded_at).await.unwrap();

        assert_eq!(outcome.record.unwrap().status, ProductionStatus::Pending);
        assert_eq!(outcome.counts.get(ProductionStatus::Done), Some(0));
    }

    #[tokio::test]
    async fn strict_mode_rejects_leaving_a_terminal_state() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1003),
            status: ProductionStatus::InProgress,
            enforce_transitions: true,
        };
        let err = run(&store, &change, seeded_at).await.unwrap_err();

        assert_eq!(
            err.downcast_ref::<TransitionRejected>(),
            Some(&TransitionRejected {
                order: "1003".to_string(),
                from: ProductionStatus::Done,
                to: ProductionStatus::InProgress,
            })
        );
        let untouched = store.find_by_order(&OrderKey::Int(1003)).await.unwrap().unwrap();
        assert_eq!(untouched.status, ProductionStatus::Done);
    }

    #[tokio::test]
    async fn strict_mode_allows_forward_transition() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1002),
            status: ProductionStatus::Done,
            enforce_transitions: true,
        };
        let finished_at = seeded_at + Duration::minutes(10);
        let outcome = run(&store, &change, finished_at).await.unwrap();

        let record = outcome.record.unwrap();
        assert_eq!(record.status, ProductionStatus::Done);
        assert_eq!(record.completed_at, Some(finished_at));
        assert_eq!(outcome.counts.get(ProductionStatus::Done), Some(2));
    }

    #[tokio::test]
    async fn strict_mode_leaves_non_terminal_moves_without_completion() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1001),
            status: ProductionStatus::InProgress,
            enforce_transitions: true,
        };
        let outcome = run(&store, &change, seeded_at + Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(outcome.record.unwrap().completed_at, None);
    }

    #[tokio::test]
    async fn default_path_never_stamps_completion() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1002),
            status: ProductionStatus::Done,
            enforce_transitions: false,
        };
        let outcome = run(&store, &change, seeded_at + Duration::minutes(1))
            .await
            .unwrap();

        let record = outcome.record.unwrap();
        assert_eq!(record.status, ProductionStatus::Done);
        assert_eq!(record.completed_at, None);
    }

    #[tokio::test]
    async fn rendered_outcome_ends_with_reported_counts() {
        let seeded_at = Utc::now();
        let store = seeded(seeded_at).await;

        let change = StatusChange {
            order: OrderKey::Int(1001),
            ..StatusChange::default()
        };
        let outcome = run(&store, &change, seeded_at + Duration::minutes(2))
            .await
            .unwrap();

        let rendered = outcome.render().unwrap();
        assert!(rendered.contains("\"orderId\": 1001"));
        assert!(rendered.ends_with("PENDING: 0\nIN_PROGRESS: 2\nDONE: 1"));
    }
}
