use chrono::{DateTime, Duration, Utc};
use production_db::{ProductionRecord, ProductionStatus};

/// The three sample records, timestamped relative to `now`.
pub fn sample_records(now: DateTime<Utc>) -> Vec<ProductionRecord> {
    let one_hour_ago = now - Duration::hours(1);
    let two_hours_ago = now - Duration::hours(2);
    let half_hour_ago = now - Duration::minutes(30);

    vec![
        ProductionRecord {
            order_id: 1001,
            product_ids: vec![501, 502],
            status: ProductionStatus::Preparing,
            started_at: now,
            completed_at: None,
            created_at: now,
            updated_at: now,
        },
        ProductionRecord {
            order_id: 1002,
            product_ids: vec![503],
            status: ProductionStatus::InProgress,
            started_at: one_hour_ago,
            completed_at: None,
            created_at: one_hour_ago,
            updated_at: now,
        },
        ProductionRecord {
            order_id: 1003,
            product_ids: vec![504, 505, 506],
            status: ProductionStatus::Done,
            started_at: two_hours_ago,
            completed_at: Some(half_hour_ago),
            created_at: two_hours_ago,
            updated_at: half_hour_ago,
        },
    ]
}
