use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, from_document},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::models::{incident::Incident, user::User};

/// One `$group` bucket. A missing or null grouping key is its own bucket,
/// carried as `None`.
#[derive(Debug, Deserialize, Serialize)]
pub struct GroupCount {
    pub _id: Option<String>,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardBreakdown {
    pub category_counts: Vec<GroupCount>,
    pub status_counts: Vec<GroupCount>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_customers: u64,
    pub total_pending: u64,
    pub total_ongoing: u64,
    pub total_completed: u64,
    pub total_incidents: u64,
}

impl DashboardStats {
    pub fn new(total_customers: u64, pending: u64, ongoing: u64, completed: u64) -> Self {
        DashboardStats {
            total_customers,
            total_pending: pending,
            total_ongoing: ongoing,
            total_completed: completed,
            // Incidents with a non-canonical status are excluded from the
            // total.
            total_incidents: pending + ongoing + completed,
        }
    }
}

/// Read-only view over both collections; never mutates state.
#[derive(Clone)]
pub struct DashboardStore {
    incidents: Collection<Incident>,
    users: Collection<User>,
}

impl DashboardStore {
    pub fn new(db: &Database) -> Self {
        DashboardStore {
            incidents: db.collection::<Incident>("incidents"),
            users: db.collection::<User>("users"),
        }
    }

    pub async fn breakdown(&self) -> Result<DashboardBreakdown, ApiError> {
        let category_counts = self.group_incidents("$category").await?;
        let status_counts = self.group_incidents("$status").await?;
        Ok(DashboardBreakdown {
            category_counts,
            status_counts,
        })
    }

    async fn group_incidents(&self, key: &str) -> Result<Vec<GroupCount>, ApiError> {
        let pipeline = vec![doc! {
            "$group": { "_id": key, "count": { "$sum": 1 } }
        }];

        let mut cursor = self.incidents.aggregate(pipeline, None).await?;
        let mut counts: Vec<GroupCount> = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            counts.push(from_document::<GroupCount>(doc)?);
        }
        Ok(counts)
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        let total_customers = self
            .users
            .count_documents(doc! { "userType": "User" }, None)
            .await?;
        let total_pending = self
            .incidents
            .count_documents(doc! { "status": "Pending" }, None)
            .await?;
        let total_ongoing = self
            .incidents
            .count_documents(doc! { "status": "Ongoing" }, None)
            .await?;
        let total_completed = self
            .incidents
            .count_documents(doc! { "status": "Completed" }, None)
            .await?;

        Ok(DashboardStats::new(
            total_customers,
            total_pending,
            total_ongoing,
            total_completed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_canonical_statuses() {
        let stats = DashboardStats::new(12, 3, 2, 5);
        assert_eq!(stats.total_incidents, 10);
        assert_eq!(stats.total_customers, 12);
    }

    #[test]
    fn null_grouping_key_is_its_own_bucket() {
        let row = doc! { "_id": null, "count": 4 };
        let bucket = from_document::<GroupCount>(row).unwrap();
        assert!(bucket._id.is_none());
        assert_eq!(bucket.count, 4);
    }

    #[test]
    fn breakdown_serializes_both_groupings() {
        let breakdown = DashboardBreakdown {
            category_counts: vec![GroupCount {
                _id: Some(String::from("Electrical")),
                count: 2,
            }],
            status_counts: vec![GroupCount {
                _id: Some(String::from("Pending")),
                count: 2,
            }],
        };
        let value = serde_json::to_value(&breakdown).unwrap();

        assert_eq!(value["category_counts"][0]["_id"], "Electrical");
        assert_eq!(value["status_counts"][0]["count"], 2);
    }
}
