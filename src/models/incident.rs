use futures::stream::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, oid::ObjectId, Document},
    Collection, Database,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Serialize)]
pub struct Incident {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    pub email: String,
    #[serde(rename = "customerName")]
    pub customer_name: String,
    pub address: String,
    #[serde(rename = "contactNumber")]
    pub contact_number: String,
    #[serde(rename = "incidentTitle")]
    pub incident_title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub status: String,
    pub team: String,
}

/// Report submission body. Every field is required; presence is checked in
/// `into_incident` so a missing field yields a single uniform error instead of
/// a deserializer message.
#[derive(Debug, Deserialize)]
pub struct IncidentRequest {
    pub email: Option<String>,
    #[serde(rename = "customerName")]
    pub customer_name: Option<String>,
    pub address: Option<String>,
    #[serde(rename = "contactNumber")]
    pub contact_number: Option<String>,
    #[serde(rename = "incidentTitle")]
    pub incident_title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IncidentUpdateRequest {
    pub status: String,
    pub team: String,
}

#[derive(Debug, Deserialize)]
pub struct IncidentStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IncidentQuery {
    pub email: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub short_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IncidentResponse {
    pub _id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_id: Option<String>,
    pub email: String,
    #[serde(rename = "customerName")]
    pub customer_name: String,
    pub address: String,
    #[serde(rename = "contactNumber")]
    pub contact_number: String,
    #[serde(rename = "incidentTitle")]
    pub incident_title: String,
    pub description: String,
    pub category: String,
    pub date: String,
    pub status: String,
    pub team: String,
}

impl IncidentRequest {
    pub fn into_incident(self) -> Result<Incident, ApiError> {
        match (
            self.email,
            self.customer_name,
            self.address,
            self.contact_number,
            self.incident_title,
            self.description,
            self.category,
            self.date,
        ) {
            (
                Some(email),
                Some(customer_name),
                Some(address),
                Some(contact_number),
                Some(incident_title),
                Some(description),
                Some(category),
                Some(date),
            ) => Ok(Incident {
                _id: None,
                short_id: None,
                email,
                customer_name,
                address,
                contact_number,
                incident_title,
                description,
                category,
                date,
                status: String::from("Pending"),
                team: String::from("No team assigned"),
            }),
            _ => Err(ApiError::Validation(String::from("Missing fields"))),
        }
    }
}

impl IncidentQuery {
    /// Exact filters combine conjunctively; `search` and `short_id` fold into
    /// a single disjunctive clause of case-insensitive substring matches.
    pub fn filter(&self) -> Document {
        let mut filter = Document::new();

        if let Some(email) = &self.email {
            filter.insert("email", email);
        }
        if let Some(category) = &self.category {
            filter.insert("category", category);
        }
        if let Some(status) = &self.status {
            filter.insert("status", status);
        }

        let mut any_of: Vec<Document> = Vec::new();
        if let Some(search) = &self.search {
            let pattern = regex::escape(search);
            any_of.push(doc! { "incidentTitle": { "$regex": &pattern, "$options": "i" } });
            any_of.push(doc! { "description": { "$regex": &pattern, "$options": "i" } });
        }
        if let Some(short_id) = &self.short_id {
            let pattern = regex::escape(short_id);
            any_of.push(doc! { "short_id": { "$regex": pattern, "$options": "i" } });
        }
        if !any_of.is_empty() {
            filter.insert("$or", any_of);
        }

        filter
    }
}

impl From<Incident> for IncidentResponse {
    fn from(incident: Incident) -> Self {
        IncidentResponse {
            _id: incident._id.map(|_id| _id.to_hex()).unwrap_or_default(),
            short_id: incident.short_id,
            email: incident.email,
            customer_name: incident.customer_name,
            address: incident.address,
            contact_number: incident.contact_number,
            incident_title: incident.incident_title,
            description: incident.description,
            category: incident.category,
            date: incident.date,
            status: incident.status,
            team: incident.team,
        }
    }
}

pub fn short_id_of(_id: &ObjectId) -> String {
    let hex = _id.to_hex();
    hex[hex.len() - 5..].to_string()
}

#[derive(Clone)]
pub struct IncidentStore {
    collection: Collection<Incident>,
}

impl IncidentStore {
    pub fn new(db: &Database) -> Self {
        IncidentStore {
            collection: db.collection::<Incident>("incidents"),
        }
    }

    /// Inserts the incident, then writes the derived `short_id` back as a
    /// second update. A crash between the two leaves the record without a
    /// `short_id`.
    pub async fn create(&self, request: IncidentRequest) -> Result<String, ApiError> {
        let mut incident = request.into_incident()?;
        let _id = ObjectId::new();
        incident._id = Some(_id);

        self.collection.insert_one(&incident, None).await?;

        let short_id = short_id_of(&_id);
        self.collection
            .update_one(
                doc! { "_id": _id },
                doc! { "$set": { "short_id": &short_id } },
                None,
            )
            .await?;

        Ok(short_id)
    }

    // Both fields are set unconditionally; status values are not validated
    // against the canonical set. Resubmitting identical values counts as
    // success, only an unmatched id is a 404.
    pub async fn update_status_and_team(
        &self,
        _id: &ObjectId,
        status: &str,
        team: &str,
    ) -> Result<(), ApiError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": _id },
                doc! { "$set": { "status": status, "team": team } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(String::from("Incident not found")));
        }
        Ok(())
    }

    pub async fn update_status(&self, _id: &ObjectId, status: &str) -> Result<(), ApiError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": _id },
                doc! { "$set": { "status": status } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(ApiError::NotFound(String::from("Incident not found")));
        }
        Ok(())
    }

    pub async fn find_many(&self, query: &IncidentQuery) -> Result<Vec<IncidentResponse>, ApiError> {
        let pipeline = vec![
            doc! { "$match": query.filter() },
            doc! {
                "$project": {
                    "_id": { "$toString": "$_id" },
                    "short_id": "$short_id",
                    "email": "$email",
                    "customerName": "$customerName",
                    "address": "$address",
                    "contactNumber": "$contactNumber",
                    "incidentTitle": "$incidentTitle",
                    "description": "$description",
                    "category": "$category",
                    "date": "$date",
                    "status": "$status",
                    "team": "$team",
                }
            },
        ];

        let mut cursor = self.collection.aggregate(pipeline, None).await?;
        let mut incidents: Vec<IncidentResponse> = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            incidents.push(from_document::<IncidentResponse>(doc)?);
        }
        Ok(incidents)
    }

    pub async fn find_by_id(&self, _id: &ObjectId) -> Result<IncidentResponse, ApiError> {
        match self.collection.find_one(doc! { "_id": _id }, None).await? {
            Some(incident) => Ok(IncidentResponse::from(incident)),
            None => Err(ApiError::NotFound(String::from("Incident not found"))),
        }
    }
}
