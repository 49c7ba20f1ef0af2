use mongodb::{
    bson::{doc, Document},
    Client, Database, IndexModel,
};

pub async fn connect(uri: &str) -> mongodb::error::Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client.database("incident_management"))
}

/// Ascending index on `short_id`, the only field incidents are searched by
/// besides their primary id.
pub async fn ensure_indexes(db: &Database) -> mongodb::error::Result<()> {
    let index = IndexModel::builder().keys(doc! { "short_id": 1 }).build();
    db.collection::<Document>("incidents")
        .create_index(index, None)
        .await?;
    Ok(())
}
