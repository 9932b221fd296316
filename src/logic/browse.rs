use crate::model::{DatabaseInfo, ModelMeasures, UpdateError};
use crate::store::traits::{ModelServer, ModelSession};

/// Current identity and ETag of a database
pub async fn describe_database<M: ModelServer>(
    server: &M,
    connection_string: &str,
    database: &str,
) -> Result<DatabaseInfo, UpdateError> {
    let mut session = connect(server, connection_string).await?;
    let snapshot = session
        .fetch_database(database)
        .await
        .map_err(|e| UpdateError::connection(e.to_string()))?
        .ok_or_else(|| UpdateError::DatabaseNotFound {
            database: database.to_string(),
        })?;

    Ok(DatabaseInfo::from(&snapshot))
}

/// Every measure of a database with the ETag it was read at
pub async fn list_measures<M: ModelServer>(
    server: &M,
    connection_string: &str,
    database: &str,
) -> Result<ModelMeasures, UpdateError> {
    let mut session = connect(server, connection_string).await?;
    let snapshot = session
        .fetch_database(database)
        .await
        .map_err(|e| UpdateError::connection(e.to_string()))?
        .ok_or_else(|| UpdateError::DatabaseNotFound {
            database: database.to_string(),
        })?;

    Ok(ModelMeasures {
        database: DatabaseInfo::from(&snapshot),
        measures: session.list_measures(database),
    })
}

async fn connect<M: ModelServer>(server: &M, connection_string: &str) -> Result<M::Session, UpdateError> {
    server
        .connect(connection_string)
        .await
        .map_err(|e| UpdateError::connection(e.to_string()))
}
