use anyhow::Result;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::{Client, Database};

use crate::MongoDbEnv;

const DUPLICATE_KEY_CODE: i32 = 11000;

pub async fn get_db(uri: &str, db_name: &str) -> Result<Database> {
    let client = Client::with_uri_str(uri).await?;
    tracing::info!("[get_db] connected to MongoDB, database `{}`", db_name);
    Ok(client.database(db_name))
}

pub async fn connect(env: &MongoDbEnv) -> Result<Database> {
    get_db(&env.mongodb_uri, &env.mongodb_db_name).await
}

/// True when `err` wraps a MongoDB unique-index violation.
pub fn is_duplicate_key(err: &anyhow::Error) -> bool {
    err.downcast_ref::<mongodb::error::Error>()
        .map(|e| matches!(
            e.kind.as_ref(),
            ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE
        ))
        .unwrap_or(false)
}
