mod db;
mod db_object;
mod env;

pub use db::{connect, get_db, is_duplicate_key};
pub use db_object::MongoDbObject;
pub use env::MongoDbEnv;

pub use mongodb::bson::{self, doc, Bson, Document};
pub use mongodb::options::IndexOptions;
pub use mongodb::{Database, IndexModel};
