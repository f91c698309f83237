pub mod error;
pub mod query;
pub mod supabase;

pub use error::DatabaseError;
pub use query::QueryBuilder;
pub use supabase::SupabaseClient;
