//! Membership ledger: first-seen timestamps per (user, chat) and the
//! probation-window check built on them.
//!
//! A record is created the first time a user is observed posting in a chat
//! and is never overwritten, so the join time is stable across restarts and
//! duplicate deliveries.

pub mod error;
pub mod ledger;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    ledger::MembershipLedger,
    store::{MembershipRecord, MembershipStore},
};

/// Run database migrations for the membership ledger.
///
/// Creates the `user_joins` table. Call at startup before constructing
/// [`store_sqlite::SqliteMembershipStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
