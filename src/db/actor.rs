use crate::db::schema::SQLITE_INIT;
use crate::error::RelayError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Whether an entry id is already in the ledger.
    Exists(String, RpcReplyPort<Result<bool, RelayError>>),

    /// Record an entry id as processed. Duplicate ids are ignored.
    Insert(String, RpcReplyPort<Result<(), RelayError>>),

    /// Read a secret by key.
    GetSecret(String, RpcReplyPort<Result<Option<String>, RelayError>>),

    /// Upsert a secret.
    SetSecret(String, String, RpcReplyPort<Result<(), RelayError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn exists(&self, id: &str) -> Result<bool, RelayError> {
        ractor::call!(self.actor, DbActorMessage::Exists, id.to_string())
            .map_err(|e| RelayError::RactorError(format!("DbActor Exists RPC failed: {e}")))?
    }

    pub async fn insert(&self, id: &str) -> Result<(), RelayError> {
        ractor::call!(self.actor, DbActorMessage::Insert, id.to_string())
            .map_err(|e| RelayError::RactorError(format!("DbActor Insert RPC failed: {e}")))?
    }

    pub async fn get_secret(&self, key: &str) -> Result<Option<String>, RelayError> {
        ractor::call!(self.actor, DbActorMessage::GetSecret, key.to_string())
            .map_err(|e| RelayError::RactorError(format!("DbActor GetSecret RPC failed: {e}")))?
    }

    pub async fn set_secret(&self, key: &str, value: &str) -> Result<(), RelayError> {
        ractor::call!(
            self.actor,
            DbActorMessage::SetSecret,
            key.to_string(),
            value.to_string()
        )
        .map_err(|e| RelayError::RactorError(format!("DbActor SetSecret RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Exists(id, reply) => {
                let res = self.exists(&state.pool, &id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::Insert(id, reply) => {
                let res = self.insert(&state.pool, &id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetSecret(key, reply) => {
                let res = self.get_secret(&state.pool, &key).await;
                let _ = reply.send(res);
            }
            DbActorMessage::SetSecret(key, value, reply) => {
                let res = self.set_secret(&state.pool, &key, &value).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn exists(&self, pool: &SqlitePool, id: &str) -> Result<bool, RelayError> {
        let found: Option<String> =
            sqlx::query_scalar("SELECT id FROM processed_articles WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, pool: &SqlitePool, id: &str) -> Result<(), RelayError> {
        let result = sqlx::query(
            r#"
        INSERT INTO processed_articles (id, processed_at)
        VALUES (?, ?)
        ON CONFLICT(id) DO NOTHING
        "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(entry_id = %id, "Ledger insert ignored: id already present");
        }
        Ok(())
    }

    async fn get_secret(&self, pool: &SqlitePool, key: &str) -> Result<Option<String>, RelayError> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM secrets WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;
        Ok(value)
    }

    async fn set_secret(&self, pool: &SqlitePool, key: &str, value: &str) -> Result<(), RelayError> {
        sqlx::query(
            r#"
        INSERT INTO secrets (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, RelayError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| RelayError::Configuration(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), RelayError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
