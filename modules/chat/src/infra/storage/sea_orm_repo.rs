//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait`, so it works with a `DatabaseConnection`
//! or a transaction.

use std::collections::HashMap;

use anyhow::Context;
use sea_orm::{
    sea_query::{Alias, Expr, Func, Query, SelectStatement, SimpleExpr},
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, SqlErr,
};
use uuid::Uuid;

use crate::contract::model::{Chat, Message};
use crate::domain::repo::{ChatInsert, ChatsRepository};
use crate::infra::storage::entity::{chat, message};

pub struct SeaOrmChatsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmChatsRepository<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    /// Ids of every chat the user takes part in.
    async fn chat_ids_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        chat::Entity::find()
            .select_only()
            .column(chat::Column::Id)
            .filter(participant(user_id))
            .into_tuple::<Uuid>()
            .all(&self.conn)
            .await
            .context("chat_ids_for_user failed")
    }
}

fn participant(user_id: Uuid) -> Condition {
    Condition::any()
        .add(chat::Column::SenderId.eq(user_id))
        .add(chat::Column::ReceiverId.eq(user_id))
}

/// Correlated subquery matching a message of the same chat that sorts after
/// the outer row by `(created_at, id)`.
fn later_in_same_chat() -> SelectStatement {
    let newer = Alias::new("newer");
    Query::select()
        .expr(Expr::val(1))
        .from_as(message::Entity, newer.clone())
        .and_where(
            Expr::col((newer.clone(), message::Column::ChatId))
                .equals((message::Entity, message::Column::ChatId)),
        )
        .and_where(
            Expr::col((newer.clone(), message::Column::CreatedAt))
                .gt(Expr::col((message::Entity, message::Column::CreatedAt)))
                .or(Expr::col((newer.clone(), message::Column::CreatedAt))
                    .eq(Expr::col((message::Entity, message::Column::CreatedAt)))
                    .and(
                        Expr::col((newer, message::Column::Id))
                            .gt(Expr::col((message::Entity, message::Column::Id))),
                    )),
        )
        .to_owned()
}

/// Unread and written by someone other than `reader_id`.
fn unread_for(reader_id: Uuid) -> Condition {
    Condition::all()
        .add(message::Column::IsRead.eq(false))
        .add(message::Column::AuthorId.ne(reader_id))
}

#[async_trait::async_trait]
impl<C> ChatsRepository for SeaOrmChatsRepository<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_chat(&self, id: Uuid) -> anyhow::Result<Option<Chat>> {
        let found = chat::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_chat failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_chat_by_pair(&self, low: Uuid, high: Uuid) -> anyhow::Result<Option<Chat>> {
        let found = chat::Entity::find()
            .filter(chat::Column::UserLow.eq(low))
            .filter(chat::Column::UserHigh.eq(high))
            .one(&self.conn)
            .await
            .context("find_chat_by_pair failed")?;
        Ok(found.map(Into::into))
    }

    async fn insert_chat(&self, c: Chat) -> anyhow::Result<ChatInsert> {
        let am: chat::ActiveModel = c.into();
        match chat::Entity::insert(am).exec_without_returning(&self.conn).await {
            Ok(_) => Ok(ChatInsert::Inserted),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(ChatInsert::PairExists)
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert_chat failed")),
        }
    }

    async fn list_chats_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Chat>> {
        let rows = chat::Entity::find()
            .filter(participant(user_id))
            .order_by_desc(chat::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("list_chats_for_user failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_message(&self, m: Message) -> anyhow::Result<()> {
        let am: message::ActiveModel = m.into();
        let _ = am.insert(&self.conn).await.context("insert_message failed")?;
        Ok(())
    }

    async fn list_messages(&self, chat_id: Uuid) -> anyhow::Result<Vec<Message>> {
        let rows = message::Entity::find()
            .filter(message::Column::ChatId.eq(chat_id))
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id)
            .all(&self.conn)
            .await
            .context("list_messages failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn last_messages(&self, chat_ids: &[Uuid]) -> anyhow::Result<Vec<Message>> {
        if chat_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = message::Entity::find()
            .filter(message::Column::ChatId.is_in(chat_ids.iter().copied()))
            .filter(Condition::all().add(Expr::exists(later_in_same_chat())).not())
            .all(&self.conn)
            .await
            .context("last_messages failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn unread_counts(
        &self,
        chat_ids: &[Uuid],
        reader_id: Uuid,
    ) -> anyhow::Result<HashMap<Uuid, u64>> {
        if chat_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = message::Entity::find()
            .select_only()
            .column(message::Column::ChatId)
            .column_as(SimpleExpr::from(Func::count(Expr::col(message::Column::Id))), "unread")
            .filter(message::Column::ChatId.is_in(chat_ids.iter().copied()))
            .filter(unread_for(reader_id))
            .group_by(message::Column::ChatId)
            .into_tuple::<(Uuid, i64)>()
            .all(&self.conn)
            .await
            .context("unread_counts failed")?;
        Ok(rows
            .into_iter()
            .map(|(chat_id, n)| (chat_id, u64::try_from(n).unwrap_or(0)))
            .collect())
    }

    async fn mark_read(&self, chat_id: Uuid, reader_id: Uuid) -> anyhow::Result<u64> {
        let res = message::Entity::update_many()
            .col_expr(message::Column::IsRead, Expr::value(true))
            .filter(message::Column::ChatId.eq(chat_id))
            .filter(unread_for(reader_id))
            .exec(&self.conn)
            .await
            .context("mark_read failed")?;
        Ok(res.rows_affected)
    }

    async fn unread_total(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let chat_ids = self.chat_ids_for_user(user_id).await?;
        if chat_ids.is_empty() {
            return Ok(0);
        }
        message::Entity::find()
            .filter(message::Column::ChatId.is_in(chat_ids))
            .filter(unread_for(user_id))
            .count(&self.conn)
            .await
            .context("unread_total failed")
    }
}
