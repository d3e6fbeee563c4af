//! SeaORM-backed repository implementation for the domain port.
//!
//! Generic over `C: ConnectionTrait + TransactionTrait`, so it works with a
//! `DatabaseConnection` as well as inside an outer transaction.

use anyhow::Context;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

use crate::contract::model::{NewUser, User};
use crate::domain::repo::{RepoError, RepoResult, UsersRepository};
use crate::infra::storage::entity::{ActiveModel as UserAM, Column, Entity as UserEntity};

/// SeaORM repository impl.
/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn active_model(u: NewUser) -> UserAM {
    UserAM {
        name: Set(u.name),
        email: Set(u.email),
        username: Set(u.username),
        phone: Set(u.phone),
        website: Set(u.website),
        company: Set(u.company),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
}

const LIKE_ESCAPE: char = '!';

/// `%fragment%` with LIKE wildcards in `fragment` matched literally.
fn contains_pattern(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len() + 2);
    out.push('%');
    for c in fragment.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Unique violations become `RepoError::UniqueViolation` naming the column(s);
/// everything else keeps its context.
fn write_error(err: DbErr, what: &'static str) -> RepoError {
    match db::unique_violation(&err) {
        Some(msg) => {
            let cols = db::errors::violated_columns(&msg);
            if cols.is_empty() {
                RepoError::unique(msg)
            } else {
                RepoError::unique(cols.join(","))
            }
        }
        None => RepoError::Other(anyhow::Error::new(err).context(what)),
    }
}

#[async_trait::async_trait]
impl<C> UsersRepository for SeaOrmUsersRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let rows = UserEntity::find()
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("find_all failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_id(&self, id: i64) -> RepoResult<Option<User>> {
        let found = UserEntity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_by_id failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        // Stored emails are lower-cased; callers may pass any casing.
        let found = UserEntity::find()
            .filter(Column::Email.eq(email.to_lowercase()))
            .one(&self.conn)
            .await
            .context("find_by_email failed")?;
        Ok(found.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let found = UserEntity::find()
            .filter(Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("find_by_username failed")?;
        Ok(found.map(Into::into))
    }

    async fn search_by_name(&self, fragment: &str) -> RepoResult<Vec<User>> {
        let pattern = LikeExpr::new(contains_pattern(fragment)).escape(LIKE_ESCAPE);
        let rows = UserEntity::find()
            .filter(Expr::col(Column::Name).like(pattern))
            .order_by_asc(Column::Id)
            .all(&self.conn)
            .await
            .context("search_by_name failed")?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, user: NewUser) -> RepoResult<User> {
        let model = active_model(user)
            .insert(&self.conn)
            .await
            .map_err(|e| write_error(e, "insert failed"))?;
        Ok(model.into())
    }

    async fn insert_many(&self, users: Vec<NewUser>) -> RepoResult<Vec<User>> {
        let txn = self.conn.begin().await.context("begin failed")?;

        let mut created = Vec::with_capacity(users.len());
        for user in users {
            // Dropping `txn` on the error path rolls everything back.
            let model = active_model(user)
                .insert(&txn)
                .await
                .map_err(|e| write_error(e, "insert_many failed"))?;
            created.push(model.into());
        }

        txn.commit().await.context("commit failed")?;
        Ok(created)
    }

    async fn delete_all(&self) -> RepoResult<u64> {
        let res = UserEntity::delete_many()
            .exec(&self.conn)
            .await
            .context("delete_all failed")?;
        Ok(res.rows_affected)
    }

    async fn count(&self) -> RepoResult<u64> {
        let n = UserEntity::find()
            .count(&self.conn)
            .await
            .context("count failed")?;
        Ok(n)
    }

    async fn ping(&self) -> RepoResult<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .context("ping failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Roe"), "%Roe%");
        assert_eq!(contains_pattern("_"), "%!_%");
        assert_eq!(contains_pattern("50%"), "%50!%%");
        assert_eq!(contains_pattern("hi!"), "%hi!!%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\b%");
    }
}
