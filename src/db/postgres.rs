//! PostgreSQL backends for the catalog and user store seams.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE titles (
//!     id            UUID PRIMARY KEY,
//!     show_id       TEXT NOT NULL UNIQUE,
//!     kind          TEXT NOT NULL,
//!     name          TEXT NOT NULL,
//!     director      TEXT,
//!     cast_members  TEXT,
//!     country       TEXT,
//!     date_added    TEXT,
//!     release_year  INT,
//!     rating        TEXT,
//!     duration      TEXT,
//!     listed_in     TEXT,
//!     description   TEXT,
//!     poster        TEXT,
//!     imdb_rating   TEXT,
//!     imdb_fetched  BOOLEAN NOT NULL DEFAULT FALSE,
//!     enriched_at   TIMESTAMPTZ
//! );
//!
//! CREATE TABLE users (
//!     id            UUID PRIMARY KEY,
//!     age           INT,
//!     viewed_genres TEXT[] NOT NULL DEFAULT '{}'
//! );
//! ```
//!
//! The tables are populated by the bulk loader and the authentication
//! service respectively; this crate only queries them and performs the two
//! narrow updates (enrichment fields, genre merge).

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::predicate::{TitlePredicate, KID_RATINGS, MATURE_RATINGS};
use crate::db::store::{CatalogStore, UserStore};
use crate::error::{AppError, AppResult};
use crate::models::{Enrichment, Title, TitleKind, User};

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

const TITLE_COLUMNS: &str = "id, show_id, kind, name, director, cast_members, country, \
     date_added, release_year, rating, duration, listed_in, description, \
     poster, imdb_rating, imdb_fetched, enriched_at";

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: Uuid,
    show_id: String,
    kind: String,
    name: String,
    director: Option<String>,
    cast_members: Option<String>,
    country: Option<String>,
    date_added: Option<String>,
    release_year: Option<i32>,
    rating: Option<String>,
    duration: Option<String>,
    listed_in: Option<String>,
    description: Option<String>,
    poster: Option<String>,
    imdb_rating: Option<String>,
    imdb_fetched: bool,
    enriched_at: Option<DateTime<Utc>>,
}

impl From<TitleRow> for Title {
    fn from(row: TitleRow) -> Self {
        Title {
            id: row.id,
            show_id: row.show_id,
            kind: TitleKind::parse(&row.kind),
            name: row.name,
            director: row.director,
            cast: row.cast_members,
            country: row.country,
            date_added: row.date_added,
            release_year: row.release_year,
            rating: row.rating,
            duration: row.duration,
            listed_in: row.listed_in,
            description: row.description,
            poster: row.poster,
            imdb_rating: row.imdb_rating,
            imdb_fetched: row.imdb_fetched,
            enriched_at: row.enriched_at,
        }
    }
}

/// Escapes LIKE wildcards so user input is matched literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

/// Compiles a [`TitlePredicate`] into a WHERE clause
fn push_predicate(query: &mut QueryBuilder<'_, Postgres>, predicate: &TitlePredicate) {
    query.push(" WHERE TRUE");

    if let Some(kind) = predicate.kind {
        query.push(" AND kind = ").push_bind(kind.as_str());
    }

    if let Some(term) = &predicate.search {
        let pattern = like_pattern(term);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR cast_members ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR director ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if !predicate.genres_any.is_empty() {
        query.push(" AND (");
        let mut clauses = query.separated(" OR ");
        for genre in &predicate.genres_any {
            clauses
                .push("listed_in ILIKE ")
                .push_bind_unseparated(like_pattern(genre));
        }
        query.push(")");
    }

    if predicate.exclude_mature {
        query.push(" AND (rating IS NULL OR rating NOT IN (");
        let mut ratings = query.separated(", ");
        for rating in MATURE_RATINGS {
            ratings.push_bind(rating);
        }
        query.push("))");
    }

    if predicate.kids_only {
        query.push(" AND rating IN (");
        let mut ratings = query.separated(", ");
        for rating in KID_RATINGS {
            ratings.push_bind(rating);
        }
        query.push(")");
    }
}

/// PostgreSQL-backed title catalog
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogStore for PgCatalog {
    async fn count_titles(&self, predicate: &TitlePredicate) -> AppResult<u64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM titles");
        push_predicate(&mut query, predicate);

        let count: i64 = query.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn find_titles(
        &self,
        predicate: &TitlePredicate,
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Title>> {
        let mut query =
            QueryBuilder::new(format!("SELECT {} FROM titles", TITLE_COLUMNS));
        push_predicate(&mut query, predicate);
        query
            .push(" ORDER BY name, id OFFSET ")
            .push_bind(offset as i64)
            .push(" LIMIT ")
            .push_bind(i64::from(limit));

        let rows: Vec<TitleRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Title::from).collect())
    }

    async fn sample_titles(
        &self,
        predicate: &TitlePredicate,
        limit: u32,
    ) -> AppResult<Vec<Title>> {
        let mut query =
            QueryBuilder::new(format!("SELECT {} FROM titles", TITLE_COLUMNS));
        push_predicate(&mut query, predicate);
        query
            .push(" ORDER BY random() LIMIT ")
            .push_bind(i64::from(limit));

        let rows: Vec<TitleRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Title::from).collect())
    }

    async fn title_by_id(&self, id: Uuid) -> AppResult<Option<Title>> {
        let sql = format!("SELECT {} FROM titles WHERE id = $1", TITLE_COLUMNS);
        let row: Option<TitleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Title::from))
    }

    async fn title_by_show_id(&self, show_id: &str) -> AppResult<Option<Title>> {
        let sql = format!("SELECT {} FROM titles WHERE show_id = $1", TITLE_COLUMNS);
        let row: Option<TitleRow> = sqlx::query_as(&sql)
            .bind(show_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Title::from))
    }

    async fn apply_enrichment(&self, id: Uuid, enrichment: &Enrichment) -> AppResult<()> {
        // COALESCE keeps existing values when the provider had no field, so
        // concurrent write-backs for the same title are safe.
        sqlx::query(
            "UPDATE titles \
             SET poster = COALESCE($1, poster), \
                 imdb_rating = COALESCE($2, imdb_rating), \
                 imdb_fetched = TRUE, \
                 enriched_at = NOW() \
             WHERE id = $3",
        )
        .bind(&enrichment.poster)
        .bind(&enrichment.imdb_rating)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn genre_fields(&self) -> AppResult<Vec<String>> {
        let fields: Vec<String> =
            sqlx::query_scalar("SELECT listed_in FROM titles WHERE listed_in IS NOT NULL")
                .fetch_all(&self.pool)
                .await?;
        Ok(fields)
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    age: Option<i32>,
    viewed_genres: Vec<String>,
}

/// PostgreSQL-backed user store
#[derive(Clone)]
pub struct PgUsers {
    pool: PgPool,
}

impl PgUsers {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserStore for PgUsers {
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, age, viewed_genres FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| User {
            id: row.id,
            age: row.age,
            viewed_genres: row.viewed_genres,
        }))
    }

    async fn merge_viewed_genres(&self, id: Uuid, genres: &[String]) -> AppResult<()> {
        // Appends only the tags not already present, keeping first-seen order.
        let result = sqlx::query(
            "UPDATE users \
             SET viewed_genres = viewed_genres || COALESCE( \
                 (SELECT array_agg(g ORDER BY ord) \
                    FROM unnest($2::text[]) WITH ORDINALITY AS t(g, ord) \
                   WHERE NOT (g = ANY(users.viewed_genres))), '{}') \
             WHERE id = $1",
        )
        .bind(id)
        .bind(genres)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }
}
