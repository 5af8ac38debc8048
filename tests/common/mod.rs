#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::seq::SliceRandom;
use uuid::Uuid;

use marquee_core::db::predicate::TitlePredicate;
use marquee_core::db::store::{CatalogStore, UserStore};
use marquee_core::error::{AppError, AppResult};
use marquee_core::models::{Enrichment, RatingLookup, Title, TitleKind, User};
use marquee_core::services::providers::RatingProvider;
use marquee_core::services::{
    CatalogService, EnrichmentCache, EnrichmentWriterHandle, GenreIndex, RecommendationService,
};

/// In-memory store backing both collaborator seams for tests.
///
/// Filtering reuses `TitlePredicate::matches`, which defines the predicate
/// semantics the SQL backend compiles.
#[derive(Default)]
pub struct MemoryStore {
    titles: Mutex<Vec<Title>>,
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn add_title(&self, title: Title) {
        self.titles.lock().unwrap().push(title);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn get_title(&self, id: Uuid) -> Option<Title> {
        self.titles
            .lock()
            .unwrap()
            .iter()
            .find(|title| title.id == id)
            .cloned()
    }

    pub fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn matching(&self, predicate: &TitlePredicate) -> Vec<Title> {
        self.titles
            .lock()
            .unwrap()
            .iter()
            .filter(|title| predicate.matches(title))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn count_titles(&self, predicate: &TitlePredicate) -> AppResult<u64> {
        Ok(self.matching(predicate).len() as u64)
    }

    async fn find_titles(
        &self,
        predicate: &TitlePredicate,
        offset: u64,
        limit: u32,
    ) -> AppResult<Vec<Title>> {
        let mut matches = self.matching(predicate);
        matches.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn sample_titles(
        &self,
        predicate: &TitlePredicate,
        limit: u32,
    ) -> AppResult<Vec<Title>> {
        let matches = self.matching(predicate);
        let mut rng = rand::thread_rng();
        Ok(matches
            .choose_multiple(&mut rng, limit as usize)
            .cloned()
            .collect())
    }

    async fn title_by_id(&self, id: Uuid) -> AppResult<Option<Title>> {
        Ok(self.get_title(id))
    }

    async fn title_by_show_id(&self, show_id: &str) -> AppResult<Option<Title>> {
        Ok(self
            .titles
            .lock()
            .unwrap()
            .iter()
            .find(|title| title.show_id == show_id)
            .cloned())
    }

    async fn apply_enrichment(&self, id: Uuid, enrichment: &Enrichment) -> AppResult<()> {
        let mut titles = self.titles.lock().unwrap();
        let title = titles
            .iter_mut()
            .find(|title| title.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Title {} not found", id)))?;

        if enrichment.poster.is_some() {
            title.poster = enrichment.poster.clone();
        }
        if enrichment.imdb_rating.is_some() {
            title.imdb_rating = enrichment.imdb_rating.clone();
        }
        title.imdb_fetched = true;
        title.enriched_at = Some(Utc::now());
        Ok(())
    }

    async fn genre_fields(&self) -> AppResult<Vec<String>> {
        Ok(self
            .titles
            .lock()
            .unwrap()
            .iter()
            .filter_map(|title| title.listed_in.clone())
            .collect())
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.get_user(id))
    }

    async fn merge_viewed_genres(&self, id: Uuid, genres: &[String]) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        for genre in genres {
            if !user.viewed_genres.contains(genre) {
                user.viewed_genres.push(genre.clone());
            }
        }
        Ok(())
    }
}

enum StubOutcome {
    Found,
    Empty,
    Fail,
}

/// Scripted rating provider counting its lookup calls
pub struct StubProvider {
    outcome: StubOutcome,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn found() -> Self {
        Self {
            outcome: StubOutcome::Found,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            outcome: StubOutcome::Empty,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: StubOutcome::Fail,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RatingProvider for StubProvider {
    async fn lookup(&self, name: &str, _year: Option<i32>) -> AppResult<RatingLookup> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            StubOutcome::Found => Ok(RatingLookup {
                title: Some(name.to_string()),
                imdb_rating: Some("8.0".to_string()),
                imdb_votes: Some("120,000".to_string()),
                metascore: Some("70".to_string()),
                poster: Some(format!("http://img.test/{}.jpg", name.replace(' ', "-"))),
                ratings: Vec::new(),
            }),
            StubOutcome::Empty => Ok(RatingLookup::default()),
            StubOutcome::Fail => Err(AppError::ExternalApi("provider down".to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub struct TestBed {
    pub store: Arc<MemoryStore>,
    pub provider: Arc<StubProvider>,
    pub catalog: CatalogService,
    pub recommendations: RecommendationService,
    pub genres: GenreIndex,
    _enrichment_writer: EnrichmentWriterHandle,
}

pub fn testbed() -> TestBed {
    testbed_with(StubProvider::found())
}

pub fn testbed_with(provider: StubProvider) -> TestBed {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let store = Arc::new(MemoryStore::default());
    let provider = Arc::new(provider);

    let store_dyn: Arc<dyn CatalogStore> = store.clone();
    let users_dyn: Arc<dyn UserStore> = store.clone();
    let provider_dyn: Arc<dyn RatingProvider> = provider.clone();

    let (enrichment, enrichment_writer) =
        EnrichmentCache::new(provider_dyn.clone(), store_dyn.clone());

    let catalog = CatalogService::new(
        store_dyn.clone(),
        users_dyn.clone(),
        enrichment.clone(),
        provider_dyn,
    );
    let recommendations =
        RecommendationService::new(store_dyn.clone(), users_dyn, enrichment);
    let genres = GenreIndex::new(store_dyn);

    TestBed {
        store,
        provider,
        catalog,
        recommendations,
        genres,
        _enrichment_writer: enrichment_writer,
    }
}

/// Builds a movie with the given name and no enrichment data
pub fn title(name: &str) -> Title {
    Title {
        id: Uuid::new_v4(),
        show_id: format!("s-{}", name.to_lowercase().replace(' ', "-")),
        kind: TitleKind::Movie,
        name: name.to_string(),
        director: None,
        cast: None,
        country: None,
        date_added: None,
        release_year: Some(2020),
        rating: Some("PG-13".to_string()),
        duration: None,
        listed_in: Some("Dramas".to_string()),
        description: None,
        poster: None,
        imdb_rating: None,
        imdb_fetched: false,
        enriched_at: None,
    }
}

pub fn user(genres: &[&str]) -> User {
    User {
        id: Uuid::new_v4(),
        age: None,
        viewed_genres: genres.iter().map(|genre| genre.to_string()).collect(),
    }
}
