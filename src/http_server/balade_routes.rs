//! Balade HTTP Routes
//!
//! One handler per endpoint. Each handler turns path and body parameters
//! into a single store call and maps the outcome to a status and JSON body.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{Map, Value};

use crate::rest_api::{
    AddKeywordRequest, CountResponse, MessageResponse, RenameRequest, RestError, RestResult,
};
use crate::store::{
    Balade, BaladeStore, Filter, GroupCount, NewBalade, SortBy, StoreResult, UpdateOutcome,
};

/// `GET /mot-cle` returns records with strictly more keywords than this
pub const KEYWORD_THRESHOLD: usize = 5;

// ==================
// Shared State
// ==================

/// Balade state shared across handlers
pub struct BaladeState {
    pub store: Arc<dyn BaladeStore>,
}

impl BaladeState {
    pub fn new(store: Arc<dyn BaladeStore>) -> Self {
        Self { store }
    }

    /// Run one store call on the blocking pool so disk writes never stall
    /// the async workers
    pub async fn call<T, F>(&self, f: F) -> RestResult<T>
    where
        F: FnOnce(&dyn BaladeStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&*store))
            .await
            .map_err(|e| RestError::Internal(format!("store task failed: {}", e)))?
            .map_err(RestError::from)
    }
}

type BaladeStateRef = State<Arc<BaladeState>>;

// ==================
// Balade Routes
// ==================

/// Create Balade routes
pub fn balade_routes(state: Arc<BaladeState>) -> Router {
    Router::new()
        // Reads
        .route("/all", get(list_all_handler))
        .route("/id/{id}", get(get_by_id_handler))
        .route("/search/{search}", get(search_handler))
        .route("/site-internet", get(with_website_handler))
        .route("/mot-cle", get(many_keywords_handler))
        .route("/publie/{annee}", get(published_in_handler))
        // Aggregates
        .route("/arrondissement/{num}", get(arrondissement_count_handler))
        .route("/synthese", get(synthese_handler))
        .route("/categories", get(categories_handler))
        .route("/categorie", get(categories_handler))
        // Writes
        .route("/add", post(add_handler))
        .route("/add-mot_cle/{id}", put(add_keyword_handler))
        .route("/update-one/{id}", put(update_one_handler))
        .route("/update-many/{search}", put(update_many_handler))
        .route("/delete/{id}", delete(delete_handler))
        .with_state(state)
}

// ==================
// Read Handlers
// ==================

async fn list_all_handler(State(state): BaladeStateRef) -> RestResult<Json<Vec<Balade>>> {
    Ok(Json(state.call(|store| store.find_all()).await?))
}

async fn get_by_id_handler(
    State(state): BaladeStateRef,
    Path(id): Path<String>,
) -> RestResult<Json<Balade>> {
    state
        .call(move |store| store.find_by_id(&id))
        .await?
        .map(Json)
        .ok_or(RestError::NotFound)
}

/// Name or introduction contains the search term
async fn search_handler(
    State(state): BaladeStateRef,
    Path(search): Path<String>,
) -> RestResult<Json<Vec<Balade>>> {
    let filter = Filter::Or(vec![
        Filter::contains("nom_poi", &search)?,
        Filter::contains("texte_intro", &search)?,
    ]);

    Ok(Json(find(&state, filter, None).await?))
}

async fn with_website_handler(State(state): BaladeStateRef) -> RestResult<Json<Vec<Balade>>> {
    let filter = Filter::exists("url_site");
    Ok(Json(find(&state, filter, None).await?))
}

async fn many_keywords_handler(State(state): BaladeStateRef) -> RestResult<Json<Vec<Balade>>> {
    let filter = Filter::size_greater_than("mot_cle", KEYWORD_THRESHOLD);
    Ok(Json(find(&state, filter, None).await?))
}

/// Entry date starts with the year, oldest first
async fn published_in_handler(
    State(state): BaladeStateRef,
    Path(annee): Path<String>,
) -> RestResult<Json<Vec<Balade>>> {
    let filter = Filter::prefix("date_saisie", &annee)?;
    let sort = SortBy::ascending("date_saisie");

    Ok(Json(find(&state, filter, Some(sort)).await?))
}

async fn find(state: &BaladeState, filter: Filter, sort: Option<SortBy>) -> RestResult<Vec<Balade>> {
    state
        .call(move |store| store.find_by_filter(&filter, sort.as_ref()))
        .await
}

// ==================
// Aggregate Handlers
// ==================

async fn arrondissement_count_handler(
    State(state): BaladeStateRef,
    Path(num): Path<String>,
) -> RestResult<Json<CountResponse>> {
    let filter = Filter::eq("code_postal", num);
    let count = state.call(move |store| store.count_by_filter(&filter)).await?;
    Ok(Json(CountResponse::new(count)))
}

async fn synthese_handler(State(state): BaladeStateRef) -> RestResult<Json<Vec<GroupCount>>> {
    Ok(Json(
        state
            .call(|store| store.aggregate_group_count("code_postal"))
            .await?,
    ))
}

async fn categories_handler(State(state): BaladeStateRef) -> RestResult<Json<Vec<String>>> {
    Ok(Json(state.call(|store| store.distinct_values("categorie")).await?))
}

// ==================
// Write Handlers
// ==================

async fn add_handler(
    State(state): BaladeStateRef,
    body: Result<Json<Value>, JsonRejection>,
) -> RestResult<(StatusCode, Json<Balade>)> {
    let Json(body) = body?;
    let balade = NewBalade::from_document(body)?;

    let stored = state.call(move |store| store.insert(balade)).await?;
    tracing::info!(id = %stored.id, "balade created");

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn add_keyword_handler(
    State(state): BaladeStateRef,
    Path(id): Path<String>,
    body: Result<Json<AddKeywordRequest>, JsonRejection>,
) -> RestResult<Json<UpdateOutcome>> {
    let Json(request) = body?;
    let keyword = Value::String(request.mot_cle);
    let outcome = state
        .call(move |store| store.update_add_to_set(&id, "mot_cle", &keyword))
        .await?;

    Ok(Json(outcome))
}

async fn update_one_handler(
    State(state): BaladeStateRef,
    Path(id): Path<String>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> RestResult<Json<Balade>> {
    let Json(patch) = body?;

    state
        .call(move |store| store.update_by_id(&id, &patch))
        .await?
        .map(Json)
        .ok_or(RestError::NotFound)
}

/// Rename every Balade whose description contains the search term
async fn update_many_handler(
    State(state): BaladeStateRef,
    Path(search): Path<String>,
    body: Result<Json<RenameRequest>, JsonRejection>,
) -> RestResult<Json<UpdateOutcome>> {
    let Json(request) = body?;
    let filter = Filter::contains("texte_description", &search)?;

    let mut updates = Map::new();
    updates.insert("nom_poi".to_string(), Value::String(request.nom_poi));

    let outcome = state
        .call(move |store| store.update_many_by_filter(&filter, &updates))
        .await?;
    Ok(Json(outcome))
}

async fn delete_handler(
    State(state): BaladeStateRef,
    Path(id): Path<String>,
) -> RestResult<Json<MessageResponse>> {
    let target = id.clone();
    let outcome = state.call(move |store| store.delete_by_id(&target)).await?;
    if outcome.deleted_count == 0 {
        return Err(RestError::NotFound);
    }

    tracing::info!(%id, "balade deleted");
    Ok(Json(MessageResponse::new("Balade deleted successfully")))
}
