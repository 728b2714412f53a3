//! In-memory stand-in for the FamilyLedger backend.
//!
//! Speaks the same envelope format as the real service, requires a bearer
//! token from `/api/v1/auth/login` on every other route, and reports
//! validation failures as 422 with field errors. Some numeric fields are
//! deliberately sent as strings, the way the real backend sometimes does.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Multipart, Path, Query, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const DEMO_EMAIL: &str = "demo@familyledger.app";
pub const DEMO_PASSWORD: &str = "password";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Sent as a decimal string, e.g. `"1500.00"`.
    pub target_amount: Option<String>,
    pub current_amount: Option<f64>,
    pub due_date: Option<String>,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct GoalInput {
    pub title: String,
    pub description: Option<String>,
    pub target_amount: Option<f64>,
    pub current_amount: Option<f64>,
    pub due_date: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<String>,
    pub completed: bool,
}

#[derive(Deserialize)]
pub struct TaskInput {
    pub title: String,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<String>,
}

#[derive(Deserialize)]
pub struct TaskFilter {
    pub completed: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    /// Sent as a string, e.g. `"4"`.
    pub age: Option<String>,
    pub weight: Option<f64>,
    pub photo_url: Option<String>,
}

#[derive(Deserialize)]
pub struct PetInput {
    pub name: String,
    pub species: String,
    pub age: Option<i64>,
    pub weight: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    pub quantity: Option<i64>,
    /// Sent as a decimal string.
    pub price: Option<String>,
    pub checked: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    pub items: Vec<ShoppingItem>,
}

#[derive(Deserialize)]
pub struct ShoppingListInput {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ShoppingItemInput {
    pub name: String,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LegalDocument {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub file_url: String,
    /// Sent as a string.
    pub size_bytes: Option<String>,
    pub uploaded_at: String,
}

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Default)]
pub struct Store {
    user: Option<User>,
    sessions: Vec<String>,
    goals: Vec<Goal>,
    tasks: Vec<Task>,
    pets: Vec<Pet>,
    shopping_lists: Vec<ShoppingList>,
    documents: Vec<LegalDocument>,
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let store = Store {
        user: Some(User {
            id: Uuid::new_v4(),
            name: "Demo Parent".to_string(),
            email: DEMO_EMAIL.to_string(),
        }),
        ..Store::default()
    };
    let db: Db = Arc::new(RwLock::new(store));

    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/me", get(me))
        .route("/api/v1/auth/logout", post(logout))
        .route("/api/v1/goals", get(list_goals).post(create_goal))
        .route(
            "/api/v1/goals/{id}",
            get(get_goal).put(update_goal).delete(delete_goal),
        )
        .route("/api/v1/tasks", get(list_tasks).post(create_task))
        .route("/api/v1/tasks/{id}/complete", patch(complete_task))
        .route("/api/v1/pets", get(list_pets).post(create_pet))
        .route("/api/v1/pets/{id}/photo", post(upload_pet_photo))
        .route(
            "/api/v1/shopping-lists",
            get(list_shopping_lists).post(create_shopping_list),
        )
        .route("/api/v1/shopping-lists/{id}/items", post(add_shopping_item))
        .route(
            "/api/v1/shopping-lists/{list}/items/{item}/toggle",
            patch(toggle_shopping_item),
        )
        .route(
            "/api/v1/legal-documents",
            get(list_documents).post(upload_document),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Envelope responses
// ---------------------------------------------------------------------------

fn ok<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "success": true, "data": data }))).into_response()
}

/// A failed call, rendered as an unsuccessful envelope.
#[derive(Debug)]
pub enum Failure {
    Unauthorized,
    NotFound,
    Invalid(BTreeMap<String, Vec<String>>),
    BadUpload(String),
}

impl Failure {
    fn blank(field: &str) -> Self {
        let mut errors = BTreeMap::new();
        errors.insert(field.to_string(), vec!["can't be blank".to_string()]);
        Failure::Invalid(errors)
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Failure::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "success": false, "message": "unauthenticated" }),
            ),
            Failure::NotFound => (
                StatusCode::NOT_FOUND,
                json!({ "success": false, "message": "not found" }),
            ),
            Failure::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "success": false, "errors": errors }),
            ),
            Failure::BadUpload(message) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "message": message }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

/// The signed-in user, resolved from the bearer token.
pub struct Authed(pub User);

impl FromRequestParts<Db> for Authed {
    type Rejection = Failure;

    async fn from_request_parts(parts: &mut Parts, db: &Db) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers).ok_or(Failure::Unauthorized)?;

        let store = db.read().await;
        if !store.sessions.iter().any(|session| session == token) {
            return Err(Failure::Unauthorized);
        }
        store.user.clone().map(Authed).ok_or(Failure::Unauthorized)
    }
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> Result<Response, Failure> {
    if input.email.trim().is_empty() {
        return Err(Failure::blank("email"));
    }

    let mut store = db.write().await;
    let user = store
        .user
        .clone()
        .filter(|user| user.email == input.email && input.password == DEMO_PASSWORD)
        .ok_or(Failure::Unauthorized)?;

    let token = format!("token-{}", Uuid::new_v4());
    store.sessions.push(token.clone());
    Ok(ok(StatusCode::OK, json!({ "token": token, "user": user })))
}

async fn me(Authed(user): Authed) -> Response {
    ok(StatusCode::OK, user)
}

async fn logout(State(db): State<Db>, headers: HeaderMap) -> Response {
    if let Some(token) = bearer(&headers) {
        db.write().await.sessions.retain(|session| session != token);
    }
    // logging out twice is not an error
    (StatusCode::OK, Json(json!({ "success": true }))).into_response()
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

async fn list_goals(_: Authed, State(db): State<Db>) -> Response {
    ok(StatusCode::OK, &db.read().await.goals)
}

async fn create_goal(
    _: Authed,
    State(db): State<Db>,
    Json(input): Json<GoalInput>,
) -> Result<Response, Failure> {
    if input.title.trim().is_empty() {
        return Err(Failure::blank("title"));
    }
    let goal = Goal {
        id: Uuid::new_v4(),
        title: input.title,
        description: input.description,
        target_amount: input.target_amount.map(|amount| format!("{amount:.2}")),
        current_amount: input.current_amount,
        due_date: input.due_date,
        completed: false,
    };
    db.write().await.goals.push(goal.clone());
    Ok(ok(StatusCode::CREATED, goal))
}

async fn get_goal(_: Authed, State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Response, Failure> {
    let store = db.read().await;
    let goal = store.goals.iter().find(|goal| goal.id == id).ok_or(Failure::NotFound)?;
    Ok(ok(StatusCode::OK, goal))
}

async fn update_goal(
    _: Authed,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<GoalInput>,
) -> Result<Response, Failure> {
    if input.title.trim().is_empty() {
        return Err(Failure::blank("title"));
    }
    let mut store = db.write().await;
    let goal = store.goals.iter_mut().find(|goal| goal.id == id).ok_or(Failure::NotFound)?;
    goal.title = input.title;
    goal.description = input.description;
    goal.target_amount = input.target_amount.map(|amount| format!("{amount:.2}"));
    goal.current_amount = input.current_amount;
    goal.due_date = input.due_date;
    goal.completed = match (goal.target_amount.as_deref(), goal.current_amount) {
        (Some(target), Some(current)) => target.parse::<f64>().is_ok_and(|target| current >= target),
        _ => false,
    };
    Ok(ok(StatusCode::OK, &*goal))
}

async fn delete_goal(_: Authed, State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let before = store.goals.len();
    store.goals.retain(|goal| goal.id != id);
    if store.goals.len() == before {
        return Err(Failure::NotFound);
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

async fn list_tasks(_: Authed, State(db): State<Db>, Query(filter): Query<TaskFilter>) -> Response {
    let store = db.read().await;
    let tasks: Vec<&Task> = store
        .tasks
        .iter()
        .filter(|task| filter.completed.is_none_or(|completed| task.completed == completed))
        .collect();
    ok(StatusCode::OK, tasks)
}

async fn create_task(
    _: Authed,
    State(db): State<Db>,
    Json(input): Json<TaskInput>,
) -> Result<Response, Failure> {
    if input.title.trim().is_empty() {
        return Err(Failure::blank("title"));
    }
    let task = Task {
        id: Uuid::new_v4(),
        title: input.title,
        assignee_id: input.assignee_id,
        due_date: input.due_date,
        completed: false,
    };
    db.write().await.tasks.push(task.clone());
    Ok(ok(StatusCode::CREATED, task))
}

async fn complete_task(_: Authed, State(db): State<Db>, Path(id): Path<Uuid>) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let task = store.tasks.iter_mut().find(|task| task.id == id).ok_or(Failure::NotFound)?;
    task.completed = true;
    Ok(ok(StatusCode::OK, &*task))
}

// ---------------------------------------------------------------------------
// Pets
// ---------------------------------------------------------------------------

async fn list_pets(_: Authed, State(db): State<Db>) -> Response {
    ok(StatusCode::OK, &db.read().await.pets)
}

async fn create_pet(
    _: Authed,
    State(db): State<Db>,
    Json(input): Json<PetInput>,
) -> Result<Response, Failure> {
    if input.name.trim().is_empty() {
        return Err(Failure::blank("name"));
    }
    let pet = Pet {
        id: Uuid::new_v4(),
        name: input.name,
        species: input.species,
        age: input.age.map(|age| age.to_string()),
        weight: input.weight,
        photo_url: None,
    };
    db.write().await.pets.push(pet.clone());
    Ok(ok(StatusCode::CREATED, pet))
}

async fn upload_pet_photo(
    _: Authed,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, Failure> {
    let upload = read_upload(multipart).await?;
    let file_name = upload.file_name.ok_or_else(|| Failure::blank("file"))?;

    let mut store = db.write().await;
    let pet = store.pets.iter_mut().find(|pet| pet.id == id).ok_or(Failure::NotFound)?;
    pet.photo_url = Some(format!("/uploads/pets/{id}/{file_name}"));
    Ok(ok(StatusCode::OK, &*pet))
}

// ---------------------------------------------------------------------------
// Shopping
// ---------------------------------------------------------------------------

async fn list_shopping_lists(_: Authed, State(db): State<Db>) -> Response {
    ok(StatusCode::OK, &db.read().await.shopping_lists)
}

async fn create_shopping_list(
    _: Authed,
    State(db): State<Db>,
    Json(input): Json<ShoppingListInput>,
) -> Result<Response, Failure> {
    if input.name.trim().is_empty() {
        return Err(Failure::blank("name"));
    }
    let list = ShoppingList {
        id: Uuid::new_v4(),
        name: input.name,
        items: Vec::new(),
    };
    db.write().await.shopping_lists.push(list.clone());
    Ok(ok(StatusCode::CREATED, list))
}

async fn add_shopping_item(
    _: Authed,
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    Json(input): Json<ShoppingItemInput>,
) -> Result<Response, Failure> {
    if input.name.trim().is_empty() {
        return Err(Failure::blank("name"));
    }
    let mut store = db.write().await;
    let list = store
        .shopping_lists
        .iter_mut()
        .find(|list| list.id == id)
        .ok_or(Failure::NotFound)?;
    let item = ShoppingItem {
        id: Uuid::new_v4(),
        name: input.name,
        quantity: input.quantity,
        price: input.price.map(|price| format!("{price:.2}")),
        checked: false,
    };
    list.items.push(item.clone());
    Ok(ok(StatusCode::CREATED, item))
}

async fn toggle_shopping_item(
    _: Authed,
    State(db): State<Db>,
    Path((list_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, Failure> {
    let mut store = db.write().await;
    let item = store
        .shopping_lists
        .iter_mut()
        .find(|list| list.id == list_id)
        .and_then(|list| list.items.iter_mut().find(|item| item.id == item_id))
        .ok_or(Failure::NotFound)?;
    item.checked = !item.checked;
    Ok(ok(StatusCode::OK, &*item))
}

// ---------------------------------------------------------------------------
// Legal documents
// ---------------------------------------------------------------------------

async fn list_documents(_: Authed, State(db): State<Db>) -> Response {
    ok(StatusCode::OK, &db.read().await.documents)
}

async fn upload_document(
    _: Authed,
    State(db): State<Db>,
    multipart: Multipart,
) -> Result<Response, Failure> {
    let upload = read_upload(multipart).await?;

    let mut errors = BTreeMap::new();
    for field in ["title", "category"] {
        if upload.fields.get(field).is_none_or(|value| value.trim().is_empty()) {
            errors.insert(field.to_string(), vec!["can't be blank".to_string()]);
        }
    }
    if upload.file_name.is_none() {
        errors.insert("file".to_string(), vec!["can't be blank".to_string()]);
    }
    if !errors.is_empty() {
        return Err(Failure::Invalid(errors));
    }

    let id = Uuid::new_v4();
    let document = LegalDocument {
        id,
        title: upload.fields["title"].clone(),
        category: upload.fields["category"].clone(),
        file_url: format!(
            "/uploads/documents/{id}/{}",
            upload.file_name.unwrap_or_default()
        ),
        size_bytes: Some(upload.size.to_string()),
        uploaded_at: "2024-01-01T00:00:00Z".to_string(),
    };
    db.write().await.documents.push(document.clone());
    Ok(ok(StatusCode::CREATED, document))
}

/// Scalar fields and the single file of a multipart upload.
struct Upload {
    fields: BTreeMap<String, String>,
    file_name: Option<String>,
    size: usize,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Failure> {
    let mut upload = Upload {
        fields: BTreeMap::new(),
        file_name: None,
        size: 0,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Failure::BadUpload(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Failure::BadUpload(e.to_string()))?;
                upload.file_name = Some(file_name);
                upload.size = bytes.len();
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| Failure::BadUpload(e.to_string()))?;
                upload.fields.insert(name, value);
            }
        }
    }

    Ok(upload)
}
