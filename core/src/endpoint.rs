//! Catalogue of every backend operation.
//!
//! # Design
//! `Endpoint` is the only place a path and verb are paired. Client code
//! never formats an API path by hand; it names a variant and lets
//! `method()`/`path()` supply the rest.

use uuid::Uuid;

use crate::http::HttpMethod;

/// Versioned prefix shared by every path.
pub const API_PREFIX: &str = "/api/v1";

/// One backend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    Me,
    Logout,

    ListGoals,
    CreateGoal,
    GetGoal(Uuid),
    UpdateGoal(Uuid),
    DeleteGoal(Uuid),

    ListTasks,
    CreateTask,
    UpdateTask(Uuid),
    CompleteTask(Uuid),
    DeleteTask(Uuid),

    ListJournalEntries,
    CreateJournalEntry,
    UpdateJournalEntry(Uuid),
    DeleteJournalEntry(Uuid),

    ListPets,
    CreatePet,
    GetPet(Uuid),
    UpdatePet(Uuid),
    DeletePet(Uuid),
    UploadPetPhoto(Uuid),

    ListShoppingLists,
    CreateShoppingList,
    /// Add an item to the given list.
    AddShoppingItem(Uuid),
    /// Flip the checked state of `(list, item)`.
    ToggleShoppingItem(Uuid, Uuid),
    DeleteShoppingItem(Uuid, Uuid),

    ListLegalDocuments,
    UploadLegalDocument,
    DeleteLegalDocument(Uuid),
}

impl Endpoint {
    pub fn method(&self) -> HttpMethod {
        use Endpoint::*;

        match self {
            Me | ListGoals | GetGoal(_) | ListTasks | ListJournalEntries | ListPets | GetPet(_)
            | ListShoppingLists | ListLegalDocuments => HttpMethod::Get,

            Login | Register | Logout | CreateGoal | CreateTask | CreateJournalEntry
            | CreatePet | UploadPetPhoto(_) | CreateShoppingList | AddShoppingItem(_)
            | UploadLegalDocument => HttpMethod::Post,

            UpdateGoal(_) | UpdateTask(_) | UpdateJournalEntry(_) | UpdatePet(_) => {
                HttpMethod::Put
            }

            CompleteTask(_) | ToggleShoppingItem(..) => HttpMethod::Patch,

            DeleteGoal(_) | DeleteTask(_) | DeleteJournalEntry(_) | DeletePet(_)
            | DeleteShoppingItem(..) | DeleteLegalDocument(_) => HttpMethod::Delete,
        }
    }

    /// Absolute path, including the version prefix, without a query string.
    pub fn path(&self) -> String {
        use Endpoint::*;

        let tail = match self {
            Login => "/auth/login".to_string(),
            Register => "/auth/register".to_string(),
            Me => "/auth/me".to_string(),
            Logout => "/auth/logout".to_string(),

            ListGoals | CreateGoal => "/goals".to_string(),
            GetGoal(id) | UpdateGoal(id) | DeleteGoal(id) => format!("/goals/{id}"),

            ListTasks | CreateTask => "/tasks".to_string(),
            UpdateTask(id) | DeleteTask(id) => format!("/tasks/{id}"),
            CompleteTask(id) => format!("/tasks/{id}/complete"),

            ListJournalEntries | CreateJournalEntry => "/journal-entries".to_string(),
            UpdateJournalEntry(id) | DeleteJournalEntry(id) => format!("/journal-entries/{id}"),

            ListPets | CreatePet => "/pets".to_string(),
            GetPet(id) | UpdatePet(id) | DeletePet(id) => format!("/pets/{id}"),
            UploadPetPhoto(id) => format!("/pets/{id}/photo"),

            ListShoppingLists | CreateShoppingList => "/shopping-lists".to_string(),
            AddShoppingItem(list) => format!("/shopping-lists/{list}/items"),
            ToggleShoppingItem(list, item) => {
                format!("/shopping-lists/{list}/items/{item}/toggle")
            }
            DeleteShoppingItem(list, item) => format!("/shopping-lists/{list}/items/{item}"),

            ListLegalDocuments | UploadLegalDocument => "/legal-documents".to_string(),
            DeleteLegalDocument(id) => format!("/legal-documents/{id}"),
        };

        format!("{API_PREFIX}{tail}")
    }
}
