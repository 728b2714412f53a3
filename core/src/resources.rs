//! Typed operations, one per endpoint.
//!
//! Each method names its `Endpoint` and payload types and delegates to one
//! of the generic calls on `ApiClient`.

use uuid::Uuid;

use crate::client::{ApiClient, NO_BODY};
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::http::Transport;
use crate::multipart::{FilePart, MultipartForm};
use crate::types::*;

impl<T: Transport> ApiClient<T> {
    // -- auth ---------------------------------------------------------------

    /// Exchange credentials for a session. The caller stores the token.
    pub async fn login(&self, req: &LoginRequest) -> Result<AuthSession> {
        self.request_with_body(Endpoint::Login, req, &[]).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AuthSession> {
        self.request_with_body(Endpoint::Register, req, &[]).await
    }

    /// The user the current token belongs to.
    pub async fn me(&self) -> Result<User> {
        self.request(Endpoint::Me, &[]).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.request_void(Endpoint::Logout, NO_BODY, &[]).await
    }

    // -- goals --------------------------------------------------------------

    pub async fn list_goals(&self) -> Result<Vec<Goal>> {
        self.request(Endpoint::ListGoals, &[]).await
    }

    pub async fn get_goal(&self, id: Uuid) -> Result<Goal> {
        self.request(Endpoint::GetGoal(id), &[]).await
    }

    pub async fn create_goal(&self, input: &GoalInput) -> Result<Goal> {
        self.request_with_body(Endpoint::CreateGoal, input, &[]).await
    }

    pub async fn update_goal(&self, id: Uuid, input: &GoalInput) -> Result<Goal> {
        self.request_with_body(Endpoint::UpdateGoal(id), input, &[]).await
    }

    pub async fn delete_goal(&self, id: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeleteGoal(id), NO_BODY, &[]).await
    }

    // -- tasks --------------------------------------------------------------

    /// List tasks, optionally only open (`Some(false)`) or done (`Some(true)`).
    pub async fn list_tasks(&self, completed: Option<bool>) -> Result<Vec<Task>> {
        match completed {
            Some(completed) => {
                let completed = completed.to_string();
                self.request(Endpoint::ListTasks, &[("completed", completed.as_str())])
                    .await
            }
            None => self.request(Endpoint::ListTasks, &[]).await,
        }
    }

    pub async fn create_task(&self, input: &TaskInput) -> Result<Task> {
        self.request_with_body(Endpoint::CreateTask, input, &[]).await
    }

    pub async fn update_task(&self, id: Uuid, input: &TaskInput) -> Result<Task> {
        self.request_with_body(Endpoint::UpdateTask(id), input, &[]).await
    }

    pub async fn complete_task(&self, id: Uuid) -> Result<Task> {
        self.request(Endpoint::CompleteTask(id), &[]).await
    }

    pub async fn delete_task(&self, id: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeleteTask(id), NO_BODY, &[]).await
    }

    // -- journal ------------------------------------------------------------

    pub async fn list_journal_entries(&self) -> Result<Vec<JournalEntry>> {
        self.request(Endpoint::ListJournalEntries, &[]).await
    }

    pub async fn create_journal_entry(&self, input: &JournalEntryInput) -> Result<JournalEntry> {
        self.request_with_body(Endpoint::CreateJournalEntry, input, &[])
            .await
    }

    pub async fn update_journal_entry(
        &self,
        id: Uuid,
        input: &JournalEntryInput,
    ) -> Result<JournalEntry> {
        self.request_with_body(Endpoint::UpdateJournalEntry(id), input, &[])
            .await
    }

    pub async fn delete_journal_entry(&self, id: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeleteJournalEntry(id), NO_BODY, &[])
            .await
    }

    // -- pets ---------------------------------------------------------------

    pub async fn list_pets(&self) -> Result<Vec<Pet>> {
        self.request(Endpoint::ListPets, &[]).await
    }

    pub async fn get_pet(&self, id: Uuid) -> Result<Pet> {
        self.request(Endpoint::GetPet(id), &[]).await
    }

    pub async fn create_pet(&self, input: &PetInput) -> Result<Pet> {
        self.request_with_body(Endpoint::CreatePet, input, &[]).await
    }

    pub async fn update_pet(&self, id: Uuid, input: &PetInput) -> Result<Pet> {
        self.request_with_body(Endpoint::UpdatePet(id), input, &[]).await
    }

    pub async fn delete_pet(&self, id: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeletePet(id), NO_BODY, &[]).await
    }

    /// Replace the pet's photo. Returns the pet with its new `photo_url`.
    pub async fn upload_pet_photo(&self, id: Uuid, photo: FilePart) -> Result<Pet> {
        let form = MultipartForm::new().file(photo);
        self.upload_multipart(Endpoint::UploadPetPhoto(id), &form)
            .await
    }

    // -- shopping -----------------------------------------------------------

    pub async fn list_shopping_lists(&self) -> Result<Vec<ShoppingList>> {
        self.request(Endpoint::ListShoppingLists, &[]).await
    }

    pub async fn create_shopping_list(&self, input: &ShoppingListInput) -> Result<ShoppingList> {
        self.request_with_body(Endpoint::CreateShoppingList, input, &[])
            .await
    }

    pub async fn add_shopping_item(
        &self,
        list: Uuid,
        input: &ShoppingItemInput,
    ) -> Result<ShoppingItem> {
        self.request_with_body(Endpoint::AddShoppingItem(list), input, &[])
            .await
    }

    pub async fn toggle_shopping_item(&self, list: Uuid, item: Uuid) -> Result<ShoppingItem> {
        self.request(Endpoint::ToggleShoppingItem(list, item), &[])
            .await
    }

    pub async fn delete_shopping_item(&self, list: Uuid, item: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeleteShoppingItem(list, item), NO_BODY, &[])
            .await
    }

    // -- legal documents ----------------------------------------------------

    pub async fn list_legal_documents(&self) -> Result<Vec<LegalDocument>> {
        self.request(Endpoint::ListLegalDocuments, &[]).await
    }

    pub async fn upload_legal_document(
        &self,
        title: &str,
        category: &str,
        file: FilePart,
    ) -> Result<LegalDocument> {
        let form = MultipartForm::new()
            .field("title", title)
            .field("category", category)
            .file(file);
        self.upload_multipart(Endpoint::UploadLegalDocument, &form)
            .await
    }

    pub async fn delete_legal_document(&self, id: Uuid) -> Result<()> {
        self.request_void(Endpoint::DeleteLegalDocument(id), NO_BODY, &[])
            .await
    }
}
