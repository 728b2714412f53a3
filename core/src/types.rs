//! Domain DTOs exchanged with the backend.
//!
//! # Design
//! Read models (`Goal`, `Pet`, ...) mirror what the backend returns inside
//! the envelope's `data`. Write models (`GoalInput`, ...) are what callers
//! send; optional fields are omitted from the JSON when unset. Timestamps
//! are kept as the backend's ISO-8601 strings. Amounts and quantities the
//! backend is inconsistent about use the dual-shape types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::{StringOrInt, StringOrNumber};

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Result of logging in or registering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Bearer token for future requests.
    pub token: String,
    pub user: User,
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_amount: Option<StringOrNumber>,
    #[serde(default)]
    pub current_amount: Option<StringOrNumber>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl Goal {
    /// Fraction of the target reached, clamped to `0.0..=1.0`. `None` when
    /// either amount is missing or the target is not positive.
    pub fn progress(&self) -> Option<f64> {
        let target = self.target_amount.as_ref()?.value()?;
        let current = self.current_amount.as_ref()?.value()?;
        (target > 0.0).then(|| (current / target).clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GoalInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub mood: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryInput {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

// ---------------------------------------------------------------------------
// Pets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub species: String,
    #[serde(default)]
    pub age: Option<StringOrInt>,
    #[serde(default)]
    pub weight: Option<StringOrNumber>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PetInput {
    pub name: String,
    pub species: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

// ---------------------------------------------------------------------------
// Shopping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub quantity: Option<StringOrInt>,
    #[serde(default)]
    pub price: Option<StringOrNumber>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Sum of `price * quantity` over items with a readable price. A missing
    /// quantity counts as one.
    pub fn estimated_total(&self) -> f64 {
        self.items
            .iter()
            .filter_map(|item| {
                let price = item.price.as_ref()?.value()?;
                let quantity = item.quantity.as_ref().and_then(StringOrInt::value).unwrap_or(1);
                Some(price * quantity as f64)
            })
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingListInput {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItemInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

// ---------------------------------------------------------------------------
// Legal documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegalDocument {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub file_url: String,
    #[serde(default)]
    pub size_bytes: Option<StringOrInt>,
    pub uploaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_accepts_amounts_in_either_shape() {
        let goal: Goal = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "title": "Emergency fund",
            "target_amount": "1500.00",
            "current_amount": 375,
        }))
        .unwrap();
        assert_eq!(goal.target_amount.as_ref().and_then(StringOrNumber::value), Some(1500.0));
        assert_eq!(goal.progress(), Some(0.25));
        assert!(!goal.completed);
    }

    #[test]
    fn goal_progress_needs_a_positive_target() {
        let goal: Goal = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "title": "Someday",
            "target_amount": "0",
            "current_amount": "10",
        }))
        .unwrap();
        assert_eq!(goal.progress(), None);
    }

    #[test]
    fn goal_input_omits_unset_fields() {
        let input = GoalInput {
            title: "Vacation".to_string(),
            target_amount: Some(2000.0),
            ..GoalInput::default()
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({"title": "Vacation", "target_amount": 2000.0}));
    }

    #[test]
    fn shopping_total_mixes_shapes() {
        let list: ShoppingList = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "name": "Groceries",
            "items": [
                {"id": Uuid::from_u128(1), "name": "Milk", "quantity": "2", "price": "1.25"},
                {"id": Uuid::from_u128(2), "name": "Bread", "price": 3.0},
                {"id": Uuid::from_u128(3), "name": "Mystery", "quantity": 4},
            ],
        }))
        .unwrap();
        assert_eq!(list.estimated_total(), 5.5);
    }

    #[test]
    fn pet_age_may_be_a_string() {
        let pet: Pet = serde_json::from_value(serde_json::json!({
            "id": Uuid::nil(),
            "name": "Fluffy",
            "species": "cat",
            "age": "4",
        }))
        .unwrap();
        assert_eq!(pet.age.as_ref().and_then(StringOrInt::value), Some(4));
        assert!(pet.photo_url.is_none());
    }
}
