use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type CustomerId = Uuid;

/// A registered customer. Customers are created once at registration and
/// never mutated afterwards; accounts reference them by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    /// Unique across all customers.
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            phone: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_customer_has_no_phone() {
        let customer = Customer::new("Alice", "alice@example.com");
        assert_eq!(customer.name, "Alice");
        assert_eq!(customer.email, "alice@example.com");
        assert!(customer.phone.is_none());
    }

    #[test]
    fn test_with_phone() {
        let customer = Customer::new("Bob", "bob@example.com").with_phone("555-0102");
        assert_eq!(customer.phone.as_deref(), Some("555-0102"));
    }
}
