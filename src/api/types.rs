//! Backend data transfer objects
//!
//! Everything here is read-only from the bot's perspective; the backend is
//! the source of truth. Field names follow the backend's camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of an authenticated backend user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Sees every ticket
    Admin,
    /// Sees only their own tickets
    User,
}

/// Profile of the authenticated user, returned by login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Backend user id
    pub id: i64,
    /// Access role
    pub role: Role,
}

/// A helpdesk ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Backend ticket id
    pub id: i64,
    /// Short title
    pub title: String,
    /// Free-form description
    pub description: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp
    pub updated_at: DateTime<Utc>,
    /// Whether the ticket is resolved
    pub is_done: bool,
    /// Device the ticket refers to, when one is attached
    #[serde(default)]
    pub device: Option<Device>,
}

/// Device metadata attached to a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device name
    pub title: String,
    /// Inventory number
    pub inventory_number: String,
}

/// Access/refresh token pair
///
/// Both tokens are always set together; a half-initialized pair never
/// exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Bearer token for the `Authorization` header
    pub access: String,
    /// One-shot token exchanged for a new pair on expiry
    pub refresh: String,
}

/// Body of a successful `POST /auth/login`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub user: UserProfile,
    pub token: String,
    pub refresh_token: String,
}

/// Body of a successful `POST /auth/refresh`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Body of `GET /tickets`
#[derive(Debug, Deserialize)]
pub(crate) struct TicketPage {
    pub items: Vec<Ticket>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_deserializes_camel_case() {
        let json = r#"{
            "id": 5,
            "title": "Printer jam",
            "description": "Tray 2",
            "createdAt": "2026-08-01T10:00:00Z",
            "updatedAt": "2026-08-02T11:30:00Z",
            "isDone": false,
            "device": {"title": "HP LJ 4", "inventoryNumber": "INV-042"}
        }"#;
        let ticket: Ticket = serde_json::from_str(json).expect("valid ticket JSON");
        assert_eq!(ticket.id, 5);
        assert!(!ticket.is_done);
        let device = ticket.device.expect("device present");
        assert_eq!(device.inventory_number, "INV-042");
    }

    #[test]
    fn test_ticket_device_is_optional() {
        let json = r#"{
            "id": 1,
            "title": "t",
            "description": "d",
            "createdAt": "2026-08-01T10:00:00Z",
            "updatedAt": "2026-08-01T10:00:00Z",
            "isDone": true
        }"#;
        let ticket: Ticket = serde_json::from_str(json).expect("valid ticket JSON");
        assert!(ticket.device.is_none());
    }

    #[test]
    fn test_role_uses_uppercase_wire_names() {
        let admin: Role = serde_json::from_str("\"ADMIN\"").expect("role parses");
        assert_eq!(admin, Role::Admin);
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
    }
}
