use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod error;
pub mod storage;
pub mod store;
mod wire;

pub use error::{Error, Result};
pub use storage::Storage;
pub use store::Store;

pub type UserId = String;
pub type RoomId = String;
pub type MessageId = String;

/// Id reserved for the built-in super-admin. The only identity allowed to list every user and room.
pub const SUPER_ADMIN_ID: &str = "secret-id";
pub const SUPER_ADMIN_USERNAME: &str = "riccardogenova";
pub const SUPER_ADMIN_PASSWORD: &str = "12345";

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password: String,
}

impl User {
    pub fn new(username: &str, password: &str) -> Self {
        User {
            id: generate_id(),
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    pub fn super_admin() -> Self {
        User {
            id: SUPER_ADMIN_ID.to_owned(),
            username: SUPER_ADMIN_USERNAME.to_owned(),
            password: SUPER_ADMIN_PASSWORD.to_owned(),
        }
    }

    /// Session view of the user, without the password.
    pub fn projection(&self) -> LoggedUser {
        LoggedUser { id: self.id.clone(), username: self.username.clone() }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct LoggedUser {
    pub id: UserId,
    pub username: String,
}

impl LoggedUser {
    pub fn is_super_admin(&self) -> bool {
        self.id == SUPER_ADMIN_ID
    }
}

/// Room permission. Values other than `"admin"` are kept verbatim so rooms written by other
/// clients still load.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    Admin,
    Other(String),
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Permission::Admin,
            _ => Permission::Other(value),
        }
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        match value {
            Permission::Admin => "admin".to_owned(),
            Permission::Other(value) => value,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id_user: UserId,
    pub permission: Permission,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    pub messages: Vec<Message>,
    pub users: Vec<Membership>,
    pub private: bool,
    #[serde(default, deserialize_with = "wire::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Room {
    fn new(name: &str, admin: UserId) -> Self {
        let now = Utc::now();
        Room {
            id: generate_id(),
            name: name.to_owned(),
            messages: Vec::new(),
            users: vec![Membership { id_user: admin, permission: Permission::Admin }],
            private: false,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary { id: self.id.clone(), name: self.name.clone() }
    }
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug)]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub id_user: UserId,
    pub id_room: RoomId,
    pub content: String,
    #[serde(default, deserialize_with = "wire::lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "wire::lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "ref")]
    pub reference: String,
}

impl Message {
    fn new(author: UserId, room: RoomId, content: &str) -> Self {
        let now = Utc::now();
        Message {
            id: generate_id(),
            id_user: author,
            id_room: room,
            content: content.to_owned(),
            created_at: Some(now),
            updated_at: Some(now),
            reference: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_serializes_with_camel_case_fields() {
        let mut room = Room::new("general", "u1".into());
        room.messages.push(Message::new("u1".into(), room.id.clone(), "hi"));

        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["users"][0]["idUser"], "u1");
        assert_eq!(value["users"][0]["permission"], "admin");
        assert_eq!(value["private"], false);
        assert!(value["createdAt"].is_string());
        assert_eq!(value["messages"][0]["idRoom"], room.id.as_str());
        assert_eq!(value["messages"][0]["ref"], "");
    }

    #[test]
    fn reads_rooms_written_by_browser_clients() {
        let raw = r#"[{"id":"0.412","name":"lobby","messages":[{"id":"0.9","idUser":"secret-id","idRoom":"0.412",
            "content":"hello","createdAt":"2023-05-02T10:11:12.345Z","updatedAt":"2023-05-02T10:11:12.345Z","ref":""}],
            "users":[{"idUser":"secret-id","permission":"admin"}],"private":false,
            "createdAt":"2023-05-02T10:00:00.000Z","updatedAt":"2023-05-02T10:00:00.000Z"}]"#;

        let rooms: Vec<Room> = serde_json::from_str(raw).unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].messages[0].id_user, SUPER_ADMIN_ID);
        assert_eq!(rooms[0].users[0].permission, Permission::Admin);
    }

    #[test]
    fn tolerates_unreadable_timestamps_and_unknown_permissions() {
        let raw = r#"{"id":"r1","name":"old","private":false,"createdAt":null,"updatedAt":"not a date",
            "users":[{"idUser":"u1","permission":"member"}],
            "messages":[{"id":"m1","idUser":"u1","idRoom":"r1","content":"hi","createdAt":"2023-05-02T10:11:12.345Z",
            "updatedAt":null,"ref":""}]}"#;

        let room: Room = serde_json::from_str(raw).unwrap();
        assert_eq!(room.created_at, None);
        assert_eq!(room.updated_at, None);
        assert_eq!(room.users[0].permission, Permission::Other("member".into()));
        assert!(room.messages[0].created_at.is_some());
        assert_eq!(room.messages[0].updated_at, None);

        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["users"][0]["permission"], "member");
        assert!(value["createdAt"].is_null());
    }

    #[test]
    fn projection_drops_password() {
        let user = User::new("alice", "pw1");
        let value = serde_json::to_value(user.projection()).unwrap();
        assert_eq!(value, serde_json::json!({"id": user.id, "username": "alice"}));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(generate_id(), generate_id());
    }
}
