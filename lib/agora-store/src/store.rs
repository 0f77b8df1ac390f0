use anyhow::Context;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::Storage;
use crate::{Error, LoggedUser, Message, Result, Room, RoomId, RoomSummary, User, UserId};

pub const USER_LOGGED_KEY: &str = "userLogged";
pub const ROOMS_KEY: &str = "rooms";
pub const USERS_KEY: &str = "users";

/// Session and chat state of a single process.
///
/// Every mutation of users, rooms or the session checks its preconditions first, applies the change in memory
/// and then rewrites the whole affected collection into `storage`. If that write fails the in-memory change is undone, so the two never
/// disagree.
pub struct Store<S> {
    storage: S,
    user_logged: Option<LoggedUser>,
    rooms: Vec<Room>,
    users: Vec<User>,
    online_users: Vec<UserId>,
}

impl<S: Storage> Store<S> {
    pub fn new(storage: S) -> Result<Self> {
        let user_logged: Option<LoggedUser> = load(&storage, USER_LOGGED_KEY)?;
        let rooms: Vec<Room> = load(&storage, ROOMS_KEY)?.unwrap_or_default();
        let users: Vec<User> = load(&storage, USERS_KEY)?.unwrap_or_else(|| vec![User::super_admin()]);

        debug!(
            "Store loaded: user_logged={:?}, {} rooms, {} users",
            user_logged.as_ref().map(|user| &user.username),
            rooms.len(),
            users.len(),
        );

        Ok(Store { storage, user_logged, rooms, users, online_users: Vec::new() })
    }

    pub fn signup(&mut self, username: &str, password: &str) -> Result<LoggedUser> {
        if self.user_logged.is_some() {
            return Err(Error::AlreadyAuthenticated);
        }
        if self.users.iter().any(|user| user.username == username) {
            return Err(Error::DuplicateUsername);
        }

        self.users.push(User::new(username, password));
        if let Err(e) = self.persist(USERS_KEY, &self.users) {
            self.users.pop();
            warn!("Signup of {username} rolled back: {e:#}");
            return Err(e);
        }
        info!("User {username} created");

        self.login(username, password)
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<LoggedUser> {
        if self.user_logged.is_some() {
            return Err(Error::AlreadyAuthenticated);
        }

        let logged = self.users
            .iter()
            .find(|user| user.username == username && user.password == password)
            .map(User::projection)
            .ok_or(Error::InvalidCredentials)?;

        // logout drops the id and login needs no active session, so it is never already present
        self.online_users.push(logged.id.clone());
        self.user_logged = Some(logged.clone());

        if let Err(e) = self.persist(USER_LOGGED_KEY, &self.user_logged) {
            self.user_logged = None;
            self.online_users.pop();
            warn!("Login of {username} rolled back: {e:#}");
            return Err(e);
        }
        info!("User {username} logged in");

        Ok(logged)
    }

    /// Ends the session in memory only. The persisted `userLogged` entry keeps its last value.
    pub fn logout(&mut self) -> Result<()> {
        let logged = self.user_logged.take().ok_or(Error::NotAuthenticated)?;
        self.online_users.retain(|id| id != &logged.id);
        info!("User {} logged out", logged.username);

        Ok(())
    }

    pub fn user_logged(&self) -> Option<LoggedUser> {
        self.user_logged.clone()
    }

    pub fn online_users(&self) -> Result<Vec<UserId>> {
        self.authenticated()?;
        Ok(self.online_users.clone())
    }

    pub fn all_users(&self) -> Result<Vec<User>> {
        self.super_admin()?;
        Ok(self.users.clone())
    }

    pub fn all_rooms(&self) -> Result<Vec<Room>> {
        self.super_admin()?;
        Ok(self.rooms.clone())
    }

    pub fn create_room(&mut self, name: &str) -> Result<Room> {
        let caller = self.authenticated()?.id.clone();

        let room = Room::new(name, caller);
        self.rooms.push(room.clone());
        if let Err(e) = self.persist(ROOMS_KEY, &self.rooms) {
            self.rooms.pop();
            warn!("Creation of room {name} rolled back: {e:#}");
            return Err(e);
        }
        info!("Room {name} created");

        Ok(room)
    }

    /// Public rooms, in creation order.
    pub fn room_list(&self) -> Result<Vec<RoomSummary>> {
        self.authenticated()?;
        let res = self.rooms
            .iter()
            .filter(|room| !room.private)
            .map(Room::summary)
            .collect();
        Ok(res)
    }

    pub fn room_messages(&self, room_id: &str) -> Result<Vec<Message>> {
        self.authenticated()?;
        let index = self.room_index(room_id)?;
        Ok(self.rooms[index].messages.clone())
    }

    pub fn create_message(&mut self, room_id: &str, content: &str) -> Result<Message> {
        let caller = self.authenticated()?.id.clone();
        let index = self.room_index(room_id)?;

        let message = Message::new(caller, RoomId::from(room_id), content);
        self.rooms[index].messages.push(message.clone());
        if let Err(e) = self.persist(ROOMS_KEY, &self.rooms) {
            self.rooms[index].messages.pop();
            warn!("Message in room {room_id} rolled back: {e:#}");
            return Err(e);
        }
        info!("Message {} created in room {}", message.id, self.rooms[index].name);

        Ok(message)
    }

    pub fn delete_message(&mut self, room_id: &str, message_id: &str) -> Result<Message> {
        let caller = self.authenticated()?.id.clone();
        let room_index = self.room_index(room_id)?;

        let message_index = self.rooms[room_index].messages
            .iter()
            .position(|message| message.id == message_id)
            .ok_or(Error::MessageNotFound)?;
        if self.rooms[room_index].messages[message_index].id_user != caller {
            return Err(Error::NotAuthorized);
        }

        let message = self.rooms[room_index].messages.remove(message_index);
        if let Err(e) = self.persist(ROOMS_KEY, &self.rooms) {
            self.rooms[room_index].messages.insert(message_index, message);
            warn!("Deletion of message {message_id} rolled back: {e:#}");
            return Err(e);
        }
        info!("Message with ID {message_id} deleted in room {}", self.rooms[room_index].name);

        Ok(message)
    }

    fn authenticated(&self) -> Result<&LoggedUser> {
        self.user_logged.as_ref().ok_or(Error::NotAuthenticated)
    }

    fn super_admin(&self) -> Result<&LoggedUser> {
        let logged = self.authenticated()?;
        if logged.is_super_admin() {
            Ok(logged)
        } else {
            Err(Error::NotAuthorized)
        }
    }

    fn room_index(&self, room_id: &str) -> Result<usize> {
        self.rooms.iter().position(|room| room.id == room_id).ok_or(Error::RoomNotFound)
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let serialized = serde_json::to_string(value)
            .with_context(|| format!("Couldn't serialize {key}"))?;
        self.storage
            .set(key, &serialized)
            .with_context(|| format!("Couldn't write {key} to storage"))?;
        Ok(())
    }
}

// Absent, empty and `null` entries all count as missing.
fn load<T: DeserializeOwned, S: Storage>(storage: &S, key: &str) -> Result<Option<T>> {
    let raw = storage
        .get(key)
        .with_context(|| format!("Couldn't read {key} from storage"))?;

    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(raw) => {
            let value: Option<T> = serde_json::from_str(raw)
                .with_context(|| format!("Couldn't parse persisted {key}"))?;
            Ok(value)
        },
    }
}
