use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use agora_store::{Storage, Store};
use file_storage::FileStorage;
use mock_storage::MockStorage;

/// Chat rooms and sessions kept in a local JSON file
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Storage file
    #[arg(long, default_value = "agora.json")]
    data: PathBuf,
    /// Use a throwaway in-memory store instead of the storage file
    #[arg(long)]
    mock: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log into it
    Signup { username: String, password: String },
    Login { username: String, password: String },
    /// End the session for this invocation only; the stored session is kept
    Logout,
    /// Show the logged in user
    Whoami,
    /// Ids of the users online in this process
    Online,
    /// Every registered user (super-admin only)
    Users,
    /// Every room with its messages (super-admin only)
    Rooms,
    CreateRoom { name: String },
    /// Public rooms
    RoomList,
    /// Messages of a room, oldest first
    Messages { room_id: String },
    Send { room_id: String, content: String },
    DeleteMessage { room_id: String, message_id: String },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.mock {
        run(MockStorage::new(), args.command)
    } else {
        let storage = FileStorage::open(&args.data)
            .with_context(|| format!("Unable to open storage file {}", args.data.display()))?;
        info!("Using storage file {}", storage.path().display());
        run(storage, args.command)
    }
}

fn run<S: Storage>(storage: S, command: Command) -> Result<()> {
    let mut store = Store::new(storage).context("Unable to load stored state")?;

    match command {
        Command::Signup { username, password } => print(&store.signup(&username, &password)?),
        Command::Login { username, password } => print(&store.login(&username, &password)?),
        Command::Logout => print(&store.logout()?),
        Command::Whoami => print(&store.user_logged()),
        Command::Online => print(&store.online_users()?),
        Command::Users => print(&store.all_users()?),
        Command::Rooms => print(&store.all_rooms()?),
        Command::CreateRoom { name } => print(&store.create_room(&name)?),
        Command::RoomList => print(&store.room_list()?),
        Command::Messages { room_id } => print(&store.room_messages(&room_id)?),
        Command::Send { room_id, content } => print(&store.create_message(&room_id, &content)?),
        Command::DeleteMessage { room_id, message_id } => print(&store.delete_message(&room_id, &message_id)?),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Unable to render result")?;
    println!("{rendered}");
    Ok(())
}
