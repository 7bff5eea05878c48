//! Terminal session: stdin in, rendered actions out.

#![allow(clippy::print_stdout, reason = "Terminal output is the interface")]

use convoroom_client::{
    Client, ClientEvent, Notice,
    transport::{HttpBackend, Session, SessionHandle, SystemEnv},
};
use convoroom_core::{RoomId, ledger::RoomLedger};
use convoroom_proto::{CreateRoomRequest, CreateRoomResponse, Endpoints};
use time::OffsetDateTime;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};

use crate::{
    args::Args,
    commands::{self, Command, HELP},
    error::CliError,
    identity::generate_room_id,
    render::render_action,
    store::DataDir,
};

/// Terminal-side state that outlives room switches.
struct Shell {
    username: String,
    room: Option<RoomId>,
    ledger: RoomLedger,
    store: DataDir,
    endpoints: Endpoints,
    http: HttpBackend,
    session: SessionHandle,
}

impl Shell {
    /// Apply one command. Returns false when the user asked to quit.
    async fn execute(&mut self, command: Command) -> Result<bool, CliError> {
        match command {
            Command::Say(text) => {
                if self.room.is_none() {
                    println!("* not in a room, try /join <room> or /new");
                } else {
                    self.session.send_text(text)?;
                }
            },
            Command::Join(room) => self.enter(room)?,
            Command::New => match self.create_room().await {
                Ok(room) => self.enter(room)?,
                Err(error) => println!("! {error}"),
            },
            Command::Leave => {
                self.room = None;
                self.session.leave_room()?;
            },
            Command::Rooms => self.list_rooms(),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
            Command::Invalid(message) => println!("! {message}"),
        }
        Ok(true)
    }

    fn enter(&mut self, room: RoomId) -> Result<(), CliError> {
        println!("* entering {room} as {}", self.username);
        self.room = Some(room.clone());
        self.session.enter_room(room)?;
        Ok(())
    }

    fn list_rooms(&self) {
        let rooms: Vec<_> = match &self.room {
            Some(current) => self.ledger.recent(current).collect(),
            None => self.ledger.entries().iter().collect(),
        };
        if rooms.is_empty() {
            println!("* no rooms created yet");
        }
        for entry in rooms {
            println!("  {}  created {}", entry.id, entry.timestamp);
        }
    }

    /// Register a fresh room with the backend and record it in the ledger.
    async fn create_room(&mut self) -> Result<RoomId, CliError> {
        let room = generate_room_id(&mut rand::thread_rng());
        let body = CreateRoomRequest { room_id: room.clone() }.to_json()?;

        let reply = self
            .http
            .post_json(&self.endpoints.create_room_url(), body)
            .await
            .map_err(|e| CliError::CreateRoom(e.to_string()))?;
        let response =
            CreateRoomResponse::decode(&reply).map_err(|e| CliError::CreateRoom(e.to_string()))?;
        if !response.success {
            let reason = response.error.unwrap_or_else(|| "refused by backend".to_string());
            return Err(CliError::CreateRoom(reason));
        }

        tracing::info!(%room, "room created");
        self.ledger.record_created(room.clone(), OffsetDateTime::now_utc());
        self.store.save_ledger(&self.ledger)?;
        self.session.submit(ClientEvent::RoomCreated { room_id: room.clone() })?;
        Ok(room)
    }
}

/// Run the terminal client until `/quit` or end of input.
pub async fn run(args: Args) -> Result<(), CliError> {
    let store = DataDir::open(&args.data_dir)?;
    let username = store.resolve_username(args.username.as_deref(), &mut rand::thread_rng())?;
    let ledger = store.load_ledger()?;

    let config = args.client_config();
    let endpoints = config.endpoints.clone();
    let env = SystemEnv::new();
    let http = HttpBackend::new()?;

    let (notices_tx, mut notices) = mpsc::unbounded_channel::<Notice>();
    let client = Client::new(env.clone(), config, ledger.clone(), notices_tx);
    let (session, handle) = Session::new(env, client, http.clone());

    let (ui_tx, mut ui) = mpsc::unbounded_channel();
    let session_task = tokio::spawn(session.run(ui_tx));

    handle.submit(ClientEvent::IdentityResolved { username: username.clone() })?;

    let mut shell = Shell {
        username: username.clone(),
        room: None,
        ledger,
        store,
        endpoints,
        http,
        session: handle,
    };

    println!("* you are {username}. /help lists commands");
    if let Some(room) = args.room {
        shell.enter(RoomId::new(room))?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line.map_err(CliError::Input)? {
                Some(line) => {
                    let Some(command) = commands::parse(&line) else { continue };
                    if !shell.execute(command).await? {
                        break;
                    }
                },
                None => break,
            },
            Some(action) = ui.recv() => {
                if let Some(text) = render_action(&action, Some(&username)) {
                    println!("{text}");
                }
            },
            Some(notice) = notices.recv() => println!("! {}", notice.text),
        }
    }

    let Shell { session, .. } = shell;
    drop(session);
    if let Err(error) = session_task.await {
        tracing::warn!(%error, "session task ended abnormally");
    }

    Ok(())
}
