//! Data directory: remembered display name and room ledger.
//!
//! Both files are JSON. A missing file means "nothing remembered yet". An
//! unreadable ledger is logged and treated as empty so a damaged file never
//! keeps the client from starting.

use std::{
    fs,
    path::{Path, PathBuf},
};

use convoroom_core::ledger::RoomLedger;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{error::CliError, identity::generate_username};

const PROFILE_FILE: &str = "profile.json";
const LEDGER_FILE: &str = "rooms.json";

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    username: String,
}

/// Files owned by the terminal client.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CliError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| CliError::Io { path: root.clone(), source })?;
        Ok(Self { root })
    }

    /// Directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Display name for this run.
    ///
    /// An explicit name wins and is not remembered. Otherwise the remembered
    /// name is used, or a fresh one is generated and remembered.
    pub fn resolve_username<R: Rng + ?Sized>(
        &self,
        explicit: Option<&str>,
        rng: &mut R,
    ) -> Result<String, CliError> {
        if let Some(name) = explicit.map(str::trim).filter(|name| !name.is_empty()) {
            return Ok(name.to_string());
        }

        if let Some(name) = self.load_username()? {
            tracing::debug!(%name, "using remembered name");
            return Ok(name);
        }

        let name = generate_username(rng);
        tracing::info!(%name, "generated display name");
        self.save_username(&name)?;
        Ok(name)
    }

    /// Remembered display name, if any.
    pub fn load_username(&self) -> Result<Option<String>, CliError> {
        let path = self.root.join(PROFILE_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Profile>(&text) {
            Ok(profile) if !profile.username.trim().is_empty() => Ok(Some(profile.username)),
            Ok(_) => Ok(None),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable profile");
                Ok(None)
            },
        }
    }

    /// Remember `username`.
    pub fn save_username(&self, username: &str) -> Result<(), CliError> {
        let path = self.root.join(PROFILE_FILE);
        let profile = Profile { username: username.to_string() };
        let text = serde_json::to_string_pretty(&profile)
            .map_err(|source| CliError::Encode { path: path.clone(), source })?;
        write_atomic(&path, &text)
    }

    /// Rooms this user created, newest first.
    pub fn load_ledger(&self) -> Result<RoomLedger, CliError> {
        let path = self.root.join(LEDGER_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(RoomLedger::new());
        };

        match RoomLedger::from_json(&text) {
            Ok(ledger) => Ok(ledger),
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable room ledger");
                Ok(RoomLedger::new())
            },
        }
    }

    /// Persist the ledger.
    pub fn save_ledger(&self, ledger: &RoomLedger) -> Result<(), CliError> {
        let path = self.root.join(LEDGER_FILE);
        let text =
            ledger.to_json().map_err(|source| CliError::Encode { path: path.clone(), source })?;
        write_atomic(&path, &text)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CliError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(CliError::Io { path: path.to_path_buf(), source }),
    }
}

/// Write through a sibling temp file so readers never see a partial file.
fn write_atomic(path: &Path, text: &str) -> Result<(), CliError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|source| CliError::Io { path: tmp.clone(), source })?;
    fs::rename(&tmp, path).map_err(|source| CliError::Io { path: path.to_path_buf(), source })
}
