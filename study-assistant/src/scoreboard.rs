// Scoreboard: a per-session leaderboard of names and scores.
//
// Entries keep insertion order; `ranked()` produces the display order
// (descending score, ties keep insertion order). When the remote friends API
// is available the board is refreshed from it, otherwise it is purely local.

use thiserror::Error;
use tracing::{debug, info};

use crate::api::FriendScore;
use crate::protocol::InputEdit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

impl ScoreEntry {
    pub fn new(name: &str) -> Self {
        ScoreEntry {
            name: name.to_string(),
            score: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddUserError {
    #[error("Please enter a name")]
    Empty,

    #[error("That username already exists, please try something else!")]
    Duplicate,
}

/// Sort by descending score. Stable, so equal scores keep their relative
/// order, and applying it twice gives the same result.
pub fn rank(entries: &[ScoreEntry]) -> Vec<ScoreEntry> {
    let mut ranked = entries.to_vec();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

#[derive(Debug, Clone)]
pub struct Scoreboard {
    entries: Vec<ScoreEntry>,
    /// Text in the add-user box.
    pub input: String,
    /// Warning or error shown under the board.
    pub notice: Option<String>,
    current_user: String,
    generation: u64,
    busy: bool,
}

impl Scoreboard {
    /// Board seeded with `current_user` followed by `seed_names`. Seeds whose
    /// name is already present (ignoring case) are skipped.
    pub fn new(current_user: &str, seed_names: &[String]) -> Self {
        let mut board = Scoreboard {
            entries: vec![ScoreEntry::new(current_user)],
            input: String::new(),
            notice: None,
            current_user: current_user.to_string(),
            generation: 0,
            busy: false,
        };
        for name in seed_names {
            let name = name.trim();
            if !name.is_empty() && !board.contains(name) {
                board.entries.push(ScoreEntry::new(name));
            }
        }
        board
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Entries in display order.
    pub fn ranked(&self) -> Vec<ScoreEntry> {
        rank(&self.entries)
    }

    pub fn is_current_user(&self, name: &str) -> bool {
        name == self.current_user
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.entries.iter().any(|e| e.name.to_lowercase() == wanted)
    }

    /// Whether a remote request is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Add one point to the entry named exactly `name`. Returns `false` and
    /// changes nothing when there is no such entry.
    pub fn increment_score(&mut self, name: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => {
                entry.score = entry.score.saturating_add(1);
                debug!("{} now has {} points", entry.name, entry.score);
                true
            }
            None => false,
        }
    }

    /// Zero every score, keeping the names.
    pub fn reset_scores(&mut self) {
        for entry in &mut self.entries {
            entry.score = 0;
        }
        info!("Scores reset ({} entries)", self.entries.len());
    }

    /// Append `name` with score 0. Returns the trimmed name on success.
    pub fn add_user(&mut self, name: &str) -> Result<String, AddUserError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AddUserError::Empty);
        }
        if self.contains(name) {
            return Err(AddUserError::Duplicate);
        }
        self.entries.push(ScoreEntry::new(name));
        info!("Added {} to the scoreboard", name);
        Ok(name.to_string())
    }

    pub fn edit_input(&mut self, edit: &InputEdit) {
        edit.apply(&mut self.input);
    }

    /// Add whatever is in the input box. The box is cleared on success; on
    /// failure the reason becomes the notice and the box keeps its text.
    pub fn add_from_input(&mut self) -> Option<String> {
        let text = self.input.clone();
        match self.add_user(&text) {
            Ok(name) => {
                self.input.clear();
                self.notice = None;
                Some(name)
            }
            Err(e) => {
                self.notice = Some(e.to_string());
                None
            }
        }
    }

    /// Rebuild the board for a fresh visit. The generation keeps counting so
    /// replies addressed to the previous visit stay stale.
    pub fn reset(&mut self, current_user: &str, seed_names: &[String]) {
        let generation = self.generation + 1;
        *self = Scoreboard {
            generation,
            ..Scoreboard::new(current_user, seed_names)
        };
    }

    /// Start a remote request. Returns the generation to tag it with, or
    /// `None` when one is already in flight.
    pub fn begin_request(&mut self) -> Option<u64> {
        if self.busy {
            return None;
        }
        self.busy = true;
        self.generation += 1;
        Some(self.generation)
    }

    /// Mark the request tagged `generation` as finished. Returns `false` for
    /// stale replies, which must not be applied.
    pub fn finish_request(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.busy {
            return false;
        }
        self.busy = false;
        true
    }

    /// Fold a remote friends list into the board: known names take the
    /// remote score, unknown names are appended.
    pub fn merge_remote(&mut self, friends: &[FriendScore]) {
        for friend in friends {
            let name = friend.username.trim();
            if name.is_empty() {
                continue;
            }
            let wanted = name.to_lowercase();
            match self
                .entries
                .iter_mut()
                .find(|e| e.name.to_lowercase() == wanted)
            {
                Some(entry) => entry.score = friend.score,
                None => self.entries.push(ScoreEntry {
                    name: name.to_string(),
                    score: friend.score,
                }),
            }
        }
        debug!("Merged {} remote entries", friends.len());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
