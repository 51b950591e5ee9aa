//! Score collaborators
//!
//! Where scores come from on the workstation ([`ScoreSource`]) and where they
//! end up on the scoreboard ([`ScoreDisplay`]). Real deployments plug in a
//! spreadsheet reader or the board's driver; the types here cover demos and
//! tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::core::types::MAX_WICKETS;
use crate::core::{Error, Innings, Overs, Result, ScoreData};
use crate::time::{CountdownTimer, SharedClock};

/// Pull interface polled once per loop tick on the sender
pub trait ScoreSource {
    /// Reads the current score
    fn read_score(&mut self) -> Result<ScoreData>;
}

impl<F> ScoreSource for F
where
    F: FnMut() -> Result<ScoreData>,
{
    fn read_score(&mut self) -> Result<ScoreData> {
        (self)()
    }
}

/// Whatever shows the score on the receiving side
pub trait ScoreDisplay {
    /// Shows a new score
    fn apply(&mut self, score: &ScoreData);

    /// The link went down; blank or flag the board
    fn clear(&mut self) {}
}

/// Display that only logs
#[derive(Debug, Default)]
pub struct LogDisplay;

impl ScoreDisplay for LogDisplay {
    fn apply(&mut self, score: &ScoreData) {
        info!("Scoreboard now shows {}", score);
    }

    fn clear(&mut self) {
        info!("Scoreboard cleared");
    }
}

/// Display that remembers the latest score, shared with whoever reads it
#[derive(Debug, Clone, Default)]
pub struct LatestScore {
    shown: Arc<Mutex<Option<ScoreData>>>,
}

impl LatestScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The score currently shown, if any
    pub fn get(&self) -> Option<ScoreData> {
        self.shown.lock().map(|shown| *shown).unwrap_or(None)
    }

    fn set(&self, score: Option<ScoreData>) {
        if let Ok(mut shown) = self.shown.lock() {
            *shown = score;
        }
    }
}

impl ScoreDisplay for LatestScore {
    fn apply(&mut self, score: &ScoreData) {
        self.set(Some(*score));
    }

    fn clear(&mut self) {
        self.set(None);
    }
}

/// Source whose value is set by hand, e.g. by a test or a UI thread.
///
/// Clones share the value. While no value is set, reads fail.
#[derive(Debug, Clone, Default)]
pub struct ManualScoreSource {
    current: Arc<Mutex<Option<ScoreData>>>,
}

impl ManualScoreSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the score future reads return
    pub fn set(&self, score: ScoreData) {
        if let Ok(mut current) = self.current.lock() {
            *current = Some(score);
        }
    }

    /// Makes future reads fail until the next `set`
    pub fn fail(&self) {
        if let Ok(mut current) = self.current.lock() {
            *current = None;
        }
    }
}

impl ScoreSource for ManualScoreSource {
    fn read_score(&mut self) -> Result<ScoreData> {
        let current = self
            .current
            .lock()
            .map_err(|_| Error::score_read("Score source lock poisoned"))?;
        (*current).ok_or_else(|| Error::score_read("No score available"))
    }
}

/// Made-up innings that advances one ball per interval, for demos
#[derive(Debug)]
pub struct DummyScoreSource {
    score: ScoreData,
    ball: CountdownTimer,
    rng: StdRng,
}

impl DummyScoreSource {
    /// Starts at 0/0 in the first innings, bowling a ball every `ball_interval`
    pub fn new(ball_interval: Duration, clock: SharedClock, seed: u64) -> Result<Self> {
        Ok(DummyScoreSource {
            score: ScoreData::new(0, 0, Overs::new(0, 0)?, Innings::first())?,
            ball: CountdownTimer::with_clock(ball_interval, true, clock)?,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn bowl(&mut self) -> Result<ScoreData> {
        let current = self.score;
        let mut total = current.total();
        let mut wickets = current.wickets();
        let mut innings = current.innings();

        if self.rng.gen_ratio(1, 20) {
            wickets += 1;
        } else {
            total = total.saturating_add(self.rng.gen_range(0..=6));
        }

        let mut overs = match current.overs().balls() {
            5 => Overs::new(current.overs().completed() + 1, 0)?,
            balls => Overs::new(current.overs().completed(), balls + 1)?,
        };

        if wickets == MAX_WICKETS {
            innings = Innings::new(innings.number() % 4 + 1)?;
            total = 0;
            wickets = 0;
            overs = Overs::new(0, 0)?;
        }

        ScoreData::new(total, wickets, overs, innings)
    }
}

impl ScoreSource for DummyScoreSource {
    fn read_score(&mut self) -> Result<ScoreData> {
        if self.ball.just_expired() {
            self.ball.reset();
            self.score = self.bowl()?;
        }
        Ok(self.score)
    }
}
