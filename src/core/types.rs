use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Highest wicket count a side can reach in one innings
pub const MAX_WICKETS: u8 = 10;

/// Highest innings number in a two-innings-a-side match
pub const MAX_INNINGS: u8 = 4;

/// Balls are carried as the single decimal digit after the point
pub const MAX_BALLS_DIGIT: u8 = 9;

/// Opaque token identifying one handshake between a sender and a receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl ConnectionId {
    /// Generates a new random connection id
    pub fn random() -> Self {
        ConnectionId(rand::random())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:08x}", self.0)
    }
}

/// Innings marker, numbered from 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8")]
pub struct Innings(u8);

impl Innings {
    /// Creates an innings marker, rejecting anything outside 1..=4
    pub fn new(number: u8) -> Result<Self> {
        if (1..=MAX_INNINGS).contains(&number) {
            Ok(Innings(number))
        } else {
            Err(Error::malformed(format!("innings {} out of range", number)))
        }
    }

    /// The first innings
    pub fn first() -> Self {
        Innings(1)
    }

    /// Returns the innings number
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Innings {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self> {
        Innings::new(number)
    }
}

/// Overs bowled, written the cricket way: `12.3` is twelve overs and three balls
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawOvers")]
pub struct Overs {
    completed: u16,
    balls: u8,
}

impl Overs {
    /// Creates an overs value from completed overs and balls into the current over
    pub fn new(completed: u16, balls: u8) -> Result<Self> {
        if balls > MAX_BALLS_DIGIT {
            return Err(Error::malformed(format!("{} balls does not fit one digit", balls)));
        }
        Ok(Overs { completed, balls })
    }

    /// Parses the decimal notation scorers type into spreadsheets, e.g. `2.0` or `12.3`
    pub fn from_decimal(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::malformed(format!("invalid overs value {}", value)));
        }
        let tenths = (value * 10.0).round();
        if tenths > f64::from(u16::MAX) * 10.0 + f64::from(MAX_BALLS_DIGIT) {
            return Err(Error::malformed(format!("overs value {} too large", value)));
        }
        let tenths = tenths as u32;
        Overs::new((tenths / 10) as u16, (tenths % 10) as u8)
    }

    /// Completed overs
    pub fn completed(&self) -> u16 {
        self.completed
    }

    /// Balls bowled in the current over
    pub fn balls(&self) -> u8 {
        self.balls
    }
}

#[derive(Deserialize)]
struct RawOvers {
    completed: u16,
    balls: u8,
}

impl TryFrom<RawOvers> for Overs {
    type Error = Error;

    fn try_from(raw: RawOvers) -> Result<Self> {
        Overs::new(raw.completed, raw.balls)
    }
}

impl fmt::Display for Overs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.completed, self.balls)
    }
}

/// Snapshot of a match score as shown on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawScore")]
pub struct ScoreData {
    total: u16,
    wickets: u8,
    overs: Overs,
    innings: Innings,
}

impl ScoreData {
    /// Creates a score snapshot, rejecting more than ten wickets
    pub fn new(total: u16, wickets: u8, overs: Overs, innings: Innings) -> Result<Self> {
        if wickets > MAX_WICKETS {
            return Err(Error::malformed(format!("{} wickets is more than {}", wickets, MAX_WICKETS)));
        }
        Ok(ScoreData { total, wickets, overs, innings })
    }

    /// Builds a score from loosely typed spreadsheet cells.
    ///
    /// Spreadsheets hand every number back as a float, so whole-number cells
    /// are checked for a fractional part rather than silently truncated.
    pub fn from_cells(total: f64, wickets: f64, overs: f64, innings: f64) -> Result<Self> {
        let total = whole_cell("total", total, u16::MAX.into())? as u16;
        let wickets = whole_cell("wickets", wickets, MAX_WICKETS.into())? as u8;
        let innings = whole_cell("innings", innings, MAX_INNINGS.into())? as u8;
        let overs = Overs::from_decimal(overs).map_err(|e| bad_cell("overs", e))?;
        let innings = Innings::new(innings).map_err(|e| bad_cell("innings", e))?;
        ScoreData::new(total, wickets, overs, innings).map_err(|e| bad_cell("wickets", e))
    }

    pub fn total(&self) -> u16 {
        self.total
    }

    pub fn wickets(&self) -> u8 {
        self.wickets
    }

    pub fn overs(&self) -> Overs {
        self.overs
    }

    pub fn innings(&self) -> Innings {
        self.innings
    }
}

#[derive(Deserialize)]
struct RawScore {
    total: u16,
    wickets: u8,
    overs: Overs,
    innings: Innings,
}

impl TryFrom<RawScore> for ScoreData {
    type Error = Error;

    fn try_from(raw: RawScore) -> Result<Self> {
        ScoreData::new(raw.total, raw.wickets, raw.overs, raw.innings)
    }
}

impl fmt::Display for ScoreData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({} ov, inns {})",
            self.total,
            self.wickets,
            self.overs,
            self.innings.number()
        )
    }
}

fn whole_cell(name: &str, value: f64, max: f64) -> Result<u32> {
    if !value.is_finite() || value < 0.0 || value > max || value.fract() != 0.0 {
        return Err(Error::score_read(format!("{} cell holds {}, expected a whole number up to {}", name, value, max)));
    }
    Ok(value as u32)
}

/// Range failures in spreadsheet input are read errors, not wire errors
fn bad_cell(name: &str, err: Error) -> Error {
    match err {
        Error::MalformedMessage(msg) => Error::score_read(format!("{} cell: {}", name, msg)),
        other => other,
    }
}
