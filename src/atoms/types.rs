// ── Atoms: Pure Data Types ─────────────────────────────────────────────────
// Plain struct/enum definitions shared across the engine.
// Atoms layer rule: no I/O, no side effects, no imports from engine/.

use serde::{Deserialize, Serialize};

// ── Wire contract ──────────────────────────────────────────────────────────

/// Request body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatQuestion {
    pub question: String,
}

/// Response body of `POST /chat`. `plot`, when present, is a base64-encoded
/// PNG image. One instance per request; never stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub plot: Option<String>,
}

// ── Pipeline values ────────────────────────────────────────────────────────

/// Raw output of one handler: computed text plus optional PNG bytes.
/// Base64 happens once, at the agent boundary.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub text: String,
    pub plot: Option<Vec<u8>>,
}

impl QueryResult {
    pub fn text(text: impl Into<String>) -> Self {
        QueryResult { text: text.into(), plot: None }
    }

    pub fn with_plot(text: impl Into<String>, plot: Vec<u8>) -> Self {
        QueryResult { text: text.into(), plot: Some(plot) }
    }
}

/// Outcome of the best-effort polishing step. The agent unwraps anything
/// but `Polished` back to the raw computed text, so a polish failure can
/// never fail the request.
#[derive(Debug, Clone, PartialEq)]
pub enum PolishOutcome {
    Polished(String),
    SkippedNoCredential,
    FailedTimeout,
    FailedError(String),
}

/// Every recognized question category, each mapped to exactly one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    AgeHistogram,
    FareHistogram,
    EmbarkChart,
    ClassChart,
    SurvivalByGender,
    SurvivalByClass,
    AgeByClass,
    FareByClass,
    MalePercentage,
    FemalePercentage,
    AverageFare,
    AverageAge,
    SurvivalCount,
    TotalPassengers,
    /// General dataset overview; the no-match fallback.
    Overview,
}

// ── Passenger record ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn label(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

/// Passenger class. The CSV carries it twice (numeric `pclass` and the
/// categorical `class` label); the loader verifies the two agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PassengerClass {
    First,
    Second,
    Third,
}

impl PassengerClass {
    pub const ALL: [PassengerClass; 3] =
        [PassengerClass::First, PassengerClass::Second, PassengerClass::Third];

    pub fn label(&self) -> &'static str {
        match self {
            PassengerClass::First => "First",
            PassengerClass::Second => "Second",
            PassengerClass::Third => "Third",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            PassengerClass::First => 1,
            PassengerClass::Second => 2,
            PassengerClass::Third => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Who {
    Man,
    Woman,
    Child,
}

/// Embarkation port. The CSV carries it twice (code `embarked` and the
/// `embark_town` label); the loader verifies the two agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbarkTown {
    Southampton,
    Cherbourg,
    Queenstown,
}

impl EmbarkTown {
    pub fn label(&self) -> &'static str {
        match self {
            EmbarkTown::Southampton => "Southampton",
            EmbarkTown::Cherbourg => "Cherbourg",
            EmbarkTown::Queenstown => "Queenstown",
        }
    }

    pub fn code(&self) -> char {
        match self {
            EmbarkTown::Southampton => 'S',
            EmbarkTown::Cherbourg => 'C',
            EmbarkTown::Queenstown => 'Q',
        }
    }
}

/// One row of the passenger manifest. Immutable after load.
#[derive(Debug, Clone)]
pub struct Passenger {
    pub survived: bool,
    pub class: PassengerClass,
    pub sex: Sex,
    /// Missing for 177 of the 891 shipped records.
    pub age: Option<f64>,
    /// Siblings / spouses aboard.
    pub sibsp: u32,
    /// Parents / children aboard.
    pub parch: u32,
    /// Ticket fare in pounds.
    pub fare: f64,
    pub embark_town: Option<EmbarkTown>,
    pub who: Who,
    pub adult_male: bool,
    pub deck: Option<char>,
    pub alone: bool,
}
