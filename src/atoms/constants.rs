// ── Atoms: Constants ───────────────────────────────────────────────────────
// All named constants for the crate live here: deny lists, fixed answer
// texts, polishing bounds, and the chart theme. Collecting them in one
// place keeps the guard lists and user-visible strings auditable.

use std::time::Duration;

// ── Out-of-scope deny list (resolver pre-check) ────────────────────────────
// Topic terms unrelated to the passenger dataset. Substring-matched against
// the lowercased question BEFORE any intent rule is evaluated. Order is the
// match-report order; "alien" precedes "aliens" so the shorter stem is the
// term named in the redirect.
pub const OUT_OF_SCOPE_TERMS: &[&str] = &[
    "alien", "aliens", "ufo", "unicorn", "dog", "dogs", "cat", "cats",
    "gdp", "weather", "stock", "stocks", "bitcoin", "president",
    "prime minister", "population", "currency", "vacation", "concert",
    "score", "match", "netflix", "movie", "who won", "who is", "married",
    "marriage", "birth", "death (year)", "mars", "moon", "dinosaurs",
    "planet", "spacecraft", "covid", "pandemic",
];

// ── Fictional-term list (agent post-check) ─────────────────────────────────
// A second, smaller guard applied AFTER polishing. Overlaps with the list
// above but is intentionally kept separate: the two sets classify slightly
// different question populations, and unifying them would change observable
// behavior. See DESIGN.md.
pub const FICTIONAL_TERMS: &[&str] = &["alien", "aliens", "ufo", "unicorn", "dinosaurs"];

// ── Fixed answer texts ─────────────────────────────────────────────────────

pub const CLARIFICATION_TEXT: &str = "Please ask a clear question about the Titanic dataset.";

pub const HANDLER_ERROR_TEXT: &str =
    "Sorry — I couldn't compute the requested chart/stat due to an internal error.";

pub const OVERVIEW_ERROR_TEXT: &str =
    "Sorry — cannot produce dataset overview due to an internal error.";

pub const FICTIONAL_GUARD_TEXT: &str = "That question appears to assume facts outside this \
dataset (e.g., 'aliens'). I can only answer questions about the Titanic passenger dataset. \
Try asking about age, fare, sex, survival, class, or embarkation.";

// ── Answer polishing bounds ────────────────────────────────────────────────
// Wall-clock deadline for the remote call. Fixed on purpose: not exposed
// through configuration.
pub const POLISH_TIMEOUT: Duration = Duration::from_secs(15);

// A polished reply must satisfy MIN < len < MAX after trimming; anything
// outside the bounds (empty echo or runaway generation) falls back to the
// raw computed text.
pub const POLISH_MIN_CHARS: usize = 10;
pub const POLISH_MAX_CHARS: usize = 2000;

pub const DEFAULT_POLISH_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.3";
pub const DEFAULT_POLISH_BASE_URL: &str = "https://router.huggingface.co/v1";

// ── Chart theme ────────────────────────────────────────────────────────────
// 9in x 5in figure at 110 dpi, shared palette across every chart so the
// rendered output reads as one visual system.

pub const CHART_WIDTH: u32 = 990;
pub const CHART_HEIGHT: u32 = 550;

/// Figure background (off-white).
pub const CHART_BACKGROUND: (u8, u8, u8) = (0xf8, 0xf9, 0xfa);

/// Categorical palette: steel blue, orange, red.
pub const CHART_PALETTE: [(u8, u8, u8); 3] = [(0x4e, 0x79, 0xa7), (0xf2, 0x8e, 0x2b), (0xe1, 0x57, 0x59)];

/// Histogram bin counts.
pub const AGE_HISTOGRAM_BINS: usize = 30;
pub const FARE_HISTOGRAM_BINS: usize = 40;
