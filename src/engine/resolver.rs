// Intent Resolver
//
// Screens the question against the out-of-scope deny list, then scans an
// ordered rule table. A rule matches when every required keyword is a
// substring of the lowercased question AND (its any-of set is empty OR at
// least one any-of keyword is a substring). First match wins, so rule
// ORDER encodes specificity: the age-histogram rule must sit above the
// broader age-average rule, and ambiguous questions resolve to whichever
// specific rule appears earliest.
//
// The resolver is also the fault barrier for handler execution: a handler
// error is caught here and converted to a fixed apology, never propagated.

use log::{error, warn};

use crate::atoms::constants::{HANDLER_ERROR_TEXT, OUT_OF_SCOPE_TERMS, OVERVIEW_ERROR_TEXT};
use crate::atoms::error::AgentResult;
use crate::atoms::types::{Intent, QueryResult};
use crate::engine::dataset::Dataset;
use crate::engine::{charts, stats};

// ── Rule table ─────────────────────────────────────────────────────────────

struct IntentRule {
    /// Every keyword must be present.
    required: &'static [&'static str],
    /// At least one must be present, unless the set is empty.
    any_of: &'static [&'static str],
    intent: Intent,
}

const CHART_WORDS: &[&str] = &["histogram", "distribution", "chart", "plot", "show", "graph"];

/// The authoritative ordered rule table. `surviv` is a deliberate stem: it
/// matches "survived", "survival", and "survivors" alike.
const RULES: &[IntentRule] = &[
    IntentRule { required: &["age"], any_of: CHART_WORDS, intent: Intent::AgeHistogram },
    IntentRule { required: &["fare"], any_of: CHART_WORDS, intent: Intent::FareHistogram },
    IntentRule { required: &[], any_of: &["embark", "port"], intent: Intent::EmbarkChart },
    IntentRule {
        required: &["class"],
        any_of: &["how many", "count", "chart", "plot", "show", "distribution", "number"],
        intent: Intent::ClassChart,
    },
    IntentRule {
        required: &["surviv"],
        any_of: &["gender", "sex", "male", "female", "chart", "plot", "bar", "rate", "show"],
        intent: Intent::SurvivalByGender,
    },
    IntentRule { required: &["surviv"], any_of: &["class", "pclass"], intent: Intent::SurvivalByClass },
    IntentRule { required: &["age"], any_of: &["class", "box"], intent: Intent::AgeByClass },
    IntentRule { required: &["fare"], any_of: &["class", "box"], intent: Intent::FareByClass },
    IntentRule {
        required: &["male"],
        any_of: &["percent", "%", "proportion", "ratio"],
        intent: Intent::MalePercentage,
    },
    IntentRule {
        required: &["female"],
        any_of: &["percent", "%", "proportion", "ratio"],
        intent: Intent::FemalePercentage,
    },
    IntentRule { required: &["fare"], any_of: &["average", "mean", "avg"], intent: Intent::AverageFare },
    IntentRule { required: &["age"], any_of: &["average", "mean", "avg"], intent: Intent::AverageAge },
    IntentRule { required: &["surviv"], any_of: &[], intent: Intent::SurvivalCount },
    IntentRule { required: &["total", "passenger"], any_of: &[], intent: Intent::TotalPassengers },
];

// ── Resolution ─────────────────────────────────────────────────────────────

/// What the rule scan decided for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A deny-list term was found; carries the matched term.
    OutOfScope(&'static str),
    Matched(Intent),
    /// No rule matched; the overview handler answers.
    Fallback,
}

#[derive(Debug, Default)]
pub struct Resolver;

impl Resolver {
    pub fn new() -> Resolver {
        Resolver
    }

    /// Classify a question without running any handler.
    pub fn resolve(&self, question: &str) -> Resolution {
        let q = question.to_lowercase();

        // The deny list takes precedence over every intent rule.
        if let Some(term) = OUT_OF_SCOPE_TERMS.iter().copied().find(|t| q.contains(*t)) {
            return Resolution::OutOfScope(term);
        }

        for rule in RULES {
            let all_required = rule.required.iter().all(|k| q.contains(k));
            let any_optional = rule.any_of.is_empty() || rule.any_of.iter().any(|k| q.contains(k));
            if all_required && any_optional {
                return Resolution::Matched(rule.intent);
            }
        }
        Resolution::Fallback
    }

    /// Resolve and execute. Infallible: handler errors degrade to apology
    /// text so the caller always receives a usable result.
    pub fn run(&self, question: &str, dataset: &Dataset) -> QueryResult {
        match self.resolve(question) {
            Resolution::OutOfScope(term) => {
                warn!("[resolver] out-of-scope question (term '{term}')");
                QueryResult::text(out_of_scope_text(term))
            }
            Resolution::Matched(intent) => match dispatch(intent, dataset) {
                Ok(result) => result,
                Err(e) => {
                    error!("[resolver] handler {intent:?} failed: {e}");
                    QueryResult::text(HANDLER_ERROR_TEXT)
                }
            },
            Resolution::Fallback => match stats::overview(dataset) {
                Ok(result) => result,
                Err(e) => {
                    error!("[resolver] overview fallback failed: {e}");
                    QueryResult::text(OVERVIEW_ERROR_TEXT)
                }
            },
        }
    }
}

/// Map an intent to its handler. One computation per intent.
fn dispatch(intent: Intent, dataset: &Dataset) -> AgentResult<QueryResult> {
    match intent {
        Intent::AgeHistogram => charts::age_histogram(dataset),
        Intent::FareHistogram => charts::fare_histogram(dataset),
        Intent::EmbarkChart => charts::embark_chart(dataset),
        Intent::ClassChart => charts::class_chart(dataset),
        Intent::SurvivalByGender => charts::survival_by_gender(dataset),
        Intent::SurvivalByClass => charts::survival_by_class(dataset),
        Intent::AgeByClass => charts::age_by_class(dataset),
        Intent::FareByClass => charts::fare_by_class(dataset),
        Intent::MalePercentage => stats::male_percentage(dataset),
        Intent::FemalePercentage => stats::female_percentage(dataset),
        Intent::AverageFare => stats::average_fare(dataset),
        Intent::AverageAge => stats::average_age(dataset),
        Intent::SurvivalCount => stats::survival_count(dataset),
        Intent::TotalPassengers => stats::total_passengers(dataset),
        Intent::Overview => stats::overview(dataset),
    }
}

pub fn out_of_scope_text(term: &str) -> String {
    format!(
        "Sorry — that question appears unrelated to the Titanic passenger dataset \
         (found term '{term}'). I can answer data questions about passengers (columns \
         like age, sex, survived, pclass, fare, embarked, class, etc.). Try: 'What \
         percentage of passengers were male?' or 'Show me a histogram of passenger ages'."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::dataset::fixtures::full_dataset;

    fn resolve(question: &str) -> Resolution {
        Resolver::new().resolve(question)
    }

    #[test]
    fn test_first_match_wins_over_later_rules() {
        // Matches both the age-histogram rule and the age-by-class rule;
        // the earlier (more specific) rule must win.
        assert_eq!(
            resolve("show me a histogram of ages by class"),
            Resolution::Matched(Intent::AgeHistogram)
        );
    }

    #[test]
    fn test_deny_list_beats_every_rule() {
        // "age" + "show" would match the age-histogram rule, but the deny
        // term takes precedence.
        assert_eq!(
            resolve("show the age of the president"),
            Resolution::OutOfScope("president")
        );
    }

    #[test]
    fn test_scalar_intents() {
        assert_eq!(
            resolve("What percentage of passengers were male?"),
            Resolution::Matched(Intent::MalePercentage)
        );
        assert_eq!(
            resolve("what was the average fare?"),
            Resolution::Matched(Intent::AverageFare)
        );
        assert_eq!(
            resolve("mean age of passengers"),
            Resolution::Matched(Intent::AverageAge)
        );
        assert_eq!(resolve("how many survived?"), Resolution::Matched(Intent::SurvivalCount));
        assert_eq!(
            resolve("How many total passengers?"),
            Resolution::Matched(Intent::TotalPassengers)
        );
    }

    #[test]
    fn test_chart_intents() {
        assert_eq!(
            resolve("plot the fare distribution"),
            Resolution::Matched(Intent::FareHistogram)
        );
        assert_eq!(
            resolve("where did passengers embark?"),
            Resolution::Matched(Intent::EmbarkChart)
        );
        assert_eq!(
            resolve("how many passengers per class?"),
            Resolution::Matched(Intent::ClassChart)
        );
        assert_eq!(
            resolve("survival rate by gender"),
            Resolution::Matched(Intent::SurvivalByGender)
        );
        assert_eq!(
            resolve("did survival depend on pclass?"),
            Resolution::Matched(Intent::SurvivalByClass)
        );
        assert_eq!(
            resolve("age box plot by class"),
            Resolution::Matched(Intent::AgeHistogram),
            "box requests that also say 'plot' hit the histogram rule first"
        );
        assert_eq!(resolve("fare by class box"), Resolution::Matched(Intent::FareByClass));
    }

    #[test]
    fn test_surviv_stem_matches_inflections() {
        for q in ["how many survived", "survival numbers", "did most survive?"] {
            assert_eq!(resolve(q), Resolution::Matched(Intent::SurvivalCount), "question: {q}");
        }
    }

    #[test]
    fn test_gibberish_falls_back_to_overview() {
        assert_eq!(resolve("asdkj qwle"), Resolution::Fallback);
    }

    #[test]
    fn test_run_converts_fallback_to_overview_text() {
        let result = Resolver::new().run("asdkj qwle", &full_dataset());
        assert!(result.text.starts_with("Titanic Dataset Overview"));
        assert!(result.plot.is_none());
    }

    #[test]
    fn test_run_out_of_scope_names_term() {
        let result = Resolver::new().run("what about the weather", &full_dataset());
        assert!(result.text.contains("found term 'weather'"), "got: {}", result.text);
        assert!(result.plot.is_none());
    }
}
