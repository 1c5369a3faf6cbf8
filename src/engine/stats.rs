// Scalar statistic handlers and the overview fallback.
//
// Every handler is a pure function of the dataset returning the computed
// sentence (no plot). Formatting contract: 2 decimals for currency and
// percentages, 1 decimal for ages and survival rates.

use crate::atoms::error::{AgentError, AgentResult};
use crate::atoms::types::{QueryResult, Sex};
use crate::engine::dataset::Dataset;

// ── Numeric helpers (shared with charts) ───────────────────────────────────

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

pub(crate) fn require_nonempty(values: &[f64], what: &str) -> AgentResult<()> {
    if values.is_empty() {
        return Err(AgentError::Dataset(format!("no {what} values on record")));
    }
    Ok(())
}

// ── Scalar handlers ────────────────────────────────────────────────────────

fn sex_percentage(dataset: &Dataset, sex: Sex) -> f64 {
    dataset.count_by_sex(sex) as f64 / dataset.len() as f64 * 100.0
}

pub fn male_percentage(dataset: &Dataset) -> AgentResult<QueryResult> {
    let pct = sex_percentage(dataset, Sex::Male);
    Ok(QueryResult::text(format!("{pct:.2}% of passengers were male.")))
}

pub fn female_percentage(dataset: &Dataset) -> AgentResult<QueryResult> {
    let pct = sex_percentage(dataset, Sex::Female);
    Ok(QueryResult::text(format!("{pct:.2}% of passengers were female.")))
}

pub fn average_fare(dataset: &Dataset) -> AgentResult<QueryResult> {
    let fares = dataset.fares();
    require_nonempty(&fares, "fare")?;
    Ok(QueryResult::text(format!(
        "The average ticket fare was £{:.2}. Median fare was £{:.2}.",
        mean(&fares),
        median(&fares),
    )))
}

pub fn average_age(dataset: &Dataset) -> AgentResult<QueryResult> {
    let ages = dataset.known_ages();
    require_nonempty(&ages, "age")?;
    Ok(QueryResult::text(format!(
        "The average passenger age was {:.1} years (median {:.1}).",
        mean(&ages),
        median(&ages),
    )))
}

pub fn survival_count(dataset: &Dataset) -> AgentResult<QueryResult> {
    let survived = dataset.survivor_count();
    let total = dataset.len();
    let rate = survived as f64 / total as f64 * 100.0;
    Ok(QueryResult::text(format!(
        "{survived} out of {total} passengers survived ({rate:.1}% survival rate)."
    )))
}

pub fn total_passengers(dataset: &Dataset) -> AgentResult<QueryResult> {
    Ok(QueryResult::text(format!(
        "There were {} total passengers on the Titanic.",
        dataset.len()
    )))
}

// ── Fallback overview ──────────────────────────────────────────────────────

/// General dataset overview; used when no intent rule matches.
pub fn overview(dataset: &Dataset) -> AgentResult<QueryResult> {
    let total = dataset.len();
    let survived = dataset.survivor_count();
    let ages = dataset.known_ages();
    let fares = dataset.fares();
    require_nonempty(&ages, "age")?;
    require_nonempty(&fares, "fare")?;

    let towns = dataset
        .town_counts()
        .iter()
        .map(|(t, n)| format!("{} ({n})", t.label()))
        .collect::<Vec<_>>()
        .join(", ");
    let classes = dataset
        .class_counts()
        .iter()
        .map(|(c, n)| format!("{} ({n})", c.label()))
        .collect::<Vec<_>>()
        .join(", ");

    let lines = [
        format!("Titanic Dataset Overview ({total} passengers):"),
        format!("  • Survived: {survived} ({:.1}%)", survived as f64 / total as f64 * 100.0),
        format!(
            "  • Male: {}, Female: {}",
            dataset.count_by_sex(Sex::Male),
            dataset.count_by_sex(Sex::Female)
        ),
        format!("  • Average age: {:.1} years", mean(&ages)),
        format!("  • Average fare: £{:.2}", mean(&fares)),
        format!("  • Embarked from: {towns}"),
        format!("  • Classes: {classes}"),
    ];
    Ok(QueryResult::text(lines.join("\n")))
}
