// Dataset Store
//
// Loads the passenger manifest CSV once at startup and serves it read-only
// for the life of the process. There is no fallback path: any load failure
// is fatal to the caller (main exits nonzero).
//
// Parsing is header-driven, not positional: headers are trimmed and
// lowercased before lookup so column matching is case-insensitive. Rows
// that contradict themselves (pclass vs class, alive vs survived,
// embarked vs embark_town) are rejected with the row number.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use log::info;

use crate::atoms::error::{AgentError, AgentResult};
use crate::atoms::types::{EmbarkTown, Passenger, PassengerClass, Sex, Who};

/// The in-memory passenger table. Immutable after construction; shared
/// across requests behind an `Arc` with no locking.
#[derive(Debug)]
pub struct Dataset {
    passengers: Vec<Passenger>,
}

impl Dataset {
    /// Load the manifest from a CSV file. Called once from main.
    pub fn load(path: impl AsRef<Path>) -> AgentResult<Dataset> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            AgentError::Dataset(format!("cannot open {}: {e}", path.display()))
        })?;
        let dataset = Self::from_reader(file)?;
        info!("[dataset] loaded {} passengers from {}", dataset.len(), path.display());
        Ok(dataset)
    }

    /// Parse a manifest from any reader. Split out from `load` so tests can
    /// feed in-memory CSV.
    pub fn from_reader<R: Read>(reader: R) -> AgentResult<Dataset> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| AgentError::Dataset(format!("cannot read CSV header: {e}")))?
            .clone();
        let columns = ColumnMap::from_headers(&headers)?;

        let mut passengers = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            // Row 1 is the header, so data rows start at 2.
            let row = i + 2;
            let record = record?;
            let passenger = columns
                .parse_row(&record)
                .map_err(|e| AgentError::Dataset(format!("row {row}: {e}")))?;
            passengers.push(passenger);
        }

        if passengers.is_empty() {
            return Err(AgentError::Dataset("manifest contains no rows".into()));
        }

        Ok(Dataset { passengers })
    }

    #[cfg(test)]
    pub(crate) fn from_records(passengers: Vec<Passenger>) -> Dataset {
        Dataset { passengers }
    }

    // ── Read accessors (all borrowing, no I/O) ─────────────────────────────

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    pub fn count_by_sex(&self, sex: Sex) -> usize {
        self.passengers.iter().filter(|p| p.sex == sex).count()
    }

    pub fn survivor_count(&self) -> usize {
        self.passengers.iter().filter(|p| p.survived).count()
    }

    /// Ages of passengers whose age is on record.
    pub fn known_ages(&self) -> Vec<f64> {
        self.passengers.iter().filter_map(|p| p.age).collect()
    }

    pub fn fares(&self) -> Vec<f64> {
        self.passengers.iter().map(|p| p.fare).collect()
    }

    /// Passenger count per embarkation town, descending by count.
    pub fn town_counts(&self) -> Vec<(EmbarkTown, usize)> {
        let towns = [EmbarkTown::Southampton, EmbarkTown::Cherbourg, EmbarkTown::Queenstown];
        let mut counts: Vec<(EmbarkTown, usize)> = towns
            .iter()
            .map(|&t| (t, self.passengers.iter().filter(|p| p.embark_town == Some(t)).count()))
            .filter(|&(_, n)| n > 0)
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Passenger count per class, descending by count (class order on ties).
    pub fn class_counts(&self) -> Vec<(PassengerClass, usize)> {
        let mut counts: Vec<(PassengerClass, usize)> = PassengerClass::ALL
            .iter()
            .map(|&c| (c, self.passengers.iter().filter(|p| p.class == c).count()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        counts
    }

    /// Survival rate per sex as a percentage, female first (group order).
    pub fn survival_rate_by_sex(&self) -> Vec<(Sex, f64)> {
        [Sex::Female, Sex::Male]
            .iter()
            .filter_map(|&s| {
                let group: Vec<&Passenger> =
                    self.passengers.iter().filter(|p| p.sex == s).collect();
                if group.is_empty() {
                    return None;
                }
                let survived = group.iter().filter(|p| p.survived).count();
                Some((s, survived as f64 / group.len() as f64 * 100.0))
            })
            .collect()
    }

    /// Survival rate per class as a percentage, in class order.
    pub fn survival_rate_by_class(&self) -> Vec<(PassengerClass, f64)> {
        PassengerClass::ALL
            .iter()
            .filter_map(|&c| {
                let group: Vec<&Passenger> =
                    self.passengers.iter().filter(|p| p.class == c).collect();
                if group.is_empty() {
                    return None;
                }
                let survived = group.iter().filter(|p| p.survived).count();
                Some((c, survived as f64 / group.len() as f64 * 100.0))
            })
            .collect()
    }

    /// Known ages of passengers in one class.
    pub fn ages_for_class(&self, class: PassengerClass) -> Vec<f64> {
        self.passengers
            .iter()
            .filter(|p| p.class == class)
            .filter_map(|p| p.age)
            .collect()
    }

    pub fn fares_for_class(&self, class: PassengerClass) -> Vec<f64> {
        self.passengers
            .iter()
            .filter(|p| p.class == class)
            .map(|p| p.fare)
            .collect()
    }
}

// ── Header-driven row parsing ──────────────────────────────────────────────

struct ColumnMap {
    indices: HashMap<String, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> AgentResult<ColumnMap> {
        let indices: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().to_lowercase(), i))
            .collect();

        for required in [
            "survived", "pclass", "sex", "age", "sibsp", "parch", "fare",
            "embarked", "class", "who", "adult_male", "deck", "embark_town",
            "alive", "alone",
        ] {
            if !indices.contains_key(required) {
                return Err(AgentError::Dataset(format!("missing column '{required}'")));
            }
        }
        Ok(ColumnMap { indices })
    }

    fn field<'a>(&self, record: &'a StringRecord, name: &str) -> Result<&'a str, String> {
        let idx = self.indices.get(name).ok_or_else(|| format!("missing column '{name}'"))?;
        record.get(*idx).ok_or_else(|| format!("short record, no field '{name}'"))
    }

    fn parse_row(&self, record: &StringRecord) -> Result<Passenger, String> {
        let survived = match self.field(record, "survived")? {
            "0" => false,
            "1" => true,
            other => return Err(format!("bad survived value '{other}'")),
        };

        let pclass: u8 = self
            .field(record, "pclass")?
            .parse()
            .map_err(|_| "bad pclass value".to_string())?;
        let class = match self.field(record, "class")? {
            c if c.eq_ignore_ascii_case("first") => PassengerClass::First,
            c if c.eq_ignore_ascii_case("second") => PassengerClass::Second,
            c if c.eq_ignore_ascii_case("third") => PassengerClass::Third,
            other => return Err(format!("bad class value '{other}'")),
        };
        if class.number() != pclass {
            return Err(format!("pclass {pclass} disagrees with class '{}'", class.label()));
        }

        let sex = match self.field(record, "sex")? {
            s if s.eq_ignore_ascii_case("male") => Sex::Male,
            s if s.eq_ignore_ascii_case("female") => Sex::Female,
            other => return Err(format!("bad sex value '{other}'")),
        };

        let age = parse_optional_f64(self.field(record, "age")?)?;
        let fare: f64 = self
            .field(record, "fare")?
            .parse()
            .map_err(|_| "bad fare value".to_string())?;
        let sibsp: u32 = self
            .field(record, "sibsp")?
            .parse()
            .map_err(|_| "bad sibsp value".to_string())?;
        let parch: u32 = self
            .field(record, "parch")?
            .parse()
            .map_err(|_| "bad parch value".to_string())?;

        let embarked = self.field(record, "embarked")?;
        let embark_town = match self.field(record, "embark_town")? {
            "" => None,
            t if t.eq_ignore_ascii_case("southampton") => Some(EmbarkTown::Southampton),
            t if t.eq_ignore_ascii_case("cherbourg") => Some(EmbarkTown::Cherbourg),
            t if t.eq_ignore_ascii_case("queenstown") => Some(EmbarkTown::Queenstown),
            other => return Err(format!("bad embark_town value '{other}'")),
        };
        match (embarked, embark_town) {
            ("", None) => {}
            (code, Some(town)) if code.len() == 1
                && code.chars().next().map(|c| c.to_ascii_uppercase()) == Some(town.code()) => {}
            (code, town) => {
                return Err(format!(
                    "embarked '{code}' disagrees with embark_town {:?}",
                    town.map(|t| t.label())
                ))
            }
        }

        let who = match self.field(record, "who")? {
            w if w.eq_ignore_ascii_case("man") => Who::Man,
            w if w.eq_ignore_ascii_case("woman") => Who::Woman,
            w if w.eq_ignore_ascii_case("child") => Who::Child,
            other => return Err(format!("bad who value '{other}'")),
        };

        let adult_male = parse_bool(self.field(record, "adult_male")?)?;
        let alone = parse_bool(self.field(record, "alone")?)?;

        let deck = match self.field(record, "deck")? {
            "" => None,
            d => d.chars().next().map(|c| c.to_ascii_uppercase()),
        };

        let alive = match self.field(record, "alive")? {
            a if a.eq_ignore_ascii_case("yes") => true,
            a if a.eq_ignore_ascii_case("no") => false,
            other => return Err(format!("bad alive value '{other}'")),
        };
        if alive != survived {
            return Err("alive disagrees with survived".to_string());
        }

        Ok(Passenger {
            survived,
            class,
            sex,
            age,
            sibsp,
            parch,
            fare,
            embark_town,
            who,
            adult_male,
            deck,
            alone,
        })
    }
}

fn parse_optional_f64(value: &str) -> Result<Option<f64>, String> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| format!("bad numeric value '{value}'"))
}

fn parse_bool(value: &str) -> Result<bool, String> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("bad boolean value '{value}'"))
    }
}

// ── Test fixtures ──────────────────────────────────────────────────────────
// Shared by the stats/charts/resolver/agent test modules.

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn passenger(
        survived: bool,
        class: PassengerClass,
        sex: Sex,
        age: Option<f64>,
        fare: f64,
        town: Option<EmbarkTown>,
    ) -> Passenger {
        Passenger {
            survived,
            class,
            sex,
            age,
            sibsp: 0,
            parch: 0,
            fare,
            embark_town: town,
            who: match (sex, age) {
                (_, Some(a)) if a < 16.0 => Who::Child,
                (Sex::Male, _) => Who::Man,
                (Sex::Female, _) => Who::Woman,
            },
            adult_male: sex == Sex::Male && age.map_or(true, |a| a >= 16.0),
            deck: None,
            alone: true,
        }
    }

    /// Small handcrafted manifest with obvious statistics: 4 passengers,
    /// fares 10/20/30/40 (mean 25.00, median 25.00), known ages 20/30/40
    /// (mean 30.0, median 30.0), 2 male / 2 female, 1 survivor.
    pub(crate) fn small_dataset() -> Dataset {
        Dataset::from_records(vec![
            passenger(true, PassengerClass::First, Sex::Female, Some(20.0), 40.0, Some(EmbarkTown::Cherbourg)),
            passenger(false, PassengerClass::Second, Sex::Female, Some(30.0), 30.0, Some(EmbarkTown::Southampton)),
            passenger(false, PassengerClass::Third, Sex::Male, Some(40.0), 20.0, Some(EmbarkTown::Southampton)),
            passenger(false, PassengerClass::Third, Sex::Male, None, 10.0, Some(EmbarkTown::Queenstown)),
        ])
    }

    /// Synthetic 891-row manifest reproducing the marginal counts of the
    /// shipped dataset: 577 male / 314 female, 342 survivors (109 male,
    /// 233 female), classes 216/184/491, towns 644/168/77 plus 2 unknown,
    /// 177 missing ages.
    pub(crate) fn full_dataset() -> Dataset {
        let mut rows = Vec::with_capacity(891);
        for i in 0..891usize {
            let sex = if i < 577 { Sex::Male } else { Sex::Female };
            let survived = i < 109 || (577..810).contains(&i);
            let class = if i < 216 {
                PassengerClass::First
            } else if i < 400 {
                PassengerClass::Second
            } else {
                PassengerClass::Third
            };
            let town = if i < 644 {
                Some(EmbarkTown::Southampton)
            } else if i < 812 {
                Some(EmbarkTown::Cherbourg)
            } else if i < 889 {
                Some(EmbarkTown::Queenstown)
            } else {
                None
            };
            let age = if i < 177 { None } else { Some(5.0 + (i % 60) as f64) };
            let fare = 5.0 + (i % 100) as f64;
            rows.push(passenger(survived, class, sex, age, fare, town));
        }
        Dataset::from_records(rows)
    }
}
