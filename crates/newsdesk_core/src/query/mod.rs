//! Filtering over article snapshots.
//!
//! # Responsibility
//! - Parse raw list parameters into typed criteria.
//! - Apply source-equality and published-after predicates to a snapshot.
//!
//! # Invariants
//! - Criteria compose conjunctively; no criteria keeps the whole snapshot.
//! - Input order is preserved.
//! - An unparseable threshold is an error, never a skipped filter.

use crate::model::article::Article;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Naive (offset-less) date-time layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Date-time layouts with a numeric offset, extended (`+02:00`) or basic
/// (`+0200`, `+02`).
const OFFSET_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
];

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A date filter could not be parsed as an ISO-8601 instant.
    InvalidTimestamp { field: &'static str, value: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimestamp { field, value } => {
                write!(f, "invalid {field} date format: `{value}`")
            }
        }
    }
}

impl Error for QueryError {}

/// Raw list parameters as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleListParams {
    pub source: Option<String>,
    pub published_after: Option<String>,
}

/// Typed list criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleQuery {
    /// Exact, case-sensitive match on `source`.
    pub source: Option<String>,
    /// Inclusive lower bound on `published_at`.
    pub published_after: Option<DateTime<Utc>>,
}

impl ArticleQuery {
    /// Parses raw parameters. Empty values count as not supplied.
    ///
    /// # Errors
    /// - `InvalidTimestamp` naming `publishedAfter` when it does not parse.
    pub fn from_params(params: &ArticleListParams) -> QueryResult<Self> {
        let source = params.source.clone().filter(|value| !value.is_empty());
        let published_after = match params.published_after.as_deref() {
            None | Some("") => None,
            Some(raw) => Some(parse_instant(raw).ok_or_else(|| QueryError::InvalidTimestamp {
                field: "publishedAfter",
                value: raw.to_string(),
            })?),
        };

        Ok(Self {
            source,
            published_after,
        })
    }

    pub fn is_unfiltered(&self) -> bool {
        self.source.is_none() && self.published_after.is_none()
    }

    pub fn matches(&self, article: &Article) -> bool {
        let source_ok = self
            .source
            .as_deref()
            .map_or(true, |source| article.source == source);
        let time_ok = self
            .published_after
            .map_or(true, |threshold| article.published_at >= threshold);
        source_ok && time_ok
    }

    /// Filters `snapshot`, keeping order.
    pub fn apply(&self, snapshot: Vec<Article>) -> Vec<Article> {
        if self.is_unfiltered() {
            return snapshot;
        }
        snapshot
            .into_iter()
            .filter(|article| self.matches(article))
            .collect()
    }
}

/// Parses an ISO-8601 instant.
///
/// Accepts RFC 3339, date-times with an extended or basic numeric offset, and
/// minute-precision date-times with or without `Z`. Offset-less date-times are
/// read as UTC. Calendar dates of reduced precision (`2024-05-01`, `2024-05`,
/// `2024`) mean UTC midnight at the start of that period.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(value, format) {
            return Some(instant.with_timezone(&Utc));
        }
    }
    let zulu_stripped = value
        .strip_suffix('Z')
        .or_else(|| value.strip_suffix('z'))
        .unwrap_or(value);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(zulu_stripped, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_reduced_date(value))
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `YYYY` or `YYYY-MM`, pinned to the first day of the period.
fn parse_reduced_date(value: &str) -> Option<NaiveDate> {
    let digits =
        |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());

    let mut parts = value.split('-');
    let year = parts.next().filter(|part| digits(*part, 4))?.parse().ok()?;
    let month = match parts.next() {
        None => 1,
        Some(part) if digits(part, 2) => part.parse().ok()?,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, 1)
}

#[cfg(test)]
mod tests {
    use super::{parse_instant, ArticleListParams, ArticleQuery, QueryError};
    use crate::model::article::Article;
    use chrono::{DateTime, TimeZone, Utc};

    fn article(id: &str, source: &str, published_at: DateTime<Utc>) -> Article {
        Article {
            id: id.to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            source: source.to_string(),
            author: None,
            published_at,
            updated_at: None,
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
    }

    fn snapshot() -> Vec<Article> {
        vec![
            article("a", "wire", at(8)),
            article("b", "Wire", at(10)),
            article("c", "wire", at(12)),
            article("d", "blog", at(10)),
        ]
    }

    fn ids(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn parse_instant_accepts_common_iso_shapes() {
        assert_eq!(parse_instant("2024-05-01T10:00:00Z"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T12:00:00+02:00"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T10:00:00.000"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01 10:00:00"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T10:00"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01"), Some(at(0)));
    }

    #[test]
    fn parse_instant_accepts_minute_precision_and_basic_offsets() {
        assert_eq!(parse_instant("2024-05-01T10:00Z"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T12:00+02:00"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T12:00:00.000+0200"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01T12:00:00+02"), Some(at(10)));
        assert_eq!(parse_instant("2024-05-01 12:00:00+02:00"), Some(at(10)));
    }

    #[test]
    fn parse_instant_pins_reduced_dates_to_period_start() {
        assert_eq!(parse_instant("2024-05"), Some(at(0)));
        assert_eq!(
            parse_instant("2024"),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_instant("2024-5"), None);
        assert_eq!(parse_instant("2024-13"), None);
        assert_eq!(parse_instant("+202"), None);
    }

    #[test]
    fn parse_instant_rejects_garbage() {
        assert_eq!(parse_instant("yesterday"), None);
        assert_eq!(parse_instant("2024-13-01"), None);
        assert_eq!(parse_instant("01/05/2024"), None);
    }

    #[test]
    fn no_criteria_returns_snapshot_unchanged() {
        let query = ArticleQuery::from_params(&ArticleListParams::default()).unwrap();
        assert!(query.is_unfiltered());
        assert_eq!(query.apply(snapshot()), snapshot());
    }

    #[test]
    fn source_filter_is_exact_and_case_sensitive() {
        let query = ArticleQuery {
            source: Some("wire".to_string()),
            ..ArticleQuery::default()
        };
        assert_eq!(ids(&query.apply(snapshot())), vec!["a", "c"]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let query = ArticleQuery {
            published_after: Some(at(10)),
            ..ArticleQuery::default()
        };
        assert_eq!(ids(&query.apply(snapshot())), vec!["b", "c", "d"]);
    }

    #[test]
    fn criteria_compose_conjunctively() {
        let params = ArticleListParams {
            source: Some("wire".to_string()),
            published_after: Some("2024-05-01T10:00:00Z".to_string()),
        };
        let query = ArticleQuery::from_params(&params).unwrap();
        assert_eq!(ids(&query.apply(snapshot())), vec!["c"]);
    }

    #[test]
    fn unparseable_threshold_names_the_field() {
        let params = ArticleListParams {
            published_after: Some("not-a-date".to_string()),
            ..ArticleListParams::default()
        };
        let err = ArticleQuery::from_params(&params).unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidTimestamp {
                field: "publishedAfter",
                value: "not-a-date".to_string(),
            }
        );
        assert!(err.to_string().contains("publishedAfter"));
    }

    #[test]
    fn empty_parameters_count_as_absent() {
        let params = ArticleListParams {
            source: Some(String::new()),
            published_after: Some(String::new()),
        };
        assert!(ArticleQuery::from_params(&params).unwrap().is_unfiltered());
    }
}
