//! Canonical book record and CSV field mapping
//!
//! Input files are not consistent about column naming: goodbooks exports use
//! `original_publication_year` and `ratings_count`, other dumps use
//! `publication_year` / `rating_count`, and so on. The mapper resolves each
//! canonical field through an ordered alias list and substitutes a documented
//! default when every alias is absent or empty. No field is required; a row
//! never fails to map.

use csv::StringRecord;
use serde::Serialize;

// Alias lists, highest priority first. Header names match case-sensitively.
const ISBN13_ALIASES: &[&str] = &["isbn13", "isbn"];
const TITLE_ALIASES: &[&str] = &["title", "original_title"];
const AUTHORS_ALIASES: &[&str] = &["authors", "author"];
const YEAR_ALIASES: &[&str] = &["original_publication_year", "publication_year", "year"];
const IMAGE_URL_ALIASES: &[&str] = &["image_url", "cover_url"];
const RATING_AVG_ALIASES: &[&str] = &["average_rating", "rating_avg"];
const RATING_COUNT_ALIASES: &[&str] = &["ratings_count", "rating_count"];
const STAR_ALIASES: [[&str; 2]; 5] = [
    ["ratings_1", "rating_1"],
    ["ratings_2", "rating_2"],
    ["ratings_3", "rating_3"],
    ["ratings_4", "rating_4"],
    ["ratings_5", "rating_5"],
];

/// Canonical book representation after alias resolution and default
/// substitution. Field order matches the `books` table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    /// Assigned by the importer, never taken from the input.
    pub id: i64,
    pub isbn13: String,
    pub title: String,
    pub authors: String,
    pub publication_year: Option<i32>,
    pub image_url: String,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub rating_1_star: i64,
    pub rating_2_star: i64,
    pub rating_3_star: i64,
    pub rating_4_star: i64,
    pub rating_5_star: i64,
}

/// Maps raw CSV rows to [`BookRecord`]s.
///
/// Alias-to-column resolution happens once against the header row; the
/// first-non-empty-value fallback still runs per row, so a blank `title`
/// cell falls through to `original_title` even when both columns exist.
#[derive(Debug)]
pub struct FieldMapper {
    isbn13: Vec<usize>,
    title: Vec<usize>,
    authors: Vec<usize>,
    year: Vec<usize>,
    image_url: Vec<usize>,
    rating_avg: Vec<usize>,
    rating_count: Vec<usize>,
    stars: [Vec<usize>; 5],
}

impl FieldMapper {
    pub fn new(headers: &StringRecord) -> Self {
        let resolve = |aliases: &[&str]| -> Vec<usize> {
            aliases
                .iter()
                .filter_map(|alias| headers.iter().position(|h| h == *alias))
                .collect()
        };

        Self {
            isbn13: resolve(ISBN13_ALIASES),
            title: resolve(TITLE_ALIASES),
            authors: resolve(AUTHORS_ALIASES),
            year: resolve(YEAR_ALIASES),
            image_url: resolve(IMAGE_URL_ALIASES),
            rating_avg: resolve(RATING_AVG_ALIASES),
            rating_count: resolve(RATING_COUNT_ALIASES),
            stars: STAR_ALIASES.map(|aliases| resolve(&aliases)),
        }
    }

    /// Map one raw row to a canonical record with the given id.
    pub fn map(&self, id: i64, row: &StringRecord) -> BookRecord {
        BookRecord {
            id,
            isbn13: text_field(row, &self.isbn13),
            title: text_field(row, &self.title),
            authors: text_field(row, &self.authors),
            publication_year: year_field(row, &self.year),
            image_url: text_field(row, &self.image_url),
            rating_avg: float_field(row, &self.rating_avg),
            rating_count: int_field(row, &self.rating_count),
            rating_1_star: int_field(row, &self.stars[0]),
            rating_2_star: int_field(row, &self.stars[1]),
            rating_3_star: int_field(row, &self.stars[2]),
            rating_4_star: int_field(row, &self.stars[3]),
            rating_5_star: int_field(row, &self.stars[4]),
        }
    }
}

/// First non-empty value among the resolved columns, trimmed.
fn raw_field<'r>(row: &'r StringRecord, columns: &[usize]) -> Option<&'r str> {
    columns
        .iter()
        .filter_map(|&idx| row.get(idx))
        .map(str::trim)
        .find(|value| !value.is_empty())
}

fn text_field(row: &StringRecord, columns: &[usize]) -> String {
    raw_field(row, columns).unwrap_or_default().to_string()
}

/// Lenient integer parse: exports frequently serialize integer columns as
/// floats ("2008.0"), so a fractional suffix is truncated rather than
/// rejected. Anything else unparseable falls back to 0.
fn parse_int(value: &str) -> Option<i64> {
    if let Ok(n) = value.parse::<i64>() {
        return Some(n);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| f.trunc() as i64)
}

fn int_field(row: &StringRecord, columns: &[usize]) -> i64 {
    raw_field(row, columns).and_then(parse_int).unwrap_or(0)
}

fn float_field(row: &StringRecord, columns: &[usize]) -> f64 {
    raw_field(row, columns)
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|f| f.is_finite())
        .unwrap_or(0.0)
}

/// Publication year: unparseable, absent, or zero all degrade to None.
fn year_field(row: &StringRecord, columns: &[usize]) -> Option<i32> {
    raw_field(row, columns)
        .and_then(parse_int)
        .filter(|&year| year != 0)
        .map(|year| year as i32)
}
