//! Season query language.
//!
//! `[update] [<year>|<year>-<year>|<year>-<yy>] [<slot>|<classification words...>]`

use crate::catalog_store::YearRange;
use crate::errors::{TuneCapsuleError, TuneCapsuleResult};

pub const UPDATE_KEYWORD: &str = "update";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryToken {
    Update,
    /// Inclusive year bounds.
    Years(i32, i32),
    Slot(u32),
    /// Remaining words joined with single spaces, upper-cased.
    Classification(String),
}

/// What a season query asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeasonRequest {
    /// Replay every auto-slot of one year.
    UpdateYear(i32),
    /// Replay auto-partitioning across a range; open ends mean earliest
    /// ranked year and current year.
    UpdateYears {
        min_year: Option<i32>,
        max_year: Option<i32>,
    },
    /// Re-upload an existing auto-slot with its stored dates.
    ReuploadSlot { years: YearRange, slot: u32 },
    /// Re-upload an existing classification season with its stored dates.
    ReuploadSet {
        years: YearRange,
        classification: String,
    },
    /// Compute the window of an auto-slot and create or refresh it.
    CreateSlot {
        min_year: i32,
        max_year: i32,
        slot: u32,
    },
    /// Create or refresh a classification season over whole years, or
    /// all time when `years` is unbounded.
    CreateSet {
        years: YearRange,
        classification: String,
    },
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn unsupported(query: &str) -> TuneCapsuleError {
    TuneCapsuleError::UnsupportedQuery(format!("season {}", query.trim()))
}

/// Year or year-range token, if `token` is one.
fn parse_years(token: &str) -> Option<(i32, i32)> {
    match token.split('-').collect::<Vec<_>>().as_slice() {
        [year] if year.len() == 4 && all_digits(year) => {
            let year = year.parse().ok()?;
            Some((year, year))
        }
        [min, max] if min.len() == 4 && all_digits(min) && all_digits(max) => {
            let max = match max.len() {
                4 => max.parse().ok()?,
                2 => format!("{}{}", &min[..2], max).parse().ok()?,
                _ => return None,
            };
            Some((min.parse().ok()?, max))
        }
        _ => None,
    }
}

pub fn tokenize(query: &str) -> TuneCapsuleResult<Vec<QueryToken>> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut tokens = Vec::new();
    for (index, word) in words.iter().enumerate() {
        if word.eq_ignore_ascii_case(UPDATE_KEYWORD) {
            tokens.push(QueryToken::Update);
        } else if let Some((min, max)) = parse_years(word) {
            if min > max {
                return Err(unsupported(query));
            }
            tokens.push(QueryToken::Years(min, max));
        } else if word.len() < 4 && all_digits(word) {
            let slot = word.parse().map_err(|_| unsupported(query))?;
            tokens.push(QueryToken::Slot(slot));
        } else {
            tokens.push(QueryToken::Classification(
                words[index..].join(" ").to_uppercase(),
            ));
            break;
        }
    }
    Ok(tokens)
}

pub fn parse_request(query: &str) -> TuneCapsuleResult<SeasonRequest> {
    use QueryToken::*;

    let request = match tokenize(query)?.as_slice() {
        [Update, Years(min, max)] if min == max => SeasonRequest::UpdateYear(*min),
        [Update, Years(min, max)] => SeasonRequest::UpdateYears {
            min_year: Some(*min),
            max_year: Some(*max),
        },
        [Update] => SeasonRequest::UpdateYears {
            min_year: None,
            max_year: None,
        },
        [Update, Years(min, max), Classification(classification)] => SeasonRequest::ReuploadSet {
            years: YearRange::years(*min, *max),
            classification: classification.clone(),
        },
        [Update, Years(min, max), Slot(slot)] if *slot > 0 => SeasonRequest::ReuploadSlot {
            years: YearRange::years(*min, *max),
            slot: *slot,
        },
        [Update, Classification(classification)] => SeasonRequest::ReuploadSet {
            years: YearRange::UNBOUNDED,
            classification: classification.clone(),
        },
        [Years(min, max), Slot(slot)] if *slot > 0 => SeasonRequest::CreateSlot {
            min_year: *min,
            max_year: *max,
            slot: *slot,
        },
        [Years(min, max), Classification(classification)] => SeasonRequest::CreateSet {
            years: YearRange::years(*min, *max),
            classification: classification.clone(),
        },
        [Classification(classification)] => SeasonRequest::CreateSet {
            years: YearRange::UNBOUNDED,
            classification: classification.clone(),
        },
        _ => return Err(unsupported(query)),
    };
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_years() {
        assert_eq!(tokenize("2019").unwrap(), vec![QueryToken::Years(2019, 2019)]);
        assert_eq!(
            tokenize("2015-2019").unwrap(),
            vec![QueryToken::Years(2015, 2019)]
        );
        assert_eq!(tokenize("20201").unwrap().len(), 1);
        assert!(matches!(
            tokenize("20201").unwrap()[0],
            QueryToken::Classification(_)
        ));
    }

    #[test]
    fn test_short_year_range_uses_century_of_start() {
        // 1999-03 means 1999..1903, which is backwards
        assert!(matches!(
            tokenize("1999-03"),
            Err(TuneCapsuleError::UnsupportedQuery(_))
        ));
        assert_eq!(
            tokenize("2015-19").unwrap(),
            vec![QueryToken::Years(2015, 2019)]
        );
    }

    #[test]
    fn test_tokenize_slot_and_classification() {
        assert_eq!(
            tokenize("UPDATE 2020 3").unwrap(),
            vec![
                QueryToken::Update,
                QueryToken::Years(2020, 2020),
                QueryToken::Slot(3)
            ]
        );
        assert_eq!(
            tokenize("2020 c 🔂  live").unwrap(),
            vec![
                QueryToken::Years(2020, 2020),
                QueryToken::Classification("C 🔂 LIVE".to_string())
            ]
        );
    }

    #[test]
    fn test_classification_swallows_trailing_numbers() {
        assert_eq!(
            tokenize("b 2020").unwrap(),
            vec![QueryToken::Classification("B 2020".to_string())]
        );
    }

    #[test]
    fn test_backwards_range_is_unsupported() {
        assert!(matches!(
            tokenize("2020-2019"),
            Err(TuneCapsuleError::UnsupportedQuery(_))
        ));
    }

    #[test]
    fn test_dispatch_table() {
        assert_eq!(parse_request("update 2020").unwrap(), SeasonRequest::UpdateYear(2020));
        assert_eq!(
            parse_request("update 2018-2020").unwrap(),
            SeasonRequest::UpdateYears {
                min_year: Some(2018),
                max_year: Some(2020)
            }
        );
        assert_eq!(
            parse_request("update").unwrap(),
            SeasonRequest::UpdateYears {
                min_year: None,
                max_year: None
            }
        );
        assert_eq!(
            parse_request("update 2020 b").unwrap(),
            SeasonRequest::ReuploadSet {
                years: YearRange::single(2020),
                classification: "B".to_string()
            }
        );
        assert_eq!(
            parse_request("update 2020 3").unwrap(),
            SeasonRequest::ReuploadSlot {
                years: YearRange::single(2020),
                slot: 3
            }
        );
        assert_eq!(
            parse_request("update 🔂").unwrap(),
            SeasonRequest::ReuploadSet {
                years: YearRange::UNBOUNDED,
                classification: "🔂".to_string()
            }
        );
        assert_eq!(
            parse_request("2020 3").unwrap(),
            SeasonRequest::CreateSlot {
                min_year: 2020,
                max_year: 2020,
                slot: 3
            }
        );
        assert_eq!(
            parse_request("2019-20 a b").unwrap(),
            SeasonRequest::CreateSet {
                years: YearRange::years(2019, 2020),
                classification: "A B".to_string()
            }
        );
        assert_eq!(
            parse_request("🔂").unwrap(),
            SeasonRequest::CreateSet {
                years: YearRange::UNBOUNDED,
                classification: "🔂".to_string()
            }
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        for query in ["", "3", "2020", "2020 2021", "2020 0", "update update", "3 2020"] {
            assert!(
                matches!(
                    parse_request(query),
                    Err(TuneCapsuleError::UnsupportedQuery(_))
                ),
                "'{}' should be unsupported",
                query
            );
        }
    }
}
