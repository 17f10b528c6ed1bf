//! Relative date-range windows resolved to concrete boundary predicates.
//!
//! Every variant has a closed-form boundary computation relative to an
//! anchor date. `previous = true` shifts the whole window back by exactly
//! one period length, which is how comparison baselines are built. Weeks
//! start on Monday; boundary predicates are inclusive on both ends.

use crate::error::CompileError;
use crate::rel::{CmpOp, Literal, Predicate, ScalarExpr};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// The closed set of relative windows offered by the dashboard and the
/// FILTER date comparator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Yesterday,
    Tomorrow,
    ThisWeek,
    ThisWeekToDate,
    LastWeek,
    LastWeekToDate,
    ThisMonth,
    ThisMonthToDate,
    LastMonth,
    LastMonthToDate,
    ThisQuarter,
    ThisQuarterToDate,
    LastQuarter,
    LastQuarterToDate,
    ThisYear,
    ThisYearToDate,
    LastYear,
    LastYearToDate,
    Last7Days,
    Last14Days,
    Last28Days,
    Last30Days,
    Last90Days,
    Last180Days,
    Last12Months,
    LastFull12Months,
    Custom {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// One period length, used to shift a window back for `previous`.
#[derive(Debug, Clone, Copy)]
enum Period {
    Days(i64),
    Months(u32),
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

fn month_len(year: i32, month: u32) -> u32 {
    let (next_y, next_m) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    (ymd(next_y, next_m, 1) - Duration::days(1)).day()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    ymd(date.year(), date.month(), 1)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    ymd(date.year(), date.month(), month_len(date.year(), date.month()))
}

/// Shifts a date back by whole calendar months, clamping the day.
fn months_back(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month() as i32 - 1 - months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(month_len(year, month));
    ymd(year, month, day)
}

/// Monday of the anchor's ISO week.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Quarter index in 1..=4.
pub fn quarter(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// First month of the quarter containing `date`.
pub fn quarter_start_month(date: NaiveDate) -> u32 {
    (quarter(date) - 1) * 3 + 1
}

fn quarter_start(date: NaiveDate) -> NaiveDate {
    ymd(date.year(), quarter_start_month(date), 1)
}

fn quarter_end(date: NaiveDate) -> NaiveDate {
    let start_month = quarter_start_month(date);
    last_of_month(ymd(date.year(), start_month + 2, 1))
}

impl DateRange {
    /// Rolling last-N-days count for the fixed-length variants.
    fn rolling_days(&self) -> Option<i64> {
        match self {
            DateRange::Last7Days => Some(7),
            DateRange::Last14Days => Some(14),
            DateRange::Last28Days => Some(28),
            DateRange::Last30Days => Some(30),
            DateRange::Last90Days => Some(90),
            DateRange::Last180Days => Some(180),
            _ => None,
        }
    }

    fn period(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Period, CompileError> {
        if let Some(days) = self.rolling_days() {
            return Ok(Period::Days(days));
        }
        let period = match self {
            DateRange::Today | DateRange::Yesterday | DateRange::Tomorrow => Period::Days(1),
            DateRange::ThisWeek
            | DateRange::ThisWeekToDate
            | DateRange::LastWeek
            | DateRange::LastWeekToDate => Period::Days(7),
            DateRange::ThisMonth
            | DateRange::ThisMonthToDate
            | DateRange::LastMonth
            | DateRange::LastMonthToDate => Period::Months(1),
            DateRange::ThisQuarter
            | DateRange::ThisQuarterToDate
            | DateRange::LastQuarter
            | DateRange::LastQuarterToDate => Period::Months(3),
            DateRange::ThisYear
            | DateRange::ThisYearToDate
            | DateRange::LastYear
            | DateRange::LastYearToDate
            | DateRange::Last12Months
            | DateRange::LastFull12Months => Period::Months(12),
            DateRange::Custom { .. } => match (start, end) {
                (Some(start), Some(end)) => Period::Days((end - start).num_days() + 1),
                _ => {
                    return Err(CompileError::BadConfig(
                        "a previous-period comparison requires a bounded custom range".into(),
                    ))
                }
            },
            _ => unreachable!("rolling variants handled above"),
        };
        Ok(period)
    }

    /// Inclusive window bounds for this range relative to `anchor`.
    pub fn bounds(
        &self,
        anchor: NaiveDate,
        previous: bool,
    ) -> Result<(Option<NaiveDate>, Option<NaiveDate>), CompileError> {
        let (start, end) = if let Some(n) = self.rolling_days() {
            (
                Some(anchor - Duration::days(2 * n)),
                Some(anchor - Duration::days(n)),
            )
        } else {
            match self {
                DateRange::Today => (Some(anchor), Some(anchor)),
                DateRange::Yesterday => {
                    let d = anchor - Duration::days(1);
                    (Some(d), Some(d))
                }
                DateRange::Tomorrow => {
                    let d = anchor + Duration::days(1);
                    (Some(d), Some(d))
                }
                DateRange::ThisWeek => {
                    let monday = week_start(anchor);
                    (Some(monday), Some(monday + Duration::days(6)))
                }
                DateRange::ThisWeekToDate => (Some(week_start(anchor)), Some(anchor)),
                DateRange::LastWeek => {
                    let monday = week_start(anchor) - Duration::days(7);
                    (Some(monday), Some(monday + Duration::days(6)))
                }
                DateRange::LastWeekToDate => (
                    Some(week_start(anchor) - Duration::days(7)),
                    Some(anchor - Duration::days(7)),
                ),
                DateRange::ThisMonth => (Some(first_of_month(anchor)), Some(last_of_month(anchor))),
                DateRange::ThisMonthToDate => (Some(first_of_month(anchor)), Some(anchor)),
                DateRange::LastMonth => {
                    let prev = months_back(anchor, 1);
                    (Some(first_of_month(prev)), Some(last_of_month(prev)))
                }
                DateRange::LastMonthToDate => {
                    let prev = months_back(anchor, 1);
                    (Some(first_of_month(prev)), Some(prev))
                }
                DateRange::ThisQuarter => (Some(quarter_start(anchor)), Some(quarter_end(anchor))),
                DateRange::ThisQuarterToDate => (Some(quarter_start(anchor)), Some(anchor)),
                DateRange::LastQuarter => {
                    let prev = months_back(quarter_start(anchor), 1);
                    (Some(quarter_start(prev)), Some(quarter_end(prev)))
                }
                DateRange::LastQuarterToDate => {
                    let prev = months_back(anchor, 3);
                    (Some(quarter_start(prev)), Some(prev))
                }
                DateRange::ThisYear => (
                    Some(ymd(anchor.year(), 1, 1)),
                    Some(ymd(anchor.year(), 12, 31)),
                ),
                DateRange::ThisYearToDate => (Some(ymd(anchor.year(), 1, 1)), Some(anchor)),
                DateRange::LastYear => (
                    Some(ymd(anchor.year() - 1, 1, 1)),
                    Some(ymd(anchor.year() - 1, 12, 31)),
                ),
                DateRange::LastYearToDate => (
                    Some(ymd(anchor.year() - 1, 1, 1)),
                    Some(months_back(anchor, 12)),
                ),
                DateRange::Last12Months => (Some(months_back(anchor, 12)), Some(anchor)),
                DateRange::LastFull12Months => (
                    Some(first_of_month(months_back(anchor, 12))),
                    Some(last_of_month(months_back(anchor, 1))),
                ),
                DateRange::Custom { start, end } => {
                    if start.is_none() && end.is_none() {
                        return Err(CompileError::BadConfig(
                            "a custom date range requires a start or end date".into(),
                        ));
                    }
                    (*start, *end)
                }
                _ => unreachable!("rolling variants handled above"),
            }
        };

        if !previous {
            return Ok((start, end));
        }
        let period = self.period(start, end)?;
        let shift = |bound: Option<NaiveDate>| {
            bound.map(|d| match period {
                Period::Days(days) => d - Duration::days(days),
                Period::Months(months) => months_back(d, months),
            })
        };
        Ok((shift(start), shift(end)))
    }
}

/// Resolves a range to a boundary predicate over `column`: `>=`, `<=`, or
/// the conjunction of both.
pub fn slice(
    range: &DateRange,
    column: &str,
    anchor: NaiveDate,
    previous: bool,
) -> Result<Predicate, CompileError> {
    let (start, end) = range.bounds(anchor, previous)?;
    let col = || ScalarExpr::column(column);
    let lower = start.map(|d| ScalarExpr::cmp(CmpOp::Ge, col(), ScalarExpr::literal(Literal::Date(d))));
    let upper = end.map(|d| ScalarExpr::cmp(CmpOp::Le, col(), ScalarExpr::literal(Literal::Date(d))));
    match (lower, upper) {
        (Some(lower), Some(upper)) => Ok(ScalarExpr::and(lower, upper)),
        (Some(lower), None) => Ok(lower),
        (None, Some(upper)) => Ok(upper),
        (None, None) => Err(CompileError::BadConfig(
            "a custom date range requires a start or end date".into(),
        )),
    }
}
