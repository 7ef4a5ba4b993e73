// src/parse/detail.rs

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use tracing::{debug, instrument, trace};

use super::table::{cell_text, table_grid};
use crate::error::ScrapeError;
use crate::record::{DrawRecord, PRIMARY_COUNT, PRIMARY_MAX, SECONDARY_MAX, TIERS};

/// Grids longer than this come from the newer layout with extra rows on top.
const LONG_LAYOUT_ROWS: usize = 10;
/// Rows dropped from the top of a long-layout grid.
const LONG_LAYOUT_SKIP: usize = 6;
/// Payout shown for a tier with no winners (the page's jackpot estimate).
pub const EMPTY_TIER_PAYOUT: f64 = 5_000_000.0;
const CELL_PLACEHOLDER: &str = "--";

static DATE_SEL: Lazy<Selector> = Lazy::new(|| sel("span.span_right"));
static RED_SEL: Lazy<Selector> = Lazy::new(|| sel("li.ball_red"));
static BLUE_SEL: Lazy<Selector> = Lazy::new(|| sel("li.ball_blue"));
static PRIZE_TABLE_SEL: Lazy<Selector> = Lazy::new(|| sel("table.kj_tablelist02"));

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digits regex"));
static AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9,-]+元").expect("amount regex"));

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should parse")
}

/// Pull one draw out of a decoded detail page.
///
/// Date, balls and the prize table are mandatory. Sales and pool figures
/// degrade to `None` when the page does not show exactly two amounts.
#[instrument(level = "debug", skip(html), fields(len = html.len()))]
pub fn parse_detail(html: &str) -> Result<DrawRecord, ScrapeError> {
    let doc = Html::parse_document(html);

    let date = parse_date(&doc)?;
    let (primary_numbers, secondary_number) = parse_balls(&doc)?;
    let (sales_amount, pool_carryover) = parse_amounts(html);
    let (prize_tier_counts, prize_tier_amounts) = parse_tiers(&doc)?;

    debug!(%date, sales = ?sales_amount, pool = ?pool_carryover, "parsed draw");
    Ok(DrawRecord {
        date,
        primary_numbers,
        secondary_number,
        sales_amount,
        pool_carryover,
        prize_tier_counts,
        prize_tier_amounts,
    })
}

fn parse_date(doc: &Html) -> Result<NaiveDate, ScrapeError> {
    let header = doc
        .select(&DATE_SEL)
        .next()
        .ok_or_else(|| ScrapeError::parse("date header not found"))?;
    let text: String = header.text().collect();

    let nums: Vec<&str> = DIGITS.find_iter(&text).map(|m| m.as_str()).take(3).collect();
    let [y, m, d] = nums[..] else {
        return Err(ScrapeError::parse(format!(
            "expected year/month/day in {:?}",
            text.trim()
        )));
    };
    let bad = || ScrapeError::parse(format!("invalid date in {:?}", text.trim()));
    let (y, m, d) = (
        y.parse::<i32>().map_err(|_| bad())?,
        m.parse::<u32>().map_err(|_| bad())?,
        d.parse::<u32>().map_err(|_| bad())?,
    );
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(bad)
}

fn parse_balls(doc: &Html) -> Result<(Vec<u8>, u8), ScrapeError> {
    let reds = doc
        .select(&RED_SEL)
        .map(|e| parse_ball(&cell_text(e), PRIMARY_MAX))
        .collect::<Result<Vec<_>, _>>()?;
    if reds.len() != PRIMARY_COUNT {
        return Err(ScrapeError::parse(format!(
            "expected {} red balls, found {}",
            PRIMARY_COUNT,
            reds.len()
        )));
    }

    let blue = doc
        .select(&BLUE_SEL)
        .next()
        .ok_or_else(|| ScrapeError::parse("blue ball not found"))?;
    let blue = parse_ball(&cell_text(blue), SECONDARY_MAX)?;

    trace!(?reds, blue, "balls");
    Ok((reds, blue))
}

fn parse_ball(text: &str, max: u8) -> Result<u8, ScrapeError> {
    let n: u8 = text
        .trim()
        .parse()
        .map_err(|_| ScrapeError::parse(format!("ball {:?} is not a number", text)))?;
    if n == 0 || n > max {
        return Err(ScrapeError::parse(format!("ball {} outside 1..={}", n, max)));
    }
    Ok(n)
}

/// Sales and pool carryover, in page order. Anything other than exactly two
/// well-formed amounts yields `(None, None)`.
pub fn parse_amounts(text: &str) -> (Option<f64>, Option<f64>) {
    let found: Vec<&str> = AMOUNT.find_iter(text).map(|m| m.as_str()).collect();
    let [sales, pool] = found[..] else {
        debug!(matches = found.len(), "sales/pool amounts unavailable");
        return (None, None);
    };
    match (parse_amount(sales), parse_amount(pool)) {
        (Some(sales), Some(pool)) => (sales, pool),
        _ => {
            debug!(sales, pool, "malformed sales/pool amounts");
            (None, None)
        }
    }
}

/// Outer `None` means malformed; inner `None` means the placeholder dash.
fn parse_amount(raw: &str) -> Option<Option<f64>> {
    if raw.contains('-') {
        return Some(None);
    }
    strip_number(raw.trim_end_matches('元'))
        .parse::<f64>()
        .ok()
        .map(Some)
}

fn parse_tiers(doc: &Html) -> Result<(BTreeMap<u8, u64>, BTreeMap<u8, f64>), ScrapeError> {
    let table = doc
        .select(&PRIZE_TABLE_SEL)
        .nth(1)
        .ok_or_else(|| ScrapeError::parse("prize table not found"))?;
    let mut grid = table_grid(table);
    if grid.len() > LONG_LAYOUT_ROWS {
        trace!(rows = grid.len(), "long layout, dropping leading rows");
        grid.drain(..LONG_LAYOUT_SKIP);
    }

    let mut counts = BTreeMap::new();
    let mut amounts = BTreeMap::new();
    for tier in TIERS {
        let row_idx = usize::from(tier) + 1;
        let row = grid
            .get(row_idx)
            .ok_or_else(|| ScrapeError::parse(format!("prize table has no row for tier {}", tier)))?;
        let cell = |col: usize| {
            row.get(col).map(String::as_str).ok_or_else(|| {
                ScrapeError::parse(format!("tier {} row is missing column {}", tier, col))
            })
        };
        counts.insert(tier, tier_count(cell(1)?)?);
        amounts.insert(tier, tier_payout(cell(2)?)?);
    }
    Ok((counts, amounts))
}

fn tier_count(cell: &str) -> Result<u64, ScrapeError> {
    if cell.contains(CELL_PLACEHOLDER) {
        return Ok(0);
    }
    let s = strip_number(cell);
    s.parse::<u64>()
        .or_else(|_| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.fract() == 0.0 && *v >= 0.0)
                .map(|v| v as u64)
                .ok_or(())
        })
        .map_err(|_| ScrapeError::parse(format!("winner count {:?} is not a number", cell)))
}

fn tier_payout(cell: &str) -> Result<f64, ScrapeError> {
    if cell.contains(CELL_PLACEHOLDER) {
        return Ok(EMPTY_TIER_PAYOUT);
    }
    strip_number(cell)
        .parse::<f64>()
        .map_err(|_| ScrapeError::parse(format!("payout {:?} is not a number", cell)))
}

/// Drop thousands separators and whitespace.
fn strip_number(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}
