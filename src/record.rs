// src/record.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of red balls drawn per game.
pub const PRIMARY_COUNT: usize = 6;
pub const PRIMARY_MAX: u8 = 33;
pub const SECONDARY_MAX: u8 = 16;

/// Prize tiers are numbered 1 (jackpot) through 6.
pub const TIERS: std::ops::RangeInclusive<u8> = 1..=6;

/// One draw as read off its detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRecord {
    pub date: NaiveDate,
    /// Red balls, in page order.
    pub primary_numbers: Vec<u8>,
    /// Blue ball.
    pub secondary_number: u8,
    /// `None` when the page shows a placeholder.
    pub sales_amount: Option<f64>,
    pub pool_carryover: Option<f64>,
    /// Tier → number of winning tickets.
    pub prize_tier_counts: BTreeMap<u8, u64>,
    /// Tier → payout per winning ticket.
    pub prize_tier_amounts: BTreeMap<u8, f64>,
}

impl DrawRecord {
    /// Red balls joined for display, e.g. `03 07 12 19 25 31 + 09`.
    pub fn numbers_line(&self) -> String {
        let reds: Vec<String> = self
            .primary_numbers
            .iter()
            .map(|n| format!("{:02}", n))
            .collect();
        format!("{} + {:02}", reds.join(" "), self.secondary_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_line_pads_digits() {
        let rec = DrawRecord {
            date: NaiveDate::from_ymd_opt(2019, 1, 3).unwrap(),
            primary_numbers: vec![3, 7, 12, 19, 25, 31],
            secondary_number: 9,
            sales_amount: None,
            pool_carryover: None,
            prize_tier_counts: BTreeMap::new(),
            prize_tier_amounts: BTreeMap::new(),
        };
        assert_eq!(rec.numbers_line(), "03 07 12 19 25 31 + 09");
    }
}
