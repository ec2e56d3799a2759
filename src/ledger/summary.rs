use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    currency::{round2, usd_to_ars},
    errors::{CajaError, Result},
    utils::text::search_key,
};

use super::comanda::{BusinessState, CashRegister, Comanda, ComandaKind};

/// Inclusive calendar-day window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(CajaError::InvalidInput(format!(
                "range start {from} is after end {to}"
            )));
        }
        Ok(Self { from, to })
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn contains(&self, moment: DateTime<Utc>) -> bool {
        let day = moment.date_naive();
        self.from <= day && day <= self.to
    }
}

/// Aggregates for completed comandas inside a window. Amounts are USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSummary {
    pub range: DateRange,
    pub count: usize,
    pub income_count: usize,
    pub expense_count: usize,
    pub income_total: f64,
    pub expense_total: f64,
    pub net: f64,
    pub validated: usize,
    pub unvalidated: usize,
}

impl RangeSummary {
    pub(crate) fn collect<'a>(range: DateRange, comandas: impl Iterator<Item = &'a Comanda>) -> Self {
        let mut summary = RangeSummary {
            range,
            count: 0,
            income_count: 0,
            expense_count: 0,
            income_total: 0.0,
            expense_total: 0.0,
            net: 0.0,
            validated: 0,
            unvalidated: 0,
        };
        for comanda in comandas
            .filter(|c| c.business_state == BusinessState::Completed && range.contains(c.date))
        {
            summary.count += 1;
            match comanda.kind {
                ComandaKind::Income => {
                    summary.income_count += 1;
                    summary.income_total += comanda.final_total;
                }
                ComandaKind::Expense => {
                    summary.expense_count += 1;
                    summary.expense_total += comanda.final_total;
                }
            }
            if comanda.is_validated() {
                summary.validated += 1;
            } else {
                summary.unvalidated += 1;
            }
        }
        summary.income_total = round2(summary.income_total);
        summary.expense_total = round2(summary.expense_total);
        summary.net = round2(summary.income_total - summary.expense_total);
        summary
    }

    pub fn net_ars(&self, rate: f64) -> f64 {
        round2(usd_to_ars(self.net, rate))
    }
}

/// Criteria for [`Ledger::filter`](super::Ledger::filter); unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ComandaFilter {
    pub business_state: Option<BusinessState>,
    pub validated: Option<bool>,
    pub register: Option<CashRegister>,
    pub kind: Option<ComandaKind>,
    pub client: Option<String>,
    pub staff_id: Option<Uuid>,
    pub range: Option<DateRange>,
}

impl ComandaFilter {
    pub fn matches(&self, comanda: &Comanda) -> bool {
        if let Some(state) = self.business_state {
            if comanda.business_state != state {
                return false;
            }
        }
        if let Some(validated) = self.validated {
            if comanda.is_validated() != validated {
                return false;
            }
        }
        if let Some(register) = self.register {
            if comanda.register != register {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if comanda.kind != kind {
                return false;
            }
        }
        if let Some(needle) = self.client.as_deref() {
            if !search_key(&comanda.client.name).contains(&search_key(needle)) {
                return false;
            }
        }
        if let Some(staff_id) = self.staff_id {
            if comanda.staff_member.id != Some(staff_id) {
                return false;
            }
        }
        match self.range {
            Some(range) => range.contains(comanda.date),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = DateRange::new(day(10), day(2)).unwrap_err();
        assert!(matches!(err, CajaError::InvalidInput(_)));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = DateRange::new(day(2), day(10)).unwrap();
        assert_eq!((range.from(), range.to()), (day(2), day(10)));
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 4, 10, 23, 59, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 4, 11, 0, 0, 0).unwrap()));
        assert_eq!(DateRange::single_day(day(5)).from(), day(5));
    }
}
