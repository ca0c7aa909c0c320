//! Raw form input and its conversion into a request.
//!
//! Every field holds the text the user typed, exactly as a browser input
//! would. Nothing is validated here: numbers are parsed on collection and a
//! value that does not parse is forwarded as NaN.

use crate::benchmarks::BenchmarkSelector;
use crate::catalog::{BenchmarkCatalog, FundCatalog};
use crate::config::Settings;
use crate::model::BacktestRequest;

pub const CURRENCIES: &[&str] = &["USD", "INR"];
pub const REBALANCE_OPTIONS: &[&str] = &["Annual", "None"];

/// Focusable form controls, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Fund,
    StartDate,
    EndDate,
    StartAmount,
    Currency,
    Rebalance,
    FeeToggle,
    FeeValue,
    RfRate,
    Benchmarks,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Fund,
        Field::StartDate,
        Field::EndDate,
        Field::StartAmount,
        Field::Currency,
        Field::Rebalance,
        Field::FeeToggle,
        Field::FeeValue,
        Field::RfRate,
        Field::Benchmarks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Fund => "Fund",
            Field::StartDate => "Start date",
            Field::EndDate => "End date",
            Field::StartAmount => "Starting amount",
            Field::Currency => "Currency",
            Field::Rebalance => "Rebalance",
            Field::FeeToggle => "Apply fee",
            Field::FeeValue => "Annual fee",
            Field::RfRate => "Risk-free rate",
            Field::Benchmarks => "Benchmarks",
        }
    }

    fn position(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Field {
        Field::ALL[(self.position() + 1) % Field::ALL.len()]
    }

    pub fn prev(self) -> Field {
        Field::ALL[(self.position() + Field::ALL.len() - 1) % Field::ALL.len()]
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    pub fund_id: String,
    pub start_date: String,
    pub end_date: String,
    pub start_amount: String,
    pub currency: String,
    pub rebalance: String,
    pub fee_enabled: bool,
    pub fee_value: String,
    pub rf_rate: String,
    pub benchmarks: BenchmarkSelector,
}

/// Numeric coercion used for every number field.
///
/// Reads the longest leading decimal literal after any leading whitespace,
/// so `"1.2.3"` is 1.2 and `"12k"` is 12. `Infinity` is the only spelled-out
/// value accepted. Text with no numeric prefix becomes NaN.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.trim_start();
    let end = numeric_prefix_len(s);
    if end == 0 {
        return f64::NAN;
    }
    let prefix = &s[..end];
    if let Some(sign) = prefix.strip_suffix("Infinity") {
        return if sign == "-" {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    prefix.parse::<f64>().unwrap_or(f64::NAN)
}

/// Byte length of the leading `[+-]?(digits[.digits]|.digits)(e[+-]?digits)?`
/// or `[+-]?Infinity`; zero when there is none.
fn numeric_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = 0;
    if matches!(b.first(), Some(b'+' | b'-')) {
        i = 1;
    }
    if s[i..].starts_with("Infinity") {
        return i + "Infinity".len();
    }

    let int_end = digits_from(i);
    let mut end = int_end;
    if b.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if int_end > i || frac_end > end + 1 {
            end = frac_end;
        }
    }
    if end == i {
        return 0;
    }

    if matches!(b.get(end), Some(b'e' | b'E')) {
        let mut j = end + 1;
        if matches!(b.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits_from(j);
        if exp_end > j {
            end = exp_end;
        }
    }
    end
}

impl FormState {
    pub fn new(
        settings: &Settings,
        today: time::Date,
        funds: &FundCatalog,
        benchmarks: &BenchmarkCatalog,
    ) -> Self {
        let (start_date, end_date) = settings.window(today);
        let mut form = Self {
            fund_id: settings.fund_id.clone(),
            start_date,
            end_date,
            start_amount: settings.start_amount.to_string(),
            currency: settings.currency.clone(),
            rebalance: settings.rebalance.clone(),
            fee_enabled: settings.fee_toggle,
            fee_value: settings.fee_value.to_string(),
            rf_rate: settings.rf_rate.to_string(),
            benchmarks: BenchmarkSelector::new(benchmarks, &settings.benchmarks),
        };
        let fund_id = form.fund_id.clone();
        form.select_fund(&fund_id, funds);
        form
    }

    /// Switch fund and copy its default fee into the fee field. An id with
    /// no catalog entry leaves the fee untouched.
    pub fn select_fund(&mut self, id: &str, funds: &FundCatalog) {
        self.fund_id = id.to_string();
        if let Some(meta) = funds.get(id) {
            self.fee_value = meta.default_fee.to_string();
        }
    }

    /// Step through the catalog in id order.
    pub fn cycle_fund(&mut self, funds: &FundCatalog, forward: bool) {
        let ids: Vec<&str> = funds.ids().collect();
        if ids.is_empty() {
            return;
        }
        let pos = ids.iter().position(|id| *id == self.fund_id);
        let next = match (pos, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % ids.len(),
            (Some(i), false) => (i + ids.len() - 1) % ids.len(),
        };
        let id = ids[next].to_string();
        self.select_fund(&id, funds);
    }

    /// Disabling the fee only locks the input; its text is kept.
    pub fn set_fee_enabled(&mut self, enabled: bool) {
        self.fee_enabled = enabled;
    }

    pub fn is_editable(&self, field: Field) -> bool {
        match field {
            Field::FeeValue => self.fee_enabled,
            _ => true,
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        if !self.is_editable(field) {
            return None;
        }
        match field {
            Field::StartDate => Some(&mut self.start_date),
            Field::EndDate => Some(&mut self.end_date),
            Field::StartAmount => Some(&mut self.start_amount),
            Field::FeeValue => Some(&mut self.fee_value),
            Field::RfRate => Some(&mut self.rf_rate),
            _ => None,
        }
    }

    /// Append a typed character to a text field. Returns `false` when the
    /// field is not a text input or is disabled.
    pub fn push_char(&mut self, field: Field, c: char) -> bool {
        match self.text_mut(field) {
            Some(text) => {
                text.push(c);
                true
            }
            None => false,
        }
    }

    pub fn pop_char(&mut self, field: Field) -> bool {
        match self.text_mut(field) {
            Some(text) => text.pop().is_some(),
            None => false,
        }
    }

    /// Cycle a select-style field (currency, rebalance).
    pub fn cycle_option(&mut self, field: Field, forward: bool) {
        let (options, value) = match field {
            Field::Currency => (CURRENCIES, &mut self.currency),
            Field::Rebalance => (REBALANCE_OPTIONS, &mut self.rebalance),
            _ => return,
        };
        let pos = options.iter().position(|o| *o == value.as_str());
        let next = match (pos, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % options.len(),
            (Some(i), false) => (i + options.len() - 1) % options.len(),
        };
        *value = options[next].to_string();
    }

    /// Build a fresh request from the current input.
    pub fn collect(&self) -> BacktestRequest {
        BacktestRequest {
            fund_id: self.fund_id.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            start_amount: parse_number(&self.start_amount),
            currency: self.currency.clone(),
            rebalance: self.rebalance.clone(),
            fee_toggle: self.fee_enabled,
            fee_value: parse_number(&self.fee_value),
            rf_rate: parse_number(&self.rf_rate),
            benchmarks: self.benchmarks.selected_ids(),
        }
    }
}
