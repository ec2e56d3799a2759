use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    currency::{convert, round2, usd_to_ars, Currency},
    discounts::PaymentMethod,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BusinessState {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "completado")]
    Completed,
    #[serde(rename = "incompleto")]
    Incomplete,
}

impl BusinessState {
    pub fn label(&self) -> &'static str {
        match self {
            BusinessState::Pending => "pendiente",
            BusinessState::Completed => "completado",
            BusinessState::Incomplete => "incompleto",
        }
    }

    /// Forward-only moves: pending may complete or stall, a stalled comanda may
    /// still complete.
    pub fn can_transition_to(&self, next: BusinessState) -> bool {
        matches!(
            (self, next),
            (BusinessState::Pending, BusinessState::Completed)
                | (BusinessState::Pending, BusinessState::Incomplete)
                | (BusinessState::Incomplete, BusinessState::Completed)
        )
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pendiente" | "pending" => Some(BusinessState::Pending),
            "completado" | "completo" | "completed" => Some(BusinessState::Completed),
            "incompleto" | "incomplete" => Some(BusinessState::Incomplete),
            _ => None,
        }
    }
}

impl fmt::Display for BusinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "estado")]
pub enum ValidationState {
    #[serde(rename = "no_validado")]
    Unvalidated,
    #[serde(rename = "validado")]
    Validated { by: String, at: DateTime<Utc> },
}

impl ValidationState {
    pub fn is_validated(&self) -> bool {
        matches!(self, ValidationState::Validated { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ValidationState::Unvalidated => "no_validado",
            ValidationState::Validated { .. } => "validado",
        }
    }
}

impl Default for ValidationState {
    fn default() -> Self {
        ValidationState::Unvalidated
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ComandaKind {
    #[default]
    #[serde(rename = "ingreso")]
    Income,
    #[serde(rename = "egreso")]
    Expense,
}

impl ComandaKind {
    pub fn label(&self) -> &'static str {
        match self {
            ComandaKind::Income => "ingreso",
            ComandaKind::Expense => "egreso",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ingreso" | "income" => Some(ComandaKind::Income),
            "egreso" | "expense" => Some(ComandaKind::Expense),
            _ => None,
        }
    }
}

/// The two parallel cash contexts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum CashRegister {
    #[default]
    #[serde(rename = "caja_chica")]
    Petty,
    #[serde(rename = "caja_grande")]
    Main,
}

impl CashRegister {
    pub fn label(&self) -> &'static str {
        match self {
            CashRegister::Petty => "caja_chica",
            CashRegister::Main => "caja_grande",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "caja_chica" | "chica" | "petty" => Some(CashRegister::Petty),
            "caja_grande" | "grande" | "main" => Some(CashRegister::Main),
            _ => None,
        }
    }
}

impl fmt::Display for CashRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Client or staff member as referenced from a comanda.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PartyRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
}

impl PartyRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    pub fn with_id(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ItemKind {
    #[serde(rename = "producto")]
    Product,
    #[serde(rename = "servicio")]
    Service,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Product => "producto",
            ItemKind::Service => "servicio",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "producto" | "product" => Some(ItemKind::Product),
            "servicio" | "service" => Some(ItemKind::Service),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<Uuid>,
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub discount_pct: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub subtotal: f64,
}

impl LineItem {
    pub fn new(
        kind: ItemKind,
        name: impl Into<String>,
        quantity: u32,
        unit_price: f64,
        discount_pct: f64,
    ) -> Self {
        let mut item = Self {
            kind,
            item_id: None,
            name: name.into(),
            quantity,
            unit_price,
            discount_pct,
            discount_amount: 0.0,
            subtotal: 0.0,
        };
        item.recalculate();
        item
    }

    pub fn gross(&self) -> f64 {
        round2(self.quantity as f64 * self.unit_price)
    }

    pub fn recalculate(&mut self) {
        self.discount_pct = if self.discount_pct.is_finite() {
            round2(self.discount_pct.clamp(0.0, 100.0))
        } else {
            0.0
        };
        let gross = self.gross();
        self.discount_amount = round2(gross * self.discount_pct / 100.0);
        self.subtotal = round2(gross - self.discount_amount);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount: f64,
    pub currency: Currency,
}

impl Payment {
    pub fn amount_usd(&self, rate: f64) -> f64 {
        convert(self.amount, self.currency, Currency::Usd, rate)
    }
}

/// Portion of a client's seña applied to a comanda.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DepositApplication {
    pub currency: Currency,
    pub amount: f64,
    pub amount_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comanda {
    pub id: Uuid,
    pub number: String,
    pub date: DateTime<Utc>,
    pub business_unit: String,
    #[serde(default)]
    pub register: CashRegister,
    pub client: PartyRef,
    pub staff_member: PartyRef,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposit: Option<DepositApplication>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub subtotal: f64,
    pub total_discounts: f64,
    pub total_deposit: f64,
    pub final_total: f64,
    pub business_state: BusinessState,
    #[serde(rename = "validationState")]
    pub validation: ValidationState,
    pub kind: ComandaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferred_in: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Comanda {
    pub fn new(
        date: DateTime<Utc>,
        business_unit: impl Into<String>,
        client: PartyRef,
        staff_member: PartyRef,
        kind: ComandaKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: String::new(),
            date,
            business_unit: business_unit.into(),
            register: CashRegister::default(),
            client,
            staff_member,
            line_items: Vec::new(),
            deposit: None,
            payments: Vec::new(),
            subtotal: 0.0,
            total_discounts: 0.0,
            total_deposit: 0.0,
            final_total: 0.0,
            business_state: BusinessState::Pending,
            validation: ValidationState::Unvalidated,
            kind,
            transferred_in: None,
            notes: None,
        }
    }

    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self.recalculate();
        self
    }

    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payments.push(payment);
        self
    }

    pub fn is_validated(&self) -> bool {
        self.validation.is_validated()
    }

    /// Recomputes line and comanda totals from the line items and deposit.
    pub fn recalculate(&mut self) {
        for item in &mut self.line_items {
            item.recalculate();
        }
        self.subtotal = round2(self.line_items.iter().map(LineItem::gross).sum());
        self.total_discounts = round2(self.line_items.iter().map(|i| i.discount_amount).sum());
        self.total_deposit = self
            .deposit
            .as_ref()
            .map(|deposit| round2(deposit.amount_usd))
            .unwrap_or(0.0);
        self.final_total =
            round2((self.subtotal - self.total_discounts - self.total_deposit).max(0.0));
    }

    /// `final_total` with income positive and expense negative.
    pub fn signed_total(&self) -> f64 {
        match self.kind {
            ComandaKind::Income => self.final_total,
            ComandaKind::Expense => -self.final_total,
        }
    }

    pub fn final_total_ars(&self, rate: f64) -> f64 {
        round2(usd_to_ars(self.final_total, rate))
    }

    pub fn paid_usd(&self, rate: f64) -> f64 {
        round2(self.payments.iter().map(|p| p.amount_usd(rate)).sum())
    }

    /// Outstanding USD after registered payments; negative means overpaid.
    pub fn balance_due(&self, rate: f64) -> f64 {
        round2(self.final_total - self.paid_usd(rate))
    }

    pub fn primary_method(&self) -> Option<PaymentMethod> {
        self.payments.first().map(|payment| payment.method)
    }
}
