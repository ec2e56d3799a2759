use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::comanda::CashRegister;

/// Record of validated comandas moved from one register to another.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Traspaso {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub from: CashRegister,
    pub to: CashRegister,
    pub comanda_ids: Vec<Uuid>,
    /// Net USD moved (income minus expense).
    pub total_usd: f64,
    pub total_ars: f64,
    pub rate: f64,
    pub actor: String,
}
