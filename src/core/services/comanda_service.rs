//! Ledger operations performed on behalf of an operator session.
//!
//! Every successful mutation is persisted and written to the activity log.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    activity::{ActivityAction, ActivityLog},
    core::{
        clock::Clock,
        services::{MovementSubmitter, ServiceError, ServiceResult},
    },
    currency::{convert, format_usd, round2, Currency},
    directory::{Client, Directory},
    errors::{CajaError, Result},
    ledger::{
        load_ledger, permissions, save_ledger, BusinessState, CashRegister, Comanda, DateRange,
        DepositApplication, Ledger, RangeSummary, Session, Traspaso,
    },
    rates::SharedRate,
    storage::StateStore,
};

pub struct ComandaService {
    ledger: Ledger,
    activity: ActivityLog,
    storage: Arc<dyn StateStore>,
    session: Session,
    clock: Arc<dyn Clock>,
    rate: SharedRate,
    submitter: MovementSubmitter,
}

impl ComandaService {
    /// Loads the persisted ledger, rewriting it when migration or
    /// deduplication changed anything.
    pub fn open(
        storage: Arc<dyn StateStore>,
        activity_capacity: usize,
        session: Session,
        clock: Arc<dyn Clock>,
        rate: SharedRate,
    ) -> ServiceResult<Self> {
        let report = load_ledger(storage.as_ref())?;
        if report.migrated > 0 || report.duplicates_removed > 0 {
            tracing::info!(
                migrated = report.migrated,
                duplicates = report.duplicates_removed,
                from_schema = report.from_schema,
                "ledger upgraded on load"
            );
            save_ledger(storage.as_ref(), &report.ledger, Some("migracion"))?;
        }
        let activity = ActivityLog::load(storage.clone(), activity_capacity)?;
        Ok(Self {
            ledger: report.ledger,
            activity,
            storage,
            session,
            clock,
            rate,
            submitter: MovementSubmitter::new(),
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn set_session(&mut self, session: Session) {
        tracing::info!(actor = %session.actor, role = %session.role, "session changed");
        self.session = session;
    }

    pub fn submitter(&self) -> &MovementSubmitter {
        &self.submitter
    }

    pub fn current_rate(&self) -> f64 {
        self.rate.sell_value()
    }

    fn resolve(&self, number_or_id: &str) -> ServiceResult<Uuid> {
        if let Ok(id) = Uuid::parse_str(number_or_id.trim()) {
            if self.ledger.comanda(id).is_some() {
                return Ok(id);
            }
        }
        self.ledger
            .find_by_number(number_or_id)
            .map(|c| c.id)
            .ok_or_else(|| ServiceError::Invalid(format!("Comanda `{number_or_id}` not found")))
    }

    /// Accepts either a comanda number (`"00012"`, `"12"`) or its UUID.
    pub fn find(&self, number_or_id: &str) -> ServiceResult<&Comanda> {
        let id = self.resolve(number_or_id)?;
        self.ledger
            .comanda(id)
            .ok_or_else(|| ServiceError::Invalid(format!("Comanda `{number_or_id}` not found")))
    }

    /// Saves `draft` and only then makes it the current ledger. The activity
    /// entry is best effort once the ledger is stored.
    fn commit(
        &mut self,
        draft: Ledger,
        action: ActivityAction,
        description: String,
        reference: Option<String>,
    ) -> Result<()> {
        save_ledger(self.storage.as_ref(), &draft, Some(action_note(action)))?;
        self.ledger = draft;
        let now = self.clock.now();
        if let Err(err) = self
            .activity
            .record(&self.session.actor, action, description, reference, now)
        {
            tracing::warn!(error = %err, ?action, "activity entry not persisted");
        }
        Ok(())
    }

    /// Registers a new comanda through the submission guard.
    pub fn create(&mut self, comanda: Comanda) -> ServiceResult<Uuid> {
        let ticket = self.submitter.begin()?;
        let outcome = self.insert(comanda);
        match self.submitter.finish(ticket, outcome)? {
            Some(id) => Ok(id),
            None => Err(ServiceError::Invalid("submission was superseded".into())),
        }
    }

    fn insert(&mut self, comanda: Comanda) -> Result<Uuid> {
        let mut draft = self.ledger.clone();
        let id = draft.add(comanda)?;
        let (number, total) = draft
            .comanda(id)
            .map(|c| (c.number.clone(), c.final_total))
            .unwrap_or_default();
        self.commit(
            draft,
            ActivityAction::ComandaCreated,
            format!("Comanda {number} por {}", format_usd(total)),
            Some(number),
        )?;
        Ok(id)
    }

    pub fn edit<F>(&mut self, number_or_id: &str, mutator: F) -> ServiceResult<()>
    where
        F: FnOnce(&mut Comanda),
    {
        let id = self.resolve(number_or_id)?;
        let mut draft = self.ledger.clone();
        draft.edit(id, &self.session, mutator)?;
        let number = number_in(&draft, id);
        self.commit(
            draft,
            ActivityAction::ComandaEdited,
            format!("Comanda {number} editada"),
            Some(number),
        )?;
        Ok(())
    }

    pub fn set_business_state(&mut self, number_or_id: &str, next: BusinessState) -> ServiceResult<()> {
        let id = self.resolve(number_or_id)?;
        let mut draft = self.ledger.clone();
        draft.set_business_state(id, &self.session, next)?;
        let number = number_in(&draft, id);
        self.commit(
            draft,
            ActivityAction::ComandaStateChanged,
            format!("Comanda {number} pasó a {}", next.label()),
            Some(number),
        )?;
        Ok(())
    }

    pub fn validate(&mut self, number_or_id: &str) -> ServiceResult<()> {
        let id = self.resolve(number_or_id)?;
        let now = self.clock.now();
        let mut draft = self.ledger.clone();
        draft.validate(id, &self.session, now)?;
        let number = number_in(&draft, id);
        self.commit(
            draft,
            ActivityAction::ComandaValidated,
            format!("Comanda {number} validada"),
            Some(number),
        )?;
        Ok(())
    }

    pub fn validate_range(&mut self, range: DateRange) -> ServiceResult<Vec<Uuid>> {
        let now = self.clock.now();
        let mut draft = self.ledger.clone();
        let ids = draft.validate_range(range, &self.session, now)?;
        if !ids.is_empty() {
            self.commit(
                draft,
                ActivityAction::RangeValidated,
                format!(
                    "{} comandas validadas ({} a {})",
                    ids.len(),
                    range.from(),
                    range.to()
                ),
                None,
            )?;
        }
        Ok(ids)
    }

    pub fn delete(&mut self, number_or_id: &str) -> ServiceResult<Comanda> {
        let id = self.resolve(number_or_id)?;
        let mut draft = self.ledger.clone();
        let removed = draft.remove(id, &self.session)?;
        self.commit(
            draft,
            ActivityAction::ComandaDeleted,
            format!("Comanda {} eliminada", removed.number),
            Some(removed.number.clone()),
        )?;
        Ok(removed)
    }

    pub fn reverse_validation(&mut self, number_or_id: &str, reason: &str) -> ServiceResult<()> {
        let id = self.resolve(number_or_id)?;
        let mut draft = self.ledger.clone();
        draft.reverse_validation(id, &self.session, reason)?;
        let number = number_in(&draft, id);
        self.commit(
            draft,
            ActivityAction::ValidationReversed,
            format!("Validación de comanda {number} revertida: {}", reason.trim()),
            Some(number),
        )?;
        Ok(())
    }

    pub fn transfer(
        &mut self,
        from: CashRegister,
        to: CashRegister,
        range: DateRange,
    ) -> ServiceResult<Traspaso> {
        let rate = self.current_rate();
        let now = self.clock.now();
        let mut draft = self.ledger.clone();
        let traspaso = draft.transfer_validated(from, to, range, rate, &self.session, now)?;
        self.commit(
            draft,
            ActivityAction::Traspaso,
            format!(
                "Traspaso de {} comandas de {} a {} por {}",
                traspaso.comanda_ids.len(),
                from,
                to,
                format_usd(traspaso.total_usd)
            ),
            Some(traspaso.id.to_string()),
        )?;
        Ok(traspaso)
    }

    /// Draws `amount` from the client's seña and applies it to the comanda.
    /// ARS deposits are converted with the current rate. When the ledger
    /// cannot be saved the seña is returned to the client.
    pub fn apply_deposit(
        &mut self,
        number_or_id: &str,
        clients: &mut Directory<Client>,
        client_id: Uuid,
        currency: Currency,
        amount: f64,
    ) -> ServiceResult<DepositApplication> {
        let id = self.resolve(number_or_id)?;
        let comanda = self
            .ledger
            .comanda(id)
            .ok_or_else(|| ServiceError::Invalid(format!("Comanda `{number_or_id}` not found")))?;
        if !permissions(self.session.role, &comanda.validation).can_edit {
            return Err(CajaError::Immutable(comanda.number.clone()).into());
        }
        if comanda.deposit.is_some() {
            return Err(ServiceError::Invalid(format!(
                "Comanda {} already has a deposit applied",
                comanda.number
            )));
        }

        let application = DepositApplication {
            currency,
            amount,
            amount_usd: round2(convert(amount, currency, Currency::Usd, self.current_rate())),
        };
        let applied = application.clone();
        let mut draft = self.ledger.clone();
        draft.edit(id, &self.session, move |c| c.deposit = Some(applied))?;
        let number = number_in(&draft, id);

        clients.try_update(client_id, |client| client.consume_deposit(currency, amount))?;
        let committed = self.commit(
            draft,
            ActivityAction::DepositApplied,
            format!("Seña de {amount:.2} {currency} aplicada a comanda {number}"),
            Some(number),
        );
        if let Err(err) = committed {
            if let Err(refund) =
                clients.try_update(client_id, |client| client.add_deposit(currency, amount))
            {
                tracing::error!(error = %refund, %client_id, "seña could not be returned to client");
            }
            return Err(err.into());
        }
        Ok(application)
    }

    pub fn deduplicate(&mut self) -> ServiceResult<usize> {
        let mut draft = self.ledger.clone();
        let removed = draft.deduplicate();
        if removed > 0 {
            save_ledger(self.storage.as_ref(), &draft, Some("dedupe"))?;
            self.ledger = draft;
        }
        Ok(removed)
    }

    pub fn summarize(&self, range: DateRange) -> RangeSummary {
        self.ledger.summarize_range(range)
    }

    /// Adds an entry for actions performed outside the ledger (rate or
    /// discount changes, exports).
    pub fn record_activity(
        &mut self,
        action: ActivityAction,
        description: impl Into<String>,
        reference: Option<String>,
    ) -> ServiceResult<()> {
        let now = self.clock.now();
        self.activity
            .record(&self.session.actor, action, description, reference, now)?;
        Ok(())
    }
}

fn number_in(ledger: &Ledger, id: Uuid) -> String {
    ledger
        .comanda(id)
        .map(|c| c.number.clone())
        .unwrap_or_else(|| id.to_string())
}

fn action_note(action: ActivityAction) -> &'static str {
    match action {
        ActivityAction::ComandaCreated => "alta",
        ActivityAction::ComandaEdited => "edicion",
        ActivityAction::ComandaStateChanged => "estado",
        ActivityAction::ComandaValidated | ActivityAction::RangeValidated => "validacion",
        ActivityAction::ComandaDeleted => "baja",
        ActivityAction::ValidationReversed => "reversion",
        ActivityAction::Traspaso => "traspaso",
        ActivityAction::DepositApplied => "sena",
        _ => "cambio",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::clock::FixedClock,
        ledger::{ComandaKind, ItemKind, LineItem, PartyRef, Role},
        storage::MemoryStorage,
    };
    use chrono::{TimeZone, Utc};

    fn service(role: Role) -> ComandaService {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0).unwrap());
        ComandaService::open(
            Arc::new(MemoryStorage::new()),
            100,
            Session::new("ana", role),
            Arc::new(clock),
            SharedRate::default(),
        )
        .unwrap()
    }

    fn comanda() -> Comanda {
        Comanda::new(
            Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap(),
            "peluqueria",
            PartyRef::named("Carla"),
            PartyRef::named("Ana"),
            ComandaKind::Income,
        )
        .with_line_item(LineItem::new(ItemKind::Service, "Corte", 1, 25.0, 0.0))
    }

    #[test]
    fn mutations_are_logged_and_persisted() {
        let mut svc = service(Role::Admin);
        let id = svc.create(comanda()).unwrap();
        svc.set_business_state("1", BusinessState::Completed).unwrap();
        svc.validate(&id.to_string()).unwrap();

        let actions: Vec<_> = svc.activity().entries().iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![
                ActivityAction::ComandaValidated,
                ActivityAction::ComandaStateChanged,
                ActivityAction::ComandaCreated,
            ]
        );
        assert!(!svc.submitter().is_in_flight());
    }

    #[test]
    fn cashier_cannot_delete() {
        let mut svc = service(Role::Cashier);
        svc.create(comanda()).unwrap();
        let err = svc.delete("00001").unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Caja(CajaError::PermissionDenied(_))
        ));
        assert_eq!(svc.ledger().comandas.len(), 1);
    }

    #[test]
    fn unknown_comanda_is_reported() {
        let mut svc = service(Role::Admin);
        let err = svc.validate("999").unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(ref m) if m.contains("not found")));
    }
}
