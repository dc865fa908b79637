use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pizzeria_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainEvent, Money, TenantId, typed_id,
};

typed_id!(
    /// Cash shift identifier.
    CashShiftId(AggregateId)
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

impl ShiftStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftStatus::Open => "OPEN",
            ShiftStatus::Closed => "CLOSED",
        }
    }
}

impl core::str::FromStr for ShiftStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(ShiftStatus::Open),
            "CLOSED" => Ok(ShiftStatus::Closed),
            other => Err(DomainError::validation(format!("unknown shift status {other:?}"))),
        }
    }
}

/// Aggregate root: CashShift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashShift {
    id: CashShiftId,
    tenant_id: Option<TenantId>,
    status: ShiftStatus,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    start_amount: Money,
    end_amount: Option<Money>,
    version: u64,
    created: bool,
}

/// Flat persisted shape of a shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashShiftRecord {
    pub id: CashShiftId,
    pub tenant_id: TenantId,
    pub status: ShiftStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub start_amount: Money,
    pub end_amount: Option<Money>,
    pub version: u64,
}

impl CashShift {
    /// Create an empty, not-yet-opened instance.
    pub fn empty(id: CashShiftId) -> Self {
        Self {
            id,
            tenant_id: None,
            status: ShiftStatus::Open,
            started_at: None,
            ended_at: None,
            start_amount: Money::ZERO,
            end_amount: None,
            version: 0,
            created: false,
        }
    }

    /// Rebuild a shift from its persisted record, re-checking the
    /// closed-iff-end-fields invariant.
    pub fn from_record(record: CashShiftRecord) -> Result<Self, DomainError> {
        let closed = record.status == ShiftStatus::Closed;
        if closed != record.ended_at.is_some() || closed != record.end_amount.is_some() {
            return Err(DomainError::invariant(format!(
                "shift {} has status {} but end fields {:?}/{:?}",
                record.id,
                record.status.as_str(),
                record.ended_at,
                record.end_amount
            )));
        }

        Ok(Self {
            id: record.id,
            tenant_id: Some(record.tenant_id),
            status: record.status,
            started_at: Some(record.started_at),
            ended_at: record.ended_at,
            start_amount: record.start_amount,
            end_amount: record.end_amount,
            version: record.version,
            created: true,
        })
    }

    /// Persisted shape; `None` until the shift has been opened.
    pub fn to_record(&self) -> Option<CashShiftRecord> {
        Some(CashShiftRecord {
            id: self.id,
            tenant_id: self.tenant_id?,
            status: self.status,
            started_at: self.started_at?,
            ended_at: self.ended_at,
            start_amount: self.start_amount,
            end_amount: self.end_amount,
            version: self.version,
        })
    }

    pub fn id_typed(&self) -> CashShiftId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn status(&self) -> ShiftStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.created && self.status == ShiftStatus::Open
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn start_amount(&self) -> Money {
        self.start_amount
    }

    pub fn end_amount(&self) -> Option<Money> {
        self.end_amount
    }
}

impl AggregateRoot for CashShift {
    type Id = CashShiftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenShift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenShift {
    pub tenant_id: TenantId,
    pub shift_id: CashShiftId,
    pub start_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CloseShift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseShift {
    pub tenant_id: TenantId,
    pub shift_id: CashShiftId,
    pub end_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashShiftCommand {
    OpenShift(OpenShift),
    CloseShift(CloseShift),
}

/// Event: ShiftOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftOpened {
    pub tenant_id: TenantId,
    pub shift_id: CashShiftId,
    pub start_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ShiftClosed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftClosed {
    pub tenant_id: TenantId,
    pub shift_id: CashShiftId,
    pub end_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CashShiftEvent {
    ShiftOpened(ShiftOpened),
    ShiftClosed(ShiftClosed),
}

impl DomainEvent for CashShiftEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CashShiftEvent::ShiftOpened(_) => "register.shift.opened",
            CashShiftEvent::ShiftClosed(_) => "register.shift.closed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CashShiftEvent::ShiftOpened(e) => e.occurred_at,
            CashShiftEvent::ShiftClosed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for CashShift {
    type Command = CashShiftCommand;
    type Event = CashShiftEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CashShiftEvent::ShiftOpened(e) => {
                self.id = e.shift_id;
                self.tenant_id = Some(e.tenant_id);
                self.status = ShiftStatus::Open;
                self.started_at = Some(e.occurred_at);
                self.start_amount = e.start_amount;
                self.ended_at = None;
                self.end_amount = None;
                self.created = true;
            }
            CashShiftEvent::ShiftClosed(e) => {
                self.status = ShiftStatus::Closed;
                self.ended_at = Some(e.occurred_at);
                self.end_amount = Some(e.end_amount);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CashShiftCommand::OpenShift(cmd) => self.handle_open(cmd),
            CashShiftCommand::CloseShift(cmd) => self.handle_close(cmd),
        }
    }
}

impl CashShift {
    fn ensure_tenant(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }

    fn ensure_shift_id(&self, shift_id: CashShiftId) -> Result<(), DomainError> {
        if self.id != shift_id {
            return Err(DomainError::invariant("shift_id mismatch"));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenShift) -> Result<Vec<CashShiftEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("cash shift already opened"));
        }

        if !cmd.start_amount.is_positive() {
            return Err(DomainError::validation(
                "start amount must be greater than zero",
            ));
        }

        Ok(vec![CashShiftEvent::ShiftOpened(ShiftOpened {
            tenant_id: cmd.tenant_id,
            shift_id: cmd.shift_id,
            start_amount: cmd.start_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_close(&self, cmd: &CloseShift) -> Result<Vec<CashShiftEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_tenant(cmd.tenant_id)?;
        self.ensure_shift_id(cmd.shift_id)?;

        if self.status == ShiftStatus::Closed {
            return Err(DomainError::invariant("cash shift is already closed"));
        }

        if cmd.end_amount.is_negative() {
            return Err(DomainError::validation("end amount cannot be negative"));
        }

        Ok(vec![CashShiftEvent::ShiftClosed(ShiftClosed {
            tenant_id: cmd.tenant_id,
            shift_id: cmd.shift_id,
            end_amount: cmd.end_amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_tenant_id() -> TenantId {
        TenantId::new()
    }

    fn test_shift_id() -> CashShiftId {
        CashShiftId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn opened(tenant_id: TenantId, shift_id: CashShiftId) -> CashShift {
        let mut shift = CashShift::empty(shift_id);
        shift
            .execute(&CashShiftCommand::OpenShift(OpenShift {
                tenant_id,
                shift_id,
                start_amount: Money::from_minor(100_000),
                occurred_at: test_time(),
            }))
            .unwrap();
        shift
    }

    #[test]
    fn open_emits_shift_opened_and_starts_open() {
        let tenant_id = test_tenant_id();
        let shift_id = test_shift_id();
        let mut shift = CashShift::empty(shift_id);
        let at = test_time();

        let events = shift
            .handle(&CashShiftCommand::OpenShift(OpenShift {
                tenant_id,
                shift_id,
                start_amount: Money::from_minor(100_000),
                occurred_at: at,
            }))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "register.shift.opened");

        shift.apply(&events[0]);
        assert!(shift.is_open());
        assert_eq!(shift.tenant_id(), Some(tenant_id));
        assert_eq!(shift.started_at(), Some(at));
        assert_eq!(shift.start_amount(), Money::from_minor(100_000));
        assert_eq!(shift.ended_at(), None);
        assert_eq!(shift.end_amount(), None);
    }

    #[test]
    fn zero_start_amount_is_rejected() {
        let shift_id = test_shift_id();
        let err = CashShift::empty(shift_id)
            .handle(&CashShiftCommand::OpenShift(OpenShift {
                tenant_id: test_tenant_id(),
                shift_id,
                start_amount: Money::ZERO,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("start amount") => {}
            _ => panic!("Expected Validation error for zero start amount"),
        }
    }

    #[test]
    fn close_records_end_amount_and_time() {
        let tenant_id = test_tenant_id();
        let shift_id = test_shift_id();
        let mut shift = opened(tenant_id, shift_id);
        let at = test_time();

        shift
            .execute(&CashShiftCommand::CloseShift(CloseShift {
                tenant_id,
                shift_id,
                end_amount: Money::ZERO,
                occurred_at: at,
            }))
            .unwrap();

        assert_eq!(shift.status(), ShiftStatus::Closed);
        assert!(!shift.is_open());
        assert_eq!(shift.ended_at(), Some(at));
        assert_eq!(shift.end_amount(), Some(Money::ZERO));
        assert_eq!(shift.version(), 2);
    }

    #[test]
    fn negative_end_amount_is_rejected() {
        let tenant_id = test_tenant_id();
        let shift_id = test_shift_id();
        let shift = opened(tenant_id, shift_id);

        let err = shift
            .handle(&CashShiftCommand::CloseShift(CloseShift {
                tenant_id,
                shift_id,
                end_amount: Money::from_minor(-1),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        match err {
            DomainError::Validation(msg) if msg.contains("end amount") => {}
            _ => panic!("Expected Validation error for negative end amount"),
        }
    }

    #[test]
    fn closing_twice_is_an_invariant_violation() {
        let tenant_id = test_tenant_id();
        let shift_id = test_shift_id();
        let mut shift = opened(tenant_id, shift_id);
        let close = CashShiftCommand::CloseShift(CloseShift {
            tenant_id,
            shift_id,
            end_amount: Money::from_minor(5_000),
            occurred_at: test_time(),
        });

        shift.execute(&close).unwrap();
        let err = shift.handle(&close).unwrap_err();
        match err {
            DomainError::InvariantViolation(msg) if msg.contains("already closed") => {}
            _ => panic!("Expected InvariantViolation for second close"),
        }
    }

    #[test]
    fn closing_from_another_tenant_is_rejected() {
        let shift_id = test_shift_id();
        let shift = opened(test_tenant_id(), shift_id);

        let err = shift
            .handle(&CashShiftCommand::CloseShift(CloseShift {
                tenant_id: test_tenant_id(),
                shift_id,
                end_amount: Money::ZERO,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::invariant("tenant mismatch"));
    }

    #[test]
    fn closing_an_unopened_shift_is_not_found() {
        let shift_id = test_shift_id();
        let err = CashShift::empty(shift_id)
            .handle(&CashShiftCommand::CloseShift(CloseShift {
                tenant_id: test_tenant_id(),
                shift_id,
                end_amount: Money::ZERO,
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn record_round_trip_preserves_state() {
        let shift = opened(test_tenant_id(), test_shift_id());
        let record = shift.to_record().unwrap();
        let restored = CashShift::from_record(record).unwrap();
        assert_eq!(restored, shift);
    }

    #[test]
    fn record_with_inconsistent_end_fields_is_rejected() {
        let mut record = opened(test_tenant_id(), test_shift_id()).to_record().unwrap();
        record.end_amount = Some(Money::ZERO);
        assert!(CashShift::from_record(record).is_err());
    }

    #[test]
    fn unopened_shift_has_no_record() {
        assert!(CashShift::empty(test_shift_id()).to_record().is_none());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 64,
                ..ProptestConfig::default()
            })]

            #[test]
            fn start_amount_must_be_strictly_positive(cents in -1_000_000i64..1_000_000) {
                let shift_id = test_shift_id();
                let result = CashShift::empty(shift_id).handle(&CashShiftCommand::OpenShift(OpenShift {
                    tenant_id: test_tenant_id(),
                    shift_id,
                    start_amount: Money::from_minor(cents),
                    occurred_at: test_time(),
                }));
                prop_assert_eq!(result.is_ok(), cents > 0);
            }

            #[test]
            fn end_amount_must_be_non_negative(cents in -1_000_000i64..1_000_000) {
                let tenant_id = test_tenant_id();
                let shift_id = test_shift_id();
                let shift = opened(tenant_id, shift_id);
                let result = shift.handle(&CashShiftCommand::CloseShift(CloseShift {
                    tenant_id,
                    shift_id,
                    end_amount: Money::from_minor(cents),
                    occurred_at: test_time(),
                }));
                prop_assert_eq!(result.is_ok(), cents >= 0);
            }
        }
    }
}
