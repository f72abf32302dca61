//! Test fixtures.
//!
//! A bank account aggregate with a notification category alongside it, and a
//! user/other event family used to exercise category filtering on the bus.

use crate::aggregate::{Aggregate, AggregateBase, AggregateFactory};
use crate::event::{AggregateId, Event, EventClass, EventTag};

// ============================================================================
// Bank account
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum AccountEvent {
    AccountCreated { account_id: AggregateId, owner: String },
    DepositPerformed { account_id: AggregateId, amount: f64 },
    OwnerChanged { account_id: AggregateId, owner: String },
    WithdrawalPerformed { account_id: AggregateId, amount: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    MessageSent { account_id: AggregateId, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BankEvent {
    Account(AccountEvent),
    Notification(NotificationEvent),
}

impl Event for BankEvent {
    fn aggregate_id(&self) -> AggregateId {
        match self {
            BankEvent::Account(
                AccountEvent::AccountCreated { account_id, .. }
                | AccountEvent::DepositPerformed { account_id, .. }
                | AccountEvent::OwnerChanged { account_id, .. }
                | AccountEvent::WithdrawalPerformed { account_id, .. },
            ) => *account_id,
            BankEvent::Notification(NotificationEvent::MessageSent { account_id, .. }) => {
                *account_id
            }
        }
    }

    fn event_type(&self) -> EventTag {
        match self {
            BankEvent::Account(AccountEvent::AccountCreated { .. }) => "AccountCreated",
            BankEvent::Account(AccountEvent::DepositPerformed { .. }) => "DepositPerformed",
            BankEvent::Account(AccountEvent::OwnerChanged { .. }) => "OwnerChanged",
            BankEvent::Account(AccountEvent::WithdrawalPerformed { .. }) => "WithdrawalPerformed",
            BankEvent::Notification(NotificationEvent::MessageSent { .. }) => "MessageSent",
        }
    }

    fn categories(&self) -> &'static [EventTag] {
        match self {
            BankEvent::Account(_) => &["AccountEvent"],
            BankEvent::Notification(_) => &["NotificationEvent"],
        }
    }
}

impl EventClass<BankEvent> for AccountEvent {
    const TAG: EventTag = "AccountEvent";

    fn narrow(event: &BankEvent) -> Option<Self> {
        match event {
            BankEvent::Account(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

impl EventClass<BankEvent> for NotificationEvent {
    const TAG: EventTag = "NotificationEvent";

    fn narrow(event: &BankEvent) -> Option<Self> {
        match event {
            BankEvent::Notification(inner) => Some(inner.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BankAccount {
    base: AggregateBase<BankEvent>,
    pub owner: String,
    pub balance: f64,
}

impl BankAccount {
    pub fn open(&mut self, owner: &str) {
        let account_id = self.id();
        self.record(BankEvent::Account(AccountEvent::AccountCreated {
            account_id,
            owner: owner.to_string(),
        }));
    }

    pub fn deposit(&mut self, amount: f64) {
        let account_id = self.id();
        self.record(BankEvent::Account(AccountEvent::DepositPerformed {
            account_id,
            amount,
        }));
    }

    pub fn withdraw(&mut self, amount: f64) {
        let account_id = self.id();
        self.record(BankEvent::Account(AccountEvent::WithdrawalPerformed {
            account_id,
            amount,
        }));
    }
}

impl Aggregate for BankAccount {
    type Event = BankEvent;

    fn base(&self) -> &AggregateBase<BankEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateBase<BankEvent> {
        &mut self.base
    }

    fn apply(&mut self, event: &BankEvent) {
        match event {
            BankEvent::Account(AccountEvent::AccountCreated { owner, .. }) => {
                self.owner = owner.clone();
            }
            BankEvent::Account(AccountEvent::DepositPerformed { amount, .. }) => {
                self.balance += amount;
            }
            BankEvent::Account(AccountEvent::OwnerChanged { owner, .. }) => {
                self.owner = owner.clone();
            }
            BankEvent::Account(AccountEvent::WithdrawalPerformed { amount, .. }) => {
                self.balance -= amount;
            }
            BankEvent::Notification(_) => {}
        }
    }
}

pub struct BankAccountFactory;

impl AggregateFactory for BankAccountFactory {
    type Aggregate = BankAccount;

    fn create(&self, id: AggregateId) -> BankAccount {
        BankAccount {
            base: AggregateBase::new(id),
            owner: String::new(),
            balance: 0.0,
        }
    }
}

/// Five events ending with owner "tsubasa" and a balance of 27.08.
pub fn bank_history(id: AggregateId) -> Vec<BankEvent> {
    vec![
        BankEvent::Account(AccountEvent::AccountCreated {
            account_id: id,
            owner: "totoro".to_string(),
        }),
        BankEvent::Account(AccountEvent::DepositPerformed {
            account_id: id,
            amount: 20.0,
        }),
        BankEvent::Account(AccountEvent::DepositPerformed {
            account_id: id,
            amount: 15.20,
        }),
        BankEvent::Account(AccountEvent::OwnerChanged {
            account_id: id,
            owner: "tsubasa".to_string(),
        }),
        BankEvent::Account(AccountEvent::WithdrawalPerformed {
            account_id: id,
            amount: 8.12,
        }),
    ]
}

pub fn message_sent(message: &str) -> BankEvent {
    BankEvent::Notification(NotificationEvent::MessageSent {
        account_id: AggregateId::new(),
        message: message.to_string(),
    })
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    AddUser { user_id: AggregateId },
    RemoveUser { user_id: AggregateId },
    ChangeUserAddress { user_id: AggregateId },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnotherEvent {
    pub aggregate_id: AggregateId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectoryEvent {
    User(UserEvent),
    Another(AnotherEvent),
}

impl Event for DirectoryEvent {
    fn aggregate_id(&self) -> AggregateId {
        match self {
            DirectoryEvent::User(
                UserEvent::AddUser { user_id }
                | UserEvent::RemoveUser { user_id }
                | UserEvent::ChangeUserAddress { user_id },
            ) => *user_id,
            DirectoryEvent::Another(another) => another.aggregate_id,
        }
    }

    fn event_type(&self) -> EventTag {
        match self {
            DirectoryEvent::User(UserEvent::AddUser { .. }) => "AddUser",
            DirectoryEvent::User(UserEvent::RemoveUser { .. }) => "RemoveUser",
            DirectoryEvent::User(UserEvent::ChangeUserAddress { .. }) => "ChangeUserAddress",
            DirectoryEvent::Another(_) => "AnotherEvent",
        }
    }

    fn categories(&self) -> &'static [EventTag] {
        match self {
            DirectoryEvent::User(_) => &["UserEvent"],
            DirectoryEvent::Another(_) => &[],
        }
    }
}

impl EventClass<DirectoryEvent> for UserEvent {
    const TAG: EventTag = "UserEvent";

    fn narrow(event: &DirectoryEvent) -> Option<Self> {
        match event {
            DirectoryEvent::User(user) => Some(user.clone()),
            DirectoryEvent::Another(_) => None,
        }
    }
}

impl EventClass<DirectoryEvent> for AnotherEvent {
    const TAG: EventTag = "AnotherEvent";

    fn narrow(event: &DirectoryEvent) -> Option<Self> {
        match event {
            DirectoryEvent::Another(another) => Some(another.clone()),
            DirectoryEvent::User(_) => None,
        }
    }
}

/// Three user events for one user followed by an unrelated event.
pub fn directory_events() -> Vec<DirectoryEvent> {
    let user_id = AggregateId::new();
    vec![
        DirectoryEvent::User(UserEvent::AddUser { user_id }),
        DirectoryEvent::User(UserEvent::RemoveUser { user_id }),
        DirectoryEvent::User(UserEvent::ChangeUserAddress { user_id }),
        DirectoryEvent::Another(AnotherEvent {
            aggregate_id: AggregateId::new(),
        }),
    ]
}
