use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::domain::{
    AccountType, FieldType, FinanceAccount, Item, ItemKind, Module, ModuleField, TransactionType,
};
use crate::finance::FinanceStore;
use crate::gateway::SqliteGateway;
use crate::intent::provider::{DocumentGuess, IntentProvider, ProviderError};
use crate::intent::{ActionReport, Interpreter, Stores};
use crate::modules::ModuleStore;
use crate::retry::RetryPolicy;
use crate::store::ItemStore;

#[derive(Default)]
struct ScriptState {
    reply: RefCell<Option<Value>>,
    guess: RefCell<Option<DocumentGuess>>,
    interpret_calls: Cell<usize>,
    classify_calls: Cell<usize>,
    transient_failures: Cell<usize>,
    last_request: RefCell<String>,
}

#[derive(Clone, Default)]
struct ScriptedProvider(Rc<ScriptState>);

impl ScriptedProvider {
    fn replying(reply: Value) -> Self {
        let provider = Self::default();
        *provider.0.reply.borrow_mut() = Some(reply);
        provider
    }

    fn classifying(guess: DocumentGuess) -> Self {
        let provider = Self::default();
        *provider.0.guess.borrow_mut() = Some(guess);
        provider
    }
}

impl IntentProvider for ScriptedProvider {
    fn interpret(&self, request: &str, _context: &Value) -> Result<Value, ProviderError> {
        self.0.interpret_calls.set(self.0.interpret_calls.get() + 1);
        *self.0.last_request.borrow_mut() = request.to_string();
        if self.0.transient_failures.get() > 0 {
            self.0
                .transient_failures
                .set(self.0.transient_failures.get() - 1);
            return Err(ProviderError::Timeout);
        }
        self.0
            .reply
            .borrow()
            .clone()
            .ok_or_else(|| ProviderError::Rejected("no script".to_string()))
    }

    fn classify_document(
        &self,
        _image: &[u8],
        _caption: &str,
    ) -> Result<DocumentGuess, ProviderError> {
        self.0.classify_calls.set(self.0.classify_calls.get() + 1);
        self.0
            .guess
            .borrow()
            .clone()
            .ok_or_else(|| ProviderError::Rejected("no script".to_string()))
    }
}

struct Fixture {
    items: ItemStore,
    finance: FinanceStore,
    modules: ModuleStore,
}

impl Fixture {
    fn new() -> Self {
        Self {
            items: ItemStore::new(Box::new(SqliteGateway::open_in_memory().expect("db"))),
            finance: FinanceStore::new(Box::new(SqliteGateway::open_in_memory().expect("db"))),
            modules: ModuleStore::new(Box::new(SqliteGateway::open_in_memory().expect("db"))),
        }
    }

    fn stores(&mut self) -> Stores<'_> {
        Stores {
            items: &mut self.items,
            finance: &mut self.finance,
            modules: &mut self.modules,
        }
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::ZERO,
    }
}

#[test]
fn chat_replies_mutate_nothing() {
    let provider = ScriptedProvider::replying(json!({
        "operation": "chat",
        "chatResponse": "You have nothing due today."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("what's due?", &mut fixture.stores());
    assert_eq!(turn.message, "You have nothing due today.");
    assert!(turn.actions.is_empty());
    assert!(fixture.items.items().is_empty());
}

#[test]
fn create_replies_store_an_assistant_authored_item() {
    let provider = ScriptedProvider::replying(json!({
        "operation": "create",
        "title": "Book flights",
        "kind": "task",
        "category": "Travel",
        "chatResponse": "Added it."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("remind me to book flights", &mut fixture.stores());

    assert_eq!(fixture.items.items().len(), 1);
    let stored = &fixture.items.items()[0];
    assert!(stored.is_ai_generated);
    assert_eq!(stored.kind, ItemKind::Task);
    assert!(matches!(turn.actions.as_slice(), [ActionReport::ItemCreated(_)]));
}

#[test]
fn complete_resolves_a_unique_title_ignoring_case_and_padding() {
    let mut fixture = Fixture::new();
    fixture
        .items
        .add(Item::new("Water the plants", ItemKind::Task))
        .expect("seed");
    let provider = ScriptedProvider::replying(json!({
        "operation": "complete",
        "target": "  water the PLANTS ",
        "chatResponse": "Done."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let turn = interpreter.handle_request("done watering", &mut fixture.stores());

    assert!(fixture.items.items()[0].is_completed);
    assert!(matches!(turn.actions.as_slice(), [ActionReport::ItemCompleted(_)]));
}

#[test]
fn ambiguous_completion_returns_candidates_and_changes_nothing() {
    let mut fixture = Fixture::new();
    fixture
        .items
        .add(Item::new("Review", ItemKind::Task))
        .expect("seed");
    fixture
        .items
        .add(Item::new("Review", ItemKind::Task))
        .expect("seed");
    let provider = ScriptedProvider::replying(json!({
        "operation": "complete",
        "target": "Review",
        "chatResponse": "Done."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let turn = interpreter.handle_request("finish review", &mut fixture.stores());

    assert_eq!(turn.candidates.len(), 2);
    assert!(turn.actions.is_empty());
    assert!(fixture.items.items().iter().all(|item| !item.is_completed));
}

#[test]
fn unmatched_completion_reports_not_found() {
    let provider = ScriptedProvider::replying(json!({
        "operation": "complete",
        "target": "Nonexistent",
        "chatResponse": "Done."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("finish it", &mut fixture.stores());
    assert!(turn.message.contains("Nonexistent"));
    assert!(turn.actions.is_empty());
    assert!(turn.candidates.is_empty());
}

#[test]
fn transactions_resolve_accounts_by_name() {
    let mut fixture = Fixture::new();
    let account = FinanceAccount::new("Everyday", AccountType::Checking, "USD");
    let account_id = account.id.clone();
    fixture.finance.add_account(account).expect("seed");

    let provider = ScriptedProvider::replying(json!({
        "operation": "transaction",
        "description": "Groceries",
        "amount": 54.20,
        "type": "expense",
        "account": "everyday",
        "chatResponse": "Logged."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let turn = interpreter.handle_request("spent 54.20 on groceries", &mut fixture.stores());

    assert!(matches!(turn.actions.as_slice(), [ActionReport::TransactionAdded(_)]));
    let balance = fixture.finance.account(&account_id).expect("account").balance;
    assert!((balance + 54.20).abs() < 1e-9);
}

#[test]
fn unknown_account_becomes_a_chat_error_turn() {
    let provider = ScriptedProvider::replying(json!({
        "operation": "transaction",
        "description": "Groceries",
        "amount": 10.0,
        "type": "expense",
        "account": "Slush fund",
        "chatResponse": "Logged."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("spent 10", &mut fixture.stores());
    assert!(turn.message.contains("Slush fund"));
    assert!(turn.actions.is_empty());
    assert!(fixture.finance.transactions().is_empty());
}

#[test]
fn rejected_module_entry_becomes_a_chat_error_turn() {
    let mut fixture = Fixture::new();
    let module = Module::new(
        "Reading log",
        vec![ModuleField {
            key: "author".to_string(),
            label: "Author".to_string(),
            field_type: FieldType::Text,
            options: Vec::new(),
        }],
    );
    fixture.modules.add_module(module).expect("seed");

    let provider = ScriptedProvider::replying(json!({
        "operation": "moduleEntry",
        "module": "Reading log",
        "title": "Dune",
        "values": {"publisher": "Chilton"},
        "chatResponse": "Filed."
    }));
    let interpreter = Interpreter::new(Box::new(provider));
    let turn = interpreter.handle_request("log Dune", &mut fixture.stores());

    assert!(turn.actions.is_empty());
    assert!(fixture.modules.entries().is_empty());
    assert!(turn.message.contains("couldn't file"));
}

#[test]
fn malformed_replies_never_reach_a_store() {
    let provider = ScriptedProvider::replying(json!({"operation": "dropTables"}));
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("anything", &mut fixture.stores());
    assert!(turn.actions.is_empty());
    assert!(fixture.items.items().is_empty());
}

#[test]
fn transient_provider_failures_are_retried() {
    let provider = ScriptedProvider::replying(json!({
        "operation": "chat",
        "chatResponse": "Hello."
    }));
    provider.0.transient_failures.set(2);
    let state = provider.0.clone();
    let interpreter = Interpreter::new(Box::new(provider)).with_retry(fast_retry());
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("hi", &mut fixture.stores());
    assert_eq!(turn.message, "Hello.");
    assert_eq!(state.interpret_calls.get(), 3);
}

#[test]
fn permanent_provider_failure_is_a_single_error_turn() {
    let provider = ScriptedProvider::default();
    let state = provider.0.clone();
    let interpreter = Interpreter::new(Box::new(provider)).with_retry(fast_retry());
    let mut fixture = Fixture::new();
    let turn = interpreter.handle_request("hi", &mut fixture.stores());
    assert!(turn.message.contains("couldn't reach"));
    assert_eq!(state.interpret_calls.get(), 1);
}

#[test]
fn confident_receipt_skips_the_general_interpreter() {
    let provider = ScriptedProvider::classifying(DocumentGuess {
        confidence: 0.92,
        merchant: Some("Corner Deli".to_string()),
        amount: Some(12.5),
        tx_type: Some(TransactionType::Expense),
        date: Some("2026-08-20T00:00:00Z".to_string()),
    });
    let state = provider.0.clone();
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();
    fixture
        .finance
        .add_account(FinanceAccount::new("Everyday", AccountType::Checking, "USD"))
        .expect("seed");

    let turn = interpreter.handle_document(b"jpeg", "lunch receipt", &mut fixture.stores());

    assert_eq!(state.interpret_calls.get(), 0);
    assert!(matches!(turn.actions.as_slice(), [ActionReport::TransactionAdded(_)]));
    assert_eq!(fixture.finance.transactions().len(), 1);
    assert!(fixture.finance.transactions()[0].amount < 0.0);
}

#[test]
fn uncertain_receipt_falls_back_with_extraction_hints() {
    let provider = ScriptedProvider::classifying(DocumentGuess {
        confidence: 0.4,
        merchant: Some("Corner Deli".to_string()),
        amount: Some(12.5),
        tx_type: None,
        date: None,
    });
    *provider.0.reply.borrow_mut() = Some(json!({
        "operation": "chat",
        "chatResponse": "Is this a 12.50 lunch expense?"
    }));
    let state = provider.0.clone();
    let interpreter = Interpreter::new(Box::new(provider));
    let mut fixture = Fixture::new();

    interpreter.handle_document(b"jpeg", "lunch receipt", &mut fixture.stores());

    assert_eq!(state.interpret_calls.get(), 1);
    let forwarded = state.last_request.borrow().clone();
    assert!(forwarded.contains("lunch receipt"));
    assert!(forwarded.contains("Corner Deli"));
    assert!(forwarded.contains("12.50"));
}
