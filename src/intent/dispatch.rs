use crate::domain::{Item, ModuleEntry, Transaction, TransactionType};
use crate::finance::FinanceStore;
use crate::ids::now_utc_rfc3339;
use crate::modules::ModuleStore;
use crate::retry::RetryPolicy;
use crate::store::ItemStore;

use super::context::build_context;
use super::provider::{DocumentGuess, IntentProvider, ProviderError};
use super::reply::{parse_reply, IntentOperation, IntentReply};

/// Confidence at or above which a document classification is trusted without
/// a second provider call.
pub const DEFAULT_RECEIPT_CONFIDENCE: f64 = 0.8;

/// A mutation carried out on behalf of a chat turn, reported back with the
/// record it produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionReport {
    ItemCreated(Item),
    ItemCompleted(Item),
    TransactionAdded(Transaction),
    EntryAdded(ModuleEntry),
}

/// One assistant turn: a message, the mutations performed for it, and, when a
/// completion target was ambiguous, the candidates awaiting manual choice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatTurn {
    pub message: String,
    pub reasoning: Option<String>,
    pub actions: Vec<ActionReport>,
    pub candidates: Vec<Item>,
}

impl ChatTurn {
    fn error(message: String) -> Self {
        Self {
            message,
            ..Self::default()
        }
    }
}

/// Mutable store handles the dispatcher may touch for one turn.
pub struct Stores<'a> {
    pub items: &'a mut ItemStore,
    pub finance: &'a mut FinanceStore,
    pub modules: &'a mut ModuleStore,
}

/// Turns free-text requests into store mutations via an injected provider.
/// Provider failures, malformed replies, and downstream store failures all
/// come back as chat-only error turns; nothing here returns an Err.
pub struct Interpreter {
    provider: Box<dyn IntentProvider>,
    retry: RetryPolicy,
    receipt_confidence: f64,
}

impl Interpreter {
    pub fn new(provider: Box<dyn IntentProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
            receipt_confidence: DEFAULT_RECEIPT_CONFIDENCE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_receipt_confidence(mut self, threshold: f64) -> Self {
        self.receipt_confidence = threshold;
        self
    }

    pub fn handle_request(&self, request: &str, stores: &mut Stores<'_>) -> ChatTurn {
        let context = build_context(
            stores.items.items(),
            stores.finance.accounts(),
            stores.modules.modules(),
        );
        let raw = match self
            .retry
            .run(|| self.provider.interpret(request, &context), ProviderError::is_retryable)
        {
            Ok(raw) => raw,
            Err(err) => {
                log::warn!("interpreter call failed: {}", err);
                return ChatTurn::error(format!("I couldn't reach the assistant service: {}", err));
            }
        };
        let reply = match parse_reply(raw) {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("provider reply rejected: {}", err);
                return ChatTurn::error(
                    "I got an answer I couldn't make sense of; nothing was changed.".to_string(),
                );
            }
        };
        self.dispatch(reply, stores)
    }

    /// Receipt fast path: trust a confident classification outright, fall
    /// back to the general interpreter with the extraction as hints.
    pub fn handle_document(
        &self,
        image: &[u8],
        caption: &str,
        stores: &mut Stores<'_>,
    ) -> ChatTurn {
        let guess = match self
            .retry
            .run(|| self.provider.classify_document(image, caption), ProviderError::is_retryable)
        {
            Ok(guess) => guess,
            Err(err) => {
                log::warn!("document classification failed: {}", err);
                return ChatTurn::error(format!("I couldn't read that document: {}", err));
            }
        };

        if guess.confidence >= self.receipt_confidence {
            if let Some(turn) = self.transaction_from_guess(&guess, stores) {
                return turn;
            }
        }
        let hints = hint_request(caption, &guess);
        self.handle_request(&hints, stores)
    }

    fn transaction_from_guess(
        &self,
        guess: &DocumentGuess,
        stores: &mut Stores<'_>,
    ) -> Option<ChatTurn> {
        let amount = guess.amount?;
        let description = guess.merchant.clone()?;
        let tx_type = guess.tx_type.unwrap_or(TransactionType::Expense);
        let account = stores.finance.accounts().first()?.id.clone();
        let date = guess.date.clone().unwrap_or_else(now_utc_rfc3339);
        let tx = Transaction::new(description, amount, tx_type, account, date);
        match stores.finance.add_transaction(tx.clone()) {
            Ok(()) => Some(ChatTurn {
                message: format!("Recorded {} for {:.2}.", tx.description, tx.amount.abs()),
                reasoning: None,
                actions: vec![ActionReport::TransactionAdded(tx)],
                candidates: Vec::new(),
            }),
            Err(err) => {
                log::warn!("fast-path transaction not stored: {}", err);
                Some(ChatTurn::error(format!(
                    "I read the receipt but couldn't save it: {}",
                    err
                )))
            }
        }
    }

    fn dispatch(&self, reply: IntentReply, stores: &mut Stores<'_>) -> ChatTurn {
        let IntentReply {
            operation,
            chat_response,
            reasoning,
        } = reply;
        let mut turn = ChatTurn {
            message: chat_response,
            reasoning,
            ..ChatTurn::default()
        };

        match operation {
            IntentOperation::Chat => {}
            IntentOperation::Create {
                title,
                kind,
                category,
                tags,
                content,
                due_date,
            } => {
                let mut item = Item::new(title, kind);
                item.category = category;
                item.tags = tags;
                item.content = content.unwrap_or_default();
                item.due_date = due_date;
                item.is_ai_generated = true;
                match stores.items.add(item.clone()) {
                    Ok(()) => turn.actions.push(ActionReport::ItemCreated(item)),
                    Err(err) => {
                        log::warn!("requested item not stored: {}", err);
                        return ChatTurn::error(format!(
                            "I couldn't save \"{}\": {}",
                            item.title, err
                        ));
                    }
                }
            }
            IntentOperation::Complete { target } => match resolve_target(&target, stores.items) {
                Resolution::Unique(id) => match stores.items.toggle_complete(&id) {
                    Ok(updated) => turn.actions.push(ActionReport::ItemCompleted(updated)),
                    Err(err) => {
                        log::warn!("completion not stored: {}", err);
                        return ChatTurn::error(format!("I couldn't update that item: {}", err));
                    }
                },
                Resolution::None => {
                    turn.message = format!("I couldn't find anything matching \"{}\".", target);
                }
                Resolution::Ambiguous(candidates) => {
                    turn.message = format!(
                        "\"{}\" matches {} items; which one did you mean?",
                        target,
                        candidates.len()
                    );
                    turn.candidates = candidates;
                }
            },
            IntentOperation::Transaction {
                description,
                amount,
                tx_type,
                account,
                date,
            } => {
                let Some(account_id) = resolve_account(&account, stores.finance) else {
                    return ChatTurn::error(format!("I don't know an account called \"{}\".", account));
                };
                let date = date.unwrap_or_else(now_utc_rfc3339);
                let tx = Transaction::new(description, amount, tx_type, account_id, date);
                match stores.finance.add_transaction(tx.clone()) {
                    Ok(()) => turn.actions.push(ActionReport::TransactionAdded(tx)),
                    Err(err) => {
                        log::warn!("requested transaction not stored: {}", err);
                        return ChatTurn::error(format!("I couldn't record that: {}", err));
                    }
                }
            }
            IntentOperation::ModuleEntry {
                module,
                title,
                values,
            } => {
                let Some(module_id) = resolve_module(&module, stores.modules) else {
                    return ChatTurn::error(format!("I don't know a module called \"{}\".", module));
                };
                let entry = ModuleEntry::new(module_id, title, values);
                match stores.modules.add_entry(entry.clone()) {
                    Ok(()) => turn.actions.push(ActionReport::EntryAdded(entry)),
                    Err(err) => {
                        log::warn!("requested entry not stored: {}", err);
                        return ChatTurn::error(format!("I couldn't file that entry: {}", err));
                    }
                }
            }
        }
        turn
    }
}

enum Resolution {
    Unique(String),
    None,
    Ambiguous(Vec<Item>),
}

/// Id match wins outright; otherwise exact trimmed case-insensitive title.
/// Zero or several title matches are never guessed through.
fn resolve_target(target: &str, items: &ItemStore) -> Resolution {
    if let Some(item) = items.get(target) {
        return Resolution::Unique(item.id.clone());
    }
    let wanted = target.trim();
    let matches: Vec<&Item> = items
        .items()
        .iter()
        .filter(|item| item.title.trim().eq_ignore_ascii_case(wanted))
        .collect();
    match matches.as_slice() {
        [] => Resolution::None,
        [only] => Resolution::Unique(only.id.clone()),
        many => Resolution::Ambiguous(many.iter().map(|item| (*item).clone()).collect()),
    }
}

fn resolve_account(account: &str, finance: &FinanceStore) -> Option<String> {
    finance
        .accounts()
        .iter()
        .find(|candidate| {
            candidate.id == account || candidate.name.trim().eq_ignore_ascii_case(account.trim())
        })
        .map(|candidate| candidate.id.clone())
}

fn resolve_module(module: &str, modules: &ModuleStore) -> Option<String> {
    modules
        .modules()
        .iter()
        .find(|candidate| {
            candidate.id == module || candidate.name.trim().eq_ignore_ascii_case(module.trim())
        })
        .map(|candidate| candidate.id.clone())
}

fn hint_request(caption: &str, guess: &DocumentGuess) -> String {
    let mut hints = vec![format!("Attached document. Caption: {}", caption)];
    if let Some(merchant) = &guess.merchant {
        hints.push(format!("likely merchant: {}", merchant));
    }
    if let Some(amount) = guess.amount {
        hints.push(format!("likely amount: {:.2}", amount));
    }
    if let Some(date) = &guess.date {
        hints.push(format!("likely date: {}", date));
    }
    hints.join("; ")
}

#[cfg(test)]
mod tests;
