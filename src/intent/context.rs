use serde_json::{json, Value};

use crate::domain::{FinanceAccount, Item, Module};

/// Builds the context document sent alongside every interpreter call: enough
/// for the provider to resolve titles, accounts, and module schemas, and no
/// more. Item content bodies stay out of the payload.
pub fn build_context(items: &[Item], accounts: &[FinanceAccount], modules: &[Module]) -> Value {
    let items: Vec<Value> = items
        .iter()
        .map(|item| {
            json!({
                "id": item.id,
                "title": item.title,
                "kind": item.kind.as_str(),
                "isCompleted": item.is_completed,
            })
        })
        .collect();
    let accounts: Vec<Value> = accounts
        .iter()
        .map(|account| {
            json!({
                "id": account.id,
                "name": account.name,
                "balance": account.balance,
                "currency": account.currency,
            })
        })
        .collect();
    let modules: Vec<Value> = modules
        .iter()
        .map(|module| {
            let fields: Vec<Value> = module
                .fields
                .iter()
                .map(|field| json!({"key": field.key, "label": field.label}))
                .collect();
            json!({"id": module.id, "name": module.name, "fields": fields})
        })
        .collect();
    json!({"items": items, "accounts": accounts, "modules": modules})
}

#[cfg(test)]
mod tests {
    use super::build_context;
    use crate::domain::{AccountType, FinanceAccount, Item, ItemKind, Module};

    #[test]
    fn context_carries_titles_balances_and_schemas_but_not_bodies() {
        let mut item = Item::new("Plan launch", ItemKind::Project);
        item.content = "secret notes".to_string();
        let account = FinanceAccount::new("Everyday", AccountType::Checking, "USD");
        let module = Module::new("Reading log", Vec::new());

        let context = build_context(&[item], &[account], &[module]);
        assert_eq!(context["items"][0]["title"], "Plan launch");
        assert_eq!(context["items"][0]["kind"], "project");
        assert!(context["items"][0].get("content").is_none());
        assert_eq!(context["accounts"][0]["name"], "Everyday");
        assert_eq!(context["modules"][0]["name"], "Reading log");
    }
}
