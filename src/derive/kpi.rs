use time::Duration;
use time::OffsetDateTime;

use crate::domain::{AgentRun, Item, Transaction, TransactionType};
use crate::ids::parse_timestamp;

use super::focus::{is_triage_pending, overdue_tasks};

const NET_WINDOW: Duration = Duration::days(30);
const AUTOMATION_WINDOW: Duration = Duration::days(7);

/// Headline numbers for the operations dashboard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpsKpis {
    pub overdue_count: usize,
    pub triage_pending_count: usize,
    /// Rolling 30-day net of income and expenses; transfers excluded.
    pub net_30d: f64,
    /// Rolling 7-day agent success rate as a percentage; 0 for an empty window.
    pub automation_success_rate_7d: f64,
}

fn within_window(raw: &str, now: OffsetDateTime, window: Duration) -> bool {
    parse_timestamp(raw)
        .map(|ts| ts <= now && now - ts <= window)
        .unwrap_or(false)
}

pub fn rolling_net(transactions: &[Transaction], now: OffsetDateTime) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.tx_type != TransactionType::Transfer)
        .filter(|tx| within_window(&tx.date, now, NET_WINDOW))
        .map(|tx| tx.amount)
        .sum()
}

pub fn automation_success_rate(runs: &[AgentRun], now: OffsetDateTime) -> f64 {
    let recent: Vec<&AgentRun> = runs
        .iter()
        .filter(|run| within_window(&run.started_at, now, AUTOMATION_WINDOW))
        .collect();
    if recent.is_empty() {
        return 0.0;
    }
    let succeeded = recent.iter().filter(|run| run.status.is_success()).count();
    succeeded as f64 / recent.len() as f64 * 100.0
}

pub fn ops_kpis(
    items: &[Item],
    transactions: &[Transaction],
    runs: &[AgentRun],
    now: OffsetDateTime,
) -> OpsKpis {
    OpsKpis {
        overdue_count: overdue_tasks(items, now).len(),
        triage_pending_count: items
            .iter()
            .filter(|item| !item.is_completed && is_triage_pending(item))
            .count(),
        net_30d: rolling_net(transactions, now),
        automation_success_rate_7d: automation_success_rate(runs, now),
    }
}

#[cfg(test)]
mod tests {
    use super::{automation_success_rate, ops_kpis, rolling_net};
    use crate::domain::{AgentRun, Item, ItemKind, RunStatus, Transaction, TransactionType};
    use time::macros::datetime;

    fn now() -> time::OffsetDateTime {
        datetime!(2026-08-20 12:00:00 UTC)
    }

    fn tx(amount: f64, tx_type: TransactionType, date: &str) -> Transaction {
        Transaction::new("x", amount, tx_type, "acct", date)
    }

    fn run(status: RunStatus, started_at: &str) -> AgentRun {
        let mut run = AgentRun::record(status, "daily");
        run.started_at = started_at.to_string();
        run
    }

    #[test]
    fn net_excludes_transfers_and_old_transactions() {
        let transactions = vec![
            tx(100.0, TransactionType::Income, "2026-08-10T00:00:00Z"),
            tx(30.0, TransactionType::Expense, "2026-08-15T00:00:00Z"),
            tx(500.0, TransactionType::Transfer, "2026-08-16T00:00:00Z"),
            tx(999.0, TransactionType::Income, "2026-06-01T00:00:00Z"),
        ];
        assert!((rolling_net(&transactions, now()) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn success_rate_is_zero_for_an_empty_window() {
        assert_eq!(automation_success_rate(&[], now()), 0.0);
        let stale = vec![run(RunStatus::Succeeded, "2026-07-01T00:00:00Z")];
        assert_eq!(automation_success_rate(&stale, now()), 0.0);
    }

    #[test]
    fn success_rate_counts_only_the_trailing_week() {
        let runs = vec![
            run(RunStatus::Succeeded, "2026-08-18T00:00:00Z"),
            run(RunStatus::Failed, "2026-08-19T00:00:00Z"),
            run(RunStatus::TimedOut, "2026-08-19T06:00:00Z"),
            run(RunStatus::Succeeded, "2026-08-01T00:00:00Z"),
        ];
        let rate = automation_success_rate(&runs, now());
        assert!((rate - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn kpis_aggregate_all_four_signals() {
        let mut overdue = Item::new("late", ItemKind::Task);
        overdue.due_date = Some("2026-08-19T00:00:00Z".to_string());
        let mut triaged = Item::new("triage", ItemKind::Task);
        triaged.tags.push("triage-pending".to_string());

        let kpis = ops_kpis(
            &[overdue, triaged],
            &[tx(10.0, TransactionType::Income, "2026-08-19T00:00:00Z")],
            &[run(RunStatus::Succeeded, "2026-08-19T00:00:00Z")],
            now(),
        );
        assert_eq!(kpis.overdue_count, 1);
        assert_eq!(kpis.triage_pending_count, 1);
        assert!((kpis.net_30d - 10.0).abs() < 1e-9);
        assert!((kpis.automation_success_rate_7d - 100.0).abs() < 1e-9);
    }
}
