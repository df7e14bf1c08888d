//! Balance and settlement plan formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::engine::{NetBalances, SettlementTransfer};
use crate::models::Group;

#[derive(Tabled)]
struct BalanceRow {
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Status")]
    status: &'static str,
}

/// Format net balances, one row per member in roster order.
///
/// Members who left with a zero balance are omitted.
pub fn format_balances(group: &Group, balances: &NetBalances) -> String {
    let rows: Vec<BalanceRow> = group
        .members
        .iter()
        .filter_map(|member| {
            let balance = balances.get(member.id);
            if !member.is_active() && balance.is_zero() {
                return None;
            }
            let status = if balance.is_positive() {
                "is owed"
            } else if balance.is_negative() {
                "owes"
            } else {
                "settled"
            };
            Some(BalanceRow {
                member: member.name.clone(),
                balance: balance.format_with_code(&group.currency),
                status,
            })
        })
        .collect();

    if rows.is_empty() {
        return format!("'{}' has no members.", group.name);
    }

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Format suggested transfers as "X pays Y amount" lines
pub fn format_plan(group: &Group, transfers: &[SettlementTransfer]) -> String {
    if transfers.is_empty() {
        return format!("Everyone in '{}' is settled up.", group.name);
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{} transfer{} to settle '{}':\n",
        transfers.len(),
        if transfers.len() == 1 { "" } else { "s" },
        group.name
    ));

    let from_width = transfers
        .iter()
        .map(|t| group.member_name(t.from).len())
        .max()
        .unwrap_or(0);
    let to_width = transfers
        .iter()
        .map(|t| group.member_name(t.to).len())
        .max()
        .unwrap_or(0);

    for transfer in transfers {
        output.push_str(&format!(
            "  {:<from_width$} pays {:<to_width$}  {:>12}\n",
            group.member_name(transfer.from),
            group.member_name(transfer.to),
            transfer.amount.format_with_code(&group.currency),
            from_width = from_width,
            to_width = to_width,
        ));
    }

    output
}
