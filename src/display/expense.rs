//! Expense display formatting
//!
//! Formats expenses for terminal output in table and detail views.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{Expense, Group};

#[derive(Tabled)]
struct ExpenseRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Paid by")]
    payer: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Split")]
    split: String,
    #[tabled(rename = "Outstanding")]
    outstanding: String,
}

/// Format a group's expenses as a table
pub fn format_expense_list(group: &Group, expenses: &[Expense], date_format: &str) -> String {
    if expenses.is_empty() {
        return format!("No expenses recorded in '{}'.", group.name);
    }

    let rows = expenses.iter().map(|e| ExpenseRow {
        id: e.id.to_string(),
        date: e.created_at.format(date_format).to_string(),
        description: if e.is_settlement() {
            format!("[settlement] {}", e.description)
        } else {
            e.description.clone()
        },
        payer: group.member_name(e.payer),
        amount: e.amount.to_string(),
        split: e.method.to_string(),
        outstanding: outstanding_excluding_payer(e).to_string(),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// What the other participants still owe the payer
fn outstanding_excluding_payer(expense: &Expense) -> crate::models::Money {
    expense
        .splits
        .iter()
        .filter(|s| s.member_id != expense.payer)
        .map(|s| s.outstanding())
        .sum()
}

/// Format a single expense with its splits
pub fn format_expense_details(group: &Group, expense: &Expense, date_format: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}: {}\n", expense.kind, expense.description));
    output.push_str(&format!("  ID:      {}\n", expense.id));
    output.push_str(&format!("  Group:   {}\n", group.name));
    output.push_str(&format!(
        "  Date:    {}\n",
        expense.created_at.format(date_format)
    ));
    output.push_str(&format!("  Paid by: {}\n", group.member_name(expense.payer)));
    output.push_str(&format!(
        "  Amount:  {}\n",
        expense.amount.format_with_code(&group.currency)
    ));
    output.push_str(&format!("  Split:   {}\n", expense.method));
    output.push('\n');

    let name_width = expense
        .splits
        .iter()
        .map(|s| group.member_name(s.member_id).len())
        .max()
        .unwrap_or(6)
        .max(6);

    output.push_str(&format!(
        "  {:<name_width$}  {:>10}  {:>8}  {:>10}  {:>10}\n",
        "Member",
        "Share",
        "Pct",
        "Repaid",
        "Owes",
        name_width = name_width,
    ));
    for split in &expense.splits {
        let pct = split
            .percentage
            .map(|p| p.to_string())
            .unwrap_or_default();
        let owes = if split.member_id == expense.payer {
            "-".to_string()
        } else {
            split.outstanding().to_string()
        };
        output.push_str(&format!(
            "  {:<name_width$}  {:>10}  {:>8}  {:>10}  {:>10}\n",
            group.member_name(split.member_id),
            split.amount.to_string(),
            pct,
            split.repaid().to_string(),
            owes,
            name_width = name_width,
        ));
    }

    output
}
