//! Group display formatting

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::Group;

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Currency")]
    currency: String,
    #[tabled(rename = "Split")]
    split: String,
    #[tabled(rename = "Members")]
    members: usize,
}

/// Format groups as a table
pub fn format_group_list(groups: &[Group]) -> String {
    if groups.is_empty() {
        return "No groups found. Create one with `tally group create <name>`.".to_string();
    }

    let rows = groups.iter().map(|g| GroupRow {
        id: g.id.to_string(),
        name: g.name.clone(),
        currency: g.currency.clone(),
        split: g.default_split.to_string(),
        members: g.active_members().count(),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Format a single group with its member roster
pub fn format_group_details(group: &Group, expense_count: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Group: {}\n", group.name));
    output.push_str(&format!("  ID:            {}\n", group.id));
    output.push_str(&format!("  Currency:      {}\n", group.currency));
    output.push_str(&format!("  Default split: {}\n", group.default_split));
    output.push_str(&format!("  Expenses:      {}\n", expense_count));
    output.push('\n');

    if group.members.is_empty() {
        output.push_str("  No members yet.\n");
    } else {
        output.push_str("  Members:\n");
        for (position, member) in group.members.iter().enumerate() {
            let status = match member.left_at {
                Some(left) => format!(" (left {})", left.format("%Y-%m-%d")),
                None => String::new(),
            };
            output.push_str(&format!(
                "    {}. {} [{}]{}\n",
                position + 1,
                member.name,
                member.id,
                status
            ));
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        group.created_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
