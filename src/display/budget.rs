//! Budget display formatting
//!
//! Formats budgets for terminal output as a list and as a category tree.

use crate::audit::SoftDeletable;
use crate::error::BudgetResult;
use crate::models::{Budget, CategoryNode, DomainEvent, Money};

/// Format a one-line-per-budget list
pub fn format_budget_list(budgets: &[Budget]) -> BudgetResult<String> {
    if budgets.is_empty() {
        return Ok("No budgets found.\n\nRun 'budget create <name>' to add one.\n".to_string());
    }

    let name_width = budgets
        .iter()
        .map(|b| b.name().chars().count())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = format!(
        "{:<12}  {:<width$}  {:<7}  {:<6}  {:>14}\n",
        "ID",
        "Name",
        "Period",
        "Status",
        "Planned",
        width = name_width
    );
    for budget in budgets {
        output.push_str(&format!(
            "{:<12}  {:<width$}  {:<7}  {:<6}  {:>14}\n",
            budget.id().to_string(),
            budget.name(),
            budget.period().to_string(),
            budget.status().to_string(),
            budget.get_total()?.to_string(),
            width = name_width
        ));
    }
    Ok(output)
}

fn category_line(category: &CategoryNode, prefix: &str) -> String {
    let planned = category
        .planned_amount()
        .map(|m| format!(" {}", m))
        .unwrap_or_default();
    let deleted = if category.is_deleted() { " (deleted)" } else { "" };
    format!("{}{}{}{}\n", prefix, category.name(), planned, deleted)
}

/// Format a budget header followed by its category tree and totals
pub fn format_budget_tree(budget: &Budget) -> BudgetResult<String> {
    let mut output = format!(
        "{}  [{}]\n  Period: {}  Currency: {}  Status: {}\n\n",
        budget.name(),
        budget.id(),
        budget.period(),
        budget.currency(),
        budget.status()
    );

    let totals = budget.get_category_totals()?;
    if totals.is_empty() {
        output.push_str("  (no categories)\n");
    }
    for total in &totals {
        let Some(root) = budget.find_category(total.category_id) else {
            continue;
        };
        output.push_str(&category_line(root, "  "));

        let mut children: Vec<&CategoryNode> = root.children().iter().collect();
        children.sort_by_key(|c| c.display_order());
        for (i, child) in children.iter().enumerate() {
            let branch = if i + 1 == children.len() { "  └── " } else { "  ├── " };
            output.push_str(&category_line(child, branch));
        }
        if !root.is_leaf() {
            output.push_str(&format!("      subtotal: {}\n", total.total));
        }
    }

    output.push_str(&format!("\nTotal planned: {}\n", budget.get_total()?));
    Ok(output)
}

/// One event per line
pub fn format_events(events: &[DomainEvent]) -> String {
    events
        .iter()
        .map(|event| format!("  {}\n", event))
        .collect()
}

/// Numbered allocation shares
pub fn format_allocation(shares: &[Money]) -> String {
    shares
        .iter()
        .enumerate()
        .map(|(i, share)| format!("  {:>3}. {}\n", i + 1, share))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BudgetPeriod, UserId};
    use rust_decimal_macros::dec;

    fn household() -> Budget {
        let period = BudgetPeriod::new(2025, 5).unwrap();
        let mut budget = Budget::create(UserId::new(), "Household", period, "USD").unwrap();
        let housing = budget.add_category("Housing", None).unwrap();
        let rent = budget.add_subcategory(housing, "Rent", None).unwrap();
        budget.add_subcategory(housing, "Power", None).unwrap();
        budget
            .set_planned_amount(rent, Money::new(dec!(1200), "USD").unwrap())
            .unwrap();
        budget.add_category("Fun", None).unwrap();
        budget
    }

    #[test]
    fn test_empty_list() {
        assert!(format_budget_list(&[]).unwrap().contains("No budgets found"));
    }

    #[test]
    fn test_list_shows_total() {
        let output = format_budget_list(&[household()]).unwrap();
        assert!(output.contains("Household"));
        assert!(output.contains("2025-05"));
        assert!(output.contains("Draft"));
        assert!(output.contains("USD 1200.00"));
    }

    #[test]
    fn test_tree() {
        let output = format_budget_tree(&household()).unwrap();
        assert!(output.contains("  Housing\n"));
        assert!(output.contains("  ├── Rent USD 1200.00\n"));
        assert!(output.contains("  └── Power\n"));
        assert!(output.contains("subtotal: USD 1200.00"));
        assert!(output.contains("  Fun\n"));
        assert!(output.ends_with("Total planned: USD 1200.00\n"));
    }

    #[test]
    fn test_allocation() {
        let shares = Money::new(dec!(10), "USD").unwrap().allocate(3).unwrap();
        let output = format_allocation(&shares);
        assert!(output.contains("1. USD 3.34"));
        assert!(output.contains("3. USD 3.33"));
    }
}
