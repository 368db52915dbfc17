//! Category CLI commands
//!
//! Every command edits one category inside one budget and runs as a
//! single save cycle.

use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::format_events;
use crate::error::BudgetResult;
use crate::models::Money;
use crate::services::resolve_category;
use crate::storage::Storage;

use super::budget_service;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a top-level category
    Add {
        /// Budget name or ID
        budget: String,
        /// Category name
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Add a subcategory under a top-level category
    #[command(name = "add-sub")]
    AddSub {
        /// Budget name or ID
        budget: String,
        /// Parent category name or ID
        parent: String,
        /// Subcategory name
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Rename a category
    Rename {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
        /// New name
        name: String,
    },

    /// Set a category's planned amount
    #[command(name = "set-amount")]
    SetAmount {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
        /// Amount in the budget's currency (e.g. "950" or "950.00")
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },

    /// Clear a category's planned amount
    #[command(name = "clear-amount")]
    ClearAmount {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
    },

    /// Remove a category with no subcategories and no planned amount
    #[command(alias = "rm")]
    Remove {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
    },

    /// Change a category's display order
    Reorder {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
        /// New display order (zero or greater)
        #[arg(allow_hyphen_values = true)]
        order: i32,
    },

    /// Set or clear a category's description
    Describe {
        /// Budget name or ID
        budget: String,
        /// Category name or ID
        category: String,
        /// New description; omit to clear it
        description: Option<String>,
    },
}

/// Handle a category command
pub fn handle_category_command(
    storage: &Storage,
    settings: &Settings,
    cmd: CategoryCommands,
) -> BudgetResult<()> {
    let service = budget_service(storage, settings)?;

    let committed = match cmd {
        CategoryCommands::Add {
            budget,
            name,
            description,
        } => service.update(&budget, |b| {
            b.add_category(&name, description.as_deref())?;
            Ok(())
        })?,

        CategoryCommands::AddSub {
            budget,
            parent,
            name,
            description,
        } => service.update(&budget, |b| {
            let parent_id = resolve_category(b, &parent)?;
            b.add_subcategory(parent_id, &name, description.as_deref())?;
            Ok(())
        })?,

        CategoryCommands::Rename {
            budget,
            category,
            name,
        } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            b.rename_category(id, &name)
        })?,

        CategoryCommands::SetAmount {
            budget,
            category,
            amount,
        } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            let amount = Money::parse(&amount, b.currency())?;
            b.set_planned_amount(id, amount)?;
            Ok(())
        })?,

        CategoryCommands::ClearAmount { budget, category } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            b.clear_planned_amount(id)?;
            Ok(())
        })?,

        CategoryCommands::Remove { budget, category } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            b.remove_category(id)
        })?,

        CategoryCommands::Reorder {
            budget,
            category,
            order,
        } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            b.reorder_category(id, order)
        })?,

        CategoryCommands::Describe {
            budget,
            category,
            description,
        } => service.update(&budget, |b| {
            let id = resolve_category(b, &category)?;
            b.update_category_description(id, description.as_deref())
        })?,
    };

    print!("{}", format_events(&committed.events));
    println!("Total planned: {}", committed.budget.get_total()?);
    Ok(())
}
