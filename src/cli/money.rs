//! Money allocation command

use clap::Args;

use crate::display::format_allocation;
use crate::error::BudgetResult;
use crate::models::Money;

/// Split an amount into shares that add up to the original
#[derive(Args)]
pub struct AllocateArgs {
    /// Amount to split (e.g. "100" or "-10.00")
    #[arg(allow_hyphen_values = true)]
    pub amount: String,

    /// Currency code
    pub currency: String,

    /// Split into this many equal shares
    #[arg(long, required_unless_present = "ratios", conflicts_with = "ratios")]
    pub parts: Option<i32>,

    /// Split in proportion to these ratios (e.g. "1,2,3")
    #[arg(long, value_delimiter = ',')]
    pub ratios: Option<Vec<i32>>,
}

/// Handle the allocate command
pub fn handle_allocate_command(args: AllocateArgs) -> BudgetResult<()> {
    let money = Money::parse(&args.amount, &args.currency)?;
    let shares = match (args.parts, args.ratios) {
        (Some(parts), _) => money.allocate(parts)?,
        (None, Some(ratios)) => money.allocate_by_ratios(&ratios)?,
        (None, None) => money.allocate(1)?,
    };

    println!("Allocating {}:", money);
    print!("{}", format_allocation(&shares));
    Ok(())
}
