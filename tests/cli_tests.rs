use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const BIN_NAME: &str = "budget";

fn budget_command(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin(BIN_NAME).expect("binary exists");
    cmd.env("BUDGET_CORE_DATA_DIR", data_dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(data_dir: &TempDir, args: &[&str]) {
    budget_command(data_dir).args(args).assert().success();
}

#[test]
fn cli_init_creates_data_files() {
    let data_dir = TempDir::new().unwrap();

    budget_command(&data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(contains("Initialization complete"));

    assert!(data_dir.path().join("config.json").exists());
}

#[test]
fn cli_budget_lifecycle_end_to_end() {
    let data_dir = TempDir::new().unwrap();
    run(&data_dir, &["init"]);

    budget_command(&data_dir)
        .args(["create", "Household", "--period", "2025-05", "--currency", "usd"])
        .assert()
        .success()
        .stdout(contains("Created budget: Household").and(contains("USD")));

    budget_command(&data_dir)
        .args(["category", "add", "Household", "Housing"])
        .assert()
        .success()
        .stdout(contains("Category 'Housing' added"));

    run(&data_dir, &["category", "add-sub", "Household", "Housing", "Rent"]);
    run(&data_dir, &["category", "add", "Household", "Food"]);

    budget_command(&data_dir)
        .args(["category", "set-amount", "Household", "Rent", "950"])
        .assert()
        .success()
        .stdout(contains("Total planned: USD 950.00"));

    run(&data_dir, &["category", "set-amount", "household", "food", "420.50"]);

    budget_command(&data_dir)
        .args(["activate", "Household"])
        .assert()
        .success()
        .stdout(contains("is now Active"));

    budget_command(&data_dir)
        .args(["show", "Household"])
        .assert()
        .success()
        .stdout(
            contains("└── Rent USD 950.00")
                .and(contains("Status: Active"))
                .and(contains("Total planned: USD 1370.50")),
        );

    budget_command(&data_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("Household").and(contains("2025-05")));

    budget_command(&data_dir)
        .args(["audit", "--limit", "50"])
        .assert()
        .success()
        .stdout(contains("CREATE Budget").and(contains("UPDATE Budget")));
}

#[test]
fn cli_activate_without_amounts_fails() {
    let data_dir = TempDir::new().unwrap();
    run(&data_dir, &["init"]);
    run(&data_dir, &["create", "Empty", "--period", "2025-01"]);

    budget_command(&data_dir)
        .args(["activate", "Empty"])
        .assert()
        .failure()
        .stderr(contains("cannot be activated"));
}

#[test]
fn cli_unknown_budget_fails() {
    let data_dir = TempDir::new().unwrap();
    run(&data_dir, &["init"]);

    budget_command(&data_dir)
        .args(["show", "Nowhere"])
        .assert()
        .failure()
        .stderr(contains("Budget not found"));
}

#[test]
fn cli_delete_hides_budget() {
    let data_dir = TempDir::new().unwrap();
    run(&data_dir, &["init"]);
    run(&data_dir, &["create", "Holiday", "--period", "2025-07"]);
    run(&data_dir, &["category", "add", "Holiday", "Flights"]);

    budget_command(&data_dir)
        .args(["delete", "Holiday"])
        .assert()
        .success()
        .stdout(contains("1 categories cascaded"));

    budget_command(&data_dir)
        .args(["list"])
        .assert()
        .success()
        .stdout(contains("No budgets found"));
}

#[test]
fn cli_export_yaml() {
    let data_dir = TempDir::new().unwrap();
    run(&data_dir, &["init"]);
    run(&data_dir, &["create", "Household", "--period", "2025-05"]);

    budget_command(&data_dir)
        .args(["export", "Household", "--format", "yaml"])
        .assert()
        .success()
        .stdout(contains("name: Household"));
}

#[test]
fn cli_allocate_splits_without_losing_cents() {
    let data_dir = TempDir::new().unwrap();

    budget_command(&data_dir)
        .args(["allocate", "10", "USD", "--parts", "3"])
        .assert()
        .success()
        .stdout(contains("1. USD 3.34").and(contains("3. USD 3.33")));

    budget_command(&data_dir)
        .args(["allocate", "100", "EUR", "--ratios", "1,1,2"])
        .assert()
        .success()
        .stdout(contains("3. EUR 50.00"));
}

#[test]
fn cli_allocate_requires_parts_or_ratios() {
    let data_dir = TempDir::new().unwrap();

    budget_command(&data_dir)
        .args(["allocate", "10", "USD"])
        .assert()
        .failure();
}

#[test]
fn cli_allocate_rejects_huge_part_counts() {
    let data_dir = TempDir::new().unwrap();

    budget_command(&data_dir)
        .args(["allocate", "1", "USD", "--parts", "2147483647"])
        .assert()
        .failure()
        .stderr(contains("Invalid allocation"));
}
