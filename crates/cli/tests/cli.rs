use assert_cmd::Command;
use predicates::str::contains;

fn production_admin() -> Command {
    Command::cargo_bin("production-admin").unwrap()
}

#[test]
fn help_lists_the_routines() {
    production_admin()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("seed"))
        .stdout(contains("update-status"))
        .stdout(contains("report"));
}

#[test]
fn unknown_status_is_rejected_before_connecting() {
    production_admin()
        .args(["update-status", "--status", "SHIPPED"])
        .assert()
        .failure()
        .stderr(contains("invalid production status 'SHIPPED'"));
}

#[test]
fn non_numeric_order_id_is_rejected_before_connecting() {
    production_admin()
        .args(["update-status", "--order-id", "A-17"])
        .assert()
        .failure()
        .stderr(contains("is not an integer"));
}
