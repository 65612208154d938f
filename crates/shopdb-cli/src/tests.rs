use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["shopdb-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["shopdb-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shopdb-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_user_create_with_account_type() {
    let cli = Cli::try_parse_from([
        "shopdb-cli",
        "user",
        "create",
        "--email",
        "shop@example.com",
        "--account-type",
        "shop",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::User {
            command: UserCommands::Create {
                ref email,
                account_type: AccountType::Shop,
            }
        }) if email == "shop@example.com"
    ));
}

#[test]
fn user_create_rejects_unknown_account_type() {
    let result = Cli::try_parse_from([
        "shopdb-cli",
        "user",
        "create",
        "--email",
        "x@example.com",
        "--account-type",
        "admin",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_import_from_file() {
    let cli = Cli::try_parse_from([
        "shopdb-cli",
        "import",
        "--owner",
        "shop@example.com",
        "--file",
        "shop1.yaml",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            ref owner,
            file: Some(ref file),
            url: None,
            dry_run: false,
        }) if owner == "shop@example.com" && file == &PathBuf::from("shop1.yaml")
    ));
}

#[test]
fn parses_import_from_url_dry_run() {
    let cli = Cli::try_parse_from([
        "shopdb-cli",
        "import",
        "--owner",
        "shop@example.com",
        "--url",
        "https://supplier.test/shop1.yaml",
        "--dry-run",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Import {
            file: None,
            url: Some(_),
            dry_run: true,
            ..
        })
    ));
}

#[test]
fn import_requires_a_source() {
    let result = Cli::try_parse_from(["shopdb-cli", "import", "--owner", "shop@example.com"]);
    assert!(result.is_err());
}

#[test]
fn import_rejects_both_sources() {
    let result = Cli::try_parse_from([
        "shopdb-cli",
        "import",
        "--owner",
        "shop@example.com",
        "--file",
        "a.yaml",
        "--url",
        "https://supplier.test/a.yaml",
    ]);
    assert!(result.is_err());
}
