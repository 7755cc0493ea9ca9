use std::{env, env::VarError};

// Printed with their values
const DISPLAY_ENVS: [&str; 22] = [
    "RUST_LOG",
    "TBP_HOST",
    "TBP_PORT",
    "TBP_DATABASE_URL",
    "TBP_RUN_MIGRATIONS",
    "TBP_USE_X_FORWARDED_FOR",
    "TBP_USE_FORWARDED",
    "TBP_GATEWAY_API_URL",
    "TBP_GATEWAY_TIMEOUT_MS",
    "TBP_GATEWAY_IP_WHITELIST",
    "TBP_WEBHOOK_TOLERANCE_SECS",
    "TBP_SEQUENCE_RPC_URL",
    "TBP_SEQUENCE_RPC_TIMEOUT_MS",
    "TBP_MAIL_API_URL",
    "TBP_MAIL_FROM",
    "TBP_NOTIFICATIONS_ENABLED",
    "TBP_CONFIRM_INITIAL_DELAY_MS",
    "TBP_CONFIRM_POLL_INTERVAL_MS",
    "TBP_CONFIRM_MAX_CHECKS",
    "TBP_CONFIRM_DEADLINE_MS",
    "TBP_ALLOW_MISSING_PICKUP_COLUMNS",
    "TBP_ALLOW_MISSING_PHONE_COLUMN",
];

// Printed as "set" or "Not set" only
const SECRET_ENVS: [&str; 3] = ["TBP_GATEWAY_API_KEY", "TBP_SEQUENCE_RPC_KEY", "TBP_MAIL_API_KEY"];

/// There's no real CLI for the server, so any argument prints the help and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    println!("Current environment values (secrets are only reported as set or not):");
    DISPLAY_ENVS.iter().for_each(|&name| println!("  {name:<35} {:<15}", env_value(name)));
    SECRET_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) if !s.trim().is_empty() => "set",
            _ => "Not set",
        };
        println!("  {name:<35} {val:<15}");
    });
}

fn env_value(name: &str) -> String {
    match env::var(name) {
        Ok(s) => s,
        Err(VarError::NotPresent) => "Not set".into(),
        Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
    }
}
