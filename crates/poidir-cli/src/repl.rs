//! Interactive mode: every input line is treated as the search box's new
//! text, so typing several lines quickly exercises the debounce.

use poidir_core::ProviderKind;
use poidir_search::{SearchFailure, SearchPhase};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app::{print_places, App};

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ReplCommand {
    Query(String),
    Provider(ProviderKind),
    Category(String),
    Reset,
    Device(bool),
    Location(String),
    Radius(u32),
    Quit,
}

/// Parses one input line. Lines not starting with `:` are queries.
pub(crate) fn parse_line(line: &str) -> Result<ReplCommand, String> {
    let Some(directive) = line.trim().strip_prefix(':') else {
        return Ok(ReplCommand::Query(line.to_string()));
    };
    let (name, arg) = directive
        .split_once(char::is_whitespace)
        .map_or((directive, ""), |(n, a)| (n, a.trim()));

    match name {
        "provider" => arg
            .parse()
            .map(ReplCommand::Provider)
            .map_err(|e| format!("{e}")),
        "category" => Ok(ReplCommand::Category(arg.to_string())),
        "reset" => Ok(ReplCommand::Reset),
        "device" => match arg {
            "on" => Ok(ReplCommand::Device(true)),
            "off" => Ok(ReplCommand::Device(false)),
            other => Err(format!("expected `:device on` or `:device off`, got {other:?}")),
        },
        "location" => Ok(ReplCommand::Location(arg.to_string())),
        "radius" => arg
            .parse::<u32>()
            .map(ReplCommand::Radius)
            .map_err(|_| format!("radius must be a whole number of miles, got {arg:?}")),
        "quit" | "q" | "exit" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command :{other}")),
    }
}

/// Runs the REPL until `:quit` or end of input.
///
/// # Errors
///
/// Returns an error if reading standard input fails.
pub(crate) async fn run_repl(app: &App) -> anyhow::Result<()> {
    println!(
        "provider: {}. Type to search; :provider, :category, :reset, :device on|off, :location, :radius, :quit",
        app.coordinator.provider()
    );

    let mut updates = app.coordinator.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match (state.phase, state.failure) {
                (SearchPhase::Failed, Some(SearchFailure::LocationPermissionDenied)) => {
                    println!("location permission denied");
                }
                (SearchPhase::Published, _) => {
                    println!("-- {} result(s) for {:?}", state.results.len(), state.query.trim());
                    print_places(&state.results);
                }
                _ => {}
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            Ok(ReplCommand::Query(text)) => app.coordinator.on_query_changed(&text),
            Ok(ReplCommand::Provider(kind)) => app.store.set_provider(kind),
            Ok(ReplCommand::Category(code)) => app.coordinator.on_category_selected(&code),
            Ok(ReplCommand::Reset) => app.coordinator.reset_search(),
            Ok(ReplCommand::Device(enabled)) => app.store.set_use_device_location(enabled),
            Ok(ReplCommand::Location(text)) => app.store.set_default_location(&text),
            Ok(ReplCommand::Radius(miles)) => app.store.set_search_radius_miles(miles),
            Ok(ReplCommand::Quit) => break,
            Err(message) => eprintln!("{message}"),
        }
    }

    printer.abort();
    Ok(())
}
