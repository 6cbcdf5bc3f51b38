use poidir_core::{Address, Coordinate, PlaceRecord};
use poidir_search::DeviceLocationSource;

use super::*;
use crate::app::format_place;
use crate::device::FixedDeviceLocation;
use crate::repl::{parse_line, ReplCommand};

#[test]
fn parses_search_with_multi_word_query() {
    let cli = Cli::try_parse_from(["poidir", "search", "coffee", "shop"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Search {
            ref query,
            category: None,
            json: false
        } if query.join(" ") == "coffee shop"
    ));
}

#[test]
fn parses_category_only_search() {
    let cli = Cli::try_parse_from(["poidir", "search", "--category", "catering"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Search {
            ref query,
            category: Some(ref c),
            ..
        } if query.is_empty() && c == "catering"
    ));
}

#[test]
fn parses_global_provider_flag() {
    let cli = Cli::try_parse_from(["poidir", "locate", "--provider", "here"]).unwrap();
    assert_eq!(cli.provider, Some(ProviderKind::Here));
    assert!(matches!(cli.command, Commands::Locate));
}

#[test]
fn rejects_unknown_provider() {
    assert!(Cli::try_parse_from(["poidir", "--provider", "bing", "repl"]).is_err());
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["poidir"]).is_err());
}

#[test]
fn plain_lines_are_queries() {
    assert_eq!(
        parse_line("tacos near uptown"),
        Ok(ReplCommand::Query("tacos near uptown".to_string()))
    );
    assert_eq!(parse_line(""), Ok(ReplCommand::Query(String::new())));
}

#[test]
fn parses_repl_directives() {
    assert_eq!(
        parse_line(":provider google"),
        Ok(ReplCommand::Provider(ProviderKind::Google))
    );
    assert_eq!(
        parse_line(":category  catering.cafe "),
        Ok(ReplCommand::Category("catering.cafe".to_string()))
    );
    assert_eq!(parse_line(":category"), Ok(ReplCommand::Category(String::new())));
    assert_eq!(parse_line(":device off"), Ok(ReplCommand::Device(false)));
    assert_eq!(
        parse_line(":location Charlotte, NC"),
        Ok(ReplCommand::Location("Charlotte, NC".to_string()))
    );
    assert_eq!(parse_line(":radius 5"), Ok(ReplCommand::Radius(5)));
    assert_eq!(parse_line(":reset"), Ok(ReplCommand::Reset));
    assert_eq!(parse_line(":quit"), Ok(ReplCommand::Quit));
}

#[test]
fn bad_repl_directives_are_errors() {
    assert!(parse_line(":device maybe").is_err());
    assert!(parse_line(":radius far").is_err());
    assert!(parse_line(":provider bing").is_err());
    assert!(parse_line(":teleport").is_err());
}

#[test]
fn formats_place_with_optional_lines() {
    let place = PlaceRecord {
        name: "Central Coffee".to_string(),
        address: Address {
            street: "1500 Central Ave".to_string(),
            city: "Charlotte".to_string(),
            state: "NC".to_string(),
            zip: "28205".to_string(),
            country: String::new(),
        },
        hours: vec!["Mo-Fr 07:00-15:00".to_string()],
        phone: Some("(704) 555-0123".to_string()),
        description: String::new(),
        website: None,
        coordinate: None,
        provider_place_id: None,
    };

    assert_eq!(
        format_place(0, &place),
        " 1. Central Coffee\n    1500 Central Ave, Charlotte, NC 28205\n    phone: (704) 555-0123\n    hours: Mo-Fr 07:00-15:00"
    );
}

#[tokio::test]
async fn fixed_device_reports_configured_position() {
    let fix = Coordinate::new(35.22, -80.84);
    assert_eq!(
        FixedDeviceLocation::new(Some(fix)).current_location().await,
        Ok(Some(fix))
    );
    assert_eq!(FixedDeviceLocation::new(None).current_location().await, Ok(None));
}
