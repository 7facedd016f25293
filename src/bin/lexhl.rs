//! Command-line interface for lex-highlight
//! This binary converts a source file as a single highlighted block and inspects the
//! available highlighters.
//!
//! Usage:
//!   lexhl render `<path>` [--highlighter `<name>`] [--format html|json|yaml]
//!       Highlight a file as one source block
//!   lexhl stylesheet `<highlighter>` [--style `<style>`]
//!       Print a highlighter's CSS
//!   lexhl list
//!       List registered highlighters

use clap::{Arg, ArgAction, ArgMatches, Command};
use lex_highlight::config::{HighlightConfig, Loader};
use lex_highlight::security::HIGHLIGHTER_ATTRIBUTE;
use lex_highlight::{
    BlockAttributes, ConvertedBlock, CssMode, DocinfoLocation, DocumentAttributes,
    DocumentContext, HighlighterRegistry, LinenumsMode, SourceBlock,
};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let matches = Command::new("lexhl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Syntax highlighting for lex source blocks")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("Configuration file layered over the built-in defaults"),
        )
        .subcommand(
            Command::new("render")
                .about("Highlight a file as a single source block")
                .arg(
                    Arg::new("path")
                        .help("Path to the source file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("lang")
                        .long("lang")
                        .short('l')
                        .help("Language of the source (defaults to the file extension)"),
                )
                .arg(
                    Arg::new("highlighter")
                        .long("highlighter")
                        .short('H')
                        .help("Highlighter to use (e.g., 'syntect', 'highlight.js', 'prettify')"),
                )
                .arg(Arg::new("style").long("style").short('s').help("Highlighter style"))
                .arg(
                    Arg::new("css")
                        .long("css")
                        .value_parser(["class", "style"])
                        .help("Deliver token colours as classes or inline styles"),
                )
                .arg(
                    Arg::new("linenums")
                        .long("linenums")
                        .short('n')
                        .action(ArgAction::SetTrue)
                        .help("Number the lines"),
                )
                .arg(
                    Arg::new("linenums-mode")
                        .long("linenums-mode")
                        .value_parser(["table", "inline"])
                        .help("Line numbering layout"),
                )
                .arg(
                    Arg::new("start")
                        .long("start")
                        .value_parser(clap::value_parser!(i64))
                        .allow_negative_numbers(true)
                        .help("Number of the first line"),
                )
                .arg(
                    Arg::new("highlight")
                        .long("highlight")
                        .help("Lines to emphasize (e.g., '1,4-6', '2..;!5')"),
                )
                .arg(
                    Arg::new("no-callouts")
                        .long("no-callouts")
                        .action(ArgAction::SetTrue)
                        .help("Leave callout marks in the source as they are"),
                )
                .arg(
                    Arg::new("linkcss")
                        .long("linkcss")
                        .action(ArgAction::SetTrue)
                        .help("Link the stylesheet instead of embedding it"),
                )
                .arg(
                    Arg::new("safe")
                        .long("safe")
                        .help("Safe mode of the conversion (unsafe, safe, server, secure)"),
                )
                .arg(
                    Arg::new("standalone")
                        .long("standalone")
                        .action(ArgAction::SetTrue)
                        .help("Wrap the block in a minimal HTML page"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .value_parser(["html", "json", "yaml"])
                        .default_value("html")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("stylesheet")
                .about("Print the stylesheet of a highlighter")
                .arg(
                    Arg::new("highlighter")
                        .help("Highlighter name or alias")
                        .required(true)
                        .index(1),
                )
                .arg(Arg::new("style").long("style").short('s').help("Style name")),
        )
        .subcommand(Command::new("list").about("List registered highlighters"))
        .get_matches();

    // Global arguments live on the subcommand matches
    let Some((command, command_matches)) = matches.subcommand() else {
        unreachable!()
    };
    let safe = command_matches.try_get_one::<String>("safe").ok().flatten();
    let config = load_config(command_matches.get_one::<String>("config"), safe);

    match command {
        "render" => handle_render_command(&config, command_matches),
        "stylesheet" => {
            let name = command_matches.get_one::<String>("highlighter").unwrap();
            let style = command_matches.get_one::<String>("style");
            handle_stylesheet_command(&config, name, style.map(String::as_str));
        }
        "list" => handle_list_command(&config),
        _ => unreachable!(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn load_config(path: Option<&String>, safe: Option<&String>) -> HighlightConfig {
    let mut loader = Loader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    if let Some(safe) = safe {
        loader = loader
            .set_override("security.safe-mode", safe.as_str())
            .unwrap_or_else(|e| fail(e));
    }
    loader.build().unwrap_or_else(|e| fail(e))
}

/// Handle the render command
fn handle_render_command(config: &HighlightConfig, matches: &ArgMatches) {
    let path = matches.get_one::<String>("path").unwrap();
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| fail(format!("{}: {}", path, e)));
    let registry = config.registry();

    // Flags are document-declared attributes and go through the security gate
    let mut declared = DocumentAttributes::new();
    if let Some(name) = matches.get_one::<String>("highlighter") {
        declared.set(HIGHLIGHTER_ATTRIBUTE, name.as_str());
    }
    if matches.get_flag("linkcss") {
        declared.set("linkcss", "");
    }

    let language = matches.get_one::<String>("lang").cloned().or_else(|| {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_string)
    });
    let block = SourceBlock::new(language.as_deref(), &source).with_attributes(BlockAttributes {
        linenums: matches.get_flag("linenums"),
        start: matches.get_one::<i64>("start").copied(),
        highlight: matches.get_one::<String>("highlight").cloned(),
        callouts: !matches.get_flag("no-callouts"),
        line_comment: None,
    });

    let mut context = DocumentContext::new(
        declared,
        &config.trusted_attributes(),
        &config.security_policy(),
        &registry,
    );
    apply_engine_flags(&mut context, matches);
    let converted = context.convert_block(&block).unwrap_or_else(|e| fail(e));

    let format = matches.get_one::<String>("format").unwrap();
    let output = match format.as_str() {
        "json" => serde_json::to_string_pretty(&converted).unwrap_or_else(|e| fail(e)),
        "yaml" => serde_yaml::to_string(&converted).unwrap_or_else(|e| fail(e)),
        _ if matches.get_flag("standalone") => standalone_page(&mut context, &converted),
        _ => converted.html,
    };
    println!("{}", output);
}

/// Apply --style, --css and --linenums-mode to whichever engine the context resolved
fn apply_engine_flags(context: &mut DocumentContext, matches: &ArgMatches) {
    let style = matches.get_one::<String>("style");
    let css = matches.get_one::<String>("css");
    let linenums_mode = matches.get_one::<String>("linenums-mode");
    if style.is_none() && css.is_none() && linenums_mode.is_none() {
        return;
    }
    let applied = context.override_engine_settings(
        style.map(String::as_str),
        css.map(|value| CssMode::from_attribute(value)),
        linenums_mode.map(|value| LinenumsMode::from_attribute(value)),
    );
    if !applied {
        tracing::warn!(
            "no source highlighter is active, ignoring --style, --css and --linenums-mode"
        );
    }
}

fn standalone_page(context: &mut DocumentContext, converted: &ConvertedBlock) -> String {
    let head = context.docinfo(DocinfoLocation::Head);
    let footer = context.docinfo(DocinfoLocation::Footer);
    let mut page = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    if !head.is_empty() {
        page.push_str(&head);
        page.push('\n');
    }
    page.push_str("</head>\n<body>\n<div class=\"listingblock\">\n<div class=\"content\">\n");
    page.push_str(&converted.html);
    page.push_str("\n</div>\n</div>\n");
    if !footer.is_empty() {
        page.push_str(&footer);
        page.push('\n');
    }
    page.push_str("</body>\n</html>");
    page
}

/// Handle the stylesheet command
fn handle_stylesheet_command(config: &HighlightConfig, name: &str, style: Option<&str>) {
    let registry = config.registry();
    let highlighter = registry
        .resolve(name)
        .unwrap_or_else(|| fail(format!("Unknown highlighter '{}'", name)));
    match highlighter.read_stylesheet(style) {
        Some(css) => println!("{}", css),
        None => fail(format!("Highlighter '{}' has no stylesheet", name)),
    }
}

/// Handle the list command
fn handle_list_command(config: &HighlightConfig) {
    let registry: HighlighterRegistry = config.registry();
    println!("Available highlighters:\n");
    for descriptor in registry.descriptors() {
        let kind = if descriptor.supports_highlighting() {
            "highlighting"
        } else {
            "pass-through"
        };
        let aliases = if descriptor.aliases().is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", descriptor.aliases().join(", "))
        };
        println!("  {}{} [{}]", descriptor.name(), aliases, kind);
        let description = descriptor.highlighter().description().to_string();
        if !description.is_empty() {
            println!("      {}", description);
        }
    }
}
