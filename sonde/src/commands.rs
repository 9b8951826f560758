use crate::CLAP_STYLING;
use clap::{arg, command};
use std::path::PathBuf;

const REPORT_FORMATS: [&str; 3] = ["text", "json", "markdown"];
const DOCUMENT_FORMATS: [&str; 6] = ["openapi", "postman", "har", "wsdl", "api-blueprint", "raml"];

fn format_arg() -> clap::Arg {
    arg!(-f --"format" <FORMAT>)
        .required(false)
        .help("Report format: text, json, markdown")
        .value_parser(REPORT_FORMATS)
        .default_value("text")
}

fn output_arg() -> clap::Arg {
    arg!(-o --"output" <PATH>)
        .required(false)
        .help("Save report to file (default: display to screen)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn token_arg() -> clap::Arg {
    arg!(-t --"token" <TOKEN>)
        .required(false)
        .help("Bearer token sent as 'Authorization: Bearer <TOKEN>'")
}

fn slo_arg() -> clap::Arg {
    arg!(--"slo")
        .required(false)
        .help("Measure a latency and error-rate baseline for the discovered GET endpoints")
        .action(clap::ArgAction::SetTrue)
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sonde")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sonde")
        .about("Discover the API surface of a live target or an API description document")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress progress output").required(false))
        .arg(
            arg!(-v --"verbose" "Log discovery progress to stderr")
                .required(false)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .global(true)
                .help("JSON file overriding probe paths, timeouts and crawl limits"),
        )
        .subcommand_required(true)
        .subcommand(
            command!("discover")
                .about(
                    "Find an API description at a base URL: OpenAPI first, then GraphQL \
                introspection, then common REST paths.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The base URL of the target (http:// is assumed if omitted)"),
                )
                .arg(token_arg())
                .arg(slo_arg())
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl same-origin pages from a seed URL and mine links, forms and scripts \
                for API calls.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The seed URL to crawl (http:// is assumed if omitted)"),
                )
                .arg(token_arg())
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Maximum number of pages to visit (default from config: 30)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-depth" <N>)
                        .required(false)
                        .help("Maximum link depth from the seed (default from config: 2)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(slo_arg())
                .arg(format_arg())
                .arg(output_arg()),
        )
        .subcommand(
            command!("parse")
                .about("Extract endpoints from a local API description document")
                .arg(
                    arg!(--"format" <FORMAT>)
                        .id("document-format")
                        .required(true)
                        .help("Document format: openapi, postman, har, wsdl, api-blueprint, raml")
                        .value_parser(DOCUMENT_FORMATS),
                )
                .arg(
                    arg!(<FILE>)
                        .help("Path to the document")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"report-format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(REPORT_FORMATS)
                        .default_value("text"),
                )
                .arg(output_arg()),
        )
}
