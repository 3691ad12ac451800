use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("seolens")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("seolens")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log progress and collector details to stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Initializes the seolens config directory, scoring config and audit database")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Location of the seolens config directory")
                        .default_value("~/.config/seolens/"),
                )
                .arg(
                    arg!(-f - -"force")
                        .help(
                            "Overwrite any existing scoring config and audit database at the \
                        specified location.",
                        )
                        .required(false),
                ),
        )
        .subcommand(
            command!("audit")
                .about(
                    "Crawl a site, detect technical SEO issues and score them by business \
                impact.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("A single URL to audit")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with_all(["hosts-file", "sitemap"]),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to audit")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with_all(["url", "sitemap"]),
                )
                .arg(
                    arg!(--"sitemap" <URL>)
                        .required(false)
                        .help("Audit every URL listed in an XML sitemap")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"site" <NAME>)
                        .required(false)
                        .help("Site name used to link audit runs (default: host of the first URL)"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers fetching pages concurrently.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(--"limit" <NUM_URLS>)
                        .required(false)
                        .help("Audit at most this many URLs")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("Scoring config (default: ~/.config/seolens/scoring.json if present)"),
                )
                .arg(
                    arg!(--"search-data" <PATH>)
                        .required(false)
                        .help("JSON export of search performance rows (url, impressions, clicks, ctr, position)"),
                )
                .arg(
                    arg!(--"top-pages" <NUM_PAGES>)
                        .required(false)
                        .help("Top pages per domain by impressions to add to the audit")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"pagespeed-key" <KEY>)
                        .required(false)
                        .help("PageSpeed Insights API key (default: $PAGESPEED_API_KEY)"),
                )
                .arg(
                    arg!(--"pagespeed-limit" <NUM_URLS>)
                        .required(false)
                        .help("Number of URLs to test with PageSpeed Insights")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("5"),
                )
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Audit database (default: ~/.config/seolens/seolens.db)")
                        .conflicts_with("no-history"),
                )
                .arg(
                    arg!(--"no-history")
                        .required(false)
                        .help("Do not compare against or record to the audit database")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("report")
                .about("Render the most recent stored audit")
                .arg(
                    arg!(--"db" <PATH>)
                        .required(false)
                        .help("Audit database (default: ~/.config/seolens/seolens.db)"),
                )
                .arg(
                    arg!(--"site" <NAME>)
                        .required(false)
                        .help("Only consider runs of this site"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, csv")
                        .value_parser(["text", "json", "csv"])
                        .default_value("text"),
                ),
        )
}
