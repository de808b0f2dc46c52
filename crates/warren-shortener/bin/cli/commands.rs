use crate::cli::DirectionArg;
use clap::{Parser, Subcommand};
use serde::Serialize;
use warren_shortener::{
    IndexViolation, KeyspaceDump, RankedCode, Ranking, ShortCode, ShortenParams, Shortener,
    ShortenerError, ShortenerService,
};
use warren_store::OrderedStore;

#[derive(Debug, Parser)]
#[command(name = "command", no_binary_name = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shorten a URL, optionally under a chosen alias
    Create { url: String, alias: Option<String> },
    /// Print the URL behind a code and count the access
    Resolve { code: String },
    /// Codes with the highest or lowest access count, ties included
    Rank { direction: DirectionArg },
    /// A page of codes from one end of the popularity order
    Top {
        direction: DirectionArg,
        #[arg(default_value_t = 5)]
        limit: usize,
    },
    /// How often a code has been resolved
    Count { code: String },
    /// Print every table
    Dump,
    /// Check the access counters against the popularity index
    Audit,
    /// Leave the command loop
    #[command(alias = "exit")]
    Quit,
}

pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Output {
    Created { code: ShortCode, short_url: String },
    Resolved { code: ShortCode, url: String },
    Ranked(Ranking),
    Page(Vec<RankedCode>),
    Count { code: ShortCode, count: u64 },
    Dump(KeyspaceDump),
    Audit { violations: Vec<IndexViolation> },
}

impl Output {
    fn render(&self) -> String {
        match self {
            Output::Created { code, short_url } => format!("{code}\t{short_url}"),
            Output::Resolved { url, .. } => url.clone(),
            Output::Ranked(ranking) => {
                let codes: Vec<&str> = ranking.codes.iter().map(ShortCode::as_str).collect();
                format!("{}\t{}", ranking.count, codes.join(" "))
            }
            Output::Page(page) => page
                .iter()
                .map(|entry| format!("{}\t{}", entry.count, entry.code))
                .collect::<Vec<_>>()
                .join("\n"),
            Output::Count { code, count } => format!("{code} was accessed {count} times"),
            Output::Dump(dump) => {
                let mut lines = vec![format!("cursor\t{}", dump.cursor)];
                lines.extend(
                    dump.mappings
                        .iter()
                        .map(|row| format!("urls\t{}\t{}", row.code, row.url)),
                );
                lines.extend(
                    dump.counters
                        .iter()
                        .map(|entry| format!("stats\t{}\t{}", entry.code, entry.count)),
                );
                lines.extend(
                    dump.index
                        .iter()
                        .map(|entry| format!("reverse\t{}\t{}", entry.count, entry.code)),
                );
                lines.join("\n")
            }
            Output::Audit { violations } if violations.is_empty() => "ok".to_string(),
            Output::Audit { violations } => violations
                .iter()
                .map(|violation| format!("{violation:?}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// Codes outside the alphabet can never be registered.
fn parse_code(code: &str) -> Result<ShortCode, ShortenerError> {
    ShortCode::new(code).map_err(|_| ShortenerError::NotFound(code.to_string()))
}

async fn execute<S: OrderedStore>(
    service: &ShortenerService<S>,
    command: Command,
) -> Result<Option<Output>, ShortenerError> {
    let output = match command {
        Command::Create { url, alias } => {
            let mut params = ShortenParams::new(url);
            params.custom_alias = alias;
            let code = service.create(params).await?;
            let short_url = service.short_url(&code);
            Output::Created { code, short_url }
        }
        Command::Resolve { code } => {
            let code = parse_code(&code)?;
            let url = service.resolve(&code).await?;
            Output::Resolved { code, url }
        }
        Command::Rank { direction } => Output::Ranked(service.rank(direction.into()).await?),
        Command::Top { direction, limit } => {
            Output::Page(service.leaderboard(direction.into(), limit).await?)
        }
        Command::Count { code } => {
            let code = parse_code(&code)?;
            let count = service.count_of(&code).await?;
            Output::Count { code, count }
        }
        Command::Dump => Output::Dump(service.dump().await?),
        Command::Audit => Output::Audit {
            violations: service.audit().await?,
        },
        Command::Quit => return Ok(None),
    };
    Ok(Some(output))
}

/// Runs one input line.
///
/// Domain errors are reported and the loop goes on; storage errors are
/// returned because the store can no longer be trusted.
pub async fn run<S: OrderedStore>(
    service: &ShortenerService<S>,
    line: &str,
    json: bool,
) -> anyhow::Result<Flow> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(Flow::Continue);
    }

    let command = match Line::try_parse_from(tokens) {
        Ok(line) => line.command,
        Err(err) => {
            println!("{err}");
            return Ok(Flow::Continue);
        }
    };

    match execute(service, command).await {
        Ok(None) => Ok(Flow::Quit),
        Ok(Some(output)) => {
            if json {
                println!("{}", serde_json::to_string(&output)?);
            } else {
                println!("{}", output.render());
            }
            Ok(Flow::Continue)
        }
        Err(ShortenerError::Store(err)) => Err(err.into()),
        Err(err) => {
            if json {
                println!("{}", serde_json::json!({ "error": err.to_string() }));
            } else {
                println!("error: {err}");
            }
            Ok(Flow::Continue)
        }
    }
}
