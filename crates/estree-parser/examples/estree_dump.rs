//! Print the ESTree JSON for a JavaScript file.
//!
//! ```text
//! cargo run --example estree_dump -- input.js '{"sourceType":"module","loc":true}'
//! RUST_LOG=estree_parser=trace cargo run --example estree_dump -- input.js
//! ```
//!
//! The optional second argument is a JSON options object. Parse errors are
//! rendered with miette, pointing into the source.

use miette::{IntoDiagnostic, NamedSource, Result, WrapErr};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use estree_parser::{parse, ParserOptions};

/// Logging belongs to the executable; the library only emits events.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        miette::bail!("usage: estree_dump <file> [options-json]");
    };
    let options: ParserOptions = match args.next() {
        Some(json) => serde_json::from_str(&json)
            .into_diagnostic()
            .wrap_err("invalid options object")?,
        None => ParserOptions::default(),
    };

    let source = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {path}"))?;

    tracing::info!(path = %path, bytes = source.len(), "parsing");
    let program = match parse(&source, options.clone()) {
        Ok(program) => program,
        Err(err) => {
            return Err(miette::Report::new(err).with_source_code(NamedSource::new(path, source)));
        }
    };

    let tree = program.to_estree(&source, &options);
    let json = serde_json::to_string_pretty(&tree).into_diagnostic()?;
    println!("{json}");
    Ok(())
}
