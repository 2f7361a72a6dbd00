use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-digest")]
#[command(about = "Fetch a web page and extract its metadata or cleaned HTML")]
#[command(version)]
pub struct Args {
    /// URL of the page to fetch
    pub url: String,

    /// Ask the rendering proxy to execute page scripts from the first attempt
    #[arg(short, long)]
    pub render: bool,

    /// What to print
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Overview)]
    pub format: OutputFormat,

    /// Byte cap for `--format clean`
    #[arg(long)]
    pub max_bytes: Option<usize>,

    /// JSON file with fetch settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Labelled lines, one per extracted value
    Overview,
    /// Full extraction record as JSON
    Json,
    /// Sanitized, compacted HTML
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["page-digest", "https://example.com"]);
        assert_eq!(args.url, "https://example.com");
        assert!(!args.render);
        assert_eq!(args.format, OutputFormat::Overview);
        assert!(args.max_bytes.is_none());
    }

    #[test]
    fn test_clean_with_cap() {
        let args = Args::parse_from([
            "page-digest",
            "--format",
            "clean",
            "--max-bytes",
            "100",
            "--render",
            "https://example.com",
        ]);
        assert_eq!(args.format, OutputFormat::Clean);
        assert_eq!(args.max_bytes, Some(100));
        assert!(args.render);
    }
}
