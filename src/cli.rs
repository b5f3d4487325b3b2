use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "zipstream")]
#[command(version)]
#[command(about = "Stream local files and remote URLs into a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipstream -o out.zip a.txt b.pdf           archive two local files into out.zip\n  \
  zipstream -o out.zip https://example.com/report.pdf   archive a remote file\n  \
  zipstream a.txt | ssh host 'cat > a.zip'   stream the archive through a pipe")]
pub struct Cli {
    /// Files to archive: local paths or http(s) URLs
    #[arg(value_name = "SOURCE", required = true)]
    pub sources: Vec<String>,

    /// Write the archive to FILE (default: stdout)
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Deflate compression level (0-9)
    #[arg(long, value_name = "N", default_value_t = 6)]
    pub level: u32,

    /// Quiet mode (no summary)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }
}
