use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "creg",
    about = "Certificate registry: issue, verify, and list academic certificates",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file (server settings plus a `[registry]` section)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Use a durable registry rooted at this directory
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Issue a certificate
    Issue(IssueArgs),
    /// Verify a certificate id
    Verify(VerifyArgs),
    /// List a student's certificates
    List(ListArgs),
    /// Download a certificate document
    Fetch(FetchArgs),
    /// Replay the ledger and check that every certificate's document is
    /// still in the blob store. A running server's student index is audited
    /// over HTTP (`GET /v1/audit`).
    Audit,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct IssueArgs {
    #[arg(long)]
    pub student_id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub course: String,
    /// One of A+, A, A-, B+, B, B-, C+, C, C-, Pass, Fail
    #[arg(long)]
    pub grade: String,
    /// Issuer account address
    #[arg(long)]
    pub issuer: String,
    /// Certificate document to store
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct VerifyArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub student_id: String,
}

#[derive(Args)]
pub struct FetchArgs {
    pub id: String,
    /// Output path
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Overrides `bind_addr` from the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_issue() {
        let cli = Cli::try_parse_from([
            "creg",
            "issue",
            "--student-id",
            "ST2024001",
            "--name",
            "John Doe",
            "--course",
            "Computer Science",
            "--grade",
            "A",
            "--issuer",
            "0xABC",
            "--file",
            "cert.pdf",
        ])
        .unwrap();
        if let Command::Issue(args) = cli.command {
            assert_eq!(args.student_id, "ST2024001");
            assert_eq!(args.course, "Computer Science");
            assert_eq!(args.file, PathBuf::from("cert.pdf"));
        } else {
            panic!("expected issue");
        }
    }

    #[test]
    fn issue_requires_file() {
        assert!(Cli::try_parse_from([
            "creg", "issue", "--student-id", "S", "--name", "N", "--course", "C", "--grade", "A",
            "--issuer", "I",
        ])
        .is_err());
    }

    #[test]
    fn parse_verify_with_globals() {
        let cli = Cli::try_parse_from([
            "creg",
            "verify",
            "cert:abcd",
            "--format",
            "json",
            "--data-dir",
            "/tmp/creg",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/creg")));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Verify(VerifyArgs { ref id }) if id == "cert:abcd"));
    }

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["creg", "list", "ST1"]).unwrap();
        assert!(matches!(cli.command, Command::List(ListArgs { ref student_id }) if student_id == "ST1"));
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn parse_audit() {
        let cli = Cli::try_parse_from(["creg", "audit"]).unwrap();
        assert!(matches!(cli.command, Command::Audit));
        assert!(Cli::try_parse_from(["creg", "audit", "--repair"]).is_err());
    }

    #[test]
    fn parse_serve_bind() {
        let cli = Cli::try_parse_from(["creg", "serve", "--bind", "0.0.0.0:9000", "-c", "creg.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("creg.toml")));
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.map(|a| a.port()), Some(9000));
        } else {
            panic!("expected serve");
        }
    }

    #[test]
    fn rejects_unknown_format() {
        assert!(Cli::try_parse_from(["creg", "list", "S", "--format", "xml"]).is_err());
    }
}
