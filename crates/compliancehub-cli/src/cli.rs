use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chub", version, about = "ComplianceHub command-line client")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(long, global = true, value_name = "FILE", help = "YAML client config")]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "COMPLIANCEHUB_SESSION_FILE",
        help = "Where the login session is kept [default: ~/.compliancehub/session.json]"
    )]
    pub session_file: Option<PathBuf>,
    #[arg(long, global = true, help = "API base URL, e.g. https://grc.example.com/api")]
    pub base_url: Option<String>,
    #[arg(long, global = true, value_name = "ID", help = "Act for this company")]
    pub company: Option<String>,
    #[arg(short, long, global = true, action = ArgAction::Count, help = "More logging (-v info, -vv debug)")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COMPLIANCEHUB_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    /// Show the logged-in user and selected company
    Whoami,
    Register(RegisterArgs),
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },
    Company {
        #[command(subcommand)]
        command: CompanyCommands,
    },
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    Departments {
        #[command(subcommand)]
        command: DepartmentCommands,
    },
    Frameworks {
        #[command(subcommand)]
        command: FrameworkCommands,
    },
    Controls {
        #[command(subcommand)]
        command: ControlCommands,
    },
    Evidence {
        #[command(subcommand)]
        command: EvidenceCommands,
    },
    Compliance {
        #[command(subcommand)]
        command: ComplianceCommands,
    },
    /// Compliance, control and evidence summary in one view
    Dashboard,
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long, env = "COMPLIANCEHUB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    #[arg(long, default_value = "")]
    pub first_name: String,
    #[arg(long, default_value = "")]
    pub last_name: String,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    Show,
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommands {
    /// Change the password of the logged-in user
    Change,
    /// Ask for a reset link by email
    Reset {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset token
    Confirm {
        #[arg(long)]
        token: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum CompanyCommands {
    List,
    /// Create a company and become its owner
    Create { name: String },
    /// Select the company later commands act for
    Use { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TeamCommands {
    Members,
    Role { membership: String, role: String },
    Remove { membership: String },
    Invite {
        #[arg(long)]
        email: Option<String>,
        #[arg(long, default_value = "viewer")]
        role: String,
    },
    Invitations,
    Revoke { invitation: String },
    Accept { token: String },
}

#[derive(Subcommand, Debug)]
pub enum DepartmentCommands {
    List,
    Tree,
    Create {
        name: String,
        #[arg(long)]
        code: Option<String>,
        #[arg(long)]
        parent: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum FrameworkCommands {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: String },
    Requirements {
        id: String,
        #[arg(long, help = "Print the requirement hierarchy")]
        tree: bool,
    },
    /// Start a compliance program for a framework
    Adopt {
        id: String,
        #[arg(long, value_name = "YYYY-MM-DD")]
        target_date: Option<chrono::NaiveDate>,
        #[arg(long)]
        scope: Option<String>,
    },
    Adoptions {
        #[arg(long, help = "Only implementing, operational or certified programs")]
        active: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ControlCommands {
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Apply one reference control
    Apply {
        reference_control: String,
        #[arg(long)]
        department: Option<String>,
    },
    /// Apply every control mapped to a framework
    ApplyFramework {
        framework: String,
        #[arg(long)]
        department: Option<String>,
    },
    Dashboard,
    Overdue,
    Deficient,
}

#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long = "type")]
        evidence_type: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    Show { id: String },
    Upload(UploadArgs),
    Download {
        id: String,
        #[arg(short, long, help = "Target file [default: server file name]")]
        output: Option<PathBuf>,
    },
    Approve {
        id: String,
        #[arg(long, default_value = "")]
        notes: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },
    Pending,
    Expired,
    /// Link evidence to an applied control
    Link {
        evidence: String,
        control: String,
        #[arg(long, value_enum, default_value_t = LinkKind::Implementation)]
        link_type: LinkKind,
    },
    /// Storage used against the plan quota
    Quota,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    pub path: PathBuf,
    #[arg(long, help = "Display name [default: file name]")]
    pub name: Option<String>,
    #[arg(long = "type", value_enum, default_value_t = EvidenceKind::Other)]
    pub evidence_type: EvidenceKind,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub valid_until: Option<chrono::NaiveDate>,
    #[arg(long)]
    pub confidential: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EvidenceKind {
    Policy,
    Procedure,
    Screenshot,
    Report,
    Log,
    Certificate,
    Configuration,
    ScanResult,
    AuditReport,
    TrainingRecord,
    Other,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LinkKind {
    Implementation,
    Testing,
    Monitoring,
    Documentation,
    Audit,
}

#[derive(Subcommand, Debug)]
pub enum ComplianceCommands {
    Overview,
    /// Score a framework now
    Calculate {
        framework: Option<String>,
        #[arg(long, conflicts_with = "framework", help = "Score every adopted framework")]
        all: bool,
        #[arg(long)]
        department: Option<String>,
    },
    /// Current result of each framework
    Results,
    Gaps {
        #[arg(long)]
        severity: Option<String>,
        #[arg(long, help = "Only gaps past their due date")]
        overdue: bool,
    },
    Trends {
        framework: String,
        #[arg(long, default_value_t = 12)]
        months: u32,
    },
    Recommendations { framework: String },
    /// Queue a compliance report
    Report {
        #[arg(long = "type", value_enum, default_value_t = ReportKind::Summary)]
        report_type: ReportKind,
        #[arg(long, value_enum, default_value_t = ReportFileFormat::Pdf)]
        format: ReportFileFormat,
        #[arg(long)]
        framework: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportKind {
    Summary,
    Detailed,
    GapAnalysis,
    EvidenceMatrix,
    ControlMatrix,
    AuditReport,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum ReportFileFormat {
    Pdf,
    Excel,
    Csv,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "chub", "evidence", "list", "--status", "pending", "--json", "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Evidence {
                command: EvidenceCommands::List { status, .. },
            } => assert_eq!(status.as_deref(), Some("pending")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_upload_defaults() {
        let cli = Cli::try_parse_from(["chub", "evidence", "upload", "policy.pdf"]).unwrap();
        let Commands::Evidence {
            command: EvidenceCommands::Upload(args),
        } = cli.command
        else {
            panic!("expected upload");
        };
        assert_eq!(args.path, PathBuf::from("policy.pdf"));
        assert!(matches!(args.evidence_type, EvidenceKind::Other));
        assert!(!args.confidential);
    }

    #[test]
    fn test_kebab_case_values() {
        let cli = Cli::try_parse_from([
            "chub",
            "compliance",
            "report",
            "--type",
            "gap-analysis",
            "--format",
            "csv",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Compliance {
                command: ComplianceCommands::Report {
                    report_type: ReportKind::GapAnalysis,
                    format: ReportFileFormat::Csv,
                    ..
                }
            }
        ));
    }

    #[test]
    fn test_calculate_all_conflicts_with_framework() {
        assert!(Cli::try_parse_from(["chub", "compliance", "calculate", "f-1", "--all"]).is_err());
        assert!(Cli::try_parse_from(["chub", "compliance", "calculate", "--all"]).is_ok());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["chub"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
