use crate::commands::{
    run_contact, run_documents, run_login, run_logout, run_properties, run_register,
    run_requests, run_whoami, ContactArgs, DocumentsCommand, LoginArgs, PropertiesCommand,
    RegisterArgs, RequestsCommand,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use rentify::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "rentify-api",
    about = "Serve the Rentify registration front or drive the platform from a terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Log in and store the session on disk
    Login(LoginArgs),
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account and upload identity documents
    Register(RegisterArgs),
    /// Browse and manage listings
    Properties {
        #[command(subcommand)]
        command: PropertiesCommand,
    },
    /// Own documents and the admin review queue
    Documents {
        #[command(subcommand)]
        command: DocumentsCommand,
    },
    /// Rental requests for the logged-in user
    Requests {
        #[command(subcommand)]
        command: RequestsCommand,
    },
    /// Send a message through the contact form
    Contact(ContactArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Login(args) => run_login(args).await,
        Command::Logout => run_logout(),
        Command::Whoami => run_whoami().await,
        Command::Register(args) => run_register(args).await,
        Command::Properties { command } => run_properties(command).await,
        Command::Documents { command } => run_documents(command).await,
        Command::Requests { command } => run_requests(command).await,
        Command::Contact(args) => run_contact(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["rentify-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn register_collects_repeated_documents() {
        let cli = Cli::try_parse_from([
            "rentify-api",
            "register",
            "--first-name",
            "Juan",
            "--last-name",
            "Pérez",
            "--rut",
            "12345678-9",
            "--email",
            "juan@test.com",
            "--phone",
            "+56912345678",
            "--birth-date",
            "1995-05-15",
            "--password",
            "password123",
            "--account-kind",
            "arriendatario",
            "--document",
            "DNI=cedula.pdf",
            "--document",
            "LIQUIDACION_SUELDO=liquidacion.pdf",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Register(args)) => {
                assert_eq!(args.documents.len(), 2);
                assert_eq!(args.confirm_password, None);
            }
            other => panic!("expected register, got {other:?}"),
        }
    }

    #[test]
    fn reject_requires_observations() {
        assert!(Cli::try_parse_from(["rentify-api", "documents", "reject", "4"]).is_err());
        assert!(Cli::try_parse_from([
            "rentify-api",
            "documents",
            "reject",
            "4",
            "--observations",
            "Documento vencido"
        ])
        .is_ok());
    }
}
