use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

mod users {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[derive(Parser, Debug)]
#[command(name = "ledger_admin")]
#[command(about = "Admin utilities for the team ledger (bootstrap users/teams)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./team_ledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Team(Team),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Creates a login, the password is asked on the terminal.
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
}

#[derive(Args, Debug)]
struct Team {
    #[command(subcommand)]
    command: TeamCommand,
}

#[derive(Subcommand, Debug)]
enum TeamCommand {
    /// Creates a team, `owner` becomes its Owner.
    Create(TeamCreateArgs),
    /// Adds a member on behalf of an existing member who outranks `role`.
    AddMember(AddMemberArgs),
    /// Prints the members of a team.
    Members(MembersArgs),
}

#[derive(Args, Debug)]
struct TeamCreateArgs {
    #[arg(long)]
    owner: String,
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct AddMemberArgs {
    #[arg(long)]
    team: String,
    /// Member acting as the granter.
    #[arg(long = "as")]
    granter: String,
    #[arg(long)]
    username: String,
    #[arg(long, value_parser = parse_role)]
    role: Role,
}

#[derive(Args, Debug)]
struct MembersArgs {
    #[arg(long)]
    team: String,
    /// Any member of the team.
    #[arg(long = "as")]
    viewer: String,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    raw.parse::<Role>().map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(out: &mut impl Write, message: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads a line without echoing it, printing `*` for every character.
fn read_secret(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                break;
            }
            KeyCode::Backspace if buf.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => {}
        }
        out.flush()?;
    }

    Ok(buf)
}

fn ask_new_password(attempts: usize) -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..attempts {
        let first = read_secret("Password: ")?;
        if first.trim().is_empty() {
            notice(&mut out, "Password must not be empty.")?;
            continue;
        }
        if read_secret("Confirm password: ")? == first {
            return Ok(first);
        }
        notice(&mut out, "Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn create_user(db: &DatabaseConnection, args: UserCreateArgs) -> CliResult<()> {
    if users::Entity::find_by_id(args.username.clone())
        .one(db)
        .await?
        .is_some()
    {
        return Err(format!("user already exists: {}", args.username).into());
    }

    let password = ask_new_password(3)?;
    let user = users::ActiveModel {
        username: Set(args.username.clone()),
        password: Set(password),
    };
    users::Entity::insert(user).exec(db).await?;

    println!("created user: {}", args.username);
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db.clone()).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => create_user(&db, args).await?,
        Command::Team(Team {
            command: TeamCommand::Create(args),
        }) => {
            let team = engine.create_team(&args.name, &args.owner).await?;
            println!("created team: {} ({})", team.name, team.id);
        }
        Command::Team(Team {
            command: TeamCommand::AddMember(args),
        }) => {
            let actor = engine.actor(&args.team, &args.granter).await?;
            let membership = engine.add_member(&actor, &args.username, args.role).await?;
            println!("added {} as {}", membership.user_id, membership.role);
        }
        Command::Team(Team {
            command: TeamCommand::Members(args),
        }) => {
            let actor = engine.actor(&args.team, &args.viewer).await?;
            for member in engine.list_members(&actor).await? {
                println!("{:<8} {}", member.role.as_str(), member.user_id);
            }
        }
    }

    Ok(())
}
