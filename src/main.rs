mod api;
mod auth;
mod calendar;
mod children;
mod config;
mod cors;
mod daily;
mod db;
mod summary;
mod tasks;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::{ApiClient, ApiError};
use auth::{Credential, OAuthProvider};
use calendar::{CalendarDate, WeekdayMask};
use children::ChildForm;
use config::AppConfig;
use cors::CorsPolicy;
use daily::DailyChecklist;
use db::Database;
use summary::SummaryMode;
use tasks::TaskForm;

// ─── Command line ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sl", version, about = "Study task tracker for parents and children")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "STUDYLOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign in through Google or GitHub in the browser
    Oauth {
        #[arg(value_enum)]
        provider: ProviderArg,
    },
    /// Forget the stored session
    Logout,
    /// Evaluate the CORS gate for a request
    Cors {
        method: String,
        #[arg(long)]
        origin: Option<String>,
    },
    #[command(flatten)]
    Account(AccountCommand),
}

/// Commands that run against the API as the signed-in user.
#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Show who is signed in
    Whoami,
    /// List children
    Children,
    /// Show, add or edit one child
    Child {
        #[command(subcommand)]
        action: ChildCommand,
    },
    /// List a child's recurring tasks
    Tasks { child: String },
    /// Add or edit a recurring task
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Show the checklist for one day and the month around it
    Daily {
        child: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Tick tasks off (or back on) for one day and save
    Check {
        child: String,
        #[arg(long)]
        date: Option<String>,
        /// TASK_ID or TASK_ID=MINUTES
        #[arg(long = "done")]
        done: Vec<String>,
        /// TASK_ID
        #[arg(long = "undo")]
        undo: Vec<String>,
    },
    /// Time spent over a week, a month or a custom range
    Summary {
        child: String,
        #[arg(value_enum, default_value_t = ModeArg::Week)]
        mode: ModeArg,
        #[arg(long, required_if_eq("mode", "range"))]
        from: Option<String>,
        #[arg(long, required_if_eq("mode", "range"))]
        to: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ChildCommand {
    Show { id: String },
    Add {
        name: String,
        #[arg(long, default_value = "")]
        grade: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Pass an empty string to clear the grade
        #[arg(long)]
        grade: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    Add {
        child: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    Edit {
        child: String,
        task: String,
        #[command(flatten)]
        fields: TaskFields,
    },
}

#[derive(Args, Debug)]
struct TaskFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    minutes: Option<String>,
    /// Comma separated weekdays, e.g. mon,wed,fri, or a mask integer (1 = Sunday)
    #[arg(long)]
    days: Option<String>,
    #[arg(long)]
    archived: Option<bool>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProviderArg { Google, Github }

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg { Week, Month, Range }

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = init_logging();

    if let Err(e) = run(cli.command).await {
        tracing::error!("{e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to a daily rolling file so they never mix with command output.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = config::data_dir();
    std::fs::create_dir_all(&log_dir).ok()?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "studylog.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
    Some(guard)
}

async fn run(command: Command) -> Result<()> {
    let cfg = AppConfig::load()?;

    match command {
        Command::Cors { method, origin } => cmd_cors(&cfg, &method, origin.as_deref()),
        Command::Logout => {
            open_database().await?.clear_session().await?;
            println!("Signed out.");
            Ok(())
        }
        Command::Login { email, password } => {
            let db = open_database().await?;
            cmd_login(&ApiClient::new(&cfg.api)?, &db, &email, &password).await
        }
        Command::Oauth { provider } => {
            let provider = match provider {
                ProviderArg::Google => OAuthProvider::Google,
                ProviderArg::Github => OAuthProvider::Github,
            };
            let db = open_database().await?;
            cmd_oauth(&ApiClient::new(&cfg.api)?, &db, provider, cfg.auth.callback_port).await
        }
        Command::Account(command) => {
            let db     = open_database().await?;
            let client = ApiClient::new(&cfg.api)?;
            let session = Session { client: &client, db: &db, cred: signed_in(&db).await? };
            session.dispatch(command).await
        }
    }
}

async fn open_database() -> Result<Database> {
    let db = Database::connect().await?;
    db.migrate().await?;
    Ok(db)
}

// ─── Session ──────────────────────────────────────────────────────────────────

async fn signed_in(db: &Database) -> Result<Credential> {
    let session = db.load_session().await?;
    if let Some(s) = &session {
        tracing::debug!(provider = %s.provider, saved_at = %s.saved_at, "using stored session");
    }
    session
        .map(|s| s.credential)
        .ok_or_else(|| anyhow!("Not signed in. Run  sl login <email>  or  sl oauth google  first."))
}

/// Everything that needs a signed-in user. A 401 from any call ends the
/// session.
struct Session<'a> {
    client: &'a ApiClient,
    db:     &'a Database,
    cred:   Credential,
}

impl Session<'_> {
    async fn check<T>(&self, result: Result<T, ApiError>) -> Result<T> {
        match result {
            Err(e) if e.is_unauthorized() => {
                tracing::warn!("session rejected by API, clearing it");
                self.db.clear_session().await?;
                Err(anyhow!("{e}\nYour session has expired. Sign in again with  sl login."))
            }
            other => Ok(other?),
        }
    }

    async fn dispatch(&self, command: AccountCommand) -> Result<()> {
        match command {
            AccountCommand::Whoami   => self.whoami().await,
            AccountCommand::Children => self.list_children().await,
            AccountCommand::Child { action } => match action {
                ChildCommand::Show { id } => self.show_child(&id).await,
                ChildCommand::Add { name, grade } => self.add_child(ChildForm { name, grade }).await,
                ChildCommand::Edit { id, name, grade } => self.edit_child(&id, name, grade).await,
            },
            AccountCommand::Tasks { child } => self.list_tasks(&child).await,
            AccountCommand::Task { action } => match action {
                TaskCommand::Add { child, fields } => self.save_task(&child, None, fields).await,
                TaskCommand::Edit { child, task, fields } => self.save_task(&child, Some(&task), fields).await,
            },
            AccountCommand::Daily { child, date } => self.daily(&child, date.as_deref()).await,
            AccountCommand::Check { child, date, done, undo } => self.check_off(&child, date.as_deref(), &done, &undo).await,
            AccountCommand::Summary { child, mode, from, to } => {
                let mode = match mode {
                    ModeArg::Week  => SummaryMode::Week,
                    ModeArg::Month => SummaryMode::Month,
                    ModeArg::Range => SummaryMode::Range {
                        from: from.unwrap_or_default(),
                        to:   to.unwrap_or_default(),
                    },
                };
                self.summary(&child, mode).await
            }
        }
    }

    async fn whoami(&self) -> Result<()> {
        let user = self.check(self.client.me(&self.cred).await).await?;
        println!("{} <{}>", user.label(), user.email);
        if let Some(provider) = &user.provider {
            println!("signed in with {provider}");
        }
        Ok(())
    }

    // ── Children ──────────────────────────────────────────────────────────────

    async fn list_children(&self) -> Result<()> {
        let children = self.check(self.client.list_children(&self.cred).await).await?;
        if children.is_empty() {
            println!("No children registered yet. Add one with  sl child add <name>.");
        }
        for c in &children {
            println!("{:<12} {}  (grade: {})", c.id, c.name, children::grade_label(c));
        }
        Ok(())
    }

    async fn show_child(&self, id: &str) -> Result<()> {
        let list  = self.check(self.client.list_children(&self.cred).await).await?;
        let child = children::find_child(&list, id).ok_or_else(|| anyhow!("child not found: {id}"))?;
        println!("{}\ngrade: {}", child.name, children::grade_label(child));
        println!("\n  sl daily {id}\n  sl tasks {id}\n  sl summary {id}");
        Ok(())
    }

    async fn add_child(&self, form: ChildForm) -> Result<()> {
        let payload = form.to_new_child()?;
        let child   = self.check(self.client.create_child(&self.cred, &payload).await).await
            .context("registration failed")?;
        println!("Added {} ({})", child.name, child.id);
        Ok(())
    }

    async fn edit_child(&self, id: &str, name: Option<String>, grade: Option<String>) -> Result<()> {
        let list  = self.check(self.client.list_children(&self.cred).await).await?;
        let child = children::find_child(&list, id).ok_or_else(|| anyhow!("child not found: {id}"))?;

        let mut form = ChildForm::from_child(child);
        if let Some(n) = name  { form.name  = n; }
        if let Some(g) = grade { form.grade = g; }
        let update = form.to_update()?;

        match self.client.update_child(&self.cred, id, &update).await {
            Err(e) if e.status() == Some(404) => {
                bail!("save failed: the update endpoint may not be implemented ({e})")
            }
            result => {
                let updated = self.check(result).await.context("save failed")?;
                println!("Saved {} (grade: {})", updated.name, children::grade_label(&updated));
                Ok(())
            }
        }
    }

    // ── Tasks ─────────────────────────────────────────────────────────────────

    async fn list_tasks(&self, child: &str) -> Result<()> {
        let tasks = self.check(self.client.list_tasks(&self.cred, child).await).await?;
        print!("{}", tasks::overview(&tasks, CalendarDate::today()));
        Ok(())
    }

    async fn save_task(&self, child: &str, task_id: Option<&str>, fields: TaskFields) -> Result<()> {
        let mut form = match task_id {
            None => TaskForm::default(),
            Some(id) => {
                let tasks = self.check(self.client.list_tasks(&self.cred, child).await).await?;
                let task  = tasks.iter().find(|t| t.id == id)
                    .ok_or_else(|| anyhow!("task not found: {id}"))?;
                TaskForm::from_task(task)
            }
        };
        apply_task_fields(&mut form, fields)?;
        let payload = form.validate()?;

        let result = match task_id {
            Some(id) => self.client.update_task(&self.cred, child, id, &payload).await,
            None     => self.client.create_task(&self.cred, child, &payload).await,
        };
        self.check(result).await.context("save failed")?;
        println!("Saved {} ({})", payload.name, payload.days_mask.labels());
        Ok(())
    }

    // ── Daily ─────────────────────────────────────────────────────────────────

    async fn daily(&self, child: &str, date: Option<&str>) -> Result<()> {
        let date = daily::selected_date(date, CalendarDate::today());
        let view = self.check(self.client.daily_view(&self.cred, child, date).await).await?;
        let list = DailyChecklist::new(date, view);

        println!("{date}");
        if list.entries.is_empty() {
            println!("No tasks.");
        }
        for e in &list.entries {
            println!(
                "[{}] {:<10} {} {}  {} min",
                if e.checked { 'x' } else { ' ' },
                e.task.task_id, e.task.subject, e.task.name, e.task.minutes
            );
        }

        let month = calendar::current_month_range(date);
        let days  = match self.client.calendar(&self.cred, child, month.range).await {
            Ok(status) => status.days,
            Err(e) if e.is_unauthorized() => return self.check(Err(e)).await,
            Err(e) => {
                tracing::warn!("calendar status unavailable: {e}");
                Vec::new()
            }
        };
        println!("\n{}", daily::render_month(date.year(), date.month0(), &days, date));
        Ok(())
    }

    async fn check_off(&self, child: &str, date: Option<&str>, done: &[String], undo: &[String]) -> Result<()> {
        let date     = daily::selected_date(date, CalendarDate::today());
        let view     = self.check(self.client.daily_view(&self.cred, child, date).await).await?;
        let mut list = DailyChecklist::new(date, view);

        for entry in done {
            let (id, minutes) = parse_done(entry)?;
            if !list.set_checked(id, true) { bail!("no task {id} on {date}"); }
            if let Some(m) = minutes { list.set_minutes(id, m); }
        }
        for id in undo {
            if !list.set_checked(id, false) { bail!("no task {id} on {date}"); }
        }

        let save = list.save_payload();
        self.check(self.client.save_daily(&self.cred, child, date, &save).await).await
            .context("save failed")?;
        println!(
            "Saved {}: {} task(s), {}",
            list.date,
            save.items.len(),
            summary::format_minutes(list.checked_minutes())
        );
        Ok(())
    }

    // ── Summary ───────────────────────────────────────────────────────────────

    async fn summary(&self, child: &str, mode: SummaryMode) -> Result<()> {
        let range = mode.resolve(CalendarDate::today())?;
        tracing::info!(%range, days = range.num_days(), "fetching summary");
        let data  = self.check(self.client.summary(&self.cred, child, range).await).await?;
        print!("{}", summary::render(&data));
        Ok(())
    }
}

// ─── Sign-in commands ─────────────────────────────────────────────────────────

async fn cmd_login(client: &ApiClient, db: &Database, email: &str, password: &str) -> Result<()> {
    match client.login(email, password).await {
        Ok(resp) => {
            db.save_session(&Credential::new(resp.token), "password").await?;
            println!("Signed in.");
            Ok(())
        }
        Err(e) if e.is_unauthorized() => bail!("Incorrect email address or password."),
        Err(e) => Err(anyhow::Error::new(e).context("Login failed. Please try again.")),
    }
}

async fn cmd_oauth(client: &ApiClient, db: &Database, provider: OAuthProvider, port: u16) -> Result<()> {
    let listener = auth::bind_callback(port).await
        .with_context(|| format!("could not listen on port {port} for the sign-in callback"))?;
    let url = client.oauth_start_url(provider);

    println!("\nOpening {} sign-in in your browser…", provider.as_str());
    println!("If it doesn't open automatically, visit:\n\n  {url}\n");
    let _ = open::that(&url);
    println!("Waiting for the redirect back (listening on :{port})…");

    let cred = auth::accept_callback(&listener).await.context("Login failed")?;
    db.save_session(&cred, provider.as_str()).await?;
    println!("Signed in.");
    Ok(())
}

// ─── CORS ─────────────────────────────────────────────────────────────────────

fn cmd_cors(cfg: &AppConfig, method: &str, origin: Option<&str>) -> Result<()> {
    let decision = CorsPolicy::from_config(&cfg.cors).evaluate(method, origin);
    println!("{}", decision.status());
    for (name, value) in decision.headers() {
        println!("{name}: {value}");
    }
    Ok(())
}

// ─── Argument helpers ─────────────────────────────────────────────────────────

fn apply_task_fields(form: &mut TaskForm, f: TaskFields) -> Result<()> {
    if let Some(v) = f.name        { form.name = v; }
    if let Some(v) = f.subject     { form.subject = v; }
    if let Some(v) = f.description { form.description = v; }
    if let Some(v) = f.minutes     { form.default_minutes = v; }
    if let Some(v) = f.archived    { form.is_archived = v; }
    if let Some(list) = f.days {
        let mask = WeekdayMask::parse_days(&list)
            .ok_or_else(|| anyhow!("unknown weekday in {list:?} (use sun,mon,tue,wed,thu,fri,sat or a mask below 128)"))?;
        form.days = mask.decode();
    }
    Ok(())
}

/// `TASK_ID` or `TASK_ID=MINUTES`.
fn parse_done(entry: &str) -> Result<(&str, Option<u32>)> {
    match entry.split_once('=') {
        None => Ok((entry, None)),
        Some((id, m)) => {
            let minutes = m.trim().parse::<u32>()
                .with_context(|| format!("invalid minutes in {entry:?}"))?;
            Ok((id, Some(minutes)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_done_entries() {
        assert_eq!(parse_done("t1").unwrap(), ("t1", None));
        assert_eq!(parse_done("t1=25").unwrap(), ("t1", Some(25)));
        assert!(parse_done("t1=abc").is_err());
    }

    #[test]
    fn task_fields_override_form() {
        let mut form = TaskForm::default();
        apply_task_fields(&mut form, TaskFields {
            name: Some("Reading".into()), subject: Some("English".into()),
            description: None, minutes: Some("15".into()),
            days: Some("sat,sun".into()), archived: None,
        }).unwrap();
        let payload = form.validate().unwrap();
        assert_eq!(payload.days_mask.bits(), 0b100_0001);
        assert_eq!(payload.default_minutes, 15);

        let bad = TaskFields {
            name: None, subject: None, description: None, minutes: None,
            days: Some("someday".into()), archived: None,
        };
        assert!(apply_task_fields(&mut form, bad).is_err());
    }

    #[test]
    fn summary_range_needs_bounds() {
        assert!(Cli::try_parse_from(["sl", "summary", "c1", "range"]).is_err());
        let cli = Cli::try_parse_from(["sl", "summary", "c1", "range", "--from", "2024-03-01", "--to", "2024-03-31"]).unwrap();
        assert!(matches!(cli.command, Command::Account(AccountCommand::Summary { mode: ModeArg::Range, .. })));
        let cli = Cli::try_parse_from(["sl", "summary", "c1"]).unwrap();
        assert!(matches!(cli.command, Command::Account(AccountCommand::Summary { mode: ModeArg::Week, .. })));
    }

    #[test]
    fn account_commands_sit_beside_local_ones() {
        let cli = Cli::try_parse_from(["sl", "whoami"]).unwrap();
        assert!(matches!(cli.command, Command::Account(AccountCommand::Whoami)));
        let cli = Cli::try_parse_from(["sl", "cors", "GET", "--origin", "https://a.vercel.app"]).unwrap();
        assert!(matches!(cli.command, Command::Cors { .. }));
        assert!(matches!(Cli::try_parse_from(["sl", "logout"]).unwrap().command, Command::Logout));
    }

    #[tokio::test]
    async fn rejected_session_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let db  = Database::open(&dir.path().join("studylog.db")).await.unwrap();
        db.migrate().await.unwrap();
        let cred = Credential::new("token-0123456789");
        db.save_session(&cred, "password").await.unwrap();

        let client = ApiClient::new(&config::ApiConfig {
            base_url: Some("http://127.0.0.1:9".into()),
            timeout_seconds: 1,
        }).unwrap();
        let session = Session { client: &client, db: &db, cred };

        let ok: Result<u32> = session.check(Ok(7)).await;
        assert_eq!(ok.unwrap(), 7);
        assert!(db.load_session().await.unwrap().is_some());

        let err = session
            .check::<()>(Err(ApiError::Unauthorized { message: "no session".into() }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("session has expired"));
        assert!(db.load_session().await.unwrap().is_none());
    }
}
