use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timeline::api::{self, AppContext};
use timeline::backend::Backend;
use timeline::commands::{
    self, parse_issue_status, parse_priority, parse_project_type, parse_status, parse_switch,
    parse_theme,
};
use timeline::config::{ServeArgs, StoreArgs, TargetArgs};
use timeline::upload::UploadDir;
use timeline_core::filter::Filters;
use timeline_core::models::*;
use timeline_core::views::{self, DeadlineBucket};

#[derive(Parser)]
#[command(name = "timeline")]
#[command(about = "Projects, phases and tasks on a shared timeline")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (the default)
    Serve(ServeArgs),
    /// List projects and the selected project's phases
    List {
        #[command(flatten)]
        store: StoreArgs,

        /// Match against project, phase and task text
        #[arg(short, long)]
        search: Option<String>,

        /// Only digital or physical projects
        #[arg(long = "type", value_parser = parse_project_type)]
        project_type: Option<ProjectType>,

        /// Only tasks with this status
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        /// Only tasks in this deadline bucket (none, overdue, today, upcoming, future)
        #[arg(long, value_parser = parse_deadline)]
        deadline: Option<DeadlineBucket>,
    },
    /// Show what needs attention
    Focus {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Create a project and select it
    AddProject {
        #[command(flatten)]
        store: StoreArgs,

        name: String,

        #[arg(long = "type", value_parser = parse_project_type)]
        project_type: Option<ProjectType>,

        #[arg(short, long)]
        description: Option<String>,

        /// Repository URL
        #[arg(long)]
        github: Option<String>,
    },
    /// Add a phase to a project (the selected one by default)
    AddPhase {
        #[command(flatten)]
        store: StoreArgs,

        name: Option<String>,

        #[arg(long)]
        project: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Add a task to a phase (the selected one by default)
    AddTask {
        #[command(flatten)]
        store: StoreArgs,

        title: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        phase: Option<String>,

        #[arg(short, long)]
        label: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Change a task's status
    SetStatus {
        #[command(flatten)]
        store: StoreArgs,

        task_id: String,

        #[arg(value_parser = parse_status)]
        status: TaskStatus,
    },
    /// Change a task's completion percentage
    SetPercent {
        #[command(flatten)]
        store: StoreArgs,

        task_id: String,

        #[arg(allow_negative_numbers = true)]
        percent: i64,
    },
    /// Pin or unpin a task
    Pin {
        #[command(flatten)]
        store: StoreArgs,

        task_id: String,
    },
    /// Edit a task's details
    EditTask {
        #[command(flatten)]
        store: StoreArgs,

        task_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        label: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        #[arg(long)]
        clear_due: bool,

        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a task
    DeleteTask {
        #[command(flatten)]
        store: StoreArgs,

        task_id: String,
    },
    /// Select a project (and optionally one of its phases)
    Select {
        #[command(flatten)]
        store: StoreArgs,

        project_id: String,

        #[arg(long)]
        phase: Option<String>,
    },
    /// Edit a project (the selected one by default)
    UpdateProject {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long = "type", value_parser = parse_project_type)]
        project_type: Option<ProjectType>,

        #[arg(long, conflicts_with = "clear_github")]
        github: Option<String>,

        #[arg(long)]
        clear_github: bool,
    },
    /// Edit a phase; --progress sets a manual override, --auto clears it
    UpdatePhase {
        #[command(flatten)]
        store: StoreArgs,

        phase_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        #[arg(long)]
        deadline: Option<NaiveDate>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long, allow_negative_numbers = true, conflicts_with = "auto")]
        progress: Option<i64>,

        #[arg(long)]
        auto: bool,
    },
    /// Delete a phase with everything in it
    DeletePhase {
        #[command(flatten)]
        store: StoreArgs,

        phase_id: String,
    },
    /// Add a note to a phase or project
    AddNote {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        content: String,
    },
    /// Replace a note's content, keeping the old text as a version
    EditNote {
        #[command(flatten)]
        store: StoreArgs,

        note_id: String,

        content: String,
    },
    DeleteNote {
        #[command(flatten)]
        store: StoreArgs,

        note_id: String,
    },
    /// Attach a file or link to a phase or project
    AddFile {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        target: TargetArgs,

        #[arg(long, default_value = "")]
        title: String,

        /// URL, for example a path returned by the upload endpoint
        #[arg(long, default_value = "")]
        link: String,

        #[arg(long, default_value = "")]
        note: String,

        #[arg(long, default_value = "")]
        content: String,
    },
    /// Replace a file's inline content, keeping the old one as a version
    EditFile {
        #[command(flatten)]
        store: StoreArgs,

        file_id: String,

        content: String,
    },
    DeleteFile {
        #[command(flatten)]
        store: StoreArgs,

        file_id: String,
    },
    /// Show the saved versions of a note or file
    History {
        #[command(flatten)]
        store: StoreArgs,

        id: String,
    },
    /// Add a checklist item to a phase or project
    AddCheck {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        target: TargetArgs,

        text: String,
    },
    /// Tick a checklist item
    Check {
        #[command(flatten)]
        store: StoreArgs,

        item_id: String,
    },
    /// Untick a checklist item
    Uncheck {
        #[command(flatten)]
        store: StoreArgs,

        item_id: String,
    },
    DeleteCheck {
        #[command(flatten)]
        store: StoreArgs,

        item_id: String,
    },
    /// Remove every item from a checklist
    ClearChecklist {
        #[command(flatten)]
        store: StoreArgs,

        #[command(flatten)]
        target: TargetArgs,
    },
    /// Add a bill-of-materials line
    AddBom {
        #[command(flatten)]
        store: StoreArgs,

        item: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        #[arg(long, default_value = "")]
        supplier: String,
    },
    AddRelease {
        #[command(flatten)]
        store: StoreArgs,

        version: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Add a logbook entry
    AddLog {
        #[command(flatten)]
        store: StoreArgs,

        text: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        date: Option<NaiveDate>,
    },
    AddIssue {
        #[command(flatten)]
        store: StoreArgs,

        title: String,

        #[arg(long)]
        project: Option<String>,

        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Open or close an issue
    SetIssue {
        #[command(flatten)]
        store: StoreArgs,

        issue_id: String,

        #[arg(value_parser = parse_issue_status)]
        status: IssueStatus,
    },
    /// Enable (or with --off, disable) the public share link
    Share {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(long)]
        project: Option<String>,

        #[arg(long)]
        off: bool,
    },
    /// Set the theme, or toggle it when none is given
    Theme {
        #[command(flatten)]
        store: StoreArgs,

        #[arg(value_parser = parse_theme)]
        theme: Option<Theme>,
    },
    /// Turn a view preference (showNotes, showFiles, showChecklist) on or off
    SetPref {
        #[command(flatten)]
        store: StoreArgs,

        key: String,

        #[arg(value_parser = parse_switch, action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

fn parse_deadline(s: &str) -> Result<DeadlineBucket, String> {
    DeadlineBucket::from_str(&s.to_ascii_lowercase())
        .ok_or_else(|| format!("expected none, overdue, today, upcoming or future, got '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "timeline=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => serve(cli.serve).await?,
        Some(Commands::Serve(args)) => serve(args).await?,
        Some(Commands::List {
            store,
            search,
            project_type,
            status,
            deadline,
        }) => {
            let state = Backend::connect(&store)?.load().await?;
            let filters = Filters {
                search: search.unwrap_or_default(),
                project_type,
                status,
                deadline,
            };
            let dashboard = views::dashboard(&state, &filters, views::today());
            print!("{}", commands::format_dashboard(&dashboard));
        }
        Some(Commands::Focus { store }) => {
            let state = Backend::connect(&store)?.load().await?;
            let items = views::top_focus_items(&state.projects, views::today());
            print!("{}", commands::format_focus(&items));
        }
        Some(Commands::AddProject {
            store,
            name,
            project_type,
            description,
            github,
        }) => {
            let input = CreateProjectInput {
                name,
                kind: project_type,
                description,
                github,
            };
            let id = write_through(&store, |state| commands::add_project(state, input)).await?;
            println!("Created project {}", id);
        }
        Some(Commands::AddPhase {
            store,
            name,
            project,
            priority,
            start,
            end,
            deadline,
        }) => {
            let input = CreatePhaseInput {
                name,
                priority,
                start_date: start,
                end_date: end,
                deadline,
                ..Default::default()
            };
            let id = write_through(&store, |state| {
                commands::add_phase(state, project.as_deref(), input)
            })
            .await?;
            println!("Created phase {}", id);
        }
        Some(Commands::AddTask {
            store,
            title,
            project,
            phase,
            label,
            priority,
            due,
        }) => {
            let input = CreateTaskInput {
                title,
                label,
                priority,
                due_date: due,
                notes: None,
            };
            let id = write_through(&store, |state| {
                commands::add_task(state, project.as_deref(), phase.as_deref(), input)
            })
            .await?;
            println!("Created task {}", id);
        }
        Some(Commands::SetStatus {
            store,
            task_id,
            status,
        }) => {
            write_through(&store, |state| commands::set_status(state, &task_id, status)).await?;
            println!("Task {} is now {}", task_id, status.as_str());
        }
        Some(Commands::SetPercent {
            store,
            task_id,
            percent,
        }) => {
            let status =
                write_through(&store, |state| commands::set_percent(state, &task_id, percent))
                    .await?;
            println!("Task {} updated ({})", task_id, status.as_str());
        }
        Some(Commands::Pin { store, task_id }) => {
            let pinned = write_through(&store, |state| commands::toggle_pin(state, &task_id)).await?;
            let verb = if pinned { "Pinned" } else { "Unpinned" };
            println!("{} task {}", verb, task_id);
        }
        Some(Commands::EditTask {
            store,
            task_id,
            title,
            label,
            priority,
            due,
            clear_due,
            notes,
        }) => {
            let input = UpdateTaskInput {
                title,
                label,
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                notes,
                ..Default::default()
            };
            write_through(&store, |state| commands::edit_task(state, &task_id, input)).await?;
            println!("Updated task {}", task_id);
        }
        Some(Commands::DeleteTask { store, task_id }) => {
            write_through(&store, |state| commands::delete_task(state, &task_id)).await?;
            println!("Deleted task {}", task_id);
        }
        Some(Commands::Select {
            store,
            project_id,
            phase,
        }) => {
            write_through(&store, |state| {
                commands::select(state, &project_id, phase.as_deref())
            })
            .await?;
            println!("Selected project {}", project_id);
        }
        Some(Commands::UpdateProject {
            store,
            project,
            name,
            description,
            project_type,
            github,
            clear_github,
        }) => {
            let input = UpdateProjectInput {
                name,
                description,
                kind: project_type,
                github: if clear_github { Some(None) } else { github.map(Some) },
            };
            write_through(&store, |state| {
                commands::update_project(state, project.as_deref(), input)
            })
            .await?;
            println!("Updated project");
        }
        Some(Commands::UpdatePhase {
            store,
            phase_id,
            name,
            description,
            priority,
            start,
            end,
            deadline,
            color,
            progress,
            auto,
        }) => {
            let input = UpdatePhaseInput {
                name,
                description,
                start_date: start.map(Some),
                end_date: end.map(Some),
                deadline: deadline.map(Some),
                color,
                priority,
                progress: if auto { Some(None) } else { progress.map(Some) },
            };
            write_through(&store, |state| commands::update_phase(state, &phase_id, input)).await?;
            println!("Updated phase {}", phase_id);
        }
        Some(Commands::DeletePhase { store, phase_id }) => {
            write_through(&store, |state| commands::delete_phase(state, &phase_id)).await?;
            println!("Deleted phase {}", phase_id);
        }
        Some(Commands::AddNote {
            store,
            target,
            title,
            content,
        }) => {
            let input = CreateNoteInput {
                title,
                content,
                phase_id: None,
            };
            let id = write_through(&store, |state| {
                commands::add_note(state, target.target(), input)
            })
            .await?;
            println!("Created note {}", id);
        }
        Some(Commands::EditNote {
            store,
            note_id,
            content,
        }) => {
            let changed =
                write_through(&store, |state| commands::edit_note(state, &note_id, &content))
                    .await?;
            print_saved(changed, &note_id);
        }
        Some(Commands::DeleteNote { store, note_id }) => {
            write_through(&store, |state| commands::delete_note(state, &note_id)).await?;
            println!("Deleted note {}", note_id);
        }
        Some(Commands::AddFile {
            store,
            target,
            title,
            link,
            note,
            content,
        }) => {
            let input = CreateFileInput {
                title,
                link,
                note,
                content,
                phase_id: None,
            };
            let id = write_through(&store, |state| {
                commands::add_file(state, target.target(), input)
            })
            .await?;
            println!("Created file {}", id);
        }
        Some(Commands::EditFile {
            store,
            file_id,
            content,
        }) => {
            let changed =
                write_through(&store, |state| commands::edit_file(state, &file_id, &content))
                    .await?;
            print_saved(changed, &file_id);
        }
        Some(Commands::DeleteFile { store, file_id }) => {
            write_through(&store, |state| commands::delete_file(state, &file_id)).await?;
            println!("Deleted file {}", file_id);
        }
        Some(Commands::History { store, id }) => {
            let state = Backend::connect(&store)?.load().await?;
            let (title, versions) = commands::history(&state, &id)?;
            print!("{}", commands::format_history(title, versions));
        }
        Some(Commands::AddCheck {
            store,
            target,
            text,
        }) => {
            let id = write_through(&store, |state| {
                commands::add_check(state, target.target(), &text)
            })
            .await?;
            println!("Created checklist item {}", id);
        }
        Some(Commands::Check { store, item_id }) => {
            write_through(&store, |state| commands::set_check(state, &item_id, true)).await?;
            println!("Checked {}", item_id);
        }
        Some(Commands::Uncheck { store, item_id }) => {
            write_through(&store, |state| commands::set_check(state, &item_id, false)).await?;
            println!("Unchecked {}", item_id);
        }
        Some(Commands::DeleteCheck { store, item_id }) => {
            write_through(&store, |state| commands::delete_check(state, &item_id)).await?;
            println!("Deleted checklist item {}", item_id);
        }
        Some(Commands::ClearChecklist { store, target }) => {
            let removed = write_through(&store, |state| {
                commands::clear_checklist(state, target.target())
            })
            .await?;
            println!("Removed {} checklist items", removed);
        }
        Some(Commands::AddBom {
            store,
            item,
            project,
            quantity,
            supplier,
        }) => {
            let id = write_through(&store, |state| {
                commands::add_bom_line(state, project.as_deref(), &item, quantity, &supplier)
            })
            .await?;
            println!("Created BOM line {}", id);
        }
        Some(Commands::AddRelease {
            store,
            version,
            project,
            date,
            notes,
        }) => {
            let id = write_through(&store, |state| {
                commands::add_release(state, project.as_deref(), &version, date, &notes)
            })
            .await?;
            println!("Created release {}", id);
        }
        Some(Commands::AddLog {
            store,
            text,
            project,
            date,
        }) => {
            let id = write_through(&store, |state| {
                commands::add_log_entry(state, project.as_deref(), date, &text)
            })
            .await?;
            println!("Created logbook entry {}", id);
        }
        Some(Commands::AddIssue {
            store,
            title,
            project,
            description,
        }) => {
            let id = write_through(&store, |state| {
                commands::add_issue(state, project.as_deref(), &title, &description)
            })
            .await?;
            println!("Created issue {}", id);
        }
        Some(Commands::SetIssue {
            store,
            issue_id,
            status,
        }) => {
            write_through(&store, |state| {
                commands::set_issue_status(state, &issue_id, status)
            })
            .await?;
            println!("Issue {} is now {}", issue_id, status.as_str());
        }
        Some(Commands::Share {
            store,
            project,
            off,
        }) => {
            let slug = write_through(&store, |state| {
                commands::share(state, project.as_deref(), !off)
            })
            .await?;
            match slug {
                Some(slug) => println!("Sharing enabled as {}", slug),
                None => println!("Sharing disabled"),
            }
        }
        Some(Commands::Theme { store, theme }) => {
            let theme = write_through(&store, |state| Ok(commands::set_theme(state, theme))).await?;
            println!("Theme is {}", theme.as_str());
        }
        Some(Commands::SetPref {
            store,
            key,
            enabled,
        }) => {
            write_through(&store, |state| commands::set_preference(state, &key, enabled)).await?;
            println!("{} is {}", key, if enabled { "on" } else { "off" });
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let addr = args.bind_addr();
    tracing::info!("Starting timeline server on {}", addr);

    UploadDir::new(&args.upload_dir).ensure()?;
    let app = api::create_router(AppContext::from_args(&args));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Timeline server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn print_saved(changed: bool, id: &str) {
    if changed {
        println!("Saved a new version of {}", id);
    } else {
        println!("Content unchanged, nothing saved for {}", id);
    }
}

/// Load the whole state, apply one change, and save it back.
async fn write_through<T>(
    store: &StoreArgs,
    change: impl FnOnce(&mut AppState) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let backend = Backend::connect(store)?;
    let mut state = backend.load().await?;
    let out = change(&mut state)?;
    backend.save(&state).await?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn update_phase_takes_manual_progress_or_auto() {
        let cli =
            Cli::try_parse_from(["timeline", "update-phase", "ph1", "--progress", "40"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::UpdatePhase {
                progress: Some(40),
                auto: false,
                ..
            })
        ));
        assert!(
            Cli::try_parse_from(["timeline", "update-phase", "ph1", "--progress", "4", "--auto"])
                .is_err()
        );
    }

    #[test]
    fn add_note_can_target_the_project() {
        let cli = Cli::try_parse_from([
            "timeline",
            "add-note",
            "--project-level",
            "--title",
            "Budget",
        ])
        .unwrap();
        let Some(Commands::AddNote { target, title, .. }) = cli.command else {
            panic!("expected add-note");
        };
        assert_eq!(title, "Budget");
        assert_eq!(target.target(), commands::Target::Project(None));
    }
}
