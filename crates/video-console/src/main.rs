//! Video console CLI application.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{Config, Video};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use video_console::controller::ProjectViewController;
use video_console::mindmap;
use video_console::notify::{Confirmer, ConsoleNotifier, Notification, Notifier};
use video_console::projects::{self, CreateOutcome};
use video_console::public_view::PublicVideoSession;
use video_console::quiz::{Answer, OptionOutcome, QuizSession};
use video_console::transcript::{self, TranscriptTimeline};
use video_console::{ApiResult, Artifact, Route, UploadControl, VideoApi, VideoFile, VideoServiceClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Console for the video-processing backend", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List projects
    Projects,

    /// Create a project
    CreateProject { name: String },

    /// Show a project and one of its videos
    Show {
        project_id: i64,
        #[arg(long)]
        video_id: Option<i64>,
        /// Keep following the video until the backend is done with it
        #[arg(long)]
        watch: bool,
    },

    /// List videos across all projects, newest first
    Videos,

    /// Upload a video file into a project
    Upload {
        project_id: i64,
        file: PathBuf,
        #[arg(long)]
        watch: bool,
    },

    /// Fetch the current status of a video
    Status { video_id: i64 },

    /// Generate a mind-map for a processed video
    GenerateMindmap {
        project_id: i64,
        video_id: i64,
        #[arg(long)]
        watch: bool,
    },

    /// Generate a quiz for a processed video
    GenerateQuiz {
        project_id: i64,
        video_id: i64,
        #[arg(long)]
        watch: bool,
    },

    /// Delete a video
    DeleteVideo {
        project_id: i64,
        video_id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Edit the tags of a video
    Tags {
        project_id: i64,
        video_id: i64,
        #[arg(long)]
        add: Vec<String>,
        #[arg(long)]
        remove: Vec<String>,
    },

    /// Make a video publicly viewable and print its link
    Publish { project_id: i64, video_id: i64 },

    /// Withdraw a published video
    Unpublish { project_id: i64, video_id: i64 },

    /// Show a published video
    Public { slug: String },

    /// Ask the assistant of a published video a question
    Chat { slug: String, question: String },

    /// Take the quiz of a published video
    Quiz { slug: String },

    /// Open a console path such as /projects/3?videoId=12
    Open { route: String },
}

/// Prompts on the terminal before destructive operations
struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn confirm(&self, title: &str, message: &str) -> bool {
        println!("{}\n{}", title, message);
        print!("Type 'yes' to continue: ");
        let _ = std::io::stdout().flush();

        // Stdin blocks; move this worker's other tasks elsewhere meanwhile.
        tokio::task::block_in_place(|| read_confirmation(&mut std::io::stdin().lock()))
    }
}

fn read_confirmation(input: &mut impl BufRead) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(_) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            warn!(error = %e, "Failed to read confirmation");
            false
        }
    }
}

struct Console {
    config: Config,
    api: Arc<dyn VideoApi>,
    notifier: Arc<dyn Notifier>,
}

impl Console {
    fn controller(&self) -> ProjectViewController {
        ProjectViewController::new(
            Arc::clone(&self.api),
            Arc::clone(&self.notifier),
            self.config.poll_interval(),
            self.config.public.share_base_url.clone(),
        )
    }

    /// Surface a failure of a direct backend call
    fn report<T>(&self, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(err) = &result {
            self.notifier.notify(Notification::error(err.to_string()));
        }
        result
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Initialize logging
    let mut log_config = shared::LogConfig::from_settings("video-console", &config.logging);
    if args.verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %args.config.display(), base_url = %config.api.base_url, "Loaded configuration");

    // Initialize API client
    let client = VideoServiceClient::from_config(&config.api).context("Failed to create backend client")?;

    let console = Console {
        config,
        api: Arc::new(client),
        notifier: Arc::new(ConsoleNotifier),
    };

    let command = match args.command {
        Command::Open { route } => {
            let route: Route = route.parse().context("Cannot open route")?;
            info!(route = %route, title = route.title(), "Opening route");
            match command_for(route) {
                Some(command) => command,
                None => Command::CreateProject {
                    name: read_project_name().await?,
                },
            }
        }
        other => other,
    };

    match run(&console, command).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            debug!(error = %err, "Command failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Command shown for a console route; `None` when the route is a form
/// that needs input first
fn command_for(route: Route) -> Option<Command> {
    let command = match route {
        Route::ProjectList => Command::Projects,
        Route::NewProject => return None,
        Route::ProjectDetail {
            project_id,
            video_id,
        } => Command::Show {
            project_id,
            video_id,
            watch: false,
        },
        Route::AllVideos => Command::Videos,
        Route::PublicVideo { slug } => Command::Public { slug },
    };
    Some(command)
}

/// Ask for the name of a new project on the terminal
async fn read_project_name() -> Result<String> {
    print!("Project name: ");
    let _ = std::io::stdout().flush();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let name = lines
        .next_line()
        .await
        .context("Failed to read project name")?
        .context("No project name given")?;
    Ok(name)
}

async fn run(console: &Console, command: Command) -> ApiResult<()> {
    let api = console.api.as_ref();
    let notifier = console.notifier.as_ref();

    match command {
        Command::Projects => {
            let list = projects::list_projects(api, notifier).await?;
            if list.is_empty() {
                println!("No projects yet. Create one with `create-project <name>`.");
            }
            for project in list {
                println!(
                    "{:>4}  {}  ({} videos, created {})",
                    project.id,
                    project.name,
                    project.videos.len(),
                    format_time(project.created_at)
                );
            }
        }

        Command::CreateProject { name } => {
            match projects::create_project(api, notifier, &name).await? {
                CreateOutcome::Created { project, next } => {
                    println!("Created project {} at {}", project.id, next);
                }
                CreateOutcome::Invalid(err) => println!("{}", err),
            }
        }

        Command::Show {
            project_id,
            video_id,
            watch,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, video_id).await?;
            print_project(console, &controller);
            if watch {
                follow(&mut controller).await;
                print_current(console, &controller);
            }
        }

        Command::Videos => {
            for listing in projects::list_all_videos(api, notifier).await? {
                let video = &listing.video;
                println!(
                    "{:>4}  {:<32} {:<20} {:<18} {}",
                    video.id,
                    video.filename,
                    listing.project_name.as_deref().unwrap_or("-"),
                    video.status.to_string(),
                    projects::listing_route(&listing)
                        .map(|route| route.to_string())
                        .unwrap_or_default()
                );
            }
        }

        Command::Upload {
            project_id,
            file,
            watch,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, None).await?;

            let file = console.report(VideoFile::from_path(&file).await)?;
            let mut upload = UploadControl::new();
            upload.select_file(file);
            let uploaded = upload
                .upload(api, notifier, project_id, |pct| {
                    eprint!("\rUploading... {:>3}%", pct);
                })
                .await;
            eprintln!();

            if let Some(video) = uploaded? {
                controller.on_video_uploaded(video);
                if watch {
                    follow(&mut controller).await;
                }
                print_current(console, &controller);
            }
        }

        Command::Status { video_id } => {
            let video = console.report(api.get_video_status(video_id).await)?;
            println!("{}  {}  {}", video.id, video.filename, video.status);
        }

        Command::GenerateMindmap {
            project_id,
            video_id,
            watch,
        } => generate(console, project_id, video_id, Artifact::Mindmap, watch).await?,

        Command::GenerateQuiz {
            project_id,
            video_id,
            watch,
        } => generate(console, project_id, video_id, Artifact::Quiz, watch).await?,

        Command::DeleteVideo {
            project_id,
            video_id,
            yes,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, Some(video_id)).await?;
            controller.stop_polling();
            let deleted = if yes {
                controller
                    .delete_video(video_id, &video_console::notify::FixedAnswer(true))
                    .await?
            } else {
                controller.delete_video(video_id, &StdinConfirmer).await?
            };
            if !deleted {
                println!("Nothing deleted.");
            }
        }

        Command::Tags {
            project_id,
            video_id,
            add,
            remove,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, Some(video_id)).await?;
            controller.stop_polling();
            if !controller.start_edit_tags(video_id) {
                notifier.notify(Notification::error(format!(
                    "Video {} is not part of project {}.",
                    video_id, project_id
                )));
                return Ok(());
            }
            for tag in &remove {
                controller.remove_tag(tag);
            }
            for tag in &add {
                controller.add_tag(tag);
            }
            if add.is_empty() && remove.is_empty() {
                controller.cancel_tag_edit();
            } else {
                controller.save_tags().await?;
            }
            if let Some(video) = controller.video(video_id) {
                println!("Tags: {}", format_tags(&video.tags));
            }
        }

        Command::Publish {
            project_id,
            video_id,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, Some(video_id)).await?;
            controller.stop_polling();
            let video = controller.publish_video(video_id).await?;
            match video.public_slug.as_deref() {
                Some(slug) => println!("Share link: {}", controller.share_link(slug)),
                None => warn!(video_id = video_id, "Published video has no slug"),
            }
        }

        Command::Unpublish {
            project_id,
            video_id,
        } => {
            let mut controller = console.controller();
            controller.load_project(project_id, Some(video_id)).await?;
            controller.stop_polling();
            controller.unpublish_video(video_id).await?;
        }

        Command::Public { slug } => {
            let Some(session) = open_public(console, &slug).await else {
                return Ok(());
            };
            print_public(console, &session);
        }

        Command::Chat { slug, question } => {
            let Some(mut session) = open_public(console, &slug).await else {
                return Ok(());
            };
            if let Some(answer) = session.send_message(&question).await {
                println!("{}", video_console::markdown::render_plain(&answer.content));
            }
        }

        Command::Quiz { slug } => {
            let Some(session) = open_public(console, &slug).await else {
                return Ok(());
            };
            match session.quiz() {
                Ok(quiz) => {
                    let mut quiz_session = QuizSession::new(quiz.clone(), console.config.quiz_time_limit());
                    take_quiz(&mut quiz_session).await;
                }
                Err(message) => notifier.notify(Notification::error(message)),
            }
        }

        Command::Open { route } => {
            debug!(route = %route, "Route already resolved");
        }
    }

    Ok(())
}

async fn generate(
    console: &Console,
    project_id: i64,
    video_id: i64,
    artifact: Artifact,
    watch: bool,
) -> ApiResult<()> {
    let mut controller = console.controller();
    controller.load_project(project_id, Some(video_id)).await?;
    controller.stop_polling();
    if !controller.focus_video(video_id) {
        return Ok(());
    }

    if !controller.generate(artifact).await? {
        println!("A generation is already running for this video.");
        return Ok(());
    }
    if watch {
        follow(&mut controller).await;
        print_current(console, &controller);
    }
    Ok(())
}

/// Apply status updates until polling ends or the user interrupts
async fn follow(controller: &mut ProjectViewController) {
    if !controller.is_polling() {
        return;
    }
    info!("Following video status, press Ctrl-C to stop");
    tokio::select! {
        _ = controller.wait_until_idle() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
        }
    }
    controller.stop_polling();
}

async fn open_public(console: &Console, slug: &str) -> Option<PublicVideoSession> {
    PublicVideoSession::load(
        Arc::clone(&console.api),
        console.notifier.as_ref(),
        slug,
        console.config.public.chat_history_limit,
    )
    .await
    .ok()
}

fn print_project(console: &Console, controller: &ProjectViewController) {
    let Some(project) = controller.project() else {
        return;
    };
    println!("Project {}: {}", project.id, project.name);
    if project.videos.is_empty() {
        println!("  No videos yet. Upload one with `upload {} <file>`.", project.id);
        return;
    }

    let current = controller.current_video().map(|v| v.id);
    for video in &project.videos {
        let marker = if Some(video.id) == current { '>' } else { ' ' };
        println!(
            "{} {:>4}  {:<32} {:<18} {}",
            marker,
            video.id,
            video.filename,
            video.status.to_string(),
            format_time(video.uploaded_at)
        );
    }
    println!();
    print_current(console, controller);
}

fn print_current(console: &Console, controller: &ProjectViewController) {
    let Some(video) = controller.current_video() else {
        return;
    };
    print_video_header(console, video);

    if video.is_public {
        if let Some(slug) = video.public_slug.as_deref() {
            println!("Public link: {}", controller.share_link(slug));
        }
    }
    if let Some(summary) = video.summary.as_deref() {
        println!("\nSummary:\n{}", summary);
    }
    if let Some(transcript) = controller.current_transcript() {
        print_timeline(&TranscriptTimeline::new(&transcript));
    }
    if video.has_mindmap() {
        print_mindmap(video.mindmap_data.as_deref(), &video.filename);
    }
    if let Some(quiz) = controller.current_quiz() {
        println!("\nQuiz: {} ({} questions)", quiz.title, quiz.questions.len());
    }
}

fn print_video_header(console: &Console, video: &Video) {
    println!("Video {}: {}", video.id, video.filename);
    println!("Status: {}", video.status);
    println!("Uploaded: {}", format_time(video.uploaded_at));
    println!("Tags: {}", format_tags(&video.tags));
    if let Some(url) = video
        .filepath
        .as_deref()
        .and_then(|path| transcript::video_source_url(&console.config.public.static_videos_url, path))
    {
        println!("Source: {}", url);
    }
}

fn print_public(console: &Console, session: &PublicVideoSession) {
    let video = session.video();
    println!("{} ({})", video.filename, video.project_name);
    println!("Uploaded: {}", format_time(video.uploaded_at));
    println!("Tags: {}", format_tags(&video.tags));
    if let Some(url) = video
        .filepath
        .as_deref()
        .and_then(|path| transcript::video_source_url(&console.config.public.static_videos_url, path))
    {
        println!("Source: {}", url);
    }
    if let Some(summary) = video.summary.as_deref() {
        println!("\nSummary:\n{}", summary);
    }
    print_timeline(&session.timeline());
    print_mindmap(video.mindmap_data.as_deref(), &video.filename);
    match session.quiz() {
        Ok(quiz) => println!("\nQuiz: {} (run `quiz {}`)", quiz.title, session.slug()),
        Err(message) => println!("\n{}", message),
    }
    for turn in session.chat_history() {
        println!("\nassistant: {}", turn.content);
    }
}

fn print_timeline(timeline: &TranscriptTimeline) {
    if timeline.is_empty() {
        return;
    }
    if !timeline.key_moments().is_empty() {
        println!("\nKey moments:");
        for moment in timeline.key_moments() {
            println!("  {}  {}", transcript::format_seconds(moment.start), moment.moment.label);
        }
    }
    if !timeline.segments().is_empty() {
        println!("\nTranscript:");
        for segment in timeline.segments() {
            println!(
                "  [{} - {}] {}",
                transcript::format_seconds(segment.start),
                transcript::format_seconds(segment.end),
                segment.segment.text
            );
        }
    }
}

fn print_mindmap(markdown: Option<&str>, title: &str) {
    match markdown.and_then(|md| mindmap::parse(md, title)) {
        Some(root) => println!("\nMind map:\n{}", root.render()),
        None => println!("\n{}", mindmap::UNAVAILABLE_MESSAGE),
    }
}

/// Run a quiz on the terminal against its countdown
async fn take_quiz(session: &mut QuizSession) {
    let quiz = session.quiz().clone();
    println!("{} ({} questions, time limit {})", quiz.title, quiz.questions.len(), session.timer_display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = Instant::now();

    'questions: for (index, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. {}", index + 1, question.question_text);
        for (n, option) in question.options.iter().enumerate() {
            println!("   {}) {}", n + 1, option.text);
        }

        let deadline = last + session.remaining();
        let prompt = match session.answer(index) {
            Some(Answer::Multiple(_)) => "numbers separated by commas",
            _ => "a number",
        };
        print!("[{}] Answer with {}: ", session.timer_display(), prompt);
        let _ = std::io::stdout().flush();

        let line = tokio::time::timeout_at(deadline, lines.next_line()).await;
        let timed_out = session.elapse(last.elapsed());
        last = Instant::now();

        let line = match line {
            Ok(Ok(Some(line))) => line,
            Ok(Ok(None)) | Ok(Err(_)) => break 'questions,
            Err(_) => {
                println!("\nTime is up!");
                break 'questions;
            }
        };
        if timed_out {
            println!("\nTime is up!");
            break 'questions;
        }

        for choice in line.split(',').filter_map(|part| part.trim().parse::<usize>().ok()) {
            let Some(option) = choice.checked_sub(1).and_then(|i| question.options.get(i)) else {
                continue;
            };
            if !session.select(index, &option.text) {
                session.toggle(index, &option.text, true);
            }
        }
    }

    let score = session.submit();
    println!("\nScore: {} / {}", score, session.total());

    for (index, question) in quiz.questions.iter().enumerate() {
        println!("\n{}. {}", index + 1, question.question_text);
        for option in &question.options {
            let marker = match session.outcome(index, option) {
                Some(OptionOutcome::Correct) => "[correct]",
                Some(OptionOutcome::WrongSelection) => "[wrong]  ",
                _ => "         ",
            };
            println!("   {} {}", marker, option.text);
        }
        if let Some(explanation) = question.explanation.as_deref() {
            println!("   {}", explanation);
        }
    }
}

fn format_time(ts: Option<chrono::DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        "(none)".to_string()
    } else {
        tags.join(", ")
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_new_project_route_asks_for_a_name() {
        assert!(command_for(Route::NewProject).is_none());
        assert!(matches!(command_for(Route::ProjectList), Some(Command::Projects)));
        assert!(matches!(
            command_for(Route::ProjectDetail {
                project_id: 3,
                video_id: Some(12)
            }),
            Some(Command::Show {
                project_id: 3,
                video_id: Some(12),
                watch: false
            })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_confirmation_is_read_off_the_runtime() {
        let answer = tokio::task::block_in_place(|| read_confirmation(&mut Cursor::new("Yes\n")));
        assert!(answer);
        assert!(!read_confirmation(&mut Cursor::new("no\n")));
        assert!(!read_confirmation(&mut Cursor::new("")));
    }
}
