use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use tuition_centre::settings::{resolve_effective_settings, ModelParams, SettingsLayer};
use tuition_centre::taxonomy::{format_subject_choices, subjects_for, Level, HELP_MODES};
use tuition_centre::{console, EducationContext, Tutor};

#[derive(Debug, Parser)]
#[command(name = "tuition-centre")]
#[command(about = "AI tuition chat client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start an interactive tutoring session
    Chat {
        #[command(flatten)]
        context: ContextArgs,
        #[command(flatten)]
        model: ModelArgs,
    },
    /// List the subjects offered for a level (and major)
    Subjects {
        #[arg(long, default_value = "School")]
        level: Level,
        #[arg(long)]
        major: Option<String>,
    },
}

#[derive(Debug, Args)]
struct ContextArgs {
    #[arg(long, default_value = "School")]
    level: Level,
    /// Subject name; defaults to the first subject for the level
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    major: Option<String>,
    #[arg(long)]
    major_other: Option<String>,
    #[arg(long, default_value = "Explain Concept")]
    mode: String,
}

#[derive(Debug, Args)]
struct ModelArgs {
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    text_model: Option<String>,
    #[arg(long)]
    vision_model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    #[arg(long)]
    max_tokens: Option<u32>,
}

impl ModelArgs {
    fn into_layer(self) -> SettingsLayer {
        SettingsLayer {
            api_key: None,
            base_url: self.base_url,
            text_model: self.text_model,
            vision_model: self.vision_model,
            model_params: Some(ModelParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                top_p: None,
            }),
        }
    }
}

impl ContextArgs {
    fn into_context(self) -> anyhow::Result<EducationContext> {
        let subjects = subjects_for(self.level, self.major.as_deref());
        let subject = match self.subject.as_deref() {
            None => format_subject_choices(subjects).into_iter().next().unwrap_or_default(),
            Some(name) => subjects
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name.trim()))
                .map(|(n, label)| format!("{label} {n}"))
                .ok_or_else(|| anyhow::anyhow!("unknown subject {name:?} for {}; see `tuition-centre subjects`", self.level))?,
        };
        if !HELP_MODES.iter().any(|(m, _)| *m == self.mode) {
            anyhow::bail!("unknown help mode {:?}", self.mode);
        }
        Ok(EducationContext {
            level: self.level,
            subject,
            major: self.major,
            major_other: self.major_other,
            mode: self.mode,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Chat { context, model } => {
            let settings = resolve_effective_settings(
                &SettingsLayer::defaults(),
                &SettingsLayer::from_env(),
                &model.into_layer(),
            );
            let context = context.into_context()?;
            console::run(Tutor::from_settings(settings), context).await?;
        }
        Commands::Subjects { level, major } => {
            for choice in format_subject_choices(subjects_for(level, major.as_deref())) {
                println!("{choice}");
            }
        }
    }
    Ok(())
}
