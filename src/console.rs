//! Line-oriented terminal front-end driving the tutor pipeline.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

use crate::context::EducationContext;
use crate::export::export_transcript;
use crate::session::{Role, Session};
use crate::tutor::{TurnInput, Tutor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Doc(PathBuf),
    Image(PathBuf),
    Export,
    Clear,
    Quit,
    Help,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let (head, rest) = trimmed.split_once(char::is_whitespace).unwrap_or((trimmed, ""));
        match head {
            "/doc" if !rest.trim().is_empty() => Command::Doc(PathBuf::from(rest.trim())),
            "/image" if !rest.trim().is_empty() => Command::Image(PathBuf::from(rest.trim())),
            "/export" => Command::Export,
            "/clear" => Command::Clear,
            "/quit" | "/exit" => Command::Quit,
            "/help" | "/doc" | "/image" => Command::Help,
            _ => Command::Say(line.to_string()),
        }
    }
}

const HELP: &str = "commands: /doc <path>  /image <path>  /export  /clear  /quit";

pub async fn run(tutor: Tutor, context: EducationContext) -> anyhow::Result<()> {
    let mut out = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session = Session::new();
    let mut input = TurnInput { context, ..Default::default() };

    out.write_all(format!("{}\n{}\n", tutor.status(), HELP).as_bytes()).await?;

    loop {
        out.write_all(b"> ").await?;
        out.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else { break };

        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => out.write_all(format!("{HELP}\n").as_bytes()).await?,
            Command::Clear => {
                session.clear();
                out.write_all(b"(conversation cleared)\n").await?;
            }
            Command::Export => {
                let msg = match export_transcript(session.messages.iter().cloned()) {
                    Some(path) => format!("saved transcript to {}\n", path.display()),
                    None => "nothing to export\n".to_string(),
                };
                out.write_all(msg.as_bytes()).await?;
            }
            Command::Doc(path) => {
                out.write_all(format!("document attached for the next turn: {}\n", path.display()).as_bytes()).await?;
                input.document = Some(path);
            }
            Command::Image(path) => {
                out.write_all(format!("image attached for the next turn: {}\n", path.display()).as_bytes()).await?;
                input.image = Some(path);
            }
            Command::Say(text) => {
                input.message = text;
                let before = session.messages.len();
                let (outcome, next) = tutor.take_turn(&mut session, &input).await;
                debug!(session = %session.id, ?outcome, "turn finished");
                for m in session.messages.iter().skip(before) {
                    if m.role == Role::Assistant {
                        out.write_all(format!("\nTutor: {}\n\n", m.content).as_bytes()).await?;
                    }
                }
                input = next;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_slash_commands() {
        assert_eq!(Command::parse("/doc  notes/ch1.pdf "), Command::Doc(PathBuf::from("notes/ch1.pdf")));
        assert_eq!(Command::parse("/image a b.png"), Command::Image(PathBuf::from("a b.png")));
        assert_eq!(Command::parse("/export"), Command::Export);
        assert_eq!(Command::parse(" /quit"), Command::Quit);
        assert_eq!(Command::parse("/doc"), Command::Help);
    }

    #[test]
    fn anything_else_is_said_verbatim() {
        assert_eq!(Command::parse("what is 2/3?"), Command::Say("what is 2/3?".into()));
        assert_eq!(Command::parse(""), Command::Say(String::new()));
    }
}
