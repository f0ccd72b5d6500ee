//! One conversational turn, start to finish.
//!
//! normalize history -> ingest attachments -> assemble -> invoke -> append.
//! Every path hands back the (possibly grown) history and a cleared input.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attachments::{extract_document_text, inline_image};
use crate::context::{Assembly, EducationContext, SELECT_SUBJECT_PROMPT, assemble};
use crate::history::{HistoryEntry, normalize};
use crate::invoker::{CompletionInvoker, Reply};
use crate::session::{Message, Session};
use crate::settings::EffectiveSettings;

pub const STATUS_READY: &str = "✨ Ready to help you learn!";
pub const STATUS_NO_KEY: &str = "⚠️ API Key missing";

/// Per-turn input from the front-end. Attachments are paths that live for this turn only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct TurnInput {
    pub context: EducationContext,
    pub message: String,
    pub document: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

impl TurnInput {
    /// Same education context, transient fields reset.
    pub fn cleared(&self) -> Self {
        Self { context: self.context.clone(), ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    SubjectRequested,
    NothingToSend,
    Replied(Reply),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnResult {
    pub history: Vec<Message>,
    pub outcome: TurnOutcome,
    pub next_input: TurnInput,
}

pub struct Tutor {
    invoker: CompletionInvoker,
}

impl Tutor {
    pub fn new(invoker: CompletionInvoker) -> Self {
        Self { invoker }
    }

    pub fn from_settings(settings: EffectiveSettings) -> Self {
        Self::new(CompletionInvoker::from_settings(settings))
    }

    pub fn status(&self) -> &'static str {
        if self.invoker.is_ready() { STATUS_READY } else { STATUS_NO_KEY }
    }

    /// Runs one turn against whatever shape of history the caller kept around.
    pub async fn respond<I>(&self, history: I, input: &TurnInput) -> TurnResult
    where
        I: IntoIterator,
        I::Item: Into<HistoryEntry>,
    {
        let mut history = normalize(history);
        let next_input = input.cleared();
        let ctx = &input.context;

        // attachments are only worth reading once a subject is known
        let (doc_text, image) = if ctx.has_subject() {
            let doc_text = input
                .document
                .as_deref()
                .map(|p| extract_document_text(p).into_value())
                .unwrap_or_default();
            let image = input.image.as_deref().and_then(inline_image);
            (doc_text, image)
        } else {
            (String::new(), None)
        };

        let turn = match assemble(ctx, &input.message, &doc_text, image, &history) {
            Assembly::SelectSubject => {
                history.push(Message::assistant(SELECT_SUBJECT_PROMPT));
                return TurnResult { history, outcome: TurnOutcome::SubjectRequested, next_input };
            }
            Assembly::NothingToSend => {
                debug!("nothing to send");
                return TurnResult { history, outcome: TurnOutcome::NothingToSend, next_input };
            }
            Assembly::Ready(turn) => turn,
        };

        info!(
            edu_level = %ctx.level,
            subject = ctx.subject_name(),
            mode = %ctx.mode,
            document = !doc_text.is_empty(),
            image = turn.request.has_image(),
            "tutor turn"
        );

        let reply = self.invoker.invoke(&turn.request).await;
        history.push(Message::user(turn.display_label));
        history.push(Message::assistant(reply.text()));

        TurnResult { history, outcome: TurnOutcome::Replied(reply), next_input }
    }

    /// Convenience for front-ends that own a [`Session`]: runs the turn and stores the result.
    pub async fn take_turn(&self, session: &mut Session, input: &TurnInput) -> (TurnOutcome, TurnInput) {
        let history = std::mem::take(&mut session.messages);
        let result = self.respond(history, input).await;
        session.messages = result.history;
        (result.outcome, result.next_input)
    }
}
