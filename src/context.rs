//! Builds the outgoing request for one turn from the education context,
//! the user's utterance and whatever the attachments yielded.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::attachments::InlineImage;
use crate::session::Message;
use crate::taxonomy::{Level, extract_subject_name};

pub const SYSTEM_PROMPT: &str = "You are a friendly AI tutor. Use emojis. Be clear and helpful.";
pub const SELECT_SUBJECT_PROMPT: &str = "Please select a Subject first! 📚";
pub const ATTACHMENT_ONLY_LABEL: &str = "[File/Image Attached]";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EducationContext {
    pub level: Level,
    /// Picker entry (`"<label> <name>"`) or a bare name.
    pub subject: String,
    pub major: Option<String>,
    pub major_other: Option<String>,
    pub mode: String,
}

impl EducationContext {
    pub fn subject_name(&self) -> &str {
        extract_subject_name(self.subject.trim())
    }

    pub fn has_subject(&self) -> bool {
        !self.subject_name().is_empty()
    }

    /// Header prepended to the student's words. Major only counts at university;
    /// the free-text major note is carried whenever it is filled in.
    pub fn header(&self, doc_text: &str) -> String {
        let mut ctx = format!(
            "Level: {}, Subject: {}, Mode: {}\n",
            self.level,
            self.subject_name(),
            self.mode
        );
        if let Some(major) = self.major.as_deref().filter(|m| !m.trim().is_empty()) {
            if self.level == Level::University {
                ctx.push_str(&format!("Major: {major}\n"));
            }
        }
        if let Some(other) = self.major_other.as_deref().filter(|m| !m.trim().is_empty()) {
            ctx.push_str(&format!("Other major detail: {other}\n"));
        }
        if !doc_text.is_empty() {
            ctx.push_str(&format!("\nDocument Content:\n{doc_text}\n"));
        }
        ctx
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserTurn {
    pub text: String,
    pub image: Option<InlineImage>,
}

/// Everything the model sees for one turn. Built fresh, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub history: Vec<Message>,
    pub turn: UserTurn,
}

impl CompletionRequest {
    pub fn has_image(&self) -> bool {
        self.turn.image.is_some()
    }

    /// OpenAI-style `messages` array: system, replayed history, then the new turn.
    pub fn to_wire_messages(&self) -> Vec<Value> {
        let mut out = Vec::with_capacity(self.history.len() + 2);
        out.push(json!({"role": "system", "content": self.system}));
        for m in &self.history {
            out.push(json!({"role": m.role.as_str(), "content": m.content}));
        }
        let content = match &self.turn.image {
            Some(img) => json!([
                {"type": "text", "text": self.turn.text},
                {"type": "image_url", "image_url": {"url": img.data_url()}}
            ]),
            None => json!(self.turn.text),
        };
        out.push(json!({"role": "user", "content": content}));
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssembledTurn {
    pub request: CompletionRequest,
    /// What goes into session history for the user's side of the turn.
    pub display_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    SelectSubject,
    NothingToSend,
    Ready(AssembledTurn),
}

pub fn assemble(
    ctx: &EducationContext,
    utterance: &str,
    doc_text: &str,
    image: Option<InlineImage>,
    history: &[Message],
) -> Assembly {
    if !ctx.has_subject() {
        return Assembly::SelectSubject;
    }

    let user_text = utterance.trim();
    if user_text.is_empty() && doc_text.is_empty() && image.is_none() {
        return Assembly::NothingToSend;
    }

    let display_label = if user_text.is_empty() {
        ATTACHMENT_ONLY_LABEL.to_string()
    } else {
        user_text.to_string()
    };

    let text = format!("{}\nStudent:\n{}", ctx.header(doc_text), display_label);
    let replay = history
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .cloned()
        .collect();

    Assembly::Ready(AssembledTurn {
        request: CompletionRequest {
            system: SYSTEM_PROMPT.to_string(),
            history: replay,
            turn: UserTurn { text, image },
        },
        display_label,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(level: Level) -> EducationContext {
        EducationContext {
            level,
            subject: "🔢 Mathematics".into(),
            major: None,
            major_other: None,
            mode: "Explain Concept".into(),
        }
    }

    fn ready(a: Assembly) -> AssembledTurn {
        match a {
            Assembly::Ready(t) => t,
            other => panic!("expected a ready turn, got {other:?}"),
        }
    }

    #[test]
    fn empty_subject_asks_for_one() {
        let mut c = ctx(Level::School);
        c.subject = "   ".into();
        assert_eq!(assemble(&c, "hi", "", None, &[]), Assembly::SelectSubject);
    }

    #[test]
    fn nothing_to_send_without_text_or_attachments() {
        assert_eq!(assemble(&ctx(Level::School), "  \n ", "", None, &[]), Assembly::NothingToSend);
    }

    #[test]
    fn text_turn_carries_header_and_student_delimiter() {
        let t = ready(assemble(&ctx(Level::School), "  What is a derivative? ", "", None, &[]));
        assert_eq!(t.display_label, "What is a derivative?");
        assert_eq!(
            t.request.turn.text,
            "Level: School, Subject: Mathematics, Mode: Explain Concept\n\nStudent:\nWhat is a derivative?"
        );
        assert!(!t.request.has_image());
    }

    #[test]
    fn bare_subject_name_reaches_header_intact() {
        let mut c = ctx(Level::School);
        c.subject = "Computer Science".into();
        assert_eq!(c.subject_name(), "Computer Science");
        assert_eq!(c.header(""), "Level: School, Subject: Computer Science, Mode: Explain Concept\n");
        c.subject = "💻 Computer Science".into();
        assert_eq!(c.subject_name(), "Computer Science");
    }

    #[test]
    fn major_only_at_university_but_other_note_always() {
        let mut school = ctx(Level::School);
        school.major = Some("Finance".into());
        school.major_other = Some("Marine biology".into());
        let h = school.header("");
        assert!(!h.contains("Major: Finance"));
        assert!(h.contains("Other major detail: Marine biology\n"));

        let mut uni = ctx(Level::University);
        uni.major = Some("Finance".into());
        assert!(uni.header("").contains("Major: Finance\n"));
    }

    #[test]
    fn document_only_turn_uses_placeholder_label() {
        let t = ready(assemble(&ctx(Level::College), "", "Newton's laws", None, &[]));
        assert_eq!(t.display_label, ATTACHMENT_ONLY_LABEL);
        assert!(t.request.turn.text.contains("\nDocument Content:\nNewton's laws\n"));
        assert!(t.request.turn.text.ends_with("Student:\n[File/Image Attached]"));
    }

    #[test]
    fn image_turn_has_two_parts() {
        let img = InlineImage { mime: "image/png", base64: "AAAA".into() };
        let t = ready(assemble(&ctx(Level::School), "what is this?", "", Some(img), &[]));
        let wire = t.request.to_wire_messages();
        let last = wire.last().unwrap();
        assert_eq!(last["role"], "user");
        assert_eq!(last["content"][0]["type"], "text");
        assert_eq!(last["content"][1]["type"], "image_url");
        assert_eq!(last["content"][1]["image_url"]["url"], "data:image/png;base64,AAAA");
    }

    #[test]
    fn history_is_replayed_in_order_without_blank_entries() {
        let history = vec![
            Message::user("first"),
            Message::assistant("   "),
            Message::assistant("second"),
        ];
        let t = ready(assemble(&ctx(Level::School), "third", "", None, &history));
        let wire = t.request.to_wire_messages();
        assert_eq!(wire.len(), 4);
        assert_eq!(wire[0]["role"], "system");
        assert_eq!(wire[0]["content"], SYSTEM_PROMPT);
        assert_eq!(wire[1]["content"], "first");
        assert_eq!(wire[2]["role"], "assistant");
        assert_eq!(wire[2]["content"], "second");
        assert!(wire[3]["content"].as_str().unwrap().ends_with("Student:\nthird"));
    }
}
